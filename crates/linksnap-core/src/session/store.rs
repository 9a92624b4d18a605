// ── Session store ──
//
// Two states, `Anonymous` and `Authenticated`, changed only by `login`
// and `logout`. Readers take cheap snapshots or await transitions via a
// `watch` receiver.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::watch;
use tracing::debug;

use crate::model::{Session, User};

/// Holder of the authenticated-user state.
///
/// Cheaply cloneable; every clone observes and mutates the same session.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    state: watch::Sender<Session>,
    /// Bumped by every `logout()`, inside the same critical section as
    /// the state change. A startup check that began under an older
    /// epoch must not sign the user back in.
    logout_epoch: AtomicU64,
}

impl SessionStore {
    pub fn new() -> Self {
        let (state, _) = watch::channel(Session::Anonymous);
        Self {
            inner: Arc::new(SessionInner {
                state,
                logout_epoch: AtomicU64::new(0),
            }),
        }
    }

    /// Enter (or refresh) the authenticated state with `user`.
    pub fn login(&self, user: User) {
        debug!(user_id = %user.id, "session authenticated");
        self.inner
            .state
            .send_replace(Session::Authenticated(user));
    }

    /// Return to the anonymous state.
    pub fn logout(&self) {
        debug!("session cleared");
        self.inner.state.send_modify(|session| {
            self.inner.logout_epoch.fetch_add(1, Ordering::SeqCst);
            *session = Session::Anonymous;
        });
    }

    /// Current session. Never blocks.
    pub fn snapshot(&self) -> Session {
        self.inner.state.borrow().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner.state.borrow().is_authenticated()
    }

    /// Subscribe to session transitions.
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.inner.state.subscribe()
    }

    // ── Bootstrap support ────────────────────────────────────────────

    pub(crate) fn logout_epoch(&self) -> u64 {
        self.inner.logout_epoch.load(Ordering::SeqCst)
    }

    /// `login(user)` unless a `logout()` happened since `epoch` was read.
    ///
    /// Returns whether the login was applied.
    pub(crate) fn login_unless_logged_out(&self, user: User, epoch: u64) -> bool {
        let applied = self.inner.state.send_if_modified(|session| {
            if self.inner.logout_epoch.load(Ordering::SeqCst) != epoch {
                return false;
            }
            *session = Session::Authenticated(user);
            true
        });
        if applied {
            debug!("session resumed");
        }
        applied
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}
