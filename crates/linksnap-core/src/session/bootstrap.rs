// ── Session bootstrap ──
//
// Runs the server's "who am I" check once per process, in the
// background, and primes the SessionStore when it finds a user. A
// failed check is the normal anonymous case: it is logged, never
// surfaced, and never retried.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::task::JoinHandle;
use tracing::debug;

use super::store::SessionStore;
use crate::api::LinkApi;
use crate::model::User;

/// What the startup session check ended up doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapOutcome {
    /// A session was found and applied.
    Authenticated(User),
    /// No usable session; the store stayed as it was.
    Anonymous,
    /// A session was found, but an explicit logout happened first.
    Discarded,
}

/// One-shot session resolver.
#[derive(Debug, Default)]
pub struct SessionBootstrapper {
    started: AtomicBool,
}

impl SessionBootstrapper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn the session check. Only the first call does anything; later
    /// calls return `None`.
    ///
    /// The returned handle may be awaited or dropped; the store is
    /// updated either way.
    pub fn spawn<A: LinkApi>(
        &self,
        api: Arc<A>,
        session: SessionStore,
    ) -> Option<JoinHandle<BootstrapOutcome>> {
        if self.started.swap(true, Ordering::SeqCst) {
            debug!("session bootstrap already ran");
            return None;
        }
        // Read before spawning: a logout issued any time after this call
        // must win over whatever the check returns.
        let epoch = session.logout_epoch();
        Some(tokio::spawn(async move {
            resolve(api.as_ref(), &session, epoch).await
        }))
    }

    pub fn has_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }
}

async fn resolve<A: LinkApi>(api: &A, session: &SessionStore, epoch: u64) -> BootstrapOutcome {
    match api.current_user().await {
        Ok(user) => {
            if session.login_unless_logged_out(user.clone(), epoch) {
                BootstrapOutcome::Authenticated(user)
            } else {
                debug!("session check finished after logout, discarding");
                BootstrapOutcome::Discarded
            }
        }
        Err(e) => {
            let e = e.into_auth_resolution();
            debug!(error = %e, status = ?e.status(), "no session to resume");
            BootstrapOutcome::Anonymous
        }
    }
}
