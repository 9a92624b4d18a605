// ── Test doubles ──
//
// In-memory `LinkApi` and a hand-resolved fetcher for driving the cache
// through exact interleavings.

#![allow(clippy::unwrap_used)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::oneshot;

use crate::api::LinkApi;
use crate::error::CoreError;
use crate::model::{ShortUrl, User};

/// Let every ready task run to its next suspension point.
pub(crate) async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}

// ── GatedFetcher ─────────────────────────────────────────────────

type Gate<T> = oneshot::Sender<Result<Vec<T>, CoreError>>;

/// Fetcher whose requests stay pending until the test resolves them.
pub(crate) struct GatedFetcher<T> {
    inner: Arc<Mutex<GateQueue<T>>>,
}

struct GateQueue<T> {
    calls: usize,
    waiting: VecDeque<Gate<T>>,
}

impl<T> Clone for GatedFetcher<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Send + 'static> GatedFetcher<T> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(GateQueue {
                calls: 0,
                waiting: VecDeque::new(),
            })),
        }
    }

    pub fn fetch(&self) -> BoxFuture<'static, Result<Vec<T>, CoreError>> {
        let (tx, rx) = oneshot::channel();
        {
            let mut queue = self.inner.lock().unwrap();
            queue.calls += 1;
            queue.waiting.push_back(tx);
        }
        async move {
            rx.await
                .unwrap_or_else(|_| Err(CoreError::Internal("request abandoned".into())))
        }
        .boxed()
    }

    pub fn calls(&self) -> usize {
        self.inner.lock().unwrap().calls
    }

    /// Pop the oldest pending request without resolving it.
    pub fn take_next(&self) -> Gate<T> {
        self.inner.lock().unwrap().waiting.pop_front().unwrap()
    }

    /// Resolve the oldest pending request.
    pub fn resolve_next(&self, result: Result<Vec<T>, CoreError>) {
        let _ = self.take_next().send(result);
    }
}

// ── FakeApi ──────────────────────────────────────────────────────

/// A tiny in-memory LinkSnap server.
pub(crate) struct FakeApi {
    state: Mutex<FakeState>,
    me_gate: Mutex<Option<oneshot::Receiver<Result<User, CoreError>>>>,
}

#[derive(Default)]
struct FakeState {
    accounts: Vec<(User, String)>,
    /// (owner id, link)
    links: Vec<(String, ShortUrl)>,
    server_session: Option<User>,
    fail_logout: bool,
    me_calls: usize,
    create_calls: usize,
    list_calls: usize,
    logout_calls: usize,
}

fn api_error(message: &str, status: Option<u16>) -> CoreError {
    CoreError::Api {
        message: message.into(),
        status,
    }
}

impl FakeApi {
    pub const PASSWORD: &'static str = "hunter22";

    pub fn new() -> Self {
        Self {
            state: Mutex::new(FakeState {
                accounts: vec![(Self::ada(), Self::PASSWORD.into())],
                ..FakeState::default()
            }),
            me_gate: Mutex::new(None),
        }
    }

    pub fn ada() -> User {
        User {
            id: "u1".into(),
            name: "Ada".into(),
            email: "ada@example.com".into(),
        }
    }

    pub fn set_server_session(&self, user: Option<User>) {
        self.state.lock().unwrap().server_session = user;
    }

    /// Hold the next `current_user` call until the returned sender fires.
    pub fn gate_current_user(&self) -> oneshot::Sender<Result<User, CoreError>> {
        let (tx, rx) = oneshot::channel();
        *self.me_gate.lock().unwrap() = Some(rx);
        tx
    }

    pub fn fail_logout(&self) {
        self.state.lock().unwrap().fail_logout = true;
    }

    pub fn seed_link(&self, owner: &User, slug: &str, full_url: &str) {
        let mut state = self.state.lock().unwrap();
        let id = format!("l{}", state.links.len() + 1);
        state.links.push((
            owner.id.clone(),
            ShortUrl {
                id,
                full_url: full_url.into(),
                short_url: slug.into(),
                clicks: 0,
            },
        ));
    }

    pub fn me_calls(&self) -> usize {
        self.state.lock().unwrap().me_calls
    }

    pub fn create_calls(&self) -> usize {
        self.state.lock().unwrap().create_calls
    }

    pub fn list_calls(&self) -> usize {
        self.state.lock().unwrap().list_calls
    }

    pub fn logout_calls(&self) -> usize {
        self.state.lock().unwrap().logout_calls
    }
}

impl LinkApi for FakeApi {
    async fn current_user(&self) -> Result<User, CoreError> {
        let gate = {
            self.state.lock().unwrap().me_calls += 1;
            self.me_gate.lock().unwrap().take()
        };
        if let Some(rx) = gate {
            return rx
                .await
                .unwrap_or_else(|_| Err(CoreError::Internal("gate dropped".into())));
        }
        self.state
            .lock()
            .unwrap()
            .server_session
            .clone()
            .ok_or_else(|| api_error("Unauthorized", Some(401)))
    }

    async fn login(&self, email: &str, password: &SecretString) -> Result<User, CoreError> {
        let mut state = self.state.lock().unwrap();
        let user = state
            .accounts
            .iter()
            .find(|(user, pw)| user.email == email && pw == password.expose_secret())
            .map(|(user, _)| user.clone())
            .ok_or_else(|| api_error("Invalid credentials", Some(401)))?;
        state.server_session = Some(user.clone());
        Ok(user)
    }

    async fn register(
        &self,
        name: &str,
        email: &str,
        password: &SecretString,
    ) -> Result<User, CoreError> {
        let mut state = self.state.lock().unwrap();
        if state.accounts.iter().any(|(user, _)| user.email == email) {
            return Err(api_error("User already exists", Some(409)));
        }
        let user = User {
            id: format!("u{}", state.accounts.len() + 1),
            name: name.into(),
            email: email.into(),
        };
        state
            .accounts
            .push((user.clone(), password.expose_secret().to_owned()));
        state.server_session = Some(user.clone());
        Ok(user)
    }

    async fn logout(&self) -> Result<(), CoreError> {
        let mut state = self.state.lock().unwrap();
        state.logout_calls += 1;
        if state.fail_logout {
            return Err(api_error("Could not reach the server", None));
        }
        state.server_session = None;
        Ok(())
    }

    async fn create_short_url(
        &self,
        full_url: &str,
        custom_slug: Option<&str>,
    ) -> Result<String, CoreError> {
        let mut state = self.state.lock().unwrap();
        state.create_calls += 1;
        let slug = match custom_slug {
            Some(slug) if state.links.iter().any(|(_, link)| link.short_url == slug) => {
                return Err(api_error("slug already taken", Some(409)));
            }
            Some(slug) => slug.to_owned(),
            None => format!("s{}", state.links.len() + 1),
        };
        let owner = state
            .server_session
            .as_ref()
            .map_or_else(|| "anonymous".to_owned(), |user| user.id.clone());
        let id = format!("l{}", state.links.len() + 1);
        state.links.push((
            owner,
            ShortUrl {
                id,
                full_url: full_url.into(),
                short_url: slug.clone(),
                clicks: 0,
            },
        ));
        Ok(format!("http://localhost:3000/{slug}"))
    }

    async fn list_my_short_urls(&self) -> Result<Vec<ShortUrl>, CoreError> {
        let mut state = self.state.lock().unwrap();
        state.list_calls += 1;
        let Some(user) = state.server_session.clone() else {
            return Err(api_error("Unauthorized", Some(401)));
        };
        Ok(state
            .links
            .iter()
            .filter(|(owner, _)| *owner == user.id)
            .map(|(_, link)| link.clone())
            .collect())
    }
}
