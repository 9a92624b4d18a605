// ── LinkSnap client facade ──
//
// Wires the session store, bootstrapper, link cache, and mutation
// coordinator around one `LinkApi`. This is the surface UI layers use.

use std::sync::Arc;

use linksnap_api::ApiClient;
use linksnap_api::transport::{TlsMode, TransportConfig};
use secrecy::SecretString;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use url::Url;

use crate::api::LinkApi;
use crate::cache::{ResourceCache, ResourceKey};
use crate::config::{ClientConfig, TlsVerification};
use crate::error::CoreError;
use crate::model::{Session, ShortUrl, User};
use crate::mutation::MutationCoordinator;
use crate::session::{BootstrapOutcome, SessionBootstrapper, SessionStore};
use crate::stream::Subscription;

/// Message for a custom slug requested without a session.
pub const SLUG_REQUIRES_LOGIN: &str = "custom slugs require a signed-in account";

/// The main entry point for consumers.
///
/// Cheaply cloneable; clones share session, cache, and transport (and
/// with it the session cookie).
pub struct LinkSnap<A: LinkApi = ApiClient> {
    inner: Arc<LinkSnapInner<A>>,
}

struct LinkSnapInner<A> {
    base_url: Url,
    api: Arc<A>,
    session: SessionStore,
    bootstrapper: SessionBootstrapper,
    links: ResourceCache<ShortUrl>,
    mutations: MutationCoordinator<ShortUrl>,
}

impl<A: LinkApi> Clone for LinkSnap<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl LinkSnap<ApiClient> {
    /// Build an HTTP-backed client. Does not contact the server; call
    /// [`start()`](Self::start) to resume an existing session.
    pub fn connect(config: &ClientConfig) -> Result<Self, CoreError> {
        let transport = build_transport(config);
        let api = ApiClient::new(config.base_url.clone(), &transport)?;
        debug!(base_url = %config.base_url, "api client ready");
        Ok(Self::with_api(api, config))
    }
}

impl<A: LinkApi> LinkSnap<A> {
    pub fn with_api(api: A, config: &ClientConfig) -> Self {
        let links = ResourceCache::from_config(config);
        Self {
            inner: Arc::new(LinkSnapInner {
                base_url: config.base_url.clone(),
                api: Arc::new(api),
                session: SessionStore::new(),
                bootstrapper: SessionBootstrapper::new(),
                mutations: MutationCoordinator::new(links.clone()),
                links,
            }),
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    pub fn api(&self) -> &A {
        &self.inner.api
    }

    pub fn session(&self) -> &SessionStore {
        &self.inner.session
    }

    pub fn snapshot(&self) -> Session {
        self.inner.session.snapshot()
    }

    pub fn links(&self) -> &ResourceCache<ShortUrl> {
        &self.inner.links
    }

    // ── Session lifecycle ────────────────────────────────────────

    /// Start the one-shot session check in the background.
    ///
    /// The session reads `Anonymous` until the check resolves. Only the
    /// first call per client does anything.
    pub fn start(&self) -> Option<JoinHandle<BootstrapOutcome>> {
        self.inner
            .bootstrapper
            .spawn(Arc::clone(&self.inner.api), self.inner.session.clone())
    }

    /// Sign in. On rejection the session is left as it was.
    pub async fn login(&self, email: &str, password: &SecretString) -> Result<User, CoreError> {
        let user = self
            .inner
            .api
            .login(email, password)
            .await
            .map_err(CoreError::into_credential)?;
        info!(user_id = %user.id, "signed in");
        self.begin_session(user.clone());
        Ok(user)
    }

    /// Create an account and sign in as it.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &SecretString,
    ) -> Result<User, CoreError> {
        let user = self
            .inner
            .api
            .register(name, email, password)
            .await
            .map_err(CoreError::into_credential)?;
        info!(user_id = %user.id, "registered");
        self.begin_session(user.clone());
        Ok(user)
    }

    /// A held link subscription refetches under the new identity.
    fn begin_session(&self, user: User) {
        self.inner.session.login(user);
        self.inner.links.invalidate(&ResourceKey::user_urls());
    }

    /// Sign out. Best-effort on the server; the local session and the
    /// caller's cached links are always cleared.
    ///
    /// Returns the server failure, if any, for logging. It never means
    /// the local sign-out failed.
    pub async fn logout(&self) -> Option<CoreError> {
        let server = self.inner.api.logout().await.err();
        if let Some(e) = &server {
            warn!(error = %e, "server logout failed, clearing local session anyway");
        }
        self.inner.session.logout();
        self.inner.links.purge(&ResourceKey::user_urls());
        info!("signed out");
        server
    }

    // ── Links ────────────────────────────────────────────────────

    /// Shorten `full_url`, optionally under a custom slug.
    ///
    /// Custom slugs need a signed-in session; anonymous requests with a
    /// slug fail locally. On success the link list is invalidated and the
    /// created short link is returned right away.
    pub async fn create_short_url(
        &self,
        full_url: &str,
        custom_slug: Option<&str>,
    ) -> Result<String, CoreError> {
        let slug = custom_slug.map(str::trim).filter(|s| !s.is_empty());
        if slug.is_some() && !self.inner.session.is_authenticated() {
            return Err(CoreError::Mutation {
                message: SLUG_REQUIRES_LOGIN.into(),
                status: None,
            });
        }

        self.inner
            .mutations
            .mutate(
                self.inner.api.create_short_url(full_url, slug),
                &ResourceKey::user_urls(),
            )
            .await
    }

    /// Subscribe to the signed-in user's links. Refreshes in the
    /// background while the subscription is held.
    pub fn my_links(&self) -> Subscription<ShortUrl> {
        let api = Arc::clone(&self.inner.api);
        self.inner.links.subscribe(ResourceKey::user_urls(), move || {
            let api = Arc::clone(&api);
            async move { api.list_my_short_urls().await }
        })
    }

    /// Force a refetch of the link list.
    pub fn refresh_links(&self) {
        self.inner.links.invalidate(&ResourceKey::user_urls());
    }

    /// Stop background refresh and eviction.
    pub fn shutdown(&self) {
        self.inner.links.shutdown();
    }
}

// ── Helpers ──────────────────────────────────────────────────────

fn build_transport(config: &ClientConfig) -> TransportConfig {
    TransportConfig {
        tls: tls_to_transport(&config.tls),
        timeout: config.timeout,
        ..TransportConfig::default()
    }
}

fn tls_to_transport(tls: &TlsVerification) -> TlsMode {
    match tls {
        TlsVerification::SystemDefaults => TlsMode::System,
        TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
        TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
    }
}
