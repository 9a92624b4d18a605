// ── Runtime client configuration ──
//
// These types describe *how* to reach the LinkSnap service and how the
// cache should pace itself. They never touch disk: the CLI (or any other
// front end) constructs a `ClientConfig` and hands it in.

use std::time::Duration;

use url::Url;

/// Background refresh cadence for subscribed resources.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(30);

/// How long an unsubscribed cache entry survives before eviction.
pub const DEFAULT_IDLE_EVICTION: Duration = Duration::from_secs(300);

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(std::path::PathBuf),
    /// Skip verification (local development servers with self-signed certs).
    DangerAcceptInvalid,
}

/// Configuration for one LinkSnap service.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Service root (e.g. `http://localhost:3000`).
    pub base_url: Url,
    /// TLS verification strategy.
    pub tls: TlsVerification,
    /// Request timeout, enforced by the transport.
    pub timeout: Duration,
    /// Background refresh period while a resource has subscribers.
    pub refresh_interval: Duration,
    /// Grace period before an unsubscribed entry is evicted.
    pub idle_eviction: Duration,
}

impl ClientConfig {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            idle_eviction: DEFAULT_IDLE_EVICTION,
        }
    }
}
