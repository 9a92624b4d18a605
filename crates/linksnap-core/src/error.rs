// ── Core error types ──
//
// User-facing errors from linksnap-core. Consumers never see HTTP plumbing
// directly: `From<linksnap_api::Error>` reduces every transport failure to
// a display-ready message plus an optional status, and the `into_*`
// classifiers tag it with the operation that failed.
//
// `CoreError` is `Clone` because a fetch failure is stored in the cache
// entry and handed to every subscriber.

use thiserror::Error;

/// Message for a request that never reached the server.
pub const UNREACHABLE_MESSAGE: &str = "Could not reach the server";

/// Message for a request the transport gave up waiting on.
pub const TIMEOUT_MESSAGE: &str = "The server took too long to respond";

/// Unified error type for the core crate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    // ── Operation failures (display-ready, server text verbatim) ─────
    /// The startup session check found no usable session. Absorbed by the
    /// bootstrapper and only ever logged.
    #[error("No session to resume: {message}")]
    AuthResolution { message: String, status: Option<u16> },

    /// Login or registration was rejected.
    #[error("{message}")]
    Credential { message: String, status: Option<u16> },

    /// A state-changing call (create link) was rejected.
    #[error("{message}")]
    Mutation { message: String, status: Option<u16> },

    /// Listing a cached resource failed.
    #[error("{message}")]
    Fetch { message: String, status: Option<u16> },

    /// A server or transport failure not yet tied to an operation.
    #[error("Request failed: {message}")]
    Api { message: String, status: Option<u16> },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// The message to show a person, without any category prefix.
    pub fn display_message(&self) -> &str {
        match self {
            Self::AuthResolution { message, .. }
            | Self::Credential { message, .. }
            | Self::Mutation { message, .. }
            | Self::Fetch { message, .. }
            | Self::Api { message, .. }
            | Self::Config { message }
            | Self::Internal(message) => message,
        }
    }

    /// HTTP status behind this error, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::AuthResolution { status, .. }
            | Self::Credential { status, .. }
            | Self::Mutation { status, .. }
            | Self::Fetch { status, .. }
            | Self::Api { status, .. } => *status,
            Self::Config { .. } | Self::Internal(_) => None,
        }
    }

    /// The request failed before any response arrived.
    pub fn is_unreachable(&self) -> bool {
        self.status().is_none() && self.display_message() == UNREACHABLE_MESSAGE
    }

    pub fn is_timeout(&self) -> bool {
        self.status().is_none() && self.display_message() == TIMEOUT_MESSAGE
    }

    pub fn into_auth_resolution(self) -> Self {
        let status = self.status();
        Self::AuthResolution {
            message: self.into_message(),
            status,
        }
    }

    pub fn into_credential(self) -> Self {
        let status = self.status();
        Self::Credential {
            message: self.into_message(),
            status,
        }
    }

    pub fn into_mutation(self) -> Self {
        let status = self.status();
        Self::Mutation {
            message: self.into_message(),
            status,
        }
    }

    pub fn into_fetch(self) -> Self {
        let status = self.status();
        Self::Fetch {
            message: self.into_message(),
            status,
        }
    }

    fn into_message(self) -> String {
        match self {
            Self::AuthResolution { message, .. }
            | Self::Credential { message, .. }
            | Self::Mutation { message, .. }
            | Self::Fetch { message, .. }
            | Self::Api { message, .. }
            | Self::Config { message }
            | Self::Internal(message) => message,
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<linksnap_api::Error> for CoreError {
    fn from(err: linksnap_api::Error) -> Self {
        let status = err.status();
        let message = match err {
            linksnap_api::Error::Unauthorized { message }
            | linksnap_api::Error::Api { message, .. } => message,
            linksnap_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    TIMEOUT_MESSAGE.into()
                } else if e.is_connect() {
                    UNREACHABLE_MESSAGE.into()
                } else {
                    e.to_string()
                }
            }
            linksnap_api::Error::InvalidUrl(e) => {
                return Self::Config {
                    message: format!("Invalid URL: {e}"),
                };
            }
            linksnap_api::Error::Tls(msg) => {
                return Self::Config {
                    message: format!("TLS error: {msg}"),
                };
            }
            linksnap_api::Error::Deserialization { message, body: _ } => {
                return Self::Internal(format!("Unexpected response from server: {message}"));
            }
        };
        Self::Api { message, status }
    }
}
