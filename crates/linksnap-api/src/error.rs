use thiserror::Error;

/// Top-level error type for the `linksnap-api` crate.
///
/// Every failure the service or the network can produce lands in one of
/// these variants. `linksnap-core` classifies them further by the
/// operation that failed (credential, mutation, fetch).
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// HTTP 401: no valid session, or the credentials were rejected.
    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    // ── Service ─────────────────────────────────────────────────────
    /// Any other non-2xx response. `message` is the server-supplied text.
    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Data ────────────────────────────────────────────────────────
    /// A 2xx body that did not match the expected shape, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// HTTP status attached to this error, when the server produced one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized { .. } => Some(401),
            Self::Api { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Returns `true` if the server reported a missing or invalid session.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
            || matches!(self, Self::Api { status: 403, .. })
    }

    /// Returns `true` if the request never reached a verdict from the server.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }

    /// The server-supplied message, if the server sent one.
    ///
    /// This is the display-ready text ("slug already taken", "Invalid
    /// credentials"); transport and decoding failures have none.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Unauthorized { message } | Self::Api { message, .. } => Some(message),
            _ => None,
        }
    }
}
