//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use linksnap_config::ConfigError;
use linksnap_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach LinkSnap at {url}")]
    #[diagnostic(
        code(linksnap::connection_failed),
        help(
            "Check that the service is running and reachable.\n\
             Server: {url}\n\
             Override with --server or set `server` in your profile."
        )
    )]
    ConnectionFailed { url: String },

    #[error("TLS setup failed: {message}")]
    #[diagnostic(
        code(linksnap::tls_error),
        help(
            "For a self-signed development server use --insecure (-k),\n\
             or configure ca_cert in your profile."
        )
    )]
    Tls { message: String },

    #[error("Request timed out after {seconds}s")]
    #[diagnostic(
        code(linksnap::timeout),
        help("Increase timeout with --timeout or check the service's responsiveness.")
    )]
    Timeout { seconds: u64 },

    // ── Authentication ───────────────────────────────────────────────
    #[error("{message}")]
    #[diagnostic(
        code(linksnap::auth_failed),
        help(
            "Check the email and password for profile '{profile}'.\n\
             Store a new password with: linksnap config set-password"
        )
    )]
    AuthFailed { message: String, profile: String },

    #[error("No credentials configured for profile '{profile}'")]
    #[diagnostic(
        code(linksnap::no_credentials),
        help(
            "Set an email with --email or `linksnap config init`, and a password via\n\
             LINKSNAP_PASSWORD or `linksnap login --save`."
        )
    )]
    NoCredentials { profile: String },

    #[error("{message}")]
    #[diagnostic(
        code(linksnap::sign_in_required),
        help("Sign-in happens automatically once credentials are configured: linksnap config init")
    )]
    SignInRequired { message: String },

    // ── Server rejections ────────────────────────────────────────────
    #[error("{message}")]
    #[diagnostic(code(linksnap::conflict))]
    Conflict { message: String },

    #[error("{message}")]
    #[diagnostic(code(linksnap::rejected))]
    Rejected { message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(linksnap::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(linksnap::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: linksnap config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error(transparent)]
    #[diagnostic(code(linksnap::config))]
    Config(#[from] ConfigError),

    // ── Internal / IO / Serialization ────────────────────────────────
    #[error("Unexpected failure: {0}")]
    #[diagnostic(code(linksnap::internal))]
    Internal(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render JSON: {0}")]
    #[diagnostic(code(linksnap::json))]
    Json(#[from] serde_json::Error),

    #[error("Failed to render YAML: {0}")]
    #[diagnostic(code(linksnap::yaml))]
    Yaml(#[from] serde_yaml::Error),
}

impl From<figment::Error> for CliError {
    fn from(err: figment::Error) -> Self {
        Self::Config(ConfigError::from(err))
    }
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::Tls { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. }
            | Self::NoCredentials { .. }
            | Self::SignInRequired { .. }
            | Self::Config(ConfigError::NoCredentials { .. }) => exit_code::AUTH,
            Self::Conflict { .. } => exit_code::CONFLICT,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Validation { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }

    /// Translate a core failure, using `ctx` for connection details.
    pub fn from_core(err: CoreError, ctx: &ErrorContext) -> Self {
        if err.is_unreachable() {
            return Self::ConnectionFailed {
                url: ctx.server.clone(),
            };
        }
        if err.is_timeout() {
            return Self::Timeout {
                seconds: ctx.timeout_secs,
            };
        }

        match err {
            CoreError::Credential {
                message,
                status: Some(401 | 403),
            } => Self::AuthFailed {
                message,
                profile: ctx.profile.clone(),
            },
            CoreError::Mutation { message, status: None }
                if message == linksnap_core::SLUG_REQUIRES_LOGIN =>
            {
                Self::SignInRequired { message }
            }
            CoreError::Fetch {
                message,
                status: Some(401),
            } => Self::SignInRequired { message },
            CoreError::Credential {
                message,
                status: Some(409),
            }
            | CoreError::Mutation {
                message,
                status: Some(409),
            } => Self::Conflict { message },
            CoreError::AuthResolution { message, .. }
            | CoreError::Credential { message, .. }
            | CoreError::Mutation { message, .. }
            | CoreError::Fetch { message, .. }
            | CoreError::Api { message, .. } => Self::Rejected { message },
            CoreError::Config { message } if message.starts_with("TLS error") => {
                Self::Tls { message }
            }
            CoreError::Config { message } => Self::Validation {
                field: "server".into(),
                reason: message,
            },
            CoreError::Internal(message) => Self::Internal(message),
        }
    }
}

/// What an error message needs to know about the current invocation.
#[derive(Debug, Clone)]
pub struct ErrorContext {
    pub server: String,
    pub profile: String,
    pub timeout_secs: u64,
}
