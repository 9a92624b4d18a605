//! CLI configuration: thin wrapper around `linksnap_config` shared types.
//!
//! Adds resolution that respects `GlobalOpts` flag overrides
//! (--server, --email, --insecure, --timeout).

use std::io::IsTerminal;
use std::time::Duration;

use dialoguer::Password;
use secrecy::SecretString;

use linksnap_core::{ClientConfig, TlsVerification};

use crate::cli::GlobalOpts;
use crate::error::{CliError, ErrorContext};

// ── Re-exports from shared crate ────────────────────────────────────

pub use linksnap_config::{Config, Profile, config_path, load_config_or_default, save_config};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Everything a command needs to know about where and as whom to connect.
#[derive(Debug)]
pub struct Resolved {
    pub profile_name: String,
    pub profile: Profile,
    pub client: ClientConfig,
}

impl Resolved {
    pub fn error_context(&self) -> ErrorContext {
        ErrorContext {
            server: self.client.base_url.to_string(),
            profile: self.profile_name.clone(),
            timeout_secs: self.client.timeout.as_secs(),
        }
    }
}

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .unwrap_or_else(|| config.default_profile_name().to_owned())
}

/// Translate config + global flags into a `ClientConfig`.
///
/// A missing profile is fine for the default profile (the built-in
/// server is used); an explicitly requested one must exist.
pub fn resolve(global: &GlobalOpts, config: &Config) -> Result<Resolved, CliError> {
    let profile_name = active_profile_name(global, config);
    let profile = match config.profiles.get(&profile_name) {
        Some(profile) => profile.clone(),
        None if global.profile.is_none() => Profile::default(),
        None => {
            let mut names: Vec<_> = config.profiles.keys().cloned().collect();
            names.sort();
            return Err(CliError::ProfileNotFound {
                name: profile_name,
                available: if names.is_empty() {
                    "(none)".into()
                } else {
                    names.join(", ")
                },
            });
        }
    };

    // 1. Server URL (flag > env > profile)
    let server = global.server.as_deref().unwrap_or(&profile.server);
    let base_url = linksnap_config::parse_server(server)?;

    let mut client = linksnap_config::profile_to_client_config(&profile, &config.defaults)?;
    client.base_url = base_url;

    // 2. TLS verification (flag forces insecure)
    if global.insecure {
        client.tls = TlsVerification::DangerAcceptInvalid;
    }

    // 3. Timeout (flag > env > profile > defaults)
    if let Some(secs) = global.timeout {
        client.timeout = Duration::from_secs(secs);
    }

    Ok(Resolved {
        profile_name,
        profile,
        client,
    })
}

/// Email for sign-in: flag/env, then profile.
pub fn resolve_email(global: &GlobalOpts, resolved: &Resolved) -> Option<String> {
    global
        .email
        .clone()
        .or_else(|| resolved.profile.email.clone())
}

/// Credentials for sign-in. With `interactive`, falls back to a password
/// prompt when nothing is configured and stdin is a terminal.
pub fn resolve_credentials(
    global: &GlobalOpts,
    resolved: &Resolved,
    interactive: bool,
) -> Result<(String, SecretString), CliError> {
    let Some(email) = resolve_email(global, resolved) else {
        return Err(CliError::NoCredentials {
            profile: resolved.profile_name.clone(),
        });
    };

    match linksnap_config::resolve_password(&resolved.profile, &resolved.profile_name) {
        Ok(password) => Ok((email, password)),
        Err(_) if interactive && std::io::stdin().is_terminal() => {
            let password = prompt_password(&format!("Password for {email}"))?;
            Ok((email, password))
        }
        Err(e) => Err(e.into()),
    }
}

/// Prompt for a password without echo.
pub fn prompt_password(prompt: &str) -> Result<SecretString, CliError> {
    let password = Password::new()
        .with_prompt(prompt)
        .interact()
        .map_err(prompt_err)?;
    Ok(SecretString::from(password))
}

/// Map a dialoguer / interactive I/O failure into CliError.
pub fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}
