//! Session commands: login, register, logout, whoami.

use dialoguer::{Input, Password};
use secrecy::{ExposeSecret, SecretString};
use tracing::warn;

use linksnap_core::{BootstrapOutcome, Session, User};

use super::Ctx;
use crate::cli::{LoginArgs, RegisterArgs};
use crate::config::{self, prompt_err};
use crate::error::CliError;
use crate::output;

/// Shortest password the service accepts at registration.
const MIN_PASSWORD_LEN: usize = 6;

// ── Rendering ───────────────────────────────────────────────────────

fn user_detail(user: &User, color: bool) -> String {
    format!(
        "{} {}\n  {}",
        output::success(&format!("[{}]", user.initial()), color),
        user.name,
        output::muted(&user.email, color)
    )
}

fn render_session(ctx: &Ctx<'_>, session: &Session) -> Result<String, CliError> {
    output::render_single(
        &ctx.global.output,
        session,
        |s| match s.user() {
            Some(user) => user_detail(user, ctx.color),
            None => output::muted("Not signed in", ctx.color),
        },
        |s| s.user().map(|u| u.email.clone()).unwrap_or_default(),
    )
}

// ── Handlers ────────────────────────────────────────────────────────

pub async fn login(ctx: &Ctx<'_>, args: LoginArgs) -> Result<(), CliError> {
    let (email, password) = config::resolve_credentials(ctx.global, &ctx.resolved, true)?;
    ctx.login_with(&email, &password).await?;

    if args.save {
        linksnap_config::store_password(&ctx.resolved.profile_name, &password)?;
        let mut cfg = config::load_config_or_default();
        cfg.profiles
            .entry(ctx.resolved.profile_name.clone())
            .or_insert_with(|| ctx.resolved.profile.clone())
            .email = Some(email);
        config::save_config(&cfg)?;
        if !ctx.global.quiet {
            eprintln!(
                "{} password stored in system keyring for profile '{}'",
                output::success("✓", ctx.color),
                ctx.resolved.profile_name
            );
        }
    }

    ctx.print(&render_session(ctx, &ctx.client.snapshot())?);
    Ok(())
}

pub async fn register(ctx: &Ctx<'_>, args: RegisterArgs) -> Result<(), CliError> {
    let name = args.name.trim();
    if name.is_empty() {
        return Err(CliError::Validation {
            field: "name".into(),
            reason: "cannot be empty".into(),
        });
    }

    let email = match config::resolve_email(ctx.global, &ctx.resolved) {
        Some(email) => email,
        None => Input::<String>::new()
            .with_prompt("Email")
            .interact_text()
            .map_err(prompt_err)?,
    };

    let password = match std::env::var("LINKSNAP_PASSWORD") {
        Ok(pw) => SecretString::from(pw),
        Err(_) => {
            let pw = Password::new()
                .with_prompt("Password")
                .with_confirmation("Confirm password", "Passwords don't match")
                .interact()
                .map_err(prompt_err)?;
            SecretString::from(pw)
        }
    };
    validate_password(&password)?;

    ctx.client
        .register(name, &email, &password)
        .await
        .map_err(|e| ctx.core_err(e))?;

    ctx.print(&render_session(ctx, &ctx.client.snapshot())?);
    Ok(())
}

pub async fn logout(ctx: &Ctx<'_>) -> Result<(), CliError> {
    if let Some(e) = ctx.client.logout().await {
        warn!(error = %e, "server-side logout failed");
    }
    if let Err(e) = linksnap_config::forget_password(&ctx.resolved.profile_name) {
        warn!(error = %e, "could not remove keyring password");
    }

    if !ctx.global.quiet {
        eprintln!(
            "{} signed out of profile '{}'",
            output::success("✓", ctx.color),
            ctx.resolved.profile_name
        );
    }
    Ok(())
}

/// Resume the server session if the transport has one, otherwise sign in
/// with stored credentials (never prompting).
pub async fn whoami(ctx: &Ctx<'_>) -> Result<(), CliError> {
    let resumed = match ctx.client.start() {
        Some(handle) => handle
            .await
            .map_err(|e| CliError::Internal(format!("session check task failed: {e}")))?,
        None => BootstrapOutcome::Anonymous,
    };

    if !matches!(resumed, BootstrapOutcome::Authenticated(_)) {
        if let Ok((email, password)) =
            config::resolve_credentials(ctx.global, &ctx.resolved, false)
        {
            ctx.login_with(&email, &password).await?;
        }
    }

    ctx.print(&render_session(ctx, &ctx.client.snapshot())?);
    Ok(())
}

fn validate_password(password: &SecretString) -> Result<(), CliError> {
    if password.expose_secret().chars().count() < MIN_PASSWORD_LEN {
        return Err(CliError::Validation {
            field: "password".into(),
            reason: format!("must be at least {MIN_PASSWORD_LEN} characters"),
        });
    }
    Ok(())
}
