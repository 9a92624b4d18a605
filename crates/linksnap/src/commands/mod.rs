//! Command dispatch: bridges CLI args -> core client -> output formatting.

pub mod auth;
pub mod config_cmd;
pub mod links;
pub mod shorten;

use linksnap_core::{CoreError, LinkSnap, User};
use secrecy::SecretString;
use tracing::debug;

use crate::cli::{Cli, Command, GlobalOpts};
use crate::config::{self, Resolved};
use crate::error::CliError;
use crate::output;

/// Dispatch a parsed command to its handler.
pub async fn dispatch(cmd: Command, global: &GlobalOpts) -> Result<(), CliError> {
    debug!(command = ?cmd, "dispatching command");
    match cmd {
        // Local-only commands never build a client
        Command::Config(args) => config_cmd::handle(args, global),
        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "linksnap", &mut std::io::stdout());
            Ok(())
        }

        Command::Shorten(args) => shorten::handle(&Ctx::connect(global)?, args).await,
        Command::Login(args) => auth::login(&Ctx::connect(global)?, args).await,
        Command::Register(args) => auth::register(&Ctx::connect(global)?, args).await,
        Command::Logout => auth::logout(&Ctx::connect(global)?).await,
        Command::Whoami => auth::whoami(&Ctx::connect(global)?).await,
        Command::Links(args) => links::handle(&Ctx::connect(global)?, args).await,
    }
}

// ── Per-invocation context ───────────────────────────────────────────

/// A configured client plus what handlers need to render and report.
pub struct Ctx<'a> {
    pub client: LinkSnap,
    pub resolved: Resolved,
    pub global: &'a GlobalOpts,
    pub color: bool,
}

impl<'a> Ctx<'a> {
    pub fn connect(global: &'a GlobalOpts) -> Result<Self, CliError> {
        let cfg = config::load_config_or_default();
        let resolved = config::resolve(global, &cfg)?;
        let client = LinkSnap::connect(&resolved.client)
            .map_err(|e| CliError::from_core(e, &resolved.error_context()))?;
        debug!(profile = %resolved.profile_name, server = %resolved.client.base_url, "client configured");
        Ok(Self {
            client,
            resolved,
            global,
            color: output::should_color(&global.color),
        })
    }

    pub fn core_err(&self, err: CoreError) -> CliError {
        CliError::from_core(err, &self.resolved.error_context())
    }

    /// Sign in with configured (or prompted) credentials.
    pub async fn sign_in(&self) -> Result<User, CliError> {
        let (email, password) = config::resolve_credentials(self.global, &self.resolved, true)?;
        self.login_with(&email, &password).await
    }

    pub async fn login_with(&self, email: &str, password: &SecretString) -> Result<User, CliError> {
        let spinner = output::spinner("Signing in", self.global.quiet);
        let result = self.client.login(email, password).await;
        if let Some(bar) = spinner {
            bar.finish_and_clear();
        }
        result.map_err(|e| self.core_err(e))
    }

    pub fn print(&self, rendered: &str) {
        output::print_output(rendered, self.global.quiet);
    }
}
