//! Clap derive structures for the `linksnap` CLI.
//!
//! Defines the command tree, global flags, and shared types.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// linksnap -- shorten links and track their clicks from the terminal
#[derive(Debug, Parser)]
#[command(
    name = "linksnap",
    version,
    about = "Shorten links and track their clicks with LinkSnap",
    long_about = "A command-line client for the LinkSnap link-shortening service.\n\n\
        Anyone can shorten a link. Signed-in users can pick a custom slug\n\
        and see their own links with live click counts.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Service profile to use
    #[arg(long, short = 'p', env = "LINKSNAP_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Service URL (overrides profile)
    #[arg(long, short = 's', env = "LINKSNAP_SERVER", global = true)]
    pub server: Option<String>,

    /// Account email (overrides profile)
    #[arg(long, short = 'e', env = "LINKSNAP_EMAIL", global = true)]
    pub email: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "LINKSNAP_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "LINKSNAP_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds [default: 30]
    #[arg(long, env = "LINKSNAP_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Shorten a URL
    #[command(alias = "s")]
    Shorten(ShortenArgs),

    /// Sign in and verify credentials
    Login(LoginArgs),

    /// Create an account
    Register(RegisterArgs),

    /// Sign out and forget the stored password
    Logout,

    /// Show who is signed in
    Whoami,

    /// List your shortened links with click counts
    #[command(alias = "ls")]
    Links(LinksArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Command Arguments ────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ShortenArgs {
    /// The URL to shorten
    pub url: String,

    /// Custom slug (requires a signed-in account)
    #[arg(long)]
    pub slug: Option<String>,
}

#[derive(Debug, Args)]
pub struct LoginArgs {
    /// Store the password in the system keyring and the email in the profile
    #[arg(long)]
    pub save: bool,
}

#[derive(Debug, Args)]
pub struct RegisterArgs {
    /// Display name for the new account
    #[arg(long, short = 'n')]
    pub name: String,
}

#[derive(Debug, Args)]
pub struct LinksArgs {
    /// Keep running and re-render whenever the list refreshes
    #[arg(long, short = 'w')]
    pub watch: bool,
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create initial config file with guided setup
    Init,

    /// Display current configuration (secrets masked)
    Show,

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },

    /// Store the active profile's password in the system keyring
    SetPassword,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
