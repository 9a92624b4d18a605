//! Config subcommand handlers.

use std::collections::BTreeMap;

use dialoguer::{Input, Select};
use secrecy::ExposeSecret;
use serde::Serialize;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config, Profile, prompt_err, prompt_password};
use crate::error::CliError;
use crate::output;

const REDACTED: &str = "********";

// ── Redacted view ───────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ConfigView<'a> {
    path: String,
    default_profile: &'a str,
    profiles: BTreeMap<&'a str, Profile>,
}

fn redacted(cfg: &Config) -> ConfigView<'_> {
    let profiles = cfg
        .profiles
        .iter()
        .map(|(name, profile)| {
            let mut profile = profile.clone();
            if profile.password.is_some() {
                profile.password = Some(REDACTED.into());
            }
            (name.as_str(), profile)
        })
        .collect();
    ConfigView {
        path: config::config_path().display().to_string(),
        default_profile: cfg.default_profile_name(),
        profiles,
    }
}

fn detail(view: &ConfigView<'_>) -> String {
    let mut lines = vec![
        format!("Config file:     {}", view.path),
        format!("Default profile: {}", view.default_profile),
    ];
    for (name, p) in &view.profiles {
        lines.push(String::new());
        lines.push(format!("[{name}]"));
        lines.push(format!("  server   = {}", p.server));
        if let Some(email) = &p.email {
            lines.push(format!("  email    = {email}"));
        }
        if let Some(pw) = &p.password {
            lines.push(format!("  password = {pw}"));
        }
        if let Some(var) = &p.password_env {
            lines.push(format!("  password_env = {var}"));
        }
        if let Some(insecure) = p.insecure {
            lines.push(format!("  insecure = {insecure}"));
        }
    }
    lines.join("\n")
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init => init(),

        ConfigCommand::Show => {
            let cfg = config::load_config_or_default();
            let view = redacted(&cfg);
            let out = output::render_single(&global.output, &view, detail, |v| v.path.clone())?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Profiles => {
            let cfg = config::load_config_or_default();
            let default = cfg.default_profile_name();
            let mut names: Vec<&String> = cfg.profiles.keys().collect();
            names.sort();
            let out = names
                .iter()
                .map(|name| {
                    if name.as_str() == default {
                        format!("* {name}")
                    } else {
                        format!("  {name}")
                    }
                })
                .collect::<Vec<_>>()
                .join("\n");
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Use { name } => {
            let mut cfg = config::load_config_or_default();
            if !cfg.profiles.contains_key(&name) {
                let mut available: Vec<_> = cfg.profiles.keys().cloned().collect();
                available.sort();
                return Err(CliError::ProfileNotFound {
                    name,
                    available: available.join(", "),
                });
            }
            cfg.default_profile = Some(name.clone());
            config::save_config(&cfg)?;
            if !global.quiet {
                eprintln!("Default profile set to '{name}'");
            }
            Ok(())
        }

        ConfigCommand::SetPassword => {
            let cfg = config::load_config_or_default();
            let profile_name = config::active_profile_name(global, &cfg);
            let password = prompt_password(&format!("Password for profile '{profile_name}'"))?;
            linksnap_config::store_password(&profile_name, &password)?;
            if !global.quiet {
                eprintln!("✓ Password stored in system keyring for profile '{profile_name}'");
            }
            Ok(())
        }
    }
}

// ── Init: interactive wizard ────────────────────────────────────────

fn init() -> Result<(), CliError> {
    let config_path = config::config_path();
    eprintln!("LinkSnap CLI configuration");
    eprintln!("   Config path: {}\n", config_path.display());

    let profile_name: String = Input::new()
        .with_prompt("Profile name")
        .default("default".into())
        .interact_text()
        .map_err(prompt_err)?;

    let server: String = Input::new()
        .with_prompt("Service URL")
        .default(linksnap_config::DEFAULT_SERVER.into())
        .interact_text()
        .map_err(prompt_err)?;
    linksnap_config::parse_server(&server)?;

    let email: String = Input::new()
        .with_prompt("Account email (leave empty to stay anonymous)")
        .allow_empty(true)
        .interact_text()
        .map_err(prompt_err)?;
    let email = Some(email.trim().to_owned()).filter(|e| !e.is_empty());

    let mut password = None;
    if email.is_some() {
        let choices = &[
            "Store in system keyring (recommended)",
            "Save to config file (plaintext)",
            "Don't store, ask every time",
        ];
        let selection = Select::new()
            .with_prompt("Where to store the password?")
            .items(choices)
            .default(0)
            .interact()
            .map_err(prompt_err)?;

        if selection < 2 {
            let secret = prompt_password("Password")?;
            if selection == 0 {
                linksnap_config::store_password(&profile_name, &secret)?;
                eprintln!("   ✓ Password stored in system keyring");
            } else {
                password = Some(secret.expose_secret().to_owned());
            }
        }
    }

    let mut cfg = config::load_config_or_default();
    cfg.profiles.insert(
        profile_name.clone(),
        Profile {
            server,
            email,
            password,
            ..Profile::default()
        },
    );
    cfg.default_profile = Some(profile_name.clone());
    config::save_config(&cfg)?;

    eprintln!("\n✓ Configuration written to {}", config_path.display());
    eprintln!("  Active profile: {profile_name}");
    eprintln!("\n  Test it: linksnap whoami");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn show_masks_plaintext_passwords() {
        let mut cfg = Config::default();
        cfg.profiles.insert(
            "home".into(),
            Profile {
                email: Some("ada@example.com".into()),
                password: Some("hunter22".into()),
                ..Profile::default()
            },
        );
        let view = redacted(&cfg);
        let text = detail(&view);
        assert!(!text.contains("hunter22"));
        assert!(text.contains(REDACTED));
        assert!(text.contains("ada@example.com"));
    }
}
