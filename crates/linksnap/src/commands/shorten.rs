//! `linksnap shorten`: create a short link.

use serde::Serialize;
use url::Url;

use linksnap_core::absolute_link;

use super::Ctx;
use crate::cli::{OutputFormat, ShortenArgs};
use crate::error::CliError;
use crate::output;

#[derive(Debug, Serialize)]
struct Created<'a> {
    short_url: &'a str,
    full_url: &'a str,
}

pub async fn handle(ctx: &Ctx<'_>, args: ShortenArgs) -> Result<(), CliError> {
    let target = validate_target(&args.url)?;
    let slug = args.slug.as_deref().map(str::trim).filter(|s| !s.is_empty());

    // Anonymous shortening works; a custom slug needs an account.
    if slug.is_some() {
        ctx.sign_in().await?;
    }

    let spinner = output::spinner("Shortening", ctx.global.quiet);
    let result = ctx.client.create_short_url(target.as_str(), slug).await;
    if let Some(bar) = spinner {
        bar.finish_and_clear();
    }
    let short = result.map_err(|e| ctx.core_err(e))?;
    let link = absolute_link(ctx.client.base_url(), &short);

    let created = Created {
        short_url: &link,
        full_url: target.as_str(),
    };
    let rendered = match ctx.global.output {
        OutputFormat::Table => format!(
            "{} {}\n  {}",
            output::success("✓", ctx.color),
            link,
            output::muted(&format!("→ {}", created.full_url), ctx.color)
        ),
        _ => output::render_single(
            &ctx.global.output,
            &created,
            |_| String::new(),
            |c| c.short_url.to_owned(),
        )?,
    };
    ctx.print(&rendered);
    Ok(())
}

/// Only absolute http(s) URLs can be shortened.
fn validate_target(raw: &str) -> Result<Url, CliError> {
    let invalid = |reason: &str| CliError::Validation {
        field: "url".into(),
        reason: reason.into(),
    };
    let url = Url::parse(raw.trim()).map_err(|_| invalid("not a valid URL"))?;
    match url.scheme() {
        "http" | "https" if url.host_str().is_some() => Ok(url),
        "http" | "https" => Err(invalid("missing host")),
        _ => Err(invalid("must start with http:// or https://")),
    }
}
