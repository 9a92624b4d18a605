//! `linksnap links`: the signed-in user's links with click counts.

use std::io::IsTerminal;

use chrono::Local;
use futures_util::StreamExt;
use tabled::Tabled;
use tracing::debug;

use linksnap_core::{CacheEntry, EntryStatus, ShortUrl};

use super::Ctx;
use crate::cli::{LinksArgs, OutputFormat};
use crate::error::CliError;
use crate::output;

const TARGET_WIDTH: usize = 50;

#[derive(Tabled)]
struct LinkRow {
    #[tabled(rename = "Short link")]
    link: String,
    #[tabled(rename = "Target")]
    target: String,
    #[tabled(rename = "Clicks")]
    clicks: String,
}

fn to_row(ctx: &Ctx<'_>, item: &ShortUrl) -> LinkRow {
    LinkRow {
        link: item.link(ctx.client.base_url()),
        target: output::truncate(&item.full_url, TARGET_WIDTH),
        clicks: item.clicks.to_string(),
    }
}

/// Settled means a fetch has resolved and none is outstanding.
fn is_settled(entry: &CacheEntry<ShortUrl>) -> bool {
    !entry.is_pending() && !entry.is_fetching
}

pub async fn handle(ctx: &Ctx<'_>, args: LinksArgs) -> Result<(), CliError> {
    ctx.sign_in().await?;

    let result = if args.watch {
        watch(ctx).await
    } else {
        once(ctx).await
    };
    ctx.client.shutdown();
    result
}

async fn once(ctx: &Ctx<'_>) -> Result<(), CliError> {
    let mut sub = ctx.client.my_links();
    let spinner = output::spinner("Loading links", ctx.global.quiet);

    let mut entry = sub.current().clone();
    while !is_settled(&entry) {
        match sub.changed().await {
            Some(next) => entry = next,
            None => break,
        }
    }
    if let Some(bar) = spinner {
        bar.finish_and_clear();
    }

    ctx.print(&render(ctx, &entry)?);
    Ok(())
}

async fn watch(ctx: &Ctx<'_>) -> Result<(), CliError> {
    let mut stream = ctx.client.my_links().into_stream();
    let clear = std::io::stdout().is_terminal() && matches!(ctx.global.output, OutputFormat::Table);

    loop {
        tokio::select! {
            next = stream.next() => {
                let Some(entry) = next else { break };
                if !is_settled(&entry) {
                    continue;
                }
                let rendered = match render(ctx, &entry) {
                    Ok(rendered) => rendered,
                    // Keep watching through transient outages.
                    Err(e) => {
                        debug!(error = %e, "refresh failed");
                        output::warning(&format!("Refresh failed: {e}"), ctx.color)
                    }
                };
                if clear {
                    print!("\x1b[2J\x1b[H");
                }
                ctx.print(&rendered);
            }
            _ = tokio::signal::ctrl_c() => {
                debug!("interrupted, leaving watch mode");
                break;
            }
        }
    }
    Ok(())
}

fn render(ctx: &Ctx<'_>, entry: &CacheEntry<ShortUrl>) -> Result<String, CliError> {
    if entry.status == EntryStatus::Error {
        match (&entry.error, &entry.data) {
            (Some(e), None) => return Err(ctx.core_err(e.clone())),
            (Some(e), Some(_)) if !ctx.global.quiet => {
                eprintln!(
                    "{}",
                    output::warning(
                        &format!("Showing earlier results: {}", e.display_message()),
                        ctx.color
                    )
                );
            }
            _ => {}
        }
    }

    let items = entry.items();
    if !matches!(ctx.global.output, OutputFormat::Table) {
        return output::render_list(
            &ctx.global.output,
            items,
            |item| to_row(ctx, item),
            |item| item.link(ctx.client.base_url()),
        );
    }

    if items.is_empty() {
        return Ok(output::muted(
            "No links yet. Create one with: linksnap shorten <url>",
            ctx.color,
        ));
    }

    let table = output::render_list(
        &ctx.global.output,
        items,
        |item| to_row(ctx, item),
        |item| item.link(ctx.client.base_url()),
    )?;
    let footer = entry.last_fetched_at.map_or_else(String::new, |at| {
        let total: u64 = items.iter().map(|i| i.clicks).sum();
        output::muted(
            &format!(
                "{} links, {total} clicks · updated {}",
                items.len(),
                at.with_timezone(&Local).format("%H:%M:%S")
            ),
            ctx.color,
        )
    });
    Ok(format!("{table}\n{footer}"))
}
