use anyhow::Result;
use vaultplay_model::format_timestamp;

use super::{Context, content_ref};

pub fn show(ctx: &Context, series: &str, episode: &str) -> Result<()> {
    let content = content_ref(series, episode)?;
    match ctx.progress().load(&content) {
        Some(offset) => println!("{content} {}", format_timestamp(offset)),
        None => println!("{content} no progress recorded"),
    }
    Ok(())
}

pub fn list(ctx: &Context) -> Result<()> {
    let entries = ctx.progress().entries();
    if entries.is_empty() {
        println!("no progress recorded");
        return Ok(());
    }
    for entry in entries {
        println!(
            "{} {}",
            entry.content_ref,
            format_timestamp(entry.offset_seconds)
        );
    }
    Ok(())
}

pub fn clear(ctx: &Context, series: &str, episode: &str) -> Result<()> {
    let content = content_ref(series, episode)?;
    if ctx.progress().clear(&content) {
        println!("cleared {content}");
    } else {
        println!("{content} no progress recorded");
    }
    Ok(())
}
