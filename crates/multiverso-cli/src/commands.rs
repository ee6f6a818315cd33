//! Command handlers. Each one refreshes connectivity first when it reads
//! catalog data, then prints plain text to stdout.

use anyhow::{bail, Result};
use tracing::debug;

use multiverso_core::{
    AppContext, CharacterFilters, CharacterId, Config, DataSource, FeedPhase,
};

use crate::format;

fn source_label(source: DataSource) -> &'static str {
    match source {
        DataSource::Remote => "live",
        DataSource::Cache => "cached",
    }
}

/// Banner shown whenever results come from the snapshot
fn print_offline_banner(ctx: &AppContext) {
    match ctx.cache.age_display() {
        Some(age) => println!("Offline - showing characters cached {}", age),
        None => println!("Offline - nothing cached yet"),
    }
}

async fn check_connectivity(ctx: &AppContext) -> bool {
    let online = ctx.refresh_connectivity().await;
    if !online {
        print_offline_banner(ctx);
    }
    online
}

pub async fn browse(ctx: &AppContext, filters: CharacterFilters, pages: u32) -> Result<()> {
    let online = check_connectivity(ctx).await;
    if !online && filters.name_query().is_some() {
        println!("Name search needs a connection; ignoring --name");
    }

    let mut feed = ctx.feed();
    feed.reset(filters);
    feed.wait_until_settled().await;

    for _ in 1..pages {
        if !feed.has_more() || feed.phase() == FeedPhase::Error {
            break;
        }
        feed.load_next();
        feed.wait_until_settled().await;
    }

    for character in feed.items() {
        println!("{}", format::character_row(character, ctx.favorites.contains(character.id)));
    }

    println!();
    match feed.phase() {
        FeedPhase::Error => {
            let reason = feed.last_error().unwrap_or("unknown error");
            println!("{} characters loaded, next page failed: {}", feed.items().len(), reason);
        }
        _ if feed.has_more() => println!(
            "{} characters loaded, more available (use --pages {})",
            feed.items().len(),
            feed.next_page()
        ),
        _ => println!("{} characters, end of list", feed.items().len()),
    }
    debug!(phase = ?feed.phase(), next_page = feed.next_page(), "Browse finished");
    Ok(())
}

pub async fn show(ctx: &AppContext, id: CharacterId) -> Result<()> {
    check_connectivity(ctx).await;

    let Some(detail) = ctx.character_detail(id).await else {
        bail!("Character {} not found", id);
    };
    let character = &detail.character;

    println!("{} (#{})", character.name, character.id);
    println!("  Status:    {} {}", format::status_marker(character.status), character.status);
    println!("  Species:   {}", character.species_display());
    println!("  Gender:    {:?}", character.gender);
    println!("  Origin:    {}", character.origin.name);
    println!("  Location:  {}", character.location.name);
    println!("  Episodes:  {}", character.episodes.len());
    println!("  Created:   {}", format::format_date(&character.created));
    println!("  Favorite:  {}", if ctx.favorites.contains(id) { "yes" } else { "no" });
    println!("  Source:    {}", source_label(detail.source));

    if !detail.episodes.is_empty() {
        println!();
        for episode in &detail.episodes {
            println!("{}", format::episode_row(episode));
        }
    }
    Ok(())
}

pub async fn list_favorites(ctx: &AppContext) {
    if ctx.favorites.is_empty() {
        println!("No favorites yet");
        return;
    }

    check_connectivity(ctx).await;
    let resolved = ctx.resolve_favorites().await;

    for character in &resolved.characters {
        println!("{}", format::character_row(character, true));
    }

    let missing = ctx.favorites.len().saturating_sub(resolved.characters.len());
    println!();
    println!(
        "{} favorites ({})",
        ctx.favorites.len(),
        source_label(resolved.source)
    );
    if missing > 0 {
        println!("{} not available offline", missing);
    }
}

pub async fn stats(ctx: &AppContext) {
    check_connectivity(ctx).await;
    let (stats, source) = ctx.stats().await;

    println!("Characters: {}", stats.total);
    println!("  Alive:    {}", stats.alive);
    println!("  Dead:     {}", stats.dead);
    println!("Source:     {}", source_label(source));

    match ctx.cache.age_display() {
        Some(age) if ctx.cache.is_stale() => println!("Last synced {} (stale)", age),
        Some(age) => println!("Last synced {}", age),
        None => println!("Never synced"),
    }
}

pub fn print_config(config: &Config, save: bool) -> Result<()> {
    if save {
        let path = config.save()?;
        println!("Saved {}", path.display());
    }
    println!("Config file:  {}", Config::config_path()?.display());
    println!("API:          {}", config.api_base_url());
    println!("Data dir:     {}", config.data_dir()?.display());
    println!("Offline:      {}", config.start_offline);
    Ok(())
}
