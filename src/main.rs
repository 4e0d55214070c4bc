use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use royale_bots::config::MatchConfig;
use royale_bots::game::catalog::{BotCatalog, ItemCatalog};
use royale_bots::sim::{decision_digest, scenario};

fn load_catalog(path: &Path) -> Result<BotCatalog> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read bot catalog {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("failed to parse bot catalog {}", path.display()))
}

fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize logging; RUST_LOG overrides the default level
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    info!("Royale Bots v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = MatchConfig::load_or_default();
    config
        .validate()
        .map_err(anyhow::Error::msg)
        .context("invalid match configuration")?;
    info!(
        "Configuration loaded: seed={}, ticks={}, players={}, team_size={}, window={}",
        config.seed, config.ticks, config.max_players, config.team_size, config.engine.tick_window
    );

    let catalog = match &config.catalog_path {
        Some(path) => load_catalog(path)?,
        None => BotCatalog::builtin(),
    };

    let mut sim = scenario::demo(&config, catalog, ItemCatalog::builtin()).context("failed to set up match")?;
    let outcome = sim.run(config.ticks);
    let result = &outcome.result;

    info!(
        "Match over after {} ticks ({}s): {:?}, winner team {:?}, {} kills",
        sim.world.tick, result.match_duration, result.end_reason, result.winner_team, result.total_kills
    );
    for ranking in result.rankings.iter().take(5) {
        info!(
            "#{} {} team={} kills={} survived={} bot={}",
            ranking.rank, ranking.entity, ranking.team, ranking.kills, ranking.survived, ranking.is_bot
        );
    }
    info!(
        "{} decisions, digest {:016x}",
        outcome.decisions.len(),
        decision_digest(&outcome.decisions)
    );

    Ok(())
}
