pub mod index;
pub mod interactive;
pub mod recommend;
pub mod resolve;
pub mod status;

use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::info;

use reelmatch::search::cache::build_cached;
use reelmatch::{load_catalog, Config, Session, SessionOptions, Tokenizer};

/// Command-line values that take precedence over `.reelmatch.json`
#[derive(Debug, Default)]
pub struct Overrides {
    pub data: Option<PathBuf>,
    pub cutoff: Option<f32>,
    pub tokenizer: Option<Tokenizer>,
    pub cache: Option<PathBuf>,
    pub no_cache: bool,
}

/// Load the config file from the working directory and apply overrides
pub fn load_config(overrides: Overrides) -> Result<Config> {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let mut config = Config::load(&cwd).context("Failed to read config")?;

    if let Some(data) = overrides.data {
        config.dataset = data;
    }
    if let Some(cutoff) = overrides.cutoff.filter(|c| !c.is_nan()) {
        config.cutoff = cutoff.clamp(0.0, 1.0);
    }
    if let Some(tokenizer) = overrides.tokenizer {
        config.tokenizer = tokenizer;
    }
    if overrides.cache.is_some() {
        config.cache = overrides.cache;
    }
    if overrides.no_cache {
        config.cache = None;
    }

    Ok(config)
}

pub fn session_options(config: &Config) -> SessionOptions {
    SessionOptions {
        tokenizer: config.tokenizer,
        cutoff: config.cutoff,
        limit: config.limit,
    }
}

/// Load the catalog and build (or restore) the session
pub fn open_session(config: &Config) -> Result<Session> {
    let items = load_catalog(&config.dataset, &config.columns())
        .with_context(|| format!("Failed to load dataset '{}'", config.dataset.display()))?;
    info!(items = items.len(), dataset = %config.dataset.display(), "Dataset loaded");

    let session = build_cached(items, &session_options(config), config.cache.as_deref())
        .context("Failed to build similarity matrix")?;
    Ok(session)
}
