//! reelmatch configuration
//!
//! Loaded from `.reelmatch.json` in the working directory when present.
//! Every field has a default, so a partial file (or none at all) is fine.
//! Command-line flags override whatever the file says.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::error::Result;
use super::item::CatalogColumns;
use crate::search::resolver::DEFAULT_CUTOFF;
use crate::search::vectorizer::Tokenizer;

pub const CONFIG_FILE: &str = ".reelmatch.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// CSV dataset path
    #[serde(default = "default_dataset")]
    pub dataset: PathBuf,

    #[serde(default = "default_title_column")]
    pub title_column: String,

    #[serde(default = "default_tags_column")]
    pub tags_column: String,

    /// Minimum fuzzy ratio for title matching (0.0 - 1.0)
    #[serde(default = "default_cutoff")]
    pub cutoff: f32,

    /// Number of recommendations per query
    #[serde(default = "default_limit")]
    pub limit: usize,

    #[serde(default)]
    pub tokenizer: Tokenizer,

    /// SQLite similarity cache; disabled when absent
    #[serde(default)]
    pub cache: Option<PathBuf>,
}

fn default_dataset() -> PathBuf {
    PathBuf::from("movies.csv")
}

fn default_title_column() -> String {
    "title".to_string()
}

fn default_tags_column() -> String {
    "genre".to_string()
}

fn default_cutoff() -> f32 {
    DEFAULT_CUTOFF
}

fn default_limit() -> usize {
    5
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dataset: default_dataset(),
            title_column: default_title_column(),
            tags_column: default_tags_column(),
            cutoff: default_cutoff(),
            limit: default_limit(),
            tokenizer: Tokenizer::default(),
            cache: None,
        }
    }
}

impl Config {
    /// Load config from `dir`, falling back to defaults if no file exists
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE);
        if !path.exists() {
            debug!("No {} found, using defaults", CONFIG_FILE);
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)?;
        let mut config: Config = serde_json::from_str(&content)?;
        config.normalize();
        debug!(path = %path.display(), "Config loaded");
        Ok(config)
    }

    /// Pull out-of-range values back to something usable
    fn normalize(&mut self) {
        if !(0.0..=1.0).contains(&self.cutoff) {
            let cutoff = if self.cutoff.is_nan() {
                default_cutoff()
            } else {
                self.cutoff.clamp(0.0, 1.0)
            };
            warn!(configured = self.cutoff, using = cutoff, "cutoff must be within 0.0-1.0");
            self.cutoff = cutoff;
        }
        if self.limit == 0 {
            warn!("limit must be at least 1, using 1");
            self.limit = 1;
        }
    }

    pub fn columns(&self) -> CatalogColumns<'_> {
        CatalogColumns {
            title: &self.title_column,
            tags: &self.tags_column,
        }
    }
}
