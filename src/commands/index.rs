//! Index command - Build the similarity cache

use anyhow::{Context, Result};
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::warn;

use super::{load_config, session_options, Overrides};
use reelmatch::search::cache::{open_for_write, CacheStats, Freshness, MatrixCache};
use reelmatch::{load_catalog, Config, Session};

const DEFAULT_CACHE_PATH: &str = ".reelmatch/matrix.db";

/// Run index command
pub fn run(overrides: Overrides, status_only: bool, rebuild: bool, json: bool) -> Result<()> {
    let config = load_config(overrides)?;
    let cache_path = config
        .cache
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CACHE_PATH));

    if status_only {
        return show_status(&cache_path, &config, json);
    }

    if rebuild && cache_path.exists() {
        std::fs::remove_file(&cache_path)?;
        if !json {
            println!("{} Removed existing cache", "→".dimmed());
        }
    }

    let items = load_catalog(&config.dataset, &config.columns())
        .with_context(|| format!("Failed to load dataset '{}'", config.dataset.display()))?;
    let options = session_options(&config);
    let mut cache = open_for_write(&cache_path)
        .with_context(|| format!("Failed to open cache '{}'", cache_path.display()))?;

    let start = Instant::now();
    let (session, reused) = match cache.load(&items, &options)? {
        Some(session) => (session, true),
        None => {
            if !json {
                println!("{} Building similarity matrix...", "→".dimmed());
            }
            let session = Session::build(items, &options)?;
            cache.store(&session)?;
            (session, false)
        }
    };
    let duration_ms = start.elapsed().as_millis();

    if json {
        println!(
            "{}",
            serde_json::json!({
                "items": session.items().len(),
                "vocabulary_size": session.vocabulary().len(),
                "tokenizer": session.tokenizer().as_str(),
                "reused": reused,
                "duration_ms": duration_ms,
                "cache_path": cache_path.display().to_string(),
            })
        );
    } else if reused {
        println!(
            "{} Cache is up to date ({} items)",
            "✓".green().bold(),
            session.items().len().to_string().cyan()
        );
    } else {
        println!();
        println!(
            "{} Indexed {} items in {:.2}s",
            "✓".green().bold(),
            session.items().len().to_string().cyan(),
            duration_ms as f64 / 1000.0
        );
        println!(
            "  {} {} vocabulary tokens",
            "→".dimmed(),
            session.vocabulary().len()
        );
        println!("  {} Cache saved to: {}", "→".dimmed(), cache_path.display());
        if config.cache.is_none() {
            println!(
                "  {} Pass {} (or set \"cache\" in .reelmatch.json) to use it",
                "→".dimmed(),
                format!("--cache {}", cache_path.display()).cyan()
            );
        }
    }

    Ok(())
}

/// What `index --status` knows about a cache file
struct CacheReport {
    stats: CacheStats,
    file_size: u64,
    /// None when the dataset could not be loaded for comparison
    freshness: Option<Freshness>,
}

/// Inspect the cache against the configured dataset and tokenizer
fn inspect(cache_path: &Path, config: &Config) -> Result<CacheReport> {
    let cache = MatrixCache::open(cache_path)
        .with_context(|| format!("Failed to open cache '{}'", cache_path.display()))?;
    let stats = cache.get_stats()?;
    let file_size = std::fs::metadata(cache_path).map(|m| m.len()).unwrap_or(0);

    let freshness = match load_catalog(&config.dataset, &config.columns()) {
        Ok(items) => Some(cache.freshness(&items, config.tokenizer)?),
        Err(e) => {
            warn!(dataset = %config.dataset.display(), error = %e, "Dataset unavailable, cannot check cache freshness");
            None
        }
    };

    Ok(CacheReport {
        stats,
        file_size,
        freshness,
    })
}

/// Show cache status relative to the current config
fn show_status(cache_path: &Path, config: &Config, json: bool) -> Result<()> {
    if !cache_path.exists() {
        if json {
            println!(
                "{}",
                serde_json::json!({
                    "exists": false,
                    "cache_path": cache_path.display().to_string(),
                })
            );
        } else {
            println!(
                "{} No cache at {}. Run {} first.",
                "!".yellow().bold(),
                cache_path.display(),
                "reelmatch index".cyan()
            );
        }
        return Ok(());
    }

    let report = inspect(cache_path, config)?;
    let built_at = report.stats.built_at.and_then(|ts| {
        chrono::DateTime::from_timestamp(ts, 0).map(|d| d.format("%Y-%m-%d %H:%M:%S").to_string())
    });

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "exists": true,
                "cache_path": cache_path.display().to_string(),
                "dataset": config.dataset.display().to_string(),
                "state": report.freshness.as_ref().map(Freshness::as_str),
                "usable": report.freshness.as_ref().is_some_and(Freshness::is_fresh),
                "cached_tokenizer": report.stats.tokenizer,
                "configured_tokenizer": config.tokenizer.as_str(),
                "item_count": report.stats.item_count,
                "vocabulary_size": report.stats.vocabulary_size,
                "built_at": built_at,
                "file_size_bytes": report.file_size,
                "enabled": config.cache.as_deref() == Some(cache_path),
            }))?
        );
        return Ok(());
    }

    println!("{} {}", "Cache".bold(), cache_path.display());
    println!();

    match &report.freshness {
        Some(Freshness::Fresh) => println!(
            "  {} Up to date with {}",
            "✓".green().bold(),
            config.dataset.display()
        ),
        Some(Freshness::Empty) => println!(
            "  {} Empty. Run {} to fill it.",
            "!".yellow().bold(),
            "reelmatch index".cyan()
        ),
        Some(Freshness::TokenizerChanged { cached }) => println!(
            "  {} Built with the {} tokenizer, config uses {}. Run {}.",
            "!".yellow().bold(),
            cached.cyan(),
            config.tokenizer.as_str().cyan(),
            "reelmatch index".cyan()
        ),
        Some(Freshness::CatalogChanged) => println!(
            "  {} {} changed since the cache was built. Run {}.",
            "!".yellow().bold(),
            config.dataset.display(),
            "reelmatch index".cyan()
        ),
        None => println!(
            "  {} Could not read {} to compare",
            "?".yellow().bold(),
            config.dataset.display()
        ),
    }

    println!(
        "  {} {} items, {} vocabulary tokens",
        "→".dimmed(),
        report.stats.item_count.to_string().cyan(),
        report.stats.vocabulary_size.to_string().cyan()
    );
    println!(
        "  {} Built: {}",
        "→".dimmed(),
        built_at.as_deref().unwrap_or("unknown")
    );
    println!(
        "  {} Size: {:.2} KB",
        "→".dimmed(),
        report.file_size as f64 / 1024.0
    );
    if config.cache.as_deref() != Some(cache_path) {
        println!(
            "  {} Not used by queries until passed as {}",
            "→".dimmed(),
            format!("--cache {}", cache_path.display()).cyan()
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use reelmatch::{SessionOptions, Tokenizer};
    use std::io::Write;

    fn config_for(dataset: &Path) -> Config {
        Config {
            dataset: dataset.to_path_buf(),
            ..Config::default()
        }
    }

    fn write_catalog(path: &Path, rows: &[&str]) -> std::io::Result<()> {
        let mut file = std::fs::File::create(path)?;
        writeln!(file, "title,genre")?;
        for row in rows {
            writeln!(file, "{row}")?;
        }
        Ok(())
    }

    #[test]
    fn test_inspect_reports_state() -> Result<()> {
        let dir = tempfile::TempDir::new()?;
        let csv = dir.path().join("movies.csv");
        let db = dir.path().join("matrix.db");
        write_catalog(&csv, &["Heat,Crime Thriller", "Alien,Horror"])?;

        let mut config = config_for(&csv);
        let items = load_catalog(&csv, &config.columns())?;
        let session = Session::build(items, &SessionOptions::default())?;
        MatrixCache::open(&db)?.store(&session)?;

        let report = inspect(&db, &config)?;
        assert_eq!(report.freshness, Some(Freshness::Fresh));
        assert_eq!(report.stats.item_count, 2);

        config.tokenizer = Tokenizer::Tag;
        let report = inspect(&db, &config)?;
        assert_eq!(
            report.freshness,
            Some(Freshness::TokenizerChanged {
                cached: "word".to_string()
            })
        );

        config.tokenizer = Tokenizer::Word;
        write_catalog(&csv, &["Heat,Crime Thriller", "Alien,Horror", "Up,Animation"])?;
        let report = inspect(&db, &config)?;
        assert_eq!(report.freshness, Some(Freshness::CatalogChanged));
        Ok(())
    }

    #[test]
    fn test_inspect_without_dataset() -> Result<()> {
        let dir = tempfile::TempDir::new()?;
        let db = dir.path().join("matrix.db");
        MatrixCache::open(&db)?;

        let report = inspect(&db, &config_for(&dir.path().join("missing.csv")))?;
        assert!(report.freshness.is_none());
        assert_eq!(report.stats.item_count, 0);
        Ok(())
    }

    #[test]
    fn test_status_of_missing_cache() -> Result<()> {
        let dir = tempfile::TempDir::new()?;
        let config = config_for(&dir.path().join("movies.csv"));
        show_status(&dir.path().join("none.db"), &config, true)
    }
}
