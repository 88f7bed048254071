use anyhow::Result;
use colored::*;
use serde::Serialize;

use super::{load_config, open_session, Overrides};

const TOP_TOKENS: usize = 10;

#[derive(Serialize)]
struct CatalogStatus {
    dataset: String,
    tokenizer: &'static str,
    items: usize,
    vocabulary_size: usize,
    untagged: usize,
    top_tokens: Vec<(String, usize)>,
    cache: Option<String>,
    warnings: Vec<String>,
}

pub fn run(overrides: Overrides, json: bool) -> Result<()> {
    let config = load_config(overrides)?;
    let session = open_session(&config)?;
    let stats = session.stats(TOP_TOKENS);

    let mut warnings = Vec::new();
    if stats.untagged > 0 {
        warnings.push(format!(
            "{} items have no tags and will score 0.0 against everything",
            stats.untagged
        ));
    }
    let duplicates = count_duplicate_titles(session.items());
    if duplicates > 0 {
        warnings.push(format!(
            "{} duplicate titles; lookups return the first occurrence",
            duplicates
        ));
    }

    let status = CatalogStatus {
        dataset: config.dataset.display().to_string(),
        tokenizer: session.tokenizer().as_str(),
        items: stats.items,
        vocabulary_size: stats.vocabulary_size,
        untagged: stats.untagged,
        top_tokens: stats.top_tokens,
        cache: config.cache.as_ref().map(|p| p.display().to_string()),
        warnings,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!("{}", "Catalog Status".bold());
    println!("{}", "=".repeat(60));
    println!("Dataset:    {}", status.dataset);
    println!("Items:      {}", status.items.to_string().cyan());
    println!(
        "Vocabulary: {} tokens ({} tokenizer)",
        status.vocabulary_size.to_string().cyan(),
        status.tokenizer
    );
    println!("Untagged:   {}", status.untagged);
    if let Some(ref cache) = status.cache {
        println!("Cache:      {}", cache);
    }

    if !status.top_tokens.is_empty() {
        println!();
        println!("{}", "Top tokens".bold());
        for (token, count) in &status.top_tokens {
            println!("  {:<20} {}", token, count.to_string().dimmed());
        }
    }

    if !status.warnings.is_empty() {
        println!();
        for warning in &status.warnings {
            println!("{} {}", "!".yellow().bold(), warning);
        }
    }

    Ok(())
}

fn count_duplicate_titles(items: &[reelmatch::Item]) -> usize {
    let mut seen = std::collections::HashSet::new();
    items.iter().filter(|i| !seen.insert(i.title.as_str())).count()
}
