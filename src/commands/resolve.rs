use anyhow::Result;
use colored::*;

use super::recommend::print_no_match;
use super::{load_config, open_session, Overrides};

pub fn run(overrides: Overrides, query: &str, json: bool) -> Result<()> {
    let config = load_config(overrides)?;
    let session = open_session(&config)?;

    let resolution = session.resolve(query);

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "query": query,
                "resolved": resolution,
            }))?
        );
        return Ok(());
    }

    match resolution {
        Some(r) => {
            let item = &session.items()[r.index];
            println!("{}", "Title Lookup".bold());
            println!("{}", "=".repeat(60));
            println!("Query: \"{}\"", query);
            println!("Match: {} [#{}]", r.title.cyan(), r.index);
            println!("  {} {} ({:.0}%)", "by".dimmed(), r.matcher, r.score * 100.0);
            if item.has_tags() {
                println!("  {} {}", "tags".dimmed(), item.tags);
            }
        }
        None => print_no_match(query),
    }

    Ok(())
}
