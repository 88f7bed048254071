//! Recommend command - resolve a title and list similar items

use anyhow::Result;
use colored::Colorize;
use unicode_width::UnicodeWidthChar;

use super::{load_config, open_session, Overrides};
use reelmatch::{Item, Recommendation, Resolution, Session};

/// Column width for titles in the result table
const TITLE_WIDTH: usize = 40;

/// Run recommend command
pub fn run(overrides: Overrides, query: &str, limit: Option<usize>, json: bool) -> Result<()> {
    let config = load_config(overrides)?;
    let session = open_session(&config)?;
    let limit = limit.unwrap_or(session.limit());

    // No match is an answer, not a failure: report it and exit 0
    let Some(resolution) = session.resolve(query) else {
        if json {
            println!("{}", serde_json::to_string_pretty(&no_match_json(query))?);
        } else {
            print_no_match(query);
        }
        return Ok(());
    };

    let recommendations = session.recommend_resolved(&resolution, limit)?;

    if json {
        let source = &session.items()[resolution.index];
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "query": query,
                "resolved": resolution,
                "tags": source.tags,
                "recommendations": recommendations,
            }))?
        );
    } else {
        print_recommendations(&session, &resolution, &recommendations);
    }

    Ok(())
}

/// Same shape as a hit, with nothing resolved
fn no_match_json(query: &str) -> serde_json::Value {
    serde_json::json!({
        "query": query,
        "resolved": null,
        "recommendations": [],
    })
}

pub fn print_no_match(query: &str) {
    println!(
        "{}",
        format!("No match found for '{}'. Try another title.", query).red()
    );
}

/// Print the ranked list under a header naming the resolved item
pub fn print_recommendations(
    session: &Session,
    resolution: &Resolution,
    recommendations: &[Recommendation],
) {
    let source: &Item = &session.items()[resolution.index];

    println!();
    print!("Because you liked {}", source.title.bold().cyan());
    if source.has_tags() {
        print!(" ({})", source.tags.dimmed());
    }
    println!();
    if resolution.matcher != "exact" {
        println!(
            "  {} matched '{}' by {} ({:.0}%)",
            "→".dimmed(),
            resolution.title,
            resolution.matcher,
            resolution.score * 100.0
        );
    }
    println!("{}", "-".repeat(60));

    if recommendations.is_empty() {
        println!("{}", "Nothing else in the catalog to recommend.".yellow());
    }

    for (i, rec) in recommendations.iter().enumerate() {
        let score_str = format!("{:.2}", rec.score);
        let score_colored = if rec.score > 0.8 {
            score_str.green()
        } else if rec.score > 0.4 {
            score_str.yellow()
        } else {
            score_str.dimmed()
        };

        println!(
            "{}. [{}] {} | {}",
            (i + 1).to_string().bold(),
            score_colored,
            pad(&rec.title, TITLE_WIDTH).cyan(),
            rec.tags
        );
    }
    println!("{}", "-".repeat(60));
}

/// Pad or truncate to `width` display columns (char-aware for wide glyphs)
fn pad(text: &str, width: usize) -> String {
    let mut out = String::new();
    let mut used = 0;

    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > width {
            // leave room for the ellipsis
            while used + 1 > width {
                match out.pop() {
                    Some(last) => used -= last.width().unwrap_or(0),
                    None => break,
                }
            }
            out.push('…');
            used += 1;
            break;
        }
        out.push(c);
        used += w;
    }

    out.push_str(&" ".repeat(width.saturating_sub(used)));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use unicode_width::UnicodeWidthStr;

    fn catalog() -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "title,genre").unwrap();
        writeln!(file, "The Matrix,Sci-Fi Action").unwrap();
        writeln!(file, "Titanic,Romance Drama").unwrap();
        file
    }

    fn overrides(file: &tempfile::NamedTempFile) -> Overrides {
        Overrides {
            data: Some(file.path().to_path_buf()),
            no_cache: true,
            ..Overrides::default()
        }
    }

    #[test]
    fn test_no_match_is_not_an_error() {
        let file = catalog();
        assert!(run(overrides(&file), "zzzz", None, false).is_ok());
        assert!(run(overrides(&file), "zzzz", None, true).is_ok());
    }

    #[test]
    fn test_match_runs() {
        let file = catalog();
        assert!(run(overrides(&file), "matrx", Some(1), true).is_ok());
    }

    #[test]
    fn test_no_match_json_shape() {
        let value = no_match_json("zzzz");
        assert_eq!(value["query"], "zzzz");
        assert!(value["resolved"].is_null());
        assert_eq!(value["recommendations"].as_array().map(Vec::len), Some(0));
    }

    #[test]
    fn test_pad_short() {
        assert_eq!(pad("Heat", 6), "Heat  ");
    }

    #[test]
    fn test_pad_wide_chars() {
        // Each Hangul syllable is two columns wide
        let padded = pad("기생충", 8);
        assert_eq!(padded.width(), 8);
        assert!(padded.starts_with("기생충"));
    }

    #[test]
    fn test_pad_truncates() {
        let padded = pad("The Lord of the Rings", 10);
        assert_eq!(padded.width(), 10);
        assert!(padded.ends_with('…'));
    }
}
