//! Interactive loop - ask for a title, print recommendations, repeat

use anyhow::Result;
use colored::Colorize;
use std::io::{self, BufRead, Write};

use super::recommend::{print_no_match, print_recommendations};
use super::{load_config, open_session, Overrides};
use reelmatch::Session;

const QUIT_WORDS: &[&str] = &["q", "quit", "exit"];

pub fn run(overrides: Overrides) -> Result<()> {
    let config = load_config(overrides)?;
    let session = open_session(&config)?;

    println!("{}", "Movie Recommender".bold().cyan());
    println!("{}", "=".repeat(60));
    println!(
        "{} {} titles loaded from {}",
        "✓".green().bold(),
        session.items().len().to_string().cyan(),
        config.dataset.display()
    );

    let stdin = io::stdin();
    query_loop(&session, stdin.lock(), io::stdout())
}

/// Read queries line by line until EOF or a quit word
fn query_loop<R: BufRead, W: Write>(session: &Session, mut input: R, mut prompt: W) -> Result<()> {
    let mut line = String::new();

    loop {
        write!(prompt, "\nEnter a movie title (or 'q' to quit): ")?;
        prompt.flush()?;

        line.clear();
        if input.read_line(&mut line)? == 0 {
            println!();
            break;
        }

        let query = line.trim();
        if query.is_empty() {
            continue;
        }
        if is_quit(query) {
            println!("Goodbye!");
            break;
        }

        match session.resolve(query) {
            Some(resolution) => {
                let recommendations = session.recommend_resolved(&resolution, session.limit())?;
                print_recommendations(session, &resolution, &recommendations);
            }
            None => print_no_match(query),
        }
    }

    Ok(())
}

fn is_quit(query: &str) -> bool {
    let lower = query.to_lowercase();
    QUIT_WORDS.contains(&lower.as_str())
}
