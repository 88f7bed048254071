mod commands;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use commands::Overrides;
use reelmatch::Tokenizer;

#[derive(Parser)]
#[command(name = "reelmatch")]
#[command(about = "Recommend movies with similar genres, with typo-tolerant title lookup", long_about = None)]
#[command(version)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args)]
struct GlobalArgs {
    #[arg(long, global = true, help = "CSV dataset (default: movies.csv)")]
    data: Option<PathBuf>,
    #[arg(long, global = true, help = "Minimum fuzzy match ratio, 0.0-1.0 (default: 0.4)")]
    cutoff: Option<f32>,
    #[arg(long, global = true, value_enum, help = "Tag tokenization (default: word)")]
    tokenizer: Option<Tokenizer>,
    #[arg(long, global = true, help = "SQLite similarity cache path")]
    cache: Option<PathBuf>,
    #[arg(long, global = true, help = "Ignore any configured cache")]
    no_cache: bool,
    #[arg(short, long, global = true, action = clap::ArgAction::Count, help = "More log output (-v, -vv, -vvv)")]
    verbose: u8,
}

impl GlobalArgs {
    fn overrides(&self) -> Overrides {
        Overrides {
            data: self.data.clone(),
            cutoff: self.cutoff,
            tokenizer: self.tokenizer,
            cache: self.cache.clone(),
            no_cache: self.no_cache,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Ask for titles in a loop (default)
    Interactive,
    /// Recommend items similar to a title
    #[command(alias = "rec")]
    Recommend {
        query: String,
        #[arg(
            long,
            short,
            value_parser = parse_limit,
            help = "Number of recommendations, at least 1 (default: 5)"
        )]
        limit: Option<usize>,
        #[arg(long, help = "JSON output")]
        json: bool,
    },
    /// Show which title a query resolves to
    Resolve {
        query: String,
        #[arg(long, help = "JSON output")]
        json: bool,
    },
    /// Describe the loaded catalog
    Status {
        #[arg(long, help = "JSON output")]
        json: bool,
    },
    /// Build the similarity cache
    Index {
        #[arg(long, help = "Show cache status only")]
        status: bool,
        #[arg(long, help = "Force rebuild cache")]
        rebuild: bool,
        #[arg(long, help = "JSON output")]
        json: bool,
    },
}

fn parse_limit(value: &str) -> Result<usize, String> {
    match value.parse::<usize>() {
        Ok(0) => Err("must be at least 1".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(e.to_string()),
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.global.verbose);

    let overrides = cli.global.overrides();

    match cli.command.unwrap_or(Commands::Interactive) {
        Commands::Interactive => commands::interactive::run(overrides),
        Commands::Recommend { query, limit, json } => {
            commands::recommend::run(overrides, &query, limit, json)
        }
        Commands::Resolve { query, json } => commands::resolve::run(overrides, &query, json),
        Commands::Status { json } => commands::status::run(overrides, json),
        Commands::Index {
            status,
            rebuild,
            json,
        } => commands::index::run(overrides, status, rebuild, json),
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
