//! Error types for the recommendation core

use thiserror::Error;

/// Errors raised by the catalog loader, session and cache
#[derive(Debug, Error)]
pub enum RecommendError {
    /// No items were loaded; a 0x0 similarity matrix is never built
    #[error("Dataset is empty: no items to build a similarity matrix from")]
    EmptyDataset,

    /// The ranker was asked for a title the session does not hold.
    /// Titles coming out of `Session::resolve` can never trigger this.
    #[error("Title '{0}' is not indexed in this session")]
    NotIndexed(String),

    #[error("Missing column '{column}' (available: {available})")]
    MissingColumn { column: String, available: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cache error: {0}")]
    Cache(#[from] rusqlite::Error),

    #[error("Invalid config: {0}")]
    Config(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RecommendError>;
