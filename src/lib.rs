//! reelmatch library
//!
//! Genre-based item recommendations with fuzzy title lookup.
//!
//! # Modules
//!
//! - `core`: Items, CSV catalog loading, config and errors
//! - `search`: Vectorizer, similarity matrix, title resolver and ranking session

pub mod core;
pub mod search;

// Re-exports for convenience
pub use crate::core::config::Config;
pub use crate::core::error::{RecommendError, Result};
pub use crate::core::item::{load_catalog, read_catalog, CatalogColumns, Item};
pub use crate::search::engine::{Recommendation, Session, SessionOptions};
pub use crate::search::resolver::{Resolution, Resolver};
pub use crate::search::vectorizer::Tokenizer;
