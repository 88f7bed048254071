//! Similarity-based recommendation engine
//!
//! vectorizer -> similarity -> resolver + engine (ranking), with an optional
//! SQLite cache for the similarity matrix.

pub mod cache;
pub mod engine;
pub mod resolver;
pub mod similarity;
pub mod vectorizer;

pub use engine::{Recommendation, Session, SessionOptions, SessionStats};
pub use resolver::{Matcher, Resolution, Resolver};
pub use similarity::SimilarityMatrix;
pub use vectorizer::{CountVectorizer, Tokenizer, Vocabulary};
