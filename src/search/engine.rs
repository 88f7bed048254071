//! Recommendation session - owns the catalog and everything derived from it
//!
//! Items, vocabulary, vectors and the similarity matrix are built together and
//! never indexed independently: row `i` of the matrix is always item `i`.

use serde::Serialize;
use std::time::Instant;
use tracing::{error, info};

use super::resolver::{Resolution, Resolver, DEFAULT_CUTOFF};
use super::similarity::SimilarityMatrix;
use super::vectorizer::{CountVectorizer, TagVector, Tokenizer, Vocabulary};
use crate::core::error::{RecommendError, Result};
use crate::core::item::Item;

/// Default number of recommendations per query
pub const DEFAULT_LIMIT: usize = 5;

/// A ranked recommendation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub index: usize,
    pub title: String,
    pub tags: String,
    pub score: f32,
}

/// Knobs for building a session
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionOptions {
    pub tokenizer: Tokenizer,
    pub cutoff: f32,
    pub limit: usize,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            tokenizer: Tokenizer::default(),
            cutoff: DEFAULT_CUTOFF,
            limit: DEFAULT_LIMIT,
        }
    }
}

/// Summary of a built session
#[derive(Debug, Clone, Serialize)]
pub struct SessionStats {
    pub items: usize,
    pub vocabulary_size: usize,
    pub untagged: usize,
    /// Most common tokens with the number of items carrying them
    pub top_tokens: Vec<(String, usize)>,
}

/// Catalog plus similarity matrix, ready to answer queries
pub struct Session {
    items: Vec<Item>,
    vectorizer: CountVectorizer,
    vocabulary: Vocabulary,
    vectors: Vec<TagVector>,
    matrix: SimilarityMatrix,
    resolver: Resolver,
    limit: usize,
}

impl Session {
    /// Vectorize the items and compute the full similarity matrix.
    ///
    /// Blocks until the matrix is complete. Refuses an empty catalog.
    pub fn build(items: Vec<Item>, options: &SessionOptions) -> Result<Self> {
        if items.is_empty() {
            return Err(RecommendError::EmptyDataset);
        }

        let start = Instant::now();
        let vectorizer = CountVectorizer::new(options.tokenizer);
        let (vocabulary, vectors) = vectorizer.fit_transform(&items);
        let matrix = SimilarityMatrix::compute(&vectors);

        info!(
            items = items.len(),
            vocabulary = vocabulary.len(),
            tokenizer = options.tokenizer.as_str(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Similarity matrix built"
        );

        Ok(Self {
            items,
            vectorizer,
            vocabulary,
            vectors,
            matrix,
            resolver: Resolver::new(options.cutoff),
            limit: options.limit,
        })
    }

    /// Reassemble a session from a previously computed matrix.
    ///
    /// Returns None if the matrix does not match the catalog size.
    pub fn from_parts(
        items: Vec<Item>,
        vocabulary: Vocabulary,
        matrix: SimilarityMatrix,
        options: &SessionOptions,
    ) -> Result<Option<Self>> {
        if items.is_empty() {
            return Err(RecommendError::EmptyDataset);
        }
        if matrix.size() != items.len() {
            return Ok(None);
        }

        let vectorizer = CountVectorizer::new(options.tokenizer);
        let vectors = items
            .iter()
            .map(|item| vectorizer.transform(&vocabulary, &item.tags))
            .collect();

        Ok(Some(Self {
            items,
            vectorizer,
            vocabulary,
            vectors,
            matrix,
            resolver: Resolver::new(options.cutoff),
            limit: options.limit,
        }))
    }

    /// Replace the resolver chain
    pub fn with_resolver(mut self, resolver: Resolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn vectors(&self) -> &[TagVector] {
        &self.vectors
    }

    pub fn matrix(&self) -> &SimilarityMatrix {
        &self.matrix
    }

    pub fn tokenizer(&self) -> Tokenizer {
        self.vectorizer.tokenizer()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Map free-text input to a title in this session
    pub fn resolve(&self, input: &str) -> Option<Resolution> {
        self.resolver.resolve(input, &self.items)
    }

    /// Top recommendations for an exact title
    pub fn recommend(&self, title: &str) -> Result<Vec<Recommendation>> {
        self.recommend_with_limit(title, self.limit)
    }

    pub fn recommend_with_limit(&self, title: &str, limit: usize) -> Result<Vec<Recommendation>> {
        match self.items.iter().position(|item| item.title == title) {
            Some(index) => Ok(self.rank(index, limit)),
            None => {
                error!(title, "Recommendation requested for a title outside the session");
                Err(RecommendError::NotIndexed(title.to_string()))
            }
        }
    }

    /// Top recommendations for a resolution produced by this session
    pub fn recommend_resolved(
        &self,
        resolution: &Resolution,
        limit: usize,
    ) -> Result<Vec<Recommendation>> {
        match self.items.get(resolution.index) {
            Some(item) if item.title == resolution.title => Ok(self.rank(resolution.index, limit)),
            _ => {
                error!(
                    title = %resolution.title,
                    index = resolution.index,
                    "Resolution does not belong to this session"
                );
                Err(RecommendError::NotIndexed(resolution.title.clone()))
            }
        }
    }

    /// Sort row `index` by score descending, ties by item order.
    /// Every item carrying the queried title is skipped, duplicates included.
    fn rank(&self, index: usize, limit: usize) -> Vec<Recommendation> {
        let title = &self.items[index].title;
        let mut scored: Vec<(usize, f32)> = self
            .matrix
            .row(index)
            .iter()
            .copied()
            .enumerate()
            .filter(|(i, _)| self.items[*i].title != *title)
            .collect();

        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        scored.truncate(limit);

        scored
            .into_iter()
            .map(|(i, score)| Recommendation {
                index: i,
                title: self.items[i].title.clone(),
                tags: self.items[i].tags.clone(),
                score,
            })
            .collect()
    }

    pub fn stats(&self, top: usize) -> SessionStats {
        let mut doc_freq = vec![0usize; self.vocabulary.len()];
        for vector in &self.vectors {
            for (col, &count) in vector.iter().enumerate() {
                if count > 0 {
                    doc_freq[col] += 1;
                }
            }
        }

        let mut top_tokens: Vec<(String, usize)> = self
            .vocabulary
            .tokens()
            .iter()
            .cloned()
            .zip(doc_freq)
            .collect();
        top_tokens.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        top_tokens.truncate(top);

        SessionStats {
            items: self.items.len(),
            vocabulary_size: self.vocabulary.len(),
            untagged: self
                .vectors
                .iter()
                .filter(|v| v.iter().all(|&c| c == 0))
                .count(),
            top_tokens,
        }
    }
}
