//! Tag vectorizer
//!
//! Turns each item's free-form tag string into a count vector over a
//! vocabulary shared by the whole catalog.
//!
//! Two tokenization policies are available, and they give different
//! similarity results:
//! - `Word`: lowercase words of two or more characters (`Sci-Fi` -> `sci`, `fi`)
//! - `Tag`: whole tags separated by `,` `|` `;` `/` (`Science Fiction` stays one token)

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

use crate::core::item::Item;

lazy_static! {
    // Two or more word characters, Unicode aware
    static ref WORD_RE: Regex = Regex::new(r"\b\w\w+\b").unwrap();
}

const TAG_SEPARATORS: &[char] = &[',', '|', ';', '/'];

/// Tokenization policy for tag strings
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Tokenizer {
    #[default]
    Word,
    Tag,
}

impl Tokenizer {
    pub fn tokenize(self, text: &str) -> Vec<String> {
        let lower = text.to_lowercase();
        match self {
            Self::Word => WORD_RE
                .find_iter(&lower)
                .map(|m| m.as_str().to_string())
                .collect(),
            Self::Tag => lower
                .split(TAG_SEPARATORS)
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(|t| t.split_whitespace().collect::<Vec<_>>().join(" "))
                .collect(),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Word => "word",
            Self::Tag => "tag",
        }
    }
}

/// Distinct tokens across the catalog, in sorted column order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vocabulary {
    tokens: Vec<String>,
    columns: HashMap<String, usize>,
}

impl Vocabulary {
    pub fn from_tokens(tokens: Vec<String>) -> Self {
        let columns = tokens
            .iter()
            .enumerate()
            .map(|(i, t)| (t.clone(), i))
            .collect();
        Self { tokens, columns }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn column(&self, token: &str) -> Option<usize> {
        self.columns.get(token).copied()
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }
}

/// Count vector, one component per vocabulary token
pub type TagVector = Vec<u32>;

/// Builds the vocabulary and count vectors for a catalog
#[derive(Debug, Clone, Copy, Default)]
pub struct CountVectorizer {
    tokenizer: Tokenizer,
}

impl CountVectorizer {
    pub fn new(tokenizer: Tokenizer) -> Self {
        Self { tokenizer }
    }

    pub fn tokenizer(&self) -> Tokenizer {
        self.tokenizer
    }

    /// Build the vocabulary from all items, then count tokens per item.
    ///
    /// Vectors are returned in item order.
    pub fn fit_transform(&self, items: &[Item]) -> (Vocabulary, Vec<TagVector>) {
        let tokenized: Vec<Vec<String>> = items
            .iter()
            .map(|item| self.tokenizer.tokenize(&item.tags))
            .collect();

        let distinct: BTreeSet<&String> = tokenized.iter().flatten().collect();
        let vocabulary = Vocabulary::from_tokens(distinct.into_iter().cloned().collect());

        let vectors = tokenized
            .iter()
            .map(|tokens| self.count(&vocabulary, tokens))
            .collect();

        (vocabulary, vectors)
    }

    /// Count vector for a single tag string against an existing vocabulary.
    /// Tokens outside the vocabulary are ignored.
    pub fn transform(&self, vocabulary: &Vocabulary, tags: &str) -> TagVector {
        self.count(vocabulary, &self.tokenizer.tokenize(tags))
    }

    fn count(&self, vocabulary: &Vocabulary, tokens: &[String]) -> TagVector {
        let mut vector = vec![0u32; vocabulary.len()];
        for token in tokens {
            if let Some(col) = vocabulary.column(token) {
                vector[col] += 1;
            }
        }
        vector
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items() -> Vec<Item> {
        vec![
            Item::new("The Matrix", "Sci-Fi Action"),
            Item::new("Titanic", "Romance Drama"),
            Item::new("Untagged", ""),
            Item::new("Action Action", "action ACTION"),
        ]
    }

    #[test]
    fn test_word_tokenizer() {
        assert_eq!(Tokenizer::Word.tokenize("Sci-Fi Action"), vec!["sci", "fi", "action"]);
        // Single characters are dropped
        assert_eq!(Tokenizer::Word.tokenize("a B drama"), vec!["drama"]);
        assert!(Tokenizer::Word.tokenize("   ").is_empty());
    }

    #[test]
    fn test_tag_tokenizer() {
        assert_eq!(
            Tokenizer::Tag.tokenize("Science  Fiction, Drama|"),
            vec!["science fiction", "drama"]
        );
    }

    #[test]
    fn test_vocabulary_is_sorted() {
        let (vocab, _) = CountVectorizer::default().fit_transform(&items());
        assert_eq!(
            vocab.tokens(),
            &["action", "drama", "fi", "romance", "sci"].map(String::from)
        );
    }

    #[test]
    fn test_vectors_count_occurrences() {
        let (vocab, vectors) = CountVectorizer::default().fit_transform(&items());
        assert_eq!(vectors.len(), 4);
        for v in &vectors {
            assert_eq!(v.len(), vocab.len());
        }

        let action = vocab.column("action").unwrap();
        assert_eq!(vectors[0][action], 1);
        assert_eq!(vectors[3][action], 2);
    }

    #[test]
    fn test_empty_tags_give_zero_vector() {
        let (_, vectors) = CountVectorizer::default().fit_transform(&items());
        assert!(vectors[2].iter().all(|&c| c == 0));
    }

    #[test]
    fn test_transform_ignores_unknown_tokens() {
        let vectorizer = CountVectorizer::default();
        let (vocab, _) = vectorizer.fit_transform(&items());
        let v = vectorizer.transform(&vocab, "Drama Western");
        assert_eq!(v.iter().sum::<u32>(), 1);
    }

    #[test]
    fn test_tokenizer_names() {
        // the cache stores as_str(); config files use the serde name
        for t in [Tokenizer::Word, Tokenizer::Tag] {
            let json = serde_json::to_string(&t).unwrap();
            assert_eq!(json, format!("\"{}\"", t.as_str()));
        }
        assert!(serde_json::from_str::<Tokenizer>("\"char\"").is_err());
    }
}
