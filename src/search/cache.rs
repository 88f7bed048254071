//! Similarity matrix cache using SQLite
//!
//! Stores the catalog, vocabulary and matrix rows (as little-endian f32
//! BLOBs) so the O(n^2) build can be skipped on the next run. A snapshot is
//! only reused when its catalog and tokenizer equal the freshly loaded ones.

use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use tracing::{debug, info, warn};

use super::engine::{Session, SessionOptions};
use super::similarity::SimilarityMatrix;
use super::vectorizer::{Tokenizer, Vocabulary};
use crate::core::error::Result;
use crate::core::item::Item;

/// SQLite-backed snapshot of a session
pub struct MatrixCache {
    conn: Connection,
}

/// Cache statistics
#[derive(Debug)]
pub struct CacheStats {
    pub item_count: usize,
    pub vocabulary_size: usize,
    pub tokenizer: Option<String>,
    pub built_at: Option<i64>,
}

/// How a stored snapshot compares to the catalog and tokenizer in use
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Freshness {
    /// Nothing stored yet
    Empty,
    TokenizerChanged { cached: String },
    CatalogChanged,
    Fresh,
}

impl Freshness {
    pub fn is_fresh(&self) -> bool {
        matches!(self, Freshness::Fresh)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Freshness::Empty => "empty",
            Freshness::TokenizerChanged { .. } => "tokenizer_changed",
            Freshness::CatalogChanged => "catalog_changed",
            Freshness::Fresh => "fresh",
        }
    }
}

impl MatrixCache {
    /// Open or create cache at path
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        let cache = Self { conn };
        cache.init_schema()?;
        Ok(cache)
    }

    /// Open in-memory cache (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let cache = Self { conn };
        cache.init_schema()?;
        Ok(cache)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS items (
                idx INTEGER PRIMARY KEY,
                title TEXT NOT NULL,
                tags TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS vocabulary (
                col INTEGER PRIMARY KEY,
                token TEXT NOT NULL
            );

            -- One row of the similarity matrix per item
            CREATE TABLE IF NOT EXISTS matrix_rows (
                idx INTEGER PRIMARY KEY,
                scores BLOB NOT NULL
            );

            CREATE TABLE IF NOT EXISTS cache_meta (
                key TEXT PRIMARY KEY,
                value TEXT
            );
            "#,
        )?;

        Ok(())
    }

    /// Replace the cached snapshot with `session`
    pub fn store(&mut self, session: &Session) -> Result<()> {
        let tx = self.conn.transaction()?;

        tx.execute_batch(
            "DELETE FROM items; DELETE FROM vocabulary; DELETE FROM matrix_rows; DELETE FROM cache_meta;",
        )?;

        {
            let mut insert_item =
                tx.prepare("INSERT INTO items (idx, title, tags) VALUES (?1, ?2, ?3)")?;
            for (idx, item) in session.items().iter().enumerate() {
                insert_item.execute(params![idx as i64, item.title, item.tags])?;
            }

            let mut insert_token =
                tx.prepare("INSERT INTO vocabulary (col, token) VALUES (?1, ?2)")?;
            for (col, token) in session.vocabulary().tokens().iter().enumerate() {
                insert_token.execute(params![col as i64, token])?;
            }

            let mut insert_row =
                tx.prepare("INSERT INTO matrix_rows (idx, scores) VALUES (?1, ?2)")?;
            let matrix = session.matrix();
            for idx in 0..matrix.size() {
                insert_row.execute(params![idx as i64, scores_to_blob(matrix.row(idx))])?;
            }
        }

        let set_meta = |key: &str, value: &str| {
            tx.execute(
                "INSERT INTO cache_meta (key, value) VALUES (?1, ?2) ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                params![key, value],
            )
        };
        set_meta("tokenizer", session.tokenizer().as_str())?;
        set_meta("built_at", &chrono::Utc::now().timestamp().to_string())?;

        tx.commit()?;
        info!(items = session.items().len(), "Similarity cache written");
        Ok(())
    }

    /// Restore a session if the snapshot was built from exactly `items`
    /// with the requested tokenizer. Returns None on any mismatch.
    pub fn load(&self, items: &[Item], options: &SessionOptions) -> Result<Option<Session>> {
        let freshness = self.freshness(items, options.tokenizer)?;
        if !freshness.is_fresh() {
            debug!(state = freshness.as_str(), "Cache not reusable");
            return Ok(None);
        }

        let vocabulary = Vocabulary::from_tokens(self.load_tokens()?);
        let matrix = match SimilarityMatrix::from_rows(self.load_rows()?) {
            Some(m) => m,
            None => {
                debug!("Cached matrix is not square");
                return Ok(None);
            }
        };

        let session = Session::from_parts(items.to_vec(), vocabulary, matrix, options)?;
        if session.is_some() {
            info!(items = items.len(), "Similarity matrix restored from cache");
        }
        Ok(session)
    }

    /// Compare the snapshot against `items` and `tokenizer` without
    /// reading the matrix
    pub fn freshness(&self, items: &[Item], tokenizer: Tokenizer) -> Result<Freshness> {
        let Some(cached) = self.get_meta("tokenizer")? else {
            return Ok(Freshness::Empty);
        };
        if cached != tokenizer.as_str() {
            return Ok(Freshness::TokenizerChanged { cached });
        }
        if self.load_items()? != items {
            return Ok(Freshness::CatalogChanged);
        }
        Ok(Freshness::Fresh)
    }

    fn load_items(&self) -> Result<Vec<Item>> {
        let mut stmt = self
            .conn
            .prepare("SELECT title, tags FROM items ORDER BY idx")?;
        let rows = stmt.query_map([], |row| {
            let title: String = row.get(0)?;
            let tags: String = row.get(1)?;
            Ok(Item::new(title, tags))
        })?;

        let mut items = Vec::new();
        for row in rows {
            items.push(row?);
        }
        Ok(items)
    }

    fn load_tokens(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT token FROM vocabulary ORDER BY col")?;
        let rows = stmt.query_map([], |row| row.get(0))?;

        let mut tokens = Vec::new();
        for row in rows {
            tokens.push(row?);
        }
        Ok(tokens)
    }

    fn load_rows(&self) -> Result<Vec<Vec<f32>>> {
        let mut stmt = self
            .conn
            .prepare("SELECT scores FROM matrix_rows ORDER BY idx")?;
        let rows = stmt.query_map([], |row| row.get::<_, Vec<u8>>(0))?;

        let mut result = Vec::new();
        for row in rows {
            result.push(blob_to_scores(&row?));
        }
        Ok(result)
    }

    /// Get cache statistics
    pub fn get_stats(&self) -> Result<CacheStats> {
        let item_count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM items", [], |row| row.get(0))?;

        let vocabulary_size: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM vocabulary", [], |row| row.get(0))?;

        let built_at = self
            .get_meta("built_at")?
            .and_then(|v| v.parse::<i64>().ok());

        Ok(CacheStats {
            item_count: item_count as usize,
            vocabulary_size: vocabulary_size as usize,
            tokenizer: self.get_meta("tokenizer")?,
            built_at,
        })
    }

    fn get_meta(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM cache_meta WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }
}

/// Build a session, going through the cache at `cache_path` when given.
///
/// A stale or missing snapshot is rebuilt and written back. Cache failures
/// are logged and never fail the build; only session errors propagate.
pub fn build_cached(
    items: Vec<Item>,
    options: &SessionOptions,
    cache_path: Option<&Path>,
) -> Result<Session> {
    let Some(path) = cache_path else {
        return Session::build(items, options);
    };

    let mut cache = match open_for_write(path) {
        Ok(cache) => cache,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Cache unavailable, building without it");
            return Session::build(items, options);
        }
    };

    match cache.load(&items, options) {
        Ok(Some(session)) => return Ok(session),
        Ok(None) => {}
        Err(e) => warn!(path = %path.display(), error = %e, "Cache unreadable, rebuilding"),
    }

    let session = Session::build(items, options)?;
    if let Err(e) = cache.store(&session) {
        warn!(path = %path.display(), error = %e, "Failed to write cache");
    }
    Ok(session)
}

/// Open the cache, creating its parent directory first
pub fn open_for_write(path: &Path) -> Result<MatrixCache> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    MatrixCache::open(path)
}

fn scores_to_blob(scores: &[f32]) -> Vec<u8> {
    let mut blob = Vec::with_capacity(scores.len() * 4);
    for &val in scores {
        blob.extend_from_slice(&val.to_le_bytes());
    }
    blob
}

fn blob_to_scores(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items() -> Vec<Item> {
        vec![
            Item::new("The Matrix", "Sci-Fi Action"),
            Item::new("The Matrix Reloaded", "Sci-Fi Action"),
            Item::new("Titanic", "Romance Drama"),
            Item::new("Blank", ""),
        ]
    }

    #[test]
    fn test_round_trip() -> anyhow::Result<()> {
        let options = SessionOptions::default();
        let session = Session::build(items(), &options)?;

        let mut cache = MatrixCache::open_in_memory()?;
        cache.store(&session)?;

        let restored = cache.load(&items(), &options)?.expect("cache hit");
        assert_eq!(restored.matrix(), session.matrix());
        assert_eq!(restored.vocabulary(), session.vocabulary());

        let stats = cache.get_stats()?;
        assert_eq!(stats.item_count, 4);
        assert_eq!(stats.vocabulary_size, session.vocabulary().len());
        assert_eq!(stats.tokenizer.as_deref(), Some(Tokenizer::Word.as_str()));
        assert!(stats.built_at.is_some());
        Ok(())
    }

    #[test]
    fn test_rejects_other_catalog() -> anyhow::Result<()> {
        let options = SessionOptions::default();
        let mut cache = MatrixCache::open_in_memory()?;
        cache.store(&Session::build(items(), &options)?)?;

        let mut changed = items();
        changed[2].tags = "Romance".to_string();
        assert!(cache.load(&changed, &options)?.is_none());
        assert!(cache.load(&items()[..2], &options)?.is_none());
        Ok(())
    }

    #[test]
    fn test_rejects_other_tokenizer() -> anyhow::Result<()> {
        let mut cache = MatrixCache::open_in_memory()?;
        cache.store(&Session::build(items(), &SessionOptions::default())?)?;

        let tag_options = SessionOptions {
            tokenizer: Tokenizer::Tag,
            ..SessionOptions::default()
        };
        assert!(cache.load(&items(), &tag_options)?.is_none());
        Ok(())
    }

    #[test]
    fn test_freshness() -> anyhow::Result<()> {
        let mut cache = MatrixCache::open_in_memory()?;
        assert_eq!(cache.freshness(&items(), Tokenizer::Word)?, Freshness::Empty);

        let session = Session::build(items(), &SessionOptions::default())?;
        cache.store(&session)?;
        assert!(cache.freshness(&items(), Tokenizer::Word)?.is_fresh());
        assert_eq!(
            cache.freshness(&items(), Tokenizer::Tag)?,
            Freshness::TokenizerChanged {
                cached: "word".to_string()
            }
        );

        let mut changed = items();
        changed[2].tags = "Romance".to_string();
        assert_eq!(
            cache.freshness(&changed, Tokenizer::Word)?,
            Freshness::CatalogChanged
        );
        Ok(())
    }

    #[test]
    fn test_empty_cache_misses() -> anyhow::Result<()> {
        let cache = MatrixCache::open_in_memory()?;
        assert!(cache.load(&items(), &SessionOptions::default())?.is_none());
        let stats = cache.get_stats()?;
        assert_eq!(stats.item_count, 0);
        assert!(stats.built_at.is_none());
        Ok(())
    }

    #[test]
    fn test_build_cached_writes_file() -> anyhow::Result<()> {
        let dir = tempfile::TempDir::new()?;
        let path = dir.path().join("matrix.db");
        let options = SessionOptions::default();

        let first = build_cached(items(), &options, Some(&path))?;
        assert!(path.exists());

        let second = build_cached(items(), &options, Some(&path))?;
        assert_eq!(first.matrix(), second.matrix());
        Ok(())
    }

    #[test]
    fn test_build_cached_creates_parent_dir() -> anyhow::Result<()> {
        let dir = tempfile::TempDir::new()?;
        let path = dir.path().join("nested/dir/matrix.db");

        let session = build_cached(items(), &SessionOptions::default(), Some(&path))?;
        assert_eq!(session.items().len(), 4);
        assert!(path.exists());
        Ok(())
    }

    #[test]
    fn test_build_cached_ignores_non_database_file() -> anyhow::Result<()> {
        let dir = tempfile::TempDir::new()?;
        let path = dir.path().join("movies.csv");
        std::fs::write(&path, "title,genre\nHeat,Crime Thriller\nAlien,Horror\n")?;

        let session = build_cached(items(), &SessionOptions::default(), Some(&path))?;
        assert_eq!(session.items().len(), 4);
        assert!(session.recommend("The Matrix")?[0].score > 0.0);
        // the file is left as it was
        assert!(std::fs::read_to_string(&path)?.starts_with("title,genre"));
        Ok(())
    }

    #[test]
    fn test_build_cached_unusable_path() -> anyhow::Result<()> {
        let dir = tempfile::TempDir::new()?;
        // a regular file where a directory is expected
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "")?;
        let path = blocker.join("matrix.db");

        let session = build_cached(items(), &SessionOptions::default(), Some(&path))?;
        assert_eq!(session.items().len(), 4);
        Ok(())
    }

    #[test]
    fn test_build_cached_still_fails_on_empty_catalog() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("matrix.db");
        let result = build_cached(Vec::new(), &SessionOptions::default(), Some(&path));
        assert!(matches!(result, Err(crate::core::error::RecommendError::EmptyDataset)));
    }

    #[test]
    fn test_blob_conversion() {
        let scores = vec![1.0, 0.0, 0.70710677, -0.5];
        assert_eq!(blob_to_scores(&scores_to_blob(&scores)), scores);
    }
}
