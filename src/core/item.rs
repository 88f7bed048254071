use std::io::Read;
use std::path::Path;

use serde::Serialize;
use tracing::{debug, warn};

use super::error::{RecommendError, Result};

/// A catalog entry. Its id is its position in the loaded sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Item {
    pub title: String,
    pub tags: String,
}

impl Item {
    pub fn new(title: impl Into<String>, tags: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            tags: tags.into(),
        }
    }

    pub fn has_tags(&self) -> bool {
        !self.tags.trim().is_empty()
    }
}

/// Column names used when reading a catalog
#[derive(Debug, Clone)]
pub struct CatalogColumns<'a> {
    pub title: &'a str,
    pub tags: &'a str,
}

impl Default for CatalogColumns<'_> {
    fn default() -> Self {
        Self {
            title: "title",
            tags: "genre",
        }
    }
}

/// Load items from a CSV file, preserving row order
pub fn load_catalog(path: &Path, columns: &CatalogColumns<'_>) -> Result<Vec<Item>> {
    let file = std::fs::File::open(path)?;
    let items = read_catalog(file, columns)?;
    debug!(path = %path.display(), items = items.len(), "Catalog loaded");
    Ok(items)
}

/// Read items from any CSV source with a header row.
///
/// Blank titles are skipped; blank or missing tags become an empty string.
pub fn read_catalog<R: Read>(source: R, columns: &CatalogColumns<'_>) -> Result<Vec<Item>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Fields)
        .from_reader(source);

    let headers = reader.headers()?.clone();
    let title_idx = column_index(&headers, columns.title)?;
    let tags_idx = column_index(&headers, columns.tags)?;

    let mut items = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record?;
        let title = record.get(title_idx).unwrap_or("");
        if title.is_empty() {
            // +2: header line and 1-based numbering
            warn!(line = row + 2, "Skipping row without a title");
            continue;
        }
        let tags = record.get(tags_idx).unwrap_or("");
        items.push(Item::new(title, tags));
    }

    Ok(items)
}

fn column_index(headers: &csv::StringRecord, name: &str) -> Result<usize> {
    headers
        .iter()
        .position(|h| h == name)
        .ok_or_else(|| RecommendError::MissingColumn {
            column: name.to_string(),
            available: headers.iter().collect::<Vec<_>>().join(", "),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = "\
title,genre,year
The Matrix,Sci-Fi Action,1999
Titanic,,1997
,Drama,2001
Inception,Sci-Fi Thriller,2010
";

    #[test]
    fn test_read_catalog_keeps_order() {
        let items = read_catalog(SAMPLE.as_bytes(), &CatalogColumns::default()).unwrap();
        let titles: Vec<_> = items.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["The Matrix", "Titanic", "Inception"]);
    }

    #[test]
    fn test_blank_tags_become_empty() {
        let items = read_catalog(SAMPLE.as_bytes(), &CatalogColumns::default()).unwrap();
        assert_eq!(items[1].tags, "");
        assert!(!items[1].has_tags());
        assert!(items[0].has_tags());
    }

    #[test]
    fn test_missing_column() {
        let columns = CatalogColumns {
            title: "title",
            tags: "tags",
        };
        let err = read_catalog(SAMPLE.as_bytes(), &columns).unwrap_err();
        match err {
            RecommendError::MissingColumn { column, available } => {
                assert_eq!(column, "tags");
                assert_eq!(available, "title, genre, year");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_short_rows_are_tolerated() {
        let data = "title,genre\nAlien\nHeat,Crime\n";
        let items = read_catalog(data.as_bytes(), &CatalogColumns::default()).unwrap();
        assert_eq!(items, vec![Item::new("Alien", ""), Item::new("Heat", "Crime")]);
    }

    #[test]
    fn test_load_catalog_from_file() -> anyhow::Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        file.write_all(SAMPLE.as_bytes())?;

        let items = load_catalog(file.path(), &CatalogColumns::default())?;
        assert_eq!(items.len(), 3);
        Ok(())
    }
}
