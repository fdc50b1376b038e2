//! Loading persisted records, including the one-time legacy migration.

use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::catalog::Catalog;
use crate::error::Result;
use crate::models::{Book, SeriesMaxRegistry};
use crate::storage::kv::KeyValueStore;
use crate::title::parse_title;

pub const BOOKS_KEY: &str = "books_v3";
pub const SERIES_MAX_KEY: &str = "seriesMax_v1";
/// Older single-array record. Read at most once, never written.
pub const LEGACY_BOOKS_KEY: &str = "books";

/// A stored book record with any field possibly missing.
#[derive(Debug, Default, Deserialize)]
struct StoredBook {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    series: Option<String>,
    #[serde(default)]
    volume: Option<Value>,
    #[serde(default)]
    cover: Option<String>,
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    isbn: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LegacyEntry {
    Title(String),
    Record(StoredBook),
}

impl StoredBook {
    /// Fill gaps: series and volume come from the title when not stored.
    fn backfill(self) -> Book {
        let title = self.title.unwrap_or_default();
        let parsed = parse_title(&title);

        let volume = match self.volume {
            None | Some(Value::Null) => parsed.volume,
            Some(v) => v
                .as_u64()
                .filter(|n| *n > 0)
                .and_then(|n| u32::try_from(n).ok()),
        };

        Book {
            series: self.series.unwrap_or(parsed.series),
            volume,
            cover: self.cover.filter(|c| !c.is_empty()),
            acquired_date: self.date.unwrap_or_default(),
            isbn: self.isbn.filter(|i| !i.is_empty()),
            title,
        }
    }
}

impl From<LegacyEntry> for StoredBook {
    fn from(entry: LegacyEntry) -> Self {
        match entry {
            LegacyEntry::Title(title) => StoredBook {
                title: Some(title),
                ..Default::default()
            },
            LegacyEntry::Record(record) => record,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Entries taken from the legacy record; zero when none was migrated.
    pub migrated_legacy: usize,
    /// Registry entries seeded from owned volumes.
    pub seeded_max: usize,
}

fn parse_legacy(raw: &str) -> Option<Vec<StoredBook>> {
    match serde_json::from_str::<Vec<LegacyEntry>>(raw) {
        Ok(entries) => Some(entries.into_iter().map(StoredBook::from).collect()),
        Err(e) => {
            warn!("ignoring unreadable legacy book record: {e}");
            None
        }
    }
}

fn parse_series_max(raw: &str) -> Result<SeriesMaxRegistry> {
    let values: std::collections::BTreeMap<String, Value> = serde_json::from_str(raw)?;
    Ok(values
        .into_iter()
        .filter_map(|(series, v)| {
            let n = v.as_u64().and_then(|n| u32::try_from(n).ok())?;
            (n > 0).then_some((series, n))
        })
        .collect())
}

/// Read both records, migrating the legacy one when the current record is absent.
pub fn load_catalog(store: &impl KeyValueStore) -> Result<(Catalog, LoadReport)> {
    let mut report = LoadReport::default();

    let stored: Vec<StoredBook> = match store.get(BOOKS_KEY)? {
        Some(raw) => serde_json::from_str(&raw)?,
        None => match store.get(LEGACY_BOOKS_KEY)?.as_deref().and_then(parse_legacy) {
            Some(legacy) => {
                report.migrated_legacy = legacy.len();
                info!("migrating {} books from legacy record", legacy.len());
                legacy
            }
            None => Vec::new(),
        },
    };

    let series_max = match store.get(SERIES_MAX_KEY)? {
        Some(raw) => parse_series_max(&raw)?,
        None => SeriesMaxRegistry::new(),
    };

    let books = stored.into_iter().map(StoredBook::backfill).collect();
    let mut catalog = Catalog::from_parts(books, series_max);
    report.seeded_max = catalog.seed_series_max_from_owned();

    Ok((catalog, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::kv::MemoryStore;

    #[test]
    fn legacy_strings_and_partial_records_are_migrated() {
        let store = MemoryStore::new().with(
            LEGACY_BOOKS_KEY,
            r#"["One Piece 5巻", {"title": "Naruto 2巻"}]"#,
        );

        let (catalog, report) = load_catalog(&store).unwrap();
        assert_eq!(report.migrated_legacy, 2);

        let books = catalog.books();
        assert_eq!(books.len(), 2);
        assert_eq!(books[0].series, "One Piece");
        assert_eq!(books[0].volume, Some(5));
        assert_eq!(books[0].title, "One Piece 5巻");
        assert_eq!(books[1].series, "Naruto");
        assert_eq!(books[1].volume, Some(2));
        assert_eq!(books[1].cover, None);

        assert_eq!(catalog.series_max()["One Piece"], 5);
        assert_eq!(catalog.series_max()["Naruto"], 2);
    }

    #[test]
    fn legacy_ignored_when_current_record_exists() {
        let store = MemoryStore::new()
            .with(LEGACY_BOOKS_KEY, r#"["One Piece 5巻"]"#)
            .with(BOOKS_KEY, "[]");

        let (catalog, report) = load_catalog(&store).unwrap();
        assert!(catalog.is_empty());
        assert_eq!(report.migrated_legacy, 0);
    }

    #[test]
    fn unreadable_legacy_record_yields_empty_catalog() {
        let store = MemoryStore::new().with(LEGACY_BOOKS_KEY, "{not json");
        let (catalog, _) = load_catalog(&store).unwrap();
        assert!(catalog.is_empty());
    }

    #[test]
    fn stored_fields_win_over_title_parse() {
        let store = MemoryStore::new().with(
            BOOKS_KEY,
            r#"[{"title": "Foo 3巻", "series": "Foo Deluxe", "volume": null, "cover": "https://c"}]"#,
        );
        let (catalog, _) = load_catalog(&store).unwrap();
        let book = &catalog.books()[0];
        assert_eq!(book.series, "Foo Deluxe");
        assert_eq!(book.volume, Some(3));
        assert_eq!(book.cover.as_deref(), Some("https://c"));
        assert_eq!(book.acquired_date, "");
    }

    #[test]
    fn non_positive_stored_volume_becomes_absent() {
        let store = MemoryStore::new().with(
            BOOKS_KEY,
            r#"[{"title": "Foo", "series": "Foo", "volume": -1}]"#,
        );
        let (catalog, _) = load_catalog(&store).unwrap();
        assert_eq!(catalog.books()[0].volume, None);
    }

    #[test]
    fn registry_keeps_only_positive_integers() {
        let store = MemoryStore::new().with(SERIES_MAX_KEY, r#"{"A": 10, "B": 0, "C": "x"}"#);
        let (catalog, _) = load_catalog(&store).unwrap();
        assert_eq!(catalog.series_max().len(), 1);
        assert_eq!(catalog.series_max()["A"], 10);
    }

    #[test]
    fn corrupt_current_record_is_an_error() {
        let store = MemoryStore::new().with(BOOKS_KEY, "{");
        assert!(load_catalog(&store).is_err());
    }
}
