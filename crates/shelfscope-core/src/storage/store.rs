use tracing::debug;

use crate::catalog::{Catalog, RegisterOutcome, UpsertOutcome};
use crate::error::Result;
use crate::models::{Book, SeriesView, VolumeKey};
use crate::storage::kv::KeyValueStore;
use crate::storage::migrate::{BOOKS_KEY, LoadReport, SERIES_MAX_KEY, load_catalog};

/// A [`Catalog`] bound to persistent storage.
///
/// Every mutation that changes state is flushed immediately; rejected
/// mutations write nothing.
pub struct CatalogStore<S: KeyValueStore> {
    store: S,
    catalog: Catalog,
    report: LoadReport,
}

impl<S: KeyValueStore> CatalogStore<S> {
    /// Load (and migrate if needed), then write the normalized records back.
    pub fn open(store: S) -> Result<Self> {
        let (catalog, report) = load_catalog(&store)?;
        let mut this = Self {
            store,
            catalog,
            report,
        };
        this.flush()?;
        Ok(this)
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn load_report(&self) -> LoadReport {
        self.report
    }

    pub fn storage(&self) -> &S {
        &self.store
    }

    pub fn into_storage(self) -> S {
        self.store
    }

    pub fn flush(&mut self) -> Result<()> {
        let books = serde_json::to_string_pretty(self.catalog.books())?;
        let series_max = serde_json::to_string_pretty(self.catalog.series_max())?;
        self.store.set(BOOKS_KEY, &books)?;
        self.store.set(SERIES_MAX_KEY, &series_max)?;
        debug!(books = self.catalog.len(), "catalog flushed");
        Ok(())
    }

    /// Apply `mutate` and flush when it reports a change.
    ///
    /// A failed flush restores the catalog, so memory never runs ahead of disk.
    fn commit<T>(&mut self, mutate: impl FnOnce(&mut Catalog) -> (T, bool)) -> Result<T> {
        let before = self.catalog.clone();
        let (value, changed) = mutate(&mut self.catalog);
        if changed {
            if let Err(e) = self.flush() {
                self.catalog = before;
                return Err(e);
            }
        }
        Ok(value)
    }

    // ─── Mutations ─────────────────────────────────────────

    pub fn upsert_book(&mut self, book: Book) -> Result<UpsertOutcome> {
        self.commit(|catalog| (catalog.upsert_book(book), true))
    }

    pub fn register(
        &mut self,
        book: Book,
        confirm: impl FnOnce(&Book) -> bool,
    ) -> Result<RegisterOutcome> {
        self.commit(|catalog| {
            let outcome = catalog.register(book, confirm);
            (outcome, outcome != RegisterOutcome::Declined)
        })
    }

    pub fn delete_book(&mut self, key: &VolumeKey) -> Result<Option<Book>> {
        self.commit(|catalog| {
            let removed = catalog.delete_book(key);
            let changed = removed.is_some();
            (removed, changed)
        })
    }

    pub fn set_cover(&mut self, key: &VolumeKey, cover: impl Into<String>) -> Result<bool> {
        self.commit(|catalog| {
            let changed = catalog.set_cover(key, cover);
            (changed, changed)
        })
    }

    pub fn set_series_max(&mut self, series: &str, n: u32) -> Result<bool> {
        self.commit(|catalog| {
            let changed = catalog.set_series_max(series, n);
            (changed, changed)
        })
    }

    pub fn apply_estimate(&mut self, series: &str, guess: u32) -> Result<u32> {
        self.commit(|catalog| {
            let before = catalog.series_max().get(series).copied();
            let merged = catalog.apply_estimate(series, guess);
            (merged, merged > 0 && before != Some(merged))
        })
    }

    // ─── Reads ─────────────────────────────────────────────

    pub fn find(&self, key: &VolumeKey) -> Option<&Book> {
        self.catalog.find(key)
    }

    pub fn build_series_view(&self, series: &str) -> SeriesView<'_> {
        self.catalog.build_series_view(series)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ShelfError;
    use crate::storage::kv::{JsonDirStore, MemoryStore};
    use crate::storage::migrate::LEGACY_BOOKS_KEY;
    use tempfile::TempDir;

    #[test]
    fn test_mutations_are_flushed() {
        let dir = TempDir::new().unwrap();
        {
            let mut store = CatalogStore::open(JsonDirStore::new(dir.path())).unwrap();
            store
                .upsert_book(Book::new("Foo 2巻", "Foo", Some(2)))
                .unwrap();
            store.set_series_max("Foo", 10).unwrap();
        }

        let reopened = CatalogStore::open(JsonDirStore::new(dir.path())).unwrap();
        assert_eq!(reopened.catalog().len(), 1);
        assert_eq!(reopened.catalog().effective_max("Foo"), 10);
    }

    #[test]
    fn test_declined_register_writes_nothing() {
        let mut store = CatalogStore::open(MemoryStore::new()).unwrap();
        store
            .upsert_book(Book::new("Foo 1巻", "Foo", Some(1)).with_date("2020/1/1"))
            .unwrap();
        let before = store.storage().get(BOOKS_KEY).unwrap();

        let outcome = store
            .register(Book::new("Foo 1巻", "Foo", Some(1)), |_| false)
            .unwrap();
        assert_eq!(outcome, RegisterOutcome::Declined);
        assert_eq!(store.storage().get(BOOKS_KEY).unwrap(), before);
        assert_eq!(store.catalog().books()[0].acquired_date, "2020/1/1");
    }

    #[test]
    fn test_legacy_record_read_once_and_left_untouched() {
        let legacy = r#"["One Piece 5巻", {"title": "Naruto 2巻"}]"#;
        let kv = MemoryStore::new().with(LEGACY_BOOKS_KEY, legacy);

        let store = CatalogStore::open(kv).unwrap();
        assert_eq!(store.load_report().migrated_legacy, 2);
        let mut kv = store.into_storage();
        assert_eq!(kv.get(LEGACY_BOOKS_KEY).unwrap().as_deref(), Some(legacy));

        // a changed legacy record is no longer consulted
        kv.set(LEGACY_BOOKS_KEY, r#"["Bleach 1巻"]"#).unwrap();
        let store = CatalogStore::open(kv).unwrap();
        assert_eq!(store.load_report().migrated_legacy, 0);
        let series: Vec<&str> = store
            .catalog()
            .books()
            .iter()
            .map(|b| b.series.as_str())
            .collect();
        assert_eq!(series, vec!["One Piece", "Naruto"]);
    }

    #[test]
    fn test_rejected_max_leaves_state() {
        let mut store = CatalogStore::open(MemoryStore::new()).unwrap();
        assert!(!store.set_series_max("Foo", 0).unwrap());
        assert!(store.catalog().series_max().is_empty());
    }

    /// Accepts writes until `fail_writes` is set.
    #[derive(Default)]
    struct BrokenDisk {
        inner: MemoryStore,
        fail_writes: bool,
    }

    impl KeyValueStore for BrokenDisk {
        fn get(&self, key: &str) -> Result<Option<String>> {
            self.inner.get(key)
        }

        fn set(&mut self, key: &str, value: &str) -> Result<()> {
            if self.fail_writes {
                return Err(ShelfError::Storage("disk full".to_string()));
            }
            self.inner.set(key, value)
        }
    }

    #[test]
    fn test_failed_flush_rolls_back() {
        let mut store = CatalogStore::open(BrokenDisk::default()).unwrap();
        store.upsert_book(Book::new("Foo 1巻", "Foo", Some(1))).unwrap();
        store.store.fail_writes = true;

        assert!(store.upsert_book(Book::new("Foo 5巻", "Foo", Some(5))).is_err());
        assert_eq!(store.catalog().len(), 1);
        assert_eq!(store.catalog().effective_max("Foo"), 1);

        assert!(store.set_series_max("Foo", 20).is_err());
        assert_eq!(store.catalog().effective_max("Foo"), 1);

        let key = VolumeKey::new("Foo", Some(1));
        assert!(store.delete_book(&key).is_err());
        assert!(store.find(&key).is_some());
    }

    #[test]
    fn test_estimate_merge_persists() {
        let mut store = CatalogStore::open(MemoryStore::new()).unwrap();
        assert_eq!(store.apply_estimate("Foo", 0).unwrap(), 0);
        assert_eq!(store.apply_estimate("Foo", 8).unwrap(), 8);
        assert_eq!(store.apply_estimate("Foo", 3).unwrap(), 8);

        let raw = store.storage().get(SERIES_MAX_KEY).unwrap().unwrap();
        assert!(raw.contains("\"Foo\": 8"));
    }
}
