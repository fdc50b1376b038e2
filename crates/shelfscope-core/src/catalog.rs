//! In-memory catalog: owned books plus per-series declared maximums.
//!
//! None of the operations here fail. Rejected input leaves state untouched
//! and is reported through the return value.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::collation::shelf_order;
use crate::models::{Book, SeriesMaxRegistry, SeriesSummary, SeriesView, VolumeKey, VolumeSlot};

const UNCATEGORIZED: &str = "未分類";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Replaced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterOutcome {
    Inserted,
    Replaced,
    /// An entry with the same key exists and overwriting was not confirmed.
    Declined,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    books: Vec<Book>,
    series_max: SeriesMaxRegistry,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_parts(books: Vec<Book>, series_max: SeriesMaxRegistry) -> Self {
        Self { books, series_max }
    }

    pub fn books(&self) -> &[Book] {
        &self.books
    }

    pub fn series_max(&self) -> &SeriesMaxRegistry {
        &self.series_max
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }

    fn position(&self, key: &VolumeKey) -> Option<usize> {
        self.books
            .iter()
            .position(|b| b.series == key.series && b.volume == key.volume)
    }

    pub fn find(&self, key: &VolumeKey) -> Option<&Book> {
        self.position(key).map(|i| &self.books[i])
    }

    pub fn contains(&self, key: &VolumeKey) -> bool {
        self.position(key).is_some()
    }

    // ─── Mutations ─────────────────────────────────────────

    /// Replace the entry with the same (series, volume) key, or append.
    ///
    /// Overwrite confirmation belongs to the caller. A numbered book raises
    /// the series' declared maximum to at least its volume.
    pub fn upsert_book(&mut self, mut book: Book) -> UpsertOutcome {
        book.volume = book.volume.filter(|v| *v > 0);
        let raised = book.volume.map(|v| (book.series.clone(), v));

        let outcome = match self.position(&book.key()) {
            Some(i) => {
                self.books[i] = book;
                UpsertOutcome::Replaced
            }
            None => {
                self.books.push(book);
                UpsertOutcome::Inserted
            }
        };

        if let Some((series, volume)) = raised {
            let floor = self.series_max.entry(series).or_insert(0);
            *floor = (*floor).max(volume);
        }

        outcome
    }

    /// Upsert, asking `confirm` first when the key is already taken.
    pub fn register(&mut self, book: Book, confirm: impl FnOnce(&Book) -> bool) -> RegisterOutcome {
        if let Some(existing) = self.find(&book.key()) {
            if !confirm(existing) {
                return RegisterOutcome::Declined;
            }
        }
        match self.upsert_book(book) {
            UpsertOutcome::Inserted => RegisterOutcome::Inserted,
            UpsertOutcome::Replaced => RegisterOutcome::Replaced,
        }
    }

    /// Remove the entry. The series' declared maximum is left as is.
    pub fn delete_book(&mut self, key: &VolumeKey) -> Option<Book> {
        self.position(key).map(|i| self.books.remove(i))
    }

    /// Replace the cover of an owned book. Returns `false` if the key is absent.
    pub fn set_cover(&mut self, key: &VolumeKey, cover: impl Into<String>) -> bool {
        let cover = cover.into();
        match self.position(key) {
            Some(i) if !cover.is_empty() => {
                self.books[i].cover = Some(cover);
                true
            }
            _ => false,
        }
    }

    /// Manual override of the declared maximum. May lower it.
    ///
    /// Returns `false` without touching state when `n` is zero.
    pub fn set_series_max(&mut self, series: &str, n: u32) -> bool {
        if n == 0 {
            return false;
        }
        self.series_max.insert(series.to_string(), n);
        true
    }

    /// Merge an estimate into the declared maximum, never lowering it.
    ///
    /// Returns the resulting declared maximum.
    pub fn apply_estimate(&mut self, series: &str, guess: u32) -> u32 {
        let current = self.series_max.get(series).copied().unwrap_or(0);
        let merged = current.max(guess);
        if merged > current {
            self.series_max.insert(series.to_string(), merged);
        }
        merged
    }

    /// Seed missing or zero registry entries from the highest owned volume.
    pub fn seed_series_max_from_owned(&mut self) -> usize {
        let mut highest: HashMap<&str, u32> = HashMap::new();
        for book in &self.books {
            if let Some(v) = book.volume {
                let e = highest.entry(book.series.as_str()).or_insert(0);
                *e = (*e).max(v);
            }
        }

        let mut seeded = 0;
        for (series, max) in highest {
            let entry = self.series_max.entry(series.to_string()).or_insert(0);
            if *entry == 0 {
                *entry = max;
                seeded += 1;
            }
        }
        seeded
    }

    // ─── Derived views ─────────────────────────────────────

    fn highest_owned(&self, series: &str) -> u32 {
        self.books
            .iter()
            .filter(|b| b.series == series)
            .filter_map(|b| b.volume)
            .max()
            .unwrap_or(0)
    }

    /// `max(declared, highest owned)`; zero when neither exists.
    pub fn effective_max(&self, series: &str) -> u32 {
        let declared = self.series_max.get(series).copied().unwrap_or(0);
        declared.max(self.highest_owned(series))
    }

    pub fn build_series_view(&self, series: &str) -> SeriesView<'_> {
        let members: Vec<&Book> = self.books.iter().filter(|b| b.series == series).collect();
        let owned: BTreeMap<u32, &Book> = members
            .iter()
            .filter_map(|b| b.volume.map(|v| (v, *b)))
            .collect();

        let effective_max = self.effective_max(series);
        let slots = if effective_max > 0 {
            (1..=effective_max)
                .map(|volume| match owned.get(&volume) {
                    Some(&book) => VolumeSlot::Owned { volume, book },
                    None => VolumeSlot::Missing { volume },
                })
                .collect()
        } else {
            members
                .into_iter()
                .map(|book| VolumeSlot::Unnumbered { book })
                .collect()
        };

        SeriesView {
            series: series.to_string(),
            effective_max,
            slots,
        }
    }

    /// All books partitioned by series, in shelf order.
    pub fn group_by_series(&self) -> Vec<(String, Vec<&Book>)> {
        let mut groups: HashMap<&str, Vec<&Book>> = HashMap::new();
        for book in &self.books {
            groups.entry(group_name(book)).or_default().push(book);
        }

        let mut grouped: Vec<(String, Vec<&Book>)> = groups
            .into_iter()
            .map(|(name, books)| (name.to_string(), books))
            .collect();
        grouped.sort_by(|a, b| shelf_order(&a.0, &b.0));
        grouped
    }

    pub fn summaries(&self) -> Vec<SeriesSummary> {
        self.group_by_series()
            .into_iter()
            .map(|(series, books)| {
                let owned: BTreeSet<u32> = books.iter().filter_map(|b| b.volume).collect();
                let highest = owned.iter().next_back().copied().unwrap_or(0);
                let declared = self.series_max.get(&series).copied().unwrap_or(0);
                SeriesSummary {
                    owned_count: owned.len(),
                    effective_max: declared.max(highest),
                    item_count: books.len(),
                    series,
                }
            })
            .collect()
    }
}

fn group_name(book: &Book) -> &str {
    if !book.series.is_empty() {
        &book.series
    } else if !book.title.is_empty() {
        &book.title
    } else {
        UNCATEGORIZED
    }
}
