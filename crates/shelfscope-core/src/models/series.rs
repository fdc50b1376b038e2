use std::collections::BTreeMap;

use serde::Serialize;

use super::book::Book;

/// Declared maximum volume per series, keyed by the exact series name.
pub type SeriesMaxRegistry = BTreeMap<String, u32>;

// ─── SeriesView ─────────────────────────────────────────────

/// One position in a series' volume grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum VolumeSlot<'a> {
    Owned { volume: u32, book: &'a Book },
    Missing { volume: u32 },
    /// A volume-less book, listed only when the series has no effective max.
    Unnumbered { book: &'a Book },
}

impl<'a> VolumeSlot<'a> {
    pub fn volume(&self) -> Option<u32> {
        match self {
            Self::Owned { volume, .. } | Self::Missing { volume } => Some(*volume),
            Self::Unnumbered { .. } => None,
        }
    }

    pub fn book(&self) -> Option<&'a Book> {
        match self {
            Self::Owned { book, .. } | Self::Unnumbered { book } => Some(book),
            Self::Missing { .. } => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing { .. })
    }
}

/// Derived owned/missing grid for a series. Never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct SeriesView<'a> {
    pub series: String,
    pub effective_max: u32,
    pub slots: Vec<VolumeSlot<'a>>,
}

impl SeriesView<'_> {
    pub fn owned_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|s| matches!(s, VolumeSlot::Owned { .. }))
            .count()
    }

    pub fn missing_volumes(&self) -> Vec<u32> {
        self.slots
            .iter()
            .filter(|s| s.is_missing())
            .filter_map(VolumeSlot::volume)
            .collect()
    }

    /// Header line for the view: `所持 owned/max`, or `巻数なし` without a max.
    pub fn status_line(&self) -> String {
        if self.effective_max > 0 {
            format!("所持 {}/{}", self.owned_count(), self.effective_max)
        } else {
            "巻数なし".to_string()
        }
    }
}

// ─── SeriesSummary ──────────────────────────────────────────

/// Shelf-level card for one series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeriesSummary {
    pub series: String,
    /// Distinct owned volume numbers.
    pub owned_count: usize,
    pub effective_max: u32,
    /// All books grouped under the series, numbered or not.
    pub item_count: usize,
}

impl SeriesSummary {
    pub fn badge(&self) -> String {
        if self.effective_max > 0 {
            format!("{}/{}", self.owned_count, self.effective_max)
        } else {
            format!("{}冊", self.item_count)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn badge_prefers_volume_ratio() {
        let s = SeriesSummary {
            series: "Foo".into(),
            owned_count: 2,
            effective_max: 5,
            item_count: 3,
        };
        assert_eq!(s.badge(), "2/5");

        let s = SeriesSummary {
            effective_max: 0,
            ..s
        };
        assert_eq!(s.badge(), "3冊");
    }
}
