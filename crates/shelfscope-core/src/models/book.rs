use std::fmt;

use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::title::volume_label;

// ─── Book ───────────────────────────────────────────────────

/// One owned volume (or a volume-less standalone book) of a series.
///
/// Serialized in the same shape as the stored `books_v3` record:
/// `{title, series, volume, cover, date, isbn}` with empty strings for a
/// missing cover or ISBN.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub title: String,
    pub series: String,
    pub volume: Option<u32>,

    #[serde(default, with = "empty_as_none")]
    pub cover: Option<String>,

    #[serde(rename = "date", default)]
    pub acquired_date: String,

    #[serde(default, with = "empty_as_none")]
    pub isbn: Option<String>,
}

impl Book {
    /// Create a book acquired today. A zero volume is treated as absent.
    pub fn new(title: impl Into<String>, series: impl Into<String>, volume: Option<u32>) -> Self {
        Self {
            title: title.into(),
            series: series.into(),
            volume: volume.filter(|v| *v > 0),
            cover: None,
            acquired_date: today_label(),
            isbn: None,
        }
    }

    pub fn with_cover(mut self, cover: Option<String>) -> Self {
        self.cover = cover.filter(|c| !c.is_empty());
        self
    }

    pub fn with_isbn(mut self, isbn: Option<String>) -> Self {
        self.isbn = isbn.filter(|i| !i.is_empty());
        self
    }

    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.acquired_date = date.into();
        self
    }

    pub fn key(&self) -> VolumeKey {
        VolumeKey {
            series: self.series.clone(),
            volume: self.volume,
        }
    }

    pub fn label(&self) -> String {
        volume_label(&self.series, self.volume)
    }
}

/// Today's date in the `YYYY/M/D` form used for acquisition dates.
pub fn today_label() -> String {
    Local::now().format("%Y/%-m/%-d").to_string()
}

// ─── VolumeKey ──────────────────────────────────────────────

/// Identity of a book within the catalog: (series, volume).
///
/// `volume: None` is its own key, so a series holds at most one
/// volume-less entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VolumeKey {
    pub series: String,
    pub volume: Option<u32>,
}

impl VolumeKey {
    pub fn new(series: impl Into<String>, volume: Option<u32>) -> Self {
        Self {
            series: series.into(),
            volume,
        }
    }
}

impl fmt::Display for VolumeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&volume_label(&self.series, self.volume))
    }
}

mod empty_as_none {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<String>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(value.as_deref().unwrap_or_default())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        let raw = Option::<String>::deserialize(d)?;
        Ok(raw.filter(|s| !s.is_empty()))
    }
}
