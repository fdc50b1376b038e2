//! Turning raw user input into a book ready for registration.

use shelfscope_core::title::volume_label;
use shelfscope_core::{Book, parse_title};
use tracing::{info, warn};

use crate::covers::CoverFinder;
use crate::identifiers::isbn::IsbnCode;
use crate::sources::{ExternalSearch, IsbnLookup};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intake {
    /// Blank input; nothing to do.
    Empty,
    /// A book to hand to the catalog.
    Draft(Book),
    /// Input looked like an ISBN but no book was found for it.
    IsbnNotFound(IsbnCode),
}

/// Resolves typed text, scanned codes and missing-volume requests into drafts.
pub struct IntakeService<'a, S: ?Sized, L: ?Sized> {
    finder: &'a CoverFinder,
    search: &'a S,
    lookup: &'a L,
}

impl<'a, S, L> IntakeService<'a, S, L>
where
    S: ExternalSearch + ?Sized,
    L: IsbnLookup + ?Sized,
{
    pub fn new(finder: &'a CoverFinder, search: &'a S, lookup: &'a L) -> Self {
        Self {
            finder,
            search,
            lookup,
        }
    }

    /// ISBN-looking input goes through the ISBN lookup; anything else is
    /// parsed as a title and given the best cover candidate.
    pub async fn resolve_input(&self, raw: &str) -> Intake {
        let raw = raw.trim();
        if raw.is_empty() {
            return Intake::Empty;
        }
        match IsbnCode::parse(raw) {
            Ok(isbn) => self.resolve_isbn(isbn).await,
            Err(_) => Intake::Draft(self.resolve_title(raw).await),
        }
    }

    pub async fn resolve_isbn(&self, isbn: IsbnCode) -> Intake {
        if !isbn.checksum_ok() {
            warn!(%isbn, "ISBN check digit mismatch, looking it up anyway");
        }
        let record = match self.lookup.lookup_isbn(&isbn).await {
            Ok(Some(record)) => record,
            Ok(None) => return Intake::IsbnNotFound(isbn),
            Err(e) => {
                warn!(%isbn, "ISBN lookup failed: {e}");
                return Intake::IsbnNotFound(isbn);
            }
        };

        let parsed = parse_title(&record.title);
        info!(%isbn, title = %record.title, "resolved ISBN");
        Intake::Draft(
            Book::new(record.title, parsed.series, parsed.volume)
                .with_cover(record.cover)
                .with_isbn(Some(isbn.to_string())),
        )
    }

    pub async fn resolve_title(&self, raw: &str) -> Book {
        let parsed = parse_title(raw);
        let cover = self
            .finder
            .first_cover(&parsed.series, parsed.volume, self.search)
            .await;
        Book::new(raw.trim(), parsed.series, parsed.volume).with_cover(cover)
    }

    /// Draft for a volume shown as missing in a series view.
    pub async fn missing_volume(&self, series: &str, volume: u32) -> Book {
        let cover = self.finder.first_cover(series, Some(volume), self.search).await;
        Book::new(volume_label(series, Some(volume)), series, Some(volume)).with_cover(cover)
    }
}
