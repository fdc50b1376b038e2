//! Shelfscope search — book-metadata lookups, cover ranking, volume estimation.

pub mod covers;
pub mod error;
pub mod estimator;
pub mod http;
pub mod identifiers;
pub mod intake;
pub mod scan;
pub mod scorer;
pub mod sources;

pub use covers::{CandidatePage, CoverFinder, merge_candidates, query_variants};
pub use error::{Result, SearchError};
pub use estimator::VolumeEstimator;
pub use identifiers::isbn::IsbnCode;
pub use intake::{Intake, IntakeService};
pub use scan::{ScannedCode, Symbology, accept_scan};
pub use scorer::{CandidateScorer, ScoreWeights};
pub use sources::google_books::GoogleBooksSource;
pub use sources::{ExternalSearch, IsbnLookup, IsbnRecord, SearchFilters, SearchHit, SearchRequest};
