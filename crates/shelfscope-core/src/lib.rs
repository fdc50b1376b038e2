//! Shelfscope core — series catalog, title parsing, storage, config.

pub mod catalog;
pub mod collation;
pub mod config;
pub mod error;
pub mod models;
pub mod normalize;
pub mod storage;
pub mod title;

pub use catalog::{Catalog, RegisterOutcome, UpsertOutcome};
pub use config::{AppConfig, CatalogConfig, CoverConfig, EstimateConfig, SearchConfig, StorageConfig};
pub use error::{ExitCode, Result, ShelfError};
pub use models::*;
pub use normalize::normalize_series;
pub use storage::{CatalogStore, JsonDirStore, KeyValueStore, MemoryStore};
pub use title::{ParsedTitle, parse_title};
