pub mod kv;
pub mod migrate;
pub mod store;

pub use kv::{JsonDirStore, KeyValueStore, MemoryStore};
pub use migrate::{BOOKS_KEY, LEGACY_BOOKS_KEY, LoadReport, SERIES_MAX_KEY, load_catalog};
pub use store::CatalogStore;
