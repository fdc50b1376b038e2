use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shelfscope_core::SearchConfig;

use crate::error::Result;
use crate::identifiers::isbn::IsbnCode;

/// One result from a book-metadata search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub thumbnail: Option<String>,
}

impl SearchHit {
    pub fn new(title: impl Into<String>, thumbnail: Option<&str>) -> Self {
        Self {
            title: title.into(),
            thumbnail: thumbnail.map(ToOwned::to_owned),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IsbnRecord {
    pub title: String,
    pub cover: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderBy {
    Relevance,
}

impl OrderBy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Relevance => "relevance",
        }
    }
}

/// Restrictions applied to every paged search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchFilters {
    pub page_size: u32,
    pub print_type: String,
    pub language: String,
}

impl SearchFilters {
    pub fn from_config(config: &SearchConfig) -> Self {
        Self {
            page_size: config.page_size,
            print_type: config.print_type.clone(),
            language: config.language.clone(),
        }
    }
}

impl Default for SearchFilters {
    fn default() -> Self {
        Self::from_config(&SearchConfig::default())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub query: String,
    pub start_index: u32,
    pub max_results: u32,
    pub print_type: String,
    pub language: String,
    pub order_by: Option<OrderBy>,
}

impl SearchRequest {
    /// Request for the zero-based `page` of `query`.
    pub fn page(query: impl Into<String>, page: u32, filters: &SearchFilters) -> Self {
        Self {
            query: query.into(),
            start_index: page.saturating_mul(filters.page_size),
            max_results: filters.page_size,
            print_type: filters.print_type.clone(),
            language: filters.language.clone(),
            order_by: None,
        }
    }

    pub fn ordered_by(mut self, order: OrderBy) -> Self {
        self.order_by = Some(order);
        self
    }
}

/// Query → results search over a book-metadata service.
#[async_trait]
pub trait ExternalSearch: Send + Sync {
    fn name(&self) -> &str;

    async fn search(&self, request: &SearchRequest) -> Result<Vec<SearchHit>>;
}

/// Lookup of a single book by ISBN.
#[async_trait]
pub trait IsbnLookup: Send + Sync {
    async fn lookup_isbn(&self, isbn: &IsbnCode) -> Result<Option<IsbnRecord>>;
}

pub mod google_books;

#[cfg(test)]
pub(crate) mod fake;
