use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{ExternalSearch, IsbnLookup, IsbnRecord, SearchHit, SearchRequest};
use crate::error::{Result, SearchError};
use crate::identifiers::isbn::IsbnCode;

/// Scripted search backend: responses keyed by (query, start_index).
#[derive(Default)]
pub(crate) struct FakeSearch {
    pages: HashMap<(String, u32), Vec<SearchHit>>,
    failing: Vec<(String, u32)>,
    isbn: HashMap<String, IsbnRecord>,
    pub requests: Mutex<Vec<SearchRequest>>,
}

impl FakeSearch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, query: &str, start: u32, hits: Vec<SearchHit>) -> Self {
        self.pages.insert((query.to_string(), start), hits);
        self
    }

    pub fn failing(mut self, query: &str, start: u32) -> Self {
        self.failing.push((query.to_string(), start));
        self
    }

    pub fn isbn(mut self, isbn: &str, title: &str, cover: Option<&str>) -> Self {
        self.isbn.insert(
            isbn.to_string(),
            IsbnRecord {
                title: title.to_string(),
                cover: cover.map(ToOwned::to_owned),
            },
        );
        self
    }

    pub fn queries(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.query.clone())
            .collect()
    }
}

#[async_trait]
impl ExternalSearch for FakeSearch {
    fn name(&self) -> &str {
        "fake"
    }

    async fn search(&self, request: &SearchRequest) -> Result<Vec<SearchHit>> {
        self.requests.lock().unwrap().push(request.clone());
        let key = (request.query.clone(), request.start_index);
        if self.failing.contains(&key) {
            return Err(SearchError::ApiError("fake".into(), "HTTP 500".into()));
        }
        Ok(self.pages.get(&key).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl IsbnLookup for FakeSearch {
    async fn lookup_isbn(&self, isbn: &IsbnCode) -> Result<Option<IsbnRecord>> {
        Ok(self.isbn.get(isbn.as_str()).cloned())
    }
}
