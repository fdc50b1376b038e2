//! Cover-candidate generation, paging and refetch.

use std::collections::HashSet;

use shelfscope_core::{Book, CoverConfig, SearchConfig};
use tracing::{debug, warn};

use crate::identifiers::isbn::IsbnCode;
use crate::scorer::CandidateScorer;
use crate::sources::{ExternalSearch, IsbnLookup, OrderBy, SearchFilters, SearchHit, SearchRequest};

/// Search phrasings tried for a (series, volume) pair, in Google Books syntax.
pub fn query_variants(series: &str, volume: Option<u32>) -> Vec<String> {
    match volume {
        Some(v) => vec![
            format!("intitle:\"{series}\" {v} 巻"),
            format!("\"{series}\" \"{v}\" 巻"),
            format!("\"{series}\" 第{v}巻"),
            format!("{series} {v} コミックス"),
            format!("{series} {v} 単行本"),
        ],
        None => vec![
            format!("intitle:\"{series}\""),
            format!("\"{series}\" コミックス"),
            format!("{series} 単行本"),
        ],
    }
}

/// `previous` in order, then URLs from `more` not seen before.
pub fn merge_candidates(previous: &[String], more: &[String]) -> Vec<String> {
    let mut seen: HashSet<&str> = HashSet::new();
    previous
        .iter()
        .chain(more)
        .filter(|url| seen.insert(url.as_str()))
        .cloned()
        .collect()
}

#[derive(Debug, Clone, Default)]
pub struct CoverFinder {
    scorer: CandidateScorer,
    filters: SearchFilters,
}

impl CoverFinder {
    pub fn from_config(covers: &CoverConfig, search: &SearchConfig) -> Self {
        Self {
            scorer: CandidateScorer::from_config(covers),
            filters: SearchFilters::from_config(search),
        }
    }

    /// Ranked candidate URLs for one page of every query variant.
    ///
    /// Variants whose search fails are skipped; the result may be empty.
    pub async fn candidates<S>(
        &self,
        series: &str,
        volume: Option<u32>,
        page: u32,
        search: &S,
    ) -> Vec<String>
    where
        S: ExternalSearch + ?Sized,
    {
        let mut pooled: Vec<SearchHit> = Vec::new();
        for query in query_variants(series, volume) {
            let request =
                SearchRequest::page(query, page, &self.filters).ordered_by(OrderBy::Relevance);
            match search.search(&request).await {
                Ok(hits) => pooled.extend(hits),
                Err(e) => warn!(source = search.name(), query = %request.query, "cover search failed: {e}"),
            }
        }

        let ranked = self.scorer.rank(&pooled, series, volume);
        debug!(series, page, pooled = pooled.len(), ranked = ranked.len(), "cover candidates");
        ranked
    }

    /// Best candidate on the first page, if any.
    pub async fn first_cover<S>(&self, series: &str, volume: Option<u32>, search: &S) -> Option<String>
    where
        S: ExternalSearch + ?Sized,
    {
        self.candidates(series, volume, 0, search)
            .await
            .into_iter()
            .next()
    }

    /// First page of candidates for the picker, or `None` when nothing was found.
    pub async fn open_picker<S>(
        &self,
        series: &str,
        volume: Option<u32>,
        search: &S,
    ) -> Option<CandidatePage>
    where
        S: ExternalSearch + ?Sized,
    {
        let urls = self.candidates(series, volume, 0, search).await;
        if urls.is_empty() {
            return None;
        }
        Some(CandidatePage {
            series: series.to_string(),
            volume,
            page: 0,
            urls,
        })
    }

    /// A fresh cover for `book`: the ISBN record's cover when the book has an
    /// ISBN and the lookup yields one, else the best search candidate.
    pub async fn refetch<S, L>(&self, book: &Book, search: &S, lookup: &L) -> Option<String>
    where
        S: ExternalSearch + ?Sized,
        L: IsbnLookup + ?Sized,
    {
        if let Some(isbn) = book.isbn.as_deref().and_then(|i| IsbnCode::parse(i).ok()) {
            match lookup.lookup_isbn(&isbn).await {
                Ok(Some(record)) => {
                    if let Some(cover) = record.cover.filter(|c| !c.is_empty()) {
                        return Some(cover);
                    }
                }
                Ok(None) => debug!(%isbn, "no ISBN record for refetch"),
                Err(e) => warn!(%isbn, "ISBN lookup failed: {e}"),
            }
        }
        self.first_cover(&book.series, book.volume, search).await
    }
}

/// Candidates shown so far for one book, across "load more" pages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidatePage {
    pub series: String,
    pub volume: Option<u32>,
    /// Last page fetched, zero-based.
    pub page: u32,
    pub urls: Vec<String>,
}

impl CandidatePage {
    /// Fetch the next page and merge it in.
    ///
    /// Returns how many new URLs were appended. When the next page is empty
    /// nothing changes, including the page counter.
    pub async fn load_more<S>(&mut self, finder: &CoverFinder, search: &S) -> usize
    where
        S: ExternalSearch + ?Sized,
    {
        let next = self.page + 1;
        let more = finder.candidates(&self.series, self.volume, next, search).await;
        if more.is_empty() {
            return 0;
        }
        let before = self.urls.len();
        self.urls = merge_candidates(&self.urls, &more);
        self.page = next;
        self.urls.len() - before
    }
}
