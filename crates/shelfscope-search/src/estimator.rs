use shelfscope_core::normalize::same_series;
use shelfscope_core::{CatalogConfig, EstimateConfig, SearchConfig, parse_title};
use tracing::{debug, warn};

use crate::sources::{ExternalSearch, SearchFilters, SearchRequest};

/// Best-effort guess of a series' last volume from search result titles.
///
/// The result is not verified. A stray title can push the guess too high
/// and sparse results leave it too low.
#[derive(Debug, Clone)]
pub struct VolumeEstimator {
    pages: u32,
    max_volume: u32,
    filters: SearchFilters,
}

impl Default for VolumeEstimator {
    fn default() -> Self {
        Self::from_config(&EstimateConfig::default(), &SearchConfig::default())
    }
}

impl VolumeEstimator {
    pub fn from_config(estimate: &EstimateConfig, search: &SearchConfig) -> Self {
        Self {
            pages: estimate.pages,
            max_volume: CatalogConfig::default().max_volume,
            filters: SearchFilters::from_config(search),
        }
    }

    /// Volumes above `max` in search titles are ignored.
    pub fn with_max_volume(mut self, max: u32) -> Self {
        self.max_volume = max;
        self
    }

    /// Highest volume seen for `series` across the scanned pages, or 0.
    ///
    /// A failed page contributes nothing; the estimate never errors.
    pub async fn estimate<S>(&self, series: &str, search: &S) -> u32
    where
        S: ExternalSearch + ?Sized,
    {
        let mut best = 0;

        for page in 0..self.pages {
            let request = SearchRequest::page(series, page, &self.filters);
            let hits = match search.search(&request).await {
                Ok(hits) => hits,
                Err(e) => {
                    warn!(source = search.name(), page, "estimate page failed: {e}");
                    continue;
                }
            };

            for hit in &hits {
                let parsed = parse_title(&hit.title);
                let Some(volume) = parsed.volume else {
                    continue;
                };
                if !same_series(&parsed.series, series) {
                    continue;
                }
                if volume > self.max_volume {
                    warn!(title = %hit.title, volume, max = self.max_volume, "ignoring implausible volume");
                    continue;
                }
                best = best.max(volume);
            }
        }

        debug!(series, best, "volume estimate");
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::SearchHit;
    use crate::sources::fake::FakeSearch;

    fn titles(titles: &[&str]) -> Vec<SearchHit> {
        titles.iter().map(|t| SearchHit::new(*t, None)).collect()
    }

    #[tokio::test]
    async fn takes_max_across_pages_for_matching_series() {
        let search = FakeSearch::new()
            .page("ハイキュー!!", 0, titles(&["ハイキュー!! 3", "ハイキュー！！ 第12巻", "ハイキュー!! ショーセツバン!! 20"]))
            .page("ハイキュー!!", 80, titles(&["ハイキュー!! (45)", "Unrelated 99"]));

        let estimate = VolumeEstimator::default().estimate("ハイキュー!!", &search).await;
        assert_eq!(estimate, 45);

        let starts: Vec<u32> = search
            .requests
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.start_index)
            .collect();
        assert_eq!(starts, vec![0, 40, 80, 120]);
    }

    #[tokio::test]
    async fn no_evidence_is_zero() {
        let search = FakeSearch::new().page("Foo", 0, titles(&["Foo", "Bar 3"]));
        assert_eq!(VolumeEstimator::default().estimate("Foo", &search).await, 0);
    }

    #[tokio::test]
    async fn failed_pages_are_skipped() {
        let search = FakeSearch::new()
            .failing("Foo", 0)
            .page("Foo", 40, titles(&["foo 7巻"]))
            .failing("Foo", 120);
        assert_eq!(VolumeEstimator::default().estimate("Foo", &search).await, 7);
    }

    #[tokio::test]
    async fn volumes_above_ceiling_are_ignored() {
        let search = FakeSearch::new().page("Foo", 0, titles(&["Foo 4000000000", "Foo 12", "Foo (150)"]));

        assert_eq!(VolumeEstimator::default().estimate("Foo", &search).await, 150);

        let capped = VolumeEstimator::default().with_max_volume(100);
        assert_eq!(capped.estimate("Foo", &search).await, 12);
    }

    #[tokio::test]
    async fn page_count_is_configurable() {
        let search = FakeSearch::new().page("Foo", 40, titles(&["Foo 9"]));
        let estimator = VolumeEstimator::from_config(
            &EstimateConfig { pages: 1 },
            &SearchConfig::default(),
        );
        assert_eq!(estimator.estimate("Foo", &search).await, 0);
        assert_eq!(search.queries().len(), 1);
    }
}
