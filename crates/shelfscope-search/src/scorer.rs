//! Relevance ranking of cover candidates.
//!
//! Substring matching only: a title containing "12" scores for volume 1 too.

use std::collections::HashSet;

use shelfscope_core::CoverConfig;

use crate::sources::SearchHit;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreWeights {
    /// Title contains the volume number.
    pub volume_digits: u32,
    /// Title contains `第N巻`.
    pub volume_marker: u32,
    /// Title contains the series name.
    pub series_name: u32,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        let config = CoverConfig::default();
        Self {
            volume_digits: config.volume_digits,
            volume_marker: config.volume_marker,
            series_name: config.series_name,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CandidateScorer {
    weights: ScoreWeights,
    page_size: usize,
}

impl Default for CandidateScorer {
    fn default() -> Self {
        Self::from_config(&CoverConfig::default())
    }
}

/// The localized "volume N" marker.
pub fn volume_marker(volume: u32) -> String {
    format!("第{volume}巻")
}

impl CandidateScorer {
    pub fn from_config(config: &CoverConfig) -> Self {
        Self {
            weights: ScoreWeights {
                volume_digits: config.volume_digits,
                volume_marker: config.volume_marker,
                series_name: config.series_name,
            },
            page_size: config.page_size,
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn score(&self, title: &str, series: &str, volume: Option<u32>) -> u32 {
        let mut score = 0;
        if let Some(v) = volume {
            if title.contains(&v.to_string()) {
                score += self.weights.volume_digits;
            }
            if title.contains(&volume_marker(v)) {
                score += self.weights.volume_marker;
            }
        }
        if title.contains(series) {
            score += self.weights.series_name;
        }
        score
    }

    /// Unique thumbnail URLs, best first, at most one page.
    ///
    /// Equal scores keep their order of first appearance. Hits without a
    /// thumbnail are skipped.
    pub fn rank(&self, hits: &[SearchHit], series: &str, volume: Option<u32>) -> Vec<String> {
        let mut scored: Vec<(u32, &str)> = hits
            .iter()
            .filter_map(|hit| {
                let thumb = hit.thumbnail.as_deref().filter(|t| !t.is_empty())?;
                Some((self.score(&hit.title, series, volume), thumb))
            })
            .collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0));

        let mut seen = HashSet::new();
        scored
            .into_iter()
            .filter(|(_, url)| seen.insert(*url))
            .take(self.page_size)
            .map(|(_, url)| url.to_string())
            .collect()
    }
}
