use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;
use shelfscope_core::SearchConfig;

use crate::error::{Result, SearchError};
use crate::http::RateLimitedClient;
use crate::identifiers::isbn::IsbnCode;
use crate::sources::{ExternalSearch, IsbnLookup, IsbnRecord, SearchHit, SearchRequest};

// ─── Response shape ─────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
struct VolumesResponse {
    #[serde(default)]
    items: Vec<VolumeItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VolumeItem {
    #[serde(default)]
    volume_info: Option<VolumeInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VolumeInfo {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    image_links: Option<ImageLinks>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImageLinks {
    #[serde(default)]
    thumbnail: Option<String>,
    #[serde(default)]
    small_thumbnail: Option<String>,
}

impl VolumeInfo {
    fn thumbnail(&self) -> Option<String> {
        let links = self.image_links.as_ref()?;
        links
            .thumbnail
            .as_deref()
            .or(links.small_thumbnail.as_deref())
            .filter(|url| !url.is_empty())
            .map(secure_url)
    }
}

/// Upgrade the first `http://` to `https://`.
pub fn secure_url(url: &str) -> String {
    url.replacen("http://", "https://", 1)
}

// ─── Source ─────────────────────────────────────────────────

/// Google Books `volumes` endpoint.
pub struct GoogleBooksSource {
    client: RateLimitedClient,
    base_url: String,
}

impl GoogleBooksSource {
    pub fn from_config(config: &SearchConfig) -> Result<Self> {
        Ok(Self {
            client: RateLimitedClient::new(
                Duration::from_millis(config.min_interval_ms),
                config.max_retries,
                &config.user_agent,
            )?,
            base_url: config.base_url.clone(),
        })
    }

    fn volumes_url(&self) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| SearchError::Parse(format!("invalid URL {}: {e}", self.base_url)))?;
        url.path_segments_mut()
            .map_err(|_| SearchError::Parse("invalid Google Books base URL".to_string()))?
            .pop_if_empty()
            .push("volumes");
        Ok(url)
    }

    fn search_url(&self, request: &SearchRequest) -> Result<Url> {
        let mut url = self.volumes_url()?;
        {
            let mut q = url.query_pairs_mut();
            q.append_pair("q", &request.query)
                .append_pair("maxResults", &request.max_results.to_string())
                .append_pair("startIndex", &request.start_index.to_string())
                .append_pair("printType", &request.print_type)
                .append_pair("langRestrict", &request.language);
            if let Some(order) = request.order_by {
                q.append_pair("orderBy", order.as_str());
            }
        }
        Ok(url)
    }

    async fn fetch(&self, url: &Url) -> Result<VolumesResponse> {
        self.client.get_json(url.as_str()).await
    }
}

#[async_trait]
impl ExternalSearch for GoogleBooksSource {
    fn name(&self) -> &str {
        "google_books"
    }

    async fn search(&self, request: &SearchRequest) -> Result<Vec<SearchHit>> {
        let url = self.search_url(request)?;
        let response = self.fetch(&url).await?;
        Ok(response
            .items
            .into_iter()
            .filter_map(|item| item.volume_info)
            .map(|info| SearchHit {
                thumbnail: info.thumbnail(),
                title: info.title.unwrap_or_default(),
            })
            .collect())
    }
}

#[async_trait]
impl IsbnLookup for GoogleBooksSource {
    async fn lookup_isbn(&self, isbn: &IsbnCode) -> Result<Option<IsbnRecord>> {
        let mut url = self.volumes_url()?;
        url.query_pairs_mut()
            .append_pair("q", &format!("isbn:{isbn}"))
            .append_pair("maxResults", "1");

        let response = self.fetch(&url).await?;
        Ok(response
            .items
            .into_iter()
            .find_map(|item| item.volume_info)
            .map(|info| IsbnRecord {
                cover: info.thumbnail(),
                title: info.title.unwrap_or_default(),
            }))
    }
}
