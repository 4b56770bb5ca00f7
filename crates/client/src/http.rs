//! Reqwest-backed [`ContentClient`].

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use url::Url;

use vorleser_types::{ChapterId, NovelId};

use crate::error::{ClientError, Result};
use crate::traits::ContentClient;
use crate::types::{ApiResponse, FetchedChapter, NovelInfo, NovelSummary};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client for the remote content API.
pub struct HttpContentClient {
    http: reqwest::Client,
    base_url: Url,
}

impl HttpContentClient {
    pub fn new(base_url: Url) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(ClientError::Init)?;
        Ok(Self { http, base_url })
    }

    fn search_url(&self, keyword: &str) -> Result<Url> {
        let mut url = self.base_url.join("/api/search")?;
        url.query_pairs_mut().append_pair("keyword", keyword);
        Ok(url)
    }

    fn info_url(&self, novel: &NovelId) -> Result<Url> {
        Ok(self.base_url.join(&format!("/api/info/{novel}"))?)
    }

    // The chapter route takes both ids in the query string; the trailing
    // path segment is a fixed placeholder the API requires.
    fn chapter_url(&self, novel: &NovelId, chapter: &ChapterId) -> Result<Url> {
        let mut url = self.base_url.join("/api/chapter/x")?;
        url.query_pairs_mut()
            .append_pair("novelId", novel.as_str())
            .append_pair("chapterId", chapter.as_str());
        Ok(url)
    }

    async fn get_envelope<T: DeserializeOwned>(&self, url: Url) -> Result<ApiResponse<T>> {
        tracing::debug!("GET {}", url);
        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| {
                if e.is_timeout() {
                    ClientError::Timeout {
                        url: url.to_string(),
                    }
                } else {
                    ClientError::Request {
                        url: url.to_string(),
                        source: e,
                    }
                }
            })?;

        response
            .json()
            .await
            .map_err(|e| ClientError::MalformedResponse {
                url: url.to_string(),
                source: e,
            })
    }
}

#[async_trait]
impl ContentClient for HttpContentClient {
    async fn search(&self, keyword: &str) -> Result<Vec<NovelSummary>> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Ok(Vec::new());
        }

        let url = self.search_url(keyword)?;
        let envelope: ApiResponse<Vec<NovelSummary>> = self.get_envelope(url).await?;
        if !envelope.success {
            return Err(ClientError::Api(
                envelope.message.unwrap_or_else(|| "Search failed".to_string()),
            ));
        }
        Ok(envelope.data.unwrap_or_default())
    }

    async fn fetch_novel_info(&self, novel: &NovelId) -> Result<NovelInfo> {
        let url = self.info_url(novel)?;
        let envelope: ApiResponse<NovelInfo> = self.get_envelope(url).await?;
        match envelope.data {
            Some(info) if envelope.success => Ok(info),
            _ => Err(ClientError::Api(envelope.message.unwrap_or_else(|| {
                format!("Failed to fetch info for novel '{novel}'")
            }))),
        }
    }

    async fn fetch_chapter(
        &self,
        novel: &NovelId,
        chapter: &ChapterId,
    ) -> Result<FetchedChapter> {
        let url = self.chapter_url(novel, chapter)?;
        let envelope: ApiResponse<FetchedChapter> = self.get_envelope(url).await?;
        match envelope.data {
            Some(fetched) if envelope.success => Ok(fetched),
            _ => Err(ClientError::Api(envelope.message.unwrap_or_else(|| {
                format!("Failed to fetch chapter '{chapter}' of '{novel}'")
            }))),
        }
    }
}
