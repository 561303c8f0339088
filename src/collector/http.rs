//! HTTP review service client.
//!
//! Speaks a small JSON protocol:
//! `GET {base}/apps/{app_id}/reviews?lang=..&country=..&sort=..&count=..[&token=..]`
//! answered by `{"reviews": [...], "next_token": "..." | null}`.

use super::{FetchError, Page, PageRequest, ReviewSource};
use crate::models::RawReview;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct PageResponse {
    #[serde(default)]
    reviews: Vec<RawReview>,
    #[serde(default)]
    next_token: Option<String>,
}

/// Review source backed by an HTTP service.
pub struct HttpReviewSource {
    base_url: String,
    timeout_seconds: u64,
    http_client: reqwest::Client,
}

impl HttpReviewSource {
    pub fn new(base_url: &str, timeout_seconds: u64) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .user_agent(concat!("reviewtrends/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout_seconds,
            http_client,
        })
    }

    fn reviews_url(&self, app_id: &str) -> String {
        format!("{}/apps/{}/reviews", self.base_url, app_id)
    }
}

impl ReviewSource for HttpReviewSource {
    async fn fetch_page(&self, request: &PageRequest<'_>) -> Result<Page, FetchError> {
        let url = self.reviews_url(request.app_id);
        let count = request.count.to_string();

        let mut query = vec![
            ("lang", request.lang),
            ("country", request.country),
            ("sort", request.sort),
            ("count", count.as_str()),
        ];
        if let Some(token) = request.token {
            query.push(("token", token));
        }

        debug!("GET {} (count {})", url, request.count);

        let response = self
            .http_client
            .get(&url)
            .query(&query)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    FetchError::Timeout(self.timeout_seconds)
                } else if e.is_connect() {
                    FetchError::Connect(self.base_url.clone())
                } else {
                    FetchError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout(self.timeout_seconds)
            } else {
                FetchError::Transport(e.to_string())
            }
        })?;

        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let page: PageResponse =
            serde_json::from_str(&body).map_err(|e| FetchError::Decode(e.to_string()))?;

        Ok(Page {
            reviews: page.reviews,
            next_token: page.next_token.filter(|t| !t.is_empty()),
        })
    }
}
