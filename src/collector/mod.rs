//! Review collection.
//!
//! Pages through a review service for each tracked app, one request at a
//! time, and tags every record with its platform. A failing app is
//! recorded and skipped; it never affects rows collected for other apps.

pub mod http;

pub use http::HttpReviewSource;

use crate::models::{Platform, RawReview};
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// An app to collect reviews for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedApp {
    pub platform: Platform,
    /// Store package identifier, e.g. `com.instagram.android`.
    pub app_id: String,
}

impl TrackedApp {
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            app_id: platform.default_app_id().to_string(),
        }
    }
}

/// Parameters of one page request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest<'a> {
    pub app_id: &'a str,
    pub lang: &'a str,
    pub country: &'a str,
    pub sort: &'a str,
    pub count: usize,
    /// Continuation token from the previous page, if any.
    pub token: Option<&'a str>,
}

/// One page of reviews.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub reviews: Vec<RawReview>,
    /// Token for the next page; `None` once the service is exhausted.
    pub next_token: Option<String>,
}

/// A failed page fetch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("request timed out after {0}s")]
    Timeout(u64),
    #[error("cannot connect to review service at {0}")]
    Connect(String),
    #[error("review service returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("failed to decode review page: {0}")]
    Decode(String),
    #[error("request failed: {0}")]
    Transport(String),
}

impl FetchError {
    /// Whether the same page is worth requesting again.
    ///
    /// Timeouts, connection problems, throttling and server errors are
    /// transient. Client errors and undecodable pages are fatal for the app.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Timeout(_) | FetchError::Connect(_) | FetchError::Transport(_) => true,
            FetchError::Status { status, .. } => *status == 429 || *status >= 500,
            FetchError::Decode(_) => false,
        }
    }
}

/// Something that serves pages of reviews.
pub trait ReviewSource {
    async fn fetch_page(&self, request: &PageRequest<'_>) -> Result<Page, FetchError>;
}

/// Paging and retry settings.
#[derive(Debug, Clone)]
pub struct CollectorSettings {
    pub page_size: usize,
    pub max_reviews_per_app: usize,
    pub lang: String,
    pub country: String,
    pub sort: String,
    /// Extra attempts per page after a retryable failure.
    pub retries: usize,
    /// Delay before retry `n` is `n * retry_backoff`.
    pub retry_backoff: Duration,
    pub show_progress: bool,
}

impl Default for CollectorSettings {
    fn default() -> Self {
        Self {
            page_size: 2000,
            max_reviews_per_app: 50_000,
            lang: "en".to_string(),
            country: "in".to_string(),
            sort: "newest".to_string(),
            retries: 3,
            retry_backoff: Duration::from_millis(500),
            show_progress: true,
        }
    }
}

impl From<&crate::config::CollectorConfig> for CollectorSettings {
    fn from(config: &crate::config::CollectorConfig) -> Self {
        Self {
            page_size: config.page_size,
            max_reviews_per_app: config.max_reviews_per_app,
            lang: config.lang.clone(),
            country: config.country.clone(),
            sort: config.sort.clone(),
            retries: config.retries,
            retry_backoff: Duration::from_millis(config.retry_backoff_ms),
            show_progress: true,
        }
    }
}

/// Result of collecting one app.
#[derive(Debug, Clone, PartialEq)]
pub enum AppOutcome {
    /// Collection finished (cap reached or service exhausted).
    Collected { rows: Vec<RawReview> },
    /// Collection stopped early. `rows` holds the pages fetched before the failure.
    Failed { reason: String, rows: Vec<RawReview> },
}

impl AppOutcome {
    pub fn rows(&self) -> &[RawReview] {
        match self {
            AppOutcome::Collected { rows } | AppOutcome::Failed { rows, .. } => rows,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, AppOutcome::Failed { .. })
    }
}

/// Outcome for one tracked app.
#[derive(Debug, Clone, PartialEq)]
pub struct AppReport {
    pub app: TrackedApp,
    pub outcome: AppOutcome,
}

/// Outcomes of a whole collection run, in app order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollectionSummary {
    pub apps: Vec<AppReport>,
}

impl CollectionSummary {
    /// Every collected row, app by app.
    pub fn rows(&self) -> impl Iterator<Item = &RawReview> {
        self.apps.iter().flat_map(|a| a.outcome.rows())
    }

    pub fn total_rows(&self) -> usize {
        self.apps.iter().map(|a| a.outcome.rows().len()).sum()
    }

    pub fn failed(&self) -> impl Iterator<Item = &AppReport> {
        self.apps.iter().filter(|a| a.outcome.is_failed())
    }

    /// True when there were apps to collect and every one of them failed.
    pub fn all_failed(&self) -> bool {
        !self.apps.is_empty() && self.apps.iter().all(|a| a.outcome.is_failed())
    }
}

/// Sequential, per-app isolated review collector.
pub struct Collector<S> {
    source: S,
    settings: CollectorSettings,
}

impl<S: ReviewSource> Collector<S> {
    pub fn new(source: S, settings: CollectorSettings) -> Self {
        Self { source, settings }
    }

    /// Collect every app in order.
    pub async fn collect_all(&self, apps: &[TrackedApp]) -> CollectionSummary {
        let mut summary = CollectionSummary::default();

        for app in apps {
            println!("📥 Collecting reviews for {} ({})", app.platform, app.app_id);
            let outcome = self.collect_app(app).await;

            match &outcome {
                AppOutcome::Collected { rows } => {
                    info!("{}: collected {} reviews", app.platform, rows.len());
                }
                AppOutcome::Failed { reason, rows } => {
                    warn!(
                        "{}: collection failed after {} reviews: {}",
                        app.platform,
                        rows.len(),
                        reason
                    );
                }
            }

            summary.apps.push(AppReport {
                app: app.clone(),
                outcome,
            });
        }

        summary
    }

    /// Page through one app until the cap or the end of its reviews.
    pub async fn collect_app(&self, app: &TrackedApp) -> AppOutcome {
        let cap = self.settings.max_reviews_per_app;
        let progress = self.progress_bar(cap);

        let mut rows: Vec<RawReview> = Vec::new();
        let mut token: Option<String> = None;

        while rows.len() < cap {
            let request = PageRequest {
                app_id: &app.app_id,
                lang: &self.settings.lang,
                country: &self.settings.country,
                sort: &self.settings.sort,
                count: self.settings.page_size.min(cap - rows.len()),
                token: token.as_deref(),
            };

            let page = match self.fetch_with_retry(&request).await {
                Ok(page) => page,
                Err(e) => {
                    progress.abandon();
                    return AppOutcome::Failed {
                        reason: e.to_string(),
                        rows,
                    };
                }
            };

            if page.reviews.is_empty() {
                debug!("{}: empty page, service exhausted", app.platform);
                break;
            }

            let remaining = cap - rows.len();
            rows.extend(page.reviews.into_iter().take(remaining).map(|mut review| {
                review.platform = Some(app.platform);
                review
            }));

            progress.set_position(rows.len() as u64);
            debug!("{}: {} collected...", app.platform, rows.len());

            match page.next_token {
                Some(next) => token = Some(next),
                None => {
                    debug!("{}: no continuation token, service exhausted", app.platform);
                    break;
                }
            }
        }

        progress.finish();
        AppOutcome::Collected { rows }
    }

    /// Fetch one page, retrying transient failures with linear backoff.
    async fn fetch_with_retry(&self, request: &PageRequest<'_>) -> Result<Page, FetchError> {
        let mut attempt = 0;

        loop {
            match self.source.fetch_page(request).await {
                Ok(page) => return Ok(page),
                Err(e) if e.is_retryable() && attempt < self.settings.retries => {
                    attempt += 1;
                    warn!(
                        "Page fetch for {} failed ({}), retry {}/{}",
                        request.app_id, e, attempt, self.settings.retries
                    );
                    tokio::time::sleep(self.settings.retry_backoff * attempt as u32).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn progress_bar(&self, cap: usize) -> ProgressBar {
        if !self.settings.show_progress {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new(cap as u64);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} reviews")
            .map(|s| s.progress_chars("#>-"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        pb.set_style(style);
        pb
    }
}
