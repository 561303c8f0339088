//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.reviewtrends.toml` files.

use crate::cli::{CollectArgs, ReportArgs};
use crate::collector::TrackedApp;
use crate::models::Platform;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration file name, looked up in the working directory.
pub const CONFIG_FILE: &str = ".reviewtrends.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Review collection settings.
    #[serde(default)]
    pub collector: CollectorConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

/// Review service and paging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectorConfig {
    /// Base URL of the review service.
    #[serde(default = "default_service_url")]
    pub service_url: String,

    /// Where the raw review table is written.
    #[serde(default = "default_raw_output")]
    pub output: String,

    /// Reviews requested per page.
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Hard cap on reviews per app.
    #[serde(default = "default_max_reviews")]
    pub max_reviews_per_app: usize,

    /// Review language.
    #[serde(default = "default_lang")]
    pub lang: String,

    /// Store country.
    #[serde(default = "default_country")]
    pub country: String,

    /// Sort order requested from the service.
    #[serde(default = "default_sort")]
    pub sort: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Retries per page on transient failures.
    #[serde(default = "default_retries")]
    pub retries: usize,

    /// Base delay between retries, in milliseconds.
    #[serde(default = "default_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Apps to collect, in order.
    #[serde(default = "default_apps")]
    pub apps: Vec<TrackedApp>,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            service_url: default_service_url(),
            output: default_raw_output(),
            page_size: default_page_size(),
            max_reviews_per_app: default_max_reviews(),
            lang: default_lang(),
            country: default_country(),
            sort: default_sort(),
            timeout_seconds: default_timeout(),
            retries: default_retries(),
            retry_backoff_ms: default_backoff_ms(),
            apps: default_apps(),
        }
    }
}

fn default_service_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_raw_output() -> String {
    "data/raw/reviews_raw.csv".to_string()
}

fn default_page_size() -> usize {
    2000
}

fn default_max_reviews() -> usize {
    50_000
}

fn default_lang() -> String {
    "en".to_string()
}

fn default_country() -> String {
    "in".to_string()
}

fn default_sort() -> String {
    "newest".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_retries() -> usize {
    3
}

fn default_backoff_ms() -> u64 {
    500
}

fn default_apps() -> Vec<TrackedApp> {
    Platform::ALL.into_iter().map(TrackedApp::new).collect()
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Cleaned review table.
    #[serde(default = "default_cleaned_path")]
    pub cleaned_path: String,

    /// Sentiment-scored review table.
    #[serde(default = "default_sentiment_path")]
    pub sentiment_path: String,

    /// Default report output path.
    #[serde(default = "default_report_output")]
    pub output: String,

    /// Platforms selected when none are given on the command line.
    #[serde(default = "default_platforms")]
    pub platforms: Vec<Platform>,

    /// Days to forecast.
    #[serde(default = "default_horizon")]
    pub forecast_horizon: usize,

    /// List rows dropped while loading tables.
    #[serde(default = "default_true")]
    pub include_rejections: bool,

    /// Maximum rejected rows listed in the report.
    #[serde(default = "default_max_rejections")]
    pub max_rejections_listed: usize,

    /// Width of text bars in Markdown charts.
    #[serde(default = "default_bar_width")]
    pub bar_width: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            cleaned_path: default_cleaned_path(),
            sentiment_path: default_sentiment_path(),
            output: default_report_output(),
            platforms: default_platforms(),
            forecast_horizon: default_horizon(),
            include_rejections: true,
            max_rejections_listed: default_max_rejections(),
            bar_width: default_bar_width(),
        }
    }
}

fn default_cleaned_path() -> String {
    "data/processed/reviews_cleaned.csv".to_string()
}

fn default_sentiment_path() -> String {
    "data/processed/reviews_sentiment_small.csv".to_string()
}

fn default_report_output() -> String {
    "review_report.md".to_string()
}

fn default_platforms() -> Vec<Platform> {
    Platform::ALL.to_vec()
}

fn default_horizon() -> usize {
    crate::forecast::DEFAULT_HORIZON
}

fn default_true() -> bool {
    true
}

fn default_max_rejections() -> usize {
    20
}

fn default_bar_width() -> usize {
    30
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Apply `collect` flags. CLI values take precedence over the file.
    pub fn merge_collect_args(&mut self, args: &CollectArgs) {
        let collector = &mut self.collector;

        if let Some(ref url) = args.service_url {
            collector.service_url = url.clone();
        }
        if let Some(ref output) = args.output {
            collector.output = output.display().to_string();
        }
        if let Some(page_size) = args.page_size {
            collector.page_size = page_size;
        }
        if let Some(max_reviews) = args.max_reviews {
            collector.max_reviews_per_app = max_reviews;
        }
        if let Some(timeout) = args.timeout {
            collector.timeout_seconds = timeout;
        }
        if let Some(retries) = args.retries {
            collector.retries = retries;
        }

        // --apps narrows the configured list, keeping configured app ids.
        if let Some(ref platforms) = args.apps {
            let configured = std::mem::take(&mut collector.apps);
            collector.apps = platforms
                .iter()
                .map(|p| {
                    configured
                        .iter()
                        .find(|app| app.platform == *p)
                        .cloned()
                        .unwrap_or_else(|| TrackedApp::new(*p))
                })
                .collect();
        }
    }

    /// Apply `report` flags. CLI values take precedence over the file.
    pub fn merge_report_args(&mut self, args: &ReportArgs) {
        let report = &mut self.report;

        if let Some(ref path) = args.cleaned {
            report.cleaned_path = path.display().to_string();
        }
        if let Some(ref path) = args.sentiment {
            report.sentiment_path = path.display().to_string();
        }
        if let Some(ref output) = args.output {
            report.output = output.display().to_string();
        }
        if let Some(ref platforms) = args.platforms {
            report.platforms = platforms.clone();
        }
        if let Some(horizon) = args.horizon {
            report.forecast_horizon = horizon;
        }
        if args.no_rejections {
            report.include_rejections = false;
        }
    }

    /// Check collector settings after CLI flags have been merged.
    ///
    /// Flags are validated by clap, but the file can still carry values the
    /// collector cannot work with.
    pub fn validate_collector(&self) -> Result<()> {
        let collector = &self.collector;

        if !collector.service_url.starts_with("http://")
            && !collector.service_url.starts_with("https://")
        {
            bail!(
                "collector.service_url must start with 'http://' or 'https://', got '{}'",
                collector.service_url
            );
        }
        if collector.page_size == 0 {
            bail!("collector.page_size must be at least 1");
        }
        if collector.max_reviews_per_app == 0 {
            bail!("collector.max_reviews_per_app must be at least 1");
        }
        if collector.timeout_seconds == 0 {
            bail!("collector.timeout_seconds must be at least 1");
        }
        if collector.apps.is_empty() {
            bail!("collector.apps must list at least one app");
        }
        if let Some(app) = collector.apps.iter().find(|a| a.app_id.trim().is_empty()) {
            bail!("collector.apps entry for {} has an empty app_id", app.platform);
        }

        Ok(())
    }

    /// Check report settings after CLI flags have been merged.
    pub fn validate_report(&self) -> Result<()> {
        let report = &self.report;

        if report.platforms.is_empty() {
            bail!("report.platforms must list at least one platform");
        }
        if report.forecast_horizon == 0 {
            bail!("report.forecast_horizon must be at least 1");
        }
        if report.bar_width == 0 {
            bail!("report.bar_width must be at least 1");
        }

        Ok(())
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
