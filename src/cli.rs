//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::models::Platform;
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

/// ReviewTrends - app-store review collector and trend analytics
///
/// Collects Play Store reviews for social media apps and turns the
/// processed tables into a trend report: KPIs, rating and sentiment
/// distributions, daily volume and share, a 30-day forecast and
/// engagement by rating.
///
/// Examples:
///   reviewtrends collect --service-url http://localhost:8080
///   reviewtrends collect --apps facebook,twitter --max-reviews 5000
///   reviewtrends report --platforms instagram,snapchat
///   reviewtrends report --forecast-platform twitter --format json -o report.json
///   reviewtrends init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Path to configuration file
    ///
    /// If not specified, looks for .reviewtrends.toml in the current directory
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Collect raw reviews from the review service
    Collect(CollectArgs),
    /// Build the trend report from processed tables
    Report(ReportArgs),
    /// Generate a default .reviewtrends.toml configuration file
    InitConfig,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct CollectArgs {
    /// Review service base URL
    #[arg(long, value_name = "URL", env = "REVIEWTRENDS_SERVICE_URL")]
    pub service_url: Option<String>,

    /// Output file for the raw review table
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Reviews requested per page
    #[arg(long, value_name = "COUNT")]
    pub page_size: Option<usize>,

    /// Maximum reviews collected per app
    #[arg(long, value_name = "COUNT")]
    pub max_reviews: Option<usize>,

    /// Apps to collect (comma-separated)
    ///
    /// Example: --apps facebook,instagram
    #[arg(long, value_name = "PLATFORMS", value_delimiter = ',')]
    pub apps: Option<Vec<Platform>>,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Retries per page on transient failures
    #[arg(long, value_name = "NUM")]
    pub retries: Option<usize>,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct ReportArgs {
    /// Cleaned review table (CSV)
    #[arg(long, value_name = "FILE")]
    pub cleaned: Option<PathBuf>,

    /// Sentiment-scored review table (CSV)
    #[arg(long, value_name = "FILE")]
    pub sentiment: Option<PathBuf>,

    /// Output file path for the report
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Platforms to include (comma-separated, default: all)
    #[arg(long, value_name = "PLATFORMS", value_delimiter = ',')]
    pub platforms: Option<Vec<Platform>>,

    /// Platform to forecast (default: first selected platform)
    #[arg(long, value_name = "PLATFORM")]
    pub forecast_platform: Option<Platform>,

    /// Days to forecast
    #[arg(long, value_name = "DAYS")]
    pub horizon: Option<usize>,

    /// Leave rejected rows out of the report
    #[arg(long)]
    pub no_rejections: bool,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        match &self.command {
            Command::Collect(args) => args.validate(),
            Command::Report(args) => args.validate(),
            Command::InitConfig => Ok(()),
        }
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

impl CollectArgs {
    fn validate(&self) -> Result<(), String> {
        if let Some(ref url) = self.service_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("Service URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if self.page_size == Some(0) {
            return Err("Page size must be at least 1".to_string());
        }

        if self.max_reviews == Some(0) {
            return Err("Max reviews must be at least 1".to_string());
        }

        if self.timeout == Some(0) {
            return Err("Timeout must be at least 1 second".to_string());
        }

        if matches!(self.apps, Some(ref apps) if apps.is_empty()) {
            return Err("At least one app must be selected".to_string());
        }

        Ok(())
    }
}

impl ReportArgs {
    fn validate(&self) -> Result<(), String> {
        if self.horizon == Some(0) {
            return Err("Forecast horizon must be at least 1 day".to_string());
        }

        if let Some(ref platforms) = self.platforms {
            if platforms.is_empty() {
                return Err("At least one platform must be selected".to_string());
            }

            if let Some(forecast) = self.forecast_platform {
                if !platforms.contains(&forecast) {
                    return Err(format!(
                        "Forecast platform {} is not among the selected platforms",
                        forecast
                    ));
                }
            }
        }

        for path in [&self.cleaned, &self.sentiment].into_iter().flatten() {
            if !path.is_file() {
                return Err(format!("Table not found: {}", path.display()));
            }
        }

        Ok(())
    }
}
