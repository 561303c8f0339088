//! ReviewTrends - social media app review collector and trend analytics
//!
//! A CLI tool that pages through app-store reviews for a fixed set of
//! social media apps, then turns the processed review tables into a
//! trend report with KPIs, distributions, daily shares and a forecast.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (bad config, unreadable table, write failure, etc.)
//!   2 - Collection produced nothing: every app failed

mod analysis;
mod cli;
mod collector;
mod config;
mod dashboard;
mod forecast;
mod models;
mod report;
mod table;

use anyhow::{Context, Result};
use cli::{Args, CollectArgs, Command, OutputFormat, ReportArgs};
use collector::{Collector, CollectorSettings, HttpReviewSource};
use config::{Config, CONFIG_FILE};
use dashboard::{Dashboard, DashboardRequest, ForecastSection};
use forecast::{Forecaster, TrendForecaster};
use models::PlatformSelection;
use report::ReportOptions;
use std::path::{Path, PathBuf};
use std::time::Instant;
use table::TableKind;
use tracing::{debug, error, info};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle init-config early (no logging needed)
    if let Command::InitConfig = args.command {
        return handle_init_config();
    }

    // The config can turn on verbose logging, so it is read first.
    let (config, config_path) = match load_config(&args) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    };

    init_logging(&args, &config);

    info!("ReviewTrends v{}", env!("CARGO_PKG_VERSION"));
    match config_path {
        Some(path) => info!("Loaded config from {}", path.display()),
        None => debug!("No config file found, using defaults"),
    }
    debug!("Arguments: {:?}", args);

    let result = match &args.command {
        Command::Collect(collect) => run_collect(&args, collect, config).await,
        Command::Report(report) => run_report(report, config),
        Command::InitConfig => Ok(0),
    };

    match result {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Run failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle init-config: generate a default .reviewtrends.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).with_context(|| format!("Failed to write {}", CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE);
    println!("   Edit it to customize the review service, tracked apps, and report defaults.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args, config: &Config) {
    let level = if config.general.verbose && !args.quiet {
        tracing::Level::DEBUG
    } else {
        args.log_level()
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Collect raw reviews for every tracked app. Returns exit code (0 or 2).
async fn run_collect(args: &Args, collect: &CollectArgs, mut config: Config) -> Result<i32> {
    let start_time = Instant::now();
    config.merge_collect_args(collect);
    config.validate_collector()?;
    let settings = &config.collector;

    println!("🌐 Review service: {}", settings.service_url);
    println!(
        "   Apps: {}",
        settings
            .apps
            .iter()
            .map(|a| a.platform.label())
            .collect::<Vec<_>>()
            .join(", ")
    );
    println!(
        "   Page size: {} | Cap per app: {} | Timeout: {}s\n",
        settings.page_size, settings.max_reviews_per_app, settings.timeout_seconds
    );

    let source = HttpReviewSource::new(&settings.service_url, settings.timeout_seconds)?;
    let mut collector_settings = CollectorSettings::from(settings);
    collector_settings.show_progress = !args.quiet;

    let collector = Collector::new(source, collector_settings);
    let summary = collector.collect_all(&settings.apps).await;

    // Partial results from failed apps are kept.
    let output = PathBuf::from(&settings.output);
    let written = table::write_raw_reviews(&output, summary.rows())?;

    println!("\n📊 Collection Summary:");
    for app in &summary.apps {
        let status = if app.outcome.is_failed() { "❌" } else { "✅" };
        println!(
            "   {} {}: {} reviews",
            status,
            app.app.platform.label(),
            analysis::format_count(app.outcome.rows().len())
        );
    }
    for failed in summary.failed() {
        if let collector::AppOutcome::Failed { reason, .. } = &failed.outcome {
            eprintln!("   ⚠️  {}: {}", failed.app.platform.label(), reason);
        }
    }
    println!(
        "   Total: {} reviews from {} apps",
        analysis::format_count(summary.total_rows()),
        summary.apps.len()
    );
    println!("   Duration: {:.1}s", start_time.elapsed().as_secs_f64());
    println!(
        "\n✅ Saved {} reviews to: {}",
        analysis::format_count(written),
        output.display()
    );

    if summary.all_failed() {
        eprintln!("\n⛔ Every app failed to collect. Failing (exit code 2).");
        return Ok(2);
    }

    Ok(0)
}

/// Build and write the trend report.
fn run_report(report_args: &ReportArgs, mut config: Config) -> Result<i32> {
    config.merge_report_args(report_args);
    config.validate_report()?;
    let settings = &config.report;

    println!("📂 Loading review tables...");
    let cleaned_path = Path::new(&settings.cleaned_path);
    let sentiment_path = Path::new(&settings.sentiment_path);
    let cleaned = table::load_table(cleaned_path, TableKind::Cleaned)?;
    let sentiment = table::load_table(sentiment_path, TableKind::Sentiment)?;
    println!(
        "   Cleaned: {} rows | Sentiment: {} rows",
        analysis::format_count(cleaned.len()),
        analysis::format_count(sentiment.len())
    );

    let selection = PlatformSelection::new(settings.platforms.iter().copied())
        .context("Invalid platform selection")?;

    let request = DashboardRequest {
        selection,
        forecast_platform: report_args.forecast_platform,
        horizon: settings.forecast_horizon,
        cleaned_source: cleaned_path.display().to_string(),
        sentiment_source: sentiment_path.display().to_string(),
        include_rejections: settings.include_rejections,
    };

    let forecaster = TrendForecaster::default();
    println!(
        "\n📈 Building dashboard for {} (forecast model: {})...",
        request.selection.labels(),
        forecaster.name()
    );
    let dashboard = Dashboard::build(&cleaned, &sentiment, &request, &forecaster);

    let output = PathBuf::from(&settings.output);
    let content = match report_args.format {
        OutputFormat::Json => report::generate_json_report(&dashboard)?,
        OutputFormat::Markdown => {
            report::generate_markdown_report(&dashboard, &ReportOptions::from(settings))
        }
    };
    report::write_output(&content, &output)?;

    print_summary(&dashboard);
    println!("\n✅ Report saved to: {}", output.display());

    Ok(0)
}

/// Print the headline numbers to the terminal.
fn print_summary(dashboard: &Dashboard) {
    let kpis = &dashboard.kpis;

    println!("\n📊 Review Summary:");
    println!(
        "   Total reviews: {}",
        analysis::format_count(kpis.total_reviews)
    );
    println!(
        "   Average rating: {}",
        analysis::format_metric(kpis.avg_rating, analysis::RATING_PRECISION)
    );
    println!(
        "   Average sentiment: {}",
        analysis::format_metric(kpis.avg_sentiment, analysis::SENTIMENT_PRECISION)
    );

    let platform = dashboard.forecast.platform().label();
    match &dashboard.forecast {
        ForecastSection::Ready(forecast) => println!(
            "   Forecast ({}, next {} days): ~{:.0} reviews",
            platform,
            forecast.horizon,
            forecast.predicted_total()
        ),
        ForecastSection::NoData { .. } => println!("   Forecast ({}): no data", platform),
        ForecastSection::Insufficient { .. } => {
            println!("   Forecast ({}): insufficient data", platform)
        }
    }

    let rejected = dashboard.rejected_rows();
    if rejected > 0 {
        println!("   Rejected rows: {}", analysis::format_count(rejected));
    }
}

/// Load configuration from file or use defaults.
///
/// Returns the path the config came from, if any.
fn load_config(args: &Args) -> Result<(Config, Option<PathBuf>)> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        return Ok((Config::load(config_path)?, Some(config_path.clone())));
    }

    // Try default location
    match Config::load_default()? {
        Some(config) => Ok((config, Some(PathBuf::from(CONFIG_FILE)))),
        None => Ok((Config::default(), None)),
    }
}
