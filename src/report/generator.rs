//! Markdown report generation.
//!
//! This module renders a [`Dashboard`] as a Markdown trend report, with
//! tables for every view and text bars standing in for charts.

use crate::analysis::{format_count, format_metric, RATING_PRECISION, SENTIMENT_PRECISION};
use crate::dashboard::{Dashboard, DashboardMetadata, ForecastSection, RejectionSection};
use crate::models::{DailyPlatformCount, DailyPlatformShare, Platform};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

const NO_DATA: &str = "No data";

/// Rendering knobs that don't change the underlying numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportOptions {
    /// Rejected rows listed per table before truncating.
    pub max_rejections_listed: usize,
    /// Width in characters of the longest text bar.
    pub bar_width: usize,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            max_rejections_listed: 20,
            bar_width: 30,
        }
    }
}

impl From<&crate::config::ReportConfig> for ReportOptions {
    fn from(config: &crate::config::ReportConfig) -> Self {
        Self {
            max_rejections_listed: config.max_rejections_listed,
            bar_width: config.bar_width,
        }
    }
}

/// Generate a complete Markdown report.
pub fn generate_markdown_report(dashboard: &Dashboard, options: &ReportOptions) -> String {
    let mut output = String::new();
    let platforms = &dashboard.metadata.platforms;

    output.push_str("# Social Media App Review Trends\n\n");

    output.push_str(&generate_metadata_section(&dashboard.metadata));
    output.push_str(&generate_table_of_contents(dashboard));
    output.push_str(&generate_kpi_section(dashboard));
    output.push_str(&generate_rating_section(dashboard, platforms));
    output.push_str(&generate_sentiment_section(dashboard));
    output.push_str(&generate_daily_section(
        &dashboard.daily_counts,
        &dashboard.platform_totals,
        platforms,
        options.bar_width,
    ));
    output.push_str(&generate_share_section(&dashboard.daily_shares, platforms));
    output.push_str(&generate_forecast_section(&dashboard.forecast));
    output.push_str(&generate_engagement_section(dashboard, options.bar_width));
    output.push_str(&generate_rejections_section(
        &dashboard.rejections,
        options.max_rejections_listed,
    ));
    output.push_str(&generate_footer());

    output
}

fn generate_metadata_section(metadata: &DashboardMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!(
        "- **Platforms:** {}\n",
        metadata
            .platforms
            .iter()
            .map(|p| p.label())
            .collect::<Vec<_>>()
            .join(", ")
    ));
    section.push_str(&format!(
        "- **Cleaned table:** `{}` ({} rows selected)\n",
        metadata.cleaned_source,
        format_count(metadata.cleaned_rows)
    ));
    section.push_str(&format!(
        "- **Sentiment table:** `{}` ({} rows selected)\n",
        metadata.sentiment_source,
        format_count(metadata.sentiment_rows)
    ));
    section.push('\n');

    section
}

fn generate_table_of_contents(dashboard: &Dashboard) -> String {
    let mut toc = String::new();

    toc.push_str("## Table of Contents\n\n");
    toc.push_str("- [Metadata](#metadata)\n");
    toc.push_str("- [Key Metrics](#key-metrics)\n");
    toc.push_str("- [Rating Distribution](#rating-distribution)\n");
    toc.push_str("- [Sentiment](#sentiment)\n");
    toc.push_str("- [Daily Review Volume](#daily-review-volume)\n");
    toc.push_str("- [Platform Share](#platform-share)\n");
    toc.push_str("- [Forecast](#forecast)\n");
    toc.push_str("- [Engagement by Rating](#engagement-by-rating)\n");
    if !dashboard.rejections.is_empty() {
        toc.push_str("- [Rejected Rows](#rejected-rows)\n");
    }
    toc.push('\n');

    toc
}

fn generate_kpi_section(dashboard: &Dashboard) -> String {
    let kpis = &dashboard.kpis;
    let mut section = String::new();

    section.push_str("## Key Metrics\n\n");
    section.push_str("| Total Reviews | Average Rating | Average Sentiment |\n");
    section.push_str("|:---:|:---:|:---:|\n");
    section.push_str(&format!(
        "| {} | {} | {} |\n\n",
        format_count(kpis.total_reviews),
        format_metric(kpis.avg_rating, RATING_PRECISION),
        format_metric(kpis.avg_sentiment, SENTIMENT_PRECISION),
    ));

    section
}

fn generate_rating_section(dashboard: &Dashboard, platforms: &[Platform]) -> String {
    let mut section = String::new();

    section.push_str("## Rating Distribution\n\n");

    if dashboard.rating_distribution.is_empty() {
        section.push_str(NO_DATA);
        section.push_str("\n\n");
        return section;
    }

    let mut by_rating: BTreeMap<u8, BTreeMap<Platform, u64>> = BTreeMap::new();
    for bucket in &dashboard.rating_distribution {
        by_rating
            .entry(bucket.rating)
            .or_default()
            .insert(bucket.platform, bucket.count);
    }

    section.push_str(&table_header("Rating", platforms));
    for (rating, counts) in by_rating.iter().rev() {
        section.push_str(&format!("| {} |", "★".repeat(*rating as usize)));
        for platform in platforms {
            section.push_str(&format!(" {} |", counts.get(platform).copied().unwrap_or(0)));
        }
        section.push('\n');
    }
    section.push('\n');

    section
}

fn generate_sentiment_section(dashboard: &Dashboard) -> String {
    let mut section = String::new();

    section.push_str("## Sentiment\n\n");

    if dashboard.sentiment_distribution.is_empty() {
        section.push_str(NO_DATA);
        section.push_str("\n\n");
        return section;
    }

    section.push_str("| Platform | Reviews | Min | Q1 | Median | Q3 | Max | Mean |\n");
    section.push_str("|:---|:---:|:---:|:---:|:---:|:---:|:---:|:---:|\n");
    for stats in &dashboard.sentiment_distribution {
        section.push_str(&format!(
            "| {} | {} | {:.3} | {:.3} | {:.3} | {:.3} | {:.3} | {:.3} |\n",
            stats.platform.label(),
            format_count(stats.count),
            stats.min,
            stats.q1,
            stats.median,
            stats.q3,
            stats.max,
            stats.mean
        ));
    }
    section.push('\n');

    section
}

fn generate_daily_section(
    counts: &[DailyPlatformCount],
    totals: &BTreeMap<Platform, u64>,
    platforms: &[Platform],
    bar_width: usize,
) -> String {
    let mut section = String::new();

    section.push_str("## Daily Review Volume\n\n");

    if counts.is_empty() {
        section.push_str(NO_DATA);
        section.push_str("\n\n");
        return section;
    }

    section.push_str("### Totals\n\n");
    section.push_str("| Platform | Reviews | |\n");
    section.push_str("|:---|:---:|:---|\n");
    let max_total = totals.values().copied().max().unwrap_or(0) as f64;
    for (platform, total) in totals {
        section.push_str(&format!(
            "| {} | {} | {} |\n",
            platform.label(),
            format_count(*total as usize),
            text_bar(*total as f64, max_total, bar_width)
        ));
    }
    section.push('\n');

    let mut by_day: BTreeMap<NaiveDate, BTreeMap<Platform, u64>> = BTreeMap::new();
    for row in counts {
        by_day
            .entry(row.day)
            .or_default()
            .insert(row.platform, row.review_count);
    }

    section.push_str("### By Day\n\n");
    section.push_str(&table_header("Day", platforms));
    for (day, day_counts) in &by_day {
        section.push_str(&format!("| {} |", day));
        for platform in platforms {
            section.push_str(&format!(
                " {} |",
                day_counts.get(platform).copied().unwrap_or(0)
            ));
        }
        section.push('\n');
    }
    section.push('\n');

    section
}

fn generate_share_section(shares: &[DailyPlatformShare], platforms: &[Platform]) -> String {
    let mut section = String::new();

    section.push_str("## Platform Share\n\n");

    if shares.is_empty() {
        section.push_str(NO_DATA);
        section.push_str("\n\n");
        return section;
    }

    let mut by_day: BTreeMap<NaiveDate, BTreeMap<Platform, f64>> = BTreeMap::new();
    for share in shares {
        by_day
            .entry(share.day)
            .or_default()
            .insert(share.platform, share.percent_share);
    }

    section.push_str("Share of each day's review volume, in percent.\n\n");
    section.push_str(&table_header("Day", platforms));
    for (day, day_shares) in &by_day {
        section.push_str(&format!("| {} |", day));
        for platform in platforms {
            match day_shares.get(platform) {
                Some(share) => section.push_str(&format!(" {:.1}% |", share)),
                None => section.push_str(" 0.0% |"),
            }
        }
        section.push('\n');
    }
    section.push('\n');

    section
}

fn generate_forecast_section(forecast: &ForecastSection) -> String {
    let mut section = String::new();

    section.push_str("## Forecast\n\n");

    match forecast {
        ForecastSection::NoData { platform } => {
            section.push_str(&format!("{} for {}.\n\n", NO_DATA, platform.label()));
        }
        ForecastSection::Insufficient { platform, reason } => {
            section.push_str(&format!(
                "Insufficient data to forecast {}: {}.\n\n",
                platform.label(),
                reason
            ));
        }
        ForecastSection::Ready(forecast) => {
            section.push_str(&format!(
                "- **Platform:** {}\n- **Model:** `{}`\n- **Horizon:** {} days\n- **Predicted reviews:** {:.0}\n\n",
                forecast.platform.label(),
                forecast.model,
                forecast.horizon,
                forecast.predicted_total()
            ));

            section.push_str("| Day | Predicted | Lower | Upper |\n");
            section.push_str("|:---|:---:|:---:|:---:|\n");
            for point in forecast.future() {
                section.push_str(&format!(
                    "| {} | {:.1} | {:.1} | {:.1} |\n",
                    point.day,
                    point.yhat,
                    point.yhat_lower.max(0.0),
                    point.yhat_upper
                ));
            }
            section.push('\n');
        }
    }

    section
}

fn generate_engagement_section(dashboard: &Dashboard, bar_width: usize) -> String {
    let mut section = String::new();

    section.push_str("## Engagement by Rating\n\n");

    if dashboard.engagement.is_empty() {
        section.push_str(NO_DATA);
        section.push_str("\n\n");
        return section;
    }

    let max = dashboard
        .engagement
        .iter()
        .map(|e| e.avg_engagement)
        .fold(0.0, f64::max);

    section.push_str("| Rating | Reviews | Avg. Thumbs Up | |\n");
    section.push_str("|:---|:---:|:---:|:---|\n");
    for row in &dashboard.engagement {
        section.push_str(&format!(
            "| {} | {} | {:.2} | {} |\n",
            row.rating,
            format_count(row.reviews),
            row.avg_engagement,
            text_bar(row.avg_engagement, max, bar_width)
        ));
    }
    section.push('\n');

    section
}

fn generate_rejections_section(rejections: &[RejectionSection], max_listed: usize) -> String {
    if rejections.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Rejected Rows\n\n");

    for table in rejections {
        section.push_str(&format!(
            "### {}: {} rows dropped\n\n",
            table.table,
            format_count(table.rows.len())
        ));
        section.push_str("| Line | Reason |\n");
        section.push_str("|:---:|:---|\n");
        for row in table.rows.iter().take(max_listed) {
            section.push_str(&format!("| {} | {} |\n", row.line, row.reason));
        }
        if table.rows.len() > max_listed {
            section.push_str(&format!(
                "\n*...and {} more*\n",
                table.rows.len() - max_listed
            ));
        }
        section.push('\n');
    }

    section
}

fn generate_footer() -> String {
    let mut footer = String::new();

    footer.push_str("---\n\n");
    footer.push_str(&format!(
        "*Report generated by reviewtrends v{}*\n",
        env!("CARGO_PKG_VERSION")
    ));

    footer
}

fn table_header(first: &str, platforms: &[Platform]) -> String {
    let mut header = format!("| {} |", first);
    let mut rule = String::from("|:---|");
    for platform in platforms {
        header.push_str(&format!(" {} |", platform.label()));
        rule.push_str(":---:|");
    }
    format!("{}\n{}\n", header, rule)
}

/// A bar of `width` blocks at `max`, scaled linearly.
fn text_bar(value: f64, max: f64, width: usize) -> String {
    if max <= 0.0 || value <= 0.0 {
        return String::new();
    }
    let filled = ((value / max) * width as f64).round() as usize;
    "█".repeat(filled.clamp(1, width.max(1)))
}

/// Generate a JSON report.
pub fn generate_json_report(dashboard: &Dashboard) -> Result<String> {
    serde_json::to_string_pretty(dashboard).map_err(Into::into)
}

/// Write rendered report content, creating parent directories.
pub fn write_output(content: &str, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let mut file = std::fs::File::create(path)
        .with_context(|| format!("Failed to write report to {}", path.display()))?;
    file.write_all(content.as_bytes())?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::DashboardRequest;
    use crate::forecast::TrendForecaster;
    use crate::models::{PlatformSelection, ReviewEvent};
    use crate::table::{ReviewTable, RowRejection};

    fn event(platform: Platform, day: u32, rating: u8, sentiment: Option<f64>) -> ReviewEvent {
        ReviewEvent {
            platform,
            timestamp: NaiveDate::from_ymd_opt(2024, 2, day)
                .unwrap()
                .and_hms_opt(9, 30, 0)
                .unwrap(),
            rating,
            sentiment_score: sentiment,
            engagement_count: 10 - u64::from(rating),
        }
    }

    fn request(selection: PlatformSelection) -> DashboardRequest {
        DashboardRequest {
            selection,
            forecast_platform: None,
            horizon: 5,
            cleaned_source: "cleaned.csv".to_string(),
            sentiment_source: "sentiment.csv".to_string(),
            include_rejections: true,
        }
    }

    fn create_test_dashboard() -> Dashboard {
        let rejected = (1..=25)
            .map(|line| RowRejection {
                line,
                reason: "malformed timestamp 'soon'".to_string(),
            })
            .collect();
        let cleaned = ReviewTable::with_rejections(
            vec![
                event(Platform::Instagram, 1, 5, None),
                event(Platform::Instagram, 2, 4, None),
                event(Platform::Instagram, 4, 1, None),
                event(Platform::Snapchat, 2, 3, None),
            ],
            rejected,
        );
        let sentiment = ReviewTable::new(vec![
            event(Platform::Instagram, 1, 5, Some(0.75)),
            event(Platform::Snapchat, 2, 3, Some(0.1)),
        ]);

        Dashboard::build(
            &cleaned,
            &sentiment,
            &request(PlatformSelection::new([Platform::Instagram, Platform::Snapchat]).unwrap()),
            &TrendForecaster::default(),
        )
    }

    fn empty_dashboard() -> Dashboard {
        let empty = ReviewTable::new(Vec::new());
        Dashboard::build(
            &empty,
            &empty,
            &request(PlatformSelection::all()),
            &TrendForecaster::default(),
        )
    }

    #[test]
    fn test_generate_markdown_report() {
        let markdown = generate_markdown_report(&create_test_dashboard(), &ReportOptions::default());

        assert!(markdown.contains("# Social Media App Review Trends"));
        assert!(markdown.contains("## Metadata"));
        assert!(markdown.contains("## Key Metrics"));
        assert!(markdown.contains("| 4 | 3.25 | 0.425 |"));
        assert!(markdown.contains("| Rating | Instagram | Snapchat |"));
        assert!(markdown.contains("| 2024-02-02 | 1 | 1 |"));
        assert!(markdown.contains("| 2024-02-02 | 50.0% | 50.0% |"));
        assert!(markdown.contains("- **Model:** `linear-trend`"));
        assert!(markdown.contains("## Engagement by Rating"));
        assert!(!markdown.contains("Facebook"));
    }

    #[test]
    fn test_empty_sections_show_no_data() {
        let markdown = generate_markdown_report(&empty_dashboard(), &ReportOptions::default());

        assert!(markdown.contains("| 0 | No data | No data |"));
        assert!(markdown.contains("## Rating Distribution\n\nNo data"));
        assert!(markdown.contains("## Sentiment\n\nNo data"));
        assert!(markdown.contains("## Daily Review Volume\n\nNo data"));
        assert!(markdown.contains("## Platform Share\n\nNo data"));
        assert!(markdown.contains("No data for Facebook."));
        assert!(markdown.contains("## Engagement by Rating\n\nNo data"));
        assert!(!markdown.contains("## Rejected Rows"));
    }

    #[test]
    fn test_rejections_are_capped() {
        let options = ReportOptions {
            max_rejections_listed: 3,
            bar_width: 10,
        };
        let markdown = generate_markdown_report(&create_test_dashboard(), &options);

        assert!(markdown.contains("### cleaned (cleaned.csv): 25 rows dropped"));
        assert!(markdown.contains("| 3 | malformed timestamp 'soon' |"));
        assert!(!markdown.contains("| 4 | malformed timestamp 'soon' |"));
        assert!(markdown.contains("*...and 22 more*"));
    }

    #[test]
    fn test_forecast_section_variants() {
        let insufficient = generate_forecast_section(&ForecastSection::Insufficient {
            platform: Platform::Twitter,
            reason: "need at least 2 days of history, got 1".to_string(),
        });
        assert!(insufficient.contains("Insufficient data to forecast Twitter"));

        let no_data = generate_forecast_section(&ForecastSection::NoData {
            platform: Platform::Snapchat,
        });
        assert!(no_data.contains("No data for Snapchat."));
    }

    #[test]
    fn test_text_bar() {
        assert_eq!(text_bar(10.0, 10.0, 4), "████");
        assert_eq!(text_bar(5.0, 10.0, 4), "██");
        assert_eq!(text_bar(0.1, 10.0, 4), "█");
        assert_eq!(text_bar(0.0, 10.0, 4), "");
        assert_eq!(text_bar(3.0, 0.0, 4), "");
    }

    #[test]
    fn test_generate_json_report() {
        let json = generate_json_report(&create_test_dashboard()).unwrap();

        assert!(json.contains("\"kpis\""));
        assert!(json.contains("\"daily_shares\""));
        assert!(json.contains("\"status\": \"ready\""));
        assert!(json.contains("\"percent_share\""));

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["kpis"]["total_reviews"], 4);
        assert_eq!(value["platform_totals"]["Instagram"], 3);
    }

    #[test]
    fn test_write_output_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("report.md");

        let markdown = generate_markdown_report(&create_test_dashboard(), &ReportOptions::default());
        write_output(&markdown, &path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("# Social Media App Review Trends"));
    }
}
