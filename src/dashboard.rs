//! Dashboard assembly.
//!
//! A [`Dashboard`] holds every derived view for one platform selection.
//! Each view is computed from the filtered tables on every build and
//! degrades on its own to an empty section when it has nothing to show.

use crate::analysis::{
    daily_counts_by_date, engagement_by_rating, fill_missing_days, percent_shares,
    platform_totals, rating_distribution, sentiment_distribution, summarize, DailySeries,
    EngagementByRating, KpiSummary, RatingBucket, SentimentStats,
};
use crate::forecast::{Forecast, Forecaster};
use crate::models::{DailyPlatformCount, DailyPlatformShare, Platform, PlatformSelection};
use crate::table::{ReviewTable, RowRejection};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// What to build a dashboard for.
#[derive(Debug, Clone)]
pub struct DashboardRequest {
    pub selection: PlatformSelection,
    /// Falls back to the first selected platform when unset or outside
    /// the selection.
    pub forecast_platform: Option<Platform>,
    pub horizon: usize,
    pub cleaned_source: String,
    pub sentiment_source: String,
    pub include_rejections: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardMetadata {
    pub generated_at: DateTime<Utc>,
    pub platforms: Vec<Platform>,
    pub cleaned_source: String,
    pub sentiment_source: String,
    pub cleaned_rows: usize,
    pub sentiment_rows: usize,
}

/// Forecast view for the chosen platform.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ForecastSection {
    Ready(Forecast),
    /// The platform has no reviews in the selection.
    NoData { platform: Platform },
    /// The forecaster refused the series.
    Insufficient { platform: Platform, reason: String },
}

impl ForecastSection {
    pub fn platform(&self) -> Platform {
        match self {
            ForecastSection::Ready(forecast) => forecast.platform,
            ForecastSection::NoData { platform } => *platform,
            ForecastSection::Insufficient { platform, .. } => *platform,
        }
    }
}

/// Rows dropped while loading one table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RejectionSection {
    pub table: String,
    pub rows: Vec<RowRejection>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub metadata: DashboardMetadata,
    pub kpis: KpiSummary,
    pub rating_distribution: Vec<RatingBucket>,
    pub sentiment_distribution: Vec<SentimentStats>,
    pub daily_counts: Vec<DailyPlatformCount>,
    pub daily_shares: Vec<DailyPlatformShare>,
    pub platform_totals: BTreeMap<Platform, u64>,
    pub forecast: ForecastSection,
    pub engagement: Vec<EngagementByRating>,
    pub rejections: Vec<RejectionSection>,
}

impl Dashboard {
    /// Build every view from the cleaned and sentiment-scored tables.
    ///
    /// Both tables are filtered by the selection and summarized
    /// independently. Neither input is modified.
    pub fn build(
        cleaned: &ReviewTable,
        sentiment: &ReviewTable,
        request: &DashboardRequest,
        forecaster: &dyn Forecaster,
    ) -> Self {
        let selection = &request.selection;
        let cleaned_view = cleaned.filter(selection);
        let sentiment_view = sentiment.filter(selection);

        debug!(
            "Selection {}: {} cleaned rows, {} sentiment rows",
            selection.labels(),
            cleaned_view.len(),
            sentiment_view.len()
        );

        let present = cleaned.platforms();
        for platform in selection.iter().filter(|p| !present.contains(p)) {
            warn!("No reviews for {} in {}", platform, request.cleaned_source);
        }
        if cleaned_view.is_empty() {
            warn!(
                "Selection {} matches no cleaned reviews; sections will show no data",
                selection.labels()
            );
        }

        let daily_counts = daily_counts_by_date(cleaned_view.events());
        let daily_shares = percent_shares(&daily_counts);

        let forecast_platform = request
            .forecast_platform
            .filter(|p| selection.contains(*p))
            .unwrap_or_else(|| selection.first());
        let series = fill_missing_days(&daily_counts, forecast_platform);
        let forecast = forecast_section(&series, request.horizon, forecaster);

        let rejections = if request.include_rejections {
            [
                ("cleaned", cleaned, &request.cleaned_source),
                ("sentiment", sentiment, &request.sentiment_source),
            ]
            .into_iter()
            .filter(|(_, table, _)| !table.rejected().is_empty())
            .map(|(kind, table, source)| RejectionSection {
                table: format!("{} ({})", kind, source),
                rows: table.rejected().to_vec(),
            })
            .collect()
        } else {
            Vec::new()
        };

        Dashboard {
            metadata: DashboardMetadata {
                generated_at: Utc::now(),
                platforms: selection.iter().collect(),
                cleaned_source: request.cleaned_source.clone(),
                sentiment_source: request.sentiment_source.clone(),
                cleaned_rows: cleaned_view.len(),
                sentiment_rows: sentiment_view.len(),
            },
            kpis: summarize(cleaned_view.events(), sentiment_view.events()),
            rating_distribution: rating_distribution(cleaned_view.events()),
            sentiment_distribution: sentiment_distribution(sentiment_view.events()),
            platform_totals: platform_totals(&daily_counts),
            daily_counts,
            daily_shares,
            forecast,
            engagement: engagement_by_rating(cleaned_view.events()),
            rejections,
        }
    }

    /// Total rows dropped across both tables.
    pub fn rejected_rows(&self) -> usize {
        self.rejections.iter().map(|r| r.rows.len()).sum()
    }
}

fn forecast_section(
    series: &DailySeries,
    horizon: usize,
    forecaster: &dyn Forecaster,
) -> ForecastSection {
    let platform = series.platform();

    if series.is_empty() {
        info!("No reviews for {}, skipping forecast", platform);
        return ForecastSection::NoData { platform };
    }

    match forecaster.forecast(series, horizon) {
        Ok(forecast) => ForecastSection::Ready(forecast),
        Err(e) => {
            warn!("Forecast for {} not available: {}", platform, e);
            ForecastSection::Insufficient {
                platform,
                reason: e.to_string(),
            }
        }
    }
}
