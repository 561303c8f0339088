//! Headline KPIs.

use crate::models::ReviewEvent;
use serde::Serialize;

/// Decimal places shown for the average rating.
pub const RATING_PRECISION: u32 = 2;
/// Decimal places shown for the average sentiment.
pub const SENTIMENT_PRECISION: u32 = 3;

/// Single-number summaries shown at the top of a report.
///
/// The averages are `None` when their table is empty. Zero would read as
/// a real average of zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct KpiSummary {
    /// Rows in the cleaned table.
    pub total_reviews: usize,
    /// Mean rating over the cleaned table, rounded to 2 places.
    pub avg_rating: Option<f64>,
    /// Mean sentiment over the sentiment-scored table, rounded to 3 places.
    pub avg_sentiment: Option<f64>,
}

/// Compute KPIs from the filtered cleaned and sentiment-scored tables.
///
/// The two tables are summarized independently; they are not assumed to
/// cover the same reviews.
pub fn summarize(cleaned: &[ReviewEvent], sentiment: &[ReviewEvent]) -> KpiSummary {
    let avg_rating = mean(cleaned.iter().map(|e| f64::from(e.rating)))
        .map(|v| round_to(v, RATING_PRECISION));

    let avg_sentiment = mean(sentiment.iter().filter_map(|e| e.sentiment_score))
        .map(|v| round_to(v, SENTIMENT_PRECISION));

    KpiSummary {
        total_reviews: cleaned.len(),
        avg_rating,
        avg_sentiment,
    }
}

/// Arithmetic mean, or `None` for no values.
pub fn mean(values: impl IntoIterator<Item = f64>) -> Option<f64> {
    let (sum, n) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));

    (n > 0).then(|| sum / n as f64)
}

/// Round to `places` decimals, exact halves going to the even neighbour.
pub fn round_to(value: f64, places: u32) -> f64 {
    let factor = 10f64.powi(places as i32);
    (value * factor).round_ties_even() / factor
}

/// Render an optional metric, or "No data".
pub fn format_metric(value: Option<f64>, places: u32) -> String {
    match value {
        Some(v) => format!("{:.*}", places as usize, v),
        None => "No data".to_string(),
    }
}

/// Render a count with thousands separators.
pub fn format_count(value: usize) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }

    out
}
