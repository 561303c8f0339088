//! CSV table loading with per-row validation.
//!
//! Malformed rows are dropped and reported as [`RowRejection`]s instead of
//! aborting the whole load. Only a missing required column fails the table.

use super::{ReviewTable, RowError, RowRejection};
use crate::models::{Platform, ReviewEvent};
use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

/// Which preprocessed table is being loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    /// Cleaned review table (ratings, engagement, trends).
    Cleaned,
    /// Sentiment-scored sample; every row must carry a `sentiment` value.
    Sentiment,
}

impl TableKind {
    fn required_columns(&self) -> &'static [&'static str] {
        match self {
            TableKind::Cleaned => &["Platform", "at", "score"],
            TableKind::Sentiment => &["Platform", "at", "score", "sentiment"],
        }
    }
}

/// Columns read from a review table. Everything else is ignored.
#[derive(Debug, Deserialize)]
struct TableRow {
    #[serde(rename = "Platform")]
    platform: String,
    at: String,
    score: String,
    #[serde(rename = "thumbsUpCount", default)]
    thumbs_up_count: Option<String>,
    #[serde(default)]
    sentiment: Option<String>,
}

/// Load a review table from a CSV file.
pub fn load_table(path: &Path, kind: TableKind) -> Result<ReviewTable> {
    info!("Loading {:?} table from {}", kind, path.display());

    let file = File::open(path)
        .with_context(|| format!("Failed to open table: {}", path.display()))?;

    let table = read_table(file, kind)
        .with_context(|| format!("Failed to read table: {}", path.display()))?;

    if !table.rejected().is_empty() {
        warn!(
            "Dropped {} malformed rows from {}",
            table.rejected().len(),
            path.display()
        );
    }

    Ok(table)
}

/// Read a review table from any CSV source.
pub fn read_table<R: Read>(source: R, kind: TableKind) -> Result<ReviewTable> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(source);

    let headers = reader.headers().context("Missing header row")?.clone();
    for column in kind.required_columns() {
        if !headers.iter().any(|h| h == *column) {
            bail!("Required column '{}' not found", column);
        }
    }

    let mut events = Vec::new();
    let mut rejected = Vec::new();

    for (index, record) in reader.records().enumerate() {
        // Header is line 1; fall back to that when the reader has no position.
        let fallback_line = index as u64 + 2;

        let record = match record {
            Ok(record) => record,
            Err(e) => {
                let line = e.position().map(|p| p.line()).unwrap_or(fallback_line);
                let error = RowError::Malformed(e.to_string());
                debug!("Rejecting line {}: {}", line, error);
                rejected.push(RowRejection::new(line, &error));
                continue;
            }
        };

        let line = record
            .position()
            .map(|p| p.line())
            .unwrap_or(fallback_line);

        let parsed = record
            .deserialize::<TableRow>(Some(&headers))
            .map_err(|e| RowError::Malformed(e.to_string()))
            .and_then(|row| parse_row(row, kind));

        match parsed {
            Ok(event) => events.push(event),
            Err(error) => {
                debug!("Rejecting line {}: {}", line, error);
                rejected.push(RowRejection::new(line, &error));
            }
        }
    }

    debug!(
        "Loaded {} events ({} rejected)",
        events.len(),
        rejected.len()
    );

    Ok(ReviewTable::with_rejections(events, rejected))
}

fn parse_row(row: TableRow, kind: TableKind) -> Result<ReviewEvent, RowError> {
    let platform: Platform = row
        .platform
        .parse()
        .map_err(|_| RowError::UnknownPlatform(row.platform.clone()))?;

    let timestamp = parse_timestamp(&row.at).ok_or_else(|| RowError::BadTimestamp(row.at.clone()))?;

    let rating = parse_rating(&row.score).ok_or_else(|| RowError::BadRating(row.score.clone()))?;

    let engagement_count = match row.thumbs_up_count.as_deref() {
        None | Some("") => 0,
        Some(raw) => parse_whole_number(raw).ok_or_else(|| RowError::BadEngagement(raw.to_string()))?,
    };

    let sentiment_score = match (kind, row.sentiment.as_deref()) {
        (_, Some(raw)) if !raw.is_empty() => {
            let value: f64 = raw
                .parse()
                .map_err(|_| RowError::BadSentiment(raw.to_string()))?;
            if !value.is_finite() {
                return Err(RowError::BadSentiment(raw.to_string()));
            }
            Some(value)
        }
        (TableKind::Sentiment, _) => return Err(RowError::MissingSentiment),
        (TableKind::Cleaned, _) => None,
    };

    Ok(ReviewEvent {
        platform,
        timestamp,
        rating,
        sentiment_score,
        engagement_count,
    })
}

/// Parse a source timestamp without any timezone conversion.
///
/// Offsets in RFC 3339 values are dropped; the date as written is kept.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_local());
    }

    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(dt);
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Ratings may be written as `4` or `4.0` depending on the exporter.
fn parse_rating(raw: &str) -> Option<u8> {
    let value = parse_whole_number(raw)?;
    (1..=5).contains(&value).then_some(value as u8)
}

fn parse_whole_number(raw: &str) -> Option<u64> {
    if let Ok(value) = raw.parse::<u64>() {
        return Some(value);
    }

    let value: f64 = raw.parse().ok()?;
    (value.is_finite() && value >= 0.0 && value.fract() == 0.0).then_some(value as u64)
}
