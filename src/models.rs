//! Data models for review collection and trend analysis.
//!
//! This module contains the core data structures shared by the collector,
//! the table loader and the aggregation pipeline.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A tracked social media app.
///
/// Declaration order is the ordering used for every derived table.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    clap::ValueEnum,
)]
pub enum Platform {
    Facebook,
    Instagram,
    Snapchat,
    Twitter,
}

impl Platform {
    /// Every known platform, in display order.
    pub const ALL: [Platform; 4] = [
        Platform::Facebook,
        Platform::Instagram,
        Platform::Snapchat,
        Platform::Twitter,
    ];

    /// Returns the label used in tables and reports.
    pub fn label(&self) -> &'static str {
        match self {
            Platform::Facebook => "Facebook",
            Platform::Instagram => "Instagram",
            Platform::Snapchat => "Snapchat",
            Platform::Twitter => "Twitter",
        }
    }

    /// Returns the default Play Store package for this platform.
    pub fn default_app_id(&self) -> &'static str {
        match self {
            Platform::Facebook => "com.facebook.katana",
            Platform::Instagram => "com.instagram.android",
            Platform::Snapchat => "com.snapchat.android",
            Platform::Twitter => "com.twitter.android",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for Platform {
    type Err = UnknownPlatform;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Platform::ALL
            .into_iter()
            .find(|p| p.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownPlatform(s.to_string()))
    }
}

/// Error returned when a label does not name a known platform.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown platform '{0}'")]
pub struct UnknownPlatform(pub String);

/// One user review, as loaded from a cleaned or sentiment-scored table.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewEvent {
    /// App the review belongs to.
    pub platform: Platform,
    /// Source-assigned time of the review. No timezone is attached.
    pub timestamp: NaiveDateTime,
    /// Star rating, 1 to 5.
    pub rating: u8,
    /// Sentiment polarity, only present in the sentiment-scored sample.
    pub sentiment_score: Option<f64>,
    /// Helpful / thumbs-up tally.
    pub engagement_count: u64,
}

impl ReviewEvent {
    /// Calendar day of the review, taken from the timestamp as written.
    pub fn day(&self) -> NaiveDate {
        self.timestamp.date()
    }
}

/// One scraped review as returned by the review service and written to the raw table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawReview {
    pub review_id: String,
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub content: String,
    pub score: u8,
    #[serde(default)]
    pub thumbs_up_count: u64,
    #[serde(default)]
    pub review_created_version: Option<String>,
    pub at: String,
    #[serde(default)]
    pub reply_content: Option<String>,
    #[serde(default)]
    pub replied_at: Option<String>,
    #[serde(default)]
    pub app_version: Option<String>,
    /// Set by the collector; the service itself never sends it.
    #[serde(rename = "Platform", default)]
    pub platform: Option<Platform>,
}

/// Number of reviews for one platform on one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DailyPlatformCount {
    pub day: NaiveDate,
    pub platform: Platform,
    pub review_count: u64,
}

/// A platform's share (0-100) of one day's total review volume.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyPlatformShare {
    pub day: NaiveDate,
    pub platform: Platform,
    pub percent_share: f64,
}

/// Error building a platform selection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("platform selection must contain at least one platform")]
    Empty,
}

/// The active platform filter: a non-empty set of platforms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformSelection {
    platforms: BTreeSet<Platform>,
}

impl PlatformSelection {
    /// Build a selection, rejecting an empty set.
    pub fn new(platforms: impl IntoIterator<Item = Platform>) -> Result<Self, SelectionError> {
        let platforms: BTreeSet<Platform> = platforms.into_iter().collect();
        if platforms.is_empty() {
            return Err(SelectionError::Empty);
        }
        Ok(Self { platforms })
    }

    /// Select every known platform.
    pub fn all() -> Self {
        Self {
            platforms: Platform::ALL.into_iter().collect(),
        }
    }

    pub fn contains(&self, platform: Platform) -> bool {
        self.platforms.contains(&platform)
    }

    /// Selected platforms in display order.
    pub fn iter(&self) -> impl Iterator<Item = Platform> + '_ {
        self.platforms.iter().copied()
    }

    /// First selected platform in display order.
    pub fn first(&self) -> Platform {
        // Non-empty by construction.
        self.platforms
            .iter()
            .next()
            .copied()
            .unwrap_or(Platform::Facebook)
    }

    /// Comma-separated labels, for report headers.
    pub fn labels(&self) -> String {
        self.iter()
            .map(|p| p.label())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl Default for PlatformSelection {
    fn default() -> Self {
        Self::all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_ordering() {
        assert!(Platform::Facebook < Platform::Instagram);
        assert!(Platform::Instagram < Platform::Snapchat);
        assert!(Platform::Snapchat < Platform::Twitter);
    }

    #[test]
    fn test_platform_from_str() {
        assert_eq!("facebook".parse::<Platform>(), Ok(Platform::Facebook));
        assert_eq!(" Twitter ".parse::<Platform>(), Ok(Platform::Twitter));
        assert_eq!(
            "myspace".parse::<Platform>(),
            Err(UnknownPlatform("myspace".to_string()))
        );
    }

    #[test]
    fn test_platform_serializes_as_label() {
        let json = serde_json::to_string(&Platform::Snapchat).unwrap();
        assert_eq!(json, "\"Snapchat\"");
    }

    #[test]
    fn test_empty_selection_rejected() {
        assert_eq!(
            PlatformSelection::new(Vec::new()),
            Err(SelectionError::Empty)
        );
    }

    #[test]
    fn test_selection_dedups_and_orders() {
        let selection = PlatformSelection::new([
            Platform::Twitter,
            Platform::Facebook,
            Platform::Twitter,
        ])
        .unwrap();

        assert_eq!(
            selection.iter().collect::<Vec<_>>(),
            vec![Platform::Facebook, Platform::Twitter]
        );
        assert_eq!(selection.first(), Platform::Facebook);
        assert_eq!(selection.labels(), "Facebook, Twitter");
        assert!(!selection.contains(Platform::Instagram));
    }

    #[test]
    fn test_raw_review_from_service_json() {
        let json = r#"{
            "reviewId": "gp:abc",
            "userName": "A user",
            "content": "Too many ads",
            "score": 2,
            "thumbsUpCount": 14,
            "at": "2024-01-01 10:15:00"
        }"#;

        let review: RawReview = serde_json::from_str(json).unwrap();
        assert_eq!(review.review_id, "gp:abc");
        assert_eq!(review.score, 2);
        assert_eq!(review.thumbs_up_count, 14);
        assert_eq!(review.platform, None);
        assert_eq!(review.reply_content, None);
    }
}
