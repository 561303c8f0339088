//! Review tables.
//!
//! A [`ReviewTable`] is an immutable handle over loaded review events.
//! Filtering never mutates a table; it produces a new view.

pub mod reader;
pub mod writer;

pub use reader::{load_table, TableKind};
pub use writer::write_raw_reviews;

use crate::models::{Platform, PlatformSelection, ReviewEvent};
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use thiserror::Error;

/// Why a single row could not be turned into a [`ReviewEvent`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RowError {
    #[error("unknown platform '{0}'")]
    UnknownPlatform(String),
    #[error("malformed timestamp '{0}'")]
    BadTimestamp(String),
    #[error("rating '{0}' is not an integer between 1 and 5")]
    BadRating(String),
    #[error("engagement count '{0}' is not a non-negative integer")]
    BadEngagement(String),
    #[error("missing sentiment score")]
    MissingSentiment,
    #[error("sentiment score '{0}' is not a finite number")]
    BadSentiment(String),
    #[error("unreadable row: {0}")]
    Malformed(String),
}

/// A row dropped while loading a table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowRejection {
    /// 1-indexed line in the source file.
    pub line: u64,
    pub reason: String,
}

impl RowRejection {
    pub fn new(line: u64, error: &RowError) -> Self {
        Self {
            line,
            reason: error.to_string(),
        }
    }
}

/// An immutable, cheaply clonable table of review events.
#[derive(Debug, Clone)]
pub struct ReviewTable {
    events: Arc<[ReviewEvent]>,
    rejected: Arc<[RowRejection]>,
}

impl ReviewTable {
    /// Create a table with no load-time rejections.
    #[cfg(test)]
    pub fn new(events: Vec<ReviewEvent>) -> Self {
        Self::with_rejections(events, Vec::new())
    }

    pub fn with_rejections(events: Vec<ReviewEvent>, rejected: Vec<RowRejection>) -> Self {
        Self {
            events: events.into(),
            rejected: rejected.into(),
        }
    }

    pub fn events(&self) -> &[ReviewEvent] {
        &self.events
    }

    /// Rows that were dropped when this table was loaded.
    pub fn rejected(&self) -> &[RowRejection] {
        &self.rejected
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Restrict the table to the selected platforms.
    ///
    /// Returns a new table; `self` is left untouched. Load-time rejections
    /// are carried over since they belong to the source file, not a platform.
    pub fn filter(&self, selection: &PlatformSelection) -> ReviewTable {
        let events: Vec<ReviewEvent> = self
            .events
            .iter()
            .filter(|e| selection.contains(e.platform))
            .cloned()
            .collect();

        ReviewTable {
            events: events.into(),
            rejected: Arc::clone(&self.rejected),
        }
    }

    /// Platforms that appear at least once, in display order.
    pub fn platforms(&self) -> BTreeSet<Platform> {
        self.events.iter().map(|e| e.platform).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn event(platform: Platform, day: u32) -> ReviewEvent {
        ReviewEvent {
            platform,
            timestamp: NaiveDate::from_ymd_opt(2024, 1, day)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap(),
            rating: 4,
            sentiment_score: None,
            engagement_count: 0,
        }
    }

    #[test]
    fn test_filter_returns_new_view() {
        let table = ReviewTable::with_rejections(
            vec![
                event(Platform::Facebook, 1),
                event(Platform::Twitter, 1),
                event(Platform::Facebook, 2),
            ],
            vec![RowRejection {
                line: 5,
                reason: "malformed timestamp 'x'".to_string(),
            }],
        );

        let selection = PlatformSelection::new([Platform::Facebook]).unwrap();
        let filtered = table.filter(&selection);

        assert_eq!(filtered.len(), 2);
        assert!(filtered
            .events()
            .iter()
            .all(|e| e.platform == Platform::Facebook));
        assert_eq!(filtered.rejected().len(), 1);

        // The original is unchanged.
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn test_platforms_present() {
        let table = ReviewTable::new(vec![
            event(Platform::Twitter, 1),
            event(Platform::Instagram, 1),
            event(Platform::Twitter, 2),
        ]);

        let platforms: Vec<_> = table.platforms().into_iter().collect();
        assert_eq!(platforms, vec![Platform::Instagram, Platform::Twitter]);
    }

    #[test]
    fn test_empty_table() {
        let table = ReviewTable::new(Vec::new());
        assert!(table.is_empty());
        assert!(table.filter(&PlatformSelection::all()).is_empty());
    }
}
