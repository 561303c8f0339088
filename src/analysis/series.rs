//! Gap-free daily series for a single platform.
//!
//! Forecasters expect one observation per day. Missing days are filled
//! with a zero count before a series is handed over.

use crate::models::{DailyPlatformCount, Platform};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

/// One day of a [`DailySeries`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SeriesPoint {
    pub day: NaiveDate,
    pub count: u64,
}

/// A contiguous daily series: every day between the first and last
/// observation is present exactly once.
///
/// Only [`fill_missing_days`] builds one, so a forecaster never sees gaps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailySeries {
    platform: Platform,
    points: Vec<SeriesPoint>,
}

impl DailySeries {
    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn points(&self) -> &[SeriesPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first_day(&self) -> Option<NaiveDate> {
        self.points.first().map(|p| p.day)
    }

    pub fn last_day(&self) -> Option<NaiveDate> {
        self.points.last().map(|p| p.day)
    }
}

/// Build the complete daily series of `platform` from its daily counts.
///
/// The series spans the first to the last observed day. Days with no
/// reviews get a count of zero. A platform with no rows yields an empty
/// series.
pub fn fill_missing_days(counts: &[DailyPlatformCount], platform: Platform) -> DailySeries {
    let mut observed: BTreeMap<NaiveDate, u64> = BTreeMap::new();
    for row in counts.iter().filter(|c| c.platform == platform) {
        *observed.entry(row.day).or_default() += row.review_count;
    }

    let (first, last) = match (observed.keys().next(), observed.keys().next_back()) {
        (Some(first), Some(last)) => (*first, *last),
        _ => {
            return DailySeries {
                platform,
                points: Vec::new(),
            }
        }
    };

    let points = first
        .iter_days()
        .take_while(|day| *day <= last)
        .map(|day| SeriesPoint {
            day,
            count: observed.get(&day).copied().unwrap_or(0),
        })
        .collect();

    DailySeries { platform, points }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(raw: &str) -> NaiveDate {
        NaiveDate::parse_from_str(raw, "%Y-%m-%d").unwrap()
    }

    fn count(raw_day: &str, platform: Platform, review_count: u64) -> DailyPlatformCount {
        DailyPlatformCount {
            day: day(raw_day),
            platform,
            review_count,
        }
    }

    #[test]
    fn test_missing_days_filled_with_zero() {
        let counts = vec![
            count("2024-02-27", Platform::Snapchat, 4),
            count("2024-02-28", Platform::Twitter, 9),
            count("2024-03-01", Platform::Snapchat, 2),
        ];

        let series = fill_missing_days(&counts, Platform::Snapchat);

        assert_eq!(series.platform(), Platform::Snapchat);
        assert_eq!(
            series.points(),
            &[
                SeriesPoint { day: day("2024-02-27"), count: 4 },
                SeriesPoint { day: day("2024-02-28"), count: 0 },
                SeriesPoint { day: day("2024-02-29"), count: 0 },
                SeriesPoint { day: day("2024-03-01"), count: 2 },
            ]
        );
        assert_eq!(series.first_day(), Some(day("2024-02-27")));
        assert_eq!(series.last_day(), Some(day("2024-03-01")));
    }

    #[test]
    fn test_series_is_contiguous() {
        let counts = vec![
            count("2024-01-01", Platform::Facebook, 1),
            count("2024-01-20", Platform::Facebook, 1),
        ];

        let series = fill_missing_days(&counts, Platform::Facebook);
        assert_eq!(series.len(), 20);

        for pair in series.points().windows(2) {
            assert_eq!(pair[0].day.succ_opt(), Some(pair[1].day));
        }

        let total: u64 = series.points().iter().map(|p| p.count).sum();
        assert_eq!(total, 2);
    }

    #[test]
    fn test_absent_platform_gives_empty_series() {
        let counts = vec![count("2024-01-01", Platform::Facebook, 1)];
        let series = fill_missing_days(&counts, Platform::Instagram);

        assert!(series.is_empty());
        assert_eq!(series.first_day(), None);
    }

    #[test]
    fn test_single_day_series() {
        let counts = vec![count("2024-01-01", Platform::Twitter, 5)];
        let series = fill_missing_days(&counts, Platform::Twitter);

        assert_eq!(series.len(), 1);
        assert_eq!(series.points()[0].count, 5);
    }
}
