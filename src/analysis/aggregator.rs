//! Daily review aggregation.
//!
//! Buckets review events into one count per (day, platform) pair.

use crate::models::{DailyPlatformCount, Platform, ReviewEvent};
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Count events per (day, platform).
///
/// Every pair present in the input appears exactly once in the output,
/// ordered by day and then platform. The day of each event is chosen by
/// `day_of`.
pub fn daily_counts<'a, I, F>(events: I, day_of: F) -> Vec<DailyPlatformCount>
where
    I: IntoIterator<Item = &'a ReviewEvent>,
    F: Fn(&ReviewEvent) -> NaiveDate,
{
    let mut counts: BTreeMap<(NaiveDate, Platform), u64> = BTreeMap::new();

    for event in events {
        *counts.entry((day_of(event), event.platform)).or_default() += 1;
    }

    counts
        .into_iter()
        .map(|((day, platform), review_count)| DailyPlatformCount {
            day,
            platform,
            review_count,
        })
        .collect()
}

/// Count events per calendar date of their timestamp, as written.
pub fn daily_counts_by_date<'a, I>(events: I) -> Vec<DailyPlatformCount>
where
    I: IntoIterator<Item = &'a ReviewEvent>,
{
    daily_counts(events, ReviewEvent::day)
}

/// Total reviews per platform over the whole period.
pub fn platform_totals(counts: &[DailyPlatformCount]) -> BTreeMap<Platform, u64> {
    let mut totals: BTreeMap<Platform, u64> = BTreeMap::new();

    for row in counts {
        *totals.entry(row.platform).or_default() += row.review_count;
    }

    totals
}
