//! Percentage-share normalization of daily counts.

use crate::models::{DailyPlatformCount, DailyPlatformShare};
use chrono::NaiveDate;
use std::collections::HashMap;

/// Compute each row's share of its day's total review volume.
///
/// `percent_share = 100 * review_count / day_total`. Days whose total is
/// zero have no meaningful share and are left out of the result. Output
/// order follows the input.
pub fn percent_shares(counts: &[DailyPlatformCount]) -> Vec<DailyPlatformShare> {
    let mut day_totals: HashMap<NaiveDate, u64> = HashMap::new();
    for row in counts {
        *day_totals.entry(row.day).or_default() += row.review_count;
    }

    counts
        .iter()
        .filter_map(|row| {
            let total = day_totals.get(&row.day).copied().unwrap_or(0);
            if total == 0 {
                return None;
            }

            Some(DailyPlatformShare {
                day: row.day,
                platform: row.platform,
                percent_share: 100.0 * row.review_count as f64 / total as f64,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::aggregator::daily_counts_by_date;
    use crate::models::{Platform, PlatformSelection, ReviewEvent};
    use crate::table::ReviewTable;
    use proptest::prelude::*;
    use std::collections::BTreeMap;

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

    fn events(raw_day: &str, platform: Platform, n: usize) -> Vec<ReviewEvent> {
        let timestamp = day(raw_day).and_hms_opt(10, 0, 0).unwrap();
        (0..n)
            .map(|_| ReviewEvent {
                platform,
                timestamp,
                rating: 5,
                sentiment_score: None,
                engagement_count: 0,
            })
            .collect()
    }

    #[test]
    fn test_three_to_one_split() {
        let mut input = events("2024-01-01", Platform::Facebook, 3);
        input.extend(events("2024-01-01", Platform::Instagram, 1));

        let counts = daily_counts_by_date(&input);
        assert_eq!(
            counts,
            vec![
                count("2024-01-01", Platform::Facebook, 3),
                count("2024-01-01", Platform::Instagram, 1),
            ]
        );

        let shares = percent_shares(&counts);
        assert_eq!(shares.len(), 2);
        assert_eq!(shares[0].platform, Platform::Facebook);
        assert!((shares[0].percent_share - 75.0).abs() < 1e-9);
        assert_eq!(shares[1].platform, Platform::Instagram);
        assert!((shares[1].percent_share - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_shares_sum_to_hundred_per_day() {
        let counts = vec![
            count("2024-01-01", Platform::Facebook, 7),
            count("2024-01-01", Platform::Instagram, 11),
            count("2024-01-01", Platform::Snapchat, 13),
            count("2024-01-02", Platform::Twitter, 1),
            count("2024-01-03", Platform::Facebook, 1),
            count("2024-01-03", Platform::Twitter, 2),
        ];

        let shares = percent_shares(&counts);
        assert_eq!(shares.len(), counts.len());

        for d in ["2024-01-01", "2024-01-02", "2024-01-03"] {
            let sum: f64 = shares
                .iter()
                .filter(|s| s.day == day(d))
                .map(|s| s.percent_share)
                .sum();
            assert!((sum - 100.0).abs() < 1e-6, "day {d} sums to {sum}");
        }

        assert!(shares
            .iter()
            .all(|s| (0.0..=100.0).contains(&s.percent_share)));
    }

    #[test]
    fn test_zero_total_day_is_omitted() {
        let counts = vec![
            count("2024-01-01", Platform::Facebook, 0),
            count("2024-01-01", Platform::Twitter, 0),
            count("2024-01-02", Platform::Facebook, 4),
        ];

        let shares = percent_shares(&counts);
        assert_eq!(shares.len(), 1);
        assert_eq!(shares[0].day, day("2024-01-02"));
        assert_eq!(shares[0].percent_share, 100.0);
        assert!(shares.iter().all(|s| s.percent_share.is_finite()));
    }

    #[test]
    fn test_empty_input_gives_empty_output() {
        assert!(percent_shares(&[]).is_empty());
    }

    #[test]
    fn test_excluding_a_platform_leaves_others_untouched() {
        let mut input = events("2024-01-01", Platform::Facebook, 3);
        input.extend(events("2024-01-01", Platform::Instagram, 1));
        input.extend(events("2024-01-02", Platform::Facebook, 2));
        let table = ReviewTable::new(input);

        let everything = daily_counts_by_date(table.events());
        let facebook_only = table.filter(&PlatformSelection::new([Platform::Facebook]).unwrap());
        let counts = daily_counts_by_date(facebook_only.events());
        let shares = percent_shares(&counts);

        assert!(counts.iter().all(|c| c.platform == Platform::Facebook));
        assert!(shares.iter().all(|s| s.platform == Platform::Facebook));

        for row in &counts {
            let before = everything
                .iter()
                .find(|c| c.day == row.day && c.platform == row.platform)
                .unwrap();
            assert_eq!(row.review_count, before.review_count);
        }

        assert!(shares.iter().all(|s| s.percent_share == 100.0));
    }

    #[test]
    fn test_recomputation_is_identical() {
        let counts = vec![
            count("2024-01-01", Platform::Facebook, 2),
            count("2024-01-01", Platform::Snapchat, 1),
        ];
        assert_eq!(percent_shares(&counts), percent_shares(&counts));
    }

    /// Distinct (day, platform) rows with arbitrary counts, zeros included.
    fn arb_counts() -> impl Strategy<Value = Vec<DailyPlatformCount>> {
        prop::collection::btree_map((0u32..6, 0..Platform::ALL.len()), 0u64..1_000, 0..24)
            .prop_map(|rows| {
                rows.into_iter()
                    .map(|((d, p), review_count)| DailyPlatformCount {
                        day: NaiveDate::from_ymd_opt(2024, 1, d + 1).unwrap(),
                        platform: Platform::ALL[p],
                        review_count,
                    })
                    .collect()
            })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_shares_sum_to_hundred(counts in arb_counts()) {
            let shares = percent_shares(&counts);

            let mut totals: BTreeMap<NaiveDate, u64> = BTreeMap::new();
            for row in &counts {
                *totals.entry(row.day).or_default() += row.review_count;
            }

            for (d, total) in &totals {
                let day_shares: Vec<f64> = shares
                    .iter()
                    .filter(|s| s.day == *d)
                    .map(|s| s.percent_share)
                    .collect();

                if *total == 0 {
                    prop_assert!(day_shares.is_empty());
                } else {
                    let sum: f64 = day_shares.iter().sum();
                    prop_assert!((sum - 100.0).abs() < 1e-6, "day {} sums to {}", d, sum);
                }
            }

            prop_assert!(shares
                .iter()
                .all(|s| s.percent_share.is_finite() && (0.0..=100.0).contains(&s.percent_share)));
        }
    }
}
