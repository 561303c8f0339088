//! Rating, sentiment and engagement distributions.

use super::kpi::mean;
use crate::models::{Platform, ReviewEvent};
use serde::Serialize;
use std::collections::BTreeMap;

/// Number of reviews with a given rating on a given platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RatingBucket {
    pub rating: u8,
    pub platform: Platform,
    pub count: u64,
}

/// Box-plot statistics of sentiment scores for one platform.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SentimentStats {
    pub platform: Platform,
    pub count: usize,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
    pub mean: f64,
}

/// Average engagement of reviews with a given rating.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EngagementByRating {
    pub rating: u8,
    pub reviews: usize,
    pub avg_engagement: f64,
}

/// Rating histogram grouped by platform, ordered by rating then platform.
pub fn rating_distribution(events: &[ReviewEvent]) -> Vec<RatingBucket> {
    let mut buckets: BTreeMap<(u8, Platform), u64> = BTreeMap::new();
    for event in events {
        *buckets.entry((event.rating, event.platform)).or_default() += 1;
    }

    buckets
        .into_iter()
        .map(|((rating, platform), count)| RatingBucket {
            rating,
            platform,
            count,
        })
        .collect()
}

/// Per-platform sentiment spread. Events without a score are skipped.
pub fn sentiment_distribution(events: &[ReviewEvent]) -> Vec<SentimentStats> {
    let mut scores: BTreeMap<Platform, Vec<f64>> = BTreeMap::new();
    for event in events {
        if let Some(score) = event.sentiment_score {
            scores.entry(event.platform).or_default().push(score);
        }
    }

    scores
        .into_iter()
        .filter_map(|(platform, mut values)| {
            values.sort_by(|a, b| a.total_cmp(b));
            let avg = mean(values.iter().copied())?;

            Some(SentimentStats {
                platform,
                count: values.len(),
                min: *values.first()?,
                q1: quantile(&values, 0.25),
                median: quantile(&values, 0.5),
                q3: quantile(&values, 0.75),
                max: *values.last()?,
                mean: avg,
            })
        })
        .collect()
}

/// Mean thumbs-up count per rating, ordered by rating.
pub fn engagement_by_rating(events: &[ReviewEvent]) -> Vec<EngagementByRating> {
    let mut grouped: BTreeMap<u8, Vec<u64>> = BTreeMap::new();
    for event in events {
        grouped
            .entry(event.rating)
            .or_default()
            .push(event.engagement_count);
    }

    grouped
        .into_iter()
        .filter_map(|(rating, counts)| {
            let avg = mean(counts.iter().map(|&c| c as f64))?;
            Some(EngagementByRating {
                rating,
                reviews: counts.len(),
                avg_engagement: avg,
            })
        })
        .collect()
}

/// Quantile of sorted values using linear interpolation between ranks.
///
/// `sorted` must be non-empty and ascending.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    if sorted.len() == 1 {
        return sorted[0];
    }

    let position = q * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let weight = position - lower as f64;

    sorted[lower] + (sorted[upper] - sorted[lower]) * weight
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn event(platform: Platform, rating: u8, sentiment: Option<f64>, thumbs: u64) -> ReviewEvent {
        ReviewEvent {
            platform,
            timestamp: NaiveDate::from_ymd_opt(2024, 6, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            rating,
            sentiment_score: sentiment,
            engagement_count: thumbs,
        }
    }

    #[test]
    fn test_rating_distribution() {
        let events = vec![
            event(Platform::Twitter, 1, None, 0),
            event(Platform::Facebook, 1, None, 0),
            event(Platform::Facebook, 5, None, 0),
            event(Platform::Facebook, 1, None, 0),
        ];

        let buckets = rating_distribution(&events);

        assert_eq!(
            buckets,
            vec![
                RatingBucket { rating: 1, platform: Platform::Facebook, count: 2 },
                RatingBucket { rating: 1, platform: Platform::Twitter, count: 1 },
                RatingBucket { rating: 5, platform: Platform::Facebook, count: 1 },
            ]
        );
    }

    #[test]
    fn test_sentiment_distribution() {
        let events = vec![
            event(Platform::Snapchat, 3, Some(0.4), 0),
            event(Platform::Snapchat, 3, Some(-0.2), 0),
            event(Platform::Snapchat, 3, Some(0.0), 0),
            event(Platform::Snapchat, 3, Some(1.0), 0),
            event(Platform::Instagram, 3, Some(0.25), 0),
            event(Platform::Instagram, 3, None, 0),
        ];

        let stats = sentiment_distribution(&events);
        assert_eq!(stats.len(), 2);

        let instagram = &stats[0];
        assert_eq!(instagram.platform, Platform::Instagram);
        assert_eq!(instagram.count, 1);
        assert_eq!(instagram.median, 0.25);
        assert_eq!(instagram.q1, 0.25);

        let snapchat = &stats[1];
        assert_eq!(snapchat.count, 4);
        assert_eq!(snapchat.min, -0.2);
        assert_eq!(snapchat.max, 1.0);
        // Sorted: -0.2, 0.0, 0.4, 1.0
        assert!((snapchat.median - 0.2).abs() < 1e-12);
        assert!((snapchat.q1 - (-0.05)).abs() < 1e-12);
        assert!((snapchat.q3 - 0.55).abs() < 1e-12);
        assert!((snapchat.mean - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_engagement_by_rating() {
        let events = vec![
            event(Platform::Facebook, 1, None, 30),
            event(Platform::Twitter, 1, None, 10),
            event(Platform::Facebook, 5, None, 1),
        ];

        let engagement = engagement_by_rating(&events);

        assert_eq!(
            engagement,
            vec![
                EngagementByRating { rating: 1, reviews: 2, avg_engagement: 20.0 },
                EngagementByRating { rating: 5, reviews: 1, avg_engagement: 1.0 },
            ]
        );
    }

    #[test]
    fn test_empty_inputs() {
        assert!(rating_distribution(&[]).is_empty());
        assert!(sentiment_distribution(&[]).is_empty());
        assert!(engagement_by_rating(&[]).is_empty());
    }
}
