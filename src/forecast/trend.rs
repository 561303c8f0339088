//! Linear trend forecaster with day-of-week seasonality.

use super::{Forecast, ForecastError, ForecastPoint, Forecaster};
use crate::analysis::DailySeries;
use chrono::{Datelike, Duration};
use tracing::debug;

/// z-score of an 80% two-sided interval.
const Z_80: f64 = 1.2816;

/// Least-squares linear trend, plus weekly offsets once enough history
/// exists to estimate them.
#[derive(Debug, Clone)]
pub struct TrendForecaster {
    /// Interval half-width in residual standard deviations.
    pub interval_z: f64,
    /// Minimum history (days) before weekday offsets are fitted.
    pub min_seasonal_days: usize,
}

impl Default for TrendForecaster {
    fn default() -> Self {
        Self {
            interval_z: Z_80,
            min_seasonal_days: 14,
        }
    }
}

impl TrendForecaster {
    const MIN_HISTORY: usize = 2;
}

impl Forecaster for TrendForecaster {
    fn name(&self) -> &str {
        "linear-trend"
    }

    fn forecast(&self, series: &DailySeries, horizon: usize) -> Result<Forecast, ForecastError> {
        let n = series.len();
        if n < Self::MIN_HISTORY {
            return Err(ForecastError::InsufficientHistory {
                required: Self::MIN_HISTORY,
                actual: n,
            });
        }

        let ys: Vec<f64> = series.points().iter().map(|p| p.count as f64).collect();
        let weekday = |i: usize| series.points()[i].day.weekday().num_days_from_monday() as usize;

        // Weekday offsets first, so the trend is fitted on deseasonalized counts.
        let mut weekday_offsets = [0.0; 7];
        if n >= self.min_seasonal_days {
            let overall = ys.iter().sum::<f64>() / n as f64;
            let mut sums = [0.0; 7];
            let mut counts = [0usize; 7];
            for (i, y) in ys.iter().enumerate() {
                sums[weekday(i)] += y;
                counts[weekday(i)] += 1;
            }
            for wd in 0..7 {
                if counts[wd] > 0 {
                    weekday_offsets[wd] = sums[wd] / counts[wd] as f64 - overall;
                }
            }
        }

        let adjusted: Vec<f64> = ys
            .iter()
            .enumerate()
            .map(|(i, y)| y - weekday_offsets[weekday(i)])
            .collect();
        let (intercept, slope) = fit_line(&adjusted);

        let predict = |x: f64, day: chrono::NaiveDate| {
            intercept + slope * x + weekday_offsets[day.weekday().num_days_from_monday() as usize]
        };

        let residual_ss: f64 = series
            .points()
            .iter()
            .enumerate()
            .map(|(i, p)| (ys[i] - predict(i as f64, p.day)).powi(2))
            .sum();
        let sigma = if n > 2 {
            (residual_ss / (n - 2) as f64).sqrt()
        } else {
            0.0
        };
        let half_width = self.interval_z * sigma;

        debug!(
            "Fitted {} days for {}: slope {:.3}/day, sigma {:.3}",
            n,
            series.platform(),
            slope,
            sigma
        );

        let mut points = Vec::with_capacity(n + horizon);
        for (i, p) in series.points().iter().enumerate() {
            let yhat = predict(i as f64, p.day);
            points.push(ForecastPoint {
                day: p.day,
                yhat,
                yhat_lower: yhat - half_width,
                yhat_upper: yhat + half_width,
                is_future: false,
            });
        }

        // n >= MIN_HISTORY, so the series has both ends.
        if let (Some(first), Some(last)) = (series.first_day(), series.last_day()) {
            debug!("History {} to {}, predicting {} days", first, last, horizon);
            for step in 1..=horizon {
                let day = last + Duration::days(step as i64);
                let x = (n - 1 + step) as f64;
                let yhat = predict(x, day);
                points.push(ForecastPoint {
                    day,
                    yhat,
                    yhat_lower: yhat - half_width,
                    yhat_upper: yhat + half_width,
                    is_future: true,
                });
            }
        }

        Ok(Forecast {
            platform: series.platform(),
            model: self.name().to_string(),
            horizon,
            points,
        })
    }
}

/// Ordinary least squares of `ys` against 0, 1, 2, ... Returns (intercept, slope).
fn fit_line(ys: &[f64]) -> (f64, f64) {
    let n = ys.len() as f64;
    let x_mean = (n - 1.0) / 2.0;
    let y_mean = ys.iter().sum::<f64>() / n;

    let (sxy, sxx) = ys
        .iter()
        .enumerate()
        .fold((0.0, 0.0), |(sxy, sxx), (i, y)| {
            let dx = i as f64 - x_mean;
            (sxy + dx * (y - y_mean), sxx + dx * dx)
        });

    let slope = if sxx > 0.0 { sxy / sxx } else { 0.0 };
    (y_mean - slope * x_mean, slope)
}
