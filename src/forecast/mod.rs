//! Forecasting of daily review volume.
//!
//! A [`Forecaster`] is an opaque collaborator: it receives a gap-free
//! [`DailySeries`] and returns predictions for a fixed horizon.

pub mod trend;

pub use trend::TrendForecaster;

use crate::analysis::DailySeries;
use crate::models::Platform;
use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

/// Default number of future days to predict.
pub const DEFAULT_HORIZON: usize = 30;

/// Why a forecast could not be produced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ForecastError {
    #[error("need at least {required} days of history, got {actual}")]
    InsufficientHistory { required: usize, actual: usize },
}

/// One predicted day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ForecastPoint {
    pub day: NaiveDate,
    /// Predicted review count.
    pub yhat: f64,
    pub yhat_lower: f64,
    pub yhat_upper: f64,
    /// False for days inside the observed history.
    pub is_future: bool,
}

/// Fitted history followed by `horizon` predicted days.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Forecast {
    pub platform: Platform,
    pub model: String,
    pub horizon: usize,
    pub points: Vec<ForecastPoint>,
}

impl Forecast {
    /// Only the predicted days past the end of the history.
    pub fn future(&self) -> impl Iterator<Item = &ForecastPoint> {
        self.points.iter().filter(|p| p.is_future)
    }

    /// Sum of predicted counts over the horizon.
    pub fn predicted_total(&self) -> f64 {
        self.future().map(|p| p.yhat).sum()
    }
}

/// A time-series model that extends a daily series.
pub trait Forecaster {
    /// Short model name shown in reports.
    fn name(&self) -> &str;

    /// Predict `horizon` days past the end of `series`.
    fn forecast(&self, series: &DailySeries, horizon: usize) -> Result<Forecast, ForecastError>;
}
