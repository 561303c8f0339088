//! Analysis modules.
//!
//! The review-trend pipeline: daily aggregation, share normalization,
//! gap filling for forecasts, KPIs and distributions. Everything here is
//! a pure function of its input.

pub mod aggregator;
pub mod distribution;
pub mod kpi;
pub mod series;
pub mod share;

pub use aggregator::*;
pub use distribution::*;
pub use kpi::*;
pub use series::*;
pub use share::*;
