//! Athlete monitoring and training-session analytics.
//!
//! Raw records are validated into [`models`] types, enriched once by
//! [`metrics`], and then read by the [`advice`] rule evaluators and the
//! [`cohort`] aggregations. [`loader`] and [`report`] sit around that core and
//! handle CSV input and markdown output.

pub mod advice;
pub mod cohort;
pub mod error;
pub mod loader;
pub mod metrics;
pub mod models;
pub mod report;

pub use advice::{monitoring_advice, session_advice, Advisor, MonitoringAdvisor, SessionAdvisor};
pub use cohort::{
    at_or_above, elite_subset, grouped_mean, percentile_rank, quantile_threshold, top_n, Measured,
    MonitoringField, PercentileRank, SessionField,
};
pub use error::{AnalyticsError, AnalyticsResult};
pub use metrics::{derive_monitoring_batch, derive_session_batch};
