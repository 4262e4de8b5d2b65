use thiserror::Error;

/// Errors raised by record validation, metric derivation and cohort queries.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalyticsError {
    /// A raw field is missing, malformed or outside its declared domain.
    #[error("invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    /// Session duration is zero or negative, so rate and load terms are undefined.
    #[error("session duration must be positive (got {session_duration})")]
    DivisionUndefined { session_duration: f64 },

    /// A quantile or ranking query was made against an empty cohort.
    #[error("{operation} requires a non-empty cohort")]
    EmptyCohort { operation: &'static str },

    /// Age falls outside every age-group bucket.
    #[error("age {age} is outside the bucketed range (0, 30]")]
    UnclassifiedBucket { age: u32 },
}

impl AnalyticsError {
    pub(crate) fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field,
            reason: reason.into(),
        }
    }
}

pub type AnalyticsResult<T> = Result<T, AnalyticsError>;
