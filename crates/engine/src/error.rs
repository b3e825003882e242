//! Engine error types.
//!
//! [`AnalysisError`] covers structural violations of the input contract and
//! aborts a run. [`MetricError`] is local to one metric and is reported next
//! to the other metrics instead of being propagated.

use chrono::{DateTime, Utc};
use clmm_returns_domain::error::{EventError, PriceError};
use rust_decimal::Decimal;
use thiserror::Error;

/// Fatal errors for an analysis run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    #[error("event sequence is empty")]
    EmptyEvents,

    #[error(
        "events are not sorted by timestamp: record {index} at {timestamp} is earlier than its predecessor at {previous}"
    )]
    UnsortedEvents {
        index: usize,
        timestamp: DateTime<Utc>,
        previous: DateTime<Utc>,
    },

    #[error("record {index} at {timestamp} violates event integrity: {source}")]
    Integrity {
        index: usize,
        timestamp: DateTime<Utc>,
        #[source]
        source: EventError,
    },

    #[error("record {index} at {timestamp} has no usable price and no fallback: {source}")]
    MissingPrice {
        index: usize,
        timestamp: DateTime<Utc>,
        #[source]
        source: PriceError,
    },

    #[error("analysis end {analysis_end} is before the last event (record {index} at {last_event})")]
    AnalysisEndBeforeLastEvent {
        analysis_end: DateTime<Utc>,
        index: usize,
        last_event: DateTime<Utc>,
    },
}

/// Errors local to a single metric.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MetricError {
    /// The observation window has no positive length.
    #[error("cannot annualize over a window of {days} days")]
    DegenerateInterval { days: Decimal },

    /// The root finder found no bracket or ran out of iterations.
    #[error("root finder did not converge: {reason}")]
    NoConvergence { reason: String },

    /// A compounded rate needs a positive growth factor.
    #[error("growth factor {growth} is not positive")]
    NonPositiveGrowth { growth: Decimal },

    /// The result does not fit a `Decimal`.
    #[error("{metric} overflowed")]
    Overflow { metric: &'static str },

    /// No capital base to measure against.
    #[error("no capital was deployed")]
    NoCapital,

    /// A metric this one is derived from is unavailable.
    #[error("{metric} is unavailable")]
    Dependency { metric: &'static str },
}

impl MetricError {
    pub(crate) fn no_convergence(reason: impl Into<String>) -> Self {
        Self::NoConvergence {
            reason: reason.into(),
        }
    }
}
