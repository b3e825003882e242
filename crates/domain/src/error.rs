//! Error types for domain-level validation.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::entities::EventKind;

/// Errors raised while decoding or encoding pool prices.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PriceError {
    /// The raw sqrt-price value is absent, zero, negative or malformed.
    #[error("invalid price encoding: {reason}")]
    InvalidEncoding {
        /// What was wrong with the raw value.
        reason: String,
    },
    /// The price cannot be represented with the available precision.
    #[error("price out of representable range: {reason}")]
    OutOfRange {
        /// Which conversion step overflowed.
        reason: String,
    },
}

impl PriceError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidEncoding {
            reason: reason.into(),
        }
    }

    pub(crate) fn out_of_range(reason: impl Into<String>) -> Self {
        Self::OutOfRange {
            reason: reason.into(),
        }
    }
}

/// Integrity violations of a single liquidity event.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventError {
    /// Increase must carry a negative cash flow, Decrease a positive one,
    /// Collect a non-negative one.
    #[error("{kind} event has cash flow {cash_flow} with the wrong sign")]
    CashFlowSign {
        /// Kind of the offending event.
        kind: EventKind,
        /// The cash flow as recorded.
        cash_flow: Decimal,
    },
    /// Token quantities are never negative.
    #[error("{field} is negative ({value})")]
    NegativeQuantity {
        /// Name of the offending field.
        field: &'static str,
        /// The quantity as recorded.
        value: Decimal,
    },
}
