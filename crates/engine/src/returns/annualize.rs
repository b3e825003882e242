//! Annualization of growth factors.

use crate::config::AnnualizationMethod;
use crate::error::MetricError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};

const SECONDS_PER_DAY: i64 = 86_400;

/// Fractional days between two instants.
#[must_use]
pub fn period_days(start: DateTime<Utc>, end: DateTime<Utc>) -> Decimal {
    Decimal::from((end - start).num_seconds()) / Decimal::from(SECONDS_PER_DAY)
}

/// Annualizes `growth` observed over `days` with the chosen method.
///
/// # Errors
/// `DegenerateInterval` when `days` is not positive. See
/// [`compound_annualize`] for the compound-only errors.
pub fn annualize(
    growth: Decimal,
    days: Decimal,
    days_per_year: Decimal,
    method: AnnualizationMethod,
) -> Result<Decimal, MetricError> {
    match method {
        AnnualizationMethod::Simple => simple_annualize(growth, days, days_per_year),
        AnnualizationMethod::Compound => compound_annualize(growth, days, days_per_year),
    }
}

/// `(growth - 1) * days_per_year / days`.
///
/// # Errors
/// `DegenerateInterval` when `days` is not positive; `Overflow` when the
/// rate does not fit a `Decimal`.
pub fn simple_annualize(
    growth: Decimal,
    days: Decimal,
    days_per_year: Decimal,
) -> Result<Decimal, MetricError> {
    if days <= Decimal::ZERO {
        return Err(MetricError::DegenerateInterval { days });
    }
    (growth - Decimal::ONE)
        .checked_mul(days_per_year)
        .and_then(|scaled| scaled.checked_div(days))
        .ok_or(MetricError::Overflow {
            metric: "simple annualized rate",
        })
}

/// `growth^(days_per_year / days) - 1`.
///
/// The fractional power is taken in `f64`; the result is converted back
/// to `Decimal`.
///
/// # Errors
/// `DegenerateInterval` when `days` is not positive, `NonPositiveGrowth`
/// for a growth factor at or below zero, and `Overflow` when the rate
/// leaves the `Decimal` range.
pub fn compound_annualize(
    growth: Decimal,
    days: Decimal,
    days_per_year: Decimal,
) -> Result<Decimal, MetricError> {
    if days <= Decimal::ZERO {
        return Err(MetricError::DegenerateInterval { days });
    }
    if growth <= Decimal::ZERO {
        return Err(MetricError::NonPositiveGrowth { growth });
    }
    let overflow = MetricError::Overflow {
        metric: "compound annualized rate",
    };

    let (Some(base), Some(exponent)) = (
        growth.to_f64(),
        days_per_year.checked_div(days).and_then(|e| e.to_f64()),
    ) else {
        return Err(overflow);
    };
    let rate = base.powf(exponent) - 1.0;
    if !rate.is_finite() {
        return Err(overflow);
    }
    Decimal::from_f64(rate).ok_or(overflow)
}
