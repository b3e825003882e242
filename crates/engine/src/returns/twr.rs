//! Time-weighted return.
//!
//! Each sub-period return strips the closing flow out of the end value and
//! measures against the capital at risk when the period opened:
//!
//! `r = (end_value + external_cash_flow) / start_value - 1`
//!
//! Chain-linking the sub-period returns measures the strategy independently
//! of how much capital moved in and out, which is what keeps the figure
//! stable under frequent rebalancing.

use crate::error::MetricError;
use clmm_returns_domain::entities::PositionPeriod;
use rust_decimal::Decimal;
use serde::Serialize;

/// Return of one sub-period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SubPeriodReturn {
    /// Position of the period in the timeline.
    pub period_index: usize,
    pub rate: Decimal,
}

/// Chain-linked time-weighted return.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TwrResult {
    /// Returns of the periods with capital at risk, in timeline order.
    pub sub_period_returns: Vec<SubPeriodReturn>,
    /// Product of `1 + r` over the sub-period returns.
    pub total_growth: Decimal,
}

impl TwrResult {
    /// Cumulative time-weighted return.
    #[must_use]
    pub fn total_return(&self) -> Decimal {
        self.total_growth - Decimal::ONE
    }
}

/// Return of a single period.
///
/// Zero-length periods return exactly zero. Periods without capital return
/// `None` and contribute a factor of one.
///
/// # Errors
/// `Overflow` when the ratio does not fit a `Decimal`.
pub fn sub_period_return(period: &PositionPeriod) -> Result<Option<Decimal>, MetricError> {
    if !period.has_capital() {
        return Ok(None);
    }
    if period.is_zero_length() {
        return Ok(Some(Decimal::ZERO));
    }
    let ratio = period
        .end_value_before_flow()
        .checked_div(period.start_value)
        .ok_or(MetricError::Overflow {
            metric: "sub-period return",
        })?;
    Ok(Some(ratio - Decimal::ONE))
}

/// Chain-links the sub-period returns of a timeline.
///
/// # Errors
/// `Overflow` when a return or the running product overflows.
pub fn chain_link(periods: &[PositionPeriod]) -> Result<TwrResult, MetricError> {
    let mut sub_period_returns = Vec::with_capacity(periods.len());
    let mut total_growth = Decimal::ONE;

    for (period_index, period) in periods.iter().enumerate() {
        let Some(rate) = sub_period_return(period)? else {
            continue;
        };
        total_growth = total_growth
            .checked_mul(Decimal::ONE + rate)
            .ok_or(MetricError::Overflow {
                metric: "time-weighted growth",
            })?;
        sub_period_returns.push(SubPeriodReturn { period_index, rate });
    }

    Ok(TwrResult {
        sub_period_returns,
        total_growth,
    })
}
