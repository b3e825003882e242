//! Metrics output contract.
//!
//! All rates are fractions (`0.28` is 28%). A metric that could not be
//! computed carries the reason instead of a value, so one failed figure never
//! hides the others.

use crate::error::MetricError;
use crate::quality::QualityLog;
use crate::returns::{HodlBenchmark, SubPeriodReturn};
use chrono::{DateTime, Utc};
use clmm_returns_domain::entities::{PositionPeriod, PricedEvent};
use clmm_returns_domain::value_objects::Price;
use rust_decimal::Decimal;
use serde::Serialize;

/// A metric value or the reason it is unavailable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Metric {
    Computed { value: Decimal },
    Unavailable { reason: String },
}

impl Metric {
    #[must_use]
    pub fn value(&self) -> Option<Decimal> {
        match self {
            Metric::Computed { value } => Some(*value),
            Metric::Unavailable { .. } => None,
        }
    }

    #[must_use]
    pub fn is_computed(&self) -> bool {
        matches!(self, Metric::Computed { .. })
    }
}

impl From<Result<Decimal, MetricError>> for Metric {
    fn from(result: Result<Decimal, MetricError>) -> Self {
        match result {
            Ok(value) => Metric::Computed { value },
            Err(err) => Metric::Unavailable {
                reason: err.to_string(),
            },
        }
    }
}

/// IRR reported as a diagnostic alongside the reasons to distrust it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IrrDiagnostic {
    /// Annual money-weighted rate.
    pub rate: Metric,
    /// True when the rebalance count exceeds the reliability threshold.
    pub unreliable: bool,
    pub rebalance_count: u32,
    pub reliability_threshold: u32,
    /// Sign changes in the flow sequence, an upper bound on the number of
    /// distinct rates that solve the NPV equation.
    pub sign_changes: usize,
}

/// Headline metrics of one analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsResult {
    /// Sum of the absolute deposit cash flows.
    pub capital_deployed: Decimal,
    /// Absolute cash flow of the first deposit.
    pub initial_capital: Decimal,
    /// Largest running total of deposits minus withdrawals.
    pub peak_net_invested: Decimal,
    /// Sum of the withdrawal and fee-claim cash flows.
    pub total_withdrawn: Decimal,
    /// Sum of the fee-claim cash flows, already part of `total_withdrawn`.
    pub fees_collected: Decimal,
    /// Position value at the analysis end.
    pub ending_value: Decimal,
    /// `total_withdrawn + ending_value - capital_deployed`.
    pub net_profit: Decimal,
    /// `net_profit / peak_net_invested`.
    pub total_return_pct: Metric,
    /// Cumulative time-weighted return.
    pub twr_total_return: Metric,
    /// Annualized time-weighted return under the configured method.
    pub twr_apr: Metric,
    /// Compounded annualized time-weighted return.
    pub twr_apy: Metric,
    /// Value of the deposited tokens held passively to the end.
    pub hodl_value: Metric,
    /// Annualized return of holding the deposited tokens.
    pub hodl_apr: Metric,
    /// `twr_apr - hodl_apr`.
    pub outperformance_apr: Metric,
    /// `net_profit` minus the dollar gain of the passive benchmark.
    pub vs_hodl: Metric,
    /// Net token flows of the liquidity legs, open holdings counted as
    /// withdrawn, marked at the ending price. Negative when providing
    /// liquidity left fewer tokens than were put in. Fee claims are excluded.
    pub divergence_loss: Decimal,
    /// Decrease events followed by an Increase inside the pairing window.
    pub rebalance_count: u32,
    /// `period_days / rebalance_count`, absent without rebalances.
    pub days_per_rebalance: Option<Decimal>,
    /// Fractional days from the first event to the analysis end.
    pub period_days: Decimal,
    pub irr_estimate: IrrDiagnostic,
}

/// Price movement over the analysis window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PriceSummary {
    /// Valuation price of the first event.
    pub start_price: Price,
    /// Price the trailing period was marked at.
    pub end_price: Price,
    /// Relative change, when the start price is non-zero.
    pub change: Option<Decimal>,
}

impl PriceSummary {
    #[must_use]
    pub fn new(start_price: Price, end_price: Price) -> Self {
        Self {
            start_price,
            end_price,
            change: start_price.change_to(end_price),
        }
    }
}

/// Full result of an analysis run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Analysis {
    pub metrics: MetricsResult,
    /// Sub-periods in timeline order.
    pub periods: Vec<PositionPeriod>,
    /// Returns of the periods with capital at risk.
    pub sub_period_returns: Vec<SubPeriodReturn>,
    /// Every input event with its price and valuation.
    pub priced_events: Vec<PricedEvent>,
    pub hodl: Option<HodlBenchmark>,
    pub first_event: DateTime<Utc>,
    pub analysis_end: DateTime<Utc>,
    pub prices: PriceSummary,
    pub quality: QualityLog,
}
