//! Buy-and-hold benchmark.
//!
//! The benchmark keeps every externally deposited token untouched until the
//! analysis end and marks the pile at the ending price. Redeposit legs of a
//! rebalance move capital that is already inside the benchmark, so they are
//! left out.

use crate::error::MetricError;
use crate::rebalance::redeposit_indices;
use clmm_returns_domain::entities::LiquidityEvent;
use clmm_returns_domain::value_objects::{Holdings, Price};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashSet;

/// Passive-holding counterfactual of a position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HodlBenchmark {
    /// Tokens deposited by Increase events that do not close a rebalance.
    pub deposited: Holdings,
    /// Value of the deposited tokens at the ending price.
    pub hodl_value: Decimal,
    /// Sum of the absolute cash flows of those deposits.
    pub capital_deployed: Decimal,
    /// `hodl_value / capital_deployed`.
    pub growth: Decimal,
}

impl HodlBenchmark {
    /// Dollar gain of holding over the deposited capital.
    pub fn profit(&self) -> Decimal {
        self.hodl_value - self.capital_deployed
    }
}

/// Builds the benchmark from the raw events.
///
/// An Increase directly following a Decrease less than `window_seconds`
/// earlier is a redeposit and contributes neither tokens nor capital.
///
/// # Errors
/// `NoCapital` when the position has no deposits.
pub fn hodl_benchmark(
    events: &[LiquidityEvent],
    end_price: Price,
    window_seconds: i64,
) -> Result<HodlBenchmark, MetricError> {
    let redeposits: HashSet<usize> = redeposit_indices(events, window_seconds).collect();
    let (deposited, capital_deployed) = events
        .iter()
        .enumerate()
        .filter(|(index, event)| event.is_increase() && !redeposits.contains(index))
        .fold(
            (Holdings::empty(), Decimal::ZERO),
            |(held, capital), (_, event)| {
                (
                    held.add(event.token_a_amount, event.token_b_amount),
                    capital + event.cash_flow.abs(),
                )
            },
        );
    if capital_deployed <= Decimal::ZERO {
        return Err(MetricError::NoCapital);
    }

    let hodl_value = deposited.mark(end_price);
    Ok(HodlBenchmark {
        deposited,
        hodl_value,
        capital_deployed,
        growth: hodl_value / capital_deployed,
    })
}
