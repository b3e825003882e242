//! Money-weighted internal rate of return.
//!
//! The IRR is the annual rate `r` at which the net present value of all
//! external flows, plus the ending position value, is zero:
//!
//! `sum_i cf_i / (1 + r)^(t_i / days_per_year) = 0`
//!
//! with `t_i` in fractional days since the first flow. It is only reported
//! as a diagnostic. Substituting `x = (1 + r)^(-1/days_per_year)` turns the
//! NPV into a generalized polynomial in `x`, and by Descartes' rule of
//! signs it has at most as many positive roots as the flow sequence has
//! sign changes. Every rebalance contributes a withdraw-then-deposit pair,
//! so a frequently rebalanced position can have many candidate rates and a
//! root finder may land on any of them, or on none.

use crate::config::IrrSolverConfig;
use crate::error::MetricError;
use chrono::{DateTime, Utc};
use clmm_returns_domain::entities::LiquidityEvent;
use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use serde::Serialize;
use tracing::debug;

/// A dated external flow from the investor's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CashFlowPoint {
    pub timestamp: DateTime<Utc>,
    /// Negative for money put in, positive for money taken out.
    pub amount: Decimal,
}

/// Event cash flows followed by the ending value, when positive, as a
/// terminal inflow at `analysis_end`.
#[must_use]
pub fn money_weighted_flows(
    events: &[LiquidityEvent],
    ending_value: Decimal,
    analysis_end: DateTime<Utc>,
) -> Vec<CashFlowPoint> {
    let mut flows: Vec<CashFlowPoint> = events
        .iter()
        .map(|e| CashFlowPoint {
            timestamp: e.timestamp,
            amount: e.cash_flow,
        })
        .collect();
    if ending_value > Decimal::ZERO {
        flows.push(CashFlowPoint {
            timestamp: analysis_end,
            amount: ending_value,
        });
    }
    flows
}

/// Number of sign changes in the flow sequence, skipping zero flows.
///
/// This bounds the number of distinct positive roots of the NPV.
#[must_use]
pub fn sign_changes(flows: &[CashFlowPoint]) -> usize {
    flows
        .iter()
        .filter(|f| !f.amount.is_zero())
        .map(|f| f.amount.is_sign_positive())
        .collect::<Vec<_>>()
        .windows(2)
        .filter(|pair| pair[0] != pair[1])
        .count()
}

/// Solves for the IRR by bracketed bisection.
///
/// The initial bracket is widened along the configured ladders until the
/// NPV changes sign. Bisection then only ever narrows a sign-changing
/// bracket, so a returned rate is always a genuine root.
///
/// # Errors
/// `NoConvergence` when the flows never change sign, no bracket is found,
/// the NPV is undefined inside the bracket, or the iteration limit is hit.
/// `Overflow` when the root does not fit a `Decimal`.
pub fn solve_irr(
    flows: &[CashFlowPoint],
    solver: &IrrSolverConfig,
    days_per_year: Decimal,
) -> Result<Decimal, MetricError> {
    let Some(origin) = flows.first().map(|f| f.timestamp) else {
        return Err(MetricError::no_convergence("no cash flows"));
    };
    if flows.len() < 2 {
        return Err(MetricError::no_convergence("fewer than two cash flows"));
    }
    if sign_changes(flows) == 0 {
        return Err(MetricError::no_convergence("cash flows never change sign"));
    }
    let year_seconds = days_per_year
        .to_f64()
        .map(|days| days * 86_400.0)
        .filter(|s| *s > 0.0)
        .ok_or_else(|| MetricError::no_convergence("invalid annualization base"))?;

    let points: Vec<(f64, f64)> = flows
        .iter()
        .map(|f| {
            let years = (f.timestamp - origin).num_seconds() as f64 / year_seconds;
            (years, f.amount.to_f64().unwrap_or(0.0))
        })
        .collect();
    let npv = |rate: f64| -> f64 {
        points
            .iter()
            .map(|(years, amount)| amount / (1.0 + rate).powf(*years))
            .sum()
    };

    let (mut low, mut high) = find_bracket(&npv, solver)?;
    let mut npv_low = npv(low);

    for _ in 0..solver.max_iterations {
        if (high - low).abs() < solver.rate_tolerance {
            return to_rate((low + high) / 2.0);
        }
        let mid = (low + high) / 2.0;
        let npv_mid = npv(mid);
        if npv_mid.is_nan() {
            return Err(MetricError::no_convergence(format!(
                "net present value undefined at rate {mid}"
            )));
        }
        if npv_mid.abs() < solver.npv_tolerance {
            return to_rate(mid);
        }
        if straddles(npv_low, npv_mid) {
            high = mid;
        } else {
            low = mid;
            npv_low = npv_mid;
        }
    }

    Err(MetricError::no_convergence(format!(
        "no root within {} iterations",
        solver.max_iterations
    )))
}

fn find_bracket(
    npv: &impl Fn(f64) -> f64,
    solver: &IrrSolverConfig,
) -> Result<(f64, f64), MetricError> {
    let mut low = solver.lower_bound;
    let mut high = solver.upper_bound;
    let npv_low = npv(low);
    let mut npv_high = npv(high);
    if straddles(npv_low, npv_high) {
        return Ok((low, high));
    }

    for &candidate in &solver.upper_ladder {
        high = candidate;
        npv_high = npv(high);
        if straddles(npv_low, npv_high) {
            debug!(low, high, "Widened IRR bracket upward");
            return Ok((low, high));
        }
    }
    for &candidate in &solver.lower_ladder {
        low = candidate;
        if straddles(npv(low), npv_high) {
            debug!(low, high, "Widened IRR bracket downward");
            return Ok((low, high));
        }
    }

    Err(MetricError::no_convergence(
        "no bracket with a sign change in net present value",
    ))
}

fn straddles(a: f64, b: f64) -> bool {
    (a < 0.0 && b > 0.0) || (a > 0.0 && b < 0.0)
}

fn to_rate(rate: f64) -> Result<Decimal, MetricError> {
    Decimal::from_f64(rate).ok_or(MetricError::Overflow { metric: "irr" })
}
