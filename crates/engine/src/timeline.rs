//! Position timeline.
//!
//! Splits the holding history into sub-periods at every valuation boundary.
//! For boundaries `e_0 .. e_n` and analysis end `T` the timeline is:
//! - an opening zero-length period at `e_0` with no capital and the first
//!   deposit as its closing flow,
//! - one period `[e_{k-1}, e_k]` per consecutive pair, opening at the value
//!   after `e_{k-1}` and closing with the flow of `e_k`,
//! - a trailing period `[e_n, T]` with no flow, marked final.

use crate::error::AnalysisError;
use chrono::{DateTime, Utc};
use clmm_returns_domain::entities::{PositionPeriod, PricedEvent};
use clmm_returns_domain::value_objects::Price;
use rust_decimal::Decimal;

/// Checks that timestamps never decrease.
///
/// # Errors
/// `UnsortedEvents` naming the first record earlier than its predecessor.
pub fn ensure_sorted(
    timestamps: impl IntoIterator<Item = (usize, DateTime<Utc>)>,
) -> Result<(), AnalysisError> {
    let mut previous: Option<DateTime<Utc>> = None;
    for (index, timestamp) in timestamps {
        if let Some(prev) = previous.filter(|prev| timestamp < *prev) {
            return Err(AnalysisError::UnsortedEvents {
                index,
                timestamp,
                previous: prev,
            });
        }
        previous = Some(timestamp);
    }
    Ok(())
}

/// Builds the ordered sub-periods for a run of priced boundaries.
///
/// The trailing period is marked at `closing_price` when given, otherwise
/// at the last boundary's price.
///
/// # Errors
/// `EmptyEvents`, `UnsortedEvents`, or `AnalysisEndBeforeLastEvent`.
pub fn build_periods(
    events: &[PricedEvent],
    analysis_end: DateTime<Utc>,
    closing_price: Option<Price>,
) -> Result<Vec<PositionPeriod>, AnalysisError> {
    let (Some(first), Some(last)) = (events.first(), events.last()) else {
        return Err(AnalysisError::EmptyEvents);
    };
    ensure_sorted(events.iter().map(|e| (e.index, e.timestamp())))?;
    if analysis_end < last.timestamp() {
        return Err(AnalysisError::AnalysisEndBeforeLastEvent {
            analysis_end,
            index: last.index,
            last_event: last.timestamp(),
        });
    }

    let mut periods = Vec::with_capacity(events.len() + 1);
    periods.push(PositionPeriod {
        start_time: first.timestamp(),
        end_time: first.timestamp(),
        start_value: Decimal::ZERO,
        end_value: first.position_value_after,
        external_cash_flow: first.boundary_cash_flow,
        is_final: false,
        closing_event: Some(first.index),
    });

    for pair in events.windows(2) {
        let (opening, closing) = (&pair[0], &pair[1]);
        periods.push(PositionPeriod {
            start_time: opening.timestamp(),
            end_time: closing.timestamp(),
            start_value: opening.position_value_after,
            end_value: closing.position_value_after,
            external_cash_flow: closing.boundary_cash_flow,
            is_final: false,
            closing_event: Some(closing.index),
        });
    }

    let mark = closing_price.unwrap_or(last.price);
    periods.push(PositionPeriod {
        start_time: last.timestamp(),
        end_time: analysis_end,
        start_value: last.position_value_after,
        end_value: last.holdings_after.mark(mark),
        external_cash_flow: Decimal::ZERO,
        is_final: true,
        closing_event: None,
    });

    Ok(periods)
}
