//! Rebalance detection and same-timestamp leg merging.
//!
//! A rebalance shows up in the event stream as a Decrease immediately
//! followed by an Increase. Counting them drives the IRR reliability flag.

use chrono::Duration;
use clmm_returns_domain::entities::{EventKind, LiquidityEvent, PricedEvent};

/// Indices of the Increase events that close a rebalance: each one
/// directly follows a Decrease less than `window_seconds` earlier.
pub fn redeposit_indices(
    events: &[LiquidityEvent],
    window_seconds: i64,
) -> impl Iterator<Item = usize> + '_ {
    let window = Duration::seconds(window_seconds);
    events
        .windows(2)
        .enumerate()
        .filter(move |(_, pair)| {
            pair[0].is_decrease()
                && pair[1].is_increase()
                && pair[1].timestamp - pair[0].timestamp < window
        })
        .map(|(index, _)| index + 1)
}

/// Counts Decrease events directly followed by an Increase less than
/// `window_seconds` later.
#[must_use]
pub fn count_rebalances(events: &[LiquidityEvent], window_seconds: i64) -> u32 {
    let count = redeposit_indices(events, window_seconds).count();
    u32::try_from(count).unwrap_or(u32::MAX)
}

/// Collapses each Decrease followed by an Increase at the same timestamp
/// into one boundary.
///
/// The merged boundary keeps the Increase's price and post-event holdings
/// and carries the net cash flow of both legs, so the value just before it
/// equals the value before the Decrease.
#[must_use]
pub fn merge_rebalance_legs(events: &[PricedEvent]) -> Vec<PricedEvent> {
    let mut merged = Vec::with_capacity(events.len());
    let mut iter = events.iter().peekable();

    while let Some(current) = iter.next() {
        let increase = iter.next_if(|next| {
            current.kind() == EventKind::Decrease
                && next.kind() == EventKind::Increase
                && next.timestamp() == current.timestamp()
        });

        match increase {
            Some(increase) => {
                let mut boundary = increase.clone();
                boundary.boundary_cash_flow =
                    current.boundary_cash_flow + increase.boundary_cash_flow;
                boundary.merged_rebalance = true;
                merged.push(boundary);
            }
            None => merged.push(current.clone()),
        }
    }

    merged
}
