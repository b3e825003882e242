//! Event pricing and mark-to-market valuation.
//!
//! Every event gets a valuation price, resolved in this order:
//! 1. its own sqrt-price encoding,
//! 2. the nearest earlier resolved price,
//! 3. the price implied by its own cash flow and token amounts.
//!
//! An event with none of these aborts the run. Token holdings are carried
//! forward event by event and marked at the event's price.

use crate::config::{AnalysisConfig, EncodingOrientation};
use crate::error::AnalysisError;
use crate::quality::{QualityLog, QualityNote};
use clmm_returns_domain::entities::{EventKind, LiquidityEvent, PriceSource, PricedEvent};
use clmm_returns_domain::error::PriceError;
use clmm_returns_domain::math::sqrt_price::{SqrtPriceX96, decode_price};
use clmm_returns_domain::value_objects::{Holdings, Price};
use rust_decimal::Decimal;
use tracing::{debug, warn};

/// Decodes a raw encoding into a B-per-A price honoring the configured
/// orientation.
///
/// # Errors
/// Propagates the decoder's [`PriceError`].
pub fn valuation_price(
    raw: Option<SqrtPriceX96>,
    config: &AnalysisConfig,
) -> Result<Price, PriceError> {
    let decimals = config.decimals;
    match config.orientation {
        EncodingOrientation::TokenBPerTokenA => {
            decode_price(raw, decimals.token_a, decimals.token_b)
        }
        EncodingOrientation::TokenAPerTokenB => {
            let swapped = decimals.swapped();
            let a_per_b = decode_price(raw, swapped.token_a, swapped.token_b)?;
            a_per_b.invert().ok_or_else(|| PriceError::OutOfRange {
                reason: "inverted price is undefined".to_string(),
            })
        }
    }
}

/// Price implied by an event's own amounts: `(|cash_flow| - b) / a`.
///
/// Returns `None` when the event holds no token A or the result is not
/// positive.
#[must_use]
pub fn implied_price(event: &LiquidityEvent) -> Option<Price> {
    if event.token_a_amount <= Decimal::ZERO {
        return None;
    }
    let value = (event.cash_flow.abs() - event.token_b_amount).checked_div(event.token_a_amount)?;
    (value > Decimal::ZERO).then(|| Price::new(value))
}

/// Prices and values every event in order.
///
/// # Errors
/// `Integrity` for an event violating its sign or quantity invariants,
/// `MissingPrice` for an event left without any price.
pub fn price_events(
    events: &[LiquidityEvent],
    config: &AnalysisConfig,
    log: &mut QualityLog,
) -> Result<Vec<PricedEvent>, AnalysisError> {
    let mut priced = Vec::with_capacity(events.len());
    let mut holdings = Holdings::empty();
    // (record the price originates from, price)
    let mut last_resolved: Option<(usize, Price)> = None;

    for (index, event) in events.iter().enumerate() {
        event.validate().map_err(|source| AnalysisError::Integrity {
            index,
            timestamp: event.timestamp,
            source,
        })?;

        let (price, price_source) = match valuation_price(event.raw_price_encoding, config) {
            Ok(price) => {
                last_resolved = Some((index, price));
                (price, PriceSource::Encoded)
            }
            Err(err) => resolve_fallback(index, event, err, &mut last_resolved, log)?,
        };

        holdings = apply_event(holdings, index, event, price, log);
        let position_value_after = holdings.mark(price);
        debug!(
            index,
            kind = %event.kind,
            price = %price.value,
            value = %position_value_after,
            "Priced event"
        );

        priced.push(PricedEvent {
            index,
            event: event.clone(),
            price,
            price_source,
            holdings_after: holdings,
            position_value_after,
            boundary_cash_flow: event.cash_flow,
            merged_rebalance: false,
        });
    }

    Ok(priced)
}

fn resolve_fallback(
    index: usize,
    event: &LiquidityEvent,
    err: PriceError,
    last_resolved: &mut Option<(usize, Price)>,
    log: &mut QualityLog,
) -> Result<(Price, PriceSource), AnalysisError> {
    if let Some((from_index, price)) = *last_resolved {
        warn!(
            index,
            from_index,
            price = %price.value,
            reason = %err,
            "Back-filling event price"
        );
        log.record(QualityNote::back_filled(
            index,
            event.timestamp,
            from_index,
            price.value,
            err.to_string(),
        ));
        return Ok((price, PriceSource::BackFilled { from_index }));
    }

    if let Some(price) = implied_price(event) {
        warn!(
            index,
            price = %price.value,
            reason = %err,
            "Using price implied by event amounts"
        );
        log.record(QualityNote::implied(
            index,
            event.timestamp,
            price.value,
            err.to_string(),
        ));
        *last_resolved = Some((index, price));
        return Ok((price, PriceSource::Implied));
    }

    Err(AnalysisError::MissingPrice {
        index,
        timestamp: event.timestamp,
        source: err,
    })
}

/// Holdings after applying `event` at `price`.
///
/// Deposits add their tokens and fee claims leave them untouched. A
/// withdrawal worth at least the marked
/// holdings exits the position. Smaller withdrawals subtract their tokens
/// when they fit, and otherwise scale holdings by the value fraction kept.
fn apply_event(
    holdings: Holdings,
    index: usize,
    event: &LiquidityEvent,
    price: Price,
    log: &mut QualityLog,
) -> Holdings {
    match event.kind {
        EventKind::Increase => holdings.add(event.token_a_amount, event.token_b_amount),
        EventKind::Collect => holdings,
        EventKind::Decrease => {
            let mark = holdings.mark(price);
            if mark <= Decimal::ZERO {
                warn!(index, "Withdrawal without recorded holdings");
                log.record(QualityNote::withdrawal_without_holdings(
                    index,
                    event.timestamp,
                ));
                return Holdings::empty();
            }
            if event.cash_flow >= mark {
                return Holdings::empty();
            }
            if let Some(rest) = holdings.checked_sub(event.token_a_amount, event.token_b_amount) {
                return rest;
            }
            let retained = Decimal::ONE - event.cash_flow / mark;
            warn!(index, retained = %retained, "Withdrawal tokens exceed holdings; rescaling");
            log.record(QualityNote::rescaled(index, event.timestamp, retained));
            holdings.scale(retained)
        }
    }
}
