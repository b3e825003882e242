use crate::entities::liquidity_event::{EventKind, LiquidityEvent};
use crate::value_objects::holdings::Holdings;
use crate::value_objects::price::Price;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Where the price attached to an event came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriceSource {
    /// Decoded from the event's own sqrt-price observation.
    Encoded,
    /// Copied from the nearest earlier event that had a price.
    BackFilled {
        /// Index of the event the price was taken from.
        from_index: usize,
    },
    /// Derived from the event's own cash flow and token amounts.
    Implied,
}

/// A liquidity event with its valuation price and post-event mark.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricedEvent {
    /// Position of the source event in the input sequence.
    pub index: usize,
    pub event: LiquidityEvent,
    pub price: Price,
    pub price_source: PriceSource,
    /// Token quantities attributed to the position after the event.
    pub holdings_after: Holdings,
    /// Mark-to-market value of the position right after the event.
    pub position_value_after: Decimal,
    /// Net cash flow at this boundary. Equals `event.cash_flow` unless a
    /// same-timestamp rebalance pair was merged into this event.
    pub boundary_cash_flow: Decimal,
    /// True when this boundary stands for a merged Decrease/Increase pair.
    pub merged_rebalance: bool,
}

impl PricedEvent {
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.event.timestamp
    }

    pub fn kind(&self) -> EventKind {
        self.event.kind
    }

    /// Value of the position just before the boundary cash flow.
    pub fn position_value_before(&self) -> Decimal {
        self.position_value_after + self.boundary_cash_flow
    }
}
