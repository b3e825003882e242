use crate::error::EventError;
use crate::math::sqrt_price::SqrtPriceX96;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of position change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    /// Liquidity added; capital leaves the holder.
    Increase,
    /// Liquidity removed; capital returns to the holder.
    Decrease,
    /// Accrued fees claimed; the deployed liquidity is untouched.
    Collect,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKind::Increase => write!(f, "IncreaseLiquidity"),
            EventKind::Decrease => write!(f, "DecreaseLiquidity"),
            EventKind::Collect => write!(f, "Collect"),
        }
    }
}

/// One observed change to the LP position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidityEvent {
    pub timestamp: DateTime<Utc>,
    pub kind: EventKind,
    pub token_a_amount: Decimal,
    pub token_b_amount: Decimal,
    /// Negative for deposits, positive for withdrawals and fee claims (USD).
    pub cash_flow: Decimal,
    /// Pool sqrt price at the execution point, when one was observed.
    pub raw_price_encoding: Option<SqrtPriceX96>,
}

impl LiquidityEvent {
    pub fn new(
        timestamp: DateTime<Utc>,
        kind: EventKind,
        token_a_amount: Decimal,
        token_b_amount: Decimal,
        cash_flow: Decimal,
    ) -> Self {
        Self {
            timestamp,
            kind,
            token_a_amount,
            token_b_amount,
            cash_flow,
            raw_price_encoding: None,
        }
    }

    /// Attaches the paired price observation.
    #[must_use]
    pub fn with_price_encoding(mut self, raw: SqrtPriceX96) -> Self {
        self.raw_price_encoding = Some(raw);
        self
    }

    pub fn is_increase(&self) -> bool {
        self.kind == EventKind::Increase
    }

    pub fn is_decrease(&self) -> bool {
        self.kind == EventKind::Decrease
    }

    pub fn is_collect(&self) -> bool {
        self.kind == EventKind::Collect
    }

    /// Checks the sign and quantity invariants of the event.
    pub fn validate(&self) -> Result<(), EventError> {
        for (field, value) in [
            ("token_a_amount", self.token_a_amount),
            ("token_b_amount", self.token_b_amount),
        ] {
            if value < Decimal::ZERO {
                return Err(EventError::NegativeQuantity { field, value });
            }
        }

        let sign_ok = match self.kind {
            EventKind::Increase => self.cash_flow < Decimal::ZERO,
            EventKind::Decrease => self.cash_flow > Decimal::ZERO,
            // A claim with nothing accrued is still a valid claim.
            EventKind::Collect => self.cash_flow >= Decimal::ZERO,
        };
        if !sign_ok {
            return Err(EventError::CashFlowSign {
                kind: self.kind,
                cash_flow: self.cash_flow,
            });
        }
        Ok(())
    }
}
