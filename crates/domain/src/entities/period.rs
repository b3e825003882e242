use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Interval between two consecutive valuation boundaries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionPeriod {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Position value when the period opens.
    pub start_value: Decimal,
    /// Position value after the boundary event that closes the period.
    pub end_value: Decimal,
    /// Cash flow of the boundary event that closes the period, which opens
    /// the next capital basis. Negative for deposits.
    pub external_cash_flow: Decimal,
    /// Trailing period ending at the analysis end.
    pub is_final: bool,
    /// Index of the event closing the period, `None` for the trailing one.
    pub closing_event: Option<usize>,
}

impl PositionPeriod {
    pub fn duration_seconds(&self) -> i64 {
        (self.end_time - self.start_time).num_seconds()
    }

    pub fn is_zero_length(&self) -> bool {
        self.end_time == self.start_time
    }

    /// Whether any capital was at risk during the period.
    pub fn has_capital(&self) -> bool {
        self.start_value > Decimal::ZERO
    }

    /// Value at the end of the period before the closing cash flow.
    pub fn end_value_before_flow(&self) -> Decimal {
        self.end_value + self.external_cash_flow
    }
}
