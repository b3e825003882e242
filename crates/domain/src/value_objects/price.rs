use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Price of one unit of token A expressed in units of token B.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Price {
    pub value: Decimal,
}

impl Price {
    pub fn new(value: Decimal) -> Self {
        Self { value }
    }

    pub fn is_positive(&self) -> bool {
        self.value > Decimal::ZERO
    }

    /// Returns the reciprocal price, or `None` for a zero price.
    pub fn invert(&self) -> Option<Self> {
        Decimal::ONE.checked_div(self.value).map(Self::new)
    }

    /// Relative change from `self` to `later`, as a fraction.
    pub fn change_to(&self, later: Price) -> Option<Decimal> {
        later
            .value
            .checked_div(self.value)
            .map(|ratio| ratio - Decimal::ONE)
    }
}
