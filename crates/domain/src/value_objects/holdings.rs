use crate::value_objects::price::Price;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Token quantities attributed to the position at a point in time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holdings {
    pub token_a: Decimal,
    pub token_b: Decimal,
}

impl Holdings {
    pub fn new(token_a: Decimal, token_b: Decimal) -> Self {
        Self { token_a, token_b }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.token_a.is_zero() && self.token_b.is_zero()
    }

    /// Value of the holdings in token B units at `price`.
    pub fn mark(&self, price: Price) -> Decimal {
        self.token_a * price.value + self.token_b
    }

    pub fn add(&self, token_a: Decimal, token_b: Decimal) -> Self {
        Self::new(self.token_a + token_a, self.token_b + token_b)
    }

    /// Subtracts both quantities if they fit inside the holdings.
    pub fn checked_sub(&self, token_a: Decimal, token_b: Decimal) -> Option<Self> {
        if token_a <= self.token_a && token_b <= self.token_b {
            Some(Self::new(self.token_a - token_a, self.token_b - token_b))
        } else {
            None
        }
    }

    /// Keeps `fraction` of each token, clamped to `[0, 1]`.
    pub fn scale(&self, fraction: Decimal) -> Self {
        let fraction = fraction.clamp(Decimal::ZERO, Decimal::ONE);
        Self::new(self.token_a * fraction, self.token_b * fraction)
    }
}
