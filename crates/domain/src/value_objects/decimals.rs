use serde::{Deserialize, Serialize};

/// Decimal precision of the two pool tokens.
///
/// Token A is the priced asset and token B the quote asset, so a decoded
/// price reads "units of B per unit of A".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenDecimals {
    pub token_a: u8,
    pub token_b: u8,
}

impl TokenDecimals {
    pub fn new(token_a: u8, token_b: u8) -> Self {
        Self { token_a, token_b }
    }

    /// Same scales with the roles of the two tokens exchanged.
    pub fn swapped(&self) -> Self {
        Self {
            token_a: self.token_b,
            token_b: self.token_a,
        }
    }

    /// Exponent `decimals_a - decimals_b` applied when rescaling a raw ratio.
    pub fn exponent(&self) -> i32 {
        i32::from(self.token_a) - i32::from(self.token_b)
    }
}

impl Default for TokenDecimals {
    /// cbBTC (8) against USDC (6).
    fn default() -> Self {
        Self::new(8, 6)
    }
}
