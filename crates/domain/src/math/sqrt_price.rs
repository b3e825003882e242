//! Conversions between the pool's Q64.96 sqrt-price encoding and real prices.
//!
//! The pool stores `sqrt(raw_b / raw_a) * 2^96` as an unsigned integer.
//! Squaring that value reaches ~2^320, far beyond an `f64` mantissa, so the
//! square and the division by `2^192` are done on 512-bit integers and only
//! the final quotient is turned into a `Decimal`.

use crate::error::PriceError;
use crate::value_objects::decimals::TokenDecimals;
use crate::value_objects::price::Price;
use primitive_types::{U256, U512};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Fractional bits of the sqrt-price encoding.
pub const Q96_BITS: usize = 96;

/// Fractional bits of the squared encoding.
const RATIO_BITS: usize = 2 * Q96_BITS;

/// Largest mantissa a `Decimal` can carry (2^96 - 1).
const MAX_MANTISSA: u128 = (1u128 << 96) - 1;

/// Largest `Decimal` scale.
const MAX_SCALE: u32 = 28;

/// Largest power of ten applied while encoding a price.
const MAX_ENCODE_EXP10: u32 = 64;

/// A strictly positive sqrt-price in Q64.96 fixed point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SqrtPriceX96(U256);

impl SqrtPriceX96 {
    /// Wraps a raw encoding, rejecting zero.
    pub fn new(raw: U256) -> Result<Self, PriceError> {
        if raw.is_zero() {
            return Err(PriceError::invalid("sqrt price is zero"));
        }
        Ok(Self(raw))
    }

    pub fn raw(&self) -> U256 {
        self.0
    }
}

impl FromStr for SqrtPriceX96 {
    type Err = PriceError;

    /// Accepts a decimal integer or a `0x`-prefixed hex string.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(PriceError::invalid("empty value"));
        }
        if s.starts_with('-') {
            return Err(PriceError::invalid(format!("negative value {s}")));
        }
        let digits = s.strip_prefix('+').unwrap_or(s);
        let raw = match digits
            .strip_prefix("0x")
            .or_else(|| digits.strip_prefix("0X"))
        {
            Some(hex) => U256::from_str_radix(hex, 16)
                .map_err(|_| PriceError::invalid(format!("malformed hex value {s}")))?,
            None => U256::from_dec_str(digits)
                .map_err(|_| PriceError::invalid(format!("malformed integer {s}")))?,
        };
        Self::new(raw)
    }
}

impl fmt::Display for SqrtPriceX96 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for SqrtPriceX96 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawEncoding {
    Unsigned(u64),
    Signed(i64),
    Text(String),
}

impl<'de> Deserialize<'de> for SqrtPriceX96 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let parsed = match RawEncoding::deserialize(deserializer)? {
            RawEncoding::Unsigned(v) => Self::new(U256::from(v)),
            RawEncoding::Signed(v) => Err(PriceError::invalid(format!("negative value {v}"))),
            RawEncoding::Text(s) => s.parse(),
        };
        parsed.map_err(serde::de::Error::custom)
    }
}

/// Decodes a sqrt-price encoding into the price of token A in token B.
///
/// `price = (raw / 2^96)^2 * 10^(decimals_a - decimals_b)`
///
/// # Errors
/// `InvalidEncoding` when `raw` is absent or zero, `OutOfRange` when the
/// price does not fit a `Decimal`.
pub fn decode_price(
    raw: Option<SqrtPriceX96>,
    decimals_a: u8,
    decimals_b: u8,
) -> Result<Price, PriceError> {
    let raw = raw.ok_or_else(|| PriceError::invalid("no price observation"))?;
    if raw.0.is_zero() {
        return Err(PriceError::invalid("sqrt price is zero"));
    }

    let root = U512::from(raw.0);
    let squared = root * root;
    let exponent = TokenDecimals::new(decimals_a, decimals_b).exponent();

    // Largest scale whose quotient still fits a Decimal mantissa.
    for scale in (0..=MAX_SCALE).rev() {
        let Some(quotient) = scaled_quotient(squared, scale as i32 + exponent) else {
            continue;
        };
        if quotient > U512::from(MAX_MANTISSA) {
            continue;
        }
        if quotient.is_zero() {
            return Err(PriceError::out_of_range("price below 1e-28"));
        }
        let mantissa = i128::try_from(quotient.low_u128())
            .map_err(|_| PriceError::out_of_range("mantissa does not fit i128"))?;
        let value = Decimal::try_from_i128_with_scale(mantissa, scale)
            .map_err(|e| PriceError::out_of_range(e.to_string()))?;
        return Ok(Price::new(value));
    }
    Err(PriceError::out_of_range("price exceeds 96-bit mantissa"))
}

/// `squared * 10^exp10 / 2^192`, or `None` if an intermediate overflows.
fn scaled_quotient(squared: U512, exp10: i32) -> Option<U512> {
    let power = U512::from(10u8).checked_pow(U512::from(exp10.unsigned_abs()))?;
    if exp10 >= 0 {
        squared.checked_mul(power).map(|scaled| scaled >> RATIO_BITS)
    } else {
        let divisor = power.checked_mul(U512::one() << RATIO_BITS)?;
        Some(squared / divisor)
    }
}

/// Encodes a price of token A in token B into the sqrt-price form.
///
/// This is the inverse of [`decode_price`] up to the floor of the integer
/// square root.
///
/// # Errors
/// `InvalidEncoding` for a non-positive price, `OutOfRange` when the
/// encoding does not fit 256 bits.
pub fn encode_price(
    price: Price,
    decimals_a: u8,
    decimals_b: u8,
) -> Result<SqrtPriceX96, PriceError> {
    if !price.is_positive() {
        return Err(PriceError::invalid(format!(
            "price must be positive, got {}",
            price.value
        )));
    }

    let mantissa = price.value.mantissa().unsigned_abs();
    // raw ratio = mantissa / 10^(scale + exponent)
    let divisor_exp =
        price.value.scale() as i32 + TokenDecimals::new(decimals_a, decimals_b).exponent();
    if divisor_exp.unsigned_abs() > MAX_ENCODE_EXP10 {
        return Err(PriceError::out_of_range("decimal difference too large to encode"));
    }

    let mantissa = U512::from(mantissa);
    let ratio_x192 = if divisor_exp >= 0 {
        (mantissa << RATIO_BITS) / U512::exp10(divisor_exp as usize)
    } else {
        (mantissa * U512::exp10(divisor_exp.unsigned_abs() as usize)) << RATIO_BITS
    };

    let root = U256::try_from(ratio_x192.integer_sqrt())
        .map_err(|_| PriceError::out_of_range("sqrt price exceeds 256 bits"))?;
    SqrtPriceX96::new(root)
}
