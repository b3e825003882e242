//! Prelude module for convenient imports.
//!
//! This module re-exports the most commonly used types from the crate.
//!
//! # Example
//!
//! ```rust
//! use clmm_returns_domain::prelude::*;
//! ```

// Entities
pub use crate::entities::{
    EventKind, LiquidityEvent, PositionPeriod, PriceSource, PricedEvent,
};

// Errors
pub use crate::error::{EventError, PriceError};

// Math
pub use crate::math::sqrt_price::{SqrtPriceX96, decode_price, encode_price};

// Value objects
pub use crate::value_objects::{Holdings, Price, TokenDecimals};
