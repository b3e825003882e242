//! Domain model for LP return analysis.
//!
//! This crate holds the value objects and entities shared by the returns
//! engine and its data sources:
//! - Prices and token decimal scales
//! - Sqrt-price fixed-point decoding
//! - Liquidity events, priced events and position periods

/// Prelude module for convenient imports.
pub mod prelude;

/// Domain entities.
pub mod entities;
/// Domain errors.
pub mod error;
/// Fixed-point price math.
pub mod math;
/// Value objects.
pub mod value_objects;
