//! Input contract for position datasets.
//!
//! A dataset is a JSON document holding an optional wallet and block range,
//! an optional closing price observation, and the chronological list of
//! liquidity actions. This crate parses that document and turns each action
//! into a domain [`LiquidityEvent`](clmm_returns_domain::entities::LiquidityEvent),
//! reporting the first malformed record by index.

/// Prelude module for convenient imports.
pub mod prelude;

/// Validated datasets.
pub mod dataset;
/// Data-layer errors.
pub mod error;
/// Raw JSON records.
pub mod records;
/// Dataset sources.
pub mod source;
