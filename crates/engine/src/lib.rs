//! Returns engine for frequently rebalanced liquidity positions.
//!
//! This crate turns a closed, chronological set of liquidity events into
//! return metrics that stay meaningful under high-frequency rebalancing:
//! - Event pricing and mark-to-market valuation
//! - Position timeline with capital-weighted sub-periods
//! - Chain-linked time-weighted return and its annualization
//! - Buy-and-hold benchmark
//! - Money-weighted rate as a flagged diagnostic
//!
//! Every entry point is a pure function of its inputs and an explicit
//! [`config::AnalysisConfig`].

/// Prelude module for convenient imports.
pub mod prelude;

/// End-to-end analysis.
pub mod analyzer;
/// Analysis configuration.
pub mod config;
/// Engine errors.
pub mod error;
/// Metrics output contract.
pub mod metrics;
/// Event pricing and valuation.
pub mod pricing;
/// Data-quality notes.
pub mod quality;
/// Rebalance detection and leg merging.
pub mod rebalance;
/// Return computations.
pub mod returns;
/// Position timeline.
pub mod timeline;
