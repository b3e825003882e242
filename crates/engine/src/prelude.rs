//! Prelude module for convenient imports.
//!
//! # Example
//!
//! ```rust
//! use clmm_returns_engine::prelude::*;
//! ```

pub use crate::analyzer::{AnalysisWindow, analyze};
pub use crate::config::{AnalysisConfig, AnnualizationMethod, EncodingOrientation, IrrSolverConfig};
pub use crate::error::{AnalysisError, MetricError};
pub use crate::metrics::{Analysis, IrrDiagnostic, Metric, MetricsResult, PriceSummary};
pub use crate::pricing::{implied_price, price_events, valuation_price};
pub use crate::quality::{NoteData, QualityLog, QualityNote, QualityNoteKind};
pub use crate::rebalance::{count_rebalances, merge_rebalance_legs};
pub use crate::returns::{
    CashFlowPoint, HodlBenchmark, SubPeriodReturn, TwrResult, annualize, chain_link,
    compound_annualize, hodl_benchmark, money_weighted_flows, period_days, sign_changes,
    simple_annualize, solve_irr, sub_period_return,
};
pub use crate::timeline::{build_periods, ensure_sorted};
