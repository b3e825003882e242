//! Analysis configuration.
//!
//! All tunables are carried in an explicit [`AnalysisConfig`] value passed
//! into every entry point; the engine holds no ambient state.

use clmm_returns_domain::value_objects::TokenDecimals;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// How a measured growth factor is turned into a yearly rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AnnualizationMethod {
    /// `(growth - 1) * days_per_year / days`.
    #[default]
    Simple,
    /// `growth^(days_per_year / days) - 1`.
    Compound,
}

/// Which token ratio the pool's sqrt price encodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EncodingOrientation {
    /// The encoding is `sqrt(raw_b / raw_a)`; decodes straight to B per A.
    #[default]
    TokenBPerTokenA,
    /// The encoding is `sqrt(raw_a / raw_b)`; decoded with swapped scales,
    /// then inverted.
    TokenAPerTokenB,
}

/// Settings for the bracketing root finder behind the IRR diagnostic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrrSolverConfig {
    /// Initial lower bracket (annual rate, > -1).
    pub lower_bound: f64,
    /// Initial upper bracket (annual rate).
    pub upper_bound: f64,
    /// Upper brackets tried in order when the first bracket has no sign change.
    pub upper_ladder: Vec<f64>,
    /// Lower brackets tried in order after the upper ladder is exhausted.
    pub lower_ladder: Vec<f64>,
    /// Bisection step limit.
    pub max_iterations: u32,
    /// Bracket width at which the midpoint is accepted.
    pub rate_tolerance: f64,
    /// Absolute NPV at which a midpoint is accepted early.
    pub npv_tolerance: f64,
}

impl Default for IrrSolverConfig {
    fn default() -> Self {
        Self {
            lower_bound: -0.999,
            upper_bound: 1000.0,
            upper_ladder: vec![100.0, 500.0, 1000.0, 5000.0, 10000.0, 50000.0],
            lower_ladder: vec![-0.5, -0.9, -0.95, -0.99, -0.995, -0.999],
            max_iterations: 200,
            rate_tolerance: 1e-9,
            npv_tolerance: 0.01,
        }
    }
}

/// Configuration for an analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Decimal scales of token A (priced) and token B (quote).
    pub decimals: TokenDecimals,
    /// Orientation of the raw sqrt-price encoding.
    pub orientation: EncodingOrientation,
    /// Rebalance count above which the IRR diagnostic is flagged unreliable.
    pub irr_reliability_threshold: u32,
    /// Annualization base.
    pub days_per_year: Decimal,
    /// Annualization used for the APR figures.
    pub annualization: AnnualizationMethod,
    /// Maximum gap between a Decrease and the following Increase for the
    /// pair to count as one rebalance.
    pub rebalance_window_seconds: i64,
    /// Merge same-timestamp Decrease/Increase legs into one boundary.
    pub merge_rebalance_legs: bool,
    /// Root finder settings.
    pub irr: IrrSolverConfig,
}

impl AnalysisConfig {
    /// Creates a config with defaults for the given token scales.
    #[must_use]
    pub fn new(decimals: TokenDecimals) -> Self {
        Self {
            decimals,
            orientation: EncodingOrientation::default(),
            irr_reliability_threshold: 10,
            days_per_year: Decimal::from(365),
            annualization: AnnualizationMethod::default(),
            rebalance_window_seconds: 300, // 5 minutes
            merge_rebalance_legs: false,
            irr: IrrSolverConfig::default(),
        }
    }

    /// Sets the encoding orientation.
    #[must_use]
    pub fn with_orientation(mut self, orientation: EncodingOrientation) -> Self {
        self.orientation = orientation;
        self
    }

    /// Sets the IRR reliability threshold.
    #[must_use]
    pub fn with_reliability_threshold(mut self, threshold: u32) -> Self {
        self.irr_reliability_threshold = threshold;
        self
    }

    /// Sets the annualization base.
    #[must_use]
    pub fn with_days_per_year(mut self, days: Decimal) -> Self {
        self.days_per_year = days;
        self
    }

    /// Sets the annualization method.
    #[must_use]
    pub fn with_annualization(mut self, method: AnnualizationMethod) -> Self {
        self.annualization = method;
        self
    }

    /// Sets the rebalance pairing window.
    #[must_use]
    pub fn with_rebalance_window(mut self, seconds: i64) -> Self {
        self.rebalance_window_seconds = seconds;
        self
    }

    /// Enables or disables merging of same-timestamp rebalance legs.
    #[must_use]
    pub fn with_merged_rebalance_legs(mut self, merge: bool) -> Self {
        self.merge_rebalance_legs = merge;
        self
    }

    /// Sets the root finder settings.
    #[must_use]
    pub fn with_irr_solver(mut self, solver: IrrSolverConfig) -> Self {
        self.irr = solver;
        self
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self::new(TokenDecimals::default())
    }
}
