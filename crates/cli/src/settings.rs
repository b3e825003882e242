//! Environment-backed settings.
//!
//! Values come from the process environment, which `main` first extends
//! with a `.env` file. Command-line flags override them.

use anyhow::{Context, Result};
use clap::ValueEnum;
use clmm_returns_domain::value_objects::TokenDecimals;
use clmm_returns_engine::config::{AnalysisConfig, AnnualizationMethod, EncodingOrientation};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

/// `--annualization` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AnnualizationArg {
    Simple,
    Compound,
}

impl From<AnnualizationArg> for AnnualizationMethod {
    fn from(arg: AnnualizationArg) -> Self {
        match arg {
            AnnualizationArg::Simple => AnnualizationMethod::Simple,
            AnnualizationArg::Compound => AnnualizationMethod::Compound,
        }
    }
}

/// `--orientation` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OrientationArg {
    /// Encoding is token B per token A.
    BPerA,
    /// Encoding is token A per token B.
    APerB,
}

impl From<OrientationArg> for EncodingOrientation {
    fn from(arg: OrientationArg) -> Self {
        match arg {
            OrientationArg::BPerA => EncodingOrientation::TokenBPerTokenA,
            OrientationArg::APerB => EncodingOrientation::TokenAPerTokenB,
        }
    }
}

/// Settings read from the environment.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub data_file: Option<PathBuf>,
    pub wallet: Option<String>,
    pub config: AnalysisConfig,
}

impl Settings {
    /// Reads `CLMM_*` variables from the process environment.
    ///
    /// # Errors
    /// Names the variable holding a value that does not parse.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Reads settings through an arbitrary lookup.
    ///
    /// # Errors
    /// Names the variable holding a value that does not parse.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = TokenDecimals::default();
        let decimals_a = parse_var(&lookup, "CLMM_DECIMALS_A")?.unwrap_or(defaults.token_a);
        let decimals_b = parse_var(&lookup, "CLMM_DECIMALS_B")?.unwrap_or(defaults.token_b);

        let mut config = AnalysisConfig::new(TokenDecimals::new(decimals_a, decimals_b));
        if let Some(threshold) = parse_var(&lookup, "CLMM_IRR_THRESHOLD")? {
            config = config.with_reliability_threshold(threshold);
        }
        if let Some(seconds) = parse_var(&lookup, "CLMM_REBALANCE_WINDOW_SECS")? {
            config = config.with_rebalance_window(seconds);
        }
        if let Some(merge) = parse_var(&lookup, "CLMM_MERGE_REBALANCE_LEGS")? {
            config = config.with_merged_rebalance_legs(merge);
        }
        if let Some(method) = enum_var::<AnnualizationArg>(&lookup, "CLMM_ANNUALIZATION")? {
            config = config.with_annualization(method.into());
        }
        if let Some(orientation) = enum_var::<OrientationArg>(&lookup, "CLMM_ORIENTATION")? {
            config = config.with_orientation(orientation.into());
        }

        Ok(Self {
            data_file: lookup("CLMM_DATA_FILE").map(PathBuf::from),
            wallet: lookup("CLMM_WALLET"),
            config,
        })
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    lookup(key)
        .map(|value| {
            value
                .trim()
                .parse::<T>()
                .with_context(|| format!("invalid value `{value}` for {key}"))
        })
        .transpose()
}

fn enum_var<T: ValueEnum>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>> {
    lookup(key)
        .map(|value| {
            T::from_str(value.trim(), true)
                .map_err(|reason| anyhow::anyhow!("invalid value `{value}` for {key}: {reason}"))
        })
        .transpose()
}
