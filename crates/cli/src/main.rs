//! Command Line Interface for LP position returns analysis.
use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use clmm_returns_data::dataset::Dataset;
use clmm_returns_data::records::parse_timestamp;
use clmm_returns_data::source::{EventSource, JsonFileSource};
use clmm_returns_domain::math::sqrt_price::SqrtPriceX96;
use clmm_returns_domain::value_objects::TokenDecimals;
use clmm_returns_engine::analyzer::{AnalysisWindow, analyze};
use clmm_returns_engine::config::AnalysisConfig;
use clmm_returns_engine::pricing::valuation_price;
use dotenv::dotenv;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod render;
mod settings;

use render::{OutputFormat, ReportHeader, render};
use settings::{AnnualizationArg, OrientationArg, Settings};

#[derive(Parser)]
#[command(name = "clmm-returns")]
#[command(
    about = "Time-weighted return analysis for rebalanced CLMM LP positions",
    long_about = "Computes chain-linked time-weighted returns for concentrated liquidity \
                  positions. IRR is reported only as a diagnostic: it is flagged unreliable \
                  when sub-daily rebalancing makes its cash-flow sequence change sign many times."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a position dataset
    Analyze(AnalyzeArgs),
    /// Decode a raw sqrt-price observation
    DecodePrice {
        /// Raw encoding, decimal or 0x-prefixed hex
        raw: String,

        #[command(flatten)]
        tuning: Tuning,
    },
}

#[derive(Args)]
struct AnalyzeArgs {
    /// Dataset JSON file (falls back to CLMM_DATA_FILE)
    #[arg(short, long)]
    data_file: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Summary)]
    format: OutputFormat,

    /// Position label overriding the dataset wallet
    #[arg(short, long)]
    wallet: Option<String>,

    /// Analysis end (ISO-8601); defaults to the dataset value or the last event
    #[arg(long)]
    analysis_end: Option<String>,

    /// Rebalance count above which IRR is flagged unreliable
    #[arg(long)]
    irr_threshold: Option<u32>,

    /// Merge same-timestamp withdraw/redeposit legs into one boundary
    #[arg(long)]
    merge_legs: bool,

    #[command(flatten)]
    tuning: Tuning,
}

#[derive(Args)]
struct Tuning {
    /// Decimals of token A (priced asset)
    #[arg(long)]
    decimals_a: Option<u8>,

    /// Decimals of token B (quote asset)
    #[arg(long)]
    decimals_b: Option<u8>,

    /// Token ratio the sqrt price encodes
    #[arg(long, value_enum)]
    orientation: Option<OrientationArg>,

    /// Annualization used for APR figures
    #[arg(long, value_enum)]
    annualization: Option<AnnualizationArg>,
}

impl Tuning {
    fn apply(&self, mut config: AnalysisConfig) -> AnalysisConfig {
        config.decimals = TokenDecimals::new(
            self.decimals_a.unwrap_or(config.decimals.token_a),
            self.decimals_b.unwrap_or(config.decimals.token_b),
        );
        if let Some(orientation) = self.orientation {
            config = config.with_orientation(orientation.into());
        }
        if let Some(method) = self.annualization {
            config = config.with_annualization(method.into());
        }
        config
    }
}

fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = Settings::from_env()?;

    match cli.command {
        Commands::Analyze(args) => run_analyze(args, settings),
        Commands::DecodePrice { raw, tuning } => {
            let config = tuning.apply(settings.config);
            let raw: SqrtPriceX96 = raw.parse().context("invalid sqrt price")?;
            let price = valuation_price(Some(raw), &config)?;
            println!("{}", price.value);
            Ok(())
        }
    }
}

fn run_analyze(args: AnalyzeArgs, settings: Settings) -> Result<()> {
    let mut config = args.tuning.apply(settings.config);
    if let Some(threshold) = args.irr_threshold {
        config = config.with_reliability_threshold(threshold);
    }
    if args.merge_legs {
        config = config.with_merged_rebalance_legs(true);
    }

    let Some(path) = args.data_file.or(settings.data_file) else {
        bail!("no dataset given: pass --data-file or set CLMM_DATA_FILE");
    };
    let dataset = JsonFileSource::new(&path)
        .load()
        .with_context(|| format!("loading {}", path.display()))?;

    let window = analysis_window(&dataset, args.analysis_end.as_deref())?;
    info!(
        path = %path.display(),
        events = dataset.events.len(),
        "Analyzing dataset"
    );
    let analysis = analyze(&dataset.events, &window, &config).context("analysis failed")?;

    let header = ReportHeader {
        wallet: dataset.wallet_label(args.wallet.as_deref().or(settings.wallet.as_deref())),
        range: dataset.range_label(),
    };
    println!("{}", render(&analysis, &header, args.format)?);
    Ok(())
}

fn analysis_window(dataset: &Dataset, end_flag: Option<&str>) -> Result<AnalysisWindow> {
    let end: Option<DateTime<Utc>> = match end_flag {
        Some(text) => Some(
            parse_timestamp(text)
                .with_context(|| format!("invalid --analysis-end `{text}`"))?,
        ),
        None => dataset.analysis_end,
    };
    Ok(AnalysisWindow {
        end,
        closing_price_encoding: dataset.closing_price_encoding,
    })
}
