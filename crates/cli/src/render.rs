//! Report rendering.

use anyhow::Result;
use clap::ValueEnum;
use clmm_returns_domain::entities::PositionPeriod;
use clmm_returns_engine::metrics::{Analysis, Metric, MetricsResult, PriceSummary};
use clmm_returns_engine::quality::QualityNote;
use clmm_returns_engine::returns::SubPeriodReturn;
use prettytable::{Table, format, row};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;

/// Output format of the `analyze` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Full report with the per-period table.
    Text,
    /// Machine-readable report.
    Json,
    /// A few headline lines.
    #[default]
    Summary,
}

/// Labels shown alongside the metrics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportHeader {
    pub wallet: String,
    pub range: String,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    #[serde(flatten)]
    header: &'a ReportHeader,
    first_event: String,
    analysis_end: String,
    metrics: &'a MetricsResult,
    prices: &'a PriceSummary,
    periods: &'a [PositionPeriod],
    sub_period_returns: &'a [SubPeriodReturn],
    quality: &'a [QualityNote],
    irr_note: String,
}

/// Renders `analysis` in the requested format.
///
/// # Errors
/// Propagates JSON serialization failures.
pub fn render(analysis: &Analysis, header: &ReportHeader, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(render_text(analysis, header)),
        OutputFormat::Json => render_json(analysis, header),
        OutputFormat::Summary => Ok(render_summary(analysis, header)),
    }
}

fn render_json(analysis: &Analysis, header: &ReportHeader) -> Result<String> {
    let report = JsonReport {
        header,
        first_event: analysis.first_event.to_rfc3339(),
        analysis_end: analysis.analysis_end.to_rfc3339(),
        metrics: &analysis.metrics,
        prices: &analysis.prices,
        periods: &analysis.periods,
        sub_period_returns: &analysis.sub_period_returns,
        quality: analysis.quality.notes(),
        irr_note: irr_note(&analysis.metrics),
    };
    Ok(serde_json::to_string_pretty(&report)?)
}

fn render_summary(analysis: &Analysis, header: &ReportHeader) -> String {
    let m = &analysis.metrics;
    [
        format!("{} ({})", header.wallet, header.range),
        format!("Net profit:     ${:.2}", m.net_profit),
        format!("Total return:   {}", pct(&m.total_return_pct)),
        format!("TWR APR:        {}", pct(&m.twr_apr)),
        format!("vs HODL APR:    {}", pct(&m.outperformance_apr)),
        format!("vs HODL:        {}", signed(&m.vs_hodl)),
        format!("Activity:       {} rebalances, {}", m.rebalance_count, frequency(m)),
        format!("IRR:            {}", irr_note(m)),
    ]
    .join("\n")
}

fn render_text(analysis: &Analysis, header: &ReportHeader) -> String {
    let m = &analysis.metrics;
    let mut out = Vec::new();

    out.push("📊 LP Position Returns".to_string());
    out.push("════════════════════════════════════".to_string());
    out.push(format!("Position:        {}", header.wallet));
    out.push(format!("Range:           {}", header.range));
    out.push(format!(
        "Window:          {} → {} ({:.2} days)",
        analysis.first_event.format("%Y-%m-%d %H:%M"),
        analysis.analysis_end.format("%Y-%m-%d %H:%M"),
        m.period_days
    ));
    out.push(String::new());

    out.push("Capital".to_string());
    out.push(format!("  Initial:       ${:.2}", m.initial_capital));
    out.push(format!("  Deployed:      ${:.2}", m.capital_deployed));
    out.push(format!("  Peak invested: ${:.2}", m.peak_net_invested));
    out.push(format!("  Withdrawn:     ${:.2}", m.total_withdrawn));
    out.push(format!("  Fees claimed:  ${:.2}", m.fees_collected));
    out.push(format!("  Ending value:  ${:.2}", m.ending_value));
    out.push(format!("  Net profit:    ${:.2}", m.net_profit));
    out.push(String::new());

    out.push("Returns".to_string());
    out.push(format!("  Total return:  {}", pct(&m.total_return_pct)));
    out.push(format!("  TWR:           {}", pct(&m.twr_total_return)));
    out.push(format!("  TWR APR:       {}", pct(&m.twr_apr)));
    out.push(format!("  TWR APY:       {}", pct(&m.twr_apy)));
    out.push(format!("  HODL value:    {}", money(&m.hodl_value)));
    out.push(format!("  HODL APR:      {}", pct(&m.hodl_apr)));
    out.push(format!("  vs HODL APR:   {}", pct(&m.outperformance_apr)));
    out.push(format!("  vs HODL:       {}", signed(&m.vs_hodl)));
    out.push(format!("  Divergence:    ${:.2}", m.divergence_loss));
    out.push(String::new());

    let prices = &analysis.prices;
    out.push("Price".to_string());
    out.push(format!("  Start:         {:.2}", prices.start_price.value));
    out.push(format!("  End:           {:.2}", prices.end_price.value));
    if let Some(change) = prices.change {
        out.push(format!("  Change:        {:.2}%", change * Decimal::ONE_HUNDRED));
    }
    out.push(String::new());

    out.push("IRR diagnostic".to_string());
    out.push(format!("  {}", irr_note(m)));
    out.push(format!(
        "  Rebalances: {} (threshold {}), cash-flow sign changes: {}",
        m.rebalance_count, m.irr_estimate.reliability_threshold, m.irr_estimate.sign_changes
    ));
    out.push(format!("  Frequency: {}", frequency(m)));
    out.push(String::new());

    out.push("Periods".to_string());
    out.push(period_table(analysis).to_string());

    if !analysis.quality.is_empty() {
        out.push(format!("Data quality ({} notes)", analysis.quality.len()));
        for note in analysis.quality.notes() {
            let at = note
                .index
                .map_or_else(|| "closing".to_string(), |i| format!("record {i}"));
            out.push(format!("  ⚠️ {at}: {:?}", note.kind));
        }
    }
    out.push("════════════════════════════════════".to_string());

    out.join("\n")
}

fn period_table(analysis: &Analysis) -> Table {
    let rates: HashMap<usize, Decimal> = analysis
        .sub_period_returns
        .iter()
        .map(|r| (r.period_index, r.rate))
        .collect();

    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_NO_BORDER_LINE_SEPARATOR);
    table.set_titles(row![
        "#", "Start", "End", "Days", "Start value", "End value", "Flow", "Return"
    ]);
    for (index, period) in analysis.periods.iter().enumerate() {
        let days = Decimal::from(period.duration_seconds()) / Decimal::from(86_400);
        let rate = rates
            .get(&index)
            .map_or_else(|| "-".to_string(), |r| format!("{:.4}%", r * Decimal::ONE_HUNDRED));
        let label = if period.is_final {
            format!("{index}*")
        } else {
            index.to_string()
        };
        table.add_row(row![
            label,
            period.start_time.format("%m-%d %H:%M"),
            period.end_time.format("%m-%d %H:%M"),
            format!("{days:.2}"),
            format!("{:.2}", period.start_value),
            format!("{:.2}", period.end_value),
            format!("{:.2}", period.external_cash_flow),
            rate
        ]);
    }
    table
}

fn irr_note(metrics: &MetricsResult) -> String {
    let irr = &metrics.irr_estimate;
    match (&irr.rate, irr.unreliable) {
        (Metric::Computed { value }, false) => format!("{} (converged)", pct_value(*value)),
        (Metric::Computed { value }, true) => format!(
            "{} ⚠️ unreliable: {} rebalances exceed the threshold of {}",
            pct_value(*value),
            irr.rebalance_count,
            irr.reliability_threshold
        ),
        (Metric::Unavailable { reason }, _) => {
            format!("unavailable ({reason}) with {} rebalances", irr.rebalance_count)
        }
    }
}

fn frequency(metrics: &MetricsResult) -> String {
    metrics
        .days_per_rebalance
        .map_or_else(|| "no rebalances".to_string(), |days| format!("every {days:.1} days"))
}

fn pct_value(value: Decimal) -> String {
    format!("{:.2}%", value * Decimal::ONE_HUNDRED)
}

fn pct(metric: &Metric) -> String {
    match metric {
        Metric::Computed { value } => pct_value(*value),
        Metric::Unavailable { reason } => format!("n/a ({reason})"),
    }
}

fn money(metric: &Metric) -> String {
    match metric {
        Metric::Computed { value } => format!("${value:.2}"),
        Metric::Unavailable { reason } => format!("n/a ({reason})"),
    }
}

fn signed(metric: &Metric) -> String {
    match metric {
        Metric::Computed { value } if value.is_sign_negative() => format!("-${:.2}", value.abs()),
        Metric::Computed { value } => format!("+${value:.2}"),
        Metric::Unavailable { reason } => format!("n/a ({reason})"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use clmm_returns_domain::entities::{EventKind, LiquidityEvent};
    use clmm_returns_engine::analyzer::{AnalysisWindow, analyze};
    use clmm_returns_engine::config::AnalysisConfig;
    use rust_decimal_macros::dec;

    fn header() -> ReportHeader {
        ReportHeader {
            wallet: "0x1234".to_string(),
            range: "34850000-35580000".to_string(),
        }
    }

    /// Deposit, withdraw 0.8 days later, redeposit a minute after that.
    fn rebalanced_analysis() -> Analysis {
        let t0 = Utc.with_ymd_and_hms(2025, 9, 4, 0, 0, 0).unwrap();
        let rebalance = t0 + Duration::minutes(1152);
        let events = vec![
            LiquidityEvent::new(t0, EventKind::Increase, dec!(10), dec!(1000), dec!(-2000)),
            LiquidityEvent::new(rebalance, EventKind::Decrease, dec!(10), dec!(1010), dec!(2010)),
            LiquidityEvent::new(
                rebalance + Duration::minutes(1),
                EventKind::Increase,
                dec!(10),
                dec!(1010),
                dec!(-2010),
            ),
        ];
        analyze(&events, &AnalysisWindow::new(), &AnalysisConfig::default()).unwrap()
    }

    #[test]
    fn test_pct_formatting() {
        assert_eq!(pct(&Metric::Computed { value: dec!(6.0073) }), "600.73%");
        assert_eq!(
            pct(&Metric::Unavailable {
                reason: "no capital was deployed".to_string()
            }),
            "n/a (no capital was deployed)"
        );
        assert_eq!(money(&Metric::Computed { value: dec!(1853.5) }), "$1853.50");
        assert_eq!(signed(&Metric::Computed { value: dec!(501.441) }), "+$501.44");
        assert_eq!(signed(&Metric::Computed { value: dec!(-3.2) }), "-$3.20");
    }

    #[test]
    fn test_summary_is_the_default_format() {
        assert_eq!(OutputFormat::default(), OutputFormat::Summary);
    }

    #[test]
    fn test_text_report_shows_divergence_and_frequency() {
        let analysis = rebalanced_analysis();
        let text = render(&analysis, &header(), OutputFormat::Text).unwrap();

        assert!(text.contains("vs HODL:       +$"), "{text}");
        assert!(text.contains("Divergence:    $"), "{text}");
        assert!(text.contains("Frequency: every 0.8 days"), "{text}");

        let summary = render(&analysis, &header(), OutputFormat::Summary).unwrap();
        assert!(summary.contains("1 rebalances, every 0.8 days"), "{summary}");
    }

    #[test]
    fn test_json_report_carries_dollar_comparisons() {
        let analysis = rebalanced_analysis();
        let json = render(&analysis, &header(), OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let metrics = &value["metrics"];

        assert_eq!(metrics["vs_hodl"]["status"], "computed");
        assert!(metrics.get("divergence_loss").is_some());
        assert!(metrics.get("days_per_rebalance").is_some());
        assert_eq!(metrics["rebalance_count"], 1);
        assert_eq!(value["wallet"], "0x1234");
    }
}
