//! End-to-end analysis of a liquidity position.
//!
//! [`analyze`] validates the event sequence, prices every event, builds the
//! timeline and derives all metrics. It is deterministic: the same events,
//! window and config always produce an identical [`Analysis`].

use crate::config::AnalysisConfig;
use crate::error::{AnalysisError, MetricError};
use crate::metrics::{Analysis, IrrDiagnostic, MetricsResult, PriceSummary};
use crate::pricing::{price_events, valuation_price};
use crate::quality::{QualityLog, QualityNote};
use crate::rebalance::{count_rebalances, merge_rebalance_legs};
use crate::returns::{
    annualize, chain_link, compound_annualize, hodl_benchmark, money_weighted_flows, period_days,
    sign_changes, solve_irr,
};
use crate::timeline::{build_periods, ensure_sorted};
use chrono::{DateTime, Utc};
use clmm_returns_domain::entities::LiquidityEvent;
use clmm_returns_domain::math::sqrt_price::SqrtPriceX96;
use clmm_returns_domain::value_objects::{Holdings, Price};
use rust_decimal::Decimal;
use tracing::{info, warn};

/// End of the observation window and the price to mark it at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnalysisWindow {
    /// Analysis end; defaults to the last event's timestamp.
    pub end: Option<DateTime<Utc>>,
    /// Price observation at the analysis end; defaults to the last event's
    /// price.
    pub closing_price_encoding: Option<SqrtPriceX96>,
}

impl AnalysisWindow {
    /// Window closing at the last event.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the analysis end.
    #[must_use]
    pub fn ending_at(mut self, end: DateTime<Utc>) -> Self {
        self.end = Some(end);
        self
    }

    /// Sets the closing price observation.
    #[must_use]
    pub fn with_closing_price(mut self, raw: SqrtPriceX96) -> Self {
        self.closing_price_encoding = Some(raw);
        self
    }
}

/// Deposit and withdrawal totals of an event sequence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct CapitalFlows {
    deployed: Decimal,
    initial: Decimal,
    withdrawn: Decimal,
    fees: Decimal,
    peak_net_invested: Decimal,
    /// Token A withdrawn minus deposited, fee claims excluded.
    net_token_a: Decimal,
    net_token_b: Decimal,
}

impl CapitalFlows {
    fn from_events(events: &[LiquidityEvent]) -> Self {
        let mut flows = Self {
            initial: events
                .iter()
                .find(|e| e.is_increase())
                .map_or(Decimal::ZERO, |e| e.cash_flow.abs()),
            ..Self::default()
        };
        let mut net_invested = Decimal::ZERO;
        for event in events {
            if event.is_increase() {
                flows.deployed += event.cash_flow.abs();
                flows.net_token_a -= event.token_a_amount;
                flows.net_token_b -= event.token_b_amount;
            } else {
                flows.withdrawn += event.cash_flow;
            }
            if event.is_decrease() {
                flows.net_token_a += event.token_a_amount;
                flows.net_token_b += event.token_b_amount;
            }
            if event.is_collect() {
                flows.fees += event.cash_flow;
            }
            net_invested -= event.cash_flow;
            flows.peak_net_invested = flows.peak_net_invested.max(net_invested);
        }
        flows
    }

    /// Token flows of the liquidity legs with `held` treated as withdrawn,
    /// valued at `price`.
    fn divergence(&self, held: Holdings, price: Price) -> Decimal {
        (self.net_token_a + held.token_a) * price.value + self.net_token_b + held.token_b
    }
}

/// Runs the full analysis.
///
/// # Errors
/// Any [`AnalysisError`]: empty or unsorted input, an integrity violation,
/// an unpriceable event, or an analysis end before the last event.
/// Per-metric failures are reported inside the result instead.
pub fn analyze(
    events: &[LiquidityEvent],
    window: &AnalysisWindow,
    config: &AnalysisConfig,
) -> Result<Analysis, AnalysisError> {
    let (Some(first), Some(last)) = (events.first(), events.last()) else {
        return Err(AnalysisError::EmptyEvents);
    };
    ensure_sorted(events.iter().enumerate().map(|(i, e)| (i, e.timestamp)))?;
    let analysis_end = window.end.unwrap_or(last.timestamp);
    if analysis_end < last.timestamp {
        return Err(AnalysisError::AnalysisEndBeforeLastEvent {
            analysis_end,
            index: events.len() - 1,
            last_event: last.timestamp,
        });
    }

    let mut quality = QualityLog::new();
    let priced = price_events(events, config, &mut quality)?;
    let (Some(first_priced), Some(last_priced)) = (priced.first(), priced.last()) else {
        return Err(AnalysisError::EmptyEvents);
    };
    let end_price = closing_price(window, config, last_priced.price, &mut quality);
    let prices = PriceSummary::new(first_priced.price, end_price);

    let boundaries = if config.merge_rebalance_legs {
        merge_rebalance_legs(&priced)
    } else {
        priced.clone()
    };
    let periods = build_periods(&boundaries, analysis_end, Some(end_price))?;
    let days = period_days(first.timestamp, analysis_end);

    let capital = CapitalFlows::from_events(events);
    let ending_value = periods.last().map_or(Decimal::ZERO, |p| p.end_value);
    let net_profit = capital.withdrawn + ending_value - capital.deployed;
    let total_return_pct = ratio(net_profit, capital.peak_net_invested);

    let twr = chain_link(&periods);
    let growth = twr.as_ref().map(|t| t.total_growth).map_err(Clone::clone);
    let twr_apr = growth
        .clone()
        .and_then(|g| annualize(g, days, config.days_per_year, config.annualization));
    let twr_apy = growth
        .clone()
        .and_then(|g| compound_annualize(g, days, config.days_per_year));

    let hodl = hodl_benchmark(events, end_price, config.rebalance_window_seconds);
    let hodl_apr = hodl.as_ref().map_err(Clone::clone).and_then(|h| {
        annualize(h.growth, days, config.days_per_year, config.annualization)
    });
    let outperformance_apr = match (&twr_apr, &hodl_apr) {
        (Ok(strategy), Ok(passive)) => Ok(strategy - passive),
        (Err(_), _) => Err(MetricError::Dependency { metric: "twr_apr" }),
        (_, Err(_)) => Err(MetricError::Dependency { metric: "hodl_apr" }),
    };
    let vs_hodl = hodl
        .as_ref()
        .map(|h| net_profit - h.profit())
        .map_err(|_| MetricError::Dependency { metric: "hodl_value" });
    let divergence_loss = capital.divergence(last_priced.holdings_after, end_price);

    let rebalance_count = count_rebalances(events, config.rebalance_window_seconds);
    let days_per_rebalance =
        (rebalance_count > 0).then(|| days / Decimal::from(rebalance_count));
    let irr_estimate = irr_diagnostic(events, ending_value, analysis_end, rebalance_count, config);

    let metrics = MetricsResult {
        capital_deployed: capital.deployed,
        initial_capital: capital.initial,
        peak_net_invested: capital.peak_net_invested,
        total_withdrawn: capital.withdrawn,
        fees_collected: capital.fees,
        ending_value,
        net_profit,
        total_return_pct: total_return_pct.into(),
        twr_total_return: growth.map(|g| g - Decimal::ONE).into(),
        twr_apr: twr_apr.into(),
        twr_apy: twr_apy.into(),
        hodl_value: hodl.as_ref().map(|h| h.hodl_value).map_err(Clone::clone).into(),
        hodl_apr: hodl_apr.into(),
        outperformance_apr: outperformance_apr.into(),
        vs_hodl: vs_hodl.into(),
        divergence_loss,
        rebalance_count,
        days_per_rebalance,
        period_days: days,
        irr_estimate,
    };

    info!(
        events = events.len(),
        periods = periods.len(),
        days = %days,
        net_profit = %metrics.net_profit,
        twr_apr = ?metrics.twr_apr.value(),
        rebalances = rebalance_count,
        quality_notes = quality.len(),
        "Analysis complete"
    );

    Ok(Analysis {
        sub_period_returns: twr.map(|t| t.sub_period_returns).unwrap_or_default(),
        metrics,
        periods,
        priced_events: priced,
        hodl: hodl.ok(),
        first_event: first.timestamp,
        analysis_end,
        prices,
        quality,
    })
}

fn closing_price(
    window: &AnalysisWindow,
    config: &AnalysisConfig,
    last_price: Price,
    quality: &mut QualityLog,
) -> Price {
    let Some(raw) = window.closing_price_encoding else {
        return last_price;
    };
    match valuation_price(Some(raw), config) {
        Ok(price) => price,
        Err(err) => {
            warn!(reason = %err, price = %last_price.value, "Closing price rejected");
            quality.record(QualityNote::closing_price_rejected(
                last_price.value,
                err.to_string(),
            ));
            last_price
        }
    }
}

fn ratio(numerator: Decimal, denominator: Decimal) -> Result<Decimal, MetricError> {
    if denominator <= Decimal::ZERO {
        return Err(MetricError::NoCapital);
    }
    numerator
        .checked_div(denominator)
        .ok_or(MetricError::Overflow {
            metric: "total return",
        })
}

fn irr_diagnostic(
    events: &[LiquidityEvent],
    ending_value: Decimal,
    analysis_end: DateTime<Utc>,
    rebalance_count: u32,
    config: &AnalysisConfig,
) -> IrrDiagnostic {
    let flows = money_weighted_flows(events, ending_value, analysis_end);
    let rate = solve_irr(&flows, &config.irr, config.days_per_year);
    if let Err(err) = &rate {
        info!(reason = %err, "IRR unavailable");
    }

    let unreliable = rebalance_count > config.irr_reliability_threshold;
    if unreliable {
        warn!(
            rebalances = rebalance_count,
            threshold = config.irr_reliability_threshold,
            "IRR flagged unreliable"
        );
    }

    IrrDiagnostic {
        rate: rate.into(),
        unreliable,
        rebalance_count,
        reliability_threshold: config.irr_reliability_threshold,
        sign_changes: sign_changes(&flows),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use clmm_returns_domain::entities::EventKind;
    use rust_decimal_macros::dec;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 9, 4, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_capital_flows() {
        let events = vec![
            LiquidityEvent::new(t0(), EventKind::Increase, dec!(1), dec!(0), dec!(-1000)),
            LiquidityEvent::new(t0(), EventKind::Decrease, dec!(1), dec!(0), dec!(400)),
            LiquidityEvent::new(t0(), EventKind::Increase, dec!(1), dec!(0), dec!(-600)),
            LiquidityEvent::new(t0(), EventKind::Increase, dec!(1), dec!(0), dec!(-100)),
            LiquidityEvent::new(t0(), EventKind::Collect, dec!(0.01), dec!(2), dec!(12)),
        ];
        let flows = CapitalFlows::from_events(&events);
        assert_eq!(flows.deployed, dec!(1700));
        assert_eq!(flows.initial, dec!(1000));
        assert_eq!(flows.withdrawn, dec!(412));
        assert_eq!(flows.fees, dec!(12));
        assert_eq!(flows.peak_net_invested, dec!(1300));
        // Fee tokens stay out of the liquidity token flows.
        assert_eq!(flows.net_token_a, dec!(-2));
        assert_eq!(flows.net_token_b, Decimal::ZERO);
    }

    #[test]
    fn test_divergence_counts_open_holdings_as_withdrawn() {
        let events = vec![
            LiquidityEvent::new(t0(), EventKind::Increase, dec!(1), dec!(100), dec!(-200)),
            LiquidityEvent::new(t0(), EventKind::Decrease, dec!(0.2), dec!(30), dec!(50)),
        ];
        let flows = CapitalFlows::from_events(&events);
        // The pool sold 0.3 A for 50 B on the way.
        let held = Holdings::new(dec!(0.5), dec!(120));
        assert_eq!(flows.divergence(held, Price::new(dec!(100))), dec!(20));
        assert_eq!(flows.divergence(held, Price::new(dec!(500))), dec!(-100));
    }

    #[test]
    fn test_empty_events() {
        assert_eq!(
            analyze(&[], &AnalysisWindow::new(), &AnalysisConfig::default()),
            Err(AnalysisError::EmptyEvents)
        );
    }

    #[test]
    fn test_unsorted_events_name_the_record() {
        let events = vec![
            LiquidityEvent::new(t0(), EventKind::Increase, dec!(1), dec!(0), dec!(-1000)),
            LiquidityEvent::new(
                t0() - Duration::hours(1),
                EventKind::Decrease,
                dec!(1),
                dec!(0),
                dec!(1000),
            ),
        ];
        let err = analyze(&events, &AnalysisWindow::new(), &AnalysisConfig::default())
            .unwrap_err();
        assert!(matches!(err, AnalysisError::UnsortedEvents { index: 1, .. }));
    }

    #[test]
    fn test_end_before_last_event() {
        let events = vec![LiquidityEvent::new(
            t0(),
            EventKind::Increase,
            dec!(1),
            dec!(0),
            dec!(-1000),
        )];
        let window = AnalysisWindow::new().ending_at(t0() - Duration::days(1));
        let err = analyze(&events, &window, &AnalysisConfig::default()).unwrap_err();
        assert!(matches!(err, AnalysisError::AnalysisEndBeforeLastEvent { .. }));
    }

    #[test]
    fn test_zero_length_window_reports_degenerate_interval() {
        let events = vec![LiquidityEvent::new(
            t0(),
            EventKind::Increase,
            dec!(1),
            dec!(0),
            dec!(-1000),
        )];
        let analysis = analyze(&events, &AnalysisWindow::new(), &AnalysisConfig::default())
            .unwrap();
        assert_eq!(analysis.metrics.period_days, Decimal::ZERO);
        assert!(!analysis.metrics.twr_apr.is_computed());
        assert!(!analysis.metrics.hodl_apr.is_computed());
        assert_eq!(analysis.metrics.ending_value, dec!(1000));
        assert_eq!(analysis.metrics.net_profit, Decimal::ZERO);
    }

    mod scenarios {
        use super::*;
        use crate::config::AnnualizationMethod;
        use crate::metrics::Metric;
        use crate::quality::QualityNoteKind;
        use clmm_returns_domain::math::sqrt_price::encode_price;
        use clmm_returns_domain::value_objects::TokenDecimals;
        use proptest::prelude::*;

        const FEE_YIELD: Decimal = dec!(0.001);

        fn encoded(price: Decimal) -> SqrtPriceX96 {
            encode_price(Price::new(price), 8, 6).unwrap()
        }

        fn single_round_trip() -> Vec<LiquidityEvent> {
            vec![
                LiquidityEvent::new(
                    t0(),
                    EventKind::Increase,
                    dec!(0.00207616),
                    dec!(1641.79),
                    dec!(-1840.15),
                )
                .with_price_encoding(encoded(dec!(95541.37))),
                LiquidityEvent::new(
                    t0() + Duration::days(17),
                    EventKind::Decrease,
                    dec!(0.0025),
                    dec!(2100),
                    dec!(2355),
                )
                .with_price_encoding(encoded(dec!(102000))),
            ]
        }

        /// One deposit, then 21 full-exit rebalances each earning
        /// `FEE_YIELD` at a constant price of 100.
        fn rebalancing_position(leg_gap_seconds: i64) -> Vec<LiquidityEvent> {
            let mut token_a = dec!(50);
            let mut token_b = dec!(5000);
            let mut events = vec![LiquidityEvent::new(
                t0(),
                EventKind::Increase,
                token_a,
                token_b,
                dec!(-10000),
            )];
            for k in 1..=21i64 {
                let at = t0() + Duration::minutes(k * 1152); // every 0.8 days
                token_a *= Decimal::ONE + FEE_YIELD;
                token_b *= Decimal::ONE + FEE_YIELD;
                let value = token_a * dec!(100) + token_b;
                events.push(LiquidityEvent::new(
                    at,
                    EventKind::Decrease,
                    token_a,
                    token_b,
                    value,
                ));
                events.push(LiquidityEvent::new(
                    at + Duration::seconds(leg_gap_seconds),
                    EventKind::Increase,
                    token_a,
                    token_b,
                    -value,
                ));
            }
            events
        }

        fn computed(metric: &Metric) -> Decimal {
            metric.value().expect("metric should be computed")
        }

        #[test]
        fn test_single_round_trip() {
            let analysis = analyze(
                &single_round_trip(),
                &AnalysisWindow::new(),
                &AnalysisConfig::default(),
            )
            .unwrap();
            let m = &analysis.metrics;

            assert_eq!(m.period_days, dec!(17));
            assert_eq!(m.capital_deployed, dec!(1840.15));
            assert_eq!(m.initial_capital, dec!(1840.15));
            assert_eq!(m.total_withdrawn, dec!(2355));
            assert_eq!(m.ending_value, Decimal::ZERO);
            assert_eq!(m.net_profit, dec!(514.85));
            assert!((computed(&m.total_return_pct) - dec!(0.2798)).abs() < dec!(0.001));
            assert!((computed(&m.twr_total_return) - dec!(0.2798)).abs() < dec!(0.001));

            let apr = computed(&m.twr_apr);
            assert!(((apr - dec!(6.01)) / dec!(6.01)).abs() < dec!(0.01), "apr = {apr}");
            assert!(computed(&m.twr_apy) > apr);
            assert!(computed(&m.outperformance_apr) > Decimal::ZERO);

            // Both figures compare the 0.00042384 A and 458.21 B gained
            // against the deposit at the ending price.
            assert!((computed(&m.vs_hodl) - dec!(501.44168)).abs() < dec!(0.01));
            assert!((m.divergence_loss - dec!(501.44168)).abs() < dec!(0.01));
            assert_eq!(m.fees_collected, Decimal::ZERO);

            assert_eq!(m.rebalance_count, 0);
            assert_eq!(m.days_per_rebalance, None);
            assert!(!m.irr_estimate.unreliable);
            assert!(computed(&m.irr_estimate.rate) > dec!(100));
            assert_eq!(m.irr_estimate.sign_changes, 1);
            assert!(analysis.quality.is_empty());
        }

        #[test]
        fn test_compound_annualization() {
            let config = AnalysisConfig::default().with_annualization(AnnualizationMethod::Compound);
            let analysis = analyze(&single_round_trip(), &AnalysisWindow::new(), &config).unwrap();
            let m = &analysis.metrics;
            assert_eq!(m.twr_apr, m.twr_apy);
            assert!(computed(&m.twr_apr) > dec!(100));
        }

        #[test]
        fn test_frequent_rebalancing_keeps_twr_at_fee_yield() {
            let analysis = analyze(
                &rebalancing_position(60),
                &AnalysisWindow::new().ending_at(t0() + Duration::days(17)),
                &AnalysisConfig::default(),
            )
            .unwrap();
            let m = &analysis.metrics;

            let growth = (1..=21).fold(Decimal::ONE, |g, _| g * (Decimal::ONE + FEE_YIELD));
            let expected_apr = (growth - Decimal::ONE) * dec!(365) / dec!(17);
            assert!((computed(&m.twr_apr) - expected_apr).abs() < dec!(0.000001));
            assert!((computed(&m.twr_total_return) - (growth - Decimal::ONE)).abs() < dec!(0.000001));

            assert_eq!(m.rebalance_count, 21);
            assert_eq!(m.days_per_rebalance, Some(dec!(17) / dec!(21)));
            assert!(m.irr_estimate.unreliable);
            assert_eq!(m.irr_estimate.sign_changes, 43);
            // Flat price: passive holding earns nothing.
            assert!(computed(&m.hodl_apr).abs() < dec!(0.000000000001));
        }

        #[test]
        fn test_reliability_threshold_is_configurable() {
            let events = rebalancing_position(60);
            let window = AnalysisWindow::new().ending_at(t0() + Duration::days(17));
            for (threshold, unreliable) in [(20, true), (21, false), (22, false), (50, false)] {
                let config = AnalysisConfig::default().with_reliability_threshold(threshold);
                let analysis = analyze(&events, &window, &config).unwrap();
                assert_eq!(analysis.metrics.irr_estimate.unreliable, unreliable);
                assert_eq!(analysis.metrics.irr_estimate.reliability_threshold, threshold);
            }
        }

        #[test]
        fn test_hodl_ignores_redeposits_while_price_trends() {
            // 50 A + 5000 B at 100, then 20 rebalances 0.5 apart in price,
            // each leg priced at the rebalance price, ending at 110.
            let mut events = vec![
                LiquidityEvent::new(t0(), EventKind::Increase, dec!(50), dec!(5000), dec!(-10000))
                    .with_price_encoding(encoded(dec!(100))),
            ];
            for step in 1..=20i64 {
                let price = dec!(100) + Decimal::from(step) / dec!(2);
                let value = dec!(50) * price + dec!(5000);
                let at = t0() + Duration::hours(step * 11);
                events.push(
                    LiquidityEvent::new(at, EventKind::Decrease, dec!(50), dec!(5000), value)
                        .with_price_encoding(encoded(price)),
                );
                events.push(
                    LiquidityEvent::new(
                        at + Duration::seconds(60),
                        EventKind::Increase,
                        dec!(50),
                        dec!(5000),
                        -value,
                    )
                    .with_price_encoding(encoded(price)),
                );
            }
            let analysis = analyze(
                &events,
                &AnalysisWindow::new().ending_at(t0() + Duration::days(10)),
                &AnalysisConfig::default(),
            )
            .unwrap();
            let hodl = analysis.hodl.as_ref().unwrap();

            assert_eq!(analysis.metrics.rebalance_count, 20);
            assert_eq!(hodl.capital_deployed, dec!(10000));
            assert!((hodl.growth - dec!(1.05)).abs() < dec!(0.000001));
            // The position never changes its tokens, so it tracks holding.
            assert!(computed(&analysis.metrics.outperformance_apr).abs() < dec!(0.0001));
            assert!(computed(&analysis.metrics.vs_hodl).abs() < dec!(0.01));
        }

        #[test]
        fn test_fee_claims_count_as_return() {
            let price = encoded(dec!(100000));
            let events = vec![
                LiquidityEvent::new(t0(), EventKind::Increase, dec!(0.01), dec!(1000), dec!(-2000))
                    .with_price_encoding(price),
                LiquidityEvent::new(
                    t0() + Duration::days(5),
                    EventKind::Collect,
                    dec!(0.0001),
                    dec!(10),
                    dec!(20),
                ),
                LiquidityEvent::new(
                    t0() + Duration::days(10),
                    EventKind::Decrease,
                    dec!(0.01),
                    dec!(1000),
                    dec!(2000),
                )
                .with_price_encoding(price),
            ];
            let analysis =
                analyze(&events, &AnalysisWindow::new(), &AnalysisConfig::default()).unwrap();
            let m = &analysis.metrics;

            assert_eq!(m.total_withdrawn, dec!(2020));
            assert_eq!(m.fees_collected, dec!(20));
            assert_eq!(m.net_profit, dec!(20));
            assert!((computed(&m.twr_total_return) - dec!(0.01)).abs() < dec!(0.000001));
            assert!((computed(&m.vs_hodl) - dec!(20)).abs() < dec!(0.001));
            assert!(m.divergence_loss.abs() < dec!(0.001));
            assert_eq!(analysis.periods[1].external_cash_flow, dec!(20));
            assert_eq!(m.rebalance_count, 0);
            assert_eq!(m.irr_estimate.sign_changes, 1);
            assert!(computed(&m.irr_estimate.rate) > Decimal::ZERO);
            assert_eq!(analysis.quality.count_by_kind(QualityNoteKind::PriceBackFilled), 1);
        }

        #[test]
        fn test_merged_legs_preserve_twr() {
            let events = rebalancing_position(0);
            let window = AnalysisWindow::new().ending_at(t0() + Duration::days(17));
            let split = analyze(&events, &window, &AnalysisConfig::default()).unwrap();
            let merged = analyze(
                &events,
                &window,
                &AnalysisConfig::default().with_merged_rebalance_legs(true),
            )
            .unwrap();

            assert!(merged.periods.len() < split.periods.len());
            let diff = computed(&merged.metrics.twr_total_return)
                - computed(&split.metrics.twr_total_return);
            assert!(diff.abs() < dec!(0.000000000001));
            assert_eq!(merged.metrics.rebalance_count, 21);
            assert_eq!(merged.priced_events.len(), events.len());
        }

        #[test]
        fn test_chain_link_identity() {
            let analysis = analyze(
                &rebalancing_position(60),
                &AnalysisWindow::new().ending_at(t0() + Duration::days(17)),
                &AnalysisConfig::default(),
            )
            .unwrap();
            let product = analysis
                .sub_period_returns
                .iter()
                .fold(Decimal::ONE, |g, r| g * (Decimal::ONE + r.rate));
            assert_eq!(
                computed(&analysis.metrics.twr_total_return),
                product - Decimal::ONE
            );
        }

        #[test]
        fn test_analysis_is_idempotent() {
            let events = rebalancing_position(60);
            let window = AnalysisWindow::new().ending_at(t0() + Duration::days(17));
            let config = AnalysisConfig::default();
            assert_eq!(
                analyze(&events, &window, &config).unwrap(),
                analyze(&events, &window, &config).unwrap()
            );
        }

        #[test]
        fn test_missing_price_is_back_filled_and_noted() {
            let mut events = single_round_trip();
            events[1].raw_price_encoding = None;
            let analysis =
                analyze(&events, &AnalysisWindow::new(), &AnalysisConfig::default()).unwrap();

            assert_eq!(analysis.quality.count_by_kind(QualityNoteKind::PriceBackFilled), 1);
            assert_eq!(analysis.priced_events[1].price, analysis.priced_events[0].price);
            assert!(analysis.metrics.twr_apr.is_computed());
        }

        #[test]
        fn test_closing_price_marks_open_position() {
            let events = vec![
                LiquidityEvent::new(t0(), EventKind::Increase, dec!(0.01), dec!(1000), dec!(-2000))
                    .with_price_encoding(encoded(dec!(100000))),
            ];
            let window = AnalysisWindow::new()
                .ending_at(t0() + Duration::days(10))
                .with_closing_price(encoded(dec!(110000)));
            let analysis = analyze(&events, &window, &AnalysisConfig::default()).unwrap();
            let m = &analysis.metrics;

            assert!((m.ending_value - dec!(2100)).abs() < dec!(0.001));
            assert!((computed(&m.twr_total_return) - dec!(0.05)).abs() < dec!(0.000001));
            // Passive holding of the same tokens matches an untouched position.
            assert!(computed(&m.outperformance_apr).abs() < dec!(0.000001));
            assert_eq!(analysis.periods.iter().filter(|p| p.is_final).count(), 1);
            assert!((analysis.prices.change.unwrap() - dec!(0.1)).abs() < dec!(0.000001));
        }

        #[test]
        fn test_zero_length_opening_period_has_no_capital() {
            let analysis = analyze(
                &single_round_trip(),
                &AnalysisWindow::new(),
                &AnalysisConfig::new(TokenDecimals::new(8, 6)),
            )
            .unwrap();
            let opening = &analysis.periods[0];
            assert!(opening.is_zero_length());
            assert_eq!(opening.start_value, Decimal::ZERO);
            assert_eq!(opening.external_cash_flow, dec!(-1840.15));
        }

        proptest! {
            #[test]
            fn prop_round_trip_deposit_leaves_twr_unchanged(
                extra_a_sats in 1u64..10_000_000,
                extra_b_cents in 1u64..1_000_000,
                mid_price in 90_000u64..110_000,
                mid_hours in 1i64..400,
            ) {
                let base = single_round_trip();
                let at = t0() + Duration::hours(mid_hours);
                let price = encoded(Decimal::from(mid_price));
                let a = Decimal::new(extra_a_sats as i64, 8);
                let b = Decimal::new(extra_b_cents as i64, 2);
                let value = a * Decimal::from(mid_price) + b;

                let mut padded = base.clone();
                padded.insert(
                    1,
                    LiquidityEvent::new(at, EventKind::Increase, a, b, -value)
                        .with_price_encoding(price),
                );
                padded.insert(
                    2,
                    LiquidityEvent::new(at, EventKind::Decrease, a, b, value)
                        .with_price_encoding(price),
                );

                let config = AnalysisConfig::default();
                let window = AnalysisWindow::new();
                let plain = analyze(&base, &window, &config).unwrap();
                let padded = analyze(&padded, &window, &config).unwrap();

                let diff = computed(&padded.metrics.twr_total_return)
                    - computed(&plain.metrics.twr_total_return);
                prop_assert!(diff.abs() < dec!(0.0000000001), "diff = {}", diff);
            }
        }
    }
}
