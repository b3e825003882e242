//! Raw JSON records as they appear in a dataset file.
//!
//! Every field is optional at the serde level so that a missing field is
//! reported as a [`RecordError`] naming the record, instead of a bare
//! deserialization error.

use crate::error::RecordError;
use chrono::{DateTime, NaiveDateTime, Utc};
use clmm_returns_domain::entities::{EventKind, LiquidityEvent};
use clmm_returns_domain::math::sqrt_price::SqrtPriceX96;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

/// One liquidity action.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ActionRecord {
    pub timestamp: Option<String>,
    pub event: Option<String>,
    #[serde(alias = "cbbtc")]
    pub token_a_amount: Option<Decimal>,
    #[serde(alias = "usdc")]
    pub token_b_amount: Option<Decimal>,
    pub cash_flow: Option<Decimal>,
    #[serde(alias = "sqrt_price_x96", alias = "sqrtPriceX96")]
    pub raw_price_encoding: Option<Value>,
}

/// Block range nested under `summary` in older exports.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SummaryRecord {
    pub start_block: Option<u64>,
    pub end_block: Option<u64>,
}

/// Top-level dataset document.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DatasetRecord {
    pub wallet: Option<String>,
    pub start_block: Option<u64>,
    pub end_block: Option<u64>,
    pub summary: Option<SummaryRecord>,
    /// Pool price observed at the analysis end.
    pub closing_price_encoding: Option<Value>,
    /// Analysis end; defaults to the last action.
    pub analysis_end: Option<String>,
    #[serde(default)]
    pub actions: Vec<ActionRecord>,
}

/// Maps an event name to its kind. `Mint` and `Burn` are accepted as
/// aliases of the liquidity events; `Collect` is a fee claim.
#[must_use]
pub fn parse_event_kind(name: &str) -> Option<EventKind> {
    match name {
        "IncreaseLiquidity" | "Mint" => Some(EventKind::Increase),
        "DecreaseLiquidity" | "Burn" => Some(EventKind::Decrease),
        "Collect" => Some(EventKind::Collect),
        _ => None,
    }
}

/// Parses an ISO-8601 timestamp. Values without an offset are taken as UTC.
#[must_use]
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Reads a sqrt-price observation given as a decimal or hex string, or as
/// a JSON integer. `null` reads as no observation.
///
/// # Errors
/// A description of why the value is unusable.
pub fn parse_price_encoding(value: &Value) -> Result<Option<SqrtPriceX96>, String> {
    match value {
        Value::Null => Ok(None),
        Value::String(text) => text.parse().map(Some).map_err(|e| format!("{e}")),
        Value::Number(number) => match number.as_u64() {
            Some(raw) => raw.to_string().parse().map(Some).map_err(|e| format!("{e}")),
            None => Err(format!("{number} is not an unsigned integer")),
        },
        other => Err(format!("unexpected value {other}")),
    }
}

impl ActionRecord {
    /// Converts the record at `index` into a domain event.
    ///
    /// # Errors
    /// `MissingField`, `UnknownEvent` or `InvalidTimestamp`.
    pub fn to_event(&self, index: usize) -> Result<LiquidityEvent, RecordError> {
        let missing = |field| RecordError::MissingField { index, field };

        let timestamp_text = self.timestamp.as_deref().ok_or_else(|| missing("timestamp"))?;
        let timestamp =
            parse_timestamp(timestamp_text).ok_or_else(|| RecordError::InvalidTimestamp {
                index,
                value: timestamp_text.to_string(),
            })?;

        let event = self.event.as_deref().ok_or_else(|| missing("event"))?;
        let kind = parse_event_kind(event).ok_or_else(|| RecordError::UnknownEvent {
            index,
            event: event.to_string(),
        })?;

        let token_a = self.token_a_amount.ok_or_else(|| missing("token_a_amount"))?;
        let token_b = self.token_b_amount.ok_or_else(|| missing("token_b_amount"))?;
        let cash_flow = self.cash_flow.ok_or_else(|| missing("cash_flow"))?;

        let mut liquidity_event = LiquidityEvent::new(timestamp, kind, token_a, token_b, cash_flow);
        let encoding = match self.raw_price_encoding.as_ref().map(parse_price_encoding) {
            Some(Ok(raw)) => raw,
            Some(Err(reason)) => {
                // Priced by fallback downstream.
                warn!(index, %reason, "Ignoring unusable price encoding");
                None
            }
            None => None,
        };
        if let Some(raw) = encoding {
            liquidity_event = liquidity_event.with_price_encoding(raw);
        }
        Ok(liquidity_event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn record(json: &str) -> ActionRecord {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_event_aliases() {
        assert_eq!(parse_event_kind("Mint"), Some(EventKind::Increase));
        assert_eq!(parse_event_kind("IncreaseLiquidity"), Some(EventKind::Increase));
        assert_eq!(parse_event_kind("Burn"), Some(EventKind::Decrease));
        assert_eq!(parse_event_kind("DecreaseLiquidity"), Some(EventKind::Decrease));
        assert_eq!(parse_event_kind("Collect"), Some(EventKind::Collect));
        assert_eq!(parse_event_kind("Swap"), None);
    }

    #[test]
    fn test_timestamps_with_and_without_offset() {
        let expected = Utc.with_ymd_and_hms(2025, 9, 4, 12, 30, 0).unwrap();
        assert_eq!(parse_timestamp("2025-09-04T12:30:00+00:00"), Some(expected));
        assert_eq!(parse_timestamp("2025-09-04T14:30:00+02:00"), Some(expected));
        assert_eq!(parse_timestamp("2025-09-04T12:30:00"), Some(expected));
        assert_eq!(parse_timestamp("04/09/2025"), None);
    }

    #[test]
    fn test_legacy_field_aliases() {
        let action = record(
            r#"{
                "timestamp": "2025-09-04T12:30:00+00:00",
                "event": "IncreaseLiquidity",
                "cbbtc": 0.00207616,
                "usdc": "1641.79",
                "cash_flow": -1840.15,
                "sqrt_price_x96": "2448421210358409442740427712995"
            }"#,
        );
        let event = action.to_event(0).unwrap();
        assert_eq!(event.kind, EventKind::Increase);
        assert_eq!(event.token_a_amount, dec!(0.00207616));
        assert_eq!(event.token_b_amount, dec!(1641.79));
        assert_eq!(event.cash_flow, dec!(-1840.15));
        assert!(event.raw_price_encoding.is_some());
    }

    #[test]
    fn test_missing_field_names_record() {
        let action = record(
            r#"{"timestamp": "2025-09-04T12:30:00Z", "event": "Burn", "token_a_amount": 1, "token_b_amount": 2}"#,
        );
        assert_eq!(
            action.to_event(7),
            Err(RecordError::MissingField {
                index: 7,
                field: "cash_flow"
            })
        );
    }

    #[test]
    fn test_unknown_event_rejected() {
        let action = record(
            r#"{"timestamp": "2025-09-04T12:30:00Z", "event": "Swap", "token_a_amount": 0, "token_b_amount": 2, "cash_flow": 2}"#,
        );
        assert!(matches!(
            action.to_event(3),
            Err(RecordError::UnknownEvent { index: 3, .. })
        ));
    }

    #[test]
    fn test_unusable_encoding_is_dropped() {
        assert!(parse_price_encoding(&Value::String("0".to_string())).is_err());
        assert!(parse_price_encoding(&Value::String("-5".to_string())).is_err());
        assert!(parse_price_encoding(&serde_json::json!(1.5)).is_err());
        assert_eq!(parse_price_encoding(&Value::Null), Ok(None));
        assert!(matches!(
            parse_price_encoding(&serde_json::json!(79228162514264337u64)),
            Ok(Some(_))
        ));
        assert!(matches!(
            parse_price_encoding(&Value::String("0x1000000000000000000000000".into())),
            Ok(Some(_))
        ));

        let action = record(
            r#"{"timestamp": "2025-09-04T12:30:00Z", "event": "Mint", "token_a_amount": 1,
                "token_b_amount": 2, "cash_flow": -3, "raw_price_encoding": "0"}"#,
        );
        assert_eq!(action.to_event(0).unwrap().raw_price_encoding, None);
    }
}
