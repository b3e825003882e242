//! Validated position datasets.

use crate::error::DataError;
use crate::records::{DatasetRecord, parse_price_encoding, parse_timestamp};
use chrono::{DateTime, Utc};
use clmm_returns_domain::entities::LiquidityEvent;
use clmm_returns_domain::math::sqrt_price::SqrtPriceX96;
use tracing::{debug, warn};

/// Descriptive fields carried into the report.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatasetMetadata {
    pub wallet: Option<String>,
    /// Inclusive block range covered by the actions.
    pub block_range: Option<(u64, u64)>,
}

/// A dataset whose actions have been converted into domain events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dataset {
    pub metadata: DatasetMetadata,
    /// Events in file order; ordering is checked by the engine.
    pub events: Vec<LiquidityEvent>,
    pub closing_price_encoding: Option<SqrtPriceX96>,
    pub analysis_end: Option<DateTime<Utc>>,
}

impl Dataset {
    /// Converts a parsed document.
    ///
    /// # Errors
    /// The first malformed action, or an invalid `analysis_end`.
    pub fn from_record(record: DatasetRecord) -> Result<Self, DataError> {
        let events = record
            .actions
            .iter()
            .enumerate()
            .map(|(index, action)| action.to_event(index))
            .collect::<Result<Vec<_>, _>>()?;

        let analysis_end = record
            .analysis_end
            .as_deref()
            .map(|text| {
                parse_timestamp(text).ok_or_else(|| DataError::InvalidField {
                    field: "analysis_end",
                    reason: format!("`{text}` is not an ISO-8601 timestamp"),
                })
            })
            .transpose()?;

        let closing_price_encoding = match record.closing_price_encoding.as_ref() {
            Some(value) => parse_price_encoding(value).unwrap_or_else(|reason| {
                warn!(%reason, "Ignoring unusable closing price encoding");
                None
            }),
            None => None,
        };

        let block_range = match (record.start_block, record.end_block, record.summary) {
            (Some(start), Some(end), _) => Some((start, end)),
            (_, _, Some(summary)) => summary.start_block.zip(summary.end_block),
            _ => None,
        };

        debug!(events = events.len(), "Loaded dataset");
        Ok(Self {
            metadata: DatasetMetadata {
                wallet: record.wallet,
                block_range,
            },
            events,
            closing_price_encoding,
            analysis_end,
        })
    }

    /// Block range as `start-end`, or the event date range when the dataset
    /// carries no block numbers.
    #[must_use]
    pub fn range_label(&self) -> String {
        if let Some((start, end)) = self.metadata.block_range {
            return format!("{start}-{end}");
        }
        match (self.events.first(), self.events.last()) {
            (Some(first), Some(last)) => format!(
                "{} to {}",
                first.timestamp.format("%Y-%m-%d"),
                last.timestamp.format("%Y-%m-%d")
            ),
            _ => "no activity".to_string(),
        }
    }

    /// Position label: the given override, then the dataset wallet, then a
    /// generic name.
    #[must_use]
    pub fn wallet_label(&self, wallet_override: Option<&str>) -> String {
        wallet_override
            .or(self.metadata.wallet.as_deref())
            .unwrap_or("LP Position")
            .to_string()
    }
}
