//! Data-quality notes recorded during an analysis.
//!
//! Recoverable data problems never abort a run. Each one is recorded here
//! with the record it concerns, so the price fallbacks and valuation
//! adjustments behind a result remain traceable.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

/// Kinds of data-quality observations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityNoteKind {
    /// Price taken from the nearest prior priced event.
    PriceBackFilled,
    /// Price implied from the event's own token amounts and cash flow.
    PriceImplied,
    /// Closing price encoding rejected; the last known price was used.
    ClosingPriceRejected,
    /// Withdrawal with no recorded holdings to draw from.
    WithdrawalWithoutHoldings,
    /// Withdrawal tokens exceeded holdings; holdings were scaled instead.
    HoldingsRescaled,
}

/// Note-specific payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NoteData {
    /// No additional data.
    None,
    /// Price fallback.
    PriceFallback {
        /// Why the event's own encoding was unusable.
        reason: String,
        /// Fallback price used.
        price: Decimal,
        /// Record the price was taken from, for back-fills.
        from_index: Option<usize>,
    },
    /// Holdings adjustment on a withdrawal.
    Rescale {
        /// Fraction of holdings kept.
        retained_fraction: Decimal,
    },
}

/// One data-quality observation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QualityNote {
    /// Input record index, when the note concerns one.
    pub index: Option<usize>,
    /// Timestamp of that record.
    pub timestamp: Option<DateTime<Utc>>,
    pub kind: QualityNoteKind,
    pub data: NoteData,
}

impl QualityNote {
    /// A price back-filled from an earlier record.
    #[must_use]
    pub fn back_filled(
        index: usize,
        timestamp: DateTime<Utc>,
        from_index: usize,
        price: Decimal,
        reason: String,
    ) -> Self {
        Self {
            index: Some(index),
            timestamp: Some(timestamp),
            kind: QualityNoteKind::PriceBackFilled,
            data: NoteData::PriceFallback {
                reason,
                price,
                from_index: Some(from_index),
            },
        }
    }

    /// A price implied from the event itself.
    #[must_use]
    pub fn implied(index: usize, timestamp: DateTime<Utc>, price: Decimal, reason: String) -> Self {
        Self {
            index: Some(index),
            timestamp: Some(timestamp),
            kind: QualityNoteKind::PriceImplied,
            data: NoteData::PriceFallback {
                reason,
                price,
                from_index: None,
            },
        }
    }

    /// A rejected closing price.
    #[must_use]
    pub fn closing_price_rejected(price: Decimal, reason: String) -> Self {
        Self {
            index: None,
            timestamp: None,
            kind: QualityNoteKind::ClosingPriceRejected,
            data: NoteData::PriceFallback {
                reason,
                price,
                from_index: None,
            },
        }
    }

    /// A withdrawal with nothing held.
    #[must_use]
    pub fn withdrawal_without_holdings(index: usize, timestamp: DateTime<Utc>) -> Self {
        Self {
            index: Some(index),
            timestamp: Some(timestamp),
            kind: QualityNoteKind::WithdrawalWithoutHoldings,
            data: NoteData::None,
        }
    }

    /// A withdrawal applied by scaling holdings.
    #[must_use]
    pub fn rescaled(index: usize, timestamp: DateTime<Utc>, retained_fraction: Decimal) -> Self {
        Self {
            index: Some(index),
            timestamp: Some(timestamp),
            kind: QualityNoteKind::HoldingsRescaled,
            data: NoteData::Rescale { retained_fraction },
        }
    }
}

/// Ordered collection of quality notes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct QualityLog {
    notes: Vec<QualityNote>,
}

impl QualityLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self { notes: Vec::new() }
    }

    /// Records a note.
    pub fn record(&mut self, note: QualityNote) {
        self.notes.push(note);
    }

    /// Returns all notes in recording order.
    #[must_use]
    pub fn notes(&self) -> &[QualityNote] {
        &self.notes
    }

    /// Returns notes of a specific kind.
    #[must_use]
    pub fn notes_of_kind(&self, kind: QualityNoteKind) -> Vec<&QualityNote> {
        self.notes.iter().filter(|n| n.kind == kind).collect()
    }

    /// Returns the count of notes of a specific kind.
    #[must_use]
    pub fn count_by_kind(&self, kind: QualityNoteKind) -> usize {
        self.notes.iter().filter(|n| n.kind == kind).count()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.notes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }
}
