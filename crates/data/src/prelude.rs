//! Prelude module for convenient imports.
//!
//! # Example
//!
//! ```rust
//! use clmm_returns_data::prelude::*;
//! ```

pub use crate::dataset::{Dataset, DatasetMetadata};
pub use crate::error::{DataError, RecordError};
pub use crate::records::{ActionRecord, DatasetRecord, parse_event_kind, parse_timestamp};
pub use crate::source::{EventSource, JsonFileSource, parse_dataset};
