//! Dataset sources.

use crate::dataset::Dataset;
use crate::error::DataError;
use crate::records::DatasetRecord;
use std::path::{Path, PathBuf};
use tracing::info;

/// Anything that can produce a dataset.
pub trait EventSource {
    /// Loads and validates the dataset.
    ///
    /// # Errors
    /// Any [`DataError`] raised while reading or converting.
    fn load(&self) -> Result<Dataset, DataError>;
}

/// Parses a dataset from JSON text.
///
/// # Errors
/// `Json` for malformed documents, `Record` for the first bad action.
pub fn parse_dataset(json: &str) -> Result<Dataset, DataError> {
    let record: DatasetRecord = serde_json::from_str(json)?;
    Dataset::from_record(record)
}

/// Dataset stored as a JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl EventSource for JsonFileSource {
    fn load(&self) -> Result<Dataset, DataError> {
        let text = std::fs::read_to_string(&self.path).map_err(|source| DataError::Io {
            path: self.path.clone(),
            source,
        })?;
        let dataset = parse_dataset(&text)?;
        info!(
            path = %self.path.display(),
            events = dataset.events.len(),
            "Loaded dataset file"
        );
        Ok(dataset)
    }
}
