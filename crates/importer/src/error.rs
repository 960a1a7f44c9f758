use chrono::NaiveDate;
use skating_storage::StorageError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ImporterError>;

#[derive(Error, Debug)]
pub enum ImporterError {
    #[error("Malformed XML: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Event '{name}' ({}) is already imported", format_event_date(.date))]
    DuplicateEvent {
        name: String,
        date: Option<NaiveDate>,
    },

    #[error("File contains no Event element")]
    MissingEvent,
}

impl ImporterError {
    /// The file collided with rows already in the store.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Storage(e) if e.is_conflict())
    }
}

fn format_event_date(date: &Option<NaiveDate>) -> String {
    match date {
        Some(date) => date.to_string(),
        None => "no date".to_string(),
    }
}
