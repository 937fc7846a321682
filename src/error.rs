use thiserror::Error;

/// Error type shared by the store, the calendar client and the command layer
#[derive(Error, Debug)]
pub enum ClinicError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Duplicate slot: {0}")]
    DuplicateSlot(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Calendar service error: {0}")]
    Remote(String),

    #[error("Configuration missing: {0}")]
    ConfigMissing(String),

    #[error("Store error: {0}")]
    Store(String),
}

/// Result type alias for clinic operations
pub type Result<T> = std::result::Result<T, ClinicError>;
