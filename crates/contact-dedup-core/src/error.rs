use thiserror::Error;

/// All errors that can occur in contact-dedup-core.
#[derive(Debug, Error)]
pub enum DedupError {
    #[error("Contact not found: {0}")]
    ContactNotFound(i64),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("Query failed ({what}): {source}")]
    QueryFailure {
        what: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Batch delete failed: {0}")]
    BatchWriteFailure(String),

    #[error("Contact {0} belongs to a sync account and cannot be deleted without the sync bypass flag")]
    SyncRestricted(i64),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl DedupError {
    /// Wraps a failed read against one of the contact tables.
    pub fn query(what: &'static str) -> impl FnOnce(rusqlite::Error) -> Self {
        move |source| DedupError::QueryFailure { what, source }
    }
}

/// Exit codes used by the CLI.
#[repr(i32)]
pub enum ExitCode {
    Success = 0,
    GeneralError = 1,
    NoDuplicates = 2,
    InvalidArgs = 3,
    FileSystemError = 4,
    NotFound = 5,
}

pub type Result<T> = std::result::Result<T, DedupError>;
