use thiserror::Error;

/// Failures surfaced by the task store. Nothing is retried.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The resource text is not `tasks` or `tasks/<id>`, or the shape is
    /// not accepted by the operation.
    #[error("unknown resource: {0}")]
    InvalidResource(String),

    #[error("failed to write to the task database")]
    WriteFailure(#[source] rusqlite::Error),

    #[error("failed to read from the task database")]
    Database(#[from] rusqlite::Error),

    #[error("database schema version {found} is newer than supported version {expected}")]
    UnsupportedVersion { found: i32, expected: i32 },
}

pub type Result<T> = std::result::Result<T, StoreError>;
