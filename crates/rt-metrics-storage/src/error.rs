use thiserror::Error;

/// Storage-boundary errors, carrying a stable `code()` the same way
/// `rt_metrics_crypto::CryptoError` does.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("metric {id} of type {kind} not found")]
    NotFound { id: String, kind: &'static str },
    #[error("no database configured for this store")]
    NoDatabase,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("metric record validation failed: {0}")]
    Record(#[from] rt_metrics_types::RecordError),
    #[error("invalid {kind} value {raw:?}")]
    InvalidValue { kind: &'static str, raw: String },
    #[error("failed to read snapshot file {path}: {source}")]
    SnapshotIo {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to (de)serialize snapshot: {0}")]
    SnapshotJson(#[from] serde_json::Error),
}

impl StorageError {
    pub fn code(&self) -> &'static str {
        match self {
            StorageError::NotFound { .. } => "STORAGE_NOT_FOUND",
            StorageError::NoDatabase => "STORAGE_NO_DATABASE",
            StorageError::Database(_) => "STORAGE_DATABASE_ERROR",
            StorageError::Record(_) => "STORAGE_RECORD_INVALID",
            StorageError::InvalidValue { .. } => "STORAGE_INVALID_VALUE",
            StorageError::SnapshotIo { .. } => "STORAGE_SNAPSHOT_IO",
            StorageError::SnapshotJson(_) => "STORAGE_SNAPSHOT_JSON",
        }
    }
}
