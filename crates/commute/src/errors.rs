use thiserror::Error;

/// Failures of the underlying key-value store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Object store error: {0}")]
    ObjectStore(#[from] object_store::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Failures of a ledger write. Reads never fail; they fall back to defaults.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Failed to restore trip list after aborted write: {0}")]
    Rollback(StoreError),
}
