use thiserror::Error;

/// Failure of a durable key-value backend
///
/// Cache tiers never surface these to callers; they are logged and the
/// operation degrades to a miss or a no-op.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("storage quota exceeded writing `{key}` ({needed} bytes, {available} available)")]
    QuotaExceeded {
        key: String,
        needed: usize,
        available: usize,
    },

    #[error("storage unavailable")]
    Unavailable,

    #[error("corrupt record at `{0}`")]
    Corrupt(String),
}
