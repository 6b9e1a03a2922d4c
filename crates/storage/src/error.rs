use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    /// The backing store refused the operation (read-only, quota, disabled).
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("storage io error: {0:#}")]
    Io(#[from] anyhow::Error),

    /// Internal lock poisoning.
    #[error("storage lock poisoned")]
    Poisoned,
}
