use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage volume unavailable: {0}")]
    Mount(String),
    #[error("failed to read settings record: {0}")]
    Read(String),
    #[error("failed to write settings record: {0}")]
    Write(String),
    #[error("failed to encode settings record: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("failed to drive {channel} channel: {reason}")]
    Channel {
        channel: &'static str,
        reason: String,
    },
}
