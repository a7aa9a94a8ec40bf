//! Transport errors, reported by the underlying client.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("broker connection failed: {0}")]
    Connect(String),

    #[error("publish failed: {0}")]
    Publish(String),

    #[error("subscribe failed: {0}")]
    Subscribe(String),
}
