//! History errors.
//!
//! Most variants are invariant violations in the sense of the runtime's
//! error policy: they indicate a caller asked about state that must exist
//! if the ingestion pipeline is consistent, and they are propagated out of
//! the worker rather than absorbed.

use prox_core::Timestamp;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("no human instance at or before timestamp {0}")]
    NoInstanceWithin(Timestamp),

    #[error("timestamp {0} not found among the human instances")]
    InstanceNotFound(Timestamp),

    #[error("no mode presence covers timestamp {0}")]
    NoPresenceAt(Timestamp),

    #[error("no samples stored for mode {mode} at timestamp {timestamp}")]
    NoSamplesAt { mode: String, timestamp: Timestamp },

    #[error("sample index {index} out of range (mode has {available} samples)")]
    SampleIndexOutOfRange { index: usize, available: usize },

    #[error("state message carries {got} keypoint tracks, body has {expected}")]
    KeypointCountMismatch { expected: usize, got: usize },

    #[error("sample buffer for segment {0} is unexpectedly empty")]
    EmptyBuffer(usize),
}
