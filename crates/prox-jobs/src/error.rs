//! Job processing errors.

use prox_core::Timestamp;
use prox_history::HistoryError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum JobError {
    #[error(transparent)]
    History(#[from] HistoryError),

    #[error("robot has no segment {0}")]
    MissingRobotSegment(usize),

    #[error("no samples stored for mode {0} while scanning for a collision index")]
    EmptySamples(String),

    #[error("a merged trace must always admit next modes")]
    NoNextModes,

    #[error("job path already registered at creation time")]
    AlreadyRegistered,

    #[error("timestamp {0} is older than the newest job registry entry")]
    StaleRegistryTimestamp(Timestamp),
}
