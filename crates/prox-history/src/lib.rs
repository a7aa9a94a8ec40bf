//! `prox-history` — time-indexed state for humans and robots.
//!
//! Humans get a plain append-only instance log.  Robots get the full
//! machinery the predictor runs on: per-mode sample stores, a log of mode
//! *presences* (contiguous intervals spent in one mode), and a growing
//! mode-trace log, all queryable through read-only snapshots fixed at a
//! timestamp.

pub mod error;
pub mod human;
pub mod robot;
pub mod snapshot;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use error::HistoryError;
pub use human::{HumanStateHistory, HumanStateInstance};
pub use robot::{BodySamples, RobotModePresence, RobotStateHistory, SamplesHistory};
pub use snapshot::RobotStateHistorySnapshot;
