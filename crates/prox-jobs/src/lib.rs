//! `prox-jobs` — the predictive work units.
//!
//! A look-ahead job asks: "does human segment H intersect robot segment R
//! somewhere in the future along the current branch of the mode trace?"
//! Jobs are immutable values consumed by the worker that dequeues them;
//! processing one yields zero or more successor jobs, one per predicted
//! next mode.
//!
//! # What lives here
//!
//! | Module       | Contents                                              |
//! |--------------|-------------------------------------------------------|
//! | [`path`]     | `LookAheadJobIdentifier`, `LookAheadJobPath`          |
//! | [`job`]      | `LookAheadJob` (discard/reuse), `JobAwakeningResult`  |
//! | [`factory`]  | `LookAheadJobFactory`, `ReuseEquivalence`             |
//! | [`registry`] | `LookAheadJobRegistry` — dedup of equivalent paths    |
//! | [`error`]    | `JobError`                                            |

pub mod error;
pub mod factory;
pub mod job;
pub mod path;
pub mod registry;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use error::JobError;
pub use factory::{LookAheadJobFactory, ReuseEquivalence};
pub use job::{JobAwakeningResult, JobKind, LookAheadJob};
pub use path::{LookAheadJobIdentifier, LookAheadJobPath};
pub use registry::LookAheadJobRegistry;
