//! `prox-runtime` — the predictive scheduling engine.
//!
//! Presentation messages create bodies in the [`BodyRegistry`]; state
//! messages grow their histories.  Each new human state that pairs an
//! existing human with an existing robot is promoted into initial
//! look-ahead jobs on the waiting queue; a pool of workers drains the
//! queue, publishing collision notifications and spawning successor jobs
//! until every branch either collides or loops.  Exhausted jobs sleep
//! until a new human sample wakes them.
//!
//! # What lives here
//!
//! | Module       | Contents                                              |
//! |--------------|-------------------------------------------------------|
//! | [`queue`]    | `SyncQueue` — mutex-guarded queue with reservations   |
//! | [`registry`] | `BodyRegistry` — process-wide body catalog            |
//! | [`config`]   | `RuntimeConfig`                                       |
//! | [`receiver`] | topic subscriptions, pair promotion, job awakening    |
//! | [`sender`]   | background notification publisher                     |
//! | [`runtime`]  | `Runtime` — worker pool and job processing            |

pub mod config;
pub mod error;
pub mod queue;
pub mod receiver;
pub mod registry;
pub mod runtime;
pub mod sender;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use config::RuntimeConfig;
pub use error::{RegistryError, RuntimeError};
pub use queue::SyncQueue;
pub use receiver::HUMAN_RETENTION_TIMEOUT;
pub use registry::BodyRegistry;
pub use runtime::Runtime;
