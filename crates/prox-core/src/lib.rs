//! `prox-core` — foundational types for the `prox` collision-prediction
//! runtime.
//!
//! This crate is a dependency of every other `prox-*` crate.  It intentionally
//! has no `prox-*` dependencies and minimal external ones (only `thiserror`).
//!
//! # What lives here
//!
//! | Module       | Contents                                                |
//! |--------------|---------------------------------------------------------|
//! | [`geometry`] | `Point`, `Box3`, `Sphere`, segment distances            |
//! | [`interval`] | `Interval<T>` with scalar/interval arithmetic           |
//! | [`time`]     | `Timestamp` (ms) and `Frequency` (Hz) aliases           |
//! | [`error`]    | `ProxError`, `ProxResult`                               |

pub mod error;
pub mod geometry;
pub mod interval;
pub mod time;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use error::{ProxError, ProxResult};
pub use geometry::{Box3, Point, Sphere, hull, segment_distance};
pub use interval::Interval;
pub use time::{Frequency, Timestamp};
