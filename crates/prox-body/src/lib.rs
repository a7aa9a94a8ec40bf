//! `prox-body` — articulated bodies and discrete operating modes.
//!
//! # What lives here
//!
//! | Module     | Contents                                                  |
//! |------------|-----------------------------------------------------------|
//! | [`mode`]   | `Mode` — a named value-assignment (discrete robot state)  |
//! | [`trace`]  | `ModeTrace` — visited modes with likelihoods, `next_modes`|
//! | [`body`]   | `Body`, `Human`, `Robot`, `BodySegment`                   |
//! | [`sample`] | `BodySegmentSample` — per-segment spatial snapshot        |
//! | [`error`]  | `BodyError`                                               |

pub mod body;
pub mod error;
pub mod mode;
pub mod sample;
pub mod trace;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use body::{Body, BodyId, BodySegment, Human, KeypointId, Robot};
pub use error::BodyError;
pub use mode::Mode;
pub use sample::{BodySegmentSample, segment_sample_distance, sphere_capsule_distance};
pub use trace::{ModeTrace, ModeTraceEntry, merge};
