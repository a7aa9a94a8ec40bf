//! `prox-barrier` — minimum-distance bounds reused across incremental
//! human updates.
//!
//! While a look-ahead job scans future robot samples it records *barriers*:
//! lower bounds on the human-robot distance, each valid over a range of
//! (trace index, sample index) positions.  When the human moves slightly,
//! the barriers whose bound exceeds the displacement still hold, so the
//! scan can resume from where the cache stops instead of starting over.
//!
//! # What lives here
//!
//! | Module      | Contents                                                |
//! |-------------|---------------------------------------------------------|
//! | [`range`]   | `TraceSampleIndex`, `TraceSampleRange`                  |
//! | [`barrier`] | `MinimumDistanceBarrier`                                |
//! | [`section`] | `SectionMetric`, `BarrierSequenceSection`               |
//! | [`sequence`]| `UpdatePolicy`, `MinimumDistanceBarrierSequence`        |

pub mod barrier;
pub mod range;
pub mod section;
pub mod sequence;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use barrier::MinimumDistanceBarrier;
pub use range::{TraceSampleIndex, TraceSampleRange};
pub use section::{BarrierSequenceSection, SectionMetric};
pub use sequence::{MinimumDistanceBarrierSequence, UpdatePolicy};
