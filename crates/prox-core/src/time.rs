//! Time units used throughout the workspace.
//!
//! Timestamps travel on the wire as 64-bit unsigned millisecond counts and
//! are compared and subtracted constantly in the history layer, so they stay
//! plain `u64`s rather than newtypes: every use site is already dimensioned
//! by the field it is read from.

/// A wall-clock instant in milliseconds, as carried by every state message.
pub type Timestamp = u64;

/// A message rate in Hz.  Always strictly positive for robots.
pub type Frequency = u64;

/// Number of samples a robot emits over `ms` milliseconds at `frequency` Hz,
/// rounded down.
#[inline]
pub fn samples_over(ms: Timestamp, frequency: Frequency) -> usize {
    ((ms as f64) / 1e3 * (frequency as f64)).floor() as usize
}
