//! Read-only views of a robot history fixed at a timestamp.

use std::collections::BTreeSet;

use prox_body::{Mode, ModeTrace};
use prox_core::{Interval, Timestamp, time::samples_over};

use crate::error::HistoryError;
use crate::robot::{
    BodySamples, RobotModePresence, RobotStateHistory, mode_at_in, unrounded_index_in,
};

/// A snapshot of a [`RobotStateHistory`] at a given time.
///
/// The snapshot is a value capture of (history handle, timestamp); every
/// query locks the relevant store briefly and ignores anything recorded
/// after the snapshot time.
#[derive(Clone, Copy)]
pub struct RobotStateHistorySnapshot<'a> {
    history: &'a RobotStateHistory,
    time: Timestamp,
}

impl<'a> RobotStateHistorySnapshot<'a> {
    pub(crate) fn new(history: &'a RobotStateHistory, time: Timestamp) -> Self {
        Self { history, time }
    }

    pub fn time(&self) -> Timestamp {
        self.time
    }

    /// The most recent mode trace recorded at or before the snapshot time.
    ///
    /// A mode enters the trace only once a sample from its successor has
    /// been acquired, so a next mode always exists from the trace.
    pub fn mode_trace(&self) -> ModeTrace {
        let log = self.history.presences.lock().unwrap();
        log.traces
            .iter()
            .rev()
            .find(|(t, _)| *t <= self.time)
            .map(|(_, trace)| trace.clone())
            .unwrap_or_default()
    }

    /// The modes having samples valid at the snapshot time.
    pub fn modes_with_samples(&self) -> BTreeSet<Mode> {
        let states = self.history.states.lock().unwrap();
        states
            .mode_samples
            .iter()
            .filter(|(_, h)| h.has_samples_at(self.time))
            .map(|(m, _)| m.clone())
            .collect()
    }

    /// The sample matrix for `mode`, cloned out of the store.
    pub fn samples(&self, mode: &Mode) -> Result<BodySamples, HistoryError> {
        let states = self.history.states.lock().unwrap();
        states
            .mode_samples
            .get(mode)
            .and_then(|h| h.at(self.time))
            .cloned()
            .ok_or_else(|| HistoryError::NoSamplesAt {
                mode: mode.to_string(),
                timestamp: self.time,
            })
    }

    /// The per-segment sample count for `mode` at the snapshot time.
    pub fn maximum_number_of_samples(&self, mode: &Mode) -> Result<usize, HistoryError> {
        let states = self.history.states.lock().unwrap();
        states
            .mode_samples
            .get(mode)
            .and_then(|h| h.size_at(self.time))
            .ok_or_else(|| HistoryError::NoSamplesAt {
                mode: mode.to_string(),
                timestamp: self.time,
            })
    }

    /// Completed presences of `mode` before the snapshot time.
    pub fn presences_in(&self, mode: &Mode) -> Vec<RobotModePresence> {
        let log = self.history.presences.lock().unwrap();
        log.presences
            .iter()
            .filter(|p| !p.mode().is_empty() && p.mode() == mode && p.to() <= self.time)
            .cloned()
            .collect()
    }

    /// Completed presences exiting into `mode` before the snapshot time.
    pub fn presences_exiting_into(&self, mode: &Mode) -> Vec<RobotModePresence> {
        let log = self.history.presences.lock().unwrap();
        log.presences
            .iter()
            .filter(|p| p.exit_destination() == mode && p.to() <= self.time)
            .cloned()
            .collect()
    }

    /// Completed presences of `source` exiting into `destination`.
    pub fn presences_between(&self, source: &Mode, destination: &Mode) -> Vec<RobotModePresence> {
        let log = self.history.presences.lock().unwrap();
        log.presences
            .iter()
            .filter(|p| {
                !p.mode().is_empty()
                    && p.mode() == source
                    && p.exit_destination() == destination
                    && p.to() <= self.time
            })
            .cloned()
            .collect()
    }

    /// Min/max samples observed across past presences of `mode`.
    pub fn range_of_num_samples_in(&self, mode: &Mode) -> Interval<usize> {
        self.range_within(&self.presences_in(mode))
    }

    /// Min/max samples across past presences of `mode` exiting into `target`.
    pub fn range_of_num_samples_between(&self, mode: &Mode, target: &Mode) -> Interval<usize> {
        self.range_within(&self.presences_between(mode, target))
    }

    fn range_within(&self, presences: &[RobotModePresence]) -> Interval<usize> {
        if presences.is_empty() {
            return Interval::new(0, 0);
        }
        let frequency = self.history.robot().message_frequency();
        let mut min = usize::MAX;
        let mut max = 0;
        for p in presences {
            let n = samples_over(p.to() - p.from(), frequency);
            min = min.min(n);
            max = max.max(n);
        }
        Interval::new(min, max)
    }

    /// Whether look-ahead starting at `timestamp` is meaningful.
    ///
    /// Requires the robot to have already completed a presence of the mode
    /// it is in at `timestamp`; this avoids mistaking a mode the robot just
    /// entered for part of the history when the robot runs slightly ahead
    /// of the human.
    pub fn can_look_ahead(&self, timestamp: Timestamp) -> bool {
        let mode = {
            let log = self.history.presences.lock().unwrap();
            if timestamp > log.latest_time {
                return false;
            }
            mode_at_in(&log, timestamp)
        };
        {
            let states = self.history.states.lock().unwrap();
            match states.mode_samples.get(&mode) {
                Some(h) if h.has_samples_at(timestamp) => {}
                _ => return false,
            }
        }
        let Ok(unrounded) = self.unrounded_sample_index(&mode, timestamp) else {
            return false;
        };
        if unrounded >= self.range_of_num_samples_in(&mode).upper() as f64 {
            return false;
        }
        let log = self.history.presences.lock().unwrap();
        for p in &log.presences {
            if p.from() >= self.time {
                break;
            }
            if !p.mode().is_empty() && p.mode() == &mode && timestamp > p.to() {
                return true;
            }
        }
        false
    }

    /// The mode at `timestamp` (the current mode past the last exit).
    pub fn mode_at(&self, timestamp: Timestamp) -> Mode {
        mode_at_in(&self.history.presences.lock().unwrap(), timestamp)
    }

    /// The sample index `timestamp` maps to inside `mode`, unrounded.  May
    /// point past the currently stored samples.
    pub fn unrounded_sample_index(
        &self,
        mode: &Mode,
        timestamp: Timestamp,
    ) -> Result<f64, HistoryError> {
        let log = self.history.presences.lock().unwrap();
        unrounded_index_in(&log, self.history.robot().message_frequency(), mode, timestamp)
    }

    /// The (floored) sample index `timestamp` maps to inside `mode`.
    pub fn sample_index(&self, mode: &Mode, timestamp: Timestamp) -> Result<usize, HistoryError> {
        Ok(self.unrounded_sample_index(mode, timestamp)?.floor() as usize)
    }

    /// As [`sample_index`](Self::sample_index), but fails when the index is
    /// not backed by a stored sample.
    pub fn checked_sample_index(
        &self,
        mode: &Mode,
        timestamp: Timestamp,
    ) -> Result<usize, HistoryError> {
        let index = self.sample_index(mode, timestamp)?;
        let available = self.maximum_number_of_samples(mode)?;
        if index >= available {
            return Err(HistoryError::SampleIndexOutOfRange { index, available });
        }
        Ok(index)
    }
}
