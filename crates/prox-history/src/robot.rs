//! Robot state history: per-mode sample stores, mode presences, and the
//! growing mode-trace log.
//!
//! # Locking
//!
//! Two mutexes guard the mutable state: `states` (the per-mode sample
//! matrices plus the in-progress buffer for the current mode) and
//! `presences` (the presence log, the trace log, and the latest mode/time).
//! `acquire` takes them in that order; snapshot queries lock one at a time.
//! State acquisitions are serialised by the caller (the receiver), so the
//! locks only arbitrate between the single writer and the worker threads
//! reading through snapshots.

use std::collections::{BTreeMap, VecDeque};
use std::sync::Mutex;

use prox_body::{BodySegmentSample, KeypointId, Mode, ModeTrace, Robot};
use prox_core::{Frequency, Point, Timestamp};

use crate::error::HistoryError;
use crate::snapshot::RobotStateHistorySnapshot;

/// Samples organised as `[segment][sample index]`.
pub type BodySamples = Vec<Vec<BodySegmentSample>>;

// ── RobotModePresence ─────────────────────────────────────────────────────────

/// A contiguous interval `[from, to)` spent in one mode, with the mode
/// entered on exit.
#[derive(Clone, Debug, PartialEq)]
pub struct RobotModePresence {
    mode: Mode,
    exit_destination: Mode,
    from: Timestamp,
    to: Timestamp,
}

impl RobotModePresence {
    pub fn new(mode: Mode, exit_destination: Mode, from: Timestamp, to: Timestamp) -> Self {
        Self { mode, exit_destination, from, to }
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn exit_destination(&self) -> &Mode {
        &self.exit_destination
    }

    pub fn from(&self) -> Timestamp {
        self.from
    }

    /// Exit timestamp, excluded from the presence itself.
    pub fn to(&self) -> Timestamp {
        self.to
    }
}

// ── SamplesHistory ────────────────────────────────────────────────────────────

/// The continuous history for one mode: sample matrices keyed by the
/// timestamp at which they were flushed, append-ordered.
#[derive(Clone, Debug, Default)]
pub struct SamplesHistory {
    entries: Vec<(Timestamp, BodySamples)>,
}

impl SamplesHistory {
    /// The samples valid at `timestamp` (the latest entry at or before it).
    pub fn at(&self, timestamp: Timestamp) -> Option<&BodySamples> {
        self.entries
            .iter()
            .rev()
            .find(|(t, _)| *t <= timestamp)
            .map(|(_, samples)| samples)
    }

    pub fn append(&mut self, timestamp: Timestamp, samples: BodySamples) {
        self.entries.push((timestamp, samples));
    }

    pub fn has_samples_at(&self, timestamp: Timestamp) -> bool {
        self.entries.iter().any(|(t, _)| *t <= timestamp)
    }

    /// The number of samples (per segment) valid at `timestamp`.
    pub fn size_at(&self, timestamp: Timestamp) -> Option<usize> {
        self.at(timestamp).map(|s| s.first().map_or(0, Vec::len))
    }

    /// Drop entries that can no longer be resolved by any timestamp ≥ `timestamp`.
    pub fn purge_older_than(&mut self, timestamp: Timestamp) {
        while self.entries.len() > 1 && self.entries[1].0 <= timestamp {
            self.entries.remove(0);
        }
    }
}

// ── Internal stores ───────────────────────────────────────────────────────────

#[derive(Debug)]
pub(crate) struct SampleStore {
    pub(crate) mode_samples: BTreeMap<Mode, SamplesHistory>,
    pub(crate) buffer: BodySamples,
}

#[derive(Debug)]
pub(crate) struct PresenceLog {
    pub(crate) presences: VecDeque<RobotModePresence>,
    pub(crate) traces: Vec<(Timestamp, ModeTrace)>,
    pub(crate) latest_mode: Mode,
    pub(crate) latest_time: Timestamp,
}

/// The sample index that `timestamp` maps to inside `mode`, unrounded.
///
/// The entry time is the start of the current presence when `timestamp` is
/// at or past the last recorded exit, otherwise the start of the past
/// presence of `mode` containing `timestamp` (the initial empty-mode
/// presence never qualifies).
pub(crate) fn unrounded_index_in(
    log: &PresenceLog,
    frequency: Frequency,
    mode: &Mode,
    timestamp: Timestamp,
) -> Result<f64, HistoryError> {
    let last = log
        .presences
        .back()
        .ok_or(HistoryError::NoPresenceAt(timestamp))?;
    let entry_time = if timestamp >= last.to {
        last.to
    } else {
        log.presences
            .iter()
            .rev()
            .take(log.presences.len() - 1)
            .find(|p| p.mode == *mode && p.from <= timestamp && p.to > timestamp)
            .map(|p| p.from)
            .ok_or(HistoryError::NoPresenceAt(timestamp))?
    };
    if entry_time > timestamp {
        return Err(HistoryError::NoPresenceAt(timestamp));
    }
    Ok((timestamp - entry_time) as f64 / 1e3 * frequency as f64)
}

pub(crate) fn mode_at_in(log: &PresenceLog, timestamp: Timestamp) -> Mode {
    for p in &log.presences {
        if p.from <= timestamp && timestamp < p.to {
            return p.mode.clone();
        }
    }
    log.latest_mode.clone()
}

// ── RobotStateHistory ─────────────────────────────────────────────────────────

/// The states reached by one robot up to now.
#[derive(Debug)]
pub struct RobotStateHistory {
    robot: Robot,
    pub(crate) states: Mutex<SampleStore>,
    pub(crate) presences: Mutex<PresenceLog>,
}

impl RobotStateHistory {
    pub fn new(robot: Robot) -> Self {
        let buffer = vec![Vec::new(); robot.body().num_segments()];
        Self {
            robot,
            states: Mutex::new(SampleStore {
                mode_samples: BTreeMap::new(),
                buffer,
            }),
            presences: Mutex::new(PresenceLog {
                presences: VecDeque::new(),
                traces: vec![(0, ModeTrace::new())],
                latest_mode: Mode::empty(),
                latest_time: 0,
            }),
        }
    }

    pub fn robot(&self) -> &Robot {
        &self.robot
    }

    /// The most recent time of a state acquired.
    pub fn latest_time(&self) -> Timestamp {
        self.presences.lock().unwrap().latest_time
    }

    /// The most recent mode according to the latest time.
    pub fn latest_mode(&self) -> Mode {
        self.presences.lock().unwrap().latest_mode.clone()
    }

    /// The mode at `timestamp`; the current mode when the time is past the
    /// last recorded exit.
    pub fn mode_at(&self, timestamp: Timestamp) -> Mode {
        mode_at_in(&self.presences.lock().unwrap(), timestamp)
    }

    /// Read-only view of the history fixed at `timestamp`.
    pub fn snapshot_at(&self, timestamp: Timestamp) -> RobotStateHistorySnapshot<'_> {
        RobotStateHistorySnapshot::new(self, timestamp)
    }

    /// Ingest one state message.
    ///
    /// On a mode change the in-progress buffer is flushed into the previous
    /// mode's history (padding skipped sample slots with copies of the last
    /// sample), the buffer is re-initialised (cloned from the mode's stored
    /// samples when re-entering a known mode), and the presence and trace
    /// logs grow.  The new points then refine the sample slot the timestamp
    /// maps to.
    pub fn acquire(
        &self,
        mode: &Mode,
        points: &BTreeMap<KeypointId, Vec<Point>>,
        timestamp: Timestamp,
    ) -> Result<(), HistoryError> {
        let frequency = self.robot.message_frequency();
        let num_segments = self.robot.body().num_segments();

        let mut states = self.states.lock().unwrap();
        let mut log = self.presences.lock().unwrap();

        if log.latest_mode.is_empty() || log.latest_mode != *mode {
            if !log.latest_mode.is_empty() {
                // Flush the buffer into the exited mode, padding sample
                // slots that elapsed without a message.
                let unrounded =
                    unrounded_index_in(&log, frequency, &log.latest_mode, timestamp)?;
                if let Some(last_idx) = states.buffer.first().and_then(|s| s.len().checked_sub(1))
                {
                    if unrounded > (last_idx + 1) as f64 {
                        let gap = unrounded.floor() as usize - last_idx;
                        for segment in &mut states.buffer {
                            let last = segment[last_idx].clone();
                            for _ in 0..gap {
                                segment.push(last.clone());
                            }
                        }
                    }
                }
                let flushed = states.buffer.clone();
                let exited = log.latest_mode.clone();
                states
                    .mode_samples
                    .entry(exited)
                    .or_default()
                    .append(timestamp, flushed);
            }

            states.buffer = match states.mode_samples.get(mode).and_then(|h| h.at(timestamp)) {
                Some(samples) => samples.clone(),
                None => vec![Vec::new(); num_segments],
            };

            let entrance = log.presences.back().map_or(timestamp, |p| p.to);
            let previous = log.latest_mode.clone();
            log.presences.push_back(RobotModePresence::new(
                previous.clone(),
                mode.clone(),
                entrance,
                timestamp,
            ));
            if !previous.is_empty() {
                let mut trace = log
                    .traces
                    .last()
                    .map(|(_, t)| t.clone())
                    .unwrap_or_default();
                trace.push_back(previous, 1.0);
                log.traces.push((timestamp, trace));
            }
            log.latest_mode = mode.clone();
        }
        log.latest_time = timestamp;

        // Which sample slot does this message refine, and how many new
        // slots does that imply?  For a mode never stored before, every
        // message is simply the next slot.
        let mut update_idx = states.buffer.first().map_or(0, Vec::len);
        let mut idx_distance: i64 = 1;
        if let Some(stored) = states
            .mode_samples
            .get(mode)
            .and_then(|h| h.size_at(timestamp))
        {
            update_idx = unrounded_index_in(&log, frequency, mode, timestamp)?.floor() as usize;
            idx_distance = update_idx as i64 - (stored as i64 - 1);
        }

        for i in 0..num_segments {
            let segment = self.robot.body().segment(i);
            let heads = points.get(segment.head_id()).map_or(&[][..], Vec::as_slice);
            let tails = points.get(segment.tail_id()).map_or(&[][..], Vec::as_slice);
            let empty_sample = segment.create_sample();
            let buffer = &mut states.buffer[i];
            if idx_distance > 1 {
                let last = buffer
                    .last()
                    .cloned()
                    .ok_or(HistoryError::EmptyBuffer(i))?;
                for _ in 0..(idx_distance - 1) {
                    buffer.push(last.clone());
                }
            }
            if idx_distance > 0 {
                buffer.push(empty_sample);
            }
            buffer
                .get_mut(update_idx)
                .ok_or(HistoryError::SampleIndexOutOfRange {
                    index: update_idx,
                    available: 0,
                })?
                .update(heads, tails);
        }
        Ok(())
    }

    /// Drop stored samples, presences, and traces that no timestamp at or
    /// after `timestamp` can still resolve.
    pub fn purge_older_than(&self, timestamp: Timestamp) {
        {
            let mut states = self.states.lock().unwrap();
            for history in states.mode_samples.values_mut() {
                history.purge_older_than(timestamp);
            }
        }
        let mut log = self.presences.lock().unwrap();
        while log.presences.len() > 1
            && log.presences.front().is_some_and(|p| p.to < timestamp)
        {
            log.presences.pop_front();
        }
        while log.traces.len() > 1 && log.traces[1].0 <= timestamp {
            log.traces.remove(0);
        }
    }
}
