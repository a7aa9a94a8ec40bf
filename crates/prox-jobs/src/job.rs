//! The look-ahead job value and its collision scan.

use prox_barrier::{MinimumDistanceBarrierSequence, TraceSampleIndex};
use prox_body::{BodySegmentSample, ModeTrace};
use prox_core::Timestamp;
use prox_history::RobotStateHistory;

use crate::error::JobError;
use crate::path::{LookAheadJobIdentifier, LookAheadJobPath};

/// Outcome of awakening a sleeping job.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum JobAwakeningResult {
    /// The job was genuinely renewed and must be processed again.
    Different,
    /// Nothing changed; the job goes back to sleeping.
    Unaffected,
    /// The job is already completed due to a loop in its trace.
    Completed,
    /// The new human sample is empty; the job sleeps until a usable one
    /// arrives.
    Uncomputable,
}

/// The job variant: recompute from scratch each round, or carry the barrier
/// cache forward.
#[derive(Clone, Debug)]
pub enum JobKind {
    Discard,
    Reuse(MinimumDistanceBarrierSequence),
}

/// A unit of predictive work, immutable apart from the reuse variant's
/// barrier sequence (the worker's workspace while the job is processed).
#[derive(Clone, Debug)]
pub struct LookAheadJob {
    id: LookAheadJobIdentifier,
    initial_time: Timestamp,
    snapshot_time: Timestamp,
    human_sample: BodySegmentSample,
    prediction_trace: ModeTrace,
    path: LookAheadJobPath,
    kind: JobKind,
}

impl LookAheadJob {
    pub(crate) fn new(
        id: LookAheadJobIdentifier,
        initial_time: Timestamp,
        snapshot_time: Timestamp,
        human_sample: BodySegmentSample,
        prediction_trace: ModeTrace,
        path: LookAheadJobPath,
        kind: JobKind,
    ) -> Self {
        Self { id, initial_time, snapshot_time, human_sample, prediction_trace, path, kind }
    }

    pub fn id(&self) -> &LookAheadJobIdentifier {
        &self.id
    }

    /// The time look-ahead started from, used to identify loops.
    pub fn initial_time(&self) -> Timestamp {
        self.initial_time
    }

    /// The reference time into the history; nothing after it is considered.
    pub fn snapshot_time(&self) -> Timestamp {
        self.snapshot_time
    }

    pub fn human_sample(&self) -> &BodySegmentSample {
        &self.human_sample
    }

    /// The predicted discrete trace, starting at the mode the robot was in
    /// at `initial_time`.
    pub fn prediction_trace(&self) -> &ModeTrace {
        &self.prediction_trace
    }

    pub fn path(&self) -> &LookAheadJobPath {
        &self.path
    }

    pub fn kind(&self) -> &JobKind {
        &self.kind
    }

    /// The barrier sequence, for the reuse variant.
    pub fn barrier_sequence(&self) -> Option<&MinimumDistanceBarrierSequence> {
        match &self.kind {
            JobKind::Discard => None,
            JobKind::Reuse(sequence) => Some(sequence),
        }
    }

    /// Scan the robot samples of the trace's ending mode for the earliest
    /// index at which the human sample may intersect.
    ///
    /// The scan window starts after the last cached barrier (reuse variant)
    /// and is restricted by the sample index at `initial_time` when the job
    /// has not yet advanced past its starting mode.  Returns `None` when no
    /// collision is possible in the window.
    pub fn earliest_collision_index(
        &mut self,
        robot_history: &RobotStateHistory,
    ) -> Result<Option<usize>, JobError> {
        let mode_to_look = self.prediction_trace.ending_mode().clone();
        let trace_index = self.prediction_trace.len() - 1;
        let snapshot = robot_history.snapshot_at(self.snapshot_time);
        let samples = snapshot.samples(&mode_to_look)?;
        let segment_samples = samples
            .get(self.id.robot_segment())
            .ok_or(JobError::MissingRobotSegment(self.id.robot_segment()))?;
        if segment_samples.is_empty() {
            return Err(JobError::EmptySamples(mode_to_look.to_string()));
        }

        let mut lower = match &self.kind {
            JobKind::Discard => 0,
            JobKind::Reuse(sequence) => {
                if sequence.is_empty() || sequence.last_upper_trace_index() != trace_index {
                    0
                } else {
                    sequence
                        .last_barrier()
                        .map_or(0, |b| b.range().maximum_sample_index() + 1)
                }
            }
        };
        let mut upper = segment_samples.len() - 1;
        if mode_to_look == *self.prediction_trace.starting_mode() {
            let bound = snapshot.checked_sample_index(&mode_to_look, self.initial_time)?;
            if self.prediction_trace.len() == 1 {
                lower = lower.max(bound);
            } else if bound == 0 {
                return Ok(None);
            } else {
                upper = bound - 1;
            }
        }

        let human_sample = &self.human_sample;
        for (i, robot_sample) in segment_samples
            .iter()
            .enumerate()
            .take(upper + 1)
            .skip(lower)
        {
            if robot_sample.is_empty() {
                continue;
            }
            let collided = match &mut self.kind {
                JobKind::Discard => human_sample.intersects(robot_sample),
                JobKind::Reuse(sequence) => !sequence.check_and_update(
                    human_sample,
                    robot_sample,
                    TraceSampleIndex::new(trace_index, i),
                ),
            };
            if collided {
                return Ok(Some(i));
            }
        }
        Ok(None)
    }
}
