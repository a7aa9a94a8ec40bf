//! Job creation, branching, and awakening.

use std::sync::Arc;

use prox_barrier::{MinimumDistanceBarrierSequence, SectionMetric, UpdatePolicy};
use prox_body::{BodySegmentSample, ModeTrace, merge};
use prox_core::{Interval, Timestamp};
use prox_history::RobotStateHistory;

use crate::error::JobError;
use crate::job::{JobAwakeningResult, JobKind, LookAheadJob};
use crate::path::{LookAheadJobIdentifier, LookAheadJobPath};
use crate::registry::LookAheadJobRegistry;

/// The guarantee offered when reusing prediction data across awakenings.
///
/// `Strong`: results are strictly equivalent to recomputation — the
/// snapshot is re-pinned to the awakening time and any mode whose samples
/// may have been updated is excluded from reuse.
///
/// `Weak`: reuse holds as long as the mode trace stays consistent with the
/// prediction trace; the older snapshot keeps serving, so a mode that
/// received new samples after `snapshot_time` does not invalidate its
/// cached barriers.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ReuseEquivalence {
    Strong,
    Weak,
}

/// Creates and renews look-ahead jobs.  The discard factory restarts every
/// scan from scratch; the reuse factory carries barrier sequences forward
/// and deduplicates awoken jobs through a shared registry.
#[derive(Clone, Debug)]
pub enum LookAheadJobFactory {
    Discard,
    Reuse {
        registry: Arc<LookAheadJobRegistry>,
        update_policy: UpdatePolicy,
        equivalence: ReuseEquivalence,
    },
}

impl LookAheadJobFactory {
    pub fn discard() -> Self {
        LookAheadJobFactory::Discard
    }

    pub fn reuse(update_policy: UpdatePolicy, equivalence: ReuseEquivalence) -> Self {
        LookAheadJobFactory::Reuse {
            registry: Arc::new(LookAheadJobRegistry::new()),
            update_policy,
            equivalence,
        }
    }

    /// Create a fresh job at an initial mode.
    pub fn create_new(
        &self,
        id: LookAheadJobIdentifier,
        initial_time: Timestamp,
        human_sample: BodySegmentSample,
        mode_trace: ModeTrace,
        path: LookAheadJobPath,
    ) -> Result<LookAheadJob, JobError> {
        let kind = match self {
            LookAheadJobFactory::Discard => JobKind::Discard,
            LookAheadJobFactory::Reuse { registry, update_policy, .. } => {
                if !registry.try_register(initial_time, &id, &path)? {
                    return Err(JobError::AlreadyRegistered);
                }
                JobKind::Reuse(MinimumDistanceBarrierSequence::new(
                    SectionMetric::Capsule,
                    *update_policy,
                ))
            }
        };
        Ok(LookAheadJob::new(
            id,
            initial_time,
            initial_time,
            human_sample,
            mode_trace,
            path,
            kind,
        ))
    }

    /// One successor job per predicted next mode, each with its path
    /// extended by (branch priority, deviation position).  Empty when the
    /// job's prediction trace has looped.
    pub fn create_next(
        &self,
        job: &LookAheadJob,
        robot_history: &RobotStateHistory,
    ) -> Result<Vec<LookAheadJob>, JobError> {
        let prediction_trace = job.prediction_trace();
        if prediction_trace.has_looped() {
            return Ok(Vec::new());
        }

        // The snapshot at the initial time is still the right one to merge
        // the historical trace with the prediction.
        let full_trace = merge(
            &robot_history.snapshot_at(job.initial_time()).mode_trace(),
            prediction_trace,
        );
        let next_modes = full_trace.next_modes();
        if next_modes.is_empty() {
            return Err(JobError::NoNextModes);
        }
        let num_modes = next_modes.len();

        let mut result = Vec::with_capacity(num_modes);
        for (priority, (mode, probability)) in next_modes.iter().enumerate() {
            let mut trace = prediction_trace.clone();
            trace.push_back(mode.clone(), *probability);
            let mut path = job.path().clone();
            if num_modes > 1 {
                path.add(priority, trace.len() - 1);
            }
            result.push(self.job_from_existing(job, trace, path));
        }
        Ok(result)
    }

    fn job_from_existing(
        &self,
        job: &LookAheadJob,
        trace: ModeTrace,
        path: LookAheadJobPath,
    ) -> LookAheadJob {
        LookAheadJob::new(
            job.id().clone(),
            job.initial_time(),
            job.snapshot_time(),
            job.human_sample().clone(),
            trace,
            path,
            job.kind().clone(),
        )
    }

    /// Renew a sleeping `job` for a new triggering event at `time` with the
    /// latest `human_sample`.  Each returned pair carries the awakening
    /// result that decides which queue the job goes to.
    pub fn awaken(
        &self,
        job: &LookAheadJob,
        time: Timestamp,
        human_sample: &BodySegmentSample,
        robot_history: &RobotStateHistory,
    ) -> Result<Vec<(LookAheadJob, JobAwakeningResult)>, JobError> {
        if job.initial_time() >= time {
            return Ok(vec![(job.clone(), JobAwakeningResult::Unaffected)]);
        }
        match self {
            LookAheadJobFactory::Discard => {
                self.awaken_discard(job, time, human_sample, robot_history)
            }
            LookAheadJobFactory::Reuse { registry, equivalence, .. } => self.awaken_reuse(
                registry,
                *equivalence,
                job,
                time,
                human_sample,
                robot_history,
            ),
        }
    }

    fn awaken_discard(
        &self,
        job: &LookAheadJob,
        time: Timestamp,
        human_sample: &BodySegmentSample,
        robot_history: &RobotStateHistory,
    ) -> Result<Vec<(LookAheadJob, JobAwakeningResult)>, JobError> {
        if human_sample.is_empty() {
            let renewed = LookAheadJob::new(
                job.id().clone(),
                time,
                time,
                job.human_sample().clone(),
                job.prediction_trace().clone(),
                job.path().clone(),
                JobKind::Discard,
            );
            return Ok(vec![(renewed, JobAwakeningResult::Uncomputable)]);
        }
        // Non-primary jobs are rebuilt from their primary sibling; this one
        // is simply dropped.
        if !job.path().is_primary() {
            return Ok(Vec::new());
        }
        let mode_to_start = robot_history.mode_at(time);
        let mut trace = ModeTrace::new();
        trace.push_back(mode_to_start, 1.0);
        let renewed = LookAheadJob::new(
            job.id().clone(),
            time,
            time,
            human_sample.clone(),
            trace,
            LookAheadJobPath::new(),
            JobKind::Discard,
        );
        Ok(vec![(renewed, JobAwakeningResult::Different)])
    }

    #[allow(clippy::too_many_arguments)]
    fn awaken_reuse(
        &self,
        registry: &Arc<LookAheadJobRegistry>,
        equivalence: ReuseEquivalence,
        job: &LookAheadJob,
        time: Timestamp,
        human_sample: &BodySegmentSample,
        robot_history: &RobotStateHistory,
    ) -> Result<Vec<(LookAheadJob, JobAwakeningResult)>, JobError> {
        let mode_to_start = robot_history.mode_at(time);
        let mut prediction_trace = job.prediction_trace().clone();
        let mut path = job.path().clone();
        let mut barrier_sequence = job
            .barrier_sequence()
            .cloned()
            .expect("reuse factory only awakens reuse jobs");
        let mut snapshot_time = match equivalence {
            ReuseEquivalence::Strong => time,
            ReuseEquivalence::Weak => job.snapshot_time(),
        };

        if human_sample.is_empty() {
            registry.try_register(time, job.id(), &path)?;
            let renewed = LookAheadJob::new(
                job.id().clone(),
                time,
                snapshot_time,
                job.human_sample().clone(),
                prediction_trace,
                path,
                JobKind::Reuse(barrier_sequence),
            );
            return Ok(vec![(renewed, JobAwakeningResult::Uncomputable)]);
        }

        match prediction_trace.forward_index(&mode_to_start) {
            None => {
                // The mode to start from is not on this branch: restart.
                prediction_trace = ModeTrace::new();
                prediction_trace.push_back(mode_to_start, 1.0);
                barrier_sequence.clear();
                path = LookAheadJobPath::new();
                snapshot_time = time;
            }
            Some(lower_trace_index) => {
                let mut reset_upper_trace_index = prediction_trace.len() - 1;
                if equivalence == ReuseEquivalence::Strong && lower_trace_index > 0 {
                    // Modes revisited after the new start may have mutated
                    // sample buffers: exclude them from reuse.
                    for i in 0..lower_trace_index {
                        if let Some(backward) =
                            prediction_trace.backward_index(&prediction_trace.at(i).mode)
                        {
                            if backward > i {
                                reset_upper_trace_index =
                                    reset_upper_trace_index.min(backward - 1);
                            }
                        }
                    }
                }
                let snapshot = robot_history.snapshot_at(snapshot_time);
                let start_sample_index = snapshot.checked_sample_index(&mode_to_start, time)?;
                barrier_sequence.reset(
                    human_sample,
                    Interval::new(lower_trace_index, reset_upper_trace_index),
                    start_sample_index,
                );
                if barrier_sequence.is_empty() {
                    prediction_trace = ModeTrace::new();
                    prediction_trace.push_back(mode_to_start, 1.0);
                    path = LookAheadJobPath::new();
                    snapshot_time = time;
                } else {
                    let mut upper_trace_index =
                        lower_trace_index + barrier_sequence.last_upper_trace_index();
                    let mode_to_reuse = prediction_trace.at(upper_trace_index).mode.clone();
                    let reusable_samples = snapshot
                        .samples(&mode_to_reuse)?
                        .get(job.id().robot_segment())
                        .map_or(0, Vec::len);
                    let last_sample_index = barrier_sequence
                        .last_barrier()
                        .map_or(0, |b| b.range().maximum_sample_index());
                    if reusable_samples > 0 && last_sample_index == reusable_samples - 1 {
                        upper_trace_index += 1;
                    }

                    if upper_trace_index == prediction_trace.len() {
                        // The cache already covers the whole branch: jump
                        // straight to the next modes.
                        prediction_trace.reduce_between(lower_trace_index, upper_trace_index - 1);
                        path.reduce_between(lower_trace_index, upper_trace_index);
                        let renewed = LookAheadJob::new(
                            job.id().clone(),
                            time,
                            snapshot_time,
                            human_sample.clone(),
                            prediction_trace,
                            path,
                            JobKind::Reuse(barrier_sequence),
                        );
                        let successors = self.create_next(&renewed, robot_history)?;
                        if successors.is_empty() {
                            return Ok(vec![(renewed, JobAwakeningResult::Completed)]);
                        }
                        let mut result = Vec::with_capacity(successors.len());
                        for next in successors {
                            if registry.try_register(time, job.id(), next.path())? {
                                result.push((next, JobAwakeningResult::Different));
                            }
                        }
                        return Ok(result);
                    }
                    prediction_trace.reduce_between(lower_trace_index, upper_trace_index);
                    path.reduce_between(lower_trace_index, upper_trace_index);
                }
            }
        }

        if registry.try_register(time, job.id(), &path)? {
            let renewed = LookAheadJob::new(
                job.id().clone(),
                time,
                snapshot_time,
                human_sample.clone(),
                prediction_trace,
                path,
                JobKind::Reuse(barrier_sequence),
            );
            Ok(vec![(renewed, JobAwakeningResult::Different)])
        } else {
            Ok(Vec::new())
        }
    }

    /// Whether (timestamp, id, path) has been handed out by this factory.
    /// Always false for the discard factory.
    pub fn has_registered(
        &self,
        timestamp: Timestamp,
        id: &LookAheadJobIdentifier,
        path: &LookAheadJobPath,
    ) -> bool {
        match self {
            LookAheadJobFactory::Discard => false,
            LookAheadJobFactory::Reuse { registry, .. } => {
                registry.has_registered(timestamp, id, path)
            }
        }
    }
}
