//! The multi-section barrier sequence and its update policies.

use prox_body::BodySegmentSample;
use prox_core::Interval;

use crate::barrier::MinimumDistanceBarrier;
use crate::range::TraceSampleIndex;
use crate::section::{BarrierSequenceSection, SectionMetric};

/// How the sequence reacts when a check involves a human sample different
/// from the last section's reference.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum UpdatePolicy {
    /// Maintain one section only; a changed human sample keeps updating it
    /// against the original reference.
    KeepOne,
    /// Open a new section only when the existing one would close with a
    /// collision for the old reference.
    AddWhenNecessary,
    /// Open a new section whenever the human sample changes.
    AddWhenDifferent,
}

/// A full barrier sequence: successive sections pieced together, plus the
/// metric used to create sections and the update policy.
#[derive(Clone, Debug)]
pub struct MinimumDistanceBarrierSequence {
    metric: SectionMetric,
    policy: UpdatePolicy,
    sections: Vec<BarrierSequenceSection>,
}

impl MinimumDistanceBarrierSequence {
    pub fn new(metric: SectionMetric, policy: UpdatePolicy) -> Self {
        Self { metric, policy, sections: Vec::new() }
    }

    pub fn metric(&self) -> SectionMetric {
        self.metric
    }

    pub fn policy(&self) -> UpdatePolicy {
        self.policy
    }

    /// The last barrier across all sections.
    pub fn last_barrier(&self) -> Option<&MinimumDistanceBarrier> {
        self.sections.last().and_then(BarrierSequenceSection::last_barrier)
    }

    pub fn last_section(&self) -> Option<&BarrierSequenceSection> {
        self.sections.last()
    }

    /// The upper trace index of the last barrier, 0 when empty.
    pub fn last_upper_trace_index(&self) -> usize {
        self.sections
            .last()
            .map_or(0, BarrierSequenceSection::last_upper_trace_index)
    }

    /// Open a new section referenced on `human_sample`.
    pub fn add_from(&mut self, human_sample: BodySegmentSample) {
        self.sections
            .push(BarrierSequenceSection::new(self.metric, human_sample));
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn num_sections(&self) -> usize {
        self.sections.len()
    }

    pub fn num_barriers(&self) -> usize {
        self.sections.iter().map(BarrierSequenceSection::len).sum()
    }

    /// Whether the last barrier of the last section records a collision.
    pub fn reaches_collision(&self) -> bool {
        self.sections
            .last()
            .is_some_and(BarrierSequenceSection::reaches_collision)
    }

    pub fn clear(&mut self) {
        self.sections.clear();
    }

    /// Check `human_sample` against `robot_sample` at `index`, updating the
    /// last section or opening a new one according to the policy.
    ///
    /// Returns false iff a collision is found.
    pub fn check_and_update(
        &mut self,
        human_sample: &BodySegmentSample,
        robot_sample: &BodySegmentSample,
        index: TraceSampleIndex,
    ) -> bool {
        if self.sections.is_empty() {
            self.add_from(human_sample.clone());
        }
        let result = match self.policy {
            UpdatePolicy::KeepOne => self.check_keep_one(human_sample, robot_sample, index),
            UpdatePolicy::AddWhenNecessary => {
                self.check_add_when_necessary(human_sample, robot_sample, index)
            }
            UpdatePolicy::AddWhenDifferent => {
                self.check_add_when_different(human_sample, robot_sample, index)
            }
        };
        if self.sections.last().is_some_and(BarrierSequenceSection::is_empty) {
            self.sections.pop();
        }
        result
    }

    fn check_keep_one(
        &mut self,
        human_sample: &BodySegmentSample,
        robot_sample: &BodySegmentSample,
        index: TraceSampleIndex,
    ) -> bool {
        let section = self.sections.last_mut().expect("a section exists");
        if section.human_sample() != human_sample {
            let result = !section.are_colliding(human_sample, robot_sample);
            section.check_and_update(robot_sample, index);
            result
        } else {
            section.check_and_update(robot_sample, index)
        }
    }

    fn check_add_when_different(
        &mut self,
        human_sample: &BodySegmentSample,
        robot_sample: &BodySegmentSample,
        index: TraceSampleIndex,
    ) -> bool {
        if self.sections.last().expect("a section exists").human_sample() != human_sample {
            if !self.reaches_collision() {
                self.add_from(human_sample.clone());
                self.sections
                    .last_mut()
                    .expect("just added")
                    .check_and_update(robot_sample, index)
            } else {
                self.metric.minimum_human_robot_distance(human_sample, robot_sample) > 0.0
            }
        } else {
            self.sections
                .last_mut()
                .expect("a section exists")
                .check_and_update(robot_sample, index)
        }
    }

    fn check_add_when_necessary(
        &mut self,
        human_sample: &BodySegmentSample,
        robot_sample: &BodySegmentSample,
        index: TraceSampleIndex,
    ) -> bool {
        let last = self.sections.last_mut().expect("a section exists");
        if last.human_sample() != human_sample {
            if !last.reaches_collision() && !last.check_and_update(robot_sample, index) {
                // The old reference just closed with a collision barrier:
                // retract it and retry against a fresh section.
                last.remove_last_barrier();
                self.add_from(human_sample.clone());
                self.sections
                    .last_mut()
                    .expect("just added")
                    .check_and_update(robot_sample, index)
            } else {
                self.metric.minimum_human_robot_distance(human_sample, robot_sample) > 0.0
            }
        } else {
            last.check_and_update(robot_sample, index)
        }
    }

    /// Propagate a reuse reset through the sections.
    ///
    /// Each section is trimmed against the new human sample and range; empty
    /// sections are dropped, and propagation stops at (and drops everything
    /// after) the first section that lost barriers.
    pub fn reset(
        &mut self,
        human_sample: &BodySegmentSample,
        trace_index_range: Interval<usize>,
        sample_index: usize,
    ) {
        let mut kept = Vec::with_capacity(self.sections.len());
        for mut section in self.sections.drain(..) {
            let original_len = section.len();
            section.reset(human_sample, trace_index_range, sample_index);
            let truncated = section.len() < original_len;
            if !section.is_empty() {
                kept.push(section);
            }
            if truncated {
                break;
            }
        }
        self.sections = kept;
    }
}
