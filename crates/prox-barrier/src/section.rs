//! Barrier-sequence sections and their distance metrics.

use std::collections::VecDeque;

use prox_body::{BodySegmentSample, segment_sample_distance, sphere_capsule_distance};
use prox_core::Interval;
use prox_core::geometry::point_segment_distance;

use crate::barrier::MinimumDistanceBarrier;
use crate::range::{TraceSampleIndex, TraceSampleRange};

// ── SectionMetric ─────────────────────────────────────────────────────────────

/// The distance metric a section uses: bounding spheres (cheap, coarse) or
/// capsules (tighter).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SectionMetric {
    Sphere,
    Capsule,
}

impl SectionMetric {
    /// How far `other` can at most be displaced with respect to the section's
    /// `reference` human sample, clamped to zero.
    pub fn maximum_human_human_distance(
        self,
        reference: &BodySegmentSample,
        other: &BodySegmentSample,
    ) -> f64 {
        match self {
            SectionMetric::Sphere => {
                let r = reference.bounding_sphere();
                let o = other.bounding_sphere();
                (r.centre.distance(o.centre) + o.radius - r.radius).max(0.0)
            }
            SectionMetric::Capsule => {
                let head = point_segment_distance(
                    other.head_centre(),
                    reference.head_centre(),
                    reference.tail_centre(),
                );
                let tail = point_segment_distance(
                    other.tail_centre(),
                    reference.head_centre(),
                    reference.tail_centre(),
                );
                (head.max(tail) + other.thickness() + other.error()
                    - reference.thickness()
                    - reference.error())
                .max(0.0)
            }
        }
    }

    /// Minimum distance between a human and a robot sample under this
    /// metric, clamped to zero.
    pub fn minimum_human_robot_distance(
        self,
        human: &BodySegmentSample,
        robot: &BodySegmentSample,
    ) -> f64 {
        match self {
            SectionMetric::Sphere => sphere_capsule_distance(human.bounding_sphere(), robot),
            SectionMetric::Capsule => {
                let distance = segment_sample_distance(human, robot);
                let epsilon = human.error() + human.thickness() + robot.error() + robot.thickness();
                if distance <= epsilon { 0.0 } else { distance - epsilon }
            }
        }
    }
}

// ── BarrierSequenceSection ────────────────────────────────────────────────────

/// The barriers recorded against one reference human sample.
///
/// Barriers are appended with strictly decreasing `minimum_distance`; a
/// check that does not reduce the distance extends the last barrier's range
/// instead.
#[derive(Clone, Debug)]
pub struct BarrierSequenceSection {
    metric: SectionMetric,
    human_sample: BodySegmentSample,
    barriers: VecDeque<MinimumDistanceBarrier>,
}

impl BarrierSequenceSection {
    pub fn new(metric: SectionMetric, human_sample: BodySegmentSample) -> Self {
        Self { metric, human_sample, barriers: VecDeque::new() }
    }

    pub fn metric(&self) -> SectionMetric {
        self.metric
    }

    /// The reference human sample the barriers were computed against.
    pub fn human_sample(&self) -> &BodySegmentSample {
        &self.human_sample
    }

    /// The barrier at `idx`.  Panics if out of range.
    pub fn barrier(&self, idx: usize) -> &MinimumDistanceBarrier {
        &self.barriers[idx]
    }

    pub fn last_barrier(&self) -> Option<&MinimumDistanceBarrier> {
        self.barriers.back()
    }

    pub fn len(&self) -> usize {
        self.barriers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.barriers.is_empty()
    }

    pub fn add_barrier(&mut self, minimum_distance: f64, range: TraceSampleRange) {
        self.barriers
            .push_back(MinimumDistanceBarrier::new(minimum_distance, range));
    }

    /// Remove the first barrier (used once it refers only to the past).
    pub fn remove_first_barrier(&mut self) {
        self.barriers.pop_front();
    }

    /// Remove the last barrier (used when a zero-distance barrier should
    /// rather open a new section).
    pub fn remove_last_barrier(&mut self) {
        self.barriers.pop_back();
    }

    /// The upper trace index of the last barrier, 0 when empty.
    pub fn last_upper_trace_index(&self) -> usize {
        self.barriers
            .back()
            .map_or(0, |b| b.range().maximum_trace_index())
    }

    /// Whether the section already recorded a collision.
    pub fn reaches_collision(&self) -> bool {
        self.barriers.back().is_some_and(MinimumDistanceBarrier::is_collision)
    }

    /// The minimum distance of the latest barrier; infinity when empty.
    pub fn current_minimum_distance(&self) -> f64 {
        self.barriers
            .back()
            .map_or(f64::INFINITY, MinimumDistanceBarrier::minimum_distance)
    }

    /// Check the reference human sample against `robot_sample` at `index`,
    /// appending a new barrier when the distance shrank or extending the
    /// last barrier's range otherwise.
    ///
    /// Returns false iff a collision is found.  Once a collision barrier
    /// exists, later checks do nothing.
    pub fn check_and_update(
        &mut self,
        robot_sample: &BodySegmentSample,
        index: TraceSampleIndex,
    ) -> bool {
        if self.reaches_collision() {
            return false;
        }
        let distance = self
            .metric
            .minimum_human_robot_distance(&self.human_sample, robot_sample);
        if self.is_empty() || distance < self.current_minimum_distance() {
            self.add_barrier(distance, TraceSampleRange::new(index));
        } else if let Some(last) = self.barriers.back_mut() {
            last.update_with(index);
        }
        distance > 0.0
    }

    /// Whether `human_sample` and `robot_sample` collide under this
    /// section's metric, without updating anything.
    pub fn are_colliding(
        &self,
        human_sample: &BodySegmentSample,
        robot_sample: &BodySegmentSample,
    ) -> bool {
        self.metric
            .minimum_human_robot_distance(human_sample, robot_sample)
            == 0.0
    }

    /// The latest barrier that still holds for `other_human_sample`, found
    /// by binary search over the decreasing distances.  `None` means even
    /// the first barrier is invalidated and the scan restarts from scratch.
    pub fn reuse_element(&self, other_human_sample: &BodySegmentSample) -> Option<usize> {
        if self.is_empty() {
            return None;
        }
        let displacement = self
            .metric
            .maximum_human_human_distance(&self.human_sample, other_human_sample);
        let mut lower = 0;
        let mut upper = self.barriers.len() - 1;
        if displacement >= self.barriers[lower].minimum_distance() {
            return None;
        }
        if displacement < self.barriers[upper].minimum_distance() {
            return Some(upper);
        }
        let mut result = (upper + lower) / 2;
        while upper > lower + 1 {
            if displacement >= self.barriers[result].minimum_distance() {
                upper = result;
            } else {
                lower = result;
            }
            result = (upper + lower) / 2;
        }
        Some(result)
    }

    /// Trim the section to what can be reused when resuming with
    /// `human_sample` from `sample_index` over trace indices
    /// `trace_index_range`.
    pub fn reset(
        &mut self,
        human_sample: &BodySegmentSample,
        trace_index_range: Interval<usize>,
        sample_index: usize,
    ) {
        self.trim_down_trace_index_ranges_to(trace_index_range.upper());
        match self.reuse_element(human_sample) {
            Some(reuse) => {
                while self.barriers.len() > reuse + 1 {
                    self.barriers.pop_back();
                }
                while self.barriers.front().is_some_and(|b| {
                    b.range().maximum_trace_index() < trace_index_range.lower()
                        || (b.range().maximum_trace_index() == trace_index_range.lower()
                            && b.range().maximum_sample_index() < sample_index)
                }) {
                    self.barriers.pop_front();
                }
                self.scale_down_trace_index_ranges_of(trace_index_range.lower());
            }
            None => self.barriers.clear(),
        }
    }

    pub fn clear(&mut self) {
        self.barriers.clear();
    }

    fn trim_down_trace_index_ranges_to(&mut self, trace_index_bound: usize) {
        loop {
            let Some(last) = self.barriers.back() else { return };
            if last.range().maximum_trace_index() <= trace_index_bound {
                return;
            }
            if last.range().initial().trace <= trace_index_bound {
                if let Some(last) = self.barriers.back_mut() {
                    last.trim_down_range_to(trace_index_bound);
                }
                return;
            }
            self.barriers.pop_back();
        }
    }

    fn scale_down_trace_index_ranges_of(&mut self, amount: usize) {
        if amount > 0 {
            for barrier in &mut self.barriers {
                barrier.scale_down_range_of(amount);
            }
        }
    }
}
