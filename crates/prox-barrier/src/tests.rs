//! Unit tests for prox-barrier.

use prox_body::BodySegmentSample;
use prox_core::{Interval, Point};

use crate::{
    BarrierSequenceSection, MinimumDistanceBarrierSequence, SectionMetric, TraceSampleIndex,
    TraceSampleRange, UpdatePolicy,
};

fn idx(trace: usize, sample: usize) -> TraceSampleIndex {
    TraceSampleIndex::new(trace, sample)
}

/// A segment sample along `[(0,y,0), (4,y,0)]` with thickness 0.5.
fn horizontal_sample(y: f64) -> BodySegmentSample {
    let mut s = BodySegmentSample::empty(0, 0.5);
    s.update(&[Point::new(0.0, y, 0.0)], &[Point::new(4.0, y, 0.0)]);
    s
}

// ── TraceSampleRange ──────────────────────────────────────────────────────────

mod range {
    use super::*;

    #[test]
    fn singleton_and_growth() {
        let mut r = TraceSampleRange::new(idx(2, 3));
        assert_eq!(r.maximum_trace_index(), 2);
        assert_eq!(r.maximum_sample_index(), 3);
        r.update(5);
        assert_eq!(r.maximum_sample_index(), 5);
        r.increase_trace_index();
        assert_eq!(r.maximum_trace_index(), 3);
        assert_eq!(r.maximum_sample_index(), 0);
        assert_eq!(r.upper_bound(2), 5);
        assert_eq!(r.len(), 2);
    }

    #[test]
    fn scale_down_within_initial() {
        let mut r = TraceSampleRange::new(idx(2, 3));
        r.increase_trace_index();
        r.scale_down_trace_of(1);
        assert_eq!(r.initial(), idx(1, 3));
        assert_eq!(r.maximum_trace_index(), 2);
    }

    #[test]
    fn scale_down_through_initial_drops_slots() {
        let mut r = TraceSampleRange::new(idx(1, 3));
        r.increase_trace_index(); // covers trace 1..=2
        r.scale_down_trace_of(2);
        assert_eq!(r.initial(), idx(0, 0));
        assert_eq!(r.len(), 1);
        assert_eq!(r.maximum_trace_index(), 0);
    }

    #[test]
    fn scale_down_past_maximum_empties() {
        let mut r = TraceSampleRange::new(idx(1, 3));
        r.scale_down_trace_of(5);
        assert!(r.is_empty());
    }

    #[test]
    fn trim_down() {
        let mut r = TraceSampleRange::new(idx(0, 4));
        r.increase_trace_index();
        r.increase_trace_index(); // covers trace 0..=2
        r.trim_down_trace_to(1);
        assert_eq!(r.maximum_trace_index(), 1);
        r.trim_down_trace_to(5);
        assert_eq!(r.maximum_trace_index(), 1);
    }
}

// ── BarrierSequenceSection ────────────────────────────────────────────────────

mod section {
    use super::*;

    /// Human at y=5 vs robots at various y: capsule distance = (5-y) - 1.
    fn scanned_section() -> BarrierSequenceSection {
        let mut s = BarrierSequenceSection::new(SectionMetric::Capsule, horizontal_sample(5.0));
        assert!(s.check_and_update(&horizontal_sample(0.0), idx(0, 0))); // d=4
        assert!(s.check_and_update(&horizontal_sample(0.0), idx(0, 1))); // extend
        assert!(s.check_and_update(&horizontal_sample(2.0), idx(0, 2))); // d=2
        s
    }

    #[test]
    fn distances_are_strictly_decreasing() {
        let s = scanned_section();
        assert_eq!(s.len(), 2);
        assert_eq!(s.barrier(0).minimum_distance(), 4.0);
        assert_eq!(s.barrier(0).range().maximum_sample_index(), 1);
        assert_eq!(s.barrier(1).minimum_distance(), 2.0);
        assert_eq!(s.current_minimum_distance(), 2.0);
    }

    #[test]
    fn empty_section_has_infinite_distance() {
        let s = BarrierSequenceSection::new(SectionMetric::Capsule, horizontal_sample(5.0));
        assert!(s.current_minimum_distance().is_infinite());
        assert!(!s.reaches_collision());
    }

    #[test]
    fn collision_closes_the_section() {
        let mut s = scanned_section();
        assert!(!s.check_and_update(&horizontal_sample(4.0), idx(0, 3))); // d=0
        assert!(s.reaches_collision());
        let len = s.len();
        // Further checks are ignored once collision is reached.
        assert!(!s.check_and_update(&horizontal_sample(0.0), idx(0, 4)));
        assert_eq!(s.len(), len);
    }

    #[test]
    fn remove_first_barrier_drops_the_oldest() {
        let mut s = scanned_section(); // distances [4, 2]
        s.remove_first_barrier();
        assert_eq!(s.len(), 1);
        assert_eq!(s.barrier(0).minimum_distance(), 2.0);
        assert_eq!(s.current_minimum_distance(), 2.0);
        s.remove_first_barrier();
        assert!(s.is_empty());
        // Removing from an already-empty section leaves it empty.
        s.remove_first_barrier();
        assert!(s.is_empty());
    }

    #[test]
    fn range_extends_across_trace_indices() {
        let mut s = scanned_section();
        assert!(s.check_and_update(&horizontal_sample(2.0), idx(1, 0)));
        assert_eq!(s.last_barrier().unwrap().range().maximum_trace_index(), 1);
        assert_eq!(s.last_upper_trace_index(), 1);
    }

    #[test]
    fn sphere_metric_is_coarser() {
        // Under bounding spheres the radii include half the segment length,
        // so the same configuration reads as much closer.
        let capsule = SectionMetric::Capsule
            .minimum_human_robot_distance(&horizontal_sample(5.0), &horizontal_sample(0.0));
        let sphere = SectionMetric::Sphere
            .minimum_human_robot_distance(&horizontal_sample(5.0), &horizontal_sample(0.0));
        assert!(sphere <= capsule);
    }

    #[test]
    fn reuse_element_binary_search() {
        let s = scanned_section(); // distances [4, 2]
        // Displacement 1: barrier at distance 2 still holds.
        assert_eq!(s.reuse_element(&horizontal_sample(6.0)), Some(1));
        // Displacement 3: only the first barrier holds.
        assert_eq!(s.reuse_element(&horizontal_sample(8.0)), Some(0));
        // Displacement 5 invalidates everything.
        assert_eq!(s.reuse_element(&horizontal_sample(10.0)), None);
    }

    #[test]
    fn reset_drops_invalidated_and_past_barriers() {
        let mut s = scanned_section();
        assert!(!s.check_and_update(&horizontal_sample(4.0), idx(0, 3))); // collision at 0
        // Same human: the zero barrier cannot be reused; barriers before
        // sample 2 are in the past.
        s.reset(&horizontal_sample(5.0), Interval::new(0, 10), 2);
        assert_eq!(s.len(), 1);
        assert_eq!(s.barrier(0).minimum_distance(), 2.0);
    }

    #[test]
    fn reset_scales_trace_indices() {
        let mut s = BarrierSequenceSection::new(SectionMetric::Capsule, horizontal_sample(5.0));
        assert!(s.check_and_update(&horizontal_sample(0.0), idx(1, 0)));
        assert!(s.check_and_update(&horizontal_sample(2.0), idx(2, 0)));
        s.reset(&horizontal_sample(5.0), Interval::new(1, 2), 0);
        assert_eq!(s.barrier(0).range().initial().trace, 0);
        assert_eq!(s.last_upper_trace_index(), 1);
    }

    #[test]
    fn reset_to_empty_when_nothing_reusable() {
        let mut s = scanned_section();
        s.reset(&horizontal_sample(10.0), Interval::new(0, 10), 0);
        assert!(s.is_empty());
    }
}

// ── MinimumDistanceBarrierSequence ────────────────────────────────────────────

mod sequence {
    use super::*;

    fn sequence(policy: UpdatePolicy) -> MinimumDistanceBarrierSequence {
        MinimumDistanceBarrierSequence::new(SectionMetric::Capsule, policy)
    }

    #[test]
    fn keep_one_never_adds_sections() {
        let mut seq = sequence(UpdatePolicy::KeepOne);
        assert!(seq.check_and_update(&horizontal_sample(5.0), &horizontal_sample(0.0), idx(0, 0)));
        // Different human sample: still a single section.
        assert!(seq.check_and_update(&horizontal_sample(5.5), &horizontal_sample(0.0), idx(0, 1)));
        assert_eq!(seq.num_sections(), 1);
    }

    #[test]
    fn add_when_different_opens_section_per_human() {
        let mut seq = sequence(UpdatePolicy::AddWhenDifferent);
        assert!(seq.check_and_update(&horizontal_sample(5.0), &horizontal_sample(0.0), idx(0, 0)));
        assert!(seq.check_and_update(&horizontal_sample(5.5), &horizontal_sample(0.0), idx(0, 1)));
        assert_eq!(seq.num_sections(), 2);
        // Same human as the last section: no new section.
        assert!(seq.check_and_update(&horizontal_sample(5.5), &horizontal_sample(1.0), idx(0, 2)));
        assert_eq!(seq.num_sections(), 2);
    }

    #[test]
    fn add_when_necessary_retries_on_collision() {
        let mut seq = sequence(UpdatePolicy::AddWhenNecessary);
        assert!(seq.check_and_update(&horizontal_sample(5.0), &horizontal_sample(0.0), idx(0, 0)));
        // Robot at y=4 collides with the y=5 reference but not with y=6:
        // the collision barrier is retracted and a new section opened.
        assert!(seq.check_and_update(&horizontal_sample(6.0), &horizontal_sample(4.0), idx(0, 1)));
        assert_eq!(seq.num_sections(), 2);
        assert!(!seq.reaches_collision());
    }

    #[test]
    fn collision_reported_through_sequence() {
        let mut seq = sequence(UpdatePolicy::AddWhenDifferent);
        assert!(!seq.check_and_update(&horizontal_sample(5.0), &horizontal_sample(4.0), idx(0, 0)));
        assert!(seq.reaches_collision());
        assert_eq!(seq.num_barriers(), 1);
    }

    #[test]
    fn reset_propagation_stops_at_truncated_section() {
        let mut seq = sequence(UpdatePolicy::AddWhenDifferent);
        assert!(seq.check_and_update(&horizontal_sample(5.0), &horizontal_sample(0.0), idx(0, 0)));
        assert!(seq.check_and_update(&horizontal_sample(5.5), &horizontal_sample(2.0), idx(0, 1)));
        assert_eq!(seq.num_sections(), 2);
        // A far-away human invalidates the first section entirely; the
        // second is dropped by propagation.
        seq.reset(&horizontal_sample(20.0), Interval::new(0, 10), 0);
        assert!(seq.is_empty());
    }

    #[test]
    fn reset_keeps_fully_valid_prefix() {
        let mut seq = sequence(UpdatePolicy::KeepOne);
        assert!(seq.check_and_update(&horizontal_sample(5.0), &horizontal_sample(0.0), idx(0, 0)));
        // Tiny displacement: the single 4.0 barrier survives untouched.
        seq.reset(&horizontal_sample(5.1), Interval::new(0, 10), 0);
        assert_eq!(seq.num_sections(), 1);
        assert_eq!(seq.num_barriers(), 1);
    }
}
