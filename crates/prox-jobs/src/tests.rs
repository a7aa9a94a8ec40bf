//! Unit tests for prox-jobs.

use std::collections::BTreeMap;

use prox_barrier::UpdatePolicy;
use prox_body::{BodySegmentSample, Mode, ModeTrace, Robot};
use prox_core::{Point, Timestamp};
use prox_history::RobotStateHistory;

use crate::{
    JobAwakeningResult, LookAheadJobFactory, LookAheadJobIdentifier, LookAheadJobPath,
    LookAheadJobRegistry, ReuseEquivalence,
};

fn mode(value: &str) -> Mode {
    Mode::from([("s", value)])
}

fn job_id() -> LookAheadJobIdentifier {
    LookAheadJobIdentifier::new("h0".into(), 0, "r0".into(), 1)
}

/// Human segment `[(0,1,5), (4,0,6)]` with thickness 0.1 — collides with
/// the robot's second segment during endup.
fn colliding_human_sample() -> BodySegmentSample {
    let mut s = BodySegmentSample::empty(0, 0.1);
    s.update(&[Point::new(0.0, 1.0, 5.0)], &[Point::new(4.0, 0.0, 6.0)]);
    s
}

/// Human segment `[(5,1,0), (10,1,0)]` — never collides.
fn distant_human_sample() -> BodySegmentSample {
    let mut s = BodySegmentSample::empty(0, 0.1);
    s.update(&[Point::new(5.0, 1.0, 0.0)], &[Point::new(10.0, 1.0, 0.0)]);
    s
}

fn keypoints(points: [(f64, f64, f64); 3]) -> BTreeMap<String, Vec<Point>> {
    points
        .iter()
        .enumerate()
        .map(|(i, &(x, y, z))| (i.to_string(), vec![Point::new(x, y, z)]))
        .collect()
}

/// The linear-plan robot history: contract, endup, kneedown, fullright,
/// contract, at 1 kHz and 1 ms message spacing.  Final timestamp is 27.
fn linear_plan_history() -> (RobotStateHistory, Timestamp) {
    let robot = Robot::new(
        "r0".into(),
        1000,
        &[
            ("0".to_string(), "1".to_string()),
            ("1".to_string(), "2".to_string()),
        ],
        &[0.1, 0.1],
    )
    .unwrap();
    let history = RobotStateHistory::new(robot);
    let mut time = 0;
    let mut feed = |m: &str, pts: [(f64, f64, f64); 3], t: &mut Timestamp| {
        *t += 1;
        history.acquire(&mode(m), &keypoints(pts), *t).unwrap();
    };
    feed("contract", [(0., 0., 0.), (5., 0., 0.), (10., 0., 0.)], &mut time);
    feed("contract", [(0., 0., 0.), (4., 0., 1.), (9., 0., 0.)], &mut time);
    feed("contract", [(0., 0., 0.), (3., 0., 2.), (8., 0., 0.)], &mut time);
    feed("contract", [(0., 0., 0.), (2., 0., 3.), (7., 0., 0.)], &mut time);
    feed("contract", [(0., 0., 0.), (1., 0., 4.), (6., 0., 0.)], &mut time);
    feed("contract", [(0., 0., 0.), (0., 0., 5.), (5., 0., 0.)], &mut time);
    for tail in [
        (5., 0., 1.),
        (5., 0., 2.),
        (5., 0., 3.),
        (5., 0., 4.),
        (5., 0., 5.),
        (4., 0., 6.),
        (3., 0., 7.),
        (2., 0., 8.),
        (1., 0., 9.),
        (0., 0., 10.),
    ] {
        feed("endup", [(0., 0., 0.), (0., 0., 5.), tail], &mut time);
    }
    for (mid, tail) in [
        ((1., 0., 4.), (1., 0., 9.)),
        ((2., 0., 3.), (2., 0., 8.)),
        ((3., 0., 2.), (3., 0., 7.)),
        ((4., 0., 1.), (4., 0., 6.)),
        ((5., 0., 0.), (5., 0., 5.)),
    ] {
        feed("kneedown", [(0., 0., 0.), mid, tail], &mut time);
    }
    for tail in [
        (6., 0., 4.),
        (7., 0., 3.),
        (8., 0., 2.),
        (9., 0., 1.),
        (10., 0., 0.),
    ] {
        feed("fullright", [(0., 0., 0.), (5., 0., 0.), tail], &mut time);
    }
    feed("contract", [(0., 0., 0.), (5., 0., 0.), (10., 0., 0.)], &mut time);
    (history, time)
}

fn initial_trace(history: &RobotStateHistory, time: Timestamp) -> ModeTrace {
    let mut trace = ModeTrace::new();
    trace.push_back(history.mode_at(time), 1.0);
    trace
}

// ── LookAheadJobPath ──────────────────────────────────────────────────────────

mod path {
    use super::*;

    #[test]
    fn primary_detection() {
        let mut p = LookAheadJobPath::new();
        assert!(p.is_primary());
        p.add(0, 2);
        assert!(p.is_primary());
        p.add(1, 4);
        assert!(!p.is_primary());
    }

    #[test]
    fn remove_le_rebases_positions() {
        let mut p = LookAheadJobPath::new();
        p.add(0, 2).add(1, 4).add(2, 6);
        p.remove_le_than(2);
        assert_eq!(p.len(), 2);
        assert_eq!(p.priority(0), 1);
    }

    #[test]
    fn remove_g_truncates_tail() {
        let mut p = LookAheadJobPath::new();
        p.add(0, 2).add(1, 4).add(2, 6);
        p.remove_g_than(4);
        assert_eq!(p.len(), 2);
        assert_eq!(p.priority(1), 1);
    }

    #[test]
    fn reduce_between_combines_both() {
        let mut p = LookAheadJobPath::new();
        p.add(0, 2).add(1, 4).add(2, 6);
        p.reduce_between(2, 4);
        assert_eq!(p.len(), 1);
        assert_eq!(p.priority(0), 1);
    }
}

// ── LookAheadJobIdentifier ────────────────────────────────────────────────────

mod identifier {
    use super::*;

    #[test]
    fn ordering_is_lexicographic() {
        let a = LookAheadJobIdentifier::new("h0".into(), 0, "r0".into(), 0);
        let b = LookAheadJobIdentifier::new("h0".into(), 0, "r0".into(), 1);
        let c = LookAheadJobIdentifier::new("h0".into(), 1, "r0".into(), 0);
        let d = LookAheadJobIdentifier::new("h1".into(), 0, "r0".into(), 0);
        assert!(a < b && b < c && c < d);
    }
}

// ── LookAheadJobRegistry ──────────────────────────────────────────────────────

mod registry {
    use super::*;

    #[test]
    fn registers_exactly_once() {
        let registry = LookAheadJobRegistry::new();
        let path = LookAheadJobPath::new();
        assert!(registry.try_register(10, &job_id(), &path).unwrap());
        assert!(!registry.try_register(10, &job_id(), &path).unwrap());
        assert!(registry.has_registered(10, &job_id(), &path));
        assert!(!registry.has_registered(11, &job_id(), &path));
    }

    #[test]
    fn registered_ancestor_blocks_descendants() {
        let registry = LookAheadJobRegistry::new();
        let root = LookAheadJobPath::new();
        assert!(registry.try_register(10, &job_id(), &root).unwrap());
        let mut child = LookAheadJobPath::new();
        child.add(1, 3);
        assert!(!registry.try_register(10, &job_id(), &child).unwrap());
    }

    #[test]
    fn sibling_paths_register_independently() {
        let registry = LookAheadJobRegistry::new();
        let mut first = LookAheadJobPath::new();
        first.add(0, 3);
        let mut second = LookAheadJobPath::new();
        second.add(1, 3);
        assert!(registry.try_register(10, &job_id(), &first).unwrap());
        assert!(registry.try_register(10, &job_id(), &second).unwrap());
        assert!(!registry.try_register(10, &job_id(), &second).unwrap());
    }

    #[test]
    fn newer_timestamps_open_new_entries() {
        let registry = LookAheadJobRegistry::new();
        let path = LookAheadJobPath::new();
        assert!(registry.try_register(10, &job_id(), &path).unwrap());
        assert!(registry.try_register(11, &job_id(), &path).unwrap());
        // A never-seen timestamp older than the newest entry is an error.
        assert!(registry.try_register(9, &job_id(), &path).is_err());
    }
}

// ── Job scanning and branching ────────────────────────────────────────────────

mod scanning {
    use super::*;

    #[test]
    fn no_collision_in_initial_mode() {
        let (history, time) = linear_plan_history();
        let factory = LookAheadJobFactory::discard();
        let mut job = factory
            .create_new(
                job_id(),
                time,
                colliding_human_sample(),
                initial_trace(&history, time),
                LookAheadJobPath::new(),
            )
            .unwrap();
        assert_eq!(job.earliest_collision_index(&history).unwrap(), None);
    }

    #[test]
    fn successor_finds_collision_in_endup() {
        let (history, time) = linear_plan_history();
        let factory = LookAheadJobFactory::discard();
        let job = factory
            .create_new(
                job_id(),
                time,
                colliding_human_sample(),
                initial_trace(&history, time),
                LookAheadJobPath::new(),
            )
            .unwrap();
        let successors = factory.create_next(&job, &history).unwrap();
        assert_eq!(successors.len(), 1);
        let mut successor = successors.into_iter().next().unwrap();
        assert_eq!(successor.prediction_trace().ending_mode(), &mode("endup"));
        assert_eq!(successor.prediction_trace().likelihood(), 1.0);
        assert_eq!(successor.earliest_collision_index(&history).unwrap(), Some(5));
    }

    #[test]
    fn distant_human_never_collides() {
        let (history, time) = linear_plan_history();
        let factory = LookAheadJobFactory::discard();
        let mut job = factory
            .create_new(
                job_id(),
                time,
                distant_human_sample(),
                initial_trace(&history, time),
                LookAheadJobPath::new(),
            )
            .unwrap();
        // Walk the whole linear plan until the trace loops.
        let mut steps = 0;
        loop {
            assert_eq!(job.earliest_collision_index(&history).unwrap(), None);
            let successors = factory.create_next(&job, &history).unwrap();
            if successors.is_empty() {
                break;
            }
            assert_eq!(successors.len(), 1);
            job = successors.into_iter().next().unwrap();
            steps += 1;
            assert!(steps < 10, "linear plan should loop within a handful of modes");
        }
        // contract → endup → kneedown → fullright → contract: loop closed.
        assert_eq!(steps, 4);
        assert!(job.prediction_trace().has_looped());
    }

    #[test]
    fn reuse_variant_matches_discard_scan() {
        let (history, time) = linear_plan_history();
        let factory =
            LookAheadJobFactory::reuse(UpdatePolicy::KeepOne, ReuseEquivalence::Strong);
        let job = factory
            .create_new(
                job_id(),
                time,
                colliding_human_sample(),
                initial_trace(&history, time),
                LookAheadJobPath::new(),
            )
            .unwrap();
        let mut successor = factory
            .create_next(&job, &history)
            .unwrap()
            .into_iter()
            .next()
            .unwrap();
        assert_eq!(successor.earliest_collision_index(&history).unwrap(), Some(5));
        assert!(successor.barrier_sequence().unwrap().reaches_collision());
    }

    #[test]
    fn reuse_create_new_registers_the_path() {
        let (_history, time) = linear_plan_history();
        let factory =
            LookAheadJobFactory::reuse(UpdatePolicy::KeepOne, ReuseEquivalence::Strong);
        let trace = {
            let mut t = ModeTrace::new();
            t.push_back(mode("contract"), 1.0);
            t
        };
        assert!(
            factory
                .create_new(
                    job_id(),
                    time,
                    colliding_human_sample(),
                    trace.clone(),
                    LookAheadJobPath::new(),
                )
                .is_ok()
        );
        assert!(factory.has_registered(time, &job_id(), &LookAheadJobPath::new()));
        // The same path cannot be created twice.
        assert!(
            factory
                .create_new(
                    job_id(),
                    time,
                    colliding_human_sample(),
                    trace,
                    LookAheadJobPath::new(),
                )
                .is_err()
        );
    }
}

// ── Awakening ─────────────────────────────────────────────────────────────────

mod awakening {
    use super::*;

    #[test]
    fn same_time_is_unaffected() {
        let (history, time) = linear_plan_history();
        let factory =
            LookAheadJobFactory::reuse(UpdatePolicy::KeepOne, ReuseEquivalence::Strong);
        let job = factory
            .create_new(
                job_id(),
                time,
                colliding_human_sample(),
                initial_trace(&history, time),
                LookAheadJobPath::new(),
            )
            .unwrap();
        let awoken = factory
            .awaken(&job, time, &colliding_human_sample(), &history)
            .unwrap();
        assert_eq!(awoken.len(), 1);
        let (renewed, result) = &awoken[0];
        assert_eq!(*result, JobAwakeningResult::Unaffected);
        assert_eq!(renewed.initial_time(), job.initial_time());
        assert_eq!(renewed.prediction_trace(), job.prediction_trace());
        assert_eq!(
            renewed.barrier_sequence().unwrap().num_barriers(),
            job.barrier_sequence().unwrap().num_barriers()
        );
    }

    #[test]
    fn empty_human_sample_is_uncomputable() {
        let (history, time) = linear_plan_history();
        history
            .acquire(
                &mode("contract"),
                &keypoints([(0., 0., 0.), (5., 0., 0.), (10., 0., 0.)]),
                time + 1,
            )
            .unwrap();
        let factory = LookAheadJobFactory::discard();
        let job = factory
            .create_new(
                job_id(),
                time,
                colliding_human_sample(),
                initial_trace(&history, time),
                LookAheadJobPath::new(),
            )
            .unwrap();
        let empty = BodySegmentSample::empty(0, 0.1);
        let awoken = factory.awaken(&job, time + 1, &empty, &history).unwrap();
        assert_eq!(awoken.len(), 1);
        assert_eq!(awoken[0].1, JobAwakeningResult::Uncomputable);
        assert_eq!(awoken[0].0.initial_time(), time + 1);
        // The stale human sample is kept for reference.
        assert_eq!(awoken[0].0.human_sample(), job.human_sample());
    }

    #[test]
    fn empty_human_sample_keeps_non_primary_alive() {
        let (history, time) = linear_plan_history();
        history
            .acquire(
                &mode("contract"),
                &keypoints([(0., 0., 0.), (5., 0., 0.), (10., 0., 0.)]),
                time + 1,
            )
            .unwrap();
        let factory = LookAheadJobFactory::discard();
        let mut path = LookAheadJobPath::new();
        path.add(1, 1);
        let job = factory
            .create_new(
                job_id(),
                time,
                colliding_human_sample(),
                initial_trace(&history, time),
                path,
            )
            .unwrap();
        // An empty sample parks the job again even on a non-primary branch.
        let empty = BodySegmentSample::empty(0, 0.1);
        let awoken = factory.awaken(&job, time + 1, &empty, &history).unwrap();
        assert_eq!(awoken.len(), 1);
        assert_eq!(awoken[0].1, JobAwakeningResult::Uncomputable);
        assert_eq!(awoken[0].0.path(), job.path());
        assert_eq!(awoken[0].0.prediction_trace(), job.prediction_trace());
    }

    #[test]
    fn discard_primary_restarts_from_current_mode() {
        let (history, time) = linear_plan_history();
        history
            .acquire(
                &mode("contract"),
                &keypoints([(0., 0., 0.), (5., 0., 0.), (10., 0., 0.)]),
                time + 1,
            )
            .unwrap();
        let factory = LookAheadJobFactory::discard();
        let job = factory
            .create_new(
                job_id(),
                time,
                colliding_human_sample(),
                initial_trace(&history, time),
                LookAheadJobPath::new(),
            )
            .unwrap();
        let awoken = factory
            .awaken(&job, time + 1, &colliding_human_sample(), &history)
            .unwrap();
        assert_eq!(awoken.len(), 1);
        let (renewed, result) = &awoken[0];
        assert_eq!(*result, JobAwakeningResult::Different);
        assert_eq!(renewed.initial_time(), time + 1);
        assert_eq!(renewed.prediction_trace().len(), 1);
        assert_eq!(renewed.prediction_trace().starting_mode(), &mode("contract"));
    }

    #[test]
    fn discard_non_primary_is_dropped() {
        let (history, time) = linear_plan_history();
        history
            .acquire(
                &mode("contract"),
                &keypoints([(0., 0., 0.), (5., 0., 0.), (10., 0., 0.)]),
                time + 1,
            )
            .unwrap();
        let factory = LookAheadJobFactory::discard();
        let mut path = LookAheadJobPath::new();
        path.add(1, 1);
        let job = factory
            .create_new(
                job_id(),
                time,
                colliding_human_sample(),
                initial_trace(&history, time),
                path,
            )
            .unwrap();
        let awoken = factory
            .awaken(&job, time + 1, &colliding_human_sample(), &history)
            .unwrap();
        assert!(awoken.is_empty());
    }

    #[test]
    fn reuse_with_empty_cache_restarts() {
        let (history, time) = linear_plan_history();
        history
            .acquire(
                &mode("contract"),
                &keypoints([(0., 0., 0.), (5., 0., 0.), (10., 0., 0.)]),
                time + 1,
            )
            .unwrap();
        let factory =
            LookAheadJobFactory::reuse(UpdatePolicy::KeepOne, ReuseEquivalence::Strong);
        let job = factory
            .create_new(
                job_id(),
                time,
                colliding_human_sample(),
                initial_trace(&history, time),
                LookAheadJobPath::new(),
            )
            .unwrap();
        let awoken = factory
            .awaken(&job, time + 1, &colliding_human_sample(), &history)
            .unwrap();
        assert_eq!(awoken.len(), 1);
        let (renewed, result) = &awoken[0];
        assert_eq!(*result, JobAwakeningResult::Different);
        assert_eq!(renewed.initial_time(), time + 1);
        assert_eq!(renewed.snapshot_time(), time + 1);
        assert_eq!(renewed.prediction_trace().len(), 1);
    }
}
