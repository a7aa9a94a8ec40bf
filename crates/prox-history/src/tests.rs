//! Unit tests for prox-history.

use std::collections::BTreeMap;

use prox_body::{Human, Mode, Robot};
use prox_core::{Interval, Point, Timestamp};

use crate::{HumanStateHistory, RobotStateHistory};

fn mode(value: &str) -> Mode {
    Mode::from([("s", value)])
}

fn human() -> Human {
    Human::new(
        "h0".into(),
        &[("0".to_string(), "1".to_string())],
        &[0.1],
    )
    .unwrap()
}

/// The two-segment, 1 kHz robot used throughout the runtime scenarios.
fn robot() -> Robot {
    Robot::new(
        "r0".into(),
        1000,
        &[
            ("0".to_string(), "1".to_string()),
            ("1".to_string(), "2".to_string()),
        ],
        &[0.1, 0.1],
    )
    .unwrap()
}

fn keypoints(points: [(f64, f64, f64); 3]) -> BTreeMap<String, Vec<Point>> {
    points
        .iter()
        .enumerate()
        .map(|(i, &(x, y, z))| (i.to_string(), vec![Point::new(x, y, z)]))
        .collect()
}

/// Feed the linear-plan sequence: contract ×6, endup ×10, kneedown ×5,
/// fullright ×5, then contract again, at 1 ms spacing starting from t=1.
/// Returns the history and the final timestamp.
fn linear_plan_history() -> (RobotStateHistory, Timestamp) {
    let history = RobotStateHistory::new(robot());
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

// ── HumanStateHistory ─────────────────────────────────────────────────────────

mod human_history {
    use super::*;

    fn observation(x: f64) -> BTreeMap<String, Vec<Point>> {
        [
            ("0".to_string(), vec![Point::new(x, 0.0, 0.0)]),
            ("1".to_string(), vec![Point::new(x + 1.0, 0.0, 0.0)]),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn latest_within_picks_floor_entry() {
        let mut h = HumanStateHistory::new(human());
        h.acquire(&observation(0.0), 5);
        h.acquire(&observation(1.0), 10);
        assert_eq!(h.latest_within(7).unwrap().timestamp(), 5);
        assert_eq!(h.latest_within(10).unwrap().timestamp(), 10);
        assert!(h.latest_within(4).is_err());
    }

    #[test]
    fn has_instances_within() {
        let mut h = HumanStateHistory::new(human());
        assert!(!h.has_instances_within(100));
        h.acquire(&observation(0.0), 5);
        assert!(!h.has_instances_within(4));
        assert!(h.has_instances_within(5));
    }

    #[test]
    fn instance_distance_and_number() {
        let mut h = HumanStateHistory::new(human());
        h.acquire(&observation(0.0), 5);
        h.acquire(&observation(1.0), 8);
        h.acquire(&observation(2.0), 10);
        assert_eq!(h.instance_number(8).unwrap(), 1);
        assert_eq!(h.instance_distance(5, 10).unwrap(), 2);
        assert!(h.instance_distance(5, 9).is_err());
    }

    #[test]
    fn purge_drops_strictly_older() {
        let mut h = HumanStateHistory::new(human());
        h.acquire(&observation(0.0), 5);
        h.acquire(&observation(1.0), 10);
        h.purge_older_than(10);
        assert_eq!(h.len(), 1);
        assert_eq!(h.latest_timestamp(), Some(10));
    }

    #[test]
    fn missing_keypoints_yield_empty_samples() {
        let mut h = HumanStateHistory::new(human());
        h.acquire(&BTreeMap::new(), 1);
        assert!(h.at(0).samples()[0].is_empty());
    }
}

// ── RobotStateHistory ─────────────────────────────────────────────────────────

mod robot_history {
    use super::*;

    #[test]
    fn latest_time_and_mode() {
        let (history, time) = linear_plan_history();
        assert_eq!(history.latest_time(), time);
        assert_eq!(history.latest_mode(), mode("contract"));
    }

    #[test]
    fn mode_at_resolves_presences() {
        let (history, _) = linear_plan_history();
        assert_eq!(history.mode_at(3), mode("contract"));
        assert_eq!(history.mode_at(10), mode("endup"));
        assert_eq!(history.mode_at(20), mode("kneedown"));
        assert_eq!(history.mode_at(25), mode("fullright"));
        // Past the last exit the current mode applies.
        assert_eq!(history.mode_at(1000), mode("contract"));
    }

    #[test]
    fn sample_counts_per_mode() {
        let (history, time) = linear_plan_history();
        let snapshot = history.snapshot_at(time);
        assert_eq!(snapshot.maximum_number_of_samples(&mode("contract")).unwrap(), 6);
        assert_eq!(snapshot.maximum_number_of_samples(&mode("endup")).unwrap(), 10);
        assert_eq!(snapshot.maximum_number_of_samples(&mode("kneedown")).unwrap(), 5);
        assert_eq!(snapshot.maximum_number_of_samples(&mode("fullright")).unwrap(), 5);
    }

    #[test]
    fn trace_grows_on_mode_change_only() {
        let (history, time) = linear_plan_history();
        let trace = history.snapshot_at(time).mode_trace();
        assert_eq!(trace.len(), 4);
        assert_eq!(trace.starting_mode(), &mode("contract"));
        assert_eq!(trace.ending_mode(), &mode("fullright"));
    }

    #[test]
    fn snapshot_is_fixed_at_its_time() {
        let (history, _) = linear_plan_history();
        let snapshot = history.snapshot_at(16);
        assert_eq!(snapshot.mode_trace().len(), 1);
        // endup is only flushed at t=17.
        assert!(snapshot.samples(&mode("endup")).is_err());
        assert!(snapshot.samples(&mode("contract")).is_ok());
    }

    #[test]
    fn range_of_num_samples() {
        let (history, time) = linear_plan_history();
        let snapshot = history.snapshot_at(time);
        assert_eq!(snapshot.range_of_num_samples_in(&mode("contract")), Interval::new(6, 6));
        assert_eq!(snapshot.range_of_num_samples_in(&mode("endup")), Interval::new(10, 10));
        // No completed presence → empty range.
        assert_eq!(snapshot.range_of_num_samples_in(&mode("unseen")), Interval::new(0, 0));
        assert_eq!(
            snapshot.range_of_num_samples_between(&mode("contract"), &mode("endup")),
            Interval::new(6, 6)
        );
        assert_eq!(
            snapshot.range_of_num_samples_between(&mode("contract"), &mode("kneedown")),
            Interval::new(0, 0)
        );
    }

    #[test]
    fn presence_queries() {
        let (history, time) = linear_plan_history();
        let snapshot = history.snapshot_at(time);
        let contract_presences = snapshot.presences_in(&mode("contract"));
        assert_eq!(contract_presences.len(), 1);
        assert_eq!(contract_presences[0].from(), 1);
        assert_eq!(contract_presences[0].to(), 7);
        assert_eq!(contract_presences[0].exit_destination(), &mode("endup"));
        // Exiting into contract: the initial empty-mode presence plus the
        // fullright presence.
        assert_eq!(snapshot.presences_exiting_into(&mode("contract")).len(), 2);
    }

    #[test]
    fn sample_index_arithmetic() {
        let (history, time) = linear_plan_history();
        let snapshot = history.snapshot_at(time);
        // The robot re-entered contract at t=27 == time.
        assert_eq!(snapshot.sample_index(&mode("contract"), time).unwrap(), 0);
        assert_eq!(snapshot.checked_sample_index(&mode("contract"), time).unwrap(), 0);
        // 13 ms past re-entry at 1 kHz → index 13, beyond the 6 stored.
        assert!(snapshot.checked_sample_index(&mode("contract"), time + 13).is_err());
    }

    #[test]
    fn can_look_ahead_only_with_prior_presence() {
        let (history, time) = linear_plan_history();
        // fullright has no completed prior presence at t=26.
        assert!(!history.snapshot_at(time - 1).can_look_ahead(time - 1));
        // contract completed a presence before its re-entry at t=27.
        assert!(history.snapshot_at(time).can_look_ahead(time));
        // A time beyond the latest acquisition is not usable.
        assert!(!history.snapshot_at(time).can_look_ahead(time + 1));
    }

    #[test]
    fn gap_padding_duplicates_last_sample() {
        let history = RobotStateHistory::new(robot());
        for t in 1..=3 {
            history
                .acquire(
                    &mode("a"),
                    &keypoints([(0., 0., 0.), (5., 0., 0.), (10., 0., 0.)]),
                    t,
                )
                .unwrap();
        }
        // Jump to t=10: slots 3..8 are padded with copies of slot 2.
        history
            .acquire(&mode("b"), &keypoints([(0., 0., 0.), (5., 0., 0.), (9., 0., 0.)]), 10)
            .unwrap();
        let snapshot = history.snapshot_at(10);
        assert_eq!(snapshot.maximum_number_of_samples(&mode("a")).unwrap(), 10);
        let samples = snapshot.samples(&mode("a")).unwrap();
        assert_eq!(samples[0][9], samples[0][2]);
    }

    #[test]
    fn reentry_clones_stored_buffer() {
        let (history, time) = linear_plan_history();
        // Refine sample slot 1 of the re-entered contract mode.
        history
            .acquire(
                &mode("contract"),
                &keypoints([(0., 0., 0.), (4., 0., 1.), (9., 0., 0.)]),
                time + 1,
            )
            .unwrap();
        // Stored history is untouched until the next flush.
        let snapshot = history.snapshot_at(time + 1);
        assert_eq!(snapshot.maximum_number_of_samples(&mode("contract")).unwrap(), 6);
    }

    #[test]
    fn purge_keeps_resolvable_state() {
        let (history, time) = linear_plan_history();
        history.purge_older_than(time);
        let snapshot = history.snapshot_at(time);
        assert!(snapshot.samples(&mode("fullright")).is_ok());
        assert_eq!(history.mode_at(time), mode("contract"));
    }
}
