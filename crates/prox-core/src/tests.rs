//! Unit tests for prox-core.

use crate::geometry::{Box3, Point, hull, point_segment_distance, segment_distance};
use crate::interval::Interval;
use crate::time::samples_over;

// ── Point ─────────────────────────────────────────────────────────────────────

mod point {
    use super::*;

    #[test]
    fn distance_is_euclidean() {
        let a = Point::new(0.0, 0.0, 0.0);
        let b = Point::new(3.0, 4.0, 0.0);
        assert_eq!(a.distance(b), 5.0);
    }

    #[test]
    fn undefined_detection() {
        assert!(Point::undefined().is_undefined());
        assert!(Point::new(f64::NAN, 0.0, 0.0).is_undefined());
        assert!(!Point::new(0.0, 0.0, 0.0).is_undefined());
    }

    #[test]
    fn midpoint() {
        let m = Point::midpoint(Point::new(0.0, 0.0, 0.0), Point::new(2.0, 4.0, 6.0));
        assert_eq!(m, Point::new(1.0, 2.0, 3.0));
    }
}

// ── Segment distances ─────────────────────────────────────────────────────────

mod distances {
    use super::*;

    #[test]
    fn point_to_segment_interior() {
        // Projection of (1,1,0) onto the x-axis segment lands at (1,0,0).
        let d = point_segment_distance(
            Point::new(1.0, 1.0, 0.0),
            Point::new(0.0, 0.0, 0.0),
            Point::new(4.0, 0.0, 0.0),
        );
        assert_eq!(d, 1.0);
    }

    #[test]
    fn point_to_segment_clamped_to_endpoint() {
        let d = point_segment_distance(
            Point::new(-3.0, 4.0, 0.0),
            Point::new(0.0, 0.0, 0.0),
            Point::new(4.0, 0.0, 0.0),
        );
        assert_eq!(d, 5.0);
    }

    #[test]
    fn point_to_degenerate_segment() {
        let p = Point::new(0.0, 0.0, 2.0);
        let a = Point::new(0.0, 0.0, 0.0);
        assert_eq!(point_segment_distance(p, a, a), 2.0);
    }

    #[test]
    fn crossing_segments_touch() {
        // Two segments crossing at the origin.
        let d = segment_distance(
            Point::new(-1.0, 0.0, 0.0),
            Point::new(1.0, 0.0, 0.0),
            Point::new(0.0, -1.0, 0.0),
            Point::new(0.0, 1.0, 0.0),
        );
        assert_eq!(d, 0.0);
    }

    #[test]
    fn parallel_segments() {
        let d = segment_distance(
            Point::new(0.0, 0.0, 0.0),
            Point::new(4.0, 0.0, 0.0),
            Point::new(0.0, 3.0, 0.0),
            Point::new(4.0, 3.0, 0.0),
        );
        assert_eq!(d, 3.0);
    }

    #[test]
    fn skew_segments() {
        // Vertical segment above the far end of a horizontal one.
        let d = segment_distance(
            Point::new(0.0, 0.0, 0.0),
            Point::new(1.0, 0.0, 0.0),
            Point::new(3.0, 0.0, 1.0),
            Point::new(3.0, 0.0, 2.0),
        );
        let expected = Point::new(1.0, 0.0, 0.0).distance(Point::new(3.0, 0.0, 1.0));
        assert!((d - expected).abs() < 1e-12);
    }

    #[test]
    fn symmetric() {
        let (p1, q1) = (Point::new(0.0, 1.0, 5.0), Point::new(4.0, 0.0, 6.0));
        let (p2, q2) = (Point::new(0.0, 0.0, 5.0), Point::new(5.0, 0.0, 1.0));
        assert_eq!(segment_distance(p1, q1, p2, q2), segment_distance(p2, q2, p1, q1));
    }
}

// ── Box3 ──────────────────────────────────────────────────────────────────────

mod box3 {
    use super::*;

    #[test]
    fn empty_box() {
        let b = Box3::empty();
        assert!(b.is_empty());
        assert_eq!(b.circle_radius(), 0.0);
    }

    #[test]
    fn including_a_point_makes_singleton() {
        let b = Box3::empty().including(Point::new(1.0, 2.0, 3.0));
        assert!(!b.is_empty());
        assert_eq!(b.centre(), Point::new(1.0, 2.0, 3.0));
        assert_eq!(b.circle_radius(), 0.0);
    }

    #[test]
    fn hull_of_two_points() {
        let b = hull(Point::new(0.0, 0.0, 0.0), Point::new(2.0, 2.0, 2.0));
        assert_eq!(b.centre(), Point::new(1.0, 1.0, 1.0));
        assert_eq!(b.circle_radius(), 3f64.sqrt());
    }

    #[test]
    fn widen_grows_every_side() {
        let b = hull(Point::new(0.0, 0.0, 0.0), Point::new(1.0, 1.0, 1.0)).widen(0.5);
        assert_eq!(b.xl, -0.5);
        assert_eq!(b.xu, 1.5);
    }

    #[test]
    fn disjoint_boxes() {
        let a = hull(Point::new(0.0, 0.0, 0.0), Point::new(1.0, 1.0, 1.0));
        let b = hull(Point::new(2.0, 0.0, 0.0), Point::new(3.0, 1.0, 1.0));
        let c = hull(Point::new(0.5, 0.0, 0.0), Point::new(3.0, 1.0, 1.0));
        assert!(a.disjoint(&b));
        assert!(!a.disjoint(&c));
        // Tangency counts as overlap.
        let d = hull(Point::new(1.0, 0.0, 0.0), Point::new(2.0, 1.0, 1.0));
        assert!(!a.disjoint(&d));
    }
}

// ── Interval ──────────────────────────────────────────────────────────────────

mod interval {
    use super::*;

    #[test]
    fn arithmetic() {
        let i = Interval::new(2usize, 5usize);
        assert_eq!(i + Interval::new(1, 2), Interval::new(3, 7));
        assert_eq!(i + 3, Interval::new(5, 8));
        assert_eq!(i - 1, Interval::new(1, 4));
    }

    #[test]
    fn singleton() {
        let i = Interval::singleton(7u64);
        assert_eq!(i.lower(), i.upper());
    }
}

// ── Time helpers ──────────────────────────────────────────────────────────────

mod time {
    use super::*;

    #[test]
    fn samples_over_floors() {
        assert_eq!(samples_over(6, 1000), 6);
        assert_eq!(samples_over(1999, 1), 1);
        assert_eq!(samples_over(999, 1), 0);
    }
}

// ── Errors ────────────────────────────────────────────────────────────────────

mod errors {
    use crate::error::ProxError;

    #[test]
    fn io_errors_convert() {
        fn fails() -> crate::ProxResult<()> {
            Err(std::io::Error::from(std::io::ErrorKind::NotFound))?;
            Ok(())
        }
        assert!(matches!(fails(), Err(ProxError::Io(_))));
    }

    #[test]
    fn display_names_the_body() {
        let e = ProxError::BodyNotFound("h0".into());
        assert_eq!(e.to_string(), "body 'h0' not found");
    }
}
