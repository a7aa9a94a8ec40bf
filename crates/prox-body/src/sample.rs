//! Per-segment spatial samples.
//!
//! A sample accumulates observed positions for the head and tail keypoints
//! of one segment.  Head and tail each keep a bounding box of everything
//! observed so far; the sample's centre points are the box centres and the
//! *error* is the circumradius of the larger box, so the true keypoint is
//! always inside a sphere of that radius around the centre.

use prox_core::{Box3, Point, Sphere, hull, segment_distance};

/// A snapshot of one body segment, with error bounds.
#[derive(Clone, Debug)]
pub struct BodySegmentSample {
    segment_index: usize,
    thickness: f64,
    is_empty: bool,
    head_bounds: Box3,
    tail_bounds: Box3,
    head_centre: Point,
    tail_centre: Point,
    error: f64,
    bounding_box: Box3,
    bounding_sphere: Sphere,
}

impl BodySegmentSample {
    /// An empty sample for the segment at `segment_index`.
    pub fn empty(segment_index: usize, thickness: f64) -> Self {
        Self {
            segment_index,
            thickness,
            is_empty: true,
            head_bounds: Box3::empty(),
            tail_bounds: Box3::empty(),
            head_centre: Point::undefined(),
            tail_centre: Point::undefined(),
            error: 0.0,
            bounding_box: Box3::empty(),
            bounding_sphere: Sphere::new(Point::undefined(), 0.0),
        }
    }

    pub fn segment_index(&self) -> usize {
        self.segment_index
    }

    /// Centre point for the head of the segment.
    pub fn head_centre(&self) -> Point {
        self.head_centre
    }

    /// Centre point for the tail of the segment.
    pub fn tail_centre(&self) -> Point {
        self.tail_centre
    }

    /// Maximum spherical error in the head/tail positions with respect to
    /// the accumulated bounds.
    pub fn error(&self) -> f64 {
        self.error
    }

    pub fn thickness(&self) -> f64 {
        self.thickness
    }

    /// Bounding box overapproximation of the thick segment.
    pub fn bounding_box(&self) -> &Box3 {
        &self.bounding_box
    }

    /// Bounding sphere overapproximation of the thick segment.
    pub fn bounding_sphere(&self) -> &Sphere {
        &self.bounding_sphere
    }

    /// Whether either the head or the tail has never been observed.
    pub fn is_empty(&self) -> bool {
        self.is_empty
    }

    /// Refine the head and tail bounds from the given point lists.
    ///
    /// Points are consumed pairwise; a longer list's excess refines only its
    /// own side.  Centres are recomputed for the sides that received points,
    /// and the error and bounding volumes whenever the sample is non-empty.
    pub fn update(&mut self, heads: &[Point], tails: &[Point]) {
        for p in heads {
            self.head_bounds = self.head_bounds.including(*p);
        }
        for p in tails {
            self.tail_bounds = self.tail_bounds.including(*p);
        }
        if self.is_empty && !self.head_bounds.is_empty() && !self.tail_bounds.is_empty() {
            self.is_empty = false;
        }
        if !heads.is_empty() {
            self.head_centre = self.head_bounds.centre();
        }
        if !tails.is_empty() {
            self.tail_centre = self.tail_bounds.centre();
        }
        if !self.is_empty {
            self.recalculate_bounding_sets();
        }
    }

    fn recalculate_bounding_sets(&mut self) {
        self.error = self
            .head_bounds
            .circle_radius()
            .max(self.tail_bounds.circle_radius());
        let margin = self.error + self.thickness;
        self.bounding_box = hull(self.head_centre, self.tail_centre).widen(margin);
        self.bounding_sphere = Sphere::new(
            Point::midpoint(self.head_centre, self.tail_centre),
            self.head_centre.distance(self.tail_centre) / 2.0 + margin,
        );
    }

    /// Whether this sample intersects `other`, tangency included.
    pub fn intersects(&self, other: &BodySegmentSample) -> bool {
        if self.bounding_box.disjoint(&other.bounding_box) {
            return false;
        }
        segment_sample_distance(self, other)
            <= self.thickness + self.error + other.thickness + other.error
    }
}

impl PartialEq for BodySegmentSample {
    fn eq(&self, other: &Self) -> bool {
        fn centres_eq(a: Point, b: Point) -> bool {
            match (a.is_undefined(), b.is_undefined()) {
                (true, true) => true,
                (false, false) => a == b,
                _ => false,
            }
        }
        self.segment_index == other.segment_index
            && self.error == other.error
            && self.thickness == other.thickness
            && centres_eq(self.head_centre, other.head_centre)
            && centres_eq(self.tail_centre, other.tail_centre)
    }
}

/// Minimum distance between the centre segments of two samples.
pub fn segment_sample_distance(s1: &BodySegmentSample, s2: &BodySegmentSample) -> f64 {
    segment_distance(
        s1.head_centre(),
        s1.tail_centre(),
        s2.head_centre(),
        s2.tail_centre(),
    )
}

/// Distance between a sphere and the capsule around a segment sample,
/// clamped to zero.
pub fn sphere_capsule_distance(sphere: &Sphere, sample: &BodySegmentSample) -> f64 {
    (prox_core::geometry::point_segment_distance(
        sphere.centre,
        sample.head_centre(),
        sample.tail_centre(),
    ) - sample.error()
        - sample.thickness()
        - sphere.radius)
        .max(0.0)
}
