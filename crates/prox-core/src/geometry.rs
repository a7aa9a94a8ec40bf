//! 3D geometry primitives and distance kernels.
//!
//! Everything here is double-precision.  `f64::INFINITY` stands for "no
//! distance known" and `NaN` coordinates mark an undefined point (a keypoint
//! that has never been observed).

use std::ops::{Add, Mul, Sub};

// ── Point ─────────────────────────────────────────────────────────────────────

/// A position (or displacement) in 3D space.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point {
    #[inline]
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// A point with no defined position (all-NaN coordinates).
    #[inline]
    pub fn undefined() -> Self {
        Self::new(f64::NAN, f64::NAN, f64::NAN)
    }

    /// Whether any coordinate is undefined.
    #[inline]
    pub fn is_undefined(self) -> bool {
        self.x.is_nan() || self.y.is_nan() || self.z.is_nan()
    }

    #[inline]
    pub fn dot(self, other: Point) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Euclidean distance to `other`.
    #[inline]
    pub fn distance(self, other: Point) -> f64 {
        (other - self).dot(other - self).sqrt()
    }

    /// The midpoint of the segment from `a` to `b`.
    #[inline]
    pub fn midpoint(a: Point, b: Point) -> Point {
        Point::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0, (a.z + b.z) / 2.0)
    }
}

impl Sub for Point {
    type Output = Point;
    #[inline]
    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Add for Point {
    type Output = Point;
    #[inline]
    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Mul<f64> for Point {
    type Output = Point;
    #[inline]
    fn mul(self, rhs: f64) -> Point {
        Point::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl std::fmt::Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({},{},{})", self.x, self.y, self.z)
    }
}

// ── Distance kernels ──────────────────────────────────────────────────────────

/// Distance from a point to the segment `[head, tail]`, with the segment
/// parameter clamped to [0,1].
pub fn point_segment_distance(p: Point, head: Point, tail: Point) -> f64 {
    let d = tail - head;
    let len2 = d.dot(d);
    if len2 == 0.0 {
        return p.distance(head);
    }
    let t = ((p - head).dot(d) / len2).clamp(0.0, 1.0);
    p.distance(head + d * t)
}

/// Minimum distance between the segments `[p1, q1]` and `[p2, q2]`.
///
/// The standard closest-points-on-segments formulation with both parameters
/// clamped to [0,1]; degenerate (zero-length) segments reduce to the point
/// cases.  Symmetric, non-negative, and zero iff the segments touch.
pub fn segment_distance(p1: Point, q1: Point, p2: Point, q2: Point) -> f64 {
    let d1 = q1 - p1;
    let d2 = q2 - p2;
    let r = p1 - p2;
    let a = d1.dot(d1);
    let e = d2.dot(d2);
    let f = d2.dot(r);

    if a == 0.0 && e == 0.0 {
        return p1.distance(p2);
    }
    if a == 0.0 {
        return point_segment_distance(p1, p2, q2);
    }
    if e == 0.0 {
        return point_segment_distance(p2, p1, q1);
    }

    let c = d1.dot(r);
    let b = d1.dot(d2);
    let denom = a * e - b * b;

    // Parallel segments have denom == 0; any s works, pick 0.
    let mut s = if denom != 0.0 {
        ((b * f - c * e) / denom).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let t = (b * s + f) / e;

    // Re-clamp: if t left [0,1], recompute s for the clamped t.
    let t = if t < 0.0 {
        s = (-c / a).clamp(0.0, 1.0);
        0.0
    } else if t > 1.0 {
        s = ((b - c) / a).clamp(0.0, 1.0);
        1.0
    } else {
        t
    };

    (p1 + d1 * s).distance(p2 + d2 * t)
}

// ── Box3 ──────────────────────────────────────────────────────────────────────

/// An axis-aligned box given by lower/upper bounds in each dimension.
///
/// The empty box has inverted infinite bounds, so that including a point
/// into it yields the singleton box of that point.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Box3 {
    pub xl: f64,
    pub xu: f64,
    pub yl: f64,
    pub yu: f64,
    pub zl: f64,
    pub zu: f64,
}

impl Box3 {
    #[inline]
    pub fn new(xl: f64, xu: f64, yl: f64, yu: f64, zl: f64, zu: f64) -> Self {
        Self { xl, xu, yl, yu, zl, zu }
    }

    /// The empty box.
    #[inline]
    pub fn empty() -> Self {
        Self::new(
            f64::INFINITY,
            f64::NEG_INFINITY,
            f64::INFINITY,
            f64::NEG_INFINITY,
            f64::INFINITY,
            f64::NEG_INFINITY,
        )
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.xl > self.xu || self.yl > self.yu || self.zl > self.zu
    }

    /// The smallest box containing both `self` and `p`.
    #[inline]
    pub fn including(&self, p: Point) -> Box3 {
        Box3::new(
            self.xl.min(p.x),
            self.xu.max(p.x),
            self.yl.min(p.y),
            self.yu.max(p.y),
            self.zl.min(p.z),
            self.zu.max(p.z),
        )
    }

    /// The centre point.  Undefined for an empty box.
    #[inline]
    pub fn centre(&self) -> Point {
        Point::new(
            (self.xl + self.xu) / 2.0,
            (self.yl + self.yu) / 2.0,
            (self.zl + self.zu) / 2.0,
        )
    }

    /// Radius of the minimum sphere enclosing the box (half the diagonal).
    /// Zero for an empty box.
    pub fn circle_radius(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        let dx = self.xu - self.xl;
        let dy = self.yu - self.yl;
        let dz = self.zu - self.zl;
        (dx * dx + dy * dy + dz * dz).sqrt() / 2.0
    }

    /// Whether the two boxes have no point in common.
    #[inline]
    pub fn disjoint(&self, other: &Box3) -> bool {
        self.xu < other.xl
            || other.xu < self.xl
            || self.yu < other.yl
            || other.yu < self.yl
            || self.zu < other.zl
            || other.zu < self.zl
    }

    /// The box grown by `eps` on every side.
    #[inline]
    pub fn widen(&self, eps: f64) -> Box3 {
        Box3::new(
            self.xl - eps,
            self.xu + eps,
            self.yl - eps,
            self.yu + eps,
            self.zl - eps,
            self.zu + eps,
        )
    }
}

/// The smallest box containing the two points.
#[inline]
pub fn hull(a: Point, b: Point) -> Box3 {
    Box3::empty().including(a).including(b)
}

// ── Sphere ────────────────────────────────────────────────────────────────────

/// A sphere given by centre and non-negative radius.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Sphere {
    pub centre: Point,
    pub radius: f64,
}

impl Sphere {
    #[inline]
    pub fn new(centre: Point, radius: f64) -> Self {
        debug_assert!(radius >= 0.0);
        Self { centre, radius }
    }
}
