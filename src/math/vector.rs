use super::{Angle, Matrix};
use crate::error::BspError;
use std::iter;
use std::ops::{Add, Div, Mul, Neg, Rem, Sub};

/// A mutable 3-component vector of `f64`.
///
/// Addition and subtraction accept another `Vector`, a `(f64, f64, f64)`
/// tuple, or a scalar (broadcast to all three components). Multiplication,
/// division, remainder and `div_euclid` only accept scalars: `Vector * Vector`
/// is deliberately not implemented as an operator (use [`Vector::dot`] or
/// [`Vector::cross`] instead; see [`BspError::AmbiguousVectorProduct`]).
#[derive(Debug, Clone, Copy, Default)]
pub struct Vector {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Which axis a vector points along, returned by [`Vector::axis`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Vector {
    pub const ZERO: Vector = Vector { x: 0.0, y: 0.0, z: 0.0 };

    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Vector { x, y, z }
    }

    pub fn splat(v: f64) -> Self {
        Vector { x: v, y: v, z: v }
    }

    pub fn as_tuple(&self) -> (f64, f64, f64) {
        (self.x, self.y, self.z)
    }

    /// The dot product of two vectors. Unlike the `*` operator, this is
    /// always defined.
    pub fn dot(&self, other: impl Into<Vector>) -> f64 {
        let other = other.into();
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// The cross product of two vectors.
    pub fn cross(&self, other: impl Into<Vector>) -> Vector {
        let other = other.into();
        Vector::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    /// Vector times vector has no single sensible meaning (Hadamard product
    /// vs. dot vs. cross); this always fails, matching the source format's
    /// convention of forbidding it. Kept so the error variant stays
    /// reachable and documented, even though the `*` operator simply isn't
    /// implemented for `Vector * Vector`.
    pub fn checked_mul(&self, _other: &Vector) -> Result<Vector, BspError> {
        Err(BspError::AmbiguousVectorProduct)
    }

    pub fn len_sq(&self) -> f64 {
        self.x * self.x + self.y * self.y + self.z * self.z
    }

    pub fn mag(&self) -> f64 {
        self.len_sq().sqrt()
    }

    /// Normalize to unit length; the zero vector is returned unchanged.
    pub fn norm(&self) -> Vector {
        if self.x == 0.0 && self.y == 0.0 && self.z == 0.0 {
            *self
        } else {
            *self / self.mag()
        }
    }

    pub fn abs(&self) -> Vector {
        Vector::new(self.x.abs(), self.y.abs(), self.z.abs())
    }

    /// Componentwise floor division by a scalar (spec.md §4.8 "division
    /// (true, floor)"). `/` on `Vector` is true division; this is the floor
    /// variant, only ever defined against a scalar.
    pub fn floor_div(&self, rhs: f64) -> Vector {
        Vector::new((self.x / rhs).floor(), (self.y / rhs).floor(), (self.z / rhs).floor())
    }

    /// `(self.floor_div(rhs), self % rhs)`, componentwise, against a scalar.
    pub fn divmod(&self, rhs: f64) -> (Vector, Vector) {
        (self.floor_div(rhs), *self % rhs)
    }

    /// Compute the bounding box of a set of points.
    pub fn bbox(points: impl IntoIterator<Item = Vector>) -> Option<(Vector, Vector)> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut min = first;
        let mut max = first;
        for p in iter {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            min.z = min.z.min(p.z);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
            max.z = max.z.max(p.z);
        }
        Some((min, max))
    }

    /// Iterate every integer point in the inclusive box `[min, max]`,
    /// stepping by `stride` along each axis.
    pub fn iter_grid(min: Vector, max: Vector, stride: i64) -> impl Iterator<Item = Vector> {
        let stride = stride.max(1);
        let (min_x, min_y, min_z) = (min.x as i64, min.y as i64, min.z as i64);
        let (max_x, max_y, max_z) = (max.x as i64, max.y as i64, max.z as i64);
        (min_x..=max_x)
            .step_by(stride as usize)
            .flat_map(move |x| {
                (min_y..=max_y).step_by(stride as usize).flat_map(move |y| {
                    (min_z..=max_z)
                        .step_by(stride as usize)
                        .map(move |z| Vector::new(x as f64, y as f64, z as f64))
                })
            })
    }

    /// Yield points between `self` and `end`, including both endpoints.
    /// If the two points are closer than `stride`, only the endpoints are
    /// yielded.
    pub fn iter_line(self, end: Vector, stride: f64) -> impl Iterator<Item = Vector> {
        let offset = end - self;
        let length = offset.mag();
        let stride = stride.max(f64::MIN_POSITIVE);

        if length < stride {
            let second = if self != end { Some(end) } else { None };
            return Box::new(iter::once(self).chain(second)) as Box<dyn Iterator<Item = Vector>>;
        }

        let direction = offset.norm();
        let steps = (length / stride).floor() as i64;
        let points = (0..steps).map(move |i| self + direction * (i as f64 * stride));
        Box::new(points.chain(iter::once(end)))
    }

    /// For an axis-aligned vector, the axis it lies on.
    pub fn axis(&self) -> Result<Axis, BspError> {
        match (self.x != 0.0, self.y != 0.0, self.z != 0.0) {
            (true, false, false) => Ok(Axis::X),
            (false, true, false) => Ok(Axis::Y),
            (false, false, true) => Ok(Axis::Z),
            _ => Err(BspError::ZeroAxisVector),
        }
    }

    /// For an axis-aligned normal, the angle which rotates `rot` degrees
    /// around it.
    pub fn rotation_around(&self, rot: f64) -> Result<Vector, BspError> {
        if self.x != 0.0 {
            Ok(Vector::new(0.0, 0.0, self.x * rot))
        } else if self.y != 0.0 {
            Ok(Vector::new(self.y * rot, 0.0, 0.0))
        } else if self.z != 0.0 {
            Ok(Vector::new(0.0, self.z * rot, 0.0))
        } else {
            Err(BspError::ZeroAxisVector)
        }
    }

    /// Convert a normal vector to the Source-engine angle pointing the same
    /// way. `Vector::new(1.0, 0.0, 0.0)` maps to `Angle(0, 0, roll)`.
    pub fn to_angle(&self, roll: f64) -> Angle {
        let horiz_dist = self.x.hypot(self.y);
        Angle::new(
            (-self.z).atan2(horiz_dist).to_degrees(),
            self.y.atan2(self.x).to_degrees(),
            roll,
        )
    }
}

impl From<(f64, f64, f64)> for Vector {
    fn from((x, y, z): (f64, f64, f64)) -> Self {
        Vector::new(x, y, z)
    }
}

impl PartialEq for Vector {
    fn eq(&self, other: &Self) -> bool {
        self.x == other.x && self.y == other.y && self.z == other.z
    }
}

impl PartialEq<(f64, f64, f64)> for Vector {
    fn eq(&self, other: &(f64, f64, f64)) -> bool {
        self.x == other.0 && self.y == other.1 && self.z == other.2
    }
}

/// Comparison is componentwise on all three axes, so this is a partial
/// order, not a total one: e.g. `(1, 0, 0)` and `(0, 1, 0)` are unordered.
impl PartialOrd for Vector {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        let x = self.x.partial_cmp(&other.x)?;
        let y = self.y.partial_cmp(&other.y)?;
        let z = self.z.partial_cmp(&other.z)?;
        if x == y && y == z {
            Some(x)
        } else {
            None
        }
    }
}

impl Neg for Vector {
    type Output = Vector;
    fn neg(self) -> Vector {
        Vector::new(-self.x, -self.y, -self.z)
    }
}

impl Add<Vector> for Vector {
    type Output = Vector;
    fn add(self, rhs: Vector) -> Vector {
        Vector::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Add<(f64, f64, f64)> for Vector {
    type Output = Vector;
    fn add(self, rhs: (f64, f64, f64)) -> Vector {
        self + Vector::from(rhs)
    }
}

impl Add<f64> for Vector {
    type Output = Vector;
    fn add(self, rhs: f64) -> Vector {
        Vector::new(self.x + rhs, self.y + rhs, self.z + rhs)
    }
}

impl Sub<Vector> for Vector {
    type Output = Vector;
    fn sub(self, rhs: Vector) -> Vector {
        Vector::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Sub<(f64, f64, f64)> for Vector {
    type Output = Vector;
    fn sub(self, rhs: (f64, f64, f64)) -> Vector {
        self - Vector::from(rhs)
    }
}

impl Sub<f64> for Vector {
    type Output = Vector;
    fn sub(self, rhs: f64) -> Vector {
        Vector::new(self.x - rhs, self.y - rhs, self.z - rhs)
    }
}

impl Mul<f64> for Vector {
    type Output = Vector;
    fn mul(self, rhs: f64) -> Vector {
        Vector::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Div<f64> for Vector {
    type Output = Vector;
    fn div(self, rhs: f64) -> Vector {
        Vector::new(self.x / rhs, self.y / rhs, self.z / rhs)
    }
}

impl Rem<f64> for Vector {
    type Output = Vector;
    fn rem(self, rhs: f64) -> Vector {
        Vector::new(self.x % rhs, self.y % rhs, self.z % rhs)
    }
}

impl Mul<Matrix> for Vector {
    type Output = Vector;
    fn mul(self, rhs: Matrix) -> Vector {
        rhs.rotate(self)
    }
}

impl Mul<Angle> for Vector {
    type Output = Vector;
    fn mul(self, rhs: Angle) -> Vector {
        self * Matrix::from_angle(rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_with_tuple() {
        let v = Vector::new(1.0, 2.0, 3.0);
        assert_eq!(v, (1.0, 2.0, 3.0));
    }

    #[test]
    fn cross_anticommutes() {
        let v = Vector::new(1.0, 0.0, 0.0);
        let w = Vector::new(0.0, 1.0, 0.0);
        assert_eq!(v.cross(w), -w.cross(v));
    }

    #[test]
    fn dot_matches_len_sq() {
        let v = Vector::new(3.0, -1.0, 2.0);
        assert_eq!(v.dot(v), v.len_sq());
    }

    #[test]
    fn norm_is_unit_or_zero() {
        assert_eq!(Vector::ZERO.norm(), Vector::ZERO);
        let n = Vector::new(3.0, 4.0, 0.0).norm();
        assert!((n.mag() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn axis_detects_on_axis_vectors() {
        assert_eq!(Vector::new(1.0, 0.0, 0.0).axis().unwrap(), Axis::X);
        assert!(Vector::new(1.0, 1.0, 0.0).axis().is_err());
        assert!(Vector::ZERO.axis().is_err());
    }

    #[test]
    fn iter_line_always_yields_both_endpoints() {
        let start = Vector::new(0.0, 0.0, 0.0);
        let end = Vector::new(10.0, 0.0, 0.0);
        let points: Vec<_> = start.iter_line(end, 3.0).collect();
        assert_eq!(*points.first().unwrap(), start);
        assert_eq!(*points.last().unwrap(), end);
    }

    #[test]
    fn iter_grid_is_inclusive_both_ends() {
        let points: Vec<_> =
            Vector::iter_grid(Vector::new(0.0, 0.0, 0.0), Vector::new(1.0, 0.0, 0.0), 1).collect();
        assert_eq!(points, vec![Vector::new(0.0, 0.0, 0.0), Vector::new(1.0, 0.0, 0.0)]);
    }

    #[test]
    fn floor_div_and_divmod_match() {
        let v = Vector::new(7.0, -7.0, 7.5);
        let q = v.floor_div(2.0);
        assert_eq!(q, (3.0, -4.0, 3.0));
        let (q2, r) = v.divmod(2.0);
        assert_eq!(q2, q);
        assert_eq!(r, v % 2.0);
    }

    #[test]
    fn vec_at_identity_angle_is_unchanged() {
        let v = Vector::new(1.0, 0.0, 0.0);
        assert_eq!(v * Angle::new(0.0, 0.0, 0.0), v);
    }
}
