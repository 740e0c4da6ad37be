use super::Matrix;
use std::ops::Mul;

/// A Euler rotation in degrees: pitch (Y axis, applied second), yaw (Z axis,
/// applied last), roll (X axis, applied first).
///
/// Every component is kept normalized to `[0, 360)`. We double-modulus
/// (`x % 360 % 360`) because in strict IEEE-754 arithmetic a tiny negative
/// input can come back out as exactly `360.0` after a single `% 360`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Angle {
    pitch: f64,
    yaw: f64,
    roll: f64,
}

fn norm360(v: f64) -> f64 {
    // `rem_euclid` is the Rust equivalent of Python's always-non-negative
    // `%`; we still double it up since a tiny negative input can round to
    // exactly 360.0 on the first pass (spec.md §9 Open Questions).
    v.rem_euclid(360.0).rem_euclid(360.0)
}

impl Angle {
    pub fn new(pitch: f64, yaw: f64, roll: f64) -> Self {
        Angle {
            pitch: norm360(pitch),
            yaw: norm360(yaw),
            roll: norm360(roll),
        }
    }

    pub fn pitch(&self) -> f64 {
        self.pitch
    }

    pub fn yaw(&self) -> f64 {
        self.yaw
    }

    pub fn roll(&self) -> f64 {
        self.roll
    }

    pub fn set_pitch(&mut self, pitch: f64) {
        self.pitch = norm360(pitch);
    }

    pub fn set_yaw(&mut self, yaw: f64) {
        self.yaw = norm360(yaw);
    }

    pub fn set_roll(&mut self, roll: f64) {
        self.roll = norm360(roll);
    }

    pub fn as_tuple(&self) -> (f64, f64, f64) {
        (self.pitch, self.yaw, self.roll)
    }

    /// `abs(a - b) < eps` on every component, after normalization. Useful
    /// for round-trip tests where exact float equality is too strict.
    pub fn approx_eq(&self, other: &Angle, eps: f64) -> bool {
        (self.pitch - other.pitch).abs() < eps
            && (self.yaw - other.yaw).abs() < eps
            && (self.roll - other.roll).abs() < eps
    }
}

impl Mul<f64> for Angle {
    type Output = Angle;
    fn mul(self, rhs: f64) -> Angle {
        Angle::new(self.pitch * rhs, self.yaw * rhs, self.roll * rhs)
    }
}

/// `a * b` composes rotations: `a` rotated by `b` (left rotated by right).
impl Mul<Angle> for Angle {
    type Output = Angle;
    fn mul(self, rhs: Angle) -> Angle {
        (Matrix::from_angle(self) * Matrix::from_angle(rhs)).to_angle()
    }
}

// `Vector * Angle` (rotate a vector by an angle) is implemented in vector.rs.

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn components_stay_in_range() {
        let a = Angle::new(-1e-14, 720.5, -400.0);
        assert!(a.pitch() >= 0.0 && a.pitch() < 360.0);
        assert!(a.yaw() >= 0.0 && a.yaw() < 360.0);
        assert!(a.roll() >= 0.0 && a.roll() < 360.0);
    }

    #[test]
    fn scalar_multiply_renormalizes() {
        let a = Angle::new(200.0, 0.0, 0.0) * 3.0;
        assert!(a.pitch() >= 0.0 && a.pitch() < 360.0);
    }

    #[test]
    fn composition_matches_matrix_round_trip() {
        let a = Angle::new(10.0, 20.0, 5.0);
        let b = Angle::new(0.0, 0.0, 0.0);
        let composed = a * b;
        assert!(composed.approx_eq(&a, 1e-6));
    }
}
