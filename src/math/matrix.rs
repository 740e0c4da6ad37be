use super::{Angle, Vector};
use std::ops::Mul;

/// A 3x3 row-major rotation matrix. Identity on construction.
///
/// Row 0 is "forward" (+X), row 1 is "left" (+Y), row 2 is "up" (+Z),
/// matching the Source-engine convention used by [`Angle`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix {
    rows: [[f64; 3]; 3],
}

impl Default for Matrix {
    fn default() -> Self {
        Matrix::identity()
    }
}

impl Matrix {
    pub fn identity() -> Self {
        Matrix {
            rows: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
        }
    }

    fn from_rows(rows: [[f64; 3]; 3]) -> Self {
        Matrix { rows }
    }

    pub fn forward(&self) -> Vector {
        Vector::new(self.rows[0][0], self.rows[0][1], self.rows[0][2])
    }

    pub fn left(&self) -> Vector {
        Vector::new(self.rows[1][0], self.rows[1][1], self.rows[1][2])
    }

    pub fn up(&self) -> Vector {
        Vector::new(self.rows[2][0], self.rows[2][1], self.rows[2][2])
    }

    /// Rotation about the Y axis by `pitch` degrees.
    pub fn from_pitch(pitch: f64) -> Self {
        let r = pitch.to_radians();
        let (sin, cos) = (r.sin(), r.cos());
        Matrix::from_rows([[cos, 0.0, -sin], [0.0, 1.0, 0.0], [sin, 0.0, cos]])
    }

    /// Rotation about the Z axis by `yaw` degrees.
    pub fn from_yaw(yaw: f64) -> Self {
        let r = yaw.to_radians();
        let (sin, cos) = (r.sin(), r.cos());
        Matrix::from_rows([[cos, sin, 0.0], [-sin, cos, 0.0], [0.0, 0.0, 1.0]])
    }

    /// Rotation about the X axis by `roll` degrees.
    pub fn from_roll(roll: f64) -> Self {
        let r = roll.to_radians();
        let (sin, cos) = (r.sin(), r.cos());
        Matrix::from_rows([[1.0, 0.0, 0.0], [0.0, cos, sin], [0.0, -sin, cos]])
    }

    /// Roll, then pitch, then yaw composed into a single matrix.
    pub fn from_angle(angle: Angle) -> Self {
        let cp = angle.pitch().to_radians().cos();
        let sp = angle.pitch().to_radians().sin();
        let sy = angle.yaw().to_radians().sin();
        let cy = angle.yaw().to_radians().cos();
        let cr = angle.roll().to_radians().cos();
        let sr = angle.roll().to_radians().sin();

        let cr_cy = cr * cy;
        let cr_sy = cr * sy;
        let sr_cy = sr * cy;
        let sr_sy = sr * sy;

        Matrix::from_rows([
            [cp * cy, cp * sy, -sp],
            [sp * sr_cy - cr_sy, sp * sr_sy + cr_cy, sr * cp],
            [sp * cr_cy + sr_sy, sp * cr_sy - sr_cy, cr * cp],
        ])
    }

    /// Recover the Euler angle which produces this rotation.
    pub fn to_angle(&self) -> Angle {
        let (for_x, for_y, for_z) = (self.rows[0][0], self.rows[0][1], self.rows[0][2]);
        let (left_x, left_y, left_z) = (self.rows[1][0], self.rows[1][1], self.rows[1][2]);
        let up_z = self.rows[2][2];

        let horiz_dist = (for_x * for_x + for_y * for_y).sqrt();
        if horiz_dist > 0.001 {
            Angle::new(
                (-for_z).atan2(horiz_dist).to_degrees(),
                for_y.atan2(for_x).to_degrees(),
                left_z.atan2(up_z).to_degrees(),
            )
        } else {
            Angle::new(
                (-for_z).atan2(horiz_dist).to_degrees(),
                (-left_x).atan2(left_y).to_degrees(),
                0.0,
            )
        }
    }

    pub fn transpose(&self) -> Matrix {
        let r = self.rows;
        Matrix::from_rows([
            [r[0][0], r[1][0], r[2][0]],
            [r[0][1], r[1][1], r[2][1]],
            [r[0][2], r[1][2], r[2][2]],
        ])
    }

    /// Build a rotation from at least two basis vectors; the third is the
    /// cross product of the other two, sign chosen so the missing axis is
    /// "completed" the same way `x = y.cross(z)`, `y = z.cross(x)`, or
    /// `z = x.cross(y)` would.
    pub fn from_basis(x: Option<Vector>, y: Option<Vector>, z: Option<Vector>) -> Matrix {
        let (x, y, z) = match (x, y, z) {
            (None, Some(y), Some(z)) => (y.cross(z), y, z),
            (Some(x), None, Some(z)) => (x, z.cross(x), z),
            (Some(x), Some(y), None) => (x, y, x.cross(y)),
            (Some(x), Some(y), Some(z)) => (x, y, z),
            _ => panic!("Matrix::from_basis requires at least two basis vectors"),
        };
        Matrix::from_rows([tuple_to_row(x.norm()), tuple_to_row(y.norm()), tuple_to_row(z.norm())])
    }

    /// Rotate a vector by this matrix: `v' = v @ M`.
    pub fn rotate(&self, v: Vector) -> Vector {
        Vector::new(
            v.x * self.rows[0][0] + v.y * self.rows[1][0] + v.z * self.rows[2][0],
            v.x * self.rows[0][1] + v.y * self.rows[1][1] + v.z * self.rows[2][1],
            v.x * self.rows[0][2] + v.y * self.rows[1][2] + v.z * self.rows[2][2],
        )
    }
}

fn tuple_to_row(v: Vector) -> [f64; 3] {
    [v.x, v.y, v.z]
}

/// Standard row-major matrix product: `self` rotated first, then `rhs`.
impl Mul<Matrix> for Matrix {
    type Output = Matrix;
    fn mul(self, rhs: Matrix) -> Matrix {
        let mut out = [[0.0; 3]; 3];
        for i in 0..3 {
            for j in 0..3 {
                out[i][j] = (0..3).map(|k| self.rows[i][k] * rhs.rows[k][j]).sum();
            }
        }
        Matrix::from_rows(out)
    }
}

impl Mul<Angle> for Matrix {
    type Output = Matrix;
    fn mul(self, rhs: Angle) -> Matrix {
        self * Matrix::from_angle(rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_leaves_vector_unchanged() {
        let v = Vector::new(1.0, 2.0, 3.0);
        assert_eq!(Matrix::identity().rotate(v), v);
    }

    #[test]
    fn from_angle_to_angle_round_trips() {
        let a = Angle::new(35.0, 128.0, 12.0);
        let back = Matrix::from_angle(a).to_angle();
        assert!(back.approx_eq(&a, 1e-4));
    }

    #[test]
    fn from_basis_completes_missing_axis() {
        let x = Vector::new(1.0, 0.0, 0.0);
        let y = Vector::new(0.0, 1.0, 0.0);
        let m = Matrix::from_basis(Some(x), Some(y), None);
        assert_eq!(m.up(), Vector::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn composition_is_associative_within_tolerance() {
        let v = Vector::new(1.0, 2.0, 3.0);
        let a = Angle::new(10.0, 0.0, 0.0);
        let b = Angle::new(0.0, 20.0, 0.0);
        let lhs = (v * a) * b;
        let rhs = v * (a * b);
        assert!((lhs.x - rhs.x).abs() < 1e-6);
        assert!((lhs.y - rhs.y).abs() < 1e-6);
        assert!((lhs.z - rhs.z).abs() < 1e-6);
    }
}
