use serde::{Deserialize, Serialize};
use std::ops::Mul;

use super::matrix::Matrix;
use super::point::Point3;
use super::vector::Vector3;
use crate::error::{GeomError, Result};

/// A 4x4 affine transformation matrix, row-major, acting on column vectors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Matrix4x4 {
    m: [f64; 16],
}

impl Matrix4x4 {
    pub fn from_row_major(m: [f64; 16]) -> Self {
        Self { m }
    }

    pub fn identity() -> Self {
        #[rustfmt::skip]
        let m = [
            1.0, 0.0, 0.0, 0.0,
            0.0, 1.0, 0.0, 0.0,
            0.0, 0.0, 1.0, 0.0,
            0.0, 0.0, 0.0, 1.0,
        ];
        Self { m }
    }

    pub fn translation(x: f64, y: f64, z: f64) -> Self {
        #[rustfmt::skip]
        let m = [
            1.0, 0.0, 0.0, x,
            0.0, 1.0, 0.0, y,
            0.0, 0.0, 1.0, z,
            0.0, 0.0, 0.0, 1.0,
        ];
        Self { m }
    }

    pub fn scaling(x: f64, y: f64, z: f64) -> Self {
        #[rustfmt::skip]
        let m = [
            x,   0.0, 0.0, 0.0,
            0.0, y,   0.0, 0.0,
            0.0, 0.0, z,   0.0,
            0.0, 0.0, 0.0, 1.0,
        ];
        Self { m }
    }

    /// Rotation around the X axis by `angle` radians.
    pub fn rotation_x(angle: f64) -> Self {
        let (s, c) = angle.sin_cos();
        #[rustfmt::skip]
        let m = [
            1.0, 0.0, 0.0, 0.0,
            0.0, c,   -s,  0.0,
            0.0, s,   c,   0.0,
            0.0, 0.0, 0.0, 1.0,
        ];
        Self { m }
    }

    /// Rotation around the Y axis by `angle` radians.
    pub fn rotation_y(angle: f64) -> Self {
        let (s, c) = angle.sin_cos();
        #[rustfmt::skip]
        let m = [
            c,   0.0, s,   0.0,
            0.0, 1.0, 0.0, 0.0,
            -s,  0.0, c,   0.0,
            0.0, 0.0, 0.0, 1.0,
        ];
        Self { m }
    }

    /// Rotation around the Z axis by `angle` radians.
    pub fn rotation_z(angle: f64) -> Self {
        let (s, c) = angle.sin_cos();
        #[rustfmt::skip]
        let m = [
            c,   -s,  0.0, 0.0,
            s,   c,   0.0, 0.0,
            0.0, 0.0, 1.0, 0.0,
            0.0, 0.0, 0.0, 1.0,
        ];
        Self { m }
    }

    /// Composite rotation `Rx(x) * Ry(y) * Rz(z)`.
    pub fn rotation(x: f64, y: f64, z: f64) -> Self {
        Self::rotation_x(x) * Self::rotation_y(y) * Self::rotation_z(z)
    }

    /// Rotation around an arbitrary axis by `angle` radians (Rodrigues' formula).
    pub fn rotation_around(axis: &Vector3, angle: f64) -> Result<Self> {
        let k = axis.normalized()?;
        let (s, c) = angle.sin_cos();
        let t = 1.0 - c;
        let (x, y, z) = (k.x, k.y, k.z);

        #[rustfmt::skip]
        let m = [
            t*x*x + c,   t*x*y - s*z, t*x*z + s*y, 0.0,
            t*x*y + s*z, t*y*y + c,   t*y*z - s*x, 0.0,
            t*x*z - s*y, t*y*z + s*x, t*z*z + c,   0.0,
            0.0,         0.0,         0.0,         1.0,
        ];
        Ok(Self { m })
    }

    fn at(&self, row: usize, col: usize) -> f64 {
        self.m[row * 4 + col]
    }

    pub fn get(&self, row: usize, col: usize) -> Result<f64> {
        check_index(row)?;
        check_index(col)?;
        Ok(self.at(row, col))
    }

    pub fn set(&mut self, row: usize, col: usize, value: f64) -> Result<()> {
        check_index(row)?;
        check_index(col)?;
        self.m[row * 4 + col] = value;
        Ok(())
    }

    pub fn to_row_major(&self) -> [f64; 16] {
        self.m
    }

    pub fn transposed(&self) -> Self {
        let mut m = [0.0; 16];
        for row in 0..4 {
            for col in 0..4 {
                m[col * 4 + row] = self.at(row, col);
            }
        }
        Self { m }
    }

    /// Transform a point (applies translation).
    pub fn transform_point(&self, p: &Point3) -> Point3 {
        let row = |r: usize| self.at(r, 0) * p.x + self.at(r, 1) * p.y + self.at(r, 2) * p.z + self.at(r, 3);
        Point3::new(row(0), row(1), row(2))
    }

    /// Transform a vector (no translation).
    pub fn transform_vector(&self, v: &Vector3) -> Vector3 {
        let row = |r: usize| self.at(r, 0) * v.x + self.at(r, 1) * v.y + self.at(r, 2) * v.z;
        Vector3::new(row(0), row(1), row(2))
    }

    // 2x2 sub-determinants of the top two and bottom two rows, used by both
    // the determinant and the inverse.
    fn sub_determinants(&self) -> ([f64; 6], [f64; 6]) {
        let a = |r, c| self.at(r, c);
        let s = [
            a(0, 0) * a(1, 1) - a(1, 0) * a(0, 1),
            a(0, 0) * a(1, 2) - a(1, 0) * a(0, 2),
            a(0, 0) * a(1, 3) - a(1, 0) * a(0, 3),
            a(0, 1) * a(1, 2) - a(1, 1) * a(0, 2),
            a(0, 1) * a(1, 3) - a(1, 1) * a(0, 3),
            a(0, 2) * a(1, 3) - a(1, 2) * a(0, 3),
        ];
        let c = [
            a(2, 0) * a(3, 1) - a(3, 0) * a(2, 1),
            a(2, 0) * a(3, 2) - a(3, 0) * a(2, 2),
            a(2, 0) * a(3, 3) - a(3, 0) * a(2, 3),
            a(2, 1) * a(3, 2) - a(3, 1) * a(2, 2),
            a(2, 1) * a(3, 3) - a(3, 1) * a(2, 3),
            a(2, 2) * a(3, 3) - a(3, 2) * a(2, 3),
        ];
        (s, c)
    }

    pub fn determinant(&self) -> f64 {
        let (s, c) = self.sub_determinants();
        s[0] * c[5] - s[1] * c[4] + s[2] * c[3] + s[3] * c[2] - s[4] * c[1] + s[5] * c[0]
    }

    /// Inverse transform; a singular matrix is degenerate input.
    pub fn inverse(&self) -> Result<Self> {
        let (s, c) = self.sub_determinants();
        let det = s[0] * c[5] - s[1] * c[4] + s[2] * c[3] + s[3] * c[2] - s[4] * c[1] + s[5] * c[0];
        if det.abs() < 1e-300 || !det.is_finite() {
            return Err(GeomError::degenerate("transformation matrix is singular"));
        }
        let a = |r, col| self.at(r, col);

        #[rustfmt::skip]
        let adj = [
             a(1,1)*c[5] - a(1,2)*c[4] + a(1,3)*c[3],
            -a(0,1)*c[5] + a(0,2)*c[4] - a(0,3)*c[3],
             a(3,1)*s[5] - a(3,2)*s[4] + a(3,3)*s[3],
            -a(2,1)*s[5] + a(2,2)*s[4] - a(2,3)*s[3],

            -a(1,0)*c[5] + a(1,2)*c[2] - a(1,3)*c[1],
             a(0,0)*c[5] - a(0,2)*c[2] + a(0,3)*c[1],
            -a(3,0)*s[5] + a(3,2)*s[2] - a(3,3)*s[1],
             a(2,0)*s[5] - a(2,2)*s[2] + a(2,3)*s[1],

             a(1,0)*c[4] - a(1,1)*c[2] + a(1,3)*c[0],
            -a(0,0)*c[4] + a(0,1)*c[2] - a(0,3)*c[0],
             a(3,0)*s[4] - a(3,1)*s[2] + a(3,3)*s[0],
            -a(2,0)*s[4] + a(2,1)*s[2] - a(2,3)*s[0],

            -a(1,0)*c[3] + a(1,1)*c[1] - a(1,2)*c[0],
             a(0,0)*c[3] - a(0,1)*c[1] + a(0,2)*c[0],
            -a(3,0)*s[3] + a(3,1)*s[1] - a(3,2)*s[0],
             a(2,0)*s[3] - a(2,1)*s[1] + a(2,2)*s[0],
        ];

        let inv_det = 1.0 / det;
        Ok(Self {
            m: adj.map(|v| v * inv_det),
        })
    }
}

fn check_index(i: usize) -> Result<()> {
    if i < 4 {
        Ok(())
    } else {
        Err(GeomError::IndexOutOfRange { index: i, len: 4 })
    }
}

impl Default for Matrix4x4 {
    fn default() -> Self {
        Self::identity()
    }
}

impl Mul for Matrix4x4 {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self::Output {
        let mut m = [0.0; 16];
        for row in 0..4 {
            for col in 0..4 {
                m[row * 4 + col] = (0..4).map(|k| self.at(row, k) * rhs.at(k, col)).sum();
            }
        }
        Self { m }
    }
}

impl TryFrom<&Matrix> for Matrix4x4 {
    type Error = GeomError;

    fn try_from(other: &Matrix) -> Result<Self> {
        if other.rows() != 4 || other.cols() != 4 {
            return Err(GeomError::validation(format!(
                "matrix dimensions are {}x{}, expected 4x4",
                other.rows(),
                other.cols()
            )));
        }
        let mut m = [0.0; 16];
        m.copy_from_slice(other.data());
        Ok(Self { m })
    }
}
