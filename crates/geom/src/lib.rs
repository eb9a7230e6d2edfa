pub mod config;
pub mod error;
pub mod geometry;
pub mod linalg;
pub mod roots;

// Re-export the everyday types at crate root for convenience.
pub use config::ProjectionConfig;
pub use error::{GeomError, Result};
pub use geometry::{
    Ellipsoid, GeoPoint3, Geometry, OblateSpheroid, Plane, Primitive, Sphere, Spheroid,
};
pub use linalg::{Matrix, Matrix4x4, Point3, Vector3};

use serde::{Deserialize, Serialize};

/// Global tolerance configuration for numeric comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tolerance {
    /// Vectors shorter than this cannot be normalized.
    pub coincidence: f64,
    /// Relative epsilon under which a root-solver discriminant counts as zero.
    pub discriminant: f64,
}

impl Default for Tolerance {
    fn default() -> Self {
        Self {
            coincidence: 1e-15,
            discriminant: 1e-12,
        }
    }
}

impl Tolerance {
    pub fn is_zero_length(&self, length: f64) -> bool {
        length.abs() < self.coincidence
    }

    /// True when `value` is zero relative to the magnitude `scale`.
    ///
    /// The test is homogeneous: scaling `value` and `scale` together never
    /// changes the answer.
    pub fn is_negligible(&self, value: f64, scale: f64) -> bool {
        value.abs() <= self.discriminant * scale.abs()
    }
}
