pub mod ellipsoid;
pub mod geo_point;
pub mod plane;
pub mod sphere;
pub mod spheroid;

pub use ellipsoid::Ellipsoid;
pub use geo_point::GeoPoint3;
pub use plane::Plane;
pub use sphere::Sphere;
pub use spheroid::{OblateSpheroid, Spheroid};

use crate::error::{GeomError, Result};
use crate::linalg::{Point3, Vector3};
use crate::Tolerance;

/// Queries shared by every surface primitive.
pub trait Geometry {
    /// Non-negative Euclidean distance from `point` to the nearest surface point.
    fn distance_to(&self, point: &Point3) -> Result<f64> {
        Ok(point.distance_to(&self.project_point(point)?))
    }

    /// Nearest point on the surface.
    fn project_point(&self, point: &Point3) -> Result<Point3>;

    /// Outward unit normal at the surface point nearest to `point`.
    fn surface_normal(&self, point: &Point3) -> Result<Vector3>;

    /// Intersection of the line `origin + t * direction` with the surface,
    /// taking the lowest `t` when there are several.
    fn intersect_line(&self, origin: &Point3, direction: &Vector3) -> Result<Option<Point3>>;
}

/// Every supported primitive, for heterogeneous collections.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Primitive {
    Plane(Plane),
    Sphere(Sphere),
    Ellipsoid(Ellipsoid),
    Spheroid(Spheroid),
    OblateSpheroid(OblateSpheroid),
}

impl Primitive {
    pub fn type_name(&self) -> &'static str {
        match self {
            Primitive::Plane(_) => "Plane",
            Primitive::Sphere(_) => "Sphere",
            Primitive::Ellipsoid(_) => "Ellipsoid",
            Primitive::Spheroid(_) => "Spheroid",
            Primitive::OblateSpheroid(_) => "OblateSpheroid",
        }
    }

    fn as_geometry(&self) -> &dyn Geometry {
        match self {
            Primitive::Plane(p) => p,
            Primitive::Sphere(s) => s,
            Primitive::Ellipsoid(e) => e,
            Primitive::Spheroid(s) => s,
            Primitive::OblateSpheroid(o) => o,
        }
    }
}

impl Geometry for Primitive {
    fn distance_to(&self, point: &Point3) -> Result<f64> {
        self.as_geometry().distance_to(point)
    }

    fn project_point(&self, point: &Point3) -> Result<Point3> {
        self.as_geometry().project_point(point)
    }

    fn surface_normal(&self, point: &Point3) -> Result<Vector3> {
        self.as_geometry().surface_normal(point)
    }

    fn intersect_line(&self, origin: &Point3, direction: &Vector3) -> Result<Option<Point3>> {
        self.as_geometry().intersect_line(origin, direction)
    }
}

impl From<Plane> for Primitive {
    fn from(p: Plane) -> Self {
        Primitive::Plane(p)
    }
}

impl From<Sphere> for Primitive {
    fn from(s: Sphere) -> Self {
        Primitive::Sphere(s)
    }
}

impl From<Ellipsoid> for Primitive {
    fn from(e: Ellipsoid) -> Self {
        Primitive::Ellipsoid(e)
    }
}

impl From<Spheroid> for Primitive {
    fn from(s: Spheroid) -> Self {
        Primitive::Spheroid(s)
    }
}

impl From<OblateSpheroid> for Primitive {
    fn from(o: OblateSpheroid) -> Self {
        Primitive::OblateSpheroid(o)
    }
}

/// Reject zero-length line directions.
pub(crate) fn check_direction(direction: &Vector3) -> Result<()> {
    let len = direction.length();
    if !len.is_finite() || Tolerance::default().is_zero_length(len) {
        return Err(GeomError::validation("line direction must be non-zero"));
    }
    Ok(())
}

/// Round `value` to a multiple of `precision`; zero keeps full precision.
pub(crate) fn round_to(value: f64, precision: f64) -> f64 {
    if precision > 0.0 {
        (value / precision).round() * precision
    } else {
        value
    }
}

pub(crate) fn check_precision(precision: f64) -> Result<()> {
    if precision.is_finite() && precision >= 0.0 {
        Ok(())
    } else {
        Err(GeomError::validation(format!(
            "precision must be finite and non-negative, got {precision}"
        )))
    }
}
