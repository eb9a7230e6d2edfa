use std::fmt;

use super::{Geometry, check_direction};
use crate::error::Result;
use crate::linalg::{Point3, Vector3};

/// An infinite plane through `origin` with a unit `normal`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    origin: Point3,
    normal: Vector3,
}

impl Plane {
    pub fn new(origin: Point3, normal: Vector3) -> Result<Self> {
        Ok(Self {
            origin,
            normal: normal.normalized()?,
        })
    }

    /// Plane through the coordinate origin.
    pub fn from_normal(normal: Vector3) -> Result<Self> {
        Self::new(Point3::ORIGIN, normal)
    }

    pub fn xy() -> Self {
        Self {
            origin: Point3::ORIGIN,
            normal: Vector3::Z,
        }
    }

    pub fn xz() -> Self {
        Self {
            origin: Point3::ORIGIN,
            normal: Vector3::Y,
        }
    }

    pub fn yz() -> Self {
        Self {
            origin: Point3::ORIGIN,
            normal: Vector3::X,
        }
    }

    pub fn origin(&self) -> Point3 {
        self.origin
    }

    pub fn set_origin(&mut self, origin: Point3) {
        self.origin = origin;
    }

    pub fn normal(&self) -> Vector3 {
        self.normal
    }

    pub fn set_normal(&mut self, normal: Vector3) -> Result<()> {
        self.normal = normal.normalized()?;
        Ok(())
    }

    /// Distance along the normal; positive on the side the normal points to.
    pub fn signed_distance(&self, point: &Point3) -> f64 {
        (*point - self.origin).dot(&self.normal)
    }

    /// Remove the normal component of `vector`.
    pub fn project_vector(&self, vector: &Vector3) -> Vector3 {
        *vector - self.normal * vector.dot(&self.normal)
    }
}

impl Geometry for Plane {
    fn distance_to(&self, point: &Point3) -> Result<f64> {
        Ok(self.signed_distance(point).abs())
    }

    fn project_point(&self, point: &Point3) -> Result<Point3> {
        Ok(*point - self.normal * self.signed_distance(point))
    }

    fn surface_normal(&self, _point: &Point3) -> Result<Vector3> {
        Ok(self.normal)
    }

    fn intersect_line(&self, origin: &Point3, direction: &Vector3) -> Result<Option<Point3>> {
        check_direction(direction)?;
        let denom = direction.dot(&self.normal);
        if denom.abs() < 1e-12 * direction.length() {
            // Parallel to the plane.
            return Ok(None);
        }
        let t = (self.origin - *origin).dot(&self.normal) / denom;
        Ok(Some(*origin + *direction * t))
    }
}

impl fmt::Display for Plane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Plane (origin = {}, normal = {})", self.origin, self.normal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GeomError;

    #[test]
    fn test_normal_is_normalized() {
        let mut plane = Plane::new(Point3::new(0.0, 0.0, 5.0), Vector3::new(0.0, 0.0, 4.0)).unwrap();
        assert_eq!(plane.normal(), Vector3::Z);
        plane.set_normal(Vector3::new(3.0, 0.0, 4.0)).unwrap();
        assert!((plane.normal().length() - 1.0).abs() < 1e-12);
        assert!(matches!(
            plane.set_normal(Vector3::ZERO),
            Err(GeomError::Validation { .. })
        ));
        assert!(Plane::from_normal(Vector3::ZERO).is_err());
    }

    #[test]
    fn test_project_point() {
        let plane = Plane::new(Point3::new(0.0, 0.0, 5.0), Vector3::Z).unwrap();
        let q = plane.project_point(&Point3::new(1.0, 2.0, 8.0)).unwrap();
        assert_eq!(q, Point3::new(1.0, 2.0, 5.0));
        assert_eq!(plane.distance_to(&Point3::new(1.0, 2.0, 2.0)).unwrap(), 3.0);
        assert_eq!(plane.signed_distance(&Point3::new(1.0, 2.0, 2.0)), -3.0);
    }

    #[test]
    fn test_project_vector() {
        let v = Plane::xy().project_vector(&Vector3::new(1.0, 2.0, 3.0));
        assert_eq!(v, Vector3::new(1.0, 2.0, 0.0));
    }

    #[test]
    fn test_intersect_line() {
        let plane = Plane::new(Point3::new(0.0, 0.0, 2.0), Vector3::Z).unwrap();
        let hit = plane
            .intersect_line(&Point3::new(1.0, 1.0, 0.0), &Vector3::new(0.0, 0.0, 1.0))
            .unwrap();
        assert_eq!(hit, Some(Point3::new(1.0, 1.0, 2.0)));

        // Behind the line origin still counts: lines are infinite.
        let hit = plane
            .intersect_line(&Point3::new(0.0, 0.0, 5.0), &Vector3::Z)
            .unwrap();
        assert_eq!(hit, Some(Point3::new(0.0, 0.0, 2.0)));

        let parallel = plane.intersect_line(&Point3::ORIGIN, &Vector3::X).unwrap();
        assert_eq!(parallel, None);
    }
}
