use std::f64::consts::FRAC_PI_2;
use std::fmt;

use super::{Geometry, check_direction, check_precision, round_to};
use crate::error::{GeomError, Result, check_positive};
use crate::linalg::{Point3, Vector3};
use crate::roots::solve_quadratic;
use crate::Tolerance;

/// A sphere given by its centre and a strictly positive radius.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sphere {
    origin: Point3,
    radius: f64,
}

impl Sphere {
    pub fn new(origin: Point3, radius: f64) -> Result<Self> {
        Ok(Self {
            origin,
            radius: check_positive("radius", radius)?,
        })
    }

    /// Unit sphere at the coordinate origin.
    pub fn unit() -> Self {
        Self {
            origin: Point3::ORIGIN,
            radius: 1.0,
        }
    }

    pub fn origin(&self) -> Point3 {
        self.origin
    }

    pub fn set_origin(&mut self, origin: Point3) {
        self.origin = origin;
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn set_radius(&mut self, radius: f64) -> Result<()> {
        self.radius = check_positive("radius", radius)?;
        Ok(())
    }

    /// Distance from the centre minus the radius; negative inside.
    pub fn signed_distance(&self, point: &Point3) -> f64 {
        self.origin.distance_to(point) - self.radius
    }

    /// Arc length over the surface from the point below an observer at
    /// `height` to the observer's horizon.
    pub fn distance_to_horizon(&self, height: f64) -> Result<f64> {
        if !(height >= 0.0) {
            return Err(GeomError::degenerate(format!(
                "height must be non-negative to see a horizon, got {height}"
            )));
        }
        Ok(self.radius * (self.radius / (self.radius + height)).acos())
    }

    /// Point where the line of sight from `viewpoint` grazes the sphere.
    ///
    /// `direction` is an azimuth in radians in the tangent frame below the
    /// viewpoint: 0 points east, π/2 north.
    pub fn point_on_horizon(&self, viewpoint: &Point3, direction: f64) -> Result<Point3> {
        let local = (*viewpoint - self.origin) / self.radius;
        let q = unit_sphere_horizon(&local, direction, false)?;
        Ok(self.origin + q * self.radius)
    }

    /// Longitude, latitude (radians) and height above the surface of the
    /// point `(x, y, z)`, relative to the sphere origin.
    ///
    /// A `precision` above zero rounds each component to a multiple of it.
    pub fn cartesian_to_spherical(&self, x: f64, y: f64, z: f64, precision: f64) -> Result<Point3> {
        check_precision(precision)?;
        let offset = Point3::new(x, y, z) - self.origin;
        let radial = offset.length();
        if Tolerance::default().is_zero_length(radial) {
            return Err(GeomError::degenerate("the sphere centre has no direction"));
        }
        let latitude = (offset.z / radial).clamp(-1.0, 1.0).asin();
        let longitude = offset.y.atan2(offset.x);
        let height = radial - self.radius;
        Ok(Point3::new(
            round_to(longitude, precision),
            round_to(latitude, precision),
            round_to(height, precision),
        ))
    }

    pub fn spherical_to_cartesian(&self, longitude: f64, latitude: f64, height: f64) -> Point3 {
        let radial = self.radius + height;
        let (sin_lat, cos_lat) = latitude.sin_cos();
        let (sin_lon, cos_lon) = longitude.sin_cos();
        self.origin + Vector3::new(radial * cos_lat * cos_lon, radial * cos_lat * sin_lon, radial * sin_lat)
    }

    fn direction_from_centre(&self, point: &Point3) -> Result<Vector3> {
        (*point - self.origin)
            .normalized()
            .map_err(|_| GeomError::degenerate("every surface point is nearest to the sphere centre"))
    }
}

impl Geometry for Sphere {
    fn distance_to(&self, point: &Point3) -> Result<f64> {
        Ok(self.signed_distance(point).abs())
    }

    fn project_point(&self, point: &Point3) -> Result<Point3> {
        Ok(self.origin + self.direction_from_centre(point)? * self.radius)
    }

    fn surface_normal(&self, point: &Point3) -> Result<Vector3> {
        self.direction_from_centre(point)
    }

    fn intersect_line(&self, origin: &Point3, direction: &Vector3) -> Result<Option<Point3>> {
        check_direction(direction)?;
        Ok(sphere_line_parameter(&(*origin - self.origin), direction, self.radius)
            .map(|t| *origin + *direction * t))
    }
}

impl fmt::Display for Sphere {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Sphere (origin = {}, radius = {})", self.origin, self.radius)
    }
}

/// Lowest parameter `t` at which `offset + t * direction` lies on a sphere of
/// `radius` around the coordinate origin.
pub(crate) fn sphere_line_parameter(offset: &Vector3, direction: &Vector3, radius: f64) -> Option<f64> {
    let a = direction.dot(direction);
    let b = 2.0 * direction.dot(offset);
    let c = offset.dot(offset) - radius * radius;
    solve_quadratic(a, b, c).first().copied()
}

/// Horizon point on the unit sphere seen from `viewpoint` (unit-sphere
/// coordinates) towards azimuth `direction`.
///
/// With `pole_limit` set, a horizon whose latitude would run past a pole is
/// clamped to that pole.
pub(crate) fn unit_sphere_horizon(viewpoint: &Vector3, direction: f64, pole_limit: bool) -> Result<Vector3> {
    let d = viewpoint.length();
    if Tolerance::default().is_zero_length(d) {
        return Err(GeomError::degenerate("viewpoint is at the centre"));
    }
    if d < 1.0 - 1e-12 {
        return Err(GeomError::degenerate("viewpoint lies inside the surface"));
    }
    let d = d.max(1.0);
    let up = *viewpoint / d;
    let theta = (1.0 / d).acos();

    if pole_limit {
        let latitude = up.z.clamp(-1.0, 1.0).asin() + direction.sin() * theta;
        if latitude > FRAC_PI_2 {
            return Ok(Vector3::Z);
        }
        if latitude < -FRAC_PI_2 {
            return Ok(-Vector3::Z);
        }
    }

    // Local east/north frame; fall back to +x as east directly above a pole.
    let east = Vector3::Z.cross(&up).normalized().unwrap_or(Vector3::X);
    let north = up.cross(&east);
    let (sin_dir, cos_dir) = direction.sin_cos();
    let towards = east * cos_dir + north * sin_dir;
    let (sin_t, cos_t) = theta.sin_cos();
    Ok(up * cos_t + towards * sin_t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_4, PI};

    #[test]
    fn test_radius_validation() {
        assert!(Sphere::new(Point3::ORIGIN, 0.0).is_err());
        assert!(Sphere::new(Point3::ORIGIN, -1.0).is_err());
        let mut s = Sphere::unit();
        assert!(s.set_radius(f64::NAN).is_err());
        assert_eq!(s.radius(), 1.0);
        s.set_radius(3.0).unwrap();
        assert_eq!(s.radius(), 3.0);
    }

    #[test]
    fn test_project_point() {
        let s = Sphere::new(Point3::new(1.0, 0.0, 0.0), 2.0).unwrap();
        let q = s.project_point(&Point3::new(1.0, 0.0, 10.0)).unwrap();
        assert!(q.distance_to(&Point3::new(1.0, 0.0, 2.0)) < 1e-12);
        // Inside, 1.5 from the centre of a radius-2 sphere.
        assert!((s.distance_to(&Point3::new(1.0, 0.0, 1.5)).unwrap() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_centre_is_degenerate() {
        let s = Sphere::unit();
        assert!(matches!(
            s.project_point(&Point3::ORIGIN),
            Err(GeomError::DegenerateInput { .. })
        ));
        assert!(s.surface_normal(&Point3::ORIGIN).is_err());
        assert!(s.cartesian_to_spherical(0.0, 0.0, 0.0, 0.0).is_err());
    }

    #[test]
    fn test_intersect_line_lowest_parameter() {
        let s = Sphere::unit();
        let hit = s
            .intersect_line(&Point3::new(-5.0, 0.0, 0.0), &Vector3::X)
            .unwrap()
            .unwrap();
        assert!(hit.distance_to(&Point3::new(-1.0, 0.0, 0.0)) < 1e-12);

        let miss = s.intersect_line(&Point3::new(0.0, 2.0, 0.0), &Vector3::X).unwrap();
        assert_eq!(miss, None);

        // Tangent lines touch once.
        let touch = s
            .intersect_line(&Point3::new(-3.0, 1.0, 0.0), &Vector3::X)
            .unwrap()
            .unwrap();
        assert!(touch.distance_to(&Point3::new(0.0, 1.0, 0.0)) < 1e-9);
    }

    #[test]
    fn test_intersect_line_small_sphere() {
        let s = Sphere::new(Point3::ORIGIN, 1e-7).unwrap();
        let hit = s
            .intersect_line(&Point3::new(-1e-6, 0.0, 0.0), &Vector3::X)
            .unwrap()
            .unwrap();
        assert!(hit.distance_to(&Point3::new(-1e-7, 0.0, 0.0)) < 1e-19);
        assert!(s.signed_distance(&hit).abs() < 1e-19);
    }

    #[test]
    fn test_distance_to_horizon() {
        let s = Sphere::unit();
        assert_eq!(s.distance_to_horizon(0.0).unwrap(), 0.0);
        // From height 1 the horizon is 60 degrees away.
        assert!((s.distance_to_horizon(1.0).unwrap() - PI / 3.0).abs() < 1e-12);
        assert!(s.distance_to_horizon(-0.1).is_err());
    }

    #[test]
    fn test_point_on_horizon_is_tangent() {
        let s = Sphere::new(Point3::new(1.0, 2.0, 3.0), 2.0).unwrap();
        let viewpoint = Point3::new(1.0, 2.0, 3.0) + Vector3::new(3.0, 1.0, 2.0);
        for k in 0..8 {
            let q = s.point_on_horizon(&viewpoint, k as f64 * FRAC_PI_4).unwrap();
            assert!(s.signed_distance(&q).abs() < 1e-9);
            let tangency = (q - viewpoint).dot(&(q - s.origin()));
            assert!(tangency.abs() < 1e-9, "direction {k}: {tangency}");
        }
    }

    #[test]
    fn test_point_on_horizon_direction() {
        let s = Sphere::unit();
        let viewpoint = Point3::new(2.0, 0.0, 0.0);
        let east = s.point_on_horizon(&viewpoint, 0.0).unwrap();
        let north = s.point_on_horizon(&viewpoint, FRAC_PI_2).unwrap();
        assert!(east.y > 0.0 && east.z.abs() < 1e-12);
        assert!(north.z > 0.0 && north.y.abs() < 1e-12);
        assert!((east.x - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_point_on_horizon_from_inside() {
        let s = Sphere::unit();
        let err = s.point_on_horizon(&Point3::new(0.5, 0.0, 0.0), 0.0).unwrap_err();
        assert!(matches!(err, GeomError::DegenerateInput { .. }));
        // Above a pole the frame is still defined.
        let q = s.point_on_horizon(&Point3::new(0.0, 0.0, 2.0), 0.0).unwrap();
        assert!((q.z - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_spherical_round_trip() {
        let s = Sphere::new(Point3::new(10.0, -4.0, 2.0), 6.0).unwrap();
        let p = s.spherical_to_cartesian(0.8, -0.3, 1.5);
        let c = s.cartesian_to_spherical(p.x, p.y, p.z, 0.0).unwrap();
        assert!((c.x - 0.8).abs() < 1e-12);
        assert!((c.y + 0.3).abs() < 1e-12);
        assert!((c.z - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_spherical_precision() {
        let s = Sphere::unit();
        let c = s.cartesian_to_spherical(0.0, 2.0, 0.0, 0.25).unwrap();
        // Longitude π/2 rounds to 1.5; height is exactly 1.
        assert_eq!(c.x, 1.5);
        assert_eq!(c.y, 0.0);
        assert_eq!(c.z, 1.0);
        assert!(s.cartesian_to_spherical(0.0, 2.0, 0.0, -1.0).is_err());
    }
}
