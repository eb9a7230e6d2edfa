use std::fmt;
use std::iter;

use tracing::{instrument, trace, warn};

use super::sphere::{sphere_line_parameter, unit_sphere_horizon};
use super::{Geometry, check_direction};
use crate::config::ProjectionConfig;
use crate::error::{GeomError, Result, check_positive};
use crate::linalg::{Matrix4x4, Point3, Vector3};

/// A triaxial ellipsoid: `(x/a)² + (y/b)² + (z/c)² = 1` around `origin`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ellipsoid {
    origin: Point3,
    axis_x: f64,
    axis_y: f64,
    axis_z: f64,
}

impl Ellipsoid {
    pub fn new(origin: Point3, axis_x: f64, axis_y: f64, axis_z: f64) -> Result<Self> {
        Ok(Self {
            origin,
            axis_x: check_positive("axis_x", axis_x)?,
            axis_y: check_positive("axis_y", axis_y)?,
            axis_z: check_positive("axis_z", axis_z)?,
        })
    }

    // Callers guarantee finite, positive axes.
    pub(crate) fn from_valid_axes(origin: Point3, axis_x: f64, axis_y: f64, axis_z: f64) -> Self {
        Self {
            origin,
            axis_x,
            axis_y,
            axis_z,
        }
    }

    pub fn origin(&self) -> Point3 {
        self.origin
    }

    pub fn set_origin(&mut self, origin: Point3) {
        self.origin = origin;
    }

    pub fn axis_x(&self) -> f64 {
        self.axis_x
    }

    pub fn set_axis_x(&mut self, axis_x: f64) -> Result<()> {
        self.axis_x = check_positive("axis_x", axis_x)?;
        Ok(())
    }

    pub fn axis_y(&self) -> f64 {
        self.axis_y
    }

    pub fn set_axis_y(&mut self, axis_y: f64) -> Result<()> {
        self.axis_y = check_positive("axis_y", axis_y)?;
        Ok(())
    }

    pub fn axis_z(&self) -> f64 {
        self.axis_z
    }

    pub fn set_axis_z(&mut self, axis_z: f64) -> Result<()> {
        self.axis_z = check_positive("axis_z", axis_z)?;
        Ok(())
    }

    pub fn axes(&self) -> [f64; 3] {
        [self.axis_x, self.axis_y, self.axis_z]
    }

    /// Maps the unit sphere at the coordinate origin onto this ellipsoid.
    pub fn transformation(&self) -> Matrix4x4 {
        Matrix4x4::translation(self.origin.x, self.origin.y, self.origin.z)
            * Matrix4x4::scaling(self.axis_x, self.axis_y, self.axis_z)
    }

    pub fn inverse_transformation(&self) -> Matrix4x4 {
        Matrix4x4::scaling(1.0 / self.axis_x, 1.0 / self.axis_y, 1.0 / self.axis_z)
            * Matrix4x4::translation(-self.origin.x, -self.origin.y, -self.origin.z)
    }

    /// `(x/a)² + (y/b)² + (z/c)²` relative to the origin: 1 on the surface,
    /// below 1 inside.
    pub fn implicit_value(&self, point: &Point3) -> f64 {
        let v = *point - self.origin;
        (v.x / self.axis_x).powi(2) + (v.y / self.axis_y).powi(2) + (v.z / self.axis_z).powi(2)
    }

    /// Nearest surface point, with an explicit bound on the iterative solve.
    #[instrument(level = "debug", skip(self, config))]
    pub fn project_point_with(&self, point: &Point3, config: &ProjectionConfig) -> Result<Point3> {
        let local = *point - self.origin;
        let foot = foot_point(&self.axes(), &local.to_array(), config)?;
        Ok(self.origin + Vector3::new(foot[0], foot[1], foot[2]))
    }

    /// Horizon point seen from `viewpoint` towards azimuth `direction`
    /// (0 = east, π/2 = north), computed on the unit sphere and mapped back.
    ///
    /// `pole_limit` stops the horizon at a pole instead of running past it.
    pub fn point_on_horizon(&self, viewpoint: &Point3, direction: f64, pole_limit: bool) -> Result<Point3> {
        let local = self.inverse_transformation().transform_point(viewpoint).to_vector();
        let q = unit_sphere_horizon(&local, direction, pole_limit)?;
        Ok(self.transformation().transform_point(&(Point3::ORIGIN + q)))
    }

    /// Normalized gradient of the implicit function at a surface point.
    fn gradient_normal(&self, surface_point: &Point3) -> Result<Vector3> {
        let v = *surface_point - self.origin;
        Vector3::new(
            v.x / (self.axis_x * self.axis_x),
            v.y / (self.axis_y * self.axis_y),
            v.z / (self.axis_z * self.axis_z),
        )
        .normalized()
    }
}

impl Geometry for Ellipsoid {
    fn project_point(&self, point: &Point3) -> Result<Point3> {
        self.project_point_with(point, &ProjectionConfig::default())
    }

    fn surface_normal(&self, point: &Point3) -> Result<Vector3> {
        self.gradient_normal(&self.project_point(point)?)
    }

    fn intersect_line(&self, origin: &Point3, direction: &Vector3) -> Result<Option<Point3>> {
        check_direction(direction)?;
        // Affine maps keep line parameters, so `t` found on the unit sphere
        // applies to the input line.
        let inverse = self.inverse_transformation();
        let local_origin = inverse.transform_point(origin).to_vector();
        let local_direction = inverse.transform_vector(direction);
        Ok(sphere_line_parameter(&local_origin, &local_direction, 1.0).map(|t| *origin + *direction * t))
    }
}

impl fmt::Display for Ellipsoid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Ellipsoid (origin = {}, axes = {}, {}, {})",
            self.origin, self.axis_x, self.axis_y, self.axis_z
        )
    }
}

/// Nearest point on the axis-aligned ellipsoid (or ellipse, for two axes)
/// with semi-axes `axes`, centred at the coordinate origin.
///
/// Works in the first octant with axes sorted descending, then restores the
/// caller's signs and axis order.
pub(crate) fn foot_point(axes: &[f64], point: &[f64], config: &ProjectionConfig) -> Result<Vec<f64>> {
    let mut order: Vec<usize> = (0..axes.len()).collect();
    order.sort_by(|&i, &j| axes[j].total_cmp(&axes[i]));
    let e: Vec<f64> = order.iter().map(|&i| axes[i]).collect();
    let y: Vec<f64> = order.iter().map(|&i| point[i].abs()).collect();

    let x = sorted_foot_point(&e, &y, config)?;

    let mut result = vec![0.0; axes.len()];
    for (k, &i) in order.iter().enumerate() {
        result[i] = x[k].copysign(point[i]);
    }
    Ok(result)
}

// `e` descending, `y` non-negative.
fn sorted_foot_point(e: &[f64], y: &[f64], config: &ProjectionConfig) -> Result<Vec<f64>> {
    let last = e.len() - 1;
    if last == 0 {
        return Ok(vec![e[0]]);
    }

    if y[last] > 0.0 {
        if y[..last].iter().any(|&v| v == 0.0) {
            // Zero coordinates stay zero; solve in the remaining dimensions.
            let keep: Vec<usize> = (0..last).filter(|&i| y[i] > 0.0).chain(iter::once(last)).collect();
            let sub_e: Vec<f64> = keep.iter().map(|&i| e[i]).collect();
            let sub_y: Vec<f64> = keep.iter().map(|&i| y[i]).collect();
            let sub = sorted_foot_point(&sub_e, &sub_y, config)?;
            let mut x = vec![0.0; e.len()];
            for (k, &i) in keep.iter().enumerate() {
                x[i] = sub[k];
            }
            return Ok(x);
        }

        let e_last = e[last];
        let s = bisect_multiplier(e, y, config)?;
        return Ok(e
            .iter()
            .zip(y)
            .map(|(&ei, &yi)| {
                let r = (ei / e_last).powi(2);
                r * yi / (s + r)
            })
            .collect());
    }

    // On the plane of the smallest axis: the foot point leaves the plane only
    // when the point lies inside the evolute.
    let e_last = e[last];
    let mut scaled = Vec::with_capacity(last);
    for i in 0..last {
        let denom = e[i] * e[i] - e_last * e_last;
        let numer = e[i] * y[i];
        if numer >= denom {
            break;
        }
        scaled.push(numer / denom);
    }
    if scaled.len() == last {
        let discr = 1.0 - scaled.iter().map(|v| v * v).sum::<f64>();
        if discr > 0.0 {
            let mut x: Vec<f64> = scaled.iter().zip(e).map(|(xde, ei)| ei * xde).collect();
            x.push(e_last * discr.sqrt());
            return Ok(x);
        }
    }

    let mut x = sorted_foot_point(&e[..last], &y[..last], config)?;
    x.push(0.0);
    Ok(x)
}

/// Root of `Σ (rᵢ zᵢ / (s + rᵢ))² = 1` by bisection, where `zᵢ = yᵢ / eᵢ`
/// and `rᵢ = (eᵢ / e_last)²`. Every `yᵢ` is strictly positive.
fn bisect_multiplier(e: &[f64], y: &[f64], config: &ProjectionConfig) -> Result<f64> {
    let last = e.len() - 1;
    let e_last = e[last];
    let terms: Vec<(f64, f64)> = e
        .iter()
        .zip(y)
        .map(|(&ei, &yi)| (yi / ei, (ei / e_last).powi(2)))
        .collect();
    let g = |s: f64| -> f64 {
        terms
            .iter()
            .map(|&(z, r)| {
                let ratio = r * z / (s + r);
                ratio * ratio
            })
            .sum::<f64>()
            - 1.0
    };

    let g0 = g(0.0);
    if g0 == 0.0 {
        return Ok(0.0);
    }

    let mut s0 = terms[last].0 - 1.0;
    let mut s1 = if g0 < 0.0 {
        0.0
    } else {
        terms.iter().map(|&(z, r)| (r * z).powi(2)).sum::<f64>().sqrt() - 1.0
    };

    let mut s = s0;
    for iteration in 0..config.max_iterations {
        s = 0.5 * (s0 + s1);
        if s == s0 || s == s1 || s1 - s0 <= config.tolerance * s.abs().max(1.0) {
            trace!(iteration, "foot point bisection converged");
            return Ok(s);
        }
        let value = g(s);
        if value > 0.0 {
            s0 = s;
        } else if value < 0.0 {
            s1 = s;
        } else {
            trace!(iteration, "foot point bisection hit an exact root");
            return Ok(s);
        }
    }

    let residual = g(s);
    warn!(max_iterations = config.max_iterations, residual, "foot point bisection did not converge");
    Err(GeomError::NonConvergence {
        max_iterations: config.max_iterations,
        residual,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triaxial() -> Ellipsoid {
        Ellipsoid::new(Point3::ORIGIN, 3.0, 2.0, 1.0).unwrap()
    }

    #[test]
    fn test_axis_validation() {
        assert!(Ellipsoid::new(Point3::ORIGIN, 1.0, 0.0, 1.0).is_err());
        let mut e = triaxial();
        assert!(e.set_axis_z(-2.0).is_err());
        assert_eq!(e.axis_z(), 1.0);
        e.set_axis_y(5.0).unwrap();
        assert_eq!(e.axes(), [3.0, 5.0, 1.0]);
    }

    #[test]
    fn test_transformations_are_inverse() {
        let e = Ellipsoid::new(Point3::new(1.0, 2.0, 3.0), 3.0, 2.0, 1.0).unwrap();
        let on_surface = e.transformation().transform_point(&Point3::new(0.0, 1.0, 0.0));
        assert!(on_surface.distance_to(&Point3::new(1.0, 4.0, 3.0)) < 1e-12);
        let back = e.inverse_transformation().transform_point(&on_surface);
        assert!(back.distance_to(&Point3::new(0.0, 1.0, 0.0)) < 1e-12);
    }

    #[test]
    fn test_project_on_axes() {
        let e = triaxial();
        let q = e.project_point(&Point3::new(5.0, 0.0, 0.0)).unwrap();
        assert!(q.distance_to(&Point3::new(3.0, 0.0, 0.0)) < 1e-12);
        let q = e.project_point(&Point3::new(0.0, -7.0, 0.0)).unwrap();
        assert!(q.distance_to(&Point3::new(0.0, -2.0, 0.0)) < 1e-12);
    }

    #[test]
    fn test_project_centre_picks_shortest_axis() {
        let e = Ellipsoid::new(Point3::new(1.0, 1.0, 1.0), 3.0, 1.0, 2.0).unwrap();
        let q = e.project_point(&Point3::new(1.0, 1.0, 1.0)).unwrap();
        assert!(q.distance_to(&Point3::new(1.0, 2.0, 1.0)) < 1e-12);
        assert!((e.distance_to(&e.origin()).unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_project_inside_evolute() {
        let e = triaxial();
        let p = Point3::new(0.1, 0.0, 0.0);
        let q = e.project_point(&p).unwrap();
        assert!((e.implicit_value(&q) - 1.0).abs() < 1e-12);
        // Closer than either pole of the shortest axis.
        assert!(p.distance_to(&q) < p.distance_to(&Point3::new(0.0, 0.0, 1.0)));
    }

    #[test]
    fn test_project_general_point() {
        let e = triaxial();
        for p in [Point3::new(2.0, 3.0, 4.0), Point3::new(-0.5, 0.3, 0.2), Point3::new(1.0, -1.0, -2.0)] {
            let q = e.project_point(&p).unwrap();
            assert!((e.implicit_value(&q) - 1.0).abs() < 1e-9, "{p}");
            let normal = e.surface_normal(&p).unwrap();
            let residual = p - q;
            assert!(residual.cross(&normal).length() < 1e-9 * residual.length().max(1.0), "{p}");
        }
    }

    #[test]
    fn test_iteration_bound() {
        let e = triaxial();
        let config = ProjectionConfig {
            max_iterations: 1,
            ..ProjectionConfig::default()
        };
        let err = e.project_point_with(&Point3::new(2.0, 3.0, 4.0), &config).unwrap_err();
        assert!(matches!(err, GeomError::NonConvergence { max_iterations: 1, .. }));
    }

    #[test]
    fn test_intersect_line() {
        let e = triaxial();
        let hit = e
            .intersect_line(&Point3::new(-10.0, 0.0, 0.0), &Vector3::new(2.0, 0.0, 0.0))
            .unwrap()
            .unwrap();
        assert!(hit.distance_to(&Point3::new(-3.0, 0.0, 0.0)) < 1e-12);
        let miss = e.intersect_line(&Point3::new(0.0, 0.0, 5.0), &Vector3::X).unwrap();
        assert_eq!(miss, None);
    }

    #[test]
    fn test_horizon_is_tangent() {
        let e = triaxial();
        let viewpoint = Point3::new(4.0, 1.0, 0.5);
        for k in 0..6 {
            let q = e.point_on_horizon(&viewpoint, k as f64, false).unwrap();
            assert!((e.implicit_value(&q) - 1.0).abs() < 1e-9);
            let normal = e.gradient_normal(&q).unwrap();
            assert!((q - viewpoint).normalized().unwrap().dot(&normal).abs() < 1e-9);
        }
        assert!(e.point_on_horizon(&Point3::new(0.5, 0.0, 0.0), 0.0, false).is_err());
    }

    #[test]
    fn test_horizon_pole_limit() {
        let e = triaxial();
        // High above the north pole region, looking north.
        let viewpoint = Point3::new(0.0, 0.5, 3.0);
        let q = e.point_on_horizon(&viewpoint, std::f64::consts::FRAC_PI_2, true).unwrap();
        assert!(q.distance_to(&Point3::new(0.0, 0.0, 1.0)) < 1e-12);
    }
}
