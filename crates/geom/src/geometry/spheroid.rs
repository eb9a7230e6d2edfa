use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Deref;

use super::ellipsoid::foot_point;
use super::{Ellipsoid, GeoPoint3, Geometry, check_precision, round_to};
use crate::config::ProjectionConfig;
use crate::error::{GeomError, Result, check_positive};
use crate::linalg::{Point3, Vector3};

/// An ellipsoid of revolution around the z axis.
///
/// Equal axes give a sphere-equivalent surface. `axis_z > axis_xy` is a
/// prolate spheroid; the conversions below handle both shapes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SpheroidParams", into = "SpheroidParams")]
pub struct Spheroid {
    ellipsoid: Ellipsoid,
}

/// Serialized form of a [`Spheroid`]; deserialization re-validates the axes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SpheroidParams {
    pub origin: Point3,
    pub axis_xy: f64,
    pub axis_z: f64,
}

impl TryFrom<SpheroidParams> for Spheroid {
    type Error = GeomError;

    fn try_from(p: SpheroidParams) -> Result<Self> {
        Spheroid::new(p.origin, p.axis_xy, p.axis_z)
    }
}

impl From<Spheroid> for SpheroidParams {
    fn from(s: Spheroid) -> Self {
        SpheroidParams {
            origin: s.origin(),
            axis_xy: s.axis_xy(),
            axis_z: s.axis_z(),
        }
    }
}

impl Spheroid {
    pub fn new(origin: Point3, axis_xy: f64, axis_z: f64) -> Result<Self> {
        Ok(Self {
            ellipsoid: Ellipsoid::new(origin, axis_xy, axis_xy, axis_z)?,
        })
    }

    pub fn origin(&self) -> Point3 {
        self.ellipsoid.origin()
    }

    pub fn set_origin(&mut self, origin: Point3) {
        self.ellipsoid.set_origin(origin);
    }

    pub fn axis_xy(&self) -> f64 {
        self.ellipsoid.axis_x()
    }

    pub fn set_axis_xy(&mut self, axis_xy: f64) -> Result<()> {
        let axis_xy = check_positive("axis_xy", axis_xy)?;
        self.ellipsoid.set_axis_x(axis_xy)?;
        self.ellipsoid.set_axis_y(axis_xy)
    }

    pub fn axis_z(&self) -> f64 {
        self.ellipsoid.axis_z()
    }

    pub fn set_axis_z(&mut self, axis_z: f64) -> Result<()> {
        self.ellipsoid.set_axis_z(axis_z)
    }

    pub fn is_sphere(&self) -> bool {
        self.axis_xy() == self.axis_z()
    }

    pub fn as_ellipsoid(&self) -> &Ellipsoid {
        &self.ellipsoid
    }

    /// `1 - c/a`; negative for prolate spheroids.
    pub fn flattening(&self) -> f64 {
        1.0 - self.axis_z() / self.axis_xy()
    }

    /// Signed first eccentricity squared, `1 - c²/a²`.
    pub fn eccentricity_squared(&self) -> f64 {
        1.0 - (self.axis_z() * self.axis_z()) / (self.axis_xy() * self.axis_xy())
    }

    /// Magnitude of the eccentricity, `√|e²|`.
    pub fn eccentricity(&self) -> f64 {
        self.eccentricity_squared().abs().sqrt()
    }

    /// Cartesian point of geodetic longitude, latitude (radians) and
    /// ellipsoidal height.
    pub fn spheroidal_to_cartesian(&self, longitude: f64, latitude: f64, height: f64) -> Point3 {
        let a = self.axis_xy();
        let e2 = self.eccentricity_squared();
        let (sin_lat, cos_lat) = latitude.sin_cos();
        let (sin_lon, cos_lon) = longitude.sin_cos();
        // Prime vertical radius of curvature.
        let n = a / (1.0 - e2 * sin_lat * sin_lat).sqrt();
        self.origin()
            + Vector3::new(
                (n + height) * cos_lat * cos_lon,
                (n + height) * cos_lat * sin_lon,
                ((1.0 - e2) * n + height) * sin_lat,
            )
    }

    /// Geodetic longitude, latitude (radians) and height of `(x, y, z)`.
    ///
    /// Latitude and height come from the nearest point on the meridian
    /// ellipse, so the conversion is exact up to the solver tolerance; height
    /// is negative inside. A `precision` above zero rounds each component to
    /// a multiple of it.
    pub fn cartesian_to_spheroidal(&self, x: f64, y: f64, z: f64, precision: f64) -> Result<Point3> {
        self.cartesian_to_spheroidal_with(x, y, z, precision, &ProjectionConfig::default())
    }

    pub fn cartesian_to_spheroidal_with(
        &self,
        x: f64,
        y: f64,
        z: f64,
        precision: f64,
        config: &ProjectionConfig,
    ) -> Result<Point3> {
        check_precision(precision)?;
        let v = Point3::new(x, y, z) - self.origin();
        let (a, c) = (self.axis_xy(), self.axis_z());

        let longitude = v.y.atan2(v.x);
        let p = v.x.hypot(v.y);
        let foot = foot_point(&[a, c], &[p, v.z], config)?;
        let (fp, fz) = (foot[0], foot[1]);

        // Direction of the surface normal at the foot point.
        let latitude = (fz / (c * c)).atan2(fp / (a * a));
        let inside = (p / a).powi(2) + (v.z / c).powi(2) < 1.0;
        let distance = (p - fp).hypot(v.z - fz);
        let height = if inside { -distance } else { distance };

        Ok(Point3::new(
            round_to(longitude, precision),
            round_to(latitude, precision),
            round_to(height, precision),
        ))
    }

    /// East, north and up unit vectors of the local tangent frame.
    pub fn enu_frame(&self, longitude: f64, latitude: f64) -> [Vector3; 3] {
        let (sin_lat, cos_lat) = latitude.sin_cos();
        let (sin_lon, cos_lon) = longitude.sin_cos();
        let east = Vector3::new(-sin_lon, cos_lon, 0.0);
        let north = Vector3::new(-sin_lat * cos_lon, -sin_lat * sin_lon, cos_lat);
        let up = Vector3::new(cos_lat * cos_lon, cos_lat * sin_lon, sin_lat);
        [east, north, up]
    }

    pub fn geo_point(&self, longitude: f64, latitude: f64, height: f64) -> GeoPoint3 {
        GeoPoint3::new(*self, longitude, latitude, height)
    }

    pub fn to_geo_point(&self, point: &Point3) -> Result<GeoPoint3> {
        let c = self.cartesian_to_spheroidal(point.x, point.y, point.z, 0.0)?;
        Ok(self.geo_point(c.x, c.y, c.z))
    }
}

impl Geometry for Spheroid {
    fn project_point(&self, point: &Point3) -> Result<Point3> {
        self.ellipsoid.project_point(point)
    }

    fn surface_normal(&self, point: &Point3) -> Result<Vector3> {
        self.ellipsoid.surface_normal(point)
    }

    fn intersect_line(&self, origin: &Point3, direction: &Vector3) -> Result<Option<Point3>> {
        self.ellipsoid.intersect_line(origin, direction)
    }
}

impl fmt::Display for Spheroid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Spheroid (origin = {}, axis_xy = {}, axis_z = {})",
            self.origin(),
            self.axis_xy(),
            self.axis_z()
        )
    }
}

/// A spheroid flattened at the poles: `axis_xy >= axis_z`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OblateSpheroid {
    spheroid: Spheroid,
}

impl OblateSpheroid {
    pub fn new(origin: Point3, axis_xy: f64, axis_z: f64) -> Result<Self> {
        let spheroid = Spheroid::new(origin, axis_xy, axis_z)?;
        check_oblate(axis_xy, axis_z)?;
        Ok(Self { spheroid })
    }

    /// Spheroid from its equatorial axis and inverse flattening `1/f`.
    /// An inverse flattening of zero denotes a sphere.
    pub fn by_flattening(origin: Point3, axis_xy: f64, inverse_flattening: f64) -> Result<Self> {
        if inverse_flattening == 0.0 {
            return Self::new(origin, axis_xy, axis_xy);
        }
        if !(inverse_flattening.is_finite() && inverse_flattening > 1.0) {
            return Err(GeomError::validation(format!(
                "inverse flattening must be 0 or greater than 1, got {inverse_flattening}"
            )));
        }
        Self::new(origin, axis_xy, axis_xy * (1.0 - 1.0 / inverse_flattening))
    }

    /// The WGS 84 reference ellipsoid, in metres.
    pub fn wgs84() -> Self {
        const SEMI_MAJOR: f64 = 6_378_137.0;
        const INVERSE_FLATTENING: f64 = 298.257_223_563;
        let semi_minor = SEMI_MAJOR * (1.0 - 1.0 / INVERSE_FLATTENING);
        Self {
            spheroid: Spheroid {
                ellipsoid: Ellipsoid::from_valid_axes(Point3::ORIGIN, SEMI_MAJOR, SEMI_MAJOR, semi_minor),
            },
        }
    }

    pub fn as_spheroid(&self) -> &Spheroid {
        &self.spheroid
    }

    pub fn set_origin(&mut self, origin: Point3) {
        self.spheroid.set_origin(origin);
    }

    pub fn set_axis_xy(&mut self, axis_xy: f64) -> Result<()> {
        check_oblate(axis_xy, self.spheroid.axis_z())?;
        self.spheroid.set_axis_xy(axis_xy)
    }

    pub fn set_axis_z(&mut self, axis_z: f64) -> Result<()> {
        check_oblate(self.spheroid.axis_xy(), axis_z)?;
        self.spheroid.set_axis_z(axis_z)
    }
}

fn check_oblate(axis_xy: f64, axis_z: f64) -> Result<()> {
    if axis_xy >= axis_z {
        Ok(())
    } else {
        Err(GeomError::validation(format!(
            "oblate spheroid needs axis_xy >= axis_z, got {axis_xy} < {axis_z}"
        )))
    }
}

impl Deref for OblateSpheroid {
    type Target = Spheroid;

    fn deref(&self) -> &Spheroid {
        &self.spheroid
    }
}

impl From<OblateSpheroid> for Spheroid {
    fn from(o: OblateSpheroid) -> Self {
        o.spheroid
    }
}

impl Geometry for OblateSpheroid {
    fn project_point(&self, point: &Point3) -> Result<Point3> {
        self.spheroid.project_point(point)
    }

    fn surface_normal(&self, point: &Point3) -> Result<Vector3> {
        self.spheroid.surface_normal(point)
    }

    fn intersect_line(&self, origin: &Point3, direction: &Vector3) -> Result<Option<Point3>> {
        self.spheroid.intersect_line(origin, direction)
    }
}

impl fmt::Display for OblateSpheroid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "OblateSpheroid (origin = {}, axis_xy = {}, axis_z = {})",
            self.origin(),
            self.axis_xy(),
            self.axis_z()
        )
    }
}
