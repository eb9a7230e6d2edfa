use serde::{Deserialize, Serialize};
use std::fmt;

use super::Spheroid;
use crate::error::{GeomError, Result};
use crate::linalg::{Point3, Vector3};

/// A geographic position: longitude and latitude in radians plus height
/// above a reference spheroid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint3 {
    reference: Spheroid,
    longitude: f64,
    latitude: f64,
    height: f64,
}

impl GeoPoint3 {
    pub fn new(reference: Spheroid, longitude: f64, latitude: f64, height: f64) -> Self {
        Self {
            reference,
            longitude,
            latitude,
            height,
        }
    }

    pub fn reference(&self) -> &Spheroid {
        &self.reference
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn set_longitude(&mut self, longitude: f64) {
        self.longitude = longitude;
    }

    pub fn set_latitude(&mut self, latitude: f64) {
        self.latitude = latitude;
    }

    pub fn set_height(&mut self, height: f64) {
        self.height = height;
    }

    pub fn to_cartesian(&self) -> Point3 {
        self.reference
            .spheroidal_to_cartesian(self.longitude, self.latitude, self.height)
    }

    /// East, north and up unit vectors at this point.
    pub fn local_frame(&self) -> [Vector3; 3] {
        self.reference.enu_frame(self.longitude, self.latitude)
    }

    /// Move by `enu` (east, north, up) in the tangent frame at this point.
    pub fn offset(&self, enu: &Vector3) -> Result<GeoPoint3> {
        let [east, north, up] = self.local_frame();
        let moved = self.to_cartesian() + east * enu.x + north * enu.y + up * enu.z;
        self.reference.to_geo_point(&moved)
    }

    /// Displacement from this point to `other`, expressed in the tangent
    /// frame at this point.
    pub fn displacement_to(&self, other: &GeoPoint3) -> Result<Vector3> {
        if self.reference != other.reference {
            return Err(GeomError::validation(
                "geographic points refer to different spheroids",
            ));
        }
        let [east, north, up] = self.local_frame();
        let d = other.to_cartesian() - self.to_cartesian();
        Ok(Vector3::new(d.dot(&east), d.dot(&north), d.dot(&up)))
    }
}

impl fmt::Display for GeoPoint3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "GeoPoint3 ({}, {}, {})",
            self.longitude, self.latitude, self.height
        )
    }
}
