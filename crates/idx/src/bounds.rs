use serde::{Deserialize, Serialize};
use std::fmt;

use spatium_geom::{GeomError, Point3, Result, Vector3};

/// Axis-aligned box described by its centre and half-extents.
///
/// Corners are stored directly so that splitting a box at its centre yields
/// children whose faces coincide exactly with the parent's.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    min: Point3,
    max: Point3,
}

impl Bounds {
    pub fn new(center: Point3, extents: Vector3) -> Result<Self> {
        let valid = |v: f64| v.is_finite() && v >= 0.0;
        if !(valid(extents.x) && valid(extents.y) && valid(extents.z)) || !center.is_finite() {
            return Err(GeomError::validation(format!(
                "bounds need a finite centre and non-negative extents, got {center} and {extents}"
            )));
        }
        Ok(Self {
            min: center - extents,
            max: center + extents,
        })
    }

    pub fn from_min_max(min: Point3, max: Point3) -> Result<Self> {
        if !(min.is_finite() && max.is_finite()) || min.x > max.x || min.y > max.y || min.z > max.z {
            return Err(GeomError::validation(format!(
                "bounds minimum {min} exceeds maximum {max}"
            )));
        }
        Ok(Self { min, max })
    }

    /// Minimum bounding box of `points`; `None` when there are none.
    pub fn from_points(points: &[Point3]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let (mut min, mut max) = (*first, *first);
        for p in rest {
            min = Point3::new(min.x.min(p.x), min.y.min(p.y), min.z.min(p.z));
            max = Point3::new(max.x.max(p.x), max.y.max(p.y), max.z.max(p.z));
        }
        Some(Self { min, max })
    }

    pub fn center(&self) -> Point3 {
        self.min.midpoint(&self.max)
    }

    /// Half the size along each axis.
    pub fn extents(&self) -> Vector3 {
        (self.max - self.min) * 0.5
    }

    pub fn min(&self) -> Point3 {
        self.min
    }

    pub fn max(&self) -> Point3 {
        self.max
    }

    /// Full size along `axis` (0 = x, 1 = y, 2 = z).
    pub fn diameter(&self, axis: usize) -> Result<f64> {
        match axis {
            0 => Ok(self.max.x - self.min.x),
            1 => Ok(self.max.y - self.min.y),
            2 => Ok(self.max.z - self.min.z),
            _ => Err(GeomError::IndexOutOfRange { index: axis, len: 3 }),
        }
    }

    /// Inclusive on every face.
    pub fn contains(&self, p: &Point3) -> bool {
        p.x >= self.min.x
            && p.x <= self.max.x
            && p.y >= self.min.y
            && p.y <= self.max.y
            && p.z >= self.min.z
            && p.z <= self.max.z
    }

    pub fn intersects(&self, other: &Bounds) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }

    /// Squared distance from `p` to the nearest point of the box; zero inside.
    pub fn distance_squared_to(&self, p: &Point3) -> f64 {
        let clamped = Point3::new(
            p.x.clamp(self.min.x, self.max.x),
            p.y.clamp(self.min.y, self.max.y),
            p.z.clamp(self.min.z, self.max.z),
        );
        clamped.distance_squared_to(p)
    }

    /// Smallest box anchored at `min` whose x and y sizes are equal.
    ///
    /// The result always contains `self`, even where `min + side` rounds
    /// below the original maximum.
    pub fn square_xy(&self) -> Bounds {
        let side = (self.max.x - self.min.x).max(self.max.y - self.min.y);
        Bounds {
            min: self.min,
            max: Point3::new(
                (self.min.x + side).max(self.max.x),
                (self.min.y + side).max(self.max.y),
                self.max.z,
            ),
        }
    }

    /// One of the four x/y quadrants; z is kept whole.
    ///
    /// 0 = low x, low y; 1 = high x, low y; 2 = low x, high y; 3 = high x, high y.
    pub fn quadrant(&self, index: usize) -> Result<Bounds> {
        if index >= 4 {
            return Err(GeomError::IndexOutOfRange { index, len: 4 });
        }
        let c = self.center();
        let (min_x, max_x) = if index & 1 == 0 { (self.min.x, c.x) } else { (c.x, self.max.x) };
        let (min_y, max_y) = if index & 2 == 0 { (self.min.y, c.y) } else { (c.y, self.max.y) };
        Ok(Bounds {
            min: Point3::new(min_x, min_y, self.min.z),
            max: Point3::new(max_x, max_y, self.max.z),
        })
    }
}

impl fmt::Display for Bounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Bounds (min = {}, max = {})", self.min, self.max)
    }
}
