//! Rectangle arithmetic on latitude/longitude boxes.
//!
//! Boxes are small enough that a spherical-earth, flat-rectangle
//! approximation holds: latitude degrees have a constant length, longitude
//! degrees shrink with `cos(latitude)`.

use std::{f64::consts::PI, fmt};

use geo::{coord, Polygon, Rect};
use serde::{Deserialize, Serialize};

/// Mean earth radius in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;
/// Length of one degree of latitude.
pub const KM_PER_DEGREE: f64 = EARTH_RADIUS_KM * PI / 180.0;
/// Tolerance for comparing box edges. Shared by split and merge paths.
pub const EDGE_EPSILON: f64 = 1e-9;

/// Axis along which two boxes touch (or along which a box is halved).
///
/// `Lat` means the boxes are stacked north/south and share a horizontal
/// edge; `Lon` means they sit side by side and share a vertical edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    Lat,
    Lon,
}

/// Axis-aligned rectangle in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub min_lon: f64,
    pub max_lat: f64,
    pub max_lon: f64,
}

////////////////////////////////////////////////////////////////////////////////
// Inherent methods
////////////////////////////////////////////////////////////////////////////////

impl BoundingBox {
    /// Creates a box from its south-west and north-east corners.
    pub fn new(
        min_lat: f64,
        min_lon: f64,
        max_lat: f64,
        max_lon: f64,
    ) -> Self {
        Self {
            min_lat,
            min_lon,
            max_lat,
            max_lon,
        }
    }

    pub fn lat_span(&self) -> f64 {
        self.max_lat - self.min_lat
    }

    pub fn lon_span(&self) -> f64 {
        self.max_lon - self.min_lon
    }

    /// Latitude of the box centre.
    pub fn center_lat(&self) -> f64 {
        (self.min_lat + self.max_lat) * 0.5
    }

    /// North-south extent in kilometres.
    pub fn height_km(&self) -> f64 {
        self.lat_span() * KM_PER_DEGREE
    }

    /// East-west extent in kilometres, measured at the centre latitude.
    pub fn width_km(&self) -> f64 {
        self.lon_span() * KM_PER_DEGREE * lat_scale(self.center_lat())
    }

    /// Area in square degrees.
    pub fn area(&self) -> f64 {
        self.lat_span() * self.lon_span()
    }

    /// Physically longer side. Ties go to latitude.
    pub fn longer_axis(&self) -> Axis {
        if self.height_km() >= self.width_km() {
            Axis::Lat
        } else {
            Axis::Lon
        }
    }

    /// Halves the box at its midpoint along `axis`.
    ///
    /// Both halves share the exact same midpoint value, so their union is
    /// the original box and their intersection a zero-width edge. The
    /// south (or west) half comes first.
    pub fn split_at_midpoint(
        &self,
        axis: Axis,
    ) -> [BoundingBox; 2] {
        match axis {
            Axis::Lat => {
                let mid = (self.min_lat + self.max_lat) * 0.5;
                [
                    Self::new(self.min_lat, self.min_lon, mid, self.max_lon),
                    Self::new(mid, self.min_lon, self.max_lat, self.max_lon),
                ]
            }
            Axis::Lon => {
                let mid = (self.min_lon + self.max_lon) * 0.5;
                [
                    Self::new(self.min_lat, self.min_lon, self.max_lat, mid),
                    Self::new(self.min_lat, mid, self.max_lat, self.max_lon),
                ]
            }
        }
    }

    /// Component-wise union of two boxes.
    pub fn union(
        &self,
        other: &BoundingBox,
    ) -> BoundingBox {
        merge_bounding_boxes(self, other)
    }

    /// Edge-wise equality within [`EDGE_EPSILON`].
    pub fn approx_eq(
        &self,
        other: &BoundingBox,
    ) -> bool {
        approx_eq(self.min_lat, other.min_lat)
            && approx_eq(self.min_lon, other.min_lon)
            && approx_eq(self.max_lat, other.max_lat)
            && approx_eq(self.max_lon, other.max_lon)
    }

    /// Whether `other` lies inside this box (edges included, with tolerance).
    pub fn contains_box(
        &self,
        other: &BoundingBox,
    ) -> bool {
        other.min_lat >= self.min_lat - EDGE_EPSILON
            && other.min_lon >= self.min_lon - EDGE_EPSILON
            && other.max_lat <= self.max_lat + EDGE_EPSILON
            && other.max_lon <= self.max_lon + EDGE_EPSILON
    }

    /// Interiors overlap (shared edges do not count).
    pub fn overlaps(
        &self,
        other: &BoundingBox,
    ) -> bool {
        self.min_lat < other.max_lat - EDGE_EPSILON
            && other.min_lat < self.max_lat - EDGE_EPSILON
            && self.min_lon < other.max_lon - EDGE_EPSILON
            && other.min_lon < self.max_lon - EDGE_EPSILON
    }

    /// Box as a `geo` rectangle (x = longitude, y = latitude).
    pub fn to_rect(&self) -> Rect<f64> {
        Rect::new(
            coord! { x: self.min_lon, y: self.min_lat },
            coord! { x: self.max_lon, y: self.max_lat },
        )
    }

    /// Closed polygon ring of the box.
    pub fn to_polygon(&self) -> Polygon<f64> {
        self.to_rect().to_polygon()
    }
}

////////////////////////////////////////////////////////////////////////////////
// Trait implementations for BoundingBox
////////////////////////////////////////////////////////////////////////////////

impl fmt::Display for BoundingBox {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(
            f,
            "[{:.6},{:.6}]x[{:.6},{:.6}]",
            self.min_lat, self.max_lat, self.min_lon, self.max_lon
        )
    }
}

impl fmt::Display for Axis {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            Axis::Lat => write!(f, "lat"),
            Axis::Lon => write!(f, "lon"),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////
// Free functions
////////////////////////////////////////////////////////////////////////////////

/// Kilometres to degrees of latitude.
pub fn km_to_degrees_lat(km: f64) -> f64 {
    km / KM_PER_DEGREE
}

/// Kilometres to degrees of longitude at `at_latitude`.
///
/// Longitude degrees shrink toward the poles, so a tiler has to call this
/// once per row rather than once per region.
pub fn km_to_degrees_lng(
    km: f64,
    at_latitude: f64,
) -> f64 {
    km / (KM_PER_DEGREE * lat_scale(at_latitude))
}

/// `|a - b| <= EDGE_EPSILON`.
pub fn approx_eq(
    a: f64,
    b: f64,
) -> bool {
    (a - b).abs() <= EDGE_EPSILON
}

/// Whether `a` and `b` share one full edge along `axis`.
///
/// On `Lat` both boxes must have the same longitude bounds and one must end
/// where the other begins in latitude; `Lon` is the mirror case. Partial
/// overlaps (for example cells from different subdivision depths) are not
/// adjacent.
pub fn edge_adjacency(
    a: &BoundingBox,
    b: &BoundingBox,
    axis: Axis,
) -> bool {
    match axis {
        Axis::Lat => {
            approx_eq(a.min_lon, b.min_lon)
                && approx_eq(a.max_lon, b.max_lon)
                && (approx_eq(a.max_lat, b.min_lat) || approx_eq(b.max_lat, a.min_lat))
        }
        Axis::Lon => {
            approx_eq(a.min_lat, b.min_lat)
                && approx_eq(a.max_lat, b.max_lat)
                && (approx_eq(a.max_lon, b.min_lon) || approx_eq(b.max_lon, a.min_lon))
        }
    }
}

/// Axis on which `a` and `b` share a full edge, if any.
pub fn shared_axis(
    a: &BoundingBox,
    b: &BoundingBox,
) -> Option<Axis> {
    [Axis::Lat, Axis::Lon]
        .into_iter()
        .find(|axis| edge_adjacency(a, b, *axis))
}

/// Smallest box covering both inputs.
pub fn merge_bounding_boxes(
    a: &BoundingBox,
    b: &BoundingBox,
) -> BoundingBox {
    BoundingBox {
        min_lat: a.min_lat.min(b.min_lat),
        min_lon: a.min_lon.min(b.min_lon),
        max_lat: a.max_lat.max(b.max_lat),
        max_lon: a.max_lon.max(b.max_lon),
    }
}

/// `cos(latitude)`, floored so that polar rows do not divide by zero.
fn lat_scale(latitude: f64) -> f64 {
    latitude.to_radians().cos().abs().max(0.01)
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////
