//! Target region of a scan.

use std::{fs, path::Path};

use geo::{BoundingRect, Intersects, LineString, MultiPolygon, Polygon};
use serde::{Deserialize, Serialize};

use super::BoundingBox;
use crate::error::{GridError, GridResult};

/// Static multi-polygon region. Read-only input to tiling and to every
/// intersection check.
#[derive(Debug, Clone)]
pub struct Boundary {
    name: String,
    shape: MultiPolygon<f64>,
    bbox: BoundingBox,
}

/// On-disk form of a boundary: rings of `[lon, lat]` pairs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoundaryDocument {
    pub name: String,
    pub polygons: Vec<PolygonDocument>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolygonDocument {
    pub exterior: Vec<[f64; 2]>,
    #[serde(default)]
    pub interiors: Vec<Vec<[f64; 2]>>,
}

////////////////////////////////////////////////////////////////////////////////
// Inherent methods
////////////////////////////////////////////////////////////////////////////////

impl Boundary {
    /// Wraps a multi-polygon. Fails if the shape has no extent.
    pub fn new(
        name: impl Into<String>,
        shape: MultiPolygon<f64>,
    ) -> GridResult<Self> {
        let name = name.into();
        let rect = shape
            .bounding_rect()
            .ok_or_else(|| GridError::InvalidBoundary(format!("'{name}' has no polygons")))?;
        let bbox = BoundingBox::new(rect.min().y, rect.min().x, rect.max().y, rect.max().x);
        if bbox.lat_span() <= 0.0 || bbox.lon_span() <= 0.0 {
            return Err(GridError::InvalidBoundary(format!(
                "'{name}' has a degenerate extent {bbox}"
            )));
        }

        Ok(Self { name, shape, bbox })
    }

    /// Rectangular region.
    pub fn from_rect(
        name: impl Into<String>,
        bbox: BoundingBox,
    ) -> GridResult<Self> {
        Self::new(name, MultiPolygon::new(vec![bbox.to_polygon()]))
    }

    pub fn from_document(doc: BoundaryDocument) -> GridResult<Self> {
        let polygons = doc
            .polygons
            .into_iter()
            .map(|p| {
                let exterior = to_ring(p.exterior);
                let interiors = p.interiors.into_iter().map(to_ring).collect();
                Polygon::new(exterior, interiors)
            })
            .collect();
        Self::new(doc.name, MultiPolygon::new(polygons))
    }

    pub fn from_json_str(json: &str) -> GridResult<Self> {
        let doc: BoundaryDocument = serde_json::from_str(json)
            .map_err(|e| GridError::InvalidBoundary(format!("malformed document: {e}")))?;
        Self::from_document(doc)
    }

    /// Loads a [`BoundaryDocument`] from a JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> GridResult<Self> {
        let raw = fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&raw)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn shape(&self) -> &MultiPolygon<f64> {
        &self.shape
    }

    pub fn bounding_box(&self) -> BoundingBox {
        self.bbox
    }

    /// Any intersection counts, including a touching edge. Cells on the
    /// boundary are therefore always kept.
    pub fn intersects(
        &self,
        rect: &BoundingBox,
    ) -> bool {
        if !bbox_touches(&self.bbox, rect) {
            return false;
        }
        self.shape.intersects(&rect.to_polygon())
    }
}

////////////////////////////////////////////////////////////////////////////////
// Free functions
////////////////////////////////////////////////////////////////////////////////

/// Whether `rect` intersects the boundary polygon (containment not
/// required).
pub fn rectangle_intersects_boundary(
    rect: &BoundingBox,
    boundary: &Boundary,
) -> bool {
    boundary.intersects(rect)
}

fn to_ring(points: Vec<[f64; 2]>) -> LineString<f64> {
    LineString::from(
        points
            .into_iter()
            .map(|[lon, lat]| (lon, lat))
            .collect::<Vec<_>>(),
    )
}

fn bbox_touches(
    a: &BoundingBox,
    b: &BoundingBox,
) -> bool {
    a.min_lat <= b.max_lat && a.max_lat >= b.min_lat && a.min_lon <= b.max_lon && a.max_lon >= b.min_lon
}

////////////////////////////////////////////////////////////////////////////////
// Tests
////////////////////////////////////////////////////////////////////////////////
