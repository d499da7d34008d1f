use std::collections::HashMap;
use std::fmt;

use foundation::ids::PointId;
use foundation::math::LatLon;

/// A named location on the globe.
///
/// Coordinates are sanitized on construction (see [`LatLon::sanitized`]), so
/// everything downstream can assume `lat ∈ [-90, 90]` and `lon ∈ [-180, 180]`.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoPoint {
    pub id: PointId,
    pub name: String,
    pub position: LatLon,
}

impl GeoPoint {
    pub fn new(id: impl Into<PointId>, name: impl Into<String>, lat_deg: f64, lon_deg: f64) -> Self {
        let requested = LatLon::new(lat_deg, lon_deg);
        let position = requested.sanitized();
        let id = id.into();
        if position != requested {
            tracing::warn!(
                point = %id,
                lat = lat_deg,
                lon = lon_deg,
                "point coordinates out of range; clamped"
            );
        }
        Self {
            id,
            name: name.into(),
            position,
        }
    }

    pub fn lat(&self) -> f64 {
        self.position.lat_deg
    }

    pub fn lon(&self) -> f64 {
        self.position.lon_deg
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    Empty,
    DuplicateId(PointId),
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogError::Empty => write!(f, "point catalog must contain at least one point"),
            CatalogError::DuplicateId(id) => write!(f, "duplicate point id: {id}"),
        }
    }
}

impl std::error::Error for CatalogError {}

/// Immutable, ordered set of points. Catalog order is the tie-break order
/// everywhere (picking, marker layout).
#[derive(Debug, Clone)]
pub struct PointCatalog {
    points: Vec<GeoPoint>,
    by_id: HashMap<PointId, usize>,
}

impl PointCatalog {
    pub fn new(points: Vec<GeoPoint>) -> Result<Self, CatalogError> {
        if points.is_empty() {
            return Err(CatalogError::Empty);
        }
        let mut by_id = HashMap::with_capacity(points.len());
        for (index, point) in points.iter().enumerate() {
            if by_id.insert(point.id.clone(), index).is_some() {
                return Err(CatalogError::DuplicateId(point.id.clone()));
            }
        }
        Ok(Self { points, by_id })
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[GeoPoint] {
        &self.points
    }

    pub fn get(&self, index: usize) -> Option<&GeoPoint> {
        self.points.get(index)
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.by_id.get(id).copied()
    }

    pub fn by_id(&self, id: &str) -> Option<&GeoPoint> {
        self.index_of(id).and_then(|i| self.points.get(i))
    }
}
