use std::collections::BTreeMap;
use std::fmt;

use foundation::ids::RegionId;
use layers::region_map::{RegionMap, RegionSet};
use scene::points::GeoPoint;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointRecord {
    pub id: String,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
}

impl From<PointRecord> for GeoPoint {
    fn from(r: PointRecord) -> Self {
        GeoPoint::new(r.id, r.name, r.lat, r.lon)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
enum PointsFile {
    Wrapped { points: Vec<PointRecord> },
    Bare(Vec<PointRecord>),
}

#[derive(Debug)]
pub enum CatalogFileError {
    Json(serde_json::Error),
}

impl fmt::Display for CatalogFileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogFileError::Json(err) => write!(f, "JSON parse error: {err}"),
        }
    }
}

impl std::error::Error for CatalogFileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CatalogFileError::Json(err) => Some(err),
        }
    }
}

/// Reads `{"points": [...]}` or a bare array of `{id, name, lat, lon}`.
///
/// Uniqueness and non-emptiness are the catalog's concern, not the file's.
pub fn parse_points(payload: &str) -> Result<Vec<GeoPoint>, CatalogFileError> {
    let file: PointsFile = serde_json::from_str(payload).map_err(CatalogFileError::Json)?;
    let records = match file {
        PointsFile::Wrapped { points } => points,
        PointsFile::Bare(points) => points,
    };
    Ok(records.into_iter().map(GeoPoint::from).collect())
}

/// Reads `{"<point id>": [<region id>, ...], ...}`.
pub fn parse_region_map(payload: &str) -> Result<RegionMap, CatalogFileError> {
    let raw: BTreeMap<String, Vec<u32>> =
        serde_json::from_str(payload).map_err(CatalogFileError::Json)?;
    Ok(raw
        .into_iter()
        .map(|(point, ids)| (point.into(), RegionSet::new(ids.into_iter().map(RegionId))))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::{parse_points, parse_region_map};
    use foundation::ids::RegionId;
    use layers::region_map::RegionSet;

    #[test]
    fn parses_demo_points() {
        let payload = include_str!("../../apps/viewer_native/assets/points.json");
        let points = parse_points(payload).expect("points");
        assert_eq!(points.len(), 7);
        assert_eq!(points[0].id.as_str(), "lisbon");
        assert!((points[0].lat() - 38.72).abs() < 1e-9);
    }

    #[test]
    fn accepts_bare_arrays_and_clamps() {
        let points = parse_points(r#"[{"id":"n","name":"North","lat":95.0,"lon":190.0}]"#).expect("points");
        assert_eq!(points[0].lat(), 90.0);
        assert_eq!(points[0].lon(), -170.0);
        assert!(parse_points(r#"{"points": [{"id": "x"}]}"#).is_err());
    }

    #[test]
    fn parses_demo_region_map() {
        let payload = include_str!("../../apps/viewer_native/assets/regions.json");
        let map = parse_region_map(payload).expect("regions");
        assert_eq!(map.regions_for("lisbon"), Some(&RegionSet::new([RegionId(620)])));
        assert!(map.regions_for("sydney").is_none());
    }
}
