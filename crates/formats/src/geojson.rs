use foundation::ids::RegionId;
use layers::boundaries::{BoundaryDataset, Polygon, Region, Ring};
use serde_json::{Map, Value};

use crate::boundary_error::BoundaryError;

/// Decodes a GeoJSON FeatureCollection of (Multi)Polygon features.
///
/// Features of other geometry types are skipped. The region id comes from the
/// feature `id` (a number or a numeric string such as `"076"`), falling back to
/// `properties.id`; the name from `properties.name`.
pub fn parse_geojson_boundaries(payload: &str) -> Result<BoundaryDataset, BoundaryError> {
    let value: Value = serde_json::from_str(payload).map_err(BoundaryError::Json)?;
    parse_geojson_value(&value)
}

pub fn parse_geojson_value(value: &Value) -> Result<BoundaryDataset, BoundaryError> {
    let obj = value.as_object().ok_or(BoundaryError::NotAFeatureCollection)?;
    let ty = obj
        .get("type")
        .and_then(|v| v.as_str())
        .ok_or(BoundaryError::NotAFeatureCollection)?;
    if ty != "FeatureCollection" {
        return Err(BoundaryError::NotAFeatureCollection);
    }
    let features_val = obj
        .get("features")
        .and_then(|v| v.as_array())
        .ok_or(BoundaryError::NotAFeatureCollection)?;

    let mut regions = Vec::with_capacity(features_val.len());
    let mut skipped = 0usize;
    for (index, feat_val) in features_val.iter().enumerate() {
        let invalid = |reason: &str| BoundaryError::InvalidFeature {
            index,
            reason: reason.to_string(),
        };
        let feat_obj = feat_val
            .as_object()
            .ok_or_else(|| invalid("feature must be an object"))?;
        if feat_obj.get("type").and_then(|v| v.as_str()) != Some("Feature") {
            return Err(invalid("feature type must be \"Feature\""));
        }

        let properties = feat_obj.get("properties").and_then(|v| v.as_object());
        let geometry = match feat_obj.get("geometry") {
            Some(Value::Null) | None => {
                skipped += 1;
                continue;
            }
            Some(g) => g,
        };
        let polygons = match parse_geometry(geometry)
            .map_err(|reason| BoundaryError::InvalidFeature { index, reason })?
        {
            Some(polygons) => polygons,
            None => {
                skipped += 1;
                continue;
            }
        };

        regions.push(Region {
            id: feat_obj
                .get("id")
                .and_then(region_id)
                .or_else(|| properties.and_then(|p| p.get("id")).and_then(region_id)),
            name: properties.and_then(feature_name),
            polygons,
        });
    }

    if skipped > 0 {
        tracing::debug!(skipped, "skipped GeoJSON features without polygon geometry");
    }
    Ok(BoundaryDataset::new(regions))
}

/// Numeric id from a JSON number or a decimal string (leading zeros allowed).
pub(crate) fn region_id(value: &Value) -> Option<RegionId> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|v| u32::try_from(v).ok()).map(RegionId),
        Value::String(s) => s.trim().parse::<u32>().ok().map(RegionId),
        _ => None,
    }
}

pub(crate) fn feature_name(properties: &Map<String, Value>) -> Option<String> {
    properties
        .get("name")
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn parse_geometry(value: &Value) -> Result<Option<Vec<Polygon>>, String> {
    let obj = value
        .as_object()
        .ok_or("geometry must be an object".to_string())?;
    let ty = obj
        .get("type")
        .and_then(|v| v.as_str())
        .ok_or("geometry missing type".to_string())?;

    match ty {
        "Polygon" => {
            let coords = coordinates(obj)?;
            Ok(Some(vec![parse_polygon(coords)?]))
        }
        "MultiPolygon" => {
            let coords = coordinates(obj)?;
            Ok(Some(parse_multi_polygon(coords)?))
        }
        "GeometryCollection" => {
            let members = obj
                .get("geometries")
                .and_then(|v| v.as_array())
                .ok_or("GeometryCollection missing geometries".to_string())?;
            let mut out = Vec::new();
            for member in members {
                if let Some(polys) = parse_geometry(member)? {
                    out.extend(polys);
                }
            }
            Ok((!out.is_empty()).then_some(out))
        }
        _ => Ok(None),
    }
}

fn coordinates(obj: &Map<String, Value>) -> Result<&Value, String> {
    obj.get("coordinates")
        .ok_or("geometry missing coordinates".to_string())
}

fn parse_position(coords: &Value) -> Result<[f64; 2], String> {
    let arr = coords
        .as_array()
        .ok_or("position must be an array".to_string())?;
    if arr.len() < 2 {
        return Err("position must have [lon, lat]".to_string());
    }
    let lon = arr[0].as_f64().ok_or("lon must be a number".to_string())?;
    let lat = arr[1].as_f64().ok_or("lat must be a number".to_string())?;
    Ok([lon, lat])
}

fn parse_ring(coords: &Value) -> Result<Ring, String> {
    let arr = coords
        .as_array()
        .ok_or("ring must be an array of positions".to_string())?;
    let mut out = Vec::with_capacity(arr.len());
    for item in arr {
        out.push(parse_position(item)?);
    }
    Ok(out)
}

fn parse_polygon(coords: &Value) -> Result<Polygon, String> {
    let rings = coords
        .as_array()
        .ok_or("Polygon coordinates must be an array of rings".to_string())?;
    let mut out = Vec::with_capacity(rings.len());
    for ring in rings {
        out.push(parse_ring(ring)?);
    }
    Ok(Polygon::new(out))
}

fn parse_multi_polygon(coords: &Value) -> Result<Vec<Polygon>, String> {
    let polys = coords
        .as_array()
        .ok_or("MultiPolygon coordinates must be an array of polygons".to_string())?;
    let mut out = Vec::with_capacity(polys.len());
    for poly in polys {
        out.push(parse_polygon(poly)?);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::parse_geojson_boundaries;
    use crate::boundary_error::BoundaryError;
    use foundation::ids::RegionId;

    const SAMPLE: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            { "type": "Feature", "id": "076", "properties": { "name": "Brazil" },
              "geometry": { "type": "Polygon",
                "coordinates": [[[-70, -33], [-35, -33], [-35, 5], [-70, 5], [-70, -33]]] } },
            { "type": "Feature", "properties": { "id": 392, "name": "Japan" },
              "geometry": { "type": "MultiPolygon",
                "coordinates": [
                  [[[130, 31], [135, 31], [135, 35], [130, 31]]],
                  [[[136, 35], [142, 35], [142, 41], [136, 35]]]
                ] } },
            { "type": "Feature", "id": 1, "properties": {},
              "geometry": { "type": "Point", "coordinates": [0, 0] } },
            { "type": "Feature", "id": "x", "properties": { "name": " " }, "geometry": null }
        ]
    }"#;

    #[test]
    fn decodes_polygons_and_ids() {
        let ds = parse_geojson_boundaries(SAMPLE).expect("parse");
        assert_eq!(ds.len(), 2);
        let brazil = ds.region(RegionId(76)).expect("brazil");
        assert_eq!(brazil.name.as_deref(), Some("Brazil"));
        assert_eq!(brazil.polygons[0].rings[0].len(), 5);
        assert_eq!(ds.region(RegionId(392)).map(|r| r.polygons.len()), Some(2));
    }

    #[test]
    fn rejects_non_collections_and_bad_positions() {
        assert!(matches!(
            parse_geojson_boundaries(r#"{"type":"Feature"}"#),
            Err(BoundaryError::NotAFeatureCollection)
        ));
        let bad = r#"{"type":"FeatureCollection","features":[
            {"type":"Feature","geometry":{"type":"Polygon","coordinates":[[[0]]]}}]}"#;
        assert!(matches!(
            parse_geojson_boundaries(bad),
            Err(BoundaryError::InvalidFeature { index: 0, .. })
        ));
        assert!(matches!(parse_geojson_boundaries("{"), Err(BoundaryError::Json(_))));
    }
}
