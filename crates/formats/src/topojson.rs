//! TopoJSON boundary decoding.
//!
//! Arcs are decoded once (delta-decoded and dequantized when the topology has
//! a `transform`), then every geometry's arc references are stitched into
//! rings. A negative reference `i` means arc `!i` (that is `-i - 1`) walked
//! backwards; consecutive arcs share their joining point, which is emitted once.

use layers::boundaries::{BoundaryDataset, Polygon, Region, Ring};
use serde_json::{Map, Value};

use crate::boundary_error::BoundaryError;
use crate::geojson::{feature_name, region_id};

pub const DEFAULT_OBJECT: &str = "countries";

#[derive(Debug, Copy, Clone, PartialEq)]
struct Transform {
    scale: [f64; 2],
    translate: [f64; 2],
}

pub fn parse_topojson_boundaries(payload: &str, object: Option<&str>) -> Result<BoundaryDataset, BoundaryError> {
    let value: Value = serde_json::from_str(payload).map_err(BoundaryError::Json)?;
    parse_topojson_value(&value, object)
}

pub fn parse_topojson_value(value: &Value, object: Option<&str>) -> Result<BoundaryDataset, BoundaryError> {
    let obj = value.as_object().ok_or(BoundaryError::NotATopology)?;
    if obj.get("type").and_then(|v| v.as_str()) != Some("Topology") {
        return Err(BoundaryError::NotATopology);
    }
    let objects = obj
        .get("objects")
        .and_then(|v| v.as_object())
        .ok_or(BoundaryError::NotATopology)?;

    let (name, root) = select_object(objects, object)?;
    let transform = obj.get("transform").map(parse_transform).transpose()?;
    let arcs = decode_arcs(obj.get("arcs"), transform)?;

    let geometries: Vec<&Value> = match root.get("type").and_then(|v| v.as_str()) {
        Some("GeometryCollection") => root
            .get("geometries")
            .and_then(|v| v.as_array())
            .map(|g| g.iter().collect())
            .unwrap_or_default(),
        _ => vec![root],
    };

    let mut regions = Vec::with_capacity(geometries.len());
    for (index, geometry) in geometries.into_iter().enumerate() {
        let polygons = geometry_polygons(geometry, &arcs, index)?;
        if polygons.is_empty() {
            continue;
        }
        let properties = geometry.get("properties").and_then(|v| v.as_object());
        regions.push(Region {
            id: geometry
                .get("id")
                .and_then(region_id)
                .or_else(|| properties.and_then(|p| p.get("id")).and_then(region_id)),
            name: properties.and_then(feature_name),
            polygons,
        });
    }

    let dataset = BoundaryDataset::new(regions);
    tracing::debug!(
        object = name,
        arcs = arcs.len(),
        regions = dataset.len(),
        polygons = dataset.polygon_count(),
        "decoded topology"
    );
    Ok(dataset)
}

fn select_object<'a>(
    objects: &'a Map<String, Value>,
    requested: Option<&'a str>,
) -> Result<(&'a str, &'a Value), BoundaryError> {
    if let Some(name) = requested {
        return objects
            .get(name)
            .map(|v| (name, v))
            .ok_or_else(|| BoundaryError::MissingObject(name.to_string()));
    }
    if let Some(v) = objects.get(DEFAULT_OBJECT) {
        return Ok((DEFAULT_OBJECT, v));
    }
    objects
        .iter()
        .next()
        .map(|(k, v)| (k.as_str(), v))
        .ok_or_else(|| BoundaryError::MissingObject(DEFAULT_OBJECT.to_string()))
}

fn parse_transform(value: &Value) -> Result<Transform, BoundaryError> {
    let pair = |key: &str| -> Option<[f64; 2]> {
        let arr = value.get(key)?.as_array()?;
        Some([arr.first()?.as_f64()?, arr.get(1)?.as_f64()?])
    };
    match (pair("scale"), pair("translate")) {
        (Some(scale), Some(translate)) => Ok(Transform { scale, translate }),
        _ => Err(BoundaryError::NotATopology),
    }
}

fn decode_arcs(value: Option<&Value>, transform: Option<Transform>) -> Result<Vec<Vec<[f64; 2]>>, BoundaryError> {
    let Some(arcs) = value.and_then(|v| v.as_array()) else {
        return Err(BoundaryError::NotATopology);
    };
    let mut out = Vec::with_capacity(arcs.len());
    for arc in arcs {
        let positions = arc.as_array().ok_or(BoundaryError::NotATopology)?;
        let mut points = Vec::with_capacity(positions.len());
        let (mut x, mut y) = (0.0, 0.0);
        for p in positions {
            let (px, py) = match p.as_array().map(|a| a.as_slice()) {
                Some([px, py, ..]) => match (px.as_f64(), py.as_f64()) {
                    (Some(px), Some(py)) => (px, py),
                    _ => return Err(BoundaryError::NotATopology),
                },
                _ => return Err(BoundaryError::NotATopology),
            };
            match transform {
                Some(t) => {
                    x += px;
                    y += py;
                    points.push([x * t.scale[0] + t.translate[0], y * t.scale[1] + t.translate[1]]);
                }
                None => points.push([px, py]),
            }
        }
        out.push(points);
    }
    Ok(out)
}

fn geometry_polygons(
    geometry: &Value,
    arcs: &[Vec<[f64; 2]>],
    index: usize,
) -> Result<Vec<Polygon>, BoundaryError> {
    let invalid = |reason: &str| BoundaryError::InvalidFeature {
        index,
        reason: reason.to_string(),
    };
    let refs = geometry.get("arcs");
    match geometry.get("type").and_then(|v| v.as_str()) {
        Some("Polygon") => {
            let rings = refs.and_then(|v| v.as_array()).ok_or_else(|| invalid("Polygon missing arcs"))?;
            Ok(vec![stitch_polygon(rings, arcs, index)?])
        }
        Some("MultiPolygon") => {
            let polys = refs
                .and_then(|v| v.as_array())
                .ok_or_else(|| invalid("MultiPolygon missing arcs"))?;
            let mut out = Vec::with_capacity(polys.len());
            for poly in polys {
                let rings = poly.as_array().ok_or_else(|| invalid("polygon must be an array of rings"))?;
                out.push(stitch_polygon(rings, arcs, index)?);
            }
            Ok(out)
        }
        _ => Ok(Vec::new()),
    }
}

fn stitch_polygon(rings: &[Value], arcs: &[Vec<[f64; 2]>], index: usize) -> Result<Polygon, BoundaryError> {
    let mut out = Vec::with_capacity(rings.len());
    for ring in rings {
        let refs = ring.as_array().ok_or_else(|| BoundaryError::InvalidFeature {
            index,
            reason: "ring must be an array of arc indices".to_string(),
        })?;
        out.push(stitch_ring(refs, arcs)?);
    }
    Ok(Polygon::new(out))
}

fn stitch_ring(refs: &[Value], arcs: &[Vec<[f64; 2]>]) -> Result<Ring, BoundaryError> {
    let mut ring: Ring = Vec::new();
    for r in refs {
        let i = r.as_i64().ok_or(BoundaryError::InvalidArc { index: i64::MIN })?;
        let (arc_index, reversed) = if i < 0 { (!i, true) } else { (i, false) };
        let arc = usize::try_from(arc_index)
            .ok()
            .and_then(|a| arcs.get(a))
            .ok_or(BoundaryError::InvalidArc { index: i })?;

        let points: Box<dyn Iterator<Item = &[f64; 2]>> = if reversed {
            Box::new(arc.iter().rev())
        } else {
            Box::new(arc.iter())
        };
        for (k, p) in points.enumerate() {
            if k == 0 && !ring.is_empty() {
                continue;
            }
            ring.push(*p);
        }
    }
    Ok(ring)
}
