use std::fmt;

#[derive(Debug)]
pub enum BoundaryError {
    Json(serde_json::Error),
    NotAFeatureCollection,
    NotATopology,
    MissingObject(String),
    InvalidFeature { index: usize, reason: String },
    InvalidArc { index: i64 },
}

impl fmt::Display for BoundaryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundaryError::Json(err) => write!(f, "JSON parse error: {err}"),
            BoundaryError::NotAFeatureCollection => write!(f, "expected GeoJSON FeatureCollection"),
            BoundaryError::NotATopology => write!(f, "expected TopoJSON Topology"),
            BoundaryError::MissingObject(name) => write!(f, "topology has no object {name:?}"),
            BoundaryError::InvalidFeature { index, reason } => {
                write!(f, "invalid feature at index {index}: {reason}")
            }
            BoundaryError::InvalidArc { index } => write!(f, "arc index {index} out of range"),
        }
    }
}

impl std::error::Error for BoundaryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BoundaryError::Json(err) => Some(err),
            _ => None,
        }
    }
}
