use serde::{Deserialize, Serialize};

pub const MANIFEST_VERSION: &str = "1.0";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GlobeManifest {
    pub version: String,
    pub package_id: String,
    pub name: Option<String>,
    pub points: FileEntry,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regions: Option<FileEntry>,
    pub boundaries: BoundaryEntry,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FileEntry {
    pub path: String,
    /// blake3 of the file bytes (lowercase hex); verified on load when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_hash: Option<String>,
}

impl FileEntry {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content_hash: None,
        }
    }
}

#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BoundaryFormat {
    #[default]
    Topojson,
    Geojson,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BoundaryEntry {
    #[serde(flatten)]
    pub file: FileEntry,
    #[serde(default)]
    pub format: BoundaryFormat,
    /// TopoJSON object to decode; defaults to `countries`, else the first object.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object: Option<String>,
}

impl GlobeManifest {
    pub fn new(package_id: impl Into<String>, points: &str, boundaries: &str, format: BoundaryFormat) -> Self {
        Self {
            version: MANIFEST_VERSION.to_string(),
            package_id: package_id.into(),
            name: None,
            points: FileEntry::new(points),
            regions: None,
            boundaries: BoundaryEntry {
                file: FileEntry::new(boundaries),
                format,
                object: None,
            },
        }
    }
}
