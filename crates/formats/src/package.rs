use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use layers::boundaries::BoundaryDataset;
use layers::region_map::RegionMap;
use scene::points::GeoPoint;

use crate::boundary_error::BoundaryError;
use crate::catalog::{CatalogFileError, parse_points, parse_region_map};
use crate::geojson::parse_geojson_boundaries;
use crate::manifest::{BoundaryFormat, FileEntry, GlobeManifest, MANIFEST_VERSION};
use crate::topojson::parse_topojson_boundaries;

pub const MANIFEST_FILE_NAME: &str = "globe.manifest.json";

/// A globe package directory: manifest plus the files it names.
#[derive(Debug, Clone)]
pub struct GlobePackage {
    root: PathBuf,
    manifest: GlobeManifest,
}

/// Everything the engine needs from a package.
#[derive(Debug, Clone)]
pub struct GlobeContents {
    pub points: Vec<GeoPoint>,
    pub region_map: RegionMap,
    pub boundaries: BoundaryDataset,
}

#[derive(Debug)]
pub enum PackageError {
    Io { path: PathBuf, source: std::io::Error },
    Parse(serde_json::Error),
    UnsupportedVersion { found: String },
    HashMismatch { path: PathBuf, expected: String, actual: String },
    Catalog { path: PathBuf, source: CatalogFileError },
    Boundary { path: PathBuf, source: BoundaryError },
}

impl fmt::Display for PackageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PackageError::Io { path, source } => write!(f, "failed to read {}: {source}", path.display()),
            PackageError::Parse(err) => write!(f, "Manifest parse error: {err}"),
            PackageError::UnsupportedVersion { found } => {
                write!(f, "Unsupported manifest version: {found}")
            }
            PackageError::HashMismatch {
                path,
                expected,
                actual,
            } => write!(
                f,
                "content hash mismatch for {}: expected {expected}, got {actual}",
                path.display()
            ),
            PackageError::Catalog { path, source } => write!(f, "bad catalog file {}: {source}", path.display()),
            PackageError::Boundary { path, source } => {
                write!(f, "bad boundary file {}: {source}", path.display())
            }
        }
    }
}

impl std::error::Error for PackageError {}

impl GlobePackage {
    pub fn load(root: impl AsRef<Path>) -> Result<Self, PackageError> {
        let root = root.as_ref().to_path_buf();
        let manifest_path = root.join(MANIFEST_FILE_NAME);
        let payload = fs::read_to_string(&manifest_path).map_err(|source| PackageError::Io {
            path: manifest_path.clone(),
            source,
        })?;
        let manifest: GlobeManifest = serde_json::from_str(&payload).map_err(PackageError::Parse)?;

        if manifest.version != MANIFEST_VERSION {
            return Err(PackageError::UnsupportedVersion {
                found: manifest.version,
            });
        }

        Ok(Self { root, manifest })
    }

    pub fn manifest(&self) -> &GlobeManifest {
        &self.manifest
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn read(&self, entry: &FileEntry) -> Result<(PathBuf, String), PackageError> {
        let path = self.root.join(&entry.path);
        let bytes = fs::read(&path).map_err(|source| PackageError::Io {
            path: path.clone(),
            source,
        })?;
        if let Some(expected) = &entry.content_hash {
            let actual = blake3::hash(&bytes).to_hex().to_string();
            if !actual.eq_ignore_ascii_case(expected) {
                return Err(PackageError::HashMismatch {
                    path,
                    expected: expected.clone(),
                    actual,
                });
            }
        }
        let text = String::from_utf8(bytes).map_err(|e| PackageError::Io {
            path: path.clone(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidData, e),
        })?;
        Ok((path, text))
    }

    /// Reads and decodes every file the manifest names.
    pub fn load_contents(&self) -> Result<GlobeContents, PackageError> {
        let (path, payload) = self.read(&self.manifest.points)?;
        let points = parse_points(&payload).map_err(|source| PackageError::Catalog { path, source })?;

        let region_map = match &self.manifest.regions {
            Some(entry) => {
                let (path, payload) = self.read(entry)?;
                parse_region_map(&payload).map_err(|source| PackageError::Catalog { path, source })?
            }
            None => RegionMap::new(),
        };

        let entry = &self.manifest.boundaries;
        let (path, payload) = self.read(&entry.file)?;
        let boundaries = match entry.format {
            BoundaryFormat::Topojson => parse_topojson_boundaries(&payload, entry.object.as_deref()),
            BoundaryFormat::Geojson => parse_geojson_boundaries(&payload),
        }
        .map_err(|source| PackageError::Boundary { path, source })?;

        tracing::info!(
            package = %self.manifest.package_id,
            points = points.len(),
            mapped = region_map.len(),
            regions = boundaries.len(),
            "globe package loaded"
        );
        Ok(GlobeContents {
            points,
            region_map,
            boundaries,
        })
    }
}

pub fn load_package_dir(root: impl AsRef<Path>) -> Result<GlobeContents, PackageError> {
    GlobePackage::load(root)?.load_contents()
}

#[cfg(test)]
mod tests {
    use super::{GlobePackage, MANIFEST_FILE_NAME, PackageError, load_package_dir};
    use crate::manifest::{BoundaryFormat, FileEntry, GlobeManifest, MANIFEST_VERSION};
    use std::fs;
    use std::path::PathBuf;

    fn temp_dir(label: &str) -> PathBuf {
        let mut dir = std::env::temp_dir();
        let id = format!("globe_package_{label}_{}", std::process::id());
        dir.push(id);
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).expect("create temp dir");
        dir
    }

    fn demo_root() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../apps/viewer_native/assets")
    }

    #[test]
    fn loads_demo_package() {
        let contents = load_package_dir(demo_root()).expect("load demo");
        assert_eq!(contents.points.len(), 7);
        assert_eq!(contents.boundaries.len(), 6);
        assert!(contents.region_map.regions_for("tokyo").is_some());
    }

    #[test]
    fn rejects_unsupported_manifest_version() {
        let root = temp_dir("version");
        let mut manifest = GlobeManifest::new("demo", "points.json", "world.json", BoundaryFormat::Geojson);
        manifest.version = "2.0".to_string();
        let payload = serde_json::to_string_pretty(&manifest).expect("serialize manifest");
        fs::write(root.join(MANIFEST_FILE_NAME), payload).expect("write manifest");

        let err = GlobePackage::load(&root).expect_err("expect version error");
        match err {
            PackageError::UnsupportedVersion { found } => {
                assert_eq!(found, "2.0");
                assert_ne!(found, MANIFEST_VERSION);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn verifies_content_hashes() {
        let root = temp_dir("hash");
        let points = r#"[{"id":"a","name":"A","lat":0,"lon":0}]"#;
        let world = r#"{"type":"FeatureCollection","features":[]}"#;
        fs::write(root.join("points.json"), points).expect("write points");
        fs::write(root.join("world.json"), world).expect("write world");

        let mut manifest = GlobeManifest::new("hashed", "points.json", "world.json", BoundaryFormat::Geojson);
        manifest.points = FileEntry {
            path: "points.json".to_string(),
            content_hash: Some(blake3::hash(points.as_bytes()).to_hex().to_string()),
        };
        let payload = serde_json::to_string(&manifest).expect("serialize manifest");
        fs::write(root.join(MANIFEST_FILE_NAME), payload).expect("write manifest");

        let contents = load_package_dir(&root).expect("load");
        assert_eq!(contents.points.len(), 1);
        assert!(contents.boundaries.is_empty());

        manifest.points.content_hash = Some("00".repeat(32));
        let payload = serde_json::to_string(&manifest).expect("serialize manifest");
        fs::write(root.join(MANIFEST_FILE_NAME), payload).expect("write manifest");
        assert!(matches!(
            load_package_dir(&root),
            Err(PackageError::HashMismatch { .. })
        ));
    }

    #[test]
    fn missing_files_report_their_path() {
        let root = temp_dir("missing");
        let manifest = GlobeManifest::new("missing", "nope.json", "world.json", BoundaryFormat::Topojson);
        fs::write(
            root.join(MANIFEST_FILE_NAME),
            serde_json::to_string(&manifest).expect("serialize manifest"),
        )
        .expect("write manifest");
        match load_package_dir(&root) {
            Err(PackageError::Io { path, .. }) => assert!(path.ends_with("nope.json")),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
