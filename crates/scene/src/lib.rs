pub mod camera;
pub mod markers;
pub mod picking;
pub mod points;
pub mod prefabs;
pub mod selection;
pub mod view;

pub use camera::{CameraConfig, CameraMode, CameraRig, CameraStep};
pub use markers::{Marker, MarkerConfig, MarkerField, MarkerInstance, phase_for};
pub use picking::{PickHit, PickOptions, pick_ray, pick_screen};
pub use points::{CatalogError, GeoPoint, PointCatalog};
pub use selection::{Emphasis, MarkerVisualState, SelectOutcome, Selection};
pub use view::{Ray, ViewCamera};
