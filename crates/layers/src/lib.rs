pub mod atlas;
pub mod boundaries;
pub mod labels;
pub mod layer;
pub mod raster;
pub mod region_map;
pub mod symbology;
pub mod textures;

pub use atlas::{AtlasConfig, TextureAtlasBuilder};
pub use boundaries::{BoundaryDataset, Polygon, Region, Ring};
pub use labels::{ActiveLabel, LabelProjector, LabelStyle, LabelsConfig, LabelsLayer};
pub use layer::*;
pub use region_map::{RegionMap, RegionSet};
pub use textures::{TextureAsset, TextureStore, TextureTag};
