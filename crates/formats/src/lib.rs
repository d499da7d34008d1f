pub mod boundary_error;
pub mod catalog;
pub mod geojson;
pub mod manifest;
pub mod package;
pub mod topojson;

pub use boundary_error::*;
pub use catalog::*;
pub use geojson::{parse_geojson_boundaries, parse_geojson_value};
pub use manifest::*;
pub use package::*;
pub use topojson::{parse_topojson_boundaries, parse_topojson_value};
