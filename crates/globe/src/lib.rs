//! Interactive 3D globe: point markers, focus camera, themed boundary
//! textures and a per-frame draw list for any renderer backend.

pub mod composer;
pub mod config;
pub mod engine;
pub mod error;

pub use composer::{FrameInputs, SceneComposer, TextureEvent};
pub use config::EngineConfig;
pub use engine::{EngineEvent, GlobeEngine};
pub use error::EngineError;
