use std::fmt;

use foundation::ids::PointId;
use scene::points::CatalogError;

#[derive(Debug)]
pub enum EngineError {
    EmptyCatalog,
    DuplicatePoint(PointId),
    UnknownPoint(String),
    Config(serde_json::Error),
    /// A field parsed but holds a value the engine cannot run with.
    InvalidConfig(String),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::EmptyCatalog => write!(f, "cannot start a globe without points"),
            EngineError::DuplicatePoint(id) => write!(f, "duplicate point id: {id}"),
            EngineError::UnknownPoint(id) => write!(f, "unknown point id: {id}"),
            EngineError::Config(err) => write!(f, "invalid engine config: {err}"),
            EngineError::InvalidConfig(reason) => write!(f, "invalid engine config: {reason}"),
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EngineError::Config(err) => Some(err),
            _ => None,
        }
    }
}

impl From<CatalogError> for EngineError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::Empty => EngineError::EmptyCatalog,
            CatalogError::DuplicateId(id) => EngineError::DuplicatePoint(id),
        }
    }
}
