use std::fmt;

/// Identifies an overlay layer in the draw list.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerId(pub u64);

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "layer#{}", self.0)
    }
}

/// An overlay drawn on top of the globe surface.
pub trait Layer {
    fn id(&self) -> LayerId;
}
