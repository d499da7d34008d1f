pub mod event_bus;
pub mod frame;
pub mod theme;

pub use event_bus::*;
pub use frame::*;
pub use theme::*;
