pub mod angles;
pub mod precision;
pub mod projection;
pub mod sphere;
pub mod vec;

pub use angles::*;
pub use precision::*;
pub use projection::*;
pub use sphere::*;
pub use vec::*;
