pub mod assignment;
pub mod resource;

pub use assignment::*;
pub use resource::*;
