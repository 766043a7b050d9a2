pub mod annual;
pub mod economics;

pub use annual::*;
pub use economics::*;
