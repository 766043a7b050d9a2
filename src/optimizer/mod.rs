pub mod builder;
pub mod constraints;
pub mod dispatch;
pub mod engines;
pub mod extract;
pub mod model;
pub mod types;

pub use builder::{build, DispatchModel, DispatchVariables};
pub use constraints::*;
pub use dispatch::*;
pub use engines::{EngineKind, MicroLpEngine};
pub use extract::extract;
pub use types::*;
