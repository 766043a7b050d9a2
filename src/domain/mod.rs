pub mod dispatch;
pub mod horizon;

pub use dispatch::*;
pub use horizon::*;
