//! Least-cost hourly dispatch of a hybrid diesel/battery/solar microgrid.
//!
//! The pipeline for one horizon is [`optimizer::build`] (constraint model) →
//! [`optimizer::DispatchSolver`] (external MILP engine) → [`optimizer::extract`]
//! (result table), composed by [`optimizer::build_and_solve`].

pub mod analysis;
pub mod config;
pub mod domain;
pub mod error;
pub mod io;
pub mod optimizer;
pub mod telemetry;

pub use domain::{DispatchRecord, DispatchResult, HorizonRecord, HorizonSeries, SolveStatus};
pub use error::DispatchError;
pub use optimizer::{build_and_solve, MicrogridConfig, MicrogridOptimizer};
