//! Solving engines
//!
//! - MicroLp: pure-Rust branch-and-bound, always available
//! - HiGHS: external solver with time limit and MIP gap (feature `highs`)

pub mod milp;

pub use milp::*;

use serde::{Deserialize, Serialize};

use crate::error::{DispatchError, Result};
use crate::optimizer::types::MilpEngine;

/// Engine selector used by configuration and the CLI.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum EngineKind {
    #[default]
    MicroLp,
    Highs,
}

impl EngineKind {
    /// Instantiate the selected engine; `Highs` needs the `highs` feature.
    pub fn create(self) -> Result<Box<dyn MilpEngine>> {
        match self {
            Self::MicroLp => Ok(Box::new(MicroLpEngine)),
            #[cfg(feature = "highs")]
            Self::Highs => Ok(Box::new(HighsEngine::default())),
            #[cfg(not(feature = "highs"))]
            Self::Highs => Err(DispatchError::Configuration(
                "engine 'highs' requires building with the `highs` feature".to_string(),
            )),
        }
    }
}
