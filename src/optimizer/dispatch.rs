use tracing::{error, info_span};

use super::builder::build;
use super::constraints::MicrogridConfig;
use super::engines::MicroLpEngine;
use super::extract::extract;
use super::types::{DispatchSolver, MilpEngine, SolveOptions};
use crate::domain::{DispatchResult, HorizonSeries};
use crate::error::Result;

/// Build, solve and extract one horizon.
pub fn build_and_solve(
    config: &MicrogridConfig,
    horizon: &HorizonSeries,
    solver: &DispatchSolver,
) -> Result<DispatchResult> {
    let span = info_span!(
        "build_and_solve",
        horizon_len = horizon.len(),
        start = ?horizon.first_timestamp(),
        engine = solver.engine_name()
    );
    let _guard = span.enter();

    let outcome = build(config, horizon)
        .and_then(|model| solver.solve(model))
        .map(|solved| extract(&solved, horizon));

    if let Err(ref err) = outcome {
        error!(kind = err.kind(), error = %err, "dispatch failed");
    }
    outcome
}

/// A configured optimizer instance: immutable parameters plus a solver.
///
/// Holds no per-call state, so one instance can serve concurrent
/// `build_and_solve` calls for independent horizons.
pub struct MicrogridOptimizer {
    config: MicrogridConfig,
    solver: DispatchSolver,
}

impl MicrogridOptimizer {
    /// Validates `config` up front.
    pub fn new(config: MicrogridConfig, solver: DispatchSolver) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, solver })
    }

    pub fn with_engine(
        config: MicrogridConfig,
        engine: Box<dyn MilpEngine>,
        options: SolveOptions,
    ) -> Result<Self> {
        Self::new(config, DispatchSolver::new(engine, options))
    }

    pub fn config(&self) -> &MicrogridConfig {
        &self.config
    }

    pub fn solver(&self) -> &DispatchSolver {
        &self.solver
    }

    pub fn build_and_solve(&self, horizon: &HorizonSeries) -> Result<DispatchResult> {
        build_and_solve(&self.config, horizon, &self.solver)
    }
}

impl Default for MicrogridOptimizer {
    /// Default parameters on the pure-Rust engine with default limits.
    fn default() -> Self {
        Self {
            config: MicrogridConfig::default(),
            solver: DispatchSolver::new(Box::new(MicroLpEngine), SolveOptions::default()),
        }
    }
}
