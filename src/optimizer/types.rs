use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use super::builder::DispatchModel;
use super::model::LinearModel;
use crate::domain::SolveStatus;
use crate::error::{DispatchError, Result};

/// Limits handed to the engine for one solve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolveOptions {
    /// Wall-clock budget; the only way to cancel a running solve
    pub time_limit: Duration,
    /// Accept an incumbent once `(incumbent - bound) / incumbent <= relative_gap`
    pub relative_gap: f64,
}

impl Default for SolveOptions {
    fn default() -> Self {
        Self {
            time_limit: Duration::from_secs(30),
            relative_gap: 0.05,
        }
    }
}

impl SolveOptions {
    pub fn new(time_limit: Duration, relative_gap: f64) -> Self {
        Self {
            time_limit,
            relative_gap,
        }
    }
}

/// Values for every variable of a [`LinearModel`], indexed by `VarId::index`.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub values: Vec<f64>,
    pub status: SolveStatus,
}

impl Assignment {
    pub fn value(&self, var: super::model::VarId) -> f64 {
        self.values[var.index()]
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum EngineError {
    #[error("model is infeasible")]
    Infeasible,

    #[error("model is unbounded")]
    Unbounded,

    #[error("engine failure: {0}")]
    Failed(String),
}

/// Capability interface of an external mixed-integer engine.
///
/// Implementations treat the model as read-only and may parallelise
/// internally; nothing is retained between calls.
#[cfg_attr(test, mockall::automock)]
pub trait MilpEngine: Send + Sync {
    fn name(&self) -> &'static str;

    fn solve(
        &self,
        model: &LinearModel,
        options: &SolveOptions,
    ) -> std::result::Result<Assignment, EngineError>;
}

/// A dispatch model together with the engine's assignment for it.
#[derive(Debug, Clone)]
pub struct SolvedModel {
    pub dispatch: DispatchModel,
    pub assignment: Assignment,
    pub objective: f64,
}

/// Submits dispatch models to a [`MilpEngine`] and classifies the outcome.
pub struct DispatchSolver {
    engine: Box<dyn MilpEngine>,
    options: SolveOptions,
}

impl DispatchSolver {
    pub fn new(engine: Box<dyn MilpEngine>, options: SolveOptions) -> Self {
        Self { engine, options }
    }

    pub fn options(&self) -> &SolveOptions {
        &self.options
    }

    pub fn engine_name(&self) -> &'static str {
        self.engine.name()
    }

    /// Solve `dispatch`; infeasibility and engine faults are reported separately.
    pub fn solve(&self, dispatch: DispatchModel) -> Result<SolvedModel> {
        let started = Instant::now();
        let outcome = self.engine.solve(&dispatch.model, &self.options);
        let elapsed = started.elapsed();

        let assignment = match outcome {
            Ok(assignment) => assignment,
            Err(EngineError::Infeasible) => {
                warn!(
                    engine = self.engine.name(),
                    horizon_len = dispatch.horizon_len(),
                    elapsed_ms = elapsed.as_millis() as u64,
                    "dispatch model is infeasible"
                );
                return Err(DispatchError::Infeasible(format!(
                    "{} proved the {}-step horizon infeasible",
                    self.engine.name(),
                    dispatch.horizon_len()
                )));
            }
            Err(err) => {
                return Err(DispatchError::Solver(format!(
                    "{}: {}",
                    self.engine.name(),
                    err
                )));
            }
        };

        let expected = dispatch.model.variables().len();
        if assignment.values.len() != expected {
            return Err(DispatchError::Solver(format!(
                "{} returned {} values for {} variables",
                self.engine.name(),
                assignment.values.len(),
                expected
            )));
        }

        let objective = dispatch.model.objective().evaluate(&assignment.values);
        if assignment.status == SolveStatus::TimeLimit {
            warn!(
                engine = self.engine.name(),
                elapsed_ms = elapsed.as_millis() as u64,
                objective,
                "solve stopped at time limit, optimality gap not certified"
            );
        } else {
            info!(
                engine = self.engine.name(),
                horizon_len = dispatch.horizon_len(),
                elapsed_ms = elapsed.as_millis() as u64,
                status = %assignment.status,
                objective,
                "dispatch model solved"
            );
        }

        Ok(SolvedModel {
            dispatch,
            assignment,
            objective,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::HorizonSeries;
    use crate::optimizer::builder::build;
    use crate::optimizer::MicrogridConfig;
    use chrono::NaiveDate;

    fn dispatch_model() -> DispatchModel {
        let start = NaiveDate::from_ymd_opt(2024, 3, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap();
        let horizon = HorizonSeries::hourly(start, &[200.0, 200.0], &[0.0, 0.0]).unwrap();
        build(&MicrogridConfig::default(), &horizon).unwrap()
    }

    fn solver_with(engine: MockMilpEngine) -> DispatchSolver {
        DispatchSolver::new(Box::new(engine), SolveOptions::default())
    }

    #[test]
    fn test_default_options() {
        let options = SolveOptions::default();
        assert_eq!(options.time_limit, Duration::from_secs(30));
        assert_eq!(options.relative_gap, 0.05);
    }

    #[test]
    fn test_infeasible_maps_to_infeasible() {
        let mut engine = MockMilpEngine::new();
        engine.expect_name().return_const("mock");
        engine
            .expect_solve()
            .times(1)
            .returning(|_, _| Err(EngineError::Infeasible));

        let err = solver_with(engine).solve(dispatch_model()).unwrap_err();
        assert!(matches!(err, DispatchError::Infeasible(_)));
    }

    #[test]
    fn test_engine_failure_maps_to_solver_error() {
        let mut engine = MockMilpEngine::new();
        engine.expect_name().return_const("mock");
        engine
            .expect_solve()
            .returning(|_, _| Err(EngineError::Failed("license expired".into())));

        let err = solver_with(engine).solve(dispatch_model()).unwrap_err();
        assert!(matches!(err, DispatchError::Solver(ref msg) if msg.contains("license expired")));
    }

    #[test]
    fn test_unbounded_maps_to_solver_error() {
        let mut engine = MockMilpEngine::new();
        engine.expect_name().return_const("mock");
        engine
            .expect_solve()
            .returning(|_, _| Err(EngineError::Unbounded));

        let err = solver_with(engine).solve(dispatch_model()).unwrap_err();
        assert!(matches!(err, DispatchError::Solver(_)));
    }

    #[test]
    fn test_wrong_assignment_size_is_solver_error() {
        let mut engine = MockMilpEngine::new();
        engine.expect_name().return_const("mock");
        engine.expect_solve().returning(|_, _| {
            Ok(Assignment {
                values: vec![0.0; 3],
                status: SolveStatus::Optimal,
            })
        });

        let err = solver_with(engine).solve(dispatch_model()).unwrap_err();
        assert!(matches!(err, DispatchError::Solver(_)));
    }

    #[test]
    fn test_time_limit_result_is_returned_with_flag() {
        let dm = dispatch_model();
        let n_vars = dm.model.variables().len();
        let vars = dm.vars.clone();

        let mut engine = MockMilpEngine::new();
        engine.expect_name().return_const("mock");
        engine.expect_solve().returning(move |_, _| {
            let mut values = vec![0.0; n_vars];
            for t in 0..2 {
                values[vars.gen_status[t].index()] = 1.0;
                values[vars.gen_power[t].index()] = 200.0;
                values[vars.bat_soc[t].index()] = 500.0;
            }
            Ok(Assignment {
                values,
                status: SolveStatus::TimeLimit,
            })
        });

        let solved = solver_with(engine).solve(dm).unwrap();
        assert_eq!(solved.assignment.status, SolveStatus::TimeLimit);
        let config = MicrogridConfig::default();
        let expected = 2.0 * (config.intercept_cost() + 200.0 * config.slope_cost());
        assert!((solved.objective - expected).abs() < 1e-9);
    }
}
