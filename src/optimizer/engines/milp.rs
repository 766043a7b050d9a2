//! `good_lp` adapters for [`MilpEngine`]
//!
//! [`MicroLpEngine`] uses the pure-Rust `microlp` backend and is always built;
//! [`HighsEngine`] (cargo feature `highs`) uses HiGHS. Both receive the time
//! limit and relative MIP gap, and the termination status is read back from
//! the engine's solution.

use std::time::Instant;

use good_lp::solvers::{SolutionStatus, WithMipGap, WithTimeLimit};
use good_lp::{
    constraint, variable, Expression, ProblemVariables, ResolutionError, Solution, SolverModel,
    Variable,
};
use tracing::debug;

use crate::domain::SolveStatus;
use crate::optimizer::model::{LinearExpr, LinearModel, Relation, VarKind};
use crate::optimizer::types::{Assignment, EngineError, MilpEngine, SolveOptions};

/// `good_lp` variables and expressions for a [`LinearModel`]
struct Translation {
    problem: ProblemVariables,
    handles: Vec<Variable>,
    objective: Expression,
}

impl Translation {
    fn new(model: &LinearModel) -> Self {
        let mut problem = ProblemVariables::new();
        let handles = model
            .variables()
            .iter()
            .map(|var| {
                let def = match var.kind {
                    VarKind::Binary => variable().binary(),
                    VarKind::Continuous => match var.upper {
                        Some(upper) => variable().min(var.lower).max(upper),
                        None => variable().min(var.lower),
                    },
                };
                problem.add(def.name(var.name.clone()))
            })
            .collect::<Vec<_>>();
        let objective = expression(&handles, model.objective());
        Self {
            problem,
            handles,
            objective,
        }
    }

    /// Attach every constraint of `model` to an engine-specific problem.
    fn constrain<M: SolverModel>(handles: &[Variable], model: &LinearModel, mut problem: M) -> M {
        for c in model.constraints() {
            let lhs = expression(handles, &c.lhs);
            let rhs = c.rhs;
            problem = problem.with(match c.relation {
                Relation::LessOrEqual => constraint!(lhs <= rhs),
                Relation::GreaterOrEqual => constraint!(lhs >= rhs),
                Relation::Equal => constraint!(lhs == rhs),
            });
        }
        problem
    }
}

fn expression(handles: &[Variable], expr: &LinearExpr) -> Expression {
    let mut out = Expression::from(expr.constant_part());
    for &(var, coeff) in expr.terms() {
        out += coeff * handles[var.index()];
    }
    out
}

fn read_back<S: Solution>(solution: &S, handles: &[Variable]) -> Vec<f64> {
    handles.iter().map(|&h| solution.value(h)).collect()
}

/// Apply both limits of `options` to an unsolved problem.
///
/// A zero gap leaves the engine at its exact default.
fn limited<P>(problem: P, options: &SolveOptions) -> Result<P, EngineError>
where
    P: WithTimeLimit + WithMipGap,
{
    let problem = problem.with_time_limit(options.time_limit.as_secs_f64());
    if options.relative_gap <= 0.0 {
        return Ok(problem);
    }
    problem
        .with_mip_gap(options.relative_gap as f32)
        .map_err(|err| {
            EngineError::Failed(format!("relative gap {}: {:?}", options.relative_gap, err))
        })
}

fn solve_status(status: SolutionStatus) -> SolveStatus {
    match status {
        SolutionStatus::Optimal => SolveStatus::Optimal,
        SolutionStatus::GapLimit => SolveStatus::WithinGap,
        SolutionStatus::TimeLimit => SolveStatus::TimeLimit,
    }
}

fn map_error(err: ResolutionError) -> EngineError {
    match err {
        ResolutionError::Infeasible => EngineError::Infeasible,
        ResolutionError::Unbounded => EngineError::Unbounded,
        other => EngineError::Failed(other.to_string()),
    }
}

/// Pure-Rust branch-and-bound engine (`microlp`).
#[derive(Debug, Clone, Copy, Default)]
pub struct MicroLpEngine;

impl MilpEngine for MicroLpEngine {
    fn name(&self) -> &'static str {
        "microlp"
    }

    fn solve(
        &self,
        model: &LinearModel,
        options: &SolveOptions,
    ) -> Result<Assignment, EngineError> {
        let Translation {
            problem,
            handles,
            objective,
        } = Translation::new(model);

        let started = Instant::now();
        let unsolved = limited(
            problem
                .minimise(objective)
                .using(good_lp::solvers::microlp::microlp),
            options,
        )?;
        let solution = Translation::constrain(&handles, model, unsolved)
            .solve()
            .map_err(map_error)?;
        let elapsed = started.elapsed();

        let status = solve_status(solution.status());

        debug!(
            elapsed_ms = elapsed.as_millis() as u64,
            variables = handles.len(),
            %status,
            "microlp finished"
        );

        Ok(Assignment {
            values: read_back(&solution, &handles),
            status,
        })
    }
}

/// HiGHS engine with time limit and relative MIP gap.
#[cfg(feature = "highs")]
#[derive(Debug, Clone, Copy, Default)]
pub struct HighsEngine {
    /// Worker threads HiGHS may use, `None` for its own default
    pub threads: Option<u32>,
}

#[cfg(feature = "highs")]
impl MilpEngine for HighsEngine {
    fn name(&self) -> &'static str {
        "highs"
    }

    fn solve(
        &self,
        model: &LinearModel,
        options: &SolveOptions,
    ) -> Result<Assignment, EngineError> {
        let Translation {
            problem,
            handles,
            objective,
        } = Translation::new(model);

        let started = Instant::now();
        let mut unsolved = problem
            .minimise(objective)
            .using(good_lp::solvers::highs::highs)
            .set_verbose(false);
        if let Some(threads) = self.threads {
            unsolved = unsolved.set_threads(threads);
        }
        let unsolved = limited(unsolved, options)?;
        let solution = Translation::constrain(&handles, model, unsolved)
            .solve()
            .map_err(map_error)?;
        let elapsed = started.elapsed();

        let status = solve_status(solution.status());

        debug!(
            elapsed_ms = elapsed.as_millis() as u64,
            variables = handles.len(),
            %status,
            "highs finished"
        );

        Ok(Assignment {
            values: read_back(&solution, &handles),
            status,
        })
    }
}
