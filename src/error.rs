use thiserror::Error;

/// Failures of a single dispatch call.
///
/// `Configuration` and `Input` are raised before any solve attempt.
/// `Infeasible` and `Solver` are terminal for the horizon they were raised on;
/// callers aggregating several horizons must abort (or skip visibly) rather
/// than fold a failed horizon into totals.
///
/// A solve that stops at its time limit is not an error: it comes back as a
/// usable result flagged with [`crate::domain::SolveStatus::TimeLimit`].
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DispatchError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Input error: {0}")]
    Input(String),

    #[error("Infeasible: no dispatch satisfies all constraints ({0})")]
    Infeasible(String),

    #[error("Solver error: {0}")]
    Solver(String),
}

impl DispatchError {
    /// Stable short name, used as a structured logging field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "configuration",
            Self::Input(_) => "input",
            Self::Infeasible(_) => "infeasible",
            Self::Solver(_) => "solver",
        }
    }

    /// True for errors detected before the engine was ever invoked.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Configuration(_) | Self::Input(_))
    }
}

pub type Result<T, E = DispatchError> = std::result::Result<T, E>;
