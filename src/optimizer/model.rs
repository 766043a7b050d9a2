//! Engine-independent mixed-integer linear model
//!
//! A [`LinearModel`] is a flat collection of typed variables, named linear
//! (in)equalities and a minimisation objective. Engines in
//! [`crate::optimizer::engines`] translate it into their own representation, so
//! model construction never depends on a particular solver.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

/// Index of a variable inside its [`LinearModel`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VarId(usize);

impl VarId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VarKind {
    /// 0/1 integer
    Binary,
    /// Real-valued, bounded below by `lower`
    Continuous,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    pub name: String,
    pub kind: VarKind,
    pub lower: f64,
    /// `None` means unbounded above
    pub upper: Option<f64>,
}

/// Affine expression `Σ coeff·var + constant`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LinearExpr {
    terms: Vec<(VarId, f64)>,
    constant: f64,
}

impl LinearExpr {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn constant(value: f64) -> Self {
        Self {
            terms: Vec::new(),
            constant: value,
        }
    }

    /// Add `coeff·var`
    pub fn term(mut self, var: VarId, coeff: f64) -> Self {
        self.terms.push((var, coeff));
        self
    }

    pub fn plus(mut self, value: f64) -> Self {
        self.constant += value;
        self
    }

    pub fn add_term(&mut self, var: VarId, coeff: f64) {
        self.terms.push((var, coeff));
    }

    pub fn terms(&self) -> &[(VarId, f64)] {
        &self.terms
    }

    pub fn constant_part(&self) -> f64 {
        self.constant
    }

    /// Evaluate against a dense assignment indexed by [`VarId::index`].
    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.terms
            .iter()
            .map(|(var, coeff)| coeff * values[var.0])
            .sum::<f64>()
            + self.constant
    }
}

impl From<VarId> for LinearExpr {
    fn from(var: VarId) -> Self {
        Self::new().term(var, 1.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum Relation {
    #[strum(serialize = "<=")]
    LessOrEqual,
    #[strum(serialize = ">=")]
    GreaterOrEqual,
    #[strum(serialize = "==")]
    Equal,
}

/// Constraint families of the dispatch formulation, used for naming and counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum ConstraintFamily {
    EnergyBalance,
    GenMin,
    GenMax,
    SocAnchor,
    SocTracking,
    SocCapacity,
    ChargeRateLimit,
    DischargeRateLimit,
    SolarCurtailmentLimit,
    TerminalSoc,
}

/// `lhs <relation> rhs`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearConstraint {
    pub name: String,
    pub family: ConstraintFamily,
    pub lhs: LinearExpr,
    pub relation: Relation,
    pub rhs: f64,
}

impl LinearConstraint {
    /// Amount by which `values` violates this constraint (0 when satisfied).
    pub fn violation(&self, values: &[f64]) -> f64 {
        let lhs = self.lhs.evaluate(values);
        match self.relation {
            Relation::LessOrEqual => (lhs - self.rhs).max(0.0),
            Relation::GreaterOrEqual => (self.rhs - lhs).max(0.0),
            Relation::Equal => (lhs - self.rhs).abs(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    variables: Vec<Variable>,
    constraints: Vec<LinearConstraint>,
    objective: LinearExpr,
}

impl LinearModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_binary(&mut self, name: impl Into<String>) -> VarId {
        self.add_variable(Variable {
            name: name.into(),
            kind: VarKind::Binary,
            lower: 0.0,
            upper: Some(1.0),
        })
    }

    pub fn add_non_negative(&mut self, name: impl Into<String>) -> VarId {
        self.add_variable(Variable {
            name: name.into(),
            kind: VarKind::Continuous,
            lower: 0.0,
            upper: None,
        })
    }

    pub fn add_variable(&mut self, variable: Variable) -> VarId {
        self.variables.push(variable);
        VarId(self.variables.len() - 1)
    }

    pub fn add_constraint(
        &mut self,
        family: ConstraintFamily,
        name: impl Into<String>,
        lhs: LinearExpr,
        relation: Relation,
        rhs: f64,
    ) {
        self.constraints.push(LinearConstraint {
            name: name.into(),
            family,
            lhs,
            relation,
            rhs,
        });
    }

    /// Set the expression to minimise
    pub fn minimise(&mut self, objective: LinearExpr) {
        self.objective = objective;
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn variable(&self, id: VarId) -> &Variable {
        &self.variables[id.0]
    }

    pub fn constraints(&self) -> &[LinearConstraint] {
        &self.constraints
    }

    pub fn objective(&self) -> &LinearExpr {
        &self.objective
    }

    pub fn num_binaries(&self) -> usize {
        self.variables
            .iter()
            .filter(|v| v.kind == VarKind::Binary)
            .count()
    }

    pub fn count_family(&self, family: ConstraintFamily) -> usize {
        self.constraints
            .iter()
            .filter(|c| c.family == family)
            .count()
    }

    pub fn constraint(&self, name: &str) -> Option<&LinearConstraint> {
        self.constraints.iter().find(|c| c.name == name)
    }

    /// Constraints (and variable bounds, reported by variable name) violated by
    /// more than `tolerance`.
    pub fn violations(&self, values: &[f64], tolerance: f64) -> Vec<String> {
        let mut violated = Vec::new();
        for (var, &value) in self.variables.iter().zip(values) {
            let above = var.upper.map_or(0.0, |upper| value - upper);
            if var.lower - value > tolerance || above > tolerance {
                violated.push(var.name.clone());
            }
            if var.kind == VarKind::Binary && (value - value.round()).abs() > tolerance {
                violated.push(format!("{} (integrality)", var.name));
            }
        }
        violated.extend(
            self.constraints
                .iter()
                .filter(|c| c.violation(values) > tolerance)
                .map(|c| format!("{} {} {}", c.name, c.relation, c.rhs)),
        );
        violated
    }
}
