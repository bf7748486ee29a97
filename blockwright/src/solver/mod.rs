//! Solver port
//!
//! Rule compilation, constraints and metrics build a [`Model`] using only
//! the primitive set it exposes. Any [`Backend`] able to solve such a
//! model can be plugged into a designer.

pub mod model;
mod propagate;
mod search;
mod timeout;
mod trail;

pub use model::{
    BoolVar, Cmp, Constraint, Domain, Enforce, IntVar, LinearExpr, Lit, Model, Objective,
    Operand, Posted, Sense,
};
pub use search::SearchBackend;

use crate::limits::SolverLimits;
use crate::DesignResult;
use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// Outcome class of one solve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SolveStatus {
    /// Search space exhausted with a solution; optimal when there is an objective
    Optimal,
    /// A solution was found but a limit stopped the search
    Feasible,
    /// Search space exhausted without a solution
    Infeasible,
    /// A limit stopped the search before any solution was found
    Unknown,
}

impl SolveStatus {
    pub fn has_solution(self) -> bool {
        matches!(self, SolveStatus::Optimal | SolveStatus::Feasible)
    }
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SolveStatus::Optimal => "OPTIMAL",
            SolveStatus::Feasible => "FEASIBLE",
            SolveStatus::Infeasible => "INFEASIBLE",
            SolveStatus::Unknown => "UNKNOWN",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SearchStats {
    pub nodes: u64,
    pub backtracks: u64,
    pub failures: u64,
    pub solutions: u64,
    pub propagations: u64,
    pub elapsed: Duration,
}

impl fmt::Display for SearchStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} nodes, {} backtracks, {} failures, {} solutions, {} propagations in {:.3}s",
            self.nodes,
            self.backtracks,
            self.failures,
            self.solutions,
            self.propagations,
            self.elapsed.as_secs_f64()
        )
    }
}

/// Result of [`Backend::solve`]
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    pub status: SolveStatus,
    /// Value of every model variable, indexed by [`IntVar::index`]
    pub values: Option<Vec<i64>>,
    pub objective: Option<i64>,
    pub stats: SearchStats,
}

impl Solution {
    pub fn has_assignment(&self) -> bool {
        self.values.is_some()
    }

    pub fn value(&self, var: IntVar) -> Option<i64> {
        self.values.as_ref()?.get(var.index()).copied()
    }

    pub fn bool_value(&self, lit: impl Into<Lit>) -> Option<bool> {
        let lit: Lit = lit.into();
        self.value(lit.var()).map(|v| lit.holds(v))
    }
}

/// A solver able to handle every primitive of [`Model`]
pub trait Backend {
    fn name(&self) -> &str;

    fn solve(&self, model: &Model, limits: &SolverLimits) -> DesignResult<Solution>;
}
