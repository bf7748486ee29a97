//! Built-in depth-first search backend
//!
//! Binary branching (`x <= v` then `x >= v + 1`) over a trail of bounds,
//! bounds propagation to a fixpoint at every node and branch-and-bound on
//! the objective. Narrow domains branch on `v = lo`, wider ones are
//! bisected, so one variable adds at most about `log2` of its width to the
//! depth. Every leaf is checked against the full model before it becomes
//! an incumbent, so propagators only need to be sound.

use crate::error::DesignError;
use crate::limits::SolverLimits;
use crate::solver::model::{Constraint, IntVar, Model, Sense};
use crate::solver::propagate::{ObjectiveBound, Propagator};
use crate::solver::timeout::{LimitReached, SearchBudget};
use crate::solver::trail::{clamp, DomainStore};
use crate::solver::{Backend, SearchStats, SolveStatus, Solution};
use crate::DesignResult;
use tracing::{debug, trace};

/// Complete backend with no external dependencies
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchBackend;

impl SearchBackend {
    pub fn new() -> Self {
        Self
    }
}

/// Domains wider than this are bisected instead of enumerated
const SPLIT_THRESHOLD: i128 = 64;

/// Left branch `var <= value`, right branch `var >= value + 1`
#[derive(Debug, Clone, Copy)]
struct Decision {
    var: IntVar,
    value: i64,
    right_tried: bool,
}

impl Backend for SearchBackend {
    fn name(&self) -> &str {
        "search"
    }

    fn solve(&self, model: &Model, limits: &SolverLimits) -> DesignResult<Solution> {
        validate(model)?;
        let mut search = Search::new(model, limits);
        let solution = search.run();
        debug!(
            backend = self.name(),
            status = %solution.status,
            stats = %solution.stats,
            "solve finished"
        );
        Ok(solution)
    }
}

struct Search<'m> {
    model: &'m Model,
    store: DomainStore,
    propagator: Propagator<'m>,
    budget: SearchBudget,
    stack: Vec<Decision>,
    incumbent: Option<(Vec<i64>, i128)>,
    stats: SearchStats,
}

impl<'m> Search<'m> {
    fn new(model: &'m Model, limits: &SolverLimits) -> Self {
        let store = DomainStore::new(model.var_defs().iter().map(|d| d.domain));
        let objective = model.objective().map(|o| ObjectiveBound {
            expr: match o.sense {
                Sense::Minimize => o.expr.clone(),
                Sense::Maximize => o.expr.clone() * -1,
            },
            rhs: None,
        });
        let propagator = Propagator::new(
            model.posted(),
            model.num_vars(),
            objective,
            limits.max_propagations_per_node,
        );
        Self {
            model,
            store,
            propagator,
            budget: SearchBudget::new(limits),
            stack: Vec::new(),
            incumbent: None,
            stats: SearchStats::default(),
        }
    }

    fn run(&mut self) -> Solution {
        let limit = if self.propagator.propagate_all(&mut self.store).is_err() {
            self.stats.failures += 1;
            None
        } else {
            self.explore()
        };
        self.stats.nodes = self.budget.nodes();
        self.stats.propagations = self.propagator.runs;
        self.stats.elapsed = self.budget.elapsed();

        let status = match (&self.incumbent, limit) {
            (Some(_), None) => SolveStatus::Optimal,
            (None, None) => SolveStatus::Infeasible,
            (Some(_), Some(_)) => SolveStatus::Feasible,
            (None, Some(_)) => SolveStatus::Unknown,
        };
        let objective = self.model.objective().and_then(|o| {
            self.incumbent
                .as_ref()
                .map(|(values, _)| clamp(o.expr.evaluate(|v| values[v.index()])))
        });
        Solution {
            status,
            values: self.incumbent.take().map(|(values, _)| values),
            objective,
            stats: self.stats.clone(),
        }
    }

    /// Search below the root; returns the limit that cut the search short, if any
    fn explore(&mut self) -> Option<LimitReached> {
        loop {
            if let Some(limit) = self.budget.step() {
                return Some(limit);
            }
            match self.select() {
                Some(var) => {
                    let value = self.split_point(var);
                    self.store.push_frame();
                    self.stack.push(Decision {
                        var,
                        value,
                        right_tried: false,
                    });
                    let consistent = self.store.set_hi(var, value).is_ok()
                        && self.propagator.propagate(&mut self.store).is_ok();
                    if !consistent {
                        self.stats.failures += 1;
                        if !self.backtrack() {
                            return None;
                        }
                    }
                }
                None => {
                    if self.accept_leaf() && self.model.objective().is_none() {
                        return None;
                    }
                    if !self.backtrack() {
                        return None;
                    }
                }
            }
        }
    }

    /// First unfixed branching variable, else the unfixed variable with the smallest domain
    fn select(&self) -> Option<IntVar> {
        if let Some(&var) = self
            .model
            .decision_vars()
            .iter()
            .find(|&&v| !self.store.is_fixed(v))
        {
            return Some(var);
        }
        (0..self.store.num_vars())
            .map(IntVar)
            .filter(|&v| !self.store.is_fixed(v))
            .min_by_key(|&v| self.store.spread(v))
    }

    fn split_point(&self, var: IntVar) -> i64 {
        let lo = self.store.lo(var);
        let spread = self.store.spread(var);
        if spread <= SPLIT_THRESHOLD {
            lo
        } else {
            clamp(lo as i128 + spread / 2)
        }
    }

    fn accept_leaf(&mut self) -> bool {
        let values = self.store.snapshot();
        let value = |v: IntVar| values[v.index()];
        let satisfied = self.model.posted().iter().all(|p| {
            !p.enforcement.iter().all(|l| l.holds(value(l.var()))) || p.constraint.holds(value)
        });
        if !satisfied {
            self.stats.failures += 1;
            return false;
        }
        let cost = match &self.propagator.objective {
            Some(bound) => {
                let cost = bound.expr.evaluate(value);
                if let Some(rhs) = bound.rhs {
                    if cost > rhs as i128 {
                        self.stats.failures += 1;
                        return false;
                    }
                }
                cost
            }
            None => 0,
        };
        self.stats.solutions += 1;
        if let Some(bound) = &mut self.propagator.objective {
            bound.rhs = Some(clamp(cost - 1));
            trace!(
                solutions = self.stats.solutions,
                nodes = self.budget.nodes(),
                cost = %cost,
                "improving solution"
            );
        }
        self.incumbent = Some((values, cost));
        true
    }

    /// Undo decisions until an untried right branch is consistent
    fn backtrack(&mut self) -> bool {
        while let Some(decision) = self.stack.pop() {
            self.store.pop_frame();
            self.stats.backtracks += 1;
            if decision.right_tried {
                continue;
            }
            self.store.push_frame();
            self.stack.push(Decision {
                right_tried: true,
                ..decision
            });
            let consistent = decision.value < i64::MAX
                && self.store.set_lo(decision.var, decision.value + 1).is_ok()
                && self.propagator.propagate(&mut self.store).is_ok();
            if consistent {
                return true;
            }
            self.stats.failures += 1;
        }
        false
    }
}

fn validate(model: &Model) -> DesignResult<()> {
    let num_vars = model.num_vars();
    for (i, def) in model.var_defs().iter().enumerate() {
        if def.domain.is_empty() {
            return Err(DesignError::solver(format!(
                "variable {} '{}' has empty domain [{}, {}]",
                i, def.name, def.domain.lo, def.domain.hi
            )));
        }
    }
    let check = |var: IntVar| {
        if var.index() >= num_vars {
            Err(DesignError::solver(format!(
                "variable index {} does not belong to this model",
                var.index()
            )))
        } else {
            Ok(())
        }
    };
    for posted in model.posted() {
        for var in posted.constraint.vars() {
            check(var)?;
        }
        for lit in &posted.enforcement {
            check(lit.var())?;
        }
        match &posted.constraint {
            Constraint::Element { table, .. } if table.is_empty() => {
                return Err(DesignError::solver("element constraint over an empty table"));
            }
            Constraint::Table { vars, tuples, .. } => {
                if let Some(t) = tuples.iter().find(|t| t.len() != vars.len()) {
                    return Err(DesignError::solver(format!(
                        "table tuple of arity {} over {} variables",
                        t.len(),
                        vars.len()
                    )));
                }
            }
            _ => {}
        }
    }
    if let Some(objective) = model.objective() {
        for &(var, _) in objective.expr.terms() {
            check(var)?;
        }
    }
    for &var in model.decision_vars() {
        check(var)?;
    }
    Ok(())
}
