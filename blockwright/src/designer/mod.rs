//! Designers
//!
//! A designer fixes a grid shape, a catalog, the constraints of one kind of
//! structure and an optional objective. [`Designer::design`] turns them
//! into a model, solves it and decodes the cell variables back into
//! components. A design run keeps no state between calls.

mod decelerator;
mod dynamo;
mod grid;
mod linear;
mod nucleosynthesis;
mod rotor;
mod synchrotron;

pub use decelerator::DeceleratorDesigner;
pub use dynamo::TurbineDynamoDesigner;
pub use grid::GridDesigner;
pub use linear::LinearAcceleratorDesigner;
pub use nucleosynthesis::NucleosynthesisDesigner;
pub use rotor::TurbineRotorDesigner;
pub use synchrotron::SynchrotronDesigner;

use crate::catalog::Catalog;
use crate::component::Component;
use crate::constraints::Constraint;
use crate::error::DesignError;
use crate::grid::Grid;
use crate::limits::SolverLimits;
use crate::metrics::Metric;
use crate::solver::{Backend, IntVar, Model, SearchStats, Sense, Solution, SolveStatus};
use crate::DesignResult;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// A solved grid together with how it was found
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Design {
    pub grid: Grid<Component>,
    pub status: SolveStatus,
    /// Objective value divided by the metric's scale
    pub objective: Option<f64>,
    pub stats: SearchStats,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DesignOutcome {
    Found(Design),
    /// No design exists, or none was found before a limit stopped the search
    Infeasible { proven: bool },
}

impl DesignOutcome {
    pub fn design(&self) -> Option<&Design> {
        match self {
            DesignOutcome::Found(design) => Some(design),
            DesignOutcome::Infeasible { .. } => None,
        }
    }

    pub fn into_design(self) -> Option<Design> {
        match self {
            DesignOutcome::Found(design) => Some(design),
            DesignOutcome::Infeasible { .. } => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, DesignOutcome::Found(_))
    }
}

/// Per-component occurrence bounds, keyed by full name
pub type ComponentLimits = BTreeMap<String, (usize, Option<usize>)>;

fn limit_constraints(limits: &ComponentLimits) -> impl Iterator<Item = Constraint> + '_ {
    limits
        .iter()
        .map(|(component, &(min, max))| Constraint::quantity(component.as_str(), min, max))
}

pub trait Designer {
    /// Short name of the structure, used in logs
    fn structure(&self) -> &'static str;

    fn shape(&self) -> Vec<usize>;

    fn catalog(&self) -> &Catalog;

    /// Constraints every design of this structure obeys
    fn structural_constraints(&self) -> Vec<Constraint>;

    /// Constraints selected by the caller, such as symmetries and limits
    fn user_constraints(&self) -> Vec<Constraint>;

    fn objective(&self) -> Option<(Metric, Sense)>;

    fn design(&self, backend: &dyn Backend, limits: &SolverLimits) -> DesignResult<DesignOutcome> {
        let shape = self.shape();
        let catalog = self.catalog();
        info!(
            structure = self.structure(),
            shape = ?shape,
            components = catalog.len(),
            "designing"
        );

        let rules = catalog.parse_rules()?;
        debug!(
            rules = rules.iter().filter(|r| !r.is_empty()).count(),
            "parsed placement rules"
        );

        let mut model = Model::new();
        let cells = allocate_cells(&mut model, &shape, catalog)?;
        debug!(variables = model.num_vars(), "allocated grid");

        for constraint in self.structural_constraints() {
            constraint.apply(&mut model, &cells, catalog)?;
        }
        debug!(constraints = model.num_constraints(), "applied structural constraints");

        for constraint in self.user_constraints() {
            constraint.apply(&mut model, &cells, catalog)?;
        }
        debug!(constraints = model.num_constraints(), "applied user constraints");

        let objective = match self.objective() {
            Some((metric, sense)) => {
                let var = metric.compile(&mut model, &cells, catalog)?;
                match sense {
                    Sense::Minimize => model.minimize(var),
                    Sense::Maximize => model.maximize(var),
                }
                debug!(metric = metric.name(), ?sense, "attached objective");
                Some((metric, var))
            }
            None => None,
        };

        let solution = backend.solve(&model, limits)?;
        debug!(backend = backend.name(), stats = %solution.stats, "solve finished");

        match solution.status {
            SolveStatus::Infeasible => {
                info!(structure = self.structure(), "no design satisfies the constraints");
                Ok(DesignOutcome::Infeasible { proven: true })
            }
            SolveStatus::Unknown => {
                info!(structure = self.structure(), "search stopped before any design was found");
                Ok(DesignOutcome::Infeasible { proven: false })
            }
            SolveStatus::Optimal | SolveStatus::Feasible => {
                let grid = decode(&solution, &cells, catalog)?;
                let objective = match &objective {
                    Some((metric, var)) => Some(objective_value(&solution, *var, metric)?),
                    None => None,
                };
                info!(
                    structure = self.structure(),
                    status = %solution.status,
                    objective = ?objective,
                    "design found"
                );
                Ok(DesignOutcome::Found(Design {
                    grid,
                    status: solution.status,
                    objective,
                    stats: solution.stats,
                }))
            }
        }
    }
}

/// One variable per cell ranging over the catalog, branched on first
fn allocate_cells(model: &mut Model, shape: &[usize], catalog: &Catalog) -> DesignResult<Grid<IntVar>> {
    let last = catalog.len() as i64 - 1;
    let count: usize = shape.iter().product();
    let vars: Vec<IntVar> = (0..count)
        .map(|i| model.new_int_var(0, last, format!("cell_{}", i)))
        .collect();
    model.add_decision_strategy(vars.iter().copied());
    Grid::new(vars, shape.to_vec())
}

fn decode(solution: &Solution, cells: &Grid<IntVar>, catalog: &Catalog) -> DesignResult<Grid<Component>> {
    let components = cells
        .iter()
        .map(|&var| {
            let index = solution.value(var).ok_or_else(|| {
                DesignError::solver(format!("no value for cell variable {}", var.index()))
            })?;
            usize::try_from(index)
                .ok()
                .and_then(|i| catalog.get(i))
                .cloned()
                .ok_or_else(|| {
                    DesignError::solver(format!("cell value {} is not a catalog index", index))
                })
        })
        .collect::<DesignResult<Vec<Component>>>()?;
    Grid::new(components, cells.shape().to_vec())
}

fn objective_value(solution: &Solution, var: IntVar, metric: &Metric) -> DesignResult<f64> {
    let value = solution
        .value(var)
        .ok_or_else(|| DesignError::solver("no value for the objective variable"))?;
    Ok(value as f64 / metric.scale() as f64)
}
