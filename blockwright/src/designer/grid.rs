use super::Designer;
use crate::catalog::Catalog;
use crate::constraints::Constraint;
use crate::metrics::Metric;
use crate::solver::Sense;

/// Any grid shape with caller-chosen constraints and objective
#[derive(Debug, Clone, PartialEq)]
pub struct GridDesigner {
    shape: Vec<usize>,
    catalog: Catalog,
    constraints: Vec<Constraint>,
    objective: Option<(Metric, Sense)>,
}

impl GridDesigner {
    pub fn new(shape: impl Into<Vec<usize>>, catalog: Catalog) -> Self {
        Self {
            shape: shape.into(),
            catalog,
            constraints: Vec::new(),
            objective: None,
        }
    }

    pub fn with_constraint(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    pub fn maximize(mut self, metric: Metric) -> Self {
        self.objective = Some((metric, Sense::Maximize));
        self
    }

    pub fn minimize(mut self, metric: Metric) -> Self {
        self.objective = Some((metric, Sense::Minimize));
        self
    }
}

impl Designer for GridDesigner {
    fn structure(&self) -> &'static str {
        "grid"
    }

    fn shape(&self) -> Vec<usize> {
        self.shape.clone()
    }

    fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    fn structural_constraints(&self) -> Vec<Constraint> {
        self.constraints.clone()
    }

    fn user_constraints(&self) -> Vec<Constraint> {
        Vec::new()
    }

    fn objective(&self) -> Option<(Metric, Sense)> {
        self.objective.clone()
    }
}
