use super::{limit_constraints, ComponentLimits, Designer};
use crate::catalog::Catalog;
use crate::constraints::Constraint;
use crate::metrics::Metric;
use crate::solver::Sense;
use crate::DesignResult;

/// Overhauled turbine dynamo: a square coil layer around a centred shaft
#[derive(Debug, Clone, PartialEq)]
pub struct TurbineDynamoDesigner {
    pub side_length: usize,
    pub shaft_width: usize,
    /// Mirror across the middle of the second axis
    pub x_symmetry: bool,
    /// Mirror across the middle of the first axis
    pub y_symmetry: bool,
    pub catalog: Catalog,
    pub component_limits: ComponentLimits,
}

impl TurbineDynamoDesigner {
    /// A dynamo over the default turbine catalog with a one-block shaft
    pub fn new(side_length: usize) -> DesignResult<Self> {
        Ok(Self::with_catalog(side_length, Catalog::turbine_dynamo()?))
    }

    pub fn with_catalog(side_length: usize, catalog: Catalog) -> Self {
        Self {
            side_length,
            shaft_width: 1,
            x_symmetry: false,
            y_symmetry: false,
            catalog,
            component_limits: ComponentLimits::new(),
        }
    }

    pub fn with_shaft_width(mut self, shaft_width: usize) -> Self {
        self.shaft_width = shaft_width;
        self
    }

    pub fn with_symmetry(mut self, x: bool, y: bool) -> Self {
        self.x_symmetry = x;
        self.y_symmetry = y;
        self
    }

    pub fn with_limit(mut self, component: impl Into<String>, min: usize, max: Option<usize>) -> Self {
        self.component_limits.insert(component.into(), (min, max));
        self
    }
}

impl Designer for TurbineDynamoDesigner {
    fn structure(&self) -> &'static str {
        "turbine dynamo"
    }

    fn shape(&self) -> Vec<usize> {
        let n = self.side_length + 2;
        vec![n, n]
    }

    fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    fn structural_constraints(&self) -> Vec<Constraint> {
        vec![
            Constraint::boundary("casing"),
            Constraint::OwnRule,
            Constraint::CenteredBearing {
                shaft_width: self.shaft_width,
            },
        ]
    }

    fn user_constraints(&self) -> Vec<Constraint> {
        let mut constraints = Vec::new();
        if self.x_symmetry {
            constraints.push(Constraint::Symmetry { axis: 1 });
        }
        if self.y_symmetry {
            constraints.push(Constraint::Symmetry { axis: 0 });
        }
        constraints.extend(limit_constraints(&self.component_limits));
        constraints
    }

    fn objective(&self) -> Option<(Metric, Sense)> {
        Some((Metric::DynamoConductivity, Sense::Maximize))
    }
}
