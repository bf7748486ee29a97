use super::{limit_constraints, ComponentLimits, Designer};
use crate::catalog::Catalog;
use crate::constraints::{Constraint, CHAMBER_SHAPE};
use crate::metrics::Metric;
use crate::solver::Sense;
use crate::DesignResult;

/// QMD nucleosynthesis chamber: heaters packed around a fixed plasma core
///
/// The chamber must absorb `recipe_heat`; designs waste as little cooling
/// beyond it as possible.
#[derive(Debug, Clone, PartialEq)]
pub struct NucleosynthesisDesigner {
    pub recipe_heat: i64,
    /// Mirror across the middle of the first axis
    pub x_symmetry: bool,
    /// Mirror across the middle of the second axis
    pub z_symmetry: bool,
    pub catalog: Catalog,
    pub component_limits: ComponentLimits,
}

impl NucleosynthesisDesigner {
    pub fn new(recipe_heat: i64) -> DesignResult<Self> {
        Ok(Self {
            recipe_heat,
            x_symmetry: false,
            z_symmetry: false,
            catalog: Catalog::nucleosynthesis()?,
            component_limits: ComponentLimits::new(),
        })
    }

    pub fn with_catalog(mut self, catalog: Catalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn with_symmetry(mut self, x: bool, z: bool) -> Self {
        self.x_symmetry = x;
        self.z_symmetry = z;
        self
    }

    pub fn with_limit(mut self, component: impl Into<String>, min: usize, max: Option<usize>) -> Self {
        self.component_limits.insert(component.into(), (min, max));
        self
    }
}

impl Designer for NucleosynthesisDesigner {
    fn structure(&self) -> &'static str {
        "nucleosynthesis chamber"
    }

    fn shape(&self) -> Vec<usize> {
        CHAMBER_SHAPE.to_vec()
    }

    fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    fn structural_constraints(&self) -> Vec<Constraint> {
        vec![
            Constraint::boundary("casing"),
            Constraint::OwnRule,
            Constraint::ChamberStructure,
        ]
    }

    fn user_constraints(&self) -> Vec<Constraint> {
        let mut constraints = Vec::new();
        if self.x_symmetry {
            constraints.push(Constraint::Symmetry { axis: 0 });
        }
        if self.z_symmetry {
            constraints.push(Constraint::Symmetry { axis: 1 });
        }
        constraints.extend(limit_constraints(&self.component_limits));
        constraints.push(Constraint::CoolingAtLeast {
            demand: self.recipe_heat,
        });
        constraints
    }

    fn objective(&self) -> Option<(Metric, Sense)> {
        Some((
            Metric::CoolingSurplus {
                demand: self.recipe_heat,
            },
            Sense::Minimize,
        ))
    }
}
