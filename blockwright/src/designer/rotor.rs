use super::{limit_constraints, ComponentLimits, Designer};
use crate::catalog::Catalog;
use crate::constraints::Constraint;
use crate::metrics::Metric;
use crate::solver::Sense;
use crate::DesignResult;

/// Overhauled turbine rotor: a row of blades and stators along the shaft
#[derive(Debug, Clone, PartialEq)]
pub struct TurbineRotorDesigner {
    pub length: usize,
    /// Total expansion the steam should reach at the end of the rotor
    pub optimal_expansion: f64,
    pub catalog: Catalog,
    pub component_limits: ComponentLimits,
}

impl TurbineRotorDesigner {
    pub fn new(length: usize, optimal_expansion: f64) -> DesignResult<Self> {
        Ok(Self {
            length,
            optimal_expansion,
            catalog: Catalog::turbine_rotor()?,
            component_limits: ComponentLimits::new(),
        })
    }

    pub fn with_catalog(mut self, catalog: Catalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn with_limit(mut self, component: impl Into<String>, min: usize, max: Option<usize>) -> Self {
        self.component_limits.insert(component.into(), (min, max));
        self
    }
}

impl Designer for TurbineRotorDesigner {
    fn structure(&self) -> &'static str {
        "turbine rotor"
    }

    fn shape(&self) -> Vec<usize> {
        vec![self.length]
    }

    fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    fn structural_constraints(&self) -> Vec<Constraint> {
        Vec::new()
    }

    fn user_constraints(&self) -> Vec<Constraint> {
        limit_constraints(&self.component_limits).collect()
    }

    fn objective(&self) -> Option<(Metric, Sense)> {
        Some((
            Metric::RotorEfficiency {
                optimal_expansion: self.optimal_expansion,
            },
            Sense::Maximize,
        ))
    }
}
