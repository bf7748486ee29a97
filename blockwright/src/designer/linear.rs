use super::{limit_constraints, ComponentLimits, Designer};
use crate::catalog::Catalog;
use crate::constraints::Constraint;
use crate::metrics::{FocusParams, Layout, Metric};
use crate::solver::Sense;
use crate::DesignResult;

/// QMD linear accelerator: a straight beam of `length` blocks
#[derive(Debug, Clone, PartialEq)]
pub struct LinearAcceleratorDesigner {
    pub length: usize,
    pub minimum_energy: i64,
    pub maximum_energy: i64,
    pub target_focus: f64,
    pub focus: FocusParams,
    /// Ambient temperature in kelvin
    pub env_temperature: f64,
    /// Heat absorbed per unit of surface and kelvin
    pub kappa: f64,
    pub heat_neutral: bool,
    pub y_symmetry: bool,
    pub z_symmetry: bool,
    pub catalog: Catalog,
    pub component_limits: ComponentLimits,
}

impl LinearAcceleratorDesigner {
    pub fn new(
        length: usize,
        energy: (i64, i64),
        target_focus: f64,
        focus: FocusParams,
    ) -> DesignResult<Self> {
        Ok(Self {
            length,
            minimum_energy: energy.0,
            maximum_energy: energy.1,
            target_focus,
            focus,
            env_temperature: 300.0,
            kappa: 0.0025,
            heat_neutral: true,
            y_symmetry: false,
            z_symmetry: false,
            catalog: Catalog::accelerator()?,
            component_limits: ComponentLimits::new(),
        })
    }

    pub fn with_catalog(mut self, catalog: Catalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn with_heat_neutral(mut self, heat_neutral: bool) -> Self {
        self.heat_neutral = heat_neutral;
        self
    }

    pub fn with_symmetry(mut self, y: bool, z: bool) -> Self {
        self.y_symmetry = y;
        self.z_symmetry = z;
        self
    }

    pub fn with_limit(mut self, component: impl Into<String>, min: usize, max: Option<usize>) -> Self {
        self.component_limits.insert(component.into(), (min, max));
        self
    }

    /// Heat flowing in from the environment through the outer surface
    pub fn external_heating(&self) -> i64 {
        let surface = (self.length + 2) * 5 * 4 + 50;
        (self.kappa * surface as f64 * self.env_temperature).round() as i64
    }
}

impl Designer for LinearAcceleratorDesigner {
    fn structure(&self) -> &'static str {
        "linear accelerator"
    }

    fn shape(&self) -> Vec<usize> {
        vec![self.length + 2, 5, 5]
    }

    fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    fn structural_constraints(&self) -> Vec<Constraint> {
        let mut constraints = vec![
            Constraint::boundary("casing"),
            Constraint::OwnRule,
            Constraint::LinearBeam,
            Constraint::LinearCavities,
            Constraint::LinearMagnets,
        ];
        if self.heat_neutral {
            constraints.push(Constraint::HeatNeutral {
                external_heating: self.external_heating(),
                layout: Layout::Linear,
            });
        }
        constraints
    }

    fn user_constraints(&self) -> Vec<Constraint> {
        let mut constraints = Vec::new();
        if self.y_symmetry {
            constraints.push(Constraint::Symmetry { axis: 1 });
        }
        if self.z_symmetry {
            constraints.push(Constraint::Symmetry { axis: 2 });
        }
        constraints.extend(limit_constraints(&self.component_limits));
        constraints.push(Constraint::BeamFocusAtLeast {
            target: self.target_focus,
            params: self.focus,
            layout: Layout::Linear,
        });
        constraints.push(Constraint::LinearEnergy {
            min: self.minimum_energy,
            max: self.maximum_energy,
            charge: self.focus.charge,
        });
        constraints
    }

    fn objective(&self) -> Option<(Metric, Sense)> {
        Some((Metric::PowerRequirement, Sense::Minimize))
    }
}
