use super::synchrotron::ring_external_heating;
use super::{limit_constraints, ComponentLimits, Designer};
use crate::catalog::Catalog;
use crate::constraints::Constraint;
use crate::metrics::{FocusParams, Layout, Metric, Particle};
use crate::solver::Sense;
use crate::DesignResult;

/// QMD decelerator: a synchrotron ring with a single cavity section
///
/// Only the dipoles bound the energy of the particles it accepts.
#[derive(Debug, Clone, PartialEq)]
pub struct DeceleratorDesigner {
    pub side_length: usize,
    pub minimum_energy: i64,
    pub maximum_energy: i64,
    pub target_focus: f64,
    pub focus: FocusParams,
    pub mass: f64,
    pub env_temperature: f64,
    pub kappa: f64,
    pub heat_neutral: bool,
    pub internal_symmetry: bool,
    pub catalog: Catalog,
    pub component_limits: ComponentLimits,
}

impl DeceleratorDesigner {
    pub fn new(
        side_length: usize,
        energy: (i64, i64),
        target_focus: f64,
        focus: FocusParams,
        mass: f64,
    ) -> DesignResult<Self> {
        Ok(Self {
            side_length,
            minimum_energy: energy.0,
            maximum_energy: energy.1,
            target_focus,
            focus,
            mass,
            env_temperature: 300.0,
            kappa: 0.0025,
            heat_neutral: true,
            internal_symmetry: false,
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

    pub fn with_internal_symmetry(mut self, internal_symmetry: bool) -> Self {
        self.internal_symmetry = internal_symmetry;
        self
    }

    pub fn with_limit(mut self, component: impl Into<String>, min: usize, max: Option<usize>) -> Self {
        self.component_limits.insert(component.into(), (min, max));
        self
    }

    pub fn external_heating(&self) -> i64 {
        ring_external_heating(self.side_length, self.kappa, self.env_temperature)
    }

    pub fn radius(&self) -> f64 {
        self.side_length as f64 / 2.0
    }

    pub fn particle(&self) -> Particle {
        Particle::new(self.focus.charge, self.radius(), self.mass)
    }
}

impl Designer for DeceleratorDesigner {
    fn structure(&self) -> &'static str {
        "decelerator"
    }

    fn shape(&self) -> Vec<usize> {
        let n = self.side_length + 4;
        vec![n, n, 5]
    }

    fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    fn structural_constraints(&self) -> Vec<Constraint> {
        let mut constraints = vec![
            Constraint::RingCasing,
            Constraint::RingBeam,
            Constraint::RingAirCore,
            Constraint::RingCavities,
            Constraint::RingOneCavity,
            Constraint::RingMagnets,
            Constraint::OwnRule,
        ];
        if self.heat_neutral {
            constraints.push(Constraint::HeatNeutral {
                external_heating: self.external_heating(),
                layout: Layout::Ring,
            });
        }
        constraints
    }

    fn user_constraints(&self) -> Vec<Constraint> {
        let mut constraints = Vec::new();
        if self.internal_symmetry {
            constraints.push(Constraint::RingInnerSymmetry);
        }
        constraints.push(Constraint::RingDipoleEnergy {
            min: self.minimum_energy,
            max: self.maximum_energy,
            particle: self.particle(),
        });
        constraints.push(Constraint::BeamFocusAtLeast {
            target: self.target_focus,
            params: self.focus,
            layout: Layout::Ring,
        });
        constraints.extend(limit_constraints(&self.component_limits));
        constraints
    }

    fn objective(&self) -> Option<(Metric, Sense)> {
        Some((Metric::RingPowerRequirement, Sense::Minimize))
    }
}
