//! Constraint library
//!
//! A [`Constraint`] can be checked against a concrete grid
//! ([`Constraint::is_satisfied`]) and posted on a model over the cell
//! variables ([`Constraint::apply`]). Geometry constraints assume a fixed
//! grid shape and fail with [`DesignError::ShapeAssumption`] on any other.
//!
//! [`DesignError::ShapeAssumption`]: crate::error::DesignError::ShapeAssumption

mod chamber;
mod dynamo;
mod generic;
mod linear;
mod physics;
mod ring;

use crate::catalog::Catalog;
use crate::component::Component;
use crate::grid::Grid;
use crate::metrics::{FocusParams, Layout, Particle};
use crate::solver::{IntVar, Lit, Model};
use crate::DesignResult;
use serde::Serialize;

pub(crate) use chamber::CHAMBER_SHAPE;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "constraint", rename_all = "snake_case")]
pub enum Constraint {
    /// Shell cells hold `shell_type`, interior cells never do
    Boundary { shell_type: String },
    /// Cells mirrored across the middle of `axis` are equal
    Symmetry { axis: usize },
    /// The component with this full name occurs between `min` and `max` times
    Quantity {
        component: String,
        min: usize,
        max: Option<usize>,
    },
    /// Every cell with a complete neighborhood satisfies its own placement rule
    OwnRule,
    /// Beam pipe exactly along the axis of a linear accelerator
    LinearBeam,
    /// Cavities fill whole cross-sections, never two in a row
    LinearCavities,
    /// Magnets fill the four faces around the beam of a cross-section
    LinearMagnets,
    /// Outer shell, floor, ceiling and inner wall of a synchrotron are casing
    RingCasing,
    RingBeam,
    /// The space enclosed by the ring is air
    RingAirCore,
    RingCavities,
    /// Exactly one cavity section on the whole ring
    RingOneCavity,
    /// Dipole and quadrupole sections with their yokes, plus the corner dipoles
    RingMagnets,
    /// Every straight ring cross-section is mirror symmetric on both axes
    RingInnerSymmetry,
    /// `heating + external_heating <= cooling`
    HeatNeutral {
        external_heating: i64,
        layout: Layout,
    },
    BeamFocusAtLeast {
        target: f64,
        params: FocusParams,
        layout: Layout,
    },
    /// Beam energy `voltage * round(3q) / 3` of a linear accelerator lies in `[min, max]`
    LinearEnergy { min: i64, max: i64, charge: f64 },
    /// The smaller of dipole energy and radiation loss lies in `[min, max]`
    RingEnergy {
        min: i64,
        max: i64,
        particle: Particle,
    },
    /// Dipole energy alone lies in `[min, max]`
    RingDipoleEnergy {
        min: i64,
        max: i64,
        particle: Particle,
    },
    /// Beam, plasma glass, nozzles and the air channel of a nucleosynthesis chamber
    ChamberStructure,
    /// Total cooling absorbs at least `demand`
    CoolingAtLeast { demand: i64 },
    /// Bearings fill exactly the centred `shaft_width` square of a 2-D dynamo
    CenteredBearing { shaft_width: usize },
}

impl Constraint {
    pub fn boundary(shell_type: impl Into<String>) -> Self {
        Constraint::Boundary {
            shell_type: shell_type.into(),
        }
    }

    pub fn quantity(component: impl Into<String>, min: usize, max: Option<usize>) -> Self {
        Constraint::Quantity {
            component: component.into(),
            min,
            max,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Constraint::Boundary { .. } => "boundary constraint",
            Constraint::Symmetry { .. } => "symmetry constraint",
            Constraint::Quantity { .. } => "quantity constraint",
            Constraint::OwnRule => "placement rule constraint",
            Constraint::LinearBeam => "linear beam constraint",
            Constraint::LinearCavities => "linear cavity constraint",
            Constraint::LinearMagnets => "linear magnet constraint",
            Constraint::RingCasing => "ring casing constraint",
            Constraint::RingBeam => "ring beam constraint",
            Constraint::RingAirCore => "ring air constraint",
            Constraint::RingCavities => "ring cavity constraint",
            Constraint::RingOneCavity => "ring single cavity constraint",
            Constraint::RingMagnets => "ring magnet constraint",
            Constraint::RingInnerSymmetry => "ring inner symmetry constraint",
            Constraint::HeatNeutral { .. } => "heat neutral constraint",
            Constraint::BeamFocusAtLeast { .. } => "beam focus constraint",
            Constraint::LinearEnergy { .. } => "linear energy constraint",
            Constraint::RingEnergy { .. } => "ring energy constraint",
            Constraint::RingDipoleEnergy { .. } => "ring dipole energy constraint",
            Constraint::ChamberStructure => "nucleosynthesis structure constraint",
            Constraint::CoolingAtLeast { .. } => "cooling constraint",
            Constraint::CenteredBearing { .. } => "centered bearing constraint",
        }
    }

    /// Whether a concrete grid satisfies the constraint
    pub fn is_satisfied(&self, grid: &Grid<Component>) -> DesignResult<bool> {
        match self {
            Constraint::Boundary { shell_type } => generic::boundary_holds(grid, shell_type),
            Constraint::Symmetry { axis } => generic::symmetry_holds(grid, *axis),
            Constraint::Quantity {
                component,
                min,
                max,
            } => Ok(generic::quantity_holds(grid, component, *min, *max)),
            Constraint::OwnRule => generic::own_rule_holds(grid),
            Constraint::LinearBeam => linear::beam_holds(grid),
            Constraint::LinearCavities => linear::cavities_hold(grid),
            Constraint::LinearMagnets => linear::magnets_hold(grid),
            Constraint::RingCasing => ring::casing_holds(grid),
            Constraint::RingBeam => ring::beam_holds(grid),
            Constraint::RingAirCore => ring::air_core_holds(grid),
            Constraint::RingCavities => ring::cavities_hold(grid),
            Constraint::RingOneCavity => ring::one_cavity_holds(grid),
            Constraint::RingMagnets => ring::magnets_hold(grid),
            Constraint::RingInnerSymmetry => ring::inner_symmetry_holds(grid),
            Constraint::HeatNeutral {
                external_heating,
                layout,
            } => physics::heat_neutral_holds(grid, *external_heating, *layout),
            Constraint::BeamFocusAtLeast {
                target,
                params,
                layout,
            } => physics::focus_holds(grid, *target, params, *layout),
            Constraint::LinearEnergy { min, max, charge } => {
                linear::energy_holds(grid, *min, *max, *charge)
            }
            Constraint::RingEnergy { min, max, particle } => {
                ring::energy_holds(grid, *min, *max, particle)
            }
            Constraint::RingDipoleEnergy { min, max, particle } => {
                ring::dipole_energy_holds(grid, *min, *max, particle)
            }
            Constraint::ChamberStructure => chamber::structure_holds(grid),
            Constraint::CoolingAtLeast { demand } => physics::cooling_holds(grid, *demand),
            Constraint::CenteredBearing { shaft_width } => {
                dynamo::centered_bearing_holds(grid, *shaft_width)
            }
        }
    }

    /// Post the constraint on `model` over the cell variables
    pub fn apply(
        &self,
        model: &mut Model,
        cells: &Grid<IntVar>,
        catalog: &Catalog,
    ) -> DesignResult<()> {
        match self {
            Constraint::Boundary { shell_type } => {
                generic::apply_boundary(model, cells, catalog, shell_type)
            }
            Constraint::Symmetry { axis } => generic::apply_symmetry(model, cells, *axis),
            Constraint::Quantity {
                component,
                min,
                max,
            } => generic::apply_quantity(model, cells, catalog, component, *min, *max),
            Constraint::OwnRule => generic::apply_own_rule(model, cells, catalog),
            Constraint::LinearBeam => linear::apply_beam(model, cells, catalog),
            Constraint::LinearCavities => linear::apply_cavities(model, cells, catalog),
            Constraint::LinearMagnets => linear::apply_magnets(model, cells, catalog),
            Constraint::RingCasing => ring::apply_casing(model, cells, catalog),
            Constraint::RingBeam => ring::apply_beam(model, cells, catalog),
            Constraint::RingAirCore => ring::apply_air_core(model, cells, catalog),
            Constraint::RingCavities => ring::apply_cavities(model, cells, catalog),
            Constraint::RingOneCavity => ring::apply_one_cavity(model, cells, catalog),
            Constraint::RingMagnets => ring::apply_magnets(model, cells, catalog),
            Constraint::RingInnerSymmetry => ring::apply_inner_symmetry(model, cells),
            Constraint::HeatNeutral {
                external_heating,
                layout,
            } => physics::apply_heat_neutral(model, cells, catalog, *external_heating, *layout),
            Constraint::BeamFocusAtLeast {
                target,
                params,
                layout,
            } => physics::apply_focus(model, cells, catalog, *target, params, *layout),
            Constraint::LinearEnergy { min, max, charge } => {
                linear::apply_energy(model, cells, catalog, *min, *max, *charge)
            }
            Constraint::RingEnergy { min, max, particle } => {
                ring::apply_energy(model, cells, catalog, *min, *max, particle)
            }
            Constraint::RingDipoleEnergy { min, max, particle } => {
                ring::apply_dipole_energy(model, cells, catalog, *min, *max, particle)
            }
            Constraint::ChamberStructure => chamber::apply_structure(model, cells, catalog),
            Constraint::CoolingAtLeast { demand } => {
                physics::apply_cooling(model, cells, catalog, *demand)
            }
            Constraint::CenteredBearing { shaft_width } => {
                dynamo::apply_centered_bearing(model, cells, catalog, *shaft_width)
            }
        }
    }
}

/// `var` takes one of `ids`, or none of them, depending on `inside`
pub(crate) fn restrict(model: &mut Model, var: IntVar, ids: &[i64], inside: bool) {
    let tuples: Vec<Vec<i64>> = ids.iter().map(|&id| vec![id]).collect();
    if inside {
        model.add_allowed(vec![var], tuples);
    } else {
        model.add_forbidden(vec![var], tuples);
    }
}

/// `var` takes one of `ids` exactly when `lit` holds
pub(crate) fn restrict_iff(model: &mut Model, var: IntVar, ids: &[i64], lit: Lit) {
    let tuples: Vec<Vec<i64>> = ids.iter().map(|&id| vec![id]).collect();
    model.add_allowed(vec![var], tuples.clone()).only_enforce_if([lit]);
    model.add_forbidden(vec![var], tuples).only_enforce_if([!lit]);
}
