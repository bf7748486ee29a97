//! Derived metrics
//!
//! Every metric is defined twice: [`Metric::evaluate`] computes it on a
//! concrete grid of components, [`Metric::compile`] builds one solver
//! variable that equals `evaluate(..) * scale()` for every assignment of
//! the cell variables. Sums agree exactly; ratios and roots agree up to the
//! truncation of scaled integer arithmetic.

mod dynamo;
mod linear;
mod ring;
mod rotor;

pub(crate) use linear::check_linear;
pub(crate) use ring::{check_ring, ring_slots};
pub(crate) use rotor::check_rotor;
pub use rotor::expansion_levels;

use crate::catalog::Catalog;
use crate::component::Component;
use crate::error::DesignError;
use crate::fixed_point::SCALE;
use crate::grid::Grid;
use crate::solver::{Cmp, Domain, IntVar, LinearExpr, Lit, Model};
use crate::DesignResult;
use serde::Serialize;

/// Beam parameters shared by the focus metrics
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FocusParams {
    pub charge: f64,
    pub beam_strength: f64,
    pub scaling_factor: f64,
    pub initial_focus: f64,
}

impl FocusParams {
    pub fn new(charge: f64, beam_strength: f64) -> Self {
        Self {
            charge,
            beam_strength,
            scaling_factor: 10_000.0,
            initial_focus: 0.0,
        }
    }

    pub fn with_scaling_factor(mut self, scaling_factor: f64) -> Self {
        self.scaling_factor = scaling_factor;
        self
    }

    pub fn with_initial_focus(mut self, initial_focus: f64) -> Self {
        self.initial_focus = initial_focus;
        self
    }

    /// Focus lost per unit of beam attenuation
    pub fn loss_factor(&self) -> f64 {
        1.0 + self.charge.abs() * (self.beam_strength / self.scaling_factor).sqrt()
    }

    fn validate(&self) -> DesignResult<()> {
        if self.scaling_factor <= 0.0 || self.beam_strength < 0.0 {
            return Err(DesignError::undefined(format!(
                "beam focus with strength {} and scaling factor {}",
                self.beam_strength, self.scaling_factor
            )));
        }
        Ok(())
    }
}

/// Particle circulating in a synchrotron
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Particle {
    pub charge: f64,
    pub radius: f64,
    pub mass: f64,
}

impl Particle {
    pub fn new(charge: f64, radius: f64, mass: f64) -> Self {
        Self {
            charge,
            radius,
            mass,
        }
    }

    fn validate(&self) -> DesignResult<()> {
        if self.charge == 0.0 || self.mass <= 0.0 || self.radius < 0.0 {
            return Err(DesignError::undefined(format!(
                "energy of a particle with charge {}, mass {} and radius {}",
                self.charge, self.mass, self.radius
            )));
        }
        Ok(())
    }
}

/// Structure a physics metric is read from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Layout {
    /// `(L+2) x 5 x 5` linear accelerator
    Linear,
    /// `n x n x 5` synchrotron ring
    Ring,
}

impl Layout {
    pub fn heating_rate(self) -> Metric {
        match self {
            Layout::Linear => Metric::HeatingRate,
            Layout::Ring => Metric::RingHeatingRate,
        }
    }

    pub fn beam_focus(self, params: FocusParams) -> Metric {
        match self {
            Layout::Linear => Metric::BeamFocus(params),
            Layout::Ring => Metric::RingBeamFocus(params),
        }
    }

    pub fn power_requirement(self) -> Metric {
        match self {
            Layout::Linear => Metric::PowerRequirement,
            Layout::Ring => Metric::RingPowerRequirement,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "metric", rename_all = "snake_case")]
pub enum Metric {
    /// Heat of the cavities and magnets along a linear accelerator
    HeatingRate,
    /// Cooling of every cooler and heater in the grid, for any layout
    CoolingRate,
    /// Heat of every component in the grid, for any layout
    TotalHeatingRate,
    /// `cooling - demand`, the cooling left over once `demand` is absorbed
    CoolingSurplus { demand: i64 },
    Voltage,
    BeamFocus(FocusParams),
    PowerRequirement,
    RingHeatingRate,
    RingVoltage,
    MaxDipoleEnergy(Particle),
    MaxRadiationLoss(Particle),
    RingBeamFocus(FocusParams),
    RingPowerRequirement,
    /// `Σ conductivity / max(bearings / 2, coils)`, zero without coils
    DynamoConductivity,
    /// Mean blade efficiency of a turbine rotor, zero-blade rotors undefined
    RotorEfficiency { optimal_expansion: f64 },
    /// Number of cells holding a component of one type
    TypeCount { type_name: String },
}

impl Metric {
    pub fn name(&self) -> &'static str {
        match self {
            Metric::HeatingRate => "heating rate",
            Metric::CoolingRate => "cooling rate",
            Metric::TotalHeatingRate => "total heating rate",
            Metric::CoolingSurplus { .. } => "cooling surplus",
            Metric::Voltage => "voltage",
            Metric::BeamFocus(_) => "beam focus",
            Metric::PowerRequirement => "power requirement",
            Metric::RingHeatingRate => "ring heating rate",
            Metric::RingVoltage => "ring voltage",
            Metric::MaxDipoleEnergy(_) => "maximum dipole energy",
            Metric::MaxRadiationLoss(_) => "maximum radiation loss",
            Metric::RingBeamFocus(_) => "ring beam focus",
            Metric::RingPowerRequirement => "ring power requirement",
            Metric::DynamoConductivity => "dynamo conductivity",
            Metric::RotorEfficiency { .. } => "rotor efficiency",
            Metric::TypeCount { .. } => "type count",
        }
    }

    /// Factor between the compiled integer and the evaluated value
    pub fn scale(&self) -> i64 {
        match self {
            Metric::BeamFocus(_)
            | Metric::RingBeamFocus(_)
            | Metric::DynamoConductivity
            | Metric::RotorEfficiency { .. } => SCALE,
            _ => 1,
        }
    }

    pub fn evaluate(&self, grid: &Grid<Component>) -> DesignResult<f64> {
        match self {
            Metric::HeatingRate => linear::heating_rate(grid),
            Metric::CoolingRate => Ok(grid.iter().map(|c| c.cooling() as f64).sum()),
            Metric::TotalHeatingRate => Ok(grid.iter().map(|c| c.heat() as f64).sum()),
            Metric::CoolingSurplus { demand } => {
                Ok(Metric::CoolingRate.evaluate(grid)? - *demand as f64)
            }
            Metric::Voltage => linear::voltage(grid),
            Metric::BeamFocus(params) => linear::beam_focus(grid, params),
            Metric::PowerRequirement => power_requirement(&linear::parts(grid)?),
            Metric::RingHeatingRate => ring::heating_rate(grid),
            Metric::RingVoltage => ring::voltage(grid),
            Metric::MaxDipoleEnergy(particle) => ring::max_dipole_energy(grid, particle),
            Metric::MaxRadiationLoss(particle) => ring::max_radiation_loss(grid, particle),
            Metric::RingBeamFocus(params) => ring::beam_focus(grid, params),
            Metric::RingPowerRequirement => power_requirement(&ring::parts(grid)?),
            Metric::DynamoConductivity => Ok(dynamo::conductivity(grid)),
            Metric::RotorEfficiency { optimal_expansion } => {
                rotor::efficiency(grid, *optimal_expansion)
            }
            Metric::TypeCount { type_name } => {
                Ok(grid.iter().filter(|c| c.is_type(type_name)).count() as f64)
            }
        }
    }

    /// Build a variable equal to `evaluate(..) * scale()` for the cell variables
    pub fn compile(
        &self,
        model: &mut Model,
        cells: &Grid<IntVar>,
        catalog: &Catalog,
    ) -> DesignResult<IntVar> {
        match self {
            Metric::HeatingRate => linear::compile_heating_rate(model, cells, catalog),
            Metric::CoolingRate => {
                let table = catalog.attribute_table(Component::cooling);
                Ok(attribute_sum(model, cells.cells(), &table, "cooling_rate"))
            }
            Metric::TotalHeatingRate => {
                let table = catalog.attribute_table(Component::heat);
                Ok(attribute_sum(model, cells.cells(), &table, "total_heating_rate"))
            }
            Metric::CoolingSurplus { demand } => {
                let cooling = Metric::CoolingRate.compile(model, cells, catalog)?;
                let surplus = model.new_var(Domain::LARGE, "cooling_surplus");
                model.add_equality(surplus, LinearExpr::from(cooling) - *demand);
                Ok(surplus)
            }
            Metric::Voltage => linear::compile_voltage(model, cells, catalog),
            Metric::BeamFocus(params) => linear::compile_beam_focus(model, cells, catalog, params),
            Metric::PowerRequirement => {
                let parts = linear::part_vars(cells)?;
                compile_power_requirement(model, &parts, catalog)
            }
            Metric::RingHeatingRate => ring::compile_heating_rate(model, cells, catalog),
            Metric::RingVoltage => ring::compile_voltage(model, cells, catalog),
            Metric::MaxDipoleEnergy(particle) => {
                ring::compile_max_dipole_energy(model, cells, catalog, particle)
            }
            Metric::MaxRadiationLoss(particle) => {
                ring::compile_max_radiation_loss(model, cells, catalog, particle)
            }
            Metric::RingBeamFocus(params) => ring::compile_beam_focus(model, cells, catalog, params),
            Metric::RingPowerRequirement => {
                let parts = ring::part_vars(cells)?;
                compile_power_requirement(model, &parts, catalog)
            }
            Metric::DynamoConductivity => Ok(dynamo::compile_conductivity(model, cells, catalog)),
            Metric::RotorEfficiency { optimal_expansion } => {
                rotor::compile_efficiency(model, cells, catalog, *optimal_expansion)
            }
            Metric::TypeCount { type_name } => {
                let table = catalog.attribute_table(|c| c.is_type(type_name) as i64);
                Ok(attribute_sum(model, cells.cells(), &table, "type_count"))
            }
        }
    }
}

/// Round a real attribute to fixed point
pub(crate) fn scaled(value: f64, scale: i64) -> i64 {
    (value * scale as f64).round() as i64
}

fn table_bounds(table: &[i64]) -> (i64, i64) {
    let lo = table.iter().copied().min().unwrap_or(0);
    let hi = table.iter().copied().max().unwrap_or(0);
    (lo, hi)
}

/// `Σ table[cell]` with one element constraint per cell
pub(crate) fn attribute_sum(model: &mut Model, cells: &[IntVar], table: &[i64], name: &str) -> IntVar {
    let (lo, hi) = table_bounds(table);
    let contributions: Vec<IntVar> = cells
        .iter()
        .map(|&cell| {
            let contribution = model.new_int_var(lo, hi, format!("{}_term", name));
            model.add_element(contribution, cell, table.to_vec());
            contribution
        })
        .collect();
    let n = cells.len() as i64;
    let total = model.new_int_var((lo * n).min(0), (hi * n).max(0), name);
    model.add_equality(total, LinearExpr::sum(contributions));
    total
}

/// Like [`attribute_sum`], counting a cell only while its literal holds
pub(crate) fn gated_attribute_sum(
    model: &mut Model,
    cells: &[(IntVar, Lit)],
    table: &[i64],
    name: &str,
) -> IntVar {
    let (lo, hi) = table_bounds(table);
    let (lo, hi) = (lo.min(0), hi.max(0));
    let contributions: Vec<IntVar> = cells
        .iter()
        .map(|&(cell, gate)| {
            let value = model.new_int_var(lo, hi, format!("{}_value", name));
            model.add_element(value, cell, table.to_vec());
            let contribution = model.new_int_var(lo, hi, format!("{}_term", name));
            model.add_equality(contribution, value).only_enforce_if([gate]);
            model.add_equality(contribution, 0i64).only_enforce_if([!gate]);
            contribution
        })
        .collect();
    let n = cells.len() as i64;
    let total = model.new_int_var(lo * n, hi * n, name);
    model.add_equality(total, LinearExpr::sum(contributions));
    total
}

/// `raw_power / (Σ efficiency / parts)` over the representative part cells
fn power_requirement(parts: &[&Component]) -> DesignResult<f64> {
    let powered: Vec<&&Component> = parts.iter().filter(|c| c.is_powered()).collect();
    if powered.is_empty() {
        return Err(DesignError::undefined(
            "power requirement of a design without cavities or magnets",
        ));
    }
    let raw: f64 = powered.iter().map(|c| c.power() as f64).sum();
    let efficiency: f64 = powered.iter().map(|c| c.efficiency()).sum();
    if efficiency <= 0.0 {
        return Err(DesignError::undefined(
            "power requirement of parts without efficiency",
        ));
    }
    Ok(raw / (efficiency / powered.len() as f64))
}

fn compile_power_requirement(
    model: &mut Model,
    parts: &[IntVar],
    catalog: &Catalog,
) -> DesignResult<IntVar> {
    let powers = catalog.attribute_table(Component::power);
    let efficiencies = catalog.attribute_table(|c| scaled(c.efficiency(), SCALE));
    let is_part = catalog.attribute_table(|c| c.is_powered() as i64);

    let raw = attribute_sum(model, parts, &powers, "raw_power");
    let efficiency = attribute_sum(model, parts, &efficiencies, "total_efficiency");
    let count = attribute_sum(model, parts, &is_part, "part_count");
    model.add_linear(count, Cmp::Ge, 1i64);

    let mean = model.new_int_var(1, i32::MAX as i64, "mean_efficiency");
    model.add_quotient(mean, efficiency, count);
    let raw_scaled = model.new_var(Domain::LARGE.nonnegative(), "raw_power_scaled");
    model.add_equality(raw_scaled, LinearExpr::from(raw) * SCALE);
    let power = model.new_var(Domain::LARGE.nonnegative(), "power_requirement");
    model.add_quotient(power, raw_scaled, mean);
    Ok(power)
}
