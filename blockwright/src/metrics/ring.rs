//! Synchrotron metrics
//!
//! A synchrotron is an `n x n x 5` grid whose beam runs around a square
//! ring at height 2. Along each side one cell per cross-section stands for
//! the part placed there; the cell one step further out tells a dipole
//! (yoke outside the magnet) from a quadrupole.

use super::{attribute_sum, gated_attribute_sum, scaled, FocusParams, Particle};
use crate::catalog::Catalog;
use crate::component::{Component, DEFAULT_ATTENUATION};
use crate::error::DesignError;
use crate::fixed_point::{scaled_multiply, scaled_sqrt, SCALE, SQRT_ITERATIONS};
use crate::grid::Grid;
use crate::solver::{Domain, IntVar, LinearExpr, Lit, Model};
use crate::DesignResult;

const REQUIREMENT: &str = "a three-axis grid of shape (n, n, 5) with n >= 9";

/// Upper bound of the energy metrics
const ENERGY_DOMAIN: Domain = Domain::new(0, (1 << 48) - 1);

/// Dipole strengths are carried with one decimal digit
const STRENGTH_SCALE: i64 = 10;

pub(crate) fn check_ring(shape: &[usize], what: &'static str) -> DesignResult<()> {
    match shape {
        [n, m, 5] if n == m && *n >= 9 => Ok(()),
        _ => Err(DesignError::shape_assumption(what, REQUIREMENT, shape)),
    }
}

/// A representative ring cell and its outward neighbor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RingSlot {
    pub cell: [usize; 3],
    pub outer: [usize; 3],
}

/// Representative cells of every ring cross-section, corners counted once
pub(crate) fn ring_slots(n: usize) -> Vec<RingSlot> {
    let mut slots = Vec::new();
    for z in 2..n - 2 {
        slots.push(RingSlot {
            cell: [2, z, 3],
            outer: [1, z, 3],
        });
    }
    for z in 2..n - 2 {
        slots.push(RingSlot {
            cell: [n - 3, z, 3],
            outer: [n - 2, z, 3],
        });
    }
    for x in 4..n - 4 {
        slots.push(RingSlot {
            cell: [x, 2, 3],
            outer: [x, 1, 3],
        });
    }
    for x in 4..n - 4 {
        slots.push(RingSlot {
            cell: [x, n - 3, 3],
            outer: [x, n - 2, 3],
        });
    }
    slots
}

/// Number of beam sections a synchrotron of side `n` adds attenuation for
pub(crate) fn beam_sections(n: usize) -> i64 {
    (n as i64 - 4) * 4 - 4
}

fn slots_of(shape: &[usize]) -> DesignResult<Vec<RingSlot>> {
    check_ring(shape, "synchrotron metric")?;
    Ok(ring_slots(shape[0]))
}

pub(super) fn parts(grid: &Grid<Component>) -> DesignResult<Vec<&Component>> {
    slots_of(grid.shape())?
        .iter()
        .map(|s| grid.get(&s.cell))
        .collect()
}

pub(super) fn part_vars(cells: &Grid<IntVar>) -> DesignResult<Vec<IntVar>> {
    slots_of(cells.shape())?
        .iter()
        .map(|s| cells.get(&s.cell).copied())
        .collect()
}

/// Strength of the magnets whose outer cell is (or is not) a yoke
fn magnet_strength(grid: &Grid<Component>, dipole: bool) -> DesignResult<f64> {
    let mut total = 0.0;
    for slot in slots_of(grid.shape())? {
        let cell = grid.get(&slot.cell)?;
        let outer = grid.get(&slot.outer)?;
        if outer.is_type("yoke") == dipole {
            total += cell.strength();
        }
    }
    Ok(total)
}

fn compile_magnet_strength(
    model: &mut Model,
    cells: &Grid<IntVar>,
    catalog: &Catalog,
    dipole: bool,
    scale: i64,
) -> DesignResult<IntVar> {
    let yokes = catalog.ids_of_type("yoke");
    let strengths = catalog.attribute_table(|c| scaled(c.strength(), scale));
    let mut gated = Vec::new();
    for slot in slots_of(cells.shape())? {
        let cell = *cells.get(&slot.cell)?;
        let outer = *cells.get(&slot.outer)?;
        let is_dipole: Lit = model.reify_in(outer, &yokes, "outer_is_yoke").lit();
        gated.push((cell, if dipole { is_dipole } else { !is_dipole }));
    }
    let name = if dipole {
        "dipole_strength"
    } else {
        "quadrupole_strength"
    };
    Ok(gated_attribute_sum(model, &gated, &strengths, name))
}

pub(super) fn heating_rate(grid: &Grid<Component>) -> DesignResult<f64> {
    Ok(parts(grid)?.iter().map(|c| c.heat() as f64).sum())
}

pub(super) fn voltage(grid: &Grid<Component>) -> DesignResult<f64> {
    Ok(parts(grid)?.iter().map(|c| c.voltage() as f64).sum())
}

pub(super) fn max_dipole_energy(grid: &Grid<Component>, particle: &Particle) -> DesignResult<f64> {
    particle.validate()?;
    let strength = magnet_strength(grid, true)?;
    Ok((particle.charge * particle.radius * strength).powi(2) / (2.0 * particle.mass) * 1000.0)
}

pub(super) fn max_radiation_loss(grid: &Grid<Component>, particle: &Particle) -> DesignResult<f64> {
    particle.validate()?;
    let voltage = voltage(grid)?;
    Ok(particle.mass
        * (3.0 * voltage * particle.radius / particle.charge.abs()).powf(0.25)
        * 1000.0)
}

pub(super) fn beam_focus(grid: &Grid<Component>, params: &FocusParams) -> DesignResult<f64> {
    params.validate()?;
    let strength = magnet_strength(grid, false)?;
    let loss = beam_sections(grid.shape()[0]) as f64 * DEFAULT_ATTENUATION * params.loss_factor();
    Ok(params.initial_focus + params.charge.abs() * strength - loss)
}

pub(super) fn compile_heating_rate(
    model: &mut Model,
    cells: &Grid<IntVar>,
    catalog: &Catalog,
) -> DesignResult<IntVar> {
    let parts = part_vars(cells)?;
    let table = catalog.attribute_table(Component::heat);
    Ok(attribute_sum(model, &parts, &table, "ring_heating_rate"))
}

pub(super) fn compile_voltage(
    model: &mut Model,
    cells: &Grid<IntVar>,
    catalog: &Catalog,
) -> DesignResult<IntVar> {
    let parts = part_vars(cells)?;
    let table = catalog.attribute_table(Component::voltage);
    Ok(attribute_sum(model, &parts, &table, "ring_voltage"))
}

pub(super) fn compile_max_dipole_energy(
    model: &mut Model,
    cells: &Grid<IntVar>,
    catalog: &Catalog,
    particle: &Particle,
) -> DesignResult<IntVar> {
    particle.validate()?;
    let strength = compile_magnet_strength(model, cells, catalog, true, STRENGTH_SCALE)?;
    let squared = model.new_var(Domain::LARGE.nonnegative(), "dipole_strength_squared");
    scaled_multiply(model, squared, strength, strength, STRENGTH_SCALE, Domain::LARGE);

    let factor = (particle.charge * particle.radius).powi(2) / (2.0 * particle.mass);
    let factor = model.new_constant(scaled(factor, SCALE));
    let energy = model.new_var(ENERGY_DOMAIN, "max_dipole_energy");
    scaled_multiply(model, energy, squared, factor, STRENGTH_SCALE, Domain::LARGE);
    Ok(energy)
}

pub(super) fn compile_max_radiation_loss(
    model: &mut Model,
    cells: &Grid<IntVar>,
    catalog: &Catalog,
    particle: &Particle,
) -> DesignResult<IntVar> {
    particle.validate()?;
    let voltage = compile_voltage(model, cells, catalog)?;

    // fourth root as the scaled square root of an integer square root
    let root = model.new_var(Domain::INT32.nonnegative(), "voltage_sqrt");
    scaled_sqrt(model, root, voltage, 1, SQRT_ITERATIONS, Domain::INT32);
    let root_scaled = model.new_var(Domain::LARGE.nonnegative(), "voltage_sqrt_scaled");
    model.add_equality(root_scaled, LinearExpr::from(root) * SCALE);
    let fourth = model.new_var(Domain::INT32.nonnegative(), "voltage_fourth_root");
    scaled_sqrt(model, fourth, root_scaled, SCALE, SQRT_ITERATIONS, Domain::INT32);

    let factor = particle.mass * (3.0 * particle.radius / particle.charge.abs()).powf(0.25);
    let factor = model.new_constant(scaled(factor, SCALE));
    let loss = model.new_var(ENERGY_DOMAIN, "max_radiation_loss");
    scaled_multiply(model, loss, fourth, factor, SCALE, Domain::LARGE);
    Ok(loss)
}

pub(super) fn compile_beam_focus(
    model: &mut Model,
    cells: &Grid<IntVar>,
    catalog: &Catalog,
    params: &FocusParams,
) -> DesignResult<IntVar> {
    params.validate()?;
    let strength = compile_magnet_strength(model, cells, catalog, false, SCALE)?;
    let charge = model.new_constant(scaled(params.charge.abs(), SCALE));
    let gain = model.new_var(Domain::LARGE, "focus_gain");
    scaled_multiply(model, gain, strength, charge, SCALE, Domain::LARGE);

    let loss = beam_sections(cells.shape()[0])
        * scaled(DEFAULT_ATTENUATION * params.loss_factor(), SCALE);
    let focus = model.new_var(Domain::INT32, "ring_beam_focus");
    model.add_equality(
        focus,
        LinearExpr::from(gain) - loss + scaled(params.initial_focus, SCALE),
    );
    Ok(focus)
}
