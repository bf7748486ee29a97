//! Linear accelerator geometry
//!
//! Cross-sections `x = 1..n-1` each hold either eight cavities around the
//! beam, four magnets on its faces, or neither. The ends are closed by the
//! boundary shell.

use super::{restrict, restrict_iff};
use crate::catalog::Catalog;
use crate::component::Component;
use crate::grid::Grid;
use crate::metrics::{check_linear, Metric};
use crate::solver::{BoolVar, Cmp, Domain, IntVar, Lit, Model};
use crate::DesignResult;

/// Cells around the beam within a cross-section
const RING: [(usize, usize); 8] = [
    (1, 1),
    (1, 2),
    (1, 3),
    (2, 1),
    (2, 3),
    (3, 1),
    (3, 2),
    (3, 3),
];

const FACES: [(usize, usize); 4] = [(1, 2), (2, 1), (2, 3), (3, 2)];

const CORNERS: [(usize, usize); 4] = [(1, 1), (1, 3), (3, 1), (3, 3)];

fn sections(shape: &[usize], what: &'static str) -> DesignResult<std::ops::Range<usize>> {
    check_linear(shape, what)?;
    Ok(1..shape[0] - 1)
}

fn vars_at(cells: &Grid<IntVar>, x: usize, at: &[(usize, usize)]) -> DesignResult<Vec<IntVar>> {
    at.iter().map(|&(y, z)| cells.get(&[x, y, z]).copied()).collect()
}

fn parts_at<'a>(
    grid: &'a Grid<Component>,
    x: usize,
    at: &[(usize, usize)],
) -> DesignResult<Vec<&'a Component>> {
    at.iter().map(|&(y, z)| grid.get(&[x, y, z])).collect()
}

/// Every part of `parts` is of type `type_name`, or none is; a full set is uniform
fn all_or_none(parts: &[&Component], type_name: &str) -> Option<bool> {
    let count = parts.iter().filter(|c| c.is_type(type_name)).count();
    if count == 0 {
        Some(false)
    } else if count == parts.len() && parts.iter().all(|c| *c == parts[0]) {
        Some(true)
    } else {
        None
    }
}

fn equal_under(model: &mut Model, vars: &[IntVar], lit: Lit) {
    for pair in vars.windows(2) {
        model.add_equality(pair[0], pair[1]).only_enforce_if([lit]);
    }
}

pub(super) fn beam_holds(grid: &Grid<Component>) -> DesignResult<bool> {
    for x in sections(grid.shape(), "linear beam constraint")? {
        for y in 0..5 {
            for z in 0..5 {
                if grid.get(&[x, y, z])?.is_type("beam") != (y == 2 && z == 2) {
                    return Ok(false);
                }
            }
        }
    }
    Ok(true)
}

pub(super) fn apply_beam(model: &mut Model, cells: &Grid<IntVar>, catalog: &Catalog) -> DesignResult<()> {
    let beams = catalog.require_type("beam")?;
    for x in sections(cells.shape(), "linear beam constraint")? {
        for y in 0..5 {
            for z in 0..5 {
                let cell = *cells.get(&[x, y, z])?;
                restrict(model, cell, &beams, y == 2 && z == 2);
            }
        }
    }
    Ok(())
}

pub(super) fn cavities_hold(grid: &Grid<Component>) -> DesignResult<bool> {
    let mut previous = false;
    for x in sections(grid.shape(), "linear cavity constraint")? {
        let Some(full) = all_or_none(&parts_at(grid, x, &RING)?, "cavity") else {
            return Ok(false);
        };
        if full && previous {
            return Ok(false);
        }
        previous = full;
    }
    Ok(true)
}

pub(super) fn apply_cavities(
    model: &mut Model,
    cells: &Grid<IntVar>,
    catalog: &Catalog,
) -> DesignResult<()> {
    let cavities = catalog.require_type("cavity")?;
    let mut previous: Option<BoolVar> = None;
    for x in sections(cells.shape(), "linear cavity constraint")? {
        let has_cavity = model.new_bool_var(format!("cavity_section_{}", x));
        let ring = vars_at(cells, x, &RING)?;
        for &cell in &ring {
            restrict_iff(model, cell, &cavities, has_cavity.lit());
        }
        equal_under(model, &ring, has_cavity.lit());
        if let Some(previous) = previous {
            model.add_bool_or([!previous, !has_cavity]);
        }
        previous = Some(has_cavity);
    }
    Ok(())
}

pub(super) fn magnets_hold(grid: &Grid<Component>) -> DesignResult<bool> {
    for x in sections(grid.shape(), "linear magnet constraint")? {
        if all_or_none(&parts_at(grid, x, &FACES)?, "magnet").is_none() {
            return Ok(false);
        }
        if parts_at(grid, x, &CORNERS)?.iter().any(|c| c.is_type("magnet")) {
            return Ok(false);
        }
    }
    Ok(true)
}

pub(super) fn apply_magnets(
    model: &mut Model,
    cells: &Grid<IntVar>,
    catalog: &Catalog,
) -> DesignResult<()> {
    let magnets = catalog.require_type("magnet")?;
    for x in sections(cells.shape(), "linear magnet constraint")? {
        let has_magnet = model.new_bool_var(format!("magnet_section_{}", x));
        let faces = vars_at(cells, x, &FACES)?;
        for &cell in &faces {
            restrict_iff(model, cell, &magnets, has_magnet.lit());
        }
        equal_under(model, &faces, has_magnet.lit());
        for cell in vars_at(cells, x, &CORNERS)? {
            restrict(model, cell, &magnets, false);
        }
    }
    Ok(())
}

/// `round(3 |q|)`, the energy gained per three volts
fn charge_thirds(charge: f64) -> i64 {
    (3.0 * charge.abs()).round() as i64
}

pub(super) fn energy_holds(grid: &Grid<Component>, min: i64, max: i64, charge: f64) -> DesignResult<bool> {
    let voltage = Metric::Voltage.evaluate(grid)? as i64;
    let energy = voltage * charge_thirds(charge) / 3;
    Ok(min <= energy && energy <= max)
}

pub(super) fn apply_energy(
    model: &mut Model,
    cells: &Grid<IntVar>,
    catalog: &Catalog,
    min: i64,
    max: i64,
    charge: f64,
) -> DesignResult<()> {
    let voltage = Metric::Voltage.compile(model, cells, catalog)?;
    let raw = model.new_var(Domain::LARGE, "raw_beam_energy");
    model.add_product(raw, voltage, charge_thirds(charge));
    let energy = model.new_var(Domain::INT32.nonnegative(), "beam_energy");
    model.add_quotient(energy, raw, 3i64);
    model.add_linear(energy, Cmp::Ge, min);
    model.add_linear(energy, Cmp::Le, max);
    Ok(())
}
