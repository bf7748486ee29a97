//! Linear accelerator metrics
//!
//! A linear accelerator is an `(L+2) x 5 x 5` grid with the beam along the
//! first axis at `(x, 2, 2)`. Every cross-section holds at most one kind of
//! part, so the cell `(x, 1, 2)` above the beam stands for the whole
//! section.

use super::{attribute_sum, scaled, FocusParams};
use crate::catalog::Catalog;
use crate::component::Component;
use crate::error::DesignError;
use crate::fixed_point::{scaled_multiply, SCALE};
use crate::grid::Grid;
use crate::solver::{Domain, IntVar, LinearExpr, Model};
use crate::DesignResult;

const REQUIREMENT: &str = "a three-axis grid of shape (n, 5, 5) with n >= 3";

pub(crate) fn check_linear(shape: &[usize], what: &'static str) -> DesignResult<()> {
    match shape {
        [n, 5, 5] if *n >= 3 => Ok(()),
        _ => Err(DesignError::shape_assumption(what, REQUIREMENT, shape)),
    }
}

/// Representative part cell of every cross-section
pub(crate) fn part_cells(length: usize) -> Vec<[usize; 3]> {
    (0..length).map(|x| [x, 1, 2]).collect()
}

/// Beam line cells
pub(crate) fn beam_cells(length: usize) -> Vec<[usize; 3]> {
    (0..length).map(|x| [x, 2, 2]).collect()
}

fn gather<'a, T>(grid: &'a Grid<T>, coords: &[[usize; 3]]) -> DesignResult<Vec<&'a T>> {
    coords.iter().map(|c| grid.get(c)).collect()
}

pub(super) fn parts(grid: &Grid<Component>) -> DesignResult<Vec<&Component>> {
    check_linear(grid.shape(), "linear accelerator metric")?;
    gather(grid, &part_cells(grid.shape()[0]))
}

pub(super) fn part_vars(cells: &Grid<IntVar>) -> DesignResult<Vec<IntVar>> {
    check_linear(cells.shape(), "linear accelerator metric")?;
    Ok(gather(cells, &part_cells(cells.shape()[0]))?
        .into_iter()
        .copied()
        .collect())
}

fn beam_vars(cells: &Grid<IntVar>) -> DesignResult<Vec<IntVar>> {
    Ok(gather(cells, &beam_cells(cells.shape()[0]))?
        .into_iter()
        .copied()
        .collect())
}

pub(super) fn heating_rate(grid: &Grid<Component>) -> DesignResult<f64> {
    Ok(parts(grid)?.iter().map(|c| c.heat() as f64).sum())
}

pub(super) fn voltage(grid: &Grid<Component>) -> DesignResult<f64> {
    Ok(parts(grid)?.iter().map(|c| c.voltage() as f64).sum())
}

pub(super) fn beam_focus(grid: &Grid<Component>, params: &FocusParams) -> DesignResult<f64> {
    params.validate()?;
    let gain: f64 = parts(grid)?
        .iter()
        .map(|c| c.strength() * params.charge.abs())
        .sum();
    let loss: f64 = gather(grid, &beam_cells(grid.shape()[0]))?
        .iter()
        .map(|c| c.attenuation() * params.loss_factor())
        .sum();
    Ok(params.initial_focus + gain - loss)
}

pub(super) fn compile_heating_rate(
    model: &mut Model,
    cells: &Grid<IntVar>,
    catalog: &Catalog,
) -> DesignResult<IntVar> {
    let parts = part_vars(cells)?;
    let table = catalog.attribute_table(Component::heat);
    Ok(attribute_sum(model, &parts, &table, "heating_rate"))
}

pub(super) fn compile_voltage(
    model: &mut Model,
    cells: &Grid<IntVar>,
    catalog: &Catalog,
) -> DesignResult<IntVar> {
    let parts = part_vars(cells)?;
    let table = catalog.attribute_table(Component::voltage);
    Ok(attribute_sum(model, &parts, &table, "voltage"))
}

pub(super) fn compile_beam_focus(
    model: &mut Model,
    cells: &Grid<IntVar>,
    catalog: &Catalog,
    params: &FocusParams,
) -> DesignResult<IntVar> {
    params.validate()?;
    let parts = part_vars(cells)?;
    let beam = beam_vars(cells)?;

    let strengths = catalog.attribute_table(|c| scaled(c.strength(), SCALE));
    let attenuations = catalog.attribute_table(|c| scaled(c.attenuation(), SCALE));
    let strength = attribute_sum(model, &parts, &strengths, "magnet_strength");
    let attenuation = attribute_sum(model, &beam, &attenuations, "beam_attenuation");

    let charge = model.new_constant(scaled(params.charge.abs(), SCALE));
    let loss_factor = model.new_constant(scaled(params.loss_factor(), SCALE));
    let gain = model.new_var(Domain::LARGE, "focus_gain");
    scaled_multiply(model, gain, strength, charge, SCALE, Domain::LARGE);
    let loss = model.new_var(Domain::LARGE, "focus_loss");
    scaled_multiply(model, loss, attenuation, loss_factor, SCALE, Domain::LARGE);

    let focus = model.new_var(Domain::INT32, "beam_focus");
    model.add_equality(
        focus,
        LinearExpr::from(gain) - loss + scaled(params.initial_focus, SCALE),
    );
    Ok(focus)
}
