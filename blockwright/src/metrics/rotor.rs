//! Turbine rotor metrics
//!
//! A rotor is a one-axis grid of blades and stators. Steam expands as it
//! passes each part; a blade converts best when the expansion reached at
//! its position matches the ideal curve `optimal^((i + 0.5) / len)`.

use super::{attribute_sum, scaled};
use crate::catalog::Catalog;
use crate::component::Component;
use crate::error::DesignError;
use crate::fixed_point::{scaled_divide_nonneg, scaled_multiply, SCALE};
use crate::grid::Grid;
use crate::solver::{Cmp, Domain, IntVar, LinearExpr, Model};
use crate::DesignResult;

const REQUIREMENT: &str = "a one-axis grid with at least one cell";

pub(crate) fn check_rotor(shape: &[usize], what: &'static str) -> DesignResult<()> {
    match shape {
        [n] if *n >= 1 => Ok(()),
        _ => Err(DesignError::shape_assumption(what, REQUIREMENT, shape)),
    }
}

fn check_optimal(optimal_expansion: f64) -> DesignResult<()> {
    if optimal_expansion <= 0.0 {
        return Err(DesignError::undefined(format!(
            "rotor efficiency for an optimal expansion of {}",
            optimal_expansion
        )));
    }
    Ok(())
}

/// Ideal expansion at position `i` of a rotor of `len` parts
fn ideal_expansion(optimal_expansion: f64, i: usize, len: usize) -> f64 {
    optimal_expansion.powf((i as f64 + 0.5) / len as f64)
}

/// Expansion reached in the middle of every part
pub fn expansion_levels(grid: &Grid<Component>) -> DesignResult<Vec<f64>> {
    check_rotor(grid.shape(), "turbine rotor metric")?;
    let mut total = 1.0;
    Ok(grid
        .iter()
        .map(|part| {
            let level = total * part.expansion().sqrt();
            total *= part.expansion();
            level
        })
        .collect())
}

pub(super) fn efficiency(grid: &Grid<Component>, optimal_expansion: f64) -> DesignResult<f64> {
    check_optimal(optimal_expansion)?;
    let levels = expansion_levels(grid)?;
    let len = levels.len();
    let mut total = 0.0;
    let mut blades = 0;
    for (i, (part, level)) in grid.iter().zip(levels).enumerate() {
        if !part.is_type("blade") {
            continue;
        }
        let ideal = ideal_expansion(optimal_expansion, i, len);
        total += part.efficiency() * (ideal / level).min(level / ideal);
        blades += 1;
    }
    if blades == 0 {
        return Err(DesignError::undefined("efficiency of a rotor without blades"));
    }
    Ok(total / blades as f64)
}

/// Scaled expansion levels, one variable per cell
fn compile_expansion_levels(
    model: &mut Model,
    cells: &Grid<IntVar>,
    catalog: &Catalog,
) -> DesignResult<Vec<IntVar>> {
    check_rotor(cells.shape(), "turbine rotor metric")?;
    let expansions = catalog.attribute_table(|c| scaled(c.expansion(), SCALE));
    let roots = catalog.attribute_table(|c| scaled(c.expansion().sqrt(), SCALE));

    let mut total = model.new_constant(SCALE);
    let mut levels = Vec::with_capacity(cells.len());
    for (i, &cell) in cells.iter().enumerate() {
        let expansion = model.new_var(Domain::NONNEGATIVE, format!("expansion_{}", i));
        model.add_element(expansion, cell, expansions.clone());
        let root = model.new_var(Domain::NONNEGATIVE, format!("expansion_root_{}", i));
        model.add_element(root, cell, roots.clone());

        let level = model.new_var(Domain::LARGE.nonnegative(), format!("expansion_level_{}", i));
        scaled_multiply(model, level, total, root, SCALE, Domain::LARGE);
        let next = model.new_var(Domain::LARGE.nonnegative(), format!("total_expansion_{}", i));
        scaled_multiply(model, next, total, expansion, SCALE, Domain::LARGE);
        levels.push(level);
        total = next;
    }
    Ok(levels)
}

pub(super) fn compile_efficiency(
    model: &mut Model,
    cells: &Grid<IntVar>,
    catalog: &Catalog,
    optimal_expansion: f64,
) -> DesignResult<IntVar> {
    check_optimal(optimal_expansion)?;
    let levels = compile_expansion_levels(model, cells, catalog)?;
    let efficiencies = catalog.attribute_table(|c| {
        if c.is_type("blade") {
            scaled(c.efficiency(), SCALE)
        } else {
            0
        }
    });
    let is_blade = catalog.attribute_table(|c| c.is_type("blade") as i64);

    let len = levels.len();
    let mut contributions = Vec::with_capacity(len);
    for (i, (&cell, &level)) in cells.iter().zip(&levels).enumerate() {
        let ideal = model.new_constant(scaled(ideal_expansion(optimal_expansion, i, len), SCALE));
        let below = model.new_var(Domain::LARGE.nonnegative(), "ideal_over_level");
        scaled_divide_nonneg(model, below, ideal, level, SCALE);
        let above = model.new_var(Domain::LARGE.nonnegative(), "level_over_ideal");
        scaled_divide_nonneg(model, above, level, ideal, SCALE);
        let match_factor = model.new_var(Domain::LARGE.nonnegative(), "expansion_match");
        model.add_min_equality(match_factor, below, above);

        let raw = model.new_var(Domain::NONNEGATIVE, "blade_efficiency");
        model.add_element(raw, cell, efficiencies.clone());
        let effective = model.new_var(Domain::LARGE.nonnegative(), "effective_efficiency");
        scaled_multiply(model, effective, raw, match_factor, SCALE, Domain::LARGE);
        contributions.push(effective);
    }

    let blades = attribute_sum(model, cells.cells(), &is_blade, "blade_count");
    model.add_linear(blades, Cmp::Ge, 1i64);
    let total = model.new_var(Domain::LARGE.nonnegative(), "total_blade_efficiency");
    model.add_equality(total, LinearExpr::sum(contributions));
    let mean = model.new_var(Domain::LARGE.nonnegative(), "rotor_efficiency");
    model.add_quotient(mean, total, blades);
    Ok(mean)
}
