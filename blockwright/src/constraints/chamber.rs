//! Nucleosynthesis chamber geometry
//!
//! The chamber is a fixed `5 x 11 x 7` grid. A beam pipe runs up both ends
//! and across the top, plasma glass encloses the air channel at height 2
//! and the two nozzles close that channel.

use super::restrict;
use crate::catalog::Catalog;
use crate::component::Component;
use crate::error::DesignError;
use crate::grid::Grid;
use crate::solver::{IntVar, Model};
use crate::DesignResult;

pub(crate) const CHAMBER_SHAPE: [usize; 3] = [5, 11, 7];

const REQUIREMENT: &str = "a three-axis grid of shape (5, 11, 7)";

/// Cell types the chamber pins in place
const PINNED: [&str; 3] = ["beam", "glass", "nozzle"];

fn check_chamber(shape: &[usize]) -> DesignResult<()> {
    if shape != CHAMBER_SHAPE {
        return Err(DesignError::shape_assumption(
            "nucleosynthesis structure constraint",
            REQUIREMENT,
            shape,
        ));
    }
    Ok(())
}

fn beam_cells() -> Vec<[usize; 3]> {
    let mut cells = Vec::new();
    for y in 2..5 {
        cells.push([2, 1, y]);
        cells.push([2, 9, y]);
    }
    cells.extend((1..10).map(|z| [2, z, 5]));
    cells
}

fn glass_cells() -> Vec<[usize; 3]> {
    let mut cells = Vec::new();
    for (x, y) in [(2, 1), (1, 2), (3, 2), (2, 3)] {
        cells.extend((3..8).map(|z| [x, z, y]));
    }
    cells
}

fn nozzle_cells() -> Vec<[usize; 3]> {
    vec![[2, 2, 2], [2, 8, 2]]
}

fn air_cells() -> Vec<[usize; 3]> {
    (3..8).map(|z| [2, z, 2]).collect()
}

fn positions(type_name: &str) -> Vec<[usize; 3]> {
    match type_name {
        "beam" => beam_cells(),
        "glass" => glass_cells(),
        "nozzle" => nozzle_cells(),
        _ => Vec::new(),
    }
}

fn at(cells: &[[usize; 3]], coord: &[usize]) -> bool {
    cells.iter().any(|c| c[..] == *coord)
}

pub(super) fn structure_holds(grid: &Grid<Component>) -> DesignResult<bool> {
    check_chamber(grid.shape())?;
    for type_name in PINNED {
        let expected = positions(type_name);
        for coord in grid.coords() {
            if grid.get(&coord)?.is_type(type_name) != at(&expected, &coord) {
                return Ok(false);
            }
        }
    }
    for coord in air_cells() {
        if !grid.get(&coord)?.is_type("air") {
            return Ok(false);
        }
    }
    Ok(true)
}

pub(super) fn apply_structure(
    model: &mut Model,
    cells: &Grid<IntVar>,
    catalog: &Catalog,
) -> DesignResult<()> {
    check_chamber(cells.shape())?;
    for type_name in PINNED {
        let ids = catalog.require_type(type_name)?;
        let expected = positions(type_name);
        for coord in cells.coords() {
            restrict(model, *cells.get(&coord)?, &ids, at(&expected, &coord));
        }
    }
    let air = catalog.require_type("air")?;
    for coord in air_cells() {
        restrict(model, *cells.get(&coord)?, &air, true);
    }
    Ok(())
}
