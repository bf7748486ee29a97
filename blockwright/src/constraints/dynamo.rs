use super::restrict;
use crate::catalog::Catalog;
use crate::component::Component;
use crate::error::DesignError;
use crate::grid::Grid;
use crate::solver::{IntVar, Model};
use crate::DesignResult;

const REQUIREMENT: &str = "a square two-axis grid whose side exceeds the shaft by an even margin of at least 2";

/// Half-open range of the shaft along either axis
fn shaft(shape: &[usize], shaft_width: usize) -> DesignResult<std::ops::Range<usize>> {
    match shape {
        [n, m] if n == m && shaft_width >= 1 && shaft_width + 2 <= *n && (n - shaft_width) % 2 == 0 => {
            let start = (n - shaft_width) / 2;
            Ok(start..start + shaft_width)
        }
        _ => Err(DesignError::shape_assumption(
            "centered bearing constraint",
            REQUIREMENT,
            shape,
        )),
    }
}

pub(super) fn centered_bearing_holds(grid: &Grid<Component>, shaft_width: usize) -> DesignResult<bool> {
    let shaft = shaft(grid.shape(), shaft_width)?;
    for coord in grid.coords() {
        let inside = shaft.contains(&coord[0]) && shaft.contains(&coord[1]);
        if grid.get(&coord)?.is_type("bearing") != inside {
            return Ok(false);
        }
    }
    Ok(true)
}

pub(super) fn apply_centered_bearing(
    model: &mut Model,
    cells: &Grid<IntVar>,
    catalog: &Catalog,
    shaft_width: usize,
) -> DesignResult<()> {
    let shaft = shaft(cells.shape(), shaft_width)?;
    let bearings = catalog.require_type("bearing")?;
    for coord in cells.coords() {
        let inside = shaft.contains(&coord[0]) && shaft.contains(&coord[1]);
        restrict(model, *cells.get(&coord)?, &bearings, inside);
    }
    Ok(())
}
