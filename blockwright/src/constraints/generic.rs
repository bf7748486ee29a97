use super::restrict;
use crate::catalog::Catalog;
use crate::component::Component;
use crate::error::DesignError;
use crate::grid::Grid;
use crate::rules::{parse_rule, Neighbor, NeighborVar, PlacementRule};
use crate::solver::{BoolVar, Cmp, IntVar, LinearExpr, Model};
use crate::DesignResult;
use std::collections::hash_map::Entry;
use std::collections::HashMap;

pub(super) fn boundary_holds(grid: &Grid<Component>, shell_type: &str) -> DesignResult<bool> {
    for coord in grid.coords() {
        let on_shell = grid.is_shell(&coord);
        if grid.get(&coord)?.is_type(shell_type) != on_shell {
            return Ok(false);
        }
    }
    Ok(true)
}

pub(super) fn apply_boundary(
    model: &mut Model,
    cells: &Grid<IntVar>,
    catalog: &Catalog,
    shell_type: &str,
) -> DesignResult<()> {
    let ids = catalog.require_type(shell_type)?;
    for coord in cells.coords() {
        let cell = *cells.get(&coord)?;
        restrict(model, cell, &ids, cells.is_shell(&coord));
    }
    Ok(())
}

fn check_axis(shape: &[usize], axis: usize) -> DesignResult<()> {
    if axis >= shape.len() {
        return Err(DesignError::bad_axis(axis, shape));
    }
    Ok(())
}

/// Coordinate pairs mirrored across the middle of `axis`, lower half first
fn mirrored_pairs<T>(grid: &Grid<T>, axis: usize) -> Vec<(Vec<usize>, Vec<usize>)> {
    let dim = grid.shape()[axis];
    grid.coords()
        .filter(|c| c[axis] < dim - 1 - c[axis])
        .map(|c| {
            let mut mirror = c.clone();
            mirror[axis] = dim - 1 - c[axis];
            (c, mirror)
        })
        .collect()
}

pub(super) fn symmetry_holds(grid: &Grid<Component>, axis: usize) -> DesignResult<bool> {
    check_axis(grid.shape(), axis)?;
    for (coord, mirror) in mirrored_pairs(grid, axis) {
        if grid.get(&coord)? != grid.get(&mirror)? {
            return Ok(false);
        }
    }
    Ok(true)
}

pub(super) fn apply_symmetry(model: &mut Model, cells: &Grid<IntVar>, axis: usize) -> DesignResult<()> {
    check_axis(cells.shape(), axis)?;
    for (coord, mirror) in mirrored_pairs(cells, axis) {
        let a = *cells.get(&coord)?;
        let b = *cells.get(&mirror)?;
        model.add_equality(a, b);
    }
    Ok(())
}

pub(super) fn quantity_holds(
    grid: &Grid<Component>,
    component: &str,
    min: usize,
    max: Option<usize>,
) -> bool {
    let count = grid.iter().filter(|c| c.full_name() == component).count();
    count >= min && max.map_or(true, |max| count <= max)
}

pub(super) fn apply_quantity(
    model: &mut Model,
    cells: &Grid<IntVar>,
    catalog: &Catalog,
    component: &str,
    min: usize,
    max: Option<usize>,
) -> DesignResult<()> {
    let id = catalog.find(component)? as i64;
    let present: Vec<BoolVar> = cells
        .iter()
        .map(|&cell| model.reify_in(cell, &[id], "holds_component"))
        .collect();
    let count = LinearExpr::sum(present);
    model.add_linear(count.clone(), Cmp::Ge, min as i64);
    if let Some(max) = max {
        model.add_linear(count, Cmp::Le, max as i64);
    }
    Ok(())
}

pub(super) fn own_rule_holds(grid: &Grid<Component>) -> DesignResult<bool> {
    let mut parsed: HashMap<&str, PlacementRule> = HashMap::new();
    for coord in grid.coords() {
        let Some(neighborhood) = grid.full_neighborhood(&coord)? else {
            continue;
        };
        let component = grid.get(&coord)?;
        let text = component.placement_rule.as_str();
        let rule = match parsed.entry(text) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(parse_rule(text)?),
        };
        let neighbors: Vec<Neighbor> = neighborhood.into_iter().map(Neighbor::new).collect();
        if !rule.is_satisfied(&neighbors)? {
            return Ok(false);
        }
    }
    Ok(true)
}

pub(super) fn apply_own_rule(
    model: &mut Model,
    cells: &Grid<IntVar>,
    catalog: &Catalog,
) -> DesignResult<()> {
    let rules = catalog.parse_rules()?;
    let always = model.true_lit();
    for coord in cells.coords() {
        let Some(neighborhood) = cells.full_neighborhood(&coord)? else {
            continue;
        };
        let neighbors: Vec<NeighborVar> = neighborhood
            .into_iter()
            .map(|&cell| NeighborVar::new(cell, always))
            .collect();
        let cell = *cells.get(&coord)?;

        // components sharing a rule share its compiled literal
        let mut compiled: HashMap<&str, BoolVar> = HashMap::new();
        for (id, (component, rule)) in catalog.iter().zip(&rules).enumerate() {
            if rule.is_empty() {
                continue;
            }
            let holds = match compiled.get(component.placement_rule.as_str()) {
                Some(&holds) => holds,
                None => {
                    let holds = rule.compile(model, &neighbors, catalog)?;
                    compiled.insert(component.placement_rule.as_str(), holds);
                    holds
                }
            };
            let placed = model.reify_in(cell, &[id as i64], "placed_here");
            model.add_implication(placed, holds);
        }
    }
    Ok(())
}
