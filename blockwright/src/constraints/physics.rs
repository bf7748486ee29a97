use crate::catalog::Catalog;
use crate::component::Component;
use crate::fixed_point::SCALE;
use crate::grid::Grid;
use crate::metrics::{scaled, FocusParams, Layout, Metric};
use crate::solver::{Cmp, IntVar, LinearExpr, Model};
use crate::DesignResult;

pub(super) fn heat_neutral_holds(
    grid: &Grid<Component>,
    external_heating: i64,
    layout: Layout,
) -> DesignResult<bool> {
    let heating = layout.heating_rate().evaluate(grid)?;
    let cooling = Metric::CoolingRate.evaluate(grid)?;
    Ok(heating + external_heating as f64 <= cooling)
}

pub(super) fn apply_heat_neutral(
    model: &mut Model,
    cells: &Grid<IntVar>,
    catalog: &Catalog,
    external_heating: i64,
    layout: Layout,
) -> DesignResult<()> {
    let heating = layout.heating_rate().compile(model, cells, catalog)?;
    let cooling = Metric::CoolingRate.compile(model, cells, catalog)?;
    model.add_linear(LinearExpr::from(heating) + external_heating, Cmp::Le, cooling);
    Ok(())
}

pub(super) fn focus_holds(
    grid: &Grid<Component>,
    target: f64,
    params: &FocusParams,
    layout: Layout,
) -> DesignResult<bool> {
    Ok(layout.beam_focus(*params).evaluate(grid)? >= target)
}

pub(super) fn apply_focus(
    model: &mut Model,
    cells: &Grid<IntVar>,
    catalog: &Catalog,
    target: f64,
    params: &FocusParams,
    layout: Layout,
) -> DesignResult<()> {
    let focus = layout.beam_focus(*params).compile(model, cells, catalog)?;
    model.add_linear(focus, Cmp::Ge, scaled(target, SCALE));
    Ok(())
}

pub(super) fn cooling_holds(grid: &Grid<Component>, demand: i64) -> DesignResult<bool> {
    Ok(Metric::CoolingRate.evaluate(grid)? >= demand as f64)
}

pub(super) fn apply_cooling(
    model: &mut Model,
    cells: &Grid<IntVar>,
    catalog: &Catalog,
    demand: i64,
) -> DesignResult<()> {
    let cooling = Metric::CoolingRate.compile(model, cells, catalog)?;
    model.add_linear(cooling, Cmp::Ge, demand);
    Ok(())
}
