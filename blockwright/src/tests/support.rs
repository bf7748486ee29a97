use crate::catalog::Catalog;
use crate::component::{Component, ComponentKind};
use crate::grid::Grid;
use crate::limits::SolverLimits;
use crate::solver::{Backend, IntVar, Model, SearchBackend, Solution};

pub(super) fn solve(model: &Model) -> Solution {
    SearchBackend::new()
        .solve(model, &SolverLimits::default())
        .unwrap()
}

/// Cell variables fixed to the catalog index of each component
pub(super) fn pinned(model: &mut Model, grid: &Grid<Component>, catalog: &Catalog) -> Grid<IntVar> {
    grid.map(|component| {
        let id = catalog
            .iter()
            .position(|c| c == component)
            .unwrap_or_else(|| panic!("{} is not in the catalog", component)) as i64;
        model.new_int_var(id, id, "pinned")
    })
}

pub(super) fn air() -> Component {
    Component::unnamed(ComponentKind::Air)
}

pub(super) fn casing() -> Component {
    Component::unnamed(ComponentKind::Casing)
}

pub(super) fn bearing() -> Component {
    Component::unnamed(ComponentKind::Bearing)
}

pub(super) fn coil(name: &str, conductivity: f64) -> Component {
    Component::new(name, ComponentKind::Coil { conductivity })
}

/// Air, casing, bearing and a coil that needs one bearing next to it
pub(super) fn toy_dynamo_catalog() -> Catalog {
    Catalog::new(vec![
        air(),
        casing(),
        bearing(),
        coil("plain", 1.0).with_rule("one bearing"),
    ])
    .unwrap()
}

pub(super) fn accelerator() -> Catalog {
    Catalog::accelerator().unwrap()
}

/// Component of `catalog` with this full name
pub(super) fn part(catalog: &Catalog, full_name: &str) -> Component {
    let index = catalog.find(full_name).unwrap();
    catalog.get(index).unwrap().clone()
}

pub(super) fn nucleosynthesis() -> Catalog {
    Catalog::nucleosynthesis().unwrap()
}

pub(super) fn turbine_rotor() -> Catalog {
    Catalog::turbine_rotor().unwrap()
}
