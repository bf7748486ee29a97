use super::{attribute_sum, scaled};
use crate::catalog::Catalog;
use crate::component::Component;
use crate::fixed_point::SCALE;
use crate::grid::Grid;
use crate::solver::{Cmp, Domain, IntVar, LinearExpr, Model};

pub(super) fn conductivity(grid: &Grid<Component>) -> f64 {
    let coils = grid.iter().filter(|c| c.is_type("coil")).count();
    if coils == 0 {
        return 0.0;
    }
    let bearings = grid.iter().filter(|c| c.is_type("bearing")).count();
    let total: f64 = grid.iter().map(Component::conductivity).sum();
    total / (bearings as f64 / 2.0).max(coils as f64)
}

/// Conductivity at [`SCALE`]; the reducing count is scaled alongside
pub(super) fn compile_conductivity(
    model: &mut Model,
    cells: &Grid<IntVar>,
    catalog: &Catalog,
) -> IntVar {
    let conductivities = catalog.attribute_table(|c| scaled(c.conductivity(), SCALE));
    let is_coil = catalog.attribute_table(|c| c.is_type("coil") as i64);
    let is_bearing = catalog.attribute_table(|c| c.is_type("bearing") as i64);

    let total = attribute_sum(model, cells.cells(), &conductivities, "total_conductivity");
    let coils = attribute_sum(model, cells.cells(), &is_coil, "coil_count");
    let bearings = attribute_sum(model, cells.cells(), &is_bearing, "bearing_count");

    let per_coil = LinearExpr::from(coils) * SCALE;
    let per_bearing_pair = LinearExpr::from(bearings) * (SCALE / 2);
    let coils_dominate = model.reify(
        per_coil.clone(),
        Cmp::Ge,
        per_bearing_pair.clone(),
        "coils_dominate",
    );
    let cell_count = cells.len() as i64;
    let reducing = model.new_int_var(0, cell_count * SCALE, "reducing_count");
    model
        .add_equality(reducing, per_coil)
        .only_enforce_if([coils_dominate]);
    model
        .add_equality(reducing, per_bearing_pair)
        .only_enforce_if([!coils_dominate]);

    let has_coils = model.reify(coils, Cmp::Ge, 1i64, "has_coils");
    let denominator = model.new_int_var(1, (cell_count * SCALE).max(1), "conductivity_denominator");
    model
        .add_equality(denominator, reducing)
        .only_enforce_if([has_coils]);
    model
        .add_equality(denominator, 1i64)
        .only_enforce_if([!has_coils]);

    let numerator = model.new_var(Domain::LARGE.nonnegative(), "conductivity_numerator");
    model.add_equality(numerator, LinearExpr::from(total) * SCALE);
    let conductivity = model.new_var(Domain::INT32.nonnegative(), "dynamo_conductivity");
    model.add_quotient(conductivity, numerator, denominator);
    conductivity
}
