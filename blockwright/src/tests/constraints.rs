use super::support::{air, bearing, casing, pinned, solve, toy_dynamo_catalog};
use crate::catalog::Catalog;
use crate::component::Component;
use crate::constraints::Constraint;
use crate::designer::{DesignOutcome, Designer, GridDesigner, TurbineDynamoDesigner};
use crate::error::DesignError;
use crate::grid::Grid;
use crate::limits::SolverLimits;
use crate::metrics::Metric;
use crate::solver::{Model, SearchBackend, SolveStatus};

/// Two-axis grid over the toy dynamo catalog: `#` casing, `.` air, `B` bearing, `o` coil
fn sketch(rows: &[&str]) -> Grid<Component> {
    let catalog = toy_dynamo_catalog();
    let coil = catalog.get(3).unwrap().clone();
    let cells: Vec<Component> = rows
        .iter()
        .flat_map(|row| row.chars())
        .map(|c| match c {
            '#' => casing(),
            '.' => air(),
            'B' => bearing(),
            'o' => coil.clone(),
            other => panic!("unknown cell '{}'", other),
        })
        .collect();
    Grid::new(cells, vec![rows.len(), rows[0].len()]).unwrap()
}

/// Solve the compiled constraint on cell variables pinned to `grid`
fn compiled_holds(constraint: &Constraint, grid: &Grid<Component>, catalog: &Catalog) -> bool {
    let mut model = Model::new();
    let cells = pinned(&mut model, grid, catalog);
    constraint.apply(&mut model, &cells, catalog).unwrap();
    match solve(&model).status {
        SolveStatus::Optimal | SolveStatus::Feasible => true,
        SolveStatus::Infeasible => false,
        SolveStatus::Unknown => panic!("pinned model was not decided"),
    }
}

fn assert_agrees(constraint: &Constraint, grid: &Grid<Component>, expected: bool) {
    let catalog = toy_dynamo_catalog();
    assert_eq!(constraint.is_satisfied(grid).unwrap(), expected, "{:?} evaluated", constraint);
    assert_eq!(compiled_holds(constraint, grid, &catalog), expected, "{:?} compiled", constraint);
}

fn dynamo() -> Grid<Component> {
    sketch(&["#####", "#.o.#", "#oBo#", "#.o.#", "#####"])
}

#[test]
fn test_boundary() {
    let boundary = Constraint::boundary("casing");
    assert_agrees(&boundary, &sketch(&["###", "#.#", "###"]), true);
    assert_agrees(&boundary, &sketch(&["###", "###", "###"]), false);
    assert_agrees(&boundary, &sketch(&["###", "#..", "###"]), false);
}

#[test]
fn test_boundary_of_a_single_row() {
    let boundary = Constraint::boundary("casing");
    assert_agrees(&boundary, &sketch(&["###"]), true);
}

#[test]
fn test_symmetry() {
    let grid = sketch(&["#####", "#o..#", "#.B.#", "#o..#", "#####"]);
    assert_agrees(&Constraint::Symmetry { axis: 0 }, &grid, true);
    assert_agrees(&Constraint::Symmetry { axis: 1 }, &grid, false);
    assert_agrees(&Constraint::Symmetry { axis: 1 }, &dynamo(), true);
}

#[test]
fn test_symmetry_axis_out_of_range() {
    let result = Constraint::Symmetry { axis: 2 }.is_satisfied(&dynamo());
    assert!(matches!(result, Err(DesignError::OutOfBounds { .. })));
}

#[test]
fn test_quantity() {
    let grid = dynamo();
    assert_agrees(&Constraint::quantity("plain coil", 4, Some(4)), &grid, true);
    assert_agrees(&Constraint::quantity("plain coil", 5, None), &grid, false);
    assert_agrees(&Constraint::quantity("bearing", 0, Some(0)), &grid, false);
    assert_agrees(&Constraint::quantity("air", 0, None), &grid, true);
}

#[test]
fn test_quantity_of_unknown_component() {
    let catalog = toy_dynamo_catalog();
    let mut model = Model::new();
    let cells = pinned(&mut model, &dynamo(), &catalog);
    let result = Constraint::quantity("gold coil", 1, None).apply(&mut model, &cells, &catalog);
    assert_eq!(result, Err(DesignError::UnknownComponent("gold coil".to_string())));
}

#[test]
fn test_own_rule() {
    assert_agrees(&Constraint::OwnRule, &dynamo(), true);
    // a corner coil has no bearing next to it
    let stray = sketch(&["#####", "#oo.#", "#oBo#", "#.o.#", "#####"]);
    assert_agrees(&Constraint::OwnRule, &stray, false);
}

#[test]
fn test_own_rule_skips_shell_cells() {
    // the coil on the shell has no complete neighborhood
    let grid = sketch(&["##o##", "#...#", "#.B.#", "#...#", "#####"]);
    assert_agrees(&Constraint::OwnRule, &grid, true);
}

#[test]
fn test_centered_bearing() {
    let centered = Constraint::CenteredBearing { shaft_width: 1 };
    assert_agrees(&centered, &dynamo(), true);
    let off_center = sketch(&["#####", "#B..#", "#...#", "#...#", "#####"]);
    assert_agrees(&centered, &off_center, false);

    let wide = sketch(&["######", "#....#", "#.BB.#", "#.BB.#", "#....#", "######"]);
    assert_agrees(&Constraint::CenteredBearing { shaft_width: 2 }, &wide, true);
}

#[test]
fn test_centered_bearing_needs_even_margin() {
    let result = Constraint::CenteredBearing { shaft_width: 2 }.is_satisfied(&dynamo());
    assert!(matches!(
        result,
        Err(DesignError::ShapeAssumption {
            constraint: "centered bearing constraint",
            ..
        })
    ));
}

#[test]
fn test_geometry_constraints_reject_other_shapes() {
    let grid = dynamo();
    for constraint in [
        Constraint::LinearBeam,
        Constraint::LinearCavities,
        Constraint::RingCasing,
        Constraint::RingMagnets,
    ] {
        assert!(
            matches!(
                constraint.is_satisfied(&grid),
                Err(DesignError::ShapeAssumption { .. })
            ),
            "{:?}",
            constraint
        );
    }
}

#[test]
fn test_constraint_serialization() {
    let constraint = Constraint::quantity("plain coil", 1, Some(3));
    assert_eq!(
        serde_json::to_value(&constraint).unwrap(),
        serde_json::json!({
            "constraint": "quantity",
            "component": "plain coil",
            "min": 1,
            "max": 3
        })
    );
}

fn toy_designer() -> GridDesigner {
    GridDesigner::new(vec![5, 5], toy_dynamo_catalog())
        .with_constraint(Constraint::boundary("casing"))
        .with_constraint(Constraint::OwnRule)
        .with_constraint(Constraint::CenteredBearing { shaft_width: 1 })
}

#[test]
fn test_most_coils_around_the_shaft() {
    let designer = toy_designer().maximize(Metric::TypeCount {
        type_name: "coil".to_string(),
    });
    let outcome = designer
        .design(&SearchBackend::new(), &SolverLimits::default())
        .unwrap();
    let design = outcome.into_design().unwrap();
    assert_eq!(design.status, SolveStatus::Optimal);
    assert_eq!(design.objective, Some(4.0));
    assert_eq!(design.grid, dynamo());
}

#[test]
fn test_impossible_limits_are_proven_infeasible() {
    let designer = toy_designer().with_constraint(Constraint::quantity("bearing", 0, Some(0)));
    let outcome = designer
        .design(&SearchBackend::new(), &SolverLimits::default())
        .unwrap();
    assert_eq!(outcome, DesignOutcome::Infeasible { proven: true });
    assert!(!outcome.is_found());
}

#[test]
fn test_turbine_dynamo_designer() {
    let designer =
        TurbineDynamoDesigner::with_catalog(3, toy_dynamo_catalog()).with_symmetry(true, true);
    assert_eq!(designer.shape(), vec![5, 5]);
    let outcome = designer
        .design(&SearchBackend::new(), &SolverLimits::default())
        .unwrap();
    let design = outcome.design().unwrap();
    assert_eq!(design.objective, Some(1.0));
    for constraint in designer
        .structural_constraints()
        .iter()
        .chain(&designer.user_constraints())
    {
        assert!(constraint.is_satisfied(&design.grid).unwrap(), "{:?}", constraint);
    }
    let conductivity = Metric::DynamoConductivity.evaluate(&design.grid).unwrap();
    assert!((conductivity - 1.0).abs() < 1e-9);
}

#[test]
fn test_turbine_dynamo_designer_rejects_odd_margin() {
    let designer =
        TurbineDynamoDesigner::with_catalog(3, toy_dynamo_catalog()).with_shaft_width(2);
    let result = designer.design(&SearchBackend::new(), &SolverLimits::default());
    assert!(matches!(result, Err(DesignError::ShapeAssumption { .. })));
}

#[test]
fn test_design_outcome_json() {
    let outcome = DesignOutcome::Infeasible { proven: false };
    assert_eq!(
        serde_json::to_value(&outcome).unwrap(),
        serde_json::json!({ "outcome": "infeasible", "proven": false })
    );
}
