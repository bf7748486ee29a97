use super::support::{accelerator, pinned, part, solve};
use crate::catalog::Catalog;
use crate::component::Component;
use crate::constraints::Constraint;
use crate::designer::{Designer, LinearAcceleratorDesigner};
use crate::error::DesignError;
use crate::grid::Grid;
use crate::metrics::{FocusParams, Layout, Metric};
use crate::solver::{Model, SolveStatus};

#[derive(Clone, Copy)]
enum Section {
    Empty,
    Cavity(&'static str),
    Magnet(&'static str),
    /// Magnet section with this cooler in all four corners
    Cooled(&'static str, &'static str),
}

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

fn is_face(y: usize, z: usize) -> bool {
    matches!((y, z), (1, 2) | (2, 1) | (2, 3) | (3, 2))
}

/// A casing-enclosed linear accelerator with the beam on its axis
fn linac(sections: &[Section]) -> Grid<Component> {
    let catalog = accelerator();
    let n = sections.len() + 2;
    let casing = part(&catalog, "casing");
    let air = part(&catalog, "air");
    let beam = part(&catalog, "beam");
    Grid::from_fn(vec![n, 5, 5], |c| {
        let (x, y, z) = (c[0], c[1], c[2]);
        if x == 0 || x == n - 1 || y == 0 || y == 4 || z == 0 || z == 4 {
            return casing.clone();
        }
        if (y, z) == (2, 2) {
            return beam.clone();
        }
        match sections[x - 1] {
            Section::Empty => air.clone(),
            Section::Cavity(name) => part(&catalog, &format!("{} cavity", name)),
            Section::Magnet(name) if is_face(y, z) => part(&catalog, &format!("{} magnet", name)),
            Section::Cooled(name, _) if is_face(y, z) => {
                part(&catalog, &format!("{} magnet", name))
            }
            Section::Cooled(_, cooler) => part(&catalog, &format!("{} cooler", cooler)),
            Section::Magnet(_) => air.clone(),
        }
    })
    .unwrap()
}

fn standard() -> Grid<Component> {
    linac(&[
        Section::Cavity("copper"),
        Section::Magnet("copper"),
        Section::Cavity("copper"),
    ])
}

fn compiled_holds(constraint: &Constraint, grid: &Grid<Component>, catalog: &Catalog) -> bool {
    let mut model = Model::new();
    let cells = pinned(&mut model, grid, catalog);
    constraint.apply(&mut model, &cells, catalog).unwrap();
    solve(&model).status == SolveStatus::Optimal
}

fn assert_agrees(constraint: &Constraint, grid: &Grid<Component>, expected: bool) {
    let catalog = accelerator();
    assert_eq!(constraint.is_satisfied(grid).unwrap(), expected, "{:?} evaluated", constraint);
    assert_eq!(compiled_holds(constraint, grid, &catalog), expected, "{:?} compiled", constraint);
}

fn compiled_metric(metric: &Metric, grid: &Grid<Component>) -> i64 {
    let catalog = accelerator();
    let mut model = Model::new();
    let cells = pinned(&mut model, grid, &catalog);
    let var = metric.compile(&mut model, &cells, &catalog).unwrap();
    solve(&model).value(var).unwrap()
}

#[test]
fn test_standard_layout_holds() {
    let grid = standard();
    for constraint in [
        Constraint::boundary("casing"),
        Constraint::OwnRule,
        Constraint::LinearBeam,
        Constraint::LinearCavities,
        Constraint::LinearMagnets,
    ] {
        assert_agrees(&constraint, &grid, true);
    }
}

#[test]
fn test_beam_off_axis() {
    let mut grid = standard();
    let air = part(&accelerator(), "air");
    *grid.get_mut(&[2, 2, 2]).unwrap() = air;
    assert_agrees(&Constraint::LinearBeam, &grid, false);
}

#[test]
fn test_adjacent_cavity_sections() {
    let grid = linac(&[Section::Cavity("copper"), Section::Cavity("bscco"), Section::Empty]);
    assert_agrees(&Constraint::LinearCavities, &grid, false);
}

#[test]
fn test_partial_cavity_section() {
    let mut grid = linac(&[Section::Cavity("copper"), Section::Empty, Section::Empty]);
    *grid.get_mut(&[1, 3, 3]).unwrap() = part(&accelerator(), "air");
    assert_agrees(&Constraint::LinearCavities, &grid, false);
}

#[test]
fn test_mixed_cavity_section() {
    let mut grid = linac(&[Section::Cavity("copper"), Section::Empty, Section::Empty]);
    *grid.get_mut(&[1, 1, 1]).unwrap() = part(&accelerator(), "bscco cavity");
    assert_agrees(&Constraint::LinearCavities, &grid, false);
}

#[test]
fn test_magnet_in_a_corner() {
    let mut grid = linac(&[Section::Empty, Section::Magnet("copper"), Section::Empty]);
    *grid.get_mut(&[2, 1, 1]).unwrap() = part(&accelerator(), "copper magnet");
    assert_agrees(&Constraint::LinearMagnets, &grid, false);
}

#[test]
fn test_missing_face_magnet() {
    let mut grid = linac(&[Section::Empty, Section::Magnet("copper"), Section::Empty]);
    *grid.get_mut(&[2, 3, 2]).unwrap() = part(&accelerator(), "air");
    assert_agrees(&Constraint::LinearMagnets, &grid, false);
}

#[test]
fn test_cooler_rules() {
    let iron = linac(&[Section::Empty, Section::Cooled("copper", "iron"), Section::Empty]);
    assert_agrees(&Constraint::OwnRule, &iron, true);
    // water coolers need a cavity
    let water = linac(&[Section::Empty, Section::Cooled("copper", "water"), Section::Empty]);
    assert_agrees(&Constraint::OwnRule, &water, false);
}

#[test]
fn test_metrics() {
    let grid = standard();
    assert_eq!(Metric::HeatingRate.evaluate(&grid).unwrap(), 900.0);
    assert_eq!(compiled_metric(&Metric::HeatingRate, &grid), 900);
    assert_eq!(Metric::Voltage.evaluate(&grid).unwrap(), 400.0);
    assert_eq!(compiled_metric(&Metric::Voltage, &grid), 400);
    assert_eq!(Metric::CoolingRate.evaluate(&grid).unwrap(), 0.0);
    assert_eq!(compiled_metric(&Metric::CoolingRate, &grid), 0);
}

#[test]
fn test_power_requirement() {
    let grid = standard();
    // raw power 2000 over a mean efficiency of 0.5
    assert_eq!(Metric::PowerRequirement.evaluate(&grid).unwrap(), 4000.0);
    assert_eq!(compiled_metric(&Metric::PowerRequirement, &grid), 4000);
}

#[test]
fn test_power_requirement_without_parts() {
    let grid = linac(&[Section::Empty, Section::Empty, Section::Empty]);
    assert!(matches!(
        Metric::PowerRequirement.evaluate(&grid),
        Err(DesignError::Undefined(_))
    ));
}

#[test]
fn test_beam_focus() {
    let grid = standard();
    let metric = Metric::BeamFocus(FocusParams::new(1.0, 0.0));
    // copper magnet strength 0.2, three beam blocks of attenuation 0.02
    let focus = metric.evaluate(&grid).unwrap();
    assert!((focus - 0.14).abs() < 1e-9, "got {}", focus);
    assert_eq!(compiled_metric(&metric, &grid), 140);
}

#[test]
fn test_focus_constraint() {
    let grid = standard();
    let params = FocusParams::new(1.0, 0.0);
    let reached = Constraint::BeamFocusAtLeast {
        target: 0.1,
        params,
        layout: Layout::Linear,
    };
    let missed = Constraint::BeamFocusAtLeast {
        target: 0.2,
        params,
        layout: Layout::Linear,
    };
    assert_agrees(&reached, &grid, true);
    assert_agrees(&missed, &grid, false);
}

#[test]
fn test_energy_constraint() {
    let grid = standard();
    // 400 V at unit charge
    let within = Constraint::LinearEnergy {
        min: 300,
        max: 500,
        charge: 1.0,
    };
    let below = Constraint::LinearEnergy {
        min: 401,
        max: 500,
        charge: 1.0,
    };
    let negative_charge = Constraint::LinearEnergy {
        min: 400,
        max: 400,
        charge: -1.0,
    };
    assert_agrees(&within, &grid, true);
    assert_agrees(&below, &grid, false);
    assert_agrees(&negative_charge, &grid, true);
}

#[test]
fn test_heat_neutral() {
    // one copper magnet section (heat 300) cooled by four cryotheum coolers (820)
    let grid = linac(&[Section::Empty, Section::Cooled("copper", "cryotheum"), Section::Empty]);
    let neutral = Constraint::HeatNeutral {
        external_heating: 500,
        layout: Layout::Linear,
    };
    let overheated = Constraint::HeatNeutral {
        external_heating: 600,
        layout: Layout::Linear,
    };
    assert_agrees(&neutral, &grid, true);
    assert_agrees(&overheated, &grid, false);
}

#[test]
fn test_shape_is_checked() {
    let catalog = accelerator();
    let grid = Grid::new(vec![part(&catalog, "air"); 64], vec![4, 4, 4]).unwrap();
    for constraint in [
        Constraint::LinearBeam,
        Constraint::LinearCavities,
        Constraint::LinearMagnets,
    ] {
        assert!(matches!(
            constraint.is_satisfied(&grid),
            Err(DesignError::ShapeAssumption { .. })
        ));
    }
    assert!(Metric::Voltage.evaluate(&grid).is_err());
}

#[test]
fn test_cross_section_ring() {
    let grid = standard();
    for (y, z) in RING {
        assert!(grid.get(&[1, y, z]).unwrap().is_type("cavity"));
    }
}

#[test]
fn test_designer_configuration() {
    let mut designer = LinearAcceleratorDesigner::new(3, (100, 1000), 0.5, FocusParams::new(1.0, 1.0))
        .unwrap()
        .with_symmetry(true, false)
        .with_limit("copper cavity", 0, Some(2));
    assert_eq!(designer.shape(), vec![5, 5, 5]);
    designer.kappa = 0.004;
    // 0.004 * (5 * 5 * 4 + 50) * 300
    assert_eq!(designer.external_heating(), 180);

    let structural = designer.structural_constraints();
    assert!(structural.contains(&Constraint::LinearCavities));
    assert!(structural.contains(&Constraint::HeatNeutral {
        external_heating: 180,
        layout: Layout::Linear,
    }));
    let user = designer.user_constraints();
    assert!(user.contains(&Constraint::Symmetry { axis: 1 }));
    assert!(!user.contains(&Constraint::Symmetry { axis: 2 }));
    assert!(user.contains(&Constraint::quantity("copper cavity", 0, Some(2))));
    assert_eq!(
        designer.objective().map(|(metric, _)| metric),
        Some(Metric::PowerRequirement)
    );

    let relaxed = designer.with_heat_neutral(false);
    assert!(!relaxed
        .structural_constraints()
        .iter()
        .any(|c| matches!(c, Constraint::HeatNeutral { .. })));
}
