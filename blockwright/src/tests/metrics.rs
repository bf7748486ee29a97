use super::support::{pinned, solve};
use crate::catalog::Catalog;
use crate::component::Component;
use crate::grid::Grid;
use crate::metrics::{FocusParams, Metric};
use crate::solver::Model;
use proptest::prelude::*;

fn dynamo_catalog() -> Catalog {
    Catalog::turbine_dynamo().unwrap()
}

/// `#` casing, `.` air, `B` bearing, `m` magnesium, `a` aluminum and `g` gold coils
fn dynamo(rows: &[&str]) -> Grid<Component> {
    let catalog = dynamo_catalog();
    let cells = rows
        .iter()
        .flat_map(|row| row.chars())
        .map(|c| {
            let name = match c {
                '#' => "casing",
                '.' => "air",
                'B' => "bearing",
                'm' => "magnesium coil",
                'a' => "aluminum coil",
                'g' => "gold coil",
                other => panic!("unknown cell '{}'", other),
            };
            let index = catalog.find(name).unwrap();
            catalog.get(index).unwrap().clone()
        })
        .collect();
    Grid::new(cells, vec![rows.len(), rows[0].len()]).unwrap()
}

fn compiled(metric: &Metric, grid: &Grid<Component>) -> i64 {
    let catalog = dynamo_catalog();
    let mut model = Model::new();
    let cells = pinned(&mut model, grid, &catalog);
    let var = metric.compile(&mut model, &cells, &catalog).unwrap();
    solve(&model).value(var).unwrap()
}

#[test]
fn test_conductivity_with_more_coils_than_bearing_pairs() {
    let grid = dynamo(&["#####", "#.m.#", "#mBm#", "#.m.#", "#####"]);
    let conductivity = Metric::DynamoConductivity.evaluate(&grid).unwrap();
    assert!((conductivity - 0.88).abs() < 1e-9);
    assert_eq!(compiled(&Metric::DynamoConductivity, &grid), 880);
}

#[test]
fn test_conductivity_with_more_bearing_pairs_than_coils() {
    // eight bearings count as four coils
    let grid = dynamo(&["#####", "#BBB#", "#BBB#", "#BBm#", "#####"]);
    let conductivity = Metric::DynamoConductivity.evaluate(&grid).unwrap();
    assert!((conductivity - 0.22).abs() < 1e-9);
    assert_eq!(compiled(&Metric::DynamoConductivity, &grid), 220);
}

#[test]
fn test_conductivity_without_coils() {
    let grid = dynamo(&["###", "#B#", "###"]);
    assert_eq!(Metric::DynamoConductivity.evaluate(&grid).unwrap(), 0.0);
    assert_eq!(compiled(&Metric::DynamoConductivity, &grid), 0);
}

#[test]
fn test_conductivity_truncates() {
    // 5.56 over six coils
    let grid = dynamo(&["#####", "#gma#", "#mBm#", "#.m.#", "#####"]);
    let conductivity = Metric::DynamoConductivity.evaluate(&grid).unwrap();
    assert!((conductivity - 0.926_666).abs() < 1e-5);
    assert_eq!(compiled(&Metric::DynamoConductivity, &grid), 926);
}

#[test]
fn test_type_count() {
    let grid = dynamo(&["#####", "#gma#", "#mBm#", "#.m.#", "#####"]);
    let coils = Metric::TypeCount {
        type_name: "coil".to_string(),
    };
    assert_eq!(coils.evaluate(&grid).unwrap(), 6.0);
    assert_eq!(compiled(&coils, &grid), 6);

    let casings = Metric::TypeCount {
        type_name: "casing".to_string(),
    };
    assert_eq!(casings.evaluate(&grid).unwrap(), 16.0);
    assert_eq!(compiled(&casings, &grid), 16);
}

#[test]
fn test_cooling_rate_of_a_dynamo_is_zero() {
    let grid = dynamo(&["###", "#m#", "###"]);
    assert_eq!(Metric::CoolingRate.evaluate(&grid).unwrap(), 0.0);
    assert_eq!(compiled(&Metric::CoolingRate, &grid), 0);
}

#[test]
fn test_scale_and_name() {
    assert_eq!(Metric::DynamoConductivity.scale(), 1000);
    assert_eq!(Metric::BeamFocus(FocusParams::new(1.0, 0.0)).scale(), 1000);
    assert_eq!(Metric::HeatingRate.scale(), 1);
    assert_eq!(Metric::RingPowerRequirement.name(), "ring power requirement");
}

#[test]
fn test_loss_factor() {
    let params = FocusParams::new(2.0, 10_000.0);
    assert_eq!(params.loss_factor(), 3.0);
    assert_eq!(params.with_scaling_factor(40_000.0).loss_factor(), 2.0);
}

#[test]
fn test_metric_json() {
    assert_eq!(
        serde_json::to_value(Metric::TypeCount {
            type_name: "coil".to_string()
        })
        .unwrap(),
        serde_json::json!({ "metric": "type_count", "type_name": "coil" })
    );
    assert_eq!(
        serde_json::to_value(Metric::DynamoConductivity).unwrap(),
        serde_json::json!({ "metric": "dynamo_conductivity" })
    );
}

fn cell_strategy() -> impl Strategy<Value = char> {
    prop::sample::select(vec!['.', 'B', 'm', 'a', 'g'])
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_conductivity_agrees(cells in prop::collection::vec(cell_strategy(), 9)) {
        let rows: Vec<String> = cells.chunks(3).map(|row| row.iter().collect()).collect();
        let rows: Vec<&str> = rows.iter().map(String::as_str).collect();
        let grid = dynamo(&rows);
        let evaluated = Metric::DynamoConductivity.evaluate(&grid).unwrap() * 1000.0;
        let compiled = compiled(&Metric::DynamoConductivity, &grid) as f64;
        prop_assert!((evaluated - compiled).abs() <= 1.0, "{} vs {}", evaluated, compiled);
    }
}
