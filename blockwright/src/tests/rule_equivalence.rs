//! Evaluating a rule on concrete neighbors and solving its compiled form
//! on pinned neighbor variables must agree.

use super::support::{air, bearing, casing, coil, solve};
use crate::catalog::Catalog;
use crate::rules::{parse_rule, Neighbor, NeighborVar};
use crate::solver::Model;
use proptest::prelude::*;

const THREE_AXIS_RULES: [&str; 16] = [
    "one bearing",
    "exactly two coils",
    "at most one a coil",
    "two axial coils",
    "two opposing coils",
    "exactly four opposing coils",
    "three vertex coils",
    "exactly three vertex bearings",
    "two edge coils",
    "exactly two edge coils",
    "two different coils",
    "three different coils",
    "exactly zero bearings",
    "one bearing && one a coil",
    "one bearing || exactly two b coils",
    "(one casing || one air) && at most two coils",
];

const TWO_AXIS_RULES: [&str; 6] = [
    "one bearing",
    "at most two coils",
    "two axial coils",
    "two edge coils",
    "two different coils",
    "exactly one a coil || two opposing bearings",
];

fn catalog() -> Catalog {
    Catalog::new(vec![air(), casing(), bearing(), coil("a", 1.0), coil("b", 1.1)]).unwrap()
}

fn evaluated(rule: &str, neighbors: &[(usize, bool)]) -> bool {
    let catalog = catalog();
    let neighbors: Vec<Neighbor> = neighbors
        .iter()
        .map(|&(id, active)| {
            let component = catalog.get(id).unwrap();
            if active {
                Neighbor::new(component)
            } else {
                Neighbor::inactive(component)
            }
        })
        .collect();
    parse_rule(rule).unwrap().is_satisfied(&neighbors).unwrap()
}

fn compiled(rule: &str, neighbors: &[(usize, bool)]) -> bool {
    let catalog = catalog();
    let mut model = Model::new();
    let vars: Vec<NeighborVar> = neighbors
        .iter()
        .map(|&(id, active)| {
            let cell = model.new_int_var(id as i64, id as i64, "neighbor");
            let active = model.constant_bool(active).lit();
            NeighborVar::new(cell, active)
        })
        .collect();
    let holds = parse_rule(rule)
        .unwrap()
        .compile(&mut model, &vars, &catalog)
        .unwrap();
    solve(&model).bool_value(holds).unwrap()
}

#[test]
fn test_bearing_next_to_coil() {
    let neighbors = [(2, true), (0, true), (0, true), (0, true), (0, true), (0, true)];
    assert!(evaluated("one bearing", &neighbors));
    assert!(compiled("one bearing", &neighbors));
}

#[test]
fn test_inactive_neighbors_never_match() {
    let neighbors = [(2, false), (0, true), (0, true), (0, true)];
    assert!(!evaluated("one bearing", &neighbors));
    assert!(!compiled("one bearing", &neighbors));
}

#[test]
fn test_vertex_needs_three_axes() {
    let corner = [(3, true), (0, true), (4, true), (0, true), (3, true), (0, true)];
    assert!(evaluated("three vertex coils", &corner));
    assert!(compiled("three vertex coils", &corner));

    let line = [(3, true), (4, true), (3, true), (0, true), (0, true), (0, true)];
    assert!(!evaluated("three vertex coils", &line));
    assert!(!compiled("three vertex coils", &line));
}

#[test]
fn test_edge_needs_two_axes() {
    let opposite = [(3, true), (3, true), (0, true), (0, true)];
    assert!(!evaluated("two edge coils", &opposite));
    assert!(!compiled("two edge coils", &opposite));

    let bent = [(3, true), (0, true), (0, true), (4, true)];
    assert!(evaluated("two edge coils", &bent));
    assert!(compiled("two edge coils", &bent));
}

#[test]
fn test_different_counts_distinct_names() {
    let same = [(3, true), (3, true), (0, true), (0, true)];
    assert!(!evaluated("two different coils", &same));
    assert!(!compiled("two different coils", &same));

    let mixed = [(3, true), (4, true), (0, true), (0, true)];
    assert!(evaluated("two different coils", &mixed));
    assert!(compiled("two different coils", &mixed));
}

#[test]
fn test_different_ignores_the_name() {
    // a "b" coil still counts towards "two different a coils"
    let mixed = [(3, true), (4, true), (0, true), (0, true)];
    assert!(evaluated("two different a coils", &mixed));
    assert!(compiled("two different a coils", &mixed));

    let same = [(4, true), (4, true), (0, true), (0, true)];
    assert!(!evaluated("two different a coils", &same));
    assert!(!compiled("two different a coils", &same));
}

#[test]
fn test_vertex_rule_on_two_axes_is_an_error() {
    let catalog = catalog();
    let component = catalog.get(0).unwrap();
    let neighbors = vec![Neighbor::new(component); 4];
    let rule = parse_rule("three vertex coils").unwrap();
    assert!(rule.is_satisfied(&neighbors).is_err());
}

fn neighbor_strategy(len: usize) -> impl Strategy<Value = Vec<(usize, bool)>> {
    prop::collection::vec((0usize..5, prop::bool::weighted(0.85)), len)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(96))]

    #[test]
    fn prop_three_axis_rules_agree(
        rule in prop::sample::select(THREE_AXIS_RULES.to_vec()),
        neighbors in neighbor_strategy(6),
    ) {
        prop_assert_eq!(evaluated(rule, &neighbors), compiled(rule, &neighbors), "rule '{}'", rule);
    }

    #[test]
    fn prop_two_axis_rules_agree(
        rule in prop::sample::select(TWO_AXIS_RULES.to_vec()),
        neighbors in neighbor_strategy(4),
    ) {
        prop_assert_eq!(evaluated(rule, &neighbors), compiled(rule, &neighbors), "rule '{}'", rule);
    }
}
