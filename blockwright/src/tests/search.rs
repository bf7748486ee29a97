use super::support::solve;
use crate::error::DesignError;
use crate::limits::SolverLimits;
use crate::solver::{Backend, Cmp, LinearExpr, Model, SearchBackend, SolveStatus};

#[test]
fn test_maximize_linear_objective() {
    let mut model = Model::new();
    let x = model.new_int_var(0, 10, "x");
    let y = model.new_int_var(0, 10, "y");
    model.add_linear(LinearExpr::from(x) + y, Cmp::Le, 12i64);
    model.maximize(LinearExpr::from(x) * 2 + y);

    let solution = solve(&model);
    assert_eq!(solution.status, SolveStatus::Optimal);
    assert_eq!(solution.objective, Some(22));
    assert_eq!(solution.value(x), Some(10));
    assert_eq!(solution.value(y), Some(2));
}

#[test]
fn test_minimize_with_lower_bound() {
    let mut model = Model::new();
    let x = model.new_int_var(-5, 5, "x");
    model.add_linear(x, Cmp::Ge, -2i64);
    model.minimize(x);

    let solution = solve(&model);
    assert_eq!(solution.status, SolveStatus::Optimal);
    assert_eq!(solution.objective, Some(-2));
}

#[test]
fn test_satisfaction_stops_at_first_solution() {
    let mut model = Model::new();
    let x = model.new_int_var(0, 3, "x");
    model.add_linear(x, Cmp::Ne, 0i64);

    let solution = solve(&model);
    assert_eq!(solution.status, SolveStatus::Optimal);
    assert_eq!(solution.value(x), Some(1));
    assert_eq!(solution.objective, None);
}

#[test]
fn test_contradiction_is_infeasible() {
    let mut model = Model::new();
    let x = model.new_int_var(0, 3, "x");
    model.add_linear(x, Cmp::Ge, 5i64);

    let solution = solve(&model);
    assert_eq!(solution.status, SolveStatus::Infeasible);
    assert!(!solution.has_assignment());
    assert_eq!(solution.value(x), None);
}

#[test]
fn test_conflicting_literals_are_infeasible() {
    let mut model = Model::new();
    let a = model.new_bool_var("a");
    model.add_bool_and([a.lit(), !a.lit()]);
    assert_eq!(solve(&model).status, SolveStatus::Infeasible);
}

#[test]
fn test_node_limit_before_any_solution_is_unknown() {
    let mut model = Model::new();
    let x = model.new_int_var(0, 100, "x");
    model.maximize(x);

    let limits = SolverLimits::new().with_max_nodes(0);
    let solution = SearchBackend::new().solve(&model, &limits).unwrap();
    assert_eq!(solution.status, SolveStatus::Unknown);
    assert!(!solution.has_assignment());
}

#[test]
fn test_node_limit_after_a_solution_is_feasible() {
    let mut model = Model::new();
    let x = model.new_int_var(0, 100, "x");
    model.maximize(x);

    let limits = SolverLimits::new().with_max_nodes(3);
    let solution = SearchBackend::new().solve(&model, &limits).unwrap();
    assert_eq!(solution.status, SolveStatus::Feasible);
    assert!(solution.has_assignment());
    assert!(solution.stats.solutions >= 1);
}

#[test]
fn test_enforcement_literal() {
    let mut model = Model::new();
    let x = model.new_int_var(0, 10, "x");
    let wants_big = model.new_bool_var("wants_big");
    model.add_linear(x, Cmp::Ge, 5i64).only_enforce_if([wants_big]);
    model.add_linear(x, Cmp::Le, 2i64);
    model.maximize(wants_big);

    let solution = solve(&model);
    assert_eq!(solution.status, SolveStatus::Optimal);
    assert_eq!(solution.bool_value(wants_big), Some(false));
}

#[test]
fn test_reified_comparison_follows_fixed_values() {
    let mut model = Model::new();
    let x = model.new_constant(3);
    let is_three = model.reify(x, Cmp::Eq, 3i64, "is_three");
    let is_big = model.reify(x, Cmp::Gt, 5i64, "is_big");
    let either = model.reify_any(&[is_three.lit(), is_big.lit()], "either");
    let both = model.reify_all(&[is_three.lit(), is_big.lit()], "both");

    let solution = solve(&model);
    assert_eq!(solution.bool_value(is_three), Some(true));
    assert_eq!(solution.bool_value(is_big), Some(false));
    assert_eq!(solution.bool_value(!is_big), Some(true));
    assert_eq!(solution.bool_value(either), Some(true));
    assert_eq!(solution.bool_value(both), Some(false));
}

#[test]
fn test_reify_in_empty_set_is_false() {
    let mut model = Model::new();
    let x = model.new_int_var(0, 3, "x");
    let member = model.reify_in(x, &[], "never");
    assert_eq!(solve(&model).bool_value(member), Some(false));
}

#[test]
fn test_table_element_product_and_abs() {
    let mut model = Model::new();
    let x = model.new_constant(3);
    let y = model.new_int_var(0, 10, "y");
    model.add_allowed(vec![x, y], vec![vec![1, 2], vec![3, 4]]);

    let picked = model.new_int_var(-100, 100, "picked");
    model.add_element(picked, y, vec![0, 10, 20, 30, -40]);
    let product = model.new_int_var(-1000, 1000, "product");
    model.add_product(product, picked, x);
    let magnitude = model.new_int_var(0, 1000, "magnitude");
    model.add_abs(magnitude, product);

    let solution = solve(&model);
    assert_eq!(solution.value(y), Some(4));
    assert_eq!(solution.value(picked), Some(-40));
    assert_eq!(solution.value(product), Some(-120));
    assert_eq!(solution.value(magnitude), Some(120));
}

#[test]
fn test_forbidden_tuples() {
    let mut model = Model::new();
    let x = model.new_int_var(0, 2, "x");
    model.add_not_member(x, &[0, 1]);
    assert_eq!(solve(&model).value(x), Some(2));
}

#[test]
fn test_min_equality() {
    let mut model = Model::new();
    let a = model.new_constant(7);
    let b = model.new_constant(4);
    let target = model.new_int_var(-10, 10, "min");
    model.add_min_equality(target, a, b);
    assert_eq!(solve(&model).value(target), Some(4));
}

#[test]
fn test_constants_are_shared() {
    let mut model = Model::new();
    let a = model.new_constant(5);
    let b = model.new_constant(5);
    let c = model.new_constant(6);
    assert_eq!(a, b);
    assert_ne!(a, c);
    assert_eq!(model.num_vars(), 2);
}

#[test]
fn test_empty_domain_is_rejected() {
    let mut model = Model::new();
    model.new_int_var(5, 1, "broken");
    let result = SearchBackend::new().solve(&model, &SolverLimits::default());
    assert!(matches!(result, Err(DesignError::Solver(_))));
}

#[test]
fn test_foreign_variable_is_rejected() {
    let mut other = Model::new();
    let foreign = other.new_int_var(0, 1, "foreign");
    let mut model = Model::new();
    model.add_linear(foreign, Cmp::Ge, 0i64);
    let result = SearchBackend::new().solve(&model, &SolverLimits::default());
    assert!(matches!(result, Err(DesignError::Solver(_))));
}

#[test]
fn test_ragged_table_is_rejected() {
    let mut model = Model::new();
    let x = model.new_int_var(0, 1, "x");
    model.add_allowed(vec![x], vec![vec![0, 1]]);
    let result = SearchBackend::new().solve(&model, &SolverLimits::default());
    assert!(matches!(result, Err(DesignError::Solver(_))));
}

#[test]
fn test_stats_are_reported() {
    let mut model = Model::new();
    let x = model.new_int_var(0, 4, "x");
    let y = model.new_int_var(0, 4, "y");
    model.add_linear(LinearExpr::from(x) + y, Cmp::Eq, 7i64);
    model.add_decision_strategy([x, y]);
    model.maximize(x);

    let solution = solve(&model);
    assert_eq!(solution.objective, Some(4));
    assert_eq!(solution.value(y), Some(3));
    assert!(solution.stats.nodes > 0);
    assert!(solution.stats.solutions >= 1);
    assert!(solution.stats.to_string().contains("nodes"));
}
