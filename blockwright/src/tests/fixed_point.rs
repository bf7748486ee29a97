use super::support::solve;
use crate::fixed_point::{
    add_element_2d, normalize, scaled_divide, scaled_divide_nonneg, scaled_multiply, scaled_sqrt,
    ScaledFloat, SCALE, SQRT_ITERATIONS,
};
use crate::limits::SolverLimits;
use crate::solver::{Backend, Cmp, Domain, Model, SearchBackend, SolveStatus};
use proptest::prelude::*;

fn divide(a: i64, b: i64) -> Option<i64> {
    let mut model = Model::new();
    let a = model.new_constant(a);
    let b = model.new_constant(b);
    let target = model.new_var(Domain::LARGE, "quotient");
    scaled_divide(&mut model, target, a, b, SCALE);
    solve(&model).value(target)
}

fn sqrt(a: i64) -> Option<i64> {
    let mut model = Model::new();
    let a = model.new_constant(a);
    let target = model.new_var(Domain::INT32, "root");
    scaled_sqrt(&mut model, target, a, SCALE, SQRT_ITERATIONS, Domain::INT32);
    solve(&model).value(target)
}

#[test]
fn test_scaled_multiply() {
    let mut model = Model::new();
    let a = model.new_constant(2000);
    let b = model.new_constant(5000);
    let target = model.new_var(Domain::INT32, "product");
    scaled_multiply(&mut model, target, a, b, SCALE, Domain::LARGE);
    assert_eq!(solve(&model).value(target), Some(10000));
}

#[test]
fn test_scaled_multiply_truncates() {
    let mut model = Model::new();
    let a = model.new_constant(1500);
    let b = model.new_constant(333);
    let target = model.new_var(Domain::INT32, "product");
    scaled_multiply(&mut model, target, a, b, SCALE, Domain::LARGE);
    // 1.5 * 0.333 = 0.4995
    assert_eq!(solve(&model).value(target), Some(499));
}

#[test]
fn test_scaled_divide_by_positive_and_negative() {
    assert_eq!(divide(10000, 2000), Some(5000));
    assert_eq!(divide(10000, -5000), Some(-2000));
    assert_eq!(divide(-10000, 4000), Some(-2500));
    assert_eq!(divide(1000, 3000), Some(333));
}

#[test]
fn test_scaled_divide_by_zero_is_infeasible() {
    let mut model = Model::new();
    let a = model.new_constant(1000);
    let b = model.new_constant(0);
    let target = model.new_var(Domain::LARGE, "quotient");
    scaled_divide(&mut model, target, a, b, SCALE);
    assert_eq!(solve(&model).status, SolveStatus::Infeasible);
}

#[test]
fn test_scaled_divide_nonneg() {
    let mut model = Model::new();
    let a = model.new_constant(7000);
    let b = model.new_constant(2000);
    let target = model.new_var(Domain::INT32, "quotient");
    scaled_divide_nonneg(&mut model, target, a, b, SCALE);
    assert_eq!(solve(&model).value(target), Some(3500));
}

#[test]
fn test_scaled_sqrt_of_perfect_square() {
    assert_eq!(sqrt(25000), Some(5000));
}

#[test]
fn test_scaled_sqrt_resolves_without_search() {
    let mut model = Model::new();
    let a = model.new_constant(25000);
    let target = model.new_var(Domain::INT32, "root");
    scaled_sqrt(&mut model, target, a, SCALE, SQRT_ITERATIONS, Domain::INT32);
    let limits = SolverLimits::new().with_max_nodes(10);
    let solution = SearchBackend::new().solve(&model, &limits).unwrap();
    assert_eq!(solution.status, SolveStatus::Optimal);
    assert_eq!(solution.value(target), Some(5000));
    assert!(solution.stats.nodes <= 2, "{}", solution.stats);
}

#[test]
fn test_scaled_divide_by_unknown_sign() {
    // the divisor's sign is only known once the search fixes it
    let mut model = Model::new();
    let a = model.new_constant(6000);
    let b = model.new_int_var(-3000, 3000, "divisor");
    let target = model.new_var(Domain::LARGE, "quotient");
    scaled_divide(&mut model, target, a, b, SCALE);
    model.add_linear(target, Cmp::Eq, -3000i64);
    let limits = SolverLimits::new().with_max_nodes(200);
    let solution = SearchBackend::new().solve(&model, &limits).unwrap();
    assert_eq!(solution.status, SolveStatus::Optimal);
    assert_eq!(solution.value(b), Some(-2000));
}

#[test]
fn test_scaled_sqrt_of_zero() {
    assert_eq!(sqrt(0), Some(0));
}

#[test]
fn test_scaled_sqrt_is_close() {
    // sqrt(2) = 1.41421...
    let root = sqrt(2000).unwrap();
    assert!((1413..=1415).contains(&root), "got {}", root);
}

#[test]
fn test_element_2d() {
    let mut model = Model::new();
    let row = model.new_constant(1);
    let col = model.new_constant(2);
    let target = model.new_int_var(0, 100, "cell");
    add_element_2d(&mut model, target, row, col, &[vec![1, 2, 3], vec![4, 5, 6]]).unwrap();
    assert_eq!(solve(&model).value(target), Some(6));
}

#[test]
fn test_element_2d_rejects_ragged_tables() {
    let mut model = Model::new();
    let row = model.new_constant(0);
    let col = model.new_constant(0);
    let target = model.new_int_var(0, 100, "cell");
    assert!(add_element_2d(&mut model, target, row, col, &[vec![1, 2], vec![3]]).is_err());
    assert!(add_element_2d(&mut model, target, row, col, &[]).is_err());
}

#[test]
fn test_normalize() {
    assert_eq!(normalize(999, 0), (999, 0));
    assert_eq!(normalize(5000, 2), (500, 3));
    assert_eq!(normalize(1_234_567, 0), (1234, 3));
}

#[test]
fn test_scaled_float_correction_matches_normalize() {
    let mut model = Model::new();
    let float = ScaledFloat::constant(&mut model, 1_234_567, 0);
    let corrected = float.correct_overflow(&mut model);
    let solution = solve(&model);
    assert_eq!(solution.value(corrected.mantissa), Some(1234));
    assert_eq!(solution.value(corrected.exponent), Some(3));
    assert_eq!(corrected.value(&solution), Some(1_234_000.0));
}

#[test]
fn test_scaled_float_add() {
    let mut model = Model::new();
    let a = ScaledFloat::constant(&mut model, 600, 1);
    let b = ScaledFloat::constant(&mut model, 700, 1);
    let sum = a.add(&mut model, &b);
    let solution = solve(&model);
    assert_eq!(solution.value(sum.mantissa), Some(130));
    assert_eq!(solution.value(sum.exponent), Some(2));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_scaled_divide_truncates_toward_zero(a in -100_000i64..100_000, b in 1i64..50_000, negate in any::<bool>()) {
        let b = if negate { -b } else { b };
        prop_assert_eq!(divide(a, b), Some(a * SCALE / b));
    }

    #[test]
    fn prop_normalize_keeps_magnitude(mantissa in 0i64..2_000_000, exponent in -5i64..5) {
        let (m, shift) = normalize(mantissa, 0);
        prop_assert!(m < 10_000);
        let corrected = m * 10i64.pow(shift as u32);
        prop_assert!(corrected <= mantissa);
        prop_assert!(mantissa - corrected < 10i64.pow(shift as u32));
        prop_assert_eq!(normalize(mantissa, exponent), (m, exponent + shift));
    }
}
