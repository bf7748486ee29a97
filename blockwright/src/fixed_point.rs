//! Scaled-integer arithmetic over solver variables
//!
//! Fractional quantities are carried as integers multiplied by a scale
//! factor, usually [`SCALE`]. Every division truncates toward zero, so
//! results can sit one unit below the exact rounded value. Domains are not
//! checked for overflow: callers size them, using [`Domain::LARGE`] for
//! intermediate products.

use crate::error::DesignError;
use crate::solver::{Cmp, Domain, IntVar, LinearExpr, Model, Solution};
use crate::DesignResult;

/// Default scale factor for fractional quantities
pub const SCALE: i64 = 1000;

/// Heron iterations performed by [`scaled_sqrt`]
pub const SQRT_ITERATIONS: usize = 10;

/// Decimal digits kept in a [`ScaledFloat`] mantissa after correction
pub const PRECISION: u32 = 3;

const MANTISSA_LIMIT: i64 = 1_000_000;

/// `target = a * b / scale`
pub fn scaled_multiply(
    model: &mut Model,
    target: IntVar,
    a: IntVar,
    b: IntVar,
    scale: i64,
    product_domain: Domain,
) {
    let raw = model.new_var(product_domain, "scaled_product");
    model.add_product(raw, a, b);
    model.add_quotient(target, raw, scale);
}

/// `target = a * scale / b` for a divisor of either sign
///
/// The division is split on the sign of `b`, selected by a reified sign
/// literal. Only the active branch divides by `b`; the other one divides by
/// `±1` and its quotient is pinned to zero, so every helper variable is
/// determined by `a` and `b`. `b == 0` is infeasible.
pub fn scaled_divide(
    model: &mut Model,
    target: IntVar,
    a: IntVar,
    b: IntVar,
    scale: i64,
) {
    let divisor = model.domain(b);
    let scaled = model.new_var(Domain::LARGE, "scaled_dividend");
    model.add_equality(scaled, LinearExpr::from(a) * scale);

    let is_positive = model.reify(b, Cmp::Gt, 0i64, "divisor_is_positive");
    let positive = model.new_int_var(1, divisor.hi.max(1), "positive_divisor");
    let negative = model.new_int_var(divisor.lo.min(-1), -1, "negative_divisor");
    model.add_equality(positive, b).only_enforce_if([is_positive]);
    model.add_equality(positive, 1i64).only_enforce_if([!is_positive]);
    model.add_equality(negative, b).only_enforce_if([!is_positive]);
    model.add_equality(negative, -1i64).only_enforce_if([is_positive]);

    let positive_quotient = model.new_var(Domain::LARGE, "positive_quotient");
    let negative_quotient = model.new_var(Domain::LARGE, "negative_quotient");
    model
        .add_quotient(positive_quotient, scaled, positive)
        .only_enforce_if([is_positive]);
    model
        .add_quotient(negative_quotient, scaled, negative)
        .only_enforce_if([!is_positive]);
    model
        .add_equality(positive_quotient, 0i64)
        .only_enforce_if([!is_positive]);
    model
        .add_equality(negative_quotient, 0i64)
        .only_enforce_if([is_positive]);
    model.add_equality(
        target,
        LinearExpr::from(positive_quotient) + negative_quotient,
    );
}

/// `target = a * scale / b` for a divisor known to be positive
pub fn scaled_divide_nonneg(model: &mut Model, target: IntVar, a: IntVar, b: IntVar, scale: i64) {
    model.add_linear(b, Cmp::Ge, 1i64);
    let scaled = model.new_var(Domain::LARGE, "scaled_dividend");
    model.add_equality(scaled, LinearExpr::from(a) * scale);
    model.add_quotient(target, scaled, b);
}

/// `target ≈ sqrt(a)` in fixed point, by `iterations` Heron steps from `a`
///
/// `a` must be non-negative. Zero is routed around the iteration so that no
/// step divides by zero.
pub fn scaled_sqrt(
    model: &mut Model,
    target: IntVar,
    a: IntVar,
    scale: i64,
    iterations: usize,
    domain: Domain,
) {
    model.add_linear(a, Cmp::Ge, 0i64);
    let is_zero = model.reify(a, Cmp::Eq, 0i64, "sqrt_arg_is_zero");
    let radicand = model.new_var(Domain::LARGE.nonnegative(), "sqrt_radicand");
    model.add_equality(radicand, LinearExpr::from(a) + is_zero);

    let mut guess = radicand;
    for step in 0..iterations {
        let quotient = model.new_var(Domain::LARGE, format!("sqrt_quotient_{}", step));
        scaled_divide(model, quotient, radicand, guess, scale);
        let next = model.new_var(Domain::LARGE, format!("sqrt_guess_{}", step + 1));
        let sum = model.new_var(Domain::LARGE, format!("sqrt_sum_{}", step));
        model.add_equality(sum, LinearExpr::from(guess) + quotient);
        model.add_quotient(next, sum, 2i64);
        guess = next;
    }

    let magnitude = model.new_var(domain.nonnegative(), "sqrt_magnitude");
    model.add_abs(magnitude, guess);
    model
        .add_equality(target, magnitude)
        .only_enforce_if([!is_zero]);
    model.add_equality(target, 0i64).only_enforce_if([is_zero]);
}

/// `target = table[row][col]` for a rectangular constant table
pub fn add_element_2d(
    model: &mut Model,
    target: IntVar,
    row: IntVar,
    col: IntVar,
    table: &[Vec<i64>],
) -> DesignResult<()> {
    let width = table.first().map_or(0, Vec::len);
    if width == 0 || table.iter().any(|r| r.len() != width) {
        return Err(DesignError::solver(
            "two-dimensional element table must be rectangular and non-empty",
        ));
    }
    let height = table.len() as i64;
    let width = width as i64;
    model.add_linear(row, Cmp::Ge, 0i64);
    model.add_linear(row, Cmp::Lt, height);
    model.add_linear(col, Cmp::Ge, 0i64);
    model.add_linear(col, Cmp::Lt, width);
    let index = model.new_int_var(0, height * width - 1, "element_2d_index");
    model.add_equality(index, LinearExpr::from(row) * width + col);
    model.add_element(target, index, table.concat());
    Ok(())
}

/// Mantissa/exponent pair of solver variables, `mantissa · 10^exponent`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScaledFloat {
    pub mantissa: IntVar,
    pub exponent: IntVar,
}

impl ScaledFloat {
    pub fn new(model: &mut Model, name: &str) -> Self {
        Self {
            mantissa: model.new_var(
                Domain::new(0, 2 * MANTISSA_LIMIT),
                format!("{}_mantissa", name),
            ),
            exponent: model.new_var(Domain::INT32, format!("{}_exponent", name)),
        }
    }

    pub fn constant(model: &mut Model, mantissa: i64, exponent: i64) -> Self {
        Self {
            mantissa: model.new_constant(mantissa),
            exponent: model.new_constant(exponent),
        }
    }

    /// Shift one digit into the exponent per pass while the mantissa has more than
    /// [`PRECISION`] digits
    pub fn correct_overflow(&self, model: &mut Model) -> ScaledFloat {
        let digit_budget = 10i64.pow(PRECISION);
        let mut current = *self;
        for pass in 0..PRECISION {
            let head = model.new_var(Domain::NONNEGATIVE, format!("overflow_head_{}", pass));
            model.add_quotient(head, current.mantissa, digit_budget);
            let overflow = model.reify(head, Cmp::Gt, 0i64, format!("overflow_{}", pass));

            let shifted = model.new_var(Domain::NONNEGATIVE, format!("shifted_{}", pass));
            model.add_quotient(shifted, current.mantissa, 10i64);

            let next = ScaledFloat::new(model, &format!("corrected_{}", pass));
            model
                .add_equality(next.mantissa, shifted)
                .only_enforce_if([overflow]);
            model
                .add_equality(next.exponent, LinearExpr::from(current.exponent) + 1i64)
                .only_enforce_if([overflow]);
            model
                .add_equality(next.mantissa, current.mantissa)
                .only_enforce_if([!overflow]);
            model
                .add_equality(next.exponent, current.exponent)
                .only_enforce_if([!overflow]);
            current = next;
        }
        current
    }

    /// Sum of two floats sharing an exponent, then overflow correction
    pub fn add(&self, model: &mut Model, other: &ScaledFloat) -> ScaledFloat {
        let sum = ScaledFloat::new(model, "sum");
        model.add_equality(self.exponent, other.exponent);
        model.add_equality(
            sum.mantissa,
            LinearExpr::from(self.mantissa) + other.mantissa,
        );
        model.add_equality(sum.exponent, self.exponent);
        sum.correct_overflow(model)
    }

    pub fn value(&self, solution: &Solution) -> Option<f64> {
        let mantissa = solution.value(self.mantissa)?;
        let exponent = solution.value(self.exponent)?;
        Some(mantissa as f64 * 10f64.powi(exponent as i32))
    }
}

/// Pure counterpart of [`ScaledFloat::correct_overflow`]
pub fn normalize(mut mantissa: i64, mut exponent: i64) -> (i64, i64) {
    let digit_budget = 10i64.pow(PRECISION);
    for _ in 0..PRECISION {
        if mantissa / digit_budget > 0 {
            mantissa /= 10;
            exponent += 1;
        }
    }
    (mantissa, exponent)
}
