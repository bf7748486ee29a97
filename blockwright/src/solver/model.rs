//! Solver-independent constraint model
//!
//! The model only speaks the primitive set every backend must support:
//! bounded integer and boolean variables, linear relations, tuple tables,
//! boolean and/or, multiplication, truncating division, element and
//! absolute value, each optionally enforced by a conjunction of literals.

use std::fmt;
use std::ops::{Add, Mul, Neg, Not, Sub};

/// Handle to an integer variable of one [`Model`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IntVar(pub(crate) usize);

impl IntVar {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Integer variable restricted to `{0, 1}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BoolVar(pub(crate) IntVar);

impl BoolVar {
    pub fn lit(self) -> Lit {
        Lit {
            var: self.0,
            negated: false,
        }
    }

    pub fn as_int(self) -> IntVar {
        self.0
    }
}

/// A boolean variable or its negation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Lit {
    pub(crate) var: IntVar,
    pub(crate) negated: bool,
}

impl Lit {
    pub fn var(self) -> IntVar {
        self.var
    }

    pub fn is_negated(self) -> bool {
        self.negated
    }

    /// Truth value of the literal when its variable holds `value`
    pub fn holds(self, value: i64) -> bool {
        (value == 1) != self.negated
    }
}

impl Not for Lit {
    type Output = Lit;

    fn not(self) -> Lit {
        Lit {
            var: self.var,
            negated: !self.negated,
        }
    }
}

impl Not for BoolVar {
    type Output = Lit;

    fn not(self) -> Lit {
        !self.lit()
    }
}

impl From<BoolVar> for Lit {
    fn from(b: BoolVar) -> Lit {
        b.lit()
    }
}

/// Closed integer interval
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Domain {
    pub lo: i64,
    pub hi: i64,
}

impl Domain {
    /// Signed 32-bit range
    pub const INT32: Domain = Domain {
        lo: i32::MIN as i64,
        hi: i32::MAX as i64,
    };
    /// Extended range for intermediate products
    pub const LARGE: Domain = Domain {
        lo: -(1 << 47),
        hi: 1 << 47,
    };
    pub const NONNEGATIVE: Domain = Domain {
        lo: 0,
        hi: i32::MAX as i64,
    };
    pub const BOOL: Domain = Domain { lo: 0, hi: 1 };

    pub const fn new(lo: i64, hi: i64) -> Self {
        Self { lo, hi }
    }

    pub const fn constant(value: i64) -> Self {
        Self {
            lo: value,
            hi: value,
        }
    }

    pub fn contains(&self, value: i64) -> bool {
        self.lo <= value && value <= self.hi
    }

    pub fn is_empty(&self) -> bool {
        self.lo > self.hi
    }

    /// Same interval without negative values
    pub fn nonnegative(self) -> Self {
        Self {
            lo: self.lo.max(0),
            hi: self.hi,
        }
    }
}

/// A variable or a constant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    Var(IntVar),
    Const(i64),
}

impl From<IntVar> for Operand {
    fn from(v: IntVar) -> Self {
        Operand::Var(v)
    }
}

impl From<BoolVar> for Operand {
    fn from(b: BoolVar) -> Self {
        Operand::Var(b.as_int())
    }
}

impl From<i64> for Operand {
    fn from(c: i64) -> Self {
        Operand::Const(c)
    }
}

/// `Σ coef·var + constant`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinearExpr {
    pub(crate) terms: Vec<(IntVar, i64)>,
    pub(crate) constant: i64,
}

impl LinearExpr {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn constant(value: i64) -> Self {
        Self {
            terms: Vec::new(),
            constant: value,
        }
    }

    pub fn term(mut self, var: impl Into<IntVarLike>, coef: i64) -> Self {
        self.add_term(var, coef);
        self
    }

    pub fn add_term(&mut self, var: impl Into<IntVarLike>, coef: i64) {
        if coef != 0 {
            self.terms.push((var.into().0, coef));
        }
    }

    pub fn sum<V: Into<IntVarLike>>(vars: impl IntoIterator<Item = V>) -> Self {
        Self::weighted_sum(vars.into_iter().map(|v| (v, 1)))
    }

    pub fn weighted_sum<V: Into<IntVarLike>>(terms: impl IntoIterator<Item = (V, i64)>) -> Self {
        let mut expr = Self::new();
        for (v, coef) in terms {
            expr.add_term(v, coef);
        }
        expr
    }

    pub fn terms(&self) -> &[(IntVar, i64)] {
        &self.terms
    }

    pub fn constant_term(&self) -> i64 {
        self.constant
    }

    pub fn evaluate(&self, value: impl Fn(IntVar) -> i64) -> i128 {
        self.terms
            .iter()
            .map(|&(v, c)| value(v) as i128 * c as i128)
            .sum::<i128>()
            + self.constant as i128
    }
}

/// Anything that names an integer variable
#[derive(Debug, Clone, Copy)]
pub struct IntVarLike(IntVar);

impl From<IntVar> for IntVarLike {
    fn from(v: IntVar) -> Self {
        IntVarLike(v)
    }
}

impl From<BoolVar> for IntVarLike {
    fn from(b: BoolVar) -> Self {
        IntVarLike(b.as_int())
    }
}

impl From<IntVar> for LinearExpr {
    fn from(v: IntVar) -> Self {
        LinearExpr::new().term(v, 1)
    }
}

impl From<BoolVar> for LinearExpr {
    fn from(b: BoolVar) -> Self {
        LinearExpr::new().term(b, 1)
    }
}

impl From<i64> for LinearExpr {
    fn from(c: i64) -> Self {
        LinearExpr::constant(c)
    }
}

impl<T: Into<LinearExpr>> Add<T> for LinearExpr {
    type Output = LinearExpr;

    fn add(mut self, rhs: T) -> LinearExpr {
        let rhs = rhs.into();
        self.terms.extend(rhs.terms);
        self.constant += rhs.constant;
        self
    }
}

impl<T: Into<LinearExpr>> Sub<T> for LinearExpr {
    type Output = LinearExpr;

    fn sub(self, rhs: T) -> LinearExpr {
        self + (-rhs.into())
    }
}

impl Neg for LinearExpr {
    type Output = LinearExpr;

    fn neg(self) -> LinearExpr {
        self * -1
    }
}

impl Mul<i64> for LinearExpr {
    type Output = LinearExpr;

    fn mul(mut self, k: i64) -> LinearExpr {
        for term in &mut self.terms {
            term.1 *= k;
        }
        self.terms.retain(|&(_, c)| c != 0);
        self.constant *= k;
        self
    }
}

/// Relational operator of a linear constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cmp {
    Eq,
    Ne,
    Le,
    Lt,
    Ge,
    Gt,
}

impl Cmp {
    /// The operator satisfied exactly when `self` is not
    pub fn negate(self) -> Cmp {
        match self {
            Cmp::Eq => Cmp::Ne,
            Cmp::Ne => Cmp::Eq,
            Cmp::Le => Cmp::Gt,
            Cmp::Lt => Cmp::Ge,
            Cmp::Ge => Cmp::Lt,
            Cmp::Gt => Cmp::Le,
        }
    }

    pub fn holds(self, lhs: i128, rhs: i128) -> bool {
        match self {
            Cmp::Eq => lhs == rhs,
            Cmp::Ne => lhs != rhs,
            Cmp::Le => lhs <= rhs,
            Cmp::Lt => lhs < rhs,
            Cmp::Ge => lhs >= rhs,
            Cmp::Gt => lhs > rhs,
        }
    }
}

impl fmt::Display for Cmp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self {
            Cmp::Eq => "==",
            Cmp::Ne => "!=",
            Cmp::Le => "<=",
            Cmp::Lt => "<",
            Cmp::Ge => ">=",
            Cmp::Gt => ">",
        };
        write!(f, "{}", op)
    }
}

/// One primitive constraint
#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    /// `expr cmp rhs`
    Linear {
        expr: LinearExpr,
        cmp: Cmp,
        rhs: i64,
    },
    /// The tuple of `vars` is (or is not, when `allowed` is false) one of `tuples`
    Table {
        vars: Vec<IntVar>,
        tuples: Vec<Vec<i64>>,
        allowed: bool,
    },
    BoolAnd(Vec<Lit>),
    BoolOr(Vec<Lit>),
    /// `target == left * right`
    Product {
        target: IntVar,
        left: Operand,
        right: Operand,
    },
    /// `target == numerator / denominator`, rounding toward zero
    Quotient {
        target: IntVar,
        numerator: Operand,
        denominator: Operand,
    },
    /// `target == table[index]`
    Element {
        target: IntVar,
        index: IntVar,
        table: Vec<i64>,
    },
    /// `target == |arg|`
    Abs { target: IntVar, arg: Operand },
}

impl Constraint {
    /// Variables the constraint reads or writes
    pub fn vars(&self) -> Vec<IntVar> {
        fn operand(out: &mut Vec<IntVar>, op: &Operand) {
            if let Operand::Var(v) = op {
                out.push(*v);
            }
        }
        let mut out = Vec::new();
        match self {
            Constraint::Linear { expr, .. } => out.extend(expr.terms.iter().map(|&(v, _)| v)),
            Constraint::Table { vars, .. } => out.extend(vars.iter().copied()),
            Constraint::BoolAnd(lits) | Constraint::BoolOr(lits) => {
                out.extend(lits.iter().map(|l| l.var))
            }
            Constraint::Product {
                target,
                left,
                right,
            } => {
                out.push(*target);
                operand(&mut out, left);
                operand(&mut out, right);
            }
            Constraint::Quotient {
                target,
                numerator,
                denominator,
            } => {
                out.push(*target);
                operand(&mut out, numerator);
                operand(&mut out, denominator);
            }
            Constraint::Element { target, index, .. } => {
                out.push(*target);
                out.push(*index);
            }
            Constraint::Abs { target, arg } => {
                out.push(*target);
                operand(&mut out, arg);
            }
        }
        out
    }

    /// Whether the constraint holds under a complete assignment
    pub fn holds(&self, value: impl Fn(IntVar) -> i64) -> bool {
        let operand = |op: &Operand| match *op {
            Operand::Var(v) => value(v),
            Operand::Const(c) => c,
        };
        match self {
            Constraint::Linear { expr, cmp, rhs } => cmp.holds(expr.evaluate(&value), *rhs as i128),
            Constraint::Table {
                vars,
                tuples,
                allowed,
            } => {
                let found = tuples
                    .iter()
                    .any(|t| t.iter().zip(vars).all(|(&x, &v)| value(v) == x));
                found == *allowed
            }
            Constraint::BoolAnd(lits) => lits.iter().all(|l| l.holds(value(l.var))),
            Constraint::BoolOr(lits) => lits.iter().any(|l| l.holds(value(l.var))),
            Constraint::Product {
                target,
                left,
                right,
            } => value(*target) as i128 == operand(left) as i128 * operand(right) as i128,
            Constraint::Quotient {
                target,
                numerator,
                denominator,
            } => {
                let d = operand(denominator);
                d != 0 && value(*target) == operand(numerator) / d
            }
            Constraint::Element {
                target,
                index,
                table,
            } => {
                let i = value(*index);
                i >= 0 && (i as usize) < table.len() && table[i as usize] == value(*target)
            }
            Constraint::Abs { target, arg } => value(*target) as i128 == (operand(arg) as i128).abs(),
        }
    }
}

/// A constraint together with the literals that must all hold for it to apply
#[derive(Debug, Clone, PartialEq)]
pub struct Posted {
    pub constraint: Constraint,
    pub enforcement: Vec<Lit>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sense {
    Minimize,
    Maximize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Objective {
    pub expr: LinearExpr,
    pub sense: Sense,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct VarDef {
    pub domain: Domain,
    pub name: String,
}

/// Handle returned by [`Model::add`] to attach enforcement literals
pub struct Enforce<'a> {
    model: &'a mut Model,
    index: usize,
}

impl Enforce<'_> {
    /// Apply the constraint only when every literal holds
    pub fn only_enforce_if<I, L>(self, lits: I)
    where
        I: IntoIterator<Item = L>,
        L: Into<Lit>,
    {
        self.model.posted[self.index]
            .enforcement
            .extend(lits.into_iter().map(Into::into));
    }
}

/// A constraint model over integer variables
#[derive(Debug, Clone, Default)]
pub struct Model {
    vars: Vec<VarDef>,
    posted: Vec<Posted>,
    objective: Option<Objective>,
    decision_vars: Vec<IntVar>,
    constants: Vec<(i64, IntVar)>,
}

impl Model {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_var(&mut self, domain: Domain, name: impl Into<String>) -> IntVar {
        self.vars.push(VarDef {
            domain,
            name: name.into(),
        });
        IntVar(self.vars.len() - 1)
    }

    pub fn new_int_var(&mut self, lo: i64, hi: i64, name: impl Into<String>) -> IntVar {
        self.new_var(Domain::new(lo, hi), name)
    }

    pub fn new_bool_var(&mut self, name: impl Into<String>) -> BoolVar {
        BoolVar(self.new_var(Domain::BOOL, name))
    }

    /// A fixed variable, shared between callers asking for the same value
    pub fn new_constant(&mut self, value: i64) -> IntVar {
        if let Some(&(_, var)) = self.constants.iter().find(|(v, _)| *v == value) {
            return var;
        }
        let var = self.new_var(Domain::constant(value), format!("const_{}", value));
        self.constants.push((value, var));
        var
    }

    pub fn constant_bool(&mut self, value: bool) -> BoolVar {
        BoolVar(self.new_constant(value as i64))
    }

    pub fn true_lit(&mut self) -> Lit {
        self.constant_bool(true).lit()
    }

    pub fn num_vars(&self) -> usize {
        self.vars.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.posted.len()
    }

    pub fn domain(&self, var: IntVar) -> Domain {
        self.vars[var.0].domain
    }

    pub fn name(&self, var: IntVar) -> &str {
        &self.vars[var.0].name
    }

    pub fn posted(&self) -> &[Posted] {
        &self.posted
    }

    pub fn objective(&self) -> Option<&Objective> {
        self.objective.as_ref()
    }

    pub fn decision_vars(&self) -> &[IntVar] {
        &self.decision_vars
    }

    pub(crate) fn var_defs(&self) -> &[VarDef] {
        &self.vars
    }

    pub fn add(&mut self, constraint: Constraint) -> Enforce<'_> {
        self.posted.push(Posted {
            constraint,
            enforcement: Vec::new(),
        });
        let index = self.posted.len() - 1;
        Enforce { model: self, index }
    }

    /// `lhs cmp rhs` with both sides linear
    pub fn add_linear(
        &mut self,
        lhs: impl Into<LinearExpr>,
        cmp: Cmp,
        rhs: impl Into<LinearExpr>,
    ) -> Enforce<'_> {
        let diff = lhs.into() - rhs.into();
        let rhs = -diff.constant;
        let expr = LinearExpr {
            terms: diff.terms,
            constant: 0,
        };
        self.add(Constraint::Linear { expr, cmp, rhs })
    }

    pub fn add_equality(
        &mut self,
        lhs: impl Into<LinearExpr>,
        rhs: impl Into<LinearExpr>,
    ) -> Enforce<'_> {
        self.add_linear(lhs, Cmp::Eq, rhs)
    }

    pub fn add_allowed(&mut self, vars: Vec<IntVar>, tuples: Vec<Vec<i64>>) -> Enforce<'_> {
        self.add(Constraint::Table {
            vars,
            tuples,
            allowed: true,
        })
    }

    pub fn add_forbidden(&mut self, vars: Vec<IntVar>, tuples: Vec<Vec<i64>>) -> Enforce<'_> {
        self.add(Constraint::Table {
            vars,
            tuples,
            allowed: false,
        })
    }

    /// `var` takes one of `values`
    pub fn add_member(&mut self, var: IntVar, values: &[i64]) -> Enforce<'_> {
        self.add_allowed(vec![var], values.iter().map(|&v| vec![v]).collect())
    }

    /// `var` takes none of `values`
    pub fn add_not_member(&mut self, var: IntVar, values: &[i64]) -> Enforce<'_> {
        self.add_forbidden(vec![var], values.iter().map(|&v| vec![v]).collect())
    }

    pub fn add_bool_and<L: Into<Lit>>(&mut self, lits: impl IntoIterator<Item = L>) -> Enforce<'_> {
        self.add(Constraint::BoolAnd(lits.into_iter().map(Into::into).collect()))
    }

    pub fn add_bool_or<L: Into<Lit>>(&mut self, lits: impl IntoIterator<Item = L>) -> Enforce<'_> {
        self.add(Constraint::BoolOr(lits.into_iter().map(Into::into).collect()))
    }

    /// `a => b`
    pub fn add_implication(&mut self, a: impl Into<Lit>, b: impl Into<Lit>) {
        let a: Lit = a.into();
        let b: Lit = b.into();
        self.add_bool_and([b]).only_enforce_if([a]);
    }

    pub fn add_product(
        &mut self,
        target: IntVar,
        left: impl Into<Operand>,
        right: impl Into<Operand>,
    ) -> Enforce<'_> {
        self.add(Constraint::Product {
            target,
            left: left.into(),
            right: right.into(),
        })
    }

    pub fn add_quotient(
        &mut self,
        target: IntVar,
        numerator: impl Into<Operand>,
        denominator: impl Into<Operand>,
    ) -> Enforce<'_> {
        self.add(Constraint::Quotient {
            target,
            numerator: numerator.into(),
            denominator: denominator.into(),
        })
    }

    pub fn add_element(&mut self, target: IntVar, index: IntVar, table: Vec<i64>) -> Enforce<'_> {
        self.add(Constraint::Element {
            target,
            index,
            table,
        })
    }

    pub fn add_abs(&mut self, target: IntVar, arg: impl Into<Operand>) -> Enforce<'_> {
        self.add(Constraint::Abs {
            target,
            arg: arg.into(),
        })
    }

    /// Boolean equivalent to `lhs cmp rhs`
    pub fn reify(
        &mut self,
        lhs: impl Into<LinearExpr>,
        cmp: Cmp,
        rhs: impl Into<LinearExpr>,
        name: impl Into<String>,
    ) -> BoolVar {
        let b = self.new_bool_var(name);
        let lhs = lhs.into();
        let rhs = rhs.into();
        self.add_linear(lhs.clone(), cmp, rhs.clone())
            .only_enforce_if([b]);
        self.add_linear(lhs, cmp.negate(), rhs).only_enforce_if([!b]);
        b
    }

    /// Boolean equivalent to `var ∈ values`
    pub fn reify_in(&mut self, var: IntVar, values: &[i64], name: impl Into<String>) -> BoolVar {
        if values.is_empty() {
            return self.constant_bool(false);
        }
        let b = self.new_bool_var(name);
        self.add_member(var, values).only_enforce_if([b]);
        self.add_not_member(var, values).only_enforce_if([!b]);
        b
    }

    /// Boolean equivalent to the conjunction of `lits`
    pub fn reify_all(&mut self, lits: &[Lit], name: impl Into<String>) -> BoolVar {
        let b = self.new_bool_var(name);
        self.add_bool_and(lits.iter().copied()).only_enforce_if([b]);
        self.add_bool_or(lits.iter().map(|&l| !l)).only_enforce_if([!b]);
        b
    }

    /// Boolean equivalent to the disjunction of `lits`
    pub fn reify_any(&mut self, lits: &[Lit], name: impl Into<String>) -> BoolVar {
        let b = self.new_bool_var(name);
        self.add_bool_or(lits.iter().copied()).only_enforce_if([b]);
        self.add_bool_and(lits.iter().map(|&l| !l)).only_enforce_if([!b]);
        b
    }

    /// `target == min(a, b)`
    pub fn add_min_equality(&mut self, target: IntVar, a: IntVar, b: IntVar) {
        self.add_linear(target, Cmp::Le, a);
        self.add_linear(target, Cmp::Le, b);
        let a_smaller = self.reify(a, Cmp::Le, b, "min_picks_first");
        self.add_equality(target, a).only_enforce_if([a_smaller]);
        self.add_equality(target, b).only_enforce_if([!a_smaller]);
    }

    /// Branch on `vars` first, in the given order
    pub fn add_decision_strategy(&mut self, vars: impl IntoIterator<Item = IntVar>) {
        self.decision_vars.extend(vars);
    }

    pub fn minimize(&mut self, expr: impl Into<LinearExpr>) {
        self.objective = Some(Objective {
            expr: expr.into(),
            sense: Sense::Minimize,
        });
    }

    pub fn maximize(&mut self, expr: impl Into<LinearExpr>) {
        self.objective = Some(Objective {
            expr: expr.into(),
            sense: Sense::Maximize,
        });
    }
}
