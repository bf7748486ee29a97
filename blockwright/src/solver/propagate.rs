//! Bounds propagators for the primitive constraints
//!
//! Each primitive has a propagator that narrows bounds when the constraint
//! is enforced, and a disentailment test used for half-reification: when
//! every enforcement literal but one is true and the constraint can no
//! longer hold, the remaining literal is forced false. Propagators must
//! report a conflict whenever all of their variables are fixed to an
//! assignment that violates the constraint.

use crate::solver::model::{Cmp, Constraint, IntVar, LinearExpr, Lit, Operand, Posted};
use crate::solver::trail::{Conflict, DomainStore};
use std::collections::{HashSet, VecDeque};

type Propagation = Result<(), Conflict>;

/// Upper bound on the minimized form of the objective
#[derive(Debug, Clone)]
pub(crate) struct ObjectiveBound {
    pub expr: LinearExpr,
    pub rhs: Option<i64>,
}

pub(crate) struct Propagator<'m> {
    posted: &'m [Posted],
    watchers: Vec<Vec<usize>>,
    pub objective: Option<ObjectiveBound>,
    budget: usize,
    queue: VecDeque<usize>,
    queued: Vec<bool>,
    changed: Vec<usize>,
    pub runs: u64,
}

impl<'m> Propagator<'m> {
    pub fn new(
        posted: &'m [Posted],
        num_vars: usize,
        objective: Option<ObjectiveBound>,
        budget: usize,
    ) -> Self {
        let mut watchers = vec![Vec::new(); num_vars];
        for (i, p) in posted.iter().enumerate() {
            let mut vars = p.constraint.vars();
            vars.extend(p.enforcement.iter().map(|l| l.var()));
            vars.sort_unstable();
            vars.dedup();
            for v in vars {
                watchers[v.index()].push(i);
            }
        }
        if let Some(bound) = &objective {
            let objective_index = posted.len();
            let mut vars: Vec<IntVar> = bound.expr.terms().iter().map(|&(v, _)| v).collect();
            vars.sort_unstable();
            vars.dedup();
            for v in vars {
                watchers[v.index()].push(objective_index);
            }
        }
        Self {
            posted,
            watchers,
            objective,
            budget,
            queue: VecDeque::new(),
            queued: vec![false; posted.len() + 1],
            changed: Vec::new(),
            runs: 0,
        }
    }

    /// Propagate every constraint to a fixpoint
    pub fn propagate_all(&mut self, store: &mut DomainStore) -> Propagation {
        for i in 0..=self.posted.len() {
            self.enqueue(i);
        }
        self.fixpoint(store)
    }

    /// Propagate the consequences of the bound changes recorded in `store`
    pub fn propagate(&mut self, store: &mut DomainStore) -> Propagation {
        self.enqueue(self.posted.len());
        self.fixpoint(store)
    }

    fn enqueue(&mut self, i: usize) {
        if !self.queued[i] {
            self.queued[i] = true;
            self.queue.push_back(i);
        }
    }

    fn fixpoint(&mut self, store: &mut DomainStore) -> Propagation {
        self.schedule_changed(store);
        let mut runs = 0;
        while let Some(i) = self.queue.pop_front() {
            self.queued[i] = false;
            runs += 1;
            if runs > self.budget {
                self.reset_queue();
                store.clear_changed();
                return Ok(());
            }
            if let Err(conflict) = self.run(i, store) {
                self.reset_queue();
                store.clear_changed();
                self.runs += runs as u64;
                return Err(conflict);
            }
            self.schedule_changed(store);
        }
        self.runs += runs as u64;
        Ok(())
    }

    fn schedule_changed(&mut self, store: &mut DomainStore) {
        store.take_changed(&mut self.changed);
        let changed = std::mem::take(&mut self.changed);
        for &v in &changed {
            for k in 0..self.watchers[v].len() {
                let w = self.watchers[v][k];
                self.enqueue(w);
            }
        }
        self.changed = changed;
        self.changed.clear();
    }

    fn reset_queue(&mut self) {
        while let Some(i) = self.queue.pop_front() {
            self.queued[i] = false;
        }
    }

    fn run(&self, i: usize, store: &mut DomainStore) -> Propagation {
        if i == self.posted.len() {
            return match &self.objective {
                Some(ObjectiveBound {
                    expr,
                    rhs: Some(rhs),
                }) => linear(expr, Cmp::Le, *rhs, store),
                _ => Ok(()),
            };
        }
        let posted = &self.posted[i];
        let mut pending: Option<Lit> = None;
        let mut unfixed = 0;
        for &lit in &posted.enforcement {
            match store.lit_value(lit) {
                Some(false) => return Ok(()),
                Some(true) => {}
                None => {
                    unfixed += 1;
                    pending = Some(lit);
                }
            }
        }
        match (unfixed, pending) {
            (0, _) => propagate(&posted.constraint, store),
            (1, Some(lit)) if disentailed(&posted.constraint, store) => {
                store.set_lit(lit, false).map(|_| ())
            }
            _ => Ok(()),
        }
    }
}

/// Narrow bounds so that `constraint` can still hold
pub(crate) fn propagate(constraint: &Constraint, store: &mut DomainStore) -> Propagation {
    match constraint {
        Constraint::Linear { expr, cmp, rhs } => linear(expr, *cmp, *rhs, store),
        Constraint::Table {
            vars,
            tuples,
            allowed: true,
        } => table_allowed(vars, tuples, store),
        Constraint::Table { vars, tuples, .. } => table_forbidden(vars, tuples, store),
        Constraint::BoolAnd(lits) => {
            for &lit in lits {
                store.set_lit(lit, true)?;
            }
            Ok(())
        }
        Constraint::BoolOr(lits) => bool_or(lits, store),
        Constraint::Product {
            target,
            left,
            right,
        } => {
            let (lo, hi) = product_range(store.bounds(left), store.bounds(right));
            store.narrow(*target, lo, hi)?;
            for (known, other) in [(left, right), (right, left)] {
                let Operand::Var(other) = *other else {
                    continue;
                };
                let (tl, th) = (store.lo(*target), store.hi(*target));
                if tl > 0 || th < 0 {
                    if store.lo(other) == 0 {
                        store.set_lo(other, 1)?;
                    }
                    if store.hi(other) == 0 {
                        store.set_hi(other, -1)?;
                    }
                }
                let (kl, kh) = store.bounds(known);
                if kl == kh && kl != 0 {
                    let (k, tl, th) = (kl as i128, tl as i128, th as i128);
                    let (lo, hi) = if k > 0 {
                        (ceil_div(tl, k), floor_div(th, k))
                    } else {
                        (ceil_div(th, k), floor_div(tl, k))
                    };
                    store.narrow(other, lo, hi)?;
                }
            }
            let (lo, hi) = product_range(store.bounds(left), store.bounds(right));
            store.narrow(*target, lo, hi).map(|_| ())
        }
        Constraint::Quotient {
            target,
            numerator,
            denominator,
        } => {
            if let Operand::Var(d) = *denominator {
                if store.lo(d) == 0 {
                    store.set_lo(d, 1)?;
                }
                if store.hi(d) == 0 {
                    store.set_hi(d, -1)?;
                }
            }
            let (lo, hi) = quotient_range(store.bounds(numerator), store.bounds(denominator))
                .ok_or(Conflict)?;
            store.narrow(*target, lo, hi)?;
            quotient_operands(*target, numerator, denominator, store)
        }
        Constraint::Element {
            target,
            index,
            table,
        } => element(*target, *index, table, store),
        Constraint::Abs { target, arg } => {
            let (al, ah) = store.bounds(arg);
            let (lo, hi) = abs_range(al, ah);
            store.narrow(*target, lo, hi)?;
            if let Operand::Var(a) = *arg {
                let th = store.hi(*target) as i128;
                store.narrow(a, -th, th)?;
            }
            Ok(())
        }
    }
}

/// True only when `constraint` cannot hold within the current bounds
pub(crate) fn disentailed(constraint: &Constraint, store: &DomainStore) -> bool {
    match constraint {
        Constraint::Linear { expr, cmp, rhs } => {
            let (min, max) = activity(expr, store);
            let rhs = *rhs as i128;
            match cmp {
                Cmp::Le => min > rhs,
                Cmp::Lt => min >= rhs,
                Cmp::Ge => max < rhs,
                Cmp::Gt => max <= rhs,
                Cmp::Eq => min > rhs || max < rhs,
                Cmp::Ne => min == max && min == rhs,
            }
        }
        Constraint::Table {
            vars,
            tuples,
            allowed: true,
        } => !tuples.iter().any(|t| compatible(vars, t, store)),
        Constraint::Table { vars, tuples, .. } => {
            let unfixed: Vec<usize> = (0..vars.len())
                .filter(|&i| !store.is_fixed(vars[i]))
                .collect();
            match unfixed.as_slice() {
                [] => tuples.iter().any(|t| compatible(vars, t, store)),
                [p] => {
                    let forbidden = forbidden_values(vars, tuples, *p, store);
                    let var = vars[*p];
                    store.spread(var) < forbidden.len() as i128
                        && (store.lo(var)..=store.hi(var)).all(|v| forbidden.contains(&v))
                }
                _ => false,
            }
        }
        Constraint::BoolAnd(lits) => lits.iter().any(|&l| store.lit_value(l) == Some(false)),
        Constraint::BoolOr(lits) => lits.iter().all(|&l| store.lit_value(l) == Some(false)),
        Constraint::Product {
            target,
            left,
            right,
        } => {
            let (lo, hi) = product_range(store.bounds(left), store.bounds(right));
            disjoint(lo, hi, store.lo(*target), store.hi(*target))
        }
        Constraint::Quotient {
            target,
            numerator,
            denominator,
        } => match quotient_range(store.bounds(numerator), store.bounds(denominator)) {
            Some((lo, hi)) => disjoint(lo, hi, store.lo(*target), store.hi(*target)),
            None => true,
        },
        Constraint::Element {
            target,
            index,
            table,
        } => {
            let (tl, th) = (store.lo(*target), store.hi(*target));
            !index_range(*index, table.len(), store)
                .any(|i| (tl..=th).contains(&table[i]))
        }
        Constraint::Abs { target, arg } => {
            let (al, ah) = store.bounds(arg);
            let (lo, hi) = abs_range(al, ah);
            disjoint(lo, hi, store.lo(*target), store.hi(*target))
        }
    }
}

fn disjoint(lo: i128, hi: i128, other_lo: i64, other_hi: i64) -> bool {
    hi < other_lo as i128 || lo > other_hi as i128
}

fn activity(expr: &LinearExpr, store: &DomainStore) -> (i128, i128) {
    let mut min = expr.constant_term() as i128;
    let mut max = min;
    for &(v, c) in expr.terms() {
        let c = c as i128;
        let (lo, hi) = (store.lo(v) as i128, store.hi(v) as i128);
        if c > 0 {
            min += c * lo;
            max += c * hi;
        } else {
            min += c * hi;
            max += c * lo;
        }
    }
    (min, max)
}

fn linear(expr: &LinearExpr, cmp: Cmp, rhs: i64, store: &mut DomainStore) -> Propagation {
    let terms = expr.terms();
    let rhs = rhs as i128 - expr.constant_term() as i128;
    match cmp {
        Cmp::Le => linear_le(terms, rhs, 1, store),
        Cmp::Lt => linear_le(terms, rhs - 1, 1, store),
        Cmp::Ge => linear_le(terms, -rhs, -1, store),
        Cmp::Gt => linear_le(terms, -(rhs + 1), -1, store),
        Cmp::Eq => {
            linear_le(terms, rhs, 1, store)?;
            linear_le(terms, -rhs, -1, store)
        }
        Cmp::Ne => linear_ne(terms, rhs, store),
    }
}

/// `Σ sign·c·x <= rhs`
fn linear_le(terms: &[(IntVar, i64)], rhs: i128, sign: i128, store: &mut DomainStore) -> Propagation {
    let own_min = |c: i128, v: IntVar, store: &DomainStore| {
        if c > 0 {
            c * store.lo(v) as i128
        } else {
            c * store.hi(v) as i128
        }
    };
    let min_activity: i128 = terms
        .iter()
        .map(|&(v, c)| own_min(sign * c as i128, v, store))
        .sum();
    if min_activity > rhs {
        return Err(Conflict);
    }
    for &(v, c) in terms {
        let c = sign * c as i128;
        let slack = rhs - (min_activity - own_min(c, v, store));
        if c > 0 {
            let bound = floor_div(slack, c);
            if bound < store.hi(v) as i128 {
                store.narrow(v, store.lo(v) as i128, bound)?;
            }
        } else {
            let bound = ceil_div(slack, c);
            if bound > store.lo(v) as i128 {
                store.narrow(v, bound, store.hi(v) as i128)?;
            }
        }
    }
    Ok(())
}

fn linear_ne(terms: &[(IntVar, i64)], rhs: i128, store: &mut DomainStore) -> Propagation {
    let mut fixed_sum = 0i128;
    let mut open: Option<(IntVar, i128)> = None;
    let mut open_count = 0;
    for &(v, c) in terms {
        match store.value(v) {
            Some(x) => fixed_sum += c as i128 * x as i128,
            None => {
                open_count += 1;
                open = Some((v, c as i128));
            }
        }
    }
    match (open_count, open) {
        (0, _) if fixed_sum == rhs => Err(Conflict),
        (1, Some((v, c))) => {
            let rest = rhs - fixed_sum;
            if rest % c == 0 {
                let x = rest / c;
                if x == store.lo(v) as i128 {
                    store.narrow(v, x + 1, store.hi(v) as i128)?;
                } else if x == store.hi(v) as i128 {
                    store.narrow(v, store.lo(v) as i128, x - 1)?;
                }
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

fn compatible(vars: &[IntVar], tuple: &[i64], store: &DomainStore) -> bool {
    tuple.len() == vars.len()
        && vars
            .iter()
            .zip(tuple)
            .all(|(&v, &x)| store.lo(v) <= x && x <= store.hi(v))
}

fn table_allowed(vars: &[IntVar], tuples: &[Vec<i64>], store: &mut DomainStore) -> Propagation {
    let mut lo = vec![i64::MAX; vars.len()];
    let mut hi = vec![i64::MIN; vars.len()];
    let mut any = false;
    for tuple in tuples.iter().filter(|t| compatible(vars, t, store)) {
        any = true;
        for (k, &x) in tuple.iter().enumerate() {
            lo[k] = lo[k].min(x);
            hi[k] = hi[k].max(x);
        }
    }
    if !any {
        return Err(Conflict);
    }
    for (k, &v) in vars.iter().enumerate() {
        store.narrow(v, lo[k] as i128, hi[k] as i128)?;
    }
    Ok(())
}

/// Values of `vars[position]` completing a forbidden tuple given the other fixed vars
fn forbidden_values(
    vars: &[IntVar],
    tuples: &[Vec<i64>],
    position: usize,
    store: &DomainStore,
) -> HashSet<i64> {
    tuples
        .iter()
        .filter(|t| {
            t.len() == vars.len()
                && vars
                    .iter()
                    .zip(t.iter())
                    .enumerate()
                    .all(|(k, (&v, &x))| k == position || store.value(v) == Some(x))
        })
        .map(|t| t[position])
        .collect()
}

fn table_forbidden(vars: &[IntVar], tuples: &[Vec<i64>], store: &mut DomainStore) -> Propagation {
    let unfixed: Vec<usize> = (0..vars.len())
        .filter(|&i| !store.is_fixed(vars[i]))
        .collect();
    match unfixed.as_slice() {
        [] => {
            if tuples.iter().any(|t| compatible(vars, t, store)) {
                Err(Conflict)
            } else {
                Ok(())
            }
        }
        [p] => {
            let forbidden = forbidden_values(vars, tuples, *p, store);
            let var = vars[*p];
            let mut lo = store.lo(var);
            let mut hi = store.hi(var);
            while lo <= hi && forbidden.contains(&lo) {
                lo += 1;
            }
            while hi >= lo && forbidden.contains(&hi) {
                hi -= 1;
            }
            store.narrow(var, lo as i128, hi as i128).map(|_| ())
        }
        _ => Ok(()),
    }
}

fn bool_or(lits: &[Lit], store: &mut DomainStore) -> Propagation {
    let mut open = None;
    let mut open_count = 0;
    for &lit in lits {
        match store.lit_value(lit) {
            Some(true) => return Ok(()),
            Some(false) => {}
            None => {
                open_count += 1;
                open = Some(lit);
            }
        }
    }
    match (open_count, open) {
        (0, _) => Err(Conflict),
        (1, Some(lit)) => store.set_lit(lit, true).map(|_| ()),
        _ => Ok(()),
    }
}

fn product_range((al, ah): (i64, i64), (bl, bh): (i64, i64)) -> (i128, i128) {
    let corners = [
        al as i128 * bl as i128,
        al as i128 * bh as i128,
        ah as i128 * bl as i128,
        ah as i128 * bh as i128,
    ];
    let lo = corners.iter().copied().min().unwrap_or(0);
    let hi = corners.iter().copied().max().unwrap_or(0);
    (lo, hi)
}

/// Range of `n / d` rounding toward zero; `None` when `d` can only be zero
fn quotient_range((nl, nh): (i64, i64), (dl, dh): (i64, i64)) -> Option<(i128, i128)> {
    let mut pieces = Vec::with_capacity(2);
    if dl <= -1 {
        pieces.push((dl, dh.min(-1)));
    }
    if dh >= 1 {
        pieces.push((dl.max(1), dh));
    }
    let mut lo: Option<i128> = None;
    let mut hi: Option<i128> = None;
    for (pl, ph) in pieces {
        for n in [nl as i128, nh as i128] {
            for d in [pl as i128, ph as i128] {
                let q = n / d;
                lo = Some(lo.map_or(q, |x| x.min(q)));
                hi = Some(hi.map_or(q, |x| x.max(q)));
            }
        }
    }
    lo.zip(hi)
}

/// `Some(1)` for a non-negative range, `Some(-1)` for a non-positive one
fn sign_of(lo: i64, hi: i64) -> Option<i128> {
    if lo >= 0 {
        Some(1)
    } else if hi <= 0 {
        Some(-1)
    } else {
        None
    }
}

/// `[lo, hi]` multiplied by `sign`
fn mirror((lo, hi): (i64, i64), sign: i128) -> (i128, i128) {
    if sign > 0 {
        (lo as i128, hi as i128)
    } else {
        (-(hi as i128), -(lo as i128))
    }
}

fn narrow_mirrored(op: &Operand, (lo, hi): (i128, i128), sign: i128, store: &mut DomainStore) -> Propagation {
    let (lo, hi) = if sign > 0 { (lo, hi) } else { (-hi, -lo) };
    match *op {
        Operand::Var(v) => store.narrow(v, lo, hi).map(|_| ()),
        Operand::Const(c) if (lo..=hi).contains(&(c as i128)) => Ok(()),
        Operand::Const(_) => Err(Conflict),
    }
}

/// Narrow dividend and divisor of `target = n / d` once both signs are known
///
/// With `n' = |n|`, `d' = |d|` and `t' = n' / d' >= 0`:
/// `t'·d' <= n' <= t'·d' + d' - 1`, so `n'` and `d'` are bounded by the
/// range of `t'`.
fn quotient_operands(
    target: IntVar,
    numerator: &Operand,
    denominator: &Operand,
    store: &mut DomainStore,
) -> Propagation {
    let (nl, nh) = store.bounds(numerator);
    let (dl, dh) = store.bounds(denominator);
    let (Some(n_sign), Some(d_sign)) = (sign_of(nl, nh), sign_of(dl, dh)) else {
        return Ok(());
    };
    if dl == 0 || dh == 0 {
        return Ok(());
    }
    let (a, b) = mirror((nl, nh), n_sign);
    let (c, e) = mirror((dl, dh), d_sign);
    let (p, q) = mirror((store.lo(target), store.hi(target)), n_sign * d_sign);
    let p = p.max(0);
    if q < p {
        return Err(Conflict);
    }

    let dividend = (a.max(p * c), b.min((q + 1) * e - 1));
    narrow_mirrored(numerator, dividend, n_sign, store)?;

    let divisor_lo = c.max(a / (q + 1) + 1);
    let divisor_hi = if p >= 1 { e.min(b / p) } else { e };
    narrow_mirrored(denominator, (divisor_lo, divisor_hi), d_sign, store)
}

fn abs_range(al: i64, ah: i64) -> (i128, i128) {
    let (al, ah) = (al as i128, ah as i128);
    if al >= 0 {
        (al, ah)
    } else if ah <= 0 {
        (-ah, -al)
    } else {
        (0, (-al).max(ah))
    }
}

fn index_range(index: IntVar, len: usize, store: &DomainStore) -> std::ops::Range<usize> {
    if len == 0 {
        return 0..0;
    }
    let lo = store.lo(index).max(0);
    let hi = store.hi(index).min(len as i64 - 1);
    if lo > hi {
        0..0
    } else {
        lo as usize..hi as usize + 1
    }
}

fn element(target: IntVar, index: IntVar, table: &[i64], store: &mut DomainStore) -> Propagation {
    let range = index_range(index, table.len(), store);
    if range.is_empty() {
        return Err(Conflict);
    }
    let (tl, th) = (store.lo(target), store.hi(target));
    let supported: Vec<usize> = range.filter(|&i| (tl..=th).contains(&table[i])).collect();
    let (Some(&first), Some(&last)) = (supported.first(), supported.last()) else {
        return Err(Conflict);
    };
    store.narrow(index, first as i128, last as i128)?;
    let lo = supported.iter().map(|&i| table[i]).min().unwrap_or(tl);
    let hi = supported.iter().map(|&i| table[i]).max().unwrap_or(th);
    store.narrow(target, lo as i128, hi as i128).map(|_| ())
}

fn floor_div(a: i128, b: i128) -> i128 {
    let q = a / b;
    if a % b != 0 && ((a < 0) != (b < 0)) {
        q - 1
    } else {
        q
    }
}

fn ceil_div(a: i128, b: i128) -> i128 {
    let q = a / b;
    if a % b != 0 && ((a < 0) == (b < 0)) {
        q + 1
    } else {
        q
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::model::Domain;

    #[test]
    fn rounding_division_helpers() {
        assert_eq!(floor_div(7, 2), 3);
        assert_eq!(floor_div(-7, 2), -4);
        assert_eq!(ceil_div(7, 2), 4);
        assert_eq!(ceil_div(-7, 2), -3);
        assert_eq!(ceil_div(7, -2), -3);
    }

    #[test]
    fn quotient_bounds_its_operands() {
        let store_of = |domains: &[(i64, i64)]| {
            DomainStore::new(domains.iter().map(|&(lo, hi)| Domain::new(lo, hi)))
        };
        let quotient = |t: usize, n: usize, d: usize| Constraint::Quotient {
            target: IntVar(t),
            numerator: Operand::Var(IntVar(n)),
            denominator: Operand::Var(IntVar(d)),
        };

        // 25_000_000 / d == 1000 leaves d in [24_976, 25_000]
        let mut store = store_of(&[(1000, 1000), (25_000_000, 25_000_000), (1, 1 << 47)]);
        propagate(&quotient(0, 1, 2), &mut store).unwrap();
        assert_eq!((store.lo(IntVar(2)), store.hi(IntVar(2))), (24_976, 25_000));

        // n / 7 == -3 leaves n in [-27, -21]
        let mut store = store_of(&[(-3, -3), (-1000, 0), (7, 7)]);
        propagate(&quotient(0, 1, 2), &mut store).unwrap();
        assert_eq!((store.lo(IntVar(1)), store.hi(IntVar(1))), (-27, -21));

        // a zero divisor is never a support
        let mut store = store_of(&[(-10, 10), (5, 5), (0, 3)]);
        propagate(&quotient(0, 1, 2), &mut store).unwrap();
        assert_eq!(store.lo(IntVar(2)), 1);
    }

    #[test]
    fn product_with_a_fixed_factor_bounds_the_other() {
        let mut store = DomainStore::new([
            Domain::new(10, 25),
            Domain::new(-100, 100),
            Domain::constant(-4),
        ]);
        let product = Constraint::Product {
            target: IntVar(0),
            left: Operand::Var(IntVar(1)),
            right: Operand::Var(IntVar(2)),
        };
        propagate(&product, &mut store).unwrap();
        assert_eq!((store.lo(IntVar(1)), store.hi(IntVar(1))), (-6, -3));
        assert_eq!((store.lo(IntVar(0)), store.hi(IntVar(0))), (12, 24));
    }

    #[test]
    fn quotient_range_skips_zero_divisor() {
        assert_eq!(quotient_range((10, 10), (0, 0)), None);
        assert_eq!(quotient_range((10, 10), (-5, 5)), Some((-10, 10)));
        assert_eq!(quotient_range((10, 20), (2, 5)), Some((2, 10)));
    }
}
