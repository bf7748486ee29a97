//! Variable bounds with an undo trail for depth-first search

use crate::solver::model::{Domain, IntVar, Lit, Operand};

/// Raised when a bound update empties a domain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Conflict;

#[derive(Debug, Clone, Copy)]
struct TrailEntry {
    var: usize,
    old_lo: i64,
    old_hi: i64,
}

/// Current bounds of every variable
///
/// Every change is recorded so that [`DomainStore::pop_frame`] restores the
/// bounds in effect at the matching [`DomainStore::push_frame`].
#[derive(Debug, Clone)]
pub(crate) struct DomainStore {
    lo: Vec<i64>,
    hi: Vec<i64>,
    entries: Vec<TrailEntry>,
    frames: Vec<usize>,
    changed: Vec<usize>,
}

impl DomainStore {
    pub fn new(domains: impl IntoIterator<Item = Domain>) -> Self {
        let (lo, hi) = domains.into_iter().map(|d| (d.lo, d.hi)).unzip();
        Self {
            lo,
            hi,
            entries: Vec::new(),
            frames: Vec::new(),
            changed: Vec::new(),
        }
    }

    #[inline]
    pub fn lo(&self, var: IntVar) -> i64 {
        self.lo[var.0]
    }

    #[inline]
    pub fn hi(&self, var: IntVar) -> i64 {
        self.hi[var.0]
    }

    #[inline]
    pub fn is_fixed(&self, var: IntVar) -> bool {
        self.lo[var.0] == self.hi[var.0]
    }

    pub fn value(&self, var: IntVar) -> Option<i64> {
        self.is_fixed(var).then(|| self.lo[var.0])
    }

    /// Width of the domain minus one
    pub fn spread(&self, var: IntVar) -> i128 {
        self.hi[var.0] as i128 - self.lo[var.0] as i128
    }

    pub fn bounds(&self, op: &Operand) -> (i64, i64) {
        match *op {
            Operand::Var(v) => (self.lo(v), self.hi(v)),
            Operand::Const(c) => (c, c),
        }
    }

    pub fn lit_value(&self, lit: Lit) -> Option<bool> {
        self.value(lit.var).map(|v| lit.holds(v))
    }

    pub fn num_vars(&self) -> usize {
        self.lo.len()
    }

    pub fn set_lo(&mut self, var: IntVar, value: i64) -> Result<bool, Conflict> {
        let i = var.0;
        if value <= self.lo[i] {
            return Ok(false);
        }
        if value > self.hi[i] {
            return Err(Conflict);
        }
        self.record(i);
        self.lo[i] = value;
        Ok(true)
    }

    pub fn set_hi(&mut self, var: IntVar, value: i64) -> Result<bool, Conflict> {
        let i = var.0;
        if value >= self.hi[i] {
            return Ok(false);
        }
        if value < self.lo[i] {
            return Err(Conflict);
        }
        self.record(i);
        self.hi[i] = value;
        Ok(true)
    }

    pub fn fix(&mut self, var: IntVar, value: i64) -> Result<bool, Conflict> {
        let a = self.set_lo(var, value)?;
        let b = self.set_hi(var, value)?;
        Ok(a || b)
    }

    /// Narrow to `[lo, hi]` given in wide arithmetic
    pub fn narrow(&mut self, var: IntVar, lo: i128, hi: i128) -> Result<bool, Conflict> {
        if lo > hi {
            return Err(Conflict);
        }
        let a = self.set_lo(var, clamp(lo))?;
        let b = self.set_hi(var, clamp(hi))?;
        Ok(a || b)
    }

    pub fn set_lit(&mut self, lit: Lit, value: bool) -> Result<bool, Conflict> {
        let target = if value != lit.negated { 1 } else { 0 };
        self.fix(lit.var, target)
    }

    fn record(&mut self, i: usize) {
        self.entries.push(TrailEntry {
            var: i,
            old_lo: self.lo[i],
            old_hi: self.hi[i],
        });
        self.changed.push(i);
    }

    pub fn push_frame(&mut self) {
        self.frames.push(self.entries.len());
    }

    pub fn pop_frame(&mut self) {
        let Some(start) = self.frames.pop() else {
            return;
        };
        while self.entries.len() > start {
            if let Some(entry) = self.entries.pop() {
                self.lo[entry.var] = entry.old_lo;
                self.hi[entry.var] = entry.old_hi;
            }
        }
        self.changed.clear();
    }

    /// Move the indices of variables changed since the last call into `out`
    pub fn take_changed(&mut self, out: &mut Vec<usize>) {
        out.append(&mut self.changed);
    }

    pub fn clear_changed(&mut self) {
        self.changed.clear();
    }

    /// Lower bounds of every variable, the assignment once all are fixed
    pub fn snapshot(&self) -> Vec<i64> {
        self.lo.clone()
    }
}

/// Saturate a wide value into `i64`
pub(crate) fn clamp(value: i128) -> i64 {
    value.clamp(i64::MIN as i128, i64::MAX as i128) as i64
}
