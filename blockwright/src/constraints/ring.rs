//! Synchrotron geometry
//!
//! The ring is described per side in a local frame: `t` runs along the
//! side, `u` goes inward from the outer shell (`0..5`) and `y` is the
//! height. Each side's straight sections `t = 4..n-4` hold cavities,
//! dipoles or quadrupoles around the beam at `(u, y) = (2, 2)`. The four
//! `3 x 3` corner blocks hold a fixed dipole wrapped in yokes.

use super::{restrict, restrict_iff};
use crate::catalog::Catalog;
use crate::component::Component;
use crate::grid::Grid;
use crate::metrics::{check_ring, ring_slots, Metric, Particle};
use crate::solver::{BoolVar, Cmp, Domain, IntVar, LinearExpr, Lit, Model};
use crate::DesignResult;

#[derive(Debug, Clone, Copy)]
enum Side {
    North,
    South,
    West,
    East,
}

const SIDES: [Side; 4] = [Side::North, Side::South, Side::West, Side::East];

/// Cells around the beam within a cross-section
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

/// Magnet cells above and below the beam
const CENTERS: [(usize, usize); 2] = [(2, 3), (2, 1)];

/// Magnet cells beside the beam, used by quadrupoles only
const FLANKS: [(usize, usize); 2] = [(1, 2), (3, 2)];

const CORNERS: [(usize, usize); 4] = [(1, 1), (1, 3), (3, 1), (3, 3)];

/// Yokes of a dipole section
const DIPOLE_YOKES: [(usize, usize); 6] = [(1, 1), (1, 2), (1, 3), (3, 1), (3, 2), (3, 3)];

#[derive(Debug, Clone, Copy)]
struct Ring {
    n: usize,
}

impl Ring {
    fn of(shape: &[usize], what: &'static str) -> DesignResult<Self> {
        check_ring(shape, what)?;
        Ok(Ring { n: shape[0] })
    }

    fn cell(self, side: Side, t: usize, (u, y): (usize, usize)) -> [usize; 3] {
        let n = self.n;
        match side {
            Side::North => [u, t, y],
            Side::South => [n - 1 - u, t, y],
            Side::West => [t, u, y],
            Side::East => [t, n - 1 - u, y],
        }
    }

    fn straight(self) -> std::ops::Range<usize> {
        4..self.n - 4
    }

    /// Every position along a side that can hold a magnet, corners included
    fn magnet_positions(self) -> std::ops::RangeInclusive<usize> {
        2..=self.n - 3
    }

    fn in_box(self, x: usize, z: usize, inset: usize) -> bool {
        let hi = self.n - 1 - inset;
        (inset..=hi).contains(&x) && (inset..=hi).contains(&z)
    }

    fn is_core(self, x: usize, z: usize) -> bool {
        self.in_box(x, z, 5)
    }

    fn is_casing(self, x: usize, z: usize, y: usize) -> bool {
        if y == 0 || y == 4 {
            !self.is_core(x, z)
        } else if self.is_core(x, z) {
            false
        } else if self.in_box(x, z, 4) {
            true
        } else {
            !self.in_box(x, z, 1)
        }
    }

    fn is_beam(self, x: usize, z: usize, y: usize) -> bool {
        y == 2 && self.in_box(x, z, 2) && !self.in_box(x, z, 3)
    }

    fn corner_centers(self) -> [[usize; 2]; 4] {
        let far = self.n - 3;
        [[2, 2], [2, far], [far, 2], [far, far]]
    }

    /// Cells of the corner blocks that must be yokes
    fn corner_yokes(self) -> Vec<[usize; 3]> {
        let mut yokes = Vec::new();
        for [cx, cz] in self.corner_centers() {
            for x in cx - 1..=cx + 1 {
                for z in cz - 1..=cz + 1 {
                    for y in 1..=3 {
                        if (x, z) == (cx, cz) || self.is_beam(x, z, y) {
                            continue;
                        }
                        yokes.push([x, z, y]);
                    }
                }
            }
        }
        yokes
    }

    fn cells<'a>(
        self,
        grid: &'a Grid<Component>,
        side: Side,
        t: usize,
        at: &[(usize, usize)],
    ) -> DesignResult<Vec<&'a Component>> {
        at.iter().map(|&p| grid.get(&self.cell(side, t, p))).collect()
    }

    fn vars(
        self,
        cells: &Grid<IntVar>,
        side: Side,
        t: usize,
        at: &[(usize, usize)],
    ) -> DesignResult<Vec<IntVar>> {
        at.iter()
            .map(|&p| cells.get(&self.cell(side, t, p)).copied())
            .collect()
    }
}

fn count_of(parts: &[&Component], type_name: &str) -> usize {
    parts.iter().filter(|c| c.is_type(type_name)).count()
}

fn uniform(parts: &[&Component]) -> bool {
    parts.iter().all(|c| *c == parts[0])
}

fn equal_under(model: &mut Model, vars: &[IntVar], lit: Lit) {
    for pair in vars.windows(2) {
        model.add_equality(pair[0], pair[1]).only_enforce_if([lit]);
    }
}

pub(super) fn casing_holds(grid: &Grid<Component>) -> DesignResult<bool> {
    let ring = Ring::of(grid.shape(), "ring casing constraint")?;
    for coord in grid.coords() {
        let (x, z, y) = (coord[0], coord[1], coord[2]);
        if grid.get(&coord)?.is_type("casing") != ring.is_casing(x, z, y) {
            return Ok(false);
        }
    }
    Ok(true)
}

pub(super) fn apply_casing(model: &mut Model, cells: &Grid<IntVar>, catalog: &Catalog) -> DesignResult<()> {
    let ring = Ring::of(cells.shape(), "ring casing constraint")?;
    let casings = catalog.require_type("casing")?;
    for coord in cells.coords() {
        let cell = *cells.get(&coord)?;
        restrict(model, cell, &casings, ring.is_casing(coord[0], coord[1], coord[2]));
    }
    Ok(())
}

pub(super) fn beam_holds(grid: &Grid<Component>) -> DesignResult<bool> {
    let ring = Ring::of(grid.shape(), "ring beam constraint")?;
    for coord in grid.coords() {
        if grid.get(&coord)?.is_type("beam") != ring.is_beam(coord[0], coord[1], coord[2]) {
            return Ok(false);
        }
    }
    Ok(true)
}

pub(super) fn apply_beam(model: &mut Model, cells: &Grid<IntVar>, catalog: &Catalog) -> DesignResult<()> {
    let ring = Ring::of(cells.shape(), "ring beam constraint")?;
    let beams = catalog.require_type("beam")?;
    for coord in cells.coords() {
        let cell = *cells.get(&coord)?;
        restrict(model, cell, &beams, ring.is_beam(coord[0], coord[1], coord[2]));
    }
    Ok(())
}

pub(super) fn air_core_holds(grid: &Grid<Component>) -> DesignResult<bool> {
    let ring = Ring::of(grid.shape(), "ring air constraint")?;
    for coord in grid.coords() {
        if ring.is_core(coord[0], coord[1]) && !grid.get(&coord)?.is_type("air") {
            return Ok(false);
        }
    }
    Ok(true)
}

pub(super) fn apply_air_core(model: &mut Model, cells: &Grid<IntVar>, catalog: &Catalog) -> DesignResult<()> {
    let ring = Ring::of(cells.shape(), "ring air constraint")?;
    let air = catalog.require_type("air")?;
    for coord in cells.coords() {
        if ring.is_core(coord[0], coord[1]) {
            restrict(model, *cells.get(&coord)?, &air, true);
        }
    }
    Ok(())
}

pub(super) fn cavities_hold(grid: &Grid<Component>) -> DesignResult<bool> {
    let ring = Ring::of(grid.shape(), "ring cavity constraint")?;
    for side in SIDES {
        let mut previous = false;
        for t in ring.straight() {
            let parts = ring.cells(grid, side, t, &RING)?;
            let full = match count_of(&parts, "cavity") {
                0 => false,
                8 if uniform(&parts) => true,
                _ => return Ok(false),
            };
            if full && previous {
                return Ok(false);
            }
            previous = full;
        }
    }
    Ok(true)
}

pub(super) fn apply_cavities(model: &mut Model, cells: &Grid<IntVar>, catalog: &Catalog) -> DesignResult<()> {
    let ring = Ring::of(cells.shape(), "ring cavity constraint")?;
    let cavities = catalog.require_type("cavity")?;
    for side in SIDES {
        let mut previous: Option<BoolVar> = None;
        for t in ring.straight() {
            let has_cavity = model.new_bool_var(format!("{:?}_cavity_section_{}", side, t));
            let vars = ring.vars(cells, side, t, &RING)?;
            for &cell in &vars {
                restrict_iff(model, cell, &cavities, has_cavity.lit());
            }
            equal_under(model, &vars, has_cavity.lit());
            if let Some(previous) = previous {
                model.add_bool_or([!previous, !has_cavity]);
            }
            previous = Some(has_cavity);
        }
    }
    Ok(())
}

pub(super) fn one_cavity_holds(grid: &Grid<Component>) -> DesignResult<bool> {
    check_ring(grid.shape(), "ring single cavity constraint")?;
    let mut cavities = 0;
    for slot in ring_slots(grid.shape()[0]) {
        if grid.get(&slot.cell)?.is_type("cavity") {
            cavities += 1;
        }
    }
    Ok(cavities == 1)
}

pub(super) fn apply_one_cavity(model: &mut Model, cells: &Grid<IntVar>, catalog: &Catalog) -> DesignResult<()> {
    check_ring(cells.shape(), "ring single cavity constraint")?;
    let cavities = catalog.require_type("cavity")?;
    let mut flags = Vec::new();
    for slot in ring_slots(cells.shape()[0]) {
        let cell = *cells.get(&slot.cell)?;
        flags.push(model.reify_in(cell, &cavities, "slot_has_cavity"));
    }
    model.add_linear(LinearExpr::sum(flags), Cmp::Eq, 1i64);
    Ok(())
}

/// Dipole and quadrupole flags along one side, indexed by position
struct SectionFlags<T> {
    offset: usize,
    dipole: Vec<T>,
    quadrupole: Vec<T>,
}

impl<T: Copy> SectionFlags<T> {
    fn new(
        ring: Ring,
        fixed: impl Fn(bool) -> T,
        mut free: impl FnMut(usize) -> DesignResult<(T, T)>,
    ) -> DesignResult<Self> {
        let n = ring.n;
        let mut dipole = Vec::new();
        let mut quadrupole = Vec::new();
        for t in ring.magnet_positions() {
            let (d, q) = if t == 2 || t == n - 3 {
                (fixed(true), fixed(false))
            } else if t == 3 || t == n - 4 {
                (fixed(false), fixed(false))
            } else {
                free(t)?
            };
            dipole.push(d);
            quadrupole.push(q);
        }
        Ok(SectionFlags {
            offset: 2,
            dipole,
            quadrupole,
        })
    }

    fn dipole(&self, t: usize) -> Option<T> {
        t.checked_sub(self.offset)
            .and_then(|i| self.dipole.get(i))
            .copied()
    }

    fn quadrupole(&self, t: usize) -> Option<T> {
        t.checked_sub(self.offset)
            .and_then(|i| self.quadrupole.get(i))
            .copied()
    }
}

/// Positions at distance `d` from `t` in both directions
fn around(t: usize, d: usize) -> impl Iterator<Item = usize> {
    t.checked_sub(d).into_iter().chain(Some(t + d))
}

pub(super) fn magnets_hold(grid: &Grid<Component>) -> DesignResult<bool> {
    let ring = Ring::of(grid.shape(), "ring magnet constraint")?;
    for side in SIDES {
        let flags = SectionFlags::new(
            ring,
            |value| value,
            |t| {
                let has_magnet = count_of(&ring.cells(grid, side, t, &CENTERS)?, "magnet") == 2;
                let quadrupole = count_of(&ring.cells(grid, side, t, &FLANKS)?, "magnet") == 2;
                Ok((has_magnet && !quadrupole, quadrupole))
            },
        )?;

        for t in ring.straight() {
            let dipole = flags.dipole(t).unwrap_or(false);
            let quadrupole = flags.quadrupole(t).unwrap_or(false);
            let has_magnet = dipole || quadrupole;

            let centers = ring.cells(grid, side, t, &CENTERS)?;
            let flanks = ring.cells(grid, side, t, &FLANKS)?;
            let expected_centers = if has_magnet { 2 } else { 0 };
            let expected_flanks = if quadrupole { 2 } else { 0 };
            if count_of(&centers, "magnet") != expected_centers
                || count_of(&flanks, "magnet") != expected_flanks
            {
                return Ok(false);
            }
            if has_magnet && !uniform(&centers) {
                return Ok(false);
            }
            if quadrupole && flanks.iter().any(|c| *c != centers[0]) {
                return Ok(false);
            }
            if count_of(&ring.cells(grid, side, t, &CORNERS)?, "magnet") > 0 {
                return Ok(false);
            }

            if dipole {
                let crowded = around(t, 1)
                    .chain(around(t, 2))
                    .any(|s| flags.dipole(s).unwrap_or(false))
                    || around(t, 1).any(|s| flags.quadrupole(s).unwrap_or(false));
                if crowded {
                    return Ok(false);
                }
                if count_of(&ring.cells(grid, side, t, &DIPOLE_YOKES)?, "yoke") != DIPOLE_YOKES.len() {
                    return Ok(false);
                }
            }
            let beside = around(t, 1).any(|s| flags.dipole(s).unwrap_or(false));
            let yokes = count_of(&ring.cells(grid, side, t, &RING)?, "yoke");
            if beside && yokes != RING.len() {
                return Ok(false);
            }
            if !dipole && !beside && yokes > 0 {
                return Ok(false);
            }
        }
    }

    for [cx, cz] in ring.corner_centers() {
        let below = grid.get(&[cx, cz, 1])?;
        let above = grid.get(&[cx, cz, 3])?;
        if !below.is_type("magnet") || below != above {
            return Ok(false);
        }
    }
    for coord in ring.corner_yokes() {
        if !grid.get(&coord)?.is_type("yoke") {
            return Ok(false);
        }
    }
    Ok(true)
}

pub(super) fn apply_magnets(model: &mut Model, cells: &Grid<IntVar>, catalog: &Catalog) -> DesignResult<()> {
    let ring = Ring::of(cells.shape(), "ring magnet constraint")?;
    let magnets = catalog.require_type("magnet")?;
    let yokes = catalog.require_type("yoke")?;
    let always = model.true_lit();
    let never = !always;

    for side in SIDES {
        let flags: SectionFlags<Lit> = SectionFlags::new(
            ring,
            |value| if value { always } else { never },
            |t| {
                let dipole = model.new_bool_var(format!("{:?}_dipole_{}", side, t));
                let quadrupole = model.new_bool_var(format!("{:?}_quadrupole_{}", side, t));
                Ok((dipole.lit(), quadrupole.lit()))
            },
        )?;

        for t in ring.straight() {
            let (Some(dipole), Some(quadrupole)) = (flags.dipole(t), flags.quadrupole(t)) else {
                continue;
            };
            let has_magnet = model.reify_any(&[dipole, quadrupole], "has_magnet").lit();
            model.add_bool_or([!dipole, !quadrupole]);

            let centers = ring.vars(cells, side, t, &CENTERS)?;
            for &cell in &centers {
                restrict_iff(model, cell, &magnets, has_magnet);
            }
            equal_under(model, &centers, has_magnet);

            let flanks = ring.vars(cells, side, t, &FLANKS)?;
            for &cell in &flanks {
                restrict_iff(model, cell, &magnets, quadrupole);
                model
                    .add_equality(cell, centers[0])
                    .only_enforce_if([quadrupole]);
            }
            for cell in ring.vars(cells, side, t, &CORNERS)? {
                restrict(model, cell, &magnets, false);
            }

            for s in around(t, 1).chain(around(t, 2)) {
                if let Some(other) = flags.dipole(s) {
                    model.add_implication(dipole, !other);
                }
            }
            for s in around(t, 1) {
                if let Some(other) = flags.quadrupole(s) {
                    model.add_implication(dipole, !other);
                }
            }

            for cell in ring.vars(cells, side, t, &DIPOLE_YOKES)? {
                model.add_member(cell, &yokes).only_enforce_if([dipole]);
            }
            let neighbors: Vec<Lit> = around(t, 1).filter_map(|s| flags.dipole(s)).collect();
            let beside = model.reify_any(&neighbors, "beside_dipole").lit();
            let section = ring.vars(cells, side, t, &RING)?;
            for &cell in &section {
                model.add_member(cell, &yokes).only_enforce_if([beside]);
            }
            let in_range = model.reify_any(&[dipole, beside], "in_dipole_range").lit();
            for &cell in &section {
                model.add_not_member(cell, &yokes).only_enforce_if([!in_range]);
            }
        }
    }

    for [cx, cz] in ring.corner_centers() {
        let below = *cells.get(&[cx, cz, 1])?;
        let above = *cells.get(&[cx, cz, 3])?;
        restrict(model, below, &magnets, true);
        restrict(model, above, &magnets, true);
        model.add_equality(below, above);
    }
    for coord in ring.corner_yokes() {
        restrict(model, *cells.get(&coord)?, &yokes, true);
    }
    Ok(())
}

/// Pairs of cells mirrored across the beam within one straight cross-section
fn mirrored(ring: Ring, side: Side, t: usize) -> Vec<([usize; 3], [usize; 3])> {
    let mut pairs = Vec::new();
    for u in 0..5 {
        for y in 0..5 {
            if u < 4 - u {
                pairs.push((ring.cell(side, t, (u, y)), ring.cell(side, t, (4 - u, y))));
            }
            if y < 4 - y {
                pairs.push((ring.cell(side, t, (u, y)), ring.cell(side, t, (u, 4 - y))));
            }
        }
    }
    pairs
}

pub(super) fn inner_symmetry_holds(grid: &Grid<Component>) -> DesignResult<bool> {
    let ring = Ring::of(grid.shape(), "ring inner symmetry constraint")?;
    for side in SIDES {
        for t in ring.straight() {
            for (a, b) in mirrored(ring, side, t) {
                if grid.get(&a)? != grid.get(&b)? {
                    return Ok(false);
                }
            }
        }
    }
    Ok(true)
}

pub(super) fn apply_inner_symmetry(model: &mut Model, cells: &Grid<IntVar>) -> DesignResult<()> {
    let ring = Ring::of(cells.shape(), "ring inner symmetry constraint")?;
    for side in SIDES {
        for t in ring.straight() {
            for (a, b) in mirrored(ring, side, t) {
                let a = *cells.get(&a)?;
                let b = *cells.get(&b)?;
                model.add_equality(a, b);
            }
        }
    }
    Ok(())
}

pub(super) fn energy_holds(
    grid: &Grid<Component>,
    min: i64,
    max: i64,
    particle: &Particle,
) -> DesignResult<bool> {
    let dipole = Metric::MaxDipoleEnergy(*particle).evaluate(grid)?;
    let loss = Metric::MaxRadiationLoss(*particle).evaluate(grid)?;
    let energy = dipole.min(loss);
    Ok(min as f64 <= energy && energy <= max as f64)
}

pub(super) fn apply_energy(
    model: &mut Model,
    cells: &Grid<IntVar>,
    catalog: &Catalog,
    min: i64,
    max: i64,
    particle: &Particle,
) -> DesignResult<()> {
    let dipole = Metric::MaxDipoleEnergy(*particle).compile(model, cells, catalog)?;
    let loss = Metric::MaxRadiationLoss(*particle).compile(model, cells, catalog)?;
    let energy = model.new_var(Domain::LARGE.nonnegative(), "ring_energy");
    model.add_min_equality(energy, dipole, loss);
    model.add_linear(energy, Cmp::Ge, min);
    model.add_linear(energy, Cmp::Le, max);
    Ok(())
}

pub(super) fn dipole_energy_holds(
    grid: &Grid<Component>,
    min: i64,
    max: i64,
    particle: &Particle,
) -> DesignResult<bool> {
    let energy = Metric::MaxDipoleEnergy(*particle).evaluate(grid)?;
    Ok(min as f64 <= energy && energy <= max as f64)
}

pub(super) fn apply_dipole_energy(
    model: &mut Model,
    cells: &Grid<IntVar>,
    catalog: &Catalog,
    min: i64,
    max: i64,
    particle: &Particle,
) -> DesignResult<()> {
    let energy = Metric::MaxDipoleEnergy(*particle).compile(model, cells, catalog)?;
    model.add_linear(energy, Cmp::Ge, min);
    model.add_linear(energy, Cmp::Le, max);
    Ok(())
}
