//! Fixed-shape multi-dimensional grid over a flat row-major backing sequence

use crate::error::DesignError;
use crate::DesignResult;
use serde::Serialize;

/// A fixed-shape container of cells
///
/// The last axis varies fastest. The backing length always equals the
/// product of the shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Grid<T> {
    shape: Vec<usize>,
    cells: Vec<T>,
}

impl<T> Grid<T> {
    /// Wrap `cells` in a grid of the given shape
    pub fn new(cells: Vec<T>, shape: impl Into<Vec<usize>>) -> DesignResult<Self> {
        let shape = shape.into();
        check_shape(&shape)?;
        let expected: usize = shape.iter().product();
        if cells.len() != expected {
            return Err(DesignError::ShapeMismatch {
                shape,
                expected,
                actual: cells.len(),
            });
        }
        Ok(Self { shape, cells })
    }

    /// Build a grid by calling `f` with every coordinate in row-major order
    pub fn from_fn(
        shape: impl Into<Vec<usize>>,
        mut f: impl FnMut(&[usize]) -> T,
    ) -> DesignResult<Self> {
        let shape = shape.into();
        check_shape(&shape)?;
        let len: usize = shape.iter().product();
        let mut cells = Vec::with_capacity(len);
        let mut coord = vec![0; shape.len()];
        for _ in 0..len {
            cells.push(f(&coord));
            advance(&mut coord, &shape);
        }
        Ok(Self { shape, cells })
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cells(&self) -> &[T] {
        &self.cells
    }

    pub fn into_cells(self) -> Vec<T> {
        self.cells
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.cells.iter()
    }

    /// Flat index of a coordinate
    pub fn index(&self, coord: &[usize]) -> DesignResult<usize> {
        if coord.len() != self.shape.len() {
            return Err(DesignError::out_of_bounds(coord, &self.shape));
        }
        let mut flat = 0;
        for (&c, &dim) in coord.iter().zip(&self.shape) {
            if c >= dim {
                return Err(DesignError::out_of_bounds(coord, &self.shape));
            }
            flat = flat * dim + c;
        }
        Ok(flat)
    }

    /// Coordinate of a flat index
    pub fn coord(&self, flat: usize) -> DesignResult<Vec<usize>> {
        if flat >= self.cells.len() {
            return Err(DesignError::out_of_bounds(flat, &self.shape));
        }
        let mut coord = vec![0; self.shape.len()];
        let mut rest = flat;
        for axis in (0..self.shape.len()).rev() {
            coord[axis] = rest % self.shape[axis];
            rest /= self.shape[axis];
        }
        Ok(coord)
    }

    pub fn get(&self, coord: &[usize]) -> DesignResult<&T> {
        let flat = self.index(coord)?;
        Ok(&self.cells[flat])
    }

    pub fn get_flat(&self, flat: usize) -> Option<&T> {
        self.cells.get(flat)
    }

    pub fn get_mut(&mut self, coord: &[usize]) -> DesignResult<&mut T> {
        let flat = self.index(coord)?;
        Ok(&mut self.cells[flat])
    }

    /// Cells one step below and above `coord` along `axis`
    ///
    /// Returns `None` on a side that falls off the grid; never wraps.
    pub fn neighbors(&self, coord: &[usize], axis: usize) -> DesignResult<(Option<&T>, Option<&T>)> {
        let (lower, upper) = self.neighbor_indices(coord, axis)?;
        Ok((
            lower.map(|flat| &self.cells[flat]),
            upper.map(|flat| &self.cells[flat]),
        ))
    }

    /// Neighbors along every axis, ordered `[lower0, upper0, lower1, upper1, ...]`
    ///
    /// Opposite directions sit at indices `2k` and `2k + 1`.
    pub fn neighborhood(&self, coord: &[usize]) -> DesignResult<Vec<Option<&T>>> {
        let mut out = Vec::with_capacity(2 * self.rank());
        for axis in 0..self.rank() {
            let (lower, upper) = self.neighbors(coord, axis)?;
            out.push(lower);
            out.push(upper);
        }
        Ok(out)
    }

    /// Like [`Grid::neighborhood`] but `None` as soon as any side is off the grid
    pub fn full_neighborhood(&self, coord: &[usize]) -> DesignResult<Option<Vec<&T>>> {
        Ok(self.neighborhood(coord)?.into_iter().collect())
    }

    fn neighbor_indices(
        &self,
        coord: &[usize],
        axis: usize,
    ) -> DesignResult<(Option<usize>, Option<usize>)> {
        if axis >= self.shape.len() {
            return Err(DesignError::bad_axis(axis, &self.shape));
        }
        let flat = self.index(coord)?;
        let stride: usize = self.shape[axis + 1..].iter().product();
        let lower = (coord[axis] > 0).then(|| flat - stride);
        let upper = (coord[axis] + 1 < self.shape[axis]).then(|| flat + stride);
        Ok((lower, upper))
    }

    /// Whether `coord` lies on the outer shell of the grid
    pub fn is_shell(&self, coord: &[usize]) -> bool {
        coord
            .iter()
            .zip(&self.shape)
            .any(|(&c, &dim)| c == 0 || c + 1 == dim)
    }

    /// All coordinates in row-major order
    pub fn coords(&self) -> Coords {
        Coords {
            shape: self.shape.clone(),
            next: Some(vec![0; self.shape.len()]).filter(|_| !self.cells.is_empty()),
        }
    }

    pub fn map<U>(&self, f: impl FnMut(&T) -> U) -> Grid<U> {
        Grid {
            shape: self.shape.clone(),
            cells: self.cells.iter().map(f).collect(),
        }
    }
}

impl<'a, T> IntoIterator for &'a Grid<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.cells.iter()
    }
}

/// Row-major coordinate iterator
pub struct Coords {
    shape: Vec<usize>,
    next: Option<Vec<usize>>,
}

impl Iterator for Coords {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Vec<usize>> {
        let current = self.next.take()?;
        let mut following = current.clone();
        if !advance(&mut following, &self.shape) {
            self.next = Some(following);
        }
        Some(current)
    }
}

/// Step `coord` to its row-major successor; true when it wrapped past the end
fn advance(coord: &mut [usize], shape: &[usize]) -> bool {
    for axis in (0..shape.len()).rev() {
        coord[axis] += 1;
        if coord[axis] < shape[axis] {
            return false;
        }
        coord[axis] = 0;
    }
    true
}

fn check_shape(shape: &[usize]) -> DesignResult<()> {
    if shape.is_empty() || shape.contains(&0) {
        return Err(DesignError::shape_assumption(
            "Grid",
            "at least one axis and positive axis lengths",
            shape,
        ));
    }
    Ok(())
}
