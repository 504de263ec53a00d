use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};

use crate::Position;

/// A generic 2D grid structure.
///
/// Stores elements of type `T` in a flat vector using row-major order and
/// addresses cells by signed [`Position`]s, so out-of-range candidates
/// (including negative ones) simply fail the bounds check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid<T> {
    width: i32,
    height: i32,
    cells: Vec<T>,
}

impl<T> Grid<T> {
    /// Creates a new grid with the specified dimensions, filled with default values.
    ///
    /// # Panics
    ///
    /// Panics if either dimension is negative or `width * height` overflows `usize`.
    pub fn new(width: i32, height: i32) -> Self
    where
        T: Default + Clone,
    {
        let size = Self::checked_size(width, height);
        Grid {
            width,
            height,
            cells: vec![T::default(); size],
        }
    }

    /// Creates a new grid with the specified dimensions, filled by a generator
    /// function called with each cell's position.
    ///
    /// # Panics
    ///
    /// Panics if either dimension is negative or `width * height` overflows `usize`.
    pub fn from_generator<F>(width: i32, height: i32, mut f: F) -> Self
    where
        F: FnMut(Position) -> T,
    {
        let size = Self::checked_size(width, height);
        let mut cells = Vec::with_capacity(size);
        for y in 0..height {
            for x in 0..width {
                cells.push(f(Position::new(x, y)));
            }
        }
        Grid {
            width,
            height,
            cells,
        }
    }

    fn checked_size(width: i32, height: i32) -> usize {
        assert!(width >= 0 && height >= 0, "Grid dimensions must be non-negative");
        (width as usize)
            .checked_mul(height as usize)
            .expect("Grid size overflow")
    }

    /// Returns the width of the grid.
    #[inline]
    pub fn width(&self) -> i32 {
        self.width
    }

    /// Returns the height of the grid.
    #[inline]
    pub fn height(&self) -> i32 {
        self.height
    }

    /// Checks if the given position is within the grid boundaries.
    #[inline]
    pub fn is_valid(&self, position: Position) -> bool {
        position.x >= 0 && position.x < self.width && position.y >= 0 && position.y < self.height
    }

    #[inline]
    fn position_to_index(&self, position: Position) -> Option<usize> {
        if self.is_valid(position) {
            Some(position.y as usize * self.width as usize + position.x as usize)
        } else {
            None
        }
    }

    /// Gets an immutable reference to the cell at the given position.
    ///
    /// Returns `None` if the position is out of bounds.
    pub fn get(&self, position: Position) -> Option<&T> {
        let index = self.position_to_index(position)?;
        self.cells.get(index)
    }

    /// Gets a mutable reference to the cell at the given position.
    ///
    /// Returns `None` if the position is out of bounds.
    pub fn get_mut(&mut self, position: Position) -> Option<&mut T> {
        let index = self.position_to_index(position)?;
        self.cells.get_mut(index)
    }

    /// Returns an iterator that yields `(Position, &T)` for each cell in
    /// row-major order.
    pub fn enumerate(&self) -> impl Iterator<Item = (Position, &T)> {
        let width = self.width;
        self.cells.iter().enumerate().map(move |(index, cell)| {
            let y = (index / width as usize) as i32;
            let x = (index % width as usize) as i32;
            (Position::new(x, y), cell)
        })
    }
}

/// Allows indexing the grid by `Position` for immutable access.
impl<T> Index<Position> for Grid<T> {
    type Output = T;

    #[inline]
    fn index(&self, position: Position) -> &Self::Output {
        match self.position_to_index(position) {
            Some(idx) => &self.cells[idx],
            None => panic!(
                "Grid index ({}, {}) out of bounds for grid size ({}, {})",
                position.x, position.y, self.width, self.height
            ),
        }
    }
}

/// Allows indexing the grid by `Position` for mutable access.
impl<T> IndexMut<Position> for Grid<T> {
    #[inline]
    fn index_mut(&mut self, position: Position) -> &mut Self::Output {
        let width = self.width;
        let height = self.height;
        match self.position_to_index(position) {
            Some(idx) => &mut self.cells[idx],
            None => panic!(
                "Grid index ({}, {}) out of bounds for grid size ({}, {})",
                position.x, position.y, width, height
            ),
        }
    }
}
