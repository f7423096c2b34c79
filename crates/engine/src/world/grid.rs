use thiserror::Error;

/// Fixed-size row-major 2D grid. Dimensions never change after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid<T> {
    width: u32,
    height: u32,
    cells: Vec<T>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GridError {
    #[error("cell count mismatch: expected {expected}, got {actual}")]
    CellCountMismatch { expected: usize, actual: usize },
}

impl<T> Grid<T> {
    pub fn from_cells(width: u32, height: u32, cells: Vec<T>) -> Result<Self, GridError> {
        let expected = width as usize * height as usize;
        let actual = cells.len();
        if expected != actual {
            return Err(GridError::CellCountMismatch { expected, actual });
        }
        Ok(Self {
            width,
            height,
            cells,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn index_of(&self, x: u32, y: u32) -> Option<usize> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }

    pub fn get(&self, x: u32, y: u32) -> Option<&T> {
        self.index_of(x, y).and_then(|index| self.cells.get(index))
    }

    pub fn get_mut(&mut self, x: u32, y: u32) -> Option<&mut T> {
        let index = self.index_of(x, y)?;
        self.cells.get_mut(index)
    }

    /// Cells in row-major order with their `(x, y)` coordinates.
    pub fn iter(&self) -> impl Iterator<Item = (u32, u32, &T)> {
        let width = self.width.max(1);
        self.cells
            .iter()
            .enumerate()
            .map(move |(index, cell)| (index as u32 % width, index as u32 / width, cell))
    }
}

impl<T: Clone> Grid<T> {
    pub fn filled(width: u32, height: u32, value: T) -> Self {
        Self {
            width,
            height,
            cells: vec![value; width as usize * height as usize],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_cells_rejects_mismatched_count() {
        let err = Grid::from_cells(2, 2, vec![0u16, 1, 2]).expect_err("err");
        assert_eq!(
            err,
            GridError::CellCountMismatch {
                expected: 4,
                actual: 3
            }
        );
    }

    #[test]
    fn get_is_row_major_and_bounds_checked() {
        let grid = Grid::from_cells(2, 2, vec![10u16, 11, 12, 13]).expect("grid");
        assert_eq!(grid.get(1, 0), Some(&11));
        assert_eq!(grid.get(0, 1), Some(&12));
        assert_eq!(grid.get(2, 0), None);
        assert_eq!(grid.get(0, 2), None);
    }

    #[test]
    fn iter_reports_coordinates() {
        let grid = Grid::from_cells(3, 2, (0u16..6).collect()).expect("grid");
        let coords: Vec<(u32, u32, u16)> = grid.iter().map(|(x, y, v)| (x, y, *v)).collect();
        assert_eq!(coords[0], (0, 0, 0));
        assert_eq!(coords[2], (2, 0, 2));
        assert_eq!(coords[3], (0, 1, 3));
        assert_eq!(coords[5], (2, 1, 5));
    }

    #[test]
    fn get_mut_writes_in_place() {
        let mut grid = Grid::filled(2, 2, 0u16);
        *grid.get_mut(1, 1).expect("cell") = 7;
        assert_eq!(grid.get(1, 1), Some(&7));
    }
}
