use crate::tiers::TierIndex;

/// Cell identity on the board. `x` is the column index, `y` the row index;
/// row 0 is the top of a column and larger `y` is lower.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridCoord {
    pub x: i32,
    pub y: i32,
}

impl GridCoord {
    /// 8-neighbour adjacency: chebyshev distance of exactly one.
    /// A coord is never adjacent to itself.
    pub fn is_adjacent(self, other: GridCoord) -> bool {
        let dx = (self.x - other.x).abs();
        let dy = (self.y - other.y).abs();
        dx.max(dy) == 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub coord: GridCoord,
    pub tier: TierIndex,
    /// Awaiting refill after a merge emptied it.
    pub is_empty: bool,
    pub is_selected: bool,
    /// False while a settle task (spawn, upgrade, relocation, refill) owns the
    /// cell; pointer input on an unsettled cell is ignored.
    pub is_settled: bool,
}

impl Cell {
    fn new(coord: GridCoord) -> Self {
        Self {
            coord,
            tier: TierIndex(0),
            is_empty: true,
            is_selected: false,
            is_settled: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    cells: Vec<Cell>,
}

impl Column {
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Owns every column of the board. Cells are created once at setup and mutated
/// in place for the life of the session; they are never destroyed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    width: u32,
    height: u32,
    columns: Vec<Column>,
}

impl Grid {
    pub fn new(width: u32, height: u32) -> Self {
        let columns = (0..width)
            .map(|x| Column {
                cells: (0..height)
                    .map(|y| {
                        Cell::new(GridCoord {
                            x: x as i32,
                            y: y as i32,
                        })
                    })
                    .collect(),
            })
            .collect();
        Self {
            width,
            height,
            columns,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn contains(&self, coord: GridCoord) -> bool {
        coord.x >= 0
            && (coord.x as u32) < self.width
            && coord.y >= 0
            && (coord.y as u32) < self.height
    }

    pub fn cell(&self, coord: GridCoord) -> Option<&Cell> {
        if !self.contains(coord) {
            return None;
        }
        Some(&self.columns[coord.x as usize].cells[coord.y as usize])
    }

    pub fn cell_mut(&mut self, coord: GridCoord) -> Option<&mut Cell> {
        if !self.contains(coord) {
            return None;
        }
        Some(&mut self.columns[coord.x as usize].cells[coord.y as usize])
    }

    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.columns.iter().flat_map(|column| column.cells.iter())
    }

    /// The coords of every in-bounds 8-neighbour of `coord`.
    pub fn neighbours(&self, coord: GridCoord) -> impl Iterator<Item = GridCoord> + '_ {
        const OFFSETS: [(i32, i32); 8] = [
            (-1, -1),
            (-1, 0),
            (-1, 1),
            (0, -1),
            (0, 1),
            (1, -1),
            (1, 0),
            (1, 1),
        ];
        OFFSETS
            .iter()
            .map(move |(dx, dy)| GridCoord {
                x: coord.x + dx,
                y: coord.y + dy,
            })
            .filter(|candidate| self.contains(*candidate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adjacency_is_chebyshev_one_and_symmetric() {
        let center = GridCoord { x: 2, y: 2 };
        for dx in -1i32..=1 {
            for dy in -1i32..=1 {
                let other = GridCoord {
                    x: center.x + dx,
                    y: center.y + dy,
                };
                let expected = !(dx == 0 && dy == 0);
                assert_eq!(center.is_adjacent(other), expected, "offset ({dx},{dy})");
                assert_eq!(other.is_adjacent(center), expected, "symmetry ({dx},{dy})");
            }
        }
    }

    #[test]
    fn cells_two_apart_are_not_adjacent() {
        let a = GridCoord { x: 0, y: 0 };
        assert!(!a.is_adjacent(GridCoord { x: 2, y: 0 }));
        assert!(!a.is_adjacent(GridCoord { x: 2, y: 2 }));
        assert!(!a.is_adjacent(GridCoord { x: 0, y: -2 }));
    }

    #[test]
    fn grid_coords_are_unique_and_consistent_with_columns() {
        let grid = Grid::new(4, 3);
        let mut seen = std::collections::HashSet::new();
        for (column_index, column) in grid.columns().iter().enumerate() {
            for (row_index, cell) in column.cells().iter().enumerate() {
                assert_eq!(cell.coord.x, column_index as i32);
                assert_eq!(cell.coord.y, row_index as i32);
                assert!(seen.insert(cell.coord));
            }
        }
        assert_eq!(seen.len(), 12);
    }

    #[test]
    fn out_of_bounds_lookup_is_none() {
        let grid = Grid::new(3, 3);
        assert!(grid.cell(GridCoord { x: -1, y: 0 }).is_none());
        assert!(grid.cell(GridCoord { x: 0, y: 3 }).is_none());
        assert!(grid.cell(GridCoord { x: 2, y: 2 }).is_some());
    }

    #[test]
    fn corner_cell_has_three_neighbours() {
        let grid = Grid::new(3, 3);
        let corner: Vec<_> = grid.neighbours(GridCoord { x: 0, y: 0 }).collect();
        assert_eq!(corner.len(), 3);
        let center: Vec<_> = grid.neighbours(GridCoord { x: 1, y: 1 }).collect();
        assert_eq!(center.len(), 8);
    }
}
