use crate::particle::CellAddress;
use std::collections::HashSet;

/// Moore neighborhood offsets (row, col), center included
static MOORE_OFFSETS: [(i64, i64); 9] = [
    (-1, -1), (-1, 0), (-1, 1),
    (0, -1),  (0, 0),  (0, 1),
    (1, -1),  (1, 0),  (1, 1),
];

/// Uniform grid over the canvas with square cells one interaction radius wide.
///
/// Cells store particle indices into the owning system's particle list.
/// The grid never resizes; only membership changes.
pub struct SpatialGrid {
    pub rows: usize,
    pub cols: usize,
    cell_size: f32,
    /// Row-major, index = row * cols + col
    cells: Vec<HashSet<usize>>,
}

impl SpatialGrid {
    /// `cell_size` must be positive; callers validate before construction
    pub fn new(width: f32, height: f32, cell_size: f32) -> Self {
        let rows = (height / cell_size).ceil() as usize;
        let cols = (width / cell_size).ceil() as usize;
        Self {
            rows,
            cols,
            cell_size,
            cells: vec![HashSet::new(); rows * cols],
        }
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Raw (row, col) for a point. May lie outside the grid.
    pub fn cell_for(&self, x: f32, y: f32) -> (i64, i64) {
        (
            (y / self.cell_size).floor() as i64,
            (x / self.cell_size).floor() as i64,
        )
    }

    pub fn in_bounds(&self, row: i64, col: i64) -> bool {
        row >= 0 && col >= 0 && (row as usize) < self.rows && (col as usize) < self.cols
    }

    /// Bounds-checked address for a point
    pub fn address_for(&self, x: f32, y: f32) -> CellAddress {
        let (row, col) = self.cell_for(x, y);
        if self.in_bounds(row, col) {
            CellAddress::Inside {
                row: row as usize,
                col: col as usize,
            }
        } else {
            CellAddress::Outside
        }
    }

    fn index(&self, address: CellAddress) -> Option<usize> {
        match address {
            CellAddress::Inside { row, col } if row < self.rows && col < self.cols => {
                Some(row * self.cols + col)
            }
            _ => None,
        }
    }

    /// Register a particle in a cell. Outside addresses are ignored.
    pub fn add(&mut self, address: CellAddress, particle: usize) {
        if let Some(idx) = self.index(address) {
            self.cells[idx].insert(particle);
        }
    }

    /// Drop a particle from a cell. Absent particles and outside addresses are ignored.
    pub fn remove(&mut self, address: CellAddress, particle: usize) {
        if let Some(idx) = self.index(address) {
            self.cells[idx].remove(&particle);
        }
    }

    pub fn contains(&self, address: CellAddress, particle: usize) -> bool {
        self.index(address)
            .map(|idx| self.cells[idx].contains(&particle))
            .unwrap_or(false)
    }

    /// The cell at (row, col) and its 8 neighbors, skipping any off the grid.
    /// The center itself may be off the grid; its in-bounds neighbors are still returned.
    pub fn neighbors(&self, row: i64, col: i64) -> impl Iterator<Item = &HashSet<usize>> + '_ {
        MOORE_OFFSETS.iter().filter_map(move |&(dr, dc)| {
            let (r, c) = (row + dr, col + dc);
            if self.in_bounds(r, c) {
                Some(&self.cells[r as usize * self.cols + c as usize])
            } else {
                None
            }
        })
    }

    /// Indices of every particle in the Moore neighborhood of (row, col)
    pub fn particles_near(&self, row: i64, col: i64) -> Vec<usize> {
        self.neighbors(row, col).flatten().copied().collect()
    }

    /// Total memberships across all cells
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.cells.iter().map(HashSet::len).sum()
    }
}
