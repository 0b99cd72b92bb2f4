use smallvec::SmallVec;

/// Single coordinate axis used for board height, width, and positions.
pub type Coord = u8;

/// Count type used for mine counts and total-cell counts.
pub type CellCount = u16;

/// Two-dimensional coordinates `(row, col)`, also used as board size `(height, width)`.
pub type Coord2 = (Coord, Coord);

/// Neighbor list of a single cell, never longer than eight.
pub type Neighbors = SmallVec<[Coord2; 8]>;

pub trait ToNdIndex {
    type Output;
    fn to_nd_index(self) -> Self::Output;
}

impl ToNdIndex for Coord2 {
    type Output = [usize; 2];

    fn to_nd_index(self) -> Self::Output {
        [self.0.into(), self.1.into()]
    }
}

pub const fn mult(a: Coord, b: Coord) -> CellCount {
    let a = a as CellCount;
    let b = b as CellCount;
    a.saturating_mul(b)
}

pub const fn in_bounds(coords: Coord2, bounds: Coord2) -> bool {
    coords.0 < bounds.0 && coords.1 < bounds.1
}

/// Iterates every cell of a board of the given size in row-major order.
pub fn iter_cells((rows, cols): Coord2) -> impl Iterator<Item = Coord2> {
    (0..rows).flat_map(move |row| (0..cols).map(move |col| (row, col)))
}

/// Cells at Chebyshev distance one from `center` that lie inside `bounds`.
pub fn neighbors(center: Coord2, bounds: Coord2) -> Neighbors {
    NeighborIter::new(center, bounds).collect()
}

/// Walks the 3x3 block around `center`, clamped to the board, skipping the center.
#[derive(Debug)]
pub struct NeighborIter {
    center: Coord2,
    row: Coord,
    col: Coord,
    row_end: Coord,
    col_start: Coord,
    col_end: Coord,
}

impl NeighborIter {
    pub fn new(center: Coord2, bounds: Coord2) -> Self {
        let (row, col) = center;
        let row_start = row.saturating_sub(1);
        let col_start = col.saturating_sub(1);
        // an empty range when the center itself is off the board
        let row_end = row.saturating_add(2).min(bounds.0).max(row_start);
        let col_end = col.saturating_add(2).min(bounds.1).max(col_start);
        Self {
            center,
            row: row_start,
            col: col_start,
            row_end,
            col_start,
            col_end,
        }
    }
}

impl Iterator for NeighborIter {
    type Item = Coord2;

    fn next(&mut self) -> Option<Self::Item> {
        while self.row < self.row_end {
            if self.col >= self.col_end {
                self.row += 1;
                self.col = self.col_start;
                continue;
            }

            let item = (self.row, self.col);
            self.col += 1;
            if item != self.center {
                return Some(item);
            }
        }
        None
    }
}
