use std::collections::HashSet;
use std::fmt;

use serde::Serialize;

/// A cell coordinate on the infinite grid.
///
/// Ordering is by `x`, then `y`, which is the order canonical state keys use.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Cell {
    pub x: i64,
    pub y: i64,
}

impl Cell {
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// The orthogonal + diagonal neighbors. Cells on the edge of the `i64`
    /// range have fewer than eight; the grid does not wrap.
    pub fn neighbors(self) -> impl Iterator<Item = Cell> {
        NEIGHBORS.into_iter().filter_map(move |(dx, dy)| {
            Some(Cell::new(self.x.checked_add(dx)?, self.y.checked_add(dy)?))
        })
    }
}

impl From<(i64, i64)> for Cell {
    fn from((x, y): (i64, i64)) -> Self {
        Self::new(x, y)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.x, self.y)
    }
}

/// Moore neighborhood offsets.
const NEIGHBORS: [(i64, i64); 8] = [
    (-1, -1), (-1, 0), (-1, 1),
    ( 0, -1),          ( 0, 1),
    ( 1, -1), ( 1, 0), ( 1, 1),
];

/// Sparse set of live cells. Anything not in the set is dead.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CellSet {
    alive: HashSet<Cell>,
}

impl CellSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            alive: HashSet::with_capacity(capacity),
        }
    }

    /// Build a set from (x, y) pairs; duplicates collapse.
    pub fn from_cells(cells: impl IntoIterator<Item = (i64, i64)>) -> Self {
        cells.into_iter().map(Cell::from).collect()
    }

    /// Parse a multi-line pattern where `#` or `O` = alive.
    /// Columns map to `x`, lines to `y`, shifted by (offset_x, offset_y).
    pub fn from_pattern(pattern: &str, offset_x: i64, offset_y: i64) -> Self {
        let cells = pattern.lines().enumerate().flat_map(|(row, line)| {
            line.chars().enumerate().filter_map(move |(col, ch)| {
                matches!(ch, '#' | 'O')
                    .then(|| Cell::new(col as i64 + offset_x, row as i64 + offset_y))
            })
        });
        cells.collect()
    }

    pub fn population(&self) -> usize {
        self.alive.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alive.is_empty()
    }

    pub fn is_alive(&self, cell: &Cell) -> bool {
        self.alive.contains(cell)
    }

    pub fn insert(&mut self, cell: Cell) -> bool {
        self.alive.insert(cell)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Cell> {
        self.alive.iter()
    }

    /// Cells sorted by (x, y).
    pub fn sorted(&self) -> Vec<Cell> {
        let mut cells: Vec<Cell> = self.alive.iter().copied().collect();
        cells.sort_unstable();
        cells
    }

    /// Bounding box of all live cells: (min_x, min_y, max_x, max_y).
    /// Returns `None` if the set is empty.
    pub fn bounds(&self) -> Option<(i64, i64, i64, i64)> {
        let mut iter = self.alive.iter();
        let first = iter.next()?;
        let (mut x0, mut y0, mut x1, mut y1) = (first.x, first.y, first.x, first.y);
        for cell in iter {
            x0 = x0.min(cell.x);
            y0 = y0.min(cell.y);
            x1 = x1.max(cell.x);
            y1 = y1.max(cell.y);
        }
        Some((x0, y0, x1, y1))
    }
}

impl FromIterator<Cell> for CellSet {
    fn from_iter<I: IntoIterator<Item = Cell>>(iter: I) -> Self {
        Self {
            alive: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a CellSet {
    type Item = &'a Cell;
    type IntoIter = std::collections::hash_set::Iter<'a, Cell>;

    fn into_iter(self) -> Self::IntoIter {
        self.alive.iter()
    }
}

impl fmt::Display for CellSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some((x0, y0, x1, y1)) = self.bounds() else {
            return write!(f, "(empty)");
        };
        for y in y0..=y1 {
            for x in x0..=x1 {
                let ch = if self.is_alive(&Cell::new(x, y)) { '█' } else { '·' };
                write!(f, "{ch}")?;
            }
            if y < y1 {
                writeln!(f)?;
            }
        }
        Ok(())
    }
}
