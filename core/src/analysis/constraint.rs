use alloc::collections::BTreeSet;
use core::fmt;
use core::result::Result;

use serde::{Deserialize, Serialize};

use crate::*;

/// Logical statement "exactly `count` of `cells` are mines".
///
/// Only the knowledge base produces new constraints from existing ones, every operation here returns a fresh value.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Constraint {
    cells: BTreeSet<Coord2>,
    count: CellCount,
}

impl Constraint {
    pub fn new(
        cells: impl IntoIterator<Item = Coord2>,
        count: CellCount,
    ) -> Result<Self, Contradiction> {
        Self::from_set(cells.into_iter().collect(), count)
    }

    fn from_set(cells: BTreeSet<Coord2>, count: CellCount) -> Result<Self, Contradiction> {
        if usize::from(count) > cells.len() {
            return Err(Contradiction::CountOutOfRange {
                cells: cells.len(),
                count,
            });
        }
        Ok(Self { cells, count })
    }

    pub fn cells(&self) -> &BTreeSet<Coord2> {
        &self.cells
    }

    pub fn count(&self) -> CellCount {
        self.count
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn contains(&self, cell: Coord2) -> bool {
        self.cells.contains(&cell)
    }

    /// All cells when every one of them must be a mine, otherwise nothing.
    pub fn resolved_mines(&self) -> BTreeSet<Coord2> {
        if usize::from(self.count) == self.len() {
            self.cells.clone()
        } else {
            BTreeSet::new()
        }
    }

    /// All cells when none of them can be a mine, otherwise nothing.
    pub fn resolved_safes(&self) -> BTreeSet<Coord2> {
        if self.count == 0 {
            self.cells.clone()
        } else {
            BTreeSet::new()
        }
    }

    /// The same statement with `cell` settled, one mine fewer when `was_mine`.
    pub fn without(&self, cell: Coord2, was_mine: bool) -> Result<Self, Contradiction> {
        debug_assert!(self.contains(cell), "{cell:?} is not part of {self}");

        let mut cells = self.cells.clone();
        cells.remove(&cell);

        let count = if was_mine {
            self.count
                .checked_sub(1)
                .ok_or(Contradiction::NegativeCount { cell })?
        } else {
            self.count
        };

        Self::from_set(cells, count)
    }

    pub fn is_strict_subset_of(&self, other: &Self) -> bool {
        self.len() < other.len() && self.cells.is_subset(&other.cells)
    }

    /// Subset resolution: if `subset` is contained in `self`, the leftover cells hold the leftover mines.
    pub fn difference(&self, subset: &Self) -> Result<Self, Contradiction> {
        debug_assert!(subset.cells.is_subset(&self.cells));

        let cells: BTreeSet<_> = self.cells.difference(&subset.cells).copied().collect();
        let count = self
            .count
            .checked_sub(subset.count)
            .ok_or(Contradiction::SubsetExceedsSuperset {
                superset_count: self.count,
                subset_count: subset.count,
            })?;
        Self::from_set(cells, count)
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (row, col)) in self.cells.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "({row}, {col})")?;
        }
        write!(f, "}} = {}", self.count)
    }
}
