use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Coord2;

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("Invalid coordinates")]
    InvalidCoords,
    #[error("Game already ended, no new moves are accepted")]
    AlreadyEnded,
    #[error("Knowledge base contradiction: {0}")]
    Contradiction(#[from] Contradiction),
}

pub type Result<T> = core::result::Result<T, GameError>;

/// Inconsistent information fed to the knowledge base.
///
/// These only arise from a dishonest board or a buggy game loop, the engine must be discarded afterwards.
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Contradiction {
    #[error("clue at {clue:?} leaves {remaining_mines} mines for {unknown_cells} unknown cells")]
    ClueOutOfRange {
        clue: Coord2,
        remaining_mines: i16,
        unknown_cells: usize,
    },
    #[error("{count} mines cannot fit in {cells} cells")]
    CountOutOfRange { cells: usize, count: u16 },
    #[error("a subset holding {subset_count} mines cannot fit in a superset holding {superset_count}")]
    SubsetExceedsSuperset { superset_count: u16, subset_count: u16 },
    #[error("removing mine {cell:?} leaves a negative count")]
    NegativeCount { cell: Coord2 },
    #[error("{cell:?} is known to be both safe and a mine")]
    ConflictingFact { cell: Coord2 },
}
