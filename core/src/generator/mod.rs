use serde::{Deserialize, Serialize};

use crate::*;
pub use random::*;

mod random;

pub trait MinefieldGenerator {
    fn generate(self, config: GameConfig) -> Minefield;
}

/// How much luck the first reveal at the generator's start cell needs.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum StartTile {
    /// Mines anywhere, the first reveal may lose.
    #[default]
    Random,
    /// The start cell itself is mine-free.
    SimpleSafe,
    /// The start cell and its neighbors are mine-free, so the first clue is a zero.
    AlwaysZero,
}
