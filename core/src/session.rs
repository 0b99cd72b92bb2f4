use rand::prelude::*;
use serde::{Deserialize, Serialize};

use crate::*;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    #[default]
    Ready,
    Active,
    Won,
    Lost,
}

impl SessionState {
    pub const fn is_ready(self) -> bool {
        matches!(self, Self::Ready)
    }

    pub const fn is_finished(self) -> bool {
        matches!(self, Self::Won | Self::Lost)
    }
}

/// Where a move came from.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveKind {
    /// Proven mine-free by the knowledge base.
    Safe,
    /// A guess among cells not known to be mines.
    Random,
    /// Picked by the caller, usually the opening move.
    Chosen,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveResult {
    Revealed(u8),
    HitMine,
    Won,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepOutcome {
    Moved {
        cell: Coord2,
        kind: MoveKind,
        result: MoveResult,
    },
    /// Nothing left to reveal that is not a known mine.
    Stuck,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSummary {
    pub state: SessionState,
    pub moves: usize,
    pub safe_moves: usize,
    pub random_moves: usize,
    pub chosen_moves: usize,
    pub mines_flagged: usize,
    pub triggered_mine: Option<Coord2>,
}

/// Game loop driving a [`KnowledgeBase`] against a [`Minefield`].
///
/// Each step plays a proven safe cell when one exists and guesses otherwise, feeding every clue back into the
/// knowledge base. Flags are the knowledge base's known mines.
#[derive(Clone, Debug)]
pub struct Autoplayer {
    minefield: Minefield,
    knowledge: KnowledgeBase,
    state: SessionState,
    revealed_count: CellCount,
    safe_moves: usize,
    random_moves: usize,
    chosen_moves: usize,
    triggered_mine: Option<Coord2>,
}

impl Autoplayer {
    pub fn new(minefield: Minefield) -> Self {
        let knowledge = KnowledgeBase::new(minefield.size());
        Self {
            minefield,
            knowledge,
            state: Default::default(),
            revealed_count: 0,
            safe_moves: 0,
            random_moves: 0,
            chosen_moves: 0,
            triggered_mine: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        self.state.is_finished()
    }

    pub fn minefield(&self) -> &Minefield {
        &self.minefield
    }

    pub fn knowledge(&self) -> &KnowledgeBase {
        &self.knowledge
    }

    pub fn triggered_mine(&self) -> Option<Coord2> {
        self.triggered_mine
    }

    pub fn summary(&self) -> GameSummary {
        GameSummary {
            state: self.state,
            moves: self.safe_moves + self.random_moves + self.chosen_moves,
            safe_moves: self.safe_moves,
            random_moves: self.random_moves,
            chosen_moves: self.chosen_moves,
            mines_flagged: self.knowledge.known_mines().len(),
            triggered_mine: self.triggered_mine,
        }
    }

    /// Plays a single move, `rng` is only consulted when no safe move is known.
    pub fn step<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<StepOutcome> {
        self.check_not_finished()?;

        let (cell, kind) = match self.knowledge.safe_move() {
            Some(cell) => (cell, MoveKind::Safe),
            None => match self.knowledge.random_move(rng) {
                Some(cell) => (cell, MoveKind::Random),
                None => {
                    log::info!("No move available, {} cells revealed", self.revealed_count);
                    return Ok(StepOutcome::Stuck);
                }
            },
        };

        self.play_move(cell, kind)
    }

    /// Reveals `cell` regardless of what the knowledge base thinks of it.
    pub fn open(&mut self, cell: Coord2) -> Result<StepOutcome> {
        self.check_not_finished()?;
        let cell = self.minefield.validate_coords(cell)?;
        if self.knowledge.moves_made().contains(&cell) {
            return Err(GameError::InvalidCoords);
        }
        self.play_move(cell, MoveKind::Chosen)
    }

    fn play_move(&mut self, cell: Coord2, kind: MoveKind) -> Result<StepOutcome> {
        match kind {
            MoveKind::Safe => self.safe_moves += 1,
            MoveKind::Random => self.random_moves += 1,
            MoveKind::Chosen => self.chosen_moves += 1,
        }

        let result = self.reveal(cell)?;
        log::debug!("{kind:?} move at {cell:?}: {result:?}");
        Ok(StepOutcome::Moved { cell, kind, result })
    }

    /// Steps until the game is decided or no move is left.
    pub fn play<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<GameSummary> {
        while !self.is_finished() {
            if self.step(rng)? == StepOutcome::Stuck {
                break;
            }
        }

        let summary = self.summary();
        log::info!(
            "Game over: {:?} after {} moves ({} guesses), {} mines flagged",
            summary.state,
            summary.moves,
            summary.random_moves,
            summary.mines_flagged
        );
        Ok(summary)
    }

    fn reveal(&mut self, cell: Coord2) -> Result<MoveResult> {
        let cell = self.minefield.validate_coords(cell)?;

        if self.minefield.contains_mine(cell) {
            self.triggered_mine = Some(cell);
            self.end_game(false);
            return Ok(MoveResult::HitMine);
        }

        let count = self.minefield.adjacent_mine_count(cell);
        self.knowledge.observe(cell, count)?;
        self.revealed_count += 1;
        self.mark_started();

        if self.revealed_count == self.minefield.safe_cell_count()
            || self.minefield.all_flagged(self.knowledge.known_mines())
        {
            self.end_game(true);
            Ok(MoveResult::Won)
        } else {
            Ok(MoveResult::Revealed(count))
        }
    }

    fn mark_started(&mut self) {
        if self.state.is_ready() {
            self.state = SessionState::Active;
        }
    }

    fn end_game(&mut self, won: bool) {
        if self.state.is_finished() {
            return;
        }

        self.state = if won {
            SessionState::Won
        } else {
            SessionState::Lost
        };
    }

    fn check_not_finished(&self) -> Result<()> {
        if self.state.is_finished() {
            Err(GameError::AlreadyEnded)
        } else {
            Ok(())
        }
    }
}
