use alloc::vec::Vec;

use hashbrown::HashSet;
use rand::prelude::*;
use serde::{Deserialize, Serialize};

use crate::*;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Fact {
    Safe,
    Mine,
}

/// What a single run of [`KnowledgeBase::closure`] achieved.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosureStats {
    pub passes: usize,
    pub mines_found: usize,
    pub safes_found: usize,
    pub constraints_derived: usize,
}

impl ClosureStats {
    pub const fn has_update(&self) -> bool {
        self.mines_found > 0 || self.safes_found > 0 || self.constraints_derived > 0
    }
}

/// Everything the agent has learned about one board.
///
/// Facts are never retracted: `moves_made`, `known_safe` and `known_mine` only grow for the lifetime of the game.
/// Constraints never mention a cell that is already a known fact.
#[derive(Clone, Debug)]
pub struct KnowledgeBase {
    size: Coord2,
    moves_made: HashSet<Coord2>,
    known_safe: HashSet<Coord2>,
    known_mine: HashSet<Coord2>,
    constraints: HashSet<Constraint>,
}

impl KnowledgeBase {
    pub fn new(size: Coord2) -> Self {
        Self {
            size,
            moves_made: HashSet::new(),
            known_safe: HashSet::new(),
            known_mine: HashSet::new(),
            constraints: HashSet::new(),
        }
    }

    pub fn size(&self) -> Coord2 {
        self.size
    }

    pub fn moves_made(&self) -> &HashSet<Coord2> {
        &self.moves_made
    }

    pub fn known_safes(&self) -> &HashSet<Coord2> {
        &self.known_safe
    }

    pub fn known_mines(&self) -> &HashSet<Coord2> {
        &self.known_mine
    }

    pub fn constraints(&self) -> impl Iterator<Item = &Constraint> {
        self.constraints.iter()
    }

    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    pub fn is_known_mine(&self, cell: Coord2) -> bool {
        self.known_mine.contains(&cell)
    }

    pub fn is_known_safe(&self, cell: Coord2) -> bool {
        self.known_safe.contains(&cell)
    }

    /// Ingests the clue of a freshly revealed `cell`: `count` of its neighbors are mines.
    pub fn observe(&mut self, cell: Coord2, count: u8) -> Result<()> {
        if !in_bounds(cell, self.size) {
            return Err(GameError::InvalidCoords);
        }

        self.mark(cell, Fact::Safe)?;
        self.moves_made.insert(cell);

        let mut flagged: i16 = 0;
        let mut unknown = Neighbors::new();
        for neighbor in neighbors(cell, self.size) {
            if self.known_mine.contains(&neighbor) {
                flagged += 1;
            } else if !self.known_safe.contains(&neighbor) {
                unknown.push(neighbor);
            }
        }

        let remaining = i16::from(count) - flagged;
        if remaining < 0 || remaining as usize > unknown.len() {
            return Err(Contradiction::ClueOutOfRange {
                clue: cell,
                remaining_mines: remaining,
                unknown_cells: unknown.len(),
            }
            .into());
        }

        if remaining == 0 {
            for neighbor in unknown {
                self.mark(neighbor, Fact::Safe)?;
            }
        } else if remaining as usize == unknown.len() {
            for neighbor in unknown {
                self.mark(neighbor, Fact::Mine)?;
            }
        } else {
            let constraint = Constraint::new(unknown, remaining as CellCount)?;
            log::trace!("clue at {cell:?} adds {constraint}");
            self.constraints.insert(constraint);
        }

        let stats = self.closure()?;
        log::debug!("observed {cell:?} = {count}, closure: {stats:?}");
        Ok(())
    }

    /// Adds a statement learned elsewhere, cells that are already settled get folded into its count first.
    pub fn add_constraint(&mut self, constraint: Constraint) -> Result<ClosureStats> {
        if constraint.cells().iter().any(|&cell| !in_bounds(cell, self.size)) {
            return Err(GameError::InvalidCoords);
        }

        let settled: Vec<Coord2> = constraint
            .cells()
            .iter()
            .copied()
            .filter(|cell| self.known_mine.contains(cell) || self.known_safe.contains(cell))
            .collect();

        let mut constraint = constraint;
        for cell in settled {
            constraint = constraint.without(cell, self.known_mine.contains(&cell))?;
        }

        if !constraint.is_empty() {
            self.constraints.insert(constraint);
        }
        self.closure()
    }

    /// Applies trivial and subset resolution until a pass derives nothing new.
    pub fn closure(&mut self) -> Result<ClosureStats> {
        let mut stats = ClosureStats::default();

        loop {
            stats.passes += 1;
            let mut changed = false;

            let mut mines = Vec::new();
            let mut safes = Vec::new();
            let mut resolved = Vec::new();
            for constraint in &self.constraints {
                let constraint_mines = constraint.resolved_mines();
                let constraint_safes = constraint.resolved_safes();
                if constraint_mines.is_empty() && constraint_safes.is_empty() {
                    continue;
                }
                mines.extend(constraint_mines);
                safes.extend(constraint_safes);
                resolved.push(constraint.clone());
            }

            let derived = self.subset_resolution()?;

            for constraint in &resolved {
                changed |= self.constraints.remove(constraint);
            }

            for constraint in derived {
                log::trace!("derived {constraint}");
                if self.constraints.insert(constraint) {
                    stats.constraints_derived += 1;
                    changed = true;
                }
            }

            for cell in mines {
                if self.mark(cell, Fact::Mine)? {
                    stats.mines_found += 1;
                    changed = true;
                }
            }
            for cell in safes {
                if self.mark(cell, Fact::Safe)? {
                    stats.safes_found += 1;
                    changed = true;
                }
            }

            if !changed {
                break;
            }
        }

        Ok(stats)
    }

    /// For every strictly nested pair `a ⊂ b`, the cells of `b` outside `a` hold `b.count - a.count` mines.
    fn subset_resolution(&self) -> Result<Vec<Constraint>> {
        let current: Vec<&Constraint> = self.constraints.iter().collect();
        let mut derived = Vec::new();

        for &subset in &current {
            for &superset in &current {
                if !subset.is_strict_subset_of(superset) {
                    continue;
                }

                let constraint = superset.difference(subset)?;
                if !constraint.is_empty()
                    && !self.constraints.contains(&constraint)
                    && !derived.contains(&constraint)
                {
                    derived.push(constraint);
                }
            }
        }

        Ok(derived)
    }

    /// Any known safe cell that was not played yet, the smallest one so replays are stable.
    pub fn safe_move(&self) -> Option<Coord2> {
        self.known_safe
            .iter()
            .filter(|cell| !self.moves_made.contains(*cell))
            .min()
            .copied()
    }

    /// Uniform pick among cells neither played nor known to be mines.
    pub fn random_move<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Coord2> {
        iter_cells(self.size)
            .filter(|cell| !self.moves_made.contains(cell) && !self.known_mine.contains(cell))
            .choose(rng)
    }

    fn mark(&mut self, cell: Coord2, fact: Fact) -> core::result::Result<bool, Contradiction> {
        let (facts, opposite) = match fact {
            Fact::Safe => (&mut self.known_safe, &self.known_mine),
            Fact::Mine => (&mut self.known_mine, &self.known_safe),
        };

        if opposite.contains(&cell) {
            return Err(Contradiction::ConflictingFact { cell });
        }
        if facts.contains(&cell) {
            return Ok(false);
        }

        if self.constraints.iter().any(|constraint| constraint.contains(cell)) {
            let was_mine = fact == Fact::Mine;
            let purged = self
                .constraints
                .iter()
                .map(|constraint| {
                    if constraint.contains(cell) {
                        constraint.without(cell, was_mine)
                    } else {
                        Ok(constraint.clone())
                    }
                })
                .filter(|constraint| !constraint.as_ref().is_ok_and(Constraint::is_empty))
                .collect::<core::result::Result<HashSet<_>, _>>()?;
            self.constraints = purged;
        }
        facts.insert(cell);

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use rand::rngs::SmallRng;

    fn constraint(cells: &[Coord2], count: CellCount) -> Constraint {
        Constraint::new(cells.iter().copied(), count).unwrap()
    }

    fn set(cells: &[Coord2]) -> HashSet<Coord2> {
        cells.iter().copied().collect()
    }

    fn sorted_constraints(kb: &KnowledgeBase) -> Vec<Constraint> {
        let mut constraints: Vec<_> = kb.constraints().cloned().collect();
        constraints.sort_by_key(|c| (c.len(), c.cells().iter().copied().collect::<Vec<_>>()));
        constraints
    }

    #[test]
    fn zero_clue_in_corner_marks_neighbors_safe() {
        let mut kb = KnowledgeBase::new((3, 3));

        kb.observe((0, 0), 0).unwrap();

        assert_eq!(*kb.known_safes(), set(&[(0, 0), (0, 1), (1, 0), (1, 1)]));
        assert!(kb.known_mines().is_empty());
        assert_eq!(kb.constraint_count(), 0);
        assert_eq!(*kb.moves_made(), set(&[(0, 0)]));
    }

    #[test]
    fn full_clue_marks_all_unknown_neighbors_as_mines() {
        let mut kb = KnowledgeBase::new((3, 3));

        kb.observe((0, 0), 3).unwrap();

        assert_eq!(*kb.known_mines(), set(&[(0, 1), (1, 0), (1, 1)]));
        assert_eq!(kb.constraint_count(), 0);
    }

    #[test]
    fn partial_clue_records_constraint_over_all_neighbors() {
        let mut kb = KnowledgeBase::new((3, 3));

        kb.observe((1, 1), 2).unwrap();

        let ring = [
            (0, 0),
            (0, 1),
            (0, 2),
            (1, 0),
            (1, 2),
            (2, 0),
            (2, 1),
            (2, 2),
        ];
        assert_eq!(sorted_constraints(&kb), vec![constraint(&ring, 2)]);
        assert!(kb.known_mines().is_empty());
        assert_eq!(*kb.known_safes(), set(&[(1, 1)]));
    }

    #[test]
    fn overlapping_clue_purges_known_safe_cells() {
        let mut kb = KnowledgeBase::new((3, 3));

        kb.observe((1, 1), 2).unwrap();
        kb.observe((0, 0), 1).unwrap();

        let pair = constraint(&[(0, 1), (1, 0)], 1);
        let rest = constraint(&[(0, 2), (1, 2), (2, 0), (2, 1), (2, 2)], 1);
        let ring_without_corner = constraint(
            &[(0, 1), (0, 2), (1, 0), (1, 2), (2, 0), (2, 1), (2, 2)],
            2,
        );
        assert_eq!(
            sorted_constraints(&kb),
            vec![pair, rest, ring_without_corner]
        );
        assert!(kb.known_mines().is_empty());
        assert_eq!(*kb.known_safes(), set(&[(0, 0), (1, 1)]));
    }

    #[test]
    fn subset_resolution_finds_the_odd_cell_out() {
        let mut kb = KnowledgeBase::new((3, 3));
        let (a, b, c) = ((0, 0), (0, 1), (0, 2));

        kb.add_constraint(constraint(&[a, b, c], 2)).unwrap();
        assert!(kb.known_mines().is_empty());

        let stats = kb.add_constraint(constraint(&[a, b], 1)).unwrap();

        assert_eq!(stats.mines_found, 1);
        assert!(kb.is_known_mine(c));
        assert_eq!(sorted_constraints(&kb), vec![constraint(&[a, b], 1)]);
    }

    #[test]
    fn closure_is_idempotent() {
        let mut kb = KnowledgeBase::new((4, 4));
        kb.observe((0, 0), 1).unwrap();
        kb.observe((0, 1), 1).unwrap();
        kb.observe((3, 3), 2).unwrap();

        let mines = kb.known_mines().clone();
        let safes = kb.known_safes().clone();
        let constraints = sorted_constraints(&kb);

        let stats = kb.closure().unwrap();

        assert_eq!(stats.passes, 1);
        assert!(!stats.has_update());
        assert_eq!(*kb.known_mines(), mines);
        assert_eq!(*kb.known_safes(), safes);
        assert_eq!(sorted_constraints(&kb), constraints);
    }

    #[test]
    fn chained_clues_resolve_a_one_two_one_row() {
        // mines at (1, 0) and (1, 2) under a revealed top row of a 2x3 board
        let mut kb = KnowledgeBase::new((2, 3));

        kb.observe((0, 0), 1).unwrap();
        kb.observe((0, 1), 2).unwrap();
        kb.observe((0, 2), 1).unwrap();

        assert_eq!(*kb.known_mines(), set(&[(1, 0), (1, 2)]));
        assert!(kb.is_known_safe((1, 1)));
        assert_eq!(kb.constraint_count(), 0);
        assert_eq!(kb.safe_move(), Some((1, 1)));
    }

    #[test]
    fn facts_only_grow() {
        let field = Minefield::from_mine_coords((5, 5), &[(0, 4), (2, 2), (4, 0)]).unwrap();
        let mut kb = KnowledgeBase::new(field.size());
        let mut rng = SmallRng::seed_from_u64(7);

        let mut mines = HashSet::new();
        let mut safes = HashSet::new();
        let mut moves = HashSet::new();

        while let Some(cell) = kb.safe_move().or_else(|| kb.random_move(&mut rng)) {
            if field.contains_mine(cell) {
                break;
            }
            kb.observe(cell, field.adjacent_mine_count(cell)).unwrap();

            assert!(mines.is_subset(kb.known_mines()));
            assert!(safes.is_subset(kb.known_safes()));
            assert!(moves.is_subset(kb.moves_made()));
            assert!(kb.known_mines().is_disjoint(kb.known_safes()));
            for constraint in kb.constraints() {
                assert!(!constraint.is_empty());
                assert!(constraint.cells().iter().all(|cell| {
                    !kb.is_known_mine(*cell) && !kb.is_known_safe(*cell)
                }));
            }

            mines = kb.known_mines().clone();
            safes = kb.known_safes().clone();
            moves = kb.moves_made().clone();
        }

        assert!(kb.known_mines().iter().all(|&cell| field.contains_mine(cell)));
        assert!(kb.known_safes().iter().all(|&cell| !field.contains_mine(cell)));
    }

    #[test]
    fn safe_move_skips_played_cells() {
        let mut kb = KnowledgeBase::new((3, 3));

        kb.observe((0, 0), 0).unwrap();
        let first = kb.safe_move().unwrap();
        assert_ne!(first, (0, 0));

        kb.observe((0, 1), 0).unwrap();
        kb.observe((1, 0), 0).unwrap();
        kb.observe((1, 1), 0).unwrap();

        while let Some(cell) = kb.safe_move() {
            assert!(!kb.moves_made().contains(&cell));
            kb.observe(cell, 0).unwrap();
        }
        assert_eq!(kb.moves_made().len(), 9);
    }

    #[test]
    fn safe_move_is_none_without_certain_cells() {
        let mut kb = KnowledgeBase::new((3, 3));
        assert_eq!(kb.safe_move(), None);

        kb.observe((1, 1), 1).unwrap();
        assert_eq!(kb.safe_move(), None);
    }

    #[test]
    fn random_move_avoids_mines_and_played_cells() {
        let mut kb = KnowledgeBase::new((3, 3));
        let mut rng = SmallRng::seed_from_u64(42);

        kb.observe((0, 0), 3).unwrap();
        for _ in 0..64 {
            let cell = kb.random_move(&mut rng).unwrap();
            assert_ne!(cell, (0, 0));
            assert!(!kb.is_known_mine(cell));
        }
    }

    #[test]
    fn random_move_is_none_when_only_mines_remain() {
        let mut kb = KnowledgeBase::new((1, 2));
        let mut rng = SmallRng::seed_from_u64(1);

        kb.observe((0, 0), 1).unwrap();

        assert!(kb.is_known_mine((0, 1)));
        assert_eq!(kb.random_move(&mut rng), None);
        assert_eq!(kb.safe_move(), None);
    }

    #[test]
    fn clue_larger_than_neighborhood_is_a_contradiction() {
        let mut kb = KnowledgeBase::new((3, 3));

        let err = kb.observe((0, 0), 4).unwrap_err();

        assert_eq!(
            err,
            GameError::Contradiction(Contradiction::ClueOutOfRange {
                clue: (0, 0),
                remaining_mines: 4,
                unknown_cells: 3,
            })
        );
    }

    #[test]
    fn clue_below_known_mines_is_a_contradiction() {
        let mut kb = KnowledgeBase::new((1, 3));
        kb.observe((0, 0), 1).unwrap();
        assert!(kb.is_known_mine((0, 1)));

        let err = kb.observe((0, 2), 0).unwrap_err();

        assert!(matches!(
            err,
            GameError::Contradiction(Contradiction::ClueOutOfRange {
                remaining_mines: -1,
                ..
            })
        ));
    }

    #[test]
    fn revealing_a_known_mine_is_a_contradiction() {
        let mut kb = KnowledgeBase::new((1, 2));
        kb.observe((0, 0), 1).unwrap();

        assert_eq!(
            kb.observe((0, 1), 1),
            Err(GameError::Contradiction(Contradiction::ConflictingFact {
                cell: (0, 1)
            }))
        );
    }

    #[test]
    fn inconsistent_constraint_is_rejected() {
        let mut kb = KnowledgeBase::new((3, 3));
        kb.observe((0, 0), 0).unwrap();

        let err = kb.add_constraint(constraint(&[(0, 1), (1, 1)], 2)).unwrap_err();

        assert!(matches!(err, GameError::Contradiction(_)));
    }

    #[test]
    fn failed_purge_keeps_unrelated_constraints() {
        let mut kb = KnowledgeBase::new((3, 3));
        let unrelated = constraint(&[(2, 0), (2, 1)], 1);
        kb.add_constraint(constraint(&[(0, 0), (0, 1), (1, 0)], 1)).unwrap();
        kb.add_constraint(unrelated.clone()).unwrap();

        let err = kb.add_constraint(constraint(&[(0, 0), (0, 1), (0, 2)], 3)).unwrap_err();

        assert_eq!(err, GameError::Contradiction(Contradiction::NegativeCount { cell: (0, 1) }));
        assert!(kb.constraints().any(|c| *c == unrelated));
        assert!(!kb.is_known_mine((0, 1)));
    }

    #[test]
    fn out_of_bounds_observation_is_rejected() {
        let mut kb = KnowledgeBase::new((3, 3));

        assert_eq!(kb.observe((3, 0), 0), Err(GameError::InvalidCoords));
        assert!(kb.moves_made().is_empty());
    }
}
