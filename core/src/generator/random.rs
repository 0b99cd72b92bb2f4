use alloc::vec::Vec;

use ndarray::Array2;
use rand::prelude::*;
use rand::seq::index;

use super::*;

/// Generation strategy that can optionally keep the starting cell (and its neighbors) free of mines, but other than
/// that is purely random.
#[derive(Clone, Debug, PartialEq)]
pub struct RandomMinefieldGenerator {
    seed: u64,
    start: Coord2,
    start_tile: StartTile,
}

impl RandomMinefieldGenerator {
    pub fn new(seed: u64, start: Coord2, start_tile: StartTile) -> Self {
        Self {
            seed,
            start,
            start_tile,
        }
    }

    /// Cells the start tile policy keeps clear, downgrading the policy when the board is too crowded.
    fn reserved_cells(&self, config: GameConfig) -> Neighbors {
        use StartTile::*;

        let total_cells = config.total_cells();
        let mut reserved = Neighbors::new();

        if !in_bounds(self.start, config.size) {
            if self.start_tile != Random {
                log::warn!("Start {:?} is off the board, fallback to random", self.start);
            }
            return reserved;
        }

        let around = neighbors(self.start, config.size);
        let actual_start_tile = match self.start_tile {
            Random => Random,
            SimpleSafe | AlwaysZero if config.mines + 1 > total_cells => {
                log::warn!("Cannot make start tile safe, fallback to random");
                Random
            }
            SimpleSafe => SimpleSafe,
            AlwaysZero if usize::from(config.mines) + 1 + around.len() > usize::from(total_cells) => {
                log::warn!("Cannot make start tile zero, fallback to simple safe");
                SimpleSafe
            }
            AlwaysZero => AlwaysZero,
        };

        match actual_start_tile {
            Random => {}
            SimpleSafe => reserved.push(self.start),
            AlwaysZero => {
                reserved.push(self.start);
                reserved.extend(around);
            }
        }
        reserved
    }
}

impl MinefieldGenerator for RandomMinefieldGenerator {
    fn generate(self, config: GameConfig) -> Minefield {
        let total_cells = config.total_cells();

        // optimize for full boards
        if config.mines >= total_cells {
            if config.mines > total_cells {
                log::warn!(
                    "Minefield already full, generated anyway, requested {} but only fits {}",
                    config.mines,
                    total_cells
                );
            }
            return Minefield::from_mine_mask(Array2::from_elem(config.size.to_nd_index(), true));
        }

        let reserved = self.reserved_cells(config);
        let candidates: Vec<Coord2> = iter_cells(config.size)
            .filter(|coords| !reserved.contains(coords))
            .collect();

        let mut rng = SmallRng::seed_from_u64(self.seed);
        let mut mine_mask: Array2<bool> = Array2::default(config.size.to_nd_index());
        for i in index::sample(&mut rng, candidates.len(), config.mines.into()) {
            mine_mask[candidates[i].to_nd_index()] = true;
        }

        let minefield = Minefield::from_mine_mask(mine_mask);
        log::debug!(
            "Generated {}x{} minefield with {} mines, seed {}",
            config.size.0,
            config.size.1,
            minefield.mine_count(),
            self.seed
        );
        minefield
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generate(seed: u64, start: Coord2, start_tile: StartTile, config: GameConfig) -> Minefield {
        RandomMinefieldGenerator::new(seed, start, start_tile).generate(config)
    }

    #[test]
    fn places_requested_mine_count() {
        let config = GameConfig::new((9, 9), 10);
        let field = generate(3, (0, 0), StartTile::Random, config);

        assert_eq!(field.size(), (9, 9));
        assert_eq!(field.mine_count(), 10);
        assert_eq!(field.iter_mines().count(), 10);
    }

    #[test]
    fn same_seed_same_field() {
        let config = GameConfig::intermediate();
        let a = generate(99, (4, 4), StartTile::SimpleSafe, config);
        let b = generate(99, (4, 4), StartTile::SimpleSafe, config);

        assert_eq!(a, b);
    }

    #[test]
    fn simple_safe_keeps_start_clear() {
        let config = GameConfig::new((4, 4), 15);
        let field = generate(11, (2, 1), StartTile::SimpleSafe, config);

        assert!(!field.contains_mine((2, 1)));
        assert_eq!(field.mine_count(), 15);
    }

    #[test]
    fn always_zero_keeps_start_neighborhood_clear() {
        for seed in 0..16 {
            let field = generate(seed, (4, 4), StartTile::AlwaysZero, GameConfig::beginner());

            assert!(!field.contains_mine((4, 4)));
            assert_eq!(field.adjacent_mine_count((4, 4)), 0);
            assert_eq!(field.mine_count(), 8);
        }
    }

    #[test]
    fn always_zero_falls_back_when_crowded() {
        // a corner start reserves four cells, only three are left
        let config = GameConfig::new((2, 3), 3);
        let field = generate(5, (0, 0), StartTile::AlwaysZero, config);

        assert!(!field.contains_mine((0, 0)));
        assert_eq!(field.mine_count(), 3);
    }

    #[test]
    fn full_board_is_all_mines() {
        let config = GameConfig::new((2, 2), 4);
        let field = generate(0, (0, 0), StartTile::AlwaysZero, config);

        assert_eq!(field.safe_cell_count(), 0);
    }
}
