use alloc::vec::Vec;

use ndarray::Array2;

use super::*;

/// Seeded uniform mine placement that can keep the first opened cell safe,
/// or make it a zero so the opening floods.
#[derive(Clone, Debug, PartialEq)]
pub struct RandomLayoutGenerator {
    seed: u64,
    start: Coord2,
    start_tile: StartTile,
}

impl RandomLayoutGenerator {
    pub fn new(seed: u64, start: Coord2, start_tile: StartTile) -> Self {
        Self {
            seed,
            start,
            start_tile,
        }
    }
}

impl LayoutGenerator for RandomLayoutGenerator {
    fn generate(self, config: GameConfig) -> MineLayout {
        use rand::prelude::*;
        use StartTile::*;

        let total_cells = config.total_cells();
        let mines = config.mines.min(total_cells);
        if mines < config.mines {
            log::warn!(
                "Board already full, requested {} mines but only {} fit",
                config.mines,
                total_cells
            );
        }

        let start = if self.start.0 < config.size.0 && self.start.1 < config.size.1 {
            self.start
        } else {
            log::warn!("Start cell {:?} is off the board, using (0, 0)", self.start);
            (0, 0)
        };

        let mut reserved: Vec<Coord2> = Vec::new();
        let actual_start_tile = match self.start_tile {
            Random => Random,
            SimpleSafe | AlwaysZero if mines + 1 > total_cells => {
                log::warn!("Cannot make start cell safe, fallback to random");
                Random
            }
            SimpleSafe => SimpleSafe,
            AlwaysZero if usize::from(mines) + 1 + NeighborIter::new(start, config.size).count()
                > usize::from(total_cells) =>
            {
                log::warn!("Cannot make start cell zero, fallback to simple safe");
                SimpleSafe
            }
            AlwaysZero => AlwaysZero,
        };
        match actual_start_tile {
            Random => {}
            SimpleSafe => reserved.push(start),
            AlwaysZero => {
                reserved.push(start);
                reserved.extend(NeighborIter::new(start, config.size));
            }
        }

        let mut candidates: Vec<Coord2> = RowMajor::new(config.size)
            .filter(|coords| !reserved.contains(coords))
            .collect();
        let mut rng = SmallRng::seed_from_u64(self.seed);
        candidates.shuffle(&mut rng);

        let mut mine_mask: Array2<bool> = Array2::default(config.size.to_nd_index());
        for coords in candidates.into_iter().take(usize::from(mines)) {
            mine_mask[coords.to_nd_index()] = true;
        }

        let mut layout = MineLayout {
            mine_mask,
            mine_count: 0,
        };
        layout.mine_count = layout
            .mine_mask
            .iter()
            .filter(|&&is_mine| is_mine)
            .count() as CellCount;
        if layout.mine_count != config.mines {
            log::warn!(
                "Generated layout count mismatch, actual: {}, requested: {}",
                layout.mine_count,
                config.mines
            );
        }
        layout
    }
}
