//! Cascading collapse propagation.
//!
//! A collapse starts at a detected structural failure and spreads upwards
//! and outwards through a frontier of candidate positions. Each round the
//! allowed radius shrinks geometrically, so a cascade always terminates in
//! `O(log radius²)` rounds no matter what the propagation chance is.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::hooks::WorldModel;
use crate::pos::BlockPos;
use crate::rng::SimRng;

/// The factor applied to the squared radius after every round.
pub const RADIUS_DECAY: f64 = 0.8;

/// One in-progress cascading failure.
///
/// Destroyed (dropped from the tracker's list) once the frontier empties.
/// `radius_squared` is monotonically non-increasing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Collapse {
    center: BlockPos,
    frontier: Vec<BlockPos>,
    radius_squared: f64,
}

impl Collapse {
    pub fn new(center: BlockPos, frontier: Vec<BlockPos>, radius_squared: f64) -> Self {
        Self {
            center,
            frontier,
            radius_squared,
        }
    }

    /// Seed a collapse from the positions participating in the initial
    /// failure. The radius covers the farthest participant, and each
    /// participant independently rolls `seed_chance` to contribute the
    /// position above it to the frontier.
    pub fn around(
        center: BlockPos,
        positions: &[BlockPos],
        seed_chance: f32,
        rng: &mut SimRng,
    ) -> Self {
        let mut radius_squared = 0.0_f64;
        let mut frontier = Vec::new();
        for pos in positions {
            let dist_squared = pos.dist_sqr(&center);
            if dist_squared > radius_squared {
                radius_squared = dist_squared;
            }
            if rng.chance(seed_chance) {
                frontier.push(pos.above());
            }
        }
        Self::new(center, frontier, radius_squared)
    }

    pub fn center(&self) -> BlockPos {
        self.center
    }

    pub fn frontier(&self) -> &[BlockPos] {
        &self.frontier
    }

    pub fn radius_squared(&self) -> f64 {
        self.radius_squared
    }

    /// Normal termination: nothing left to check.
    pub fn is_finished(&self) -> bool {
        self.frontier.is_empty()
    }

    /// Run one propagation round. For every frontier position that is
    /// still unstable, free to fall, strictly inside the radius, and wins
    /// its chance roll, the world's collapse action runs; on success the
    /// position above joins the next frontier (set semantics, so a
    /// position reached from two predecessors is only checked once).
    ///
    /// Afterwards the frontier is replaced and the radius decays by
    /// [`RADIUS_DECAY`]. Returns the positions collapsed this round; an
    /// empty round is normal termination, not a failure.
    pub fn propagate(
        &mut self,
        world: &mut dyn WorldModel,
        rng: &mut SimRng,
        propagate_chance: f32,
    ) -> Vec<BlockPos> {
        // Ordered set keeps the next round's iteration deterministic.
        let mut next_frontier: BTreeSet<BlockPos> = BTreeSet::new();
        let mut collapsed = Vec::new();

        for pos in std::mem::take(&mut self.frontier) {
            if world.is_unstable(pos)
                && world.can_fall(pos)
                && pos.dist_sqr(&self.center) < self.radius_squared
                && rng.chance(propagate_chance)
                && world.collapse_at(pos)
            {
                // This column has started to collapse; follow up above.
                next_frontier.insert(pos.above());
                collapsed.push(pos);
            }
        }

        self.frontier.extend(next_frontier);
        self.radius_squared *= RADIUS_DECAY;
        collapsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::GridWorld;

    fn origin() -> BlockPos {
        BlockPos::new(0, 0, 0)
    }

    #[test]
    fn radius_decays_every_round() {
        let mut world = GridWorld::new();
        world.fill_column(origin(), 0, 10);
        let mut rng = SimRng::new(1);
        let mut collapse = Collapse::new(origin(), vec![origin()], 100.0);

        collapse.propagate(&mut world, &mut rng, 1.0);
        assert_eq!(collapse.radius_squared(), 80.0);
        collapse.propagate(&mut world, &mut rng, 1.0);
        assert_eq!(collapse.radius_squared(), 64.0);
    }

    #[test]
    fn successful_collapse_follows_up_above() {
        let mut world = GridWorld::new();
        world.fill_column(origin(), 0, 5);
        let mut rng = SimRng::new(2);
        let mut collapse = Collapse::new(origin(), vec![origin()], 1_000.0);

        let collapsed = collapse.propagate(&mut world, &mut rng, 1.0);
        assert_eq!(collapsed, vec![origin()]);
        assert_eq!(collapse.frontier(), &[origin().above()]);
    }

    #[test]
    fn duplicate_next_positions_deduplicate() {
        let mut world = GridWorld::new();
        // Two frontier entries at the same position.
        world.fill_column(origin(), 0, 3);
        let mut rng = SimRng::new(3);
        let mut collapse = Collapse::new(origin(), vec![origin(), origin()], 1_000.0);

        collapse.propagate(&mut world, &mut rng, 1.0);
        assert_eq!(collapse.frontier().len(), 1);
    }

    #[test]
    fn positions_at_radius_boundary_are_excluded() {
        let mut world = GridWorld::new();
        let far = BlockPos::new(5, 0, 0);
        world.fill_column(far, 0, 3);
        let mut rng = SimRng::new(4);
        // dist_sqr(far, origin) == 25.0 exactly; strict < excludes it.
        let mut collapse = Collapse::new(origin(), vec![far], 25.0);

        let collapsed = collapse.propagate(&mut world, &mut rng, 1.0);
        assert!(collapsed.is_empty());
        assert!(collapse.is_finished());
    }

    #[test]
    fn stable_positions_terminate_the_cascade() {
        let mut world = GridWorld::new();
        let mut rng = SimRng::new(5);
        // Nothing in the world is unstable.
        let mut collapse = Collapse::new(origin(), vec![origin()], 100.0);

        let collapsed = collapse.propagate(&mut world, &mut rng, 1.0);
        assert!(collapsed.is_empty());
        assert!(collapse.is_finished());
    }

    #[test]
    fn cascade_terminates_within_log_bound() {
        let mut world = GridWorld::new();
        world.fill_box(BlockPos::new(-4, 0, -4), BlockPos::new(4, 200, 4));
        let mut rng = SimRng::new(6);
        let initial_radius = 64.0;
        let mut collapse = Collapse::new(origin(), vec![origin()], initial_radius);

        // radius² decays by 0.8 each round; once below 1.0 even the center
        // fails the strict distance test from any followed-up position.
        let mut rounds = 0;
        while !collapse.is_finished() {
            collapse.propagate(&mut world, &mut rng, 1.0);
            rounds += 1;
            assert!(rounds < 64, "cascade failed to terminate");
        }
        let bound = (initial_radius.ln() / (1.0 / RADIUS_DECAY).ln()).ceil() as u32 + 2;
        assert!(rounds <= bound, "{rounds} rounds > bound {bound}");
    }

    #[test]
    fn around_covers_farthest_participant() {
        let mut rng = SimRng::new(7);
        let positions = [BlockPos::new(1, 0, 0), BlockPos::new(3, 0, 4)];
        let collapse = Collapse::around(origin(), &positions, 1.0, &mut rng);
        assert_eq!(collapse.radius_squared(), 25.0);
        assert_eq!(collapse.frontier().len(), 2);
        assert_eq!(collapse.frontier()[0], positions[0].above());
    }

    #[test]
    fn around_with_zero_seed_chance_starts_finished() {
        let mut rng = SimRng::new(8);
        let positions = [BlockPos::new(1, 0, 0)];
        let collapse = Collapse::around(origin(), &positions, 0.0, &mut rng);
        assert!(collapse.is_finished());
        assert_eq!(collapse.radius_squared(), 1.0);
    }
}
