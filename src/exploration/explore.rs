//! Frontier-driven fog-of-war reveal.
//!
//! Exploration is two-phase. [`ExplorationEngine::prepare_next`] chooses the
//! next tile and highlights it; [`ExplorationEngine::reveal`] commits it,
//! marking it explored and moving the player onto it. At most one tile is
//! pending at a time.

use std::collections::VecDeque;

use rand::seq::SliceRandom;
use tracing::{debug, trace};

use crate::seeds::{SeedPurpose, SeededRng, ZoneSeeds};
use crate::tilemap::{Coord, Tilemap};
use crate::zone::Zone;

/// Result of [`ExplorationEngine::prepare_next`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExploreStep {
    /// A tile is highlighted and waiting for [`ExplorationEngine::reveal`].
    Prepared(Coord),
    /// No frontier tile can be reached from the player.
    NothingLeft,
    /// The player is not in the zone.
    NotInZone,
}

/// Result of [`ExplorationEngine::reveal`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RevealOutcome {
    Revealed(Coord),
    /// Every explorable tile is already explored.
    Complete,
}

/// Exploration state for one zone.
#[derive(Clone, Debug)]
pub struct ExplorationEngine {
    pending: Option<Coord>,
    rng: SeededRng,
}

impl ExplorationEngine {
    /// Engine with tie-breaking drawn from the zone's explore stream.
    pub fn new(zone: &Zone) -> Self {
        let seeds = ZoneSeeds::new(zone.world_seed.as_str(), zone.id.as_str());
        Self::with_rng(seeds.rng(SeedPurpose::Explore))
    }

    pub fn with_rng(rng: SeededRng) -> Self {
        Self { pending: None, rng }
    }

    /// Tile waiting to be revealed, if any.
    pub fn pending(&self) -> Option<Coord> {
        self.pending
    }

    pub fn is_idle(&self) -> bool {
        self.pending.is_none()
    }

    /// Choose and highlight the next tile to reveal.
    ///
    /// An unexplored neighbor of the player always wins (picked at random
    /// among them). Otherwise frontier tiles are ranked by the walking
    /// distance to their nearest known neighbor: everything within one step
    /// of the cheapest is kept, the tiles with the most known neighbors are
    /// preferred, and what remains is a random pick.
    pub fn prepare_next(&mut self, zone: &mut Zone) -> ExploreStep {
        if let Some(p) = self.pending {
            if zone.active_explore() == Some(p) && is_unexplored(zone, p) {
                return ExploreStep::Prepared(p);
            }
            self.pending = None;
        }

        let Some(player) = zone.player() else {
            return ExploreStep::NotInZone;
        };

        let adjacent: Vec<Coord> = zone.neighbors(player).filter(|&c| is_unexplored(zone, c)).collect();
        let choice = if adjacent.is_empty() {
            self.pick_frontier(zone, player)
        } else {
            adjacent.choose(&mut self.rng).copied()
        };

        let Some(target) = choice else {
            debug!(zone_id = %zone.id, "nothing left to explore");
            return ExploreStep::NothingLeft;
        };

        zone.set_active_explore(Some(target));
        self.pending = Some(target);
        trace!(target = %target, "exploration target prepared");
        ExploreStep::Prepared(target)
    }

    fn pick_frontier(&mut self, zone: &Zone, player: Coord) -> Option<Coord> {
        let distances = walking_distances(zone, player);

        // (tile, stance cost, known-neighbor count)
        let mut frontier: Vec<(Coord, usize, usize)> = Vec::new();
        for c in zone.tiles().coords() {
            if !is_unexplored(zone, c) || c == player {
                continue;
            }
            let mut known = 0;
            let mut cost: Option<usize> = None;
            for n in zone.neighbors(c) {
                if !zone.is_known_walkable(n) {
                    continue;
                }
                known += 1;
                if let Some(d) = *distances.at(n) {
                    cost = Some(cost.map_or(d, |best| best.min(d)));
                }
            }
            if let Some(cost) = cost {
                frontier.push((c, cost, known));
            }
        }

        let cheapest = frontier.iter().map(|f| f.1).min()?;
        let near: Vec<&(Coord, usize, usize)> =
            frontier.iter().filter(|f| f.1 <= cheapest + 1).collect();
        let smoothest = near.iter().map(|f| f.2).max()?;
        let best: Vec<Coord> = near.iter().filter(|f| f.2 == smoothest).map(|f| f.0).collect();

        best.choose(&mut self.rng).copied()
    }

    /// Commit the pending tile: clear the highlight, mark it explored and put
    /// the player on it.
    ///
    /// With nothing pending, the first frontier tile in row-major order is
    /// revealed instead (or, failing that, the first unexplored walkable tile)
    /// so that progress is made even when called out of sequence.
    pub fn reveal(&mut self, zone: &mut Zone) -> RevealOutcome {
        let target = match self.pending.take() {
            Some(p) if is_unexplored(zone, p) => p,
            _ => match fallback_target(zone) {
                Some(c) => {
                    debug!(target = %c, "reveal without a prepared tile; using row-major fallback");
                    c
                }
                None => return RevealOutcome::Complete,
            },
        };

        zone.set_active_explore(None);
        zone.mark_explored(target);
        zone.move_player(target);
        RevealOutcome::Revealed(target)
    }

    /// Drop the pending tile and its highlight.
    pub fn cancel(&mut self, zone: &mut Zone) {
        if self.pending.take().is_some() {
            zone.set_active_explore(None);
        }
    }
}

fn is_unexplored(zone: &Zone, c: Coord) -> bool {
    zone.tile(c).is_some_and(|t| t.is_walkable() && !t.is_explored())
}

/// BFS distances from the player through known walkable tiles.
fn walking_distances(zone: &Zone, from: Coord) -> Tilemap<Option<usize>> {
    let mut dist: Tilemap<Option<usize>> = Tilemap::new(zone.width(), zone.height());
    let mut queue = VecDeque::new();
    *dist.at_mut(from) = Some(0);
    queue.push_back(from);

    while let Some(c) = queue.pop_front() {
        let d = dist.at(c).unwrap_or(0);
        for n in zone.neighbors(c) {
            if dist.at(n).is_none() && zone.is_known_walkable(n) {
                *dist.at_mut(n) = Some(d + 1);
                queue.push_back(n);
            }
        }
    }
    dist
}

fn fallback_target(zone: &Zone) -> Option<Coord> {
    let mut first_unexplored = None;
    for c in zone.tiles().coords() {
        if !is_unexplored(zone, c) {
            continue;
        }
        if zone.neighbors(c).any(|n| zone.is_known_walkable(n)) {
            return Some(c);
        }
        first_unexplored.get_or_insert(c);
    }
    first_unexplored
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::GeneratorConfig;
    use crate::zone::{build_zone, ZoneDefinition};

    fn corridor() -> Zone {
        let def = ZoneDefinition::from_layout("hall", &["#######", "#.....#", "#######"]);
        let mut zone = build_zone(&def, "w").unwrap();
        zone.enter();
        zone
    }

    #[test]
    fn test_prefers_adjacent_tile() {
        let mut zone = corridor();
        let mut engine = ExplorationEngine::new(&zone);
        let player = zone.player().unwrap();
        match engine.prepare_next(&mut zone) {
            ExploreStep::Prepared(c) => assert_eq!(c.manhattan(player), 1),
            other => panic!("unexpected {other:?}"),
        }
        assert!(zone.tile(engine.pending().unwrap()).unwrap().is_active_explore());
    }

    #[test]
    fn test_prepare_is_stable_until_revealed() {
        let mut zone = corridor();
        let mut engine = ExplorationEngine::new(&zone);
        let a = engine.prepare_next(&mut zone);
        let b = engine.prepare_next(&mut zone);
        assert_eq!(a, b);
    }

    #[test]
    fn test_reveal_moves_player_and_counts_up() {
        let mut zone = corridor();
        let mut engine = ExplorationEngine::new(&zone);
        let before = zone.explored_count();
        let ExploreStep::Prepared(target) = engine.prepare_next(&mut zone) else {
            panic!("expected a target");
        };
        assert_eq!(engine.reveal(&mut zone), RevealOutcome::Revealed(target));
        assert_eq!(zone.explored_count(), before + 1);
        assert_eq!(zone.player(), Some(target));
        assert_eq!(zone.active_explore(), None);
    }

    #[test]
    fn test_full_exploration_of_generated_cave() {
        let config = GeneratorConfig { width: 30, height: 20, ..GeneratorConfig::default() };
        let mut zone = build_zone(&ZoneDefinition::generated("cave", config), "seed-42").unwrap();
        zone.enter();
        let mut engine = ExplorationEngine::new(&zone);

        let mut guard = 0;
        loop {
            guard += 1;
            assert!(guard < 10_000);
            match engine.prepare_next(&mut zone) {
                ExploreStep::Prepared(c) => {
                    // Always touches the known set
                    assert!(zone.neighbors(c).any(|n| zone.is_known_walkable(n)));
                    let before = zone.explored_count();
                    engine.reveal(&mut zone);
                    assert_eq!(zone.explored_count(), before + 1);
                }
                ExploreStep::NothingLeft => break,
                ExploreStep::NotInZone => panic!("player left the zone"),
            }
        }
        // Repair leaves the main region connected; the sealed region is not walkable
        assert!(zone.is_fully_explored());
        assert_eq!(engine.prepare_next(&mut zone), ExploreStep::NothingLeft);
    }

    #[test]
    fn test_reveal_without_prepare_uses_fallback() {
        let mut zone = corridor();
        let mut engine = ExplorationEngine::new(&zone);
        let before = zone.explored_count();
        assert!(matches!(engine.reveal(&mut zone), RevealOutcome::Revealed(_)));
        assert_eq!(zone.explored_count(), before + 1);
    }

    #[test]
    fn test_reveal_on_finished_zone() {
        let mut zone = corridor();
        let mut engine = ExplorationEngine::new(&zone);
        while let RevealOutcome::Revealed(_) = engine.reveal(&mut zone) {}
        assert!(zone.is_fully_explored());
        assert_eq!(engine.reveal(&mut zone), RevealOutcome::Complete);
    }

    #[test]
    fn test_not_in_zone() {
        let def = ZoneDefinition::from_layout("hall", &["#####", "#...#", "#####"]);
        let mut zone = build_zone(&def, "w").unwrap();
        let mut engine = ExplorationEngine::new(&zone);
        assert_eq!(engine.prepare_next(&mut zone), ExploreStep::NotInZone);
    }

    #[test]
    fn test_cancel_clears_highlight() {
        let mut zone = corridor();
        let mut engine = ExplorationEngine::new(&zone);
        engine.prepare_next(&mut zone);
        engine.cancel(&mut zone);
        assert!(engine.is_idle());
        assert_eq!(zone.active_explore(), None);
    }
}
