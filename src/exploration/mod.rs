//! Fog-of-war exploration and player movement inside a zone.
//!
//! Both are driven by discrete ticks: [`ZoneActivity::tick`] performs at most
//! one prepare, one reveal or one movement step and then returns. Only one
//! activity runs per zone; starting a new one replaces the old.

pub mod explore;
pub mod movement;

use std::collections::VecDeque;

use tracing::debug;

use crate::delta::DeltaStore;
use crate::tilemap::{Coord, Tilemap};
use crate::zone::Zone;

pub use explore::{ExplorationEngine, ExploreStep, RevealOutcome};
pub use movement::{plan_path, stance_tiles, MoveStep, MovementExecution, MovementObserver, PathOutcome};

/// Reset explored tiles that cannot be reached from the player (or the entry
/// spawn, when the player is not in the zone) through explored walkable
/// tiles. Returns how many were reset.
pub fn normalize_explored(zone: &mut Zone) -> usize {
    let root = zone.player().unwrap_or(zone.entry_spawn);
    let mut reached = Tilemap::new_with(zone.width(), zone.height(), false);
    let mut queue = VecDeque::new();
    if zone.is_walkable(root) {
        reached.set(root.x, root.y, true);
        queue.push_back(root);
    }

    while let Some(c) = queue.pop_front() {
        for n in zone.neighbors(c) {
            if !*reached.at(n) && zone.tile(n).is_some_and(|t| t.is_walkable() && t.is_explored()) {
                reached.set(n.x, n.y, true);
                queue.push_back(n);
            }
        }
    }

    let stray: Vec<Coord> = zone
        .tiles()
        .iter()
        .filter(|(x, y, t)| t.is_explored() && !*reached.get(*x, *y))
        .map(|(x, y, _)| Coord::new(x, y))
        .collect();
    for &c in &stray {
        zone.clear_explored(c);
    }
    if !stray.is_empty() {
        debug!(zone_id = %zone.id, reset = stray.len(), "unreachable explored tiles reset");
    }
    stray.len()
}

/// What a single tick did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// No activity running.
    Idle,
    Prepared(Coord),
    Revealed(Coord),
    /// Exploration ran out of frontier and stopped.
    ExploreFinished,
    Stepped(Coord),
    Arrived(Coord),
    Aborted,
}

/// The single running activity of a zone.
#[derive(Clone, Debug, Default)]
pub enum ZoneActivity {
    #[default]
    Idle,
    Exploring(ExplorationEngine),
    Moving(MovementExecution),
}

impl ZoneActivity {
    pub fn explore(zone: &Zone) -> Self {
        ZoneActivity::Exploring(ExplorationEngine::new(zone))
    }

    /// Start walking to `target`; `None` if no known path exists.
    pub fn walk_to(zone: &Zone, target: Coord) -> Option<Self> {
        MovementExecution::plan(zone, target).map(ZoneActivity::Moving)
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, ZoneActivity::Idle)
    }

    /// Advance the activity by one tick. Reveals are recorded in the zone's
    /// delta so that they survive regeneration.
    pub fn tick(
        &mut self,
        zone: &mut Zone,
        deltas: &mut DeltaStore,
        observer: &mut dyn MovementObserver,
    ) -> TickOutcome {
        let (outcome, done) = match self {
            ZoneActivity::Idle => (TickOutcome::Idle, false),
            ZoneActivity::Exploring(engine) => {
                if engine.pending().is_some() {
                    match engine.reveal(zone) {
                        RevealOutcome::Revealed(c) => {
                            deltas.record_explored(&zone.id, c);
                            (TickOutcome::Revealed(c), false)
                        }
                        RevealOutcome::Complete => (TickOutcome::ExploreFinished, true),
                    }
                } else {
                    match engine.prepare_next(zone) {
                        ExploreStep::Prepared(c) => (TickOutcome::Prepared(c), false),
                        ExploreStep::NothingLeft | ExploreStep::NotInZone => {
                            (TickOutcome::ExploreFinished, true)
                        }
                    }
                }
            }
            ZoneActivity::Moving(execution) => match execution.step(zone, observer) {
                MoveStep::Stepped(c) => (TickOutcome::Stepped(c), false),
                MoveStep::Arrived(c) => (TickOutcome::Arrived(c), true),
                MoveStep::Aborted => (TickOutcome::Aborted, true),
                MoveStep::Finished => (TickOutcome::Idle, true),
            },
        };

        if done {
            *self = ZoneActivity::Idle;
        }
        outcome
    }

    /// Stop whatever is running. Clearing the pending highlight is enough;
    /// every tick already left the zone consistent.
    pub fn cancel(&mut self, zone: &mut Zone) {
        if let ZoneActivity::Exploring(engine) = self {
            engine.cancel(zone);
        }
        *self = ZoneActivity::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zone::{build_zone, ZoneDefinition};

    fn hall() -> Zone {
        let def = ZoneDefinition::from_layout("hall", &["########", "#......#", "########"]);
        let mut zone = build_zone(&def, "w").unwrap();
        zone.enter();
        zone
    }

    #[test]
    fn test_explore_ticks_alternate_and_record() {
        let mut zone = hall();
        let mut deltas = DeltaStore::new();
        let mut activity = ZoneActivity::explore(&zone);

        assert!(matches!(activity.tick(&mut zone, &mut deltas, &mut ()), TickOutcome::Prepared(_)));
        let TickOutcome::Revealed(c) = activity.tick(&mut zone, &mut deltas, &mut ()) else {
            panic!("expected a reveal");
        };
        assert!(deltas.zone("hall").unwrap().explored_tiles.contains(&c.key()));
    }

    #[test]
    fn test_explore_runs_to_completion() {
        let mut zone = hall();
        let mut deltas = DeltaStore::new();
        let mut activity = ZoneActivity::explore(&zone);
        let mut ticks = 0;
        while !activity.is_idle() {
            activity.tick(&mut zone, &mut deltas, &mut ());
            ticks += 1;
            assert!(ticks < 100);
        }
        assert!(zone.is_fully_explored());
        // Five reveals recorded, the spawn was explored on entry
        assert_eq!(deltas.zone("hall").unwrap().explored_tiles.len(), 5);
    }

    #[test]
    fn test_cancel_clears_pending_highlight() {
        let mut zone = hall();
        let mut deltas = DeltaStore::new();
        let mut activity = ZoneActivity::explore(&zone);
        activity.tick(&mut zone, &mut deltas, &mut ());
        assert!(zone.active_explore().is_some());
        activity.cancel(&mut zone);
        assert!(activity.is_idle());
        assert_eq!(zone.active_explore(), None);
    }

    #[test]
    fn test_walk_activity_arrives() {
        let mut zone = hall();
        for c in zone.walkable_tiles() {
            zone.mark_explored(c);
        }
        let mut deltas = DeltaStore::new();
        let mut activity = ZoneActivity::walk_to(&zone, Coord::new(6, 1)).unwrap();
        let mut last = TickOutcome::Idle;
        while !activity.is_idle() {
            last = activity.tick(&mut zone, &mut deltas, &mut ());
        }
        assert_eq!(last, TickOutcome::Arrived(Coord::new(6, 1)));
        assert_eq!(zone.player(), Some(Coord::new(5, 1)));
    }

    #[test]
    fn test_normalize_explored_drops_islands() {
        let mut zone = hall();
        zone.mark_explored(Coord::new(2, 1));
        zone.mark_explored(Coord::new(5, 1));
        assert_eq!(normalize_explored(&mut zone), 1);
        assert!(zone.tile(Coord::new(2, 1)).unwrap().is_explored());
        assert!(!zone.tile(Coord::new(5, 1)).unwrap().is_explored());
    }
}
