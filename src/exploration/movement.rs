//! Walking the player to an interaction target.
//!
//! Paths only cross tiles the player already knows (explored, or under the
//! player) and end on a stance tile next to the target, never on it.

use std::collections::{HashMap, VecDeque};

use tracing::{debug, trace};

use crate::tilemap::Coord;
use crate::zone::Zone;

/// Result of [`plan_path`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PathOutcome {
    /// Tiles to step through, excluding the player's own tile. Empty when the
    /// player already stands next to the target.
    Path(Vec<Coord>),
    Unreachable,
}

/// Known walkable 4-neighbors of a target, in neighbor order.
pub fn stance_tiles(zone: &Zone, target: Coord) -> Vec<Coord> {
    zone.neighbors(target)
        .filter(|&c| zone.is_known_walkable(c))
        .collect()
}

/// Shortest path from the player to any stance tile of `target`.
pub fn plan_path(zone: &Zone, target: Coord) -> PathOutcome {
    let Some(start) = zone.player() else {
        return PathOutcome::Unreachable;
    };
    let stances = stance_tiles(zone, target);
    if stances.is_empty() {
        return PathOutcome::Unreachable;
    }

    let mut parents: HashMap<Coord, Coord> = HashMap::new();
    let mut queue = VecDeque::from([start]);
    parents.insert(start, start);

    while let Some(current) = queue.pop_front() {
        if stances.contains(&current) {
            let mut path = Vec::new();
            let mut step = current;
            while step != start {
                path.push(step);
                match parents.get(&step) {
                    Some(&parent) => step = parent,
                    None => break,
                }
            }
            path.reverse();
            trace!(target = %target, steps = path.len(), "path planned");
            return PathOutcome::Path(path);
        }
        for n in zone.neighbors(current) {
            if n != target && zone.is_known_walkable(n) && !parents.contains_key(&n) {
                parents.insert(n, current);
                queue.push_back(n);
            }
        }
    }

    debug!(target = %target, "no known path to target");
    PathOutcome::Unreachable
}

/// Hooks invoked while a movement plays out.
pub trait MovementObserver {
    /// Checked before every step; returning false aborts the walk.
    fn in_zone(&self, zone: &Zone) -> bool {
        zone.player().is_some()
    }

    fn on_step(&mut self, _zone: &Zone, _at: Coord) {}

    fn on_arrival(&mut self, _zone: &Zone, _target: Coord) {}
}

/// Observer that does nothing.
impl MovementObserver for () {}

/// Result of one [`MovementExecution::step`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MoveStep {
    Stepped(Coord),
    /// Reached the stance tile; the arrival hook has fired.
    Arrived(Coord),
    /// Stopped before arrival; the arrival hook did not fire.
    Aborted,
    /// Already arrived or aborted earlier.
    Finished,
}

/// A planned walk, advanced one tile per tick.
#[derive(Clone, Debug)]
pub struct MovementExecution {
    target: Coord,
    path: VecDeque<Coord>,
    finished: bool,
}

impl MovementExecution {
    /// Plan a walk to `target`. `None` when it cannot be reached.
    pub fn plan(zone: &Zone, target: Coord) -> Option<Self> {
        match plan_path(zone, target) {
            PathOutcome::Path(path) => Some(Self {
                target,
                path: path.into(),
                finished: false,
            }),
            PathOutcome::Unreachable => None,
        }
    }

    pub fn target(&self) -> Coord {
        self.target
    }

    pub fn remaining(&self) -> usize {
        self.path.len()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Advance by one tile. The arrival hook fires on the tick that lands
    /// on the stance tile (or on the first tick of an empty path).
    pub fn step(&mut self, zone: &mut Zone, observer: &mut dyn MovementObserver) -> MoveStep {
        if self.finished {
            return MoveStep::Finished;
        }
        if !observer.in_zone(zone) {
            return self.abort();
        }

        if let Some(next) = self.path.pop_front() {
            if !zone.move_player(next) {
                return self.abort();
            }
            observer.on_step(zone, next);
            if !self.path.is_empty() {
                return MoveStep::Stepped(next);
            }
        }

        self.finished = true;
        observer.on_arrival(zone, self.target);
        MoveStep::Arrived(self.target)
    }

    fn abort(&mut self) -> MoveStep {
        self.finished = true;
        self.path.clear();
        debug!(target = %self.target, "movement aborted");
        MoveStep::Aborted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zone::{build_zone, ZoneDefinition};

    /// 7x5 room, fully explored, player at (1, 1).
    fn room() -> Zone {
        let def = ZoneDefinition::from_layout(
            "room",
            &["#######", "#.....#", "#.###.#", "#.....#", "#######"],
        );
        let mut zone = build_zone(&def, "w").unwrap();
        for c in zone.walkable_tiles() {
            zone.mark_explored(c);
        }
        zone.move_player(Coord::new(1, 1));
        zone
    }

    #[derive(Default)]
    struct Recorder {
        steps: Vec<Coord>,
        arrived: Option<Coord>,
        leave_after: Option<usize>,
    }

    impl MovementObserver for Recorder {
        fn in_zone(&self, _zone: &Zone) -> bool {
            self.leave_after.map_or(true, |n| self.steps.len() < n)
        }

        fn on_step(&mut self, _zone: &Zone, at: Coord) {
            self.steps.push(at);
        }

        fn on_arrival(&mut self, _zone: &Zone, target: Coord) {
            self.arrived = Some(target);
        }
    }

    #[test]
    fn test_path_ends_next_to_target() {
        let zone = room();
        let target = Coord::new(5, 3);
        let PathOutcome::Path(path) = plan_path(&zone, target) else {
            panic!("expected a path");
        };
        let last = *path.last().unwrap();
        assert_eq!(last.manhattan(target), 1);
        assert!(path.iter().all(|&c| zone.is_walkable(c)));
        assert!(!path.contains(&Coord::new(1, 1)));
        for pair in path.windows(2) {
            assert_eq!(pair[0].manhattan(pair[1]), 1);
        }
    }

    #[test]
    fn test_target_inside_wall_is_reachable_from_side() {
        let zone = room();
        // (2, 2) is a wall; (1, 2) is a stance tile and is visited first
        assert_eq!(plan_path(&zone, Coord::new(2, 2)), PathOutcome::Path(vec![Coord::new(1, 2)]));
    }

    #[test]
    fn test_unknown_tiles_are_not_crossed() {
        let def = ZoneDefinition::from_layout("fog", &["#######", "#.....#", "#######"]);
        let mut zone = build_zone(&def, "w").unwrap();
        zone.enter();
        assert_eq!(plan_path(&zone, Coord::new(5, 1)), PathOutcome::Unreachable);
    }

    #[test]
    fn test_already_adjacent_arrives_immediately() {
        let mut zone = room();
        let mut exec = MovementExecution::plan(&zone, Coord::new(2, 1)).unwrap();
        assert_eq!(exec.remaining(), 0);
        let mut rec = Recorder::default();
        assert_eq!(exec.step(&mut zone, &mut rec), MoveStep::Arrived(Coord::new(2, 1)));
        assert_eq!(rec.arrived, Some(Coord::new(2, 1)));
        assert_eq!(exec.step(&mut zone, &mut rec), MoveStep::Finished);
    }

    #[test]
    fn test_walk_fires_steps_then_arrival() {
        let mut zone = room();
        let target = Coord::new(5, 3);
        let mut exec = MovementExecution::plan(&zone, target).unwrap();
        let planned = exec.remaining();
        let mut rec = Recorder::default();

        let mut ticks = 0;
        while !exec.is_finished() {
            exec.step(&mut zone, &mut rec);
            ticks += 1;
        }
        assert_eq!(ticks, planned);
        assert_eq!(rec.steps.len(), planned);
        assert_eq!(rec.arrived, Some(target));
        assert_eq!(zone.player().unwrap().manhattan(target), 1);
    }

    #[test]
    fn test_leaving_zone_aborts_without_arrival() {
        let mut zone = room();
        let mut exec = MovementExecution::plan(&zone, Coord::new(5, 3)).unwrap();
        let mut rec = Recorder {
            leave_after: Some(1),
            ..Recorder::default()
        };
        assert!(matches!(exec.step(&mut zone, &mut rec), MoveStep::Stepped(_)));
        assert_eq!(exec.step(&mut zone, &mut rec), MoveStep::Aborted);
        assert_eq!(rec.arrived, None);
        assert_eq!(exec.step(&mut zone, &mut rec), MoveStep::Finished);
    }

    #[test]
    fn test_clearing_player_aborts_walk() {
        let mut zone = room();
        let mut exec = MovementExecution::plan(&zone, Coord::new(5, 3)).unwrap();
        let first = match exec.step(&mut zone, &mut ()) {
            MoveStep::Stepped(c) => c,
            other => panic!("expected a step, got {other:?}"),
        };
        zone.clear_player();
        assert!(!zone.tile(first).unwrap().has_player());
        assert_eq!(exec.step(&mut zone, &mut ()), MoveStep::Aborted);
        assert!(exec.is_finished());
    }
}
