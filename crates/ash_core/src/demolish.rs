//! The demolish order: walk a sapper next to its victim and detonate.

use serde::{Deserialize, Serialize};

use crate::math::{map_distance, TilePos, TileRect};
use crate::world::{PathResult, UnitId, World};

/// Damage dealt to every ground unit caught in a demolition blast.
pub const DEMOLISH_DAMAGE: i32 = 400;

/// Tile radius of the demolition blast.
pub const DEMOLISH_RANGE: i32 = 2;

/// Phase of a demolish order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DemolishPhase {
    /// Order just issued; the path is not computed yet.
    Start,
    /// Walking toward the victim or the target tile.
    Approach,
    /// In position; the blast goes off this tick.
    Detonate,
}

/// One unit's demolish order. Holds a reference on a unit victim for as
/// long as the order is live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DemolishOrder {
    phase: DemolishPhase,
    goal: Option<UnitId>,
    dest: TilePos,
}

/// What a tick of order handling produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DemolishOutcome {
    /// Still approaching or about to blow; keep the order.
    Pending,
    /// The order ended without a detonation; the unit is idle again.
    Idle,
    /// The unit detonated and no longer exists.
    Detonated,
}

impl DemolishOrder {
    /// Order a demolition against a unit. Takes a reference on it.
    pub fn against_unit(world: &mut impl World, goal: UnitId) -> Self {
        world.ref_unit(goal);
        Self {
            phase: DemolishPhase::Start,
            goal: Some(goal),
            dest: world.tile_pos(goal),
        }
    }

    /// Order a demolition against a map tile.
    #[must_use]
    pub fn against_ground(dest: TilePos) -> Self {
        Self {
            phase: DemolishPhase::Start,
            goal: None,
            dest,
        }
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> DemolishPhase {
        self.phase
    }

    /// Unit victim, while one is still tracked.
    #[must_use]
    pub const fn goal(&self) -> Option<UnitId> {
        self.goal
    }

    /// Release the tracked victim's reference without detonating. Call
    /// when the order is cancelled from outside.
    pub fn cancel(&mut self, world: &mut impl World) {
        if let Some(goal) = self.goal.take() {
            world.unref_unit(goal);
        }
    }
}

/// Advance a unit's demolish order one tick.
///
/// On `Detonated` the unit has been destroyed: every living non-flying
/// unit within [`DEMOLISH_RANGE`] tiles takes [`DEMOLISH_DAMAGE`], and
/// walls, rocks and forest in the square are removed. Every exit path
/// releases the victim reference exactly once.
pub fn handle_demolish(
    world: &mut impl World,
    unit: UnitId,
    order: &mut DemolishOrder,
) -> DemolishOutcome {
    if order.phase == DemolishPhase::Start {
        world.reset_path(unit);
        order.phase = DemolishPhase::Approach;
        // Fall through: the first approach step happens this tick.
    }

    if order.phase == DemolishPhase::Approach {
        match world.follow_path(unit) {
            PathResult::Moving => return DemolishOutcome::Pending,
            PathResult::Unreachable => {
                order.cancel(world);
                return DemolishOutcome::Idle;
            }
            PathResult::AtWaypoint => {}
        }

        if let Some(goal) = order.goal {
            if world.is_destroyed(goal) {
                order.cancel(world);
                return DemolishOutcome::Idle;
            }
            if world.is_removed(goal) || world.hit_points(goal) <= 0 || world.is_dying(goal) {
                order.cancel(world);
                return DemolishOutcome::Idle;
            }
            if world.distance_to_unit(world.tile_pos(unit), goal) <= 1 {
                order.phase = DemolishPhase::Detonate;
            }
            return DemolishOutcome::Pending;
        }

        if map_distance(world.tile_pos(unit), order.dest) <= 1 {
            order.phase = DemolishPhase::Detonate;
        }
        return DemolishOutcome::Pending;
    }

    // Detonate.
    order.cancel(world);

    let center = world.tile_pos(unit);
    world.destroy_unit(unit);

    let blast = TileRect::around(center, DEMOLISH_RANGE);
    for victim in world.select_units(blast) {
        // The blast passes under air units.
        if !world.is_flying(victim) && world.hit_points(victim) > 0 {
            world.hit_unit(Some(unit), victim, DEMOLISH_DAMAGE);
        }
    }

    let (width, height) = world.map_size();
    for x in center.x - DEMOLISH_RANGE..=center.x + DEMOLISH_RANGE {
        for y in center.y - DEMOLISH_RANGE..=center.y + DEMOLISH_RANGE {
            if x < 0 || y < 0 || x >= width || y >= height {
                continue;
            }
            let tile = TilePos::new(x, y);
            if world.wall_at(tile).is_some() {
                world.remove_wall(tile);
            } else if world.rocks_at(tile) {
                world.remove_rocks(tile);
            } else if world.forest_at(tile) {
                world.remove_forest(tile);
            }
        }
    }

    DemolishOutcome::Detonated
}
