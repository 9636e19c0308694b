//! External collaborator interfaces.
//!
//! The missile core does not own the map, the units, the renderer or the
//! audio backend. It talks to all of them through the traits in this
//! module, which the surrounding engine (or a test double) implements.
//!
//! # Unit reference counting
//!
//! Units may be destroyed while missiles still point at them. The engine
//! keeps destroyed-but-referenced units allocated until their reference
//! count drops to zero. This core participates in that protocol through
//! [`Units::ref_unit`] and [`Units::unref_unit`]: every increment it
//! issues is matched by exactly one decrement, and the final decrement on
//! a destroyed unit is expected to free it on the collaborator's side.

use serde::{Deserialize, Serialize};

use crate::math::{PixelPos, TilePos, TileRect};

/// Stable identifier of a unit in the engine's registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId(pub u32);

impl std::fmt::Display for UnitId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unit-{}", self.0)
    }
}

/// Combat-relevant stats of a unit type, consumed by the damage formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UnitStats {
    /// Maximum hit points.
    pub hit_points: i32,
    /// Basic (armor-reducible) damage.
    pub basic_damage: i32,
    /// Piercing (armor-ignoring) damage.
    pub piercing_damage: i32,
    /// Flat armor subtracted from basic damage.
    pub armor: i32,
}

/// Which faction built a wall. Wall kinds differ only in their stats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WallKind {
    /// Human stonework.
    Human,
    /// Orc palisade.
    Orc,
}

/// Outcome of one tick of the path-following primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathResult {
    /// Mid-step; no decision can be made this tick.
    Moving,
    /// A step completed; the order logic may inspect and redirect.
    AtWaypoint,
    /// The destination cannot be reached.
    Unreachable,
}

/// Tile-addressed terrain queries and destructible-feature mutation.
pub trait Terrain {
    /// Map dimensions in tiles.
    fn map_size(&self) -> (i32, i32);

    /// Wall at the given tile, if any.
    fn wall_at(&self, tile: TilePos) -> Option<WallKind>;

    /// Whether the tile holds rocks.
    fn rocks_at(&self, tile: TilePos) -> bool;

    /// Whether the tile holds forest.
    fn forest_at(&self, tile: TilePos) -> bool;

    /// Defensive stats used when a missile strikes a wall of this kind.
    fn wall_stats(&self, kind: WallKind) -> UnitStats;

    /// Apply damage to the wall at the tile.
    fn hit_wall(&mut self, tile: TilePos, damage: i32);

    /// Remove the wall at the tile.
    fn remove_wall(&mut self, tile: TilePos);

    /// Remove the rocks at the tile.
    fn remove_rocks(&mut self, tile: TilePos);

    /// Remove the forest at the tile.
    fn remove_forest(&mut self, tile: TilePos);
}

/// Unit registry: spatial queries, damage application, movement and the
/// reference-count protocol.
pub trait Units {
    /// Whether the unit has hit points left and is not in its death throes.
    fn is_alive(&self, unit: UnitId) -> bool;

    /// Current hit points.
    fn hit_points(&self, unit: UnitId) -> i32;

    /// Combat stats of the unit's type.
    fn stats(&self, unit: UnitId) -> UnitStats;

    /// Destroyed and awaiting release once unreferenced.
    fn is_destroyed(&self, unit: UnitId) -> bool;

    /// Removed from the map (inside a transport or building).
    fn is_removed(&self, unit: UnitId) -> bool;

    /// Playing its death animation.
    fn is_dying(&self, unit: UnitId) -> bool;

    /// Air unit (demolition blasts pass under them).
    fn is_flying(&self, unit: UnitId) -> bool;

    /// Attack-damage buff is active on the unit.
    fn has_bloodlust(&self, unit: UnitId) -> bool;

    /// Accumulated experience points.
    fn experience(&self, unit: UnitId) -> u32;

    /// Tile the unit's top-left corner occupies.
    fn tile_pos(&self, unit: UnitId) -> TilePos;

    /// Tiles covered by the unit's footprint.
    fn footprint(&self, unit: UnitId) -> TileRect;

    /// Point of the unit's footprint nearest to `from`.
    fn nearest_point(&self, unit: UnitId, from: TilePos) -> TilePos;

    /// Tile distance from a point to the unit's footprint.
    fn distance_to_unit(&self, from: TilePos, unit: UnitId) -> i32;

    /// Tile distance between two units' footprints.
    fn distance_between(&self, a: UnitId, b: UnitId) -> i32;

    /// Minimum attack range of the unit's weapon, in tiles.
    fn min_attack_range(&self, unit: UnitId) -> i32;

    /// Whether `source`'s type is permitted to attack `target`'s type.
    fn can_target(&self, source: UnitId, target: UnitId) -> bool;

    /// Whether the two units belong to the same or allied sides.
    fn is_allied(&self, a: UnitId, b: UnitId) -> bool;

    /// All units whose footprint intersects the area. The engine bounds
    /// the result internally; order must be deterministic.
    fn select_units(&self, area: TileRect) -> Vec<UnitId>;

    /// Apply damage to a unit. `attacker` may already be destroyed
    /// (demolition credits the exploding unit).
    fn hit_unit(&mut self, attacker: Option<UnitId>, target: UnitId, damage: i32);

    /// Remove a unit from the simulation immediately (demolition).
    fn destroy_unit(&mut self, unit: UnitId);

    /// Toggle the unit's burning flag.
    fn set_burning(&mut self, unit: UnitId, burning: bool);

    /// Take one reference on the unit.
    fn ref_unit(&mut self, unit: UnitId);

    /// Drop one reference. The collaborator frees a destroyed unit when
    /// its count reaches zero.
    fn unref_unit(&mut self, unit: UnitId);

    /// Forget any path computed for the unit.
    fn reset_path(&mut self, unit: UnitId);

    /// Advance the unit one tick along its ordered path.
    fn follow_path(&mut self, unit: UnitId) -> PathResult;
}

/// Presentation-side hooks: redraw regions, sounds, visibility.
pub trait Fx {
    /// Mark a tile area as needing redraw.
    fn mark_dirty(&mut self, area: TileRect);

    /// Play a named sound positioned at a pixel.
    fn play_sound(&mut self, sound: &str, at: PixelPos);

    /// Whether any part of the area is visible in some viewport.
    fn is_area_visible(&self, area: TileRect) -> bool;
}

/// Everything the missile core needs from the surrounding engine.
pub trait World: Terrain + Units + Fx {}

impl<T: Terrain + Units + Fx + ?Sized> World for T {}
