//! A scriptable in-memory world for exercising the simulation core.
//!
//! [`MockWorld`] implements every collaborator trait. It records damage,
//! sounds, redraw marks and the unit reference-count traffic so tests
//! can assert on side effects, and its path following teleports one tile
//! per tick so order logic can be driven without a real pathfinder.

use std::collections::{HashMap, HashSet};

use ash_core::math::{map_distance, PixelPos, TilePos, TileRect};
use ash_core::world::{Fx, PathResult, Terrain, UnitId, UnitStats, Units, WallKind};

/// One scripted unit.
#[derive(Debug, Clone)]
pub struct MockUnit {
    /// Top-left footprint tile.
    pub tile: TilePos,
    /// Footprint side length in tiles.
    pub size: i32,
    /// Current hit points.
    pub hp: i32,
    /// Combat stats (also carries maximum hit points).
    pub stats: UnitStats,
    /// Destroyed, lingering only while referenced.
    pub destroyed: bool,
    /// Removed from the map.
    pub removed: bool,
    /// Playing its death animation.
    pub dying: bool,
    /// Air unit.
    pub flying: bool,
    /// Burning flag, toggled by fire visuals.
    pub burning: bool,
    /// Damage buff.
    pub bloodlust: bool,
    /// Accumulated experience.
    pub xp: u32,
    /// Team number; equal teams are allied.
    pub side: u32,
    /// Minimum attack range in tiles.
    pub min_attack_range: i32,
    /// Outstanding references held on this unit.
    pub refs: i32,
    /// Where `follow_path` walks the unit.
    pub path_dest: Option<TilePos>,
    /// Makes `follow_path` report the destination unreachable.
    pub path_unreachable: bool,
}

impl MockUnit {
    /// A healthy 1x1 ground unit at `tile` with 60 hp and modest stats.
    #[must_use]
    pub fn at(tile: TilePos) -> Self {
        Self {
            tile,
            size: 1,
            hp: 60,
            stats: UnitStats {
                hit_points: 60,
                basic_damage: 9,
                piercing_damage: 3,
                armor: 2,
            },
            destroyed: false,
            removed: false,
            dying: false,
            flying: false,
            burning: false,
            bloodlust: false,
            xp: 0,
            side: 0,
            min_attack_range: 0,
            refs: 0,
            path_dest: None,
            path_unreachable: false,
        }
    }

    /// Same unit on the given team.
    #[must_use]
    pub fn on_side(mut self, side: u32) -> Self {
        self.side = side;
        self
    }

    /// Same unit with a square footprint of the given side.
    #[must_use]
    pub fn sized(mut self, size: i32) -> Self {
        self.size = size;
        self
    }

    /// Same unit with the given current and maximum hit points.
    #[must_use]
    pub fn with_hp(mut self, hp: i32, max: i32) -> Self {
        self.hp = hp;
        self.stats.hit_points = max;
        self
    }
}

/// One recorded damage application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HitRecord {
    /// Credited attacker.
    pub attacker: Option<UnitId>,
    /// Damaged unit.
    pub target: UnitId,
    /// Damage applied.
    pub damage: i32,
}

/// Scriptable implementation of the world-facing traits.
#[derive(Debug, Default)]
pub struct MockWorld {
    width: i32,
    height: i32,
    walls: HashMap<(i32, i32), WallKind>,
    wall_hp: HashMap<(i32, i32), i32>,
    rocks: HashSet<(i32, i32)>,
    forest: HashSet<(i32, i32)>,
    units: Vec<MockUnit>,
    /// Every damage application, in order.
    pub hits: Vec<HitRecord>,
    /// Units destroyed outright, in order.
    pub destroyed_units: Vec<UnitId>,
    /// Redraw marks, in order.
    pub dirty: Vec<TileRect>,
    /// Played sounds, in order.
    pub sounds: Vec<(String, PixelPos)>,
    /// Total references taken.
    pub refs_taken: u32,
    /// Total references released.
    pub refs_released: u32,
    /// `follow_path` calls observed.
    pub path_ticks: u32,
    /// Whether `is_area_visible` reports everything visible.
    pub all_visible: bool,
}

impl MockWorld {
    /// An empty map of the given tile dimensions, everything visible.
    #[must_use]
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            all_visible: true,
            ..Self::default()
        }
    }

    /// Add a unit and return its id.
    pub fn add_unit(&mut self, unit: MockUnit) -> UnitId {
        self.units.push(unit);
        UnitId((self.units.len() - 1) as u32)
    }

    /// Read a unit.
    #[must_use]
    pub fn unit(&self, id: UnitId) -> &MockUnit {
        &self.units[id.0 as usize]
    }

    /// Mutate a unit.
    pub fn unit_mut(&mut self, id: UnitId) -> &mut MockUnit {
        &mut self.units[id.0 as usize]
    }

    /// Place a wall with the given hit points.
    pub fn place_wall(&mut self, tile: TilePos, kind: WallKind, hp: i32) {
        self.walls.insert((tile.x, tile.y), kind);
        self.wall_hp.insert((tile.x, tile.y), hp);
    }

    /// Remaining hit points of the wall at `tile`, if one stands.
    #[must_use]
    pub fn wall_hp_at(&self, tile: TilePos) -> Option<i32> {
        self.wall_hp.get(&(tile.x, tile.y)).copied()
    }

    /// Place rocks.
    pub fn place_rocks(&mut self, tile: TilePos) {
        self.rocks.insert((tile.x, tile.y));
    }

    /// Place forest.
    pub fn place_forest(&mut self, tile: TilePos) {
        self.forest.insert((tile.x, tile.y));
    }

    /// Every reference taken has been released.
    #[must_use]
    pub fn refs_balanced(&self) -> bool {
        self.refs_taken == self.refs_released && self.units.iter().all(|u| u.refs == 0)
    }

    fn footprint_of(&self, unit: &MockUnit) -> TileRect {
        TileRect::new(
            unit.tile,
            TilePos::new(unit.tile.x + unit.size - 1, unit.tile.y + unit.size - 1),
        )
    }
}

impl Terrain for MockWorld {
    fn map_size(&self) -> (i32, i32) {
        (self.width, self.height)
    }

    fn wall_at(&self, tile: TilePos) -> Option<WallKind> {
        self.walls.get(&(tile.x, tile.y)).copied()
    }

    fn rocks_at(&self, tile: TilePos) -> bool {
        self.rocks.contains(&(tile.x, tile.y))
    }

    fn forest_at(&self, tile: TilePos) -> bool {
        self.forest.contains(&(tile.x, tile.y))
    }

    fn wall_stats(&self, kind: WallKind) -> UnitStats {
        match kind {
            WallKind::Human => UnitStats {
                hit_points: 40,
                basic_damage: 0,
                piercing_damage: 0,
                armor: 20,
            },
            WallKind::Orc => UnitStats {
                hit_points: 50,
                basic_damage: 0,
                piercing_damage: 0,
                armor: 15,
            },
        }
    }

    fn hit_wall(&mut self, tile: TilePos, damage: i32) {
        let key = (tile.x, tile.y);
        if let Some(hp) = self.wall_hp.get_mut(&key) {
            *hp -= damage;
            if *hp <= 0 {
                self.walls.remove(&key);
                self.wall_hp.remove(&key);
            }
        }
    }

    fn remove_wall(&mut self, tile: TilePos) {
        self.walls.remove(&(tile.x, tile.y));
        self.wall_hp.remove(&(tile.x, tile.y));
    }

    fn remove_rocks(&mut self, tile: TilePos) {
        self.rocks.remove(&(tile.x, tile.y));
    }

    fn remove_forest(&mut self, tile: TilePos) {
        self.forest.remove(&(tile.x, tile.y));
    }
}

impl Units for MockWorld {
    fn is_alive(&self, unit: UnitId) -> bool {
        let u = self.unit(unit);
        !u.destroyed && !u.removed && !u.dying && u.hp > 0
    }

    fn hit_points(&self, unit: UnitId) -> i32 {
        self.unit(unit).hp
    }

    fn stats(&self, unit: UnitId) -> UnitStats {
        self.unit(unit).stats
    }

    fn is_destroyed(&self, unit: UnitId) -> bool {
        self.unit(unit).destroyed
    }

    fn is_removed(&self, unit: UnitId) -> bool {
        self.unit(unit).removed
    }

    fn is_dying(&self, unit: UnitId) -> bool {
        self.unit(unit).dying
    }

    fn is_flying(&self, unit: UnitId) -> bool {
        self.unit(unit).flying
    }

    fn has_bloodlust(&self, unit: UnitId) -> bool {
        self.unit(unit).bloodlust
    }

    fn experience(&self, unit: UnitId) -> u32 {
        self.unit(unit).xp
    }

    fn tile_pos(&self, unit: UnitId) -> TilePos {
        self.unit(unit).tile
    }

    fn footprint(&self, unit: UnitId) -> TileRect {
        self.footprint_of(self.unit(unit))
    }

    fn nearest_point(&self, unit: UnitId, from: TilePos) -> TilePos {
        let rect = self.footprint(unit);
        TilePos::new(
            from.x.clamp(rect.min.x, rect.max.x),
            from.y.clamp(rect.min.y, rect.max.y),
        )
    }

    fn distance_to_unit(&self, from: TilePos, unit: UnitId) -> i32 {
        map_distance(from, self.nearest_point(unit, from))
    }

    fn distance_between(&self, a: UnitId, b: UnitId) -> i32 {
        let ra = self.footprint(a);
        let rb = self.footprint(b);
        let dx = (ra.min.x - rb.max.x).max(rb.min.x - ra.max.x).max(0);
        let dy = (ra.min.y - rb.max.y).max(rb.min.y - ra.max.y).max(0);
        dx.max(dy)
    }

    fn min_attack_range(&self, unit: UnitId) -> i32 {
        self.unit(unit).min_attack_range
    }

    fn can_target(&self, _source: UnitId, target: UnitId) -> bool {
        !self.unit(target).removed
    }

    fn is_allied(&self, a: UnitId, b: UnitId) -> bool {
        self.unit(a).side == self.unit(b).side
    }

    fn select_units(&self, area: TileRect) -> Vec<UnitId> {
        self.units
            .iter()
            .enumerate()
            .filter(|(_, u)| {
                !u.destroyed && !u.removed && area.intersects(&self.footprint_of(u))
            })
            .map(|(i, _)| UnitId(i as u32))
            .collect()
    }

    fn hit_unit(&mut self, attacker: Option<UnitId>, target: UnitId, damage: i32) {
        self.hits.push(HitRecord {
            attacker,
            target,
            damage,
        });
        let unit = self.unit_mut(target);
        unit.hp -= damage;
        if unit.hp <= 0 {
            unit.hp = 0;
            unit.dying = true;
        }
    }

    fn destroy_unit(&mut self, unit: UnitId) {
        self.destroyed_units.push(unit);
        let u = self.unit_mut(unit);
        u.destroyed = true;
        u.hp = 0;
    }

    fn set_burning(&mut self, unit: UnitId, burning: bool) {
        self.unit_mut(unit).burning = burning;
    }

    fn ref_unit(&mut self, unit: UnitId) {
        self.refs_taken += 1;
        self.unit_mut(unit).refs += 1;
    }

    fn unref_unit(&mut self, unit: UnitId) {
        self.refs_released += 1;
        let u = self.unit_mut(unit);
        u.refs -= 1;
        assert!(u.refs >= 0, "reference count of {unit} went negative");
    }

    fn reset_path(&mut self, _unit: UnitId) {}

    fn follow_path(&mut self, unit: UnitId) -> PathResult {
        self.path_ticks += 1;
        let u = self.unit_mut(unit);
        if u.path_unreachable {
            return PathResult::Unreachable;
        }
        if let Some(dest) = u.path_dest {
            u.tile.x += (dest.x - u.tile.x).signum();
            u.tile.y += (dest.y - u.tile.y).signum();
        }
        PathResult::AtWaypoint
    }
}

impl Fx for MockWorld {
    fn mark_dirty(&mut self, area: TileRect) {
        self.dirty.push(area);
    }

    fn play_sound(&mut self, sound: &str, at: PixelPos) {
        self.sounds.push((sound.to_string(), at));
    }

    fn is_area_visible(&self, _area: TileRect) -> bool {
        self.all_visible
    }
}
