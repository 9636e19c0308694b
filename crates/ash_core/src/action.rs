//! Missile engine: firing, the per-tick action loop and the per-class
//! state machines.
//!
//! [`MissileEngine`] owns the type registry, the burning-building table
//! and both missile pools. One [`MissileEngine::tick`] call advances
//! every missile exactly one tick, global pool first so replicated
//! state never depends on cosmetic-only missiles.

use crate::damage::calculate_damage_stats;
use crate::math::{PixelPos, TilePos, TILE_SIZE_X, TILE_SIZE_Y};
use crate::missile::{Missile, PoolKind};
use crate::pool::{MissileHandle, MissilePool, MAX_GLOBAL_MISSILES, MAX_LOCAL_MISSILES};
use crate::rng::SyncRng;
use crate::trajectory::{parabolic, point_to_point};
use crate::types::{
    BurningBuildingTable, MissileClass, MissileType, MissileTypeId, MissileTypeRegistry,
};
use crate::world::{UnitId, World};

/// What an attack is aimed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttackTarget {
    /// A unit; the missile homes on its footprint and holds a reference.
    Unit(UnitId),
    /// A map tile.
    Ground(TilePos),
}

/// What the dispatcher decided for a missile this tick.
enum Disposition {
    /// Still flying or animating.
    Keep,
    /// Remove without resolving an impact.
    Free,
    /// Resolve damage at the current position.
    Impact {
        /// Remove the missile after the impact resolves.
        free_after: bool,
    },
}

/// The missile simulation core.
#[derive(Debug)]
pub struct MissileEngine {
    pub(crate) types: MissileTypeRegistry,
    pub(crate) burning: BurningBuildingTable,
    pub(crate) global: MissilePool,
    pub(crate) local: MissilePool,
    pub(crate) xp_damage: i32,
}

impl MissileEngine {
    /// Create an engine over a loaded type registry.
    #[must_use]
    pub fn new(types: MissileTypeRegistry) -> Self {
        Self {
            types,
            burning: BurningBuildingTable::default(),
            global: MissilePool::new(PoolKind::Global, MAX_GLOBAL_MISSILES),
            local: MissilePool::new(PoolKind::Local, MAX_LOCAL_MISSILES),
            xp_damage: 1,
        }
    }

    /// Attach the burning-building stage table.
    #[must_use]
    pub fn with_burning_table(mut self, table: BurningBuildingTable) -> Self {
        self.burning = table;
        self
    }

    /// Set the basic-damage bonus granted per sqrt(experience / 100).
    #[must_use]
    pub fn with_xp_damage(mut self, xp_damage: i32) -> Self {
        self.xp_damage = xp_damage;
        self
    }

    /// The type registry.
    #[must_use]
    pub fn types(&self) -> &MissileTypeRegistry {
        &self.types
    }

    /// One of the two pools.
    #[must_use]
    pub fn pool(&self, kind: PoolKind) -> &MissilePool {
        match kind {
            PoolKind::Global => &self.global,
            PoolKind::Local => &self.local,
        }
    }

    pub(crate) fn pool_mut(&mut self, kind: PoolKind) -> &mut MissilePool {
        match kind {
            PoolKind::Global => &mut self.global,
            PoolKind::Local => &mut self.local,
        }
    }

    /// Build a missile of `type_id` flying between two pixel centers.
    #[must_use]
    pub fn make_missile(
        &self,
        type_id: MissileTypeId,
        start: PixelPos,
        dest: PixelPos,
        pool: PoolKind,
    ) -> Missile {
        Missile::new(type_id, self.types.get(type_id), start, dest, pool)
    }

    /// Insert a missile into the replicated pool.
    pub fn spawn_global(&mut self, mut missile: Missile) -> MissileHandle {
        missile.pool = PoolKind::Global;
        self.global.insert(missile)
    }

    /// Insert a missile into the cosmetic pool.
    pub fn spawn_local(&mut self, mut missile: Missile) -> MissileHandle {
        missile.pool = PoolKind::Local;
        self.local.insert(missile)
    }

    /// Resolve a handle, if the missile is still live.
    #[must_use]
    pub fn get(&self, handle: MissileHandle) -> Option<&Missile> {
        self.pool(handle.pool).get(handle)
    }

    /// Resolve a handle mutably, if the missile is still live.
    pub fn get_mut(&mut self, handle: MissileHandle) -> Option<&mut Missile> {
        self.pool_mut(handle.pool).get_mut(handle)
    }

    /// Fire a weapon from `source` at `target`.
    ///
    /// Class [`MissileClass::None`] weapons resolve instantly and spawn
    /// nothing. Otherwise a global missile is spawned from the source's
    /// tile center toward the target (the nearest footprint tile for
    /// unit targets) and a unit reference is taken on the source and on
    /// a unit target. Returns `None` when no missile was spawned: an
    /// instant hit, an invalid target, or a target inside the weapon's
    /// minimum range.
    pub fn fire(
        &mut self,
        world: &mut dyn World,
        rng: &mut SyncRng,
        type_id: MissileTypeId,
        source: UnitId,
        target: AttackTarget,
    ) -> Option<MissileHandle> {
        if let AttackTarget::Unit(goal) = target {
            if world.is_destroyed(goal)
                || world.is_removed(goal)
                || world.hit_points(goal) <= 0
                || world.is_dying(goal)
            {
                tracing::debug!(%source, %goal, "attack target is gone, not firing");
                return None;
            }
        }

        if self.types.get(type_id).class == MissileClass::None {
            self.fire_instant(world, rng, source, target);
            return None;
        }

        let start_tile = world.tile_pos(source);
        let start = start_tile.center_pixel();
        let (dest, goal_unit) = match target {
            AttackTarget::Unit(goal) => {
                if world.distance_between(source, goal) < world.min_attack_range(source) {
                    return None;
                }
                let point = world.nearest_point(goal, start_tile);
                (point.center_pixel(), Some(goal))
            }
            AttackTarget::Ground(tile) => (tile.center_pixel(), None),
        };

        let mtype = self.types.get(type_id);
        if let Some(sound) = &mtype.fired_sound {
            world.play_sound(sound, start);
        }
        let mut missile = Missile::new(type_id, mtype, start, dest, PoolKind::Global);
        missile.source = Some(source);
        missile.target = goal_unit;

        let handle = self.global.insert(missile);
        world.ref_unit(source);
        if let Some(goal) = goal_unit {
            world.ref_unit(goal);
        }
        Some(handle)
    }

    /// Class-none weapons apply their damage the moment they fire.
    fn fire_instant(
        &self,
        world: &mut dyn World,
        rng: &mut SyncRng,
        source: UnitId,
        target: AttackTarget,
    ) {
        let attacker = world.stats(source);
        let bloodlust = world.has_bloodlust(source);
        let experience = world.experience(source);
        match target {
            AttackTarget::Unit(goal) => {
                let damage = calculate_damage_stats(
                    &attacker,
                    &world.stats(goal),
                    bloodlust,
                    experience,
                    self.xp_damage,
                    rng,
                );
                world.hit_unit(Some(source), goal, damage);
            }
            AttackTarget::Ground(tile) => {
                if let Some(kind) = world.wall_at(tile) {
                    let damage = calculate_damage_stats(
                        &attacker,
                        &world.wall_stats(kind),
                        bloodlust,
                        experience,
                        self.xp_damage,
                        rng,
                    );
                    world.hit_wall(tile, damage);
                }
            }
        }
    }

    /// Advance every missile one tick, global pool first.
    pub fn tick(&mut self, world: &mut dyn World, rng: &mut SyncRng) {
        self.tick_pool(PoolKind::Global, world, rng);
        self.tick_pool(PoolKind::Local, world, rng);
    }

    fn tick_pool(&mut self, kind: PoolKind, world: &mut dyn World, rng: &mut SyncRng) {
        // Removal swaps the last missile into the freed index, so the
        // index only advances when the current missile survives.
        let mut i = 0;
        while i < self.pool(kind).len() {
            {
                let missile = self.pool_mut(kind).at_mut(i);
                if missile.delay > 0 {
                    missile.delay -= 1;
                    i += 1;
                    continue;
                }
                if let Some(ttl) = missile.ttl {
                    if ttl > 0 {
                        missile.ttl = Some(ttl - 1);
                    }
                }
            }

            let controller = self.pool(kind).at(i).controller;
            if let Some(controller) = controller {
                controller(self.pool_mut(kind).at_mut(i), world);
            }

            if self.pool(kind).at(i).ttl == Some(0) {
                self.free_missile(kind, i, world);
                continue;
            }

            {
                let missile = self.pool_mut(kind).at_mut(i);
                missile.wait = missile.wait.saturating_sub(1);
                if missile.wait > 0 {
                    i += 1;
                    continue;
                }
            }

            if self.types.get(self.pool(kind).at(i).type_id).class == MissileClass::Custom {
                // The controller already ran; only rearm the wait.
                let sleep = self.types.get(self.pool(kind).at(i).type_id).sleep;
                self.pool_mut(kind).at_mut(i).wait = sleep;
                i += 1;
                continue;
            }

            let disposition = {
                let Self {
                    types,
                    burning,
                    global,
                    local,
                    ..
                } = self;
                let pool = match kind {
                    PoolKind::Global => global,
                    PoolKind::Local => local,
                };
                dispatch(pool.at_mut(i), types, burning, world)
            };

            match disposition {
                Disposition::Keep => i += 1,
                Disposition::Free => self.free_missile(kind, i, world),
                Disposition::Impact { free_after } => {
                    self.resolve_impact(kind, i, world, rng);
                    if free_after {
                        self.free_missile(kind, i, world);
                    } else {
                        i += 1;
                    }
                }
            }
        }
    }

    /// Release the unit references a missile holds, then drop it from
    /// its pool.
    pub(crate) fn free_missile(&mut self, kind: PoolKind, index: usize, world: &mut dyn World) {
        let pool = self.pool_mut(kind);
        let missile = pool.at_mut(index);
        if let Some(unit) = missile.source.take() {
            world.unref_unit(unit);
        }
        if let Some(unit) = missile.target.take() {
            world.unref_unit(unit);
        }
        pool.remove_at(index);
    }

    /// Handles of every missile to draw this frame, back to front:
    /// ascending draw level, global before local within a level, then
    /// spawn slot for a stable order. Delayed missiles are not yet
    /// visible and custom-class missiles draw through their controller's
    /// own channel.
    #[must_use]
    pub fn draw_list(&self, world: &dyn World) -> Vec<MissileHandle> {
        let mut keyed: Vec<(u32, u8, u32, MissileHandle)> = Vec::new();
        for (order, pool) in [(0u8, &self.global), (1u8, &self.local)] {
            for index in 0..pool.len() {
                let missile = pool.at(index);
                let mtype = self.types.get(missile.type_id);
                if missile.delay > 0 || mtype.class == MissileClass::Custom {
                    continue;
                }
                if !world.is_area_visible(missile.tile_area(mtype)) {
                    continue;
                }
                let handle = pool.handle_at(index);
                keyed.push((mtype.draw_level, order, handle.slot, handle));
            }
        }
        keyed.sort_by_key(|&(level, order, slot, _)| (level, order, slot));
        keyed.into_iter().map(|(_, _, _, handle)| handle).collect()
    }
}

/// Run one acting tick of a missile's class state machine.
fn dispatch(
    missile: &mut Missile,
    types: &MissileTypeRegistry,
    burning: &BurningBuildingTable,
    world: &mut dyn World,
) -> Disposition {
    let mtype = types.get(missile.type_id);
    world.mark_dirty(missile.tile_area(mtype));
    missile.wait = mtype.sleep;

    let disposition = match mtype.class {
        // Instant classes resolve in fire() and never reach a pool.
        MissileClass::None => Disposition::Free,
        MissileClass::Custom => Disposition::Keep,

        MissileClass::PointToPoint => {
            if point_to_point(missile, mtype) {
                Disposition::Impact { free_after: true }
            } else {
                cycle_frame(missile, mtype);
                Disposition::Keep
            }
        }

        MissileClass::Hit => {
            if point_to_point(missile, mtype) {
                Disposition::Impact { free_after: true }
            } else {
                Disposition::Keep
            }
        }

        MissileClass::PointToPointWithDelay => {
            if point_to_point(missile, mtype) {
                Disposition::Impact { free_after: true }
            } else {
                distance_frame(missile, mtype);
                Disposition::Keep
            }
        }

        MissileClass::Parabolic => {
            if parabolic(missile, mtype) {
                Disposition::Impact { free_after: true }
            } else {
                distance_frame(missile, mtype);
                Disposition::Keep
            }
        }

        MissileClass::PointToPointTripleBounce => {
            if point_to_point(missile, mtype) {
                if matches!(missile.state, 1 | 3 | 5) {
                    // Bounce onward one and a half tiles and hit here.
                    missile.state += 2;
                    missile.goal.x += missile.xstep * TILE_SIZE_X * 3 / 2;
                    missile.goal.y += missile.ystep * TILE_SIZE_Y * 3 / 2;
                    Disposition::Impact { free_after: false }
                } else {
                    Disposition::Free
                }
            } else {
                cycle_frame(missile, mtype);
                Disposition::Keep
            }
        }

        MissileClass::PointToPointWithHit | MissileClass::Blizzard => {
            if point_to_point(missile, mtype) {
                // Arrived: play the hit animation in place, then resolve.
                missile.frame += mtype.frame_stride();
                if missile.frame >= mtype.frames {
                    Disposition::Impact { free_after: true }
                } else {
                    Disposition::Keep
                }
            } else {
                Disposition::Keep
            }
        }

        MissileClass::StayWithDelay | MissileClass::DeathDecay => {
            missile.frame += 1;
            if missile.frame == mtype.frames {
                Disposition::Impact { free_after: true }
            } else {
                Disposition::Keep
            }
        }

        MissileClass::Whirlwind | MissileClass::FlameShield => {
            missile.frame += 1;
            if missile.frame == mtype.frames {
                missile.frame = 0;
                // Re-step toward the goal; lifetime is TTL-bound.
                let _ = point_to_point(missile, mtype);
            }
            Disposition::Keep
        }

        MissileClass::CycleOnce => cycle_once(missile, mtype),

        MissileClass::Fire => fire_stage(missile, types, burning, world),
    };

    match disposition {
        Disposition::Keep | Disposition::Impact { free_after: false } => {
            // The type may have changed (fire stages swap templates).
            let mtype = types.get(missile.type_id);
            world.mark_dirty(missile.tile_area(mtype));
        }
        _ => {}
    }
    disposition
}

/// Advance a flying missile's animation one row, wrapping.
fn cycle_frame(missile: &mut Missile, mtype: &MissileType) {
    missile.frame += mtype.frame_stride();
    if missile.frame >= mtype.frames {
        missile.frame -= mtype.frames;
    }
}

/// Play the animation forward then backward, hitting at the end.
fn cycle_once(missile: &mut Missile, mtype: &MissileType) -> Disposition {
    match missile.state {
        0 | 2 => missile.state += 1,
        1 => {
            missile.frame += 1;
            if missile.frame == mtype.frames {
                missile.frame -= 1;
                missile.state += 1;
            }
        }
        _ => {
            if missile.frame == 0 {
                return Disposition::Impact { free_after: true };
            }
            missile.frame -= 1;
        }
    }
    Disposition::Keep
}

/// Burning-building visual: track the source building's health and swap
/// between fire stages at each animation wrap.
fn fire_stage(
    missile: &mut Missile,
    types: &MissileTypeRegistry,
    burning: &BurningBuildingTable,
    world: &mut dyn World,
) -> Disposition {
    let Some(unit) = missile.source else {
        return Disposition::Free;
    };
    if world.is_destroyed(unit) || world.hit_points(unit) <= 0 {
        return Disposition::Free;
    }

    let mtype = types.get(missile.type_id);
    missile.frame += 1;
    if missile.frame < mtype.frames {
        return Disposition::Keep;
    }
    missile.frame = 0;

    let max_hp = world.stats(unit).hit_points;
    let percent = if max_hp > 0 {
        100 * world.hit_points(unit) / max_hp
    } else {
        0
    };
    match burning.lookup(percent) {
        None => {
            world.set_burning(unit, false);
            Disposition::Free
        }
        Some(stage) if stage != missile.type_id => {
            // Keep the fire centered when the stage sprite size differs.
            let next = types.get(stage);
            missile.pos.x += (mtype.width - next.width) / 2;
            missile.pos.y += (mtype.height - next.height) / 2;
            missile.type_id = stage;
            Disposition::Keep
        }
        Some(_) => Disposition::Keep,
    }
}

/// Pick the animation row from the distance already covered, for
/// missiles whose sprite encodes flight progress (spears, axes).
fn distance_frame(missile: &mut Missile, mtype: &MissileType) {
    let stride = mtype.frame_stride();
    let rows = mtype.frames / stride;
    if rows == 0 {
        return;
    }
    let spread = (2 * rows - 1) as i32;
    let total_x = (missile.goal.x - missile.source_px.x).abs();
    let done_x = (missile.pos.x - missile.source_px.x).abs();
    for i in 1..=spread {
        if done_x * spread / i < total_x {
            let row = if (i - 1) * 2 < spread { i - 1 } else { spread - i };
            missile.frame = missile.frame % stride + row as u32 * stride;
            break;
        }
    }
}
