//! Impact resolution: sounds, chained impact missiles, and damage to
//! units, walls and the center tile.

use crate::action::MissileEngine;
use crate::damage::calculate_damage_stats;
use crate::math::{TilePos, TileRect};
use crate::missile::{Missile, PoolKind};
use crate::rng::SyncRng;
use crate::world::{UnitId, World};

impl MissileEngine {
    /// Resolve a missile's impact at its current position.
    ///
    /// Plays the impact sound, spawns the chained decorative missile,
    /// and applies damage. Sourceless missiles are purely visual and
    /// damage nothing. Zero-range types hit only the homed-on unit (or
    /// the wall under the center tile); ranged types splash every
    /// attackable unit in the blast square at half damage, full damage
    /// on the center tile, and sweep walls across the square.
    pub(crate) fn resolve_impact(
        &mut self,
        kind: PoolKind,
        index: usize,
        world: &mut dyn World,
        rng: &mut SyncRng,
    ) {
        let missile = self.pool(kind).at(index);
        let type_id = missile.type_id;
        let source = missile.source;
        let target = missile.target;
        let override_damage = missile.damage;

        let mtype = self.types.get(type_id);
        let center = missile.center(mtype);
        let range = mtype.range;
        let can_hit_owner = mtype.can_hit_owner;
        let friendly_fire = mtype.friendly_fire;

        if let Some(sound) = &mtype.impact_sound {
            world.play_sound(sound, center);
        }

        if let Some(impact_id) = self.types.impact_missile_of(type_id) {
            let decoration = {
                let impact_type = self.types.get(impact_id);
                Missile::new(impact_id, impact_type, center, center, PoolKind::Global)
            };
            self.global.insert(decoration);
        }

        // Without a source there is nobody to credit damage to.
        let Some(source) = source else { return };

        let tile = center.to_tile();
        let (width, height) = world.map_size();
        if tile.x < 0 || tile.y < 0 || tile.x >= width || tile.y >= height {
            tracing::debug!(?tile, "missile impact outside the map");
            return;
        }

        if range == 0 {
            if let Some(goal) = target {
                if world.is_destroyed(goal) {
                    // The homed-on unit died in flight; release it now so
                    // freeing the missile does not decrement twice.
                    world.unref_unit(goal);
                    self.pool_mut(kind).at_mut(index).target = None;
                    return;
                }
                hit_goal(
                    world,
                    rng,
                    self.xp_damage,
                    source,
                    override_damage,
                    can_hit_owner,
                    friendly_fire,
                    goal,
                    1,
                );
            } else {
                hit_wall_at(world, rng, self.xp_damage, source, override_damage, tile, 1);
            }
            return;
        }

        // Full damage on the center tile, half on the rest of the square.
        let blast = TileRect::new(
            TilePos::new(tile.x - range + 1, tile.y - range + 1),
            TilePos::new(tile.x + range, tile.y + range),
        );
        for goal in world.select_units(blast) {
            if !world.can_target(source, goal) {
                continue;
            }
            let splash = if world.footprint(goal).contains(tile) {
                1
            } else {
                2
            };
            hit_goal(
                world,
                rng,
                self.xp_damage,
                source,
                override_damage,
                can_hit_owner,
                friendly_fire,
                goal,
                splash,
            );
        }

        let base = TilePos::new(tile.x - range, tile.y - range);
        for i in 1..2 * range {
            for n in 1..2 * range {
                let wall_tile = TilePos::new(base.x + i, base.y + n);
                if wall_tile.x < 0
                    || wall_tile.y < 0
                    || wall_tile.x >= width
                    || wall_tile.y >= height
                {
                    continue;
                }
                let splash = if i == range && n == range { 1 } else { 2 };
                hit_wall_at(
                    world,
                    rng,
                    self.xp_damage,
                    source,
                    override_damage,
                    wall_tile,
                    splash,
                );
            }
        }
    }
}

/// Damage one unit caught in an impact.
fn hit_goal(
    world: &mut dyn World,
    rng: &mut SyncRng,
    xp_damage: i32,
    source: UnitId,
    override_damage: i32,
    can_hit_owner: bool,
    friendly_fire: bool,
    goal: UnitId,
    splash: i32,
) {
    if goal == source && !can_hit_owner {
        return;
    }
    if goal != source && !friendly_fire && world.is_allied(source, goal) {
        return;
    }
    if !world.is_alive(goal) {
        return;
    }
    let damage = if override_damage != 0 {
        override_damage / splash
    } else {
        calculate_damage_stats(
            &world.stats(source),
            &world.stats(goal),
            world.has_bloodlust(source),
            0,
            xp_damage,
            rng,
        ) / splash
    };
    world.hit_unit(Some(source), goal, damage);
}

/// Damage the wall on a tile, if any.
fn hit_wall_at(
    world: &mut dyn World,
    rng: &mut SyncRng,
    xp_damage: i32,
    source: UnitId,
    override_damage: i32,
    tile: TilePos,
    splash: i32,
) {
    let Some(kind) = world.wall_at(tile) else {
        return;
    };
    let damage = if override_damage != 0 {
        override_damage / splash
    } else {
        calculate_damage_stats(
            &world.stats(source),
            &world.wall_stats(kind),
            false,
            0,
            xp_damage,
            rng,
        ) / splash
    };
    world.hit_wall(tile, damage);
}

#[cfg(test)]
mod tests {
    use crate::action::{AttackTarget, MissileEngine};
    use crate::math::TilePos;
    use crate::missile::PoolKind;
    use crate::rng::SyncRng;
    use crate::world::WallKind;
    use crate::test_utils::fixtures;
    use crate::test_utils::world::{MockUnit, MockWorld};

    fn engine() -> MissileEngine {
        MissileEngine::new(fixtures::registry())
    }

    fn tick_until_empty(engine: &mut MissileEngine, world: &mut MockWorld, rng: &mut SyncRng) {
        for _ in 0..512 {
            engine.tick(world, rng);
            if engine.pool(PoolKind::Global).is_empty() && engine.pool(PoolKind::Local).is_empty()
            {
                return;
            }
        }
        panic!("pools never drained");
    }

    #[test]
    fn test_direct_hit_kills_weak_target_and_releases_references() {
        let mut world = MockWorld::new(64, 64);
        let archer = world.add_unit(MockUnit::at(TilePos::new(2, 2)));
        let target = world.add_unit(MockUnit::at(TilePos::new(8, 2)).on_side(1).with_hp(1, 60));
        let mut engine = engine();
        let mut rng = SyncRng::new(5);

        let arrow = engine.types().by_ident("missile-arrow").unwrap();
        engine
            .fire(&mut world, &mut rng, arrow, archer, AttackTarget::Unit(target))
            .unwrap();
        tick_until_empty(&mut engine, &mut world, &mut rng);

        assert!(world.unit(target).dying);
        assert_eq!(world.hits.len(), 1);
        assert_eq!(world.hits[0].attacker, Some(archer));
        assert!(world.refs_balanced());
    }

    #[test]
    fn test_target_destroyed_in_flight_is_not_damaged() {
        let mut world = MockWorld::new(64, 64);
        let archer = world.add_unit(MockUnit::at(TilePos::new(2, 2)));
        let target = world.add_unit(MockUnit::at(TilePos::new(12, 2)).on_side(1));
        let mut engine = engine();
        let mut rng = SyncRng::new(5);

        let arrow = engine.types().by_ident("missile-arrow").unwrap();
        engine
            .fire(&mut world, &mut rng, arrow, archer, AttackTarget::Unit(target))
            .unwrap();
        engine.tick(&mut world, &mut rng);
        world.unit_mut(target).destroyed = true;
        tick_until_empty(&mut engine, &mut world, &mut rng);

        assert!(world.hits.is_empty());
        assert!(world.refs_balanced(), "stale target reference leaked");
    }

    #[test]
    fn test_owner_is_spared_without_can_hit_owner() {
        let mut world = MockWorld::new(32, 32);
        let archer = world.add_unit(MockUnit::at(TilePos::new(3, 3)));
        let mut engine = engine();
        let mut rng = SyncRng::new(5);

        let arrow = engine.types().by_ident("missile-arrow").unwrap();
        engine
            .fire(&mut world, &mut rng, arrow, archer, AttackTarget::Unit(archer))
            .unwrap();
        tick_until_empty(&mut engine, &mut world, &mut rng);

        assert!(world.hits.is_empty());
        assert!(world.refs_balanced());
    }

    #[test]
    fn test_splash_halves_damage_off_center() {
        let mut world = MockWorld::new(64, 64);
        let gunner = world.add_unit(MockUnit::at(TilePos::new(2, 10)));
        let near = world.add_unit(MockUnit::at(TilePos::new(10, 10)).on_side(1));
        let off = world.add_unit(MockUnit::at(TilePos::new(11, 10)).on_side(1));
        let far = world.add_unit(MockUnit::at(TilePos::new(20, 10)).on_side(1));
        let mut engine = engine();
        let mut rng = SyncRng::new(5);

        let ball = engine.types().by_ident("missile-cannonball").unwrap();
        let handle = engine
            .fire(
                &mut world,
                &mut rng,
                ball,
                gunner,
                AttackTarget::Ground(TilePos::new(10, 10)),
            )
            .unwrap();
        // Fixed damage makes the halving observable.
        engine.get_mut(handle).unwrap().damage = 8;
        tick_until_empty(&mut engine, &mut world, &mut rng);

        let damage_to = |unit| {
            world
                .hits
                .iter()
                .find(|h| h.target == unit)
                .map(|h| h.damage)
        };
        assert_eq!(damage_to(near), Some(8));
        assert_eq!(damage_to(off), Some(4));
        assert_eq!(damage_to(far), None);
        assert!(world.refs_balanced());
    }

    #[test]
    fn test_splash_spares_allies_without_friendly_fire() {
        let mut world = MockWorld::new(64, 64);
        let gunner = world.add_unit(MockUnit::at(TilePos::new(2, 10)));
        let friend = world.add_unit(MockUnit::at(TilePos::new(11, 10)));
        let foe = world.add_unit(MockUnit::at(TilePos::new(10, 10)).on_side(1));
        let mut engine = engine();
        let mut rng = SyncRng::new(5);

        let ball = engine.types().by_ident("missile-cannonball").unwrap();
        engine
            .fire(
                &mut world,
                &mut rng,
                ball,
                gunner,
                AttackTarget::Ground(TilePos::new(10, 10)),
            )
            .unwrap();
        tick_until_empty(&mut engine, &mut world, &mut rng);

        assert!(world.hits.iter().any(|h| h.target == foe));
        assert!(world.hits.iter().all(|h| h.target != friend));
    }

    #[test]
    fn test_splash_sweeps_walls_full_damage_at_center() {
        let mut world = MockWorld::new(64, 64);
        let gunner = world.add_unit(MockUnit::at(TilePos::new(2, 10)));
        world.place_wall(TilePos::new(10, 10), WallKind::Human, 100);
        world.place_wall(TilePos::new(11, 10), WallKind::Human, 100);
        world.place_wall(TilePos::new(13, 10), WallKind::Human, 100); // outside
        let mut engine = engine();
        let mut rng = SyncRng::new(5);

        let ball = engine.types().by_ident("missile-cannonball").unwrap();
        let handle = engine
            .fire(
                &mut world,
                &mut rng,
                ball,
                gunner,
                AttackTarget::Ground(TilePos::new(10, 10)),
            )
            .unwrap();
        engine.get_mut(handle).unwrap().damage = 10;
        tick_until_empty(&mut engine, &mut world, &mut rng);

        // Range 2: sweep covers offsets 1..=3 around (8, 8).
        assert_eq!(world.wall_hp_at(TilePos::new(10, 10)), Some(90));
        assert_eq!(world.wall_hp_at(TilePos::new(11, 10)), Some(95));
        assert_eq!(world.wall_hp_at(TilePos::new(13, 10)), Some(100));
    }

    #[test]
    fn test_impact_chains_decorative_missile() {
        let mut world = MockWorld::new(64, 64);
        let gunner = world.add_unit(MockUnit::at(TilePos::new(2, 10)));
        let mut engine = engine();
        let mut rng = SyncRng::new(5);

        let ball = engine.types().by_ident("missile-cannonball").unwrap();
        let explosion = engine.types().by_ident("missile-explosion").unwrap();
        engine
            .fire(
                &mut world,
                &mut rng,
                ball,
                gunner,
                AttackTarget::Ground(TilePos::new(10, 10)),
            )
            .unwrap();

        let mut saw_explosion = false;
        for _ in 0..512 {
            engine.tick(&mut world, &mut rng);
            saw_explosion |= engine
                .pool(PoolKind::Global)
                .iter()
                .any(|m| m.type_id == explosion);
            if engine.pool(PoolKind::Global).is_empty() {
                break;
            }
        }
        assert!(saw_explosion, "impact never spawned the chained explosion");
        assert!(engine.pool(PoolKind::Global).is_empty());
    }

    #[test]
    fn test_sourceless_missile_is_purely_visual() {
        let mut world = MockWorld::new(64, 64);
        world.add_unit(MockUnit::at(TilePos::new(10, 10)).on_side(1));
        world.place_wall(TilePos::new(10, 10), WallKind::Human, 100);
        let mut engine = engine();
        let mut rng = SyncRng::new(5);

        let ball = engine.types().by_ident("missile-cannonball").unwrap();
        let start = TilePos::new(2, 10).center_pixel();
        let dest = TilePos::new(10, 10).center_pixel();
        let missile = engine.make_missile(ball, start, dest, PoolKind::Local);
        engine.spawn_local(missile);
        tick_until_empty(&mut engine, &mut world, &mut rng);

        assert!(world.hits.is_empty());
        assert_eq!(world.wall_hp_at(TilePos::new(10, 10)), Some(100));
    }
}
