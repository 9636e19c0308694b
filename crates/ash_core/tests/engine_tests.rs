//! Cross-module scenarios: lockstep determinism and snapshot resume.

use ash_core::prelude::*;
use ash_test_utils::fixtures;
use ash_test_utils::world::{MockUnit, MockWorld};

struct Scenario {
    world: MockWorld,
    engine: MissileEngine,
    rng: SyncRng,
}

/// Two shooters: an archer loosing an arrow at a victim and a catapult
/// lobbing a boulder at a walled tile. Built identically every call.
fn scenario(seed: u64) -> Scenario {
    let mut world = MockWorld::new(64, 64);
    let archer = world.add_unit(MockUnit::at(TilePos::new(2, 2)));
    let catapult = world.add_unit(MockUnit::at(TilePos::new(4, 20)));
    let victim = world.add_unit(MockUnit::at(TilePos::new(14, 2)).on_side(1));
    world.place_wall(TilePos::new(12, 20), WallKind::Human, 120);

    let mut engine = MissileEngine::new(fixtures::registry());
    let mut rng = SyncRng::new(seed);

    let arrow = engine.types().by_ident("missile-arrow").unwrap();
    let boulder = engine.types().by_ident("missile-boulder").unwrap();
    engine
        .fire(&mut world, &mut rng, arrow, archer, AttackTarget::Unit(victim))
        .unwrap();
    engine
        .fire(
            &mut world,
            &mut rng,
            boulder,
            catapult,
            AttackTarget::Ground(TilePos::new(12, 20)),
        )
        .unwrap();

    Scenario { world, engine, rng }
}

fn run(s: &mut Scenario, ticks: u32) {
    for _ in 0..ticks {
        s.engine.tick(&mut s.world, &mut s.rng);
    }
}

#[test]
fn test_identical_seeds_stay_in_lockstep() {
    let mut a = scenario(1234);
    let mut b = scenario(1234);
    for _ in 0..40 {
        run(&mut a, 1);
        run(&mut b, 1);
        assert_eq!(
            a.engine.save_state().unwrap(),
            b.engine.save_state().unwrap()
        );
        assert_eq!(a.rng, b.rng);
    }
    assert_eq!(a.world.hits, b.world.hits);
}

#[test]
fn test_snapshot_resume_matches_straight_run() {
    let mut straight = scenario(99);
    run(&mut straight, 12);

    let mut resumed = scenario(99);
    run(&mut resumed, 5);
    let text = resumed.engine.save_state().unwrap();
    let mut engine = MissileEngine::new(fixtures::registry());
    engine.load_state(&text, &mut resumed.world).unwrap();
    resumed.engine = engine;
    run(&mut resumed, 7);

    assert_eq!(
        straight.engine.save_state().unwrap(),
        resumed.engine.save_state().unwrap()
    );
    assert_eq!(straight.world.hits, resumed.world.hits);
}

#[test]
fn test_everything_resolves_and_references_balance() {
    let mut s = scenario(7);
    run(&mut s, 200);
    assert!(s.engine.pool(PoolKind::Global).is_empty());
    assert!(s.engine.pool(PoolKind::Local).is_empty());
    assert!(s.world.refs_balanced(), "unit references leaked");
    // The arrow found flesh and the boulder found stone.
    assert!(!s.world.hits.is_empty());
    assert!(s.world.wall_hp_at(TilePos::new(12, 20)).unwrap() < 120);
}
