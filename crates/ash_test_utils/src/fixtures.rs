//! Missile type fixtures.
//!
//! Pre-built templates and a small registry covering every behavioral
//! class the tests exercise.

use ash_core::types::{
    BurningBuildingFrame, BurningBuildingTable, MissileClass, MissileType, MissileTypeRegistry,
};

/// A bare template: 1 direction, 1 frame, no sounds, no chain.
#[must_use]
pub fn base_type(ident: &str, class: MissileClass) -> MissileType {
    MissileType {
        ident: ident.to_string(),
        file: String::new(),
        width: 32,
        height: 32,
        frames: 1,
        num_directions: 1,
        fired_sound: None,
        impact_sound: None,
        class,
        draw_level: 0,
        start_delay: 0,
        sleep: 1,
        speed: 32,
        range: 0,
        impact_missile: None,
        can_hit_owner: false,
        friendly_fire: false,
    }
}

/// A fast direct-hit arrow with sounds and 8 directions.
#[must_use]
pub fn arrow() -> MissileType {
    MissileType {
        frames: 40,
        num_directions: 8,
        fired_sound: Some("bow-throw".to_string()),
        impact_sound: Some("bow-hit".to_string()),
        draw_level: 50,
        ..base_type("missile-arrow", MissileClass::PointToPoint)
    }
}

/// A splashing cannonball chaining into an explosion.
#[must_use]
pub fn cannonball() -> MissileType {
    MissileType {
        frames: 5,
        impact_sound: Some("explosion".to_string()),
        range: 2,
        impact_missile: Some("missile-explosion".to_string()),
        ..base_type("missile-cannonball", MissileClass::PointToPoint)
    }
}

/// The stationary explosion the cannonball chains into.
#[must_use]
pub fn explosion() -> MissileType {
    MissileType {
        frames: 6,
        draw_level: 60,
        ..base_type("missile-explosion", MissileClass::StayWithDelay)
    }
}

/// A small building fire stage.
#[must_use]
pub fn small_fire() -> MissileType {
    MissileType {
        frames: 6,
        width: 16,
        height: 16,
        draw_level: 70,
        ..base_type("missile-small-fire", MissileClass::Fire)
    }
}

/// A big building fire stage.
#[must_use]
pub fn big_fire() -> MissileType {
    MissileType {
        frames: 6,
        width: 32,
        height: 32,
        draw_level: 70,
        ..base_type("missile-big-fire", MissileClass::Fire)
    }
}

/// Registry holding every fixture type.
///
/// # Panics
/// Panics if the fixture identifiers collide, which is a bug here.
#[must_use]
pub fn registry() -> MissileTypeRegistry {
    let mut reg = MissileTypeRegistry::new();
    for t in [
        arrow(),
        cannonball(),
        explosion(),
        small_fire(),
        big_fire(),
        MissileType {
            frames: 25,
            num_directions: 8,
            ..base_type("missile-spear", MissileClass::PointToPointWithDelay)
        },
        MissileType {
            frames: 15,
            num_directions: 8,
            ..base_type("missile-catapult-rock", MissileClass::PointToPointTripleBounce)
        },
        MissileType {
            frames: 28,
            num_directions: 8,
            speed: 16,
            ..base_type("missile-boulder", MissileClass::Parabolic)
        },
        base_type("missile-instant", MissileClass::None),
        base_type("missile-custom", MissileClass::Custom),
    ] {
        reg.add(t).unwrap();
    }
    reg
}

/// Burning table: no fire above 90%, small fire above 50%, big fire
/// below.
#[must_use]
pub fn burning_table(reg: &MissileTypeRegistry) -> BurningBuildingTable {
    BurningBuildingTable::from_frames(vec![
        BurningBuildingFrame {
            percent: 0,
            missile: reg.by_ident("missile-big-fire"),
        },
        BurningBuildingFrame {
            percent: 50,
            missile: reg.by_ident("missile-small-fire"),
        },
        BurningBuildingFrame {
            percent: 90,
            missile: None,
        },
    ])
}
