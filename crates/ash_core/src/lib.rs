//! # Ashfall Core
//!
//! Deterministic missile and demolition simulation core for Ashfall RTS.
//!
//! This crate contains **only** deterministic logic:
//! - No rendering
//! - No IO
//! - No system randomness
//! - No floating-point math (integer pixels, tiles and headings)
//!
//! The map, the unit registry and the presentation layer stay outside;
//! the core drives them through the traits in [`world`]. This
//! separation enables:
//! - Lockstep multiplayer (identical simulation across clients)
//! - Headless server builds
//! - Replay systems
//! - Determinism testing
//!
//! ## Crate Structure
//!
//! - [`types`] - Missile type templates and the burning-building table
//! - [`missile`] - Mutable missile instance state
//! - [`pool`] - Fixed-capacity missile pools and stable handles
//! - [`trajectory`] - Straight-line and parabolic flight stepping
//! - [`damage`] - The combat damage formula
//! - [`action`] - The engine: firing and the per-tick action loop
//! - [`demolish`] - The demolish order state machine
//! - [`world`] - Interfaces to the surrounding engine
//! - [`save`] - Missile snapshots
//! - [`math`] - Integer pixel/tile/heading math
//! - [`rng`] - The synchronized random number stream

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod action;
pub mod damage;
pub mod demolish;
pub mod error;
mod impact;
pub mod math;
pub mod missile;
pub mod pool;
pub mod rng;
pub mod save;
pub mod trajectory;
pub mod types;
pub mod world;

// `ash_test_utils` dev-depends back on this crate, so its compiled
// artifact is bound to a *separate* copy of `ash_core` whose types do
// not unify with the unit-test crate's. Compile its sources straight
// into the test crate instead; the self-alias lets its `ash_core::`
// paths resolve here.
#[cfg(test)]
extern crate self as ash_core;

#[cfg(test)]
#[path = "../../ash_test_utils/src/lib.rs"]
mod test_utils;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::action::{AttackTarget, MissileEngine};
    pub use crate::damage::calculate_damage_stats;
    pub use crate::demolish::{
        handle_demolish, DemolishOrder, DemolishOutcome, DemolishPhase, DEMOLISH_DAMAGE,
        DEMOLISH_RANGE,
    };
    pub use crate::error::{Result, SimError};
    pub use crate::math::{
        map_distance, PixelPos, TilePos, TileRect, TILE_SIZE_X, TILE_SIZE_Y,
    };
    pub use crate::missile::{Missile, MissileController, PoolKind};
    pub use crate::pool::{MissileHandle, MAX_GLOBAL_MISSILES, MAX_LOCAL_MISSILES};
    pub use crate::rng::SyncRng;
    pub use crate::save::{MissileRecord, MissileSave, SAVE_VERSION};
    pub use crate::types::{
        BurningBuildingFrame, BurningBuildingTable, MissileClass, MissileType, MissileTypeId,
        MissileTypeRegistry,
    };
    pub use crate::world::{
        Fx, PathResult, Terrain, UnitId, UnitStats, Units, WallKind, World,
    };
}
