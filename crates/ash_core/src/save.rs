//! Saving and restoring in-flight missiles.
//!
//! Records are RON, keyed by type identifier rather than registry index
//! so saves survive content reordering. Controllers are plain function
//! pointers and cannot be serialized; a custom-class missile restores
//! without its controller and idles until one is reattached.

use serde::{Deserialize, Serialize};

use crate::action::MissileEngine;
use crate::error::{Result, SimError};
use crate::math::PixelPos;
use crate::missile::{Missile, PoolKind};
use crate::types::MissileTypeId;
use crate::world::{UnitId, Units};

/// Format version of [`MissileSave`].
pub const SAVE_VERSION: u32 = 1;

/// Serialized form of one in-flight missile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissileRecord {
    /// Type identifier, resolved against the registry on load.
    pub type_ident: String,
    /// Pool the missile belongs to.
    pub pool: PoolKind,
    /// Sprite top-left position.
    pub pos: PixelPos,
    /// Destination (sprite top-left).
    pub goal: PixelPos,
    /// Unadjusted launch point.
    pub source_px: PixelPos,
    /// Animation frame.
    pub frame: u32,
    /// Horizontal mirroring flag.
    pub mirrored: bool,
    /// Class-specific phase.
    pub state: u32,
    /// Ticks until the missile next acts.
    pub wait: u32,
    /// Remaining start delay.
    pub delay: u32,
    /// Remaining lifetime.
    pub ttl: Option<u32>,
    /// Direct damage override.
    pub damage: i32,
    /// Firing unit.
    pub source: Option<UnitId>,
    /// Homed-on unit.
    pub target: Option<UnitId>,
    /// Line error accumulator.
    pub d: i32,
    /// Doubled absolute x delta.
    pub dx: i32,
    /// Doubled absolute y delta.
    pub dy: i32,
    /// X step.
    pub xstep: i32,
    /// Y step.
    pub ystep: i32,
    /// Parabolic fixed-point x.
    pub xl: i32,
    /// Parabolic slope coefficient.
    pub angle: i32,
}

/// A complete missile snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MissileSave {
    /// Format version; loads reject mismatches.
    pub version: u32,
    /// Every live missile, global pool first.
    pub missiles: Vec<MissileRecord>,
}

fn record_of(missile: &Missile, type_ident: &str) -> MissileRecord {
    MissileRecord {
        type_ident: type_ident.to_string(),
        pool: missile.pool,
        pos: missile.pos,
        goal: missile.goal,
        source_px: missile.source_px,
        frame: missile.frame,
        mirrored: missile.mirrored,
        state: missile.state,
        wait: missile.wait,
        delay: missile.delay,
        ttl: missile.ttl,
        damage: missile.damage,
        source: missile.source,
        target: missile.target,
        d: missile.d,
        dx: missile.dx,
        dy: missile.dy,
        xstep: missile.xstep,
        ystep: missile.ystep,
        xl: missile.xl,
        angle: missile.angle,
    }
}

impl MissileEngine {
    /// Serialize every live missile to RON.
    pub fn save_state(&self) -> Result<String> {
        let mut missiles = Vec::with_capacity(self.global.len() + self.local.len());
        for pool in [&self.global, &self.local] {
            for missile in pool.iter() {
                missiles.push(record_of(missile, &self.types.get(missile.type_id).ident));
            }
        }
        let save = MissileSave {
            version: SAVE_VERSION,
            missiles,
        };
        ron::ser::to_string_pretty(&save, ron::ser::PrettyConfig::default()).map_err(|e| {
            SimError::SerializeError {
                what: "missile snapshot".to_string(),
                message: e.to_string(),
            }
        })
    }

    /// Replace all live missiles with the snapshot's.
    ///
    /// Existing missiles are dropped (their unit references released)
    /// before the snapshot is applied; each restored missile re-acquires
    /// references on its source and target units.
    pub fn load_state(&mut self, text: &str, world: &mut impl Units) -> Result<()> {
        let save: MissileSave = ron::from_str(text).map_err(|e| SimError::ParseError {
            what: "missile snapshot".to_string(),
            message: e.to_string(),
        })?;
        if save.version != SAVE_VERSION {
            return Err(SimError::SaveVersionMismatch {
                expected: SAVE_VERSION,
                got: save.version,
            });
        }

        // Resolve every identifier before touching the pools, so a bad
        // snapshot cannot leave the engine half-cleared.
        let mut resolved: Vec<MissileTypeId> = Vec::with_capacity(save.missiles.len());
        for record in &save.missiles {
            let id = self
                .types
                .by_ident(&record.type_ident)
                .ok_or_else(|| SimError::UnknownMissileType(record.type_ident.clone()))?;
            resolved.push(id);
        }

        self.clear(world);

        for (record, type_id) in save.missiles.iter().zip(resolved) {
            let origin = PixelPos::new(0, 0);
            let mut missile =
                Missile::new(type_id, self.types.get(type_id), origin, origin, record.pool);
            missile.pos = record.pos;
            missile.goal = record.goal;
            missile.source_px = record.source_px;
            missile.frame = record.frame;
            missile.mirrored = record.mirrored;
            missile.state = record.state;
            missile.wait = record.wait;
            missile.delay = record.delay;
            missile.ttl = record.ttl;
            missile.damage = record.damage;
            missile.source = record.source;
            missile.target = record.target;

            if let Some(unit) = missile.source {
                world.ref_unit(unit);
            }
            if let Some(unit) = missile.target {
                world.ref_unit(unit);
            }
            missile.d = record.d;
            missile.dx = record.dx;
            missile.dy = record.dy;
            missile.xstep = record.xstep;
            missile.ystep = record.ystep;
            missile.xl = record.xl;
            missile.angle = record.angle;

            match record.pool {
                PoolKind::Global => self.global.insert(missile),
                PoolKind::Local => self.local.insert(missile),
            };
        }
        Ok(())
    }

    /// Drop every missile, releasing held unit references.
    pub fn clear(&mut self, world: &mut impl Units) {
        for pool in [&mut self.global, &mut self.local] {
            while !pool.is_empty() {
                let last = pool.len() - 1;
                let missile = pool.at_mut(last);
                if let Some(unit) = missile.source.take() {
                    world.unref_unit(unit);
                }
                if let Some(unit) = missile.target.take() {
                    world.unref_unit(unit);
                }
                pool.remove_at(last);
            }
        }
    }
}
