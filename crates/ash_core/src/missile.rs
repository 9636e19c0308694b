//! Mutable missile instance state.

use crate::math::{PixelPos, TileRect};
use crate::types::{MissileType, MissileTypeId};
use crate::world::{UnitId, World};

/// Per-tick callback driving a [`MissileClass::Custom`] missile.
///
/// Custom missiles bypass the class dispatcher entirely; the tick loop
/// only handles their delay, wait and TTL bookkeeping. A controller that
/// wants its missile gone sets the TTL to zero.
///
/// [`MissileClass::Custom`]: crate::types::MissileClass::Custom
pub type MissileController = fn(&mut Missile, &mut dyn World);

/// Which pool a missile lives in.
///
/// Global missiles are part of the replicated game state; local missiles
/// are cosmetic-only and never synchronized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PoolKind {
    /// World-visible, replicated.
    Global,
    /// Local visual effect, not replicated.
    Local,
}

/// One in-flight missile.
///
/// Positions are the sprite's top-left corner in pixels; the template's
/// size recovers the center. `source_px` keeps the unadjusted launch
/// point the parabolic math anchors on.
#[derive(Debug, Clone, PartialEq)]
pub struct Missile {
    /// Template this instance was spawned from.
    pub type_id: MissileTypeId,
    /// Current position (sprite top-left).
    pub pos: PixelPos,
    /// Destination (sprite top-left).
    pub goal: PixelPos,
    /// Launch point, uncorrected for sprite size.
    pub source_px: PixelPos,
    /// Current animation frame.
    pub frame: u32,
    /// Draw the frame horizontally mirrored (west-side headings).
    pub mirrored: bool,
    /// Class-specific phase. Bit 0 set means the trajectory state is
    /// initialized; bounce classes count arrivals in the upper bits.
    pub state: u32,
    /// Ticks until the missile next acts.
    pub wait: u32,
    /// Remaining start delay in ticks.
    pub delay: u32,
    /// Remaining lifetime in ticks; `None` is unbounded.
    pub ttl: Option<u32>,
    /// Direct damage override; 0 computes damage from the source unit's
    /// stats instead.
    pub damage: i32,
    /// Unit that fired the missile. Holds one unit reference while set.
    pub source: Option<UnitId>,
    /// Unit the missile is homing on. Holds one unit reference while set.
    pub target: Option<UnitId>,
    /// Pool this missile lives in.
    pub pool: PoolKind,
    /// External per-tick controller for custom-class missiles.
    pub controller: Option<MissileController>,

    // Line-rasterization state.
    /// Error accumulator.
    pub d: i32,
    /// Doubled absolute x delta.
    pub dx: i32,
    /// Doubled absolute y delta.
    pub dy: i32,
    /// X step sign (also the parabolic fixed-point x step).
    pub xstep: i32,
    /// Y step sign.
    pub ystep: i32,

    // Parabolic state.
    /// Fixed-point (x100) x position.
    pub xl: i32,
    /// Linear slope coefficient (x100).
    pub angle: i32,

    /// Sparse slot this missile occupies in its pool.
    pub(crate) slot: u32,
}

impl Missile {
    /// Initialize a missile flying from `start` to `dest` (both pixel
    /// centers; the sprite is centered on them).
    #[must_use]
    pub fn new(
        type_id: MissileTypeId,
        mtype: &MissileType,
        start: PixelPos,
        dest: PixelPos,
        pool: PoolKind,
    ) -> Self {
        Self {
            type_id,
            pos: PixelPos::new(start.x - mtype.width / 2, start.y - mtype.height / 2),
            goal: PixelPos::new(dest.x - mtype.width / 2, dest.y - mtype.height / 2),
            source_px: start,
            frame: 0,
            mirrored: false,
            state: 0,
            wait: mtype.sleep,
            delay: mtype.start_delay,
            ttl: None,
            damage: 0,
            source: None,
            target: None,
            pool,
            controller: None,
            d: 0,
            dx: 0,
            dy: 0,
            xstep: 0,
            ystep: 0,
            xl: 0,
            angle: 0,
            slot: 0,
        }
    }

    /// Tile area currently covered by the sprite.
    #[must_use]
    pub fn tile_area(&self, mtype: &MissileType) -> TileRect {
        mtype.tile_area(self.pos)
    }

    /// Pixel at the center of the sprite.
    #[must_use]
    pub fn center(&self, mtype: &MissileType) -> PixelPos {
        PixelPos::new(self.pos.x + mtype.width / 2, self.pos.y + mtype.height / 2)
    }
}
