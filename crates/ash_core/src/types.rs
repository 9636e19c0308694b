//! Missile type templates.
//!
//! A [`MissileType`] is an immutable template loaded once at content
//! time and shared by every missile of that kind. Types are data-driven:
//! definitions load from RON and resolve chained impact types by
//! identifier after the whole registry is present.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};
use crate::math::{PixelPos, TilePos, TileRect, TILE_SIZE_X, TILE_SIZE_Y};

/// Geometric/behavioral class of a missile type.
///
/// Each variant selects one state machine in the per-tick dispatcher.
/// The set is closed: content files may only name these classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MissileClass {
    /// No missile at all: the attack resolves instantly when fired.
    #[default]
    None,
    /// Straight flight from source to destination.
    PointToPoint,
    /// Straight flight with the animation frame picked from remaining
    /// distance instead of cycling over time (spears, axes).
    PointToPointWithDelay,
    /// Stays in place, cycles its animation once, then hits.
    StayWithDelay,
    /// Straight flight that bounces onward three times, hitting at each
    /// bounce point.
    PointToPointTripleBounce,
    /// Orbiting shield effect; cycles in place and re-steps its
    /// trajectory at each animation wrap.
    FlameShield,
    /// Straight flight, then plays a hit animation before resolving.
    Blizzard,
    /// Stationary decay effect; hits when the animation completes.
    DeathDecay,
    /// Stationary cyclone; loops its animation and re-steps its
    /// trajectory at each wrap, living until its TTL expires.
    Whirlwind,
    /// Plays its animation forward then backward, then hits.
    CycleOnce,
    /// Straight flight, then a hit animation played in place.
    PointToPointWithHit,
    /// Burning-building visual; tracks the source unit's health and
    /// swaps between fire stages.
    Fire,
    /// Driven entirely by an externally supplied controller.
    Custom,
    /// Straight flight with no animation at all.
    Hit,
    /// Parabolic arc from source to destination.
    Parabolic,
}

/// Immutable missile template. Referenced, never owned, by instances.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissileType {
    /// Unique identifier, e.g. `"missile-arrow"`.
    pub ident: String,
    /// Sprite file path, relative to the graphics root.
    #[serde(default)]
    pub file: String,
    /// Sprite width in pixels.
    pub width: i32,
    /// Sprite height in pixels.
    pub height: i32,
    /// Number of animation frames in the sprite.
    pub frames: u32,
    /// Direction buckets for heading quantization (1 = no turning).
    #[serde(default = "default_num_directions")]
    pub num_directions: u32,
    /// Sound played when the missile is fired.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fired_sound: Option<String>,
    /// Sound played on impact.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impact_sound: Option<String>,
    /// Behavioral class.
    pub class: MissileClass,
    /// Draw ordering layer; higher draws later.
    #[serde(default)]
    pub draw_level: u32,
    /// Ticks to wait before the missile first acts.
    #[serde(default)]
    pub start_delay: u32,
    /// Ticks between animation steps.
    pub sleep: u32,
    /// Pixels advanced per acting tick.
    pub speed: i32,
    /// Area-of-effect radius in tiles (0 = direct hit only).
    #[serde(default)]
    pub range: i32,
    /// Identifier of the decorative missile spawned at the impact point.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impact_missile: Option<String>,
    /// Whether the missile may damage the unit that fired it.
    #[serde(default)]
    pub can_hit_owner: bool,
    /// Whether the missile may damage allied units.
    #[serde(default)]
    pub friendly_fire: bool,
}

const fn default_num_directions() -> u32 {
    1
}

impl MissileType {
    /// Frames per sprite row: one frame per direction on the
    /// north-through-south side, west headings reuse them mirrored.
    #[must_use]
    pub const fn frame_stride(&self) -> u32 {
        self.num_directions / 2 + 1
    }

    /// Tile area covered by a missile of this type at pixel `pos`
    /// (top-left corner).
    #[must_use]
    pub const fn tile_area(&self, pos: PixelPos) -> TileRect {
        TileRect::new(
            TilePos::new(pos.x / TILE_SIZE_X, pos.y / TILE_SIZE_Y),
            TilePos::new(
                (pos.x + self.width) / TILE_SIZE_X,
                (pos.y + self.height) / TILE_SIZE_Y,
            ),
        )
    }
}

/// Index of a missile type in the registry. Stable for the lifetime of
/// the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MissileTypeId(pub u32);

/// All loaded missile types, addressable by id or identifier.
#[derive(Debug, Clone, Default)]
pub struct MissileTypeRegistry {
    types: Vec<MissileType>,
    by_ident: HashMap<String, MissileTypeId>,
}

impl MissileTypeRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a missile type. Identifiers must be unique.
    pub fn add(&mut self, mtype: MissileType) -> Result<MissileTypeId> {
        if self.by_ident.contains_key(&mtype.ident) {
            return Err(SimError::DuplicateMissileType(mtype.ident));
        }
        let id = MissileTypeId(self.types.len() as u32);
        self.by_ident.insert(mtype.ident.clone(), id);
        self.types.push(mtype);
        Ok(id)
    }

    /// Look up a type id by identifier.
    #[must_use]
    pub fn by_ident(&self, ident: &str) -> Option<MissileTypeId> {
        self.by_ident.get(ident).copied()
    }

    /// Get a type by id.
    ///
    /// # Panics
    /// Panics on a stale id; ids never outlive the registry by contract.
    #[must_use]
    pub fn get(&self, id: MissileTypeId) -> &MissileType {
        &self.types[id.0 as usize]
    }

    /// Resolve the chained impact type of `id`, if configured.
    #[must_use]
    pub fn impact_missile_of(&self, id: MissileTypeId) -> Option<MissileTypeId> {
        self.get(id)
            .impact_missile
            .as_deref()
            .and_then(|ident| self.by_ident(ident))
    }

    /// Number of registered types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Iterate all types in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (MissileTypeId, &MissileType)> {
        self.types
            .iter()
            .enumerate()
            .map(|(i, t)| (MissileTypeId(i as u32), t))
    }

    /// Load a registry from RON text holding a list of type definitions.
    pub fn from_ron(text: &str) -> Result<Self> {
        let defs: Vec<MissileType> = ron::from_str(text).map_err(|e| SimError::ParseError {
            what: "missile type definitions".to_string(),
            message: e.to_string(),
        })?;
        let mut registry = Self::new();
        for def in defs {
            registry.add(def)?;
        }
        // Chained impact types must resolve within the same file.
        for mtype in &registry.types {
            if let Some(ident) = &mtype.impact_missile {
                if registry.by_ident(ident).is_none() {
                    return Err(SimError::UnknownMissileType(ident.clone()));
                }
            }
        }
        Ok(registry)
    }

    /// Serialize all type definitions to RON text.
    pub fn to_ron(&self) -> Result<String> {
        ron::ser::to_string_pretty(&self.types, ron::ser::PrettyConfig::default()).map_err(|e| {
            SimError::SerializeError {
                what: "missile type definitions".to_string(),
                message: e.to_string(),
            }
        })
    }
}

/// One stage of the burning-building visual.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BurningBuildingFrame {
    /// Health percentage at which this stage starts to apply.
    pub percent: i32,
    /// Fire visual for the stage; `None` shows no fire.
    pub missile: Option<MissileTypeId>,
}

/// Ordered health-percent thresholds selecting a building's fire visual.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BurningBuildingTable {
    frames: Vec<BurningBuildingFrame>,
}

impl BurningBuildingTable {
    /// Build a table from (threshold, visual) stages. Stages are kept
    /// sorted by ascending threshold.
    #[must_use]
    pub fn from_frames(mut frames: Vec<BurningBuildingFrame>) -> Self {
        frames.sort_by_key(|f| f.percent);
        Self { frames }
    }

    /// Fire visual for a building at `percent` health: the last stage
    /// whose threshold does not exceed the percentage, falling back to
    /// the first stage.
    #[must_use]
    pub fn lookup(&self, percent: i32) -> Option<MissileTypeId> {
        let mut chosen = self.frames.first()?;
        for frame in &self.frames {
            if percent < frame.percent {
                break;
            }
            chosen = frame;
        }
        chosen.missile
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arrow() -> MissileType {
        MissileType {
            ident: "missile-arrow".to_string(),
            file: "missiles/arrow.png".to_string(),
            width: 40,
            height: 40,
            frames: 40,
            num_directions: 8,
            fired_sound: Some("bow-throw".to_string()),
            impact_sound: Some("bow-hit".to_string()),
            class: MissileClass::PointToPoint,
            draw_level: 50,
            start_delay: 0,
            sleep: 1,
            speed: 32,
            range: 0,
            impact_missile: None,
            can_hit_owner: false,
            friendly_fire: false,
        }
    }

    #[test]
    fn test_frame_stride() {
        let t = arrow();
        assert_eq!(t.frame_stride(), 5); // 8 directions: N NE E SE S
    }

    #[test]
    fn test_registry_lookup() {
        let mut reg = MissileTypeRegistry::new();
        let id = reg.add(arrow()).unwrap();
        assert_eq!(reg.by_ident("missile-arrow"), Some(id));
        assert_eq!(reg.get(id).speed, 32);
        assert!(reg.by_ident("missile-ballista").is_none());
    }

    #[test]
    fn test_registry_rejects_duplicates() {
        let mut reg = MissileTypeRegistry::new();
        reg.add(arrow()).unwrap();
        assert!(matches!(
            reg.add(arrow()),
            Err(SimError::DuplicateMissileType(_))
        ));
    }

    #[test]
    fn test_impact_chain_resolution() {
        let mut reg = MissileTypeRegistry::new();
        let mut explosion = arrow();
        explosion.ident = "missile-explosion".to_string();
        explosion.class = MissileClass::StayWithDelay;
        let explosion_id = reg.add(explosion).unwrap();

        let mut cannonball = arrow();
        cannonball.ident = "missile-cannonball".to_string();
        cannonball.impact_missile = Some("missile-explosion".to_string());
        let ball_id = reg.add(cannonball).unwrap();

        assert_eq!(reg.impact_missile_of(ball_id), Some(explosion_id));
        assert_eq!(reg.impact_missile_of(explosion_id), None);
    }

    #[test]
    fn test_type_defs_round_trip_ron() {
        let mut reg = MissileTypeRegistry::new();
        reg.add(arrow()).unwrap();
        let text = reg.to_ron().unwrap();
        let restored = MissileTypeRegistry::from_ron(&text).unwrap();
        assert_eq!(restored.len(), 1);
        assert_eq!(
            restored.get(restored.by_ident("missile-arrow").unwrap()),
            reg.get(MissileTypeId(0))
        );
    }

    #[test]
    fn test_burning_table_thresholds() {
        let table = BurningBuildingTable::from_frames(vec![
            BurningBuildingFrame {
                percent: 0,
                missile: Some(MissileTypeId(2)), // big fire
            },
            BurningBuildingFrame {
                percent: 50,
                missile: Some(MissileTypeId(1)), // small fire
            },
            BurningBuildingFrame {
                percent: 90,
                missile: None, // barely scratched: no fire
            },
        ]);
        assert_eq!(table.lookup(10), Some(MissileTypeId(2)));
        assert_eq!(table.lookup(50), Some(MissileTypeId(1)));
        assert_eq!(table.lookup(89), Some(MissileTypeId(1)));
        assert_eq!(table.lookup(95), None);
    }

    #[test]
    fn test_burning_table_below_first_threshold_uses_first() {
        let table = BurningBuildingTable::from_frames(vec![BurningBuildingFrame {
            percent: 20,
            missile: Some(MissileTypeId(0)),
        }]);
        assert_eq!(table.lookup(5), Some(MissileTypeId(0)));
    }

    #[test]
    fn test_burning_table_empty() {
        let table = BurningBuildingTable::default();
        assert_eq!(table.lookup(50), None);
    }
}
