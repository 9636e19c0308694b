//! Integer math for the deterministic simulation.
//!
//! All trajectory and damage math uses plain integers (pixels, tiles,
//! 256-unit headings). Floating-point is banned in simulation paths:
//! it can produce different results on different CPUs, which breaks
//! lockstep multiplayer and replays.

use serde::{Deserialize, Serialize};

/// Width of one map tile in pixels.
pub const TILE_SIZE_X: i32 = 32;

/// Height of one map tile in pixels.
pub const TILE_SIZE_Y: i32 = 32;

/// A position in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PixelPos {
    /// X coordinate in pixels.
    pub x: i32,
    /// Y coordinate in pixels.
    pub y: i32,
}

impl PixelPos {
    /// Create a new pixel position.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Tile containing this pixel.
    #[must_use]
    pub const fn to_tile(self) -> TilePos {
        TilePos {
            x: self.x / TILE_SIZE_X,
            y: self.y / TILE_SIZE_Y,
        }
    }
}

/// A position in map tile coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TilePos {
    /// X coordinate in tiles.
    pub x: i32,
    /// Y coordinate in tiles.
    pub y: i32,
}

impl TilePos {
    /// Create a new tile position.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Pixel at the center of this tile. Missiles are fired from and
    /// aimed at tile centers.
    #[must_use]
    pub const fn center_pixel(self) -> PixelPos {
        PixelPos {
            x: self.x * TILE_SIZE_X + TILE_SIZE_X / 2,
            y: self.y * TILE_SIZE_Y + TILE_SIZE_Y / 2,
        }
    }
}

/// An inclusive rectangle of map tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileRect {
    /// Top-left corner (inclusive).
    pub min: TilePos,
    /// Bottom-right corner (inclusive).
    pub max: TilePos,
}

impl TileRect {
    /// Create a rectangle from two inclusive corners.
    #[must_use]
    pub const fn new(min: TilePos, max: TilePos) -> Self {
        Self { min, max }
    }

    /// Square of side `2 * radius + 1` centered on `center`.
    #[must_use]
    pub const fn around(center: TilePos, radius: i32) -> Self {
        Self {
            min: TilePos::new(center.x - radius, center.y - radius),
            max: TilePos::new(center.x + radius, center.y + radius),
        }
    }

    /// Whether the rectangle contains the given tile.
    #[must_use]
    pub const fn contains(&self, tile: TilePos) -> bool {
        tile.x >= self.min.x && tile.x <= self.max.x && tile.y >= self.min.y && tile.y <= self.max.y
    }

    /// Whether two rectangles overlap.
    #[must_use]
    pub const fn intersects(&self, other: &TileRect) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }
}

/// Chebyshev distance between two tiles (diagonal steps count as one).
#[must_use]
pub const fn map_distance(a: TilePos, b: TilePos) -> i32 {
    let dx = (a.x - b.x).abs();
    let dy = (a.y - b.y).abs();
    if dx > dy {
        dx
    } else {
        dy
    }
}

/// Deterministic integer square root (floor). Negative inputs yield zero.
#[must_use]
pub const fn isqrt(value: i64) -> i64 {
    if value <= 0 {
        return 0;
    }
    let mut root: i64 = 0;
    // Highest power-of-four at or below i64::MAX.
    let mut bit: i64 = 1 << 62;
    let mut rem = value;
    while bit > rem {
        bit >>= 2;
    }
    while bit != 0 {
        if rem >= root + bit {
            rem -= root + bit;
            root = (root >> 1) + bit;
        } else {
            root >>= 1;
        }
        bit >>= 2;
    }
    root
}

/// Heading unit for due south (headings are 256 units per full turn,
/// 0 = north, clockwise).
pub const HEADING_SOUTH: u32 = 128;

/// Compute the 256-unit heading of a pixel delta.
///
/// Screen coordinates: positive `dy` points south. Uses an
/// octant-plus-linear-slope approximation; headings are only ever
/// consumed quantized into a type's direction buckets, where the
/// approximation is exact enough.
#[must_use]
pub fn direction_to_heading(dx: i32, dy: i32) -> u8 {
    if dx == 0 && dy == 0 {
        return 0;
    }
    let ax = i64::from(dx.abs());
    let ay = i64::from(dy.abs());
    // Angle from the vertical axis within the quadrant, 0..=64.
    let inner = if ax <= ay {
        if ay == 0 {
            0
        } else {
            (32 * ax / ay) as i32
        }
    } else {
        64 - (32 * ay / ax) as i32
    };
    let heading = if dy < 0 && dx >= 0 {
        inner
    } else if dx > 0 {
        128 - inner
    } else if dy > 0 {
        128 + inner
    } else {
        256 - inner
    };
    (heading & 0xFF) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_isqrt_exact_squares() {
        assert_eq!(isqrt(0), 0);
        assert_eq!(isqrt(1), 1);
        assert_eq!(isqrt(4), 2);
        assert_eq!(isqrt(144), 12);
        assert_eq!(isqrt(1 << 40), 1 << 20);
    }

    #[test]
    fn test_isqrt_floors() {
        assert_eq!(isqrt(2), 1);
        assert_eq!(isqrt(99), 9);
        assert_eq!(isqrt(10000 - 1), 99);
    }

    #[test]
    fn test_isqrt_negative_is_zero() {
        assert_eq!(isqrt(-25), 0);
    }

    #[test]
    fn test_heading_cardinals() {
        assert_eq!(direction_to_heading(0, -1), 0); // north
        assert_eq!(direction_to_heading(1, 0), 64); // east
        assert_eq!(direction_to_heading(0, 1), 128); // south
        assert_eq!(direction_to_heading(-1, 0), 192); // west
    }

    #[test]
    fn test_heading_diagonals() {
        assert_eq!(direction_to_heading(1, -1), 32); // north-east
        assert_eq!(direction_to_heading(1, 1), 96); // south-east
        assert_eq!(direction_to_heading(-1, 1), 160); // south-west
        assert_eq!(direction_to_heading(-1, -1), 224); // north-west
    }

    #[test]
    fn test_map_distance_chebyshev() {
        assert_eq!(map_distance(TilePos::new(0, 0), TilePos::new(3, 1)), 3);
        assert_eq!(map_distance(TilePos::new(5, 5), TilePos::new(5, 5)), 0);
        assert_eq!(map_distance(TilePos::new(2, 7), TilePos::new(0, 0)), 7);
    }

    #[test]
    fn test_tile_rect_contains() {
        let rect = TileRect::around(TilePos::new(10, 10), 2);
        assert!(rect.contains(TilePos::new(8, 8)));
        assert!(rect.contains(TilePos::new(12, 12)));
        assert!(!rect.contains(TilePos::new(13, 10)));
    }

    #[test]
    fn test_tile_center_pixel() {
        let px = TilePos::new(2, 3).center_pixel();
        assert_eq!(px, PixelPos::new(2 * 32 + 16, 3 * 32 + 16));
        assert_eq!(px.to_tile(), TilePos::new(2, 3));
    }
}
