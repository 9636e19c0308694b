//! Trajectory engines.
//!
//! Pure step functions advancing one missile one tick and reporting
//! arrival. The first call on a fresh missile only initializes the
//! stepping state (bit 0 of `state`); every later call advances up to
//! `speed` pixel steps.
//!
//! The straight-line engine is integer error-accumulation line
//! rasterization; the parabolic engine keeps a x100 fixed-point x
//! accumulator and recomputes y in closed form each step. Both are
//! integer-only for cross-platform determinism.

use crate::math::{direction_to_heading, isqrt, HEADING_SOUTH, TILE_SIZE_X, TILE_SIZE_Y};
use crate::missile::Missile;
use crate::types::{MissileClass, MissileType};

/// Reorient the missile's animation toward a new movement delta.
///
/// Keeps the frame's row (animation step) and replaces the direction
/// column. Headings past south reuse the eastern column mirrored.
pub(crate) fn turn_to_heading(missile: &mut Missile, mtype: &MissileType, dx: i32, dy: i32) {
    let stride = mtype.frame_stride();
    missile.mirrored = false;
    missile.frame = (missile.frame / stride) * stride;

    let bucket = 256 / mtype.num_directions;
    let heading = u32::from(direction_to_heading(dx, dy));
    let dir = ((heading + bucket / 2) & 0xFF) / bucket;
    if dir <= HEADING_SOUTH / bucket {
        missile.frame += dir;
    } else {
        missile.frame += mtype.num_directions - dir;
        missile.mirrored = true;
    }
}

/// Set up the line-stepping state on the first tick.
///
/// Returns `true` for a zero-length flight (already arrived).
fn init_point_to_point(missile: &mut Missile, mtype: &MissileType) -> bool {
    let mut dy = missile.goal.y - missile.pos.y;
    let mut ystep = 1;
    if dy < 0 {
        dy = -dy;
        ystep = -1;
    }
    let mut dx = missile.goal.x - missile.pos.x;
    let mut xstep = 1;
    if dx < 0 {
        dx = -dx;
        xstep = -1;
    }

    match mtype.class {
        // Spinning effects keep whatever frame they show.
        MissileClass::Whirlwind | MissileClass::FlameShield => {}
        MissileClass::Blizzard => {
            missile.frame = 0;
            missile.mirrored = false;
        }
        // Bounce paths aim half a tile short; each bounce extends the
        // destination onward again.
        MissileClass::PointToPointTripleBounce => {
            missile.goal.x -= xstep * TILE_SIZE_X / 2;
            missile.goal.y -= ystep * TILE_SIZE_Y / 2;
        }
        _ => turn_to_heading(missile, mtype, dx * xstep, dy * ystep),
    }

    if dy == 0 && dx == 0 {
        return true;
    }

    // Error term only matters when neither axis dominates trivially.
    if dx != 0 && dy != 0 && dx != dy {
        if dx < dy {
            missile.d = dy - 1;
        } else {
            missile.d = dx - 1;
        }
        dx += dx;
        dy += dy;
    }

    missile.dx = dx;
    missile.dy = dy;
    missile.xstep = xstep;
    missile.ystep = ystep;
    missile.state += 1;
    false
}

/// Advance a straight-line missile one tick.
///
/// Arrival is checked after every pixel step, so a pure-axis delta `d`
/// arrives in exactly `ceil(d / speed)` advancing ticks and the dominant
/// axis never overshoots.
pub fn point_to_point(missile: &mut Missile, mtype: &MissileType) -> bool {
    if missile.state & 1 == 0 {
        return init_point_to_point(missile, mtype);
    }

    let speed = mtype.speed;

    if missile.dy == 0 {
        // Horizontal line.
        if missile.pos.x == missile.goal.x {
            return true;
        }
        for _ in 0..speed {
            missile.pos.x += missile.xstep;
            if missile.pos.x == missile.goal.x {
                return true;
            }
        }
        return false;
    }

    if missile.dx == 0 {
        // Vertical line.
        if missile.pos.y == missile.goal.y {
            return true;
        }
        for _ in 0..speed {
            missile.pos.y += missile.ystep;
            if missile.pos.y == missile.goal.y {
                return true;
            }
        }
        return false;
    }

    if missile.dx < missile.dy {
        // Vertical-dominant: error term decides x steps.
        if missile.pos.y == missile.goal.y {
            return true;
        }
        for _ in 0..speed {
            missile.pos.y += missile.ystep;
            missile.d -= missile.dx;
            if missile.d < 0 {
                missile.d += missile.dy;
                missile.pos.x += missile.xstep;
            }
            if missile.pos.y == missile.goal.y {
                return true;
            }
        }
        return false;
    }

    if missile.dx > missile.dy {
        // Horizontal-dominant.
        if missile.pos.x == missile.goal.x {
            return true;
        }
        for _ in 0..speed {
            missile.pos.x += missile.xstep;
            missile.d -= missile.dy;
            if missile.d < 0 {
                missile.d += missile.dx;
                missile.pos.y += missile.ystep;
            }
            if missile.pos.x == missile.goal.x {
                return true;
            }
        }
        return false;
    }

    // Perfect diagonal: both axes advance in lock-step.
    if missile.pos.y == missile.goal.y {
        return true;
    }
    for _ in 0..speed {
        missile.pos.x += missile.xstep;
        missile.pos.y += missile.ystep;
        if missile.pos.y == missile.goal.y {
            return true;
        }
    }
    false
}

/// Recompute the parabolic y for the current fixed-point x.
///
/// The arc is anchored on the source/destination midpoint:
/// `y = (angle*(x - sx) - amplitude*sqrt((sx - mid)^2 - (x - mid)^2) + sy*100) / 100`.
/// Amplitude 100 is the full arc, 50 the flattened degenerate-axis form.
fn parabolic_calc(missile: &mut Missile, amplitude: i64) {
    missile.xl -= missile.xstep;
    missile.pos.x = missile.xl / 100;

    let x = i64::from(missile.pos.x);
    let xmid = i64::from(missile.source_px.x + missile.goal.x) / 2;
    let rise = (x - xmid) * (x - xmid);
    let half_span = i64::from(missile.source_px.x) - xmid;
    let under_root = half_span * half_span - rise;
    let y = i64::from(missile.angle) * (x - i64::from(missile.source_px.x))
        - amplitude * isqrt(under_root)
        + i64::from(missile.source_px.y) * 100;
    missile.pos.y = (y / 100) as i32;
}

/// Advance a parabolic missile one tick.
///
/// Arrives when x is within one pixel of the destination (x drives the
/// arc), or on exact match for the degenerate single-axis fallbacks.
pub fn parabolic(missile: &mut Missile, mtype: &MissileType) -> bool {
    if missile.state & 1 == 0 {
        // Initialize.
        let mut dy = missile.goal.y - missile.pos.y;
        let mut ystep = 1;
        if dy < 0 {
            dy = -dy;
            ystep = -1;
        }
        let mut dx = missile.goal.x - missile.pos.x;
        let mut xstep = 1;
        if dx < 0 {
            dx = -dx;
            xstep = -1;
        }

        missile.angle = if missile.source_px.x == missile.goal.x {
            1
        } else {
            100 * (missile.source_px.y - missile.goal.y) / (missile.source_px.x - missile.goal.x)
        };
        missile.xl = missile.pos.x * 100;

        turn_to_heading(missile, mtype, dx * xstep, dy * ystep);

        if dx == 0 && dy == 0 {
            return true;
        }

        missile.dx = dx;
        missile.dy = dy;
        let span_x = i64::from(missile.source_px.x - missile.goal.x);
        let span_y = i64::from(missile.source_px.y - missile.goal.y);
        let hypot = isqrt(span_x * span_x + span_y * span_y);
        missile.xstep = if hypot == 0 {
            0
        } else {
            (100 * span_x / hypot) as i32
        };
        missile.ystep = ystep;
        missile.state += 1;
        return false;
    }

    let from_x = missile.pos.x;
    let from_y = missile.pos.y;

    if missile.dy == 0 {
        // Horizontal line: flattened arc.
        for _ in 0..mtype.speed {
            if missile.pos.x == missile.goal.x {
                return true;
            }
            parabolic_calc(missile, 50);
        }
        turn_to_heading(
            missile,
            mtype,
            missile.pos.x - from_x,
            missile.pos.y - from_y,
        );
        return false;
    }

    if missile.dx == 0 || missile.xstep == 0 {
        // Vertical or near-vertical: no arc possible, step straight.
        for _ in 0..mtype.speed {
            if missile.pos.y == missile.goal.y {
                return true;
            }
            missile.pos.y += missile.ystep;
        }
        return false;
    }

    for _ in 0..mtype.speed {
        // x drives the arc and passes the goal monotonically; the
        // truncated slope can leave y a few pixels short at arrival, so
        // arrival must not test y.
        if (missile.pos.x - missile.goal.x).abs() <= 1 {
            return true;
        }
        parabolic_calc(missile, 100);
        turn_to_heading(
            missile,
            mtype,
            missile.pos.x - from_x,
            missile.pos.y - from_y,
        );
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::PixelPos;
    use crate::missile::PoolKind;
    use crate::types::MissileTypeId;
    use proptest::prelude::*;

    fn flight_type(class: MissileClass, speed: i32) -> MissileType {
        MissileType {
            ident: "missile-test".to_string(),
            file: String::new(),
            width: 0,
            height: 0,
            frames: 40,
            num_directions: 8,
            fired_sound: None,
            impact_sound: None,
            class,
            draw_level: 0,
            start_delay: 0,
            sleep: 1,
            speed,
            range: 0,
            impact_missile: None,
            can_hit_owner: false,
            friendly_fire: false,
        }
    }

    fn missile_between(t: &MissileType, from: PixelPos, to: PixelPos) -> Missile {
        Missile::new(MissileTypeId(0), t, from, to, PoolKind::Global)
    }

    #[test]
    fn test_horizontal_arrives_in_ceil_delta_over_speed_ticks() {
        for (delta, speed) in [(100, 32), (96, 32), (1, 32), (33, 32), (10, 3)] {
            let t = flight_type(MissileClass::PointToPoint, speed);
            let mut m = missile_between(&t, PixelPos::new(0, 0), PixelPos::new(delta, 0));
            assert!(!point_to_point(&mut m, &t), "init tick must not arrive");
            let expected = (delta + speed - 1) / speed;
            let mut ticks = 0;
            while !point_to_point(&mut m, &t) {
                ticks += 1;
                assert!(ticks < 1000, "missile never arrived");
            }
            ticks += 1;
            assert_eq!(ticks, expected, "delta {delta} speed {speed}");
            assert_eq!(m.pos.x, m.goal.x, "must not overshoot");
        }
    }

    #[test]
    fn test_vertical_never_overshoots() {
        let t = flight_type(MissileClass::PointToPoint, 7);
        let mut m = missile_between(&t, PixelPos::new(5, 0), PixelPos::new(5, -40));
        point_to_point(&mut m, &t);
        while !point_to_point(&mut m, &t) {
            assert!(m.pos.y >= m.goal.y);
        }
        assert_eq!(m.pos.y, m.goal.y);
        assert_eq!(m.pos.x, m.goal.x);
    }

    #[test]
    fn test_diagonal_advances_axes_in_lockstep() {
        let t = flight_type(MissileClass::PointToPoint, 4);
        let mut m = missile_between(&t, PixelPos::new(0, 0), PixelPos::new(64, 64));
        let start = m.pos;
        point_to_point(&mut m, &t);
        while !point_to_point(&mut m, &t) {
            assert_eq!(m.pos.x - start.x, m.pos.y - start.y);
        }
        assert_eq!(m.pos, m.goal);
    }

    #[test]
    fn test_zero_length_arrives_at_init() {
        let t = flight_type(MissileClass::PointToPoint, 4);
        let mut m = missile_between(&t, PixelPos::new(10, 10), PixelPos::new(10, 10));
        assert!(point_to_point(&mut m, &t));
    }

    #[test]
    fn test_bounce_init_pulls_goal_back_half_a_tile() {
        let t = flight_type(MissileClass::PointToPointTripleBounce, 8);
        let mut m = missile_between(&t, PixelPos::new(0, 0), PixelPos::new(100, 60));
        let goal_before = m.goal;
        point_to_point(&mut m, &t);
        assert_eq!(m.goal.x, goal_before.x - TILE_SIZE_X / 2);
        assert_eq!(m.goal.y, goal_before.y - TILE_SIZE_Y / 2);
    }

    #[test]
    fn test_heading_frame_east() {
        let t = flight_type(MissileClass::PointToPoint, 8);
        let mut m = missile_between(&t, PixelPos::new(0, 0), PixelPos::new(100, 0));
        point_to_point(&mut m, &t);
        // East is direction bucket 2 of N/NE/E/SE/S.
        assert_eq!(m.frame, 2);
        assert!(!m.mirrored);
    }

    #[test]
    fn test_heading_frame_west_is_mirrored_east() {
        let t = flight_type(MissileClass::PointToPoint, 8);
        let mut m = missile_between(&t, PixelPos::new(100, 0), PixelPos::new(0, 0));
        point_to_point(&mut m, &t);
        assert_eq!(m.frame, 2);
        assert!(m.mirrored);
    }

    #[test]
    fn test_whirlwind_keeps_frame_at_init() {
        let t = flight_type(MissileClass::Whirlwind, 8);
        let mut m = missile_between(&t, PixelPos::new(0, 0), PixelPos::new(100, 0));
        m.frame = 3;
        point_to_point(&mut m, &t);
        assert_eq!(m.frame, 3);
    }

    #[test]
    fn test_parabolic_zero_length_arrives_immediately() {
        let t = flight_type(MissileClass::Parabolic, 8);
        let mut m = missile_between(&t, PixelPos::new(50, 50), PixelPos::new(50, 50));
        assert!(parabolic(&mut m, &t));
    }

    #[test]
    fn test_parabolic_pure_vertical_steps_straight() {
        let t = flight_type(MissileClass::Parabolic, 4);
        let mut m = missile_between(&t, PixelPos::new(20, 0), PixelPos::new(20, 40));
        assert!(!parabolic(&mut m, &t));
        let x0 = m.pos.x;
        while !parabolic(&mut m, &t) {
            assert_eq!(m.pos.x, x0);
        }
        assert_eq!(m.pos.y, m.goal.y);
    }

    #[test]
    fn test_parabolic_arcs_up_and_reaches_destination() {
        let t = flight_type(MissileClass::Parabolic, 4);
        let mut m = missile_between(&t, PixelPos::new(16, 16), PixelPos::new(300, 80));
        assert!(!parabolic(&mut m, &t));
        let mut peak_y = m.pos.y;
        let mut ticks = 0;
        while !parabolic(&mut m, &t) {
            peak_y = peak_y.min(m.pos.y);
            ticks += 1;
            assert!(ticks < 10_000, "parabolic missile never arrived");
        }
        assert!((m.pos.x - m.goal.x).abs() <= 1);
        // Screen y grows downward, so the arc's peak lies above the
        // launch point.
        assert!(peak_y < 16, "flight never arced, peak y {peak_y}");
    }

    #[test]
    fn test_parabolic_steep_arc_still_terminates() {
        // dy far larger than dx starves the fixed-point x step to zero;
        // the flight must degrade to straight stepping, not hang.
        let t = flight_type(MissileClass::Parabolic, 4);
        let mut m = missile_between(&t, PixelPos::new(10, 0), PixelPos::new(13, 600));
        assert!(!parabolic(&mut m, &t));
        let mut ticks = 0;
        while !parabolic(&mut m, &t) {
            ticks += 1;
            assert!(ticks < 10_000, "steep parabolic flight never arrived");
        }
    }

    proptest! {
        #[test]
        fn prop_line_always_lands_on_dominant_axis(
            dx in -400i32..400,
            dy in -400i32..400,
            speed in 1i32..64,
        ) {
            let t = flight_type(MissileClass::PointToPoint, speed);
            let mut m = missile_between(&t, PixelPos::new(0, 0), PixelPos::new(dx, dy));
            let mut ticks = 0;
            while !point_to_point(&mut m, &t) {
                ticks += 1;
                prop_assert!(ticks < 2000);
            }
            if dx.abs() >= dy.abs() {
                prop_assert_eq!(m.pos.x, m.goal.x);
            } else {
                prop_assert_eq!(m.pos.y, m.goal.y);
            }
        }
    }
}
