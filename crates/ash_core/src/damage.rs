//! Combat damage formula.

use crate::math::isqrt;
use crate::rng::SyncRng;
use crate::world::UnitStats;

/// Compute the damage one hit deals, from attacker and target stats.
///
/// Basic damage is reduced by armor but never below 1; piercing damage
/// ignores armor. Experience adds `sqrt(xp / 100) * xp_damage` to basic
/// damage, and bloodlust doubles both components. The total is then
/// reduced by a synchronized random amount strictly below
/// `(total + 2) / 2`, keeping the result in the upper half of the
/// range. Callers divide by a splash factor afterwards.
pub fn calculate_damage_stats(
    attacker: &UnitStats,
    target: &UnitStats,
    bloodlust: bool,
    experience: u32,
    xp_damage: i32,
    rng: &mut SyncRng,
) -> i32 {
    let mut basic = attacker.basic_damage + isqrt(i64::from(experience / 100)) as i32 * xp_damage;
    let mut piercing = attacker.piercing_damage;
    if bloodlust {
        basic *= 2;
        piercing *= 2;
    }

    let damage = (basic - target.armor).max(1) + piercing;
    let jitter_bound = (damage + 2) / 2;
    damage - rng.bounded(jitter_bound as u32) as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn attacker(basic: i32, piercing: i32) -> UnitStats {
        UnitStats {
            hit_points: 60,
            basic_damage: basic,
            piercing_damage: piercing,
            armor: 0,
        }
    }

    fn armored(armor: i32) -> UnitStats {
        UnitStats {
            hit_points: 100,
            basic_damage: 0,
            piercing_damage: 0,
            armor,
        }
    }

    #[test]
    fn test_armor_floors_basic_at_one() {
        // basic 10 vs armor 20 floors to 1, plus piercing 5 = 6 before
        // the random reduction of 0..(6+2)/2.
        let mut rng = SyncRng::new(1);
        for _ in 0..64 {
            let dmg = calculate_damage_stats(
                &attacker(10, 5),
                &armored(20),
                false,
                0,
                1,
                &mut rng,
            );
            assert!((3..=6).contains(&dmg), "damage {dmg} out of band");
        }
    }

    #[test]
    fn test_bloodlust_doubles_both_components() {
        let mut a = SyncRng::new(7);
        let mut b = SyncRng::new(7);
        let plain = calculate_damage_stats(&attacker(8, 4), &armored(0), false, 0, 1, &mut a);
        let lusted = calculate_damage_stats(&attacker(8, 4), &armored(0), true, 0, 1, &mut b);
        // Same rng stream; the bound grows so the exact relation varies,
        // but the pre-random total doubles from 12 to 24.
        assert!(plain <= 12 && plain >= 12 - (12 + 2) / 2 + 1);
        assert!(lusted <= 24 && lusted >= 24 - (24 + 2) / 2 + 1);
    }

    #[test]
    fn test_experience_adds_sqrt_hundredths() {
        let mut rng = SyncRng::new(3);
        // 400 xp -> sqrt(4) = 2 extra basic damage per xp_damage point.
        let dmg = calculate_damage_stats(&attacker(6, 0), &armored(0), false, 400, 3, &mut rng);
        let total = 6 + 2 * 3;
        assert!(dmg <= total && dmg > total - (total + 2) / 2);
    }

    #[test]
    fn test_same_seed_same_damage() {
        let mut a = SyncRng::new(99);
        let mut b = SyncRng::new(99);
        for _ in 0..16 {
            assert_eq!(
                calculate_damage_stats(&attacker(10, 2), &armored(3), false, 0, 1, &mut a),
                calculate_damage_stats(&attacker(10, 2), &armored(3), false, 0, 1, &mut b),
            );
        }
    }

    proptest! {
        #[test]
        fn prop_damage_is_positive_and_bounded(
            basic in 0i32..1000,
            piercing in 0i32..1000,
            armor in 0i32..1000,
            seed in any::<u64>(),
        ) {
            let mut rng = SyncRng::new(seed);
            let dmg = calculate_damage_stats(
                &attacker(basic, piercing),
                &armored(armor),
                false,
                0,
                1,
                &mut rng,
            );
            let total = (basic - armor).max(1) + piercing;
            prop_assert!(dmg >= 1);
            prop_assert!(dmg > total - (total + 2) / 2);
            prop_assert!(dmg <= total);
        }
    }
}
