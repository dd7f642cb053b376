//! Enemy AI state machine, evaluated once per tick for every living mob.

use glam::Vec2;

use crate::combat::{angle_to, can_attack, forward};
use crate::config::CombatConfig;
use crate::geometry::WorldGeometry;
use crate::registry::{EntityId, HostileEntity};
use crate::rng::CombatRng;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AiState {
    #[default]
    Wander,
    Chase,
    Attack,
    /// Terminal until the registry respawns the entity.
    Dead,
}

/// Something a mob did to the player this tick.
#[derive(Debug, Clone, PartialEq)]
pub enum AiAction {
    /// Melee contact. `attack` already includes the arm debuff.
    MeleeHit { source: EntityId, attack: f32 },
    Shoot {
        source: EntityId,
        origin: Vec2,
        direction: Vec2,
        speed: f32,
        damage: i32,
        expires_at: f64,
    },
}

/// Damage a mob melee hit deals to a player after defense and blocking.
pub fn melee_damage(attack: f32, defense: i32, blocking: bool, block_factor: f32) -> i32 {
    let damage = ((attack - defense as f32).round() as i32).max(1);
    if blocking {
        (damage as f32 * block_factor).round() as i32
    } else {
        damage
    }
}

/// Advance one mob. `player` is the position it hunts, if there is one.
pub fn tick_entity(
    entity: &mut HostileEntity,
    player: Option<Vec2>,
    now: f64,
    dt: f32,
    config: &CombatConfig,
    geometry: &dyn WorldGeometry,
    rng: &mut CombatRng,
) -> Option<AiAction> {
    if !entity.alive {
        entity.state = AiState::Dead;
        return None;
    }
    let ai = &config.ai;

    let Some(target) = player.filter(|p| p.distance(entity.position) < entity.def.stats.detect_radius)
    else {
        entity.state = AiState::Wander;
        wander(entity, now, dt, config, geometry, rng);
        return None;
    };

    let distance = target.distance(entity.position);
    entity.angle = angle_to(entity.position, target);
    let attack = entity.def.stats.attack as f32 * entity.attack_factor(now, &config.zones);

    let melee_range = if entity.is_boss() {
        ai.boss_melee_range
    } else {
        ai.melee_range
    };
    // In range but cooling down: hold position, still chasing.
    if distance < melee_range {
        if !can_attack(entity.last_attack_at, now, ai.melee_cooldown_secs) {
            entity.state = AiState::Chase;
            return None;
        }
        entity.state = AiState::Attack;
        entity.last_attack_at = Some(now);
        return Some(AiAction::MeleeHit {
            source: entity.id().clone(),
            attack,
        });
    }

    if entity.kind().is_caster() && distance > ai.ranged_min && distance < ai.ranged_max {
        if !can_attack(entity.last_attack_at, now, ai.ranged_cooldown_secs) {
            entity.state = AiState::Chase;
            return None;
        }
        entity.state = AiState::Attack;
        entity.last_attack_at = Some(now);
        let speed = if entity.is_boss() {
            ai.boss_bolt_speed
        } else {
            ai.bolt_speed
        };
        return Some(AiAction::Shoot {
            source: entity.id().clone(),
            origin: entity.position,
            direction: (target - entity.position).normalize_or_zero(),
            speed,
            damage: (attack.round() as i32 - ai.bolt_damage_penalty).max(1),
            expires_at: now + ai.bolt_lifetime_secs,
        });
    }

    entity.state = AiState::Chase;
    let step = (entity.move_speed(now, &config.zones) * dt).min(distance);
    let to = entity.position + forward(entity.angle) * step;
    entity.position = geometry.resolve_move(entity.position, to, 0.0);
    None
}

fn wander(
    entity: &mut HostileEntity,
    now: f64,
    dt: f32,
    config: &CombatConfig,
    geometry: &dyn WorldGeometry,
    rng: &mut CombatRng,
) {
    let ai = &config.ai;
    if now >= entity.next_wander_at {
        entity.next_wander_at = now + rng.range(ai.wander_min_secs, ai.wander_max_secs);
        entity.wander_heading = if rng.chance(ai.wander_pause_chance) {
            None
        } else {
            Some(rng.heading())
        };
    }

    let Some(heading) = entity.wander_heading else {
        return;
    };
    entity.angle = heading;
    let speed = entity.move_speed(now, &config.zones) * ai.wander_speed_factor;
    let to = entity.position + forward(heading) * speed * dt;
    entity.position = geometry.resolve_move(entity.position, to, 0.0);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Obstacle, StaticGeometry};
    use crate::registry::{MobKind, SpawnDef};
    use crate::zones::HitZone;
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn mob(kind: MobKind, at: Vec2) -> HostileEntity {
        HostileEntity::spawn(SpawnDef::new("m", kind, at))
    }

    fn run(
        entity: &mut HostileEntity,
        player: Vec2,
        now: f64,
        dt: f32,
    ) -> Option<AiAction> {
        let cfg = CombatConfig::default();
        let geo = StaticGeometry::square_map(3000.0);
        let mut rng = CombatRng::seeded(3);
        tick_entity(entity, Some(player), now, dt, &cfg, &geo, &mut rng)
    }

    #[rstest]
    #[case(10, 5, false, 5)]
    #[case(15, 5, true, 4)]
    #[case(3, 5, false, 1)]
    #[case(3, 5, true, 0)]
    fn player_damage_formula(
        #[case] attack: i32,
        #[case] defense: i32,
        #[case] blocking: bool,
        #[case] expected: i32,
    ) {
        assert_eq!(melee_damage(attack as f32, defense, blocking, 0.4), expected);
    }

    #[test]
    fn far_player_means_wander() {
        let mut skel = mob(MobKind::Skeleton, Vec2::new(500.0, 500.0));
        assert!(run(&mut skel, Vec2::new(1500.0, 1500.0), 0.0, 0.1).is_none());
        assert_eq!(skel.state, AiState::Wander);
        assert!(skel.next_wander_at >= 2.0 && skel.next_wander_at <= 5.0);
        assert!(skel.position.distance(Vec2::new(500.0, 500.0)) <= 40.0 * 0.3 * 0.1 + 1e-3);
    }

    #[test]
    fn chases_toward_player() {
        let mut wolf = mob(MobKind::Wolf, Vec2::new(100.0, 100.0));
        run(&mut wolf, Vec2::new(100.0, 200.0), 0.0, 0.5);
        assert_eq!(wolf.state, AiState::Chase);
        assert_relative_eq!(wolf.position.y, 130.0, epsilon = 1e-3);
        assert_relative_eq!(wolf.position.x, 100.0, epsilon = 1e-3);
    }

    #[test]
    fn leg_debuff_slows_chase() {
        let mut skel = mob(MobKind::Skeleton, Vec2::new(100.0, 100.0));
        skel.dismembered.insert(HitZone::LegLeft);
        skel.leg_debuff_until = Some(5.0);
        run(&mut skel, Vec2::new(100.0, 200.0), 1.0, 1.0);
        assert_relative_eq!(skel.position.y, 112.0, epsilon = 1e-3);
    }

    #[test]
    fn melee_respects_cooldown_and_stagger() {
        let mut slime = mob(MobKind::Slime, Vec2::new(100.0, 100.0));
        let player = Vec2::new(100.0, 110.0);

        let first = run(&mut slime, player, 0.0, 0.016);
        assert!(matches!(first, Some(AiAction::MeleeHit { attack, .. }) if attack == 5.0));
        assert_eq!(slime.state, AiState::Attack);
        assert!(run(&mut slime, player, 1.0, 0.016).is_none());
        assert_eq!(slime.state, AiState::Chase);
        assert_eq!(slime.position, Vec2::new(100.0, 100.0));
        assert!(run(&mut slime, player, 1.2, 0.016).is_some());
        assert_eq!(slime.state, AiState::Attack);

        // Staggered into the future.
        slime.last_attack_at = Some(2.7);
        assert!(run(&mut slime, player, 3.0, 0.016).is_none());
        assert!(run(&mut slime, player, 4.0, 0.016).is_some());
    }

    #[test]
    fn weakened_arm_reduces_attack() {
        let mut skel = mob(MobKind::Skeleton, Vec2::new(100.0, 100.0));
        skel.arm_debuff_until = Some(10.0);
        let action = run(&mut skel, Vec2::new(100.0, 105.0), 1.0, 0.016);
        assert!(matches!(action, Some(AiAction::MeleeHit { attack, .. }) if (attack - 6.0).abs() < 1e-4));
    }

    #[test]
    fn caster_shoots_inside_band() {
        let mut mage = mob(MobKind::DarkMage, Vec2::new(100.0, 100.0));
        let action = run(&mut mage, Vec2::new(100.0, 250.0), 0.0, 0.016);
        let Some(AiAction::Shoot {
            direction,
            speed,
            damage,
            expires_at,
            ..
        }) = action
        else {
            panic!("expected a bolt, got {action:?}");
        };
        assert_eq!(direction, Vec2::Y);
        assert_eq!(speed, 160.0);
        assert_eq!(damage, 12);
        assert_eq!(expires_at, 3.0);
        assert_eq!(mage.position, Vec2::new(100.0, 100.0));

        assert!(run(&mut mage, Vec2::new(100.0, 250.0), 1.0, 0.016).is_none());
        assert_eq!(mage.state, AiState::Chase);
        assert!(run(&mut mage, Vec2::new(100.0, 250.0), 1.8, 0.016).is_some());
        assert_eq!(mage.state, AiState::Attack);
    }

    #[test]
    fn non_casters_chase_inside_band() {
        let mut wolf = mob(MobKind::Wolf, Vec2::new(100.0, 100.0));
        assert!(run(&mut wolf, Vec2::new(100.0, 250.0), 0.0, 0.016).is_none());
        assert_eq!(wolf.state, AiState::Chase);
    }

    #[test]
    fn dead_mobs_idle() {
        let mut slime = mob(MobKind::Slime, Vec2::new(100.0, 100.0));
        slime.alive = false;
        slime.hp = 0;
        assert!(run(&mut slime, Vec2::new(100.0, 105.0), 0.0, 0.016).is_none());
        assert_eq!(slime.state, AiState::Dead);
        assert_eq!(slime.position, Vec2::new(100.0, 100.0));
    }

    #[test]
    fn obstacles_stop_chase() {
        let cfg = CombatConfig::default();
        let geo = StaticGeometry::square_map(3000.0).with_obstacle(Obstacle::Circle {
            center: Vec2::new(100.0, 140.0),
            radius: 20.0,
        });
        let mut rng = CombatRng::seeded(1);
        let mut wolf = mob(MobKind::Wolf, Vec2::new(100.0, 100.0));
        tick_entity(&mut wolf, Some(Vec2::new(100.0, 250.0)), 0.0, 0.5, &cfg, &geo, &mut rng);
        assert_eq!(wolf.position, Vec2::new(100.0, 100.0));
    }
}
