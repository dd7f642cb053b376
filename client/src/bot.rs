//! Scripted local player for headless runs.

use bevy::prelude::*;
use skirmish_shared::combat::can_attack;
use skirmish_shared::config::AttackKind;
use skirmish_shared::world::CombatWorld;

use crate::combat::{AttackPressed, Combat, FrameSet, MoveInput};

pub fn plugin(app: &mut App) {
    app.add_systems(
        Update,
        drive_bot
            .in_set(FrameSet::Input)
            .before(crate::combat::apply_input)
            .run_if(resource_exists::<Bot>),
    );
}

/// Pointer swipes the bot cycles through: thrust, overhead, right, left.
const SWIPES: [Vec2; 4] = [
    Vec2::ZERO,
    Vec2::new(0.0, -30.0),
    Vec2::new(30.0, 0.0),
    Vec2::new(-30.0, 0.0),
];

/// Walks to the nearest living hostile and attacks it.
#[derive(Resource, Debug, Clone)]
pub struct Bot {
    swings: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BotInput {
    pub movement: Vec2,
    pub attack: Option<Vec2>,
    pub pointer_delta: Vec2,
}

impl Bot {
    pub fn hunter() -> Self {
        Bot { swings: 0 }
    }

    pub fn next_input(&mut self, world: &CombatWorld, now: f64) -> BotInput {
        let player = world.player();
        if player.is_dead() {
            return BotInput::default();
        }
        let config = world.config();
        let profile = config.class(player.class);
        let ready = can_attack(player.last_attack_at, now, profile.cooldown_secs);
        let range = match profile.attack {
            AttackKind::Melee => config.swing.reach + config.swing.hit_radius * 0.8,
            AttackKind::Ranged {
                speed,
                lifetime_secs,
            } => (speed * lifetime_secs as f32 * 0.5).min(250.0),
        };

        let Some(target) = world
            .registry()
            .living()
            .map(|mob| mob.position)
            .min_by(|a, b| {
                a.distance_squared(player.position)
                    .total_cmp(&b.distance_squared(player.position))
            })
        else {
            return BotInput::default();
        };

        let offset = target - player.position;
        if offset.length() > range {
            return BotInput {
                movement: offset,
                ..default()
            };
        }
        if !ready {
            return BotInput::default();
        }
        let pointer_delta = SWIPES[self.swings % SWIPES.len()];
        self.swings += 1;
        BotInput {
            attack: Some(target),
            pointer_delta,
            ..default()
        }
    }
}

fn drive_bot(
    real: Res<Time<Real>>,
    combat: Res<Combat>,
    mut bot: ResMut<Bot>,
    mut moves: MessageWriter<MoveInput>,
    mut attacks: MessageWriter<AttackPressed>,
) {
    let input = bot.next_input(&combat, real.elapsed_secs_f64());
    if input.movement != Vec2::ZERO {
        moves.write(MoveInput(input.movement));
    }
    if let Some(target) = input.attack {
        attacks.write(AttackPressed {
            target: Some(target),
            pointer_delta: input.pointer_delta,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skirmish_shared::combat::CombatClass;
    use skirmish_shared::config::CombatConfig;
    use skirmish_shared::player::PlayerState;
    use skirmish_shared::registry::{MobKind, SpawnDef};
    use skirmish_shared::rng::CombatRng;

    fn world(mob_at: Vec2) -> CombatWorld {
        let config = CombatConfig::default();
        let player = PlayerState::new("bot", CombatClass::Warrior, Vec2::new(500.0, 500.0), &config);
        CombatWorld::open_map(
            config,
            player,
            [SpawnDef::new("slime_1", MobKind::Slime, mob_at)],
            CombatRng::seeded(3),
        )
    }

    #[test]
    fn hunter_walks_then_swings() {
        let mut bot = Bot::hunter();

        let far = world(Vec2::new(500.0, 700.0));
        let input = bot.next_input(&far, 0.0);
        assert_eq!(input.attack, None);
        assert!(input.movement.y > 0.0);

        let near = world(Vec2::new(500.0, 520.0));
        let input = bot.next_input(&near, 0.0);
        assert_eq!(input.attack, Some(Vec2::new(500.0, 520.0)));
        assert_eq!(input.pointer_delta, Vec2::ZERO);
        let input = bot.next_input(&near, 0.0);
        assert_eq!(input.pointer_delta, Vec2::new(0.0, -30.0));
    }
}
