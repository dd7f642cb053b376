use bevy::prelude::*;
use skirmish_shared::feedback::{FeedbackRequest, Tint, TimeDilation};

use crate::combat::{FeedbackRequested, FrameSet};

pub fn plugin(app: &mut App) {
    app.init_resource::<GameClock>()
        .init_resource::<ScreenShake>()
        .init_resource::<ScreenTint>()
        .add_observer(on_time_request)
        .add_observer(on_camera_shake)
        .add_observer(on_screen_flash)
        .add_observer(on_notification)
        .add_systems(Update, drive_game_clock.before(FrameSet::Receive))
        .add_systems(Update, (decay_shake, decay_tint).in_set(FrameSet::Present));
}

// ── Hit Stop & Slow Motion ──────────────────────────────────────────

/// Hit-stop and slow-motion state. Runs on real time and sets the speed of
/// the virtual clock that the rest of the game reads.
#[derive(Resource, Default, Deref, DerefMut, Debug)]
pub struct GameClock(pub TimeDilation);

fn on_time_request(on: On<FeedbackRequested>, mut clock: ResMut<GameClock>) {
    clock.apply(&on.event().0);
}

fn drive_game_clock(
    real: Res<Time<Real>>,
    mut clock: ResMut<GameClock>,
    mut time: ResMut<Time<Virtual>>,
) {
    let speed = clock.advance(real.delta_secs());
    if time.relative_speed() != speed {
        time.set_relative_speed(speed);
    }
}

// ── Screen Shake ────────────────────────────────────────────────────

#[derive(Resource, Default, Debug)]
pub struct ScreenShake {
    pub trauma: f32,
    /// Camera offset for this frame, for whoever draws the scene.
    pub offset: Vec2,
}

impl ScreenShake {
    pub const DECAY: f32 = 2.5;
    pub const MAX_TRAUMA: f32 = 0.7;
    pub const MAX_TRANSLATION: f32 = 12.0;
    pub const NOISE_SPEED: f32 = 25.0;

    /// Stack trauma with diminishing returns near the cap.
    pub fn add(&mut self, intensity: f32) {
        let diminish = 1.0 - self.trauma;
        self.trauma = (self.trauma + intensity * diminish).min(Self::MAX_TRAUMA);
    }

    pub fn sample(&self, elapsed: f32) -> Vec2 {
        let amount = self.trauma * self.trauma;
        let t = elapsed * Self::NOISE_SPEED;
        let x = t.sin() * 0.5 + (t * 2.3).cos() * 0.3 + (t * 4.1).sin() * 0.2;
        let y = (t * 1.7).cos() * 0.5 + (t * 3.1).sin() * 0.3 + (t * 5.3).cos() * 0.2;
        Vec2::new(x, y) * amount * Self::MAX_TRANSLATION
    }
}

fn on_camera_shake(on: On<FeedbackRequested>, mut shake: ResMut<ScreenShake>) {
    if let FeedbackRequest::CameraShake { intensity } = on.event().0 {
        shake.add(intensity);
    }
}

fn decay_shake(real: Res<Time<Real>>, mut shake: ResMut<ScreenShake>) {
    shake.trauma = (shake.trauma - ScreenShake::DECAY * real.delta_secs()).max(0.0);
    shake.offset = if shake.trauma > 0.0 {
        shake.sample(real.elapsed_secs())
    } else {
        Vec2::ZERO
    };
}

// ── Screen Flash ────────────────────────────────────────────────────

/// Full-screen colour wash, e.g. red when the player is hurt.
#[derive(Resource, Debug)]
pub struct ScreenTint {
    pub tint: Tint,
    pub remaining: f32,
}

impl Default for ScreenTint {
    fn default() -> Self {
        Self {
            tint: Tint::WHITE,
            remaining: 0.0,
        }
    }
}

fn on_screen_flash(on: On<FeedbackRequested>, mut screen: ResMut<ScreenTint>) {
    if let FeedbackRequest::ScreenFlash {
        tint,
        duration_secs,
    } = on.event().0
    {
        screen.tint = tint;
        screen.remaining = screen.remaining.max(duration_secs);
    }
}

fn decay_tint(real: Res<Time<Real>>, mut screen: ResMut<ScreenTint>) {
    screen.remaining = (screen.remaining - real.delta_secs()).max(0.0);
}

fn on_notification(on: On<FeedbackRequested>) {
    if let FeedbackRequest::Notification { text } = &on.event().0 {
        info!("{text}");
    }
}
