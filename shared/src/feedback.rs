//! Fire-and-forget requests for the renderer and UI.
//!
//! The core never draws anything. It queues these and the host drains them
//! once per frame.

use glam::Vec2;
use smol_str::SmolStr;

use crate::registry::EntityId;

/// 0xRRGGBB.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tint(pub u32);

impl Tint {
    pub const WHITE: Tint = Tint(0xFFFFFF);
    pub const CRIT_RED: Tint = Tint(0xFF4444);
    pub const DAMAGE: Tint = Tint(0xFFDD44);
    pub const PLAYER_HURT: Tint = Tint(0xFF0000);
    pub const BLOCKED: Tint = Tint(0x88CCFF);
    pub const COMBO: Tint = Tint(0xFF8800);
    pub const DISMEMBER: Tint = Tint(0xFF2222);
    pub const XP: Tint = Tint(0x66FF66);
}

#[derive(Debug, Clone, PartialEq)]
pub enum FeedbackRequest {
    DamageNumber {
        position: Vec2,
        value: i32,
        tint: Tint,
    },
    FloatingText {
        position: Vec2,
        text: SmolStr,
        tint: Tint,
    },
    /// Named one-shot visual such as a slash arc or projectile trail.
    Effect {
        name: &'static str,
        position: Vec2,
        angle: f32,
    },
    EntityFlash {
        entity: EntityId,
        until: f64,
    },
    ScreenFlash {
        tint: Tint,
        duration_secs: f32,
    },
    CameraShake {
        intensity: f32,
    },
    HitStop {
        duration_secs: f32,
    },
    SlowMotion {
        scale: f32,
    },
    Notification {
        text: SmolStr,
    },
    EntityRemoved {
        entity: EntityId,
    },
    EntityRespawned {
        entity: EntityId,
        position: Vec2,
    },
}

/// Slow-motion scale recovery rate, in scale units per real second.
pub const SLOW_MOTION_RECOVERY: f32 = 4.0;

/// Game clock speed after hit-stop and slow-motion requests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeDilation {
    pub scale: f32,
    pub frozen_for: f32,
}

impl Default for TimeDilation {
    fn default() -> Self {
        Self {
            scale: 1.0,
            frozen_for: 0.0,
        }
    }
}

impl TimeDilation {
    /// Deeper slow-motion wins over a shallower one already running.
    pub fn slow_to(&mut self, scale: f32) {
        self.scale = self.scale.min(scale.clamp(0.0, 1.0));
    }

    pub fn freeze(&mut self, secs: f32) {
        self.frozen_for = self.frozen_for.max(secs);
    }

    /// Advance by real time and return the speed the game clock should run at.
    pub fn advance(&mut self, real_dt: f32) -> f32 {
        if self.frozen_for > 0.0 {
            self.frozen_for = (self.frozen_for - real_dt).max(0.0);
            return 0.0;
        }
        if self.scale < 1.0 {
            self.scale = (self.scale + real_dt * SLOW_MOTION_RECOVERY).min(1.0);
        }
        self.scale
    }

    pub fn apply(&mut self, request: &FeedbackRequest) {
        match *request {
            FeedbackRequest::HitStop { duration_secs } => self.freeze(duration_secs),
            FeedbackRequest::SlowMotion { scale } => self.slow_to(scale),
            _ => {}
        }
    }
}
