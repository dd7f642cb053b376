//! Static world geometry used for movement collision.

use glam::Vec2;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Obstacle {
    Circle { center: Vec2, radius: f32 },
    /// Axis-aligned box.
    Rect { min: Vec2, max: Vec2 },
}

impl Obstacle {
    /// Whether a body of `radius` centered at `point` overlaps the obstacle.
    pub fn overlaps(&self, point: Vec2, radius: f32) -> bool {
        match *self {
            Self::Circle { center, radius: r } => point.distance_squared(center) < (r + radius).powi(2),
            Self::Rect { min, max } => {
                let closest = point.clamp(min, max);
                point.distance_squared(closest) < radius * radius
                    || (point.cmpge(min).all() && point.cmple(max).all())
            }
        }
    }
}

/// Read-only view of the world the core moves entities through.
pub trait WorldGeometry {
    fn is_blocked(&self, point: Vec2, radius: f32) -> bool;

    fn clamp_to_bounds(&self, point: Vec2) -> Vec2;

    /// Destination of a straight move, or `from` when the target is blocked.
    fn resolve_move(&self, from: Vec2, to: Vec2, radius: f32) -> Vec2 {
        let to = self.clamp_to_bounds(to);
        if self.is_blocked(to, radius) { from } else { to }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StaticGeometry {
    pub obstacles: Vec<Obstacle>,
    pub bounds: Option<(Vec2, Vec2)>,
}

impl StaticGeometry {
    pub fn square_map(size: f32) -> Self {
        Self {
            obstacles: Vec::new(),
            bounds: Some((Vec2::ZERO, Vec2::splat(size))),
        }
    }

    pub fn with_obstacle(mut self, obstacle: Obstacle) -> Self {
        self.obstacles.push(obstacle);
        self
    }
}

impl WorldGeometry for StaticGeometry {
    fn is_blocked(&self, point: Vec2, radius: f32) -> bool {
        self.obstacles.iter().any(|o| o.overlaps(point, radius))
    }

    fn clamp_to_bounds(&self, point: Vec2) -> Vec2 {
        match self.bounds {
            Some((min, max)) => point.clamp(min, max),
            None => point,
        }
    }
}
