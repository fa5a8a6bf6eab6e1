use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::world::geometry::Footprint;

/// Contact filtering category, as a bit in a collision mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PhysicsCategory {
    Player,
    Enemy,
    Obstacle,
    Goal,
}

impl PhysicsCategory {
    pub fn bit(self) -> u32 {
        match self {
            PhysicsCategory::Player => 1 << 0,
            PhysicsCategory::Enemy => 1 << 1,
            PhysicsCategory::Obstacle => 1 << 2,
            PhysicsCategory::Goal => 1 << 3,
        }
    }

    /// Categories whose contact with this one is reported as an event.
    pub fn contact_mask(self) -> u32 {
        match self {
            PhysicsCategory::Player => PhysicsCategory::Enemy.bit() | PhysicsCategory::Goal.bit(),
            PhysicsCategory::Enemy => PhysicsCategory::Player.bit(),
            PhysicsCategory::Obstacle | PhysicsCategory::Goal => 0,
        }
    }

    pub fn reports_contact_with(self, other: PhysicsCategory) -> bool {
        self.contact_mask() & other.bit() != 0
    }
}

/// A moving body: the player or one enemy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: u32,
    pub category: PhysicsCategory,
    pub position: Vec2,
    /// Facing angle in radians, counter-clockwise from +x.
    pub heading: f32,
    pub velocity: Vec2,
    /// Speed the entity moves at when it is moving.
    pub target_speed: f32,
    pub size: f32,
}

impl Entity {
    pub fn new(id: u32, category: PhysicsCategory, position: Vec2, size: f32) -> Self {
        Entity {
            id,
            category,
            position,
            heading: 0.0,
            velocity: Vec2::ZERO,
            target_speed: 0.0,
            size,
        }
    }

    pub fn speed(&self) -> f32 {
        self.velocity.length()
    }

    pub fn footprint(&self) -> Footprint {
        Footprint::square(self.position, self.size)
    }

    /// Point the entity along `direction` and move at `speed`. A zero direction stops it.
    pub fn command(&mut self, direction: Vec2, speed: f32) {
        let dir = direction.normalize_or_zero();
        if dir != Vec2::ZERO {
            self.heading = dir.y.atan2(dir.x);
        }
        self.velocity = dir * speed;
    }

    pub fn stop(&mut self) {
        self.velocity = Vec2::ZERO;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contact_mask_is_symmetric_for_player_and_enemy() {
        assert!(PhysicsCategory::Player.reports_contact_with(PhysicsCategory::Enemy));
        assert!(PhysicsCategory::Enemy.reports_contact_with(PhysicsCategory::Player));
        assert!(PhysicsCategory::Player.reports_contact_with(PhysicsCategory::Goal));
        assert!(!PhysicsCategory::Enemy.reports_contact_with(PhysicsCategory::Goal));
        assert!(!PhysicsCategory::Enemy.reports_contact_with(PhysicsCategory::Enemy));
    }

    #[test]
    fn command_sets_heading_and_speed() {
        let mut e = Entity::new(1, PhysicsCategory::Enemy, Vec2::ZERO, 64.0);
        e.command(Vec2::new(0.0, 3.0), 40.0);
        assert!((e.heading - std::f32::consts::FRAC_PI_2).abs() < 1e-6);
        assert!((e.speed() - 40.0).abs() < 1e-4);

        e.command(Vec2::ZERO, 40.0);
        assert_eq!(e.velocity, Vec2::ZERO);
        assert!((e.heading - std::f32::consts::FRAC_PI_2).abs() < 1e-6);
    }
}
