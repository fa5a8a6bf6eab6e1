//! Blended steering for enemy agents.
//!
//! Each behavior proposes a desired velocity (or nothing, when it has no
//! opinion this tick). The controller averages the active proposals by
//! weight, then turns the result into an acceleration-limited velocity
//! change.

use glam::Vec2;
use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::config::simulation::SteeringConfig;
use crate::world::geometry::Obstacle;

/// Kinematic state of one steering agent.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentState {
    pub position: Vec2,
    pub velocity: Vec2,
    pub max_speed: f32,
    pub max_acceleration: f32,
    pub radius: f32,
}

/// Steering agent bound to one enemy entity.
#[derive(Debug, Clone, PartialEq)]
pub struct SteeringAgent {
    pub entity_id: u32,
    pub state: AgentState,
}

/// What behaviors may look at besides the agent itself.
#[derive(Debug, Clone, Copy)]
pub struct WorldView<'a> {
    pub target: Vec2,
    pub obstacles: &'a [Obstacle],
}

pub trait Behavior: std::fmt::Debug {
    fn desired_velocity(
        &self,
        agent: &AgentState,
        world: &WorldView<'_>,
        rng: &mut ChaCha8Rng,
    ) -> Option<Vec2>;
}

/// Keep moving roughly along the current heading, with random drift.
#[derive(Debug, Clone)]
pub struct Wander {
    pub jitter: f32,
}

impl Behavior for Wander {
    fn desired_velocity(
        &self,
        agent: &AgentState,
        _world: &WorldView<'_>,
        rng: &mut ChaCha8Rng,
    ) -> Option<Vec2> {
        let heading = if agent.velocity == Vec2::ZERO {
            rng.gen_range(-std::f32::consts::PI..std::f32::consts::PI)
        } else {
            agent.velocity.y.atan2(agent.velocity.x)
        };
        let drift = if self.jitter > 0.0 {
            rng.gen_range(-self.jitter..=self.jitter)
        } else {
            0.0
        };
        Some(Vec2::from_angle(heading + drift) * agent.max_speed)
    }
}

/// Head straight for the target.
#[derive(Debug, Clone)]
pub struct Seek;

impl Behavior for Seek {
    fn desired_velocity(
        &self,
        agent: &AgentState,
        world: &WorldView<'_>,
        _rng: &mut ChaCha8Rng,
    ) -> Option<Vec2> {
        let to_target = world.target - agent.position;
        (to_target != Vec2::ZERO).then(|| to_target.normalize() * agent.max_speed)
    }
}

/// Steer away from obstacles the agent is about to run into.
#[derive(Debug, Clone)]
pub struct Avoid {
    /// Prediction time for the look-ahead point.
    pub horizon: f32,
}

impl Behavior for Avoid {
    fn desired_velocity(
        &self,
        agent: &AgentState,
        world: &WorldView<'_>,
        _rng: &mut ChaCha8Rng,
    ) -> Option<Vec2> {
        let ahead = agent.position + agent.velocity * self.horizon;
        let mut away = Vec2::ZERO;
        let mut threatened = false;
        for obstacle in world.obstacles {
            let closest = obstacle.polygon.closest_point(ahead);
            let dist = closest.distance(ahead);
            if dist >= agent.radius {
                continue;
            }
            threatened = true;
            // Inside the polygon the closest point is the look-ahead itself; push out from the middle.
            let push = if dist > f32::EPSILON {
                ahead - closest
            } else {
                ahead - obstacle.polygon.centroid()
            };
            // Nearer obstacles push harder.
            away += push.normalize_or_zero() * (1.0 - dist / agent.radius);
        }
        if !threatened {
            return None;
        }
        if away == Vec2::ZERO {
            away = -agent.velocity;
        }
        Some(away.normalize_or_zero() * agent.max_speed)
    }
}

#[derive(Debug)]
pub struct WeightedBehavior {
    pub weight: f32,
    pub behavior: Box<dyn Behavior>,
}

#[derive(Debug)]
pub struct SteeringController {
    behaviors: Vec<WeightedBehavior>,
    /// Real delta time is multiplied by this before agents move, so steering
    /// settles faster than real motion would.
    pub time_scale: f32,
}

impl SteeringController {
    pub fn new(behaviors: Vec<WeightedBehavior>, time_scale: f32) -> Self {
        SteeringController {
            behaviors,
            time_scale,
        }
    }

    /// Wander, seek and avoid with the configured weights.
    pub fn from_config(config: &SteeringConfig) -> Self {
        SteeringController::new(
            vec![
                WeightedBehavior {
                    weight: config.wander_weight,
                    behavior: Box::new(Wander {
                        jitter: config.wander_jitter,
                    }),
                },
                WeightedBehavior {
                    weight: config.seek_weight,
                    behavior: Box::new(Seek),
                },
                WeightedBehavior {
                    weight: config.avoid_weight,
                    behavior: Box::new(Avoid {
                        horizon: config.avoid_horizon,
                    }),
                },
            ],
            config.time_scale,
        )
    }

    /// Weighted average of the active behaviors, capped at the agent's max speed.
    pub fn desired_velocity(
        &self,
        agent: &AgentState,
        world: &WorldView<'_>,
        rng: &mut ChaCha8Rng,
    ) -> Vec2 {
        let mut sum = Vec2::ZERO;
        let mut total_weight = 0.0;
        for wb in &self.behaviors {
            if wb.weight <= 0.0 {
                continue;
            }
            if let Some(v) = wb.behavior.desired_velocity(agent, world, rng) {
                sum += v * wb.weight;
                total_weight += wb.weight;
            }
        }
        if total_weight == 0.0 {
            return Vec2::ZERO;
        }
        (sum / total_weight).clamp_length_max(agent.max_speed)
    }

    /// Advance one agent by `dt` steering time units.
    pub fn step(&self, agent: &mut AgentState, world: &WorldView<'_>, dt: f32, rng: &mut ChaCha8Rng) {
        let desired = self.desired_velocity(agent, world, rng);
        let change = (desired - agent.velocity).clamp_length_max(agent.max_acceleration * dt);
        agent.velocity = (agent.velocity + change).clamp_length_max(agent.max_speed);
        agent.position += agent.velocity * dt;
    }

    /// Advance every agent once using the scaled real delta time.
    pub fn advance(
        &self,
        agents: &mut [SteeringAgent],
        world: &WorldView<'_>,
        real_dt: f32,
        rng: &mut ChaCha8Rng,
    ) {
        let dt = real_dt * self.time_scale;
        for agent in agents.iter_mut() {
            self.step(&mut agent.state, world, dt, rng);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::geometry::Footprint;
    use rand::SeedableRng;

    fn agent_at(position: Vec2, velocity: Vec2) -> AgentState {
        AgentState {
            position,
            velocity,
            max_speed: 50.0,
            max_acceleration: 100.0,
            radius: 32.0,
        }
    }

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(7)
    }

    #[test]
    fn seek_points_at_target() {
        let agent = agent_at(Vec2::ZERO, Vec2::ZERO);
        let world = WorldView {
            target: Vec2::new(10.0, 0.0),
            obstacles: &[],
        };
        let v = Seek.desired_velocity(&agent, &world, &mut rng()).unwrap();
        assert!((v - Vec2::new(50.0, 0.0)).length() < 1e-4);

        let on_target = WorldView {
            target: Vec2::ZERO,
            obstacles: &[],
        };
        assert!(Seek.desired_velocity(&agent, &on_target, &mut rng()).is_none());
    }

    #[test]
    fn avoid_only_reacts_near_obstacles() {
        let obstacles = vec![Obstacle::new(Footprint::square(Vec2::new(100.0, 0.0), 40.0))];
        let world = WorldView {
            target: Vec2::ZERO,
            obstacles: &obstacles,
        };
        let avoid = Avoid { horizon: 0.1 };

        let far = agent_at(Vec2::new(-500.0, 0.0), Vec2::new(50.0, 0.0));
        assert!(avoid.desired_velocity(&far, &world, &mut rng()).is_none());

        let close = agent_at(Vec2::new(60.0, 0.0), Vec2::new(50.0, 0.0));
        let v = avoid.desired_velocity(&close, &world, &mut rng()).unwrap();
        assert!(v.x < 0.0, "should steer back away from the obstacle: {:?}", v);
    }

    #[test]
    fn avoid_combines_every_nearby_obstacle() {
        // One obstacle to the right of the look-ahead point, one above it.
        let obstacles = vec![
            Obstacle::new(Footprint::square(Vec2::new(40.0, 0.0), 40.0)),
            Obstacle::new(Footprint::square(Vec2::new(0.0, 40.0), 40.0)),
        ];
        let world = WorldView {
            target: Vec2::ZERO,
            obstacles: &obstacles,
        };
        let agent = agent_at(Vec2::ZERO, Vec2::ZERO);
        let v = Avoid { horizon: 0.1 }
            .desired_velocity(&agent, &world, &mut rng())
            .unwrap();
        assert!(v.x < 0.0 && v.y < 0.0, "should back away from both: {:?}", v);
        assert!((v.x - v.y).abs() < 1e-3);
        assert!((v.length() - 50.0).abs() < 1e-3);
    }

    #[test]
    fn wander_stays_near_heading() {
        let wander = Wander { jitter: 0.5 };
        let agent = agent_at(Vec2::ZERO, Vec2::new(10.0, 0.0));
        let world = WorldView {
            target: Vec2::ZERO,
            obstacles: &[],
        };
        let mut rng = rng();
        for _ in 0..100 {
            let v = wander.desired_velocity(&agent, &world, &mut rng).unwrap();
            assert!(v.y.atan2(v.x).abs() <= 0.5 + 1e-5);
            assert!((v.length() - 50.0).abs() < 1e-3);
        }
    }

    #[test]
    fn velocity_never_exceeds_max_speed() {
        let controller = SteeringController::from_config(&SteeringConfig::default());
        let obstacles: Vec<Obstacle> = (0..5)
            .map(|i| Obstacle::new(Footprint::square(Vec2::new(i as f32 * 150.0, 80.0), 96.0)))
            .collect();
        let mut rng = ChaCha8Rng::seed_from_u64(99);

        for i in 0..200 {
            let position = Vec2::new(rng.gen_range(-100.0..700.0), rng.gen_range(-100.0..300.0));
            let velocity = Vec2::new(rng.gen_range(-200.0..200.0), rng.gen_range(-200.0..200.0));
            let world = WorldView {
                target: Vec2::new(rng.gen_range(0.0..600.0), rng.gen_range(0.0..200.0)),
                obstacles: &obstacles,
            };
            let mut agent = agent_at(position, velocity);

            let desired = controller.desired_velocity(&agent, &world, &mut rng);
            assert!(desired.length() <= 50.0 + 1e-3, "case {}: desired {}", i, desired.length());

            for _ in 0..10 {
                controller.step(&mut agent, &world, 1.0 / 60.0 * controller.time_scale, &mut rng);
                assert!(
                    agent.velocity.length() <= 50.0 + 1e-3,
                    "case {}: speed {}",
                    i,
                    agent.velocity.length()
                );
            }
        }
    }

    #[test]
    fn acceleration_is_limited_per_step() {
        let controller = SteeringController::new(
            vec![WeightedBehavior {
                weight: 1.0,
                behavior: Box::new(Seek),
            }],
            5.0,
        );
        let mut agent = agent_at(Vec2::ZERO, Vec2::ZERO);
        let world = WorldView {
            target: Vec2::new(1000.0, 0.0),
            obstacles: &[],
        };
        controller.step(&mut agent, &world, 0.1, &mut rng());
        assert!((agent.velocity.length() - 10.0).abs() < 1e-4);
    }

    #[test]
    fn advance_uses_scaled_delta_time() {
        let controller = SteeringController::new(
            vec![WeightedBehavior {
                weight: 1.0,
                behavior: Box::new(Seek),
            }],
            5.0,
        );
        let mut agents = vec![SteeringAgent {
            entity_id: 1,
            state: AgentState {
                max_acceleration: 1.0e6,
                ..agent_at(Vec2::ZERO, Vec2::ZERO)
            },
        }];
        let world = WorldView {
            target: Vec2::new(1000.0, 0.0),
            obstacles: &[],
        };
        controller.advance(&mut agents, &world, 0.1, &mut rng());
        // 50 units/s for 0.1 s scaled by 5.
        assert!((agents[0].state.position.x - 25.0).abs() < 1e-3);
    }

    #[test]
    fn no_active_behavior_yields_zero() {
        let controller = SteeringController::new(Vec::new(), 5.0);
        let agent = agent_at(Vec2::ZERO, Vec2::new(3.0, 0.0));
        let world = WorldView {
            target: Vec2::ZERO,
            obstacles: &[],
        };
        assert_eq!(controller.desired_velocity(&agent, &world, &mut rng()), Vec2::ZERO);
    }
}
