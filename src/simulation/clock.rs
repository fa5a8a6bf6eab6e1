use glam::Vec2;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, warn};

use crate::config::simulation::SimulationConfig;
use crate::simulation::difficulty::{DifficultyState, RuleSet};
use crate::simulation::entity::{Entity, PhysicsCategory};
use crate::simulation::outcome::{Outcome, OutcomeKind};
use crate::simulation::steering::{AgentState, SteeringAgent, SteeringController, WorldView};
use crate::simulation::{Pose, SimEvent, SimulationError, TickFrame};
use crate::world::spawn::SpawnPlacer;
use crate::world::{Level, Obstacle, TerrainKind};

const PLAYER_ID: u32 = 0;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Timing {
    start: f64,
    last: f64,
}

/// Fixed-interval enemy admission deadline, armed on the first tick.
#[derive(Debug, Clone, Copy, PartialEq)]
struct SpawnTimer {
    interval: f64,
    next_fire: Option<f64>,
}

impl SpawnTimer {
    fn arm(&mut self, start: f64) {
        if self.next_fire.is_none() {
            self.next_fire = Some(start + self.interval);
        }
    }

    /// Number of firings due at `now`, moving the deadline past it.
    fn fire(&mut self, now: f64) -> u64 {
        let Some(next) = self.next_fire else {
            return 0;
        };
        if now < next {
            return 0;
        }
        let firings = ((now - next) / self.interval).floor() as u64 + 1;
        self.next_fire = Some(next + firings as f64 * self.interval);
        firings
    }
}

/// Everything that changes while a level runs. Owned by the clock.
#[derive(Debug)]
pub struct WorldState {
    pub level: Level,
    pub player: Entity,
    pub enemies: Vec<Entity>,
    /// Parallel to `enemies`: `agents[i]` steers `enemies[i]`.
    pub agents: Vec<SteeringAgent>,
    pub difficulty: DifficultyState,
    pub input: Vec2,
    pub tick: u64,
    pub outcome: Option<Outcome>,
    enemy_speed: f32,
    terrain_under_player: Option<TerrainKind>,
    timing: Option<Timing>,
    spawn_timer: SpawnTimer,
    placer: SpawnPlacer,
    rng: ChaCha8Rng,
    next_entity_id: u32,
    steering_max_speed: f32,
    steering_max_acceleration: f32,
    events: Vec<SimEvent>,
}

impl WorldState {
    fn new(level: Level, config: &SimulationConfig) -> Self {
        let seed = level.params.seed;
        let mut player = Entity::new(
            PLAYER_ID,
            PhysicsCategory::Player,
            level.player_spawn,
            level.params.player_size,
        );
        player.target_speed = config.terrain_speeds.sand;
        let placer = SpawnPlacer::new(
            seed.wrapping_add(2),
            level.params.placement,
            level.params.spawn_inset,
        );
        WorldState {
            player,
            enemies: Vec::new(),
            agents: Vec::new(),
            difficulty: DifficultyState::default(),
            input: Vec2::ZERO,
            tick: 0,
            outcome: None,
            enemy_speed: config.enemy_base_speed,
            terrain_under_player: None,
            timing: None,
            spawn_timer: SpawnTimer {
                interval: config.spawn_interval_secs,
                next_fire: None,
            },
            placer,
            rng: ChaCha8Rng::seed_from_u64(seed.wrapping_add(3)),
            next_entity_id: PLAYER_ID + 1,
            steering_max_speed: config.steering.max_speed,
            steering_max_acceleration: config.steering.max_acceleration,
            events: Vec::new(),
            level,
        }
    }

    pub fn frame(&self) -> TickFrame {
        TickFrame {
            tick: self.tick,
            elapsed_secs: self.difficulty.elapsed_secs,
            player: Pose::of(&self.player),
            enemies: self.enemies.iter().map(Pose::of).collect(),
            player_speed: self.player.target_speed,
            terrain: self.terrain_under_player,
            enemy_speed: self.enemy_speed,
            speed_bonus: self.difficulty.speed_bonus,
            outcome: self.outcome,
        }
    }

    fn step(
        &mut self,
        timestamp: f64,
        config: &SimulationConfig,
        rules: &RuleSet,
        steering: &SteeringController,
    ) -> Result<TickFrame, SimulationError> {
        if self.outcome.is_some() {
            return Ok(self.frame());
        }

        // Delta time; the first tick pins both start and last.
        let timing = *self.timing.get_or_insert(Timing {
            start: timestamp,
            last: timestamp,
        });
        if timestamp < timing.last {
            return Err(SimulationError::ClockRegressed {
                previous: timing.last,
                now: timestamp,
            });
        }
        let dt = (timestamp - timing.last) as f32;
        self.timing = Some(Timing {
            start: timing.start,
            last: timestamp,
        });
        self.spawn_timer.arm(timing.start);

        self.difficulty.elapsed_secs = (timestamp - timing.start).floor() as u64;
        self.difficulty.enemy_count = self.enemies.len() as u32;

        let evaluation = rules.apply(&mut self.difficulty);
        if evaluation.net_grade > 0.0 {
            self.events.push(SimEvent::SpeedBonusRaised {
                grade: evaluation.net_grade,
                bonus: self.difficulty.speed_bonus,
            });
        }
        self.enemy_speed = config.enemy_base_speed + self.difficulty.speed_bonus as f32;

        self.terrain_under_player = self
            .level
            .terrain
            .cell_at(self.player.position)
            .map(|cell| cell.kind);
        self.player.target_speed = config.terrain_speeds.speed_for(self.terrain_under_player);

        self.steer_player();
        move_entity(&mut self.player, dt, &self.level);

        self.steer_enemies(steering, dt);

        let firings = self.spawn_timer.fire(timestamp);
        if firings > 0 {
            self.admit_enemies(firings, config.population_cap);
        }

        self.detect_outcome();
        self.tick += 1;
        Ok(self.frame())
    }

    fn steer_player(&mut self) {
        let target = self.player.position + self.input;
        let offset = target - self.player.position;
        let threshold = self.player.size / 4.0;
        if offset.x.abs() > threshold || offset.y.abs() > threshold {
            let speed = self.player.target_speed;
            self.player.command(offset, speed);
        } else {
            self.player.stop();
        }
    }

    fn steer_enemies(&mut self, steering: &SteeringController, dt: f32) {
        for (agent, enemy) in self.agents.iter_mut().zip(&self.enemies) {
            agent.state.position = enemy.position;
        }
        let world = WorldView {
            target: self.player.position,
            obstacles: &self.level.obstacles,
        };
        steering.advance(&mut self.agents, &world, dt, &mut self.rng);

        for (enemy, agent) in self.enemies.iter_mut().zip(&self.agents) {
            let direction = agent.state.position - enemy.position;
            enemy.command(direction, self.enemy_speed);
            move_entity(enemy, dt, &self.level);
        }
    }

    fn admit_enemies(&mut self, firings: u64, population_cap: u32) {
        let live = self.enemies.len() as u64;
        let room = (population_cap as u64).saturating_sub(live);
        let attempts = firings.min(room);
        let skipped = firings - attempts;
        if skipped > 0 {
            debug!(live, skipped, population_cap, "Spawn timer fired at population cap");
            self.events.push(SimEvent::SpawnSkipped { firings: skipped });
        }

        let params = &self.level.params;
        let min_separation = params.player_size * 2.0;
        // Any closer and the two footprints can overlap on the diagonal.
        let contact_floor = (params.player_size + params.enemy_size) / 2.0 * std::f32::consts::SQRT_2;
        for _ in 0..attempts {
            match self.placer.place_enemy(
                self.level.bounds,
                self.player.position,
                min_separation,
                contact_floor,
            ) {
                Ok(position) => {
                    self.spawn_enemy_at(position);
                }
                Err(e) => {
                    warn!(error = %e, "Enemy spawn skipped");
                    self.events.push(SimEvent::PlacementFailed {
                        reason: e.to_string(),
                    });
                }
            }
        }
    }

    pub(crate) fn spawn_enemy_at(&mut self, position: Vec2) -> u32 {
        let id = self.next_entity_id;
        self.next_entity_id += 1;
        let size = self.level.params.enemy_size;
        self.enemies
            .push(Entity::new(id, PhysicsCategory::Enemy, position, size));
        self.agents.push(SteeringAgent {
            entity_id: id,
            state: AgentState {
                position,
                velocity: Vec2::ZERO,
                max_speed: self.steering_max_speed,
                max_acceleration: self.steering_max_acceleration,
                radius: size / 2.0,
            },
        });
        info!(id, x = position.x, y = position.y, population = self.enemies.len(), "Enemy spawned");
        self.events.push(SimEvent::EnemySpawned { id, position });
        id
    }

    fn detect_outcome(&mut self) {
        let player = self.player.footprint();
        let caught = self.enemies.iter().any(|e| {
            e.category.reports_contact_with(self.player.category) && e.footprint().overlaps(&player)
        });
        let kind = if caught {
            OutcomeKind::Caught
        } else if self
            .player
            .category
            .reports_contact_with(PhysicsCategory::Goal)
            && player.overlaps(&self.level.goal)
        {
            OutcomeKind::GoalReached
        } else {
            return;
        };

        let outcome = Outcome::new(kind, self.difficulty.elapsed_secs);
        info!(?kind, elapsed = outcome.elapsed_secs, rank = %outcome.rank, "Level finished");
        self.events.push(match kind {
            OutcomeKind::Caught => SimEvent::PlayerCaught(outcome),
            OutcomeKind::GoalReached => SimEvent::GoalReached(outcome),
        });
        self.player.stop();
        for enemy in &mut self.enemies {
            enemy.stop();
        }
        self.outcome = Some(outcome);
    }
}

/// Integrate velocity over `dt`, keeping the entity inside the level and out
/// of obstacles it was not already touching. Blocked moves slide along one axis.
fn move_entity(entity: &mut Entity, dt: f32, level: &Level) {
    if entity.velocity == Vec2::ZERO || dt == 0.0 {
        return;
    }
    let half = Vec2::splat(entity.size / 2.0);
    let from = entity.position;
    let step = entity.velocity * dt;
    let candidates = [
        from + step,
        from + Vec2::new(step.x, 0.0),
        from + Vec2::new(0.0, step.y),
    ];
    for candidate in candidates {
        let candidate = level.bounds.clamp(candidate, half);
        if !enters_obstacle(from, candidate, entity.size, &level.obstacles) {
            entity.position = candidate;
            return;
        }
    }
}

fn enters_obstacle(from: Vec2, to: Vec2, size: f32, obstacles: &[Obstacle]) -> bool {
    let before = crate::world::Footprint::square(from, size);
    let after = crate::world::Footprint::square(to, size);
    obstacles
        .iter()
        .any(|o| after.overlaps(&o.footprint) && !before.overlaps(&o.footprint))
}

/// Drives a level: owns its world state and runs one tick per frame.
#[derive(Debug)]
pub struct SimulationClock {
    config: SimulationConfig,
    rules: RuleSet,
    steering: SteeringController,
    world: Option<WorldState>,
}

impl SimulationClock {
    pub fn new(config: SimulationConfig) -> Self {
        SimulationClock {
            rules: RuleSet::from_config(&config.difficulty),
            steering: SteeringController::from_config(&config.steering),
            config,
            world: None,
        }
    }

    /// Start (or restart) a level. All previous state is dropped.
    pub fn start_level(&mut self, level: Level) {
        info!(
            level = %level.name,
            seed = level.params.seed,
            obstacles = level.obstacles.len(),
            "Level started"
        );
        for warning in &level.warnings {
            warn!(?warning, "Level started in a degraded state");
        }
        self.world = Some(WorldState::new(level, &self.config));
    }

    pub fn world(&self) -> Option<&WorldState> {
        self.world.as_ref()
    }

    /// Latest joystick vector. Read once at the start of the next tick.
    pub fn on_input_vector(&mut self, dx: f32, dy: f32) {
        if let Some(world) = self.world.as_mut() {
            world.input = Vec2::new(dx, dy);
        }
    }

    /// Advance one frame to `timestamp` (seconds, any monotonic origin).
    pub fn on_tick(&mut self, timestamp: f64) -> Result<TickFrame, SimulationError> {
        let world = self
            .world
            .as_mut()
            .ok_or(SimulationError::LevelNotStarted)?;
        world.step(timestamp, &self.config, &self.rules, &self.steering)
    }

    /// Events raised since the last drain, oldest first.
    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        match self.world.as_mut() {
            Some(world) => std::mem::take(&mut world.events),
            None => Vec::new(),
        }
    }
}
