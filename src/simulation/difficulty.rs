//! Forward-chaining difficulty rules.
//!
//! Every tick the fact grades are reset, the rules run in order against a
//! snapshot of the difficulty state, and the net grade of
//! `Fact::EnemySpeedBonus` is added to the running speed bonus. The bonus is
//! never re-derived from zero, so it keeps growing for as long as the level
//! runs.

use serde::Serialize;
use tracing::{debug, info};

use crate::config::simulation::DifficultyConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Fact {
    EnemySpeedBonus,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum Condition {
    /// Elapsed seconds are non-zero and a multiple of the interval.
    ElapsedMultipleOf(u64),
    EnemyCountAbove(u32),
}

impl Condition {
    fn holds(&self, state: &DifficultyState) -> bool {
        match *self {
            Condition::ElapsedMultipleOf(interval) => {
                state.elapsed_secs != 0 && state.elapsed_secs % interval == 0
            }
            Condition::EnemyCountAbove(n) => state.enemy_count > n,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum Action {
    Assert(f64),
    Retract(f64),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rule {
    pub name: &'static str,
    pub condition: Condition,
    pub fact: Fact,
    pub action: Action,
}

/// Per-level difficulty bookkeeping.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DifficultyState {
    pub elapsed_secs: u64,
    pub enemy_count: u32,
    pub speed_bonus: f64,
}

/// Grades of every fact for the current evaluation, each within [0, 1].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct FactGrades {
    enemy_speed_bonus: f64,
}

impl FactGrades {
    fn grade_mut(&mut self, fact: Fact) -> &mut f64 {
        match fact {
            Fact::EnemySpeedBonus => &mut self.enemy_speed_bonus,
        }
    }

    fn apply(&mut self, fact: Fact, action: Action) {
        let grade = self.grade_mut(fact);
        *grade = match action {
            Action::Assert(g) => (*grade + g).min(1.0),
            Action::Retract(g) => (*grade - g).max(0.0),
        };
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub net_grade: f64,
    pub fired: Vec<&'static str>,
}

#[derive(Debug, Clone)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    pub fn new(rules: Vec<Rule>) -> Self {
        RuleSet { rules }
    }

    /// The speed bonus rules, thresholds taken from config.
    pub fn from_config(config: &DifficultyConfig) -> Self {
        RuleSet::new(vec![
            Rule {
                name: "interval-bonus",
                condition: Condition::ElapsedMultipleOf(config.bonus_interval_secs),
                fact: Fact::EnemySpeedBonus,
                action: Action::Assert(config.bonus_grade),
            },
            Rule {
                name: "crowd-dampening",
                condition: Condition::EnemyCountAbove(config.crowd_threshold),
                fact: Fact::EnemySpeedBonus,
                action: Action::Retract(config.crowd_grade),
            },
            Rule {
                name: "horde-dampening",
                condition: Condition::EnemyCountAbove(config.horde_threshold),
                fact: Fact::EnemySpeedBonus,
                action: Action::Retract(config.horde_grade),
            },
        ])
    }

    /// Run every rule against `state` from zeroed grades.
    pub fn evaluate(&self, state: &DifficultyState) -> Evaluation {
        let mut grades = FactGrades::default();
        let mut fired = Vec::new();
        for rule in &self.rules {
            if rule.condition.holds(state) {
                grades.apply(rule.fact, rule.action);
                fired.push(rule.name);
            }
        }
        Evaluation {
            net_grade: grades.enemy_speed_bonus,
            fired,
        }
    }

    /// Evaluate and add the net grade to the running speed bonus.
    pub fn apply(&self, state: &mut DifficultyState) -> Evaluation {
        let evaluation = self.evaluate(state);
        if evaluation.net_grade > 0.0 {
            state.speed_bonus += evaluation.net_grade;
            info!(
                elapsed = state.elapsed_secs,
                enemies = state.enemy_count,
                grade = evaluation.net_grade,
                bonus = state.speed_bonus,
                "Enemy speed bonus raised"
            );
        } else if !evaluation.fired.is_empty() {
            debug!(fired = ?evaluation.fired, "Difficulty rules fired without net grade");
        }
        evaluation
    }
}
