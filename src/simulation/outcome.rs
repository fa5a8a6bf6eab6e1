use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutcomeKind {
    GoalReached,
    Caught,
}

/// How a finished run is ranked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rank {
    SpecialForce,
    SkilledSurvivor,
    Novice,
    Fallen,
}

impl Rank {
    pub fn for_run(kind: OutcomeKind, elapsed_secs: u64) -> Rank {
        match kind {
            OutcomeKind::Caught => Rank::Fallen,
            OutcomeKind::GoalReached if elapsed_secs < 15 => Rank::SpecialForce,
            OutcomeKind::GoalReached if elapsed_secs < 30 => Rank::SkilledSurvivor,
            OutcomeKind::GoalReached => Rank::Novice,
        }
    }
}

impl std::fmt::Display for Rank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Rank::SpecialForce => "You are a special force or something",
            Rank::SkilledSurvivor => "You are a skilled survivor",
            Rank::Novice => "You are just a novice",
            Rank::Fallen => "You died",
        };
        f.write_str(text)
    }
}

/// Terminal result of a level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    pub kind: OutcomeKind,
    pub elapsed_secs: u64,
    pub rank: Rank,
}

impl Outcome {
    pub fn new(kind: OutcomeKind, elapsed_secs: u64) -> Self {
        Outcome {
            kind,
            elapsed_secs,
            rank: Rank::for_run(kind, elapsed_secs),
        }
    }

    pub fn cleared(&self) -> bool {
        self.kind == OutcomeKind::GoalReached
    }
}
