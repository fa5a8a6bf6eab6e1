pub mod level;
pub mod simulation;
