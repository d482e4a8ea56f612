use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    #[error("Weapon {0} not found")]
    UnknownWeapon(String),

    #[error("Level {level} not found for {weapon}")]
    UnknownLevel { weapon: String, level: String },

    #[error("Loadout must contain at least one weapon")]
    EmptyLoadout,

    #[error("Target health must be a positive number, got {0}")]
    InvalidTargetHealth(f64),

    #[error("Loadout cannot kill the target: {remaining_health:.2} health left after {iterations} iterations")]
    NoProgressPossible {
        iterations: u64,
        remaining_health: f64,
    },

    #[error("Simulation invariant violated: {0}")]
    InvariantViolation(String),
}

impl SimulationError {
    /// `true` for bugs in the simulator itself, `false` for problems with the caller's input.
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::InvariantViolation(_))
    }
}
