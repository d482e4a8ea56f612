//! Time-to-kill simulation core. Pure and synchronous: no I/O, no logging.

pub mod aggregate;
pub mod clock;
pub mod error;
pub mod scheduler;
pub mod trace;
pub mod weapon;

pub use aggregate::{aggregate, dps, SimulationResult, WeaponBreakdown, DAMAGE_TOLERANCE};
pub use clock::{FireOutcome, WeaponClock};
pub use error::SimulationError;
pub use scheduler::{compute_ttk, compute_ttk_with_config, SimulationConfig, DEFAULT_MAX_ITERATIONS};
pub use trace::{FireEvent, TraceCollector, TraceMode};
pub use weapon::{DamageLevel, LoadoutEntry, WeaponMeta, WeaponSpec, UNLIMITED_MAGAZINE};
