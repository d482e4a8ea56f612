//! Reduce final clock states into a [SimulationResult].

use serde::Serialize;

use crate::sim::clock::WeaponClock;
use crate::sim::error::SimulationError;
use crate::sim::trace::FireEvent;
use crate::sim::weapon::LoadoutEntry;

/// Relative slack for reconciling summed damage against sequential health subtraction.
pub const DAMAGE_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeaponBreakdown {
    pub name: String,
    pub level: String,
    pub shots: u64,
    pub damage: f64,
    pub reloads: u64,
    pub reload_time: f64,
}

/// Raw, unrounded outcome of one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationResult {
    pub ttk: f64,
    pub total_shots: u64,
    pub total_damage: f64,
    pub dps: f64,
    pub iterations: u64,
    pub breakdown: Vec<WeaponBreakdown>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<FireEvent>,
}

pub fn dps(total_damage: f64, elapsed: f64) -> f64 {
    if elapsed > 0.0 {
        total_damage / elapsed
    } else {
        0.0
    }
}

/// Build the report for a run that the scheduler declared finished at `elapsed`.
///
/// Fails with [SimulationError::InvariantViolation] if the accumulated damage
/// does not cover `target_health`.
pub fn aggregate(
    target_health: f64,
    elapsed: f64,
    iterations: u64,
    loadout: &[LoadoutEntry<'_>],
    clocks: &[WeaponClock],
    events: Vec<FireEvent>,
) -> Result<SimulationResult, SimulationError> {
    if loadout.len() != clocks.len() {
        return Err(SimulationError::InvariantViolation(format!(
            "{} loadout entries but {} weapon clocks",
            loadout.len(),
            clocks.len()
        )));
    }

    let breakdown: Vec<WeaponBreakdown> = loadout
        .iter()
        .zip(clocks)
        .map(|(entry, clock)| WeaponBreakdown {
            name: entry.spec.name.clone(),
            level: entry.level.to_string(),
            shots: clock.shots_fired,
            damage: clock.damage_dealt(entry.damage),
            reloads: clock.reload_cycles,
            reload_time: clock.reload_time,
        })
        .collect();

    let total_shots: u64 = breakdown.iter().map(|weapon| weapon.shots).sum();
    let total_damage: f64 = breakdown.iter().map(|weapon| weapon.damage).sum();

    let slack = DAMAGE_TOLERANCE * target_health.abs().max(1.0);
    if total_damage + slack < target_health {
        return Err(SimulationError::InvariantViolation(format!(
            "total damage {total_damage} is less than target health {target_health} at t={elapsed}"
        )));
    }

    Ok(SimulationResult {
        ttk: elapsed,
        total_shots,
        total_damage,
        dps: dps(total_damage, elapsed),
        iterations,
        breakdown,
        events,
    })
}
