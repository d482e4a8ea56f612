//! Discrete-event scheduler: jumps straight to the next fire time instead of ticking.

use crate::sim::aggregate::{aggregate, SimulationResult};
use crate::sim::clock::{FireOutcome, WeaponClock};
use crate::sim::error::SimulationError;
use crate::sim::trace::{FireEvent, TraceCollector, TraceMode};
use crate::sim::weapon::LoadoutEntry;

pub const DEFAULT_MAX_ITERATIONS: u64 = 1_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulationConfig {
    /// Upper bound on scheduler iterations; one iteration handles one distinct timestamp.
    pub max_iterations: u64,
    pub trace_mode: TraceMode,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            trace_mode: TraceMode::Off,
        }
    }
}

/// Time for `loadout` to bring `target_health` to zero, with the default configuration.
pub fn compute_ttk(
    target_health: f64,
    loadout: &[LoadoutEntry<'_>],
) -> Result<SimulationResult, SimulationError> {
    compute_ttk_with_config(target_health, loadout, &SimulationConfig::default())
}

pub fn compute_ttk_with_config(
    target_health: f64,
    loadout: &[LoadoutEntry<'_>],
    config: &SimulationConfig,
) -> Result<SimulationResult, SimulationError> {
    if !target_health.is_finite() || target_health <= 0.0 {
        return Err(SimulationError::InvalidTargetHealth(target_health));
    }
    if loadout.is_empty() {
        return Err(SimulationError::EmptyLoadout);
    }
    if !loadout.iter().any(|entry| entry.damage > 0.0) {
        return Err(SimulationError::NoProgressPossible {
            iterations: 0,
            remaining_health: target_health,
        });
    }

    let mut scheduler = Scheduler::new(target_health, loadout, config.trace_mode);
    let elapsed = scheduler.run(config.max_iterations)?;
    let Scheduler {
        clocks,
        trace,
        iterations,
        ..
    } = scheduler;

    aggregate(
        target_health,
        elapsed,
        iterations,
        loadout,
        &clocks,
        trace.into_events(),
    )
}

/// Owns every [WeaponClock] of one run. Clocks are indexed like the loadout.
struct Scheduler<'l, 'a> {
    loadout: &'l [LoadoutEntry<'a>],
    clocks: Vec<WeaponClock>,
    health: f64,
    now: f64,
    iterations: u64,
    trace: TraceCollector,
}

impl<'l, 'a> Scheduler<'l, 'a> {
    fn new(target_health: f64, loadout: &'l [LoadoutEntry<'a>], trace_mode: TraceMode) -> Self {
        Self {
            loadout,
            clocks: loadout
                .iter()
                .map(|entry| WeaponClock::new(entry.spec))
                .collect(),
            health: target_health,
            now: 0.0,
            iterations: 0,
            trace: TraceCollector::new(trace_mode == TraceMode::Events),
        }
    }

    /// Runs until the target dies and returns the kill time.
    fn run(&mut self, max_iterations: u64) -> Result<f64, SimulationError> {
        while self.iterations < max_iterations {
            self.iterations += 1;

            let next = self.next_event_time().ok_or_else(|| {
                SimulationError::InvariantViolation(format!(
                    "scheduler stalled at t={} with no finite next event",
                    self.now
                ))
            })?;
            if next < self.now {
                return Err(SimulationError::InvariantViolation(format!(
                    "next event at t={next} precedes current time t={}",
                    self.now
                )));
            }
            self.now = next;

            self.fire_due_weapons();

            if self.health <= 0.0 {
                return Ok(self.now);
            }
        }

        Err(SimulationError::NoProgressPossible {
            iterations: self.iterations,
            remaining_health: self.health,
        })
    }

    fn next_event_time(&self) -> Option<f64> {
        self.clocks
            .iter()
            .map(|clock| clock.next_event_time)
            .filter(|time| time.is_finite())
            .min_by(f64::total_cmp)
    }

    /// Every weapon due at `now` fires, including ties. Damage is additive, so tie order
    /// cannot change totals.
    fn fire_due_weapons(&mut self) {
        let now = self.now;
        let loadout = self.loadout;
        for (entry, clock) in loadout.iter().zip(self.clocks.iter_mut()) {
            if clock.next_event_time > now {
                continue;
            }
            self.health -= entry.damage;
            let outcome = clock.advance_after_fire(entry.spec, now);

            let health_after = self.health;
            let ammo_after = clock.ammo;
            self.trace.record(|| FireEvent {
                time: now,
                weapon: entry.spec.name.clone(),
                damage: entry.damage,
                health_after,
                ammo_after,
                reloaded: outcome == FireOutcome::Reloaded,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::weapon::{DamageLevel, WeaponMeta, WeaponSpec};

    fn periodic(damage: f64, interval: f64, magazine_size: u32) -> WeaponSpec {
        WeaponSpec {
            name: "Periodic".to_string(),
            damage_levels: vec![DamageLevel {
                level: "Lv1".to_string(),
                damage,
            }],
            shot_interval: interval,
            shot_subinterval: 0.0,
            magazine_size,
            particles_per_shot: 1,
            reload_duration: 0.0,
            reloads_while_firing: false,
            meta: WeaponMeta::default(),
        }
    }

    #[test]
    fn one_iteration_per_distinct_timestamp() {
        let spec = periodic(10.0, 1.0, 100);
        let loadout = [LoadoutEntry::new(&spec, "Lv1").expect("level")];

        let result = compute_ttk(45.0, &loadout).expect("kills");

        assert_eq!(result.total_shots, 5);
        assert_eq!(result.iterations, 5);
        assert!((result.ttk - 4.0).abs() < 1e-12);
    }

    #[test]
    fn iteration_ceiling_is_configurable() {
        let spec = periodic(1.0, 1.0, 100);
        let loadout = [LoadoutEntry::new(&spec, "Lv1").expect("level")];
        let config = SimulationConfig {
            max_iterations: 3,
            ..SimulationConfig::default()
        };

        let err = compute_ttk_with_config(10.0, &loadout, &config).unwrap_err();

        assert_eq!(
            err,
            SimulationError::NoProgressPossible {
                iterations: 3,
                remaining_health: 7.0
            }
        );
    }

    #[test]
    fn zero_ceiling_fails_without_firing() {
        let spec = periodic(50.0, 1.0, 1);
        let loadout = [LoadoutEntry::new(&spec, "Lv1").expect("level")];
        let config = SimulationConfig {
            max_iterations: 0,
            ..SimulationConfig::default()
        };

        assert!(matches!(
            compute_ttk_with_config(10.0, &loadout, &config),
            Err(SimulationError::NoProgressPossible { iterations: 0, .. })
        ));
    }

    #[test]
    fn rejects_bad_target_health_and_empty_loadout() {
        let spec = periodic(10.0, 1.0, 1);
        let loadout = [LoadoutEntry::new(&spec, "Lv1").expect("level")];

        assert_eq!(
            compute_ttk(0.0, &loadout).unwrap_err(),
            SimulationError::InvalidTargetHealth(0.0)
        );
        assert!(matches!(
            compute_ttk(f64::NAN, &loadout),
            Err(SimulationError::InvalidTargetHealth(_))
        ));
        assert_eq!(
            compute_ttk(10.0, &[]).unwrap_err(),
            SimulationError::EmptyLoadout
        );
    }

    #[test]
    fn trace_records_each_fire_event_in_order() {
        let spec = periodic(10.0, 0.5, 2);
        let loadout = [LoadoutEntry::new(&spec, "Lv1").expect("level")];
        let config = SimulationConfig {
            trace_mode: TraceMode::Events,
            ..SimulationConfig::default()
        };

        let result = compute_ttk_with_config(30.0, &loadout, &config).expect("kills");

        let times: Vec<f64> = result.events.iter().map(|e| e.time).collect();
        assert_eq!(times, vec![0.0, 0.5, 0.5]);
        assert_eq!(
            result.events.iter().map(|e| e.reloaded).collect::<Vec<_>>(),
            vec![false, true, false]
        );
        assert!((result.events[2].health_after - 0.0).abs() < 1e-12);
    }
}
