//! Per-weapon firing/reload state machine.

use crate::sim::weapon::WeaponSpec;

/// What a fire event did to the weapon's timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FireOutcome {
    /// Rounds remain; the next cycle starts after the cycle duration.
    Cycled,
    /// The magazine emptied; the next event waits on the reload delay.
    Reloaded,
}

/// Mutable runtime state of one loadout entry for one simulation run.
#[derive(Debug, Clone, PartialEq)]
pub struct WeaponClock {
    pub ammo: u32,
    pub next_event_time: f64,
    pub shots_fired: u64,
    /// Reloads that finished, i.e. the weapon fired again after them.
    pub reload_cycles: u64,
    pub reload_time: f64,
    /// The magazine is empty and a reload is in progress.
    pub reload_pending: bool,
}

impl WeaponClock {
    /// Full magazine, first event at t=0.
    pub fn new(spec: &WeaponSpec) -> Self {
        Self {
            ammo: spec.magazine_size.max(1),
            next_event_time: 0.0,
            shots_fired: 0,
            reload_cycles: 0,
            reload_time: 0.0,
            reload_pending: false,
        }
    }

    /// Consume one round fired at `now` and schedule the weapon's next event.
    ///
    /// One call is one damage application, whatever `particles_per_shot` is;
    /// particles only stretch the cycle. A magazine that empties starts a
    /// reload: the next event waits `reload_duration` (or
    /// `reload_duration / magazine` for weapons that reload while firing).
    /// The reload is booked, with the full `reload_duration`, when the weapon
    /// fires again, so a reload still running at the kill is not counted.
    pub fn advance_after_fire(&mut self, spec: &WeaponSpec, now: f64) -> FireOutcome {
        if self.reload_pending {
            self.reload_pending = false;
            self.reload_cycles += 1;
            self.reload_time += spec.reload_duration;
            self.ammo = spec.magazine_size.max(1);
        }

        self.ammo = self.ammo.saturating_sub(1);
        self.shots_fired += 1;

        if self.ammo > 0 {
            self.next_event_time = now + spec.cycle_duration();
            return FireOutcome::Cycled;
        }

        self.reload_pending = true;
        self.next_event_time = now + spec.reload_delay();
        FireOutcome::Reloaded
    }

    pub fn damage_dealt(&self, damage_per_shot: f64) -> f64 {
        self.shots_fired as f64 * damage_per_shot
    }
}
