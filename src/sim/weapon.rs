//! Weapon statistics consumed by the simulator.
//!
//! A [WeaponSpec] is immutable catalog data; a [LoadoutEntry] pins one spec to
//! the damage level chosen for a single run.

use serde::{Deserialize, Serialize};

/// One row of a weapon's damage table, e.g. `Lv7 -> 1530.0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DamageLevel {
    pub level: String,
    pub damage: f64,
}

/// Descriptive fields carried through from the catalog. Never read by the simulation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeaponMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slot: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aoe: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<String>,
}

/// Magazine size for weapons that never run dry.
pub const UNLIMITED_MAGAZINE: u32 = u32::MAX;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeaponSpec {
    pub name: String,
    /// Ordered as the catalog lists them (base levels, then MK2, then MK3).
    pub damage_levels: Vec<DamageLevel>,
    /// Seconds between independent firing cycles.
    #[serde(default)]
    pub shot_interval: f64,
    /// Seconds between particles inside one burst.
    #[serde(default)]
    pub shot_subinterval: f64,
    #[serde(default = "one")]
    pub magazine_size: u32,
    #[serde(default = "one")]
    pub particles_per_shot: u32,
    #[serde(default)]
    pub reload_duration: f64,
    #[serde(default)]
    pub reloads_while_firing: bool,
    #[serde(default, skip_serializing_if = "is_default_meta")]
    pub meta: WeaponMeta,
}

fn one() -> u32 {
    1
}

fn is_default_meta(meta: &WeaponMeta) -> bool {
    *meta == WeaponMeta::default()
}

impl WeaponSpec {
    pub fn damage_at(&self, level: &str) -> Option<f64> {
        self.damage_levels
            .iter()
            .find(|entry| entry.level == level)
            .map(|entry| entry.damage)
    }

    pub fn level_keys(&self) -> impl Iterator<Item = &str> {
        self.damage_levels.iter().map(|entry| entry.level.as_str())
    }

    /// Time from one cycle start to the next while the magazine still has rounds.
    pub fn cycle_duration(&self) -> f64 {
        let extra_particles = self.particles_per_shot.saturating_sub(1) as f64;
        self.shot_interval + extra_particles * self.shot_subinterval
    }

    /// Delay after the last round before the weapon fires again.
    pub fn reload_delay(&self) -> f64 {
        if self.reloads_while_firing {
            self.reload_duration / self.magazine_size.max(1) as f64
        } else {
            self.reload_duration
        }
    }
}

/// A weapon pinned to one damage level for a single simulation run.
#[derive(Debug, Clone, Copy)]
pub struct LoadoutEntry<'a> {
    pub spec: &'a WeaponSpec,
    pub level: &'a str,
    pub damage: f64,
}

impl<'a> LoadoutEntry<'a> {
    /// Pins `spec` to `level`. Returns `None` when the level is not in the damage table.
    pub fn new(spec: &'a WeaponSpec, level: &'a str) -> Option<Self> {
        let damage = spec.damage_at(level)?;
        Some(Self {
            spec,
            level,
            damage,
        })
    }
}
