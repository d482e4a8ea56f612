//! Read-only weapon catalog: the resolved numeric stats the simulator consumes.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::data::validate::{validate_spec, ValidationReport, ValidationSeverity};
use crate::sim::{LoadoutEntry, SimulationError, WeaponSpec};

/// One `{name, level}` pick from a request body or the command line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeaponSelection {
    pub name: String,
    pub level: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogFormat {
    Csv,
    Json,
    Yaml,
    Inline,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogSource {
    pub path: String,
    pub format: CatalogFormat,
    pub loaded_at: String,
}

impl CatalogSource {
    pub fn new(path: impl Into<String>, format: CatalogFormat) -> Self {
        Self {
            path: path.into(),
            format,
            loaded_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn inline() -> Self {
        Self::new("<inline>", CatalogFormat::Inline)
    }
}

/// Lowercase, treat underscores as spaces, collapse whitespace.
fn normalize_lookup(s: &str) -> String {
    s.to_lowercase()
        .chars()
        .map(|c| if c.is_whitespace() || c == '_' { ' ' } else { c })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}

#[derive(Debug, Clone)]
pub struct WeaponCatalog {
    weapons: Vec<WeaponSpec>,
    by_name: HashMap<String, usize>,
    by_normalized: HashMap<String, Vec<usize>>,
    source: CatalogSource,
    report: ValidationReport,
}

impl WeaponCatalog {
    /// Build a catalog, dropping specs that fail validation. A later spec with an
    /// already-seen name replaces the earlier one in place.
    pub fn from_specs(specs: Vec<WeaponSpec>, source: CatalogSource) -> Self {
        Self::from_specs_with_report(specs, source, ValidationReport::default())
    }

    pub(crate) fn from_specs_with_report(
        specs: Vec<WeaponSpec>,
        source: CatalogSource,
        mut report: ValidationReport,
    ) -> Self {
        let mut weapons: Vec<WeaponSpec> = Vec::with_capacity(specs.len());
        let mut by_name: HashMap<String, usize> = HashMap::with_capacity(specs.len());

        for spec in specs {
            let context = if spec.name.trim().is_empty() {
                "<unnamed>".to_string()
            } else {
                spec.name.clone()
            };
            let issues = validate_spec(&spec, &context);
            let rejected = issues.has_errors();
            report.extend(issues);
            if rejected {
                continue;
            }

            match by_name.get(&spec.name) {
                Some(&index) => {
                    report.push(
                        ValidationSeverity::Warning,
                        context,
                        "duplicate weapon name; later entry wins",
                    );
                    weapons[index] = spec;
                }
                None => {
                    by_name.insert(spec.name.clone(), weapons.len());
                    weapons.push(spec);
                }
            }
        }

        let mut by_normalized: HashMap<String, Vec<usize>> = HashMap::new();
        for (index, spec) in weapons.iter().enumerate() {
            by_normalized
                .entry(normalize_lookup(&spec.name))
                .or_default()
                .push(index);
        }

        Self {
            weapons,
            by_name,
            by_normalized,
            source,
            report,
        }
    }

    pub fn len(&self) -> usize {
        self.weapons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weapons.is_empty()
    }

    pub fn weapons(&self) -> &[WeaponSpec] {
        &self.weapons
    }

    pub fn source(&self) -> &CatalogSource {
        &self.source
    }

    /// Diagnostics gathered while loading; errors mark weapons that were dropped.
    pub fn report(&self) -> &ValidationReport {
        &self.report
    }

    /// Exact name first, then a normalized match when it is unambiguous.
    pub fn get(&self, name: &str) -> Option<&WeaponSpec> {
        if let Some(&index) = self.by_name.get(name) {
            return self.weapons.get(index);
        }
        match self.by_normalized.get(&normalize_lookup(name)).map(Vec::as_slice) {
            Some([index]) => self.weapons.get(*index),
            _ => None,
        }
    }

    /// Pin `name` to `level`. The level key matches exactly, else case-insensitively.
    pub fn resolve(&self, name: &str, level: &str) -> Result<LoadoutEntry<'_>, SimulationError> {
        let spec = self
            .get(name)
            .ok_or_else(|| SimulationError::UnknownWeapon(name.to_string()))?;

        let level_entry = spec
            .damage_levels
            .iter()
            .find(|entry| entry.level == level)
            .or_else(|| {
                spec.damage_levels
                    .iter()
                    .find(|entry| entry.level.eq_ignore_ascii_case(level.trim()))
            })
            .ok_or_else(|| SimulationError::UnknownLevel {
                weapon: spec.name.clone(),
                level: level.to_string(),
            })?;

        Ok(LoadoutEntry {
            spec,
            level: &level_entry.level,
            damage: level_entry.damage,
        })
    }

    /// Resolve every selection before any simulation work starts; the first failure wins.
    pub fn resolve_loadout(
        &self,
        selections: &[WeaponSelection],
    ) -> Result<Vec<LoadoutEntry<'_>>, SimulationError> {
        selections
            .iter()
            .map(|selection| self.resolve(&selection.name, &selection.level))
            .collect()
    }

    /// Name → spec, sorted by name, for the catalog listing endpoint.
    pub fn to_map(&self) -> BTreeMap<&str, &WeaponSpec> {
        self.weapons
            .iter()
            .map(|spec| (spec.name.as_str(), spec))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{DamageLevel, WeaponMeta};

    fn spec(name: &str, magazine_size: u32) -> WeaponSpec {
        WeaponSpec {
            name: name.to_string(),
            damage_levels: vec![
                DamageLevel {
                    level: "Lv1".to_string(),
                    damage: 100.0,
                },
                DamageLevel {
                    level: "MK2_Lv1".to_string(),
                    damage: 180.0,
                },
            ],
            shot_interval: 1.0,
            shot_subinterval: 0.0,
            magazine_size,
            particles_per_shot: 1,
            reload_duration: 2.0,
            reloads_while_firing: false,
            meta: WeaponMeta::default(),
        }
    }

    #[test]
    fn normalize_lookup_collapses_case_and_separators() {
        assert_eq!(normalize_lookup("  Ultimate   Orkan "), "ultimate_orkan");
        assert_eq!(normalize_lookup("ultimate_orkan"), "ultimate_orkan");
    }

    #[test]
    fn resolve_uses_exact_then_normalized_name() {
        let catalog = WeaponCatalog::from_specs(
            vec![spec("Ultimate Orkan", 4)],
            CatalogSource::inline(),
        );

        let exact = catalog.resolve("Ultimate Orkan", "Lv1").expect("exact");
        assert_eq!(exact.damage, 100.0);
        let loose = catalog.resolve("ultimate_orkan", "mk2_lv1").expect("normalized");
        assert_eq!(loose.damage, 180.0);
        assert_eq!(loose.level, "MK2_Lv1");
    }

    #[test]
    fn resolve_reports_unknown_weapon_and_level() {
        let catalog = WeaponCatalog::from_specs(vec![spec("Orkan", 4)], CatalogSource::inline());

        assert_eq!(
            catalog.resolve("Punisher", "Lv1").unwrap_err(),
            SimulationError::UnknownWeapon("Punisher".to_string())
        );
        assert_eq!(
            catalog.resolve("Orkan", "MK3_Lv1").unwrap_err(),
            SimulationError::UnknownLevel {
                weapon: "Orkan".to_string(),
                level: "MK3_Lv1".to_string()
            }
        );
    }

    #[test]
    fn ambiguous_normalized_name_does_not_resolve() {
        let catalog = WeaponCatalog::from_specs(
            vec![spec("Storm Gun", 4), spec("storm_gun", 4)],
            CatalogSource::inline(),
        );

        assert!(catalog.get("STORM GUN").is_none());
        assert!(catalog.get("Storm Gun").is_some());
    }

    #[test]
    fn invalid_specs_are_dropped_and_duplicates_replaced() {
        let mut replacement = spec("Orkan", 8);
        replacement.reload_duration = 9.0;
        let catalog = WeaponCatalog::from_specs(
            vec![spec("Orkan", 4), spec("Broken", 0), replacement],
            CatalogSource::inline(),
        );

        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get("Orkan").map(|s| s.magazine_size), Some(8));
        assert!(catalog.report().has_errors());
        assert_eq!(catalog.report().diagnostics.len(), 2);
    }

    #[test]
    fn resolve_loadout_fails_on_first_unknown_entry() {
        let catalog = WeaponCatalog::from_specs(vec![spec("Orkan", 4)], CatalogSource::inline());
        let selections = vec![
            WeaponSelection {
                name: "Orkan".to_string(),
                level: "Lv1".to_string(),
            },
            WeaponSelection {
                name: "Tulumbas".to_string(),
                level: "Lv1".to_string(),
            },
        ];

        assert!(matches!(
            catalog.resolve_loadout(&selections),
            Err(SimulationError::UnknownWeapon(name)) if name == "Tulumbas"
        ));
    }
}
