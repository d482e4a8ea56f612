use std::fmt;

use serde::Serialize;

use crate::sim::WeaponSpec;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationSeverity {
    Error,
    Warning,
}

impl ValidationSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
        }
    }
}

impl fmt::Display for ValidationSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationDiagnostic {
    pub severity: ValidationSeverity,
    pub context: String,
    pub message: String,
}

impl fmt::Display for ValidationDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.context, self.message)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub diagnostics: Vec<ValidationDiagnostic>,
}

impl ValidationReport {
    pub fn push(
        &mut self,
        severity: ValidationSeverity,
        context: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.diagnostics.push(ValidationDiagnostic {
            severity,
            context: context.into(),
            message: message.into(),
        });
    }

    pub fn extend(&mut self, other: ValidationReport) {
        self.diagnostics.extend(other.diagnostics);
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|diag| diag.severity == ValidationSeverity::Error)
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

/// Check the numeric preconditions the simulator relies on.
///
/// An empty return means the spec is safe to simulate: every timing is finite
/// and non-negative, magazine and particle counts are at least one, and every
/// damage value is finite and non-negative.
pub fn validate_spec(spec: &WeaponSpec, context: &str) -> ValidationReport {
    let mut report = ValidationReport::default();

    if spec.name.trim().is_empty() {
        report.push(ValidationSeverity::Error, context, "missing non-empty name");
    }
    if spec.magazine_size == 0 {
        report.push(
            ValidationSeverity::Error,
            format!("{context}.magazine_size"),
            "must be at least 1",
        );
    }
    if spec.particles_per_shot == 0 {
        report.push(
            ValidationSeverity::Error,
            format!("{context}.particles_per_shot"),
            "must be at least 1",
        );
    }

    for (field, value) in [
        ("shot_interval", spec.shot_interval),
        ("shot_subinterval", spec.shot_subinterval),
        ("reload_duration", spec.reload_duration),
    ] {
        if !value.is_finite() || value < 0.0 {
            report.push(
                ValidationSeverity::Error,
                format!("{context}.{field}"),
                format!("must be a finite non-negative number, got {value}"),
            );
        }
    }

    if spec.damage_levels.is_empty() {
        report.push(
            ValidationSeverity::Warning,
            format!("{context}.damage_levels"),
            "no damage levels; weapon cannot be selected",
        );
    }
    for entry in &spec.damage_levels {
        if !entry.damage.is_finite() || entry.damage < 0.0 {
            report.push(
                ValidationSeverity::Error,
                format!("{context}.damage_levels.{}", entry.level),
                format!("must be a finite non-negative number, got {}", entry.damage),
            );
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{DamageLevel, WeaponMeta};

    fn valid_spec() -> WeaponSpec {
        WeaponSpec {
            name: "Punisher".to_string(),
            damage_levels: vec![DamageLevel {
                level: "Lv1".to_string(),
                damage: 120.0,
            }],
            shot_interval: 0.15,
            shot_subinterval: 0.0,
            magazine_size: 60,
            particles_per_shot: 1,
            reload_duration: 5.0,
            reloads_while_firing: false,
            meta: WeaponMeta::default(),
        }
    }

    #[test]
    fn valid_spec_has_no_diagnostics() {
        assert!(validate_spec(&valid_spec(), "Punisher").is_empty());
    }

    #[test]
    fn zero_magazine_and_negative_reload_are_errors() {
        let spec = WeaponSpec {
            magazine_size: 0,
            reload_duration: -1.0,
            ..valid_spec()
        };
        let report = validate_spec(&spec, "row 3");
        assert!(report.has_errors());
        let contexts: Vec<&str> = report.diagnostics.iter().map(|d| d.context.as_str()).collect();
        assert!(contexts.contains(&"row 3.magazine_size"));
        assert!(contexts.contains(&"row 3.reload_duration"));
    }

    #[test]
    fn missing_levels_only_warn() {
        let spec = WeaponSpec {
            damage_levels: Vec::new(),
            ..valid_spec()
        };
        let report = validate_spec(&spec, "Punisher");
        assert!(!report.has_errors());
        assert_eq!(report.diagnostics.len(), 1);
    }
}
