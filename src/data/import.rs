//! Load a [WeaponCatalog] from disk. The format follows the file extension:
//! `.csv` (the weapons table), `.json` or `.yaml`/`.yml`.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::data::catalog::{CatalogFormat, CatalogSource, WeaponCatalog};
use crate::data::validate::{ValidationReport, ValidationSeverity};
use crate::sim::{DamageLevel, WeaponMeta, WeaponSpec, UNLIMITED_MAGAZINE};

pub const DEFAULT_CATALOG_PATH: &str = "data/weapons.csv";

/// Damage table keys in column order: base levels, MK2 levels, then MK3.
pub const LEVEL_KEYS: [&str; 25] = [
    "Lv1", "Lv2", "Lv3", "Lv4", "Lv5", "Lv6", "Lv7", "Lv8", "Lv9", "Lv10", "Lv11", "Lv12",
    "MK2_Lv1", "MK2_Lv2", "MK2_Lv3", "MK2_Lv4", "MK2_Lv5", "MK2_Lv6", "MK2_Lv7", "MK2_Lv8",
    "MK2_Lv9", "MK2_Lv10", "MK2_Lv11", "MK2_Lv12", "MK3_Lv1",
];

const CSV_FIRST_LEVEL_COLUMN: usize = 16;
const CSV_MIN_COLUMNS: usize = CSV_FIRST_LEVEL_COLUMN + LEVEL_KEYS.len();
const CSV_ATTRIBUTE_COLUMNS: std::ops::Range<usize> = 11..16;
const CSV_RELOAD_FLAG_COLUMN: usize = 13;
const RELOADS_WHILE_FIRING: &str = "reloads while firing";

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("unsupported catalog format '{0}' (expected .csv, .json, .yaml or .yml)")]
    UnsupportedFormat(String),
    #[error("failed to parse catalog CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to parse catalog JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to parse catalog YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub fn format_for_path(path: &Path) -> Result<CatalogFormat, CatalogError> {
    let ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "csv" => Ok(CatalogFormat::Csv),
        "json" => Ok(CatalogFormat::Json),
        "yaml" | "yml" => Ok(CatalogFormat::Yaml),
        _ => Err(CatalogError::UnsupportedFormat(path.display().to_string())),
    }
}

pub fn load_catalog(path: impl AsRef<Path>) -> Result<WeaponCatalog, CatalogError> {
    let path = path.as_ref();
    let format = format_for_path(path)?;
    let read_error = |source| CatalogError::Read {
        path: path.display().to_string(),
        source,
    };
    let source = CatalogSource::new(path.display().to_string(), format);
    match format {
        // bytes, so a row with bad encoding is reported on its own
        CatalogFormat::Csv => parse_csv_catalog(fs::read(path).map_err(read_error)?.as_slice(), source),
        CatalogFormat::Json => parse_json_catalog(&fs::read_to_string(path).map_err(read_error)?, source),
        CatalogFormat::Yaml => parse_yaml_catalog(&fs::read_to_string(path).map_err(read_error)?, source),
        CatalogFormat::Inline => Err(CatalogError::UnsupportedFormat(path.display().to_string())),
    }
}

// ---------------------------------------------------------------------------
// CSV
// ---------------------------------------------------------------------------

/// Parse the weapons table. The first row is a header. Rows shorter than the
/// full column set are skipped with a warning; rows that cannot be decoded or
/// hold unreadable numbers are skipped with an error.
pub fn parse_csv_catalog<R: Read>(
    reader: R,
    source: CatalogSource,
) -> Result<WeaponCatalog, CatalogError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let mut report = ValidationReport::default();
    let mut specs = Vec::new();

    for (index, result) in reader.records().enumerate() {
        // header is line 1
        let context = format!("row {}", index + 2);
        let record = match result {
            Ok(record) => record,
            Err(err) if matches!(err.kind(), csv::ErrorKind::Io(_)) => return Err(err.into()),
            Err(err) => {
                report.push(ValidationSeverity::Error, context, format!("unreadable row: {err}"));
                continue;
            }
        };
        if record.len() < CSV_MIN_COLUMNS {
            report.push(
                ValidationSeverity::Warning,
                context,
                format!(
                    "expected at least {CSV_MIN_COLUMNS} columns, found {}; row skipped",
                    record.len()
                ),
            );
            continue;
        }
        match spec_from_record(&record) {
            Ok(spec) => specs.push(spec),
            Err(message) => report.push(ValidationSeverity::Error, context, message),
        }
    }

    Ok(WeaponCatalog::from_specs_with_report(specs, source, report))
}

fn spec_from_record(record: &csv::StringRecord) -> Result<WeaponSpec, String> {
    let cell = |column: usize| record.get(column).unwrap_or("").trim();
    let text = |column: usize| {
        let value = cell(column);
        (!value.is_empty()).then(|| value.to_string())
    };

    let name = cell(0).to_string();
    let reload_duration = parse_f64_cell(cell(5), "Reload")?.unwrap_or(0.0);
    let shot_interval = parse_f64_cell(cell(6), "Shot Interval")?.unwrap_or(0.0);
    let shot_subinterval = parse_f64_cell(cell(7), "Shot Subinterval")?.unwrap_or(0.0);
    let magazine_size = parse_u32_cell(cell(9), "Ammo")?.unwrap_or(1);
    let particles_per_shot = parse_u32_cell(cell(10), "Particles per Shot")?.unwrap_or(1);

    let mut damage_levels = Vec::new();
    for (offset, level) in LEVEL_KEYS.iter().enumerate() {
        if let Some(damage) = parse_f64_cell(cell(CSV_FIRST_LEVEL_COLUMN + offset), level)? {
            damage_levels.push(DamageLevel {
                level: (*level).to_string(),
                damage,
            });
        }
    }

    let reloads_while_firing = cell(CSV_RELOAD_FLAG_COLUMN).eq_ignore_ascii_case(RELOADS_WHILE_FIRING);

    Ok(WeaponSpec {
        name,
        damage_levels,
        shot_interval,
        shot_subinterval,
        magazine_size,
        particles_per_shot,
        reload_duration,
        reloads_while_firing,
        meta: WeaponMeta {
            id: text(1),
            tier: text(2),
            range: text(3),
            slot: text(4),
            aoe: text(8),
            attributes: CSV_ATTRIBUTE_COLUMNS.filter_map(text).collect(),
        },
    })
}

/// Empty cells are `None`; thousands separators are ignored.
fn parse_f64_cell(raw: &str, field: &str) -> Result<Option<f64>, String> {
    let cleaned = raw.replace(',', "");
    if cleaned.is_empty() {
        return Ok(None);
    }
    cleaned
        .parse::<f64>()
        .map(Some)
        .map_err(|_| format!("{field}: '{raw}' is not a number"))
}

fn parse_u32_cell(raw: &str, field: &str) -> Result<Option<u32>, String> {
    let cleaned = raw.replace(',', "");
    if cleaned.is_empty() {
        return Ok(None);
    }
    cleaned
        .parse::<u32>()
        .map(Some)
        .map_err(|_| format!("{field}: '{raw}' is not a whole number"))
}

// ---------------------------------------------------------------------------
// JSON / YAML
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CatalogFile {
    Wrapped { weapons: Vec<WeaponSpec> },
    Specs(Vec<WeaponSpec>),
    /// The scraper's output: weapon name -> flat stat record.
    Scraped(BTreeMap<String, ScrapedWeapon>),
}

#[derive(Debug, Deserialize)]
struct ScrapedWeapon {
    #[serde(default)]
    fire_interval: Option<f64>,
    #[serde(default)]
    burst_interval: Option<f64>,
    #[serde(default)]
    clip_size: Option<f64>,
    #[serde(default)]
    particles_per_burst: Option<f64>,
    #[serde(default)]
    reload_time: Option<f64>,
    #[serde(default)]
    reload_while_firing: Option<bool>,
    #[serde(default)]
    damage_modifier: Option<f64>,
    #[serde(default)]
    tier: Option<serde_json::Value>,
    #[serde(default)]
    range: Option<serde_json::Value>,
    #[serde(default)]
    slot: Option<serde_json::Value>,
    #[serde(default)]
    splash_radius: Option<serde_json::Value>,
    #[serde(flatten)]
    extra: HashMap<String, serde_json::Value>,
}

fn value_text(value: Option<serde_json::Value>) -> Option<String> {
    match value? {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) if s.trim().is_empty() => None,
        serde_json::Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

/// `damage_N` maps onto the N-th entry of [LEVEL_KEYS]; numbers past the table keep their raw key.
fn scraped_level_key(number: usize) -> String {
    number
        .checked_sub(1)
        .and_then(|index| LEVEL_KEYS.get(index))
        .map(|key| (*key).to_string())
        .unwrap_or_else(|| format!("damage_{number}"))
}

impl ScrapedWeapon {
    /// A missing clip never empties; `damage_modifier` scales every damage level.
    fn into_spec(self, name: String) -> WeaponSpec {
        let modifier = self.damage_modifier.unwrap_or(1.0);
        let mut levels: Vec<(usize, f64)> = self
            .extra
            .iter()
            .filter_map(|(key, value)| {
                let number = key.strip_prefix("damage_")?.parse::<usize>().ok()?;
                Some((number, value.as_f64()? * modifier))
            })
            .collect();
        levels.sort_by_key(|(number, _)| *number);

        WeaponSpec {
            name,
            damage_levels: levels
                .into_iter()
                .map(|(number, damage)| DamageLevel {
                    level: scraped_level_key(number),
                    damage,
                })
                .collect(),
            shot_interval: self.fire_interval.unwrap_or(0.0),
            shot_subinterval: self.burst_interval.unwrap_or(0.0),
            // saturating casts: negative or NaN counts become 0 and fail validation
            magazine_size: self
                .clip_size
                .map(|v| v.round() as u32)
                .unwrap_or(UNLIMITED_MAGAZINE),
            particles_per_shot: self.particles_per_burst.map(|v| v.round() as u32).unwrap_or(1),
            reload_duration: self.reload_time.unwrap_or(0.0),
            reloads_while_firing: self.reload_while_firing.unwrap_or(false),
            meta: WeaponMeta {
                id: None,
                tier: value_text(self.tier),
                range: value_text(self.range),
                slot: value_text(self.slot),
                aoe: value_text(self.splash_radius),
                attributes: Vec::new(),
            },
        }
    }
}

impl CatalogFile {
    fn into_specs(self) -> Vec<WeaponSpec> {
        match self {
            Self::Wrapped { weapons } | Self::Specs(weapons) => weapons,
            Self::Scraped(map) => map
                .into_iter()
                .map(|(name, weapon)| weapon.into_spec(name))
                .collect(),
        }
    }
}

pub fn parse_json_catalog(raw: &str, source: CatalogSource) -> Result<WeaponCatalog, CatalogError> {
    let file: CatalogFile = serde_json::from_str(raw)?;
    Ok(WeaponCatalog::from_specs(file.into_specs(), source))
}

pub fn parse_yaml_catalog(raw: &str, source: CatalogSource) -> Result<WeaponCatalog, CatalogError> {
    let file: CatalogFile = serde_yaml::from_str(raw)?;
    Ok(WeaponCatalog::from_specs(file.into_specs(), source))
}
