use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data::{CatalogError, CatalogSource, ValidationDiagnostic};
use crate::parallel::{evaluate_batch, evaluate_request, TtkRequest};
use crate::server::routes::AppState;
use crate::sim::{FireEvent, SimulationError, SimulationResult, WeaponBreakdown};

pub const MAX_BATCH_REQUESTS: usize = 256;

#[derive(Debug, Clone, Serialize)]
pub struct ValidationIssue {
    pub field: String,
    pub messages: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationErrorResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub errors: Vec<ValidationIssue>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SimulationErrorResponse {
    pub status: &'static str,
    pub kind: &'static str,
    pub message: String,
}

impl SimulationErrorResponse {
    pub fn from_error(err: &SimulationError) -> Self {
        Self {
            status: "error",
            kind: error_kind(err),
            message: err.to_string(),
        }
    }
}

pub fn error_kind(err: &SimulationError) -> &'static str {
    match err {
        SimulationError::UnknownWeapon(_) => "unknown_weapon",
        SimulationError::UnknownLevel { .. } => "unknown_level",
        SimulationError::EmptyLoadout => "empty_loadout",
        SimulationError::InvalidTargetHealth(_) => "invalid_target_health",
        SimulationError::NoProgressPossible { .. } => "no_progress_possible",
        SimulationError::InvariantViolation(_) => "invariant_violation",
    }
}

#[derive(Debug, Error)]
pub enum TtkPayloadError {
    #[error("{0}")]
    Parse(serde_json::Error),
    #[error("{0}")]
    Serialize(serde_json::Error),
    #[error("invalid TTK request")]
    Validation(ValidationErrorResponse),
    #[error(transparent)]
    Simulation(#[from] SimulationError),
}

/// Per-weapon row of a TTK response, rounded for presentation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakdownRow {
    pub name: String,
    pub level: String,
    pub shots: u64,
    pub damage: u64,
    pub reloads: u64,
    pub reload_time: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRow {
    pub time: f64,
    pub weapon: String,
    pub damage: f64,
    pub health_after: f64,
    pub ammo_after: u32,
    pub reloaded: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TtkResponse {
    pub status: &'static str,
    pub ttk: f64,
    pub total_shots: u64,
    pub total_damage: u64,
    pub dps: u64,
    pub iterations: u64,
    pub breakdown: Vec<BreakdownRow>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<EventRow>,
}

/// Round to two decimals for time values.
pub fn round_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn round_whole(value: f64) -> u64 {
    value.round().max(0.0) as u64
}

impl From<&WeaponBreakdown> for BreakdownRow {
    fn from(weapon: &WeaponBreakdown) -> Self {
        Self {
            name: weapon.name.clone(),
            level: weapon.level.clone(),
            shots: weapon.shots,
            damage: round_whole(weapon.damage),
            reloads: weapon.reloads,
            reload_time: round_hundredths(weapon.reload_time),
        }
    }
}

impl From<&FireEvent> for EventRow {
    fn from(event: &FireEvent) -> Self {
        Self {
            time: event.time,
            weapon: event.weapon.clone(),
            damage: event.damage,
            health_after: event.health_after,
            ammo_after: event.ammo_after,
            reloaded: event.reloaded,
        }
    }
}

impl From<&SimulationResult> for TtkResponse {
    fn from(result: &SimulationResult) -> Self {
        Self {
            status: "ok",
            ttk: round_hundredths(result.ttk),
            total_shots: result.total_shots,
            total_damage: round_whole(result.total_damage),
            dps: round_whole(result.dps),
            iterations: result.iterations,
            breakdown: result.breakdown.iter().map(BreakdownRow::from).collect(),
            events: result.events.iter().map(EventRow::from).collect(),
        }
    }
}

pub fn health_payload(state: &AppState) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&serde_json::json!({
        "status": "ok",
        "service": "ttksim-api",
        "version": env!("CARGO_PKG_VERSION"),
        "weapons": state.catalog.snapshot().len(),
    }))
}

/// Name → full weapon record, the shape the calculator page uses to fill its selectors.
pub fn weapons_data_payload(state: &AppState) -> Result<String, serde_json::Error> {
    let catalog = state.catalog.snapshot();
    serde_json::to_string_pretty(&catalog.to_map())
}

#[derive(Debug, Clone, Serialize)]
pub struct CatalogInfoResponse<'a> {
    pub status: &'static str,
    pub source: &'a CatalogSource,
    pub weapon_count: usize,
    pub diagnostics: &'a [ValidationDiagnostic],
}

pub fn catalog_info_payload(state: &AppState) -> Result<String, serde_json::Error> {
    let catalog = state.catalog.snapshot();
    serde_json::to_string_pretty(&CatalogInfoResponse {
        status: "ok",
        source: catalog.source(),
        weapon_count: catalog.len(),
        diagnostics: &catalog.report().diagnostics,
    })
}

#[derive(Debug, Error)]
pub enum ReloadError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Serialize(#[from] serde_json::Error),
}

pub fn catalog_reload_payload(state: &AppState) -> Result<String, ReloadError> {
    let catalog = state.catalog.reload()?;
    tracing::info!(
        path = %state.catalog.path().display(),
        weapons = catalog.len(),
        diagnostics = catalog.report().diagnostics.len(),
        "catalog reloaded"
    );
    Ok(serde_json::to_string_pretty(&CatalogInfoResponse {
        status: "ok",
        source: catalog.source(),
        weapon_count: catalog.len(),
        diagnostics: &catalog.report().diagnostics,
    })?)
}

pub fn calculate_ttk_payload(state: &AppState, body: &str) -> Result<String, TtkPayloadError> {
    let request: TtkRequest = serde_json::from_str(body).map_err(TtkPayloadError::Parse)?;
    validate_request(&request)?;

    let catalog = state.catalog.snapshot();
    let result = evaluate_request(&catalog, &request, &state.simulation)?;

    serde_json::to_string_pretty(&TtkResponse::from(&result)).map_err(TtkPayloadError::Serialize)
}

#[derive(Debug, Clone, Deserialize)]
pub struct BatchRequest {
    pub requests: Vec<TtkRequest>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum BatchItem {
    Ok(TtkResponse),
    Err(SimulationErrorResponse),
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchResponse {
    pub status: &'static str,
    pub results: Vec<BatchItem>,
}

pub fn calculate_ttk_batch_payload(state: &AppState, body: &str) -> Result<String, TtkPayloadError> {
    let batch: BatchRequest = serde_json::from_str(body).map_err(TtkPayloadError::Parse)?;
    if batch.requests.is_empty() || batch.requests.len() > MAX_BATCH_REQUESTS {
        return Err(TtkPayloadError::Validation(ValidationErrorResponse {
            status: "error",
            message: "Validation failed",
            errors: vec![ValidationIssue {
                field: "requests".to_string(),
                messages: vec![format!("must contain between 1 and {MAX_BATCH_REQUESTS} requests")],
            }],
        }));
    }

    let catalog = state.catalog.snapshot();
    let results = evaluate_batch(&catalog, &batch.requests, &state.simulation, &state.pool);

    let mut items = Vec::with_capacity(results.len());
    for result in &results {
        match result {
            Ok(result) => items.push(BatchItem::Ok(TtkResponse::from(result))),
            Err(err) if err.is_internal() => {
                tracing::error!("simulation invariant violated in batch: {err}");
                items.push(BatchItem::Err(SimulationErrorResponse::from_error(err)));
            }
            Err(err) => items.push(BatchItem::Err(SimulationErrorResponse::from_error(err))),
        }
    }

    serde_json::to_string_pretty(&BatchResponse {
        status: "ok",
        results: items,
    })
    .map_err(TtkPayloadError::Serialize)
}

fn validate_request(request: &TtkRequest) -> Result<(), TtkPayloadError> {
    let mut errors: Vec<ValidationIssue> = Vec::new();

    if !request.target_health.is_finite() || request.target_health <= 0.0 {
        errors.push(ValidationIssue {
            field: "targetHealth".to_string(),
            messages: vec!["must be a positive number".to_string()],
        });
    }

    if request.weapons.is_empty() {
        errors.push(ValidationIssue {
            field: "weapons".to_string(),
            messages: vec!["must contain at least one weapon".to_string()],
        });
    }

    for (index, selection) in request.weapons.iter().enumerate() {
        let mut messages = Vec::new();
        if selection.name.trim().is_empty() {
            messages.push("name must not be empty".to_string());
        }
        if selection.level.trim().is_empty() {
            messages.push("level must not be empty".to_string());
        }
        if !messages.is_empty() {
            errors.push(ValidationIssue {
                field: format!("weapons[{index}]"),
                messages,
            });
        }
    }

    if errors.is_empty() {
        return Ok(());
    }

    Err(TtkPayloadError::Validation(ValidationErrorResponse {
        status: "error",
        message: "Validation failed",
        errors,
    }))
}
