//! Evaluate many independent TTK requests in parallel.
//!
//! Each request resolves its own loadout and builds its own weapon clocks, so
//! the only shared state is the read-only catalog.

use rayon::prelude::*;
use serde::Deserialize;

use crate::data::{WeaponCatalog, WeaponSelection};
use crate::parallel::pool::WorkerPool;
use crate::sim::{compute_ttk_with_config, SimulationConfig, SimulationError, SimulationResult, TraceMode};

/// One TTK question: a target health pool and the loadout shooting at it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TtkRequest {
    #[serde(rename = "targetHealth", alias = "target_health", alias = "enemyHealth")]
    pub target_health: f64,
    pub weapons: Vec<WeaponSelection>,
    /// Attach the fire-event trace to the result.
    #[serde(default)]
    pub trace: bool,
}

/// Resolve the loadout against `catalog` and run the simulation.
pub fn evaluate_request(
    catalog: &WeaponCatalog,
    request: &TtkRequest,
    config: &SimulationConfig,
) -> Result<SimulationResult, SimulationError> {
    let loadout = catalog.resolve_loadout(&request.weapons)?;
    let config = SimulationConfig {
        trace_mode: if request.trace {
            TraceMode::Events
        } else {
            config.trace_mode
        },
        ..*config
    };
    compute_ttk_with_config(request.target_health, &loadout, &config)
}

/// One result per request, in input order.
pub fn evaluate_batch(
    catalog: &WeaponCatalog,
    requests: &[TtkRequest],
    config: &SimulationConfig,
    pool: &WorkerPool,
) -> Vec<Result<SimulationResult, SimulationError>> {
    pool.install(|| {
        requests
            .par_iter()
            .map(|request| evaluate_request(catalog, request, config))
            .collect()
    })
}
