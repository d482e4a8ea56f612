use std::path::PathBuf;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::data::CatalogHandle;
use crate::parallel::WorkerPool;
use crate::server::api;
use crate::server::static_files;
use crate::sim::SimulationConfig;

/// Everything a request handler needs. Cheap to clone; the catalog is shared.
#[derive(Debug, Clone)]
pub struct AppState {
    pub catalog: Arc<CatalogHandle>,
    pub simulation: SimulationConfig,
    pub pool: WorkerPool,
    pub static_dir: PathBuf,
}

impl AppState {
    pub fn new(catalog: Arc<CatalogHandle>, config: &AppConfig) -> Self {
        Self {
            catalog,
            simulation: config.simulation(),
            pool: WorkerPool::with_workers(config.workers),
            static_dir: config.static_dir.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status_code: u16,
    pub content_type: &'static str,
    pub body: String,
}

impl HttpResponse {
    pub fn json(body: String) -> Self {
        HttpResponse {
            status_code: 200,
            content_type: "application/json",
            body,
        }
    }
}

pub fn route_request(state: &AppState, method: &str, path: &str, body: &str) -> HttpResponse {
    if let Some(response) = static_files::try_serve_static(&state.static_dir, method, path) {
        return response;
    }
    let route = path.split('?').next().unwrap_or(path);
    match (method, route) {
        ("GET", "/") | ("GET", "/index.html") => HttpResponse {
            status_code: 200,
            content_type: "text/html; charset=utf-8",
            body: index_html(),
        },
        ("GET", "/api/health") => match api::health_payload(state) {
            Ok(payload) => HttpResponse::json(payload),
            Err(err) => error_response(500, &err.to_string()),
        },
        ("GET", "/api/weapons-data") => match api::weapons_data_payload(state) {
            Ok(payload) => HttpResponse::json(payload),
            Err(err) => error_response(500, &err.to_string()),
        },
        ("GET", "/api/catalog") => match api::catalog_info_payload(state) {
            Ok(payload) => HttpResponse::json(payload),
            Err(err) => error_response(500, &err.to_string()),
        },
        ("POST", "/api/catalog/reload") => match api::catalog_reload_payload(state) {
            Ok(payload) => HttpResponse::json(payload),
            Err(err) => {
                tracing::error!(path = %state.catalog.path().display(), "catalog reload failed: {err}");
                error_response(500, &err.to_string())
            }
        },
        ("POST", "/api/calculate-ttk") => match api::calculate_ttk_payload(state, body) {
            Ok(payload) => HttpResponse::json(payload),
            Err(err) => ttk_error_response(err),
        },
        ("POST", "/api/calculate-ttk/batch") => match api::calculate_ttk_batch_payload(state, body) {
            Ok(payload) => HttpResponse::json(payload),
            Err(err) => ttk_error_response(err),
        },
        _ => error_response(404, "Route not found"),
    }
}

fn ttk_error_response(err: api::TtkPayloadError) -> HttpResponse {
    match err {
        api::TtkPayloadError::Parse(err) => {
            error_response(400, &format!("Invalid request body: {err}"))
        }
        api::TtkPayloadError::Serialize(err) => {
            tracing::error!("failed to serialize TTK response: {err}");
            error_response(500, &err.to_string())
        }
        api::TtkPayloadError::Validation(validation) => {
            validation_error_response(400, validation)
        }
        api::TtkPayloadError::Simulation(err) if err.is_internal() => {
            tracing::error!("simulation invariant violated: {err}");
            simulation_error_response(500, &err)
        }
        api::TtkPayloadError::Simulation(err) => {
            tracing::warn!("rejected TTK request: {err}");
            simulation_error_response(400, &err)
        }
    }
}

fn validation_error_response(
    status_code: u16,
    payload: api::ValidationErrorResponse,
) -> HttpResponse {
    let fallback =
        "{\n  \"status\": \"error\",\n  \"message\": \"Validation failed\"\n}".to_string();

    HttpResponse {
        status_code,
        content_type: "application/json",
        body: serde_json::to_string_pretty(&payload).unwrap_or(fallback),
    }
}

fn simulation_error_response(
    status_code: u16,
    err: &crate::sim::SimulationError,
) -> HttpResponse {
    let payload = api::SimulationErrorResponse::from_error(err);
    match serde_json::to_string_pretty(&payload) {
        Ok(body) => HttpResponse {
            status_code,
                content_type: "application/json",
            body,
        },
        Err(_) => error_response(status_code, &err.to_string()),
    }
}

pub fn error_response(status_code: u16, message: &str) -> HttpResponse {
    HttpResponse {
        status_code,
        content_type: "application/json",
        body: format!(
            "{{\n  \"status\": \"error\",\n  \"message\": {}\n}}",
            serde_json::to_string(message).unwrap_or_else(|_| "\"Unknown error\"".to_string())
        ),
    }
}

fn index_html() -> String {
    r#"<!doctype html>
<html lang="en">
<head>
  <meta charset="utf-8" />
  <meta name="viewport" content="width=device-width,initial-scale=1" />
  <title>TTK Calculator</title>
  <style>
    body { font-family: Arial, sans-serif; max-width: 900px; margin: 24px auto; padding: 0 12px; }
    .card { border: 1px solid #ddd; border-radius: 8px; padding: 14px; margin: 14px 0; }
    label { display:block; margin: 8px 0 4px; font-weight: 600; }
    input, select { width: 100%; padding: 8px; box-sizing: border-box; }
    button { margin-top: 12px; padding: 8px 14px; }
    pre { background: #111; color: #aef2ae; padding: 12px; overflow: auto; border-radius: 6px; min-height: 180px; }
  </style>
</head>
<body>
  <h1>TTK Calculator</h1>

  <div class="card">
    <label for="health">Target health</label>
    <input id="health" type="number" min="1" value="100000" />
    <div id="slots"></div>
    <button id="add-btn" type="button">Add weapon</button>
    <button id="calc-btn" type="button">POST /api/calculate-ttk</button>
  </div>

  <pre id="output">Loading weapons…</pre>

  <script>
    const output = document.getElementById('output');
    const slots = document.getElementById('slots');
    let weapons = {};

    function addSlot() {
      const row = document.createElement('div');
      const name = document.createElement('select');
      const level = document.createElement('select');
      Object.keys(weapons).forEach(n => name.add(new Option(n, n)));
      function fillLevels() {
        level.innerHTML = '';
        const w = weapons[name.value];
        if (w) w.damage_levels.forEach(l => level.add(new Option(l.level + ' (' + l.damage + ')', l.level)));
      }
      name.addEventListener('change', fillLevels);
      fillLevels();
      row.className = 'slot';
      row.append(name, level);
      slots.append(row);
    }

    fetch('/api/weapons-data').then(r => r.json()).then(data => {
      weapons = data;
      output.textContent = Object.keys(weapons).length + ' weapons loaded.';
      addSlot();
    });

    document.getElementById('add-btn').addEventListener('click', addSlot);
    document.getElementById('calc-btn').addEventListener('click', async () => {
      const picks = Array.from(slots.querySelectorAll('.slot')).map(row => {
        const [name, level] = row.querySelectorAll('select');
        return { name: name.value, level: level.value };
      });
      const payload = { targetHealth: Number(document.getElementById('health').value), weapons: picks };
      const response = await fetch('/api/calculate-ttk', {
        method: 'POST',
        headers: { 'Content-Type': 'application/json' },
        body: JSON.stringify(payload),
      });
      output.textContent = 'HTTP ' + response.status + '\n' + await response.text();
    });
  </script>
</body>
</html>
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimulationError;

    fn kind_of(response: &HttpResponse) -> String {
        let payload: serde_json::Value = serde_json::from_str(&response.body).expect("json body");
        payload["kind"].as_str().unwrap_or_default().to_string()
    }

    #[test]
    fn invariant_violations_are_server_errors() {
        let response = ttk_error_response(api::TtkPayloadError::Simulation(
            SimulationError::InvariantViolation("no finite next event".to_string()),
        ));
        assert_eq!(response.status_code, 500);
        assert_eq!(response.content_type, "application/json");
        assert_eq!(kind_of(&response), "invariant_violation");
    }

    #[test]
    fn unkillable_loadouts_are_client_errors() {
        let response = ttk_error_response(api::TtkPayloadError::Simulation(
            SimulationError::NoProgressPossible {
                iterations: 1_000_000,
                remaining_health: 40.0,
            },
        ));
        assert_eq!(response.status_code, 400);
        assert_eq!(kind_of(&response), "no_progress_possible");
    }
}
