//! HTTP transport. Routing lives in [routes::route_request], a pure function over
//! method, path and body; this module only adapts it to axum and tokio.

use axum::extract::State;
use axum::http::{header, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod routes;
pub mod static_files;

use routes::{AppState, HttpResponse};

impl IntoResponse for HttpResponse {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, [(header::CONTENT_TYPE, self.content_type)], self.body).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .fallback(dispatch)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn dispatch(State(state): State<AppState>, method: Method, uri: Uri, body: String) -> HttpResponse {
    let path = uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string());
    let method = method.as_str().to_string();

    // Simulations are CPU-bound; keep them off the async workers.
    let routed = tokio::task::spawn_blocking(move || routes::route_request(&state, &method, &path, &body)).await;
    match routed {
        Ok(response) => response,
        Err(err) => {
            tracing::error!("request handler panicked: {err}");
            routes::error_response(500, "request handler failed")
        }
    }
}

/// Bind `bind_addr` and serve until the process is stopped.
pub fn run_server(state: AppState, bind_addr: &str) -> std::io::Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;
    runtime.block_on(async move {
        let listener = tokio::net::TcpListener::bind(bind_addr).await?;
        tracing::info!(
            addr = %listener.local_addr()?,
            weapons = state.catalog.snapshot().len(),
            "ttksim server listening"
        );
        axum::serve(listener, router(state)).await
    })
}
