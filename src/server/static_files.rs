//! Serve the calculator front end from a static directory when one is deployed.
//! Without it the built-in console served by `/` is used instead.

use std::fs;
use std::path::Path;

use super::routes::HttpResponse;

/// Try to serve `path` from `static_dir`. Returns None for API paths, non-GET
/// requests, traversal attempts, or when the directory holds no matching file.
pub fn try_serve_static(static_dir: &Path, method: &str, path: &str) -> Option<HttpResponse> {
    if method != "GET" || path.starts_with("/api") {
        return None;
    }

    let path = path.split('?').next().unwrap_or(path).trim_start_matches('/');
    if path.contains("..") {
        return None;
    }

    let root = static_dir.canonicalize().ok()?;
    let relative = if path.is_empty() { "index.html" } else { path };
    let file_path = root.join(relative);
    if !file_path.starts_with(&root) || !file_path.is_file() {
        return None;
    }

    let content_type = content_type_for_path(relative);
    if !is_text_content_type(content_type) {
        return None;
    }
    let body = fs::read_to_string(&file_path).ok()?;

    Some(HttpResponse {
        status_code: 200,
        content_type,
        body,
    })
}

fn content_type_for_path(path: &str) -> &'static str {
    match path.rsplit_once('.').map(|(_, ext)| ext) {
        Some("html") => "text/html; charset=utf-8",
        Some("js") => "application/javascript; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("json") => "application/json; charset=utf-8",
        Some("csv") => "text/csv; charset=utf-8",
        _ => "application/octet-stream",
    }
}

fn is_text_content_type(ct: &str) -> bool {
    ct.starts_with("text/")
        || ct.starts_with("application/javascript")
        || ct.starts_with("application/json")
}
