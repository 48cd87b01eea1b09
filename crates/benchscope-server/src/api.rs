//! Upstream API proxy, dashboard settings and embedded frontend.

use axum::{
    body::{Body, Bytes},
    extract::{OriginalUri, State},
    http::{header, HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Json, Router,
};
use tracing::{debug, warn};

use benchscope_core::models::DashboardInfo;

use crate::state::AppState;

// ─── Router ──────────────────────────────────────────────────────────────────

/// Every `/api/*` request is forwarded to the upstream backend unchanged.
pub fn router() -> Router<AppState> {
    Router::new().route("/{*path}", any(proxy))
}

// ─── Handlers ────────────────────────────────────────────────────────────────

const FORWARDED_HEADERS: [header::HeaderName; 2] = [header::CONTENT_TYPE, header::ACCEPT];

async fn proxy(
    State(state): State<AppState>,
    method: Method,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| uri.path());
    let url = format!("{}{}", state.upstream, path);
    debug!("proxy {} {}", method, url);

    let mut request = state.http.request(method.clone(), &url);
    for name in FORWARDED_HEADERS {
        if let Some(value) = headers.get(&name) {
            request = request.header(name, value.clone());
        }
    }
    if !body.is_empty() {
        request = request.body(body);
    }

    let upstream = match request.send().await {
        Ok(resp) => resp,
        Err(e) => {
            warn!("upstream {} {} failed: {}", method, url, e);
            return bad_gateway(e);
        }
    };

    let status = upstream.status();
    let content_type = upstream.headers().get(header::CONTENT_TYPE).cloned();
    let bytes = match upstream.bytes().await {
        Ok(b) => b,
        Err(e) => {
            warn!("upstream body for {} failed: {}", url, e);
            return bad_gateway(e);
        }
    };

    let mut builder = Response::builder().status(status);
    if let Some(ct) = content_type {
        builder = builder.header(header::CONTENT_TYPE, ct);
    }
    builder
        .body(Body::from(bytes))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}

fn bad_gateway(e: reqwest::Error) -> Response {
    (StatusCode::BAD_GATEWAY, format!("upstream unavailable: {}", e)).into_response()
}

pub async fn dashboard_config(State(state): State<AppState>) -> Json<DashboardInfo> {
    Json(DashboardInfo {
        version: env!("CARGO_PKG_VERSION").to_string(),
        stale_time_secs: state.config.stale_time_secs,
        poll_interval_secs: state.config.poll_interval_secs,
    })
}

// ─── Frontend (embedded) ─────────────────────────────────────────────────────

/// Serve the embedded frontend; unknown paths get `index.html` for client routing.
pub async fn serve_frontend(uri: axum::http::Uri) -> impl IntoResponse {
    let path = uri.path().trim_start_matches('/');

    let (actual_path, content) = match Assets::get(path) {
        Some(content) => (path, content),
        None => match Assets::get("index.html") {
            Some(content) => ("index.html", content),
            None => return StatusCode::NOT_FOUND.into_response(),
        },
    };

    let mime = mime_guess::from_path(actual_path).first_or_octet_stream();

    Response::builder()
        .header(header::CONTENT_TYPE, mime.as_ref())
        .body(Body::from(content.data.into_owned()))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}

#[derive(rust_embed::Embed)]
#[folder = "../../frontend/dist"]
#[include = "*.html"]
#[include = "*.js"]
#[include = "*.css"]
#[include = "*.wasm"]
struct Assets;
