//! Response header middleware for Axum.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use crate::server::AppState;
use crate::static_files::ServedKind;

pub const CACHE_IMMUTABLE: &str = "public, max-age=31536000, immutable";
pub const CACHE_NONE: &str = "no-cache, no-store, must-revalidate";
pub const CACHE_SHORT: &str = "public, max-age=3600";

const IMMUTABLE_EXTENSIONS: &[&str] = &[
    ".js", ".css", ".png", ".jpg", ".jpeg", ".gif", ".svg", ".webp",
];

/// Whether a path names a long-lived, content-addressed asset.
pub fn is_immutable_asset_path(path: &str) -> bool {
    path.starts_with("/assets/") || IMMUTABLE_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}

/// Cache policy for a served path. `None` leaves the response untouched.
pub fn cache_policy(path: &str, fallback_url_path: &str, kind: Option<ServedKind>) -> Option<&'static str> {
    match kind {
        Some(ServedKind::Shell) => Some(CACHE_NONE),
        Some(ServedKind::Asset) if path == "/" || path == fallback_url_path => Some(CACHE_NONE),
        Some(ServedKind::Asset) if is_immutable_asset_path(path) => Some(CACHE_IMMUTABLE),
        Some(ServedKind::Asset) => Some(CACHE_SHORT),
        None => None,
    }
}

/// Sets `Cache-Control` (and the legacy no-cache headers for the shell).
pub async fn cache_control(State(state): State<Arc<AppState>>, request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();
    let mut response = next.run(request).await;

    let kind = response.extensions().get::<ServedKind>().copied();
    let Some(policy) = cache_policy(&path, &state.config.fallback_url_path(), kind) else {
        return response;
    };

    let headers = response.headers_mut();
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static(policy));
    if policy == CACHE_NONE {
        headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
        headers.insert(header::EXPIRES, HeaderValue::from_static("0"));
    }
    response
}

/// Sets CSP, HSTS and the fixed hardening headers from configuration.
pub async fn security_headers(State(state): State<Arc<AppState>>, request: Request, next: Next) -> Response {
    let https = is_https(request.headers());
    let mut response = next.run(request).await;

    let cfg = &state.config;
    let headers = response.headers_mut();

    if let Some(csp) = &cfg.csp_header {
        set(headers, header::CONTENT_SECURITY_POLICY, csp);
    }
    // HSTS over plain HTTP is ignored by browsers; only send it behind TLS.
    if cfg.hsts_max_age > 0 && https {
        set(
            headers,
            header::STRICT_TRANSPORT_SECURITY,
            &format!("max-age={}; includeSubDomains", cfg.hsts_max_age),
        );
    }
    set(headers, header::X_CONTENT_TYPE_OPTIONS, &cfg.security.x_content_type_options);
    set(headers, header::X_FRAME_OPTIONS, &cfg.security.x_frame_options);
    set(headers, header::REFERRER_POLICY, &cfg.security.referrer_policy);
    set(
        headers,
        HeaderName::from_static("permissions-policy"),
        &cfg.security.permissions_policy,
    );
    response
}

/// The server speaks plain HTTP; TLS is terminated by a proxy that reports
/// the original scheme.
fn is_https(headers: &HeaderMap) -> bool {
    headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.split(',').next().unwrap_or_default().trim().eq_ignore_ascii_case("https"))
        .unwrap_or(false)
}

fn set(headers: &mut HeaderMap, name: HeaderName, value: &str) {
    match HeaderValue::from_str(value) {
        Ok(v) => {
            headers.insert(name, v);
        }
        Err(_) => tracing::warn!("Skipping invalid {} header value: {:?}", name, value),
    }
}
