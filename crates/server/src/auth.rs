//! Bearer-token authentication
//!
//! When `server.auth.enabled` is set, every request outside
//! `server.auth.public_paths` must carry `Authorization: Bearer <api_key>`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::extract::Request;
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use parking_lot::RwLock;

use store_assistant_config::Settings;

static AUTH_DISABLED_WARNED: AtomicBool = AtomicBool::new(false);

/// What the current config asks of this request
enum AuthCheck {
    Disabled,
    PublicPath,
    Misconfigured(&'static str),
    Expect(String),
}

/// Read everything needed from the config without holding the lock across
/// an await
fn check_auth_config(config: &RwLock<Settings>, path: &str) -> AuthCheck {
    let settings = config.read();
    let auth = &settings.server.auth;

    if !auth.enabled {
        if !AUTH_DISABLED_WARNED.swap(true, Ordering::Relaxed) {
            tracing::warn!(
                "API authentication is disabled. Set STORE_ASSISTANT__SERVER__AUTH__ENABLED=true for production."
            );
        }
        return AuthCheck::Disabled;
    }

    if auth.public_paths.iter().any(|p| path.starts_with(p.as_str())) {
        return AuthCheck::PublicPath;
    }

    match &auth.api_key {
        Some(key) if !key.is_empty() => AuthCheck::Expect(key.clone()),
        _ => AuthCheck::Misconfigured("auth is enabled but no API key is configured"),
    }
}

/// Authentication middleware
///
/// Expects the shared `Arc<RwLock<Settings>>` as a request extension.
pub async fn auth_middleware(request: Request, next: Next) -> Response {
    let Some(config) = request.extensions().get::<Arc<RwLock<Settings>>>().cloned() else {
        tracing::error!("Config extension not found in request");
        return (StatusCode::INTERNAL_SERVER_ERROR, "Server configuration error").into_response();
    };

    match check_auth_config(&config, request.uri().path()) {
        AuthCheck::Disabled | AuthCheck::PublicPath => next.run(request).await,
        AuthCheck::Misconfigured(msg) => {
            tracing::error!("{}", msg);
            (StatusCode::INTERNAL_SERVER_ERROR, "Server authentication not configured").into_response()
        }
        AuthCheck::Expect(expected) => {
            let provided = request
                .headers()
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .map(|v| v.strip_prefix("Bearer ").map(str::to_string));

            match provided {
                Some(Some(token)) if constant_time_compare(token.as_bytes(), expected.as_bytes()) => {
                    next.run(request).await
                }
                Some(Some(_)) => {
                    tracing::warn!(path = %request.uri().path(), "Rejected request with invalid API key");
                    (StatusCode::UNAUTHORIZED, "Invalid API key").into_response()
                }
                Some(None) => (
                    StatusCode::BAD_REQUEST,
                    "Invalid Authorization header format. Expected: Bearer <token>",
                )
                    .into_response(),
                None => (StatusCode::UNAUTHORIZED, "Missing Authorization header").into_response(),
            }
        }
    }
}

fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
