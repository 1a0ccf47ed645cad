//! Authentication gate.
//!
//! Two credential classes, never interchangeable: the process-wide admin
//! token guards building management, and per-building API keys scope
//! everything else to one tenant. Both comparisons are constant-time.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use rand::rngs::OsRng;
use rand::RngCore;
use subtle::ConstantTimeEq;

use crate::errors::AppError;
use crate::registry::TenantRegistry;
use crate::AppState;

/// Generate a fresh building API token: 32 random bytes, hex-encoded.
pub fn generate_api_token() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Constant-time string comparison. Only the length check can short-cut;
/// timing never depends on content.
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

fn mask(key: &str) -> String {
    if key.len() > 8 {
        format!("{}…{}", &key[..4], &key[key.len() - 4..])
    } else {
        "****".to_string()
    }
}

/// Middleware for the `/admin` router: validates `X-Admin-Token` (or a
/// bearer token) against the configured admin secret.
pub async fn admin_auth(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let provided = req
        .headers()
        .get("x-admin-token")
        .and_then(|v| v.to_str().ok())
        .or_else(|| {
            req.headers()
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.strip_prefix("Bearer "))
                .map(|t| t.trim())
        })
        .map(String::from);

    match provided {
        Some(k) if constant_time_eq(&k, &state.config.admin_token) => Ok(next.run(req).await),
        Some(k) => {
            // Never log the expected token or the full provided one.
            tracing::warn!("admin API: invalid token (provided: '{}')", mask(&k));
            Err(AppError::Authentication)
        }
        None => {
            tracing::warn!("admin API: missing X-Admin-Token header");
            Err(AppError::Authentication)
        }
    }
}

/// Middleware for the tenant router: resolves `X-API-Key` to an active
/// building and stores it in request extensions. Missing, unknown, and
/// inactive keys all collapse to the same `Authentication` error.
pub async fn tenant_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let api_key = req
        .headers()
        .get("x-api-key")
        .and_then(|v| v.to_str().ok())
        .ok_or(AppError::Authentication)?;

    let building = state
        .db
        .find_by_token(api_key)
        .await?
        .ok_or(AppError::Authentication)?;

    req.extensions_mut().insert(building);
    Ok(next.run(req).await)
}
