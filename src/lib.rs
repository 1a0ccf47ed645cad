//! PlateKeeper: multi-tenant license plate access control.
//!
//! Buildings are the tenancy root: each one holds an API token that
//! scopes every vehicle, access-log, and verification call to that
//! building alone.

use std::sync::Arc;

pub mod alpr;
pub mod api;
pub mod auth;
pub mod cli;
pub mod config;
pub mod errors;
pub mod models;
pub mod registry;
pub mod store;
pub mod verify;

use alpr::PlateRecognizer;
use store::postgres::PgStore;

/// Shared application state passed to handlers and middleware.
pub struct AppState {
    pub db: PgStore,
    pub alpr: Arc<dyn PlateRecognizer>,
    pub config: config::Config,
}
