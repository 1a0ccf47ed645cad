use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A tenant. Every vehicle and access-log entry belongs to exactly one
/// building, and no query crosses that boundary.
///
/// `api_token` never serializes with the rest of the row: the only
/// places a token leaves the process are the create and rotate responses,
/// which copy it out explicitly.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct Building {
    pub id: Uuid,
    pub name: String,
    pub address: Option<String>,
    #[serde(skip_serializing)]
    pub api_token: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}
