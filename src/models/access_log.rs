use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Sentinel recorded when recognition completed but found no plate.
pub const NO_PLATE: &str = "";

/// One verification attempt. Append-only; there is no update or delete
/// path anywhere in the crate.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct AccessLogEntry {
    pub id: Uuid,
    pub building_id: Uuid,
    /// Raw recognized string; not necessarily a registered vehicle, and
    /// [`NO_PLATE`] when nothing was detected.
    pub license_plate: String,
    pub is_authorized: bool,
    /// Detection/OCR confidence, 0–100. Reflects recognition quality,
    /// not authorization certainty.
    pub confidence: i32,
    pub image_ref: Option<String>,
    pub accessed_at: DateTime<Utc>,
}
