use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: Uuid,
    pub building_id: Uuid,
    /// Normalized form (uppercase, alphanumeric only). This is the
    /// lookup and uniqueness key.
    pub license_plate: String,
    pub owner_name: Option<String>,
    pub apartment: Option<String>,
    pub phone: Option<String>,
    pub vehicle_type: Option<String>,
    pub vehicle_brand: Option<String>,
    pub vehicle_color: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Descriptive attributes supplied at registration. The plate arrives
/// separately, raw, and is normalized by the registry.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewVehicle {
    pub owner_name: Option<String>,
    pub apartment: Option<String>,
    pub phone: Option<String>,
    pub vehicle_type: Option<String>,
    pub vehicle_brand: Option<String>,
    pub vehicle_color: Option<String>,
}

/// Partial update; `None` fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VehiclePatch {
    pub owner_name: Option<String>,
    pub apartment: Option<String>,
    pub phone: Option<String>,
    pub vehicle_type: Option<String>,
    pub vehicle_brand: Option<String>,
    pub vehicle_color: Option<String>,
}

impl VehiclePatch {
    pub fn is_empty(&self) -> bool {
        self.owner_name.is_none()
            && self.apartment.is_none()
            && self.phone.is_none()
            && self.vehicle_type.is_none()
            && self.vehicle_brand.is_none()
            && self.vehicle_color.is_none()
    }
}
