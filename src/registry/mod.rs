//! Repository seams for the three per-tenant stores.
//!
//! Each registry is a capability set over the persistent store. The
//! server wires all three to [`crate::store::postgres::PgStore`]; the
//! verification engine and the tests only ever see these traits.

use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{AccessLogEntry, Building, NewVehicle, Vehicle, VehiclePatch};

/// Hard cap on vehicle and access-log page sizes.
pub const MAX_PAGE_SIZE: i64 = 1000;

/// Hard cap on the per-plate log listing.
pub const MAX_PLATE_LOG_LIMIT: i64 = 500;

/// Clamp a requested page size into `1..=max`.
pub fn clamp_limit(limit: i64, max: i64) -> i64 {
    limit.clamp(1, max)
}

/// Owns buildings and their API tokens.
#[async_trait]
pub trait TenantRegistry: Send + Sync {
    /// Create a building with a fresh token. `Validation` on empty name.
    async fn create_building(
        &self,
        name: &str,
        address: Option<&str>,
    ) -> Result<Building, AppError>;

    /// All buildings, inactive included. Admin-only visibility.
    async fn list_buildings(&self) -> Result<Vec<Building>, AppError>;

    /// Replace the token atomically. The old token stops authenticating
    /// the moment this returns; there is no grace period.
    async fn rotate_token(&self, building_id: Uuid) -> Result<Building, AppError>;

    /// Resolve an API token to an active building. Inactive buildings
    /// never match. Implementations must not let the comparison time
    /// depend on token content.
    async fn find_by_token(&self, token: &str) -> Result<Option<Building>, AppError>;
}

/// Vehicles of one building. Every call is scoped by `building_id`; no
/// implementation may read or write another tenant's rows.
#[async_trait]
pub trait VehicleRegistry: Send + Sync {
    /// Normalize and insert. `Conflict` if an active vehicle already has
    /// this plate, including the concurrent-registration race, where at
    /// most one caller wins.
    async fn register(
        &self,
        building_id: Uuid,
        plate_raw: &str,
        attrs: NewVehicle,
    ) -> Result<Vehicle, AppError>;

    /// Lookup by normalized plate. Prefers the active row; falls back to
    /// the most recently created inactive one.
    async fn get(&self, building_id: Uuid, plate_raw: &str) -> Result<Option<Vehicle>, AppError>;

    /// Deterministic page (`created_at ASC, id ASC`); `limit` clamped to
    /// [`MAX_PAGE_SIZE`].
    async fn list(
        &self,
        building_id: Uuid,
        skip: i64,
        limit: i64,
        active_only: bool,
    ) -> Result<Vec<Vehicle>, AppError>;

    /// Partial update of an active vehicle; refreshes `updated_at`.
    /// `NotFound` if no active vehicle matches.
    async fn update(
        &self,
        building_id: Uuid,
        plate_raw: &str,
        patch: VehiclePatch,
    ) -> Result<Vehicle, AppError>;

    /// Soft delete. Not idempotent: once inactive, the active lookup no
    /// longer matches and a second call is `NotFound`.
    async fn deactivate(&self, building_id: Uuid, plate_raw: &str) -> Result<Vehicle, AppError>;
}

/// Append-only log of verification attempts, per building.
#[async_trait]
pub trait AccessLedger: Send + Sync {
    async fn record(
        &self,
        building_id: Uuid,
        plate: &str,
        is_authorized: bool,
        confidence: i32,
        image_ref: Option<&str>,
    ) -> Result<AccessLogEntry, AppError>;

    /// Newest first (`accessed_at DESC, id DESC`).
    async fn list(
        &self,
        building_id: Uuid,
        skip: i64,
        limit: i64,
        authorized_only: Option<bool>,
    ) -> Result<Vec<AccessLogEntry>, AppError>;

    /// Entries whose plate normalizes to the same form, newest first.
    async fn list_for_plate(
        &self,
        building_id: Uuid,
        plate_raw: &str,
        limit: i64,
    ) -> Result<Vec<AccessLogEntry>, AppError>;
}
