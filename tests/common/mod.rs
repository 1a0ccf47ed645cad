//! In-memory registry implementations and a scripted recognizer.
//!
//! These mirror the Postgres store's semantics (normalization, active-only
//! uniqueness, ordering, clamping) so the engine and authentication
//! properties can be exercised without a live database.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use platekeeper::alpr::{PlateObservation, PlateRecognizer};
use platekeeper::auth::{constant_time_eq, generate_api_token};
use platekeeper::errors::AppError;
use platekeeper::models::plate;
use platekeeper::models::{AccessLogEntry, Building, NewVehicle, Vehicle, VehiclePatch};
use platekeeper::registry::{
    clamp_limit, AccessLedger, TenantRegistry, VehicleRegistry, MAX_PAGE_SIZE,
    MAX_PLATE_LOG_LIMIT,
};

#[derive(Default)]
struct Inner {
    buildings: Vec<Building>,
    vehicles: Vec<Vehicle>,
    // Insertion order doubles as the accessed_at/id ordering.
    logs: Vec<AccessLogEntry>,
}

#[derive(Clone, Default)]
pub struct MemStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Test hook: deactivate a building so its token must stop matching.
    pub async fn deactivate_building(&self, id: Uuid) {
        let mut inner = self.inner.lock().await;
        if let Some(b) = inner.buildings.iter_mut().find(|b| b.id == id) {
            b.is_active = false;
        }
    }

    pub async fn log_count(&self, building_id: Uuid) -> usize {
        let inner = self.inner.lock().await;
        inner
            .logs
            .iter()
            .filter(|l| l.building_id == building_id)
            .count()
    }
}

#[async_trait]
impl TenantRegistry for MemStore {
    async fn create_building(
        &self,
        name: &str,
        address: Option<&str>,
    ) -> Result<Building, AppError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::Validation("building name must not be empty".into()));
        }
        let building = Building {
            id: Uuid::new_v4(),
            name: name.to_string(),
            address: address.map(String::from),
            api_token: generate_api_token(),
            is_active: true,
            created_at: Utc::now(),
        };
        self.inner.lock().await.buildings.push(building.clone());
        Ok(building)
    }

    async fn list_buildings(&self) -> Result<Vec<Building>, AppError> {
        Ok(self.inner.lock().await.buildings.clone())
    }

    async fn rotate_token(&self, building_id: Uuid) -> Result<Building, AppError> {
        let mut inner = self.inner.lock().await;
        let building = inner
            .buildings
            .iter_mut()
            .find(|b| b.id == building_id)
            .ok_or(AppError::NotFound("building"))?;
        building.api_token = generate_api_token();
        Ok(building.clone())
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<Building>, AppError> {
        let inner = self.inner.lock().await;
        let mut found = None;
        for b in inner.buildings.iter().filter(|b| b.is_active) {
            if constant_time_eq(&b.api_token, token) {
                found = Some(b.clone());
            }
        }
        Ok(found)
    }
}

#[async_trait]
impl VehicleRegistry for MemStore {
    async fn register(
        &self,
        building_id: Uuid,
        plate_raw: &str,
        attrs: NewVehicle,
    ) -> Result<Vehicle, AppError> {
        let normalized = plate::normalize(plate_raw);
        if normalized.is_empty() {
            return Err(AppError::Validation("license plate must not be empty".into()));
        }
        let mut inner = self.inner.lock().await;
        let duplicate = inner.vehicles.iter().any(|v| {
            v.building_id == building_id && v.license_plate == normalized && v.is_active
        });
        if duplicate {
            return Err(AppError::Conflict(
                "an active vehicle with this license plate is already registered".into(),
            ));
        }
        let vehicle = Vehicle {
            id: Uuid::new_v4(),
            building_id,
            license_plate: normalized,
            owner_name: attrs.owner_name,
            apartment: attrs.apartment,
            phone: attrs.phone,
            vehicle_type: attrs.vehicle_type,
            vehicle_brand: attrs.vehicle_brand,
            vehicle_color: attrs.vehicle_color,
            is_active: true,
            created_at: Utc::now(),
            updated_at: None,
        };
        inner.vehicles.push(vehicle.clone());
        Ok(vehicle)
    }

    async fn get(&self, building_id: Uuid, plate_raw: &str) -> Result<Option<Vehicle>, AppError> {
        let normalized = plate::normalize(plate_raw);
        let inner = self.inner.lock().await;
        let matches: Vec<&Vehicle> = inner
            .vehicles
            .iter()
            .filter(|v| v.building_id == building_id && v.license_plate == normalized)
            .collect();
        // Active row wins; otherwise the most recently created one.
        Ok(matches
            .iter()
            .rev()
            .find(|v| v.is_active)
            .or_else(|| matches.last())
            .map(|v| (*v).clone()))
    }

    async fn list(
        &self,
        building_id: Uuid,
        skip: i64,
        limit: i64,
        active_only: bool,
    ) -> Result<Vec<Vehicle>, AppError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .vehicles
            .iter()
            .filter(|v| v.building_id == building_id && (!active_only || v.is_active))
            .skip(skip.max(0) as usize)
            .take(clamp_limit(limit, MAX_PAGE_SIZE) as usize)
            .cloned()
            .collect())
    }

    async fn update(
        &self,
        building_id: Uuid,
        plate_raw: &str,
        patch: VehiclePatch,
    ) -> Result<Vehicle, AppError> {
        let normalized = plate::normalize(plate_raw);
        let mut inner = self.inner.lock().await;
        let vehicle = inner
            .vehicles
            .iter_mut()
            .find(|v| {
                v.building_id == building_id && v.license_plate == normalized && v.is_active
            })
            .ok_or(AppError::NotFound("vehicle"))?;
        if let Some(v) = patch.owner_name {
            vehicle.owner_name = Some(v);
        }
        if let Some(v) = patch.apartment {
            vehicle.apartment = Some(v);
        }
        if let Some(v) = patch.phone {
            vehicle.phone = Some(v);
        }
        if let Some(v) = patch.vehicle_type {
            vehicle.vehicle_type = Some(v);
        }
        if let Some(v) = patch.vehicle_brand {
            vehicle.vehicle_brand = Some(v);
        }
        if let Some(v) = patch.vehicle_color {
            vehicle.vehicle_color = Some(v);
        }
        vehicle.updated_at = Some(Utc::now());
        Ok(vehicle.clone())
    }

    async fn deactivate(&self, building_id: Uuid, plate_raw: &str) -> Result<Vehicle, AppError> {
        let normalized = plate::normalize(plate_raw);
        let mut inner = self.inner.lock().await;
        let vehicle = inner
            .vehicles
            .iter_mut()
            .find(|v| {
                v.building_id == building_id && v.license_plate == normalized && v.is_active
            })
            .ok_or(AppError::NotFound("vehicle"))?;
        vehicle.is_active = false;
        vehicle.updated_at = Some(Utc::now());
        Ok(vehicle.clone())
    }
}

#[async_trait]
impl AccessLedger for MemStore {
    async fn record(
        &self,
        building_id: Uuid,
        plate: &str,
        is_authorized: bool,
        confidence: i32,
        image_ref: Option<&str>,
    ) -> Result<AccessLogEntry, AppError> {
        let entry = AccessLogEntry {
            id: Uuid::new_v4(),
            building_id,
            license_plate: plate.to_string(),
            is_authorized,
            confidence,
            image_ref: image_ref.map(String::from),
            accessed_at: Utc::now(),
        };
        self.inner.lock().await.logs.push(entry.clone());
        Ok(entry)
    }

    async fn list(
        &self,
        building_id: Uuid,
        skip: i64,
        limit: i64,
        authorized_only: Option<bool>,
    ) -> Result<Vec<AccessLogEntry>, AppError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .logs
            .iter()
            .rev() // newest first
            .filter(|l| {
                l.building_id == building_id
                    && authorized_only.map_or(true, |want| l.is_authorized == want)
            })
            .skip(skip.max(0) as usize)
            .take(clamp_limit(limit, MAX_PAGE_SIZE) as usize)
            .cloned()
            .collect())
    }

    async fn list_for_plate(
        &self,
        building_id: Uuid,
        plate_raw: &str,
        limit: i64,
    ) -> Result<Vec<AccessLogEntry>, AppError> {
        let normalized = plate::normalize(plate_raw);
        let inner = self.inner.lock().await;
        Ok(inner
            .logs
            .iter()
            .rev()
            .filter(|l| l.building_id == building_id && l.license_plate == normalized)
            .take(clamp_limit(limit, MAX_PLATE_LOG_LIMIT) as usize)
            .cloned()
            .collect())
    }
}

/// Ledger whose append always fails, for exercising storage-failure
/// paths in the verification engine.
pub struct FailingLedger;

#[async_trait]
impl AccessLedger for FailingLedger {
    async fn record(
        &self,
        _building_id: Uuid,
        _plate: &str,
        _is_authorized: bool,
        _confidence: i32,
        _image_ref: Option<&str>,
    ) -> Result<AccessLogEntry, AppError> {
        Err(AppError::Database(sqlx::Error::PoolTimedOut))
    }

    async fn list(
        &self,
        _building_id: Uuid,
        _skip: i64,
        _limit: i64,
        _authorized_only: Option<bool>,
    ) -> Result<Vec<AccessLogEntry>, AppError> {
        Ok(Vec::new())
    }

    async fn list_for_plate(
        &self,
        _building_id: Uuid,
        _plate_raw: &str,
        _limit: i64,
    ) -> Result<Vec<AccessLogEntry>, AppError> {
        Ok(Vec::new())
    }
}

// ── Scripted recognizer ──────────────────────────────────────

pub enum MockOutcome {
    Plate(&'static str, i32),
    NoPlate,
    Fail(&'static str),
}

pub struct MockRecognizer {
    outcome: MockOutcome,
    pub calls: AtomicUsize,
}

impl MockRecognizer {
    pub fn new(outcome: MockOutcome) -> Self {
        Self {
            outcome,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl PlateRecognizer for MockRecognizer {
    async fn recognize(&self, _image: &[u8]) -> Result<Option<PlateObservation>, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.outcome {
            MockOutcome::Plate(p, c) => Ok(Some(PlateObservation {
                plate: p.to_string(),
                confidence: *c,
            })),
            MockOutcome::NoPlate => Ok(None),
            MockOutcome::Fail(msg) => Err(AppError::Recognition(msg.to_string())),
        }
    }
}
