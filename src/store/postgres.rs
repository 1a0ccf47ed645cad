use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::{constant_time_eq, generate_api_token};
use crate::errors::AppError;
use crate::models::{plate, AccessLogEntry, Building, NewVehicle, Vehicle, VehiclePatch};
use crate::registry::{
    clamp_limit, AccessLedger, TenantRegistry, VehicleRegistry, MAX_PAGE_SIZE,
    MAX_PLATE_LOG_LIMIT,
};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPool::connect(database_url).await?;
        Ok(Self { pool })
    }

    /// Build a store without opening a connection; the pool connects on
    /// first use.
    pub fn connect_lazy(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPool::connect_lazy(database_url)?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run pending migrations from the migrations/ directory.
    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

const BUILDING_COLS: &str = "id, name, address, api_token, is_active, created_at";

const VEHICLE_COLS: &str = "id, building_id, license_plate, owner_name, apartment, phone, \
     vehicle_type, vehicle_brand, vehicle_color, is_active, created_at, updated_at";

const LOG_COLS: &str = "id, building_id, license_plate, is_authorized, confidence, image_ref, accessed_at";

#[async_trait]
impl TenantRegistry for PgStore {
    async fn create_building(
        &self,
        name: &str,
        address: Option<&str>,
    ) -> Result<Building, AppError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::Validation("building name must not be empty".into()));
        }

        let building = sqlx::query_as::<_, Building>(&format!(
            "INSERT INTO buildings (name, address, api_token) VALUES ($1, $2, $3) RETURNING {}",
            BUILDING_COLS
        ))
        .bind(name)
        .bind(address)
        .bind(generate_api_token())
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(building_id = %building.id, "building created");
        Ok(building)
    }

    async fn list_buildings(&self) -> Result<Vec<Building>, AppError> {
        let rows = sqlx::query_as::<_, Building>(&format!(
            "SELECT {} FROM buildings ORDER BY created_at ASC, id ASC",
            BUILDING_COLS
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn rotate_token(&self, building_id: Uuid) -> Result<Building, AppError> {
        // Single UPDATE: readers see either the old or the new token,
        // never an intermediate state.
        let building = sqlx::query_as::<_, Building>(&format!(
            "UPDATE buildings SET api_token = $2 WHERE id = $1 RETURNING {}",
            BUILDING_COLS
        ))
        .bind(building_id)
        .bind(generate_api_token())
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::NotFound("building"))?;

        tracing::info!(building_id = %building.id, "building token rotated");
        Ok(building)
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<Building>, AppError> {
        // Scan every active building and compare in constant time, with
        // no early exit, so lookup latency is independent of which (if
        // any) token matched.
        let candidates = sqlx::query_as::<_, Building>(&format!(
            "SELECT {} FROM buildings WHERE is_active = true",
            BUILDING_COLS
        ))
        .fetch_all(&self.pool)
        .await?;

        let mut found = None;
        for building in candidates {
            if constant_time_eq(&building.api_token, token) {
                found = Some(building);
            }
        }
        Ok(found)
    }
}

#[async_trait]
impl VehicleRegistry for PgStore {
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

        // Plain insert: the partial unique index on active plates decides
        // concurrent duplicates, so at most one racing caller wins.
        let vehicle = sqlx::query_as::<_, Vehicle>(&format!(
            r#"INSERT INTO vehicles
                   (building_id, license_plate, owner_name, apartment, phone,
                    vehicle_type, vehicle_brand, vehicle_color)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
               RETURNING {}"#,
            VEHICLE_COLS
        ))
        .bind(building_id)
        .bind(&normalized)
        .bind(&attrs.owner_name)
        .bind(&attrs.apartment)
        .bind(&attrs.phone)
        .bind(&attrs.vehicle_type)
        .bind(&attrs.vehicle_brand)
        .bind(&attrs.vehicle_color)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::conflict_on_unique(
                e,
                "an active vehicle with this license plate is already registered",
            )
        })?;

        Ok(vehicle)
    }

    async fn get(&self, building_id: Uuid, plate_raw: &str) -> Result<Option<Vehicle>, AppError> {
        let normalized = plate::normalize(plate_raw);
        let vehicle = sqlx::query_as::<_, Vehicle>(&format!(
            r#"SELECT {} FROM vehicles
               WHERE building_id = $1 AND license_plate = $2
               ORDER BY is_active DESC, created_at DESC
               LIMIT 1"#,
            VEHICLE_COLS
        ))
        .bind(building_id)
        .bind(&normalized)
        .fetch_optional(&self.pool)
        .await?;
        Ok(vehicle)
    }

    async fn list(
        &self,
        building_id: Uuid,
        skip: i64,
        limit: i64,
        active_only: bool,
    ) -> Result<Vec<Vehicle>, AppError> {
        let rows = sqlx::query_as::<_, Vehicle>(&format!(
            r#"SELECT {} FROM vehicles
               WHERE building_id = $1 AND ($2::bool = false OR is_active = true)
               ORDER BY created_at ASC, id ASC
               OFFSET $3 LIMIT $4"#,
            VEHICLE_COLS
        ))
        .bind(building_id)
        .bind(active_only)
        .bind(skip.max(0))
        .bind(clamp_limit(limit, MAX_PAGE_SIZE))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn update(
        &self,
        building_id: Uuid,
        plate_raw: &str,
        patch: VehiclePatch,
    ) -> Result<Vehicle, AppError> {
        let normalized = plate::normalize(plate_raw);
        let vehicle = sqlx::query_as::<_, Vehicle>(&format!(
            r#"UPDATE vehicles
               SET owner_name    = COALESCE($3, owner_name),
                   apartment     = COALESCE($4, apartment),
                   phone         = COALESCE($5, phone),
                   vehicle_type  = COALESCE($6, vehicle_type),
                   vehicle_brand = COALESCE($7, vehicle_brand),
                   vehicle_color = COALESCE($8, vehicle_color),
                   updated_at    = NOW()
               WHERE building_id = $1 AND license_plate = $2 AND is_active = true
               RETURNING {}"#,
            VEHICLE_COLS
        ))
        .bind(building_id)
        .bind(&normalized)
        .bind(&patch.owner_name)
        .bind(&patch.apartment)
        .bind(&patch.phone)
        .bind(&patch.vehicle_type)
        .bind(&patch.vehicle_brand)
        .bind(&patch.vehicle_color)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::NotFound("vehicle"))?;
        Ok(vehicle)
    }

    async fn deactivate(&self, building_id: Uuid, plate_raw: &str) -> Result<Vehicle, AppError> {
        let normalized = plate::normalize(plate_raw);
        let vehicle = sqlx::query_as::<_, Vehicle>(&format!(
            r#"UPDATE vehicles
               SET is_active = false, updated_at = NOW()
               WHERE building_id = $1 AND license_plate = $2 AND is_active = true
               RETURNING {}"#,
            VEHICLE_COLS
        ))
        .bind(building_id)
        .bind(&normalized)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::NotFound("vehicle"))?;
        Ok(vehicle)
    }
}

#[async_trait]
impl AccessLedger for PgStore {
    async fn record(
        &self,
        building_id: Uuid,
        plate: &str,
        is_authorized: bool,
        confidence: i32,
        image_ref: Option<&str>,
    ) -> Result<AccessLogEntry, AppError> {
        let entry = sqlx::query_as::<_, AccessLogEntry>(&format!(
            r#"INSERT INTO access_logs
                   (building_id, license_plate, is_authorized, confidence, image_ref)
               VALUES ($1, $2, $3, $4, $5)
               RETURNING {}"#,
            LOG_COLS
        ))
        .bind(building_id)
        .bind(plate)
        .bind(is_authorized)
        .bind(confidence)
        .bind(image_ref)
        .fetch_one(&self.pool)
        .await?;
        Ok(entry)
    }

    async fn list(
        &self,
        building_id: Uuid,
        skip: i64,
        limit: i64,
        authorized_only: Option<bool>,
    ) -> Result<Vec<AccessLogEntry>, AppError> {
        let rows = sqlx::query_as::<_, AccessLogEntry>(&format!(
            r#"SELECT {} FROM access_logs
               WHERE building_id = $1 AND ($2::bool IS NULL OR is_authorized = $2)
               ORDER BY accessed_at DESC, id DESC
               OFFSET $3 LIMIT $4"#,
            LOG_COLS
        ))
        .bind(building_id)
        .bind(authorized_only)
        .bind(skip.max(0))
        .bind(clamp_limit(limit, MAX_PAGE_SIZE))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn list_for_plate(
        &self,
        building_id: Uuid,
        plate_raw: &str,
        limit: i64,
    ) -> Result<Vec<AccessLogEntry>, AppError> {
        // The engine records plates already normalized, so an equality
        // match against the normalized query is the normalized match.
        let normalized = plate::normalize(plate_raw);
        let rows = sqlx::query_as::<_, AccessLogEntry>(&format!(
            r#"SELECT {} FROM access_logs
               WHERE building_id = $1 AND license_plate = $2
               ORDER BY accessed_at DESC, id DESC
               LIMIT $3"#,
            LOG_COLS
        ))
        .bind(building_id)
        .bind(&normalized)
        .bind(clamp_limit(limit, MAX_PLATE_LOG_LIMIT))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
