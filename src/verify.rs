//! Verification engine: ties recognition to an authorization decision
//! and guarantees exactly one ledger entry per completed verification.

use serde::Serialize;

use crate::alpr::PlateRecognizer;
use crate::errors::AppError;
use crate::models::access_log::NO_PLATE;
use crate::models::{plate, Building};
use crate::registry::{AccessLedger, VehicleRegistry};

#[derive(Debug, Clone, Serialize)]
pub struct VerifyOutcome {
    /// Normalized recognized plate; `None` when nothing was detected.
    pub license_plate: Option<String>,
    pub is_authorized: bool,
    pub confidence: i32,
    /// Populated only when authorized. An unauthorized response must not
    /// reveal who a plate would have matched.
    pub owner_name: Option<String>,
    pub apartment: Option<String>,
}

/// Run one verification for `building`.
///
/// A `Recognition` error propagates without touching the ledger, since
/// no authorization decision was made. Every completed recognition, plate
/// or not, appends exactly one ledger entry before this returns; a
/// ledger failure fails the whole call rather than report an unlogged
/// decision.
pub async fn verify(
    recognizer: &dyn PlateRecognizer,
    vehicles: &dyn VehicleRegistry,
    ledger: &dyn AccessLedger,
    building: &Building,
    image: &[u8],
) -> Result<VerifyOutcome, AppError> {
    let observation = recognizer.recognize(image).await?;

    let normalized = observation
        .as_ref()
        .map(|obs| plate::normalize(&obs.plate))
        .filter(|p| !p.is_empty());

    let Some(normalized) = normalized else {
        ledger.record(building.id, NO_PLATE, false, 0, None).await?;
        tracing::info!(building_id = %building.id, "verification: no plate detected");
        return Ok(VerifyOutcome {
            license_plate: None,
            is_authorized: false,
            confidence: 0,
            owner_name: None,
            apartment: None,
        });
    };

    let confidence = observation.map(|obs| obs.confidence).unwrap_or(0);

    // Active vehicles of this building only, never across tenants.
    let vehicle = vehicles
        .get(building.id, &normalized)
        .await?
        .filter(|v| v.is_active);
    let is_authorized = vehicle.is_some();

    ledger
        .record(building.id, &normalized, is_authorized, confidence, None)
        .await?;

    tracing::info!(
        building_id = %building.id,
        plate = %normalized,
        authorized = is_authorized,
        confidence,
        "verification recorded"
    );

    let (owner_name, apartment) = match vehicle {
        Some(v) => (v.owner_name, v.apartment),
        None => (None, None),
    };

    Ok(VerifyOutcome {
        license_plate: Some(normalized),
        is_authorized,
        confidence,
        owner_name,
        apartment,
    })
}
