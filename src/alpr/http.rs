//! HTTP client for the ALPR inference sidecar.
//!
//! Sidecar contract:
//! - `POST /v1/warmup`: loads the detector and OCR model weights; 200
//!   once ready. Called once per process, single-flight.
//! - `POST /v1/recognize`: raw image bytes in, JSON out:
//!   `{"plate": "ABC123" | null, "confidence": 0.0..1.0}`.
//!   422 when the image cannot be decoded.

use std::time::Duration;

use serde::Deserialize;
use tokio::sync::OnceCell;

use super::{PlateObservation, PlateRecognizer};
use crate::errors::AppError;

pub struct HttpAlpr {
    base_url: String,
    client: reqwest::Client,
    // Warmup is the expensive part (model weights). Concurrent first
    // callers block on one warmup; a failure propagates to all waiters
    // and the next call tries again; never cached as success.
    warmed: OnceCell<()>,
}

#[derive(Debug, Deserialize)]
struct RecognizeResponse {
    plate: Option<String>,
    #[serde(default)]
    confidence: f64,
}

impl HttpAlpr {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .use_rustls_tls()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(5))
            .build()
            .expect("failed to build HTTP client");

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            warmed: OnceCell::new(),
        }
    }

    async fn ensure_warm(&self) -> Result<(), AppError> {
        self.warmed
            .get_or_try_init(|| async {
                tracing::info!("warming up ALPR sidecar at {}", self.base_url);
                let resp = self
                    .client
                    .post(format!("{}/v1/warmup", self.base_url))
                    .send()
                    .await
                    .map_err(|e| AppError::Recognition(format!("ALPR warmup failed: {}", e)))?;
                if !resp.status().is_success() {
                    return Err(AppError::Recognition(format!(
                        "ALPR warmup failed with status {}",
                        resp.status()
                    )));
                }
                tracing::info!("ALPR sidecar ready");
                Ok(())
            })
            .await
            .map(|_| ())
    }
}

#[async_trait::async_trait]
impl PlateRecognizer for HttpAlpr {
    async fn recognize(&self, image: &[u8]) -> Result<Option<PlateObservation>, AppError> {
        self.ensure_warm().await?;

        let resp = self
            .client
            .post(format!("{}/v1/recognize", self.base_url))
            .header("content-type", "application/octet-stream")
            .body(image.to_vec())
            .send()
            .await
            .map_err(|e| AppError::Recognition(format!("ALPR request failed: {}", e)))?;

        let status = resp.status();
        if !status.is_success() {
            let detail = resp.text().await.unwrap_or_default();
            return Err(AppError::Recognition(format!(
                "ALPR sidecar returned {}: {}",
                status, detail
            )));
        }

        let body: RecognizeResponse = resp
            .json()
            .await
            .map_err(|e| AppError::Recognition(format!("invalid ALPR response: {}", e)))?;

        Ok(body.plate.map(|plate| PlateObservation {
            plate,
            confidence: (body.confidence * 100.0).round().clamp(0.0, 100.0) as i32,
        }))
    }
}
