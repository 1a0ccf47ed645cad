//! Recognition adapter boundary: image bytes in, zero-or-one plate out.
//!
//! The actual detection+OCR pipeline is an external capability behind
//! [`PlateRecognizer`]. "No plate visible" is a successful `None`;
//! "could not process the image" is `AppError::Recognition`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;

pub mod http;

pub use http::HttpAlpr;

/// One recognized plate with the detector/OCR confidence (0–100).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlateObservation {
    pub plate: String,
    pub confidence: i32,
}

#[async_trait]
pub trait PlateRecognizer: Send + Sync {
    async fn recognize(&self, image: &[u8]) -> Result<Option<PlateObservation>, AppError>;
}
