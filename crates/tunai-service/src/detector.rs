//! # Detector Boundary
//!
//! The contract between this service and the external banknote detector.
//!
//! ## Why a Trait
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  The actual recognition runs outside this repository - a remote     │
//! │  generative-AI vision call in production. The service only needs    │
//! │  the shape of the answer:                                           │
//! │                                                                     │
//! │    detect(image) → DetectionEvent { value, confidence, text }       │
//! │                  | DetectionFailure                                 │
//! │                                                                     │
//! │  ScanService is generic over BanknoteDetector, so production wires  │
//! │  in the AI client and tests wire in a scripted stub. Timeouts are   │
//! │  the implementor's concern; a failure always means "do not admit".  │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use std::future::Future;
use thiserror::Error;
use tunai_core::DetectionEvent;

// =============================================================================
// Image Payload
// =============================================================================

/// An uploaded banknote photo, ready for the detector.
#[derive(Debug, Clone)]
pub struct ImagePayload {
    /// Raw image bytes.
    pub data: Vec<u8>,

    /// MIME type, e.g. "image/jpeg".
    pub mime_type: String,
}

impl ImagePayload {
    /// Creates a payload, deriving the MIME type from the file name.
    pub fn from_upload(data: Vec<u8>, file_name: &str) -> Self {
        ImagePayload {
            data,
            mime_type: mime_type_for(file_name).to_string(),
        }
    }
}

/// MIME type by file extension; unknown extensions fall back to JPEG.
pub fn mime_type_for(file_name: &str) -> &'static str {
    let extension = file_name
        .rsplit('.')
        .next()
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match extension.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => "image/jpeg",
    }
}

// =============================================================================
// Detection Failure
// =============================================================================

/// Why a detector call produced no usable denomination.
#[derive(Debug, Error)]
pub enum DetectionFailure {
    /// The image was processed but no valid banknote was recognized.
    #[error("No banknote recognized: {description}")]
    Unrecognized { description: String },

    /// The detector itself could not be reached or errored out.
    #[error("Detector unavailable: {0}")]
    Unavailable(String),
}

// =============================================================================
// Detector Trait
// =============================================================================

/// The external denomination detector.
///
/// Implementations must only return a `DetectionEvent` whose `value` is a
/// real face value; "nothing recognized" is `Unrecognized`, not a zero
/// event. The service still defends against zero values downstream.
pub trait BanknoteDetector: Send + Sync {
    /// Analyzes one banknote photo.
    fn detect(
        &self,
        image: &ImagePayload,
    ) -> impl Future<Output = Result<DetectionEvent, DetectionFailure>> + Send;
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mime_type_mapping() {
        assert_eq!(mime_type_for("uang.jpg"), "image/jpeg");
        assert_eq!(mime_type_for("uang.JPEG"), "image/jpeg");
        assert_eq!(mime_type_for("uang.png"), "image/png");
        assert_eq!(mime_type_for("uang.webp"), "image/webp");
        assert_eq!(mime_type_for("uang.bmp"), "image/jpeg");
        assert_eq!(mime_type_for("no-extension"), "image/jpeg");
    }

    #[test]
    fn test_from_upload() {
        let payload = ImagePayload::from_upload(vec![0xFF, 0xD8], "scan.png");
        assert_eq!(payload.mime_type, "image/png");
        assert_eq!(payload.data.len(), 2);
    }
}
