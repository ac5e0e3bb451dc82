//! Seam to the 2-D visual detector.

use percepta_types::{CameraImage, Detection2D, RecogError};

/// The 2-D detection collaborator (e.g. a YOLO-family network).
pub trait ImageRecognizer: Send + Sync {
    /// Run inference on a camera frame and return one entry per detection.
    ///
    /// # Errors
    ///
    /// Returns [`RecogError::Inference`] when the detector cannot process
    /// the frame (malformed encoding, model not loaded, ...).  The caller
    /// decides whether to degrade or abort; the reference pipeline degrades
    /// to an empty detection list.
    fn infer(&self, image: &CameraImage) -> Result<Vec<Detection2D>, RecogError>;
}
