//! In-process stub collaborators for headless tests and CI.
//!
//! The stubs return scripted results and record how they were driven, so
//! the full pipeline can run without PCL, a GPU or a TF tree.
//!
//! # Example
//!
//! ```rust
//! use percepta_adapters::sim::SimRecognizer;
//! use percepta_adapters::ImageRecognizer;
//! use percepta_types::{CameraImage, Detection2D, Roi};
//! # use chrono::Utc;
//!
//! let recognizer = SimRecognizer::new(vec![Detection2D {
//!     class_name: "M20".to_string(),
//!     confidence: 0.93,
//!     roi: Roi { x: 10, y: 10, width: 40, height: 30 },
//! }]);
//!
//! let image = CameraImage { width: 640, height: 480, data: vec![], stamp: Utc::now() };
//! assert_eq!(recognizer.infer(&image).unwrap().len(), 1);
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};

use percepta_types::{CameraImage, Detection2D, OrganizedCloud, RecogError};

use crate::recognizer::ImageRecognizer;
use crate::segmenter::{SceneSegmenter, Segmentation};

// ────────────────────────────────────────────────────────────────────────────
// Stub segmenter
// ────────────────────────────────────────────────────────────────────────────

/// A simulated 3-D segmenter that returns a scripted [`Segmentation`] and
/// counts how often it was accumulated and reset.
#[derive(Debug, Default)]
pub struct SimSegmenter {
    result: Segmentation,
    accumulated: usize,
    resets: usize,
    id_resets: usize,
}

impl SimSegmenter {
    /// Segmenter that produces nothing (no clusters, no workspace height).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Segmenter that returns `result` on every [`SceneSegmenter::segment`].
    pub fn with_result(result: Segmentation) -> Self {
        Self {
            result,
            ..Self::default()
        }
    }

    pub fn accumulated(&self) -> usize {
        self.accumulated
    }

    pub fn resets(&self) -> usize {
        self.resets
    }

    pub fn id_resets(&self) -> usize {
        self.id_resets
    }
}

impl SceneSegmenter for SimSegmenter {
    fn accumulate(&mut self, _cloud: &OrganizedCloud) {
        self.accumulated += 1;
    }

    fn segment(&mut self) -> Result<Segmentation, RecogError> {
        Ok(self.result.clone())
    }

    fn reset_accumulation(&mut self) {
        self.accumulated = 0;
        self.resets += 1;
    }

    fn reset_id_counter(&mut self) {
        self.id_resets += 1;
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Stub recognizer
// ────────────────────────────────────────────────────────────────────────────

/// A simulated 2-D detector that returns a scripted detection list and
/// counts its invocations.
#[derive(Debug, Default)]
pub struct SimRecognizer {
    detections: Vec<Detection2D>,
    fail: bool,
    calls: AtomicUsize,
}

impl SimRecognizer {
    pub fn new(detections: Vec<Detection2D>) -> Self {
        Self {
            detections,
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    /// A recognizer whose every inference fails.
    pub fn failing() -> Self {
        Self {
            detections: Vec::new(),
            fail: true,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ImageRecognizer for SimRecognizer {
    fn infer(&self, _image: &CameraImage) -> Result<Vec<Detection2D>, RecogError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(RecogError::Inference("simulated failure".to_string()));
        }
        Ok(self.detections.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn image() -> CameraImage {
        CameraImage {
            width: 4,
            height: 4,
            data: vec![0u8; 4 * 4 * 3],
            stamp: Utc::now(),
        }
    }

    #[test]
    fn sim_segmenter_counts_accumulation() {
        let mut seg = SimSegmenter::empty();
        let cloud = OrganizedCloud {
            width: 1,
            height: 1,
            points: vec![None],
            frame_id: "base_link".to_string(),
            stamp: Utc::now(),
        };
        seg.accumulate(&cloud);
        seg.accumulate(&cloud);
        assert_eq!(seg.accumulated(), 2);
        seg.reset_accumulation();
        assert_eq!(seg.accumulated(), 0);
        assert_eq!(seg.resets(), 1);
    }

    #[test]
    fn sim_recognizer_returns_script() {
        let recognizer = SimRecognizer::new(vec![]);
        assert!(recognizer.infer(&image()).unwrap().is_empty());
        assert_eq!(recognizer.calls(), 1);
    }

    #[test]
    fn failing_recognizer_errors() {
        let recognizer = SimRecognizer::failing();
        assert!(matches!(
            recognizer.infer(&image()),
            Err(RecogError::Inference(_))
        ));
    }
}
