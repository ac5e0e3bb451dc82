//! Seam to the 3-D geometric segmenter.
//!
//! The segmentation algorithm itself (support-plane extraction, Euclidean
//! clustering) is an external collaborator.  The core only relies on the
//! contract below: scans are accumulated across a run, segmented once, and
//! the accumulation is reset when the run's transient state is cleared.

use percepta_types::{Detection3D, FusedObject, OrganizedCloud, RecogError};

/// Everything one segmentation pass produces.
#[derive(Debug, Clone, Default)]
pub struct Segmentation {
    /// Point clusters with their bounding boxes, one per segmented object.
    pub clusters: Vec<Detection3D>,
    /// Cloud-band object stubs (provenance ids below the image band) ready
    /// to be handed to an external cloud recognizer.
    pub object_list: Vec<FusedObject>,
    /// Estimated height of the flat support surface, when a plane was found.
    ///
    /// `None` means the height could not be established for this run and no
    /// z-position rewrite may use it.
    pub workspace_height: Option<f32>,
}

/// The 3-D segmentation collaborator.
pub trait SceneSegmenter: Send {
    /// Add a preprocessed scan to the run's accumulation buffer.
    fn accumulate(&mut self, cloud: &OrganizedCloud);

    /// Segment the accumulated scans.
    ///
    /// # Errors
    ///
    /// Returns [`RecogError::Segmentation`] when the collaborator cannot
    /// produce a result at all; this aborts the run.
    fn segment(&mut self) -> Result<Segmentation, RecogError>;

    /// Drop the accumulation buffer.  Called when a run clears its
    /// transient state.
    fn reset_accumulation(&mut self);

    /// Reset the segmenter's internal cloud-band id counter.  Called at the
    /// end of every run and at lifecycle boundaries; cloud-band ids never
    /// carry over between runs.
    fn reset_id_counter(&mut self);
}
