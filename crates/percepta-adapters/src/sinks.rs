//! Output seams: the object-list sink and the optional debug sink.

use std::sync::{Arc, Mutex};

use percepta_types::{BoundingBox3D, FusedObject, FusedObjectList, PoseStamped, Vec3};

/// Which detection pathway a debug artifact belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionSource {
    Cloud,
    Image,
}

/// Consumer of the fused object list (e.g. an object-list merger node).
pub trait ObjectListSink: Send + Sync {
    /// Hand over one complete, pose-normalized object list.
    ///
    /// Point-cloud payloads are already stripped by the caller; the list is
    /// pose/metadata only.
    fn publish(&self, list: &FusedObjectList);
}

/// Consumer of debug visualizations.  Only driven when debug mode is on.
pub trait DebugSink: Send + Sync {
    /// Extracted point clusters, split by provenance band.
    fn publish_clusters(&self, source: DetectionSource, clusters: &[Vec<Vec3>]);

    /// Axis-aligned bounding boxes of the clusters, split by provenance band.
    fn publish_bounding_boxes(&self, source: DetectionSource, boxes: &[BoundingBox3D]);

    /// Labeled pose array for one provenance band.
    fn publish_pose_array(&self, source: DetectionSource, poses: &[PoseStamped], labels: &[String]);

    /// The support-surface height the run established.
    fn publish_workspace_height(&self, height: f32);
}

/// Hand-off seam towards the external 3-D recognizer: the segmented
/// cloud-band object stubs go out here, and the recognized list comes back
/// through the executor's delivery path.
pub trait CloudListSink: Send + Sync {
    fn publish_for_recognition(&self, objects: &[FusedObject]);
}

// Sinks are often shared between the pipeline and an observer (a test, the
// demo binary), so both traits forward through `Arc`.
impl<S: ObjectListSink + ?Sized> ObjectListSink for Arc<S> {
    fn publish(&self, list: &FusedObjectList) {
        (**self).publish(list);
    }
}

impl<S: DebugSink + ?Sized> DebugSink for Arc<S> {
    fn publish_clusters(&self, source: DetectionSource, clusters: &[Vec<Vec3>]) {
        (**self).publish_clusters(source, clusters);
    }

    fn publish_bounding_boxes(&self, source: DetectionSource, boxes: &[BoundingBox3D]) {
        (**self).publish_bounding_boxes(source, boxes);
    }

    fn publish_pose_array(&self, source: DetectionSource, poses: &[PoseStamped], labels: &[String]) {
        (**self).publish_pose_array(source, poses, labels);
    }

    fn publish_workspace_height(&self, height: f32) {
        (**self).publish_workspace_height(height);
    }
}

impl<S: CloudListSink + ?Sized> CloudListSink for Arc<S> {
    fn publish_for_recognition(&self, objects: &[FusedObject]) {
        (**self).publish_for_recognition(objects);
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Recording sinks
// ────────────────────────────────────────────────────────────────────────────

/// An [`ObjectListSink`] that records every published list.  Used by tests
/// and the demo binary to observe pipeline output.
#[derive(Debug, Default)]
pub struct RecordingSink {
    published: Mutex<Vec<FusedObjectList>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All lists published so far, oldest first.
    pub fn published(&self) -> Vec<FusedObjectList> {
        self.published.lock().expect("sink lock poisoned").clone()
    }
}

impl ObjectListSink for RecordingSink {
    fn publish(&self, list: &FusedObjectList) {
        self.published
            .lock()
            .expect("sink lock poisoned")
            .push(list.clone());
    }
}

/// A [`DebugSink`] that counts what it was handed.
#[derive(Debug, Default)]
pub struct RecordingDebugSink {
    pose_arrays: Mutex<Vec<(DetectionSource, usize)>>,
    bounding_boxes: Mutex<Vec<(DetectionSource, usize)>>,
    workspace_heights: Mutex<Vec<f32>>,
}

impl RecordingDebugSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// `(band, pose count)` per pose-array publication, oldest first.
    pub fn pose_arrays(&self) -> Vec<(DetectionSource, usize)> {
        self.pose_arrays.lock().expect("sink lock poisoned").clone()
    }

    /// `(band, box count)` per bounding-box publication, oldest first.
    pub fn bounding_boxes(&self) -> Vec<(DetectionSource, usize)> {
        self.bounding_boxes
            .lock()
            .expect("sink lock poisoned")
            .clone()
    }

    pub fn workspace_heights(&self) -> Vec<f32> {
        self.workspace_heights
            .lock()
            .expect("sink lock poisoned")
            .clone()
    }
}

impl DebugSink for RecordingDebugSink {
    fn publish_clusters(&self, _source: DetectionSource, _clusters: &[Vec<Vec3>]) {}

    fn publish_bounding_boxes(&self, source: DetectionSource, boxes: &[BoundingBox3D]) {
        self.bounding_boxes
            .lock()
            .expect("sink lock poisoned")
            .push((source, boxes.len()));
    }

    fn publish_pose_array(
        &self,
        source: DetectionSource,
        poses: &[PoseStamped],
        _labels: &[String],
    ) {
        self.pose_arrays
            .lock()
            .expect("sink lock poisoned")
            .push((source, poses.len()));
    }

    fn publish_workspace_height(&self, height: f32) {
        self.workspace_heights
            .lock()
            .expect("sink lock poisoned")
            .push(height);
    }
}

/// A [`CloudListSink`] that records every hand-off.
#[derive(Debug, Default)]
pub struct RecordingCloudListSink {
    handed_off: Mutex<Vec<Vec<FusedObject>>>,
}

impl RecordingCloudListSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every list handed off for recognition, oldest first.
    pub fn handed_off(&self) -> Vec<Vec<FusedObject>> {
        self.handed_off.lock().expect("sink lock poisoned").clone()
    }
}

impl CloudListSink for RecordingCloudListSink {
    fn publish_for_recognition(&self, objects: &[FusedObject]) {
        self.handed_off
            .lock()
            .expect("sink lock poisoned")
            .push(objects.to_vec());
    }
}
