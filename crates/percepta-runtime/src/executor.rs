//! [`GoalExecutor`] – the single-flight detection state machine.
//!
//! At most one detection run is active system-wide.  Admission and lock
//! acquisition are a single atomic `try_lock` on the sensor cache (see
//! [`SensorStreamCache`]); the returned guard lives for the entire run and
//! is released on every exit path.
//!
//! # State machine
//!
//! `Idle → Admitted → Running → Idle`, on success and on failure alike.
//! A submit is rejected with `Busy` when the lock is held and with `NoData`
//! when the cache holds no confirmed frame.  An admitted run executes on a
//! detached task and reports its outcome through the returned channel.
//!
//! # Pipeline
//!
//! preprocess → accumulate + segment → infer → fuse → envelope filter →
//! normalize → publish → optional debug publish → clear transient state.
//!
//! Only whole-run-fatal conditions (busy, no data, preprocessing transform
//! failure, segmentation failure) abort; every per-object condition
//! degrades that object to a decoy and the run continues.

use std::collections::HashSet;
use std::sync::{Arc, Mutex as StdMutex};

use tokio::sync::{oneshot, Mutex};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use percepta_adapters::{
    CloudListSink, DebugSink, DetectionSource, ImageRecognizer, ObjectListSink, SceneSegmenter,
    Segmentation, TransformProvider,
};
use percepta_fusion::{
    FusionEngine, FusionInput, ObjectCatalog, PoseNormalizer, RegionOfInterestFilter,
};
use percepta_types::{
    BoundingBox3D, Detection2D, DetectionGoal, FailureReason, FusedObject, FusedObjectList,
    GoalOutcome, PoseStamped, SensorFrame, Vec3,
};

use crate::cache::{FrameGuard, SensorStreamCache};
use crate::config::RecognitionConfig;
use crate::slot::SingleAssignSlot;

// ────────────────────────────────────────────────────────────────────────────
// Collaborators
// ────────────────────────────────────────────────────────────────────────────

/// The external collaborators one executor drives.
pub struct Collaborators {
    pub segmenter: Box<dyn SceneSegmenter>,
    pub recognizer: Box<dyn ImageRecognizer>,
    pub transforms: Box<dyn TransformProvider>,
    pub sink: Box<dyn ObjectListSink>,
    /// Where the segmented cloud-band stubs go for external recognition.
    /// Only driven when the cloud recognizer is enabled.
    pub cloud_sink: Option<Box<dyn CloudListSink>>,
    pub debug_sink: Option<Box<dyn DebugSink>>,
}

// ────────────────────────────────────────────────────────────────────────────
// GoalExecutor
// ────────────────────────────────────────────────────────────────────────────

/// Shared executor handle.  Clone it cheaply; all clones drive one pipeline.
#[derive(Clone)]
pub struct GoalExecutor {
    inner: Arc<Inner>,
}

struct Inner {
    config: RecognitionConfig,
    cache: SensorStreamCache,
    /// Externally-recognized cloud list for the current run; first writer
    /// wins, duplicates are discarded.
    cloud_list: SingleAssignSlot<Vec<FusedObject>>,
    /// Goal ids cancelled before their admission completed.
    cancelled: StdMutex<HashSet<Uuid>>,
    /// Mutated only while the run lock is held, so these mutexes are never
    /// contended; they exist to make the state shareable with the detached
    /// run task.
    engine: Mutex<FusionEngine>,
    segmenter: Mutex<Box<dyn SceneSegmenter>>,
    recognizer: Box<dyn ImageRecognizer>,
    transforms: Box<dyn TransformProvider>,
    roi_filter: RegionOfInterestFilter,
    normalizer: PoseNormalizer,
    sink: Box<dyn ObjectListSink>,
    cloud_sink: Option<Box<dyn CloudListSink>>,
    debug_sink: Option<Box<dyn DebugSink>>,
}

impl GoalExecutor {
    pub fn new(
        config: RecognitionConfig,
        catalog: Arc<ObjectCatalog>,
        collaborators: Collaborators,
    ) -> Self {
        let engine = FusionEngine::new(catalog.clone(), config.rgb.clone());
        let roi_filter = RegionOfInterestFilter::new(config.roi_filter);
        let normalizer = PoseNormalizer::new(catalog, config.normalizer);
        Self {
            inner: Arc::new(Inner {
                config,
                cache: SensorStreamCache::new(),
                cloud_list: SingleAssignSlot::new(),
                cancelled: StdMutex::new(HashSet::new()),
                engine: Mutex::new(engine),
                segmenter: Mutex::new(collaborators.segmenter),
                recognizer: collaborators.recognizer,
                transforms: collaborators.transforms,
                roi_filter,
                normalizer,
                sink: collaborators.sink,
                cloud_sink: collaborators.cloud_sink,
                debug_sink: collaborators.debug_sink,
            }),
        }
    }

    /// Sensor-stream ingestion path.  Never blocks; the frame is dropped
    /// when a run holds the exclusive lock.
    pub fn offer_frame(&self, frame: SensorFrame) -> bool {
        self.inner.cache.offer(frame)
    }

    /// Delivery path for the external cloud recognizer.  The first list per
    /// run wins; later deliveries are observed and discarded.
    pub fn offer_cloud_list(&self, objects: Vec<FusedObject>) -> bool {
        info!(count = objects.len(), "received recognized cloud list");
        let stored = self.inner.cloud_list.offer(objects);
        if !stored {
            debug!("cloud list already populated for this run, discarding");
        }
        stored
    }

    /// Submit a detection goal.
    ///
    /// Admission is decided synchronously and atomically with the lock
    /// acquisition; the run itself executes on a detached task.  The
    /// returned channel yields the terminal [`GoalOutcome`]; for rejected
    /// goals it resolves immediately.
    pub fn submit(&self, goal: DetectionGoal) -> oneshot::Receiver<GoalOutcome> {
        let (tx, rx) = oneshot::channel();

        if let Some(name) = goal.object_name.as_deref() {
            info!(workstation = %goal.workstation, object = name, "received detection goal");
        } else {
            info!(workstation = %goal.workstation, "received detection goal");
        }

        if self.take_cancellation(&goal.id) {
            warn!("goal was cancelled before admission completed");
            let _ = tx.send(GoalOutcome::failed(FailureReason::Cancelled));
            return rx;
        }

        // Busy check and lock acquisition are one atomic step.
        let Some(guard) = self.inner.cache.try_acquire() else {
            warn!("skipping goal: a previous goal is still processing data");
            let _ = tx.send(GoalOutcome::failed(FailureReason::Busy));
            return rx;
        };

        let Some(frame) = guard.frame().cloned() else {
            warn!("skipping goal: no data has been received yet");
            let _ = tx.send(GoalOutcome::failed(FailureReason::NoData));
            return rx; // guard drops here, lock released
        };

        info!("goal admitted, locking data");
        let inner = self.inner.clone();
        tokio::spawn(async move {
            let outcome = inner.run(goal, frame, guard).await;
            let _ = tx.send(outcome);
        });
        rx
    }

    /// Request cancellation of a goal.  Advisory only: a running pipeline
    /// is never preempted; the request takes effect only when it arrives
    /// before the goal's admission completes.
    pub fn cancel(&self, goal_id: Uuid) {
        info!(%goal_id, "received request to cancel goal");
        self.inner
            .cancelled
            .lock()
            .expect("cancel set poisoned")
            .insert(goal_id);
    }

    /// Lifecycle reconfiguration boundary: rewind the image-band provenance
    /// counter, the segmenter's id counter and all run-scoped buffers.
    /// Never invoked implicitly.
    pub async fn reset_lifecycle(&self) {
        info!("lifecycle reset: rewinding provenance ids and clearing buffers");
        self.inner.engine.lock().await.reset_ids();
        let mut segmenter = self.inner.segmenter.lock().await;
        segmenter.reset_id_counter();
        segmenter.reset_accumulation();
        self.inner.cloud_list.clear();
    }

    fn take_cancellation(&self, goal_id: &Uuid) -> bool {
        self.inner
            .cancelled
            .lock()
            .expect("cancel set poisoned")
            .remove(goal_id)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// The pipeline run
// ────────────────────────────────────────────────────────────────────────────

impl Inner {
    /// Execute one full pipeline pass while holding the exclusive guard.
    async fn run(
        &self,
        goal: DetectionGoal,
        frame: SensorFrame,
        mut guard: FrameGuard,
    ) -> GoalOutcome {
        let outcome = self.recognize(&goal, &frame).await;

        // Clear per-run transient state on every path out of Running.  The
        // cloud-band id counter restarts with every run; only the image-band
        // counter survives until an explicit lifecycle reset.
        {
            let mut segmenter = self.segmenter.lock().await;
            segmenter.reset_accumulation();
            segmenter.reset_id_counter();
        }
        self.cloud_list.clear();
        guard.clear();

        match outcome {
            Ok(()) => {
                info!(workstation = %goal.workstation, "goal succeeded");
                GoalOutcome::succeeded()
            }
            Err(reason) => GoalOutcome::failed(reason),
        }
    }

    async fn recognize(
        &self,
        goal: &DetectionGoal,
        frame: &SensorFrame,
    ) -> Result<(), FailureReason> {
        let target = &self.config.target_frame_id;

        // Preprocess: the whole scan must reach the target frame or the
        // run is aborted with no partial publish.
        let cloud = match self.transforms.transform_cloud(&frame.cloud, target) {
            Ok(cloud) => cloud,
            Err(e) => {
                error!(
                    source_frame = %frame.cloud.frame_id,
                    target_frame = %target,
                    error = %e,
                    "unable to transform the scan; check the frame configuration"
                );
                return Err(FailureReason::Transform);
            }
        };

        // Segment the accumulated scans.
        let mut segmenter = self.segmenter.lock().await;
        segmenter.accumulate(&cloud);
        let segmentation = match segmenter.segment() {
            Ok(seg) => seg,
            Err(e) => {
                error!(error = %e, "segmentation failed");
                return Err(FailureReason::Segmentation);
            }
        };
        drop(segmenter);

        if self.config.enable_cloud_recognizer && !segmentation.object_list.is_empty() {
            info!(
                count = segmentation.object_list.len(),
                "handing segmented cloud list to the external recognizer"
            );
            if let Some(sink) = self.cloud_sink.as_ref() {
                sink.publish_for_recognition(&segmentation.object_list);
            } else {
                warn!("cloud recognizer enabled but no hand-off sink is wired");
            }
        }

        // 2-D pathway.  An inference failure degrades to an empty list;
        // the run still completes on the 3-D pathway alone.
        let detections: Vec<Detection2D> = if self.config.enable_rgb_recognizer {
            info!("performing rgb recognition");
            match self.recognizer.infer(&frame.image) {
                Ok(detections) => detections,
                Err(e) => {
                    warn!(error = %e, "image inference failed, continuing without 2-D detections");
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };

        // Whatever the external cloud recognizer delivered for this run.
        let cloud_objects = self.cloud_list.take().unwrap_or_default();

        let mut engine = self.engine.lock().await;
        let mut list = engine.fuse(FusionInput {
            cloud_objects,
            detections: &detections,
            cloud: &cloud,
            target_frame: target,
            transforms: self.transforms.as_ref(),
            workstation: &goal.workstation,
        });
        drop(engine);

        if list.objects.is_empty() {
            warn!("no object detected to publish");
            return Ok(());
        }

        self.roi_filter.apply(&mut list);
        self.normalizer
            .normalize(&mut list, segmentation.workspace_height);
        self.publish(&list);

        if self.config.debug_mode {
            self.publish_debug(&list, &segmentation);
        }
        Ok(())
    }

    /// Emit the list with the point-cloud payload stripped; the output is
    /// pose/metadata only.
    fn publish(&self, list: &FusedObjectList) {
        let mut stripped = list.clone();
        for object in stripped.objects.iter_mut() {
            object.view = None;
        }
        info!(
            count = stripped.objects.len(),
            workstation = %stripped.workstation,
            "publishing fused object list"
        );
        self.sink.publish(&stripped);
    }

    fn publish_debug(&self, list: &FusedObjectList, segmentation: &Segmentation) {
        let Some(sink) = self.debug_sink.as_ref() else {
            return;
        };
        warn!("debug mode: publishing object information");

        if let Some(height) = segmentation.workspace_height {
            sink.publish_workspace_height(height);
        }

        let cloud_clusters: Vec<_> = segmentation
            .clusters
            .iter()
            .map(|c| c.points.clone())
            .collect();
        if !cloud_clusters.is_empty() {
            sink.publish_clusters(DetectionSource::Cloud, &cloud_clusters);
            let boxes: Vec<BoundingBox3D> =
                segmentation.clusters.iter().map(|c| c.bounding_box).collect();
            sink.publish_bounding_boxes(DetectionSource::Cloud, &boxes);
        }
        let image_clusters: Vec<_> = list
            .objects
            .iter()
            .filter(|o| o.id.is_image_band())
            .filter_map(|o| o.view.clone())
            .collect();
        if !image_clusters.is_empty() {
            let boxes: Vec<BoundingBox3D> = image_clusters
                .iter()
                .filter_map(|points| bounding_box_of(points))
                .collect();
            sink.publish_clusters(DetectionSource::Image, &image_clusters);
            if !boxes.is_empty() {
                sink.publish_bounding_boxes(DetectionSource::Image, &boxes);
            }
        }

        for source in [DetectionSource::Cloud, DetectionSource::Image] {
            let mut poses: Vec<PoseStamped> = Vec::new();
            let mut labels: Vec<String> = Vec::new();
            for object in &list.objects {
                let in_band = match source {
                    DetectionSource::Cloud => object.id.is_cloud_band(),
                    DetectionSource::Image => object.id.is_image_band(),
                };
                if in_band {
                    poses.push(object.pose.clone());
                    labels.push(object.name.clone());
                }
            }
            if !poses.is_empty() {
                sink.publish_pose_array(source, &poses, &labels);
            }
        }
    }
}

/// Axis-aligned bounding box of a point set.  `None` for an empty set.
fn bounding_box_of(points: &[Vec3]) -> Option<BoundingBox3D> {
    let first = points.first()?;
    let (mut min, mut max) = (*first, *first);
    for p in points {
        min.x = min.x.min(p.x);
        min.y = min.y.min(p.y);
        min.z = min.z.min(p.z);
        max.x = max.x.max(p.x);
        max.y = max.y.max(p.y);
        max.z = max.z.max(p.z);
    }
    Some(BoundingBox3D {
        center: min.add(max).scale(0.5),
        extents: max.sub(min).scale(0.5),
    })
}
