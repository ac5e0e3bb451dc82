//! [`FusionEngine`] – merges the two detection pathways into one list.
//!
//! The engine seeds its output with whatever cloud-band objects the external
//! 3-D recognizer produced for the run, then correlates each 2-D detection
//! against the organized scan: the points under the (margin-adjusted)
//! region of interest are extracted, optionally cleaned of outliers, and a
//! shape-dependent pose is estimated from them.
//!
//! A detection that fails any gate — bounding-box diagonal outside the
//! configured band, no valid points under the region, pose transform
//! failure — is *relabeled* [`DECOY`], never dropped.  Decoys still consume
//! the next image-band provenance id, so the id sequence tells consumers
//! exactly how many detections the run produced.
//!
//! Per-detection failures never abort the run.

use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, warn};

use percepta_adapters::TransformProvider;
use percepta_types::{
    Detection2D, FusedObject, FusedObjectList, ObjectClass, OrganizedCloud, Pose, PoseStamped,
    ProvenanceId, Quaternion, Roi, Vec3, DECOY,
};

use crate::catalog::ObjectCatalog;

// ────────────────────────────────────────────────────────────────────────────
// Parameters
// ────────────────────────────────────────────────────────────────────────────

/// Tunables for the 2-D→3-D correlation step.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RgbFusionParams {
    /// Minimum accepted bounding-box diagonal, pixels.
    pub bbox_min_diag: f64,
    /// Maximum accepted bounding-box diagonal, pixels.
    pub bbox_max_diag: f64,
    /// Pixels added on every side of the region before point extraction.
    pub roi_margin_px: u32,
    /// Apply statistical outlier removal to the extracted points.
    pub remove_outliers: bool,
    /// Height band (metres, in the scan frame) the extracted points must
    /// fall in before pose estimation.
    pub height_filter_min: f32,
    pub height_filter_max: f32,
}

impl Default for RgbFusionParams {
    fn default() -> Self {
        Self {
            bbox_min_diag: 21.0,
            bbox_max_diag: 200.0,
            roi_margin_px: 2,
            remove_outliers: true,
            height_filter_min: 0.0,
            height_filter_max: 0.35,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Provenance id allocation
// ────────────────────────────────────────────────────────────────────────────

/// Owner of the image-band provenance counter.
///
/// Ids start at [`ProvenanceId::IMAGE_BAND_START`] and increase
/// monotonically across runs.  [`RgbIdAllocator::reset`] is only invoked at
/// explicit lifecycle boundaries, never implicitly.
#[derive(Debug)]
pub struct RgbIdAllocator {
    next: u32,
}

impl RgbIdAllocator {
    pub fn new() -> Self {
        Self {
            next: ProvenanceId::IMAGE_BAND_START,
        }
    }

    /// Hand out the next image-band id.
    pub fn allocate(&mut self) -> ProvenanceId {
        let id = ProvenanceId(self.next);
        self.next += 1;
        id
    }

    /// Rewind the counter to the start of the image band.
    pub fn reset(&mut self) {
        self.next = ProvenanceId::IMAGE_BAND_START;
    }
}

impl Default for RgbIdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// FusionEngine
// ────────────────────────────────────────────────────────────────────────────

/// Everything one fusion pass consumes.
pub struct FusionInput<'a> {
    /// Cloud-band objects the external 3-D recognizer already produced for
    /// this run.  Passed through untouched.
    pub cloud_objects: Vec<FusedObject>,
    /// Raw detections from the 2-D pathway.
    pub detections: &'a [Detection2D],
    /// The preprocessed organized scan.
    pub cloud: &'a OrganizedCloud,
    /// Frame every emitted pose must be expressed in.
    pub target_frame: &'a str,
    pub transforms: &'a dyn TransformProvider,
    pub workstation: &'a str,
}

/// Correlates 2-D detections with the 3-D scan and assembles the unified
/// object list.
pub struct FusionEngine {
    catalog: Arc<ObjectCatalog>,
    params: RgbFusionParams,
    ids: RgbIdAllocator,
}

impl FusionEngine {
    pub fn new(catalog: Arc<ObjectCatalog>, params: RgbFusionParams) -> Self {
        Self {
            catalog,
            params,
            ids: RgbIdAllocator::new(),
        }
    }

    /// Reset the image-band provenance counter.  Lifecycle boundaries only.
    pub fn reset_ids(&mut self) {
        self.ids.reset();
    }

    /// Run one fusion pass.
    ///
    /// Cloud-band objects come first in the output, in their original
    /// order, followed by one entry per 2-D detection (possibly relabeled
    /// [`DECOY`]).  Every object is stamped with the run's workstation.
    pub fn fuse(&mut self, mut input: FusionInput<'_>) -> FusedObjectList {
        let mut list = FusedObjectList::new(input.workstation);
        list.objects = std::mem::take(&mut input.cloud_objects);
        for object in list.objects.iter_mut() {
            object.workstation = input.workstation.to_string();
        }

        for detection in input.detections {
            let object = self.fuse_detection(detection, &input);
            list.objects.push(object);
        }
        list
    }

    /// Correlate a single 2-D detection.  Every gate failure degrades the
    /// detection to a decoy entry carrying the freshly allocated id.
    fn fuse_detection(&mut self, detection: &Detection2D, input: &FusionInput<'_>) -> FusedObject {
        let id = self.ids.allocate();
        let class = self.catalog.classify(&detection.class_name);

        let diag = detection.roi.diagonal();
        if diag <= self.params.bbox_min_diag || diag >= self.params.bbox_max_diag {
            debug!(
                name = %detection.class_name,
                diag,
                "bounding-box diagonal outside accepted band, relabeling"
            );
            return self.decoy(detection, class, id, input);
        }

        let Some(points) = extract_roi_points(
            input.cloud,
            &detection.roi,
            self.params.roi_margin_px,
            self.params.remove_outliers,
        ) else {
            debug!(name = %detection.class_name, "no valid points under region, relabeling");
            return self.decoy(detection, class, id, input);
        };

        let Some(pose) = estimate_pose(
            &points,
            class,
            self.params.height_filter_min,
            self.params.height_filter_max,
        ) else {
            debug!(name = %detection.class_name, "pose estimation failed, relabeling");
            return self.decoy(detection, class, id, input);
        };

        let stamped = PoseStamped::new(pose, input.cloud.frame_id.clone());
        let stamped = if input.cloud.frame_id != input.target_frame {
            match input.transforms.transform_pose(&stamped, input.target_frame) {
                Ok(p) => p,
                Err(e) => {
                    warn!(name = %detection.class_name, error = %e, "pose transform failed, relabeling");
                    return self.decoy(detection, class, id, input);
                }
            }
        } else {
            stamped
        };

        FusedObject {
            name: detection.class_name.clone(),
            class,
            pose: stamped,
            probability: detection.confidence,
            id,
            workstation: input.workstation.to_string(),
            view: Some(points),
        }
    }

    /// Build the detected-but-rejected entry for a failed detection.  The
    /// pose stays at its default: no field is derived from extraction.
    fn decoy(
        &self,
        detection: &Detection2D,
        class: ObjectClass,
        id: ProvenanceId,
        input: &FusionInput<'_>,
    ) -> FusedObject {
        FusedObject {
            name: DECOY.to_string(),
            class,
            pose: PoseStamped::new(Pose::default(), input.target_frame),
            probability: detection.confidence,
            id,
            workstation: input.workstation.to_string(),
            view: None,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Point extraction
// ────────────────────────────────────────────────────────────────────────────

/// Collect the valid scan points under `roi`, expanded by `margin` pixels
/// and clamped to the cloud bounds.  Returns `None` when nothing valid
/// falls under the region (extraction failure).
fn extract_roi_points(
    cloud: &OrganizedCloud,
    roi: &Roi,
    margin: u32,
    remove_outliers: bool,
) -> Option<Vec<Vec3>> {
    let x0 = roi.x.saturating_sub(margin);
    let y0 = roi.y.saturating_sub(margin);
    let x1 = (roi.x + roi.width + margin).min(cloud.width);
    let y1 = (roi.y + roi.height + margin).min(cloud.height);

    let mut points = Vec::new();
    for y in y0..y1 {
        for x in x0..x1 {
            if let Some(p) = cloud.at(x, y) {
                points.push(p);
            }
        }
    }
    if points.is_empty() {
        return None;
    }
    if remove_outliers {
        points = remove_statistical_outliers(points);
    }
    if points.is_empty() {
        None
    } else {
        Some(points)
    }
}

/// Drop points whose distance to the centroid exceeds mean + one standard
/// deviation of all centroid distances.
fn remove_statistical_outliers(points: Vec<Vec3>) -> Vec<Vec3> {
    if points.len() < 3 {
        return points;
    }
    let centroid = centroid_of(&points);
    let distances: Vec<f32> = points.iter().map(|p| p.distance(centroid)).collect();
    let mean = distances.iter().sum::<f32>() / distances.len() as f32;
    let variance =
        distances.iter().map(|d| (d - mean) * (d - mean)).sum::<f32>() / distances.len() as f32;
    let cutoff = mean + variance.sqrt();
    points
        .into_iter()
        .zip(distances)
        .filter(|(_, d)| *d <= cutoff)
        .map(|(p, _)| p)
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Pose estimation
// ────────────────────────────────────────────────────────────────────────────

/// Estimate a pose from an extracted point subset.
///
/// Points outside the `[height_min, height_max]` z-band are discarded
/// first.  Position is the centroid of the survivors.  Yaw comes from the
/// planar principal axis, except for rotationally symmetric objects where
/// it is undefined and left at zero.
fn estimate_pose(
    points: &[Vec3],
    class: ObjectClass,
    height_min: f32,
    height_max: f32,
) -> Option<Pose> {
    let filtered: Vec<Vec3> = points
        .iter()
        .copied()
        .filter(|p| p.z >= height_min && p.z <= height_max)
        .collect();
    if filtered.is_empty() {
        return None;
    }

    let centroid = centroid_of(&filtered);
    let yaw = if class == ObjectClass::Round {
        0.0
    } else {
        principal_axis_yaw(&filtered, centroid)
    };
    Some(Pose::new(centroid, Quaternion::from_rpy(0.0, 0.0, yaw)))
}

fn centroid_of(points: &[Vec3]) -> Vec3 {
    let sum = points.iter().fold(Vec3::zero(), |acc, p| acc.add(*p));
    sum.scale(1.0 / points.len() as f32)
}

/// Orientation of the dominant planar axis via the 2-D covariance of the
/// point set.
fn principal_axis_yaw(points: &[Vec3], centroid: Vec3) -> f32 {
    let n = points.len() as f32;
    let (mut sxx, mut syy, mut sxy) = (0.0f32, 0.0f32, 0.0f32);
    for p in points {
        let dx = p.x - centroid.x;
        let dy = p.y - centroid.y;
        sxx += dx * dx;
        syy += dy * dy;
        sxy += dx * dy;
    }
    sxx /= n;
    syy /= n;
    sxy /= n;
    0.5 * (2.0 * sxy).atan2(sxx - syy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use percepta_adapters::StaticTransforms;

    fn catalog() -> Arc<ObjectCatalog> {
        Arc::new(
            ObjectCatalog::from_toml_str(
                r#"
[[object_info.object]]
name = "S40_40_B"
shape = "sphere"
color = "blue"

[[object_info.object]]
name = "F20_20_G"
shape = "box"
color = "grey"
"#,
            )
            .unwrap(),
        )
    }

    /// A 100x100 organized cloud with a flat 5 cm-high patch under
    /// (40..60, 40..60) and invalid returns elsewhere.
    fn cloud_with_patch() -> OrganizedCloud {
        let width = 100u32;
        let height = 100u32;
        let mut points = vec![None; (width * height) as usize];
        for y in 40..60u32 {
            for x in 40..60u32 {
                let p = Vec3::new(x as f32 * 0.01, y as f32 * 0.01, 0.05);
                points[(y * width + x) as usize] = Some(p);
            }
        }
        OrganizedCloud {
            width,
            height,
            points,
            frame_id: "base_link".to_string(),
            stamp: Utc::now(),
        }
    }

    fn detection(name: &str, roi: Roi) -> Detection2D {
        Detection2D {
            class_name: name.to_string(),
            confidence: 0.88,
            roi,
        }
    }

    fn engine() -> FusionEngine {
        FusionEngine::new(catalog(), RgbFusionParams::default())
    }

    fn fuse_one(engine: &mut FusionEngine, det: Detection2D) -> FusedObjectList {
        let cloud = cloud_with_patch();
        let tfs = StaticTransforms::new();
        engine.fuse(FusionInput {
            cloud_objects: Vec::new(),
            detections: &[det],
            cloud: &cloud,
            target_frame: "base_link",
            transforms: &tfs,
            workstation: "WS01",
        })
    }

    #[test]
    fn detection_over_patch_gets_pose_and_image_band_id() {
        let mut engine = engine();
        let det = detection(
            "F20_20_G",
            Roi {
                x: 42,
                y: 42,
                width: 15,
                height: 15,
            },
        );
        let list = fuse_one(&mut engine, det);
        assert_eq!(list.objects.len(), 1);
        let obj = &list.objects[0];
        assert_eq!(obj.name, "F20_20_G");
        assert_eq!(obj.workstation, "WS01");
        assert!(obj.id.is_image_band());
        assert!(obj.view.is_some());
        // Centroid of the extracted patch sits inside the region.
        assert!(obj.pose.pose.position.x > 0.40 && obj.pose.pose.position.x < 0.60);
        assert!((obj.pose.pose.position.z - 0.05).abs() < 1e-4);
    }

    #[test]
    fn oversized_diagonal_becomes_decoy_with_id() {
        let mut engine = engine();
        // Diagonal ≈ 500 px against the default [21, 200] band.
        let det = detection(
            "F20_20_G",
            Roi {
                x: 0,
                y: 0,
                width: 400,
                height: 300,
            },
        );
        let list = fuse_one(&mut engine, det);
        let obj = &list.objects[0];
        assert_eq!(obj.name, DECOY);
        assert_eq!(obj.id, ProvenanceId(ProvenanceId::IMAGE_BAND_START));
        assert_eq!(obj.workstation, "WS01");
        // No pose-derived fields populated from extraction.
        assert!(obj.view.is_none());
        assert_eq!(obj.pose.pose.position, Vec3::zero());
    }

    #[test]
    fn region_without_points_becomes_decoy() {
        let mut engine = engine();
        // The patch does not cover (0..20, 0..20).
        let det = detection(
            "F20_20_G",
            Roi {
                x: 0,
                y: 0,
                width: 20,
                height: 20,
            },
        );
        let list = fuse_one(&mut engine, det);
        assert!(list.objects[0].is_decoy());
    }

    #[test]
    fn decoys_consume_the_id_sequence() {
        let mut engine = engine();
        let cloud = cloud_with_patch();
        let tfs = StaticTransforms::new();
        let detections = [
            // decoy: nothing under the region
            detection("F20_20_G", Roi { x: 0, y: 0, width: 22, height: 22 }),
            // valid
            detection("F20_20_G", Roi { x: 42, y: 42, width: 15, height: 15 }),
        ];
        let list = engine.fuse(FusionInput {
            cloud_objects: Vec::new(),
            detections: &detections,
            cloud: &cloud,
            target_frame: "base_link",
            transforms: &tfs,
            workstation: "WS01",
        });
        assert!(list.objects[0].is_decoy());
        assert_eq!(list.objects[0].id, ProvenanceId(100));
        assert!(!list.objects[1].is_decoy());
        assert_eq!(list.objects[1].id, ProvenanceId(101));
    }

    #[test]
    fn ids_increase_across_runs_until_reset() {
        let mut engine = engine();
        let det = detection("F20_20_G", Roi { x: 42, y: 42, width: 15, height: 15 });
        let first = fuse_one(&mut engine, det.clone());
        let second = fuse_one(&mut engine, det.clone());
        assert_eq!(first.objects[0].id, ProvenanceId(100));
        assert_eq!(second.objects[0].id, ProvenanceId(101));

        engine.reset_ids();
        let third = fuse_one(&mut engine, det);
        assert_eq!(third.objects[0].id, ProvenanceId(100));
    }

    #[test]
    fn cloud_objects_are_passed_through_first_with_workstation_stamped() {
        let mut engine = engine();
        let cloud = cloud_with_patch();
        let tfs = StaticTransforms::new();
        let seed = FusedObject {
            name: "AXIS".to_string(),
            class: ObjectClass::AxisBolt,
            pose: PoseStamped::new(Pose::default(), "base_link"),
            probability: 0.7,
            id: ProvenanceId(3),
            workstation: String::new(),
            view: None,
        };
        let list = engine.fuse(FusionInput {
            cloud_objects: vec![seed.clone()],
            detections: &[detection("F20_20_G", Roi { x: 42, y: 42, width: 15, height: 15 })],
            cloud: &cloud,
            target_frame: "base_link",
            transforms: &tfs,
            workstation: "WS01",
        });
        assert_eq!(list.objects.len(), 2);
        // Pass-through leaves everything but the workstation stamp alone.
        assert_eq!(list.objects[0].name, seed.name);
        assert_eq!(list.objects[0].pose, seed.pose);
        assert_eq!(list.objects[0].id, seed.id);
        assert_eq!(list.objects[0].workstation, "WS01");
        assert!(list.objects[0].id.is_cloud_band());
        assert!(list.objects[1].id.is_image_band());
        assert_eq!(list.objects[1].workstation, "WS01");
    }

    #[test]
    fn round_object_pose_has_zero_yaw() {
        let mut engine = engine();
        let det = detection("S40_40_B", Roi { x: 42, y: 42, width: 15, height: 15 });
        let list = fuse_one(&mut engine, det);
        let obj = &list.objects[0];
        assert_eq!(obj.class, ObjectClass::Round);
        let (_, _, yaw) = obj.pose.pose.orientation.to_rpy();
        assert_eq!(yaw, 0.0);
    }

    #[test]
    fn height_filter_rejects_out_of_band_points() {
        // All patch points sit at z = 0.05; a band above them fails.
        let cloud = cloud_with_patch();
        let tfs = StaticTransforms::new();
        let mut engine = FusionEngine::new(
            catalog(),
            RgbFusionParams {
                height_filter_min: 0.10,
                height_filter_max: 0.35,
                ..RgbFusionParams::default()
            },
        );
        let list = engine.fuse(FusionInput {
            cloud_objects: Vec::new(),
            detections: &[detection("F20_20_G", Roi { x: 42, y: 42, width: 15, height: 15 })],
            cloud: &cloud,
            target_frame: "base_link",
            transforms: &tfs,
            workstation: "WS01",
        });
        assert!(list.objects[0].is_decoy());
    }

    #[test]
    fn principal_axis_yaw_follows_elongation() {
        // Points stretched along y: the principal axis is the y axis.
        let points: Vec<Vec3> = (0..20)
            .map(|i| Vec3::new(0.0, i as f32 * 0.01, 0.05))
            .collect();
        let c = centroid_of(&points);
        let yaw = principal_axis_yaw(&points, c);
        assert!((yaw.abs() - std::f32::consts::FRAC_PI_2).abs() < 1e-3);
    }

    #[test]
    fn outlier_removal_drops_distant_point() {
        let mut points: Vec<Vec3> = (0..30)
            .map(|i| Vec3::new((i % 6) as f32 * 0.01, (i / 6) as f32 * 0.01, 0.05))
            .collect();
        points.push(Vec3::new(5.0, 5.0, 5.0));
        let cleaned = remove_statistical_outliers(points);
        assert_eq!(cleaned.len(), 30);
    }
}
