//! [`PoseNormalizer`] – the ordered pose-adjustment pass.
//!
//! Objects sit on a known-flat work surface, so sensed roll and pitch are
//! treated as sensor noise and forced to zero, and the z position is
//! rewritten from the workspace height the run's segmentation established.
//!
//! The steps run in a fixed order because later ones depend on fields set
//! by earlier ones:
//!
//! 1. decompose orientation into roll/pitch/yaw;
//! 2. rotationally symmetric objects get yaw = 0;
//! 3. image-band containers get their class correction *before* flattening;
//! 4. rebuild orientation from (0, 0, yaw) — flatten;
//! 5. rewrite z = workspace height + per-class offset (skipped for the
//!    whole run when the height was never established);
//! 6. axis/bolt objects get their class correction *after* flattening;
//! 7. rewrite catalog aliases to the canonical published name — last, since
//!    step 6 keys off the pre-rename name.
//!
//! Rejected ([`DECOY`][percepta_types::DECOY]) entries still pass through
//! the generic steps (flattening, height rewrite) but receive no
//! class-specific correction; relabeling never removes an entry.

use std::sync::Arc;

use serde::Deserialize;
use tracing::debug;

use percepta_types::{FusedObject, FusedObjectList, ObjectClass, Quaternion, Vec3};

use crate::catalog::ObjectCatalog;

// ────────────────────────────────────────────────────────────────────────────
// Configuration
// ────────────────────────────────────────────────────────────────────────────

/// Height offsets applied on top of the workspace height.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    /// z offset for everything that is not a container (metres).
    pub object_height_above_workspace: f32,
    /// z offset for containers (metres).
    pub container_height: f32,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            object_height_above_workspace: 0.022,
            container_height: 0.05,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Class-specific adjustment rules
// ────────────────────────────────────────────────────────────────────────────

type AdjustRule = fn(&mut FusedObject, &NormalizerConfig);

/// Correction applied before flattening, keyed by class tag.
fn pre_flatten_rule(class: ObjectClass) -> Option<AdjustRule> {
    match class {
        ObjectClass::Container => Some(adjust_container_pose),
        _ => None,
    }
}

/// Correction applied after flattening and height rewrite, keyed by class
/// tag.
fn post_flatten_rule(class: ObjectClass) -> Option<AdjustRule> {
    match class {
        ObjectClass::AxisBolt => Some(adjust_axis_bolt_pose),
        _ => None,
    }
}

/// Recenter an image-band container on its extracted points.  The 2-D
/// detector tends to latch onto one rim of the box, so the centroid of the
/// point view is a better grasp target than the estimated pose.
fn adjust_container_pose(object: &mut FusedObject, _config: &NormalizerConfig) {
    let Some(view) = object.view.as_ref() else {
        return;
    };
    if view.is_empty() {
        return;
    }
    let centroid = centroid_of(view);
    debug!(name = %object.name, "recentering container on its point view");
    object.pose.pose.position.x = centroid.x;
    object.pose.pose.position.y = centroid.y;
}

/// Shift an axis/bolt pose towards its head end along the major axis.
///
/// The estimated centroid of a long threaded part sits mid-shaft; grasping
/// works off the head, which is the denser end of the extracted points.
fn adjust_axis_bolt_pose(object: &mut FusedObject, _config: &NormalizerConfig) {
    let Some(view) = object.view.as_ref() else {
        return;
    };
    if view.len() < 2 {
        return;
    }
    let (_, _, yaw) = object.pose.pose.orientation.to_rpy();
    let (dir_x, dir_y) = (yaw.cos(), yaw.sin());
    let centroid = centroid_of(view);

    // Signed extent of the point set along the major axis.
    let mut min_t = f32::INFINITY;
    let mut max_t = f32::NEG_INFINITY;
    let mut positive = 0usize;
    for p in view {
        let t = (p.x - centroid.x) * dir_x + (p.y - centroid.y) * dir_y;
        min_t = min_t.min(t);
        max_t = max_t.max(t);
        if t >= 0.0 {
            positive += 1;
        }
    }
    // Head = the denser half; shift a quarter length towards it.
    let towards_positive = positive * 2 >= view.len();
    let half = if towards_positive { max_t } else { min_t };
    let shift = half * 0.5;
    debug!(name = %object.name, shift, "shifting axis/bolt pose towards its head");
    object.pose.pose.position.x += dir_x * shift;
    object.pose.pose.position.y += dir_y * shift;
}

fn centroid_of(points: &[Vec3]) -> Vec3 {
    let sum = points.iter().fold(Vec3::zero(), |acc, p| acc.add(*p));
    sum.scale(1.0 / points.len() as f32)
}

// ────────────────────────────────────────────────────────────────────────────
// PoseNormalizer
// ────────────────────────────────────────────────────────────────────────────

/// Runs the ordered adjustment steps over a fused list.
pub struct PoseNormalizer {
    catalog: Arc<ObjectCatalog>,
    config: NormalizerConfig,
}

impl PoseNormalizer {
    pub fn new(catalog: Arc<ObjectCatalog>, config: NormalizerConfig) -> Self {
        Self { catalog, config }
    }

    /// Normalize every object in place.
    ///
    /// `workspace_height` is the value the run's segmentation reported;
    /// `None` means the support surface was never established and step 5 is
    /// skipped for the whole run.
    pub fn normalize(&self, list: &mut FusedObjectList, workspace_height: Option<f32>) {
        for object in list.objects.iter_mut() {
            self.normalize_object(object, workspace_height);
        }
    }

    fn normalize_object(&self, object: &mut FusedObject, workspace_height: Option<f32>) {
        let (_, _, mut yaw) = object.pose.pose.orientation.to_rpy();
        let rejected = object.is_decoy();

        // 2. Rotational symmetry makes yaw meaningless.
        if !rejected && object.class == ObjectClass::Round {
            yaw = 0.0;
        }

        // 3. Pre-flatten class correction, image-band containers only.
        if !rejected && object.id.is_image_band() {
            if let Some(rule) = pre_flatten_rule(object.class) {
                rule(object, &self.config);
            }
        }

        // 4. Flatten: the work surface is known flat, sensed tilt is noise.
        object.pose.pose.orientation = Quaternion::from_rpy(0.0, 0.0, yaw);

        // 5. Height rewrite from the run's workspace height.
        if let Some(height) = workspace_height {
            let offset = if !rejected && object.class == ObjectClass::Container {
                self.config.container_height
            } else {
                self.config.object_height_above_workspace
            };
            object.pose.pose.position.z = height + offset;
        }

        // 6. Post-flatten class correction.
        if !rejected {
            if let Some(rule) = post_flatten_rule(object.class) {
                rule(object, &self.config);
            }
        }

        // 7. Alias rename, exactly once, after everything keyed off the
        //    pre-rename name.
        if !rejected {
            let canonical = self.catalog.canonical_name(&object.name);
            if canonical != object.name {
                object.name = canonical.to_string();
            }
        }
    }
}
