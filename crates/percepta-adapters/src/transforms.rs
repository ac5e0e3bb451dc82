//! Seam to the coordinate-frame transform service.
//!
//! Frame resolution (the TF tree) is an external collaborator; the core
//! only needs "express this pose/cloud in that frame".  [`StaticTransforms`]
//! is a direct-edge table sufficient for tests and in-process simulation.

use std::collections::HashMap;

use tracing::debug;

use percepta_types::{OrganizedCloud, PoseStamped, Quaternion, RecogError, Vec3};

/// A rigid-body 3-D transform: rotate, then translate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform3D {
    pub translation: Vec3,
    pub rotation: Quaternion,
}

impl Transform3D {
    pub fn new(translation: Vec3, rotation: Quaternion) -> Self {
        Self {
            translation,
            rotation,
        }
    }

    /// The identity transform.
    pub fn identity() -> Self {
        Self::new(Vec3::zero(), Quaternion::identity())
    }

    /// Map a point expressed in the source frame into the target frame.
    pub fn apply(&self, point: Vec3) -> Vec3 {
        self.rotation.rotate(point).add(self.translation)
    }
}

/// The transform collaborator.
pub trait TransformProvider: Send + Sync {
    /// Express `pose` in `target_frame`.
    ///
    /// # Errors
    ///
    /// Returns [`RecogError::Transform`] when no transform between the two
    /// frames can be resolved.
    fn transform_pose(
        &self,
        pose: &PoseStamped,
        target_frame: &str,
    ) -> Result<PoseStamped, RecogError>;

    /// Express every point of `cloud` in `target_frame`.
    ///
    /// # Errors
    ///
    /// Returns [`RecogError::Transform`] when no transform between the two
    /// frames can be resolved.
    fn transform_cloud(
        &self,
        cloud: &OrganizedCloud,
        target_frame: &str,
    ) -> Result<OrganizedCloud, RecogError>;
}

// ────────────────────────────────────────────────────────────────────────────
// StaticTransforms
// ────────────────────────────────────────────────────────────────────────────

/// A fixed table of direct `(source, target)` frame edges.
///
/// Same-frame lookups always succeed with the identity transform.  Anything
/// not registered fails, which makes transform-failure paths easy to drive
/// in tests.
#[derive(Debug, Default)]
pub struct StaticTransforms {
    edges: HashMap<(String, String), Transform3D>,
}

impl StaticTransforms {
    /// An empty table: only same-frame transforms resolve.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the transform that maps points in `source_frame` into
    /// `target_frame`.
    pub fn insert(
        &mut self,
        source_frame: &str,
        target_frame: &str,
        transform: Transform3D,
    ) {
        self.edges.insert(
            (source_frame.to_string(), target_frame.to_string()),
            transform,
        );
    }

    fn lookup(&self, source_frame: &str, target_frame: &str) -> Result<Transform3D, RecogError> {
        if source_frame == target_frame {
            return Ok(Transform3D::identity());
        }
        self.edges
            .get(&(source_frame.to_string(), target_frame.to_string()))
            .copied()
            .ok_or_else(|| {
                debug!(source_frame, target_frame, "no registered transform edge");
                RecogError::Transform {
                    target: target_frame.to_string(),
                    details: format!("no registered edge from `{source_frame}`"),
                }
            })
    }
}

impl TransformProvider for StaticTransforms {
    fn transform_pose(
        &self,
        pose: &PoseStamped,
        target_frame: &str,
    ) -> Result<PoseStamped, RecogError> {
        let tf = self.lookup(&pose.frame_id, target_frame)?;
        let mut out = pose.clone();
        out.pose.position = tf.apply(pose.pose.position);
        out.pose.orientation = tf.rotation.mul(pose.pose.orientation);
        out.frame_id = target_frame.to_string();
        Ok(out)
    }

    fn transform_cloud(
        &self,
        cloud: &OrganizedCloud,
        target_frame: &str,
    ) -> Result<OrganizedCloud, RecogError> {
        let tf = self.lookup(&cloud.frame_id, target_frame)?;
        let mut out = cloud.clone();
        for point in out.points.iter_mut() {
            *point = point.map(|p| tf.apply(p));
        }
        out.frame_id = target_frame.to_string();
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use percepta_types::Pose;

    fn pose_in(frame: &str) -> PoseStamped {
        PoseStamped::new(
            Pose::new(Vec3::new(1.0, 0.0, 0.0), Quaternion::identity()),
            frame,
        )
    }

    #[test]
    fn same_frame_is_identity() {
        let tfs = StaticTransforms::new();
        let pose = pose_in("base_link");
        let out = tfs.transform_pose(&pose, "base_link").unwrap();
        assert_eq!(out.pose, pose.pose);
    }

    #[test]
    fn registered_edge_translates() {
        let mut tfs = StaticTransforms::new();
        tfs.insert(
            "camera_link",
            "base_link",
            Transform3D::new(Vec3::new(0.5, 0.0, 0.2), Quaternion::identity()),
        );
        let out = tfs.transform_pose(&pose_in("camera_link"), "base_link").unwrap();
        assert!((out.pose.position.x - 1.5).abs() < 1e-5);
        assert!((out.pose.position.z - 0.2).abs() < 1e-5);
        assert_eq!(out.frame_id, "base_link");
    }

    #[test]
    fn missing_edge_fails() {
        let tfs = StaticTransforms::new();
        let err = tfs.transform_pose(&pose_in("camera_link"), "base_link");
        assert!(matches!(err, Err(RecogError::Transform { .. })));
    }

    #[test]
    fn cloud_transform_preserves_invalid_returns() {
        let mut tfs = StaticTransforms::new();
        tfs.insert(
            "camera_link",
            "base_link",
            Transform3D::new(Vec3::new(1.0, 0.0, 0.0), Quaternion::identity()),
        );
        let cloud = OrganizedCloud {
            width: 2,
            height: 1,
            points: vec![Some(Vec3::zero()), None],
            frame_id: "camera_link".to_string(),
            stamp: Utc::now(),
        };
        let out = tfs.transform_cloud(&cloud, "base_link").unwrap();
        assert_eq!(out.points[0], Some(Vec3::new(1.0, 0.0, 0.0)));
        assert_eq!(out.points[1], None);
    }
}
