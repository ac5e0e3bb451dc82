//! `percepta-types` – Shared data model
//!
//! Every crate in the Percepta workspace speaks these types.
//!
//! # Modules
//!
//! - [`geometry`] – [`Vec3`], [`Quaternion`], [`Pose`] and [`PoseStamped`]:
//!   the rigid-body math used for object poses, including roll/pitch/yaw
//!   decomposition and rebuild.
//! - [`sensor`] – [`CameraImage`], [`OrganizedCloud`], the synchronized
//!   [`SensorFrame`] pair, 2-D regions of interest and raw detections.
//! - [`object`] – [`ObjectClass`], [`ProvenanceId`], [`FusedObject`] and
//!   [`FusedObjectList`]: the unified output representation.
//! - [`goal`] – [`DetectionGoal`] and [`GoalOutcome`]: the on-demand
//!   detection request protocol.
//! - [`error`] – [`RecogError`]: the whole-run error taxonomy.

pub mod error;
pub mod geometry;
pub mod goal;
pub mod object;
pub mod sensor;

pub use error::RecogError;
pub use geometry::{Pose, PoseStamped, Quaternion, Vec3};
pub use goal::{DetectionGoal, FailureReason, GoalOutcome};
pub use object::{FusedObject, FusedObjectList, ObjectClass, ProvenanceId, DECOY};
pub use sensor::{BoundingBox3D, CameraImage, Detection2D, Detection3D, OrganizedCloud, Roi, SensorFrame};
