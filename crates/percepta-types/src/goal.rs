//! The on-demand detection request protocol.
//!
//! A requester submits a [`DetectionGoal`] naming the workstation to scan.
//! Admission always acknowledges receipt; the run completes with a
//! [`GoalOutcome`] whose contract towards the requester is the boolean
//! alone — the [`FailureReason`] is diagnostic detail for observability.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A request to run one detection pipeline pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionGoal {
    pub id: Uuid,
    /// Workstation tag copied into the emitted object list.
    pub workstation: String,
    /// Optional target object name.  Informational only: logged, never used
    /// to filter the result.
    pub object_name: Option<String>,
}

impl DetectionGoal {
    pub fn new(workstation: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            workstation: workstation.into(),
            object_name: None,
        }
    }
}

/// Why a request was rejected or a run aborted.  Diagnostic only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureReason {
    /// A previous run still holds the exclusive lock.
    Busy,
    /// No synchronized sensor frame has been cached yet.
    NoData,
    /// Whole-scan preprocessing could not be transformed to the target frame.
    Transform,
    /// The segmentation collaborator failed outright.
    Segmentation,
    /// The goal was cancelled before admission completed.
    Cancelled,
}

/// Terminal result of a detection goal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GoalOutcome {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<FailureReason>,
}

impl GoalOutcome {
    pub fn succeeded() -> Self {
        Self {
            success: true,
            reason: None,
        }
    }

    pub fn failed(reason: FailureReason) -> Self {
        Self {
            success: false,
            reason: Some(reason),
        }
    }
}
