//! Whole-run error taxonomy.
//!
//! Only run-fatal conditions are represented here.  Per-object extraction or
//! pose-estimation failures are *not* errors: they degrade the affected
//! object to the [`DECOY`][crate::object::DECOY] sentinel and the run
//! continues.  Admission rejections (busy, no data) are protocol outcomes,
//! not errors; they travel as [`FailureReason`][crate::goal::FailureReason].

use thiserror::Error;

/// Errors that abort a detection run or a collaborator call.
#[derive(Error, Debug)]
pub enum RecogError {
    #[error("transform to frame `{target}` failed: {details}")]
    Transform { target: String, details: String },

    #[error("segmentation failed: {0}")]
    Segmentation(String),

    #[error("image inference failed: {0}")]
    Inference(String),

    #[error("object catalog error: {0}")]
    Catalog(String),

    #[error("configuration error: {0}")]
    Config(String),
}
