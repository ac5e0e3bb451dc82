//! The unified object representation produced by fusion.
//!
//! # Provenance bands
//!
//! Every fused object carries exactly one [`ProvenanceId`].  The numeric
//! value encodes which detection pathway produced the object: ids below
//! [`ProvenanceId::IMAGE_BAND_START`] are cloud(3-D)-sourced, ids at or
//! above it are image(2-D)-sourced.  Image-band ids increase monotonically
//! across runs; they are only reset at explicit lifecycle boundaries.
//!
//! # DECOY
//!
//! A detection rejected by a filtering rule (out-of-band bounding box,
//! failed extraction, out of the spatial region of interest) is *relabeled*
//! [`DECOY`], never removed, so downstream consumers can distinguish
//! "detected but rejected" from "nothing detected".

use serde::{Deserialize, Serialize};

use crate::geometry::{PoseStamped, Vec3};

/// Sentinel label for a detection that was produced but rejected.
pub const DECOY: &str = "DECOY";

// ────────────────────────────────────────────────────────────────────────────
// Object class
// ────────────────────────────────────────────────────────────────────────────

/// Closed set of object classes with distinct pose-adjustment behaviour.
///
/// Resolved once from the object catalog at load time; all downstream
/// dispatch keys off this tag instead of repeated name comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectClass {
    /// Rotationally symmetric: yaw is undefined and forced to zero.
    Round,
    /// Container boxes: distinct height offset and a pre-flatten correction.
    Container,
    /// Long threaded parts (bolts, axes): corrected after flattening.
    AxisBolt,
    /// Everything else.
    Generic,
}

// ────────────────────────────────────────────────────────────────────────────
// Provenance
// ────────────────────────────────────────────────────────────────────────────

/// Provenance-encoded object identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProvenanceId(pub u32);

impl ProvenanceId {
    /// First id of the image(2-D) band.  Ids below this value belong to the
    /// cloud(3-D) band.
    pub const IMAGE_BAND_START: u32 = 100;

    /// `true` when this object was produced by the 3-D pathway.
    pub fn is_cloud_band(self) -> bool {
        self.0 < Self::IMAGE_BAND_START
    }

    /// `true` when this object was produced by the 2-D pathway.
    pub fn is_image_band(self) -> bool {
        self.0 >= Self::IMAGE_BAND_START
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Fused objects
// ────────────────────────────────────────────────────────────────────────────

/// One recognized object after fusion of the two detection pathways.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusedObject {
    /// Canonical object name, or [`DECOY`] when rejected.
    pub name: String,
    pub class: ObjectClass,
    pub pose: PoseStamped,
    /// Detector confidence in `[0, 1]`.
    pub probability: f32,
    pub id: ProvenanceId,
    /// Workstation the producing detection run targeted.  Stamped by the
    /// fusion pass so the object stays attributable outside its list.
    pub workstation: String,
    /// The 3-D points extracted under the detection, kept through the
    /// pipeline for class-specific pose corrections and stripped before
    /// emission.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view: Option<Vec<Vec3>>,
}

impl FusedObject {
    /// Relabel this object as a [`DECOY`].  Irreversible by design: no
    /// pipeline stage restores a rejected label.
    pub fn reject(&mut self) {
        self.name = DECOY.to_string();
    }

    pub fn is_decoy(&self) -> bool {
        self.name == DECOY
    }
}

/// The atomic output unit: an ordered object list plus the workstation the
/// detection request targeted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusedObjectList {
    pub objects: Vec<FusedObject>,
    pub workstation: String,
}

impl FusedObjectList {
    pub fn new(workstation: impl Into<String>) -> Self {
        Self {
            objects: Vec::new(),
            workstation: workstation.into(),
        }
    }
}
