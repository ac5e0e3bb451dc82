//! Sensor-side types: camera frames, organized point clouds and the raw
//! detections produced by the two recognition pathways.
//!
//! The cloud is *organized*: its points are stored row-major with the same
//! width/height as the camera image, so a 2-D region of interest maps
//! directly onto the 3-D points seen under it.  Invalid returns (NaN range
//! readings, occlusions) are stored as `None`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geometry::Vec3;

// ────────────────────────────────────────────────────────────────────────────
// Camera image
// ────────────────────────────────────────────────────────────────────────────

/// A raw camera frame (e.g. RGB24).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraImage {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Raw pixel data.
    pub data: Vec<u8>,
    pub stamp: DateTime<Utc>,
}

// ────────────────────────────────────────────────────────────────────────────
// Organized point cloud
// ────────────────────────────────────────────────────────────────────────────

/// An organized 3-D scan: one (optional) point per camera pixel, row-major.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrganizedCloud {
    pub width: u32,
    pub height: u32,
    /// `width * height` entries, row-major.  `None` marks an invalid return.
    pub points: Vec<Option<Vec3>>,
    /// Name of the reference frame the points are expressed in.
    pub frame_id: String,
    pub stamp: DateTime<Utc>,
}

impl OrganizedCloud {
    /// The point under pixel `(x, y)`, or `None` when out of bounds or the
    /// sensor had no valid return there.
    pub fn at(&self, x: u32, y: u32) -> Option<Vec3> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.points[(y * self.width + x) as usize]
    }

    /// All valid points in the cloud.
    pub fn valid_points(&self) -> impl Iterator<Item = Vec3> + '_ {
        self.points.iter().filter_map(|p| *p)
    }
}

/// The most recent synchronized camera-frame / 3-D-scan pair.
///
/// Exactly one live instance is held by the sensor stream cache at a time;
/// it is only replaced when no detection run holds the exclusive lock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorFrame {
    pub image: CameraImage,
    pub cloud: OrganizedCloud,
}

// ────────────────────────────────────────────────────────────────────────────
// Regions of interest and raw detections
// ────────────────────────────────────────────────────────────────────────────

/// A rectangular region of interest in the camera frame (pixels).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Roi {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Roi {
    /// Length of the rectangle diagonal in pixels: `sqrt(w² + h²)`.
    ///
    /// Used to reject implausibly small or large 2-D detections.
    pub fn diagonal(&self) -> f64 {
        let w = self.width as f64;
        let h = self.height as f64;
        (w * w + h * h).sqrt()
    }
}

/// A single detection from the 2-D visual detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection2D {
    pub class_name: String,
    /// Detector confidence in `[0, 1]`.
    pub confidence: f32,
    pub roi: Roi,
}

/// An axis-aligned 3-D bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox3D {
    pub center: Vec3,
    /// Half-extent along each axis.
    pub extents: Vec3,
}

/// A cluster produced by the 3-D geometric segmenter.  Ephemeral: owned by
/// the fusion run that consumed it.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection3D {
    pub points: Vec<Vec3>,
    pub bounding_box: BoundingBox3D,
}
