//! `percepta-adapters` – Collaborator seams
//!
//! The recognition core never talks to PCL, a neural network or a TF tree
//! directly.  It drives the traits in this crate; adapters translate them
//! into whatever the outside world actually runs.
//!
//! # Overview
//!
//! - [`SceneSegmenter`] – the 3-D geometric segmenter (plane extraction and
//!   clustering happen behind it).
//! - [`ImageRecognizer`] – the 2-D visual detector.
//! - [`TransformProvider`] – coordinate-frame transform lookup/apply.
//! - [`ObjectListSink`] / [`DebugSink`] – where fused results and debug
//!   visualizations go.
//! - [`sim`] – in-process stub implementations for headless tests and CI.

pub mod recognizer;
pub mod segmenter;
pub mod sim;
pub mod sinks;
pub mod transforms;

pub use recognizer::ImageRecognizer;
pub use segmenter::{SceneSegmenter, Segmentation};
pub use sinks::{
    CloudListSink, DebugSink, DetectionSource, ObjectListSink, RecordingCloudListSink,
    RecordingDebugSink, RecordingSink,
};
pub use transforms::{StaticTransforms, Transform3D, TransformProvider};
