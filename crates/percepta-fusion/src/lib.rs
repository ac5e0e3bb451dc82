//! `percepta-fusion` – Fusion and pose normalization
//!
//! Merges the two heterogeneous detection pathways into one consistent,
//! pose-normalized object list.
//!
//! # Modules
//!
//! - [`catalog`] – [`ObjectCatalog`][catalog::ObjectCatalog]: the static
//!   object catalog, loaded once, immutable afterwards; resolves each name
//!   to an [`ObjectClass`][percepta_types::ObjectClass] and canonical label.
//! - [`engine`] – [`FusionEngine`][engine::FusionEngine]: correlates 2-D
//!   detections against the organized 3-D scan, allocates image-band
//!   provenance ids and assembles the unified list.
//! - [`roi_filter`] – [`RegionOfInterestFilter`][roi_filter::RegionOfInterestFilter]:
//!   relabels objects outside the configured spatial envelope.
//! - [`normalizer`] – [`PoseNormalizer`][normalizer::PoseNormalizer]: the
//!   ordered pose-adjustment pass (yaw forcing, flattening, height rewrite,
//!   class corrections, alias rename).

pub mod catalog;
pub mod engine;
pub mod normalizer;
pub mod roi_filter;

pub use catalog::ObjectCatalog;
pub use engine::{FusionEngine, FusionInput, RgbFusionParams, RgbIdAllocator};
pub use normalizer::{NormalizerConfig, PoseNormalizer};
pub use roi_filter::{RegionOfInterestFilter, RoiFilterConfig};
