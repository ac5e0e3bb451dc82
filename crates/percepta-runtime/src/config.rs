//! [`RecognitionConfig`] – every pipeline tunable with its default.
//!
//! Deserialized from a TOML file by the binary; every field falls back to
//! its default when absent, so an empty file is a valid configuration.

use std::path::PathBuf;

use serde::Deserialize;

use percepta_fusion::engine::RgbFusionParams;
use percepta_fusion::normalizer::NormalizerConfig;
use percepta_fusion::roi_filter::RoiFilterConfig;

/// Top-level pipeline configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RecognitionConfig {
    /// Frame every emitted pose is expressed in.
    pub target_frame_id: String,
    /// Drive the debug sink with clusters, pose arrays and workspace height.
    pub debug_mode: bool,
    /// Run the 2-D visual detector.
    pub enable_rgb_recognizer: bool,
    /// Hand the segmented cloud list to an external cloud recognizer.
    pub enable_cloud_recognizer: bool,
    /// 2-D→3-D correlation tunables.
    pub rgb: RgbFusionParams,
    /// Spatial envelope check on fused objects.
    pub roi_filter: RoiFilterConfig,
    /// Height offsets for pose normalization.
    pub normalizer: NormalizerConfig,
    /// Object catalog file.  `None` runs with an empty catalog.
    pub catalog_path: Option<PathBuf>,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            target_frame_id: "base_link".to_string(),
            debug_mode: false,
            enable_rgb_recognizer: true,
            enable_cloud_recognizer: false,
            rgb: RgbFusionParams::default(),
            roi_filter: RoiFilterConfig::default(),
            normalizer: NormalizerConfig::default(),
            catalog_path: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_source_yields_defaults() {
        let config: RecognitionConfig = toml::from_str("").unwrap();
        assert_eq!(config.target_frame_id, "base_link");
        assert!(config.enable_rgb_recognizer);
        assert!(!config.debug_mode);
        assert!((config.rgb.bbox_max_diag - 200.0).abs() < 1e-9);
        assert!(!config.roi_filter.enabled);
    }

    #[test]
    fn partial_override_keeps_other_defaults() {
        let config: RecognitionConfig = toml::from_str(
            r#"
debug_mode = true

[rgb]
bbox_max_diag = 400.0
"#,
        )
        .unwrap();
        assert!(config.debug_mode);
        assert!((config.rgb.bbox_max_diag - 400.0).abs() < 1e-9);
        // Untouched nested field keeps its default.
        assert!((config.rgb.bbox_min_diag - 21.0).abs() < 1e-9);
        assert_eq!(config.target_frame_id, "base_link");
    }
}
