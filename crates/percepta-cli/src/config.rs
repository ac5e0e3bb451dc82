//! Configuration-file loading for the binary.
//!
//! The pipeline tunables live in a single TOML file; every field is
//! optional and falls back to its default (see
//! [`RecognitionConfig`][percepta_runtime::RecognitionConfig]).

use std::path::Path;

use percepta_runtime::RecognitionConfig;
use percepta_types::RecogError;

/// Read and parse the configuration file at `path`.
pub fn load(path: &Path) -> Result<RecognitionConfig, RecogError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| RecogError::Config(format!("reading {}: {e}", path.display())))?;
    toml::from_str(&text)
        .map_err(|e| RecogError::Config(format!("parsing {}: {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_a_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
target_frame_id = "arm_base"
debug_mode = true

[roi_filter]
enabled = true
"#
        )
        .unwrap();

        let config = load(file.path()).unwrap();
        assert_eq!(config.target_frame_id, "arm_base");
        assert!(config.debug_mode);
        assert!(config.roi_filter.enabled);
        // Untouched sections keep their defaults.
        assert!((config.rgb.bbox_min_diag - 21.0).abs() < 1e-9);
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let err = load(Path::new("/nonexistent/percepta.toml")).unwrap_err();
        assert!(matches!(err, RecogError::Config(_)));
    }

    #[test]
    fn invalid_toml_is_a_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "debug_mode = maybe").unwrap();
        let err = load(file.path()).unwrap_err();
        assert!(matches!(err, RecogError::Config(_)));
    }
}
