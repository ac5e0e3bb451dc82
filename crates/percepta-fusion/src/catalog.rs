//! The static object catalog.
//!
//! A TOML file lists every known object as `{ name, shape, color }`.
//! Entries whose shape is the round sentinel (`"sphere"`) form the
//! round-object set: their yaw is undefined by rotational symmetry and is
//! forced to zero during normalization.  The catalog also owns the alias
//! table that maps internal container labels to their canonical published
//! names.
//!
//! A missing `[object_info]` section is non-fatal: the catalog loads empty
//! and the pipeline continues with zero round objects.
//!
//! # File format
//!
//! ```toml
//! [[object_info.object]]
//! name = "S40_40_B"
//! shape = "sphere"
//! color = "blue"
//!
//! [[object_info.object]]
//! name = "M20_100"
//! shape = "other"
//! color = "grey"
//! ```

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;
use tracing::{info, warn};

use percepta_types::{ObjectClass, RecogError};

/// Shape value that marks an entry as rotationally symmetric.
const ROUND_SHAPE: &str = "sphere";

/// One catalog row.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CatalogEntry {
    pub name: String,
    pub shape: String,
    pub color: String,
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    object_info: Option<ObjectInfo>,
}

#[derive(Debug, Deserialize)]
struct ObjectInfo {
    #[serde(default)]
    object: Vec<CatalogEntry>,
}

// ────────────────────────────────────────────────────────────────────────────
// ObjectCatalog
// ────────────────────────────────────────────────────────────────────────────

/// The loaded catalog.  Immutable after load; share it behind an `Arc`.
#[derive(Debug, Default)]
pub struct ObjectCatalog {
    entries: Vec<CatalogEntry>,
    round: HashSet<String>,
}

impl ObjectCatalog {
    /// An empty catalog: nothing is round, everything is `Generic` unless
    /// its name matches a container or axis/bolt label.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load the catalog from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`RecogError::Catalog`] when the file cannot be read or
    /// parsed.  An absent `[object_info]` section is *not* an error.
    pub fn load(path: &Path) -> Result<Self, RecogError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| RecogError::Catalog(format!("cannot read {}: {e}", path.display())))?;
        Self::from_toml_str(&raw)
    }

    /// Parse the catalog from an in-memory TOML string.
    pub fn from_toml_str(raw: &str) -> Result<Self, RecogError> {
        let file: CatalogFile =
            toml::from_str(raw).map_err(|e| RecogError::Catalog(e.to_string()))?;

        let Some(info) = file.object_info else {
            warn!("no object info provided, continuing with an empty catalog");
            return Ok(Self::empty());
        };

        let round: HashSet<String> = info
            .object
            .iter()
            .filter(|e| e.shape == ROUND_SHAPE)
            .map(|e| e.name.clone())
            .collect();
        info!(
            entries = info.object.len(),
            round = round.len(),
            "object catalog loaded"
        );
        Ok(Self {
            entries: info.object,
            round,
        })
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    /// `true` when the catalog marks `name` as rotationally symmetric.
    pub fn is_round(&self, name: &str) -> bool {
        self.round.contains(name)
    }

    /// Resolve a detection name to its [`ObjectClass`] tag.
    ///
    /// Classification happens once here; every later pose-adjustment
    /// decision dispatches on the returned tag.
    pub fn classify(&self, name: &str) -> ObjectClass {
        if self.is_round(name) {
            return ObjectClass::Round;
        }
        match name {
            "BLUE_CONTAINER" | "RED_CONTAINER" | "CONTAINER_BOX_BLUE" | "CONTAINER_BOX_RED" => {
                ObjectClass::Container
            }
            "M20_100" | "AXIS" => ObjectClass::AxisBolt,
            _ => ObjectClass::Generic,
        }
    }

    /// Rewrite a catalog alias to the canonical published name.
    ///
    /// Applied exactly once per object, after all pose adjustments.
    pub fn canonical_name<'a>(&self, name: &'a str) -> &'a str {
        match name {
            "BLUE_CONTAINER" => "CONTAINER_BOX_BLUE",
            "RED_CONTAINER" => "CONTAINER_BOX_RED",
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const CATALOG: &str = r#"
[[object_info.object]]
name = "S40_40_B"
shape = "sphere"
color = "blue"

[[object_info.object]]
name = "BLUE_CONTAINER"
shape = "box"
color = "blue"

[[object_info.object]]
name = "M20_100"
shape = "other"
color = "grey"
"#;

    #[test]
    fn round_set_from_shape_sentinel() {
        let catalog = ObjectCatalog::from_toml_str(CATALOG).unwrap();
        assert!(catalog.is_round("S40_40_B"));
        assert!(!catalog.is_round("M20_100"));
        assert_eq!(catalog.entries().len(), 3);
    }

    #[test]
    fn classification_is_tag_based() {
        let catalog = ObjectCatalog::from_toml_str(CATALOG).unwrap();
        assert_eq!(catalog.classify("S40_40_B"), ObjectClass::Round);
        assert_eq!(catalog.classify("BLUE_CONTAINER"), ObjectClass::Container);
        assert_eq!(catalog.classify("CONTAINER_BOX_RED"), ObjectClass::Container);
        assert_eq!(catalog.classify("M20_100"), ObjectClass::AxisBolt);
        assert_eq!(catalog.classify("AXIS"), ObjectClass::AxisBolt);
        assert_eq!(catalog.classify("F20_20_G"), ObjectClass::Generic);
    }

    #[test]
    fn alias_rename() {
        let catalog = ObjectCatalog::from_toml_str(CATALOG).unwrap();
        assert_eq!(catalog.canonical_name("BLUE_CONTAINER"), "CONTAINER_BOX_BLUE");
        assert_eq!(catalog.canonical_name("RED_CONTAINER"), "CONTAINER_BOX_RED");
        assert_eq!(catalog.canonical_name("M20_100"), "M20_100");
    }

    #[test]
    fn missing_section_is_nonfatal() {
        let catalog = ObjectCatalog::from_toml_str("").unwrap();
        assert!(catalog.entries().is_empty());
        assert!(!catalog.is_round("S40_40_B"));
    }

    #[test]
    fn malformed_file_is_an_error() {
        assert!(matches!(
            ObjectCatalog::from_toml_str("object_info = 3"),
            Err(RecogError::Catalog(_))
        ));
    }

    #[test]
    fn loads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(CATALOG.as_bytes()).unwrap();
        let catalog = ObjectCatalog::load(file.path()).unwrap();
        assert!(catalog.is_round("S40_40_B"));
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(matches!(
            ObjectCatalog::load(Path::new("/nonexistent/objects.toml")),
            Err(RecogError::Catalog(_))
        ));
    }
}
