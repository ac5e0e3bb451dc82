//! [`RegionOfInterestFilter`] – spatial envelope check on fused objects.
//!
//! Objects whose position along the configured axis falls outside
//! `[min_bound, max_bound]` are relabeled [`DECOY`][percepta_types::DECOY];
//! they stay in the list so later stages and downstream consumers still see
//! them.  Runs after fusion and before pose normalization.

use serde::Deserialize;
use tracing::warn;

use percepta_types::FusedObjectList;

/// Envelope bounds along the x axis of the target frame.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct RoiFilterConfig {
    pub enabled: bool,
    /// Closest accepted x position (metres).
    pub min_bound: f32,
    /// Farthest accepted x position (metres).
    pub max_bound: f32,
}

impl Default for RoiFilterConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            min_bound: 0.335,
            max_bound: 0.80,
        }
    }
}

/// Applies the envelope check when enabled.
#[derive(Debug, Default)]
pub struct RegionOfInterestFilter {
    config: RoiFilterConfig,
}

impl RegionOfInterestFilter {
    pub fn new(config: RoiFilterConfig) -> Self {
        Self { config }
    }

    /// Relabel every out-of-envelope object.  Never removes entries.
    pub fn apply(&self, list: &mut FusedObjectList) {
        if !self.config.enabled {
            return;
        }
        for object in list.objects.iter_mut() {
            let x = object.pose.pose.position.x;
            if x < self.config.min_bound || x > self.config.max_bound {
                warn!(name = %object.name, x, "object out of the region of interest");
                object.reject();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use percepta_types::{
        FusedObject, ObjectClass, Pose, PoseStamped, ProvenanceId, Vec3, DECOY,
    };

    fn object_at(x: f32) -> FusedObject {
        FusedObject {
            name: "F20_20_G".to_string(),
            class: ObjectClass::Generic,
            pose: PoseStamped::new(
                Pose::new(Vec3::new(x, 0.0, 0.0), Default::default()),
                "base_link",
            ),
            probability: 0.9,
            id: ProvenanceId(100),
            workstation: "WS01".to_string(),
            view: None,
        }
    }

    fn list_with(xs: &[f32]) -> FusedObjectList {
        let mut list = FusedObjectList::new("WS01");
        list.objects = xs.iter().map(|x| object_at(*x)).collect();
        list
    }

    #[test]
    fn disabled_filter_touches_nothing() {
        let filter = RegionOfInterestFilter::new(RoiFilterConfig::default());
        let mut list = list_with(&[10.0]);
        filter.apply(&mut list);
        assert!(!list.objects[0].is_decoy());
    }

    #[test]
    fn out_of_envelope_is_relabeled_not_removed() {
        let filter = RegionOfInterestFilter::new(RoiFilterConfig {
            enabled: true,
            ..RoiFilterConfig::default()
        });
        let mut list = list_with(&[0.1, 0.5, 2.0]);
        filter.apply(&mut list);
        assert_eq!(list.objects.len(), 3);
        assert_eq!(list.objects[0].name, DECOY); // below min
        assert_eq!(list.objects[1].name, "F20_20_G"); // inside
        assert_eq!(list.objects[2].name, DECOY); // above max
    }

    #[test]
    fn provenance_survives_relabeling() {
        let filter = RegionOfInterestFilter::new(RoiFilterConfig {
            enabled: true,
            ..RoiFilterConfig::default()
        });
        let mut list = list_with(&[5.0]);
        filter.apply(&mut list);
        assert_eq!(list.objects[0].id, ProvenanceId(100));
    }
}
