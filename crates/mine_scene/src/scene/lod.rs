//! Level-of-detail selection
//!
//! Picks a detail tier per object from its distance to the camera. Tiers are
//! recomputed every frame, but a decision is only flagged as `changed` when
//! the tier differs from the one previously assigned to that id, so callers
//! swap geometry only on real transitions.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::equipment::{EquipmentKind, EquipmentPosition};
use crate::foundation::math::Vec3;
use crate::scene::coordinates::CoordinateTransformer;
use crate::scene::culling::CullingResult;

/// Detail tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LodTier {
    /// Full part decomposition
    High,
    /// Body plus one simplified feature
    Medium,
    /// Single unlit bounding primitive
    Low,
}

impl LodTier {
    /// Labels are drawn at High and Medium
    pub fn shows_label(&self) -> bool {
        matches!(self, Self::High | Self::Medium)
    }

    /// Hover highlight is only applied at High
    pub fn allows_hover_highlight(&self) -> bool {
        matches!(self, Self::High)
    }

    /// Whether the tier uses a lit material
    pub fn is_lit(&self) -> bool {
        !matches!(self, Self::Low)
    }
}

/// Distance thresholds for one equipment kind
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LodThresholds {
    /// Below this distance: High
    pub high: f32,
    /// Below this distance: Medium; otherwise Low
    pub medium: f32,
}

impl Default for LodThresholds {
    fn default() -> Self {
        Self { high: 50.0, medium: 150.0 }
    }
}

impl LodThresholds {
    /// Tier for a camera distance
    pub fn tier_for(&self, distance: f32) -> LodTier {
        if distance < self.high {
            LodTier::High
        } else if distance < self.medium {
            LodTier::Medium
        } else {
            LodTier::Low
        }
    }

    /// Whether `high <= medium`, both non-negative
    pub fn is_ordered(&self) -> bool {
        self.high >= 0.0 && self.high <= self.medium
    }
}

/// Per-kind LOD thresholds
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LodConfig {
    /// Excavator thresholds
    pub excavator: LodThresholds,
    /// Haul truck thresholds
    pub truck: LodThresholds,
    /// Conveyor thresholds
    pub conveyor: LodThresholds,
}

impl LodConfig {
    /// Thresholds for a kind
    pub fn thresholds(&self, kind: EquipmentKind) -> &LodThresholds {
        match kind {
            EquipmentKind::Excavator => &self.excavator,
            EquipmentKind::Truck => &self.truck,
            EquipmentKind::Conveyor => &self.conveyor,
        }
    }
}

/// Tier chosen for one object this frame
#[derive(Debug, Clone, PartialEq)]
pub struct LodDecision {
    /// Object id
    pub id: String,
    /// Selected tier
    pub tier: LodTier,
    /// Camera distance used
    pub distance: f32,
    /// True when the tier differs from the previously assigned tier
    pub changed: bool,
}

/// Stateful LOD selector remembering the last tier per id
#[derive(Debug, Default)]
pub struct LodSelector {
    config: LodConfig,
    assigned: HashMap<String, LodTier>,
    transitions: u64,
}

impl LodSelector {
    /// Create a selector
    pub fn new(config: LodConfig) -> Self {
        Self { config, assigned: HashMap::new(), transitions: 0 }
    }

    /// Active thresholds
    pub fn config(&self) -> &LodConfig {
        &self.config
    }

    /// Select a tier for one object and record it
    pub fn select(&mut self, id: &str, kind: EquipmentKind, distance: f32) -> LodDecision {
        let tier = self.config.thresholds(kind).tier_for(distance);
        let changed = match self.assigned.get_mut(id) {
            Some(previous) if *previous == tier => false,
            Some(previous) => {
                log::trace!("LOD {id}: {:?} -> {:?} at {distance:.1}", *previous, tier);
                *previous = tier;
                true
            }
            None => {
                self.assigned.insert(id.to_owned(), tier);
                true
            }
        };
        if changed {
            self.transitions += 1;
        }
        LodDecision { id: id.to_owned(), tier, distance, changed }
    }

    /// Select tiers for every piece of equipment the culler left visible
    ///
    /// Culled objects are skipped entirely and keep their previous assignment.
    pub fn select_visible(
        &mut self,
        camera_position: &Vec3,
        equipment: &[EquipmentPosition],
        transformer: &CoordinateTransformer,
        culling: &CullingResult,
    ) -> Vec<LodDecision> {
        equipment
            .iter()
            .filter(|item| !culling.is_culled(&item.id))
            .map(|item| {
                let distance = (transformer.resolve(&item.position) - camera_position).magnitude();
                self.select(&item.id, item.kind, distance)
            })
            .collect()
    }

    /// Tier last assigned to `id`
    pub fn current_tier(&self, id: &str) -> Option<LodTier> {
        self.assigned.get(id).copied()
    }

    /// Forget ids that are no longer in the snapshot
    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.assigned.retain(|id, _| keep(id));
    }

    /// Total tier transitions recorded (first assignments included)
    pub fn transition_count(&self) -> u64 {
        self.transitions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_thresholds() {
        let thresholds = LodThresholds::default();
        assert_eq!(thresholds.tier_for(0.0), LodTier::High);
        assert_eq!(thresholds.tier_for(49.9), LodTier::High);
        assert_eq!(thresholds.tier_for(50.0), LodTier::Medium);
        assert_eq!(thresholds.tier_for(149.9), LodTier::Medium);
        assert_eq!(thresholds.tier_for(150.0), LodTier::Low);
    }

    #[test]
    fn test_changed_only_on_transition() {
        let mut selector = LodSelector::default();
        assert!(selector.select("EX-01", EquipmentKind::Excavator, 10.0).changed);
        assert!(!selector.select("EX-01", EquipmentKind::Excavator, 12.0).changed);
        assert!(!selector.select("EX-01", EquipmentKind::Excavator, 49.0).changed);

        let decision = selector.select("EX-01", EquipmentKind::Excavator, 60.0);
        assert!(decision.changed);
        assert_eq!(decision.tier, LodTier::Medium);
        assert_eq!(selector.transition_count(), 2);
    }

    #[test]
    fn test_per_kind_thresholds() {
        let config = LodConfig {
            conveyor: LodThresholds { high: 100.0, medium: 300.0 },
            ..LodConfig::default()
        };
        let mut selector = LodSelector::new(config);
        assert_eq!(selector.select("CV-1", EquipmentKind::Conveyor, 80.0).tier, LodTier::High);
        assert_eq!(selector.select("HT-1", EquipmentKind::Truck, 80.0).tier, LodTier::Medium);
    }

    #[test]
    fn test_select_visible_skips_culled() {
        let transformer = CoordinateTransformer::default();
        let equipment = vec![
            EquipmentPosition::new("EX-01", EquipmentKind::Excavator, Vec3::new(1100.0, 1900.0, -25.0)),
            EquipmentPosition::new("HT-02", EquipmentKind::Truck, Vec3::new(1100.0, 1900.0, -25.0)),
        ];
        let culling = CullingResult::from_partition(vec!["EX-01".into()], vec!["HT-02".into()]);

        let mut selector = LodSelector::default();
        let decisions = selector.select_visible(&Vec3::zeros(), &equipment, &transformer, &culling);

        assert_eq!(decisions.len(), 1);
        assert_eq!(decisions[0].id, "EX-01");
        assert_eq!(decisions[0].tier, LodTier::High);
        assert!(selector.current_tier("HT-02").is_none());
    }

    #[test]
    fn test_tier_rendering_rules() {
        assert!(LodTier::High.shows_label() && LodTier::Medium.shows_label());
        assert!(!LodTier::Low.shows_label());
        assert!(LodTier::High.allows_hover_highlight());
        assert!(!LodTier::Medium.allows_hover_highlight());
        assert!(!LodTier::Low.is_lit());
    }

    #[test]
    fn test_retain_forgets_departed_ids() {
        let mut selector = LodSelector::default();
        selector.select("a", EquipmentKind::Truck, 1.0);
        selector.select("b", EquipmentKind::Truck, 1.0);
        selector.retain(|id| id == "a");
        assert!(selector.current_tier("a").is_some());
        assert!(selector.current_tier("b").is_none());
    }
}
