//! Load application and geometry control

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::{enable_flag, Activity};
use crate::ids::LoadId;

// ============================================================================
// Apply Load
// ============================================================================

/// Application of loads to the bridge.
///
/// Every load category flag is single occurrence across the timeline; user
/// defined loads are owned by exactly one event. A flag only counts while the
/// activity is enabled.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplyLoad {
    enabled: bool,
    live_load: bool,
    rating_live_load: bool,
    railing_system: bool,
    overlay: bool,
    intermediate_diaphragm: bool,
    user_loads: BTreeSet<LoadId>,
}

impl ApplyLoad {
    /// Open the bridge to traffic
    pub fn apply_live_load(&mut self, apply: bool) {
        self.live_load = apply;
        self.enabled |= apply;
    }

    pub fn is_live_load_applied(&self) -> bool {
        self.enabled && self.live_load
    }

    /// Evaluate the load rating
    pub fn apply_rating_live_load(&mut self, apply: bool) {
        self.rating_live_load = apply;
        self.enabled |= apply;
    }

    pub fn is_rating_live_load_applied(&self) -> bool {
        self.enabled && self.rating_live_load
    }

    /// Install the traffic barrier / railing system
    pub fn apply_railing_system_load(&mut self, apply: bool) {
        self.railing_system = apply;
        self.enabled |= apply;
    }

    pub fn is_railing_system_load_applied(&self) -> bool {
        self.enabled && self.railing_system
    }

    /// Install the overlay
    pub fn apply_overlay_load(&mut self, apply: bool) {
        self.overlay = apply;
        self.enabled |= apply;
    }

    pub fn is_overlay_load_applied(&self) -> bool {
        self.enabled && self.overlay
    }

    /// Cast the intermediate diaphragms
    pub fn apply_intermediate_diaphragm_load(&mut self, apply: bool) {
        self.intermediate_diaphragm = apply;
        self.enabled |= apply;
    }

    pub fn is_intermediate_diaphragm_load_applied(&self) -> bool {
        self.enabled && self.intermediate_diaphragm
    }

    pub fn user_loads(&self) -> &BTreeSet<LoadId> {
        &self.user_loads
    }

    pub fn has_user_load(&self, id: LoadId) -> bool {
        self.user_loads.contains(&id)
    }

    pub fn add_user_load(&mut self, id: LoadId) {
        self.user_loads.insert(id);
        self.enabled = true;
    }

    pub fn remove_user_load(&mut self, id: LoadId) {
        self.user_loads.remove(&id);
    }

    pub fn is_user_load_applied(&self) -> bool {
        self.enabled && !self.user_loads.is_empty()
    }

    /// Clear every load category flag and user load
    pub fn clear(&mut self) {
        self.live_load = false;
        self.rating_live_load = false;
        self.railing_system = false;
        self.overlay = false;
        self.intermediate_diaphragm = false;
        self.user_loads.clear();
    }
}

impl Activity for ApplyLoad {
    enable_flag!();
}

// ============================================================================
// Geometry Control
// ============================================================================

/// Role of an event in roadway geometry control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum GeometryControlKind {
    #[default]
    Disabled,
    /// The event at which finished roadway elevations are controlled
    PrimaryEvent,
    /// Additional event reported for information
    SecondaryEvent,
}

/// Geometry control marker
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeometryControl {
    kind: GeometryControlKind,
}

impl GeometryControl {
    pub fn kind(&self) -> GeometryControlKind {
        self.kind
    }

    pub fn set_kind(&mut self, kind: GeometryControlKind) {
        self.kind = kind;
    }

    pub fn is_primary(&self) -> bool {
        self.kind == GeometryControlKind::PrimaryEvent
    }
}

impl Activity for GeometryControl {
    fn is_enabled(&self) -> bool {
        self.kind != GeometryControlKind::Disabled
    }

    /// Disabling sets [`GeometryControlKind::Disabled`]; enabling a disabled
    /// marker makes it a secondary event.
    fn enable(&mut self, enable: bool) {
        if !enable {
            self.kind = GeometryControlKind::Disabled;
        } else if self.kind == GeometryControlKind::Disabled {
            self.kind = GeometryControlKind::SecondaryEvent;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_flags_enable_activity() {
        let mut apply = ApplyLoad::default();
        assert!(!apply.is_enabled());

        apply.apply_railing_system_load(true);
        assert!(apply.is_enabled());
        assert!(apply.is_railing_system_load_applied());
        assert!(!apply.is_live_load_applied());
    }

    #[test]
    fn test_flags_inactive_when_disabled() {
        let mut apply = ApplyLoad::default();
        apply.apply_live_load(true);
        apply.enable(false);
        assert!(!apply.is_live_load_applied());

        apply.enable(true);
        assert!(apply.is_live_load_applied());
    }

    #[test]
    fn test_user_loads() {
        let mut apply = ApplyLoad::default();
        apply.add_user_load(LoadId(3));
        apply.add_user_load(LoadId(3));
        assert_eq!(apply.user_loads().len(), 1);
        assert!(apply.is_user_load_applied());

        apply.remove_user_load(LoadId(3));
        apply.remove_user_load(LoadId(8));
        assert!(!apply.is_user_load_applied());
    }

    #[test]
    fn test_geometry_control_enable() {
        let mut gc = GeometryControl::default();
        assert!(!gc.is_enabled());

        gc.enable(true);
        assert_eq!(gc.kind(), GeometryControlKind::SecondaryEvent);

        gc.set_kind(GeometryControlKind::PrimaryEvent);
        gc.enable(true);
        assert!(gc.is_primary());

        gc.enable(false);
        assert_eq!(gc.kind(), GeometryControlKind::Disabled);
    }
}
