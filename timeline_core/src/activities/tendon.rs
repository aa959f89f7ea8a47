//! Post-tensioning tendon stressing

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::{enable_flag, Activity};
use crate::ids::{DuctIndex, GirderId};

/// A tendon is identified by its girder and the duct index within that girder
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TendonKey {
    pub girder: GirderId,
    pub duct: DuctIndex,
}

impl TendonKey {
    pub fn new(girder: GirderId, duct: DuctIndex) -> Self {
        TendonKey { girder, duct }
    }
}

impl std::fmt::Display for TendonKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} duct {}", self.girder, self.duct + 1)
    }
}

/// Stressing of post-tensioning tendons
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StressTendon {
    enabled: bool,
    tendons: BTreeSet<TendonKey>,
}

impl StressTendon {
    pub fn tendons(&self) -> &BTreeSet<TendonKey> {
        &self.tendons
    }

    pub fn is_tendon_stressed(&self, girder: GirderId, duct: DuctIndex) -> bool {
        self.tendons.contains(&TendonKey::new(girder, duct))
    }

    pub fn add_tendon(&mut self, girder: GirderId, duct: DuctIndex) {
        self.tendons.insert(TendonKey::new(girder, duct));
        self.enabled = true;
    }

    pub fn remove_tendon(&mut self, girder: GirderId, duct: DuctIndex) {
        self.tendons.remove(&TendonKey::new(girder, duct));
    }

    /// Tendons of one girder stressed by this activity
    pub fn girder_tendons(&self, girder: GirderId) -> impl Iterator<Item = &TendonKey> {
        self.tendons.iter().filter(move |key| key.girder == girder)
    }
}

impl Activity for StressTendon {
    enable_flag!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tendon_membership() {
        let mut stress = StressTendon::default();
        stress.add_tendon(GirderId(0), 1);
        stress.add_tendon(GirderId(0), 1);
        stress.add_tendon(GirderId(1), 1);

        assert!(stress.is_enabled());
        assert_eq!(stress.tendons().len(), 2);
        assert!(stress.is_tendon_stressed(GirderId(1), 1));
        assert!(!stress.is_tendon_stressed(GirderId(1), 0));
        assert_eq!(stress.girder_tendons(GirderId(0)).count(), 1);

        stress.remove_tendon(GirderId(0), 1);
        assert!(!stress.is_tendon_stressed(GirderId(0), 1));
    }

    #[test]
    fn test_tendon_key_display() {
        assert_eq!(TendonKey::new(GirderId(2), 0).to_string(), "G2 duct 1");
    }
}
