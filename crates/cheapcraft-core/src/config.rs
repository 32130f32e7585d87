//! Planner policy knobs.

use crate::catalog::{Currency, MethodKind};
use crate::id::ItemId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Policy applied by the builder and updater.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Currency being minimized. Vendor offers in any other currency are
    /// not candidates.
    pub currency: Currency,

    /// Preference between methods of equal cost, most preferred first.
    /// Kinds missing from the list rank after every listed kind.
    pub tie_break: Vec<MethodKind>,

    /// Let a cooldown source fulfil more than its current window by
    /// reserving capacity from following windows.
    pub cooldown_carryover: bool,

    /// Items whose recipes must not be used.
    pub disabled_crafts: BTreeSet<ItemId>,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            currency: Currency::Coin,
            tie_break: vec![
                MethodKind::Owned,
                MethodKind::Vendor,
                MethodKind::Cooldown,
                MethodKind::Craft,
            ],
            cooldown_carryover: false,
            disabled_crafts: BTreeSet::new(),
        }
    }
}

impl PlannerConfig {
    /// Position of `kind` in the tie-break order; lower is preferred.
    pub fn preference_rank(&self, kind: MethodKind) -> usize {
        self.tie_break
            .iter()
            .position(|k| *k == kind)
            .unwrap_or(self.tie_break.len())
    }

    pub fn is_craft_disabled(&self, item: ItemId) -> bool {
        self.disabled_crafts.contains(&item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_prefers_simpler_methods() {
        let config = PlannerConfig::default();
        assert!(
            config.preference_rank(MethodKind::Vendor) < config.preference_rank(MethodKind::Cooldown)
        );
        assert!(
            config.preference_rank(MethodKind::Cooldown) < config.preference_rank(MethodKind::Craft)
        );
    }

    #[test]
    fn unlisted_kind_ranks_last() {
        let config = PlannerConfig {
            tie_break: vec![MethodKind::Craft],
            ..PlannerConfig::default()
        };
        assert_eq!(config.preference_rank(MethodKind::Craft), 0);
        assert_eq!(config.preference_rank(MethodKind::Vendor), 1);
    }

    #[test]
    fn deserializes_with_defaults() {
        let config: PlannerConfig =
            serde_json::from_str(r#"{ "cooldown_carryover": true }"#).unwrap();
        assert!(config.cooldown_carryover);
        assert_eq!(config.currency, Currency::Coin);
        assert_eq!(config.tie_break.len(), 4);
    }
}
