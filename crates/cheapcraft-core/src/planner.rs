//! Entry point bundling a catalog with a planner configuration.

use crate::builder::TreeBuilder;
use crate::catalog::RecipeCatalog;
use crate::config::PlannerConfig;
use crate::cooldown::CooldownState;
use crate::error::PlanError;
use crate::id::ItemId;
use crate::snapshot::Snapshot;
use crate::tree::AcquisitionTree;
use crate::updater::{Change, TreeUpdater, Updated};
use tracing::debug;

/// Plans acquisitions against one catalog under one policy.
///
/// Holds no per-plan state: every call works on the snapshot it is given
/// (or the one stored in the tree), so one planner can serve any number of
/// independent plans.
pub struct Planner<'a, C: RecipeCatalog + ?Sized> {
    catalog: &'a C,
    config: PlannerConfig,
}

impl<'a, C: RecipeCatalog + ?Sized> Planner<'a, C> {
    pub fn new(catalog: &'a C, config: PlannerConfig) -> Self {
        Self { catalog, config }
    }

    pub fn catalog(&self) -> &'a C {
        self.catalog
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Cheapest tree for `quantity` units of `item` under `snapshot`.
    pub fn build(
        &self,
        item: ItemId,
        quantity: u64,
        snapshot: Snapshot,
    ) -> Result<AcquisitionTree, PlanError> {
        TreeBuilder::new(self.catalog, &self.config).build(item, quantity, snapshot)
    }

    /// Re-plan `tree` after one input change.
    pub fn update(&self, tree: &AcquisitionTree, change: Change) -> Result<Updated, PlanError> {
        TreeUpdater::new(self.catalog, &self.config).update(tree, change)
    }

    /// Apply the cooldown consumption of an accepted plan to the caller's
    /// state, at the plan's evaluation time.
    ///
    /// All-or-nothing: if any source can no longer supply its share,
    /// `cooldowns` is left untouched. A tree can be committed once.
    pub fn commit(
        &self,
        tree: &mut AcquisitionTree,
        cooldowns: &mut CooldownState,
    ) -> Result<(), PlanError> {
        if tree.is_committed() {
            return Err(PlanError::AlreadyCommitted);
        }

        let at = tree.snapshot().at;
        let mut next = cooldowns.clone();
        for (source, quantity) in tree.root().footprint().cooldowns {
            let schedule = self
                .catalog
                .schedule_of(source)
                .ok_or(PlanError::UnknownCooldownSource(source))?;
            next.consume(source, schedule, quantity, self.config.cooldown_carryover, at)?;
            debug!(?source, quantity, "committed cooldown usage");
        }

        *cooldowns = next;
        tree.mark_committed();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;

    #[test]
    fn commit_consumes_cooldown_once() {
        let shop = potion_shop();
        let planner = Planner::new(&shop.catalog, PlannerConfig::default());
        let mut tree = planner.build(shop.lantern, 1, snapshot()).unwrap();
        let mut cooldowns = CooldownState::new();

        planner.commit(&mut tree, &mut cooldowns).unwrap();
        assert!(tree.is_committed());
        let schedule = shop.catalog.schedule_of(shop.quartz_source).unwrap();
        assert_eq!(
            cooldowns.remaining_capacity(shop.quartz_source, schedule, noon()),
            0
        );

        assert_eq!(
            planner.commit(&mut tree, &mut cooldowns).unwrap_err(),
            PlanError::AlreadyCommitted
        );
    }

    #[test]
    fn commit_against_spent_state_fails_atomically() {
        let jewelry = jewelry_set();
        let planner = Planner::new(&jewelry.catalog, PlannerConfig::default());
        let mut first = planner.build(jewelry.set, 1, snapshot()).unwrap();
        let mut second = planner.build(jewelry.ring, 1, snapshot()).unwrap();
        let mut cooldowns = CooldownState::new();

        planner.commit(&mut first, &mut cooldowns).unwrap();
        let before = cooldowns.clone();
        let err = planner.commit(&mut second, &mut cooldowns).unwrap_err();

        assert!(matches!(err, PlanError::CapacityExceeded { requested: 1, remaining: 0, .. }));
        assert_eq!(cooldowns, before);
        assert!(!second.is_committed());
    }

    #[test]
    fn commit_without_cooldowns_is_a_no_op() {
        let shop = potion_shop();
        let planner = Planner::new(&shop.catalog, PlannerConfig::default());
        let mut tree = planner.build(shop.potion, 1, snapshot()).unwrap();
        let mut cooldowns = CooldownState::new();
        planner.commit(&mut tree, &mut cooldowns).unwrap();
        assert_eq!(cooldowns, CooldownState::new());
    }

    #[test]
    fn update_through_planner() {
        let shop = potion_shop();
        let planner = Planner::new(&shop.catalog, PlannerConfig::default());
        let tree = planner.build(shop.potion, 1, snapshot()).unwrap();
        let updated = planner
            .update(
                &tree,
                Change::OwnedInventoryChanged {
                    item: shop.vial,
                    quantity: 1,
                },
            )
            .unwrap();
        assert_eq!(updated.tree.cost(), coins(4.0));
        assert_eq!(updated.tree.snapshot().inventory.quantity_owned(shop.vial), 1);
    }
}
