//! Incremental re-planning after a single input change.
//!
//! The old tree is walked in the same depth-first order a build would use,
//! threading the same working state. A subtree whose item cannot reach any
//! dirty key through recipes is reused verbatim and its consumption replayed.
//! A touched node refreshes its chosen method first; when that got no more
//! expensive and no competing candidate can see a dirty key, the choice
//! stands. Otherwise every candidate is re-costed against the entry state.
//!
//! Whenever a re-evaluated subtree draws owned units or cooldown capacity
//! differently than before, those keys become dirty for the rest of the walk.
//! The result is the tree a full rebuild would produce.

use crate::builder::{BuildPass, Seed, TreeBuilder};
use crate::catalog::{AcquisitionMethod, MethodKey, RecipeCatalog, recipe_items};
use crate::config::PlannerConfig;
use crate::dirty::DirtyTracker;
use crate::error::PlanError;
use crate::fixed::Fixed64;
use crate::id::{CooldownSourceId, ItemId};
use crate::tree::{AcquisitionTree, TreeNode};
use chrono::{DateTime, Utc};
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, trace};

/// A single change to the inputs of a plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    /// New unit price for one directly priced method of an item.
    PriceChanged {
        item: ItemId,
        method: MethodKey,
        price: Fixed64,
    },
    /// New owned count of an item.
    OwnedInventoryChanged { item: ItemId, quantity: u64 },
    /// New remaining capacity of a cooldown source's current window.
    CooldownCapacityChanged {
        source: CooldownSourceId,
        remaining: u32,
    },
    /// New requested amount of the root item.
    RequestedQuantityChanged(u64),
    /// New evaluation time.
    ClockAdvanced(DateTime<Utc>),
}

/// How much of the old tree an update could keep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateReport {
    /// Nodes copied from the old tree unchanged.
    pub reused: usize,
    /// Nodes whose chosen method was re-costed and kept.
    pub refreshed: usize,
    /// Nodes whose method was selected again from all candidates.
    pub rebuilt: usize,
    /// The whole tree was built from scratch.
    pub full_rebuild: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Updated {
    pub tree: AcquisitionTree,
    pub report: UpdateReport,
}

/// Items and cooldown sources a subtree rooted at an item can depend on.
#[derive(Debug, Clone, Default)]
struct Reach {
    items: BTreeSet<ItemId>,
    sources: BTreeSet<CooldownSourceId>,
}

impl Reach {
    fn of<C: RecipeCatalog + ?Sized>(catalog: &C, item: ItemId) -> Self {
        let items = recipe_items(catalog, item);
        let sources = items
            .iter()
            .flat_map(|i| catalog.lookup_methods(*i))
            .filter_map(|m| match m {
                AcquisitionMethod::Cooldown(offer) => Some(offer.source),
                _ => None,
            })
            .collect();
        Self { items, sources }
    }
}

/// Applies [`Change`]s to existing trees.
pub struct TreeUpdater<'a, C: RecipeCatalog + ?Sized> {
    catalog: &'a C,
    config: &'a PlannerConfig,
}

impl<'a, C: RecipeCatalog + ?Sized> TreeUpdater<'a, C> {
    pub fn new(catalog: &'a C, config: &'a PlannerConfig) -> Self {
        Self { catalog, config }
    }

    /// Re-plan `tree` with `change` applied to its snapshot.
    pub fn update(&self, tree: &AcquisitionTree, change: Change) -> Result<Updated, PlanError> {
        let item = tree.item();
        let mut quantity = tree.quantity();
        let mut snapshot = tree.snapshot().clone();
        let mut dirty = DirtyTracker::new();

        match change {
            Change::PriceChanged {
                item: target,
                method,
                price,
            } => {
                if !self.catalog.contains(target) {
                    return Err(PlanError::UnknownItem(target));
                }
                let priced = self
                    .catalog
                    .lookup_methods(target)
                    .iter()
                    .any(|m| m.key() == method && m.unit_price().is_some());
                if !priced {
                    return Err(PlanError::UnpricedMethod {
                        item: target,
                        method,
                    });
                }
                snapshot.prices.set(target, method, price);
                dirty.mark_item(target);
            }
            Change::OwnedInventoryChanged {
                item: target,
                quantity: owned,
            } => {
                if !self.catalog.contains(target) {
                    return Err(PlanError::UnknownItem(target));
                }
                snapshot.inventory.set(target, owned);
                dirty.mark_item(target);
            }
            Change::CooldownCapacityChanged { source, remaining } => {
                let schedule = self
                    .catalog
                    .schedule_of(source)
                    .ok_or(PlanError::UnknownCooldownSource(source))?;
                snapshot
                    .cooldowns
                    .set_remaining(source, schedule, remaining, snapshot.at);
                dirty.mark_source(source);
            }
            Change::RequestedQuantityChanged(new_quantity) => {
                quantity = new_quantity;
            }
            Change::ClockAdvanced(at) => {
                if at < snapshot.at {
                    dirty.mark_all_sources();
                } else {
                    for source in Reach::of(self.catalog, item).sources {
                        let crossed = self
                            .catalog
                            .schedule_of(source)
                            .is_some_and(|s| s.next_reset_after(snapshot.at) <= at);
                        if crossed {
                            dirty.mark_source(source);
                        }
                    }
                }
                snapshot.at = at;
            }
        }

        if quantity != tree.quantity() {
            debug!(?item, quantity, "requested quantity changed, rebuilding");
            let tree = TreeBuilder::new(self.catalog, self.config).build(item, quantity, snapshot)?;
            let report = UpdateReport {
                rebuilt: tree.root().node_count(),
                full_rebuild: true,
                ..UpdateReport::default()
            };
            return Ok(Updated { tree, report });
        }

        debug!(
            ?item,
            quantity,
            dirty_items = dirty.dirty_items().len(),
            dirty_sources = dirty.dirty_sources().len(),
            "updating acquisition tree"
        );
        let (root, report) = {
            let mut refresh = Refresh {
                catalog: self.catalog,
                pass: BuildPass::new(self.catalog, self.config, &snapshot),
                reach: HashMap::new(),
                dirty,
                report: UpdateReport::default(),
            };
            let root = refresh.node(tree.root())?;
            (root, refresh.report)
        };
        debug!(
            ?item,
            quantity,
            cost = %root.cost,
            reused = report.reused,
            refreshed = report.refreshed,
            rebuilt = report.rebuilt,
            "updated acquisition tree"
        );
        Ok(Updated {
            tree: AcquisitionTree::new(root, snapshot),
            report,
        })
    }
}

// ---------------------------------------------------------------------------
// Refresh walk
// ---------------------------------------------------------------------------

struct Refresh<'a, C: RecipeCatalog + ?Sized> {
    catalog: &'a C,
    pass: BuildPass<'a, C>,
    reach: HashMap<ItemId, Reach>,
    dirty: DirtyTracker,
    report: UpdateReport,
}

impl<'a, C: RecipeCatalog + ?Sized> Refresh<'a, C> {
    /// The new node standing where `old` stood.
    fn node(&mut self, old: &TreeNode) -> Result<TreeNode, PlanError> {
        if !self.touched(old.item) {
            self.pass.apply_footprint(&old.footprint())?;
            self.report.reused += old.node_count();
            return Ok(old.clone());
        }

        let node = self.reexpand(old)?;
        self.dirty
            .mark_footprint_delta(&old.footprint(), &node.footprint());
        Ok(node)
    }

    fn touched(&mut self, item: ItemId) -> bool {
        let catalog = self.catalog;
        let reach = self
            .reach
            .entry(item)
            .or_insert_with(|| Reach::of(catalog, item));
        self.dirty.touches(&reach.items, &reach.sources)
    }

    fn reexpand(&mut self, old: &TreeNode) -> Result<TreeNode, PlanError> {
        let item = old.item;
        if self.pass.is_on_path(item) {
            return Err(PlanError::CyclicRecipe(item));
        }

        let owned_used = self.pass.take_owned(item, old.quantity);
        if owned_used == old.quantity {
            self.report.rebuilt += 1;
            return Ok(TreeNode::owned(item, old.quantity));
        }

        let remaining = old.quantity - owned_used;
        let mut node = match old.method.key() {
            Some(key) if old.remaining() == remaining => self.reselect(old, key, remaining)?,
            _ => {
                let node = self.pass.resolve(item, remaining)?;
                self.report.rebuilt += node.node_count();
                node
            }
        };
        node.quantity = old.quantity;
        node.owned_used = owned_used;
        Ok(node)
    }

    /// Re-cost the method `old` chose, then decide whether it still wins.
    fn reselect(
        &mut self,
        old: &TreeNode,
        key: MethodKey,
        remaining: u64,
    ) -> Result<TreeNode, PlanError> {
        let item = old.item;
        let Some(chosen) = self.pass.methods(item).iter().find(|m| m.key() == key) else {
            let node = self.pass.resolve(item, remaining)?;
            self.report.rebuilt += node.node_count();
            return Ok(node);
        };

        let entry = self.pass.save_state();
        let outcome = self.refresh_method(old, chosen, remaining);
        let outcome = match outcome {
            Ok(Some(node)) if node.cost <= old.cost && self.alternatives_clean(item, key) => {
                trace!(?item, remaining, cost = %node.cost, "kept chosen method");
                self.report.refreshed += 1;
                return Ok(node);
            }
            other => other,
        };

        let after = self.pass.save_state();
        self.pass.restore(entry);
        self.report.rebuilt += 1;
        self.pass.select(
            item,
            remaining,
            Some(Seed {
                key,
                outcome,
                after,
            }),
        )
    }

    /// Outcome of `method` for `old`'s item, reusing `old`'s children when
    /// the method is the recipe they were built for.
    fn refresh_method(
        &mut self,
        old: &TreeNode,
        method: &'a AcquisitionMethod,
        remaining: u64,
    ) -> Result<Option<TreeNode>, PlanError> {
        match method {
            AcquisitionMethod::Craft(recipe)
                if !self.pass.config().is_craft_disabled(old.item) =>
            {
                self.pass.enter(old.item)?;
                let children = old
                    .children
                    .iter()
                    .map(|child| self.node(child))
                    .collect::<Result<Vec<_>, _>>();
                self.pass.leave();
                Ok(Some(TreeNode::crafted(
                    old.item, remaining, recipe.id, old.crafts, children?,
                )))
            }
            _ => self.pass.evaluate(old.item, remaining, method),
        }
    }

    /// Whether every candidate other than `key` is unaffected by dirty keys.
    fn alternatives_clean(&mut self, item: ItemId, key: MethodKey) -> bool {
        let methods = self.pass.methods(item);
        methods
            .iter()
            .filter(|m| m.key() != key)
            .all(|m| !self.method_touched(item, m))
    }

    fn method_touched(&mut self, item: ItemId, method: &AcquisitionMethod) -> bool {
        match method {
            AcquisitionMethod::Vendor(_) => self.dirty.is_item_dirty(item),
            AcquisitionMethod::Cooldown(offer) => {
                self.dirty.is_item_dirty(item) || self.dirty.is_source_dirty(offer.source)
            }
            AcquisitionMethod::Craft(recipe) => {
                recipe.ingredients.iter().any(|ing| self.touched(ing.item))
            }
        }
    }
}
