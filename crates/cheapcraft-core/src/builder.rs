//! Cheapest-acquisition-tree construction.
//!
//! A build expands the requested item depth-first. At each node owned
//! inventory is used first; whatever is left is priced through every
//! candidate method and the cheapest wins. Craft candidates recurse into
//! their ingredients.
//!
//! Owned inventory and cooldown capacity are shared by the whole tree, so the
//! pass works on a private copy of both. Each candidate of a node starts from
//! the same entry state; only the winner's consumption is kept. Owned units
//! are therefore handed out greedily in expansion order.
//!
//! Identical `(item, quantity)` subproblems are memoized for the duration of
//! a pass, but only for items whose whole recipe closure held no owned units
//! when the pass started and reaches no cooldown source. Owned units only
//! ever decrease during a pass, so those subproblems never read shared state
//! and their result cannot depend on what earlier branches consumed. A memo
//! hit still yields a fresh node copy.

use crate::catalog::{AcquisitionMethod, MethodKey, RecipeCatalog, recipe_items};
use crate::config::PlannerConfig;
use crate::cooldown::CooldownState;
use crate::cost::{CostModel, Quote};
use crate::error::PlanError;
use crate::id::ItemId;
use crate::inventory::Inventory;
use crate::snapshot::Snapshot;
use crate::tree::{AcquisitionTree, ChosenMethod, Footprint, TreeNode};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tracing::{debug, trace};

/// Builds cost-minimal acquisition trees from a catalog.
pub struct TreeBuilder<'a, C: RecipeCatalog + ?Sized> {
    catalog: &'a C,
    config: &'a PlannerConfig,
}

impl<'a, C: RecipeCatalog + ?Sized> TreeBuilder<'a, C> {
    pub fn new(catalog: &'a C, config: &'a PlannerConfig) -> Self {
        Self { catalog, config }
    }

    /// Build the cheapest tree for `quantity` units of `item`.
    ///
    /// Fails without a partial tree when the quantity is zero, the item is
    /// unknown, a recipe cycle is reached, or no combination of methods can
    /// supply the request.
    pub fn build(
        &self,
        item: ItemId,
        quantity: u64,
        snapshot: Snapshot,
    ) -> Result<AcquisitionTree, PlanError> {
        if quantity == 0 {
            return Err(PlanError::InvalidQuantity(quantity));
        }
        if !self.catalog.contains(item) {
            return Err(PlanError::UnknownItem(item));
        }

        debug!(?item, quantity, "building acquisition tree");
        let root = BuildPass::new(self.catalog, self.config, &snapshot).expand(item, quantity)?;
        debug!(
            ?item,
            quantity,
            cost = %root.cost,
            nodes = root.node_count(),
            "built acquisition tree"
        );
        Ok(AcquisitionTree::new(root, snapshot))
    }
}

/// Shared state a pass consumes while expanding.
#[derive(Debug, Clone)]
pub(crate) struct WorkingState {
    inventory: Inventory,
    cooldowns: CooldownState,
}

/// A candidate outcome computed outside [`BuildPass::select`], together with
/// the state it leaves behind.
pub(crate) struct Seed {
    pub(crate) key: MethodKey,
    pub(crate) outcome: Result<Option<TreeNode>, PlanError>,
    pub(crate) after: WorkingState,
}

struct Choice {
    node: TreeNode,
    rank: usize,
    after: Option<WorkingState>,
}

/// One depth-first expansion over a private copy of the snapshot state.
pub(crate) struct BuildPass<'a, C: RecipeCatalog + ?Sized> {
    catalog: &'a C,
    config: &'a PlannerConfig,
    costs: CostModel<'a, C>,
    at: DateTime<Utc>,
    state: WorkingState,
    /// Inventory at the start of the pass; an upper bound for every later
    /// working state.
    initial_inventory: &'a Inventory,
    memo: HashMap<(ItemId, u64), TreeNode>,
    /// Per item: whether its subproblems can be memoized.
    memoizable: HashMap<ItemId, bool>,
    /// Items currently being crafted, outermost first.
    path: Vec<ItemId>,
    /// Count of shared-state reads. A candidate that leaves it unchanged
    /// did not touch the working state.
    reads: u64,
}

impl<'a, C: RecipeCatalog + ?Sized> BuildPass<'a, C> {
    pub(crate) fn new(catalog: &'a C, config: &'a PlannerConfig, snapshot: &'a Snapshot) -> Self {
        Self {
            catalog,
            config,
            costs: CostModel::new(catalog, &snapshot.prices, config),
            at: snapshot.at,
            state: WorkingState {
                inventory: snapshot.inventory.clone(),
                cooldowns: snapshot.cooldowns.clone(),
            },
            initial_inventory: &snapshot.inventory,
            memo: HashMap::new(),
            memoizable: HashMap::new(),
            path: Vec::new(),
            reads: 0,
        }
    }

    pub(crate) fn config(&self) -> &'a PlannerConfig {
        self.config
    }

    pub(crate) fn methods(&self, item: ItemId) -> &'a [AcquisitionMethod] {
        self.catalog.lookup_methods(item)
    }

    pub(crate) fn save_state(&self) -> WorkingState {
        self.state.clone()
    }

    pub(crate) fn restore(&mut self, state: WorkingState) {
        self.state = state;
    }

    /// Push `item` on the crafting path, rejecting recipe cycles.
    pub(crate) fn enter(&mut self, item: ItemId) -> Result<(), PlanError> {
        if self.path.contains(&item) {
            return Err(PlanError::CyclicRecipe(item));
        }
        self.path.push(item);
        Ok(())
    }

    pub(crate) fn leave(&mut self) {
        self.path.pop();
    }

    pub(crate) fn is_on_path(&self, item: ItemId) -> bool {
        self.path.contains(&item)
    }

    /// Take up to `quantity` owned units of `item`. Returns the units taken.
    pub(crate) fn take_owned(&mut self, item: ItemId, quantity: u64) -> u64 {
        if self.state.inventory.quantity_owned(item) == 0 {
            return 0;
        }
        self.reads += 1;
        self.state.inventory.remove(item, quantity)
    }

    /// Consume exactly what a previously built subtree consumed.
    pub(crate) fn apply_footprint(&mut self, footprint: &Footprint) -> Result<(), PlanError> {
        for (item, quantity) in &footprint.owned {
            let _ = self.state.inventory.remove(*item, *quantity);
        }
        for (source, quantity) in &footprint.cooldowns {
            if let Some(schedule) = self.catalog.schedule_of(*source) {
                self.state.cooldowns.consume(
                    *source,
                    schedule,
                    *quantity,
                    self.config.cooldown_carryover,
                    self.at,
                )?;
            }
        }
        Ok(())
    }

    /// Produce the node for `quantity` units of `item`: owned units first,
    /// then the cheapest method for the rest.
    pub(crate) fn expand(&mut self, item: ItemId, quantity: u64) -> Result<TreeNode, PlanError> {
        if self.is_on_path(item) {
            return Err(PlanError::CyclicRecipe(item));
        }

        let owned_used = self.take_owned(item, quantity);
        if owned_used == quantity {
            trace!(?item, quantity, "satisfied from inventory");
            return Ok(TreeNode::owned(item, quantity));
        }

        let mut node = self.resolve(item, quantity - owned_used)?;
        node.quantity = quantity;
        node.owned_used = owned_used;
        Ok(node)
    }

    /// Cheapest method for `quantity` units, memoized when state-independent.
    pub(crate) fn resolve(&mut self, item: ItemId, quantity: u64) -> Result<TreeNode, PlanError> {
        if !self.is_memoizable(item) {
            return self.select(item, quantity, None);
        }
        if let Some(node) = self.memo.get(&(item, quantity)) {
            trace!(?item, quantity, "memo hit");
            return Ok(node.clone());
        }

        let node = self.select(item, quantity, None)?;
        self.memo.insert((item, quantity), node.clone());
        Ok(node)
    }

    /// True when no item reachable from `item` was owned at the start of the
    /// pass or has a cooldown method.
    fn is_memoizable(&mut self, item: ItemId) -> bool {
        if let Some(&memoizable) = self.memoizable.get(&item) {
            return memoizable;
        }
        let memoizable = recipe_items(self.catalog, item).into_iter().all(|reached| {
            self.initial_inventory.quantity_owned(reached) == 0
                && !self
                    .catalog
                    .lookup_methods(reached)
                    .iter()
                    .any(|m| matches!(m, AcquisitionMethod::Cooldown(_)))
        });
        self.memoizable.insert(item, memoizable);
        memoizable
    }

    /// Price every candidate of `item` from the current state and keep the
    /// cheapest. Ties go to the preferred method kind, then catalog order.
    ///
    /// A `seed` supplies the outcome of one candidate that the caller already
    /// evaluated from the current state; it is used in place of evaluating
    /// that candidate again.
    pub(crate) fn select(
        &mut self,
        item: ItemId,
        quantity: u64,
        mut seed: Option<Seed>,
    ) -> Result<TreeNode, PlanError> {
        let entry = self.save_state();
        let mut best: Option<Choice> = None;
        let mut own_failure = None;
        let mut child_failure = None;

        for method in self.methods(item) {
            let (outcome, after) = match seed.take_if(|s| s.key == method.key()) {
                Some(seed) => (seed.outcome, Some(seed.after)),
                None => {
                    let reads = self.reads;
                    let outcome = self.evaluate(item, quantity, method);
                    if self.reads == reads {
                        (outcome, None)
                    } else {
                        let after = self.save_state();
                        self.restore(entry.clone());
                        (outcome, Some(after))
                    }
                }
            };

            match outcome {
                Ok(Some(node)) => {
                    let rank = self.config.preference_rank(node.method.kind());
                    let better = best.as_ref().is_none_or(|b| {
                        node.cost < b.node.cost || (node.cost == b.node.cost && rank < b.rank)
                    });
                    if better {
                        best = Some(Choice { node, rank, after });
                    }
                }
                Ok(None) => {}
                Err(PlanError::Unfulfillable {
                    item: failed,
                    shortfall,
                }) => {
                    let failure = PlanError::Unfulfillable {
                        item: failed,
                        shortfall,
                    };
                    if failed == item {
                        own_failure.get_or_insert(failure);
                    } else {
                        child_failure.get_or_insert(failure);
                    }
                }
                Err(other) => return Err(other),
            }
        }

        match best {
            Some(choice) => {
                if let Some(after) = choice.after {
                    self.restore(after);
                }
                trace!(
                    ?item,
                    quantity,
                    method = ?choice.node.method,
                    cost = %choice.node.cost,
                    "selected method"
                );
                Ok(choice.node)
            }
            None => Err(own_failure
                .or(child_failure)
                .unwrap_or(PlanError::Unfulfillable {
                    item,
                    shortfall: quantity,
                })),
        }
    }

    /// Outcome of one candidate method, applied to the current state.
    /// `Ok(None)` means the method is not a candidate under the policy.
    pub(crate) fn evaluate(
        &mut self,
        item: ItemId,
        quantity: u64,
        method: &'a AcquisitionMethod,
    ) -> Result<Option<TreeNode>, PlanError> {
        match method {
            AcquisitionMethod::Vendor(_) => {
                match self
                    .costs
                    .cost_of(item, quantity, method, &self.state.cooldowns, self.at)
                {
                    Quote::Available { cost, .. } => Ok(Some(TreeNode::purchased(
                        item,
                        quantity,
                        ChosenMethod::from(method.key()),
                        cost,
                    ))),
                    _ => Ok(None),
                }
            }
            AcquisitionMethod::Cooldown(offer) => {
                self.reads += 1;
                match self
                    .costs
                    .cost_of(item, quantity, method, &self.state.cooldowns, self.at)
                {
                    Quote::Available {
                        cost,
                        extra_windows,
                    } => {
                        if let Some(schedule) = self.catalog.schedule_of(offer.source) {
                            self.state.cooldowns.consume(
                                offer.source,
                                schedule,
                                quantity,
                                self.config.cooldown_carryover,
                                self.at,
                            )?;
                        }
                        if extra_windows > 0 {
                            trace!(?item, quantity, extra_windows, "cooldown carries over");
                        }
                        Ok(Some(TreeNode::purchased(
                            item,
                            quantity,
                            ChosenMethod::Cooldown(offer.source),
                            cost,
                        )))
                    }
                    Quote::Unavailable { shortfall } => {
                        Err(PlanError::Unfulfillable { item, shortfall })
                    }
                    Quote::Excluded | Quote::Composite => Ok(None),
                }
            }
            AcquisitionMethod::Craft(recipe) => {
                if self.config.is_craft_disabled(item) {
                    return Ok(None);
                }
                let crafts = recipe.crafts_for(quantity);
                self.enter(item)?;
                let children = recipe
                    .ingredients
                    .iter()
                    .map(|ing| self.expand(ing.item, u64::from(ing.quantity).saturating_mul(crafts)))
                    .collect::<Result<Vec<_>, _>>();
                self.leave();
                Ok(Some(TreeNode::crafted(
                    item, quantity, recipe.id, crafts, children?,
                )))
            }
        }
    }
}
