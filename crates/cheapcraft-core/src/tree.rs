//! Acquisition trees: the chosen, cost-minimal decomposition of a request.
//!
//! Every node exclusively owns its children. An item shared by several
//! branches appears once per branch; totals across branches are computed by
//! [`usage`](crate::usage::usage), never by aliasing nodes.

use crate::catalog::{Currency, MethodKey, MethodKind};
use crate::fixed::Fixed64;
use crate::id::{CooldownSourceId, ItemId, RecipeId};
use crate::snapshot::Snapshot;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The method a node settled on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ChosenMethod {
    /// Entirely satisfied from owned inventory.
    Owned,
    Vendor(Currency),
    Cooldown(CooldownSourceId),
    Craft(RecipeId),
}

impl ChosenMethod {
    pub fn kind(&self) -> MethodKind {
        match self {
            ChosenMethod::Owned => MethodKind::Owned,
            ChosenMethod::Vendor(_) => MethodKind::Vendor,
            ChosenMethod::Cooldown(_) => MethodKind::Cooldown,
            ChosenMethod::Craft(_) => MethodKind::Craft,
        }
    }

    /// Catalog method this choice refers to; `None` for owned.
    pub fn key(&self) -> Option<MethodKey> {
        match self {
            ChosenMethod::Owned => None,
            ChosenMethod::Vendor(currency) => Some(MethodKey::Vendor(*currency)),
            ChosenMethod::Cooldown(source) => Some(MethodKey::Cooldown(*source)),
            ChosenMethod::Craft(recipe) => Some(MethodKey::Recipe(*recipe)),
        }
    }
}

impl From<MethodKey> for ChosenMethod {
    fn from(key: MethodKey) -> Self {
        match key {
            MethodKey::Vendor(currency) => ChosenMethod::Vendor(currency),
            MethodKey::Recipe(recipe) => ChosenMethod::Craft(recipe),
            MethodKey::Cooldown(source) => ChosenMethod::Cooldown(source),
        }
    }
}

/// One acquisition decision for a quantity of one item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNode {
    pub item: ItemId,
    /// Units this node must provide to its parent.
    pub quantity: u64,
    /// Units taken from owned inventory; the rest goes through `method`.
    pub owned_used: u64,
    pub method: ChosenMethod,
    /// Cost of the whole node; zero for the owned part.
    pub cost: Fixed64,
    /// Number of recipe executions; zero unless crafted.
    pub crafts: u64,
    /// One node per recipe ingredient, in recipe order. Empty unless crafted.
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    /// A node fully satisfied from inventory.
    pub fn owned(item: ItemId, quantity: u64) -> Self {
        Self {
            item,
            quantity,
            owned_used: quantity,
            method: ChosenMethod::Owned,
            cost: Fixed64::ZERO,
            crafts: 0,
            children: Vec::new(),
        }
    }

    /// A vendor or cooldown purchase of `quantity` units.
    pub fn purchased(item: ItemId, quantity: u64, method: ChosenMethod, cost: Fixed64) -> Self {
        Self {
            item,
            quantity,
            owned_used: 0,
            method,
            cost,
            crafts: 0,
            children: Vec::new(),
        }
    }

    /// A crafted node; its cost is the sum of its children.
    pub fn crafted(
        item: ItemId,
        quantity: u64,
        recipe: RecipeId,
        crafts: u64,
        children: Vec<TreeNode>,
    ) -> Self {
        let cost = children
            .iter()
            .fold(Fixed64::ZERO, |acc, c| acc.saturating_add(c.cost));
        Self {
            item,
            quantity,
            owned_used: 0,
            method: ChosenMethod::Craft(recipe),
            cost,
            crafts,
            children,
        }
    }

    /// Units obtained through the chosen method rather than inventory.
    pub fn remaining(&self) -> u64 {
        self.quantity - self.owned_used
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Pre-order iterator over this node and all its descendants.
    pub fn iter(&self) -> Nodes<'_> {
        Nodes { stack: vec![self] }
    }

    pub fn node_count(&self) -> usize {
        self.iter().count()
    }

    /// Sum of the costs of every leaf below (or at) this node.
    pub fn leaf_cost(&self) -> Fixed64 {
        self.iter()
            .filter(|n| n.is_leaf())
            .fold(Fixed64::ZERO, |acc, n| acc.saturating_add(n.cost))
    }

    /// Shared state this subtree consumes.
    pub fn footprint(&self) -> Footprint {
        let mut footprint = Footprint::default();
        for node in self.iter() {
            if node.owned_used > 0 {
                *footprint.owned.entry(node.item).or_insert(0) += node.owned_used;
            }
            if let ChosenMethod::Cooldown(source) = node.method {
                *footprint.cooldowns.entry(source).or_insert(0) += node.remaining();
            }
        }
        footprint
    }
}

/// Pre-order traversal of a subtree. Children are visited in recipe order.
pub struct Nodes<'a> {
    stack: Vec<&'a TreeNode>,
}

impl<'a> Iterator for Nodes<'a> {
    type Item = &'a TreeNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

/// Owned units and cooldown capacity a subtree draws.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Footprint {
    pub owned: BTreeMap<ItemId, u64>,
    pub cooldowns: BTreeMap<CooldownSourceId, u64>,
}

/// The planned acquisition of a requested item, together with the inputs
/// it was computed from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcquisitionTree {
    root: TreeNode,
    snapshot: Snapshot,
    committed: bool,
}

impl AcquisitionTree {
    pub(crate) fn new(root: TreeNode, snapshot: Snapshot) -> Self {
        Self {
            root,
            snapshot,
            committed: false,
        }
    }

    pub fn root(&self) -> &TreeNode {
        &self.root
    }

    pub fn item(&self) -> ItemId {
        self.root.item
    }

    pub fn quantity(&self) -> u64 {
        self.root.quantity
    }

    /// Total cost of the plan.
    pub fn cost(&self) -> Fixed64 {
        self.root.cost
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// Whether the cooldown consumption of this plan has been committed.
    pub fn is_committed(&self) -> bool {
        self.committed
    }

    pub(crate) fn mark_committed(&mut self) {
        self.committed = true;
    }

    pub fn iter(&self) -> Nodes<'_> {
        self.root.iter()
    }
}
