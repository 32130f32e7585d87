//! Flat per-item totals of a tree.
//!
//! The tree keeps one node per occurrence of an item, so an item shared by
//! several branches is split over several nodes. These reductions merge them.

use crate::id::{CooldownSourceId, ItemId};
use crate::tree::{AcquisitionTree, ChosenMethod};
use std::collections::{BTreeMap, HashMap};

/// Total quantity of each item required anywhere in a tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UsageMap(pub HashMap<ItemId, u64>);

impl UsageMap {
    pub fn get(&self, item: ItemId) -> u64 {
        self.0.get(&item).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ItemId, u64)> + '_ {
        self.0.iter().map(|(item, qty)| (*item, *qty))
    }
}

/// Sum node quantities per item over the whole tree.
pub fn usage(tree: &AcquisitionTree) -> UsageMap {
    let mut totals = HashMap::new();
    for node in tree.iter() {
        *totals.entry(node.item).or_insert(0u64) += node.quantity;
    }
    UsageMap(totals)
}

/// Where the leaf units of a plan come from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UsedItems {
    /// Units bought from vendors.
    pub purchased: BTreeMap<ItemId, u64>,
    /// Units obtained from cooldown sources.
    pub from_cooldown: BTreeMap<ItemId, u64>,
    /// Owned units the plan consumes.
    pub from_inventory: BTreeMap<ItemId, u64>,
}

pub fn used_items(tree: &AcquisitionTree) -> UsedItems {
    let mut used = UsedItems::default();
    for node in tree.iter() {
        if node.owned_used > 0 {
            *used.from_inventory.entry(node.item).or_insert(0) += node.owned_used;
        }
        let bucket = match node.method {
            ChosenMethod::Vendor(_) => &mut used.purchased,
            ChosenMethod::Cooldown(_) => &mut used.from_cooldown,
            ChosenMethod::Owned | ChosenMethod::Craft(_) => continue,
        };
        *bucket.entry(node.item).or_insert(0) += node.remaining();
    }
    used
}

/// Units drawn from each cooldown source.
pub fn cooldown_usage(tree: &AcquisitionTree) -> HashMap<CooldownSourceId, u64> {
    tree.root().footprint().cooldowns.into_iter().collect()
}
