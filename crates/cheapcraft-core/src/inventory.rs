use crate::id::ItemId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Owned item counts supplied by the caller. The planner works on its own
/// copy and never writes back.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    stacks: BTreeMap<ItemId, u64>,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of units of `item` owned.
    pub fn quantity_owned(&self, item: ItemId) -> u64 {
        self.stacks.get(&item).copied().unwrap_or(0)
    }

    /// Replace the owned count of `item`.
    pub fn set(&mut self, item: ItemId, quantity: u64) {
        if quantity == 0 {
            self.stacks.remove(&item);
        } else {
            self.stacks.insert(item, quantity);
        }
    }

    pub fn add(&mut self, item: ItemId, quantity: u64) {
        let current = self.quantity_owned(item);
        self.set(item, current.saturating_add(quantity));
    }

    /// Remove up to `quantity` units. Returns the amount actually removed.
    #[must_use = "returns the quantity actually removed, which may be less than requested"]
    pub fn remove(&mut self, item: ItemId, quantity: u64) -> u64 {
        let current = self.quantity_owned(item);
        let removed = current.min(quantity);
        self.set(item, current - removed);
        removed
    }

    pub fn is_empty(&self) -> bool {
        self.stacks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ItemId, u64)> + '_ {
        self.stacks.iter().map(|(item, qty)| (*item, *qty))
    }
}

impl FromIterator<(ItemId, u64)> for Inventory {
    fn from_iter<T: IntoIterator<Item = (ItemId, u64)>>(iter: T) -> Self {
        let mut inventory = Inventory::new();
        for (item, qty) in iter {
            inventory.add(item, qty);
        }
        inventory
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_item_is_zero() {
        let inventory = Inventory::new();
        assert_eq!(inventory.quantity_owned(ItemId(4)), 0);
    }

    #[test]
    fn remove_caps_at_owned() {
        let mut inventory = Inventory::new();
        inventory.set(ItemId(1), 3);
        assert_eq!(inventory.remove(ItemId(1), 5), 3);
        assert_eq!(inventory.quantity_owned(ItemId(1)), 0);
        assert!(inventory.is_empty());
    }

    #[test]
    fn collect_merges_duplicates() {
        let inventory: Inventory = [(ItemId(1), 2), (ItemId(1), 3), (ItemId(2), 1)]
            .into_iter()
            .collect();
        assert_eq!(inventory.quantity_owned(ItemId(1)), 5);
        assert_eq!(inventory.iter().count(), 2);
    }

    #[test]
    fn setting_zero_drops_entry() {
        let mut inventory = Inventory::new();
        inventory.set(ItemId(1), 2);
        inventory.set(ItemId(1), 0);
        assert!(inventory.is_empty());
    }
}
