use crate::id::{CooldownSourceId, ItemId};
use crate::tree::Footprint;
use std::collections::{BTreeMap, BTreeSet};

/// Shared-state keys that differ between the snapshot a tree was built from
/// and the snapshot an update evaluates against.
///
/// Item keys cover both owned inventory and price overrides of that item;
/// source keys cover cooldown capacity. Keys are only ever added during an
/// update, so a subtree that touches no dirty key can be reused as is.
#[derive(Debug, Clone, Default)]
pub struct DirtyTracker {
    dirty_items: BTreeSet<ItemId>,
    dirty_sources: BTreeSet<CooldownSourceId>,
    all_sources_dirty: bool,
}

impl DirtyTracker {
    /// Create a new tracker with nothing dirty.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark an item's inventory or prices as changed.
    pub fn mark_item(&mut self, item: ItemId) {
        self.dirty_items.insert(item);
    }

    /// Mark a cooldown source's capacity as changed.
    pub fn mark_source(&mut self, source: CooldownSourceId) {
        self.dirty_sources.insert(source);
    }

    /// Mark every cooldown source as changed (e.g. time moved backwards).
    pub fn mark_all_sources(&mut self) {
        self.all_sources_dirty = true;
    }

    /// Mark every key whose consumption differs between two footprints.
    pub fn mark_footprint_delta(&mut self, before: &Footprint, after: &Footprint) {
        for item in differing_keys(&before.owned, &after.owned) {
            self.mark_item(item);
        }
        for source in differing_keys(&before.cooldowns, &after.cooldowns) {
            self.mark_source(source);
        }
    }

    /// Returns `true` if anything has been marked dirty.
    pub fn is_dirty(&self) -> bool {
        self.all_sources_dirty || !self.dirty_items.is_empty() || !self.dirty_sources.is_empty()
    }

    pub fn is_item_dirty(&self, item: ItemId) -> bool {
        self.dirty_items.contains(&item)
    }

    pub fn is_source_dirty(&self, source: CooldownSourceId) -> bool {
        self.all_sources_dirty || self.dirty_sources.contains(&source)
    }

    /// Whether any of the given items or sources is dirty.
    pub fn touches(&self, items: &BTreeSet<ItemId>, sources: &BTreeSet<CooldownSourceId>) -> bool {
        if self.all_sources_dirty && !sources.is_empty() {
            return true;
        }
        !self.dirty_items.is_disjoint(items) || !self.dirty_sources.is_disjoint(sources)
    }

    pub fn dirty_items(&self) -> &BTreeSet<ItemId> {
        &self.dirty_items
    }

    pub fn dirty_sources(&self) -> &BTreeSet<CooldownSourceId> {
        &self.dirty_sources
    }
}

fn differing_keys<K: Ord + Copy>(a: &BTreeMap<K, u64>, b: &BTreeMap<K, u64>) -> Vec<K> {
    a.keys()
        .chain(b.keys())
        .filter(|k| a.get(k) != b.get(k))
        .copied()
        .collect()
}
