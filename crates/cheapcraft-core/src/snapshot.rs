use crate::cooldown::CooldownState;
use crate::cost::PriceBook;
use crate::inventory::Inventory;
use chrono::{DateTime, Utc};

/// Every time-varying input of a plan, captured at the start of a call.
///
/// A tree keeps the snapshot it was computed from, so an update only needs
/// the tree and the change. External updates to the caller's own copies
/// take effect on the next call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub inventory: Inventory,
    pub cooldowns: CooldownState,
    pub prices: PriceBook,
    pub at: DateTime<Utc>,
}

impl Snapshot {
    /// Empty inventory, untouched cooldowns, catalog prices.
    pub fn new(at: DateTime<Utc>) -> Self {
        Self {
            inventory: Inventory::new(),
            cooldowns: CooldownState::new(),
            prices: PriceBook::new(),
            at,
        }
    }

    pub fn with_inventory(mut self, inventory: Inventory) -> Self {
        self.inventory = inventory;
        self
    }

    pub fn with_cooldowns(mut self, cooldowns: CooldownState) -> Self {
        self.cooldowns = cooldowns;
        self
    }

    pub fn with_prices(mut self, prices: PriceBook) -> Self {
        self.prices = prices;
        self
    }
}
