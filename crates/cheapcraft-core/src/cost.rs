//! Unit cost of directly priced acquisition methods.
//!
//! The cost model is a pure function of the catalog, the per-call price
//! overrides, and a cooldown state snapshot. It never mutates capacity;
//! the builder applies consumption to its own working copy.

use crate::catalog::{AcquisitionMethod, Currency, MethodKey, RecipeCatalog};
use crate::config::PlannerConfig;
use crate::cooldown::CooldownState;
use crate::fixed::{Fixed64, total_cost};
use crate::id::ItemId;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Per-call unit price overrides, keyed by item and method. Methods without
/// an override use the catalog price.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PriceBook {
    overrides: BTreeMap<(ItemId, MethodKey), Fixed64>,
}

impl PriceBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, item: ItemId, method: MethodKey, unit_price: Fixed64) {
        self.overrides.insert((item, method), unit_price);
    }

    pub fn get(&self, item: ItemId, method: MethodKey) -> Option<Fixed64> {
        self.overrides.get(&(item, method)).copied()
    }

    pub fn remove(&mut self, item: ItemId, method: MethodKey) -> Option<Fixed64> {
        self.overrides.remove(&(item, method))
    }

    pub fn len(&self) -> usize {
        self.overrides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.overrides.is_empty()
    }
}

/// Result of pricing one method for one quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quote {
    /// The method can supply the quantity. `extra_windows` counts the future
    /// reset windows a carryover fulfilment reaches into (always 0 for
    /// vendors and without carryover).
    Available { cost: Fixed64, extra_windows: u64 },

    /// A cooldown source cannot supply the quantity in the current window.
    Unavailable { shortfall: u64 },

    /// The method is not a candidate under the current policy (vendor in a
    /// different currency).
    Excluded,

    /// Crafted: the cost is the sum of the chosen ingredient nodes.
    Composite,
}

/// Prices vendor and cooldown methods against a snapshot.
pub struct CostModel<'a, C: RecipeCatalog + ?Sized> {
    catalog: &'a C,
    prices: &'a PriceBook,
    currency: Currency,
    carryover: bool,
}

impl<'a, C: RecipeCatalog + ?Sized> CostModel<'a, C> {
    pub fn new(catalog: &'a C, prices: &'a PriceBook, config: &PlannerConfig) -> Self {
        Self {
            catalog,
            prices,
            currency: config.currency,
            carryover: config.cooldown_carryover,
        }
    }

    /// Unit price of a directly priced method, override first.
    pub fn unit_price(&self, item: ItemId, method: &AcquisitionMethod) -> Option<Fixed64> {
        let catalog_price = method.unit_price()?;
        Some(self.prices.get(item, method.key()).unwrap_or(catalog_price))
    }

    /// Cost of obtaining `quantity` units of `item` through `method` at `at`.
    pub fn cost_of(
        &self,
        item: ItemId,
        quantity: u64,
        method: &AcquisitionMethod,
        cooldowns: &CooldownState,
        at: DateTime<Utc>,
    ) -> Quote {
        match method {
            AcquisitionMethod::Vendor(offer) => {
                if offer.currency != self.currency {
                    return Quote::Excluded;
                }
                let unit = self.unit_price(item, method).unwrap_or(offer.unit_price);
                Quote::Available {
                    cost: total_cost(unit, quantity),
                    extra_windows: 0,
                }
            }
            AcquisitionMethod::Cooldown(offer) => {
                let Some(schedule) = self.catalog.schedule_of(offer.source) else {
                    return Quote::Unavailable {
                        shortfall: quantity,
                    };
                };
                let window = cooldowns.window(offer.source, schedule, at);
                let remaining = u64::from(window.remaining);
                let unit = self.unit_price(item, method).unwrap_or(offer.unit_price);

                if remaining >= quantity {
                    return Quote::Available {
                        cost: total_cost(unit, quantity),
                        extra_windows: 0,
                    };
                }
                if self.carryover && schedule.capacity > 0 {
                    let ahead = window.reserved_ahead.saturating_add(quantity - remaining);
                    return Quote::Available {
                        cost: total_cost(unit, quantity),
                        extra_windows: ahead.div_ceil(u64::from(schedule.capacity)),
                    };
                }
                Quote::Unavailable {
                    shortfall: quantity - remaining,
                }
            }
            AcquisitionMethod::Craft(_) => Quote::Composite,
        }
    }
}
