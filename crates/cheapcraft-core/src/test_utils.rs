//! Shared test helpers for integration tests and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]` so these helpers
//! are available in unit tests, integration tests, and benchmarks (via the
//! `test-utils` feature).

use crate::catalog::{Catalog, CatalogBuilder, Currency, Ingredient};
use crate::cooldown::CooldownSchedule;
use crate::fixed::Fixed64;
use crate::id::*;
use crate::snapshot::Snapshot;
use chrono::{DateTime, TimeZone, Utc};

// ===========================================================================
// Scalars
// ===========================================================================

pub fn coins(v: f64) -> Fixed64 {
    Fixed64::from_num(v)
}

/// A fixed evaluation time: 2024-03-04 12:00 UTC.
pub fn noon() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 4, 12, 0, 0)
        .single()
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

/// Empty inventory, untouched cooldowns, catalog prices, at [`noon`].
pub fn snapshot() -> Snapshot {
    Snapshot::new(noon())
}

// ===========================================================================
// Potion shop
// ===========================================================================

/// A small catalog covering vendors, recipes, shared ingredients, and a
/// cooldown source.
///
/// | Item           | Methods                                   |
/// |----------------|-------------------------------------------|
/// | Herb           | vendor 2                                  |
/// | Vial           | vendor 3                                  |
/// | Potion         | vendor 10; craft 2 Herb + 1 Vial          |
/// | Salve          | craft 3 Herb                              |
/// | Elixir         | craft 1 Potion + 2 Herb + 1 Salve         |
/// | Charged Quartz | cooldown 4 (daily, capacity 1)            |
/// | Lantern        | craft 1 Charged Quartz + 1 Vial           |
pub struct PotionShop {
    pub catalog: Catalog,
    pub herb: ItemId,
    pub vial: ItemId,
    pub potion: ItemId,
    pub salve: ItemId,
    pub elixir: ItemId,
    pub charged_quartz: ItemId,
    pub lantern: ItemId,
    pub quartz_source: CooldownSourceId,
}

pub fn potion_shop() -> PotionShop {
    let mut b = CatalogBuilder::new();
    let herb = b.register_item("Herb");
    let vial = b.register_item("Vial");
    let potion = b.register_item("Potion");
    let salve = b.register_item("Salve");
    let elixir = b.register_item("Elixir");
    let charged_quartz = b.register_item("Charged Quartz");
    let lantern = b.register_item("Lantern");
    let quartz_source = b.register_cooldown_source(CooldownSchedule::daily("quartz", 1));

    let ing = |item, quantity| Ingredient { item, quantity };
    b.add_vendor(herb, coins(2.0), Currency::Coin).unwrap();
    b.add_vendor(vial, coins(3.0), Currency::Coin).unwrap();
    b.add_vendor(potion, coins(10.0), Currency::Coin).unwrap();
    b.add_recipe(potion, vec![ing(herb, 2), ing(vial, 1)], 1).unwrap();
    b.add_recipe(salve, vec![ing(herb, 3)], 1).unwrap();
    b.add_recipe(elixir, vec![ing(potion, 1), ing(herb, 2), ing(salve, 1)], 1)
        .unwrap();
    b.add_cooldown(charged_quartz, quartz_source, coins(4.0)).unwrap();
    b.add_recipe(lantern, vec![ing(charged_quartz, 1), ing(vial, 1)], 1)
        .unwrap();

    PotionShop {
        catalog: b.build().unwrap(),
        herb,
        vial,
        potion,
        salve,
        elixir,
        charged_quartz,
        lantern,
        quartz_source,
    }
}

// ===========================================================================
// Jewelry set
// ===========================================================================

/// Two branches competing for one daily cooldown unit.
///
/// Charged Quartz comes from the cooldown at 1 or a vendor at 50; Ring and
/// Amulet each need one; the Set needs a Ring and an Amulet.
pub struct JewelrySet {
    pub catalog: Catalog,
    pub quartz: ItemId,
    pub ring: ItemId,
    pub amulet: ItemId,
    pub set: ItemId,
    pub source: CooldownSourceId,
}

pub fn jewelry_set() -> JewelrySet {
    let mut b = CatalogBuilder::new();
    let quartz = b.register_item("Charged Quartz");
    let ring = b.register_item("Ring");
    let amulet = b.register_item("Amulet");
    let set = b.register_item("Jewelry Set");
    let source = b.register_cooldown_source(CooldownSchedule::daily("quartz", 1));

    let ing = |item, quantity| Ingredient { item, quantity };
    b.add_cooldown(quartz, source, coins(1.0)).unwrap();
    b.add_vendor(quartz, coins(50.0), Currency::Coin).unwrap();
    b.add_recipe(ring, vec![ing(quartz, 1)], 1).unwrap();
    b.add_recipe(amulet, vec![ing(quartz, 1)], 1).unwrap();
    b.add_recipe(set, vec![ing(ring, 1), ing(amulet, 1)], 1).unwrap();

    JewelrySet {
        catalog: b.build().unwrap(),
        quartz,
        ring,
        amulet,
        set,
        source,
    }
}

// ===========================================================================
// Tiered catalog
// ===========================================================================

/// A layered catalog for benchmarks: `tiers` layers of `width` items. Tier 0
/// is only sold by vendors; every higher item is sold at a premium or
/// crafted from two items of the tier below. Returns the catalog and a top
/// item crafted from the whole last tier.
pub fn tiered_catalog(tiers: usize, width: usize) -> (Catalog, ItemId) {
    let mut b = CatalogBuilder::new();
    let mut below: Vec<ItemId> = Vec::new();

    for tier in 0..tiers {
        let mut current = Vec::with_capacity(width);
        for slot in 0..width {
            let item = b.register_item(&format!("t{tier}-i{slot}"));
            let base = (slot % 7 + 1) as f64;
            if below.is_empty() {
                b.add_vendor(item, coins(base), Currency::Coin).unwrap();
            } else {
                let premium = base * (2.0 + tier as f64) * 2.5;
                b.add_vendor(item, coins(premium), Currency::Coin).unwrap();
                let a = below[slot % below.len()];
                let c = below[(slot + 1) % below.len()];
                let ingredients = if a == c {
                    vec![Ingredient { item: a, quantity: 2 }]
                } else {
                    vec![
                        Ingredient { item: a, quantity: 1 },
                        Ingredient { item: c, quantity: 1 },
                    ]
                };
                b.add_recipe(item, ingredients, 1).unwrap();
            }
            current.push(item);
        }
        below = current;
    }

    let top = b.register_item("top");
    let ingredients = below
        .iter()
        .map(|&item| Ingredient { item, quantity: 1 })
        .collect();
    b.add_recipe(top, ingredients, 1).unwrap();
    (b.build().unwrap(), top)
}
