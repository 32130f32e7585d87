//! End-to-end planning over catalogs loaded from data files.
//!
//! Each test writes a small data directory, loads it through
//! `cheapcraft-data`, then builds, updates, reduces, and commits plans with
//! `cheapcraft-core`.

use std::fs;
use std::path::{Path, PathBuf};

use cheapcraft_core::catalog::{Catalog, Currency, MethodKey};
use cheapcraft_core::cooldown::CooldownState;
use cheapcraft_core::id::*;
use cheapcraft_core::linearize::linearize;
use cheapcraft_core::planner::Planner;
use cheapcraft_core::snapshot::Snapshot;
use cheapcraft_core::test_utils::*;
use cheapcraft_core::tree::ChosenMethod;
use cheapcraft_core::updater::Change;
use cheapcraft_core::usage::{cooldown_usage, usage, used_items};
use cheapcraft_data::{GameData, load_game_data};
use chrono::{DateTime, TimeZone, Utc};

// ===========================================================================
// Data directories
// ===========================================================================

const ITEMS: &str = r#"[
    (name: "herb"),
    (name: "vial"),
    (name: "potion"),
    (name: "salve"),
    (name: "elixir"),
    (name: "quartz"),
    (name: "ring"),
    (name: "amulet"),
    (name: "jewelry_set"),
]"#;

const RECIPES: &str = r#"[
    (item: "potion", ingredients: [("herb", 2), ("vial", 1)]),
    (item: "salve", ingredients: [("herb", 3)]),
    (item: "elixir", ingredients: [("potion", 1), ("herb", 2), ("salve", 1)]),
    (item: "ring", ingredients: [("quartz", 1)]),
    (item: "amulet", ingredients: [("quartz", 1)]),
    (item: "jewelry_set", ingredients: [("ring", 1), ("amulet", 1)]),
]"#;

const VENDORS: &str = r#"[
    (item: "herb", cost: 2.0),
    (item: "vial", cost: 3.0),
    (item: "potion", cost: 10.0),
    (item: "potion", cost: 1.0, currency: karma),
    (item: "quartz", cost: 50.0),
]"#;

const COOLDOWNS: &str = r#"(
    sources: [(name: "quartz_mill", capacity: 1)],
    offers: [(item: "quartz", source: "quartz_mill", price: 1.0)],
)"#;

/// Write the shared shop into a fresh directory, with an optional planner
/// file.
fn shop_dir(suffix: &str, planner: Option<&str>) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "cheapcraft_integration_{suffix}_{}",
        std::process::id()
    ));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("items.ron"), ITEMS).unwrap();
    fs::write(dir.join("recipes.ron"), RECIPES).unwrap();
    fs::write(dir.join("vendors.ron"), VENDORS).unwrap();
    fs::write(dir.join("cooldowns.ron"), COOLDOWNS).unwrap();
    if let Some(planner) = planner {
        fs::write(dir.join("planner.ron"), planner).unwrap();
    }
    dir
}

fn load(dir: &Path) -> GameData {
    let data = load_game_data(dir).unwrap();
    let _ = fs::remove_dir_all(dir);
    data
}

fn id(catalog: &Catalog, name: &str) -> ItemId {
    catalog.item_id(name).unwrap()
}

fn midnight_after_noon() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap()
}

// ===========================================================================
// Build and reduce
// ===========================================================================

#[test]
fn potion_is_crafted_when_cheaper_than_buying() {
    let data = load(&shop_dir("potion", None));
    let catalog = &data.catalog;
    let (herb, vial, potion) = (id(catalog, "herb"), id(catalog, "vial"), id(catalog, "potion"));
    let planner = Planner::new(catalog, data.config.clone());

    let tree = planner.build(potion, 1, snapshot()).unwrap();
    // 2 herbs at 2 + 1 vial at 3 beats 10; the karma offer is not a candidate.
    assert_eq!(tree.cost(), coins(7.0));
    assert!(matches!(tree.root().method, ChosenMethod::Craft(_)));

    let steps = linearize(&tree).unwrap();
    let summary: Vec<(ItemId, u64, ChosenMethod)> =
        steps.iter().map(|s| (s.item, s.quantity, s.method)).collect();
    assert_eq!(
        summary,
        vec![
            (herb, 2, ChosenMethod::Vendor(Currency::Coin)),
            (vial, 1, ChosenMethod::Vendor(Currency::Coin)),
            (potion, 1, tree.root().method),
        ]
    );
    assert_eq!(steps[2].ingredients, vec![(herb, 2), (vial, 1)]);
}

#[test]
fn shared_ingredients_merge_across_branches() {
    let data = load(&shop_dir("elixir", None));
    let catalog = &data.catalog;
    let (herb, elixir) = (id(catalog, "herb"), id(catalog, "elixir"));
    let planner = Planner::new(catalog, data.config.clone());

    let tree = planner.build(elixir, 1, snapshot()).unwrap();
    // potion 7 + herbs 4 + salve 6
    assert_eq!(tree.cost(), coins(17.0));
    assert_eq!(usage(&tree).get(herb), 7);
    assert_eq!(used_items(&tree).purchased.get(&herb), Some(&7));

    let steps = linearize(&tree).unwrap();
    let herb_steps: Vec<_> = steps.iter().filter(|s| s.item == herb).collect();
    assert_eq!(herb_steps.len(), 1);
    assert_eq!(herb_steps[0].quantity, 7);
    assert_eq!(steps.last().map(|s| s.item), Some(elixir));
}

#[test]
fn owned_inventory_is_used_first() {
    let data = load(&shop_dir("owned", None));
    let catalog = &data.catalog;
    let (herb, potion) = (id(catalog, "herb"), id(catalog, "potion"));
    let planner = Planner::new(catalog, data.config.clone());

    let snapshot = snapshot().with_inventory([(herb, 5)].into_iter().collect());
    let tree = planner.build(potion, 1, snapshot).unwrap();
    assert_eq!(tree.cost(), coins(3.0));
    assert_eq!(used_items(&tree).from_inventory.get(&herb), Some(&2));
}

#[test]
fn disabled_craft_from_planner_file() {
    let data = load(&shop_dir("disabled", Some(r#"(disabled_crafts: ["potion"])"#)));
    let potion = id(&data.catalog, "potion");
    let planner = Planner::new(&data.catalog, data.config.clone());

    let tree = planner.build(potion, 1, snapshot()).unwrap();
    assert_eq!(tree.cost(), coins(10.0));
    assert_eq!(tree.root().method, ChosenMethod::Vendor(Currency::Coin));
}

#[test]
fn karma_objective_uses_karma_offers() {
    let data = load(&shop_dir("karma", Some("(currency: Some(karma))")));
    let potion = id(&data.catalog, "potion");
    let planner = Planner::new(&data.catalog, data.config.clone());

    let tree = planner.build(potion, 1, snapshot()).unwrap();
    assert_eq!(tree.cost(), coins(1.0));
    assert_eq!(tree.root().method, ChosenMethod::Vendor(Currency::Karma));
}

// ===========================================================================
// Cooldowns
// ===========================================================================

#[test]
fn cooldown_capacity_is_shared_across_branches() {
    let data = load(&shop_dir("cooldown_shared", None));
    let catalog = &data.catalog;
    let (quartz, set) = (id(catalog, "quartz"), id(catalog, "jewelry_set"));
    let source = catalog.source_id("quartz_mill").unwrap();
    let planner = Planner::new(catalog, data.config.clone());

    let tree = planner.build(set, 1, snapshot()).unwrap();
    // One quartz from the mill, the other bought.
    assert_eq!(tree.cost(), coins(51.0));
    let used = used_items(&tree);
    assert_eq!(used.from_cooldown.get(&quartz), Some(&1));
    assert_eq!(used.purchased.get(&quartz), Some(&1));
    assert_eq!(cooldown_usage(&tree).get(&source), Some(&1));
}

#[test]
fn commit_spends_capacity_until_the_next_reset() {
    let data = load(&shop_dir("commit", None));
    let catalog = &data.catalog;
    let set = id(catalog, "jewelry_set");
    let planner = Planner::new(catalog, data.config.clone());

    let mut cooldowns = CooldownState::from_catalog(catalog, noon());
    let mut first = planner
        .build(set, 1, Snapshot::new(noon()).with_cooldowns(cooldowns.clone()))
        .unwrap();
    planner.commit(&mut first, &mut cooldowns).unwrap();

    // Same window: the mill is spent.
    let second = planner
        .build(set, 1, Snapshot::new(noon()).with_cooldowns(cooldowns.clone()))
        .unwrap();
    assert_eq!(second.cost(), coins(100.0));

    // Crossing midnight refills it.
    let updated = planner
        .update(&second, Change::ClockAdvanced(midnight_after_noon()))
        .unwrap();
    assert_eq!(updated.tree.cost(), coins(51.0));
    let rebuilt = planner
        .build(set, 1, updated.tree.snapshot().clone())
        .unwrap();
    assert_eq!(updated.tree, rebuilt);
}

// ===========================================================================
// Updates
// ===========================================================================

#[test]
fn updates_match_a_rebuild() {
    let data = load(&shop_dir("updates", None));
    let catalog = &data.catalog;
    let (herb, vial, potion, elixir) = (
        id(catalog, "herb"),
        id(catalog, "vial"),
        id(catalog, "potion"),
        id(catalog, "elixir"),
    );
    let planner = Planner::new(catalog, data.config.clone());
    let tree = planner.build(elixir, 2, snapshot()).unwrap();

    let changes = [
        Change::PriceChanged {
            item: herb,
            method: MethodKey::Vendor(Currency::Coin),
            price: coins(6.0),
        },
        Change::PriceChanged {
            item: potion,
            method: MethodKey::Vendor(Currency::Coin),
            price: coins(4.0),
        },
        Change::OwnedInventoryChanged {
            item: vial,
            quantity: 1,
        },
        Change::RequestedQuantityChanged(5),
    ];

    for change in changes {
        let updated = planner.update(&tree, change.clone()).unwrap();
        let rebuilt = planner
            .build(
                updated.tree.item(),
                updated.tree.quantity(),
                updated.tree.snapshot().clone(),
            )
            .unwrap();
        assert_eq!(updated.tree, rebuilt, "after {change:?}");
    }
}

#[test]
fn unrelated_price_change_reuses_the_tree() {
    let data = load(&shop_dir("unrelated", None));
    let catalog = &data.catalog;
    let (quartz, potion) = (id(catalog, "quartz"), id(catalog, "potion"));
    let planner = Planner::new(catalog, data.config.clone());
    let tree = planner.build(potion, 1, snapshot()).unwrap();

    let updated = planner
        .update(
            &tree,
            Change::PriceChanged {
                item: quartz,
                method: MethodKey::Vendor(Currency::Coin),
                price: coins(1.0),
            },
        )
        .unwrap();
    assert_eq!(updated.report.reused, tree.root().node_count());
    assert_eq!(updated.report.rebuilt, 0);
    assert_eq!(updated.tree.cost(), tree.cost());
}
