//! Serde data file structs for catalog content.
//!
//! These structs define the on-disk format for items, recipes, vendor
//! offers, cooldown sources and the planner policy. They are deserialized
//! from RON, JSON, or TOML data files and then resolved into catalog types
//! by the loader. Items and sources are referenced by name.

use cheapcraft_core::catalog::{Currency, MethodKind};
use chrono::{DateTime, Utc};
use serde::Deserialize;

fn default_one() -> u32 {
    1
}

// ===========================================================================
// Items
// ===========================================================================

/// An item definition in a data file.
#[derive(Debug, Clone, Deserialize)]
pub struct ItemData {
    pub name: String,
}

// ===========================================================================
// Recipes
// ===========================================================================

/// A recipe ingredient entry, supporting both short tuple form and full form.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum IngredientData {
    /// Short form: `("item_name", quantity)`.
    Short(String, u32),
    /// Full form with explicit fields.
    Full { item: String, quantity: u32 },
}

impl IngredientData {
    pub fn item(&self) -> &str {
        match self {
            IngredientData::Short(item, _) | IngredientData::Full { item, .. } => item,
        }
    }

    pub fn quantity(&self) -> u32 {
        match self {
            IngredientData::Short(_, quantity) | IngredientData::Full { quantity, .. } => {
                *quantity
            }
        }
    }
}

/// A recipe producing `output` units of `item` per craft.
#[derive(Debug, Clone, Deserialize)]
pub struct RecipeData {
    pub item: String,
    pub ingredients: Vec<IngredientData>,
    #[serde(default = "default_one")]
    pub output: u32,
}

// ===========================================================================
// Vendors
// ===========================================================================

/// A vendor offer selling `quantity` units of `item` for `cost`.
#[derive(Debug, Clone, Deserialize)]
pub struct VendorData {
    pub item: String,
    pub cost: f64,
    #[serde(default = "default_one")]
    pub quantity: u32,
    #[serde(default)]
    pub currency: Currency,
}

// ===========================================================================
// Cooldowns
// ===========================================================================

fn default_reset_hours() -> u32 {
    24
}

/// A rate-limited source. Windows start at `anchor` (default: Unix epoch)
/// and repeat every `reset_hours`.
#[derive(Debug, Clone, Deserialize)]
pub struct CooldownSourceData {
    pub name: String,
    pub capacity: u32,
    #[serde(default = "default_reset_hours")]
    pub reset_hours: u32,
    #[serde(default)]
    pub anchor: Option<DateTime<Utc>>,
}

/// An item obtainable from a cooldown source at a unit price.
#[derive(Debug, Clone, Deserialize)]
pub struct CooldownOfferData {
    pub item: String,
    pub source: String,
    #[serde(default)]
    pub price: f64,
}

/// The cooldowns file: sources plus the offers drawing on them.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CooldownsData {
    #[serde(default)]
    pub sources: Vec<CooldownSourceData>,
    #[serde(default)]
    pub offers: Vec<CooldownOfferData>,
}

// ===========================================================================
// Planner policy
// ===========================================================================

/// The optional planner file. Missing fields keep their defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlannerData {
    #[serde(default)]
    pub currency: Option<Currency>,
    #[serde(default)]
    pub tie_break: Option<Vec<MethodKind>>,
    #[serde(default)]
    pub cooldown_carryover: Option<bool>,
    #[serde(default)]
    pub disabled_crafts: Vec<String>,
}
