//! Turns a data directory into a [`Catalog`] and [`PlannerConfig`].
//!
//! A directory holds one file per table: `items`, `recipes`, `vendors`,
//! `cooldowns`, and optionally `planner`, each in RON, JSON, or TOML. Names
//! are resolved to ids once every table is read; [`load_game_data`] runs the
//! whole pipeline.

use crate::planner_config::load_planner_config;
use crate::schema::{CooldownsData, ItemData, RecipeData, VendorData};
use cheapcraft_core::catalog::{Catalog, CatalogBuilder, CatalogError, Ingredient};
use cheapcraft_core::config::PlannerConfig;
use cheapcraft_core::cooldown::CooldownSchedule;
use cheapcraft_core::fixed::{Fixed64, f64_to_fixed64, unit_price};
use cheapcraft_core::id::{CooldownSourceId, ItemId};
use chrono::{DateTime, TimeDelta, Utc};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

// ===========================================================================
// Errors
// ===========================================================================

/// Why a data directory could not be turned into a catalog.
#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    /// One of the `items`, `recipes`, `vendors`, or `cooldowns` tables is
    /// absent.
    #[error("required table '{file}' not found in {dir}")]
    MissingRequired { file: String, dir: PathBuf },

    #[error("unsupported format for file: {file}")]
    UnsupportedFormat { file: PathBuf },

    /// A table exists in more than one format, e.g. `items.ron` and
    /// `items.json`.
    #[error("conflicting formats: {a} and {b}")]
    ConflictingFormats { a: PathBuf, b: PathBuf },

    #[error("parse error in {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    /// An item or cooldown source name that no table declares.
    #[error("unresolved {expected_kind} reference '{name}' in {file}")]
    UnresolvedRef {
        file: PathBuf,
        name: String,
        expected_kind: &'static str,
    },

    /// An item or cooldown source declared twice.
    #[error("duplicate name '{name}' in {file}")]
    DuplicateName { file: PathBuf, name: String },

    /// Negative or non-finite price, or a bundle of zero units.
    #[error("invalid value in {file}: {detail}")]
    InvalidValue { file: PathBuf, detail: String },

    /// The resolved tables do not form a valid catalog.
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ===========================================================================
// Table files
// ===========================================================================

/// Encodings a table file may use, chosen by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Toml,
    Json,
}

const EXTENSIONS: [(&str, Format); 3] = [
    ("ron", Format::Ron),
    ("toml", Format::Toml),
    ("json", Format::Json),
];

pub fn detect_format(path: &Path) -> Result<Format, DataLoadError> {
    let extension = path.extension().and_then(|e| e.to_str());
    EXTENSIONS
        .iter()
        .find(|(ext, _)| Some(*ext) == extension)
        .map(|(_, format)| *format)
        .ok_or_else(|| DataLoadError::UnsupportedFormat {
            file: path.to_path_buf(),
        })
}

/// Locate the file holding `table` (`items`, `planner`, ...) in `dir`.
/// At most one encoding of a table may be present.
pub fn find_data_file(dir: &Path, table: &str) -> Result<Option<PathBuf>, DataLoadError> {
    let mut present = EXTENSIONS
        .iter()
        .map(|(ext, _)| dir.join(format!("{table}.{ext}")))
        .filter(|path| path.exists());

    match (present.next(), present.next()) {
        (Some(a), Some(b)) => Err(DataLoadError::ConflictingFormats { a, b }),
        (found, _) => Ok(found),
    }
}

pub fn require_data_file(dir: &Path, table: &str) -> Result<PathBuf, DataLoadError> {
    find_data_file(dir, table)?.ok_or_else(|| DataLoadError::MissingRequired {
        file: table.to_string(),
        dir: dir.to_path_buf(),
    })
}

fn parse_error(path: &Path, detail: impl ToString) -> DataLoadError {
    DataLoadError::Parse {
        file: path.to_path_buf(),
        detail: detail.to_string(),
    }
}

/// Deserialize a whole table file, such as `cooldowns` or `planner`.
pub fn deserialize_file<T: DeserializeOwned>(path: &Path) -> Result<T, DataLoadError> {
    let content = std::fs::read_to_string(path)?;
    match detect_format(path)? {
        Format::Ron => ron::from_str(&content).map_err(|e| parse_error(path, e)),
        Format::Json => serde_json::from_str(&content).map_err(|e| parse_error(path, e)),
        Format::Toml => toml::from_str(&content).map_err(|e| parse_error(path, e)),
    }
}

/// Deserialize a list table (`items`, `recipes`, `vendors`). RON and JSON
/// files are a bare list; TOML files hold it as an array of tables under
/// `toml_key`, and an empty TOML file is an empty list.
pub fn deserialize_list<T: DeserializeOwned>(
    path: &Path,
    toml_key: &str,
) -> Result<Vec<T>, DataLoadError> {
    if detect_format(path)? != Format::Toml {
        return deserialize_file(path);
    }

    let content = std::fs::read_to_string(path)?;
    let table: toml::Value = toml::from_str(&content).map_err(|e| parse_error(path, e))?;
    let Some(array) = table.get(toml_key) else {
        return Ok(Vec::new());
    };
    array
        .clone()
        .try_into()
        .map_err(|e: toml::de::Error| parse_error(path, e))
}

// ===========================================================================
// Names
// ===========================================================================

/// Id registered under `name`, or `UnresolvedRef` naming the referring file.
pub fn resolve_name<V: Copy>(
    names: &HashMap<String, V>,
    name: &str,
    file: &Path,
    expected_kind: &'static str,
) -> Result<V, DataLoadError> {
    names
        .get(name)
        .copied()
        .ok_or_else(|| DataLoadError::UnresolvedRef {
            file: file.to_path_buf(),
            name: name.to_string(),
            expected_kind,
        })
}

/// Register `name` under `id`, rejecting a second declaration.
fn declare<V>(
    names: &mut HashMap<String, V>,
    name: &str,
    id: V,
    file: &Path,
) -> Result<(), DataLoadError> {
    if names.contains_key(name) {
        return Err(DataLoadError::DuplicateName {
            file: file.to_path_buf(),
            name: name.to_string(),
        });
    }
    names.insert(name.to_string(), id);
    Ok(())
}

/// Validate a price read from a data file and convert it to fixed point.
fn price(value: f64, file: &Path, what: &str) -> Result<Fixed64, DataLoadError> {
    if !value.is_finite() || value < 0.0 || value > f64::from(i32::MAX) {
        return Err(DataLoadError::InvalidValue {
            file: file.to_path_buf(),
            detail: format!("{what} has price {value}"),
        });
    }
    Ok(f64_to_fixed64(value))
}

// ===========================================================================
// Loading pipeline
// ===========================================================================

/// Everything loaded from a data directory.
#[derive(Debug)]
pub struct GameData {
    pub catalog: Catalog,
    pub config: PlannerConfig,
}

/// Load a catalog and planner policy from `dir`.
///
/// Reads `items`, `recipes`, `vendors`, and `cooldowns` (all required) and
/// `planner` (optional), each in any supported format. Items are registered
/// first, in file order, so recipe and offer references may point at any
/// item regardless of where it is declared.
pub fn load_game_data(dir: &Path) -> Result<GameData, DataLoadError> {
    let items_path = require_data_file(dir, "items")?;
    let recipes_path = require_data_file(dir, "recipes")?;
    let vendors_path = require_data_file(dir, "vendors")?;
    let cooldowns_path = require_data_file(dir, "cooldowns")?;

    let items: Vec<ItemData> = deserialize_list(&items_path, "items")?;
    let recipes: Vec<RecipeData> = deserialize_list(&recipes_path, "recipes")?;
    let vendors: Vec<VendorData> = deserialize_list(&vendors_path, "vendors")?;
    let cooldowns: CooldownsData = deserialize_file(&cooldowns_path)?;

    let mut builder = CatalogBuilder::new();

    // -- Items --
    let mut item_ids: HashMap<String, ItemId> = HashMap::new();
    for item in &items {
        let id = builder.register_item(&item.name);
        declare(&mut item_ids, &item.name, id, &items_path)?;
    }

    // -- Cooldown sources --
    let mut source_ids: HashMap<String, CooldownSourceId> = HashMap::new();
    for source in &cooldowns.sources {
        let id = builder.register_cooldown_source(CooldownSchedule {
            name: source.name.clone(),
            reset_period: TimeDelta::hours(i64::from(source.reset_hours)),
            capacity: source.capacity,
            anchor: source.anchor.unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
        });
        declare(&mut source_ids, &source.name, id, &cooldowns_path)?;
    }

    // -- Vendor offers --
    for vendor in &vendors {
        let item = resolve_name(&item_ids, &vendor.item, &vendors_path, "item")?;
        let cost = price(vendor.cost, &vendors_path, &vendor.item)?;
        let unit = unit_price(cost, vendor.quantity).ok_or_else(|| DataLoadError::InvalidValue {
            file: vendors_path.clone(),
            detail: format!("{} is sold in bundles of zero", vendor.item),
        })?;
        builder.add_vendor(item, unit, vendor.currency)?;
    }

    // -- Recipes --
    for recipe in &recipes {
        let item = resolve_name(&item_ids, &recipe.item, &recipes_path, "item")?;
        let ingredients = recipe
            .ingredients
            .iter()
            .map(|ingredient| {
                Ok(Ingredient {
                    item: resolve_name(&item_ids, ingredient.item(), &recipes_path, "item")?,
                    quantity: ingredient.quantity(),
                })
            })
            .collect::<Result<Vec<_>, DataLoadError>>()?;
        builder.add_recipe(item, ingredients, recipe.output)?;
    }

    // -- Cooldown offers --
    for offer in &cooldowns.offers {
        let item = resolve_name(&item_ids, &offer.item, &cooldowns_path, "item")?;
        let source = resolve_name(&source_ids, &offer.source, &cooldowns_path, "cooldown source")?;
        let unit = price(offer.price, &cooldowns_path, &offer.item)?;
        builder.add_cooldown(item, source, unit)?;
    }

    let catalog = builder.build()?;
    let config = load_planner_config(dir, &item_ids)?;

    for vendor in vendors.iter().filter(|v| v.currency != config.currency) {
        warn!(
            item = %vendor.item,
            currency = ?vendor.currency,
            objective = ?config.currency,
            "vendor offer is not in the objective currency and will not be considered"
        );
    }

    info!(
        items = items.len(),
        recipes = recipes.len(),
        vendors = vendors.len(),
        cooldown_sources = cooldowns.sources.len(),
        cooldown_offers = cooldowns.offers.len(),
        "loaded game data from {}",
        dir.display()
    );

    Ok(GameData { catalog, config })
}

// ===========================================================================
// Tests
// ===========================================================================
