//! Read-only recipe catalog: items, their candidate acquisition methods, and
//! the cooldown schedules those methods reference.
//!
//! The catalog is built once through [`CatalogBuilder`] and then frozen. The
//! planner only reads it through the [`RecipeCatalog`] trait, so callers that
//! already hold game data in another shape can implement the trait directly.

use crate::cooldown::CooldownSchedule;
use crate::fixed::Fixed64;
use crate::id::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

// ---------------------------------------------------------------------------
// Acquisition methods
// ---------------------------------------------------------------------------

/// Currency a vendor charges in. Only offers in the planner's objective
/// currency take part in cost minimization.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Currency {
    #[default]
    Coin,
    Karma,
    Gem,
    Token,
}

/// A vendor selling an item at a fixed unit price.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VendorOffer {
    pub unit_price: Fixed64,
    pub currency: Currency,
}

/// One ingredient line of a recipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ingredient {
    pub item: ItemId,
    pub quantity: u32,
}

/// A crafting recipe. One craft consumes every ingredient once and yields
/// `output` units of the item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipe {
    pub id: RecipeId,
    pub ingredients: Vec<Ingredient>,
    pub output: u32,
}

impl Recipe {
    /// Number of crafts needed to yield at least `quantity` units.
    pub fn crafts_for(&self, quantity: u64) -> u64 {
        quantity.div_ceil(u64::from(self.output.max(1)))
    }
}

/// A rate-limited source: at most the schedule's capacity per reset window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CooldownOffer {
    pub source: CooldownSourceId,
    pub unit_price: Fixed64,
}

/// One way to obtain units of an item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcquisitionMethod {
    Vendor(VendorOffer),
    Craft(Recipe),
    Cooldown(CooldownOffer),
}

impl AcquisitionMethod {
    /// Stable key addressing this method among an item's candidates.
    pub fn key(&self) -> MethodKey {
        match self {
            AcquisitionMethod::Vendor(offer) => MethodKey::Vendor(offer.currency),
            AcquisitionMethod::Craft(recipe) => MethodKey::Recipe(recipe.id),
            AcquisitionMethod::Cooldown(offer) => MethodKey::Cooldown(offer.source),
        }
    }

    pub fn kind(&self) -> MethodKind {
        match self {
            AcquisitionMethod::Vendor(_) => MethodKind::Vendor,
            AcquisitionMethod::Craft(_) => MethodKind::Craft,
            AcquisitionMethod::Cooldown(_) => MethodKind::Cooldown,
        }
    }

    /// Catalog unit price, if the method is priced directly.
    pub fn unit_price(&self) -> Option<Fixed64> {
        match self {
            AcquisitionMethod::Vendor(offer) => Some(offer.unit_price),
            AcquisitionMethod::Cooldown(offer) => Some(offer.unit_price),
            AcquisitionMethod::Craft(_) => None,
        }
    }
}

/// Addresses one acquisition method of an item. An item has at most one
/// vendor offer per currency and one offer per cooldown source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MethodKey {
    Vendor(Currency),
    Recipe(RecipeId),
    Cooldown(CooldownSourceId),
}

/// Coarse method category, used for tie-breaking between equal costs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MethodKind {
    Owned,
    Vendor,
    Cooldown,
    Craft,
}

// ---------------------------------------------------------------------------
// Catalog trait
// ---------------------------------------------------------------------------

/// Read-only lookup the planner consumes.
pub trait RecipeCatalog {
    /// Whether the item is known to the catalog.
    fn contains(&self, item: ItemId) -> bool;

    /// Candidate methods for an item, in catalog order. Unknown items have none.
    fn lookup_methods(&self, item: ItemId) -> &[AcquisitionMethod];

    /// Reset schedule of a cooldown source.
    fn schedule_of(&self, source: CooldownSourceId) -> Option<&CooldownSchedule>;
}

/// Every item reachable from `item` through recipe ingredients, including
/// `item` itself. These are the items a caller has to price to plan `item`.
/// Terminates on cyclic catalogs.
pub fn recipe_items<C: RecipeCatalog + ?Sized>(catalog: &C, item: ItemId) -> BTreeSet<ItemId> {
    let mut seen = BTreeSet::new();
    let mut stack = vec![item];
    while let Some(next) = stack.pop() {
        if !seen.insert(next) {
            continue;
        }
        for method in catalog.lookup_methods(next) {
            if let AcquisitionMethod::Craft(recipe) = method {
                stack.extend(recipe.ingredients.iter().map(|i| i.item));
            }
        }
    }
    seen
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised while assembling a catalog.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid item reference: {0:?}")]
    InvalidItemRef(ItemId),

    #[error("invalid cooldown source reference: {0:?}")]
    InvalidSourceRef(CooldownSourceId),

    #[error("item {item:?} already has a method {method:?}")]
    DuplicateMethod { item: ItemId, method: MethodKey },

    #[error("recipe {0:?} has an output of zero")]
    ZeroOutput(RecipeId),

    #[error("recipe {0:?} has an ingredient with quantity zero")]
    ZeroIngredient(RecipeId),

    #[error("cooldown source '{0}' has a non-positive reset period")]
    InvalidPeriod(String),
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// An item definition: display name plus its candidate methods.
#[derive(Debug, Clone)]
pub struct ItemDef {
    pub name: String,
    pub methods: Vec<AcquisitionMethod>,
}

/// Builder for constructing an immutable [`Catalog`].
/// Items and sources are registered first, methods attached afterwards,
/// and [`build`](CatalogBuilder::build) validates every reference.
#[derive(Debug, Default)]
pub struct CatalogBuilder {
    items: Vec<ItemDef>,
    item_name_to_id: HashMap<String, ItemId>,
    schedules: Vec<CooldownSchedule>,
    source_name_to_id: HashMap<String, CooldownSourceId>,
    next_recipe: u32,
}

impl CatalogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an item. Returns its ID.
    pub fn register_item(&mut self, name: &str) -> ItemId {
        let id = ItemId(self.items.len() as u32);
        self.items.push(ItemDef {
            name: name.to_string(),
            methods: Vec::new(),
        });
        self.item_name_to_id.insert(name.to_string(), id);
        id
    }

    /// Register a cooldown source. Returns its ID.
    pub fn register_cooldown_source(&mut self, schedule: CooldownSchedule) -> CooldownSourceId {
        let id = CooldownSourceId(self.schedules.len() as u32);
        self.source_name_to_id.insert(schedule.name.clone(), id);
        self.schedules.push(schedule);
        id
    }

    /// Attach a vendor offer to an item.
    pub fn add_vendor(
        &mut self,
        item: ItemId,
        unit_price: Fixed64,
        currency: Currency,
    ) -> Result<(), CatalogError> {
        self.push_method(
            item,
            AcquisitionMethod::Vendor(VendorOffer {
                unit_price,
                currency,
            }),
        )
    }

    /// Attach a recipe to the item it produces. Returns the recipe's ID.
    pub fn add_recipe(
        &mut self,
        item: ItemId,
        ingredients: Vec<Ingredient>,
        output: u32,
    ) -> Result<RecipeId, CatalogError> {
        let id = RecipeId(self.next_recipe);
        self.push_method(
            item,
            AcquisitionMethod::Craft(Recipe {
                id,
                ingredients,
                output,
            }),
        )?;
        self.next_recipe += 1;
        Ok(id)
    }

    /// Attach a cooldown-gated offer to an item.
    pub fn add_cooldown(
        &mut self,
        item: ItemId,
        source: CooldownSourceId,
        unit_price: Fixed64,
    ) -> Result<(), CatalogError> {
        self.push_method(
            item,
            AcquisitionMethod::Cooldown(CooldownOffer { source, unit_price }),
        )
    }

    fn push_method(&mut self, item: ItemId, method: AcquisitionMethod) -> Result<(), CatalogError> {
        let def = self
            .items
            .get_mut(item.0 as usize)
            .ok_or(CatalogError::InvalidItemRef(item))?;
        let key = method.key();
        if def.methods.iter().any(|m| m.key() == key) {
            return Err(CatalogError::DuplicateMethod { item, method: key });
        }
        def.methods.push(method);
        Ok(())
    }

    /// Lookup item ID by name.
    pub fn item_id(&self, name: &str) -> Option<ItemId> {
        self.item_name_to_id.get(name).copied()
    }

    /// Lookup cooldown source ID by name.
    pub fn source_id(&self, name: &str) -> Option<CooldownSourceId> {
        self.source_name_to_id.get(name).copied()
    }

    /// Finalize and build the immutable catalog.
    pub fn build(self) -> Result<Catalog, CatalogError> {
        for schedule in &self.schedules {
            if schedule.reset_period.num_seconds() <= 0 {
                return Err(CatalogError::InvalidPeriod(schedule.name.clone()));
            }
        }

        for def in &self.items {
            for method in &def.methods {
                match method {
                    AcquisitionMethod::Craft(recipe) => {
                        if recipe.output == 0 {
                            return Err(CatalogError::ZeroOutput(recipe.id));
                        }
                        for ingredient in &recipe.ingredients {
                            if ingredient.item.0 as usize >= self.items.len() {
                                return Err(CatalogError::InvalidItemRef(ingredient.item));
                            }
                            if ingredient.quantity == 0 {
                                return Err(CatalogError::ZeroIngredient(recipe.id));
                            }
                        }
                    }
                    AcquisitionMethod::Cooldown(offer) => {
                        if offer.source.0 as usize >= self.schedules.len() {
                            return Err(CatalogError::InvalidSourceRef(offer.source));
                        }
                    }
                    AcquisitionMethod::Vendor(_) => {}
                }
            }
        }

        Ok(Catalog {
            items: self.items,
            item_name_to_id: self.item_name_to_id,
            schedules: self.schedules,
            source_name_to_id: self.source_name_to_id,
        })
    }
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// Immutable catalog. Frozen after build(). Thread-safe to share.
#[derive(Debug)]
pub struct Catalog {
    items: Vec<ItemDef>,
    item_name_to_id: HashMap<String, ItemId>,
    schedules: Vec<CooldownSchedule>,
    source_name_to_id: HashMap<String, CooldownSourceId>,
}

impl Catalog {
    pub fn item(&self, id: ItemId) -> Option<&ItemDef> {
        self.items.get(id.0 as usize)
    }

    pub fn item_name(&self, id: ItemId) -> Option<&str> {
        self.item(id).map(|def| def.name.as_str())
    }

    pub fn item_id(&self, name: &str) -> Option<ItemId> {
        self.item_name_to_id.get(name).copied()
    }

    pub fn source_id(&self, name: &str) -> Option<CooldownSourceId> {
        self.source_name_to_id.get(name).copied()
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// All cooldown sources with their schedules.
    pub fn cooldown_sources(&self) -> impl Iterator<Item = (CooldownSourceId, &CooldownSchedule)> {
        self.schedules
            .iter()
            .enumerate()
            .map(|(i, s)| (CooldownSourceId(i as u32), s))
    }

    /// Every item reachable from `item` through recipes, including itself.
    pub fn recipe_items(&self, item: ItemId) -> BTreeSet<ItemId> {
        recipe_items(self, item)
    }
}

impl RecipeCatalog for Catalog {
    fn contains(&self, item: ItemId) -> bool {
        (item.0 as usize) < self.items.len()
    }

    fn lookup_methods(&self, item: ItemId) -> &[AcquisitionMethod] {
        self.items
            .get(item.0 as usize)
            .map(|def| def.methods.as_slice())
            .unwrap_or(&[])
    }

    fn schedule_of(&self, source: CooldownSourceId) -> Option<&CooldownSchedule> {
        self.schedules.get(source.0 as usize)
    }
}
