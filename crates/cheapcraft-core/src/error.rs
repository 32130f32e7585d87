use crate::catalog::MethodKey;
use crate::id::{CooldownSourceId, ItemId};

/// Errors returned by build, update, linearize, and commit.
///
/// Every variant is terminal for the call that produced it: no partial tree
/// is returned, and retrying with the same inputs fails the same way.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlanError {
    /// No combination of methods can supply the item.
    #[error("cannot obtain item {item:?}: short by {shortfall}")]
    Unfulfillable { item: ItemId, shortfall: u64 },

    #[error("requested quantity must be positive, got {0}")]
    InvalidQuantity(u64),

    /// A recipe requires, directly or indirectly, its own output.
    #[error("recipe cycle through item {0:?}")]
    CyclicRecipe(ItemId),

    #[error("item not found in catalog: {0:?}")]
    UnknownItem(ItemId),

    #[error("cooldown source not found in catalog: {0:?}")]
    UnknownCooldownSource(CooldownSourceId),

    /// A price was addressed to a method that is not directly priced.
    #[error("item {item:?} has no priced method {method:?}")]
    UnpricedMethod { item: ItemId, method: MethodKey },

    #[error("cooldown usage of this plan was already committed")]
    AlreadyCommitted,

    #[error("cooldown source {cooldown:?} cannot supply {requested}: {remaining} left")]
    CapacityExceeded {
        cooldown: CooldownSourceId,
        requested: u64,
        remaining: u32,
    },
}
