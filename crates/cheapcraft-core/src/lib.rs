//! Cheapcraft Core -- cheapest-acquisition planning for crafted items.
//!
//! Given a recipe catalog, vendor prices, owned inventory, and rate-limited
//! cooldown sources, this crate finds the lowest-cost way to obtain a
//! quantity of an item, keeps that plan current as inputs change, and
//! reduces it to totals and an ordered list of steps.
//!
//! # Planning Pipeline
//!
//! 1. **Build** -- [`builder::TreeBuilder`] expands the request depth-first,
//!    using owned inventory first and choosing the cheapest method for the
//!    rest of every node.
//! 2. **Update** -- [`updater::TreeUpdater`] applies a single [`updater::Change`]
//!    and re-evaluates only the subtrees that can observe it.
//! 3. **Reduce** -- [`usage::usage`] merges shared sub-items into per-item
//!    totals; [`linearize::linearize`] orders deduplicated steps.
//! 4. **Commit** -- [`planner::Planner::commit`] applies an accepted plan's
//!    cooldown usage to the caller's state.
//!
//! Every call works on a [`snapshot::Snapshot`] of the time-varying inputs,
//! which the resulting tree keeps:
//!
//! ```rust,ignore
//! let planner = Planner::new(&catalog, PlannerConfig::default());
//! let tree = planner.build(potion, 1, Snapshot::new(Utc::now()))?;
//! let steps = linearize(&tree)?;
//! ```
//!
//! # Key Types
//!
//! - [`catalog::Catalog`] -- Immutable catalog of items, acquisition methods,
//!   and cooldown schedules (frozen at build time).
//! - [`catalog::RecipeCatalog`] -- Read-only lookup trait the planner uses.
//! - [`tree::AcquisitionTree`] -- The chosen plan plus its snapshot.
//! - [`cooldown::CooldownState`] -- Remaining capacity per cooldown source.
//! - [`fixed::Fixed64`] -- Q32.32 fixed-point type for exact cost sums.

pub mod builder;
pub mod catalog;
pub mod config;
pub mod cooldown;
pub mod cost;
pub mod dirty;
pub mod error;
pub mod fixed;
pub mod id;
pub mod inventory;
pub mod linearize;
pub mod planner;
pub mod snapshot;
pub mod tree;
pub mod updater;
pub mod usage;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
