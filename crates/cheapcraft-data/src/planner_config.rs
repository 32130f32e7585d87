//! Planner policy file: resolves item names in a [`PlannerData`] into a
//! [`PlannerConfig`].
//!
//! The `planner` file is optional. When it is absent, or leaves a field
//! out, the corresponding [`PlannerConfig::default`] value applies.

use crate::loader::{DataLoadError, deserialize_file, find_data_file, resolve_name};
use crate::schema::PlannerData;
use cheapcraft_core::config::PlannerConfig;
use cheapcraft_core::id::ItemId;
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

/// Load the planner policy from `dir`, resolving `disabled_crafts` against
/// the already registered item names.
pub(crate) fn load_planner_config(
    dir: &Path,
    items: &HashMap<String, ItemId>,
) -> Result<PlannerConfig, DataLoadError> {
    let Some(path) = find_data_file(dir, "planner")? else {
        debug!("no planner file, using default policy");
        return Ok(PlannerConfig::default());
    };
    let data: PlannerData = deserialize_file(&path)?;
    resolve_planner_config(data, items, &path)
}

fn resolve_planner_config(
    data: PlannerData,
    items: &HashMap<String, ItemId>,
    file: &Path,
) -> Result<PlannerConfig, DataLoadError> {
    let mut config = PlannerConfig::default();
    if let Some(currency) = data.currency {
        config.currency = currency;
    }
    if let Some(tie_break) = data.tie_break {
        config.tie_break = tie_break;
    }
    if let Some(carryover) = data.cooldown_carryover {
        config.cooldown_carryover = carryover;
    }
    for name in &data.disabled_crafts {
        config
            .disabled_crafts
            .insert(resolve_name(items, name, file, "item")?);
    }
    Ok(config)
}
