pub mod loader;
pub mod planner_config;
pub mod schema;

pub use loader::{DataLoadError, GameData, load_game_data};
