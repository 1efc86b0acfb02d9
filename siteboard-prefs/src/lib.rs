//! Per-user favorites and display settings.
//!
//! Thin consumers of the scoped store adapter: all persistence failures
//! degrade to in-memory state, so the panel keeps working for the
//! session even when storage is unavailable.

mod favorites;
mod settings;

pub use favorites::{Favorite, FavoritesManager};
pub use settings::{Settings, SettingsManager, ViewMode};
