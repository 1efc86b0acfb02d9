//! The settings manager.
//!
//! Settings are a flat record of display preferences, one per user.
//! Every field carries a serde default, so a blob written by an older
//! version (or a corrupt one) heals to a complete record; unknown keys
//! fill from defaults, never null.

use serde::{Deserialize, Serialize};
use siteboard_store::ScopedStore;

const SETTINGS_KEY: &str = "settings";

/// How the site list is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    /// Compact rows.
    #[default]
    List,
    /// Card tiles.
    Tiles,
}

/// Per-user display preferences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Pin favorited sites above the rest of the list.
    pub show_favorites_first: bool,
    /// Show site descriptions under titles.
    pub show_descriptions: bool,
    /// Open sites in a new tab instead of navigating the host page.
    pub open_in_new_tab: bool,
    /// List or tile rendering.
    pub view_mode: ViewMode,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            show_favorites_first: true,
            show_descriptions: true,
            open_in_new_tab: false,
            view_mode: ViewMode::List,
        }
    }
}

/// Manages the per-user settings record.
pub struct SettingsManager {
    store: ScopedStore,
    settings: Settings,
}

impl SettingsManager {
    /// Loads the settings for the store's scope, creating defaults on
    /// first read.
    #[must_use]
    pub fn load(store: ScopedStore) -> Self {
        let settings = store.read_or_default(SETTINGS_KEY);
        Self { store, settings }
    }

    /// Returns the current settings.
    #[must_use]
    pub fn get(&self) -> &Settings {
        &self.settings
    }

    /// Applies a mutation and persists the result.
    pub fn update(&mut self, f: impl FnOnce(&mut Settings)) {
        f(&mut self.settings);
        self.store.write(SETTINGS_KEY, &self.settings);
    }

    /// Resets to defaults and persists.
    pub fn reset(&mut self) {
        self.settings = Settings::default();
        self.store.write(SETTINGS_KEY, &self.settings);
    }
}
