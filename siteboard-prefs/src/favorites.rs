//! The favorites manager.
//!
//! Favorites are keyed by normalized URL: no two favorites share one, so
//! `HTTPS://Contoso.com/sites/A/` and `https://contoso.com/sites/a` are
//! the same favorite. Display fields are denormalized copies refreshed
//! on re-add.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use siteboard_store::ScopedStore;
use siteboard_types::{NormalizedUrl, Site};
use tracing::debug;

const FAVORITES_KEY: &str = "favorites";

/// One pinned site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Favorite {
    /// Normalized URL; the identity of the favorite.
    pub url: NormalizedUrl,
    /// Denormalized display title.
    pub title: String,
    /// Denormalized description, when the site has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// When the favorite was added.
    pub added_at: DateTime<Utc>,
}

/// Manages the per-user favorites set.
///
/// The in-memory list is authoritative for the session; every mutation
/// is written through, and a failed write degrades silently.
pub struct FavoritesManager {
    store: ScopedStore,
    favorites: Vec<Favorite>,
}

impl FavoritesManager {
    /// Loads the favorites for the store's scope.
    #[must_use]
    pub fn load(store: ScopedStore) -> Self {
        let favorites: Vec<Favorite> = store.read_or_default(FAVORITES_KEY);
        debug!(count = favorites.len(), "loaded favorites");
        Self { store, favorites }
    }

    /// Returns the favorites in insertion order.
    #[must_use]
    pub fn list(&self) -> &[Favorite] {
        &self.favorites
    }

    /// Returns true if the site's URL is favorited.
    #[must_use]
    pub fn contains(&self, url: &NormalizedUrl) -> bool {
        self.favorites.iter().any(|f| &f.url == url)
    }

    /// Adds a site to the favorites.
    ///
    /// Returns false when the normalized URL is already present; in that
    /// case the stored display fields are refreshed from the site.
    pub fn add(&mut self, site: &Site) -> bool {
        let url = site.normalized_url();
        if let Some(existing) = self.favorites.iter_mut().find(|f| f.url == url) {
            existing.title = site.title.clone();
            existing.description = site.description.clone();
            self.persist();
            return false;
        }

        self.favorites.push(Favorite {
            url,
            title: site.title.clone(),
            description: site.description.clone(),
            added_at: Utc::now(),
        });
        self.persist();
        true
    }

    /// Removes a favorite by URL. Returns true if one was removed.
    pub fn remove(&mut self, url: &NormalizedUrl) -> bool {
        let before = self.favorites.len();
        self.favorites.retain(|f| &f.url != url);
        let removed = self.favorites.len() != before;
        if removed {
            self.persist();
        }
        removed
    }

    /// Adds the site if absent, removes it if present.
    ///
    /// Returns true when the site is a favorite afterwards.
    pub fn toggle(&mut self, site: &Site) -> bool {
        let url = site.normalized_url();
        if self.contains(&url) {
            self.remove(&url);
            false
        } else {
            self.add(site);
            true
        }
    }

    /// Removes all favorites.
    pub fn clear(&mut self) {
        self.favorites.clear();
        self.persist();
    }

    fn persist(&self) {
        self.store.write(FAVORITES_KEY, &self.favorites);
    }
}
