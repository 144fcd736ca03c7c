// Application state module
// Shared by every connection task

use super::types::Config;
use crate::store::GalleryStore;

/// Application state
pub struct AppState {
    pub config: Config,
    pub store: GalleryStore,
}

impl AppState {
    /// Create `AppState`, seeding the store when configured to
    pub fn new(config: &Config) -> Self {
        let store = if config.gallery.seed {
            GalleryStore::seeded()
        } else {
            GalleryStore::default()
        };
        Self::with_store(config, store)
    }

    pub fn with_store(config: &Config, store: GalleryStore) -> Self {
        Self {
            config: config.clone(),
            store,
        }
    }
}
