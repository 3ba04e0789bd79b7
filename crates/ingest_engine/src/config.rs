use ingest_core::ImageSettings;

use crate::{FetchSettings, StorageLocation};

/// Everything the engine needs besides its collaborators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub page_fetch: FetchSettings,
    pub image_fetch: FetchSettings,
    pub image: ImageSettings,
    pub storage: StorageLocation,
}

impl EngineConfig {
    pub fn default_with_storage(storage: StorageLocation) -> Self {
        Self {
            page_fetch: FetchSettings::for_pages(),
            image_fetch: FetchSettings::for_images(),
            image: ImageSettings::default(),
            storage,
        }
    }
}
