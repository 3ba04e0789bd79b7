//! Engine configuration for the binary: storage location from the
//! environment, tuning from an optional RON file.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use ingest_engine::{EngineConfig, FetchSettings, StorageLocation};
use ingest_logging::ingest_info;
use serde::Deserialize;

/// Overrides read from `--config`. Every field is optional; missing fields
/// keep the engine defaults.
///
/// ```ron
/// (
///     page: (request_timeout_secs: Some(15)),
///     image: (thumbnail_quality: Some(90)),
/// )
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub page: FetchOverrides,
    pub image_fetch: FetchOverrides,
    pub image: ImageOverrides,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FetchOverrides {
    pub connect_timeout_secs: Option<u64>,
    pub request_timeout_secs: Option<u64>,
    pub redirect_limit: Option<usize>,
    pub max_bytes: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImageOverrides {
    pub min_dimension: Option<u32>,
    pub original_max_width: Option<u32>,
    pub thumbnail_width: Option<u32>,
    pub thumbnail_height: Option<u32>,
    pub thumbnail_quality: Option<u8>,
}

impl FetchOverrides {
    fn apply(&self, settings: &mut FetchSettings) {
        if let Some(secs) = self.connect_timeout_secs {
            settings.connect_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = self.request_timeout_secs {
            settings.request_timeout = Duration::from_secs(secs);
        }
        if let Some(limit) = self.redirect_limit {
            settings.redirect_limit = limit;
        }
        if let Some(max) = self.max_bytes {
            settings.max_bytes = max;
        }
    }
}

impl FileConfig {
    pub fn read(path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        ron::from_str(&text).with_context(|| format!("parsing config file {}", path.display()))
    }

    pub fn apply(&self, config: &mut EngineConfig) {
        self.page.apply(&mut config.page_fetch);
        self.image_fetch.apply(&mut config.image_fetch);

        let image = &mut config.image;
        let o = &self.image;
        image.min_dimension = o.min_dimension.unwrap_or(image.min_dimension);
        image.original_max_width = o.original_max_width.unwrap_or(image.original_max_width);
        image.thumbnail_width = o.thumbnail_width.unwrap_or(image.thumbnail_width);
        image.thumbnail_height = o.thumbnail_height.unwrap_or(image.thumbnail_height);
        image.thumbnail_quality = o.thumbnail_quality.unwrap_or(image.thumbnail_quality);
    }
}

/// Engine defaults for `storage`, adjusted by the file at `path` if any.
pub fn load(storage: StorageLocation, path: Option<&Path>) -> anyhow::Result<EngineConfig> {
    let mut config = EngineConfig::default_with_storage(storage);
    if let Some(path) = path {
        FileConfig::read(path)?.apply(&mut config);
        ingest_info!("loaded config overrides from {}", path.display());
    }
    anyhow::ensure!(
        !config.storage.bucket.is_empty() && !config.storage.region.is_empty(),
        "bucket and region must not be empty"
    );
    Ok(config)
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::time::Duration;

    use ingest_engine::StorageLocation;
    use pretty_assertions::assert_eq;

    use super::{load, FileConfig};

    fn storage() -> StorageLocation {
        StorageLocation::new("media", "eu-west-1")
    }

    fn write_config(text: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(text.as_bytes()).unwrap();
        file
    }

    #[test]
    fn no_file_means_defaults() {
        let config = load(storage(), None).unwrap();
        assert_eq!(config.image.original_max_width, 1340);
        assert_eq!(config.page_fetch.redirect_limit, 3);
        assert_eq!(config.storage, storage());
    }

    #[test]
    fn overrides_are_applied_field_by_field() {
        let file = write_config(
            "(page: (request_timeout_secs: Some(15)), image: (thumbnail_quality: Some(90)))",
        );
        let config = load(storage(), Some(file.path())).unwrap();
        assert_eq!(config.page_fetch.request_timeout, Duration::from_secs(15));
        assert_eq!(config.page_fetch.connect_timeout, Duration::from_secs(10));
        assert_eq!(config.image.thumbnail_quality, 90);
        assert_eq!(config.image.thumbnail_width, 400);
        assert_eq!(config.image_fetch.max_bytes, 20 * 1024 * 1024);
    }

    #[test]
    fn empty_file_is_valid() {
        let file = write_config("()");
        assert_eq!(FileConfig::read(file.path()).unwrap(), FileConfig::default());
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let file = write_config("(pages: ())");
        let err = FileConfig::read(file.path()).unwrap_err();
        assert!(format!("{err:#}").contains("parsing config file"));
    }

    #[test]
    fn missing_file_is_an_error() {
        let missing = std::path::Path::new("/nonexistent/ingest.ron");
        let err = load(storage(), Some(missing)).unwrap_err();
        assert!(err.to_string().contains("reading config file"));
    }

    #[test]
    fn empty_bucket_is_rejected() {
        assert!(load(StorageLocation::new("", "eu-west-1"), None).is_err());
    }
}
