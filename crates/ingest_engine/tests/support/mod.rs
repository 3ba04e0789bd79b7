#![allow(dead_code)]

use std::collections::HashMap;
use std::io::Cursor;
use std::sync::{Arc, Mutex, Once};

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use ingest_engine::{
    EngineConfig, EngineEvent, FailureKind, FetchError, FetchMetadata, FetchOutput, Fetcher,
    ObjectStore, Progress, ProgressSink, PutObject, StorageError, StorageLocation,
};

pub const BUCKET: &str = "b";
pub const REGION: &str = "r";

pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(ingest_logging::initialize_for_tests);
}

pub fn location() -> StorageLocation {
    StorageLocation::new(BUCKET, REGION)
}

pub fn config() -> EngineConfig {
    EngineConfig::default_with_storage(location())
}

/// Shared, ordered record of IO calls across fetchers and the store.
#[derive(Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    pub fn push(&self, entry: String) {
        self.0.lock().unwrap().push(entry);
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn position(&self, prefix: &str) -> Option<usize> {
        self.entries().iter().position(|e| e.starts_with(prefix))
    }
}

/// In-memory object store that can be told to reject keys.
#[derive(Clone, Default)]
pub struct MemoryStore {
    objects: Arc<Mutex<Vec<PutObject>>>,
    failing_suffixes: Arc<Mutex<Vec<String>>>,
    log: CallLog,
}

impl MemoryStore {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            ..Self::default()
        }
    }

    pub fn fail_keys_ending_with(&self, suffix: &str) {
        self.failing_suffixes.lock().unwrap().push(suffix.to_string());
    }

    pub fn objects(&self) -> Vec<PutObject> {
        self.objects.lock().unwrap().clone()
    }

    pub fn keys(&self) -> Vec<String> {
        self.objects().into_iter().map(|o| o.key).collect()
    }

    pub fn get(&self, key: &str) -> Option<PutObject> {
        self.objects().into_iter().find(|o| o.key == key)
    }
}

#[async_trait::async_trait]
impl ObjectStore for MemoryStore {
    async fn put(&self, object: PutObject) -> Result<(), StorageError> {
        self.log.push(format!("put {}", object.key));
        let rejected = self
            .failing_suffixes
            .lock()
            .unwrap()
            .iter()
            .any(|suffix| object.key.ends_with(suffix.as_str()));
        if rejected {
            return Err(StorageError::new(&object.key, "AccessDenied"));
        }
        self.objects.lock().unwrap().push(object);
        Ok(())
    }
}

/// Fetcher answering from a fixed table, plus whatever the store holds at
/// its public URLs.
#[derive(Clone)]
pub struct StubFetcher {
    responses: Arc<Mutex<HashMap<String, (Option<String>, Vec<u8>)>>>,
    store: Option<(MemoryStore, StorageLocation)>,
    log: CallLog,
}

impl StubFetcher {
    pub fn new(log: CallLog) -> Self {
        Self {
            responses: Arc::default(),
            store: None,
            log,
        }
    }

    pub fn serving_store(mut self, store: MemoryStore, location: StorageLocation) -> Self {
        self.store = Some((store, location));
        self
    }

    pub fn serve(self, url: &str, content_type: &str, body: impl Into<Vec<u8>>) -> Self {
        self.responses
            .lock()
            .unwrap()
            .insert(url.to_string(), (Some(content_type.to_string()), body.into()));
        self
    }
}

#[async_trait::async_trait]
impl Fetcher for StubFetcher {
    async fn fetch(&self, url: &str, progress: Progress<'_>) -> Result<FetchOutput, FetchError> {
        self.log.push(format!("fetch {url}"));
        progress.report(Some(0));
        let hit = self.responses.lock().unwrap().get(url).cloned();
        let hit = hit.or_else(|| {
            let (store, location) = self.store.as_ref()?;
            store
                .objects()
                .into_iter()
                .find(|o| location.public_url(&o.key) == url)
                .map(|o| (Some(o.content_type), o.body.to_vec()))
        });
        let Some((content_type, bytes)) = hit else {
            return Err(FetchError::new(FailureKind::HttpStatus(404), "404 Not Found"));
        };
        Ok(FetchOutput {
            metadata: FetchMetadata {
                original_url: url.to_string(),
                final_url: url.to_string(),
                redirect_count: 0,
                content_type,
                byte_len: bytes.len() as u64,
            },
            bytes,
        })
    }
}

#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<EngineEvent>>,
}

impl RecordingSink {
    pub fn take(&self) -> Vec<EngineEvent> {
        self.events.lock().unwrap().drain(..).collect()
    }
}

impl ProgressSink for RecordingSink {
    fn emit(&self, event: EngineEvent) {
        self.events.lock().unwrap().push(event);
    }
}

/// Deterministic, non-flat test picture.
pub fn picture(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 251) as u8, (y % 241) as u8, ((x * 3 + y * 5) % 256) as u8])
    }))
}

pub fn encoded(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let mut cursor = Cursor::new(Vec::new());
    picture(width, height).write_to(&mut cursor, format).unwrap();
    cursor.into_inner()
}

pub fn article_html(og_image: Option<&str>) -> String {
    let meta = og_image
        .map(|src| format!(r#"<meta property="og:image" content="{src}">"#))
        .unwrap_or_default();
    format!(
        r#"<html><head><title>Storm hits coast</title>{meta}</head>
        <body><nav>Menu</nav><article><h1>Storm hits coast</h1>
        <p>Heavy rain &amp; wind battered the coast overnight.</p>
        <p>Residents were told to stay indoors.</p></article></body></html>"#
    )
}
