use std::sync::Arc;

use bytes::Bytes;
use ingest_core::ImageSource;
use mime_guess::Mime;
use url::Url;

use crate::fetch::{Fetcher, Progress};
use crate::FetchError;

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";
const FALLBACK_EXTENSION: &str = "bin";

/// `//host/path` → `https://host/path`; anything else is trimmed and kept.
pub fn normalize_image_url(raw: &str) -> String {
    let raw = raw.trim();
    match raw.strip_prefix("//") {
        Some(rest) => format!("https://{rest}"),
        None => raw.to_string(),
    }
}

/// Labels a candidate from its URL alone, before any byte is fetched.
///
/// The type comes from the path extension, so a misleading extension yields
/// a misleading label.
pub fn describe_image(raw_url: &str) -> ImageSource {
    let url = normalize_image_url(raw_url);
    let mime = guess_mime(&url);
    let (content_type, extension) = match mime {
        Some(mime) => {
            let extension = extension_for(&mime);
            (mime.essence_str().to_string(), extension)
        }
        None => (FALLBACK_CONTENT_TYPE.to_string(), FALLBACK_EXTENSION.to_string()),
    };
    ImageSource {
        url,
        content_type,
        extension,
    }
}

fn guess_mime(url: &str) -> Option<Mime> {
    let path = match Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => url.split(['?', '#']).next().unwrap_or(url).to_string(),
    };
    mime_guess::from_path(path).first()
}

fn extension_for(mime: &Mime) -> String {
    match mime.essence_str() {
        "image/jpeg" => "jpg".to_string(),
        "image/svg+xml" => "svg".to_string(),
        "image/tiff" => "tiff".to_string(),
        "image/x-icon" | "image/vnd.microsoft.icon" => "ico".to_string(),
        _ => mime_guess::get_mime_extensions(mime)
            .and_then(|exts| exts.first())
            .map(|ext| ext.to_string())
            .unwrap_or_else(|| FALLBACK_EXTENSION.to_string()),
    }
}

/// Downloads candidate images over the image fetcher.
#[derive(Clone)]
pub struct ImageAcquirer {
    fetcher: Arc<dyn Fetcher>,
}

impl ImageAcquirer {
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self { fetcher }
    }

    pub async fn acquire(&self, url: &str, progress: Progress<'_>) -> Result<Bytes, FetchError> {
        let output = self.fetcher.fetch(&normalize_image_url(url), progress).await?;
        Ok(Bytes::from(output.bytes))
    }
}
