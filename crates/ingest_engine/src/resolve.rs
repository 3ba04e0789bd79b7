//! Representative-image resolution.
//!
//! An [`ImageResolver`] asks an ordered list of [`ImageStrategy`] objects for a
//! candidate; the first answer wins. Strategies only look at the page that was
//! already fetched for extraction.

use ingest_logging::ingest_debug;
use scraper::{Html, Selector};
use url::Url;

use crate::article::is_image;

/// The fetched page as strategies see it.
pub struct PageSnapshot {
    pub url: String,
    pub final_url: String,
    pub content_type: Option<String>,
    document: Html,
}

impl PageSnapshot {
    pub fn new(
        url: impl Into<String>,
        final_url: impl Into<String>,
        content_type: Option<String>,
        html: &str,
    ) -> Self {
        Self {
            url: url.into(),
            final_url: final_url.into(),
            content_type,
            document: Html::parse_document(html),
        }
    }

    pub fn document(&self) -> &Html {
        &self.document
    }

    /// Turns an attribute value into a candidate URL.
    ///
    /// Absolute and protocol-relative (`//host/x`) values pass through as
    /// written; path-relative values are joined against the final page URL.
    pub fn candidate(&self, raw: &str) -> Option<String> {
        let raw = raw.trim();
        if raw.is_empty() || raw.starts_with("data:") {
            return None;
        }
        if raw.starts_with("//") || Url::parse(raw).is_ok() {
            return Some(raw.to_string());
        }
        Url::parse(&self.final_url)
            .ok()?
            .join(raw)
            .ok()
            .map(|joined| joined.to_string())
    }

    fn first_attr(&self, css: &str, attr: &str) -> Option<String> {
        let sel = Selector::parse(css).ok()?;
        self.document
            .select(&sel)
            .filter_map(|el| el.value().attr(attr))
            .find_map(|value| self.candidate(value))
    }
}

pub trait ImageStrategy: Send + Sync {
    fn name(&self) -> &'static str;
    fn resolve(&self, page: &PageSnapshot) -> Option<String>;
}

/// `og:image` and friends, then `twitter:image`.
#[derive(Debug, Default)]
pub struct OpenGraphStrategy;

impl ImageStrategy for OpenGraphStrategy {
    fn name(&self) -> &'static str {
        "opengraph"
    }

    fn resolve(&self, page: &PageSnapshot) -> Option<String> {
        [
            r#"meta[property="og:image"]"#,
            r#"meta[property="og:image:url"]"#,
            r#"meta[property="og:image:secure_url"]"#,
            r#"meta[name="twitter:image"]"#,
            r#"meta[name="twitter:image:src"]"#,
        ]
        .iter()
        .find_map(|css| page.first_attr(css, "content"))
    }
}

const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "webp", "bmp", "tif", "tiff", "svg", "ico", "avif",
];

/// The page URL itself ends in an image extension.
#[derive(Debug, Default)]
pub struct FileExtensionStrategy;

impl ImageStrategy for FileExtensionStrategy {
    fn name(&self) -> &'static str {
        "file-extension"
    }

    fn resolve(&self, page: &PageSnapshot) -> Option<String> {
        let parsed = Url::parse(&page.url).ok()?;
        let ext = parsed.path().rsplit_once('.')?.1.to_ascii_lowercase();
        IMAGE_EXTENSIONS
            .contains(&ext.as_str())
            .then(|| page.url.clone())
    }
}

/// The page response was served as `image/*`.
#[derive(Debug, Default)]
pub struct MimeTypeStrategy;

impl ImageStrategy for MimeTypeStrategy {
    fn name(&self) -> &'static str {
        "mime-type"
    }

    fn resolve(&self, page: &PageSnapshot) -> Option<String> {
        is_image(page.content_type.as_deref()).then(|| page.final_url.clone())
    }
}

/// First usable `<img>` in the document, then `link[rel=image_src]`.
#[derive(Debug, Default)]
pub struct WebpageStrategy;

impl ImageStrategy for WebpageStrategy {
    fn name(&self) -> &'static str {
        "webpage"
    }

    fn resolve(&self, page: &PageSnapshot) -> Option<String> {
        page.first_attr("img[src]", "src")
            .or_else(|| page.first_attr("img[data-src]", "data-src"))
            .or_else(|| page.first_attr(r#"link[rel="image_src"]"#, "href"))
    }
}

/// Ordered strategy list; no shared state beyond the list itself.
pub struct ImageResolver {
    strategies: Vec<Box<dyn ImageStrategy>>,
}

impl ImageResolver {
    pub fn new() -> Self {
        Self {
            strategies: Vec::new(),
        }
    }

    pub fn register(mut self, strategy: impl ImageStrategy + 'static) -> Self {
        self.strategies.push(Box::new(strategy));
        self
    }

    pub fn resolve(&self, page: &PageSnapshot) -> Option<String> {
        self.strategies.iter().find_map(|strategy| {
            let found = strategy.resolve(page);
            if let Some(candidate) = found.as_deref() {
                ingest_debug!("strategy {} found {}", strategy.name(), candidate);
            }
            found
        })
    }
}

impl Default for ImageResolver {
    fn default() -> Self {
        Self::new()
            .register(OpenGraphStrategy)
            .register(FileExtensionStrategy)
            .register(MimeTypeStrategy)
            .register(WebpageStrategy)
    }
}
