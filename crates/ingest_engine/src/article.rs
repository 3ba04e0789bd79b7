use std::sync::Arc;

use ingest_logging::{ingest_debug, ingest_info, ingest_warn, short_url};

use crate::description::build_description;
use crate::fetch::{Fetcher, Progress};
use crate::{decode_html, Extractor, ScrapeError, Stage};

/// A fetched page with its readable text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticlePage {
    pub final_url: String,
    pub content_type: Option<String>,
    /// Decoded document; empty when the URL served an image directly.
    pub html: String,
    pub title: Option<String>,
    pub content: Option<String>,
    pub description: String,
}

/// Fetches a page and runs readability extraction over it.
pub struct ArticleExtractor {
    fetcher: Arc<dyn Fetcher>,
    extractor: Arc<dyn Extractor>,
}

impl ArticleExtractor {
    pub fn new(fetcher: Arc<dyn Fetcher>, extractor: Arc<dyn Extractor>) -> Self {
        Self { fetcher, extractor }
    }

    pub async fn extract(
        &self,
        url: &str,
        progress: Progress<'_>,
    ) -> Result<ArticlePage, ScrapeError> {
        let progress = progress.at(Stage::FetchingPage);
        progress.report(None);
        let output = self.fetcher.fetch(url, progress).await?;
        let metadata = output.metadata;
        ingest_debug!(
            "fetched {} ({} bytes, {} redirects)",
            short_url(&metadata.final_url),
            metadata.byte_len,
            metadata.redirect_count
        );

        progress.at(Stage::Extracting).report(Some(metadata.byte_len));

        if is_image(metadata.content_type.as_deref()) {
            ingest_info!("{} is an image; no article text", short_url(url));
            return Ok(ArticlePage {
                final_url: metadata.final_url,
                content_type: metadata.content_type,
                html: String::new(),
                title: None,
                content: None,
                description: String::new(),
            });
        }

        let decoded = decode_html(&output.bytes, metadata.content_type.as_deref());
        if decoded.lossy {
            ingest_warn!(
                "{} decoded lossily as {}",
                short_url(url),
                decoded.encoding_label
            );
        }

        let extracted = self.extractor.extract(&decoded.html)?;
        let description = build_description(extracted.content_html.as_deref());

        Ok(ArticlePage {
            final_url: metadata.final_url,
            content_type: metadata.content_type,
            html: decoded.html,
            title: extracted.title,
            content: extracted.content_html,
            description,
        })
    }
}

pub(crate) fn is_image(content_type: Option<&str>) -> bool {
    content_type
        .map(|ct| ct.trim().to_ascii_lowercase().starts_with("image/"))
        .unwrap_or(false)
}
