use std::sync::Arc;

use ingest_core::{Article, ImageRecord, ScrapeResponse};
use ingest_logging::{ingest_info, short_url};

use crate::acquire::{describe_image, ImageAcquirer};
use crate::article::{ArticleExtractor, ArticlePage};
use crate::derive::{DerivativeGenerator, RasterDerivatives};
use crate::fetch::{Fetcher, Progress, ProgressSink, ReqwestFetcher};
use crate::pipeline::ImagePipeline;
use crate::resolve::{ImageResolver, PageSnapshot};
use crate::store::ObjectStore;
use crate::{
    EngineConfig, ExtractError, Extractor, FetchError, JobId, ReadabilityLikeExtractor, Stage,
};

/// Failures that abort an article. Image problems never show up here.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScrapeError {
    #[error("page fetch failed: {0}")]
    Fetch(#[from] FetchError),
    #[error("article extraction failed: {0}")]
    Extraction(#[from] ExtractError),
}

/// Article in, article record out: extraction, image resolution, the image
/// pipeline, and assembly, one after the other.
pub struct Scraper {
    articles: ArticleExtractor,
    resolver: ImageResolver,
    images: ImagePipeline,
}

impl Scraper {
    /// Production collaborators for everything but storage.
    pub fn new(config: EngineConfig, store: Arc<dyn ObjectStore>) -> Self {
        Self::builder(config, store).build()
    }

    pub fn builder(config: EngineConfig, store: Arc<dyn ObjectStore>) -> ScraperBuilder {
        ScraperBuilder {
            config,
            store,
            page_fetcher: None,
            image_fetcher: None,
            extractor: None,
            resolver: None,
            derivatives: None,
        }
    }

    pub async fn scrape(
        &self,
        job_id: JobId,
        url: &str,
        sink: &dyn ProgressSink,
    ) -> Result<Article, ScrapeError> {
        let progress = Progress::new(job_id, Stage::Queued, sink);
        ingest_info!("job {}: scraping {}", job_id, short_url(url));

        let page = self.articles.extract(url, progress).await?;

        progress.at(Stage::ResolvingImage).report(None);
        let image = match self.resolve_candidate(url, &page) {
            Some(candidate) => {
                let source = describe_image(&candidate);
                ingest_info!(
                    "job {}: representative image {} ({})",
                    job_id,
                    short_url(&source.url),
                    source.content_type
                );
                self.images.run(source, progress).await
            }
            None => {
                ingest_info!("job {}: no representative image", job_id);
                ImageRecord::Placeholder
            }
        };

        let article = Article::new(url, page.title, page.description, page.content, image);
        progress.at(Stage::Done).report(None);
        Ok(article)
    }

    /// Runs [`Scraper::scrape`] and hands the `{ data }` envelope to
    /// `on_complete` exactly once. Fatal errors are returned instead and the
    /// callback is not called.
    pub async fn scrape_with<F>(
        &self,
        job_id: JobId,
        url: &str,
        sink: &dyn ProgressSink,
        on_complete: F,
    ) -> Result<(), ScrapeError>
    where
        F: FnOnce(ScrapeResponse),
    {
        let article = self.scrape(job_id, url, sink).await?;
        on_complete(ScrapeResponse { data: article });
        Ok(())
    }

    fn resolve_candidate(&self, url: &str, page: &ArticlePage) -> Option<String> {
        let snapshot = PageSnapshot::new(
            url,
            &page.final_url,
            page.content_type.clone(),
            &page.html,
        );
        self.resolver.resolve(&snapshot)
    }
}

pub struct ScraperBuilder {
    config: EngineConfig,
    store: Arc<dyn ObjectStore>,
    page_fetcher: Option<Arc<dyn Fetcher>>,
    image_fetcher: Option<Arc<dyn Fetcher>>,
    extractor: Option<Arc<dyn Extractor>>,
    resolver: Option<ImageResolver>,
    derivatives: Option<Arc<dyn DerivativeGenerator>>,
}

impl ScraperBuilder {
    pub fn page_fetcher(mut self, fetcher: Arc<dyn Fetcher>) -> Self {
        self.page_fetcher = Some(fetcher);
        self
    }

    pub fn image_fetcher(mut self, fetcher: Arc<dyn Fetcher>) -> Self {
        self.image_fetcher = Some(fetcher);
        self
    }

    pub fn extractor(mut self, extractor: Arc<dyn Extractor>) -> Self {
        self.extractor = Some(extractor);
        self
    }

    pub fn resolver(mut self, resolver: ImageResolver) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn derivatives(mut self, derivatives: Arc<dyn DerivativeGenerator>) -> Self {
        self.derivatives = Some(derivatives);
        self
    }

    pub fn build(self) -> Scraper {
        let EngineConfig {
            page_fetch,
            image_fetch,
            image,
            storage,
        } = self.config;

        let page_fetcher = self
            .page_fetcher
            .unwrap_or_else(|| Arc::new(ReqwestFetcher::new(page_fetch)));
        let image_fetcher = self
            .image_fetcher
            .unwrap_or_else(|| Arc::new(ReqwestFetcher::new(image_fetch)));
        let extractor = self
            .extractor
            .unwrap_or_else(|| Arc::new(ReadabilityLikeExtractor));
        let derivatives = self
            .derivatives
            .unwrap_or_else(|| Arc::new(RasterDerivatives));

        Scraper {
            articles: ArticleExtractor::new(page_fetcher, extractor),
            resolver: self.resolver.unwrap_or_default(),
            images: ImagePipeline::new(
                ImageAcquirer::new(image_fetcher),
                derivatives,
                self.store,
                storage,
                image,
            ),
        }
    }
}
