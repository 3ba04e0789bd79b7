//! Ingest engine: page and image IO, derivative generation, storage, and the
//! scrape pipeline that ties them together.
mod acquire;
mod article;
mod config;
mod decode;
mod derive;
mod description;
mod digest;
mod engine;
mod extract;
mod fetch;
mod pipeline;
mod resolve;
mod scraper;
mod store;
mod types;

pub use acquire::{describe_image, normalize_image_url, ImageAcquirer};
pub use article::{ArticleExtractor, ArticlePage};
pub use config::EngineConfig;
pub use decode::{decode_html, DecodedHtml};
pub use derive::{
    scaled_height, DerivativeGenerator, DeriveError, RasterDerivatives, ThumbnailSpec,
    MAX_OUTPUT_PIXELS,
};
pub use description::{build_description, strip_markup, DESCRIPTION_MAX_CHARS};
pub use digest::content_digest;
pub use engine::EngineHandle;
pub use extract::{ExtractError, ExtractedContent, Extractor, ReadabilityLikeExtractor};
pub use fetch::{
    ChannelProgressSink, FetchSettings, Fetcher, NullProgressSink, Progress, ProgressSink,
    ReqwestFetcher,
};
pub use pipeline::ImagePipeline;
pub use resolve::{
    FileExtensionStrategy, ImageResolver, ImageStrategy, MimeTypeStrategy, OpenGraphStrategy,
    PageSnapshot, WebpageStrategy,
};
pub use scraper::{ScrapeError, Scraper, ScraperBuilder};
pub use store::{ObjectAcl, ObjectStore, PutObject, S3ObjectStore, StorageError, StorageLocation};
pub use types::{
    EngineEvent, FailureKind, FetchError, FetchMetadata, FetchOutput, JobId, JobProgress, Stage,
};
