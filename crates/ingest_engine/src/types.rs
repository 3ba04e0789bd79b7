use ingest_core::{Article, ImageStage};

use crate::ScrapeError;

pub type JobId = u64;

/// Where a scrape job currently is. Image work reports the pipeline's own
/// stage so observers can see the upload ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Queued,
    FetchingPage,
    Extracting,
    ResolvingImage,
    Image(ImageStage),
    Done,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobProgress {
    pub job_id: JobId,
    pub stage: Stage,
    /// Bytes received so far for the current download, when known.
    pub bytes: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    Progress(JobProgress),
    /// Exactly one per enqueued job.
    ScrapeCompleted {
        job_id: JobId,
        result: Result<Box<Article>, ScrapeError>,
    },
}

/// Raw body plus what the transport learned about it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutput {
    pub bytes: Vec<u8>,
    pub metadata: FetchMetadata,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchMetadata {
    pub original_url: String,
    /// URL after redirects.
    pub final_url: String,
    pub redirect_count: usize,
    pub content_type: Option<String>,
    pub byte_len: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct FetchError {
    pub kind: FailureKind,
    pub message: String,
}

impl FetchError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Classification of a failed fetch; the message carries transport detail.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FailureKind {
    #[error("invalid url")]
    InvalidUrl,
    #[error("http status {0}")]
    HttpStatus(u16),
    #[error("timed out")]
    Timeout,
    #[error("too many redirects")]
    RedirectLimitExceeded,
    #[error("body exceeds {max_bytes} bytes (got {actual:?})")]
    TooLarge { max_bytes: u64, actual: Option<u64> },
    #[error("content type {content_type} not accepted")]
    UnsupportedContentType { content_type: String },
    #[error("network error")]
    Network,
}
