use std::sync::Arc;

use bytes::Bytes;
use ingest_core::{
    update, ImageEffect, ImageFailure, ImageFlow, ImageMsg, ImageRecord, ImageSettings,
    ImageSource, ImageStage,
};
use ingest_logging::{ingest_debug, ingest_info, ingest_warn, short_url};

use crate::acquire::ImageAcquirer;
use crate::derive::{DerivativeGenerator, DeriveError, ThumbnailSpec};
use crate::fetch::Progress;
use crate::store::{ObjectAcl, ObjectStore, PutObject, StorageLocation};
use crate::{content_digest, Stage};

/// Executes the effects of an [`ImageFlow`] until it reaches a terminal stage.
///
/// Every effect is awaited before the next message is fed back, so the
/// thumbnail is never generated before the original upload is acknowledged
/// and the record is never returned before the thumbnail upload finishes.
#[derive(Clone)]
pub struct ImagePipeline {
    acquirer: ImageAcquirer,
    derivatives: Arc<dyn DerivativeGenerator>,
    store: Arc<dyn ObjectStore>,
    location: StorageLocation,
    settings: ImageSettings,
}

impl ImagePipeline {
    pub fn new(
        acquirer: ImageAcquirer,
        derivatives: Arc<dyn DerivativeGenerator>,
        store: Arc<dyn ObjectStore>,
        location: StorageLocation,
        settings: ImageSettings,
    ) -> Self {
        Self {
            acquirer,
            derivatives,
            store,
            location,
            settings,
        }
    }

    /// Never fails: problems end up inside the returned record.
    pub async fn run(&self, source: ImageSource, progress: Progress<'_>) -> ImageRecord {
        let url = source.url.clone();
        let (mut flow, mut next) = ImageFlow::new(source, self.settings.clone()).start();
        let mut stage = flow.stage();
        progress.at(Stage::Image(stage)).report(None);

        while let Some(effect) = next {
            let msg = self.execute(effect, progress.at(Stage::Image(stage))).await;
            (flow, next) = update(flow, msg);
            if flow.stage() != stage {
                stage = flow.stage();
                ingest_debug!("job {}: image stage {:?}", progress.job_id, stage);
                progress.at(Stage::Image(stage)).report(None);
            }
        }

        match (flow.stage(), flow.failure()) {
            (ImageStage::Degraded, Some(failure)) => {
                ingest_warn!(
                    "job {}: image {} unavailable: {}",
                    progress.job_id,
                    short_url(&url),
                    failure
                );
            }
            (ImageStage::Done, Some(failure)) => {
                ingest_warn!(
                    "job {}: stored {} without thumbnail: {}",
                    progress.job_id,
                    short_url(&url),
                    failure
                );
            }
            (ImageStage::Done, None) => {
                ingest_info!(
                    "job {}: stored image {}",
                    progress.job_id,
                    flow.hash().unwrap_or_default()
                );
            }
            _ => {}
        }

        flow.outcome().unwrap_or_else(|| {
            let source = flow.source();
            ImageRecord::Unavailable {
                content_type: source.content_type.clone(),
                extension: source.extension.clone(),
                hash: flow.hash().map(str::to_string),
                reason: ImageFailure::Stalled(format!("{stage:?}")),
            }
        })
    }

    async fn execute(&self, effect: ImageEffect, progress: Progress<'_>) -> ImageMsg {
        match effect {
            ImageEffect::Fetch { url } => match self.acquirer.acquire(&url, progress).await {
                Ok(bytes) => ImageMsg::Fetched(bytes),
                Err(err) => ImageMsg::FetchFailed(err.to_string()),
            },
            ImageEffect::Inspect { bytes } => {
                match self.offload(move |d| d.dimensions(&bytes)).await {
                    Ok((width, height)) => ImageMsg::Inspected { width, height },
                    Err(err) => ImageMsg::InspectFailed(err.to_string()),
                }
            }
            ImageEffect::ResizeOriginal { bytes, width } => {
                match self.offload(move |d| d.resize_original(&bytes, width)).await {
                    Ok(resized) => ImageMsg::Resized(Bytes::from(resized)),
                    Err(err) => ImageMsg::ResizeFailed(err.to_string()),
                }
            }
            ImageEffect::Hash { bytes } => ImageMsg::Hashed(content_digest(&bytes)),
            ImageEffect::Store {
                role,
                key,
                bytes,
                content_type,
            } => {
                let object = PutObject {
                    key: key.clone(),
                    body: bytes,
                    content_type,
                    acl: ObjectAcl::PublicRead,
                };
                match self.store.put(object).await {
                    Ok(()) => ImageMsg::Stored {
                        role,
                        url: self.location.public_url(&key),
                    },
                    Err(err) => ImageMsg::StoreFailed {
                        role,
                        reason: err.to_string(),
                    },
                }
            }
            ImageEffect::FetchStored { url } => match self.acquirer.acquire(&url, progress).await {
                Ok(bytes) => ImageMsg::StoredFetched(bytes),
                Err(err) => ImageMsg::FetchFailed(err.to_string()),
            },
            ImageEffect::Thumbnail {
                bytes,
                width,
                height,
                quality,
            } => {
                let spec = ThumbnailSpec {
                    width,
                    height,
                    quality,
                };
                match self.offload(move |d| d.thumbnail(&bytes, spec)).await {
                    Ok(thumb) => ImageMsg::ThumbnailReady(Bytes::from(thumb)),
                    Err(err) => ImageMsg::ThumbnailFailed(err.to_string()),
                }
            }
        }
    }

    /// Runs CPU-bound image work off the async workers.
    async fn offload<T, F>(&self, job: F) -> Result<T, DeriveError>
    where
        F: FnOnce(&dyn DerivativeGenerator) -> Result<T, DeriveError> + Send + 'static,
        T: Send + 'static,
    {
        let derivatives = self.derivatives.clone();
        tokio::task::spawn_blocking(move || job(derivatives.as_ref()))
            .await
            .map_err(|err| DeriveError::Worker(err.to_string()))?
    }
}
