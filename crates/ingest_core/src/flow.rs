use bytes::Bytes;
use ingest_logging::ingest_debug;

use crate::{validate_dimensions, ImageFailure, ImageRecord, ImageSettings, ObjectRole};
use crate::{THUMBNAIL_CONTENT_TYPE, THUMBNAIL_EXTENSION};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageStage {
    Start,
    Acquiring,
    Validating,
    ResizingOriginal,
    HashingOriginal,
    UploadingOriginal,
    GeneratingThumbnail,
    UploadingThumbnail,
    Done,
    Degraded,
}

impl ImageStage {
    pub fn is_terminal(self) -> bool {
        matches!(self, ImageStage::Done | ImageStage::Degraded)
    }
}

/// A resolved candidate image, labelled before any bytes are fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSource {
    /// Absolute URL, protocol-relative forms already normalized.
    pub url: String,
    pub content_type: String,
    pub extension: String,
}

/// Work the engine must perform to move the flow forward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageEffect {
    Fetch {
        url: String,
    },
    Inspect {
        bytes: Bytes,
    },
    ResizeOriginal {
        bytes: Bytes,
        width: u32,
    },
    Hash {
        bytes: Bytes,
    },
    Store {
        role: ObjectRole,
        key: String,
        bytes: Bytes,
        content_type: String,
    },
    /// Re-read the stored original through its public URL.
    FetchStored {
        url: String,
    },
    Thumbnail {
        bytes: Bytes,
        width: u32,
        height: u32,
        quality: u8,
    },
}

/// Results reported back by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageMsg {
    Fetched(Bytes),
    FetchFailed(String),
    Inspected { width: u32, height: u32 },
    InspectFailed(String),
    Resized(Bytes),
    ResizeFailed(String),
    Hashed(String),
    Stored { role: ObjectRole, url: String },
    StoreFailed { role: ObjectRole, reason: String },
    StoredFetched(Bytes),
    ThumbnailReady(Bytes),
    ThumbnailFailed(String),
}

/// State of one image moving through acquire → validate → resize → hash →
/// upload → thumbnail → upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFlow {
    stage: ImageStage,
    settings: ImageSettings,
    source: ImageSource,
    fetched: Option<Bytes>,
    resized: Option<Bytes>,
    hash: Option<String>,
    orig: Option<String>,
    thumb: Option<String>,
    failure: Option<ImageFailure>,
}

impl ImageFlow {
    pub fn new(source: ImageSource, settings: ImageSettings) -> Self {
        Self {
            stage: ImageStage::Start,
            settings,
            source,
            fetched: None,
            resized: None,
            hash: None,
            orig: None,
            thumb: None,
            failure: None,
        }
    }

    /// Leaves `Start` and asks for the candidate bytes.
    pub fn start(mut self) -> (Self, Option<ImageEffect>) {
        if self.stage != ImageStage::Start {
            return (self, None);
        }
        self.stage = ImageStage::Acquiring;
        let effect = ImageEffect::Fetch {
            url: self.source.url.clone(),
        };
        (self, Some(effect))
    }

    pub fn stage(&self) -> ImageStage {
        self.stage
    }

    pub fn source(&self) -> &ImageSource {
        &self.source
    }

    pub fn hash(&self) -> Option<&str> {
        self.hash.as_deref()
    }

    /// The failure that degraded the flow, or the thumbnail failure of a
    /// flow that still finished.
    pub fn failure(&self) -> Option<&ImageFailure> {
        self.failure.as_ref()
    }

    /// Final record once the flow is terminal.
    pub fn outcome(&self) -> Option<ImageRecord> {
        match self.stage {
            ImageStage::Done => {
                let (hash, orig) = match (self.hash.clone(), self.orig.clone()) {
                    (Some(hash), Some(orig)) => (hash, orig),
                    _ => return None,
                };
                Some(ImageRecord::Available {
                    content_type: self.source.content_type.clone(),
                    extension: self.source.extension.clone(),
                    hash,
                    orig,
                    thumb: self.thumb.clone(),
                })
            }
            ImageStage::Degraded => Some(ImageRecord::Unavailable {
                content_type: self.source.content_type.clone(),
                extension: self.source.extension.clone(),
                hash: self.hash.clone(),
                reason: self
                    .failure
                    .clone()
                    .unwrap_or_else(|| ImageFailure::Stalled(format!("{:?}", self.stage))),
            }),
            _ => None,
        }
    }

    fn degrade(mut self, failure: ImageFailure) -> (Self, Option<ImageEffect>) {
        self.stage = ImageStage::Degraded;
        self.fetched = None;
        self.resized = None;
        self.failure = Some(failure);
        (self, None)
    }

    fn finish_without_thumbnail(mut self, failure: ImageFailure) -> (Self, Option<ImageEffect>) {
        self.stage = ImageStage::Done;
        self.failure = Some(failure);
        (self, None)
    }
}

/// Pure transition function: applies an engine result to the flow and
/// returns the next effect, if any.
///
/// Failures up to and including the original upload degrade the flow.
/// Thumbnail failures finish it without a thumbnail. Messages that do not
/// belong to the current stage leave the flow untouched.
pub fn update(mut flow: ImageFlow, msg: ImageMsg) -> (ImageFlow, Option<ImageEffect>) {
    match (flow.stage, msg) {
        (ImageStage::Acquiring, ImageMsg::Fetched(bytes)) => {
            flow.stage = ImageStage::Validating;
            flow.fetched = Some(bytes.clone());
            (flow, Some(ImageEffect::Inspect { bytes }))
        }
        (ImageStage::Acquiring, ImageMsg::FetchFailed(reason)) => {
            flow.degrade(ImageFailure::Fetch(reason))
        }
        (ImageStage::Validating, ImageMsg::Inspected { width, height }) => {
            if let Err(failure) = validate_dimensions(width, height, flow.settings.min_dimension) {
                return flow.degrade(failure);
            }
            let Some(bytes) = flow.fetched.take() else {
                return flow.degrade(ImageFailure::Undecodable("source bytes missing".into()));
            };
            flow.stage = ImageStage::ResizingOriginal;
            let width = flow.settings.original_max_width;
            (flow, Some(ImageEffect::ResizeOriginal { bytes, width }))
        }
        (ImageStage::Validating, ImageMsg::InspectFailed(reason)) => {
            flow.degrade(ImageFailure::Undecodable(reason))
        }
        (ImageStage::ResizingOriginal, ImageMsg::Resized(bytes)) => {
            flow.stage = ImageStage::HashingOriginal;
            flow.resized = Some(bytes.clone());
            (flow, Some(ImageEffect::Hash { bytes }))
        }
        (ImageStage::ResizingOriginal, ImageMsg::ResizeFailed(reason)) => {
            flow.degrade(ImageFailure::Resize(reason))
        }
        (ImageStage::HashingOriginal, ImageMsg::Hashed(digest)) => {
            let Some(bytes) = flow.resized.take() else {
                return flow.degrade(ImageFailure::Resize("resized bytes missing".into()));
            };
            let key = ObjectRole::Original.key(&digest, &flow.source.extension);
            flow.hash = Some(digest);
            flow.stage = ImageStage::UploadingOriginal;
            let effect = ImageEffect::Store {
                role: ObjectRole::Original,
                key,
                bytes,
                content_type: flow.source.content_type.clone(),
            };
            (flow, Some(effect))
        }
        (
            ImageStage::UploadingOriginal,
            ImageMsg::Stored {
                role: ObjectRole::Original,
                url,
            },
        ) => {
            flow.orig = Some(url.clone());
            flow.stage = ImageStage::GeneratingThumbnail;
            (flow, Some(ImageEffect::FetchStored { url }))
        }
        (
            ImageStage::UploadingOriginal,
            ImageMsg::StoreFailed {
                role: ObjectRole::Original,
                reason,
            },
        ) => flow.degrade(ImageFailure::Storage {
            role: ObjectRole::Original,
            reason,
        }),
        (ImageStage::GeneratingThumbnail, ImageMsg::StoredFetched(bytes)) => {
            let effect = ImageEffect::Thumbnail {
                bytes,
                width: flow.settings.thumbnail_width,
                height: flow.settings.thumbnail_height,
                quality: flow.settings.thumbnail_quality,
            };
            (flow, Some(effect))
        }
        (ImageStage::GeneratingThumbnail, ImageMsg::FetchFailed(reason))
        | (ImageStage::GeneratingThumbnail, ImageMsg::ThumbnailFailed(reason)) => {
            flow.finish_without_thumbnail(ImageFailure::Thumbnail(reason))
        }
        (ImageStage::GeneratingThumbnail, ImageMsg::ThumbnailReady(bytes)) => {
            let Some(digest) = flow.hash.as_deref() else {
                return flow.finish_without_thumbnail(ImageFailure::Thumbnail(
                    "hash missing".into(),
                ));
            };
            let key = ObjectRole::Thumbnail.key(digest, THUMBNAIL_EXTENSION);
            flow.stage = ImageStage::UploadingThumbnail;
            let effect = ImageEffect::Store {
                role: ObjectRole::Thumbnail,
                key,
                bytes,
                content_type: THUMBNAIL_CONTENT_TYPE.to_string(),
            };
            (flow, Some(effect))
        }
        (
            ImageStage::UploadingThumbnail,
            ImageMsg::Stored {
                role: ObjectRole::Thumbnail,
                url,
            },
        ) => {
            flow.thumb = Some(url);
            flow.stage = ImageStage::Done;
            (flow, None)
        }
        (
            ImageStage::UploadingThumbnail,
            ImageMsg::StoreFailed {
                role: ObjectRole::Thumbnail,
                reason,
            },
        ) => flow.finish_without_thumbnail(ImageFailure::Storage {
            role: ObjectRole::Thumbnail,
            reason,
        }),
        (stage, msg) => {
            ingest_debug!("ignoring {} in stage {:?}", msg_name(&msg), stage);
            (flow, None)
        }
    }
}

fn msg_name(msg: &ImageMsg) -> &'static str {
    match msg {
        ImageMsg::Fetched(_) => "Fetched",
        ImageMsg::FetchFailed(_) => "FetchFailed",
        ImageMsg::Inspected { .. } => "Inspected",
        ImageMsg::InspectFailed(_) => "InspectFailed",
        ImageMsg::Resized(_) => "Resized",
        ImageMsg::ResizeFailed(_) => "ResizeFailed",
        ImageMsg::Hashed(_) => "Hashed",
        ImageMsg::Stored { .. } => "Stored",
        ImageMsg::StoreFailed { .. } => "StoreFailed",
        ImageMsg::StoredFetched(_) => "StoredFetched",
        ImageMsg::ThumbnailReady(_) => "ThumbnailReady",
        ImageMsg::ThumbnailFailed(_) => "ThumbnailFailed",
    }
}
