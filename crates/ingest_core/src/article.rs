use serde::ser::{SerializeStruct, Serializer};
use serde::Serialize;

use crate::ImageFailure;

pub const FORMAT_READ: &str = "read";
pub const STREAM_NEWS: &str = "news";

/// Outcome of the image pipeline for one article.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageRecord {
    /// The resized original is stored. `thumb` is `None` when only the
    /// thumbnail phase failed.
    Available {
        content_type: String,
        extension: String,
        hash: String,
        orig: String,
        thumb: Option<String>,
    },
    /// A candidate was found but nothing usable was stored.
    Unavailable {
        content_type: String,
        extension: String,
        hash: Option<String>,
        reason: ImageFailure,
    },
    /// No candidate image was resolved for the page.
    Placeholder,
}

impl ImageRecord {
    pub fn hash(&self) -> Option<&str> {
        match self {
            ImageRecord::Available { hash, .. } => Some(hash),
            ImageRecord::Unavailable { hash, .. } => hash.as_deref(),
            ImageRecord::Placeholder => None,
        }
    }

    pub fn orig(&self) -> Option<&str> {
        match self {
            ImageRecord::Available { orig, .. } => Some(orig),
            _ => None,
        }
    }

    pub fn thumb(&self) -> Option<&str> {
        match self {
            ImageRecord::Available { thumb, .. } => thumb.as_deref(),
            _ => None,
        }
    }
}

// Wire shape: `{type, extension, hash, orig, thumb}` with nulls for missing
// values. Placeholders carry only `orig`, `hash` and `thumb`.
impl Serialize for ImageRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ImageRecord::Placeholder => {
                let mut s = serializer.serialize_struct("Image", 3)?;
                s.serialize_field("orig", &None::<String>)?;
                s.serialize_field("hash", &None::<String>)?;
                s.serialize_field("thumb", &None::<String>)?;
                s.end()
            }
            ImageRecord::Available {
                content_type,
                extension,
                ..
            }
            | ImageRecord::Unavailable {
                content_type,
                extension,
                ..
            } => {
                let mut s = serializer.serialize_struct("Image", 5)?;
                s.serialize_field("type", content_type)?;
                s.serialize_field("extension", extension)?;
                s.serialize_field("hash", &self.hash())?;
                s.serialize_field("orig", &self.orig())?;
                s.serialize_field("thumb", &self.thumb())?;
                s.end()
            }
        }
    }
}

/// A freshly ingested article. Built once, never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Article {
    pub url: String,
    pub title: Option<String>,
    pub description: String,
    pub content: Option<String>,
    pub images: Vec<ImageRecord>,
    pub format: &'static str,
    pub stream: &'static str,
    pub processing: bool,
}

impl Article {
    pub fn new(
        url: impl Into<String>,
        title: Option<String>,
        description: String,
        content: Option<String>,
        image: ImageRecord,
    ) -> Self {
        Self {
            url: url.into(),
            title,
            description,
            content,
            images: vec![image],
            format: FORMAT_READ,
            stream: STREAM_NEWS,
            processing: true,
        }
    }
}

/// Envelope handed to the completion callback: `{ "data": Article }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScrapeResponse {
    pub data: Article,
}
