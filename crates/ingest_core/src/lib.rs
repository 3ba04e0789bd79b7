//! Ingest core: article model and the pure image pipeline state machine.
mod article;
mod failure;
mod flow;
mod key;
mod settings;
mod validate;

pub use article::{Article, ImageRecord, ScrapeResponse, FORMAT_READ, STREAM_NEWS};
pub use failure::ImageFailure;
pub use flow::{update, ImageEffect, ImageFlow, ImageMsg, ImageSource, ImageStage};
pub use key::{ObjectRole, THUMBNAIL_EXTENSION, THUMBNAIL_CONTENT_TYPE};
pub use settings::ImageSettings;
pub use validate::validate_dimensions;
