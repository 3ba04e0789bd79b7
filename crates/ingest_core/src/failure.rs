use crate::ObjectRole;

/// Why the representative image could not be fully produced.
///
/// None of these abort an article; they end up inside an
/// [`ImageRecord`](crate::ImageRecord) instead.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ImageFailure {
    #[error("image fetch failed: {0}")]
    Fetch(String),
    #[error("image could not be decoded: {0}")]
    Undecodable(String),
    #[error("image too small ({width}x{height})")]
    TooSmall { width: u32, height: u32 },
    #[error("resize failed: {0}")]
    Resize(String),
    #[error("storage write for {role} failed: {reason}")]
    Storage { role: ObjectRole, reason: String },
    #[error("thumbnail generation failed: {0}")]
    Thumbnail(String),
    #[error("image pipeline stopped in stage {0}")]
    Stalled(String),
}
