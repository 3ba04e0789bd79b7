use std::fmt;

/// Extension used for every thumbnail key, regardless of the source format.
pub const THUMBNAIL_EXTENSION: &str = "JPEG";
pub const THUMBNAIL_CONTENT_TYPE: &str = "image/jpeg";

/// Which derivative a stored object holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectRole {
    Original,
    Thumbnail,
}

impl ObjectRole {
    pub fn suffix(self) -> &'static str {
        match self {
            ObjectRole::Original => "orig",
            ObjectRole::Thumbnail => "thumb",
        }
    }

    /// Content-addressed storage key: `{digest}-{suffix}.{ext}`.
    ///
    /// Thumbnails ignore `original_extension` and always use [`THUMBNAIL_EXTENSION`].
    pub fn key(self, digest: &str, original_extension: &str) -> String {
        let ext = match self {
            ObjectRole::Original => original_extension,
            ObjectRole::Thumbnail => THUMBNAIL_EXTENSION,
        };
        format!("{digest}-{suffix}.{ext}", suffix = self.suffix())
    }
}

impl fmt::Display for ObjectRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

#[cfg(test)]
mod tests {
    use super::ObjectRole;

    #[test]
    fn original_key_keeps_extension() {
        assert_eq!(ObjectRole::Original.key("abc123", "png"), "abc123-orig.png");
    }

    #[test]
    fn thumbnail_key_is_always_jpeg() {
        assert_eq!(ObjectRole::Thumbnail.key("abc123", "png"), "abc123-thumb.JPEG");
    }
}
