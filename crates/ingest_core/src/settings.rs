/// Thresholds and output geometry for the image pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSettings {
    /// Images narrower or shorter than this are rejected before resizing.
    pub min_dimension: u32,
    /// Width of the stored original; height follows the aspect ratio.
    pub original_max_width: u32,
    pub thumbnail_width: u32,
    pub thumbnail_height: u32,
    /// JPEG quality for thumbnails, 1..=100.
    pub thumbnail_quality: u8,
}

impl Default for ImageSettings {
    fn default() -> Self {
        Self {
            min_dimension: 10,
            original_max_width: 1340,
            thumbnail_width: 400,
            thumbnail_height: 224,
            thumbnail_quality: 80,
        }
    }
}
