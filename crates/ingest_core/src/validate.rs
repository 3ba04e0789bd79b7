use crate::ImageFailure;

/// Rejects images whose width or height is below `min_dimension` pixels.
pub fn validate_dimensions(
    width: u32,
    height: u32,
    min_dimension: u32,
) -> Result<(), ImageFailure> {
    if width < min_dimension || height < min_dimension {
        return Err(ImageFailure::TooSmall { width, height });
    }
    Ok(())
}
