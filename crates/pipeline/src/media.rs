//! Media inspection helpers.

use std::io::Cursor;

/// Pixel dimensions of an encoded image, read from its header only.
///
/// Returns `None` for non-image data, unsupported formats and sizes that
/// do not fit an `i32`.
pub fn image_dimensions(bytes: &[u8]) -> Option<(i32, i32)> {
    let reader = image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .ok()?;
    let (width, height) = reader.into_dimensions().ok()?;
    Some((i32::try_from(width).ok()?, i32::try_from(height).ok()?))
}
