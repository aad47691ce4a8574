//! Image decoding for fetched payloads.

use super::error::DecodeError;
use image::RgbaImage;
use std::fmt;
use std::sync::Arc;

/// A decoded, displayable image.
///
/// Wraps the RGBA bitmap in an `Arc` so outcomes can be cloned and handed to
/// a rendering context without copying pixels.
#[derive(Clone)]
pub struct DecodedImage {
    pixels: Arc<RgbaImage>,
}

impl DecodedImage {
    /// Wraps an already decoded bitmap.
    pub fn new(pixels: RgbaImage) -> Self {
        Self {
            pixels: Arc::new(pixels),
        }
    }

    /// Image width in pixels.
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    /// Image height in pixels.
    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Borrows the RGBA bitmap.
    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }
}

impl fmt::Debug for DecodedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodedImage")
            .field("width", &self.width())
            .field("height", &self.height())
            .finish()
    }
}

impl PartialEq for DecodedImage {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.pixels, &other.pixels) || *self.pixels == *other.pixels
    }
}

/// Decodes a response body into an RGBA image.
///
/// An empty body is [`DecodeError::Empty`]; anything the `image` crate cannot
/// recognise or parse is [`DecodeError::Malformed`].
pub fn decode_image(data: &[u8]) -> Result<DecodedImage, DecodeError> {
    if data.is_empty() {
        return Err(DecodeError::Empty);
    }

    let img = image::load_from_memory(data).map_err(|e| DecodeError::Malformed(e.to_string()))?;
    Ok(DecodedImage::new(img.to_rgba8()))
}
