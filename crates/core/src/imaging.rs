//! Image validation and normalization for embedding.
//!
//! Bytes are fully decoded to prove they are a usable image. Formats that a
//! presentation can embed directly are passed through untouched; anything else
//! (WEBP in practice) is flattened to RGB and re-encoded as PNG.

use image::{DynamicImage, ImageFormat as DecodedFormat};
use std::io::Cursor;

use crate::error::{Error, Result};
use crate::types::{ImageFormat, ResolvedImage};

fn embeddable(format: DecodedFormat) -> Option<ImageFormat> {
    match format {
        DecodedFormat::Png => Some(ImageFormat::Png),
        DecodedFormat::Jpeg => Some(ImageFormat::Jpeg),
        DecodedFormat::Gif => Some(ImageFormat::Gif),
        DecodedFormat::Bmp => Some(ImageFormat::Bmp),
        DecodedFormat::Tiff => Some(ImageFormat::Tiff),
        _ => None,
    }
}

/// Decode `bytes` and return them in an embeddable encoding.
pub fn normalize_image(bytes: &[u8]) -> Result<ResolvedImage> {
    let detected = image::guess_format(bytes)
        .map_err(|e| Error::ImageError(format!("Unrecognized image data: {}", e)))?;
    let decoded = image::load_from_memory_with_format(bytes, detected)
        .map_err(|e| Error::ImageError(format!("Failed to decode {:?}: {}", detected, e)))?;
    let (width, height) = (decoded.width(), decoded.height());

    if let Some(format) = embeddable(detected) {
        return Ok(ResolvedImage {
            bytes: bytes.to_vec(),
            format,
            width,
            height,
        });
    }

    log::debug!("Re-encoding {:?} image ({}x{}) as PNG", detected, width, height);
    let rgb = DynamicImage::ImageRgb8(decoded.to_rgb8());
    let mut buffer = Cursor::new(Vec::new());
    rgb.write_to(&mut buffer, DecodedFormat::Png)
        .map_err(|e| Error::ImageError(format!("Failed to encode PNG: {}", e)))?;

    Ok(ResolvedImage {
        bytes: buffer.into_inner(),
        format: ImageFormat::Png,
        width,
        height,
    })
}
