// Downscaling and JPEG re-encoding
// Author: kelexine (https://github.com/kelexine)

use super::models::{DecodedImage, EncodedImage, ImageFormat, ResizeSpec};
use crate::error::{RelayError, Result};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::RgbImage;
use tracing::debug;

/// Output dimensions for an image of `width` x `height` bounded by `max_width`.
///
/// Images at or below the bound keep their size. Wider images are scaled to
/// exactly `max_width`, with the height rounded to preserve aspect ratio.
pub fn target_dimensions(width: u32, height: u32, max_width: u32) -> (u32, u32) {
    if width <= max_width {
        return (width, height);
    }

    let scale = max_width as f64 / width as f64;
    let new_height = (height as f64 * scale).round().max(1.0) as u32;
    (max_width, new_height)
}

/// Downscale (if needed) and re-encode an image as JPEG.
pub fn resize(image: &DecodedImage, spec: &ResizeSpec) -> Result<EncodedImage> {
    let (width, height) = (image.width(), image.height());
    let (new_width, new_height) = target_dimensions(width, height, spec.max_width);

    let data = if (new_width, new_height) == (width, height) {
        debug!("Re-encoding {}x{} image without scaling", width, height);
        encode_jpeg(image.pixels(), spec.quality)?
    } else {
        debug!(
            "Resizing image {}x{} -> {}x{}",
            width, height, new_width, new_height
        );
        let resized = imageops::resize(image.pixels(), new_width, new_height, FilterType::Lanczos3);
        encode_jpeg(&resized, spec.quality)?
    };

    Ok(EncodedImage {
        data,
        media_type: ImageFormat::Jpeg.mime_type().to_string(),
    })
}

fn encode_jpeg(pixels: &RgbImage, quality: u8) -> Result<Vec<u8>> {
    if pixels.width() == 0 || pixels.height() == 0 {
        return Err(RelayError::Resize("Image has zero width or height".to_string()));
    }

    let mut buffer = Vec::new();
    JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100))
        .encode_image(pixels)
        .map_err(|e| RelayError::Resize(format!("JPEG encoding failed: {}", e)))?;
    Ok(buffer)
}
