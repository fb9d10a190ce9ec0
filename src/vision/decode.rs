// Image decoding: base64 unwrapping, container parsing, alpha flattening
// Author: kelexine (https://github.com/kelexine)

use super::models::{validate_image_size, DecodedImage, ImageFormat};
use crate::error::{RelayError, Result};
use base64::Engine;
use image::{DynamicImage, Rgb, RgbImage};

/// Split an optional `data:<type>;base64,` prefix off a base64 string.
///
/// Returns the media type named in the prefix (if any) and the payload.
pub fn strip_data_url_prefix(input: &str) -> (Option<&str>, &str) {
    let trimmed = input.trim();
    if let Some(rest) = trimmed.strip_prefix("data:") {
        if let Some((header, payload)) = rest.split_once(',') {
            let media_type = header
                .strip_suffix(";base64")
                .unwrap_or(header)
                .trim();
            let media_type = (!media_type.is_empty()).then_some(media_type);
            return (media_type, payload);
        }
    }
    (None, trimmed)
}

/// Decode a base64 image string into raw bytes.
pub fn decode_base64(input: &str) -> Result<Vec<u8>> {
    let (_, payload) = strip_data_url_prefix(input);

    // Clients frequently wrap long base64 strings
    let compact: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();

    base64::engine::general_purpose::STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| RelayError::Decode(format!("Invalid base64 image data: {}", e)))
}

/// Parse an image container into an RGB raster.
///
/// Alpha is composited over white so transparent regions do not turn black
/// once the image is re-encoded as JPEG.
pub fn decode_image(data: &[u8], max_bytes: usize) -> Result<DecodedImage> {
    validate_image_size(data.len(), max_bytes).map_err(RelayError::Decode)?;

    let image = image::load_from_memory(data)
        .map_err(|e| RelayError::Decode(format!("Invalid image data: {}", e)))?;

    Ok(DecodedImage::new(flatten(image)))
}

fn flatten(image: DynamicImage) -> RgbImage {
    if !image.color().has_alpha() {
        return image.to_rgb8();
    }

    let rgba = image.to_rgba8();
    let mut rgb = RgbImage::new(rgba.width(), rgba.height());
    for (x, y, pixel) in rgba.enumerate_pixels() {
        let [r, g, b, a] = pixel.0;
        let alpha = a as u16;
        let blend = |c: u8| ((c as u16 * alpha + 255 * (255 - alpha)) / 255) as u8;
        rgb.put_pixel(x, y, Rgb([blend(r), blend(g), blend(b)]));
    }
    rgb
}

/// Detect image format from magic bytes at start of image data
pub fn detect_mime_type(data: &[u8]) -> Option<ImageFormat> {
    if data.starts_with(b"\xFF\xD8\xFF") {
        Some(ImageFormat::Jpeg)
    } else if data.starts_with(b"\x89PNG\r\n\x1a\n") {
        Some(ImageFormat::Png)
    } else if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
        Some(ImageFormat::Gif)
    } else if data.len() >= 12 && data.starts_with(b"RIFF") && data[8..12] == *b"WEBP" {
        Some(ImageFormat::WebP)
    } else {
        None
    }
}
