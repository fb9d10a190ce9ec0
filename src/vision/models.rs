// Vision models and types
// Author: kelexine (https://github.com/kelexine)

use crate::config::ImageConfig;
use base64::Engine;
use bytes::Bytes;
use image::RgbImage;

/// Image as received from the caller. Exactly one representation per request.
#[derive(Debug, Clone)]
pub enum InboundImage {
    /// Raw uploaded bytes with the content type the client declared, if any.
    Bytes {
        data: Bytes,
        media_type: Option<String>,
    },
    /// Base64 payload, optionally still wrapped in a `data:` URL.
    Base64 { data: String, media_type: String },
    /// Remote image the upstream API can fetch itself.
    Url(String),
}

impl InboundImage {
    /// Classify a JSON `image` string as either a remote URL or base64 data.
    pub fn from_json_string(value: String, media_type: String) -> Self {
        if is_remote_url(&value) {
            InboundImage::Url(value.trim().to_string())
        } else {
            InboundImage::Base64 {
                data: value,
                media_type,
            }
        }
    }
}

fn is_remote_url(value: &str) -> bool {
    let lower = value.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Supported image formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Jpeg,
    Png,
    WebP,
    Gif,
}

impl ImageFormat {
    /// Get MIME type for this format
    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Png => "image/png",
            ImageFormat::WebP => "image/webp",
            ImageFormat::Gif => "image/gif",
        }
    }

    /// Try to detect format from MIME type
    pub fn from_mime_type(mime: &str) -> Option<Self> {
        match mime.to_lowercase().as_str() {
            "image/jpeg" | "image/jpg" => Some(ImageFormat::Jpeg),
            "image/png" => Some(ImageFormat::Png),
            "image/webp" => Some(ImageFormat::WebP),
            "image/gif" => Some(ImageFormat::Gif),
            _ => None,
        }
    }
}

/// Downscaling parameters. Output is always JPEG.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizeSpec {
    pub max_width: u32,
    pub quality: u8,
}

impl Default for ResizeSpec {
    fn default() -> Self {
        Self {
            max_width: 1024,
            quality: 75,
        }
    }
}

impl From<&ImageConfig> for ResizeSpec {
    fn from(config: &ImageConfig) -> Self {
        Self {
            max_width: config.max_width.max(1),
            quality: config.jpeg_quality.clamp(1, 100),
        }
    }
}

/// A decoded raster, flattened to 8-bit RGB.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pixels: RgbImage,
}

impl DecodedImage {
    pub fn new(pixels: RgbImage) -> Self {
        Self { pixels }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn pixels(&self) -> &RgbImage {
        &self.pixels
    }
}

/// Encoded image bytes ready to embed in the upstream payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub data: Vec<u8>,
    pub media_type: String,
}

impl EncodedImage {
    /// `data:<media-type>;base64,<payload>`
    pub fn to_data_uri(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.media_type,
            base64::engine::general_purpose::STANDARD.encode(&self.data)
        )
    }
}

/// Validate decoded image data size
pub fn validate_image_size(data_len: usize, max_bytes: usize) -> Result<(), String> {
    if data_len > max_bytes {
        return Err(format!(
            "Image size {} bytes exceeds maximum of {} bytes",
            data_len, max_bytes
        ));
    }
    Ok(())
}
