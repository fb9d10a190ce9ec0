//! Image handling for the relay: decoding and downscaling.
//!
//! Incoming images are decoded to an RGB raster, scaled down to a bounded
//! width and re-encoded as JPEG before they are forwarded, which keeps the
//! upstream payload (and its cost) small.
//!
//! # Submodules
//!
//! - `models`: Inbound image representations, resize parameters, encoded output.
//! - `decode`: Base64 unwrapping, container parsing, MIME sniffing.
//! - `resize`: Lanczos downscaling and JPEG encoding.
//!
//! Author: kelexine (<https://github.com/kelexine>)

pub mod decode;
pub mod models;
pub mod resize;

pub use decode::{decode_base64, decode_image, detect_mime_type};
pub use models::{DecodedImage, EncodedImage, ImageFormat, InboundImage, ResizeSpec};
pub use resize::resize;
