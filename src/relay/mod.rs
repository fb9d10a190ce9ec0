//! The resize-then-relay pipeline.
//!
//! Each request runs the same linear sequence: decode, resize, build the
//! upstream payload, send it, unwrap the reply. Any stage failing ends the
//! request with that stage's error; there is no partial success.
//!
//! Author: kelexine (<https://github.com/kelexine>)

use crate::config::ImageConfig;
use crate::error::{RelayError, Result};
use crate::openai::{build_request, unwrap_response, Explanation, VisionClient};
use crate::vision::decode::strip_data_url_prefix;
use crate::vision::{
    decode_base64, decode_image, detect_mime_type, resize, EncodedImage, ImageFormat,
    InboundImage, ResizeSpec,
};
use bytes::Bytes;
use tracing::{debug, info};

/// One parsed `/analyze-image` request.
#[derive(Debug, Clone)]
pub struct AnalyzeInput {
    pub image: InboundImage,
    pub prompt: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Relay {
    client: VisionClient,
    image_config: ImageConfig,
}

impl Relay {
    pub fn new(client: VisionClient, image_config: ImageConfig) -> Self {
        Self {
            client,
            image_config,
        }
    }

    /// Run the full pipeline for one request.
    pub async fn analyze(&self, input: AnalyzeInput) -> Result<Explanation> {
        // No point decoding anything if the upstream call cannot be made
        self.client.ensure_credentials()?;

        let image_url = self.prepare_image(input.image).await?;
        let request = build_request(input.prompt.as_deref(), image_url, self.client.config());

        let body = self.client.complete(&request).await?;
        let explanation = unwrap_response(body)?;

        info!(
            "Analysis complete: {} chars of explanation",
            explanation.explanation.len()
        );
        Ok(explanation)
    }

    /// Turn the inbound image into the URL placed in the upstream payload.
    async fn prepare_image(&self, image: InboundImage) -> Result<String> {
        match image {
            InboundImage::Url(url) if !self.image_config.fetch_remote => {
                debug!("Passing image URL through to upstream");
                Ok(url)
            }
            InboundImage::Url(url) => {
                let (data, media_type) = self
                    .client
                    .fetch_image(&url, self.image_config.max_image_bytes)
                    .await?;
                self.encode(data, media_type).await
            }
            InboundImage::Bytes { data, media_type } => self.encode(data, media_type).await,
            InboundImage::Base64 { data, media_type } => {
                let declared = strip_data_url_prefix(&data)
                    .0
                    .map(str::to_string)
                    .unwrap_or(media_type);
                let bytes = decode_base64(&data)?;
                self.encode(Bytes::from(bytes), Some(declared)).await
            }
        }
    }

    async fn encode(&self, data: Bytes, media_type: Option<String>) -> Result<String> {
        let config = self.image_config.clone();

        // Decoding and Lanczos resampling are CPU bound
        let encoded = tokio::task::spawn_blocking(move || preprocess(&data, media_type, &config))
            .await
            .map_err(|e| RelayError::Internal(format!("Image task failed: {}", e)))??;

        Ok(encoded.to_data_uri())
    }
}

/// Decode, then either resize to JPEG or pass the original bytes through.
///
/// The image is decoded in both cases so that garbage never reaches the
/// upstream API.
pub fn preprocess(
    data: &[u8],
    declared_media_type: Option<String>,
    config: &ImageConfig,
) -> Result<EncodedImage> {
    let decoded = decode_image(data, config.max_image_bytes)?;

    if !config.resize {
        let media_type = detect_mime_type(data)
            .map(|format| format.mime_type().to_string())
            .or_else(|| declared_media_type.filter(|mt| ImageFormat::from_mime_type(mt).is_some()))
            .unwrap_or_else(|| ImageFormat::Jpeg.mime_type().to_string());

        return Ok(EncodedImage {
            data: data.to_vec(),
            media_type,
        });
    }

    resize(&decoded, &ResizeSpec::from(config))
}
