//! Configuration data structures for the vision relay.
//!
//! This module defines the schema for the application settings: server
//! binding, the upstream chat completion API, image preprocessing limits,
//! and logging.
//!
//! Author: kelexine (<https://github.com/kelexine>)

use serde::{Deserialize, Serialize};

/// The root configuration object for the application.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// HTTP server settings (host, port, debug).
    #[serde(default)]
    pub server: ServerConfig,

    /// Upstream vision API settings.
    #[serde(default)]
    pub upstream: UpstreamConfig,

    /// Image decoding and downscaling settings.
    #[serde(default)]
    pub image: ImageConfig,

    /// Logging and observability settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Settings for the built-in HTTP server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The IP address or hostname the server should bind to.
    /// Default: `0.0.0.0`
    #[serde(default = "default_host")]
    pub host: String,

    /// The port number the server should listen on.
    /// Default: `5000`
    #[serde(default = "default_port")]
    pub port: u16,

    /// Debug mode raises the default log level to `debug`.
    /// Default: `false`
    #[serde(default)]
    pub debug: bool,

    /// Largest accepted request body, multipart uploads included.
    /// Default: 50 MiB
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

/// Settings for the upstream chat completion API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Base URL of the API; requests go to `<base>/chat/completions`.
    /// Default: `https://api.openai.com/v1`
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Bearer credential. Requests to `/analyze-image` fail without it.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Vision-capable model identifier.
    /// Default: `gpt-4o-mini`
    #[serde(default = "default_model")]
    pub model: String,

    /// Maximum output tokens requested from the model.
    /// Default: `512`
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Request timeout in seconds.
    /// Default: `60`
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Prompt used when the caller does not send one.
    #[serde(default = "default_prompt")]
    pub default_prompt: String,
}

/// Settings for image preprocessing before forwarding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageConfig {
    /// Re-encode (and downscale if needed) images before forwarding.
    /// Default: `true`
    #[serde(default = "default_true")]
    pub resize: bool,

    /// Images wider than this are scaled down to exactly this width.
    /// Default: `1024`
    #[serde(default = "default_max_width")]
    pub max_width: u32,

    /// JPEG quality factor (1-100).
    /// Default: `75`
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,

    /// Largest decoded image accepted, in bytes.
    /// Default: 20 MiB
    #[serde(default = "default_max_image_bytes")]
    pub max_image_bytes: usize,

    /// Download URL inputs and run them through the resizer instead of
    /// handing the URL to the upstream API.
    /// Default: `false`
    #[serde(default)]
    pub fetch_remote: bool,
}

/// Settings for application logging and output format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Minimum log level (`trace`, `debug`, `info`, `warn`, `error`).
    /// Default: `info`
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format for logs (`pretty`, `json`, `compact`).
    /// Default: `pretty`
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Whether to mask API keys and bearer tokens in logs.
    /// Default: `true`
    #[serde(default = "default_true")]
    pub sanitize_tokens: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            debug: false,
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            api_key: None,
            model: default_model(),
            max_tokens: default_max_tokens(),
            timeout_seconds: default_timeout(),
            default_prompt: default_prompt(),
        }
    }
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            resize: true,
            max_width: default_max_width(),
            jpeg_quality: default_jpeg_quality(),
            max_image_bytes: default_max_image_bytes(),
            fetch_remote: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            sanitize_tokens: true,
        }
    }
}

// Helper functions for serde defaults
fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_max_body_bytes() -> usize {
    50 * 1024 * 1024
}

fn default_api_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_max_tokens() -> u32 {
    512
}

fn default_timeout() -> u64 {
    60
}

fn default_prompt() -> String {
    "Explain what you see in this image in detail.".to_string()
}

fn default_true() -> bool {
    true
}

fn default_max_width() -> u32 {
    1024
}

fn default_jpeg_quality() -> u8 {
    75
}

fn default_max_image_bytes() -> usize {
    20 * 1024 * 1024
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}
