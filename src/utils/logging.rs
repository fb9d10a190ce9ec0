//! Structured logging and security-focused trace utilities.
//!
//! This module configures the `tracing` ecosystem for the application,
//! supporting multiple output formats and providing utilities to prevent
//! sensitive data (like API keys) from leaking into logs.
//!
//! Author: kelexine (<https://github.com/kelexine>)

use crate::config::LoggingConfig;
use crate::error::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initializes the global tracing subscriber for the application.
///
/// Supports three output formats:
/// - `json`: Structured JSON logs for production ingestion.
/// - `compact`: Single-line output.
/// - `pretty` (default): Human-readable, colorized output for development.
///
/// Log levels are controlled via the `RUST_LOG` environment variable or
/// the provided `LoggingConfig`. Debug mode lowers the configured level to
/// `debug`.
pub fn init(config: &LoggingConfig, debug: bool) -> Result<()> {
    let level = if debug { "debug" } else { config.level.as_str() };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    match config.format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        "compact" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().compact())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }

    Ok(())
}

/// Sanitizes sensitive information from log messages.
///
/// Every OpenAI-style secret key (`sk-...`) and every bearer token is
/// replaced with a `\[REDACTED\]` placeholder.
pub fn sanitize(input: &str) -> String {
    let mut result = redact_after(input, "sk-", "[REDACTED_API_KEY]");
    result = redact_after(&result, "Bearer ", "Bearer [REDACTED_TOKEN]");
    result
}

/// Truncate a payload for debug logging, sanitizing it when requested.
pub fn preview(input: &str, max_chars: usize, sanitize_tokens: bool) -> String {
    let mut out: String = input.chars().take(max_chars).collect();
    if input.chars().count() > max_chars {
        out.push_str("...");
    }
    if sanitize_tokens {
        sanitize(&out)
    } else {
        out
    }
}

fn redact_after(input: &str, marker: &str, replacement: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(pos) = rest.find(marker) {
        result.push_str(&rest[..pos]);
        let token = &rest[pos + marker.len()..];

        // Only match at the start of a word ("task-1" is not a key)
        let mid_word = rest[..pos]
            .chars()
            .next_back()
            .is_some_and(|c| c.is_alphanumeric());
        if mid_word {
            result.push_str(marker);
            rest = token;
            continue;
        }

        // Search for the end of the token (delimiter or end of string)
        let end = token
            .find(|c: char| c.is_whitespace() || c == '"' || c == '\'' || c == ',')
            .unwrap_or(token.len());
        result.push_str(replacement);
        rest = &token[end..];
    }

    result.push_str(rest);
    result
}
