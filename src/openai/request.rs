// Upstream payload construction
// Author: kelexine (https://github.com/kelexine)

use super::{ChatCompletionRequest, ChatMessage, ContentPart, ImageUrl};
use crate::config::UpstreamConfig;

/// Build the single-message chat completion request for one image.
///
/// `image_url` is either a remote URL or a `data:` URI. A missing prompt
/// falls back to the configured default; a present prompt is used as-is,
/// even when empty.
pub fn build_request(
    prompt: Option<&str>,
    image_url: String,
    config: &UpstreamConfig,
) -> ChatCompletionRequest {
    let text = prompt.unwrap_or(&config.default_prompt).to_string();

    ChatCompletionRequest {
        model: config.model.clone(),
        messages: vec![ChatMessage {
            role: "user".to_string(),
            content: vec![
                ContentPart::Text { text },
                ContentPart::ImageUrl {
                    image_url: ImageUrl { url: image_url },
                },
            ],
        }],
        max_tokens: config.max_tokens,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_wire_format() {
        let config = UpstreamConfig::default();
        let request = build_request(
            Some("describe"),
            "data:image/jpeg;base64,AAAA".to_string(),
            &config,
        );

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            json!({
                "model": "gpt-4o-mini",
                "messages": [{
                    "role": "user",
                    "content": [
                        {"type": "text", "text": "describe"},
                        {"type": "image_url", "image_url": {"url": "data:image/jpeg;base64,AAAA"}}
                    ]
                }],
                "max_tokens": 512
            })
        );
    }

    #[test]
    fn test_default_prompt() {
        let config = UpstreamConfig::default();
        let request = build_request(None, "https://example.com/a.png".to_string(), &config);

        match &request.messages[0].content[0] {
            ContentPart::Text { text } => {
                assert_eq!(text, "Explain what you see in this image in detail.")
            }
            other => panic!("expected text part, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_prompt_is_kept() {
        let config = UpstreamConfig::default();
        let request = build_request(Some(""), "https://example.com/a.png".to_string(), &config);
        assert_eq!(
            request.messages[0].content[0],
            ContentPart::Text { text: String::new() }
        );
    }
}
