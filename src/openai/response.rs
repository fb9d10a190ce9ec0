// Response unwrapping (chat completion JSON -> explanation)
// Author: kelexine (https://github.com/kelexine)

use crate::error::{RelayError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

/// What the relay hands back to its caller on success.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Explanation {
    pub explanation: String,
    /// Upstream `model`, echoed verbatim (`null` when absent).
    pub model: Value,
    /// Upstream `usage`, echoed verbatim (`null` when absent).
    pub usage: Value,
}

/// Extract the explanation text from an upstream chat completion body.
///
/// The body must carry a non-empty `choices` array whose first element has
/// a `message` object; anything else is reported with the full body attached.
pub fn unwrap_response(body: Value) -> Result<Explanation> {
    let content = first_message(&body).map(|message| content_text(message.get("content")));
    let Some(content) = content else {
        return Err(RelayError::UpstreamShape { body });
    };

    debug!("Unwrapped explanation ({} chars)", content.len());

    Ok(Explanation {
        explanation: content,
        model: body.get("model").cloned().unwrap_or(Value::Null),
        usage: body.get("usage").cloned().unwrap_or(Value::Null),
    })
}

/// Content is normally a string. Array-of-parts content has its text parts
/// joined; anything else yields an empty explanation.
fn content_text(content: Option<&Value>) -> String {
    match content {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(Value::Array(parts)) => {
            warn!("Upstream content is an array of {} parts, joining text parts", parts.len());
            parts
                .iter()
                .filter(|part| part.get("type").and_then(Value::as_str) == Some("text"))
                .filter_map(|part| part.get("text").and_then(Value::as_str))
                .collect::<Vec<_>>()
                .join("")
        }
        Some(other) => {
            warn!("Upstream content is not text, returning empty explanation: {}", other);
            String::new()
        }
    }
}

fn first_message(body: &Value) -> Option<&serde_json::Map<String, Value>> {
    body.get("choices")?
        .as_array()?
        .first()?
        .get("message")?
        .as_object()
        .filter(|message| !message.is_empty())
}
