// HTTP request handlers
// Author: kelexine (https://github.com/kelexine)

use super::routes::AppState;
use crate::error::{RelayError, Result};
use crate::openai::Explanation;
use crate::relay::AnalyzeInput;
use crate::vision::InboundImage;
use axum::{
    body::Bytes,
    extract::{FromRequest, Multipart, Request, State},
    http::{header, HeaderMap, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::{debug, info};

const MISSING_IMAGE: &str = "Missing 'image' field";
const DEFAULT_MEDIA_TYPE: &str = "image/jpeg";

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct IndexResponse {
    pub message: String,
}

pub async fn index_handler() -> Json<IndexResponse> {
    Json(IndexResponse {
        message: "Hello from vision-relay! POST an image to /analyze-image.".to_string(),
    })
}

pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// Echo the posted JSON back; a body that is not JSON echoes as `null`.
pub async fn echo_handler(State(state): State<AppState>, request: Request) -> Result<Json<Value>> {
    let body = read_body(request, &state).await?;
    let received = serde_json::from_slice::<Value>(&body).unwrap_or(Value::Null);
    Ok(Json(json!({ "received": received })))
}

/// Handler for `/analyze-image`.
///
/// Accepts `multipart/form-data` (fields `image` and `prompt`) or a JSON
/// body `{"image", "prompt", "media_type"}` where `image` is base64 or an
/// `http(s)` URL.
pub async fn analyze_image_handler(
    State(state): State<AppState>,
    request: Request,
) -> Result<Json<Explanation>> {
    let input = if is_multipart(request.headers()) {
        let multipart = Multipart::from_request(request, &state)
            .await
            .map_err(|e| body_error(e.status(), format!("Invalid multipart body: {}", e.body_text())))?;
        parse_multipart(multipart).await?
    } else {
        let body = read_body(request, &state).await?;
        parse_json_body(&body)?
    };

    info!(
        "Received analyze request: source={}, custom_prompt={}",
        source_kind(&input.image),
        input.prompt.is_some()
    );

    // Detached so a client disconnect does not abort the upstream call;
    // it runs to completion or timeout either way
    let relay = state.relay.clone();
    let explanation = tokio::spawn(async move { relay.analyze(input).await })
        .await
        .map_err(|e| RelayError::Internal(format!("Analysis task failed: {}", e)))??;

    Ok(Json(explanation))
}

async fn read_body(request: Request, state: &AppState) -> Result<Bytes> {
    Bytes::from_request(request, state)
        .await
        .map_err(|e| body_error(e.status(), e.body_text()))
}

/// Map an extractor failure onto the JSON error taxonomy. Hitting the body
/// limit is reported as 413 whether or not the client sent `Content-Length`.
fn body_error(status: StatusCode, message: String) -> RelayError {
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        RelayError::PayloadTooLarge(message)
    } else {
        RelayError::InvalidRequest(message)
    }
}

fn is_multipart(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.to_ascii_lowercase().starts_with("multipart/form-data"))
}

fn source_kind(image: &InboundImage) -> &'static str {
    match image {
        InboundImage::Bytes { .. } => "upload",
        InboundImage::Base64 { .. } => "base64",
        InboundImage::Url(_) => "url",
    }
}

/// Parse the JSON form of the request. Unparsable bodies are treated as
/// empty, so they report the missing image rather than a syntax error.
fn parse_json_body(body: &[u8]) -> Result<AnalyzeInput> {
    let data = match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => map,
        Ok(_) => return Err(RelayError::InvalidRequest(MISSING_IMAGE.to_string())),
        Err(e) => {
            debug!("Request body is not JSON: {}", e);
            return Err(RelayError::InvalidRequest(MISSING_IMAGE.to_string()));
        }
    };

    let image = match data.get("image") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(_) => {
            return Err(RelayError::InvalidRequest(
                "'image' must be a string".to_string(),
            ))
        }
    }
    .filter(|s| !s.trim().is_empty())
    .ok_or_else(|| RelayError::InvalidRequest(MISSING_IMAGE.to_string()))?;

    let media_type = string_field(&data, "media_type")
        .filter(|mt| !mt.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_MEDIA_TYPE.to_string());

    Ok(AnalyzeInput {
        image: InboundImage::from_json_string(image, media_type),
        prompt: string_field(&data, "prompt"),
    })
}

fn string_field(data: &Map<String, Value>, key: &str) -> Option<String> {
    data.get(key).and_then(Value::as_str).map(str::to_string)
}

async fn parse_multipart(mut multipart: Multipart) -> Result<AnalyzeInput> {
    let mut image: Option<(Bytes, Option<String>)> = None;
    let mut prompt: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| body_error(e.status(), format!("Multipart error: {}", e)))?
    {
        let field_name = field.name().map(str::to_string);
        match field_name.as_deref() {
            Some("image") => {
                let content_type = field.content_type().map(str::to_string);
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| body_error(e.status(), format!("Read error: {}", e)))?;
                image = Some((data, content_type));
            }
            Some("prompt") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| body_error(e.status(), format!("Read error: {}", e)))?;
                prompt = Some(text);
            }
            _ => {}
        }
    }

    let (data, media_type) = image
        .filter(|(data, _)| !data.is_empty())
        .ok_or_else(|| RelayError::InvalidRequest(MISSING_IMAGE.to_string()))?;

    Ok(AnalyzeInput {
        image: InboundImage::Bytes { data, media_type },
        prompt,
    })
}
