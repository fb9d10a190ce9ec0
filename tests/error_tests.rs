// Error handling tests
// Author: kelexine (https://github.com/kelexine)

use axum::http::StatusCode;
use axum::response::IntoResponse;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use vision_relay::error::RelayError;

async fn render(error: RelayError) -> (StatusCode, Value) {
    let response = error.into_response();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[test]
fn test_error_display_messages() {
    let errors = vec![
        RelayError::InvalidRequest("Missing 'image' field".to_string()),
        RelayError::Config("OPENAI_API_KEY not configured".to_string()),
        RelayError::Decode("bad bytes".to_string()),
        RelayError::Resize("encoder failed".to_string()),
        RelayError::UpstreamStatus {
            status: 500,
            body: "oops".to_string(),
        },
        RelayError::UpstreamShape { body: json!({}) },
        RelayError::Transport("connection reset".to_string()),
        RelayError::Internal("join error".to_string()),
    ];

    for error in errors {
        let display = format!("{}", error);
        assert!(!display.is_empty(), "Error should have display message");
    }
}

#[test]
fn test_only_client_input_is_a_bad_request() {
    assert_eq!(
        RelayError::InvalidRequest("x".to_string()).status_code(),
        StatusCode::BAD_REQUEST
    );
    assert_eq!(
        RelayError::Decode("x".to_string()).status_code(),
        StatusCode::INTERNAL_SERVER_ERROR
    );
    assert_eq!(
        RelayError::Resize("x".to_string()).status_code(),
        StatusCode::INTERNAL_SERVER_ERROR
    );
    assert_eq!(
        RelayError::Config("x".to_string()).status_code(),
        StatusCode::INTERNAL_SERVER_ERROR
    );
}

#[tokio::test]
async fn test_invalid_request_body() {
    let (status, body) = render(RelayError::InvalidRequest("Missing 'image' field".to_string())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "Missing 'image' field"}));
}

#[tokio::test]
async fn test_upstream_status_body() {
    let (status, body) = render(RelayError::UpstreamStatus {
        status: 401,
        body: "invalid api key".to_string(),
    })
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body,
        json!({"error": "OpenAI API error: 401", "details": "invalid api key"})
    );
}

#[tokio::test]
async fn test_upstream_shape_body() {
    let raw = json!({"choices": []});
    let (status, body) = render(RelayError::UpstreamShape { body: raw.clone() }).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Unexpected response structure from OpenAI API");
    assert_eq!(body["details"], raw);
}

#[tokio::test]
async fn test_transport_error_has_message_only() {
    let (status, body) = render(RelayError::Transport("operation timed out".to_string())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "operation timed out"}));
}

#[tokio::test]
async fn test_payload_too_large_body() {
    let (status, body) =
        render(RelayError::PayloadTooLarge("length limit exceeded".to_string())).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(
        body,
        json!({"error": "Request body too large: length limit exceeded"})
    );
}
