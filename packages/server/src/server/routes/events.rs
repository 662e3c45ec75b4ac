//! Upload-notification webhook.
//!
//! Accepts either a Pub/Sub push envelope (`{"message": {"data": base64}}`)
//! or the bare storage event JSON. The response code is the retry contract:
//! 2xx acknowledges the event (including skips - redelivery would change
//! nothing), 4xx drops malformed payloads, 5xx asks the trigger to redeliver
//! with its own backoff.

use axum::{extract::Extension, http::StatusCode, Json};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde_json::Value;
use tracing::{error, warn};

use crate::domains::scoring::{handle_upload, StorageEvent};
use crate::server::app::AppState;

/// Decode the storage event from either delivery shape.
fn parse_event(payload: &Value) -> Option<StorageEvent> {
    if let Some(data) = payload["message"]["data"].as_str() {
        let decoded = BASE64.decode(data).ok()?;
        return serde_json::from_slice(&decoded).ok();
    }
    serde_json::from_value(payload.clone()).ok()
}

pub async fn storage_event_handler(
    Extension(state): Extension<AppState>,
    Json(payload): Json<Value>,
) -> StatusCode {
    let Some(event) = parse_event(&payload) else {
        warn!("unparseable storage event payload");
        return StatusCode::BAD_REQUEST;
    };

    match handle_upload(&state.deps, &event).await {
        Ok(outcome) => {
            tracing::debug!(object = %event.name, ?outcome, "storage event handled");
            StatusCode::NO_CONTENT
        }
        Err(e) => {
            // Pre-write failures (blob fetch) and exhausted persistence
            // retries land here; redelivery is safe in both cases.
            error!(object = %event.name, error = %e, "pipeline invocation failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_bare_event() {
        let payload = json!({ "bucket": "sdg-app-uploads", "name": "posts/p1.jpg" });
        let event = parse_event(&payload).unwrap();
        assert_eq!(event.bucket, "sdg-app-uploads");
        assert_eq!(event.name, "posts/p1.jpg");
    }

    #[test]
    fn parses_pubsub_envelope() {
        let inner = json!({ "bucket": "sdg-app-uploads", "name": "posts/p1.jpg" });
        let encoded = BASE64.encode(serde_json::to_vec(&inner).unwrap());
        let payload = json!({ "message": { "data": encoded, "messageId": "123" } });

        let event = parse_event(&payload).unwrap();
        assert_eq!(event.name, "posts/p1.jpg");
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_event(&json!({ "message": { "data": "!!!" } })).is_none());
        assert!(parse_event(&json!({ "bucket": "only" })).is_none());
    }
}
