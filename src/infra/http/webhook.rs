use axum::{Json, extract::State, http::StatusCode};
use bytes::Bytes;
use quire_cms_types::ChangeNotification;
use serde::Serialize;
use tracing::info;

use crate::application::{error::HttpError, invalidation::apply_change};

use super::AppState;

const SOURCE: &str = "infra::http::webhook";

#[derive(Debug, Serialize)]
pub(super) struct WebhookAck {
    status: &'static str,
    message: &'static str,
}

/// Apply the invalidation policy for a CMS change notification.
///
/// An empty body is treated as a notification without action or slug.
pub(super) async fn cms_webhook(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<WebhookAck>, HttpError> {
    let notification: ChangeNotification = if body.iter().all(u8::is_ascii_whitespace) {
        ChangeNotification::default()
    } else {
        serde_json::from_slice(&body).map_err(|err| {
            HttpError::from_error(
                SOURCE,
                StatusCode::BAD_REQUEST,
                "Invalid webhook payload",
                &err,
            )
        })?
    };

    info!(
        target = SOURCE,
        action = notification.action.as_deref().unwrap_or(""),
        story_id = ?notification.story_id,
        story_slug = notification.story_slug().unwrap_or(""),
        "cms webhook received"
    );
    apply_change(&state.gateway, &notification).await;

    Ok(Json(WebhookAck {
        status: "success",
        message: "Webhook processed successfully",
    }))
}
