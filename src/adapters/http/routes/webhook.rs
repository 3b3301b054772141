//! Paddle webhook endpoint.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{Form, Json, Router, extract::State, routing::post};
use serde_json::{Value, json};
use tracing::{debug, instrument};

use crate::{
    adapters::http::app_state::AppState,
    app_error::AppResult,
    use_cases::webhook::{PaddleWebhook, WebhookOutcome, WebhookUseCases},
};

pub fn router() -> Router<AppState> {
    Router::new().route("/webhook", post(handle_webhook))
}

/// POST /paddle/webhook
///
/// Malformed alerts get a 400. Storage failures surface as 500 so Paddle
/// retries the delivery.
#[instrument(skip_all)]
async fn handle_webhook(
    State(webhooks): State<Arc<WebhookUseCases>>,
    Form(fields): Form<HashMap<String, String>>,
) -> AppResult<Json<Value>> {
    let webhook = PaddleWebhook::from_fields(&fields)?;
    let alert_name = webhook.alert_name().to_string();

    let handled = match webhooks.handle(webhook).await? {
        WebhookOutcome::Created(_) | WebhookOutcome::Updated(_) => true,
        WebhookOutcome::Ignored => false,
    };
    debug!(alert_name = %alert_name, handled, "Paddle webhook processed");

    Ok(Json(json!({ "alert_name": alert_name, "handled": handled })))
}
