use std::sync::Arc;

use axum::extract::FromRef;

use crate::{domain::entities::payment_mode::PaymentMode, use_cases::webhook::WebhookUseCases};

/// Only the webhook is served over HTTP. Checkout and lifecycle use cases are
/// called from the host application, which owns authentication.
#[derive(Clone)]
pub struct AppState {
    pub paddle_mode: PaymentMode,
    pub webhook_use_cases: Arc<WebhookUseCases>,
}

impl FromRef<AppState> for Arc<WebhookUseCases> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.webhook_use_cases.clone()
    }
}
