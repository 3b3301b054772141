use crate::{
    adapters::http::app_state::AppState,
    infra::{config::AppConfig, postgres_persistence},
    use_cases::{customer::CustomerRepo, subscription::SubscriptionRepo, webhook::WebhookUseCases},
};
use std::fs::File;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub async fn init_app_state(config: &AppConfig) -> anyhow::Result<AppState> {
    let postgres_arc = Arc::new(postgres_persistence(&config.database_url).await?);

    info!(
        mode = %config.paddle.mode,
        api_base = %config.paddle.api_base(),
        "Paddle webhook receiver ready"
    );

    let customer_repo_arc = postgres_arc.clone() as Arc<dyn CustomerRepo>;
    let subscription_repo_arc = postgres_arc as Arc<dyn SubscriptionRepo>;
    let webhook_use_cases = WebhookUseCases::new(subscription_repo_arc, customer_repo_arc);

    Ok(AppState {
        paddle_mode: config.paddle.mode,
        webhook_use_cases: Arc::new(webhook_use_cases),
    })
}

pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "paddle_billing=debug,tower_http=debug".into());

    // Console (pretty logs)
    let console_layer = fmt::layer()
        .with_target(false)
        .with_level(true)
        .pretty();

    // File (structured JSON logs), skipped when the file can't be created
    let json_layer = File::create("app.log").ok().map(|file| {
        fmt::layer()
            .json()
            .with_writer(file)
            .with_current_span(true)
            .with_span_list(true)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(json_layer)
        .try_init()
        .ok();
}
