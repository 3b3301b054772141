use std::net::SocketAddr;

use env_helpers::{get_env, get_env_default};
use secrecy::SecretString;
use url::Url;

use crate::domain::entities::payment_mode::PaymentMode;

pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub database_url: String,
    pub paddle: PaddleConfig,
}

/// Vendor credentials and endpoints for the Paddle classic API.
pub struct PaddleConfig {
    pub vendor_id: i64,
    pub vendor_auth_code: SecretString,
    pub mode: PaymentMode,
    /// Overrides the API root derived from `mode` (e.g. a local stub server).
    pub api_base: Option<Url>,
    /// Sent as `webhook_url` on one-off charges.
    pub webhook_url: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let bind_addr: SocketAddr = get_env_default("BIND_ADDR", "127.0.0.1:3001".parse().unwrap());
        let database_url: String = get_env("DATABASE_URL");

        Self {
            bind_addr,
            database_url,
            paddle: PaddleConfig::from_env(),
        }
    }
}

impl PaddleConfig {
    pub fn from_env() -> Self {
        let vendor_id: i64 = get_env("PADDLE_VENDOR_ID");
        let vendor_auth_code: SecretString =
            SecretString::new(get_env::<String>("PADDLE_VENDOR_AUTH_CODE").into());
        let mode: PaymentMode = get_env_default("PADDLE_MODE", PaymentMode::Sandbox);
        let api_base: Option<Url> = std::env::var("PADDLE_API_BASE")
            .ok()
            .and_then(|s| s.parse().ok());
        let webhook_url: Option<String> = std::env::var("PADDLE_WEBHOOK_URL")
            .ok()
            .filter(|s| !s.trim().is_empty());

        Self {
            vendor_id,
            vendor_auth_code,
            mode,
            api_base,
            webhook_url,
        }
    }

    /// API root without the `/2.0` version segment and without a trailing slash.
    pub fn api_base(&self) -> String {
        match &self.api_base {
            Some(url) => url.as_str().trim_end_matches('/').to_string(),
            None => self.mode.api_base().to_string(),
        }
    }
}
