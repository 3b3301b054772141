use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{
    app_error::{AppError, AppResult},
    application::ports::{
        billable::Payload,
        paddle::{PaddleApi, SubscriptionUserUpdate, SubscriptionUserUpdated},
    },
    infra::{config::PaddleConfig, http_client::try_build_client},
};

/// Paddle classic vendor API client. Every call is an authenticated form POST.
#[derive(Clone)]
pub struct PaddleClient {
    client: Client,
    base_url: String,
    vendor_id: i64,
    vendor_auth_code: SecretString,
}

impl PaddleClient {
    pub fn new(config: &PaddleConfig) -> AppResult<Self> {
        let client = try_build_client()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.api_base(),
            vendor_id: config.vendor_id,
            vendor_auth_code: SecretString::new(config.vendor_auth_code.expose_secret().into()),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/2.0{}", self.base_url, path)
    }

    async fn post<T: DeserializeOwned>(&self, path: &str, payload: &Payload) -> AppResult<T> {
        let mut params = vec![
            ("vendor_id".to_string(), self.vendor_id.to_string()),
            (
                "vendor_auth_code".to_string(),
                self.vendor_auth_code.expose_secret().to_string(),
            ),
        ];
        params.extend(payload_to_form(payload));

        let response = self
            .client
            .post(self.url(path))
            .form(&params)
            .send()
            .await
            .map_err(|e| AppError::Internal(format!("Paddle request failed: {}", e)))?;

        self.handle_response(path, response).await
    }

    async fn handle_response<T: DeserializeOwned>(
        &self,
        path: &str,
        response: reqwest::Response,
    ) -> AppResult<T> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            tracing::error!(status = %status, path, body = %body, "Paddle API error");
        }

        let response = parse_envelope(&body).inspect_err(|e| {
            tracing::error!(status = %status, path, error = %e, "Paddle request rejected");
        })?;

        serde_json::from_value(response).map_err(|e| {
            tracing::error!(path, body = %body, error = %e, "Failed to parse Paddle response");
            AppError::Internal(format!("Failed to parse Paddle response: {}", e))
        })
    }
}

#[derive(Debug, Deserialize)]
struct Envelope {
    success: bool,
    #[serde(default)]
    response: Option<Value>,
    #[serde(default)]
    error: Option<EnvelopeError>,
}

#[derive(Debug, Deserialize)]
struct EnvelopeError {
    code: Option<i64>,
    message: String,
}

#[derive(Debug, Deserialize)]
struct PayLink {
    url: String,
}

/// Unwrap `{success, response | error}`. A successful call without a
/// `response` body yields `null`.
fn parse_envelope(body: &str) -> AppResult<Value> {
    let envelope: Envelope = serde_json::from_str(body)
        .map_err(|e| AppError::Internal(format!("Unexpected Paddle response: {}", e)))?;

    if envelope.success {
        return Ok(envelope.response.unwrap_or(Value::Null));
    }

    Err(match envelope.error {
        Some(error) => AppError::Provider {
            code: error.code,
            message: error.message,
        },
        None => AppError::Provider {
            code: None,
            message: "Paddle request failed without an error message".to_string(),
        },
    })
}

/// Flatten a payload into form fields. Arrays become `key[i]`, objects
/// `key[sub]`, nulls are dropped.
pub fn payload_to_form(payload: &Payload) -> Vec<(String, String)> {
    let mut fields = Vec::new();
    for (key, value) in payload {
        push_field(&mut fields, key.clone(), value);
    }
    fields
}

fn push_field(fields: &mut Vec<(String, String)>, key: String, value: &Value) {
    match value {
        Value::Null => {}
        Value::String(s) => fields.push((key, s.clone())),
        Value::Bool(b) => fields.push((key, b.to_string())),
        Value::Number(n) => fields.push((key, n.to_string())),
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                push_field(fields, format!("{}[{}]", key, i), item);
            }
        }
        Value::Object(map) => {
            for (sub, item) in map {
                push_field(fields, format!("{}[{}]", key, sub), item);
            }
        }
    }
}

#[async_trait]
impl PaddleApi for PaddleClient {
    async fn generate_pay_link(&self, payload: &Payload) -> AppResult<String> {
        let link: PayLink = self.post("/product/generate_pay_link", payload).await?;
        Ok(link.url)
    }

    async fn update_subscription_user(
        &self,
        update: &SubscriptionUserUpdate,
    ) -> AppResult<SubscriptionUserUpdated> {
        self.post("/subscription/users/update", &update.to_payload())
            .await
    }

    async fn cancel_subscription_user(&self, subscription_id: i64) -> AppResult<()> {
        let mut payload = Payload::new();
        payload.insert("subscription_id".into(), subscription_id.into());
        let _: Value = self.post("/subscription/users_cancel", &payload).await?;
        Ok(())
    }
}
