use async_trait::async_trait;

use crate::app_error::AppResult;

/// Key/value body of a pay-link request, form-encoded on the wire.
pub type Payload = serde_json::Map<String, serde_json::Value>;

/// An entity that can be charged through Paddle.
///
/// The subscription builder only needs an identifier for passthrough and a
/// way to turn a product id plus payload into a checkout URL.
#[async_trait]
pub trait Billable: Send + Sync {
    /// Identifier echoed back by Paddle webhooks.
    fn billable_key(&self) -> String;

    /// Generate a pay link for a product or subscription plan.
    async fn charge_product(&self, product_id: i64, options: Payload) -> AppResult<String>;
}
