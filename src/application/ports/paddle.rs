use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::{app_error::AppResult, application::ports::billable::Payload};

/// Change request for `/subscription/users/update`. Unset fields are not sent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubscriptionUserUpdate {
    pub subscription_id: i64,
    pub quantity: Option<i32>,
    pub plan_id: Option<i64>,
    pub prorate: Option<bool>,
    pub bill_immediately: Option<bool>,
    pub pause: Option<bool>,
}

impl SubscriptionUserUpdate {
    pub fn new(subscription_id: i64) -> Self {
        Self {
            subscription_id,
            ..Default::default()
        }
    }

    pub fn to_payload(&self) -> Payload {
        let mut payload = Payload::new();
        payload.insert("subscription_id".into(), json!(self.subscription_id));
        if let Some(quantity) = self.quantity {
            payload.insert("quantity".into(), json!(quantity));
        }
        if let Some(plan_id) = self.plan_id {
            payload.insert("plan_id".into(), json!(plan_id));
        }
        if let Some(prorate) = self.prorate {
            payload.insert("prorate".into(), json!(prorate));
        }
        if let Some(bill_immediately) = self.bill_immediately {
            payload.insert("bill_immediately".into(), json!(bill_immediately));
        }
        if let Some(pause) = self.pause {
            payload.insert("pause".into(), json!(pause));
        }
        payload
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct NextPayment {
    pub amount: f64,
    pub currency: String,
    /// `YYYY-MM-DD`
    pub date: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SubscriptionUserUpdated {
    pub subscription_id: i64,
    pub user_id: i64,
    pub plan_id: i64,
    #[serde(default)]
    pub next_payment: Option<NextPayment>,
    /// Present when a pause was requested; `YYYY-MM-DD HH:MM:SS`.
    #[serde(default)]
    pub paused_from: Option<String>,
}

/// Paddle vendor API operations used by the billing layer.
#[async_trait]
pub trait PaddleApi: Send + Sync {
    /// POST `/product/generate_pay_link`, returning the checkout URL.
    async fn generate_pay_link(&self, payload: &Payload) -> AppResult<String>;

    async fn update_subscription_user(
        &self,
        update: &SubscriptionUserUpdate,
    ) -> AppResult<SubscriptionUserUpdated>;

    async fn cancel_subscription_user(&self, subscription_id: i64) -> AppResult<()>;
}
