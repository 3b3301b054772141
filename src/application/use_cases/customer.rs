use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::instrument;

use crate::{
    app_error::{AppError, AppResult},
    application::{
        ports::{
            billable::{Billable, Payload},
            paddle::PaddleApi,
        },
        subscription_builder::SubscriptionBuilder,
    },
    domain::entities::customer::Customer,
};

#[async_trait]
pub trait CustomerRepo: Send + Sync {
    async fn get_by_id(&self, id: i64) -> AppResult<Option<Customer>>;
    async fn get_by_email(&self, paddle_email: &str) -> AppResult<Option<Customer>>;
    async fn create(&self, paddle_email: &str) -> AppResult<Customer>;
    async fn set_paddle_id(&self, id: i64, paddle_id: i64) -> AppResult<()>;
}

/// One price of a custom one-off charge, sent as `"<CUR>:<amount>"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChargePrice {
    pub currency: String,
    pub amount_cents: i64,
}

impl ChargePrice {
    pub fn new(currency: impl Into<String>, amount_cents: i64) -> Self {
        Self {
            currency: currency.into(),
            amount_cents,
        }
    }

    pub fn to_paddle(&self) -> String {
        let sign = if self.amount_cents < 0 { "-" } else { "" };
        let cents = self.amount_cents.unsigned_abs();
        format!(
            "{}:{}{}.{:02}",
            self.currency.to_uppercase(),
            sign,
            cents / 100,
            cents % 100
        )
    }
}

/// A customer bound to the Paddle API: the concrete [`Billable`].
pub struct CustomerBilling {
    customer: Customer,
    paddle: Arc<dyn PaddleApi>,
    webhook_url: Option<String>,
}

impl CustomerBilling {
    pub fn new(
        customer: Customer,
        paddle: Arc<dyn PaddleApi>,
        webhook_url: Option<String>,
    ) -> Self {
        Self {
            customer,
            paddle,
            webhook_url,
        }
    }

    /// Start configuring a new subscription to `plan` for this customer.
    pub fn new_subscription(
        &self,
        name: impl Into<String>,
        plan: i64,
    ) -> SubscriptionBuilder<'_, Self> {
        SubscriptionBuilder::new(self, name, plan)
    }

    /// Pay link for a one-off custom product.
    ///
    /// `options` override `title` and `webhook_url`; `prices` are only used
    /// when `options` carries no `prices` of its own.
    pub async fn charge(
        &self,
        prices: &[ChargePrice],
        title: &str,
        options: Payload,
    ) -> AppResult<String> {
        let mut payload = Payload::new();
        payload.insert("title".into(), Value::String(title.to_string()));
        if let Some(webhook_url) = &self.webhook_url {
            payload.insert("webhook_url".into(), Value::String(webhook_url.clone()));
        }
        payload.extend(options);

        if !payload.contains_key("prices") {
            let prices: Vec<Value> = prices
                .iter()
                .map(|p| Value::String(p.to_paddle()))
                .collect();
            payload.insert("prices".into(), Value::Array(prices));
        }

        self.generate_pay_link(payload).await
    }

    async fn generate_pay_link(&self, mut payload: Payload) -> AppResult<String> {
        // Webhooks are matched back to the customer through passthrough
        if !payload.contains_key("passthrough") {
            payload.insert("passthrough".into(), Value::String(self.billable_key()));
        }
        payload.insert(
            "customer_email".into(),
            Value::String(self.customer.paddle_email.clone()),
        );

        for value in payload.values_mut() {
            if let Value::String(s) = value {
                let trimmed = s.trim();
                if trimmed.len() != s.len() {
                    *s = trimmed.to_string();
                }
            }
        }

        self.paddle.generate_pay_link(&payload).await
    }
}

#[async_trait]
impl Billable for CustomerBilling {
    fn billable_key(&self) -> String {
        self.customer.id.to_string()
    }

    async fn charge_product(&self, product_id: i64, options: Payload) -> AppResult<String> {
        let mut payload = Payload::new();
        payload.insert("product_id".into(), json!(product_id));
        payload.extend(options);
        self.generate_pay_link(payload).await
    }
}

pub struct CustomerUseCases {
    repo: Arc<dyn CustomerRepo>,
    paddle: Arc<dyn PaddleApi>,
    webhook_url: Option<String>,
}

impl CustomerUseCases {
    pub fn new(
        repo: Arc<dyn CustomerRepo>,
        paddle: Arc<dyn PaddleApi>,
        webhook_url: Option<String>,
    ) -> Self {
        Self {
            repo,
            paddle,
            webhook_url,
        }
    }

    /// Return the customer with this Paddle email, creating it if needed.
    #[instrument(skip(self))]
    pub async fn register(&self, paddle_email: &str) -> AppResult<Customer> {
        let email = paddle_email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err(AppError::InvalidInput(
                "A valid Paddle email is required".into(),
            ));
        }

        if let Some(existing) = self.repo.get_by_email(email).await? {
            return Ok(existing);
        }
        self.repo.create(email).await
    }

    #[instrument(skip(self))]
    pub async fn billing_for(&self, customer_id: i64) -> AppResult<CustomerBilling> {
        let customer = self
            .repo
            .get_by_id(customer_id)
            .await?
            .ok_or(AppError::NotFound)?;

        Ok(CustomerBilling::new(
            customer,
            self.paddle.clone(),
            self.webhook_url.clone(),
        ))
    }
}
