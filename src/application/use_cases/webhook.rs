//! Paddle webhook alerts applied to local subscription records.
//!
//! Paddle posts alerts as `application/x-www-form-urlencoded` bodies. Only the
//! subscription lifecycle alerts change local state; everything else is
//! acknowledged so Paddle stops retrying.

use chrono::NaiveDateTime;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::{
    app_error::{AppError, AppResult},
    application::{
        helpers::paddle_dates::{parse_paddle_date, parse_paddle_datetime},
        use_cases::{
            customer::CustomerRepo,
            subscription::{CreateSubscriptionInput, SubscriptionRepo, SubscriptionUpdate},
        },
    },
    domain::entities::{
        passthrough::Passthrough,
        subscription::{Subscription, SubscriptionStatus},
    },
};

#[derive(Debug, Clone, PartialEq)]
pub struct SubscriptionCreated {
    pub subscription_id: i64,
    pub plan_id: i64,
    pub status: SubscriptionStatus,
    pub quantity: i32,
    pub passthrough: Passthrough,
    pub user_id: Option<i64>,
    pub next_bill_date: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubscriptionUpdated {
    pub subscription_id: i64,
    pub plan_id: Option<i64>,
    pub status: Option<SubscriptionStatus>,
    pub quantity: Option<i32>,
    pub paused_from: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubscriptionCancelled {
    pub subscription_id: i64,
    pub status: SubscriptionStatus,
    pub cancellation_effective_date: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PaddleWebhook {
    SubscriptionCreated(SubscriptionCreated),
    SubscriptionUpdated(SubscriptionUpdated),
    SubscriptionCancelled(SubscriptionCancelled),
    Other { alert_name: String },
}

impl PaddleWebhook {
    /// Parse decoded form fields of a Paddle alert.
    pub fn from_fields(fields: &HashMap<String, String>) -> AppResult<Self> {
        let alert_name = required(fields, "alert_name")?;

        let webhook = match alert_name {
            "subscription_created" => PaddleWebhook::SubscriptionCreated(SubscriptionCreated {
                subscription_id: required_int(fields, "subscription_id")?,
                plan_id: required_int(fields, "subscription_plan_id")?,
                status: SubscriptionStatus::from_paddle(required(fields, "status")?),
                quantity: required_int(fields, "quantity")?,
                passthrough: parse_passthrough(required(fields, "passthrough")?)?,
                user_id: optional_int(fields, "user_id")?,
                next_bill_date: optional(fields, "next_bill_date")
                    .map(parse_paddle_date)
                    .transpose()?,
            }),
            "subscription_updated" => PaddleWebhook::SubscriptionUpdated(SubscriptionUpdated {
                subscription_id: required_int(fields, "subscription_id")?,
                plan_id: optional_int(fields, "subscription_plan_id")?,
                status: optional(fields, "status").map(SubscriptionStatus::from_paddle),
                quantity: optional_int(fields, "new_quantity")?,
                paused_from: optional(fields, "paused_from")
                    .map(parse_paddle_datetime)
                    .transpose()?,
            }),
            "subscription_cancelled" => {
                PaddleWebhook::SubscriptionCancelled(SubscriptionCancelled {
                    subscription_id: required_int(fields, "subscription_id")?,
                    status: optional(fields, "status")
                        .map(SubscriptionStatus::from_paddle)
                        .unwrap_or(SubscriptionStatus::Deleted),
                    cancellation_effective_date: optional(fields, "cancellation_effective_date")
                        .map(parse_paddle_date)
                        .transpose()?,
                })
            }
            other => PaddleWebhook::Other {
                alert_name: other.to_string(),
            },
        };

        Ok(webhook)
    }

    pub fn alert_name(&self) -> &str {
        match self {
            PaddleWebhook::SubscriptionCreated(_) => "subscription_created",
            PaddleWebhook::SubscriptionUpdated(_) => "subscription_updated",
            PaddleWebhook::SubscriptionCancelled(_) => "subscription_cancelled",
            PaddleWebhook::Other { alert_name } => alert_name,
        }
    }
}

fn optional<'a>(fields: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    fields
        .get(key)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
}

fn required<'a>(fields: &'a HashMap<String, String>, key: &str) -> AppResult<&'a str> {
    optional(fields, key)
        .ok_or_else(|| AppError::InvalidInput(format!("Missing webhook field '{}'", key)))
}

fn parse_int<T: std::str::FromStr>(key: &str, value: &str) -> AppResult<T> {
    value
        .parse()
        .map_err(|_| AppError::InvalidInput(format!("Webhook field '{}' is not an integer", key)))
}

fn required_int<T: std::str::FromStr>(fields: &HashMap<String, String>, key: &str) -> AppResult<T> {
    parse_int(key, required(fields, key)?)
}

fn optional_int<T: std::str::FromStr>(
    fields: &HashMap<String, String>,
    key: &str,
) -> AppResult<Option<T>> {
    optional(fields, key).map(|v| parse_int(key, v)).transpose()
}

fn parse_passthrough(raw: &str) -> AppResult<Passthrough> {
    Passthrough::parse(raw)
        .ok_or_else(|| AppError::InvalidInput(format!("Malformed passthrough '{}'", raw)))
}

#[derive(Debug)]
pub enum WebhookOutcome {
    Created(Subscription),
    Updated(Subscription),
    /// Acknowledged without touching any record.
    Ignored,
}

pub struct WebhookUseCases {
    subscriptions: Arc<dyn SubscriptionRepo>,
    customers: Arc<dyn CustomerRepo>,
}

impl WebhookUseCases {
    pub fn new(subscriptions: Arc<dyn SubscriptionRepo>, customers: Arc<dyn CustomerRepo>) -> Self {
        Self {
            subscriptions,
            customers,
        }
    }

    #[instrument(skip(self, webhook), fields(alert = webhook.alert_name()))]
    pub async fn handle(&self, webhook: PaddleWebhook) -> AppResult<WebhookOutcome> {
        match webhook {
            PaddleWebhook::SubscriptionCreated(event) => self.subscription_created(event).await,
            PaddleWebhook::SubscriptionUpdated(event) => self.subscription_updated(event).await,
            PaddleWebhook::SubscriptionCancelled(event) => {
                self.subscription_cancelled(event).await
            }
            PaddleWebhook::Other { alert_name } => {
                info!(alert_name = %alert_name, "Ignoring Paddle alert");
                Ok(WebhookOutcome::Ignored)
            }
        }
    }

    async fn subscription_created(&self, event: SubscriptionCreated) -> AppResult<WebhookOutcome> {
        let Some(customer_id) = event.passthrough.owner_id() else {
            warn!(passthrough = %event.passthrough, "Passthrough owner is not a customer id");
            return Ok(WebhookOutcome::Ignored);
        };

        let Some(customer) = self.customers.get_by_id(customer_id).await? else {
            warn!(customer_id, "subscription_created for unknown customer");
            return Ok(WebhookOutcome::Ignored);
        };

        if let Some(user_id) = event.user_id {
            if customer.paddle_id != Some(user_id) {
                self.customers.set_paddle_id(customer.id, user_id).await?;
            }
        }

        let trial_ends_at = if event.status == SubscriptionStatus::Trialing {
            event.next_bill_date
        } else {
            None
        };

        let subscription = self
            .subscriptions
            .upsert(&CreateSubscriptionInput {
                customer_id: customer.id,
                name: event.passthrough.name.clone(),
                paddle_id: event.subscription_id,
                paddle_status: event.status,
                paddle_plan: event.plan_id,
                quantity: event.quantity,
                trial_ends_at,
            })
            .await?;

        info!(
            subscription_id = subscription.id,
            paddle_id = subscription.paddle_id,
            "Subscription created from webhook"
        );
        Ok(WebhookOutcome::Created(subscription))
    }

    async fn subscription_updated(&self, event: SubscriptionUpdated) -> AppResult<WebhookOutcome> {
        let Some(subscription) = self
            .subscriptions
            .get_by_paddle_id(event.subscription_id)
            .await?
        else {
            warn!(
                paddle_id = event.subscription_id,
                "subscription_updated for unknown subscription"
            );
            return Ok(WebhookOutcome::Ignored);
        };

        let mut update = SubscriptionUpdate::from(&subscription);
        if let Some(plan_id) = event.plan_id {
            update.paddle_plan = plan_id;
        }
        if let Some(status) = event.status {
            update.paddle_status = status;
        }
        if let Some(quantity) = event.quantity {
            update.quantity = quantity;
        }
        update.paused_from = event.paused_from;

        let updated = self.subscriptions.update(subscription.id, &update).await?;
        Ok(WebhookOutcome::Updated(updated))
    }

    async fn subscription_cancelled(
        &self,
        event: SubscriptionCancelled,
    ) -> AppResult<WebhookOutcome> {
        let Some(subscription) = self
            .subscriptions
            .get_by_paddle_id(event.subscription_id)
            .await?
        else {
            warn!(
                paddle_id = event.subscription_id,
                "subscription_cancelled for unknown subscription"
            );
            return Ok(WebhookOutcome::Ignored);
        };

        // Paddle's effective date replaces any provisional end set by a local cancel
        let now = chrono::Utc::now().naive_utc();
        let mut update = SubscriptionUpdate::from(&subscription);
        update.ends_at = match event.cancellation_effective_date {
            Some(effective) => Some(effective),
            None if update.ends_at.is_some() => update.ends_at,
            None if subscription.on_trial(now) => subscription.trial_ends_at,
            None => Some(now),
        };
        update.paddle_status = event.status;
        update.paused_from = None;

        let updated = self.subscriptions.update(subscription.id, &update).await?;
        Ok(WebhookOutcome::Updated(updated))
    }
}
