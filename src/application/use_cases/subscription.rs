use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use std::sync::Arc;
use tracing::instrument;

use crate::{
    app_error::{AppError, AppResult},
    application::{
        helpers::paddle_dates::{parse_paddle_date, parse_paddle_datetime},
        ports::paddle::{PaddleApi, SubscriptionUserUpdate, SubscriptionUserUpdated},
    },
    domain::entities::subscription::{Subscription, SubscriptionStatus},
};

#[derive(Debug, Clone)]
pub struct CreateSubscriptionInput {
    pub customer_id: i64,
    pub name: String,
    pub paddle_id: i64,
    pub paddle_status: SubscriptionStatus,
    pub paddle_plan: i64,
    pub quantity: i32,
    pub trial_ends_at: Option<NaiveDateTime>,
}

/// Mutable columns of a subscription row; written as a whole.
#[derive(Debug, Clone, PartialEq)]
pub struct SubscriptionUpdate {
    pub paddle_status: SubscriptionStatus,
    pub paddle_plan: i64,
    pub quantity: i32,
    pub trial_ends_at: Option<NaiveDateTime>,
    pub paused_from: Option<NaiveDateTime>,
    pub ends_at: Option<NaiveDateTime>,
}

impl From<&Subscription> for SubscriptionUpdate {
    fn from(s: &Subscription) -> Self {
        Self {
            paddle_status: s.paddle_status,
            paddle_plan: s.paddle_plan,
            quantity: s.quantity,
            trial_ends_at: s.trial_ends_at,
            paused_from: s.paused_from,
            ends_at: s.ends_at,
        }
    }
}

#[async_trait]
pub trait SubscriptionRepo: Send + Sync {
    async fn get_by_id(&self, id: i64) -> AppResult<Option<Subscription>>;
    async fn get_by_paddle_id(&self, paddle_id: i64) -> AppResult<Option<Subscription>>;
    /// Newest first.
    async fn list_by_customer(&self, customer_id: i64) -> AppResult<Vec<Subscription>>;
    /// Insert, or refresh the row already stored for `(customer_id, paddle_id)`.
    async fn upsert(&self, input: &CreateSubscriptionInput) -> AppResult<Subscription>;
    async fn update(&self, id: i64, update: &SubscriptionUpdate) -> AppResult<Subscription>;
}

pub struct SubscriptionUseCases {
    repo: Arc<dyn SubscriptionRepo>,
    paddle: Arc<dyn PaddleApi>,
}

impl SubscriptionUseCases {
    pub fn new(repo: Arc<dyn SubscriptionRepo>, paddle: Arc<dyn PaddleApi>) -> Self {
        Self { repo, paddle }
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: i64) -> AppResult<Subscription> {
        self.repo.get_by_id(id).await?.ok_or(AppError::NotFound)
    }

    #[instrument(skip(self))]
    pub async fn list_for_customer(&self, customer_id: i64) -> AppResult<Vec<Subscription>> {
        self.repo.list_by_customer(customer_id).await
    }

    /// Most recent subscription with the given name.
    #[instrument(skip(self))]
    pub async fn find_for_customer(
        &self,
        customer_id: i64,
        name: &str,
    ) -> AppResult<Option<Subscription>> {
        Ok(self
            .repo
            .list_by_customer(customer_id)
            .await?
            .into_iter()
            .find(|s| s.name == name))
    }

    /// Whether the customer holds a valid subscription with this name,
    /// optionally restricted to one plan.
    #[instrument(skip(self))]
    pub async fn is_subscribed(
        &self,
        customer_id: i64,
        name: &str,
        plan: Option<i64>,
    ) -> AppResult<bool> {
        let now = Utc::now().naive_utc();
        Ok(self
            .find_for_customer(customer_id, name)
            .await?
            .is_some_and(|s| s.valid(now) && plan.is_none_or(|p| s.paddle_plan == p)))
    }

    #[instrument(skip(self))]
    pub async fn update_quantity(&self, id: i64, quantity: i32) -> AppResult<Subscription> {
        let subscription = self.get(id).await?;
        guard_against_updates(&subscription, Utc::now().naive_utc())?;

        let request = SubscriptionUserUpdate {
            quantity: Some(quantity),
            prorate: Some(true),
            ..SubscriptionUserUpdate::new(subscription.paddle_id)
        };
        self.paddle.update_subscription_user(&request).await?;

        let mut update = SubscriptionUpdate::from(&subscription);
        update.quantity = quantity;
        self.repo.update(id, &update).await
    }

    pub async fn increment_quantity(&self, id: i64, count: i32) -> AppResult<Subscription> {
        let subscription = self.get(id).await?;
        let quantity = subscription
            .quantity
            .checked_add(count)
            .ok_or_else(quantity_out_of_range)?;
        self.update_quantity(id, quantity).await
    }

    /// Never drops below 1.
    pub async fn decrement_quantity(&self, id: i64, count: i32) -> AppResult<Subscription> {
        let subscription = self.get(id).await?;
        let quantity = subscription
            .quantity
            .checked_sub(count)
            .ok_or_else(quantity_out_of_range)?;
        self.update_quantity(id, quantity.max(1)).await
    }

    /// Move the subscription to another plan, prorating the change.
    #[instrument(skip(self))]
    pub async fn swap(&self, id: i64, plan: i64) -> AppResult<Subscription> {
        let subscription = self.get(id).await?;
        guard_against_updates(&subscription, Utc::now().naive_utc())?;

        let request = SubscriptionUserUpdate {
            plan_id: Some(plan),
            prorate: Some(true),
            ..SubscriptionUserUpdate::new(subscription.paddle_id)
        };
        let updated = self.paddle.update_subscription_user(&request).await?;

        let mut update = SubscriptionUpdate::from(&subscription);
        update.paddle_plan = updated.plan_id;
        self.repo.update(id, &update).await
    }

    /// Pause at the end of the current billing period.
    #[instrument(skip(self))]
    pub async fn pause(&self, id: i64) -> AppResult<Subscription> {
        let subscription = self.get(id).await?;

        let request = SubscriptionUserUpdate {
            pause: Some(true),
            ..SubscriptionUserUpdate::new(subscription.paddle_id)
        };
        let updated = self.paddle.update_subscription_user(&request).await?;

        let mut update = SubscriptionUpdate::from(&subscription);
        update.paddle_status = SubscriptionStatus::Paused;
        update.paused_from = Some(paused_from(&updated)?);
        self.repo.update(id, &update).await
    }

    #[instrument(skip(self))]
    pub async fn resume(&self, id: i64) -> AppResult<Subscription> {
        let subscription = self.get(id).await?;

        let request = SubscriptionUserUpdate {
            pause: Some(false),
            ..SubscriptionUserUpdate::new(subscription.paddle_id)
        };
        self.paddle.update_subscription_user(&request).await?;

        let mut update = SubscriptionUpdate::from(&subscription);
        update.paddle_status = SubscriptionStatus::Active;
        update.paused_from = None;
        self.repo.update(id, &update).await
    }

    /// Cancel with Paddle. `ends_at` is provisional: the trial end when on
    /// trial, otherwise now. The `subscription_cancelled` webhook overwrites
    /// it with Paddle's effective date.
    #[instrument(skip(self))]
    pub async fn cancel(&self, id: i64) -> AppResult<Subscription> {
        let subscription = self.get(id).await?;
        let now = Utc::now().naive_utc();
        if subscription.ended(now) {
            return Err(AppError::InvalidInput(
                "Subscription has already ended".into(),
            ));
        }

        self.paddle
            .cancel_subscription_user(subscription.paddle_id)
            .await?;

        let mut update = SubscriptionUpdate::from(&subscription);
        update.paddle_status = SubscriptionStatus::Deleted;
        update.paused_from = None;
        update.ends_at = Some(if subscription.on_trial(now) {
            subscription.trial_ends_at.unwrap_or(now)
        } else {
            now
        });
        self.repo.update(id, &update).await
    }
}

fn quantity_out_of_range() -> AppError {
    AppError::InvalidInput("Quantity out of range".into())
}

/// Paddle rejects plan and quantity changes during trials and pauses.
fn guard_against_updates(subscription: &Subscription, now: NaiveDateTime) -> AppResult<()> {
    if subscription.on_trial(now) {
        return Err(AppError::InvalidInput(
            "Cannot update a subscription while on trial".into(),
        ));
    }
    if subscription.paused() || subscription.on_paused_grace_period(now) {
        return Err(AppError::InvalidInput(
            "Cannot update a paused subscription".into(),
        ));
    }
    if subscription.ended(now) {
        return Err(AppError::InvalidInput(
            "Cannot update an ended subscription".into(),
        ));
    }
    Ok(())
}

fn paused_from(updated: &SubscriptionUserUpdated) -> AppResult<NaiveDateTime> {
    if let Some(paused_from) = &updated.paused_from {
        return parse_paddle_datetime(paused_from);
    }
    if let Some(next_payment) = &updated.next_payment {
        return parse_paddle_date(&next_payment.date);
    }
    Ok(Utc::now().naive_utc())
}
