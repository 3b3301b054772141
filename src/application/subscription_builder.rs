//! Fluent builder for new Paddle subscriptions.
//!
//! Collects plan, quantity, trial and coupon settings, then turns them into
//! the pay-link payload Paddle expects and hands it to the owning
//! [`Billable`]. The builder never talks to the network itself; whatever the
//! billable returns, checkout URL or error, is returned unchanged.

use chrono::{DateTime, Utc};
use serde_json::{Value, json};

use crate::{
    app_error::AppResult,
    application::ports::billable::{Billable, Payload},
    domain::entities::passthrough::Passthrough,
};

pub struct SubscriptionBuilder<'a, B: Billable + ?Sized> {
    billable: &'a B,
    name: String,
    plan: i64,
    quantity: i32,
    trial_days: Option<i64>,
    skip_trial: bool,
    coupon: Option<String>,
}

impl<'a, B: Billable + ?Sized> SubscriptionBuilder<'a, B> {
    pub fn new(billable: &'a B, name: impl Into<String>, plan: i64) -> Self {
        Self {
            billable,
            name: name.into(),
            plan,
            quantity: 1,
            trial_days: None,
            skip_trial: false,
            coupon: None,
        }
    }

    /// Paddle decides whether the quantity is acceptable.
    pub fn quantity(mut self, quantity: i32) -> Self {
        self.quantity = quantity;
        self
    }

    pub fn trial_days(mut self, trial_days: i64) -> Self {
        self.trial_days = Some(trial_days);
        self
    }

    /// Trial lasting until `until`, counted in whole days from now.
    pub fn trial_until(self, until: DateTime<Utc>) -> Self {
        self.trial_until_from(Utc::now(), until)
    }

    /// Same as [`trial_until`](Self::trial_until) with an explicit clock
    /// reading. Partial days are truncated toward zero; a date in the past
    /// yields a negative count, which is sent as-is.
    pub fn trial_until_from(self, now: DateTime<Utc>, until: DateTime<Utc>) -> Self {
        let days = (until - now).num_days();
        self.trial_days(days)
    }

    /// End the trial immediately, whatever `trial_days` was set to.
    pub fn skip_trial(mut self) -> Self {
        self.skip_trial = true;
        self
    }

    pub fn with_coupon(mut self, coupon: impl Into<String>) -> Self {
        self.coupon = Some(coupon.into());
        self
    }

    /// Generate the checkout URL for this subscription.
    pub async fn create(self) -> AppResult<String> {
        self.create_with_options(Payload::new()).await
    }

    /// Like [`create`](Self::create), with extra pay-link fields merged over
    /// the builder's own `coupon_code` and `quantity`.
    pub async fn create_with_options(self, options: Payload) -> AppResult<String> {
        let payload = self.payload_with_options(options);

        tracing::debug!(
            plan = self.plan,
            subscription = %self.name,
            quantity = self.quantity,
            "Requesting subscription pay link"
        );

        self.billable.charge_product(self.plan, payload).await
    }

    /// The exact payload `create_with_options` sends for `options`.
    pub fn payload_with_options(&self, options: Payload) -> Payload {
        let mut payload = self.base_payload();
        payload.extend(options);

        if let Some(trial_days) = self.trial_days_for_payload() {
            payload.insert("trial_days".into(), json!(trial_days));
        }

        let passthrough = Passthrough::new(self.billable.billable_key(), self.name.as_str());
        payload.insert("passthrough".into(), Value::String(passthrough.to_string()));

        payload
    }

    fn base_payload(&self) -> Payload {
        let mut payload = Payload::new();
        payload.insert(
            "coupon_code".into(),
            Value::String(self.coupon.clone().unwrap_or_default()),
        );
        payload.insert("quantity".into(), json!(self.quantity));
        payload
    }

    fn trial_days_for_payload(&self) -> Option<i64> {
        if self.skip_trial {
            return Some(0);
        }
        self.trial_days
    }
}
