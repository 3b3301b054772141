use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// Subscription status as reported by Paddle.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsRefStr, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum SubscriptionStatus {
    Active,
    Trialing,
    PastDue,
    Paused,
    /// Paddle's name for a cancelled subscription.
    Deleted,
}

impl SubscriptionStatus {
    /// Convert from a Paddle status string, falling back to `Active`.
    pub fn from_paddle(s: &str) -> Self {
        s.parse().unwrap_or_else(|_| {
            tracing::warn!(status = s, "Unknown Paddle subscription status");
            SubscriptionStatus::Active
        })
    }
}

/// Persisted subscription row. Never deleted; cancellation sets `ends_at`.
#[derive(Debug, Clone, Serialize)]
pub struct Subscription {
    pub id: i64,
    pub customer_id: i64,
    pub name: String,
    pub paddle_id: i64,
    pub paddle_status: SubscriptionStatus,
    pub paddle_plan: i64,
    pub quantity: i32,
    pub trial_ends_at: Option<NaiveDateTime>,
    pub paused_from: Option<NaiveDateTime>,
    pub ends_at: Option<NaiveDateTime>,
    pub created_at: Option<NaiveDateTime>,
    pub updated_at: Option<NaiveDateTime>,
}

impl Subscription {
    /// Usable right now: active, trialing, or inside a grace period.
    pub fn valid(&self, now: NaiveDateTime) -> bool {
        self.active(now)
            || self.on_trial(now)
            || self.on_paused_grace_period(now)
            || self.on_grace_period(now)
    }

    pub fn active(&self, now: NaiveDateTime) -> bool {
        (self.ends_at.is_none() || self.on_grace_period(now) || self.on_paused_grace_period(now))
            && self.paddle_status != SubscriptionStatus::Paused
    }

    pub fn on_trial(&self, now: NaiveDateTime) -> bool {
        self.trial_ends_at.is_some_and(|ends| now < ends)
    }

    pub fn paused(&self) -> bool {
        self.paddle_status == SubscriptionStatus::Paused
    }

    /// Pause requested but not yet in effect.
    pub fn on_paused_grace_period(&self, now: NaiveDateTime) -> bool {
        self.paused_from.is_some_and(|from| now < from)
    }

    pub fn cancelled(&self) -> bool {
        self.ends_at.is_some()
    }

    /// Cancelled but still inside the paid period.
    pub fn on_grace_period(&self, now: NaiveDateTime) -> bool {
        self.ends_at.is_some_and(|ends| now < ends)
    }

    pub fn ended(&self, now: NaiveDateTime) -> bool {
        self.cancelled() && !self.on_grace_period(now)
    }

    /// Billing normally: no trial, no pause, no cancellation.
    pub fn recurring(&self, now: NaiveDateTime) -> bool {
        !self.on_trial(now)
            && !self.paused()
            && !self.on_paused_grace_period(now)
            && !self.cancelled()
    }
}
