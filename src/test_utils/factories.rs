//! Test data factories.
//!
//! Each factory returns a complete object with sensible defaults. Use the
//! closure parameter to override specific fields.

use chrono::NaiveDateTime;
use std::sync::atomic::{AtomicI64, Ordering};

use crate::domain::entities::{
    customer::Customer,
    subscription::{Subscription, SubscriptionStatus},
};

static NEXT_ID: AtomicI64 = AtomicI64::new(1_000);

/// Unique id for fixtures that don't set one explicitly.
pub fn next_test_id() -> i64 {
    NEXT_ID.fetch_add(1, Ordering::Relaxed)
}

/// Create a test customer with sensible defaults.
pub fn create_test_customer(overrides: impl FnOnce(&mut Customer)) -> Customer {
    let id = next_test_id();
    let mut customer = Customer {
        id,
        paddle_email: format!("customer{}@paddle-test.com", id),
        paddle_id: None,
        created_at: Some(test_datetime()),
        updated_at: Some(test_datetime()),
    };
    overrides(&mut customer);
    customer
}

/// Create an active, non-trial subscription owned by `customer_id`.
pub fn create_test_subscription(
    customer_id: i64,
    overrides: impl FnOnce(&mut Subscription),
) -> Subscription {
    let id = next_test_id();
    let mut subscription = Subscription {
        id,
        customer_id,
        name: "default".to_string(),
        paddle_id: 500_000 + id,
        paddle_status: SubscriptionStatus::Active,
        paddle_plan: 12345,
        quantity: 1,
        trial_ends_at: None,
        paused_from: None,
        ends_at: None,
        created_at: Some(test_datetime()),
        updated_at: Some(test_datetime()),
    };
    overrides(&mut subscription);
    subscription
}

/// Fixed reference time for predicate tests.
pub fn test_datetime() -> NaiveDateTime {
    NaiveDateTime::parse_from_str("2024-01-15 12:00:00", "%Y-%m-%d %H:%M:%S").unwrap()
}

/// Returns a test datetime offset by the given number of days.
pub fn test_datetime_offset_days(days: i64) -> NaiveDateTime {
    test_datetime() + chrono::Duration::days(days)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_ids_are_unique() {
        let a = create_test_subscription(1, |_| {});
        let b = create_test_subscription(1, |_| {});
        assert_ne!(a.id, b.id);
        assert_ne!(a.paddle_id, b.paddle_id);
    }

    #[test]
    fn test_overrides_apply() {
        let customer = create_test_customer(|c| c.paddle_id = Some(9));
        assert_eq!(customer.paddle_id, Some(9));
    }
}
