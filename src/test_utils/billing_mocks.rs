//! In-memory doubles for the billing ports and repositories.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::{
    app_error::{AppError, AppResult},
    application::{
        ports::{
            billable::{Billable, Payload},
            paddle::{NextPayment, PaddleApi, SubscriptionUserUpdate, SubscriptionUserUpdated},
        },
        use_cases::{
            customer::CustomerRepo,
            subscription::{CreateSubscriptionInput, SubscriptionRepo, SubscriptionUpdate},
        },
    },
    domain::entities::{customer::Customer, subscription::Subscription},
    test_utils::next_test_id,
};

fn provider_error(failure: &(i64, String)) -> AppError {
    AppError::Provider {
        code: Some(failure.0),
        message: failure.1.clone(),
    }
}

// ============================================================================
// RecordingBillable
// ============================================================================

/// Billable that records every `charge_product` call.
pub struct RecordingBillable {
    key: String,
    pub checkout_url: String,
    failure: Option<(i64, String)>,
    recorded: Mutex<Vec<(i64, Payload)>>,
}

impl RecordingBillable {
    pub fn new(key: &str) -> Self {
        Self {
            key: key.to_string(),
            checkout_url: format!("https://sandbox-checkout.paddle.com/checkout/custom/{}", key),
            failure: None,
            recorded: Mutex::new(Vec::new()),
        }
    }

    /// Records the call, then fails with a provider error.
    pub fn failing(key: &str, code: i64, message: &str) -> Self {
        Self {
            failure: Some((code, message.to_string())),
            ..Self::new(key)
        }
    }

    pub fn calls(&self) -> Vec<(i64, Payload)> {
        self.recorded.lock().unwrap().clone()
    }
}

#[async_trait]
impl Billable for RecordingBillable {
    fn billable_key(&self) -> String {
        self.key.clone()
    }

    async fn charge_product(&self, product_id: i64, options: Payload) -> AppResult<String> {
        self.recorded.lock().unwrap().push((product_id, options));
        match &self.failure {
            Some(failure) => Err(provider_error(failure)),
            None => Ok(self.checkout_url.clone()),
        }
    }
}

// ============================================================================
// RecordingPaddleApi
// ============================================================================

#[derive(Default)]
struct PaddleCalls {
    pay_links: Vec<Payload>,
    updates: Vec<SubscriptionUserUpdate>,
    cancellations: Vec<i64>,
}

/// Paddle API double. Every request is recorded, successful or not.
pub struct RecordingPaddleApi {
    pub checkout_url: String,
    failure: Option<(i64, String)>,
    next_payment_date: Option<String>,
    calls: Mutex<PaddleCalls>,
}

impl RecordingPaddleApi {
    pub fn new() -> Self {
        Self {
            checkout_url: "https://sandbox-checkout.paddle.com/checkout/custom/abc123".to_string(),
            failure: None,
            next_payment_date: None,
            calls: Mutex::new(PaddleCalls::default()),
        }
    }

    pub fn failing(code: i64, message: &str) -> Self {
        Self {
            failure: Some((code, message.to_string())),
            ..Self::new()
        }
    }

    /// `next_payment.date` returned from subscription updates.
    pub fn with_next_payment_date(mut self, date: &str) -> Self {
        self.next_payment_date = Some(date.to_string());
        self
    }

    pub fn pay_links(&self) -> Vec<Payload> {
        self.calls.lock().unwrap().pay_links.clone()
    }

    pub fn updates(&self) -> Vec<SubscriptionUserUpdate> {
        self.calls.lock().unwrap().updates.clone()
    }

    pub fn cancellations(&self) -> Vec<i64> {
        self.calls.lock().unwrap().cancellations.clone()
    }

    fn check(&self) -> AppResult<()> {
        match &self.failure {
            Some(failure) => Err(provider_error(failure)),
            None => Ok(()),
        }
    }
}

impl Default for RecordingPaddleApi {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PaddleApi for RecordingPaddleApi {
    async fn generate_pay_link(&self, payload: &Payload) -> AppResult<String> {
        self.calls.lock().unwrap().pay_links.push(payload.clone());
        self.check()?;
        Ok(self.checkout_url.clone())
    }

    async fn update_subscription_user(
        &self,
        update: &SubscriptionUserUpdate,
    ) -> AppResult<SubscriptionUserUpdated> {
        self.calls.lock().unwrap().updates.push(update.clone());
        self.check()?;
        Ok(SubscriptionUserUpdated {
            subscription_id: update.subscription_id,
            user_id: 1,
            plan_id: update.plan_id.unwrap_or(12345),
            next_payment: self.next_payment_date.as_ref().map(|date| NextPayment {
                amount: 10.0,
                currency: "USD".to_string(),
                date: date.clone(),
            }),
            paused_from: None,
        })
    }

    async fn cancel_subscription_user(&self, subscription_id: i64) -> AppResult<()> {
        self.calls.lock().unwrap().cancellations.push(subscription_id);
        self.check()
    }
}

// ============================================================================
// InMemoryCustomerRepo
// ============================================================================

#[derive(Default)]
pub struct InMemoryCustomerRepo {
    pub customers: Mutex<HashMap<i64, Customer>>,
}

impl InMemoryCustomerRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_customers(customers: Vec<Customer>) -> Self {
        Self {
            customers: Mutex::new(customers.into_iter().map(|c| (c.id, c)).collect()),
        }
    }
}

#[async_trait]
impl CustomerRepo for InMemoryCustomerRepo {
    async fn get_by_id(&self, id: i64) -> AppResult<Option<Customer>> {
        Ok(self.customers.lock().unwrap().get(&id).cloned())
    }

    async fn get_by_email(&self, paddle_email: &str) -> AppResult<Option<Customer>> {
        Ok(self
            .customers
            .lock()
            .unwrap()
            .values()
            .find(|c| c.paddle_email == paddle_email)
            .cloned())
    }

    async fn create(&self, paddle_email: &str) -> AppResult<Customer> {
        let mut customers = self.customers.lock().unwrap();
        if customers.values().any(|c| c.paddle_email == paddle_email) {
            return Err(AppError::InvalidInput("Customer already exists".into()));
        }
        let now = chrono::Utc::now().naive_utc();
        let customer = Customer {
            id: next_test_id(),
            paddle_email: paddle_email.to_string(),
            paddle_id: None,
            created_at: Some(now),
            updated_at: Some(now),
        };
        customers.insert(customer.id, customer.clone());
        Ok(customer)
    }

    async fn set_paddle_id(&self, id: i64, paddle_id: i64) -> AppResult<()> {
        let mut customers = self.customers.lock().unwrap();
        let customer = customers.get_mut(&id).ok_or(AppError::NotFound)?;
        customer.paddle_id = Some(paddle_id);
        customer.updated_at = Some(chrono::Utc::now().naive_utc());
        Ok(())
    }
}

// ============================================================================
// InMemorySubscriptionRepo
// ============================================================================

#[derive(Default)]
pub struct InMemorySubscriptionRepo {
    pub subscriptions: Mutex<HashMap<i64, Subscription>>,
}

impl InMemorySubscriptionRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_subscriptions(subscriptions: Vec<Subscription>) -> Self {
        Self {
            subscriptions: Mutex::new(subscriptions.into_iter().map(|s| (s.id, s)).collect()),
        }
    }
}

#[async_trait]
impl SubscriptionRepo for InMemorySubscriptionRepo {
    async fn get_by_id(&self, id: i64) -> AppResult<Option<Subscription>> {
        Ok(self.subscriptions.lock().unwrap().get(&id).cloned())
    }

    async fn get_by_paddle_id(&self, paddle_id: i64) -> AppResult<Option<Subscription>> {
        Ok(self
            .subscriptions
            .lock()
            .unwrap()
            .values()
            .find(|s| s.paddle_id == paddle_id)
            .cloned())
    }

    async fn list_by_customer(&self, customer_id: i64) -> AppResult<Vec<Subscription>> {
        let mut list: Vec<Subscription> = self
            .subscriptions
            .lock()
            .unwrap()
            .values()
            .filter(|s| s.customer_id == customer_id)
            .cloned()
            .collect();
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(list)
    }

    async fn upsert(&self, input: &CreateSubscriptionInput) -> AppResult<Subscription> {
        let mut subscriptions = self.subscriptions.lock().unwrap();
        let now = chrono::Utc::now().naive_utc();
        let existing = subscriptions
            .values()
            .find(|s| s.customer_id == input.customer_id && s.paddle_id == input.paddle_id)
            .cloned();

        let subscription = Subscription {
            id: existing.as_ref().map(|s| s.id).unwrap_or_else(next_test_id),
            customer_id: input.customer_id,
            name: input.name.clone(),
            paddle_id: input.paddle_id,
            paddle_status: input.paddle_status,
            paddle_plan: input.paddle_plan,
            quantity: input.quantity,
            trial_ends_at: input.trial_ends_at,
            paused_from: existing.as_ref().and_then(|s| s.paused_from),
            ends_at: existing.as_ref().and_then(|s| s.ends_at),
            created_at: existing.as_ref().and_then(|s| s.created_at).or(Some(now)),
            updated_at: Some(now),
        };
        subscriptions.insert(subscription.id, subscription.clone());
        Ok(subscription)
    }

    async fn update(&self, id: i64, update: &SubscriptionUpdate) -> AppResult<Subscription> {
        let mut subscriptions = self.subscriptions.lock().unwrap();
        let subscription = subscriptions.get_mut(&id).ok_or(AppError::NotFound)?;
        subscription.paddle_status = update.paddle_status;
        subscription.paddle_plan = update.paddle_plan;
        subscription.quantity = update.quantity;
        subscription.trial_ends_at = update.trial_ends_at;
        subscription.paused_from = update.paused_from;
        subscription.ends_at = update.ends_at;
        subscription.updated_at = Some(chrono::Utc::now().naive_utc());
        Ok(subscription.clone())
    }
}
