//! Builder for an `AppState` backed by in-memory doubles.

use std::sync::Arc;

use crate::{
    adapters::http::app_state::AppState,
    domain::entities::{
        customer::Customer, payment_mode::PaymentMode, subscription::Subscription,
    },
    test_utils::{InMemoryCustomerRepo, InMemorySubscriptionRepo},
    use_cases::webhook::WebhookUseCases,
};

pub struct TestAppStateBuilder {
    pub customers: Arc<InMemoryCustomerRepo>,
    pub subscriptions: Arc<InMemorySubscriptionRepo>,
}

impl TestAppStateBuilder {
    pub fn new() -> Self {
        Self {
            customers: Arc::new(InMemoryCustomerRepo::new()),
            subscriptions: Arc::new(InMemorySubscriptionRepo::new()),
        }
    }

    pub fn with_customer(self, customer: Customer) -> Self {
        self.customers
            .customers
            .lock()
            .unwrap()
            .insert(customer.id, customer);
        self
    }

    pub fn with_subscription(self, subscription: Subscription) -> Self {
        self.subscriptions
            .subscriptions
            .lock()
            .unwrap()
            .insert(subscription.id, subscription);
        self
    }

    pub fn build(&self) -> AppState {
        AppState {
            paddle_mode: PaymentMode::Sandbox,
            webhook_use_cases: Arc::new(WebhookUseCases::new(
                self.subscriptions.clone(),
                self.customers.clone(),
            )),
        }
    }
}

impl Default for TestAppStateBuilder {
    fn default() -> Self {
        Self::new()
    }
}
