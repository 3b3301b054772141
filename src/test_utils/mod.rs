//! Test utilities shared by the unit tests.
//!
//! - Factories returning valid fixtures, overridable through a closure
//! - In-memory repositories and recording Paddle doubles
//! - An `AppState` builder wired to those doubles

mod app_state_builder;
mod billing_mocks;
mod factories;

pub use app_state_builder::*;
pub use billing_mocks::*;
pub use factories::*;
