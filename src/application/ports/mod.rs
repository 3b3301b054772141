pub mod billable;
pub mod paddle;
