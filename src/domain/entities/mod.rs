pub mod customer;
pub mod passthrough;
pub mod payment_mode;
pub mod subscription;
