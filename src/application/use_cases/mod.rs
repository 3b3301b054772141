pub mod customer;
pub mod subscription;
pub mod webhook;
