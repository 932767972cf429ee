//! Services Layer
//!
//! Business logic behind the HTTP handlers. Services only see the domain
//! traits, never SeaORM.

pub mod lending_export;
pub mod lending_service;
pub mod lending_validator;

pub use lending_service::{recombine, CheckoutOutcome, CheckoutStage, LendingService};
