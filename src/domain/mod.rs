//! Domain layer - Pure business abstractions
//!
//! Domain types, collaborator traits and domain error types. No Axum and no
//! SeaORM entities; `DbErr` only appears as a conversion source.

pub mod errors;
pub mod repositories;

pub use errors::{DomainError, Missing, Rejection};
pub use repositories::*;
