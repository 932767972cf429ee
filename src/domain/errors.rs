//! Domain error types
//!
//! These errors are framework-agnostic and represent business-level failures.
//! Messages are produced by `Display`; call sites only pick a kind and fill in
//! its parameters.

use std::fmt;

/// Reason a request was refused before (or instead of) touching persistent state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    EmptyStaffNik,
    EmptyUserId,
    NegativeDuration { days: i64 },
    DurationOutOfRange { days: i64 },
    EmptyLines,
    /// `line` is the zero-based position of the offending line in the request.
    EmptyAssetId { line: usize },
    EmptyStatus { line: usize },
    NegativeQuantity { line: usize, quantity: i32 },
    InsufficientStock {
        asset_id: String,
        requested: i32,
        available: i32,
    },
    EmptyTransactionId,
    EmptyBorrowerName,
    EmptyEmail,
    EmptyPassword,
    AlreadyReturned { transaction_id: String },
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::EmptyStaffNik => write!(f, "nik staff cannot empty"),
            Rejection::EmptyUserId => write!(f, "id user cannot empty"),
            Rejection::NegativeDuration { .. } => write!(f, "duration cannot negative"),
            Rejection::DurationOutOfRange { days } => {
                write!(f, "duration of {} days is out of range", days)
            }
            Rejection::EmptyLines => write!(f, "lines cannot empty"),
            Rejection::EmptyAssetId { .. } => write!(f, "id asset cannot empty"),
            Rejection::EmptyStatus { .. } => write!(f, "status cannot empty"),
            Rejection::NegativeQuantity { .. } => write!(f, "total item cannot negative"),
            Rejection::InsufficientStock { .. } => write!(f, "insufficient stock"),
            Rejection::EmptyTransactionId => write!(f, "id transaction cannot empty"),
            Rejection::EmptyBorrowerName => write!(f, "name cannot empty"),
            Rejection::EmptyEmail => write!(f, "email cannot empty"),
            Rejection::EmptyPassword => write!(f, "password cannot empty"),
            Rejection::AlreadyReturned { transaction_id } => {
                write!(f, "transaction {} already returned", transaction_id)
            }
        }
    }
}

/// Entity a lookup failed to find.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Missing {
    Asset(String),
    Staff(String),
    Transaction(String),
    User(String),
}

impl fmt::Display for Missing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Missing::Asset(id) => write!(f, "asset {} not found", id),
            Missing::Staff(nik) => write!(f, "staff {} not found", nik),
            Missing::Transaction(id) => write!(f, "transaction {} not found", id),
            Missing::User(id) => write!(f, "user {} not found", id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Caller input failed structural or business validation
    BadRequest(Rejection),
    /// Referenced entity does not exist
    NotFound(Missing),
    /// Persistence call failed
    StoreFailure(String),
    /// An availability update would break `0 <= available <= total`.
    /// Only reachable through a concurrency-control bug.
    InvariantViolation { asset_id: String, requested: i32 },
    /// Per-asset lock not acquired before the deadline
    Timeout { asset_id: String },
    /// Generic internal error
    Internal(String),
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomainError::BadRequest(rejection) => write!(f, "{}", rejection),
            DomainError::NotFound(missing) => write!(f, "{}", missing),
            DomainError::StoreFailure(msg) => write!(f, "Database error: {}", msg),
            DomainError::InvariantViolation {
                asset_id,
                requested,
            } => write!(
                f,
                "availability invariant violated for asset {} (quantity {})",
                asset_id, requested
            ),
            DomainError::Timeout { asset_id } => {
                write!(f, "timed out waiting for asset {}", asset_id)
            }
            DomainError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for DomainError {}

// Conversion from SeaORM errors (used in infrastructure layer)
impl From<sea_orm::DbErr> for DomainError {
    fn from(e: sea_orm::DbErr) -> Self {
        DomainError::StoreFailure(e.to_string())
    }
}

impl From<Rejection> for DomainError {
    fn from(rejection: Rejection) -> Self {
        DomainError::BadRequest(rejection)
    }
}
