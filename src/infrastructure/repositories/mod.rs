//! Repository implementations using SeaORM

pub mod asset_repository;
pub mod lending_repository;
pub mod staff_repository;

pub use asset_repository::SeaOrmAssetCatalog;
pub use lending_repository::SeaOrmLendingStore;
pub use staff_repository::SeaOrmStaffDirectory;

use chrono::{DateTime, Utc};

use crate::domain::DomainError;

/// Timestamps are stored as RFC 3339 text
pub(crate) fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, DomainError> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| DomainError::StoreFailure(format!("invalid timestamp '{}': {}", value, e)))
}
