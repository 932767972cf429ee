//! Repository trait definitions
//!
//! These traits define the contract for data access.
//! Implementations live in the infrastructure layer.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::DomainError;

/// Line status written by the return operation.
pub const STATUS_RETURNED: &str = "returned";

/// Current snapshot of an asset
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Asset {
    pub id: String,
    pub name: String,
    pub category_id: String,
    pub asset_type_id: String,
    pub total: i32,
    pub available: i32,
    pub status: String,
    pub entry_date: DateTime<Utc>,
    pub img_url: Option<String>,
}

/// Staff member acting as responsible party for a loan
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Staff {
    pub nik: String,
    pub name: String,
}

/// Asset catalog: sole owner and sole mutator of `available`
#[async_trait]
pub trait AssetCatalog: Send + Sync {
    /// Find an asset by ID
    async fn find_by_id(&self, id: &str) -> Result<Option<Asset>, DomainError>;

    /// Atomically take `quantity` units out of `available`.
    ///
    /// Fails with `InvariantViolation` instead of letting `available` go negative.
    async fn decrement_available(&self, id: &str, quantity: i32) -> Result<(), DomainError>;

    /// Atomically put `quantity` units back into `available`.
    ///
    /// Fails with `InvariantViolation` instead of letting `available` exceed `total`.
    async fn restore_available(&self, id: &str, quantity: i32) -> Result<(), DomainError>;
}

/// Staff directory, lookup only
#[async_trait]
pub trait StaffDirectory: Send + Sync {
    async fn find_by_id(&self, nik: &str) -> Result<Option<Staff>, DomainError>;
}

/// One requested line of a checkout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutLine {
    pub asset_id: String,
    pub status: String,
    pub quantity: i32,
}

/// Inbound checkout request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub staff_nik: String,
    pub duration_days: i64,
    #[serde(default)]
    pub lines: Vec<CheckoutLine>,
}

/// Outbound checkout success
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutReceipt {
    pub transaction_id: String,
    pub submission_date: DateTime<Utc>,
    pub return_date: DateTime<Utc>,
}

/// Header row to persist, ids assigned by the caller
#[derive(Debug, Clone, PartialEq)]
pub struct NewLendingHeader {
    pub id: String,
    pub user_id: String,
    pub staff_nik: String,
    pub submission_date: DateTime<Utc>,
    pub return_date: DateTime<Utc>,
}

/// Line row to persist, ids assigned by the caller
#[derive(Debug, Clone, PartialEq)]
pub struct NewLendingLine {
    pub id: String,
    pub transaction_id: String,
    pub asset_id: String,
    pub quantity: i32,
    pub status: String,
}

/// Transaction header as read back, joined with borrower and staff names
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LendingHeader {
    pub id: String,
    pub user_id: String,
    pub user_name: String,
    pub staff_nik: String,
    pub staff_name: String,
    pub submission_date: DateTime<Utc>,
    pub return_date: DateTime<Utc>,
}

/// Line as read back, joined with the asset name
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LendingLine {
    pub id: String,
    pub transaction_id: String,
    pub asset_id: String,
    pub asset_name: String,
    pub quantity: i32,
    pub status: String,
}

/// Header with its lines attached
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LendingTransaction {
    #[serde(flatten)]
    pub header: LendingHeader,
    pub lines: Vec<LendingLine>,
}

/// Flat result of a transaction query; recombination is the caller's job
pub type HeadersAndLines = (Vec<LendingHeader>, Vec<LendingLine>);

/// Repository trait for lending transactions
#[async_trait]
pub trait LendingStore: Send + Sync {
    /// Persist the header and every line as one atomic unit
    async fn create_transaction(
        &self,
        header: NewLendingHeader,
        lines: Vec<NewLendingLine>,
    ) -> Result<(), DomainError>;

    /// All headers, without lines
    async fn find_all_transactions(&self) -> Result<Vec<LendingHeader>, DomainError>;

    /// The (at most one) matching header and all of its lines
    async fn find_all_by_transaction_id(&self, id: &str) -> Result<HeadersAndLines, DomainError>;

    /// Headers whose borrower name contains `name` (ASCII case-insensitive), with their lines
    async fn find_by_borrower_name(&self, name: &str) -> Result<HeadersAndLines, DomainError>;

    /// Remove a transaction and its lines as one atomic unit
    async fn delete_transaction(&self, id: &str) -> Result<(), DomainError>;

    /// Set the status of every line of a transaction not already in that status,
    /// returns the number of lines touched
    async fn mark_lines(&self, id: &str, status: &str) -> Result<u64, DomainError>;
}
