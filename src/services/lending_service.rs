//! Lending Service - checkout orchestration and transaction views
//!
//! Checkout runs a structural pass (pure validator), then a business pass
//! against the catalog and staff directory, then persists the transaction and
//! takes the stock out of the catalog. Per-asset locks are held from the
//! business pass until every decrement is done.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use super::lending_export::headers_to_csv;
use super::lending_validator::{validate_checkout, validate_lookup_key};
use crate::domain::{
    AssetCatalog, CheckoutReceipt, CheckoutRequest, DomainError, LendingHeader, LendingLine,
    LendingStore, LendingTransaction, Missing, NewLendingHeader, NewLendingLine, Rejection,
    StaffDirectory, STATUS_RETURNED,
};
use crate::infrastructure::locks::AssetLocks;

/// Last checkout step reached. A progress marker for logs; how the checkout
/// ended is a `CheckoutOutcome`, read off the returned `Result`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutStage {
    Received,
    Validated,
    AssetsChecked,
    StaffChecked,
    Persisted,
    AvailabilityUpdated,
}

/// Terminal state of a checkout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutOutcome {
    Complete,
    /// Refused by validation or a lookup, nothing was written
    Rejected,
    /// Persistence, locking or compensation went wrong
    Failed,
}

impl CheckoutOutcome {
    pub fn of<T>(result: &Result<T, DomainError>) -> Self {
        match result {
            Ok(_) => Self::Complete,
            Err(DomainError::BadRequest(_) | DomainError::NotFound(_)) => Self::Rejected,
            Err(_) => Self::Failed,
        }
    }
}

pub struct LendingService {
    catalog: Arc<dyn AssetCatalog>,
    staff: Arc<dyn StaffDirectory>,
    store: Arc<dyn LendingStore>,
    locks: AssetLocks,
}

impl LendingService {
    pub fn new(
        catalog: Arc<dyn AssetCatalog>,
        staff: Arc<dyn StaffDirectory>,
        store: Arc<dyn LendingStore>,
        locks: AssetLocks,
    ) -> Self {
        Self {
            catalog,
            staff,
            store,
            locks,
        }
    }

    /// Lend the requested assets to `user_id` under the responsibility of a staff member
    pub async fn checkout(
        &self,
        user_id: &str,
        request: CheckoutRequest,
    ) -> Result<CheckoutReceipt, DomainError> {
        let mut stage = CheckoutStage::Received;
        let result = self.run_checkout(user_id, request, &mut stage).await;

        match (&result, CheckoutOutcome::of(&result)) {
            (Ok(receipt), _) => tracing::info!(
                transaction_id = %receipt.transaction_id,
                user_id,
                "checkout complete"
            ),
            (Err(e), CheckoutOutcome::Rejected) => {
                tracing::warn!(user_id, ?stage, error = %e, "checkout rejected")
            }
            (Err(e), _) => tracing::error!(user_id, ?stage, error = %e, "checkout failed"),
        }

        result
    }

    async fn run_checkout(
        &self,
        user_id: &str,
        request: CheckoutRequest,
        stage: &mut CheckoutStage,
    ) -> Result<CheckoutReceipt, DomainError> {
        validate_checkout(user_id, &request)?;
        *stage = CheckoutStage::Validated;

        let transaction_id = Uuid::new_v4().to_string();

        let _guard = self
            .locks
            .acquire(request.lines.iter().map(|l| l.asset_id.as_str()))
            .await?;

        let lines = self.check_stock(&transaction_id, &request).await?;
        *stage = CheckoutStage::AssetsChecked;

        if self.staff.find_by_id(&request.staff_nik).await?.is_none() {
            return Err(DomainError::NotFound(Missing::Staff(request.staff_nik)));
        }
        *stage = CheckoutStage::StaffChecked;

        let submission_date = Utc::now();
        let return_date = due_date(submission_date, request.duration_days)?;

        let header = NewLendingHeader {
            id: transaction_id.clone(),
            user_id: user_id.to_owned(),
            staff_nik: request.staff_nik,
            submission_date,
            return_date,
        };
        self.store.create_transaction(header, lines.clone()).await?;
        *stage = CheckoutStage::Persisted;

        self.take_stock(&transaction_id, &lines).await?;
        *stage = CheckoutStage::AvailabilityUpdated;

        Ok(CheckoutReceipt {
            transaction_id,
            submission_date,
            return_date,
        })
    }

    /// Business pass: every line must fit in the asset's current availability.
    /// Lines naming the same asset draw from the same pool.
    async fn check_stock(
        &self,
        transaction_id: &str,
        request: &CheckoutRequest,
    ) -> Result<Vec<NewLendingLine>, DomainError> {
        let mut available: HashMap<&str, i32> = HashMap::new();
        let mut lines = Vec::with_capacity(request.lines.len());

        for item in &request.lines {
            let asset_id = item.asset_id.as_str();
            let remaining = match available.get(asset_id) {
                Some(remaining) => *remaining,
                None => {
                    let asset = self
                        .catalog
                        .find_by_id(asset_id)
                        .await?
                        .ok_or_else(|| DomainError::NotFound(Missing::Asset(item.asset_id.clone())))?;
                    asset.available
                }
            };

            if remaining < item.quantity {
                return Err(Rejection::InsufficientStock {
                    asset_id: item.asset_id.clone(),
                    requested: item.quantity,
                    available: remaining,
                }
                .into());
            }
            available.insert(asset_id, remaining - item.quantity);

            lines.push(NewLendingLine {
                id: Uuid::new_v4().to_string(),
                transaction_id: transaction_id.to_owned(),
                asset_id: item.asset_id.clone(),
                quantity: item.quantity,
                status: item.status.clone(),
            });
        }

        Ok(lines)
    }

    /// Decrement every line; on failure undo what was applied and drop the transaction
    async fn take_stock(
        &self,
        transaction_id: &str,
        lines: &[NewLendingLine],
    ) -> Result<(), DomainError> {
        for (applied, line) in lines.iter().enumerate() {
            if let Err(e) = self
                .catalog
                .decrement_available(&line.asset_id, line.quantity)
                .await
            {
                self.compensate(transaction_id, &lines[..applied]).await;
                return Err(e);
            }
        }
        Ok(())
    }

    async fn compensate(&self, transaction_id: &str, applied: &[NewLendingLine]) {
        let mut clean = true;

        for line in applied {
            if let Err(e) = self
                .catalog
                .restore_available(&line.asset_id, line.quantity)
                .await
            {
                clean = false;
                tracing::error!(
                    %transaction_id,
                    asset_id = %line.asset_id,
                    quantity = line.quantity,
                    error = %e,
                    "failed to restore availability during checkout rollback"
                );
            }
        }

        if let Err(e) = self.store.delete_transaction(transaction_id).await {
            clean = false;
            tracing::error!(%transaction_id, error = %e, "failed to delete transaction during checkout rollback");
        }

        if clean {
            tracing::warn!(%transaction_id, "checkout rolled back");
        }
    }

    /// Return every line of a transaction and put its stock back
    pub async fn return_transaction(&self, id: &str) -> Result<LendingTransaction, DomainError> {
        validate_lookup_key(id, Rejection::EmptyTransactionId)?;

        // Lines never change asset, so the first read is enough to pick the locks
        let (_, lines) = self.store.find_all_by_transaction_id(id).await?;
        let asset_ids: Vec<String> = lines.iter().map(|l| l.asset_id.clone()).collect();
        let _guard = self
            .locks
            .acquire(asset_ids.iter().map(String::as_str))
            .await?;

        // Statuses are only trusted once the locks are held
        let (headers, lines) = self.store.find_all_by_transaction_id(id).await?;
        let transaction = recombine(headers, lines)
            .into_iter()
            .next()
            .ok_or_else(|| DomainError::NotFound(Missing::Transaction(id.to_owned())))?;

        let already_returned = || -> DomainError {
            Rejection::AlreadyReturned {
                transaction_id: id.to_owned(),
            }
            .into()
        };

        if transaction
            .lines
            .iter()
            .any(|line| line.status == STATUS_RETURNED)
        {
            return Err(already_returned());
        }

        self.put_back_stock(id, &transaction.lines).await?;

        // Conditional on the current status, a concurrent return from another process marks nothing
        let marked = match self.store.mark_lines(id, STATUS_RETURNED).await {
            Ok(marked) => marked,
            Err(e) => {
                self.take_back_stock(id, &transaction.lines).await;
                return Err(e);
            }
        };
        if marked == 0 {
            self.take_back_stock(id, &transaction.lines).await;
            return Err(already_returned());
        }

        tracing::info!(transaction_id = %id, lines = transaction.lines.len(), "transaction returned");

        let mut returned = transaction;
        for line in &mut returned.lines {
            line.status = STATUS_RETURNED.to_string();
        }
        Ok(returned)
    }

    /// Restore every line; on failure take back what was already restored
    async fn put_back_stock(
        &self,
        transaction_id: &str,
        lines: &[LendingLine],
    ) -> Result<(), DomainError> {
        for (applied, line) in lines.iter().enumerate() {
            if let Err(e) = self
                .catalog
                .restore_available(&line.asset_id, line.quantity)
                .await
            {
                self.take_back_stock(transaction_id, &lines[..applied]).await;
                return Err(e);
            }
        }
        Ok(())
    }

    async fn take_back_stock(&self, transaction_id: &str, restored: &[LendingLine]) {
        for line in restored {
            if let Err(e) = self
                .catalog
                .decrement_available(&line.asset_id, line.quantity)
                .await
            {
                tracing::error!(
                    %transaction_id,
                    asset_id = %line.asset_id,
                    quantity = line.quantity,
                    error = %e,
                    "failed to undo restored availability during return rollback"
                );
            }
        }
        if !restored.is_empty() {
            tracing::warn!(%transaction_id, "return rolled back");
        }
    }

    /// Every transaction header, without lines
    pub async fn show_all_asset(&self) -> Result<Vec<LendingHeader>, DomainError> {
        self.store.find_all_transactions().await
    }

    pub async fn find_by_transaction_id(
        &self,
        id: &str,
    ) -> Result<Vec<LendingTransaction>, DomainError> {
        validate_lookup_key(id, Rejection::EmptyTransactionId)?;

        let (headers, lines) = self.store.find_all_by_transaction_id(id).await?;
        Ok(recombine(headers, lines))
    }

    pub async fn find_transaction_by_name(
        &self,
        name: &str,
    ) -> Result<Vec<LendingTransaction>, DomainError> {
        validate_lookup_key(name, Rejection::EmptyBorrowerName)?;

        let (headers, lines) = self.store.find_by_borrower_name(name).await?;
        Ok(recombine(headers, lines))
    }

    /// All transaction headers as CSV
    pub async fn download_assets(&self) -> Result<Vec<u8>, DomainError> {
        let headers = self.store.find_all_transactions().await?;
        headers_to_csv(&headers).map_err(DomainError::Internal)
    }
}

fn due_date(submission: DateTime<Utc>, days: i64) -> Result<DateTime<Utc>, DomainError> {
    Duration::try_days(days)
        .and_then(|duration| submission.checked_add_signed(duration))
        .ok_or_else(|| Rejection::DurationOutOfRange { days }.into())
}

/// Attach lines to their headers.
///
/// Lines keep their input order within a header; headers keep input order and
/// are dropped when no line belongs to them.
pub fn recombine(headers: Vec<LendingHeader>, lines: Vec<LendingLine>) -> Vec<LendingTransaction> {
    let mut grouped: HashMap<String, Vec<LendingLine>> = HashMap::new();
    for line in lines {
        grouped
            .entry(line.transaction_id.clone())
            .or_default()
            .push(line);
    }

    headers
        .into_iter()
        .filter_map(|header| {
            grouped
                .remove(&header.id)
                .map(|lines| LendingTransaction { header, lines })
        })
        .collect()
}
