//! SeaORM implementation of LendingStore

use async_trait::async_trait;
use sea_orm::sea_query::{Expr, LikeExpr};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set, TransactionTrait,
};
use std::collections::HashMap;

use super::parse_timestamp;
use crate::domain::{
    DomainError, HeadersAndLines, LendingHeader, LendingLine, LendingStore, NewLendingHeader,
    NewLendingLine,
};
use crate::models::asset::Entity as AssetEntity;
use crate::models::detail_manage_asset::{self as detail, Entity as DetailEntity};
use crate::models::manage_asset::{self as header, Entity as HeaderEntity};
use crate::models::staff::{self, Entity as StaffEntity};
use crate::models::user::{self, Entity as UserEntity};

/// `%text%` with LIKE wildcards in `text` matched literally
fn like_pattern(text: &str) -> String {
    let mut pattern = String::with_capacity(text.len() + 2);
    pattern.push('%');
    for c in text.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// SeaORM-based implementation of LendingStore
pub struct SeaOrmLendingStore {
    db: DatabaseConnection,
}

impl SeaOrmLendingStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Attach borrower and staff names to header rows
    async fn to_headers(
        &self,
        rows: Vec<(header::Model, Option<user::Model>)>,
    ) -> Result<Vec<LendingHeader>, DomainError> {
        let niks: Vec<String> = rows.iter().map(|(h, _)| h.nik_staff.clone()).collect();

        let mut staff_names: HashMap<String, String> = HashMap::new();
        if !niks.is_empty() {
            let staff = StaffEntity::find()
                .filter(staff::Column::NikStaff.is_in(niks))
                .all(&self.db)
                .await?;
            for s in staff {
                staff_names.insert(s.nik_staff, s.name);
            }
        }

        rows.into_iter()
            .map(|(h, borrower)| {
                let user_name = borrower
                    .map(|u| u.name)
                    .unwrap_or_else(|| "Unknown".to_string());
                let staff_name = staff_names
                    .get(&h.nik_staff)
                    .cloned()
                    .unwrap_or_else(|| "Unknown".to_string());

                Ok(LendingHeader {
                    submission_date: parse_timestamp(&h.submission_date)?,
                    return_date: parse_timestamp(&h.return_date)?,
                    id: h.id,
                    user_id: h.id_user,
                    user_name,
                    staff_nik: h.nik_staff,
                    staff_name,
                })
            })
            .collect()
    }

    /// Lines of the given headers, in request order within each header
    async fn lines_of(&self, header_ids: Vec<String>) -> Result<Vec<LendingLine>, DomainError> {
        if header_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = DetailEntity::find()
            .filter(detail::Column::IdManageAsset.is_in(header_ids))
            .find_also_related(AssetEntity)
            .order_by_asc(detail::Column::LineNo)
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(line, asset)| LendingLine {
                id: line.id,
                transaction_id: line.id_manage_asset,
                asset_id: line.id_asset,
                asset_name: asset
                    .map(|a| a.name)
                    .unwrap_or_else(|| "Unknown".to_string()),
                quantity: line.total_item,
                status: line.status,
            })
            .collect())
    }

    async fn with_lines(
        &self,
        rows: Vec<(header::Model, Option<user::Model>)>,
    ) -> Result<HeadersAndLines, DomainError> {
        let headers = self.to_headers(rows).await?;
        let lines = self
            .lines_of(headers.iter().map(|h| h.id.clone()).collect())
            .await?;
        Ok((headers, lines))
    }
}

async fn insert_rows<C: ConnectionTrait>(
    conn: &C,
    new_header: NewLendingHeader,
    new_lines: Vec<NewLendingLine>,
) -> Result<(), DbErr> {
    let row = header::ActiveModel {
        id: Set(new_header.id),
        id_user: Set(new_header.user_id),
        nik_staff: Set(new_header.staff_nik),
        submission_date: Set(new_header.submission_date.to_rfc3339()),
        return_date: Set(new_header.return_date.to_rfc3339()),
    };
    HeaderEntity::insert(row).exec_without_returning(conn).await?;

    for (line_no, line) in new_lines.into_iter().enumerate() {
        let row = detail::ActiveModel {
            id: Set(line.id),
            id_asset: Set(line.asset_id),
            id_manage_asset: Set(line.transaction_id),
            total_item: Set(line.quantity),
            status: Set(line.status),
            line_no: Set(line_no as i32),
        };
        DetailEntity::insert(row).exec_without_returning(conn).await?;
    }

    Ok(())
}

#[async_trait]
impl LendingStore for SeaOrmLendingStore {
    async fn create_transaction(
        &self,
        new_header: NewLendingHeader,
        new_lines: Vec<NewLendingLine>,
    ) -> Result<(), DomainError> {
        let transaction_id = new_header.id.clone();
        let txn = self.db.begin().await?;

        match insert_rows(&txn, new_header, new_lines).await {
            Ok(()) => {
                txn.commit().await?;
                Ok(())
            }
            Err(e) => {
                tracing::warn!(%transaction_id, error = %e, "rolling back lending transaction");
                txn.rollback().await?;
                Err(e.into())
            }
        }
    }

    async fn find_all_transactions(&self) -> Result<Vec<LendingHeader>, DomainError> {
        let rows = HeaderEntity::find()
            .find_also_related(UserEntity)
            .order_by_asc(header::Column::SubmissionDate)
            .order_by_asc(header::Column::Id)
            .all(&self.db)
            .await?;

        self.to_headers(rows).await
    }

    async fn find_all_by_transaction_id(&self, id: &str) -> Result<HeadersAndLines, DomainError> {
        let rows = HeaderEntity::find_by_id(id.to_owned())
            .find_also_related(UserEntity)
            .all(&self.db)
            .await?;

        self.with_lines(rows).await
    }

    async fn find_by_borrower_name(&self, name: &str) -> Result<HeadersAndLines, DomainError> {
        // SQLite LIKE is case-insensitive for ASCII letters
        let rows = HeaderEntity::find()
            .find_also_related(UserEntity)
            .filter(Expr::col((UserEntity, user::Column::Name)).like(LikeExpr::new(like_pattern(name)).escape('\\')))
            .order_by_asc(header::Column::SubmissionDate)
            .order_by_asc(header::Column::Id)
            .all(&self.db)
            .await?;

        self.with_lines(rows).await
    }

    async fn delete_transaction(&self, id: &str) -> Result<(), DomainError> {
        let txn = self.db.begin().await?;

        DetailEntity::delete_many()
            .filter(detail::Column::IdManageAsset.eq(id))
            .exec(&txn)
            .await?;
        HeaderEntity::delete_by_id(id.to_owned()).exec(&txn).await?;

        txn.commit().await?;
        Ok(())
    }

    async fn mark_lines(&self, id: &str, status: &str) -> Result<u64, DomainError> {
        let result = DetailEntity::update_many()
            .col_expr(detail::Column::Status, Expr::value(status))
            .filter(detail::Column::IdManageAsset.eq(id))
            .filter(detail::Column::Status.ne(status))
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected)
    }
}
