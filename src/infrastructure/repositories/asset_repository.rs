//! SeaORM implementation of AssetCatalog

use async_trait::async_trait;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

use super::parse_timestamp;
use crate::domain::{Asset, AssetCatalog, DomainError, Missing};
use crate::models::asset::{Column, Entity as AssetEntity, Model};

/// SeaORM-based implementation of AssetCatalog.
///
/// Both availability updates are single conditional `UPDATE` statements, so
/// the guard and the write cannot be separated by a concurrent writer.
pub struct SeaOrmAssetCatalog {
    db: DatabaseConnection,
}

impl SeaOrmAssetCatalog {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Turn a zero-row conditional update into the right error kind
    async fn explain_rejected_update(&self, id: &str, quantity: i32) -> DomainError {
        match AssetEntity::find_by_id(id.to_owned()).one(&self.db).await {
            Ok(None) => DomainError::NotFound(Missing::Asset(id.to_owned())),
            Ok(Some(asset)) => {
                tracing::error!(
                    asset_id = %id,
                    quantity,
                    available = asset.available,
                    total = asset.total,
                    "availability update rejected by invariant guard"
                );
                DomainError::InvariantViolation {
                    asset_id: id.to_owned(),
                    requested: quantity,
                }
            }
            Err(e) => e.into(),
        }
    }
}

fn to_domain(model: Model) -> Result<Asset, DomainError> {
    Ok(Asset {
        entry_date: parse_timestamp(&model.entry_date)?,
        id: model.id,
        name: model.name,
        category_id: model.category_id,
        asset_type_id: model.asset_type_id,
        total: model.total,
        available: model.available,
        status: model.status,
        img_url: model.img_url,
    })
}

#[async_trait]
impl AssetCatalog for SeaOrmAssetCatalog {
    async fn find_by_id(&self, id: &str) -> Result<Option<Asset>, DomainError> {
        let asset = AssetEntity::find_by_id(id.to_owned()).one(&self.db).await?;
        asset.map(to_domain).transpose()
    }

    async fn decrement_available(&self, id: &str, quantity: i32) -> Result<(), DomainError> {
        if quantity < 0 {
            return Err(DomainError::InvariantViolation {
                asset_id: id.to_owned(),
                requested: quantity,
            });
        }

        let result = AssetEntity::update_many()
            .col_expr(Column::Available, Expr::col(Column::Available).sub(quantity))
            .filter(Column::Id.eq(id))
            .filter(Column::Available.gte(quantity))
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(self.explain_rejected_update(id, quantity).await);
        }

        Ok(())
    }

    async fn restore_available(&self, id: &str, quantity: i32) -> Result<(), DomainError> {
        if quantity < 0 {
            return Err(DomainError::InvariantViolation {
                asset_id: id.to_owned(),
                requested: quantity,
            });
        }

        let result = AssetEntity::update_many()
            .col_expr(Column::Available, Expr::col(Column::Available).add(quantity))
            .filter(Column::Id.eq(id))
            .filter(Expr::cust_with_values("available + ? <= total", [quantity]))
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(self.explain_rejected_update(id, quantity).await);
        }

        Ok(())
    }
}
