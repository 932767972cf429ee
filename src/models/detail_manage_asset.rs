use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Lending transaction line
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "detail_manage_asset")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub id_asset: String,
    pub id_manage_asset: String,
    pub total_item: i32,
    pub status: String,
    /// Position of the line in the original request, display order only
    pub line_no: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::manage_asset::Entity",
        from = "Column::IdManageAsset",
        to = "super::manage_asset::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    ManageAsset,
    #[sea_orm(
        belongs_to = "super::asset::Entity",
        from = "Column::IdAsset",
        to = "super::asset::Column::Id"
    )]
    Asset,
}

impl Related<super::manage_asset::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ManageAsset.def()
    }
}

impl Related<super::asset::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Asset.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
