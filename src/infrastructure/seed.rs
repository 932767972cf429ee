use crate::infrastructure::auth::hash_password;
use crate::models::{asset, staff, user};
use sea_orm::sea_query::OnConflict;
use sea_orm::*;

pub const DEMO_USER_EMAIL: &str = "demo@example.com";
pub const DEMO_USER_PASSWORD: &str = "demo1234";

/// Demo borrower, staff and assets. Safe to run on every start.
pub async fn seed_demo_data(db: &DatabaseConnection) -> Result<(), DbErr> {
    // 1. Borrower
    let password = hash_password(DEMO_USER_PASSWORD).map_err(|e| DbErr::Custom(e.to_string()))?;

    let demo_user = user::ActiveModel {
        id: Set("demo-user".to_owned()),
        email: Set(DEMO_USER_EMAIL.to_owned()),
        password: Set(password),
        name: Set("Demo Borrower".to_owned()),
        is_active: Set(true),
    };

    user::Entity::insert(demo_user)
        .on_conflict(OnConflict::column(user::Column::Email).do_nothing().to_owned())
        .exec_without_returning(db)
        .await?;

    // 2. Staff
    for (nik, name) in [("1001", "Budi Santoso"), ("1002", "Siti Rahma")] {
        let member = staff::ActiveModel {
            nik_staff: Set(nik.to_owned()),
            name: Set(name.to_owned()),
            phone_number: Set(None),
            address: Set(None),
            birth_date: Set(None),
            img_url: Set(None),
        };

        staff::Entity::insert(member)
            .on_conflict(
                OnConflict::column(staff::Column::NikStaff)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(db)
            .await?;
    }

    // 3. Assets
    let assets = [
        ("AST-001", "Projector", "electronics", 5),
        ("AST-002", "Laptop", "electronics", 10),
        ("AST-003", "Folding Table", "furniture", 20),
    ];

    let entry_date = chrono::Utc::now().to_rfc3339();
    for (id, name, category, total) in assets {
        let item = asset::ActiveModel {
            id: Set(id.to_owned()),
            category_id: Set(category.to_owned()),
            asset_type_id: Set("general".to_owned()),
            name: Set(name.to_owned()),
            total: Set(total),
            available: Set(total),
            status: Set("good".to_owned()),
            entry_date: Set(entry_date.clone()),
            img_url: Set(None),
        };

        asset::Entity::insert(item)
            .on_conflict(OnConflict::column(asset::Column::Id).do_nothing().to_owned())
            .exec_without_returning(db)
            .await?;
    }

    tracing::info!("Demo data ready: 1 borrower, 2 staff, {} assets", assets.len());
    Ok(())
}
