//! SeaORM implementation of StaffDirectory

use async_trait::async_trait;
use sea_orm::{DatabaseConnection, EntityTrait};

use crate::domain::{DomainError, Staff, StaffDirectory};
use crate::models::staff::Entity as StaffEntity;

/// SeaORM-based implementation of StaffDirectory
pub struct SeaOrmStaffDirectory {
    db: DatabaseConnection,
}

impl SeaOrmStaffDirectory {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl StaffDirectory for SeaOrmStaffDirectory {
    async fn find_by_id(&self, nik: &str) -> Result<Option<Staff>, DomainError> {
        let staff = StaffEntity::find_by_id(nik.to_owned()).one(&self.db).await?;

        Ok(staff.map(|s| Staff {
            nik: s.nik_staff,
            name: s.name,
        }))
    }
}
