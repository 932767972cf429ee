//! Application state containing repositories and shared resources

use axum::extract::FromRef;
use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::domain::{AssetCatalog, LendingStore, StaffDirectory};
use crate::infrastructure::auth::TokenKeys;
use crate::infrastructure::config::Config;
use crate::infrastructure::locks::AssetLocks;
use crate::infrastructure::otp::OtpStore;
use crate::infrastructure::{SeaOrmAssetCatalog, SeaOrmLendingStore, SeaOrmStaffDirectory};
use crate::services::LendingService;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    db: DatabaseConnection,
    pub lending: Arc<LendingService>,
    /// Pending one-time login codes
    pub otp_store: Arc<OtpStore>,
    pub tokens: Arc<TokenKeys>,
}

impl AppState {
    /// Wire the SeaORM repositories into the lending service. Fails only when
    /// no token secret can be chosen.
    pub fn new(db: DatabaseConnection, config: &Config) -> Result<Self, String> {
        let tokens = TokenKeys::from_config(config)?;

        let catalog: Arc<dyn AssetCatalog> = Arc::new(SeaOrmAssetCatalog::new(db.clone()));
        let staff: Arc<dyn StaffDirectory> = Arc::new(SeaOrmStaffDirectory::new(db.clone()));
        let store: Arc<dyn LendingStore> = Arc::new(SeaOrmLendingStore::new(db.clone()));

        let lending = LendingService::new(
            catalog,
            staff,
            store,
            AssetLocks::new(config.lock_timeout),
        );

        Ok(Self {
            db,
            lending: Arc::new(lending),
            otp_store: Arc::new(OtpStore::new(config.otp_ttl)),
            tokens: Arc::new(tokens),
        })
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}


impl FromRef<AppState> for Arc<TokenKeys> {
    fn from_ref(state: &AppState) -> Self {
        Arc::clone(&state.tokens)
    }
}
