pub mod asset;
pub mod detail_manage_asset;
pub mod manage_asset;
pub mod staff;
pub mod user;
