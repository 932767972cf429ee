use asset_lending::db;
use asset_lending::domain::{
    Asset, AssetCatalog, CheckoutLine, CheckoutRequest, DomainError, Missing, Rejection,
    STATUS_RETURNED,
};
use asset_lending::infrastructure::locks::AssetLocks;
use asset_lending::infrastructure::{SeaOrmAssetCatalog, SeaOrmLendingStore, SeaOrmStaffDirectory};
use asset_lending::models::{asset, staff, user};
use asset_lending::services::LendingService;
use async_trait::async_trait;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use std::sync::Arc;
use std::time::Duration;

async fn setup_test_db() -> DatabaseConnection {
    db::init_db("sqlite::memory:")
        .await
        .expect("Failed to init DB")
}

fn service_with_catalog(db: &DatabaseConnection, catalog: Arc<dyn AssetCatalog>) -> LendingService {
    LendingService::new(
        catalog,
        Arc::new(SeaOrmStaffDirectory::new(db.clone())),
        Arc::new(SeaOrmLendingStore::new(db.clone())),
        AssetLocks::new(Duration::from_secs(5)),
    )
}

fn service(db: &DatabaseConnection) -> LendingService {
    service_with_catalog(db, Arc::new(SeaOrmAssetCatalog::new(db.clone())))
}

async fn create_asset(db: &DatabaseConnection, id: &str, total: i32) {
    asset::ActiveModel {
        id: Set(id.to_string()),
        category_id: Set("electronics".to_string()),
        asset_type_id: Set("general".to_string()),
        name: Set(format!("Asset {}", id)),
        total: Set(total),
        available: Set(total),
        status: Set("good".to_string()),
        entry_date: Set(chrono::Utc::now().to_rfc3339()),
        img_url: Set(None),
    }
    .insert(db)
    .await
    .expect("Failed to create asset");
}

async fn create_staff(db: &DatabaseConnection, nik: &str, name: &str) {
    staff::ActiveModel {
        nik_staff: Set(nik.to_string()),
        name: Set(name.to_string()),
        phone_number: Set(None),
        address: Set(None),
        birth_date: Set(None),
        img_url: Set(None),
    }
    .insert(db)
    .await
    .expect("Failed to create staff");
}

async fn create_user(db: &DatabaseConnection, id: &str, name: &str) {
    user::ActiveModel {
        id: Set(id.to_string()),
        email: Set(format!("{}@example.com", id)),
        password: Set("hash".to_string()),
        name: Set(name.to_string()),
        is_active: Set(true),
    }
    .insert(db)
    .await
    .expect("Failed to create user");
}

async fn available(db: &DatabaseConnection, id: &str) -> i32 {
    asset::Entity::find_by_id(id.to_string())
        .one(db)
        .await
        .expect("query")
        .expect("asset exists")
        .available
}

fn line(asset_id: &str, quantity: i32) -> CheckoutLine {
    CheckoutLine {
        asset_id: asset_id.to_string(),
        status: "borrowed".to_string(),
        quantity,
    }
}

fn request(staff_nik: &str, lines: Vec<CheckoutLine>) -> CheckoutRequest {
    CheckoutRequest {
        staff_nik: staff_nik.to_string(),
        duration_days: 5,
        lines,
    }
}

/// Seeds one borrower, one staff member and assets A (5 units) and B (3 units)
async fn seeded() -> DatabaseConnection {
    let db = setup_test_db().await;
    create_user(&db, "U1", "Jane Doe").await;
    create_staff(&db, "123", "Budi").await;
    create_asset(&db, "A", 5).await;
    create_asset(&db, "B", 3).await;
    db
}

#[tokio::test]
async fn test_checkout_persists_and_decrements() {
    let db = seeded().await;
    let lending = service(&db);

    let receipt = lending
        .checkout("U1", request("123", vec![line("A", 2), line("B", 1)]))
        .await
        .expect("checkout should succeed");

    assert_eq!(
        receipt.return_date - receipt.submission_date,
        chrono::Duration::days(5)
    );
    assert_eq!(available(&db, "A").await, 3);
    assert_eq!(available(&db, "B").await, 2);

    let found = lending
        .find_by_transaction_id(&receipt.transaction_id)
        .await
        .expect("lookup");
    assert_eq!(found.len(), 1);
    let transaction = &found[0];
    assert_eq!(transaction.header.user_name, "Jane Doe");
    assert_eq!(transaction.header.staff_name, "Budi");
    assert_eq!(transaction.header.return_date, receipt.return_date);

    let lines: Vec<(&str, i32)> = transaction
        .lines
        .iter()
        .map(|l| (l.asset_id.as_str(), l.quantity))
        .collect();
    assert_eq!(lines, vec![("A", 2), ("B", 1)]);
}

#[tokio::test]
async fn test_zero_duration_is_due_immediately() {
    let db = seeded().await;
    let lending = service(&db);

    let mut req = request("123", vec![line("A", 1)]);
    req.duration_days = 0;
    let receipt = lending.checkout("U1", req).await.expect("checkout");

    assert_eq!(receipt.return_date, receipt.submission_date);
}

#[tokio::test]
async fn test_insufficient_stock_leaves_no_trace() {
    let db = seeded().await;
    let lending = service(&db);

    let err = lending
        .checkout("U1", request("123", vec![line("A", 1), line("B", 4)]))
        .await
        .expect_err("B only has 3 units");

    assert_eq!(
        err,
        DomainError::BadRequest(Rejection::InsufficientStock {
            asset_id: "B".to_string(),
            requested: 4,
            available: 3,
        })
    );
    assert_eq!(err.to_string(), "insufficient stock");
    assert_eq!(available(&db, "A").await, 5);
    assert!(lending.show_all_asset().await.expect("list").is_empty());
}

#[tokio::test]
async fn test_lines_on_same_asset_share_availability() {
    let db = seeded().await;
    let lending = service(&db);

    let err = lending
        .checkout("U1", request("123", vec![line("B", 2), line("B", 2)]))
        .await
        .expect_err("4 units requested from 3");

    assert!(matches!(
        err,
        DomainError::BadRequest(Rejection::InsufficientStock { available: 1, .. })
    ));
    assert_eq!(available(&db, "B").await, 3);
}

#[tokio::test]
async fn test_unknown_staff_rejected_after_stock_check() {
    let db = seeded().await;
    let lending = service(&db);

    let err = lending
        .checkout("U1", request("999", vec![line("A", 1)]))
        .await
        .expect_err("unknown staff");

    assert_eq!(err, DomainError::NotFound(Missing::Staff("999".to_string())));
    assert_eq!(available(&db, "A").await, 5);
    assert!(lending.show_all_asset().await.expect("list").is_empty());
}

#[tokio::test]
async fn test_unknown_asset_rejected() {
    let db = seeded().await;
    let lending = service(&db);

    let err = lending
        .checkout("U1", request("123", vec![line("A", 1), line("Z", 1)]))
        .await
        .expect_err("unknown asset");

    assert_eq!(err, DomainError::NotFound(Missing::Asset("Z".to_string())));
    assert_eq!(available(&db, "A").await, 5);
}

#[tokio::test]
async fn test_structural_failures_have_no_side_effects() {
    let db = seeded().await;
    let lending = service(&db);

    let err = lending
        .checkout("U1", request("", vec![line("A", 1)]))
        .await
        .expect_err("empty staff");
    assert_eq!(err.to_string(), "nik staff cannot empty");

    let err = lending
        .checkout("U1", request("123", Vec::new()))
        .await
        .expect_err("no lines");
    assert_eq!(err, DomainError::BadRequest(Rejection::EmptyLines));

    let err = lending
        .checkout("U1", request("123", vec![line("A", -1)]))
        .await
        .expect_err("negative quantity");
    assert!(matches!(
        err,
        DomainError::BadRequest(Rejection::NegativeQuantity { line: 0, quantity: -1 })
    ));

    assert_eq!(available(&db, "A").await, 5);
    assert!(lending.show_all_asset().await.expect("list").is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_checkouts_cannot_overdraw() {
    let db = seeded().await;
    let lending = Arc::new(service(&db));

    let attempts = (0..2).map(|_| {
        let lending = Arc::clone(&lending);
        tokio::spawn(async move {
            lending
                .checkout("U1", request("123", vec![line("A", 5)]))
                .await
        })
    });

    let results: Vec<_> = futures::future::join_all(attempts)
        .await
        .into_iter()
        .map(|joined| joined.expect("task panicked"))
        .collect();

    let successes = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1);
    assert!(results.iter().any(|r| matches!(
        r,
        Err(DomainError::BadRequest(Rejection::InsufficientStock { available: 0, .. }))
    )));
    assert_eq!(available(&db, "A").await, 0);
    assert_eq!(lending.show_all_asset().await.expect("list").len(), 1);
}

/// Catalog whose decrement or restore fails for one asset
struct FailingCatalog {
    inner: SeaOrmAssetCatalog,
    fail_decrement_on: Option<&'static str>,
    fail_restore_on: Option<&'static str>,
}

#[async_trait]
impl AssetCatalog for FailingCatalog {
    async fn find_by_id(&self, id: &str) -> Result<Option<Asset>, DomainError> {
        self.inner.find_by_id(id).await
    }

    async fn decrement_available(&self, id: &str, quantity: i32) -> Result<(), DomainError> {
        if self.fail_decrement_on == Some(id) {
            return Err(DomainError::StoreFailure("disk full".to_string()));
        }
        self.inner.decrement_available(id, quantity).await
    }

    async fn restore_available(&self, id: &str, quantity: i32) -> Result<(), DomainError> {
        if self.fail_restore_on == Some(id) {
            return Err(DomainError::StoreFailure("disk full".to_string()));
        }
        self.inner.restore_available(id, quantity).await
    }
}

#[tokio::test]
async fn test_failed_decrement_is_compensated() {
    let db = seeded().await;
    let catalog = FailingCatalog {
        inner: SeaOrmAssetCatalog::new(db.clone()),
        fail_decrement_on: Some("B"),
        fail_restore_on: None,
    };
    let lending = service_with_catalog(&db, Arc::new(catalog));

    let err = lending
        .checkout("U1", request("123", vec![line("A", 2), line("B", 1)]))
        .await
        .expect_err("decrement of B fails");

    assert_eq!(err, DomainError::StoreFailure("disk full".to_string()));
    assert_eq!(available(&db, "A").await, 5);
    assert_eq!(available(&db, "B").await, 3);
    assert!(lending.show_all_asset().await.expect("list").is_empty());
}

#[tokio::test]
async fn test_return_restores_availability_once() {
    let db = seeded().await;
    let lending = service(&db);

    let receipt = lending
        .checkout("U1", request("123", vec![line("A", 2), line("A", 1)]))
        .await
        .expect("checkout");
    assert_eq!(available(&db, "A").await, 2);

    let returned = lending
        .return_transaction(&receipt.transaction_id)
        .await
        .expect("return");
    assert!(returned.lines.iter().all(|l| l.status == STATUS_RETURNED));
    assert_eq!(available(&db, "A").await, 5);

    let stored = lending
        .find_by_transaction_id(&receipt.transaction_id)
        .await
        .expect("lookup");
    assert!(stored[0].lines.iter().all(|l| l.status == STATUS_RETURNED));

    let err = lending
        .return_transaction(&receipt.transaction_id)
        .await
        .expect_err("second return");
    assert!(matches!(
        err,
        DomainError::BadRequest(Rejection::AlreadyReturned { .. })
    ));
    assert_eq!(available(&db, "A").await, 5);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_returns_restore_stock_once() {
    let db = seeded().await;
    let lending = Arc::new(service(&db));

    let first = lending
        .checkout("U1", request("123", vec![line("A", 2)]))
        .await
        .expect("first checkout");
    lending
        .checkout("U1", request("123", vec![line("A", 2)]))
        .await
        .expect("second checkout");
    assert_eq!(available(&db, "A").await, 1);

    let attempts = (0..2).map(|_| {
        let lending = Arc::clone(&lending);
        let id = first.transaction_id.clone();
        tokio::spawn(async move { lending.return_transaction(&id).await })
    });

    let results: Vec<_> = futures::future::join_all(attempts)
        .await
        .into_iter()
        .map(|joined| joined.expect("task panicked"))
        .collect();

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results.iter().any(|r| matches!(
        r,
        Err(DomainError::BadRequest(Rejection::AlreadyReturned { .. }))
    )));
    // the second loan is still out
    assert_eq!(available(&db, "A").await, 3);
}

#[tokio::test]
async fn test_failed_restore_leaves_return_retryable() {
    let db = seeded().await;
    let lending = service(&db);

    let receipt = lending
        .checkout("U1", request("123", vec![line("A", 2), line("B", 1)]))
        .await
        .expect("checkout");

    let failing = service_with_catalog(
        &db,
        Arc::new(FailingCatalog {
            inner: SeaOrmAssetCatalog::new(db.clone()),
            fail_decrement_on: None,
            fail_restore_on: Some("B"),
        }),
    );

    let err = failing
        .return_transaction(&receipt.transaction_id)
        .await
        .expect_err("restore of B fails");
    assert_eq!(err, DomainError::StoreFailure("disk full".to_string()));
    assert_eq!(available(&db, "A").await, 3);
    assert_eq!(available(&db, "B").await, 2);

    let stored = lending
        .find_by_transaction_id(&receipt.transaction_id)
        .await
        .expect("lookup");
    assert!(stored[0].lines.iter().all(|l| l.status == "borrowed"));

    lending
        .return_transaction(&receipt.transaction_id)
        .await
        .expect("retry succeeds");
    assert_eq!(available(&db, "A").await, 5);
    assert_eq!(available(&db, "B").await, 3);
}

#[tokio::test]
async fn test_return_unknown_transaction() {
    let db = seeded().await;
    let lending = service(&db);

    let err = lending
        .return_transaction("nope")
        .await
        .expect_err("unknown id");
    assert_eq!(
        err,
        DomainError::NotFound(Missing::Transaction("nope".to_string()))
    );

    let err = lending.return_transaction("").await.expect_err("empty id");
    assert_eq!(err, DomainError::BadRequest(Rejection::EmptyTransactionId));
}

#[tokio::test]
async fn test_reads_are_idempotent_and_empty_when_unknown() {
    let db = seeded().await;
    let lending = service(&db);

    let receipt = lending
        .checkout("U1", request("123", vec![line("A", 1)]))
        .await
        .expect("checkout");

    let first = lending
        .find_by_transaction_id(&receipt.transaction_id)
        .await
        .expect("first read");
    let second = lending
        .find_by_transaction_id(&receipt.transaction_id)
        .await
        .expect("second read");
    assert_eq!(first, second);

    assert!(lending
        .find_by_transaction_id("missing")
        .await
        .expect("unknown id is not an error")
        .is_empty());

    let err = lending.find_by_transaction_id(" ").await.expect_err("blank id");
    assert_eq!(err, DomainError::BadRequest(Rejection::EmptyTransactionId));
}

#[tokio::test]
async fn test_name_search_is_case_insensitive_substring() {
    let db = seeded().await;
    create_user(&db, "U2", "John Smith").await;
    let lending = service(&db);

    lending
        .checkout("U1", request("123", vec![line("A", 1)]))
        .await
        .expect("checkout for Jane");
    lending
        .checkout("U2", request("123", vec![line("B", 1)]))
        .await
        .expect("checkout for John");

    for query in ["Jane Doe", "jane", "E DO"] {
        let found = lending
            .find_transaction_by_name(query)
            .await
            .expect("search");
        assert_eq!(found.len(), 1, "query {:?}", query);
        assert_eq!(found[0].header.user_id, "U1");
    }

    let both = lending.find_transaction_by_name("j").await.expect("search");
    assert_eq!(both.len(), 2);

    assert!(lending
        .find_transaction_by_name("nobody")
        .await
        .expect("search")
        .is_empty());

    let err = lending
        .find_transaction_by_name("")
        .await
        .expect_err("empty name");
    assert_eq!(err, DomainError::BadRequest(Rejection::EmptyBorrowerName));
}

#[tokio::test]
async fn test_name_search_treats_wildcards_literally() {
    let db = seeded().await;
    create_user(&db, "U2", "100% Rahmat").await;
    let lending = service(&db);

    lending
        .checkout("U1", request("123", vec![line("A", 1)]))
        .await
        .expect("checkout for Jane");
    lending
        .checkout("U2", request("123", vec![line("B", 1)]))
        .await
        .expect("checkout for Rahmat");

    let found = lending.find_transaction_by_name("%").await.expect("search");
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].header.user_id, "U2");

    for query in ["_", "\\", "J%e"] {
        assert!(
            lending
                .find_transaction_by_name(query)
                .await
                .expect("search")
                .is_empty(),
            "query {:?}",
            query
        );
    }
}

#[tokio::test]
async fn test_download_lists_every_header() {
    let db = seeded().await;
    let lending = service(&db);

    let receipt = lending
        .checkout("U1", request("123", vec![line("A", 1)]))
        .await
        .expect("checkout");

    let csv = String::from_utf8(lending.download_assets().await.expect("export")).expect("utf8");
    let rows: Vec<&str> = csv.lines().collect();
    assert_eq!(rows.len(), 2);
    assert!(rows[1].starts_with(&format!("{},U1,Jane Doe,123,Budi,", receipt.transaction_id)));
}
