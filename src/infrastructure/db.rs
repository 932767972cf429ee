use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, Statement};

pub async fn init_db(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(database_url.to_owned());
    options.sqlx_logging(false);

    // Every connection to `sqlite::memory:` opens its own empty database
    if database_url.contains(":memory:") {
        options.max_connections(1).min_connections(1);
    }

    let db = Database::connect(options).await?;

    // Run migrations manually (simple SQL)
    run_migrations(&db).await?;

    Ok(db)
}

// sqlx opens SQLite connections with `foreign_keys = ON`
async fn run_migrations(db: &DatabaseConnection) -> Result<(), DbErr> {
    // Borrower accounts
    db.execute(Statement::from_string(
        db.get_database_backend(),
        r#"
        CREATE TABLE IF NOT EXISTS user_credential (
            id TEXT PRIMARY KEY NOT NULL,
            email TEXT NOT NULL UNIQUE,
            password TEXT NOT NULL,
            name TEXT NOT NULL,
            is_active BOOLEAN NOT NULL DEFAULT 1
        )
        "#
        .to_owned(),
    ))
    .await?;

    db.execute(Statement::from_string(
        db.get_database_backend(),
        r#"
        CREATE TABLE IF NOT EXISTS staff (
            nik_staff TEXT PRIMARY KEY NOT NULL,
            name TEXT NOT NULL,
            phone_number TEXT,
            address TEXT,
            birth_date TEXT,
            img_url TEXT
        )
        "#
        .to_owned(),
    ))
    .await?;

    // The CHECK mirrors the catalog invariant so a bug cannot persist an overdraft
    db.execute(Statement::from_string(
        db.get_database_backend(),
        r#"
        CREATE TABLE IF NOT EXISTS asset (
            id TEXT PRIMARY KEY NOT NULL,
            category_id TEXT NOT NULL,
            asset_type_id TEXT NOT NULL,
            name TEXT NOT NULL,
            total INTEGER NOT NULL,
            available INTEGER NOT NULL,
            status TEXT NOT NULL,
            entry_date TEXT NOT NULL,
            img_url TEXT,
            CHECK (available >= 0 AND available <= total)
        )
        "#
        .to_owned(),
    ))
    .await?;

    // Lending transaction headers
    db.execute(Statement::from_string(
        db.get_database_backend(),
        r#"
        CREATE TABLE IF NOT EXISTS manage_asset (
            id TEXT PRIMARY KEY NOT NULL,
            id_user TEXT NOT NULL,
            nik_staff TEXT NOT NULL,
            submission_date TEXT NOT NULL,
            return_date TEXT NOT NULL,
            FOREIGN KEY (id_user) REFERENCES user_credential(id),
            FOREIGN KEY (nik_staff) REFERENCES staff(nik_staff)
        )
        "#
        .to_owned(),
    ))
    .await?;

    // Lending transaction lines
    db.execute(Statement::from_string(
        db.get_database_backend(),
        r#"
        CREATE TABLE IF NOT EXISTS detail_manage_asset (
            id TEXT PRIMARY KEY NOT NULL,
            id_asset TEXT NOT NULL,
            id_manage_asset TEXT NOT NULL,
            total_item INTEGER NOT NULL CHECK (total_item >= 0),
            status TEXT NOT NULL,
            line_no INTEGER NOT NULL DEFAULT 0,
            FOREIGN KEY (id_asset) REFERENCES asset(id),
            FOREIGN KEY (id_manage_asset) REFERENCES manage_asset(id) ON DELETE CASCADE
        )
        "#
        .to_owned(),
    ))
    .await?;

    db.execute(Statement::from_string(
        db.get_database_backend(),
        "CREATE INDEX IF NOT EXISTS idx_detail_manage_asset_header ON detail_manage_asset(id_manage_asset)"
            .to_owned(),
    ))
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_migrations_are_idempotent() {
        let db = init_db("sqlite::memory:").await.expect("Failed to init db");
        run_migrations(&db)
            .await
            .expect("Second migration run should be a no-op");
    }

    #[tokio::test]
    async fn test_asset_check_constraint_rejects_overdraft() {
        let db = init_db("sqlite::memory:").await.expect("Failed to init db");
        let result = db
            .execute(Statement::from_string(
                db.get_database_backend(),
                r#"
                INSERT INTO asset (id, category_id, asset_type_id, name, total, available, status, entry_date)
                VALUES ('A', 'C', 'T', 'Drill', 1, -1, 'active', '2024-01-01T00:00:00Z')
                "#
                .to_owned(),
            ))
            .await;
        assert!(result.is_err());
    }
}
