use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use asset_lending::infrastructure::otp::OtpStore;
use asset_lending::infrastructure::AppState;
use asset_lending::{config, db, seed, server};

/// Drop expired one-time codes in the background
fn spawn_otp_purge(otp_store: Arc<OtpStore>, every: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            let purged = otp_store.purge_expired();
            if purged > 0 {
                tracing::debug!("Purged {} expired one-time codes", purged);
            }
        }
    });
}

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "asset_lending=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = config::Config::from_env();

    // Initialize database
    let db = match db::init_db(&config.database_url).await {
        Ok(db) => db,
        Err(e) => {
            tracing::error!("Failed to initialize database: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // Check for seed flag
    if std::env::var("SEED_DEMO").is_ok() {
        tracing::info!("Seeding demo data...");
        if let Err(e) = seed::seed_demo_data(&db).await {
            tracing::error!("Failed to seed data: {}", e);
        }
    }

    let state = match AppState::new(db, &config) {
        Ok(state) => state,
        Err(e) => {
            tracing::error!("Failed to build application state: {}", e);
            return ExitCode::FAILURE;
        }
    };
    spawn_otp_purge(Arc::clone(&state.otp_store), config.otp_ttl.max(Duration::from_secs(1)));

    let app = server::build_router(state, &config);

    if let Err(e) = server::serve(app, config.port).await {
        tracing::error!("{}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
