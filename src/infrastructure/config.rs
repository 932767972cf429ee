use std::env;
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
    pub lock_timeout: Duration,
    pub otp_ttl: Duration,
    /// Token signing secret, `None` when unset or blank
    pub jwt_secret: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from any key lookup, unset or unparsable values fall back to defaults
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let parsed = |key: &str| lookup(key).and_then(|v| v.trim().parse::<u64>().ok());

        Self {
            database_url: lookup("DATABASE_URL")
                .unwrap_or_else(|| "sqlite://asset_lending.db?mode=rwc".to_string()),
            port: lookup("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            cors_allowed_origins: lookup("CORS_ALLOWED_ORIGINS")
                .map(|s| {
                    s.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            lock_timeout: Duration::from_millis(parsed("LOCK_TIMEOUT_MS").unwrap_or(5000)),
            otp_ttl: Duration::from_secs(parsed("OTP_TTL_SECS").unwrap_or(300)),
            jwt_secret: lookup("JWT_SECRET").filter(|s| !s.trim().is_empty()),
        }
    }
}
