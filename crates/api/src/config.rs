use chrono::{FixedOffset, Offset, Utc};
use shopfloor_core::category::CategoryCatalog;
use shopfloor_core::legacy::offset_from_minutes;

use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// All fields except the secrets have defaults suitable for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// JWT token configuration (secret, expiry durations, cookie flags).
    pub jwt: JwtConfig,
    pub production: ProductionConfig,
    /// Administrator created on startup when the user table is empty.
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

/// Shop-floor settings.
#[derive(Debug, Clone)]
pub struct ProductionConfig {
    /// Accepted stoppage categories, in label priority order.
    pub categories: CategoryCatalog,
    /// Offset of the naive date/time pairs in legacy exports.
    pub legacy_utc_offset: FixedOffset,
}

impl Default for ProductionConfig {
    fn default() -> Self {
        Self {
            categories: CategoryCatalog::default(),
            legacy_utc_offset: Utc.fix(),
        }
    }
}

#[derive(Clone)]
pub struct BootstrapAdmin {
    pub matricula: String,
    pub name: String,
    pub password: String,
}

// Keep the password out of logs.
impl std::fmt::Debug for BootstrapAdmin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BootstrapAdmin")
            .field("matricula", &self.matricula)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                     | Default                    |
    /// |-----------------------------|----------------------------|
    /// | `HOST`                      | `0.0.0.0`                  |
    /// | `PORT`                      | `3000`                     |
    /// | `CORS_ORIGINS`              | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS`      | `30`                       |
    /// | `STOPPAGE_CATEGORIES`       | built-in catalog           |
    /// | `LEGACY_UTC_OFFSET_MINUTES` | `0`                        |
    /// | `BOOTSTRAP_ADMIN_*`         | unset                      |
    ///
    /// # Panics
    ///
    /// Panics on unparsable values so a misconfigured server never starts.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins = split_csv(
            &std::env::var("CORS_ORIGINS").unwrap_or_else(|_| "http://localhost:5173".into()),
        );

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let categories = match std::env::var("STOPPAGE_CATEGORIES") {
            Ok(csv) => CategoryCatalog::from_csv(&csv)
                .expect("STOPPAGE_CATEGORIES must list at least one category"),
            Err(_) => CategoryCatalog::default(),
        };

        let offset_minutes: i32 = std::env::var("LEGACY_UTC_OFFSET_MINUTES")
            .unwrap_or_else(|_| "0".into())
            .parse()
            .expect("LEGACY_UTC_OFFSET_MINUTES must be a valid i32");
        let legacy_utc_offset = offset_from_minutes(offset_minutes)
            .expect("LEGACY_UTC_OFFSET_MINUTES must be within +/- 24h");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            jwt: JwtConfig::from_env(),
            production: ProductionConfig {
                categories,
                legacy_utc_offset,
            },
            bootstrap_admin: bootstrap_admin_from_env(),
        }
    }
}

fn split_csv(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// All three `BOOTSTRAP_ADMIN_*` variables must be set and non-blank.
fn bootstrap_admin_from_env() -> Option<BootstrapAdmin> {
    let read = |key: &str| {
        std::env::var(key)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };
    Some(BootstrapAdmin {
        matricula: read("BOOTSTRAP_ADMIN_MATRICULA")?,
        name: read("BOOTSTRAP_ADMIN_NAME")?,
        password: read("BOOTSTRAP_ADMIN_PASSWORD")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_origins_are_trimmed() {
        assert_eq!(
            split_csv(" http://a.local , ,http://b.local"),
            ["http://a.local", "http://b.local"]
        );
    }

    #[test]
    fn default_production_config_is_utc() {
        let config = ProductionConfig::default();
        assert_eq!(config.legacy_utc_offset.local_minus_utc(), 0);
        assert_eq!(config.categories.labels()[0], "Manutenção");
    }
}
