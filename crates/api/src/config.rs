use std::str::FromStr;

use hookroom_core::fault::FaultPolicy;
use hookroom_core::room::{clamp_ttl, DEFAULT_WEBHOOK_TTL_SECS};

use crate::auth::jwt::JwtConfig;

/// Default request body limit for captured webhooks (1 MiB).
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

/// Where rooms, fault states and captures are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// Process-local maps. Lost on restart.
    Memory,
    /// PostgreSQL via `hookroom_db`. Requires `DATABASE_URL`.
    Postgres,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "postgres" | "postgresql" => Ok(Self::Postgres),
            other => Err(format!("unknown store backend '{other}'")),
        }
    }
}

/// Server configuration loaded from environment variables.
///
/// All fields except the JWT secret have defaults suitable for local
/// development. In production, override via environment variables.
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
    /// How long shutdown waits for background jobs, in seconds (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// Externally reachable base URL used to build `webhook_url` values.
    pub public_base_url: String,
    /// Capture TTL for owners without a `webhook_ttl` preference.
    pub default_webhook_ttl_secs: i64,
    pub store_backend: StoreBackend,
    /// Only read when `store_backend` is [`StoreBackend::Postgres`].
    pub database_url: Option<String>,
    /// Interval of the expired-capture sweep in seconds (default: `60`).
    pub capture_sweep_interval_secs: u64,
    /// Largest accepted request body in bytes.
    pub max_body_bytes: usize,
    pub fault_policy: FaultPolicy,
    /// JWT token configuration (secret, expiry).
    pub jwt: JwtConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                         | Default                    |
    /// |---------------------------------|----------------------------|
    /// | `HOST`                          | `0.0.0.0`                  |
    /// | `PORT`                          | `3000`                     |
    /// | `CORS_ORIGINS`                  | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS`          | `30`                       |
    /// | `SHUTDOWN_TIMEOUT_SECS`         | `30`                       |
    /// | `PUBLIC_BASE_URL`               | `http://localhost:{PORT}`  |
    /// | `DEFAULT_WEBHOOK_TTL_SECS`      | `43200`                    |
    /// | `STORE_BACKEND`                 | `memory`                   |
    /// | `DATABASE_URL`                  | required for `postgres`    |
    /// | `CAPTURE_SWEEP_INTERVAL_SECS`   | `60`                       |
    /// | `MAX_BODY_BYTES`                | `1048576`                  |
    /// | `FAULT_FORCE_PREFLIGHT_METHODS` | `true`                     |
    ///
    /// # Panics
    ///
    /// Panics on unparseable values, or when the postgres backend is
    /// selected without `DATABASE_URL`.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let shutdown_timeout_secs: u64 = std::env::var("SHUTDOWN_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("SHUTDOWN_TIMEOUT_SECS must be a valid u64");

        let public_base_url = std::env::var("PUBLIC_BASE_URL")
            .unwrap_or_else(|_| format!("http://localhost:{port}"))
            .trim_end_matches('/')
            .to_string();

        let default_webhook_ttl_secs: i64 = std::env::var("DEFAULT_WEBHOOK_TTL_SECS")
            .unwrap_or_else(|_| DEFAULT_WEBHOOK_TTL_SECS.to_string())
            .parse()
            .expect("DEFAULT_WEBHOOK_TTL_SECS must be a valid i64");

        let store_backend: StoreBackend = std::env::var("STORE_BACKEND")
            .unwrap_or_else(|_| "memory".into())
            .parse()
            .unwrap_or_else(|e| panic!("STORE_BACKEND: {e}"));

        let database_url = std::env::var("DATABASE_URL").ok();
        assert!(
            store_backend != StoreBackend::Postgres || database_url.is_some(),
            "DATABASE_URL must be set when STORE_BACKEND=postgres"
        );

        let capture_sweep_interval_secs: u64 = std::env::var("CAPTURE_SWEEP_INTERVAL_SECS")
            .unwrap_or_else(|_| "60".into())
            .parse()
            .expect("CAPTURE_SWEEP_INTERVAL_SECS must be a valid u64");

        let max_body_bytes: usize = std::env::var("MAX_BODY_BYTES")
            .unwrap_or_else(|_| DEFAULT_MAX_BODY_BYTES.to_string())
            .parse()
            .expect("MAX_BODY_BYTES must be a valid usize");

        let force_applies_to_preflight_methods: bool =
            std::env::var("FAULT_FORCE_PREFLIGHT_METHODS")
                .unwrap_or_else(|_| "true".into())
                .parse()
                .expect("FAULT_FORCE_PREFLIGHT_METHODS must be true or false");

        let jwt = JwtConfig::from_env();

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            public_base_url,
            default_webhook_ttl_secs: clamp_ttl(default_webhook_ttl_secs),
            store_backend,
            database_url,
            capture_sweep_interval_secs: capture_sweep_interval_secs.max(1),
            max_body_bytes,
            fault_policy: FaultPolicy {
                force_applies_to_preflight_methods,
            },
            jwt,
        }
    }

    /// Public capture URL of a room.
    pub fn webhook_url(&self, room_id: &str) -> String {
        format!("{}/hook/{room_id}", self.public_base_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_backend_parses_known_names() {
        assert_eq!("memory".parse::<StoreBackend>(), Ok(StoreBackend::Memory));
        assert_eq!("Postgres".parse::<StoreBackend>(), Ok(StoreBackend::Postgres));
        assert!("redis".parse::<StoreBackend>().is_err());
    }
}
