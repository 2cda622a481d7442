use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};
use std::ops::{Deref, DerefMut};
use std::path::PathBuf;
use std::sync::Arc;

/// Top-level API configuration shared across services.
#[derive(Default, Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfigInner {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
    pub pagination: PaginationConfig,
    pub logging: LoggingConfig,
}

/// Thin Arc-wrapped config for inexpensive cloning into subsystems.
#[derive(Default, Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(flatten, default)]
    inner: Arc<ApiConfigInner>,
}

impl Deref for ApiConfig {
    type Target = ApiConfigInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl DerefMut for ApiConfig {
    fn deref_mut(&mut self) -> &mut ApiConfigInner {
        Arc::make_mut(&mut self.inner)
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub address: IpAddr,
    pub port: u16,
    pub ssl: Option<SslConfig>,
}

/// TLS certificate/key paths.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SslConfig {
    pub cert: PathBuf,
    pub key: PathBuf,
}

/// `PostgreSQL` connection pool configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_seconds: u64,
    pub connect_retries: u32,
}

/// Authentication, authorization and CORS settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Members of this group may run write operations.
    pub admin_group: i32,
    pub token_ttl_days: i64,
    pub token_max_ttl_days: i64,
    pub cors_origins: Vec<String>,
    pub jwt: JwtConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: Option<String>,
    pub audience: Option<String>,
    pub leeway_seconds: u64,
    /// Resolve JWT subjects against `macrostrat_auth."user"` for their groups.
    pub membership_lookup: bool,
}

/// Paging defaults applied to every list endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    pub default_page_size: u32,
    pub max_page_size: u32,
}

/// Logging knobs read by the binary before the server starts.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub filter: Option<String>,
    pub json: bool,
    pub path: Option<PathBuf>,
}

impl PaginationConfig {
    /// Clamps a requested page size into `1..=max_page_size`, falling back to the default.
    #[must_use]
    pub fn page_size(&self, requested: Option<u32>) -> u32 {
        requested.unwrap_or(self.default_page_size).clamp(1, self.max_page_size.max(1))
    }
}

// --- Default ---

impl Default for ServerConfig {
    fn default() -> Self {
        Self { address: IpAddr::V4(Ipv4Addr::UNSPECIFIED), port: 8000, ssl: None }
    }
}

impl Default for SslConfig {
    fn default() -> Self {
        Self { cert: PathBuf::from("cert.pem"), key: PathBuf::from("key.pem") }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgres://postgres@localhost:5432/macrostrat".to_owned(),
            max_connections: 10,
            min_connections: 0,
            acquire_timeout_seconds: 10,
            connect_retries: 3,
        }
    }
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            admin_group: 1,
            token_ttl_days: 30,
            token_max_ttl_days: 365,
            cors_origins: vec![
                "http://localhost:8000".to_owned(),
                "http://localhost:3000".to_owned(),
                "http://localhost:6006".to_owned(),
            ],
            jwt: JwtConfig::default(),
        }
    }
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: "dev-only-change-me".to_owned(),
            issuer: None,
            audience: None,
            leeway_seconds: 60,
            membership_lookup: true,
        }
    }
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self { default_page_size: 100, max_page_size: 1000 }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_owned(), filter: None, json: false, path: None }
    }
}
