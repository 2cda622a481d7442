use ingest_domain::config::{ApiConfig, DatabaseConfig, PaginationConfig, SecurityConfig, ServerConfig};
use serde_json::json;

#[test]
fn config_defaults_are_sane() {
    let server = ServerConfig::default();
    assert_eq!(server.port, 8000);
    assert!(server.ssl.is_none());

    let db = DatabaseConfig::default();
    assert!(db.url.starts_with("postgres://"));
    assert_eq!(db.max_connections, 10);
    assert_eq!(db.connect_retries, 3);

    let security = SecurityConfig::default();
    assert_eq!(security.admin_group, 1);
    assert!(security.cors_origins.iter().any(|o| o == "http://localhost:3000"));
}

#[test]
fn api_config_deserializes() {
    let raw = json!({
        "server": { "address": "::", "port": 8080 },
        "database": { "url": "postgres://ingest@db/macrostrat", "max_connections": 4 },
        "security": { "admin_group": 7, "jwt": { "secret": "s3cret", "issuer": "macrostrat" } },
        "pagination": { "max_page_size": 50 }
    });

    let cfg: ApiConfig = serde_json::from_value(raw).expect("config deserialize");
    assert_eq!(cfg.server.port, 8080);
    assert_eq!(cfg.database.url, "postgres://ingest@db/macrostrat");
    assert_eq!(cfg.database.max_connections, 4);
    assert_eq!(cfg.database.acquire_timeout_seconds, 10);
    assert_eq!(cfg.security.admin_group, 7);
    assert_eq!(cfg.security.jwt.issuer.as_deref(), Some("macrostrat"));
    assert_eq!(cfg.security.jwt.leeway_seconds, 60);
    assert!(cfg.security.jwt.membership_lookup);
    assert_eq!(cfg.pagination.max_page_size, 50);
    assert_eq!(cfg.pagination.default_page_size, 100);
}

#[test]
fn page_size_is_clamped() {
    let paging = PaginationConfig { default_page_size: 100, max_page_size: 500 };
    assert_eq!(paging.page_size(None), 100);
    assert_eq!(paging.page_size(Some(0)), 1);
    assert_eq!(paging.page_size(Some(20)), 20);
    assert_eq!(paging.page_size(Some(10_000)), 500);
}

#[test]
fn config_is_cheap_to_clone_and_copy_on_write() {
    let cfg = ApiConfig::default();
    let mut copy = cfg.clone();
    copy.server.port = 9000;
    assert_eq!(cfg.server.port, 8000);
    assert_eq!(copy.server.port, 9000);
}
