//! Config loading and defaults integration tests

use std::path::PathBuf;

use ascari_gateway::config::{CacheBackend, Config, ConfigError};

#[test]
fn test_defaults() {
    let config = Config::default();

    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.server.http_port, 5000);
    assert_eq!(config.server.static_dir, PathBuf::from("frontend/dist"));
    assert_eq!(config.erp.timeout_secs, 30);
    assert_eq!(config.cache.backend, CacheBackend::None);
    assert_eq!(config.cache.code_prefix, "ASC");
    assert_eq!(config.dashboard.customer_limit, 10);
    assert!(config.dashboard.include_images);
    assert_eq!(config.bind_address(), "0.0.0.0:5000");
}

#[test]
fn test_empty_file_gives_defaults() {
    let config = Config::from_toml("").expect("empty config is valid");
    assert_eq!(config.server.http_port, 5000);
    assert_eq!(config.dashboard.product_limit, 200);
}

#[test]
fn test_config_with_all_sections() {
    let toml_str = r#"
[server]
host = "127.0.0.1"
http_port = 8080
static_dir = "/srv/ascari"

[erp]
timeout_secs = 10

[cache]
backend = "redis"
redis_url = "redis://cache:6379"
quote_ttl_secs = 3600
code_prefix = "QT"

[dashboard]
product_limit = 50
include_images = false
"#;

    let config = Config::from_toml(toml_str).expect("valid config");

    assert_eq!(config.bind_address(), "127.0.0.1:8080");
    assert_eq!(config.server.static_dir, PathBuf::from("/srv/ascari"));
    assert_eq!(config.erp.timeout_secs, 10);
    assert_eq!(config.cache.backend, CacheBackend::Redis);
    assert_eq!(config.cache.redis_url.as_deref(), Some("redis://cache:6379"));
    assert_eq!(config.cache.quote_ttl_secs, 3600);
    assert_eq!(config.cache.code_prefix, "QT");
    assert_eq!(config.dashboard.product_limit, 50);
    assert!(!config.dashboard.include_images);
    // Untouched fields keep their defaults
    assert_eq!(config.dashboard.order_limit, 100);
}

#[test]
fn test_redis_backend_needs_url() {
    let result = Config::from_toml("[cache]\nbackend = \"redis\"\n");
    assert!(matches!(result, Err(ConfigError::MissingRedisUrl)));
}

#[test]
fn test_unknown_backend_rejected() {
    let result = Config::from_toml("[cache]\nbackend = \"memcached\"\n");
    assert!(matches!(result, Err(ConfigError::Parse(_))));
}

#[test]
fn test_load_missing_file_uses_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::load(&dir.path().join("absent.toml")).unwrap();
    assert_eq!(config.server.http_port, 5000);
}

#[test]
fn test_load_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ascari-gateway.toml");
    std::fs::write(&path, "[server]\nhttp_port = 9000\n[cache]\nbackend = \"memory\"\n").unwrap();

    let config = Config::load(&path).unwrap();

    assert_eq!(config.server.http_port, 9000);
    assert_eq!(config.cache.backend, CacheBackend::Memory);
}
