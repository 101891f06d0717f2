use super::*;
use std::io::Write;

#[test]
fn defaults_match_service_constants() {
    let cfg = VaultConfig::default();
    assert_eq!(cfg.http_port, 8001);
    assert_eq!(cfg.history_capacity, 100);
    assert_eq!(cfg.idle_ttl(), Duration::from_secs(86_400));
    assert_eq!(cfg.credential_header, "x-session-id");
    assert_eq!(cfg.session_cookie, "session_id");
    assert!(!cfg.open_privileged);
    assert!(cfg.validate().is_ok());
}

#[test]
fn env_overrides_apply() {
    let mut cfg = VaultConfig::default();
    cfg.apply_env_from(vec![
        ("CONTEXTVAULT_HTTP_PORT", "9000"),
        ("CONTEXTVAULT_HISTORY_CAPACITY", "5"),
        ("CONTEXTVAULT_SWEEP_INTERVAL_SECS", "0"),
        ("CONTEXTVAULT_PRIVILEGED", "admin, ops ,,"),
        ("CONTEXTVAULT_OPEN_PRIVILEGED", "yes"),
        ("CONTEXTVAULT_RESOLVER_URL", "http://auth.local/resolve"),
        ("PATH", "/usr/bin"),
    ])
    .unwrap();
    assert_eq!(cfg.http_port, 9000);
    assert_eq!(cfg.history_capacity, 5);
    assert_eq!(cfg.sweep_interval(), None);
    assert_eq!(cfg.privileged_identities, vec!["admin".to_string(), "ops".to_string()]);
    assert!(cfg.open_privileged);
    assert_eq!(cfg.resolver_url.as_deref(), Some("http://auth.local/resolve"));
}

#[test]
fn env_rejects_bad_numbers() {
    let mut cfg = VaultConfig::default();
    let err = cfg.apply_env_from(vec![("CONTEXTVAULT_HTTP_PORT", "eighty")]).unwrap_err();
    assert!(err.to_string().contains("HTTP_PORT"));
    assert!(cfg.apply_env_from(vec![("CONTEXTVAULT_OPEN_PRIVILEGED", "maybe")]).is_err());
}

#[test]
fn file_fills_missing_fields_with_defaults() {
    let mut f = tempfile::NamedTempFile::new().unwrap();
    write!(f, r#"{{"http_port": 7000, "idle_ttl_secs": 60, "privileged_identities": ["root"]}}"#).unwrap();
    let cfg = VaultConfig::load_file(f.path()).unwrap();
    assert_eq!(cfg.http_port, 7000);
    assert_eq!(cfg.idle_ttl_secs, 60);
    assert_eq!(cfg.history_capacity, 100);
    assert_eq!(cfg.privileged_identities, vec!["root".to_string()]);
}

#[test]
fn validate_rejects_zero_capacity_and_bad_header() {
    let mut cfg = VaultConfig::default();
    cfg.history_capacity = 0;
    assert!(cfg.validate().is_err());
    let mut cfg = VaultConfig::default();
    cfg.credential_header = "bad header".to_string();
    assert!(cfg.validate().is_err());
}
