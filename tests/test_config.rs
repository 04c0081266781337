use cors_proxy::config::{Config, HeaderEntry, PassthroughHeader};

#[test]
fn test_config_defaults() {
    let cfg = Config::default();

    assert_eq!(cfg.server.listen_addr, "127.0.0.1:3000");
    assert_eq!(cfg.cors.allow_origin, "*");
    assert_eq!(cfg.cors.max_age, 86400);
    assert!(cfg.proxy.allowed_headers.iter().any(|h| h == "Referer"));
    assert_eq!(cfg.proxy.timeout_secs, Some(60));
    assert!(cfg.proxy.user_agent.starts_with("cors-proxy/"));
}

#[test]
fn test_config_default_passthrough_is_authorization_and_bearer() {
    let cfg = Config::default();

    assert_eq!(
        cfg.proxy.passthrough,
        vec![
            PassthroughHeader::new("Authorization", "Authorization"),
            PassthroughHeader::new("Bearer", "Bearer"),
        ]
    );
}

#[test]
fn test_config_from_yaml_overrides_sections() {
    let yaml = r#"
server:
  listen_addr: "0.0.0.0:4000"
proxy:
  default_headers:
    - name: Origin
      value: https://hotdesk.example.com
  passthrough:
    - from: X-Cookie
      to: Cookie
  timeout_secs: 5
"#;

    let cfg = Config::from_yaml(yaml).unwrap();

    assert_eq!(cfg.server.listen_addr, "0.0.0.0:4000");
    assert_eq!(cfg.server.max_request_bytes, 10 * 1024 * 1024);
    assert_eq!(
        cfg.proxy.default_headers,
        vec![HeaderEntry::new("Origin", "https://hotdesk.example.com")]
    );
    assert_eq!(
        cfg.proxy.passthrough,
        vec![PassthroughHeader::new("X-Cookie", "Cookie")]
    );
    assert_eq!(cfg.proxy.timeout_secs, Some(5));
    // untouched sections keep their defaults
    assert_eq!(cfg.cors.allow_origin, "*");
    assert_eq!(cfg.version.version_file, "VERSION");
}

#[test]
fn test_config_from_yaml_rejects_bad_types() {
    let yaml = "server:\n  listen_addr: [1, 2]\n";

    assert!(Config::from_yaml(yaml).is_err());
}

#[test]
fn test_config_load_listen_override() {
    unsafe {
        std::env::remove_var("CORS_PROXY_CONFIG");
        std::env::set_var("LISTEN", "0.0.0.0:5000");
    }
    let cfg = Config::load().unwrap();
    assert_eq!(cfg.server.listen_addr, "0.0.0.0:5000");
    unsafe {
        std::env::remove_var("LISTEN");
    }
}

#[test]
fn test_config_from_missing_file_fails() {
    assert!(Config::from_file("/nonexistent/cors-proxy.yaml").is_err());
}

#[test]
fn test_example_config_parses() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.yaml");

    let cfg = Config::from_file(path).unwrap();

    assert_eq!(cfg.proxy.default_headers.len(), 5);
    assert_eq!(cfg.cors.allow_headers.len(), 9);
    assert_eq!(cfg.version.timeout_secs, 10);
}
