use std::io::Write;

use restwire::codec::CodecKind;
use restwire::config::{Config, LogLevel};

#[test]
fn test_config_defaults() {
    let cfg = Config::default();

    assert_eq!(cfg.server_name, "Restwire : Lightweight REST Server");
    assert_eq!(cfg.listen_addr(), "127.0.0.1:8080");
    assert_eq!(cfg.read_timeout_ms, 1000);
    assert_eq!(cfg.keep_alive_timeout_secs, 5);
    assert_eq!(cfg.keep_alive_max, 99);
    assert_eq!(cfg.max_body_bytes, 8 * 1024 * 1024);
    assert_eq!(cfg.log_level, LogLevel::Info);
    assert_eq!(cfg.codec, CodecKind::Json);
    assert!(!cfg.decode_query);
    assert!(cfg.sessions_file.is_none());
}

#[test]
fn test_config_partial_yaml_keeps_defaults() {
    let cfg = Config::from_yaml("port: 9000\ncodec: text\nlog_level: debug\n").unwrap();

    assert_eq!(cfg.port, 9000);
    assert_eq!(cfg.codec, CodecKind::Text);
    assert_eq!(cfg.log_level, LogLevel::Debug);
    assert_eq!(cfg.host, "127.0.0.1");
    assert_eq!(cfg.keep_alive_max, 99);
}

#[test]
fn test_config_empty_yaml_is_default() {
    let cfg = Config::from_yaml("").unwrap();

    assert_eq!(cfg.port, 8080);
}

#[test]
fn test_config_rejects_bad_yaml() {
    assert!(Config::from_yaml("port: not-a-port\n").is_err());
    assert!(Config::from_yaml("codec: xml\n").is_err());
}

#[test]
fn test_config_from_file() {
    let path = std::env::temp_dir().join(format!("restwire-config-{}.yaml", std::process::id()));
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(file, "server_name: Test Server\nsessions_file: /tmp/sessions.json").unwrap();

    let cfg = Config::from_file(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(cfg.server_name, "Test Server");
    assert_eq!(cfg.sessions_file.unwrap().to_str(), Some("/tmp/sessions.json"));
}

#[test]
fn test_config_missing_file() {
    assert!(Config::from_file("/definitely/not/here.yaml").is_err());
}

#[test]
fn test_config_env_overrides() {
    unsafe {
        std::env::remove_var("RESTWIRE_CONFIG");
        std::env::set_var("RESTWIRE_HOST", "0.0.0.0");
        std::env::set_var("RESTWIRE_PORT", "3000");
        std::env::set_var("RESTWIRE_LOG", "WARN");
    }
    let cfg = Config::load();
    unsafe {
        std::env::remove_var("RESTWIRE_HOST");
        std::env::remove_var("RESTWIRE_PORT");
        std::env::remove_var("RESTWIRE_LOG");
    }

    assert_eq!(cfg.listen_addr(), "0.0.0.0:3000");
    assert_eq!(cfg.log_level, LogLevel::Warn);
}

#[test]
fn test_config_clone() {
    let cfg1 = Config::default();
    let cfg2 = cfg1.clone();
    assert_eq!(cfg1.listen_addr(), cfg2.listen_addr());
}
