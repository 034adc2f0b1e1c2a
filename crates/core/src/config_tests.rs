use super::*;

#[test]
fn defaults_match_spec() {
    let cfg = Config::default();
    assert_eq!(cfg.shutdown.addr, "127.0.0.1");
    assert_eq!(cfg.shutdown.port, 9999);
    assert!(!cfg.production_mode);
    assert!(cfg.bridge_enabled);
    assert!(!cfg.simple_model);
    assert!(cfg.transports.is_empty());
}

#[test]
fn parses_transport_table_array() {
    let toml = r#"
production_mode = true

[[transports]]
type = "amqp"
address = "localhost"
port = 5672
channel = "events"

[[transports]]
type = "unix"
address = "/tmp/bridge.sock"
"#;
    let cfg = Config::from_toml_str(toml).unwrap();
    assert!(cfg.production_mode);
    assert_eq!(cfg.transports.len(), 2);
    assert_eq!(cfg.transports[0].kind, TransportKind::Amqp);
    assert_eq!(cfg.transports[0].port, Some(5672));
    assert_eq!(cfg.transports[1].kind, TransportKind::Unix);
}

#[test]
fn round_trips_through_toml() {
    let mut cfg = Config::default();
    cfg.transports.push(TransportConfig { kind: TransportKind::Mqtt, ..Default::default() });
    let text = cfg.to_toml_string().unwrap();
    let parsed = Config::from_toml_str(&text).unwrap();
    assert_eq!(parsed.transports.len(), 1);
    assert_eq!(parsed.transports[0].kind, TransportKind::Mqtt);
}
