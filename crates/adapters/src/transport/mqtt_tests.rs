use super::*;
use bridge_core::config::TransportConfig;

fn params(clientid: Option<&str>) -> TransportParams {
    let cfg = TransportConfig {
        kind: bridge_core::TransportKind::Mqtt,
        address: Some("broker.internal".to_string()),
        port: Some(1883),
        user: Some("alice".to_string()),
        passwd: Some("secret".to_string()),
        channel: Some("events/jobs".to_string()),
        clientid: clientid.map(str::to_string),
        heartbeat: Some(5_000),
        exchange: None,
        adapter_class: None,
    };
    TransportParams::from_config(0, &cfg)
}

#[test]
fn mqtt_options_uses_configured_heartbeat_as_keep_alive() {
    let transport = MqttTransport::new(params(Some("bridge-mqtt-0")));
    let opts = transport.mqtt_options();
    assert_eq!(opts.keep_alive(), Duration::from_millis(5_000));
}

#[test]
fn mqtt_options_carries_credentials_when_present() {
    let transport = MqttTransport::new(params(Some("bridge-mqtt-0")));
    let opts = transport.mqtt_options();
    assert_eq!(opts.credentials(), Some(("alice".to_string(), "secret".to_string())));
}

#[test]
fn transport_params_generates_unique_client_id_when_unset() {
    let a = params(None);
    let b = params(None);
    assert_ne!(a.client_id, b.client_id);
}

#[tokio::test]
async fn publish_without_connect_reports_config_error() {
    let transport = MqttTransport::new(params(Some("bridge-mqtt-0")));
    let gen = bridge_core::FixedIdGen::new("id-1".to_string());
    let envelope = bridge_core::Envelope::new_shutdown(&gen);
    let err = transport.publish(&envelope).await.unwrap_err();
    assert!(matches!(err, TransportError::Config(_)));
}
