use super::*;
use crate::envelope::Params;
use crate::id::FixedIdGen;
use crate::test_support::strategies::{arb_command_envelope, arb_event_envelope};
use proptest::prelude::*;
use serde_json::json;

proptest! {
    #[test]
    fn command_envelope_round_trips(env in arb_command_envelope()) {
        let gen = FixedIdGen::new(env.msgid().to_string());
        let decoded = decode_str(&encode(&env), &gen).unwrap();
        prop_assert_eq!(decoded, env);
    }

    #[test]
    fn event_envelope_round_trips(env in arb_event_envelope()) {
        let gen = FixedIdGen::new(env.msgid().to_string());
        let decoded = decode_str(&encode(&env), &gen).unwrap();
        prop_assert_eq!(decoded, env);
    }
}

#[test]
fn round_trip_command() {
    let gen = FixedIdGen::new("ignored");
    let env = Envelope::Command {
        msgid: "x".to_string(),
        module: "DEMO".to_string(),
        submodule: "HELLO".to_string(),
        command: "say_hi".to_string(),
        data: Params::new(vec![json!("world")], Default::default()),
        options: Default::default(),
    };
    let encoded = encode(&env);
    // Wire form must be base64 whose inner bytes are valid UTF-8 JSON.
    let raw = BASE64.decode(&encoded).unwrap();
    assert!(serde_json::from_slice::<serde_json::Value>(&raw).is_ok());

    let decoded = decode_str(&encoded, &gen).unwrap();
    assert_eq!(decoded, env);
}

#[test]
fn round_trip_event() {
    let gen = FixedIdGen::new("ignored");
    let env = Envelope::Event {
        msgid: "y".to_string(),
        module: "DEMO".to_string(),
        submodule: "TICK".to_string(),
        event: "beat".to_string(),
        data: Params::empty(),
        options: Default::default(),
    };
    let encoded = encode(&env);
    let decoded = decode_str(&encoded, &gen).unwrap();
    assert_eq!(decoded, env);
}

#[test]
fn round_trip_shutdown() {
    let gen = FixedIdGen::new("ignored");
    let env = Envelope::Shutdown { msgid: "z".to_string() };
    let decoded = decode_str(&encode(&env), &gen).unwrap();
    assert_eq!(decoded, env);
}

#[test]
fn decode_fills_missing_msgid() {
    let gen = FixedIdGen::new("generated");
    let json = json!({
        "msgtype": 0,
        "module": "DEMO",
        "submodule": "HELLO",
        "command": "say_hi",
        "data": [["world"], {}],
    });
    let encoded = BASE64.encode(serde_json::to_vec(&json).unwrap());
    let decoded = decode_str(&encoded, &gen).unwrap();
    assert_eq!(decoded.msgid(), "generated");
}

#[test]
fn decode_fills_missing_options() {
    let gen = FixedIdGen::new("ignored");
    let json = json!({
        "msgtype": 1,
        "msgid": "m",
        "module": "DEMO",
        "submodule": "TICK",
        "event": "beat",
        "data": [[], {}],
    });
    let encoded = BASE64.encode(serde_json::to_vec(&json).unwrap());
    let decoded = decode_str(&encoded, &gen).unwrap();
    match decoded {
        Envelope::Event { options, .. } => assert!(options.is_empty()),
        _ => panic!("expected event envelope"),
    }
}

#[test]
fn decode_rejects_unknown_msgtype() {
    let gen = FixedIdGen::new("ignored");
    let json = json!({ "msgtype": 7, "msgid": "m" });
    let encoded = BASE64.encode(serde_json::to_vec(&json).unwrap());
    let err = decode_str(&encoded, &gen).unwrap_err();
    assert!(matches!(err, CodecError::UnknownMsgtype(7)));
}

#[test]
fn decode_rejects_invalid_base64() {
    let gen = FixedIdGen::new("ignored");
    let err = decode_str("not base64!!!", &gen).unwrap_err();
    assert!(matches!(err, CodecError::InvalidBase64(_)));
}

#[test]
fn decode_rejects_invalid_json() {
    let gen = FixedIdGen::new("ignored");
    let encoded = BASE64.encode(b"not json");
    let err = decode_str(&encoded, &gen).unwrap_err();
    assert!(matches!(err, CodecError::InvalidJson(_)));
}

#[test]
fn decode_rejects_missing_command() {
    let gen = FixedIdGen::new("ignored");
    let json = json!({ "msgtype": 0, "msgid": "m", "module": "DEMO", "submodule": "HELLO" });
    let encoded = BASE64.encode(serde_json::to_vec(&json).unwrap());
    let err = decode_str(&encoded, &gen).unwrap_err();
    assert!(matches!(err, CodecError::MissingField("command")));
}

#[test]
fn decode_accepts_raw_bytes() {
    let gen = FixedIdGen::new("ignored");
    let env = Envelope::Shutdown { msgid: "z".to_string() };
    let encoded = encode(&env);
    let decoded = decode(encoded.as_bytes(), &gen).unwrap();
    assert_eq!(decoded, env);
}
