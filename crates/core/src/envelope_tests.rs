use super::*;
use crate::id::FixedIdGen;

#[test]
fn module_key_format() {
    let key = ModuleKey::new("DEMO", "HELLO");
    assert_eq!(key.as_str(), "DEMO@HELLO");
    assert_eq!(key.to_string(), "DEMO@HELLO");
}

#[test]
fn wildcard_key() {
    assert_eq!(ModuleKey::wildcard().as_str(), "*");
}

#[test]
fn new_command_rejects_empty_module() {
    let gen = FixedIdGen::new("x");
    let err = Envelope::new_command(&gen, "", "S", "cmd", Params::empty()).unwrap_err();
    assert_eq!(err, EnvelopeError::EmptyModule);
}

#[test]
fn new_command_rejects_empty_command() {
    let gen = FixedIdGen::new("x");
    let err = Envelope::new_command(&gen, "M", "S", "", Params::empty()).unwrap_err();
    assert_eq!(err, EnvelopeError::EmptyCommand);
}

#[test]
fn new_event_rejects_empty_event() {
    let gen = FixedIdGen::new("x");
    let err = Envelope::new_event(&gen, "M", "S", "", Params::empty()).unwrap_err();
    assert_eq!(err, EnvelopeError::EmptyEvent);
}

#[test]
fn new_command_assigns_id_and_module_key() {
    let gen = FixedIdGen::new("abc123");
    let env = Envelope::new_command(&gen, "DEMO", "HELLO", "say_hi", Params::empty()).unwrap();
    assert_eq!(env.msgid(), "abc123");
    assert_eq!(env.module_key(), Some(ModuleKey::new("DEMO", "HELLO")));
    assert!(!env.is_shutdown());
}

#[test]
fn shutdown_has_no_module_key() {
    let gen = FixedIdGen::new("abc123");
    let env = Envelope::new_shutdown(&gen);
    assert_eq!(env.module_key(), None);
    assert!(env.is_shutdown());
}
