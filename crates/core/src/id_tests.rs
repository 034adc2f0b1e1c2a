use super::*;

#[test]
fn uuid_id_gen_produces_32_hex_chars() {
    let gen = UuidIdGen;
    let id = gen.next_id();
    assert_eq!(id.len(), 32);
    assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
}

#[test]
fn uuid_id_gen_is_not_constant() {
    let gen = UuidIdGen;
    assert_ne!(gen.next_id(), gen.next_id());
}

#[test]
fn fixed_id_gen_returns_constant() {
    let gen = FixedIdGen::new("x");
    assert_eq!(gen.next_id(), "x");
    assert_eq!(gen.next_id(), "x");
}

#[test]
fn fixed_id_gen_cycles_sequence() {
    let gen = FixedIdGen::from_sequence(["a".to_string(), "b".to_string()]);
    assert_eq!(gen.next_id(), "a");
    assert_eq!(gen.next_id(), "b");
    assert_eq!(gen.next_id(), "a");
}
