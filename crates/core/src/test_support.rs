// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use std::collections::HashMap;

use crate::envelope::{Envelope, Params};

/// Proptest strategies for envelope round-trip properties (Testable
/// Property 3).
#[cfg(any(test, feature = "test-support"))]
pub mod strategies {
    use super::*;
    use proptest::prelude::*;
    use serde_json::Value;

    fn arb_json_value() -> impl Strategy<Value = Value> {
        prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(|n| Value::Number(n.into())),
            ".{0,8}".prop_map(Value::String),
        ]
    }

    fn arb_params() -> impl Strategy<Value = Params> {
        (
            prop::collection::vec(arb_json_value(), 0..4),
            prop::collection::hash_map(".{1,6}", arb_json_value(), 0..4),
        )
            .prop_map(|(args, kwargs)| {
                let mut map = serde_json::Map::new();
                for (k, v) in kwargs {
                    map.insert(k, v);
                }
                Params::new(args, map)
            })
    }

    pub fn arb_command_envelope() -> impl Strategy<Value = Envelope> {
        ("[A-Z]{1,6}", "[A-Z]{1,6}", "[a-z_]{1,10}", arb_params()).prop_map(
            |(module, submodule, command, data)| Envelope::Command {
                msgid: "prop-test-id".to_string(),
                module,
                submodule,
                command,
                data,
                options: HashMap::new(),
            },
        )
    }

    pub fn arb_event_envelope() -> impl Strategy<Value = Envelope> {
        ("[A-Z]{1,6}", "[A-Z]{1,6}", "[a-z_]{1,10}", arb_params()).prop_map(
            |(module, submodule, event, data)| Envelope::Event {
                msgid: "prop-test-id".to_string(),
                module,
                submodule,
                event,
                data,
                options: HashMap::new(),
            },
        )
    }
}

pub fn command_envelope(module: &str, submodule: &str, command: &str) -> Envelope {
    Envelope::Command {
        msgid: "test-msg-id".to_string(),
        module: module.to_string(),
        submodule: submodule.to_string(),
        command: command.to_string(),
        data: Params::empty(),
        options: HashMap::new(),
    }
}
