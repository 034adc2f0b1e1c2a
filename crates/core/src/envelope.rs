// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The canonical message envelope and the module-key that indexes handler
//! registries.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

// `Envelope` itself is not `Serialize`/`Deserialize`: the wire representation
// (numeric `msgtype`, optional `command`/`event`, defaulted `msgid`/`options`)
// does not map onto serde's internally-tagged-enum support, which keys
// variants by string. `codec` owns the JSON <-> `Envelope` conversion.

use crate::id::IdGen;

/// Positional arguments plus keyword arguments, mirroring the original
/// `(args, kwargs)` pair carried in every envelope's `data` field. On the
/// wire this is a two-element JSON array `[[args...], {kwargs...}]`, not an
/// object, so (de)serialization is hand-written rather than derived.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params {
    pub args: Vec<Value>,
    pub kwargs: serde_json::Map<String, Value>,
}

impl Serialize for Params {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeTuple;
        let mut tup = serializer.serialize_tuple(2)?;
        tup.serialize_element(&self.args)?;
        tup.serialize_element(&self.kwargs)?;
        tup.end()
    }
}

impl<'de> Deserialize<'de> for Params {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let (args, kwargs): (Vec<Value>, serde_json::Map<String, Value>) =
            Deserialize::deserialize(deserializer)?;
        Ok(Params { args, kwargs })
    }
}

impl Params {
    pub fn new(args: Vec<Value>, kwargs: serde_json::Map<String, Value>) -> Self {
        Self { args, kwargs }
    }

    pub fn empty() -> Self {
        Self::default()
    }
}

/// The string `module@submodule` used to index the command and event tables.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleKey(String);

impl ModuleKey {
    /// The wildcard key used by the simple-model single-executor flag.
    pub const WILDCARD: &'static str = "*";

    pub fn new(module: impl AsRef<str>, submodule: impl AsRef<str>) -> Self {
        Self(format!("{}@{}", module.as_ref(), submodule.as_ref()))
    }

    pub fn wildcard() -> Self {
        Self(Self::WILDCARD.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModuleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ModuleKey {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Errors raised constructing or decoding an envelope that violates the
/// schema's non-empty-field invariants.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EnvelopeError {
    #[error("module must not be empty")]
    EmptyModule,
    #[error("submodule must not be empty")]
    EmptySubmodule,
    #[error("command must not be empty")]
    EmptyCommand,
    #[error("event must not be empty")]
    EmptyEvent,
}

/// The canonical decoded message record used by the core. `Shutdown` is an
/// internal-only discriminator (`msgtype=999`) never constructed from user
/// input paths other than the wire codec.
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope {
    Command {
        msgid: String,
        module: String,
        submodule: String,
        command: String,
        data: Params,
        options: std::collections::HashMap<String, String>,
    },
    Event {
        msgid: String,
        module: String,
        submodule: String,
        event: String,
        data: Params,
        options: std::collections::HashMap<String, String>,
    },
    Shutdown { msgid: String },
}

impl Envelope {
    /// Build an outbound command envelope, mirroring
    /// `AbstractMessage.create_message(module, submodule, command, *args, **kwargs)`.
    pub fn new_command(
        gen: &dyn IdGen,
        module: impl Into<String>,
        submodule: impl Into<String>,
        command: impl Into<String>,
        data: Params,
    ) -> Result<Self, EnvelopeError> {
        let module = module.into();
        let submodule = submodule.into();
        let command = command.into();
        if module.is_empty() {
            return Err(EnvelopeError::EmptyModule);
        }
        if submodule.is_empty() {
            return Err(EnvelopeError::EmptySubmodule);
        }
        if command.is_empty() {
            return Err(EnvelopeError::EmptyCommand);
        }
        Ok(Envelope::Command {
            msgid: gen.next_id(),
            module,
            submodule,
            command,
            data,
            options: Default::default(),
        })
    }

    /// Build an outbound event envelope.
    pub fn new_event(
        gen: &dyn IdGen,
        module: impl Into<String>,
        submodule: impl Into<String>,
        event: impl Into<String>,
        data: Params,
    ) -> Result<Self, EnvelopeError> {
        let module = module.into();
        let submodule = submodule.into();
        let event = event.into();
        if module.is_empty() {
            return Err(EnvelopeError::EmptyModule);
        }
        if submodule.is_empty() {
            return Err(EnvelopeError::EmptySubmodule);
        }
        if event.is_empty() {
            return Err(EnvelopeError::EmptyEvent);
        }
        Ok(Envelope::Event {
            msgid: gen.next_id(),
            module,
            submodule,
            event,
            data,
            options: Default::default(),
        })
    }

    pub fn new_shutdown(gen: &dyn IdGen) -> Self {
        Envelope::Shutdown { msgid: gen.next_id() }
    }

    pub fn msgid(&self) -> &str {
        match self {
            Envelope::Command { msgid, .. } => msgid,
            Envelope::Event { msgid, .. } => msgid,
            Envelope::Shutdown { msgid } => msgid,
        }
    }

    pub fn module_key(&self) -> Option<ModuleKey> {
        match self {
            Envelope::Command { module, submodule, .. } => Some(ModuleKey::new(module, submodule)),
            Envelope::Event { module, submodule, .. } => Some(ModuleKey::new(module, submodule)),
            Envelope::Shutdown { .. } => None,
        }
    }

    pub fn is_shutdown(&self) -> bool {
        matches!(self, Envelope::Shutdown { .. })
    }
}

#[cfg(test)]
#[path = "envelope_tests.rs"]
mod tests;
