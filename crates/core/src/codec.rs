// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Base64-over-JSON wire codec for [`Envelope`].
//!
//! The wire form is a UTF-8 JSON object, base64-encoded. `msgtype` selects
//! the variant: `0` command, `1` event, `999` the internal shutdown marker.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::envelope::{Envelope, Params};
use crate::id::IdGen;

const MSGTYPE_COMMAND: u64 = 0;
const MSGTYPE_EVENT: u64 = 1;
const MSGTYPE_SHUTDOWN: u64 = 999;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("invalid base64: {0}")]
    InvalidBase64(#[from] base64::DecodeError),
    #[error("invalid UTF-8 payload: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("unknown msgtype {0}")]
    UnknownMsgtype(u64),
    #[error("missing required field {0}")]
    MissingField(&'static str),
}

#[derive(Debug, Serialize, Deserialize)]
struct WireEnvelope {
    msgtype: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    msgid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    module: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    submodule: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    command: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    event: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data: Option<Params>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    options: Option<std::collections::HashMap<String, String>>,
}

/// Serialize an envelope to JSON then base64, as ASCII text (the wire form
/// is always UTF-8-safe since it's base64).
pub fn encode(envelope: &Envelope) -> String {
    let wire = match envelope {
        Envelope::Command { msgid, module, submodule, command, data, options } => WireEnvelope {
            msgtype: MSGTYPE_COMMAND,
            msgid: Some(msgid.clone()),
            module: Some(module.clone()),
            submodule: Some(submodule.clone()),
            command: Some(command.clone()),
            event: None,
            data: Some(data.clone()),
            options: Some(options.clone()),
        },
        Envelope::Event { msgid, module, submodule, event, data, options } => WireEnvelope {
            msgtype: MSGTYPE_EVENT,
            msgid: Some(msgid.clone()),
            module: Some(module.clone()),
            submodule: Some(submodule.clone()),
            command: None,
            event: Some(event.clone()),
            data: Some(data.clone()),
            options: Some(options.clone()),
        },
        Envelope::Shutdown { msgid } => WireEnvelope {
            msgtype: MSGTYPE_SHUTDOWN,
            msgid: Some(msgid.clone()),
            module: None,
            submodule: None,
            command: None,
            event: None,
            data: None,
            options: None,
        },
    };
    // Serialization of a well-formed WireEnvelope to JSON never fails.
    let json = serde_json::to_vec(&wire).unwrap_or_default();
    BASE64.encode(json)
}

/// Decode a base64-over-JSON payload into an [`Envelope`], accepting either
/// raw bytes or text (the original accepts both representations
/// interchangeably). A missing `msgid` is filled via `gen`; a missing
/// `options` map becomes empty.
pub fn decode(payload: &[u8], gen: &dyn IdGen) -> Result<Envelope, CodecError> {
    let text = std::str::from_utf8(payload)?;
    let json = BASE64.decode(text.trim())?;
    decode_json(&json, gen)
}

/// The JSON-parsing half of [`decode`], without the base64 layer. Used
/// downstream of a transport adapter, which already strips the base64 layer
/// itself before handing raw JSON bytes to the queue-pool.
pub fn decode_json(json: &[u8], gen: &dyn IdGen) -> Result<Envelope, CodecError> {
    let wire: WireEnvelope = serde_json::from_slice(json)?;
    let msgid = wire.msgid.unwrap_or_else(|| gen.next_id());
    let options = wire.options.unwrap_or_default();

    match wire.msgtype {
        MSGTYPE_COMMAND => Ok(Envelope::Command {
            msgid,
            module: wire.module.ok_or(CodecError::MissingField("module"))?,
            submodule: wire.submodule.ok_or(CodecError::MissingField("submodule"))?,
            command: wire.command.ok_or(CodecError::MissingField("command"))?,
            data: wire.data.unwrap_or_default(),
            options,
        }),
        MSGTYPE_EVENT => Ok(Envelope::Event {
            msgid,
            module: wire.module.ok_or(CodecError::MissingField("module"))?,
            submodule: wire.submodule.ok_or(CodecError::MissingField("submodule"))?,
            event: wire.event.ok_or(CodecError::MissingField("event"))?,
            data: wire.data.unwrap_or_default(),
            options,
        }),
        MSGTYPE_SHUTDOWN => Ok(Envelope::Shutdown { msgid }),
        other => Err(CodecError::UnknownMsgtype(other)),
    }
}

/// Convenience wrapper for decoding an already-UTF-8 `&str` payload.
pub fn decode_str(payload: &str, gen: &dyn IdGen) -> Result<Envelope, CodecError> {
    decode(payload.as_bytes(), gen)
}

#[cfg(test)]
#[path = "codec_tests.rs"]
mod tests;
