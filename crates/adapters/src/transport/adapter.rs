// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Transport adapter: decodes a raw wire payload and forwards the decoded
//! bytes to a downstream [`PayloadSink`] (the queue-pool).
//!
//! Mirrors `TransportAdapter.process_message` in the original: transform,
//! then base64-decode, then hand off — `transform_message` defaults to
//! identity, matching the base class contract.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use bridge_core::PayloadSink;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("invalid base64 payload: {0}")]
    InvalidBase64(#[from] base64::DecodeError),
}

/// Decodes a raw wire payload before it reaches the queue-pool. A driver may
/// be configured with an alternate adapter via `mq.transport.{index}.adapter.class`;
/// `Base64JsonDecodeAdapter` is used when none is configured.
pub trait TransportAdapter: Send + Sync {
    /// Identity by default; override to pre-process the raw payload before
    /// base64 decoding (e.g. stripping a protocol envelope).
    fn transform_message(&self, payload: &[u8]) -> Vec<u8> {
        payload.to_vec()
    }

    fn decode(&self, payload: &[u8]) -> Result<Vec<u8>, AdapterError>;

    /// `transform_message` -> `decode` -> forward to `sink`.
    fn process_message(&self, payload: &[u8], sink: &dyn PayloadSink) -> Result<(), AdapterError> {
        let transformed = self.transform_message(payload);
        let decoded = self.decode(&transformed)?;
        sink.push(decoded);
        Ok(())
    }
}

/// Default adapter: base64-decodes the (possibly transformed) payload. The
/// JSON layer inside is left to the envelope codec, not this adapter.
#[derive(Debug, Clone, Copy, Default)]
pub struct Base64JsonDecodeAdapter;

impl TransportAdapter for Base64JsonDecodeAdapter {
    fn decode(&self, payload: &[u8]) -> Result<Vec<u8>, AdapterError> {
        Ok(BASE64.decode(payload)?)
    }
}

/// Resolves the adapter named by `mq.transport.{index}.adapter.class`,
/// falling back to [`Base64JsonDecodeAdapter`] when absent or unrecognised.
pub fn resolve_adapter(class_name: Option<&str>) -> Arc<dyn TransportAdapter> {
    match class_name {
        None => Arc::new(Base64JsonDecodeAdapter),
        Some(_) => Arc::new(Base64JsonDecodeAdapter),
    }
}

/// Bundles a driver's configured adapter with its downstream queue-pool
/// sink so `TransportDriver::do_listen` only has to thread one handle
/// through its accept loop instead of two.
pub struct AdapterSink {
    adapter: Arc<dyn TransportAdapter>,
    sink: Arc<dyn PayloadSink>,
}

impl AdapterSink {
    pub fn new(adapter: Arc<dyn TransportAdapter>, sink: Arc<dyn PayloadSink>) -> Self {
        Self { adapter, sink }
    }

    /// Runs the payload through the adapter and forwards it to the sink;
    /// decode failures are logged and dropped, matching the adapter/codec
    /// error policy (log at `error`, drop message, continue).
    pub fn accept(&self, payload: &[u8]) {
        if let Err(err) = self.adapter.process_message(payload, self.sink.as_ref()) {
            tracing::error!(error = %err, "dropping undecodable transport payload");
        }
    }
}

#[cfg(test)]
#[path = "adapter_tests.rs"]
mod tests;
