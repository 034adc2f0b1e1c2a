// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Test doubles exported to other crates' test suites behind the
//! `test-support` feature.

use std::sync::Arc;

use async_trait::async_trait;
use bridge_core::Envelope;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use crate::transport::{AdapterSink, TransportDriver, TransportError};

/// A transport driver double that records every envelope it is asked to
/// publish and feeds a fixed set of already-decoded payloads to its sink the
/// first time `do_listen` runs, then blocks until cancelled.
#[derive(Default)]
pub struct FakeTransport {
    published: Mutex<Vec<Envelope>>,
    inbound: Mutex<Vec<Vec<u8>>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_inbound(payloads: Vec<Vec<u8>>) -> Self {
        Self { published: Mutex::new(Vec::new()), inbound: Mutex::new(payloads) }
    }

    pub fn published(&self) -> Vec<Envelope> {
        self.published.lock().clone()
    }
}

#[async_trait]
impl TransportDriver for FakeTransport {
    fn name(&self) -> &str {
        "fake"
    }

    async fn connect(&self) -> Result<(), TransportError> {
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), TransportError> {
        Ok(())
    }

    async fn publish(&self, envelope: &Envelope) -> Result<(), TransportError> {
        self.published.lock().push(envelope.clone());
        Ok(())
    }

    async fn do_listen(&self, sink: Arc<AdapterSink>, cancel: CancellationToken) -> Result<(), TransportError> {
        for payload in self.inbound.lock().drain(..) {
            sink.accept(&payload);
        }
        cancel.cancelled().await;
        Ok(())
    }
}
