// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The transport driver contract every wire-protocol driver implements, and
//! the shared constant-backoff retry loop around it.
//!
//! The original drives `do_listen()` from a dedicated OS thread owned by
//! `do_start()`, re-entering it on every return or exception while the
//! component `is_running()`, sleeping 5 s between attempts. Here `do_listen`
//! is reframed as a single async attempt and `run_with_retry` owns the
//! retry/backoff/cancellation loop around it, driven by a `CancellationToken`
//! instead of an `is_running()` poll.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bridge_core::{Envelope, TransportConfig};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use super::adapter::AdapterSink;

/// Constant retry backoff between failed/returned `do_listen` attempts.
pub const RETRY_BACKOFF: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("connect failed: {0}")]
    Connect(String),
    #[error("publish failed: {0}")]
    Publish(String),
    #[error("codec error: {0}")]
    Codec(#[from] bridge_core::CodecError),
    #[error("transport not configured: {0}")]
    Config(String),
    #[error("broker error: {0}")]
    Broker(String),
}

/// The six transport-parameter slots read from `mq.transport.{index}.*`,
/// plus the optional heartbeat.
#[derive(Debug, Clone)]
pub struct TransportParams {
    pub index: usize,
    pub address: String,
    pub port: u16,
    pub user: Option<String>,
    pub password: Option<String>,
    pub channel: String,
    pub client_id: String,
    pub heartbeat: Option<Duration>,
    pub exchange: Option<String>,
}

impl TransportParams {
    pub fn from_config(index: usize, cfg: &TransportConfig) -> Self {
        Self {
            index,
            address: cfg.address.clone().unwrap_or_else(|| "localhost".to_string()),
            port: cfg.port.unwrap_or(0),
            user: cfg.user.clone(),
            password: cfg.passwd.clone(),
            channel: cfg.channel.clone().unwrap_or_default(),
            client_id: cfg
                .clientid
                .clone()
                .unwrap_or_else(|| format!("bridge-{}-{:x}", index, uuid::Uuid::new_v4().as_u128())),
            heartbeat: cfg.heartbeat.map(Duration::from_millis),
            exchange: cfg.exchange.clone(),
        }
    }
}

/// Common contract every wire-protocol driver implements. `do_listen` is one
/// connect-and-drain attempt; `run` is the supervised retry loop a
/// `Supervisor` child actually starts.
#[async_trait]
pub trait TransportDriver: Send + Sync {
    fn name(&self) -> &str;

    async fn connect(&self) -> Result<(), TransportError>;

    async fn disconnect(&self) -> Result<(), TransportError>;

    async fn publish(&self, envelope: &Envelope) -> Result<(), TransportError>;

    /// The daemon's loopback send-to-self path; only meaningful for local
    /// transports, but every driver implements the same signature so the
    /// supervisor can treat them uniformly.
    async fn notify_server(&self, envelope: &Envelope) -> Result<(), TransportError> {
        self.publish(envelope).await
    }

    /// One connect-subscribe-drain attempt. Returns when the connection
    /// drops or is cancelled; `run_with_retry` decides whether to retry.
    /// Raw payloads are handed to `sink`, which runs the configured adapter
    /// and forwards the decoded bytes to the queue-pool; the reserved
    /// `shut` control line bypasses the adapter entirely.
    async fn do_listen(
        &self,
        sink: Arc<AdapterSink>,
        cancel: CancellationToken,
    ) -> Result<(), TransportError>;

    /// The supervised loop a running driver actually executes. Default
    /// implementation delegates to [`run_with_retry`]; drivers override only
    /// if they need a different retry policy.
    async fn run(self: Arc<Self>, sink: Arc<AdapterSink>, cancel: CancellationToken) {
        run_with_retry(self, sink, cancel).await
    }
}

/// Calls `driver.do_listen()` repeatedly, sleeping [`RETRY_BACKOFF`] between
/// attempts, until `cancel` fires. Every driver's `run` shares this loop
/// instead of reimplementing constant-backoff retry itself.
pub async fn run_with_retry(
    driver: Arc<dyn TransportDriver>,
    sink: Arc<AdapterSink>,
    cancel: CancellationToken,
) {
    while !cancel.is_cancelled() {
        match driver.do_listen(sink.clone(), cancel.clone()).await {
            Ok(()) => {}
            Err(err) => {
                tracing::error!(transport = driver.name(), error = %err, "transport listener error, retrying");
            }
        }
        if cancel.is_cancelled() {
            break;
        }
        tokio::select! {
            _ = tokio::time::sleep(RETRY_BACKOFF) => {}
            _ = cancel.cancelled() => break,
        }
    }
}

#[cfg(test)]
#[path = "base_tests.rs"]
mod tests;
