// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! AMQP transport driver via `lapin`.
//!
//! Policy fixed by the wire-protocol contract: `durable=true, auto_delete=true,
//! exchange type=direct`. Consumes with manual acknowledgement, acking only
//! after the payload has been successfully handed to the sink. Heartbeat
//! 10 s, read-timeout 2 s, inner poll loop re-checks cancellation every
//! 400 ms (there is no blocking read to interrupt directly; the consumer
//! stream is raced against the cancellation token on that cadence).

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bridge_core::{codec, Envelope};
use futures_util::StreamExt;
use lapin::options::{
    BasicAckOptions, BasicConsumeOptions, BasicPublishOptions, ExchangeDeclareOptions, QueueBindOptions,
    QueueDeclareOptions,
};
use lapin::types::FieldTable;
use lapin::{BasicProperties, Channel, Connection, ConnectionProperties, ExchangeKind};
use tokio::sync::Mutex as AsyncMutex;
use tokio_util::sync::CancellationToken;

use super::adapter::AdapterSink;
use super::base::{TransportDriver, TransportError, TransportParams};

const HEARTBEAT_SECS: u16 = 10;
const POLL_INTERVAL: Duration = Duration::from_millis(400);

pub struct AmqpTransport {
    params: TransportParams,
    channel: AsyncMutex<Option<Channel>>,
}

impl AmqpTransport {
    pub fn new(params: TransportParams) -> Self {
        Self { params, channel: AsyncMutex::new(None) }
    }

    fn exchange_name(&self) -> String {
        self.params.exchange.clone().unwrap_or_else(|| self.params.channel.clone())
    }

    fn amqp_uri(&self) -> String {
        match (&self.params.user, &self.params.password) {
            (Some(user), Some(pass)) => {
                format!(
                    "amqp://{}:{}@{}:{}/%2f?heartbeat={}",
                    user, pass, self.params.address, self.params.port, HEARTBEAT_SECS
                )
            }
            _ => format!("amqp://{}:{}/%2f?heartbeat={}", self.params.address, self.params.port, HEARTBEAT_SECS),
        }
    }
}

#[async_trait]
impl TransportDriver for AmqpTransport {
    fn name(&self) -> &str {
        "amqp"
    }

    async fn connect(&self) -> Result<(), TransportError> {
        let props = ConnectionProperties::default().with_connection_name(self.params.client_id.clone().into());
        let conn = Connection::connect(&self.amqp_uri(), props)
            .await
            .map_err(|e| TransportError::Connect(e.to_string()))?;
        let channel = conn.create_channel().await.map_err(|e| TransportError::Connect(e.to_string()))?;

        channel
            .exchange_declare(
                &self.exchange_name(),
                ExchangeKind::Direct,
                ExchangeDeclareOptions { durable: true, auto_delete: true, ..Default::default() },
                FieldTable::default(),
            )
            .await
            .map_err(|e| TransportError::Broker(e.to_string()))?;

        channel
            .queue_declare(
                &self.params.channel,
                QueueDeclareOptions { durable: true, auto_delete: true, ..Default::default() },
                FieldTable::default(),
            )
            .await
            .map_err(|e| TransportError::Broker(e.to_string()))?;

        channel
            .queue_bind(
                &self.params.channel,
                &self.exchange_name(),
                &self.params.channel,
                QueueBindOptions::default(),
                FieldTable::default(),
            )
            .await
            .map_err(|e| TransportError::Broker(e.to_string()))?;

        *self.channel.lock().await = Some(channel);
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), TransportError> {
        if let Some(channel) = self.channel.lock().await.take() {
            channel.close(200, "bye").await.map_err(|e| TransportError::Broker(e.to_string()))?;
        }
        Ok(())
    }

    async fn publish(&self, envelope: &Envelope) -> Result<(), TransportError> {
        let guard = self.channel.lock().await;
        let channel =
            guard.as_ref().ok_or_else(|| TransportError::Config("amqp transport not connected".to_string()))?;
        let payload = codec::encode(envelope);
        channel
            .basic_publish(
                &self.exchange_name(),
                &self.params.channel,
                BasicPublishOptions::default(),
                payload.as_bytes(),
                BasicProperties::default(),
            )
            .await
            .map_err(|e| TransportError::Publish(e.to_string()))?;
        Ok(())
    }

    async fn do_listen(&self, sink: Arc<AdapterSink>, cancel: CancellationToken) -> Result<(), TransportError> {
        let channel = {
            let guard = self.channel.lock().await;
            guard.as_ref().ok_or_else(|| TransportError::Config("amqp transport not connected".to_string()))?.clone()
        };
        let mut consumer = channel
            .basic_consume(
                &self.params.channel,
                &self.params.client_id,
                BasicConsumeOptions::default(),
                FieldTable::default(),
            )
            .await
            .map_err(|e| TransportError::Broker(e.to_string()))?;

        loop {
            tokio::select! {
                next = consumer.next() => {
                    let Some(delivery) = next else { return Ok(()) };
                    let delivery = delivery.map_err(|e| TransportError::Broker(e.to_string()))?;
                    sink.accept(&delivery.data);
                    delivery
                        .ack(BasicAckOptions::default())
                        .await
                        .map_err(|e| TransportError::Broker(e.to_string()))?;
                }
                _ = tokio::time::sleep(POLL_INTERVAL) => {}
                _ = cancel.cancelled() => return Ok(()),
            }
        }
    }
}

#[cfg(test)]
#[path = "amqp_tests.rs"]
mod tests;
