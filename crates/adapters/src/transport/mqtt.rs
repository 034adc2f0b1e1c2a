// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! MQTT transport driver via `rumqttc`.
//!
//! Each driver instance carries its own unique client-id (defaulted in
//! [`super::base::TransportParams::from_config`] when unset) so that two
//! configured MQTT transports never collide on the broker. Subscribes to
//! `channel` as soon as the client reports `ConnAck`; incoming publishes are
//! handed to the sink as-is (the adapter layer performs the base64 decode).

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bridge_core::{codec, Envelope};
use rumqttc::{AsyncClient, ConnectionError, Event, MqttOptions, Packet, QoS};
use tokio::sync::Mutex as AsyncMutex;
use tokio_util::sync::CancellationToken;

use super::adapter::AdapterSink;
use super::base::{TransportDriver, TransportError, TransportParams};

const DEFAULT_KEEP_ALIVE: Duration = Duration::from_secs(20);

pub struct MqttTransport {
    params: TransportParams,
    client: AsyncMutex<Option<AsyncClient>>,
    eventloop: parking_lot::Mutex<Option<rumqttc::EventLoop>>,
}

impl MqttTransport {
    pub fn new(params: TransportParams) -> Self {
        Self { params, client: AsyncMutex::new(None), eventloop: parking_lot::Mutex::new(None) }
    }

    fn mqtt_options(&self) -> MqttOptions {
        let mut opts = MqttOptions::new(self.params.client_id.clone(), self.params.address.clone(), self.params.port);
        opts.set_keep_alive(self.params.heartbeat.unwrap_or(DEFAULT_KEEP_ALIVE));
        if let (Some(user), Some(pass)) = (&self.params.user, &self.params.password) {
            opts.set_credentials(user.clone(), pass.clone());
        }
        opts
    }
}

#[async_trait]
impl TransportDriver for MqttTransport {
    fn name(&self) -> &str {
        "mqtt"
    }

    async fn connect(&self) -> Result<(), TransportError> {
        let (client, mut eventloop) = AsyncClient::new(self.mqtt_options(), 64);
        // Drive the eventloop once to establish the TCP connection and
        // receive the broker's ConnAck before handing the client back.
        loop {
            match eventloop.poll().await {
                Ok(Event::Incoming(Packet::ConnAck(_))) => break,
                Ok(_) => continue,
                Err(err) => return Err(TransportError::Connect(err.to_string())),
            }
        }
        client
            .subscribe(&self.params.channel, QoS::AtLeastOnce)
            .await
            .map_err(|e| TransportError::Broker(e.to_string()))?;
        // The eventloop must keep being polled for the connection to stay
        // alive; `do_listen` owns that going forward via a fresh client pull.
        *self.client.lock().await = Some(client);
        self.eventloop_slot().replace(eventloop);
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), TransportError> {
        if let Some(client) = self.client.lock().await.take() {
            if let Err(err) = client.unsubscribe(&self.params.channel).await {
                tracing::error!(transport = "mqtt", error = %err, "failed to unsubscribe on disconnect");
            }
            if let Err(err) = client.disconnect().await {
                tracing::error!(transport = "mqtt", error = %err, "failed to disconnect cleanly");
            }
        }
        self.eventloop_slot().take();
        Ok(())
    }

    async fn publish(&self, envelope: &Envelope) -> Result<(), TransportError> {
        let guard = self.client.lock().await;
        let client =
            guard.as_ref().ok_or_else(|| TransportError::Config("mqtt transport not connected".to_string()))?;
        let payload = codec::encode(envelope);
        client
            .publish(&self.params.channel, QoS::AtLeastOnce, false, payload.into_bytes())
            .await
            .map_err(|e| TransportError::Publish(e.to_string()))?;
        Ok(())
    }

    async fn do_listen(&self, sink: Arc<AdapterSink>, cancel: CancellationToken) -> Result<(), TransportError> {
        let mut eventloop = self
            .eventloop_slot()
            .take()
            .ok_or_else(|| TransportError::Config("mqtt transport not connected".to_string()))?;
        loop {
            tokio::select! {
                polled = eventloop.poll() => {
                    match polled {
                        Ok(Event::Incoming(Packet::Publish(publish))) => {
                            sink.accept(&publish.payload);
                        }
                        Ok(_) => {}
                        Err(ConnectionError::NetworkTimeout) => {}
                        Err(err) => return Err(TransportError::Broker(err.to_string())),
                    }
                }
                _ = cancel.cancelled() => {
                    self.eventloop_slot().replace(eventloop);
                    return Ok(());
                }
            }
        }
    }
}

impl MqttTransport {
    /// Scratch slot for the `EventLoop` between `connect()` and `do_listen()`.
    /// `rumqttc`'s `EventLoop` is `!Sync`, so it cannot live behind the same
    /// `AsyncMutex` as `AsyncClient`; a `parking_lot::Mutex<Option<_>>` on an
    /// owned value, swapped in and out, keeps it off the shared-reference
    /// path entirely.
    fn eventloop_slot(&self) -> parking_lot::MutexGuard<'_, Option<rumqttc::EventLoop>> {
        self.eventloop.lock()
    }
}

#[cfg(test)]
#[path = "mqtt_tests.rs"]
mod tests;
