// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Kafka transport driver via `rdkafka`.
//!
//! `channel` is `topic` or `topic,group_id`; when no group id is given the
//! client id doubles as the consumer group. SASL/PLAIN is configured
//! whenever credentials are present, otherwise the consumer connects
//! anonymously. The poll loop idles 200 ms between empty polls, matching the
//! original driver's `consumer.poll(timeout=0.2)` cadence.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bridge_core::{codec, Envelope};
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::message::Message;
use rdkafka::producer::{FutureProducer, FutureRecord};
use tokio::sync::Mutex as AsyncMutex;
use tokio_util::sync::CancellationToken;

use super::adapter::AdapterSink;
use super::base::{TransportDriver, TransportError, TransportParams};

const POLL_IDLE: Duration = Duration::from_millis(200);
const PRODUCE_TIMEOUT: Duration = Duration::from_secs(5);

fn split_channel(channel: &str) -> (&str, Option<&str>) {
    match channel.split_once(',') {
        Some((topic, group)) => (topic, Some(group)),
        None => (channel, None),
    }
}

pub struct KafkaTransport {
    params: TransportParams,
    consumer: AsyncMutex<Option<StreamConsumer>>,
    producer: AsyncMutex<Option<FutureProducer>>,
}

impl KafkaTransport {
    pub fn new(params: TransportParams) -> Self {
        Self { params, consumer: AsyncMutex::new(None), producer: AsyncMutex::new(None) }
    }

    fn bootstrap_servers(&self) -> String {
        format!("{}:{}", self.params.address, self.params.port)
    }

    fn base_client_config(&self) -> ClientConfig {
        let mut config = ClientConfig::new();
        config.set("bootstrap.servers", self.bootstrap_servers());
        if let (Some(user), Some(pass)) = (&self.params.user, &self.params.password) {
            config.set("security.protocol", "SASL_PLAINTEXT");
            config.set("sasl.mechanisms", "PLAIN");
            config.set("sasl.username", user);
            config.set("sasl.password", pass);
        }
        config
    }
}

#[async_trait]
impl TransportDriver for KafkaTransport {
    fn name(&self) -> &str {
        "kafka"
    }

    async fn connect(&self) -> Result<(), TransportError> {
        let (topic, group) = split_channel(&self.params.channel);
        let group_id = group.unwrap_or(&self.params.client_id);

        let mut consumer_config = self.base_client_config();
        consumer_config.set("group.id", group_id).set("enable.auto.commit", "true");
        let consumer: StreamConsumer =
            consumer_config.create().map_err(|e| TransportError::Connect(e.to_string()))?;
        consumer.subscribe(&[topic]).map_err(|e| TransportError::Broker(e.to_string()))?;

        let producer: FutureProducer =
            self.base_client_config().create().map_err(|e| TransportError::Connect(e.to_string()))?;

        *self.consumer.lock().await = Some(consumer);
        *self.producer.lock().await = Some(producer);
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), TransportError> {
        self.consumer.lock().await.take();
        self.producer.lock().await.take();
        Ok(())
    }

    async fn publish(&self, envelope: &Envelope) -> Result<(), TransportError> {
        let guard = self.producer.lock().await;
        let producer =
            guard.as_ref().ok_or_else(|| TransportError::Config("kafka transport not connected".to_string()))?;
        let (topic, _) = split_channel(&self.params.channel);
        let payload = codec::encode(envelope);
        let record: FutureRecord<'_, str, str> = FutureRecord::to(topic).payload(&payload);
        producer.send(record, PRODUCE_TIMEOUT).await.map_err(|(err, _)| TransportError::Publish(err.to_string()))?;
        Ok(())
    }

    async fn do_listen(&self, sink: Arc<AdapterSink>, cancel: CancellationToken) -> Result<(), TransportError> {
        let guard = self.consumer.lock().await;
        let consumer =
            guard.as_ref().ok_or_else(|| TransportError::Config("kafka transport not connected".to_string()))?;

        loop {
            tokio::select! {
                message = consumer.recv() => {
                    match message {
                        Ok(borrowed) => {
                            if let Some(payload) = borrowed.payload() {
                                sink.accept(payload);
                            }
                        }
                        Err(err) => return Err(TransportError::Broker(err.to_string())),
                    }
                }
                _ = tokio::time::sleep(POLL_IDLE) => {}
                _ = cancel.cancelled() => return Ok(()),
            }
        }
    }
}

#[cfg(test)]
#[path = "kafka_tests.rs"]
mod tests;
