// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire-protocol transport drivers: one module per supported broker, all
//! implementing the [`base::TransportDriver`] contract.

pub mod adapter;
pub mod amqp;
pub mod base;
pub mod kafka;
pub mod mqtt;
pub mod redis;
pub mod stomp;
pub mod tcp;
pub mod unix;

pub use adapter::{resolve_adapter, AdapterError, AdapterSink, Base64JsonDecodeAdapter, TransportAdapter};
pub use amqp::AmqpTransport;
pub use base::{run_with_retry, TransportDriver, TransportError, TransportParams};
pub use kafka::KafkaTransport;
pub use mqtt::MqttTransport;
pub use redis::RedisTransport;
pub use stomp::StompTransport;
pub use tcp::TcpLocalTransport;
pub use unix::UnixTransport;
