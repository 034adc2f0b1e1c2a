// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! bridge-adapters: wire-protocol transport drivers and the adapter layer
//! that sits between them and the queue-pool.

pub mod transport;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use transport::{
    resolve_adapter, AdapterError, AdapterSink, AmqpTransport, Base64JsonDecodeAdapter, KafkaTransport,
    MqttTransport, RedisTransport, StompTransport, TcpLocalTransport, TransportAdapter, TransportDriver,
    TransportError, TransportParams, UnixTransport,
};
