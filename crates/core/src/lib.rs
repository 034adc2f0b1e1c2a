// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! bridge-core: canonical envelope, codec, ids and configuration types shared
//! by every other crate in the integration bridge daemon.

pub mod codec;
pub mod config;
pub mod envelope;
pub mod id;
pub mod sink;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use codec::CodecError;
pub use config::{Config, ModuleConfig, RedisConfig, ShutdownConfig, TransportConfig, TransportKind};
pub use envelope::{Envelope, EnvelopeError, ModuleKey, Params};
pub use id::{FixedIdGen, IdGen, UuidIdGen};
pub use sink::PayloadSink;
