// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A shared object provider a supervisor can configure and stop alongside
//! transports. Mirrors the source's `RedisProvider`/`MinioProvider` hook
//! shape (`do_configure`/`do_stop`, a `service_enabled` gate) without
//! carrying a real client: it exists so `redis.enabled`/`redis.url` have
//! somewhere to land, not to hand out connections.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use bridge_core::RedisConfig;

use super::component::{LifecycleComponent, LifecycleError, LifecycleRecord};

/// No-op stand-in for a pooled Redis client. `do_configure` asserts the
/// same precondition the source does (a non-empty URL when the service is
/// enabled) and records it; nothing ever connects.
pub struct RedisProvider {
    record: LifecycleRecord,
    config: RedisConfig,
    configured_url: Mutex<Option<String>>,
}

impl RedisProvider {
    pub fn new(config: RedisConfig) -> Arc<Self> {
        Arc::new(Self { record: LifecycleRecord::new(), config, configured_url: Mutex::new(None) })
    }

    pub fn service_enabled(&self) -> bool {
        self.config.enabled
    }

    /// The URL recorded at `do_configure` time, once past `Configured`.
    pub fn configured_url(&self) -> Option<String> {
        self.configured_url.lock().clone()
    }
}

#[async_trait]
impl LifecycleComponent for RedisProvider {
    fn name(&self) -> &str {
        "redis-provider"
    }

    fn record(&self) -> &LifecycleRecord {
        &self.record
    }

    async fn do_configure(self: Arc<Self>) -> Result<(), LifecycleError> {
        if !self.config.enabled {
            return Ok(());
        }
        if self.config.url.is_empty() {
            return Err(LifecycleError::Other("redis URL is not provided, could not configure".to_string()));
        }
        *self.configured_url.lock() = Some(self.config.url.clone());
        Ok(())
    }

    async fn do_stop(self: Arc<Self>) -> Result<(), LifecycleError> {
        self.configured_url.lock().take();
        Ok(())
    }
}

#[cfg(test)]
#[path = "provider_tests.rs"]
mod tests;
