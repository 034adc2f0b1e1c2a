// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon configuration, loaded from a TOML file into this typed shape
//! rather than kept as a flat `mq.transport.{i}.*` string map. The dotted
//! keys from the external interface are the *wire contract* for
//! locating a value, not a mandate for the in-memory representation.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Top-level daemon configuration, deserialized from `bridge.toml` (or the
/// path named by `--config` / `BRIDGE_CONFIG`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub shutdown: ShutdownConfig,
    /// `production.mode`: `true` selects the subprocess executor.
    pub production_mode: bool,
    /// `bridge.enabled`: master gate for the message-dispatch core.
    pub bridge_enabled: bool,
    /// Collapses per-module executors into a single wildcard executor.
    pub simple_model: bool,
    pub redis: Option<RedisConfig>,
    /// `mq.transport.{i}.*`, one entry per configured driver.
    pub transports: Vec<TransportConfig>,
    /// Path to the flat `M@S = fully.qualified.HandlerClass` command table.
    pub command_registry_path: Option<PathBuf>,
    /// Path to the sectioned `[M@S]` event table.
    pub event_registry_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            shutdown: ShutdownConfig::default(),
            production_mode: false,
            bridge_enabled: true,
            simple_model: false,
            redis: None,
            transports: Vec::new(),
            command_registry_path: None,
            event_registry_path: None,
        }
    }
}

impl Config {
    /// Parse a `Config` from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShutdownConfig {
    pub addr: String,
    pub port: u16,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self { addr: "127.0.0.1".to_string(), port: 9999 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    pub enabled: bool,
    pub url: String,
}

/// Process-wide module configuration, injected into every handler's
/// `configure` hook alongside the process [`Config`] and the per-class
/// `parent` record. No loader populates it yet — the type and the
/// injection point are modeled as a hook, same as [`RedisConfig`]'s
/// provider component.
#[derive(Debug, Clone, Default)]
pub struct ModuleConfig(std::collections::HashMap<String, toml::Value>);

impl ModuleConfig {
    pub fn get(&self, key: &str) -> Option<&toml::Value> {
        self.0.get(key)
    }
}

/// `mq.transport.{i}.type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    Unix,
    Local,
    Stomp,
    Mqtt,
    Amqp,
    Redis,
    Kafka,
}

/// One `mq.transport.{i}.*` driver configuration block.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    #[serde(rename = "type")]
    pub kind: TransportKind,
    pub address: Option<String>,
    pub port: Option<u16>,
    pub user: Option<String>,
    pub passwd: Option<String>,
    pub channel: Option<String>,
    pub clientid: Option<String>,
    pub heartbeat: Option<u64>,
    pub exchange: Option<String>,
    #[serde(rename = "adapter.class")]
    pub adapter_class: Option<String>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            kind: TransportKind::Unix,
            address: None,
            port: None,
            user: None,
            passwd: None,
            channel: None,
            clientid: None,
            heartbeat: None,
            exchange: None,
            adapter_class: None,
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
