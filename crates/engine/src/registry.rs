// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Command/event registry tables and the static handler registry that
//! resolves a fully-qualified class name to a concrete [`Handler`].
//!
//! Loaded once at configure time and frozen thereafter: `CommandTable`/
//! `EventTable` are plain immutable maps once built, so mutating the
//! *source* file after `configure` has no effect on an already-running
//! daemon.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use bridge_core::{Config, Envelope, ModuleConfig, ModuleKey};
use parking_lot::Mutex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("malformed command entry on line {0}: {1}")]
    MalformedCommandLine(usize, String),
    #[error("event entry outside any [module@submodule] section on line {0}")]
    EventOutsideSection(usize),
    #[error("malformed event entry on line {0}: {1}")]
    MalformedEventLine(usize, String),
    #[error("malformed handler pair {0:?}")]
    MalformedHandlerPair(String),
}

#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("no handler class registered for {0:?}")]
    UnknownClass(String),
    #[error("method {method:?} is not mq-callable on {class:?}")]
    NotTagged { class: String, method: String },
    #[error("handler invocation failed: {0}")]
    Invocation(String),
}

/// `M@S -> fully.qualified.HandlerClass`, one entry per key. Parsed from a
/// flat `.properties`-style file (`KEY = VALUE`, `#` comments, blank lines
/// skipped).
#[derive(Debug, Clone, Default)]
pub struct CommandTable(HashMap<ModuleKey, String>);

impl CommandTable {
    pub fn parse(text: &str) -> Result<Self, RegistryError> {
        let mut map = HashMap::new();
        for (idx, raw_line) in text.lines().enumerate() {
            let line = raw_line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let (key, value) = line
                .split_once('=')
                .ok_or_else(|| RegistryError::MalformedCommandLine(idx + 1, raw_line.to_string()))?;
            map.insert(ModuleKey::from(key.trim()), value.trim().to_string());
        }
        Ok(Self(map))
    }

    pub fn class_for(&self, key: &ModuleKey) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }
}

/// `(class, method)` pair loaded from an event table entry, in declared
/// order.
pub type HandlerPair = (String, String);

/// `M@S -> event_name -> [(class, method), ...]`. Parsed from an INI-style
/// sectioned file: `[M@S]` headers followed by `event = Class:method, ...`
/// lines.
#[derive(Debug, Clone, Default)]
pub struct EventTable(HashMap<ModuleKey, HashMap<String, Vec<HandlerPair>>>);

impl EventTable {
    pub fn parse(text: &str) -> Result<Self, RegistryError> {
        let mut map: HashMap<ModuleKey, HashMap<String, Vec<HandlerPair>>> = HashMap::new();
        let mut current: Option<ModuleKey> = None;
        for (idx, raw_line) in text.lines().enumerate() {
            let line = raw_line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }
            if let Some(section) = line.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
                current = Some(ModuleKey::from(section.trim()));
                continue;
            }
            let key = current.clone().ok_or(RegistryError::EventOutsideSection(idx + 1))?;
            let (event_name, pairs_str) = line
                .split_once('=')
                .ok_or_else(|| RegistryError::MalformedEventLine(idx + 1, raw_line.to_string()))?;
            let mut pairs = Vec::new();
            for entry in pairs_str.split(',') {
                let entry = entry.trim();
                if entry.is_empty() {
                    continue;
                }
                let (class, method) =
                    entry.split_once(':').ok_or_else(|| RegistryError::MalformedHandlerPair(entry.to_string()))?;
                pairs.push((class.trim().to_string(), method.trim().to_string()));
            }
            map.entry(key).or_default().insert(event_name.trim().to_string(), pairs);
        }
        Ok(Self(map))
    }

    pub fn handlers_for(&self, key: &ModuleKey, event: &str) -> Option<&[HandlerPair]> {
        self.0.get(key).and_then(|events| events.get(event)).map(Vec::as_slice)
    }
}

/// A class's shared, slow-initialized state: one record is created the
/// first time an executor resolves a given handler class, then handed to
/// every subsequent fresh instance of that class via [`HandlerContext::parent`].
/// Message-scoped state stays on the handler instance itself (which is
/// never reused), so only state a class wants to share *across* messages
/// belongs here.
#[derive(Debug, Default)]
pub struct ParentRecord(Mutex<HashMap<String, serde_json::Value>>);

impl ParentRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<serde_json::Value> {
        self.0.lock().get(key).cloned()
    }

    pub fn set(&self, key: impl Into<String>, value: serde_json::Value) {
        self.0.lock().insert(key.into(), value);
    }
}

/// Everything a fresh handler instance needs injected before its
/// `configure` hook runs: the module key it was resolved for, process-wide
/// and module-scoped configuration, the per-class shared `parent` record,
/// and the envelope that triggered this dispatch.
#[derive(Clone)]
pub struct HandlerContext {
    pub module_key: ModuleKey,
    pub config: Arc<Config>,
    pub module_config: Arc<ModuleConfig>,
    pub parent: Arc<ParentRecord>,
    pub envelope: Envelope,
}

impl HandlerContext {
    pub fn new(
        module_key: ModuleKey,
        config: Arc<Config>,
        module_config: Arc<ModuleConfig>,
        parent: Arc<ParentRecord>,
        envelope: Envelope,
    ) -> Self {
        Self { module_key, config, module_config, parent, envelope }
    }
}

#[cfg(test)]
impl HandlerContext {
    /// Builds a context with empty config/module-config/parent and a
    /// placeholder shutdown envelope, for tests that only care about
    /// resolving a class and checking its tagged methods.
    pub fn for_test(module_key: ModuleKey) -> Self {
        let gen = bridge_core::FixedIdGen::new("handler-context-test".to_string());
        Self::new(
            module_key,
            Arc::new(Config::default()),
            Arc::new(ModuleConfig::default()),
            Arc::new(ParentRecord::new()),
            Envelope::new_shutdown(&gen),
        )
    }
}

/// A registered handler unit. Handlers list the method names they accept
/// mq dispatch for: a name absent from both lists is never invoked even if
/// a command/event table entry names it.
#[async_trait]
pub trait Handler: Send + Sync {
    fn configure(&mut self, _ctx: &HandlerContext) {}

    fn command_methods(&self) -> &'static [&'static str] {
        &[]
    }

    fn event_methods(&self) -> &'static [&'static str] {
        &[]
    }

    async fn invoke(&self, method: &str, envelope: &Envelope) -> Result<(), HandlerError>;
}

type HandlerFactory = dyn Fn() -> Box<dyn Handler> + Send + Sync;

/// Maps a fully-qualified class name (as named in a command/event table
/// entry) to a factory producing a fresh handler instance per dispatch.
/// Populated once at process start via [`register_command!`]/[`register_event!`],
/// never by dynamic import-by-string.
#[derive(Default)]
pub struct HandlerRegistry {
    factories: HashMap<String, Arc<HandlerFactory>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, class_name: impl Into<String>, factory: impl Fn() -> Box<dyn Handler> + Send + Sync + 'static) {
        self.factories.insert(class_name.into(), Arc::new(factory));
    }

    pub fn create(&self, class_name: &str, ctx: &HandlerContext) -> Result<Box<dyn Handler>, HandlerError> {
        let factory = self.factories.get(class_name).ok_or_else(|| HandlerError::UnknownClass(class_name.to_string()))?;
        let mut handler = factory();
        handler.configure(ctx);
        Ok(handler)
    }
}

/// Registers a class/factory pair for command dispatch. Thin sugar over
/// [`HandlerRegistry::register`], kept distinct from [`register_event!`] so
/// call sites read as intent, not mechanism.
#[macro_export]
macro_rules! register_command {
    ($registry:expr, $class:expr, $ctor:expr) => {
        $registry.register($class, $ctor)
    };
}

/// Registers a class/factory pair for event dispatch. See [`register_command!`].
#[macro_export]
macro_rules! register_event {
    ($registry:expr, $class:expr, $ctor:expr) => {
        $registry.register($class, $ctor)
    };
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
