// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Execution manager (C9): the queue-pool's downstream listener. Parses
//! each decoded payload into an [`Envelope`], resolves (or lazily creates)
//! the executor registered for its module key, and hands the envelope to
//! that executor's `submit`.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use bridge_core::{codec, Envelope, IdGen, ModuleKey, PayloadSink, UuidIdGen};
use parking_lot::Mutex;

use crate::executor::{Executor, RoutingTables, SubprocessExecutor, ThreadPoolExecutor};

/// `bridge.simple_model`: collapse every module's executor into one
/// wildcard-keyed executor. `production_mode` (`production.mode`) selects
/// the subprocess worker model over the default thread pool; `worker_program`
/// names the binary a subprocess executor re-invokes, defaulting to the
/// daemon's own executable re-run with `--worker`.
#[derive(Clone)]
pub struct ExecutionManagerConfig {
    pub simple_model: bool,
    pub thread_pool_size: usize,
    pub production_mode: bool,
    pub worker_program: Option<PathBuf>,
}

impl Default for ExecutionManagerConfig {
    fn default() -> Self {
        Self {
            simple_model: false,
            thread_pool_size: crate::executor::DEFAULT_THREAD_POOL_SIZE,
            production_mode: false,
            worker_program: None,
        }
    }
}

pub struct ExecutionManager {
    tables: RoutingTables,
    config: ExecutionManagerConfig,
    id_gen: Arc<dyn IdGen>,
    executors: Mutex<HashMap<ModuleKey, Arc<dyn Executor>>>,
}

impl ExecutionManager {
    pub fn new(tables: RoutingTables, config: ExecutionManagerConfig) -> Arc<Self> {
        Arc::new(Self { tables, config, id_gen: Arc::new(UuidIdGen), executors: Mutex::new(HashMap::new()) })
    }

    #[cfg(any(test, feature = "test-support"))]
    pub fn with_id_gen(tables: RoutingTables, config: ExecutionManagerConfig, id_gen: Arc<dyn IdGen>) -> Arc<Self> {
        Arc::new(Self { tables, config, id_gen, executors: Mutex::new(HashMap::new()) })
    }

    fn executor_key(&self, key: &ModuleKey) -> ModuleKey {
        if self.config.simple_model {
            ModuleKey::wildcard()
        } else {
            key.clone()
        }
    }

    /// Routing steps (a)-(d): resolve the existing executor for this
    /// envelope's module, or create one if the module-key is present in
    /// either routing table; drop and log otherwise.
    fn resolve_executor(&self, envelope: &Envelope) -> Option<Arc<dyn Executor>> {
        let module_key = envelope.module_key()?;
        let executor_key = self.executor_key(&module_key);

        if let Some(executor) = self.executors.lock().get(&executor_key) {
            return Some(executor.clone());
        }

        let known = self.config.simple_model
            || self.tables.commands.class_for(&module_key).is_some()
            || matches!(envelope, Envelope::Event { .. })
                && self.tables.events.handlers_for(&module_key, event_name(envelope)).is_some();
        if !known {
            tracing::error!(module_key = %module_key, "unknown module for dispatch, dropping envelope");
            return None;
        }

        let executor: Arc<dyn Executor> = if self.config.production_mode {
            let program = self
                .config
                .worker_program
                .clone()
                .or_else(|| std::env::current_exe().ok())
                .unwrap_or_else(|| PathBuf::from("bridged"));
            match SubprocessExecutor::spawn(executor_key.clone(), &program.to_string_lossy(), &["--worker"]) {
                Ok(executor) => Arc::new(executor),
                Err(err) => {
                    tracing::error!(module_key = %executor_key, error = %err, "failed to spawn subprocess executor, dropping envelope");
                    return None;
                }
            }
        } else {
            ThreadPoolExecutor::new(executor_key.clone(), self.tables.clone(), self.config.thread_pool_size)
        };
        self.executors.lock().insert(executor_key, executor.clone());
        Some(executor)
    }

    async fn route(self: Arc<Self>, envelope: Envelope) {
        if envelope.is_shutdown() {
            return;
        }
        let Some(executor) = self.resolve_executor(&envelope) else { return };
        executor.submit(envelope).await;
    }

    /// Stops every executor this manager has created, in no particular
    /// order (executors do not depend on one another).
    pub async fn stop(&self) {
        let executors: Vec<Arc<dyn Executor>> = self.executors.lock().drain().map(|(_, v)| v).collect();
        for executor in executors {
            executor.stop().await;
        }
    }
}

fn event_name(envelope: &Envelope) -> &str {
    match envelope {
        Envelope::Event { event, .. } => event.as_str(),
        _ => "",
    }
}

impl PayloadSink for Arc<ExecutionManager> {
    fn push(&self, payload: Vec<u8>) {
        let envelope = match codec::decode_json(&payload, self.id_gen.as_ref()) {
            Ok(envelope) => envelope,
            Err(err) => {
                tracing::error!(error = %err, "failed to decode envelope, dropping payload");
                return;
            }
        };
        let manager = self.clone();
        tokio::spawn(async move { manager.route(envelope).await });
    }
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
