// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Executors: own a module's handler-class cache and a worker model (a
//! thread-pool by default, a subprocess when `production.mode=true`), and
//! actually invoke handler methods.
//!
//! The cache holds one shared [`ParentRecord`] per class, not the handler
//! itself: every dispatch resolves (or creates) that record, then builds a
//! fresh handler instance, attaches the record as its `parent`, and calls
//! `configure()` on it before invoking. Class-scoped, slow-initialized
//! state lives on the `parent` record and survives across messages;
//! message-scoped state lives on the instance and is dropped with it.

use std::collections::HashMap;
use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use bridge_core::{codec, Config, Envelope, FixedIdGen, IdGen, ModuleConfig, ModuleKey};
use parking_lot::Mutex as SyncMutex;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::{mpsc, Mutex as AsyncMutex};
use tokio::task::JoinHandle;

use crate::registry::{CommandTable, EventTable, Handler, HandlerContext, HandlerRegistry, ParentRecord};

pub const DEFAULT_THREAD_POOL_SIZE: usize = 8;
pub const MIN_THREAD_POOL_SIZE: usize = 4;
const EXECUTOR_QUEUE_CAPACITY: usize = 256;

#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("io error communicating with subprocess worker: {0}")]
    Io(#[from] std::io::Error),
    #[error("subprocess worker exited unexpectedly")]
    WorkerGone,
}

/// Shared routing tables an executor consults to resolve a handler class
/// from a command/event table entry, plus the configuration every fresh
/// handler instance gets injected with.
#[derive(Clone)]
pub struct RoutingTables {
    pub commands: Arc<CommandTable>,
    pub events: Arc<EventTable>,
    pub registry: Arc<HandlerRegistry>,
    pub config: Arc<Config>,
    pub module_config: Arc<ModuleConfig>,
}

type ParentCache = SyncMutex<HashMap<String, Arc<ParentRecord>>>;

/// Gets or creates the shared `parent` record for `class_name`. The record
/// itself is memoized; the handler instance built against it never is.
fn resolve_parent(cache: &ParentCache, class_name: &str) -> Arc<ParentRecord> {
    cache.lock().entry(class_name.to_string()).or_insert_with(|| Arc::new(ParentRecord::new())).clone()
}

/// Builds a fresh handler instance for `class_name`, attaching the
/// class's shared `parent` record and this dispatch's configuration and
/// envelope, then calling `configure()` on the new instance.
fn resolve_handler(
    cache: &ParentCache,
    tables: &RoutingTables,
    class_name: &str,
    module_key: &ModuleKey,
    envelope: &Envelope,
) -> Result<Box<dyn Handler>, crate::registry::HandlerError> {
    let parent = resolve_parent(cache, class_name);
    let ctx = HandlerContext::new(module_key.clone(), tables.config.clone(), tables.module_config.clone(), parent, envelope.clone());
    tables.registry.create(class_name, &ctx)
}

/// Routes one envelope to its tagged handler method(s); the shared routine
/// both worker models drive.
async fn dispatch(cache: &ParentCache, tables: &RoutingTables, envelope: Envelope) {
    match &envelope {
        Envelope::Command { module, submodule, command, .. } => {
            let key = ModuleKey::new(module, submodule);
            let Some(class) = tables.commands.class_for(&key) else {
                tracing::error!(module = %module, submodule = %submodule, "unknown module for command dispatch");
                return;
            };
            let class = class.to_string();
            match resolve_handler(cache, tables, &class, &key, &envelope) {
                Ok(handler) => {
                    if !handler.command_methods().contains(&command.as_str()) {
                        tracing::error!(class = %class, method = %command, "method not command-tagged, dropping");
                        return;
                    }
                    if let Err(err) = handler.invoke(command, &envelope).await {
                        tracing::error!(class = %class, method = %command, error = %err, "handler invocation failed");
                    }
                }
                Err(err) => tracing::error!(class = %class, error = %err, "failed to resolve handler class"),
            }
        }
        Envelope::Event { module, submodule, event, .. } => {
            let key = ModuleKey::new(module, submodule);
            let Some(pairs) = tables.events.handlers_for(&key, event) else {
                tracing::error!(module = %module, submodule = %submodule, event = %event, "unknown event route");
                return;
            };
            let mut handles = Vec::with_capacity(pairs.len());
            for (class, method) in pairs.to_vec() {
                match resolve_handler(cache, tables, &class, &key, &envelope) {
                    Ok(handler) => {
                        if !handler.event_methods().contains(&method.as_str()) {
                            tracing::error!(class = %class, method = %method, "method not event-tagged, dropping");
                            continue;
                        }
                        let envelope = envelope.clone();
                        handles.push(tokio::spawn(async move {
                            if let Err(err) = handler.invoke(&method, &envelope).await {
                                tracing::error!(class = %class, method = %method, error = %err, "handler invocation failed");
                            }
                        }));
                    }
                    Err(err) => tracing::error!(class = %class, error = %err, "failed to resolve handler class"),
                }
            }
            for handle in handles {
                handle.await.ok();
            }
        }
        Envelope::Shutdown { .. } => {}
    }
}

/// An executor dispatches envelopes addressed to one module key (or the
/// wildcard module, under `simple_model`) onto its configured worker model.
#[async_trait]
pub trait Executor: Send + Sync {
    fn module_key(&self) -> &ModuleKey;
    async fn submit(&self, envelope: Envelope);
    async fn stop(&self);
}

/// Thread-pool worker model: a fixed set of tokio tasks sharing one
/// receiver, the idiomatic equivalent of the source's fixed OS thread pool.
pub struct ThreadPoolExecutor {
    module_key: ModuleKey,
    tx: SyncMutex<Option<mpsc::Sender<Envelope>>>,
    workers: SyncMutex<Vec<JoinHandle<()>>>,
}

impl ThreadPoolExecutor {
    pub fn new(module_key: ModuleKey, tables: RoutingTables, worker_count: usize) -> Arc<Self> {
        let worker_count = worker_count.max(MIN_THREAD_POOL_SIZE);
        let (tx, rx) = mpsc::channel(EXECUTOR_QUEUE_CAPACITY);
        let rx = Arc::new(AsyncMutex::new(rx));
        let cache: Arc<ParentCache> = Arc::new(SyncMutex::new(HashMap::new()));

        let mut workers = Vec::with_capacity(worker_count);
        for _ in 0..worker_count {
            let rx = rx.clone();
            let tables = tables.clone();
            let cache = cache.clone();
            workers.push(tokio::spawn(async move {
                loop {
                    let envelope = {
                        let mut guard = rx.lock().await;
                        guard.recv().await
                    };
                    match envelope {
                        Some(envelope) => dispatch(&cache, &tables, envelope).await,
                        None => break,
                    }
                }
            }));
        }

        Arc::new(Self { module_key, tx: SyncMutex::new(Some(tx)), workers: SyncMutex::new(workers) })
    }

    pub fn default_pool(module_key: ModuleKey, tables: RoutingTables) -> Arc<Self> {
        Self::new(module_key, tables, DEFAULT_THREAD_POOL_SIZE)
    }
}

#[async_trait]
impl Executor for ThreadPoolExecutor {
    fn module_key(&self) -> &ModuleKey {
        &self.module_key
    }

    async fn submit(&self, envelope: Envelope) {
        let sender = self.tx.lock().clone();
        match sender {
            Some(sender) if sender.send(envelope).await.is_ok() => {}
            _ => tracing::error!(module = %self.module_key, "thread-pool executor queue closed, dropping envelope"),
        }
    }

    async fn stop(&self) {
        // Dropping the sender closes the channel; each worker's `recv()`
        // then returns `None` and its loop exits on its own.
        self.tx.lock().take();
        let workers = self.workers.lock().drain(..).collect::<Vec<_>>();
        for worker in workers {
            worker.await.ok();
        }
    }
}

/// Subprocess worker model (`production.mode=true`): the parent owns a
/// child process and writes re-encoded envelopes to its stdin, one per
/// line; the child runs [`run_subprocess_worker`], terminating when it
/// reads a shutdown envelope.
pub struct SubprocessExecutor {
    module_key: ModuleKey,
    child: AsyncMutex<Child>,
    id_gen: FixedIdGen,
}

impl SubprocessExecutor {
    /// Spawns `argv[0] subprocess_args...` (typically the daemon's own
    /// binary re-invoked with a worker flag) and wires its stdin for
    /// envelope delivery.
    pub fn spawn(module_key: ModuleKey, program: &str, args: &[&str]) -> Result<Self, ExecutorError> {
        let child = Command::new(program).args(args).stdin(Stdio::piped()).kill_on_drop(true).spawn()?;
        Ok(Self { module_key, child: AsyncMutex::new(child), id_gen: FixedIdGen::new("subprocess".to_string()) })
    }

    async fn write_line(&self, line: &str) -> Result<(), ExecutorError> {
        let mut guard = self.child.lock().await;
        let stdin = guard.stdin.as_mut().ok_or(ExecutorError::WorkerGone)?;
        stdin.write_all(line.as_bytes()).await?;
        stdin.write_all(b"\n").await?;
        Ok(())
    }
}

#[async_trait]
impl Executor for SubprocessExecutor {
    fn module_key(&self) -> &ModuleKey {
        &self.module_key
    }

    async fn submit(&self, envelope: Envelope) {
        let encoded = codec::encode(&envelope);
        if let Err(err) = self.write_line(&encoded).await {
            tracing::error!(module = %self.module_key, error = %err, "failed to submit envelope to subprocess worker");
        }
    }

    async fn stop(&self) {
        let shutdown = Envelope::new_shutdown(&self.id_gen);
        if let Err(err) = self.write_line(&codec::encode(&shutdown)).await {
            tracing::error!(module = %self.module_key, error = %err, "failed to send shutdown envelope to subprocess worker");
        }
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        let mut guard = self.child.lock().await;
        if let Err(err) = guard.kill().await {
            tracing::error!(module = %self.module_key, error = %err, "failed to terminate subprocess worker");
        }
    }
}

/// The child-side loop: reads base64-JSON envelopes one per line from
/// `stdin`, dispatching each exactly like a thread-pool worker would, until
/// a `Shutdown` envelope is read.
pub async fn run_subprocess_worker(
    stdin: impl tokio::io::AsyncRead + Unpin,
    tables: RoutingTables,
) -> Result<(), ExecutorError> {
    let cache: ParentCache = SyncMutex::new(HashMap::new());
    let gen = FixedIdGen::new("subprocess-child".to_string());
    let mut reader = BufReader::new(stdin);
    let mut line = String::new();
    loop {
        line.clear();
        if reader.read_line(&mut line).await? == 0 {
            return Ok(());
        }
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let envelope = match codec::decode_str(trimmed, &gen) {
            Ok(envelope) => envelope,
            Err(err) => {
                tracing::error!(error = %err, "failed to decode subprocess-worker envelope");
                continue;
            }
        };
        if envelope.is_shutdown() {
            return Ok(());
        }
        dispatch(&cache, &tables, envelope).await;
    }
}

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;
