// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The supervisor (C2): a flat list of lifecycle components that starts
//! them in registration order and stops them in reverse, plus the
//! shutdown-wait primitive the binary blocks on.
//!
//! `do_start` is intentionally best-effort: one component's startup
//! failure is logged and the remaining components are still given a
//! chance to start, mirroring the base application server, which never
//! let one failed service abort the whole process. `do_stop` extends the
//! same best-effort policy to teardown — a component wedged mid-stop
//! should not strand the rest of the supervised set running.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;

use super::component::{LifecycleComponent, LifecycleError, LifecycleRecord};

pub struct Supervisor {
    name: String,
    record: LifecycleRecord,
    children: Mutex<Vec<Arc<dyn LifecycleComponent>>>,
    shutdown_notify: Arc<Notify>,
}

impl Supervisor {
    pub fn new(name: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            record: LifecycleRecord::new(),
            children: Mutex::new(Vec::new()),
            shutdown_notify: Arc::new(Notify::new()),
        })
    }

    pub fn add(&self, component: Arc<dyn LifecycleComponent>) {
        self.children.lock().push(component);
    }

    /// Adds a component and, if the supervisor is already running, starts
    /// it immediately so late registrants join a live set.
    pub async fn add_running(self: &Arc<Self>, component: Arc<dyn LifecycleComponent>) -> Result<(), LifecycleError> {
        self.children.lock().push(component.clone());
        if self.is_running() {
            component.start().await?;
        }
        Ok(())
    }

    fn children_snapshot(&self) -> Vec<Arc<dyn LifecycleComponent>> {
        self.children.lock().clone()
    }

    /// Signals every waiter on [`Supervisor::run_until_shutdown`].
    pub fn request_stop(&self) {
        self.shutdown_notify.notify_waiters();
    }

    /// Blocks until [`Supervisor::request_stop`] is called, typically by
    /// the shutdown monitor's control-port handler.
    pub async fn run_until_shutdown(&self) {
        self.shutdown_notify.notified().await;
    }
}

#[async_trait]
impl LifecycleComponent for Supervisor {
    fn name(&self) -> &str {
        &self.name
    }

    fn record(&self) -> &LifecycleRecord {
        &self.record
    }

    async fn do_configure(self: Arc<Self>) -> Result<(), LifecycleError> {
        for child in self.children_snapshot() {
            child.configure().await?;
        }
        Ok(())
    }

    async fn do_start(self: Arc<Self>) -> Result<(), LifecycleError> {
        for child in self.children_snapshot() {
            if let Err(err) = child.clone().start().await {
                tracing::error!(component = child.name(), error = %err, "component failed to start, continuing");
            }
        }
        Ok(())
    }

    async fn do_stop(self: Arc<Self>) -> Result<(), LifecycleError> {
        for child in self.children_snapshot().into_iter().rev() {
            if let Err(err) = child.clone().stop().await {
                tracing::error!(component = child.name(), error = %err, "component failed to stop, continuing");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "supervisor_tests.rs"]
mod tests;
