// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The lifecycle primitive (C1): a state machine every supervised
//! component implements, plus the observer list that watches its
//! transitions.
//!
//! Collapses the source's `Configurable -> Startable -> StartableManager
//! -> LifeCycleManager` inheritance chain into one capability trait, per
//! the re-architecture guidance: composition (a supervisor *has* a list of
//! lifecycle components) replaces inheritance depth.

use std::cell::RefCell;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::ReentrantMutex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("failed to bind {0}: {1}")]
    Bind(String, #[source] std::io::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("transport error: {0}")]
    Transport(#[from] bridge_adapters::TransportError),
    #[error("registry error: {0}")]
    Registry(#[from] bridge_engine::RegistryError),
    #[error("{0}")]
    Other(String),
}

/// `UNCONFIGURED -> CONFIGURING -> CONFIGURED -> STARTING -> STARTED ->
/// STOPPING -> STOPPED | FAILED`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Unconfigured,
    Configuring,
    Configured,
    Starting,
    Started,
    Stopping,
    Stopped,
    Failed,
}

/// Receives state-transition callbacks. Runs on the thread/task performing
/// the transition — an observer that needs to hop contexts must do so
/// itself.
#[async_trait]
pub trait Observer: Send + Sync {
    async fn on_configuring(&self, _component: &str) {}
    async fn on_configured(&self, _component: &str) {}
    async fn on_starting(&self, _component: &str) {}
    async fn on_started(&self, _component: &str) {}
    async fn on_stopping(&self, _component: &str) {}
    async fn on_stopped(&self, _component: &str) {}
    async fn on_failure(&self, _component: &str, _error: &LifecycleError) {}
}

struct Inner {
    state: LifecycleState,
    observers: Vec<Arc<dyn Observer>>,
}

/// The mutable lifecycle record (state + observer list) every component
/// owns, guarded by a reentrant lock so an observer callback that calls
/// back into the component (e.g. to read `is_running`) does not deadlock.
pub struct LifecycleRecord {
    inner: ReentrantMutex<RefCell<Inner>>,
}

impl Default for LifecycleRecord {
    fn default() -> Self {
        Self::new()
    }
}

impl LifecycleRecord {
    pub fn new() -> Self {
        Self { inner: ReentrantMutex::new(RefCell::new(Inner { state: LifecycleState::Unconfigured, observers: Vec::new() })) }
    }

    pub fn state(&self) -> LifecycleState {
        self.inner.lock().borrow().state
    }

    fn set_state(&self, state: LifecycleState) {
        self.inner.lock().borrow_mut().state = state;
    }

    pub fn add_observer(&self, observer: Arc<dyn Observer>) {
        self.inner.lock().borrow_mut().observers.push(observer);
    }

    fn observers(&self) -> Vec<Arc<dyn Observer>> {
        self.inner.lock().borrow().observers.clone()
    }
}

/// Every supervisable component. `configure`/`start`/`stop` are the public,
/// idempotent entry points; `do_configure`/`do_start`/`do_stop` are the
/// component-specific hooks implementors override. Receivers are
/// `Arc<Self>` (not `&self`) so a hook can hand a clone of itself to a
/// spawned background task — the same pattern `TransportDriver::run` uses.
#[async_trait]
pub trait LifecycleComponent: Send + Sync {
    fn name(&self) -> &str;
    fn record(&self) -> &LifecycleRecord;

    async fn do_configure(self: Arc<Self>) -> Result<(), LifecycleError> {
        Ok(())
    }
    async fn do_start(self: Arc<Self>) -> Result<(), LifecycleError> {
        Ok(())
    }
    async fn do_stop(self: Arc<Self>) -> Result<(), LifecycleError> {
        Ok(())
    }

    async fn notify_configuring(&self) {
        for o in self.record().observers() {
            o.on_configuring(self.name()).await;
        }
    }
    async fn notify_configured(&self) {
        for o in self.record().observers() {
            o.on_configured(self.name()).await;
        }
    }
    async fn notify_starting(&self) {
        for o in self.record().observers() {
            o.on_starting(self.name()).await;
        }
    }
    async fn notify_started(&self) {
        for o in self.record().observers() {
            o.on_started(self.name()).await;
        }
    }
    async fn notify_stopping(&self) {
        for o in self.record().observers() {
            o.on_stopping(self.name()).await;
        }
    }
    async fn notify_stopped(&self) {
        for o in self.record().observers() {
            o.on_stopped(self.name()).await;
        }
    }
    async fn notify_failure(&self, error: &LifecycleError) {
        for o in self.record().observers() {
            o.on_failure(self.name(), error).await;
        }
    }

    /// Idempotent w.r.t. its terminal state: a second call once
    /// `CONFIGURED` (or later) is a no-op.
    async fn configure(self: Arc<Self>) -> Result<(), LifecycleError> {
        {
            let guard = self.record().inner.lock();
            let mut inner = guard.borrow_mut();
            if !matches!(inner.state, LifecycleState::Unconfigured | LifecycleState::Failed) {
                return Ok(());
            }
            inner.state = LifecycleState::Configuring;
        }
        self.notify_configuring().await;
        match self.clone().do_configure().await {
            Ok(()) => {
                self.record().set_state(LifecycleState::Configured);
                self.notify_configured().await;
                Ok(())
            }
            Err(err) => {
                self.record().set_state(LifecycleState::Failed);
                tracing::error!(component = self.name(), error = %err, "configure failed");
                self.notify_failure(&err).await;
                Err(err)
            }
        }
    }

    /// Configures lazily if still `UNCONFIGURED`. Idempotent once
    /// `STARTING`/`STARTED`.
    async fn start(self: Arc<Self>) -> Result<(), LifecycleError> {
        if matches!(self.record().state(), LifecycleState::Starting | LifecycleState::Started) {
            return Ok(());
        }
        if matches!(self.record().state(), LifecycleState::Unconfigured) {
            self.clone().configure().await?;
        }
        self.record().set_state(LifecycleState::Starting);
        self.notify_starting().await;
        match self.clone().do_start().await {
            Ok(()) => {
                self.record().set_state(LifecycleState::Started);
                self.notify_started().await;
                Ok(())
            }
            Err(err) => {
                self.record().set_state(LifecycleState::Failed);
                tracing::error!(component = self.name(), error = %err, "start failed");
                self.notify_failure(&err).await;
                Err(err)
            }
        }
    }

    /// Idempotent once `STOPPED`, and a no-op on a component that was
    /// never configured.
    async fn stop(self: Arc<Self>) -> Result<(), LifecycleError> {
        if matches!(self.record().state(), LifecycleState::Stopped | LifecycleState::Unconfigured) {
            return Ok(());
        }
        self.record().set_state(LifecycleState::Stopping);
        self.notify_stopping().await;
        match self.clone().do_stop().await {
            Ok(()) => {
                self.record().set_state(LifecycleState::Stopped);
                self.notify_stopped().await;
                Ok(())
            }
            Err(err) => {
                self.record().set_state(LifecycleState::Failed);
                tracing::error!(component = self.name(), error = %err, "stop failed");
                self.notify_failure(&err).await;
                Err(err)
            }
        }
    }

    fn is_running(&self) -> bool {
        matches!(self.record().state(), LifecycleState::Starting | LifecycleState::Started)
    }

    fn add_observer(&self, observer: Arc<dyn Observer>) {
        self.record().add_observer(observer);
    }
}

#[cfg(test)]
#[path = "component_tests.rs"]
mod tests;
