// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wraps a transport driver as a lifecycle component so the supervisor can
//! start, stop, and observe it the same way it does the shutdown monitor.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use bridge_adapters::{AdapterSink, TransportDriver};

use super::component::{LifecycleComponent, LifecycleError, LifecycleRecord};

pub struct TransportComponent {
    record: LifecycleRecord,
    driver: Arc<dyn TransportDriver>,
    sink: Arc<AdapterSink>,
    cancel: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl TransportComponent {
    pub fn new(driver: Arc<dyn TransportDriver>, sink: Arc<AdapterSink>) -> Arc<Self> {
        Arc::new(Self {
            record: LifecycleRecord::new(),
            driver,
            sink,
            cancel: CancellationToken::new(),
            task: Mutex::new(None),
        })
    }
}

#[async_trait]
impl LifecycleComponent for TransportComponent {
    fn name(&self) -> &str {
        self.driver.name()
    }

    fn record(&self) -> &LifecycleRecord {
        &self.record
    }

    async fn do_configure(self: Arc<Self>) -> Result<(), LifecycleError> {
        self.driver.connect().await?;
        Ok(())
    }

    async fn do_start(self: Arc<Self>) -> Result<(), LifecycleError> {
        let driver = self.driver.clone();
        let sink = self.sink.clone();
        let cancel = self.cancel.clone();
        let task = tokio::spawn(async move { driver.run(sink, cancel).await });
        *self.task.lock() = Some(task);
        Ok(())
    }

    async fn do_stop(self: Arc<Self>) -> Result<(), LifecycleError> {
        self.cancel.cancel();
        if let Some(task) = self.task.lock().take() {
            let _ = task.await;
        }
        self.driver.disconnect().await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "transport_tests.rs"]
mod tests;
