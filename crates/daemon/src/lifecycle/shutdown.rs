// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The shutdown monitor (C3): a loopback TCP control port that accepts a
//! single `shut\n` line per connection and, on a match, stops the
//! supervisor that owns it. Grounded on the source's shutdown hook
//! monitor and its local transport's identical control-line handling.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use std::net::SocketAddr;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

use bridge_core::ShutdownConfig;

use super::component::{LifecycleComponent, LifecycleError, LifecycleRecord};
use super::supervisor::Supervisor;

const SHUTDOWN_LINE: &str = "shut";

pub struct ShutdownMonitor {
    record: LifecycleRecord,
    config: ShutdownConfig,
    supervisor: Arc<Supervisor>,
    accept_task: Mutex<Option<JoinHandle<()>>>,
    bound_addr: Mutex<Option<SocketAddr>>,
}

impl ShutdownMonitor {
    pub fn new(config: ShutdownConfig, supervisor: Arc<Supervisor>) -> Arc<Self> {
        Arc::new(Self {
            record: LifecycleRecord::new(),
            config,
            supervisor,
            accept_task: Mutex::new(None),
            bound_addr: Mutex::new(None),
        })
    }

    fn address(&self) -> String {
        format!("{}:{}", self.config.addr, self.config.port)
    }

    /// The actual bound address, including the ephemeral port the OS
    /// assigned when `config.port` was `0`. `None` before the first start.
    pub fn bound_addr(&self) -> Option<SocketAddr> {
        *self.bound_addr.lock()
    }

    /// Connects to its own control port and writes the shutdown line —
    /// the mechanism an operator (or a local CLI) uses to request a clean
    /// stop from outside the process.
    pub async fn send_shutdown_signal(&self) -> Result<(), LifecycleError> {
        let address = self.bound_addr().map(|a| a.to_string()).unwrap_or_else(|| self.address());
        let mut stream = TcpStream::connect(address).await?;
        stream.write_all(format!("{SHUTDOWN_LINE}\n").as_bytes()).await?;
        Ok(())
    }

    async fn accept_loop(self: Arc<Self>, listener: TcpListener) {
        loop {
            let (stream, peer) = match listener.accept().await {
                Ok(pair) => pair,
                Err(err) => {
                    tracing::error!(error = %err, "shutdown monitor accept failed");
                    continue;
                }
            };
            tracing::info!(peer = %peer, "control port connection accepted");

            let mut line = String::new();
            let mut reader = BufReader::new(stream);
            if let Err(err) = reader.read_line(&mut line).await {
                tracing::error!(error = %err, "failed to read control port line");
                continue;
            }

            if line.trim().eq_ignore_ascii_case(SHUTDOWN_LINE) {
                tracing::info!("shutdown requested via control port");
                let this = self.clone();
                tokio::spawn(async move {
                    if let Err(err) = this.clone().stop().await {
                        tracing::error!(error = %err, "shutdown monitor failed to stop cleanly");
                    }
                    this.supervisor.request_stop();
                });
                return;
            }
        }
    }
}

#[async_trait]
impl LifecycleComponent for ShutdownMonitor {
    fn name(&self) -> &str {
        "shutdown-monitor"
    }

    fn record(&self) -> &LifecycleRecord {
        &self.record
    }

    async fn do_start(self: Arc<Self>) -> Result<(), LifecycleError> {
        let address = self.address();
        let listener = TcpListener::bind(&address)
            .await
            .map_err(|err| LifecycleError::Bind(address.clone(), err))?;
        *self.bound_addr.lock() = Some(listener.local_addr()?);
        tracing::info!(address = %address, "shutdown monitor listening");

        let task = tokio::spawn(self.clone().accept_loop(listener));
        *self.accept_task.lock() = Some(task);
        Ok(())
    }

    async fn do_stop(self: Arc<Self>) -> Result<(), LifecycleError> {
        if let Some(task) = self.accept_task.lock().take() {
            task.abort();
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "shutdown_tests.rs"]
mod tests;
