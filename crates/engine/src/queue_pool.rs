// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The bounded queue-pool: a single FIFO decoupling transport ingress from
//! dispatch, fed by adapter callbacks and drained by one dedicated worker
//! that fans each payload out to every registered listener.
//!
//! The channel is a blocking `std::sync::mpsc::sync_channel`, not a tokio
//! channel: [`PayloadSink::push`] is a synchronous trait method called
//! directly from a transport driver's accept loop, and a blocking send gives
//! the backpressure a bounded queue needs — `push` stalls the calling driver
//! task until the drain worker makes room, rather than dropping the oldest
//! payload.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::SyncSender;
use std::sync::Arc;

use bridge_core::PayloadSink;
use parking_lot::Mutex;
use tokio::task::JoinHandle;

pub const DEFAULT_QUEUE_CAPACITY: usize = 100;

pub struct QueuePool {
    sender: Mutex<Option<SyncSender<Vec<u8>>>>,
    stopped: Arc<AtomicBool>,
    drain: Mutex<Option<JoinHandle<()>>>,
}

impl QueuePool {
    pub fn new(capacity: usize, listeners: Vec<Arc<dyn PayloadSink>>) -> Arc<Self> {
        let (tx, rx) = std::sync::mpsc::sync_channel::<Vec<u8>>(capacity.max(1));
        let stopped = Arc::new(AtomicBool::new(false));
        let drain_stopped = stopped.clone();
        let drain = tokio::task::spawn_blocking(move || {
            while let Ok(payload) = rx.recv() {
                if drain_stopped.load(Ordering::Acquire) {
                    continue;
                }
                for listener in &listeners {
                    listener.push(payload.clone());
                }
            }
        });
        Arc::new(Self { sender: Mutex::new(Some(tx)), stopped, drain: Mutex::new(Some(drain)) })
    }

    pub fn with_default_capacity(listeners: Vec<Arc<dyn PayloadSink>>) -> Arc<Self> {
        Self::new(DEFAULT_QUEUE_CAPACITY, listeners)
    }

    /// Stops dispatch and closes the channel; payloads already buffered are
    /// drained (drawn out of the channel) but not handed to listeners,
    /// matching the "emptied without further dispatch" stop contract.
    pub async fn stop(&self) {
        self.stopped.store(true, Ordering::Release);
        self.sender.lock().take();
        let handle = self.drain.lock().take();
        if let Some(handle) = handle {
            handle.await.ok();
        }
    }
}

impl PayloadSink for QueuePool {
    fn push(&self, payload: Vec<u8>) {
        if self.stopped.load(Ordering::Acquire) {
            return;
        }
        let sender = self.sender.lock().clone();
        if let Some(sender) = sender {
            // Blocks the calling task/thread when the bound is reached --
            // the chosen backpressure policy (see module docs).
            let _ = sender.send(payload);
        }
    }
}

#[cfg(test)]
#[path = "queue_pool_tests.rs"]
mod tests;
