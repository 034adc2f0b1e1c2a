// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! POSIX local-loopback transport over a Unix domain stream socket.
//!
//! Also serves as the daemon's own send-to-self path (`notify_server`,
//! `send_shutdown_signal`), matching `core/translocal.py` /
//! `core/transport/localtransport.py` in the original, minus the
//! process-global singleton: the daemon constructs one `Arc<UnixTransport>`
//! in `main` and clones the handle into whatever needs to notify itself.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use bridge_core::{codec, Envelope};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::Mutex as AsyncMutex;
use tokio_util::sync::CancellationToken;

use super::adapter::AdapterSink;
use super::base::{TransportDriver, TransportError};

/// Reserved control line also accepted by the shutdown monitor (C3).
const SHUTDOWN_LINE: &str = "shut";

pub struct UnixTransport {
    path: PathBuf,
    listener: AsyncMutex<Option<UnixListener>>,
}

impl UnixTransport {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), listener: AsyncMutex::new(None) }
    }

    async fn write_line(&self, line: &str) -> Result<(), TransportError> {
        let mut stream = UnixStream::connect(&self.path).await?;
        stream.write_all(line.as_bytes()).await?;
        stream.write_all(b"\n").await?;
        Ok(())
    }

    /// Writes the literal `shut\n` control line to this transport's own
    /// socket, requesting orderly shutdown exactly like the TCP shutdown
    /// monitor's control port.
    pub async fn send_shutdown_signal(&self) -> Result<(), TransportError> {
        self.write_line(SHUTDOWN_LINE).await
    }
}

#[async_trait]
impl TransportDriver for UnixTransport {
    fn name(&self) -> &str {
        "unix"
    }

    async fn connect(&self) -> Result<(), TransportError> {
        if Path::new(&self.path).exists() {
            std::fs::remove_file(&self.path).ok();
        }
        let listener = UnixListener::bind(&self.path)?;
        *self.listener.lock().await = Some(listener);
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), TransportError> {
        self.listener.lock().await.take();
        std::fs::remove_file(&self.path).ok();
        Ok(())
    }

    async fn publish(&self, envelope: &Envelope) -> Result<(), TransportError> {
        self.write_line(&codec::encode(envelope)).await
    }

    async fn do_listen(&self, sink: Arc<AdapterSink>, cancel: CancellationToken) -> Result<(), TransportError> {
        loop {
            let accepted = {
                let guard = self.listener.lock().await;
                let listener = guard
                    .as_ref()
                    .ok_or_else(|| TransportError::Config("unix transport not connected".to_string()))?;
                tokio::select! {
                    res = listener.accept() => Some(res),
                    _ = cancel.cancelled() => None,
                }
            };
            let Some(res) = accepted else {
                return Ok(());
            };
            let (stream, _addr) = res?;
            let mut reader = BufReader::new(stream);
            let mut line = String::new();
            if reader.read_line(&mut line).await? == 0 {
                continue;
            }
            let trimmed = line.trim();
            if trimmed.eq_ignore_ascii_case(SHUTDOWN_LINE) {
                cancel.cancel();
                return Ok(());
            }
            sink.accept(trimmed.as_bytes());
        }
    }
}

#[cfg(test)]
#[path = "unix_tests.rs"]
mod tests;
