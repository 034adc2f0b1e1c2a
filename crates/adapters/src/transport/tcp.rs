// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Non-POSIX fallback local-loopback transport over plain TCP. Identical
//! contract to [`super::unix::UnixTransport`]; also directly usable as a
//! regular TCP transport driver independent of platform.

use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use bridge_core::{codec, Envelope};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex as AsyncMutex;
use tokio_util::sync::CancellationToken;

use super::adapter::AdapterSink;
use super::base::{TransportDriver, TransportError};

const SHUTDOWN_LINE: &str = "shut";

pub struct TcpLocalTransport {
    addr: SocketAddr,
    listener: AsyncMutex<Option<TcpListener>>,
}

impl TcpLocalTransport {
    pub fn new(addr: SocketAddr) -> Self {
        Self { addr, listener: AsyncMutex::new(None) }
    }

    async fn write_line(&self, line: &str) -> Result<(), TransportError> {
        let mut stream = TcpStream::connect(self.addr).await?;
        stream.write_all(line.as_bytes()).await?;
        stream.write_all(b"\n").await?;
        Ok(())
    }

    pub async fn send_shutdown_signal(&self) -> Result<(), TransportError> {
        self.write_line(SHUTDOWN_LINE).await
    }
}

#[async_trait]
impl TransportDriver for TcpLocalTransport {
    fn name(&self) -> &str {
        "tcp-local"
    }

    async fn connect(&self) -> Result<(), TransportError> {
        let listener = TcpListener::bind(self.addr).await?;
        *self.listener.lock().await = Some(listener);
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), TransportError> {
        self.listener.lock().await.take();
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
                    .ok_or_else(|| TransportError::Config("tcp-local transport not connected".to_string()))?;
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
#[path = "tcp_tests.rs"]
mod tests;
