// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Hand-rolled STOMP 1.2 transport driver.
//!
//! No mainstream STOMP client crate exists in this crate's dependency
//! family, so the protocol is framed directly over `tokio::net::TcpStream`,
//! following the original driver's contract: `CONNECT` negotiates version
//! 1.2 with a symmetric client/server heartbeat (default 20000 ms),
//! `SUBSCRIBE` requests `ack:client-individual`, each delivered `MESSAGE` is
//! acknowledged individually by its `ack` header before being handed to the
//! sink, and the read loop idles 400 ms between empty polls while sending a
//! heartbeat newline whenever nothing has been sent for a full heartbeat
//! interval.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bridge_core::{codec, Envelope};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::Mutex as AsyncMutex;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::adapter::AdapterSink;
use super::base::{TransportDriver, TransportError, TransportParams};

const STOMP_VERSION: &str = "1.2";
const DEFAULT_HEARTBEAT_MS: u64 = 20_000;
const IDLE_POLL: Duration = Duration::from_millis(400);
const NUL: u8 = 0;

/// A parsed STOMP frame: command, headers in wire order, and body.
#[derive(Debug, Clone, Default)]
struct Frame {
    command: String,
    headers: Vec<(String, String)>,
    body: String,
}

impl Frame {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
    }

    fn to_wire(&self) -> Vec<u8> {
        let mut out = format!("{}\n", self.command);
        for (k, v) in &self.headers {
            out.push_str(k);
            out.push(':');
            out.push_str(v);
            out.push('\n');
        }
        out.push('\n');
        out.push_str(&self.body);
        let mut bytes = out.into_bytes();
        bytes.push(NUL);
        bytes
    }
}

struct StompConnection {
    reader: BufReader<tokio::net::tcp::OwnedReadHalf>,
    writer: tokio::net::tcp::OwnedWriteHalf,
    last_sent: Instant,
}

impl StompConnection {
    async fn write_frame(&mut self, frame: &Frame) -> Result<(), TransportError> {
        self.writer.write_all(&frame.to_wire()).await?;
        self.last_sent = Instant::now();
        Ok(())
    }

    async fn write_heartbeat(&mut self) -> Result<(), TransportError> {
        self.writer.write_all(b"\n").await?;
        self.last_sent = Instant::now();
        Ok(())
    }

    /// Reads one NUL-terminated frame. Returns `Ok(None)` on a bare
    /// heartbeat newline (no command line read before the terminator).
    async fn read_frame(&mut self) -> Result<Option<Frame>, TransportError> {
        let mut raw = Vec::new();
        self.reader.read_until(NUL, &mut raw).await?;
        if raw.is_empty() {
            return Err(TransportError::Broker("stomp connection closed".to_string()));
        }
        if raw.last() == Some(&NUL) {
            raw.pop();
        }
        let text = String::from_utf8_lossy(&raw);
        let text = text.trim_start_matches('\n');
        if text.is_empty() {
            return Ok(None);
        }
        let mut lines = text.splitn(2, "\n\n");
        let head = lines.next().unwrap_or_default();
        let body = lines.next().unwrap_or_default().to_string();
        let mut head_lines = head.lines();
        let command = head_lines.next().unwrap_or_default().to_string();
        let headers = head_lines
            .filter_map(|line| {
                let mut parts = line.splitn(2, ':');
                let key = parts.next()?.to_string();
                let value = parts.next()?.to_string();
                Some((key, value))
            })
            .collect();
        Ok(Some(Frame { command, headers, body }))
    }
}

pub struct StompTransport {
    params: TransportParams,
    conn: AsyncMutex<Option<StompConnection>>,
}

impl StompTransport {
    pub fn new(params: TransportParams) -> Self {
        Self { params, conn: AsyncMutex::new(None) }
    }

    fn heartbeat_ms(&self) -> u64 {
        self.params.heartbeat.map(|d| d.as_millis() as u64).unwrap_or(DEFAULT_HEARTBEAT_MS)
    }

    async fn open_stream(&self) -> Result<StompConnection, TransportError> {
        let stream = TcpStream::connect((self.params.address.as_str(), self.params.port)).await?;
        let (read_half, write_half) = stream.into_split();
        Ok(StompConnection { reader: BufReader::new(read_half), writer: write_half, last_sent: Instant::now() })
    }

    async fn negotiate(&self, conn: &mut StompConnection) -> Result<(), TransportError> {
        let beat = self.heartbeat_ms().to_string();
        let mut headers = vec![
            ("accept-version".to_string(), STOMP_VERSION.to_string()),
            ("heart-beat".to_string(), format!("{},{}", beat, beat)),
            ("host".to_string(), self.params.address.clone()),
        ];
        if let Some(user) = &self.params.user {
            headers.push(("login".to_string(), user.clone()));
        }
        if let Some(pass) = &self.params.password {
            headers.push(("passcode".to_string(), pass.clone()));
        }
        conn.write_frame(&Frame { command: "CONNECT".to_string(), headers, body: String::new() }).await?;
        loop {
            match conn.read_frame().await? {
                Some(frame) if frame.command == "CONNECTED" => return Ok(()),
                Some(frame) if frame.command == "ERROR" => {
                    return Err(TransportError::Connect(frame.body));
                }
                _ => continue,
            }
        }
    }
}

#[async_trait]
impl TransportDriver for StompTransport {
    fn name(&self) -> &str {
        "stomp"
    }

    async fn connect(&self) -> Result<(), TransportError> {
        let mut conn = self.open_stream().await?;
        self.negotiate(&mut conn).await?;
        *self.conn.lock().await = Some(conn);
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), TransportError> {
        if let Some(mut conn) = self.conn.lock().await.take() {
            let frame = Frame { command: "DISCONNECT".to_string(), headers: Vec::new(), body: String::new() };
            conn.write_frame(&frame).await.ok();
        }
        Ok(())
    }

    async fn publish(&self, envelope: &Envelope) -> Result<(), TransportError> {
        let mut guard = self.conn.lock().await;
        let conn =
            guard.as_mut().ok_or_else(|| TransportError::Config("stomp transport not connected".to_string()))?;
        let frame = Frame {
            command: "SEND".to_string(),
            headers: vec![("destination".to_string(), self.params.channel.clone())],
            body: codec::encode(envelope),
        };
        conn.write_frame(&frame).await
    }

    async fn do_listen(&self, sink: Arc<AdapterSink>, cancel: CancellationToken) -> Result<(), TransportError> {
        let mut guard = self.conn.lock().await;
        let conn =
            guard.as_mut().ok_or_else(|| TransportError::Config("stomp transport not connected".to_string()))?;

        let subscribe = Frame {
            command: "SUBSCRIBE".to_string(),
            headers: vec![
                ("destination".to_string(), self.params.channel.clone()),
                ("id".to_string(), self.params.client_id.clone()),
                ("ack".to_string(), "client-individual".to_string()),
            ],
            body: String::new(),
        };
        conn.write_frame(&subscribe).await?;

        let heartbeat_interval = Duration::from_millis(self.heartbeat_ms());
        loop {
            if cancel.is_cancelled() {
                break;
            }
            tokio::select! {
                frame = conn.read_frame() => {
                    match frame? {
                        Some(frame) if frame.command == "MESSAGE" => {
                            if let Some(ack_id) = frame.header("ack").map(str::to_string) {
                                let ack = Frame {
                                    command: "ACK".to_string(),
                                    headers: vec![("id".to_string(), ack_id)],
                                    body: String::new(),
                                };
                                conn.write_frame(&ack).await?;
                            }
                            sink.accept(frame.body.as_bytes());
                        }
                        Some(frame) if frame.command == "ERROR" => {
                            return Err(TransportError::Broker(frame.body));
                        }
                        _ => {}
                    }
                }
                _ = tokio::time::sleep(IDLE_POLL) => {
                    if conn.last_sent.elapsed() > heartbeat_interval {
                        conn.write_heartbeat().await?;
                    }
                }
                _ = cancel.cancelled() => break,
            }
        }

        let unsubscribe = Frame {
            command: "UNSUBSCRIBE".to_string(),
            headers: vec![("id".to_string(), self.params.client_id.clone())],
            body: String::new(),
        };
        conn.write_frame(&unsubscribe).await.ok();
        Ok(())
    }
}

#[cfg(test)]
#[path = "stomp_tests.rs"]
mod tests;
