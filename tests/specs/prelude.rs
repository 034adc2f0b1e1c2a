// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared scaffolding for the workspace specs: a minimal [`Config`]
//! builder, a poll-until-true helper for the scenarios' "within N s"
//! wording, and the handful of crates every scenario file pulls in.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

pub use bridge_adapters::{TransportDriver, UnixTransport};
pub use bridge_core::{codec, Config, Envelope, IdGen, ModuleKey, Params, ShutdownConfig, TransportConfig, TransportKind, UuidIdGen};
pub use bridge_daemon::{lifecycle, LifecycleComponent, Started, Supervisor};
pub use bridge_engine::{Handler, HandlerContext, HandlerError, HandlerRegistry};

/// A `bridge.toml`-equivalent [`Config`] with no transports and an
/// ephemeral (`port: 0`) shutdown control port, so tests never collide on
/// a fixed port.
pub fn base_config() -> Config {
    Config { shutdown: ShutdownConfig { addr: "127.0.0.1".to_string(), port: 0 }, ..Config::default() }
}

/// Writes `text` to a fresh temp file and returns its path. The returned
/// [`tempfile::NamedTempFile`] must be kept alive for as long as the path
/// is in use; dropping it deletes the file.
pub fn registry_file(text: &str) -> (tempfile::NamedTempFile, PathBuf) {
    let file = tempfile::NamedTempFile::new().expect("create temp registry file");
    std::fs::write(file.path(), text).expect("write temp registry file");
    let path = file.path().to_path_buf();
    (file, path)
}

/// Starts the daemon with `registry` already populated, matching the
/// application-wiring hook [`bridge_daemon::startup_with_registry`] exists
/// for: a generic `bridged` binary has no handler classes built in, so
/// tests that need dispatch to actually invoke something supply their own
/// registry rather than going through the plain `startup`.
pub async fn start_with(config: &Config, registry: Arc<HandlerRegistry>) -> Started {
    lifecycle::startup_with_registry(config, registry).await.expect("daemon startup")
}

/// Polls `condition` every 10 ms until it returns `true` or `timeout`
/// elapses, panicking in the latter case. Used for the scenarios' "expect
/// within N s" assertions, which race against async dispatch rather than
/// a fixed delay.
pub async fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if condition() {
            return;
        }
        if tokio::time::Instant::now() >= deadline {
            panic!("condition not met within {timeout:?}");
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
