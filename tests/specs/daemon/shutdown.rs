// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Control-port shutdown, driven against the real `bridged` binary: connect
//! to the shutdown address, write `shut\n`, and expect the process to exit
//! cleanly within 5 s.

use std::sync::atomic::{AtomicU16, Ordering};
use std::time::{Duration, Instant};

use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

fn unique_port() -> u16 {
    static COUNTER: AtomicU16 = AtomicU16::new(0);
    let offset = COUNTER.fetch_add(1, Ordering::Relaxed);
    20000 + ((std::process::id() as u16).wrapping_add(offset) % 5000)
}

#[tokio::test]
async fn writing_the_shutdown_line_stops_the_daemon_within_five_seconds() {
    let port = unique_port();
    let config_dir = tempfile::tempdir().expect("create temp config dir");
    let config_path = config_dir.path().join("bridge.toml");
    std::fs::write(&config_path, format!("[shutdown]\naddr = \"127.0.0.1\"\nport = {port}\n")).expect("write bridge.toml");

    let bridged = assert_cmd::cargo::cargo_bin("bridged");
    let mut child = std::process::Command::new(bridged)
        .arg("--config")
        .arg(&config_path)
        .spawn()
        .expect("spawn bridged");

    // The control port binds asynchronously after the process starts;
    // retry the connection until it accepts or we give up.
    let deadline = Instant::now() + Duration::from_secs(5);
    let mut stream = loop {
        match TcpStream::connect(("127.0.0.1", port)).await {
            Ok(stream) => break stream,
            Err(_) if Instant::now() < deadline => tokio::time::sleep(Duration::from_millis(20)).await,
            Err(err) => panic!("control port never came up: {err}"),
        }
    };
    stream.write_all(b"shut\n").await.expect("write shutdown line");
    drop(stream);

    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        if let Some(status) = child.try_wait().expect("poll child status") {
            assert!(status.success(), "bridged exited non-zero: {status:?}");
            return;
        }
        if Instant::now() >= deadline {
            let _ = child.kill();
            panic!("bridged did not exit within 5s of the shutdown line");
        }
        std::thread::sleep(Duration::from_millis(20));
    }
}
