// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate.

use std::path::PathBuf;

/// Path to the TOML config file. `BRIDGE_CONFIG` wins over the default
/// `bridge.toml` in the current directory.
pub fn config_path() -> PathBuf {
    std::env::var("BRIDGE_CONFIG").map(PathBuf::from).unwrap_or_else(|_| PathBuf::from("bridge.toml"))
}

/// `RUST_LOG`-style filter for `tracing-subscriber`, defaulting to `info`.
pub fn log_filter() -> String {
    std::env::var("BRIDGE_LOG").unwrap_or_else(|_| "info".to_string())
}
