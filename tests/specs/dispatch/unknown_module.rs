// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A command addressed to a module absent from both routing tables is
//! dropped silently (besides an error-level log record); the supervisor
//! keeps running regardless.

use crate::prelude::*;

#[tokio::test]
async fn an_unknown_module_is_dropped_without_disturbing_the_supervisor() {
    let config = base_config();
    let started = start_with(&config, std::sync::Arc::new(HandlerRegistry::new())).await;

    let gen = UuidIdGen;
    let envelope = Envelope::new_command(&gen, "NOPE", "NOPE", "say_hi", Params::empty()).expect("build command envelope");
    started.local_transport.notify_server(&envelope).await.expect("notify_server");

    // Dispatch for an unknown module is fire-and-forget; give it time to
    // resolve (and drop) before asserting the supervisor never flinched.
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;

    assert!(started.supervisor.is_running());

    started.execution_manager.stop().await;
    started.supervisor.clone().stop().await.expect("supervisor stop");
}
