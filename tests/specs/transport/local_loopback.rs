// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Local loopback delivery: an envelope handed to `local_transport.notify_server`
//! round-trips through the local Unix socket and the queue-pool, and the
//! execution manager's dispatch sees the exact same envelope the caller sent.

use crate::prelude::*;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;

struct CapturingHandler {
    seen: Arc<Mutex<Option<Envelope>>>,
}

#[async_trait]
impl Handler for CapturingHandler {
    fn command_methods(&self) -> &'static [&'static str] {
        &["ping"]
    }

    async fn invoke(&self, _method: &str, envelope: &Envelope) -> Result<(), HandlerError> {
        *self.seen.lock() = Some(envelope.clone());
        Ok(())
    }
}

#[tokio::test]
async fn notify_server_delivers_the_same_envelope_to_the_targeted_handler() {
    let seen = Arc::new(Mutex::new(None));
    let (_guard, path) = registry_file("LOOP@BACK = test.CapturingHandler\n");

    let mut config = base_config();
    config.command_registry_path = Some(path);

    let mut registry = HandlerRegistry::new();
    let seen_for_factory = seen.clone();
    registry.register("test.CapturingHandler", move || {
        Box::new(CapturingHandler { seen: seen_for_factory.clone() }) as Box<dyn Handler>
    });

    let started = start_with(&config, Arc::new(registry)).await;

    let gen = UuidIdGen;
    let sent = Envelope::new_command(
        &gen,
        "LOOP",
        "BACK",
        "ping",
        Params::new(vec![serde_json::json!(42)], Default::default()),
    )
    .expect("build command envelope");

    started.local_transport.notify_server(&sent).await.expect("notify_server");

    wait_until(std::time::Duration::from_secs(2), || seen.lock().is_some()).await;

    let received = seen.lock().clone().expect("handler recorded an envelope");
    assert_eq!(received, sent);

    started.execution_manager.stop().await;
    started.supervisor.clone().stop().await.expect("supervisor stop");
}
