// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event fan-out: one event table entry naming two handler/method pairs
//! delivers the event to both, each invoked exactly once.

use crate::prelude::*;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

struct CountingBeatHandler {
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl Handler for CountingBeatHandler {
    fn event_methods(&self) -> &'static [&'static str] {
        &["on_beat"]
    }

    async fn invoke(&self, _method: &str, _envelope: &Envelope) -> Result<(), HandlerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[tokio::test]
async fn an_event_with_two_handler_pairs_invokes_both_exactly_once() {
    let a_calls = Arc::new(AtomicUsize::new(0));
    let b_calls = Arc::new(AtomicUsize::new(0));
    let (_guard, path) = registry_file("[DEMO@TICK]\nbeat = a.A:on_beat, b.B:on_beat\n");

    let mut config = base_config();
    config.event_registry_path = Some(path);

    let mut registry = HandlerRegistry::new();
    let a_for_factory = a_calls.clone();
    registry.register("a.A", move || Box::new(CountingBeatHandler { calls: a_for_factory.clone() }) as Box<dyn Handler>);
    let b_for_factory = b_calls.clone();
    registry.register("b.B", move || Box::new(CountingBeatHandler { calls: b_for_factory.clone() }) as Box<dyn Handler>);

    let started = start_with(&config, Arc::new(registry)).await;

    let gen = UuidIdGen;
    let envelope = Envelope::new_event(&gen, "DEMO", "TICK", "beat", Params::empty()).expect("build event envelope");
    started.local_transport.notify_server(&envelope).await.expect("notify_server");

    wait_until(std::time::Duration::from_secs(2), || {
        a_calls.load(Ordering::SeqCst) == 1 && b_calls.load(Ordering::SeqCst) == 1
    })
    .await;

    assert_eq!(a_calls.load(Ordering::SeqCst), 1);
    assert_eq!(b_calls.load(Ordering::SeqCst), 1);

    started.execution_manager.stop().await;
    started.supervisor.clone().stop().await.expect("supervisor stop");
}
