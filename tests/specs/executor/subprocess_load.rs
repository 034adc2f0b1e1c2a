// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subprocess executor: the child-side dispatch loop executes every
//! submitted command, and stopping a live subprocess executor joins its
//! child within 5 s without leaking the process.

use crate::prelude::*;
use async_trait::async_trait;
use bridge_engine::{run_subprocess_worker, CommandTable, Executor, EventTable, RoutingTables, SubprocessExecutor};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;

struct CountingHandler {
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl Handler for CountingHandler {
    fn command_methods(&self) -> &'static [&'static str] {
        &["say_hi"]
    }

    async fn invoke(&self, _method: &str, _envelope: &Envelope) -> Result<(), HandlerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn routing_tables(calls: Arc<AtomicUsize>) -> RoutingTables {
    let commands = CommandTable::parse("DEMO@HELLO = test.Counter\n").expect("parse command table");
    let events = EventTable::parse("").expect("parse event table");
    let mut registry = HandlerRegistry::new();
    registry.register("test.Counter", move || Box::new(CountingHandler { calls: calls.clone() }) as Box<dyn Handler>);
    RoutingTables {
        commands: Arc::new(commands),
        events: Arc::new(events),
        registry: Arc::new(registry),
        config: Arc::new(Config::default()),
        module_config: Arc::new(bridge_core::ModuleConfig::default()),
    }
}

/// Plays the role of a forked child's stdin with an in-memory duplex pipe,
/// exercising the exact per-line decode/dispatch loop a real subprocess
/// worker runs.
#[tokio::test]
async fn the_child_dispatch_loop_executes_every_submitted_command() {
    let calls = Arc::new(AtomicUsize::new(0));
    let tables = routing_tables(calls.clone());
    let (mut writer, reader) = tokio::io::duplex(64 * 1024);

    let worker = tokio::spawn(run_subprocess_worker(reader, tables));

    let gen = UuidIdGen;
    for _ in 0..100 {
        let envelope = Envelope::new_command(&gen, "DEMO", "HELLO", "say_hi", Params::empty()).expect("build command envelope");
        let line = format!("{}\n", codec::encode(&envelope));
        writer.write_all(line.as_bytes()).await.expect("write command line");
    }
    let shutdown = Envelope::new_shutdown(&gen);
    writer.write_all(format!("{}\n", codec::encode(&shutdown)).as_bytes()).await.expect("write shutdown line");
    drop(writer);

    worker.await.expect("worker task join").expect("worker loop result");
    assert_eq!(calls.load(Ordering::SeqCst), 100);
}

/// Stops a live subprocess executor backed by a real (trivial) child
/// process and asserts the join completes within the 5 s budget.
#[tokio::test]
async fn stopping_a_subprocess_executor_joins_the_child_within_five_seconds() {
    let module_key = ModuleKey::new("DEMO", "HELLO");
    let executor = SubprocessExecutor::spawn(module_key.clone(), "cat", &[]).expect("spawn subprocess executor");

    let gen = UuidIdGen;
    for _ in 0..5 {
        let envelope = Envelope::new_command(&gen, "DEMO", "HELLO", "say_hi", Params::empty()).expect("build command envelope");
        executor.submit(envelope).await;
    }

    tokio::time::timeout(std::time::Duration::from_secs(5), executor.stop()).await.expect("stop joins within 5s");
}
