// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Command happy path: a command-tagged handler method, dispatched through
//! a live supervisor, is invoked with the sent arguments.

use crate::prelude::*;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;

struct HelloHandler {
    greetings: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl Handler for HelloHandler {
    fn command_methods(&self) -> &'static [&'static str] {
        &["say_hi"]
    }

    async fn invoke(&self, _method: &str, envelope: &Envelope) -> Result<(), HandlerError> {
        let Envelope::Command { data, .. } = envelope else { return Ok(()) };
        let name = data.args.first().and_then(|v| v.as_str()).unwrap_or_default();
        self.greetings.lock().push(format!("hi {name}"));
        Ok(())
    }
}

#[tokio::test]
async fn a_command_tagged_method_is_invoked_with_the_sent_argument() {
    let greetings = Arc::new(Mutex::new(Vec::new()));
    let (_guard, path) = registry_file("DEMO@HELLO = test.HelloHandler\n");

    let mut config = base_config();
    config.command_registry_path = Some(path);

    let mut registry = HandlerRegistry::new();
    let greetings_for_factory = greetings.clone();
    registry.register("test.HelloHandler", move || {
        Box::new(HelloHandler { greetings: greetings_for_factory.clone() }) as Box<dyn Handler>
    });

    let started = start_with(&config, Arc::new(registry)).await;

    let gen = UuidIdGen;
    let envelope = Envelope::new_command(
        &gen,
        "DEMO",
        "HELLO",
        "say_hi",
        Params::new(vec![serde_json::json!("world")], Default::default()),
    )
    .expect("build command envelope");

    started.local_transport.notify_server(&envelope).await.expect("notify_server");

    wait_until(std::time::Duration::from_secs(2), || greetings.lock().iter().any(|g| g == "hi world")).await;

    started.execution_manager.stop().await;
    started.supervisor.clone().stop().await.expect("supervisor stop");
}
