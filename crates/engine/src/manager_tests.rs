use super::*;
use crate::registry::{CommandTable, EventTable, Handler, HandlerError, HandlerRegistry};
use bridge_core::FixedIdGen;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

struct CountingHandler {
    calls: Arc<AtomicUsize>,
}

#[async_trait::async_trait]
impl Handler for CountingHandler {
    fn command_methods(&self) -> &'static [&'static str] {
        &["say_hi"]
    }

    async fn invoke(&self, _method: &str, _envelope: &Envelope) -> Result<(), HandlerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn manager_with(calls: Arc<AtomicUsize>, config: ExecutionManagerConfig) -> Arc<ExecutionManager> {
    let commands = CommandTable::parse("DEMO@HELLO = pkg.CountingHandler\n").unwrap();
    let events = EventTable::parse("").unwrap();
    let mut registry = HandlerRegistry::new();
    registry.register("pkg.CountingHandler", move || Box::new(CountingHandler { calls: calls.clone() }) as Box<dyn Handler>);
    let tables = RoutingTables {
        commands: Arc::new(commands),
        events: Arc::new(events),
        registry: Arc::new(registry),
        config: Arc::new(bridge_core::Config::default()),
        module_config: Arc::new(bridge_core::ModuleConfig::default()),
    };
    ExecutionManager::with_id_gen(tables, config, Arc::new(FixedIdGen::new("gen".to_string())))
}

/// A `decode_json`-ready payload: the manager's `push` receives JSON already
/// stripped of its base64 envelope by the adapter layer, so tests build it
/// directly rather than round-tripping through the codec's base64 encoder.
fn encode_command(module: &str, submodule: &str, command: &str) -> Vec<u8> {
    format!(
        r#"{{"msgtype":0,"msgid":"wire-1","module":"{module}","submodule":"{submodule}","command":"{command}","data":[[],{{}}],"options":{{}}}}"#
    )
    .into_bytes()
}

#[tokio::test]
async fn creates_an_executor_on_first_dispatch_and_reuses_it() {
    let calls = Arc::new(AtomicUsize::new(0));
    let manager = manager_with(calls.clone(), ExecutionManagerConfig::default());

    manager.push(encode_command("DEMO", "HELLO", "say_hi"));
    manager.push(encode_command("DEMO", "HELLO", "say_hi"));
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(manager.executors.lock().len(), 1);
    manager.stop().await;
}

#[tokio::test]
async fn drops_dispatch_for_an_unknown_module() {
    let calls = Arc::new(AtomicUsize::new(0));
    let manager = manager_with(calls.clone(), ExecutionManagerConfig::default());

    manager.push(encode_command("NOPE", "NOPE", "say_hi"));
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(manager.executors.lock().is_empty());
}

#[tokio::test]
async fn malformed_payload_is_logged_and_dropped() {
    let calls = Arc::new(AtomicUsize::new(0));
    let manager = manager_with(calls.clone(), ExecutionManagerConfig::default());

    manager.push(b"not valid json".to_vec());
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn simple_model_collapses_every_module_into_one_executor() {
    let calls = Arc::new(AtomicUsize::new(0));
    let config = ExecutionManagerConfig { simple_model: true, thread_pool_size: 4, ..Default::default() };
    let manager = manager_with(calls.clone(), config);

    manager.push(encode_command("DEMO", "HELLO", "say_hi"));
    manager.push(encode_command("ANY", "THING", "say_hi"));
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(manager.executors.lock().len(), 1);
    manager.stop().await;
}

#[tokio::test]
async fn production_mode_with_an_unspawnable_worker_drops_the_envelope_without_panicking() {
    let calls = Arc::new(AtomicUsize::new(0));
    let config = ExecutionManagerConfig {
        production_mode: true,
        worker_program: Some(std::path::PathBuf::from("/nonexistent/bridge-worker-binary")),
        ..Default::default()
    };
    let manager = manager_with(calls.clone(), config);

    manager.push(encode_command("DEMO", "HELLO", "say_hi"));
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(manager.executors.lock().is_empty());
}
