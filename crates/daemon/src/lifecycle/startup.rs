// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wires a loaded [`Config`] into a running [`Supervisor`]: the local
//! send-to-self transport, every configured `mq.transport.{i}` driver, the
//! queue-pool, the execution manager, and the shutdown monitor.

use std::net::SocketAddr;
use std::sync::Arc;

use bridge_adapters::{
    AdapterSink, AmqpTransport, Base64JsonDecodeAdapter, KafkaTransport, MqttTransport, RedisTransport,
    StompTransport, TcpLocalTransport, TransportDriver, TransportParams, UnixTransport,
};
use bridge_core::{Config, ModuleConfig, PayloadSink, TransportConfig, TransportKind};
use bridge_engine::{CommandTable, EventTable, ExecutionManager, ExecutionManagerConfig, HandlerRegistry, QueuePool, RoutingTables};

use super::component::LifecycleError;
use super::provider::RedisProvider;
use super::shutdown::ShutdownMonitor;
use super::supervisor::Supervisor;
use super::transport::TransportComponent;

/// Everything [`startup`] built, handed back so `main` can hold the pieces
/// it needs after the supervisor starts (the local transport's send-to-self
/// path, and the execution manager to stop on the way down).
pub struct Started {
    pub supervisor: Arc<Supervisor>,
    pub local_transport: Arc<UnixTransport>,
    pub execution_manager: Arc<ExecutionManager>,
}

/// `/tmp/bridge-{pid}-{n}.sock`: unique per process and per call so
/// concurrently-running test suites (and instances) never bind the same
/// path, without requiring the caller to set `BRIDGE_LOCAL_SOCKET`.
fn default_local_socket_path() -> String {
    use std::sync::atomic::{AtomicU64, Ordering};
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    std::env::temp_dir().join(format!("bridge-{}-{}.sock", std::process::id(), n)).to_string_lossy().to_string()
}

/// Builds the routing tables a subprocess worker needs (`--worker` mode
/// loads only this, skipping transports and the shutdown monitor). Handler
/// classes are resolved against `registry`, which the embedding binary
/// populates with its own `register_command!`/`register_event!` calls
/// before startup — there is no dynamic import-by-string, so an empty
/// registry (the default `bridged` entrypoint's choice) never dispatches
/// anything, it only routes to "unknown handler class" drops.
pub fn load_tables(config: &Config, registry: Arc<HandlerRegistry>) -> Result<RoutingTables, LifecycleError> {
    let commands_text = match &config.command_registry_path {
        Some(path) => std::fs::read_to_string(path)?,
        None => String::new(),
    };
    let events_text = match &config.event_registry_path {
        Some(path) => std::fs::read_to_string(path)?,
        None => String::new(),
    };
    let commands = CommandTable::parse(&commands_text)?;
    let events = EventTable::parse(&events_text)?;
    Ok(RoutingTables {
        commands: Arc::new(commands),
        events: Arc::new(events),
        registry,
        config: Arc::new(config.clone()),
        module_config: Arc::new(ModuleConfig::default()),
    })
}

fn build_driver(index: usize, cfg: &TransportConfig) -> Result<Arc<dyn TransportDriver>, LifecycleError> {
    let params = TransportParams::from_config(index, cfg);
    let driver: Arc<dyn TransportDriver> = match cfg.kind {
        TransportKind::Unix => Arc::new(UnixTransport::new(params.address.clone())),
        TransportKind::Local => {
            let addr: SocketAddr = format!("{}:{}", params.address, params.port)
                .parse()
                .map_err(|e: std::net::AddrParseError| LifecycleError::Other(e.to_string()))?;
            Arc::new(TcpLocalTransport::new(addr))
        }
        TransportKind::Stomp => Arc::new(StompTransport::new(params)),
        TransportKind::Mqtt => Arc::new(MqttTransport::new(params)),
        TransportKind::Amqp => Arc::new(AmqpTransport::new(params)),
        TransportKind::Kafka => Arc::new(KafkaTransport::new(params)),
        TransportKind::Redis => {
            let url = format!("redis://{}:{}", params.address, params.port);
            Arc::new(RedisTransport::new(params, url))
        }
    };
    Ok(driver)
}

/// Builds the supervised set and starts it with an empty handler registry.
/// The returned [`Supervisor`] owns every transport and the shutdown
/// monitor; the caller is expected to block on `supervisor.run_until_shutdown()`
/// next.
pub async fn startup(config: &Config) -> Result<Started, LifecycleError> {
    startup_with_registry(config, Arc::new(HandlerRegistry::new())).await
}

/// Same as [`startup`], but with handler classes pre-registered by the
/// caller — the hook an embedding binary uses to wire its own handler
/// implementations in before the daemon starts accepting traffic.
pub async fn startup_with_registry(config: &Config, registry: Arc<HandlerRegistry>) -> Result<Started, LifecycleError> {
    let tables = load_tables(config, registry)?;
    let execution_manager = ExecutionManager::new(
        tables,
        ExecutionManagerConfig {
            simple_model: config.simple_model,
            thread_pool_size: bridge_engine::DEFAULT_THREAD_POOL_SIZE,
            production_mode: config.production_mode,
            worker_program: None,
        },
    );

    let manager_sink: Arc<dyn PayloadSink> = Arc::new(execution_manager.clone());
    let queue_pool = QueuePool::with_default_capacity(vec![manager_sink]);
    let queue_sink: Arc<dyn PayloadSink> = queue_pool.clone();

    let local_transport = Arc::new(UnixTransport::new(
        std::env::var("BRIDGE_LOCAL_SOCKET").unwrap_or_else(|_| default_local_socket_path()),
    ));

    let supervisor = Supervisor::new("bridge");

    let local_sink = Arc::new(AdapterSink::new(Arc::new(Base64JsonDecodeAdapter), queue_sink.clone()));
    supervisor.add(TransportComponent::new(local_transport.clone() as Arc<dyn TransportDriver>, local_sink));

    for (index, transport_cfg) in config.transports.iter().enumerate() {
        let driver = build_driver(index, transport_cfg)?;
        let adapter = bridge_adapters::resolve_adapter(transport_cfg.adapter_class.as_deref());
        let sink = Arc::new(AdapterSink::new(adapter, queue_sink.clone()));
        supervisor.add(TransportComponent::new(driver, sink));
    }

    if let Some(redis) = &config.redis {
        supervisor.add(RedisProvider::new(redis.clone()));
    }

    supervisor.add(ShutdownMonitor::new(config.shutdown.clone(), supervisor.clone()));

    supervisor.clone().start().await?;

    Ok(Started { supervisor, local_transport, execution_manager })
}

#[cfg(test)]
#[path = "startup_tests.rs"]
mod tests;
