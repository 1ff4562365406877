//! `rpc-server` binary entry point.
//!
//! Startup sequence:
//! 1. Load and validate [`Config`] from environment variables.
//! 2. Initialise the telemetry pipeline.
//! 3. Wire the handlers into a [`ServiceRegistry`].
//! 4. Ensure TLS credentials exist and start listening.
//! 5. Wait for Ctrl-C or a `shutdown` call, then drain and exit.

use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use rpc_server::config::Config;
use rpc_server::node::NodeService;
use rpc_server::{telemetry, CertificateProvider, RpcServer, ServiceRegistry};

#[tokio::main]
async fn main() -> Result<()> {
    // -----------------------------------------------------------------------
    // 1. Configuration
    // -----------------------------------------------------------------------
    let cfg = Config::from_env().map_err(|e| {
        // Telemetry is not yet up; write to stderr directly.
        eprintln!("ERROR: configuration invalid: {e:#}");
        e
    })?;

    // -----------------------------------------------------------------------
    // 2. Telemetry
    // -----------------------------------------------------------------------
    telemetry::init_telemetry(cfg.otel_exporter_otlp_endpoint.as_deref(), &cfg.log_level)?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        rpc_host = %cfg.rpc_host,
        rpc_port = cfg.rpc_port,
        "rpc-server starting"
    );

    // -----------------------------------------------------------------------
    // 3. Handlers
    // -----------------------------------------------------------------------
    let node = Arc::new(NodeService::new());
    let registry = ServiceRegistry::new(node.clone(), node.clone());

    // -----------------------------------------------------------------------
    // 4. RPC server
    // -----------------------------------------------------------------------
    let certificates = CertificateProvider::new().with_key_bits(cfg.tls_key_bits);
    let mut server = RpcServer::with_certificate_provider(registry, certificates);
    if !server.listen(&cfg.listen_config()).await? {
        anyhow::bail!("could not start RPC server on port {}", cfg.rpc_port);
    }

    // -----------------------------------------------------------------------
    // 5. Shutdown
    // -----------------------------------------------------------------------
    tokio::select! {
        res = tokio::signal::ctrl_c() => {
            res?;
            info!("received interrupt");
        }
        _ = node.shutdown_requested() => {}
    }

    server.close().await;
    telemetry::shutdown_telemetry();
    Ok(())
}
