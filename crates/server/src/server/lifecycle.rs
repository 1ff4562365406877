//! [`RpcServer`]: owns the listening endpoint from bind to drained shutdown.
//!
//! ```text
//! Created --listen ok--> Bound --close--> ShuttingDown --drained--> Stopped
//!    ^                                                                  |
//!    +-- listen failed (bind error / port mismatch)     close again ---+ (no-op)
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use axum::{extract::Request, Router};
use hyper::{body::Incoming, service::service_fn};
use hyper_util::{
    rt::{TokioExecutor, TokioIo},
    server::conn::auto,
};
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_rustls::TlsAcceptor;
use tokio_util::{sync::CancellationToken, task::TaskTracker};
use tower::Service;
use tracing::{debug, error, info, warn};

use super::{registry::ServiceRegistry, router, tls};
use crate::cert::{CertError, CertificateProvider, Clock, SystemClock};

/// Lowest port the server may be asked to listen on.
pub const MIN_PORT: u16 = 1024;

const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// Where and with which credentials to listen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenConfig {
    pub host: String,
    /// Must be in `1024..=65535`.
    pub port: u16,
    pub tls_cert_path: PathBuf,
    pub tls_key_path: PathBuf,
}

/// Lifecycle state of an [`RpcServer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    Created,
    Bound,
    ShuttingDown,
    Stopped,
}

/// Failures of [`RpcServer::listen`] that the caller must handle.
///
/// A port that is already taken is not an error; `listen` reports it by
/// returning `Ok(false)`.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Certificate(#[from] CertError),

    /// The certificate or key on disk could not be turned into a TLS config.
    #[error("invalid TLS credentials: {0:#}")]
    Tls(anyhow::Error),

    #[error("cannot listen while the server is {0:?}")]
    InvalidState(ServerState),
}

struct Running {
    shutdown: CancellationToken,
    task: JoinHandle<()>,
    local_addr: SocketAddr,
}

/// TLS RPC server serving both service contracts on one endpoint.
pub struct RpcServer<R = OsRng, C = SystemClock> {
    router: Router,
    certificates: CertificateProvider<R, C>,
    state: ServerState,
    running: Option<Running>,
}

impl RpcServer {
    /// Server that generates missing credentials with the OS RNG and system clock.
    pub fn new(registry: ServiceRegistry) -> Self {
        Self::with_certificate_provider(registry, CertificateProvider::new())
    }
}

impl<R, C> RpcServer<R, C>
where
    R: RngCore + CryptoRng,
    C: Clock,
{
    pub fn with_certificate_provider(
        registry: ServiceRegistry,
        certificates: CertificateProvider<R, C>,
    ) -> Self {
        for binding in registry.bindings() {
            debug!(
                contract = binding.contract,
                methods = binding.methods.len(),
                "registered service"
            );
        }
        Self {
            router: router::build(registry),
            certificates,
            state: ServerState::Created,
            running: None,
        }
    }

    pub fn state(&self) -> ServerState {
        self.state
    }

    /// Address actually bound, while the server is running.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.running.as_ref().map(|r| r.local_addr)
    }

    /// Resolve credentials, bind `config.host:config.port`, and start serving.
    ///
    /// Returns `Ok(true)` once connections are being accepted, or `Ok(false)`
    /// if the port could not be bound; the server then stays
    /// [`ServerState::Created`] and `listen` may be retried.
    ///
    /// # Panics
    ///
    /// Panics before touching the filesystem or network if `config.port` is
    /// below 1024.
    ///
    /// # Errors
    ///
    /// - [`ServerError::Certificate`] if the credentials cannot be read,
    ///   generated, or persisted.
    /// - [`ServerError::Tls`] if the credentials on disk are not valid PEM.
    /// - [`ServerError::InvalidState`] if the server has already been started.
    pub async fn listen(&mut self, config: &ListenConfig) -> Result<bool, ServerError> {
        assert!(
            config.port >= MIN_PORT,
            "port must be an integer between 1024 and 65535"
        );
        if self.state != ServerState::Created {
            return Err(ServerError::InvalidState(self.state));
        }

        let certificate = self
            .certificates
            .ensure(&config.tls_cert_path, &config.tls_key_path)?;
        let tls_config = tls::build_server_config(&certificate.cert_pem, &certificate.key_pem)
            .map_err(ServerError::Tls)?;

        let listener = match TcpListener::bind((config.host.as_str(), config.port)).await {
            Ok(listener) => listener,
            Err(e) => {
                error!(
                    host = %config.host,
                    port = config.port,
                    error = %e,
                    "could not bind RPC server to port"
                );
                return Ok(false);
            }
        };
        let local_addr = match listener.local_addr() {
            Ok(addr) if addr.port() == config.port => addr,
            bound => {
                error!(
                    host = %config.host,
                    port = config.port,
                    bound_port = bound.map(|a| a.port()).unwrap_or(0),
                    "could not bind RPC server to port"
                );
                return Ok(false);
            }
        };

        let shutdown = CancellationToken::new();
        let task = tokio::spawn(serve(
            listener,
            TlsAcceptor::from(tls_config),
            self.router.clone(),
            shutdown.clone(),
        ));
        self.running = Some(Running {
            shutdown,
            task,
            local_addr,
        });
        self.state = ServerState::Bound;
        info!(host = %config.host, port = config.port, "RPC server listening");
        Ok(true)
    }

    /// Stop accepting connections, wait for every in-flight call to finish,
    /// then release the address.
    ///
    /// Returns immediately if the server is not running. If a previous
    /// `close` was cancelled part-way, this one waits on the same drain.
    pub async fn close(&mut self) {
        let Some(running) = self.running.as_mut() else {
            return;
        };
        self.state = ServerState::ShuttingDown;
        running.shutdown.cancel();
        let joined = (&mut running.task).await;
        // The handle is released only once the task has been joined.
        self.running = None;
        if let Err(e) = joined {
            error!(error = %e, "RPC server task terminated abnormally");
        }
        self.state = ServerState::Stopped;
        info!("RPC server completed shutdown");
    }
}

impl<R, C> Drop for RpcServer<R, C> {
    fn drop(&mut self) {
        if let Some(running) = &self.running {
            running.shutdown.cancel();
        }
    }
}

/// Accept loop. On shutdown, stops accepting, drains open connections, and
/// drops the listener last.
async fn serve(
    listener: TcpListener,
    acceptor: TlsAcceptor,
    router: Router,
    shutdown: CancellationToken,
) {
    let connections = TaskTracker::new();

    loop {
        let (stream, peer_addr) = tokio::select! {
            _ = shutdown.cancelled() => break,
            accepted = listener.accept() => match accepted {
                Ok(conn) => conn,
                Err(e) => {
                    warn!(error = %e, "accept error");
                    if backoff_after_accept_error(&shutdown).await {
                        continue;
                    }
                    break;
                }
            },
        };
        debug!(%peer_addr, "accepted TCP connection");

        let acceptor = acceptor.clone();
        let router = router.clone();
        let shutdown = shutdown.clone();
        connections.spawn(async move {
            if let Err(e) = serve_connection(stream, acceptor, router, shutdown).await {
                debug!(%peer_addr, error = %e, "connection closed with error");
            }
        });
    }

    connections.close();
    debug!(open_connections = connections.len(), "draining connections");
    connections.wait().await;
    drop(listener);
}

/// Pause before the next `accept` so a persistent failure such as `EMFILE`
/// does not spin the loop. Returns `false` if shutdown was requested meanwhile.
async fn backoff_after_accept_error(shutdown: &CancellationToken) -> bool {
    tokio::select! {
        _ = shutdown.cancelled() => false,
        _ = tokio::time::sleep(ACCEPT_ERROR_BACKOFF) => true,
    }
}

/// Terminate TLS and serve HTTP/1.1 or HTTP/2 on one connection until the
/// peer goes away or shutdown is requested.
async fn serve_connection(
    stream: TcpStream,
    acceptor: TlsAcceptor,
    router: Router,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    let tls_stream = tokio::select! {
        accepted = acceptor.accept(stream) => accepted.context("TLS handshake failed")?,
        _ = shutdown.cancelled() => return Ok(()),
    };

    let service = service_fn(move |request: Request<Incoming>| router.clone().call(request));
    let builder = auto::Builder::new(TokioExecutor::new());
    let conn = builder.serve_connection(TokioIo::new(tls_stream), service);
    tokio::pin!(conn);

    let result = tokio::select! {
        result = conn.as_mut() => result,
        _ = shutdown.cancelled() => {
            // Finishes in-flight requests, then closes.
            conn.as_mut().graceful_shutdown();
            conn.await
        }
    };
    result.map_err(|e| anyhow::anyhow!(e))
}
