//! TLS RPC server bootstrap and lifecycle.
//!
//! Ensures a certificate/key pair exists (generating a self-signed one when
//! missing), serves the `xudrpc.Xud` and `lndrpc.HashResolver` contracts on a
//! single HTTPS endpoint, and drains in-flight calls on shutdown.

pub mod cert;
pub mod config;
pub mod node;
pub mod server;
pub mod telemetry;

pub use cert::{Certificate, CertificateProvider};
pub use server::{ListenConfig, RpcServer, ServerError, ServerState, ServiceRegistry};
