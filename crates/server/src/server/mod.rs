//! RPC-over-TLS server: service wiring, routing, and lifecycle.
//!
//! # Responsibilities
//! - Declare one handler trait per service contract ([`service`]).
//! - Route every declared method to its handler ([`registry`], [`router`]).
//! - Build the rustls config from the bootstrapped certificate ([`tls`]).
//! - Bind, serve, and drain on shutdown ([`lifecycle`]).

pub mod handlers;
pub mod lifecycle;
pub mod registry;
pub mod router;
pub mod service;
pub mod tls;

#[cfg(test)]
pub(crate) mod testing;

pub use lifecycle::{ListenConfig, RpcServer, ServerError, ServerState};
pub use registry::{ServiceBinding, ServiceRegistry};
pub use service::{EventStream, HashResolverService, XudService};
