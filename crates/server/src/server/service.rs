//! Handler traits for the two service contracts.
//!
//! Every method declared by a contract is a required trait method with no
//! default body, so an implementation that forgets one does not compile.
//! Payloads are opaque JSON values owned by the protocol definition; the
//! server hands them to the handler exactly as received.
//!
//! Implementations are shared across connection tasks and must tolerate
//! concurrent calls.

use async_trait::async_trait;
use common::ServiceError;
use futures::stream::BoxStream;
use serde_json::Value;

/// Response stream of a server-streaming method.
pub type EventStream = BoxStream<'static, Result<Value, ServiceError>>;

/// Result of a unary method.
pub type UnaryResult = Result<Value, ServiceError>;

/// Result of a server-streaming method.
pub type StreamResult = Result<EventStream, ServiceError>;

/// Handlers for the primary `xudrpc.Xud` contract.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait XudService: Send + Sync + 'static {
    async fn add_currency(&self, request: Value) -> UnaryResult;
    async fn add_pair(&self, request: Value) -> UnaryResult;
    async fn remove_order(&self, request: Value) -> UnaryResult;
    async fn channel_balance(&self, request: Value) -> UnaryResult;
    async fn connect(&self, request: Value) -> UnaryResult;
    async fn ban(&self, request: Value) -> UnaryResult;
    async fn unban(&self, request: Value) -> UnaryResult;
    async fn get_info(&self, request: Value) -> UnaryResult;
    async fn get_orders(&self, request: Value) -> UnaryResult;
    async fn list_currencies(&self, request: Value) -> UnaryResult;
    async fn list_pairs(&self, request: Value) -> UnaryResult;
    async fn list_peers(&self, request: Value) -> UnaryResult;
    /// Streams match and placement events until the order is settled.
    async fn place_order(&self, request: Value) -> StreamResult;
    async fn place_order_sync(&self, request: Value) -> UnaryResult;
    async fn remove_currency(&self, request: Value) -> UnaryResult;
    async fn remove_pair(&self, request: Value) -> UnaryResult;
    /// Asks the node to shut down. The reply is sent before shutdown begins.
    async fn shutdown(&self, request: Value) -> UnaryResult;
    async fn subscribe_added_orders(&self, request: Value) -> StreamResult;
    async fn subscribe_removed_orders(&self, request: Value) -> StreamResult;
    async fn subscribe_swaps(&self, request: Value) -> StreamResult;
}

/// Handler for the auxiliary `lndrpc.HashResolver` contract.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HashResolverService: Send + Sync + 'static {
    /// Resolve the preimage of a payment hash.
    async fn resolve_hash(&self, request: Value) -> UnaryResult;
}
