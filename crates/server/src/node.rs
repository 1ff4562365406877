//! [`NodeService`]: the handler the `rpc-server` binary serves.
//!
//! Order book, swap and peer logic live outside this crate. Until a real
//! implementation is wired in, the binary answers `getInfo`, honours
//! `shutdown`, and reports every other method as unimplemented.

use async_trait::async_trait;
use common::protocol::{Contract, HashResolverMethod, XudMethod};
use common::ServiceError;
use serde_json::{json, Value};
use tokio::sync::Notify;
use tracing::info;

use crate::server::service::{HashResolverService, StreamResult, UnaryResult, XudService};

#[derive(Debug, Default)]
pub struct NodeService {
    shutdown: Notify,
}

impl NodeService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves once a client has called `shutdown`.
    pub async fn shutdown_requested(&self) {
        self.shutdown.notified().await;
    }
}

fn not_served<M: Contract, T>(method: M) -> Result<T, ServiceError> {
    Err(ServiceError::Unimplemented(format!(
        "{}/{} is not served by this node",
        M::SERVICE,
        method.name()
    )))
}

#[async_trait]
impl XudService for NodeService {
    async fn add_currency(&self, _request: Value) -> UnaryResult {
        not_served(XudMethod::AddCurrency)
    }
    async fn add_pair(&self, _request: Value) -> UnaryResult {
        not_served(XudMethod::AddPair)
    }
    async fn remove_order(&self, _request: Value) -> UnaryResult {
        not_served(XudMethod::RemoveOrder)
    }
    async fn channel_balance(&self, _request: Value) -> UnaryResult {
        not_served(XudMethod::ChannelBalance)
    }
    async fn connect(&self, _request: Value) -> UnaryResult {
        not_served(XudMethod::Connect)
    }
    async fn ban(&self, _request: Value) -> UnaryResult {
        not_served(XudMethod::Ban)
    }
    async fn unban(&self, _request: Value) -> UnaryResult {
        not_served(XudMethod::Unban)
    }
    async fn get_info(&self, _request: Value) -> UnaryResult {
        Ok(json!({ "version": env!("CARGO_PKG_VERSION") }))
    }
    async fn get_orders(&self, _request: Value) -> UnaryResult {
        not_served(XudMethod::GetOrders)
    }
    async fn list_currencies(&self, _request: Value) -> UnaryResult {
        not_served(XudMethod::ListCurrencies)
    }
    async fn list_pairs(&self, _request: Value) -> UnaryResult {
        not_served(XudMethod::ListPairs)
    }
    async fn list_peers(&self, _request: Value) -> UnaryResult {
        not_served(XudMethod::ListPeers)
    }
    async fn place_order(&self, _request: Value) -> StreamResult {
        not_served(XudMethod::PlaceOrder)
    }
    async fn place_order_sync(&self, _request: Value) -> UnaryResult {
        not_served(XudMethod::PlaceOrderSync)
    }
    async fn remove_currency(&self, _request: Value) -> UnaryResult {
        not_served(XudMethod::RemoveCurrency)
    }
    async fn remove_pair(&self, _request: Value) -> UnaryResult {
        not_served(XudMethod::RemovePair)
    }
    async fn shutdown(&self, _request: Value) -> UnaryResult {
        info!("shutdown requested over RPC");
        self.shutdown.notify_one();
        Ok(json!({}))
    }
    async fn subscribe_added_orders(&self, _request: Value) -> StreamResult {
        not_served(XudMethod::SubscribeAddedOrders)
    }
    async fn subscribe_removed_orders(&self, _request: Value) -> StreamResult {
        not_served(XudMethod::SubscribeRemovedOrders)
    }
    async fn subscribe_swaps(&self, _request: Value) -> StreamResult {
        not_served(XudMethod::SubscribeSwaps)
    }
}

#[async_trait]
impl HashResolverService for NodeService {
    async fn resolve_hash(&self, _request: Value) -> UnaryResult {
        not_served(HashResolverMethod::ResolveHash)
    }
}
