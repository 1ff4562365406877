//! [`ServiceRegistry`]: the dispatch table from contract methods to handlers.
//!
//! Wiring only. The registry routes a decoded call to the matching trait
//! method and returns the handler's reply unchanged.

use std::sync::Arc;

use common::protocol::{Contract, HashResolverMethod, XudMethod};
use common::ServiceError;
use serde_json::Value;

use super::service::{EventStream, HashResolverService, XudService};

/// A handler's reply, shaped by the method's [`common::CallKind`].
pub enum Reply {
    Unary(Value),
    Stream(EventStream),
}

/// One contract and the method names bound on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceBinding {
    pub contract: &'static str,
    pub methods: Vec<&'static str>,
}

impl ServiceBinding {
    /// Binding covering every method `M` declares.
    pub fn of<M: Contract>() -> Self {
        Self {
            contract: M::SERVICE,
            methods: M::METHODS.iter().map(|m| m.name()).collect(),
        }
    }
}

/// Handlers for both contracts served on the endpoint.
///
/// Cheap to clone; the handlers are shared and owned by the caller.
#[derive(Clone)]
pub struct ServiceRegistry {
    xud: Arc<dyn XudService>,
    hash_resolver: Arc<dyn HashResolverService>,
}

impl ServiceRegistry {
    pub fn new(xud: Arc<dyn XudService>, hash_resolver: Arc<dyn HashResolverService>) -> Self {
        Self { xud, hash_resolver }
    }

    /// The contracts and method names this registry serves.
    pub fn bindings(&self) -> Vec<ServiceBinding> {
        vec![
            ServiceBinding::of::<XudMethod>(),
            ServiceBinding::of::<HashResolverMethod>(),
        ]
    }

    /// Invoke the `xudrpc.Xud` handler for `method`.
    pub async fn call_xud(&self, method: XudMethod, request: Value) -> Result<Reply, ServiceError> {
        let xud = self.xud.as_ref();
        let reply = match method {
            XudMethod::AddCurrency => Reply::Unary(xud.add_currency(request).await?),
            XudMethod::AddPair => Reply::Unary(xud.add_pair(request).await?),
            XudMethod::RemoveOrder => Reply::Unary(xud.remove_order(request).await?),
            XudMethod::ChannelBalance => Reply::Unary(xud.channel_balance(request).await?),
            XudMethod::Connect => Reply::Unary(xud.connect(request).await?),
            XudMethod::Ban => Reply::Unary(xud.ban(request).await?),
            XudMethod::Unban => Reply::Unary(xud.unban(request).await?),
            XudMethod::GetInfo => Reply::Unary(xud.get_info(request).await?),
            XudMethod::GetOrders => Reply::Unary(xud.get_orders(request).await?),
            XudMethod::ListCurrencies => Reply::Unary(xud.list_currencies(request).await?),
            XudMethod::ListPairs => Reply::Unary(xud.list_pairs(request).await?),
            XudMethod::ListPeers => Reply::Unary(xud.list_peers(request).await?),
            XudMethod::PlaceOrder => Reply::Stream(xud.place_order(request).await?),
            XudMethod::PlaceOrderSync => Reply::Unary(xud.place_order_sync(request).await?),
            XudMethod::RemoveCurrency => Reply::Unary(xud.remove_currency(request).await?),
            XudMethod::RemovePair => Reply::Unary(xud.remove_pair(request).await?),
            XudMethod::Shutdown => Reply::Unary(xud.shutdown(request).await?),
            XudMethod::SubscribeAddedOrders => {
                Reply::Stream(xud.subscribe_added_orders(request).await?)
            }
            XudMethod::SubscribeRemovedOrders => {
                Reply::Stream(xud.subscribe_removed_orders(request).await?)
            }
            XudMethod::SubscribeSwaps => Reply::Stream(xud.subscribe_swaps(request).await?),
        };
        Ok(reply)
    }

    /// Invoke the `lndrpc.HashResolver` handler for `method`.
    pub async fn call_hash_resolver(
        &self,
        method: HashResolverMethod,
        request: Value,
    ) -> Result<Reply, ServiceError> {
        match method {
            HashResolverMethod::ResolveHash => Ok(Reply::Unary(
                self.hash_resolver.resolve_hash(request).await?,
            )),
        }
    }
}
