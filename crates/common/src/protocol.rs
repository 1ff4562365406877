//! Service contracts and wire types shared by the server and its callers.
//!
//! A contract is a fixed, versioned list of method names. Each method is
//! reachable at `POST /{service}/{method}` and carries a JSON request body.
//! Request and response shapes belong to the protocol definition and are
//! passed through the server untouched.

use serde::{Deserialize, Serialize};

use crate::error::ServiceError;

/// Content type of server-streaming responses: one JSON document per line.
pub const STREAM_CONTENT_TYPE: &str = "application/x-ndjson";

/// How a method delivers its response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    /// One request, one response.
    Unary,
    /// One request, a stream of responses.
    ServerStreaming,
}

/// A declared service contract, implemented by its method enum.
pub trait Contract: Copy + Eq + std::fmt::Debug + Send + Sync + 'static {
    /// Fully qualified service name, used as the first path segment.
    const SERVICE: &'static str;

    /// Every method the contract declares, in declaration order.
    const METHODS: &'static [Self];

    /// Method name as it appears on the wire.
    fn name(self) -> &'static str;

    /// Whether the method is unary or server streaming.
    fn kind(self) -> CallKind;

    /// Request path of this method.
    fn path(self) -> String {
        rpc_path(Self::SERVICE, self.name())
    }
}

/// Build the request path for `method` on `service`.
pub fn rpc_path(service: &str, method: &str) -> String {
    format!("/{service}/{method}")
}

// ---------------------------------------------------------------------------
// Primary contract
// ---------------------------------------------------------------------------

/// Methods of the primary `xudrpc.Xud` contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum XudMethod {
    AddCurrency,
    AddPair,
    RemoveOrder,
    ChannelBalance,
    Connect,
    Ban,
    Unban,
    GetInfo,
    GetOrders,
    ListCurrencies,
    ListPairs,
    ListPeers,
    PlaceOrder,
    PlaceOrderSync,
    RemoveCurrency,
    RemovePair,
    Shutdown,
    SubscribeAddedOrders,
    SubscribeRemovedOrders,
    SubscribeSwaps,
}

impl Contract for XudMethod {
    const SERVICE: &'static str = "xudrpc.Xud";

    const METHODS: &'static [Self] = &[
        XudMethod::AddCurrency,
        XudMethod::AddPair,
        XudMethod::RemoveOrder,
        XudMethod::ChannelBalance,
        XudMethod::Connect,
        XudMethod::Ban,
        XudMethod::Unban,
        XudMethod::GetInfo,
        XudMethod::GetOrders,
        XudMethod::ListCurrencies,
        XudMethod::ListPairs,
        XudMethod::ListPeers,
        XudMethod::PlaceOrder,
        XudMethod::PlaceOrderSync,
        XudMethod::RemoveCurrency,
        XudMethod::RemovePair,
        XudMethod::Shutdown,
        XudMethod::SubscribeAddedOrders,
        XudMethod::SubscribeRemovedOrders,
        XudMethod::SubscribeSwaps,
    ];

    fn name(self) -> &'static str {
        match self {
            XudMethod::AddCurrency => "addCurrency",
            XudMethod::AddPair => "addPair",
            XudMethod::RemoveOrder => "removeOrder",
            XudMethod::ChannelBalance => "channelBalance",
            XudMethod::Connect => "connect",
            XudMethod::Ban => "ban",
            XudMethod::Unban => "unban",
            XudMethod::GetInfo => "getInfo",
            XudMethod::GetOrders => "getOrders",
            XudMethod::ListCurrencies => "listCurrencies",
            XudMethod::ListPairs => "listPairs",
            XudMethod::ListPeers => "listPeers",
            XudMethod::PlaceOrder => "placeOrder",
            XudMethod::PlaceOrderSync => "placeOrderSync",
            XudMethod::RemoveCurrency => "removeCurrency",
            XudMethod::RemovePair => "removePair",
            XudMethod::Shutdown => "shutdown",
            XudMethod::SubscribeAddedOrders => "subscribeAddedOrders",
            XudMethod::SubscribeRemovedOrders => "subscribeRemovedOrders",
            XudMethod::SubscribeSwaps => "subscribeSwaps",
        }
    }

    fn kind(self) -> CallKind {
        match self {
            XudMethod::PlaceOrder
            | XudMethod::SubscribeAddedOrders
            | XudMethod::SubscribeRemovedOrders
            | XudMethod::SubscribeSwaps => CallKind::ServerStreaming,
            _ => CallKind::Unary,
        }
    }
}

// ---------------------------------------------------------------------------
// Auxiliary contract
// ---------------------------------------------------------------------------

/// Methods of the auxiliary `lndrpc.HashResolver` contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashResolverMethod {
    ResolveHash,
}

impl Contract for HashResolverMethod {
    const SERVICE: &'static str = "lndrpc.HashResolver";

    const METHODS: &'static [Self] = &[HashResolverMethod::ResolveHash];

    fn name(self) -> &'static str {
        match self {
            HashResolverMethod::ResolveHash => "resolveHash",
        }
    }

    fn kind(self) -> CallKind {
        CallKind::Unary
    }
}

// ---------------------------------------------------------------------------
// Error response
// ---------------------------------------------------------------------------

/// Standard error body returned on any non-2xx status, and as the final line
/// of a stream that ended in an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Short machine-readable error code (e.g. `"not_found"`).
    pub code: String,
    /// Human-readable description safe to expose to callers.
    pub message: String,
}

impl ErrorResponse {
    /// Construct an [`ErrorResponse`] from a code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

impl From<&ServiceError> for ErrorResponse {
    fn from(err: &ServiceError) -> Self {
        Self::new(err.code(), err.message())
    }
}
