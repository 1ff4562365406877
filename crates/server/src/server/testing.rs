//! Test fixtures: a recording handler, a deterministic certificate provider,
//! and a minimal TLS client.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, HeaderMap, Request, Response, StatusCode};
use bytes::Bytes;
use futures::StreamExt;
use hyper::body::Incoming;
use hyper_util::rt::{TokioExecutor, TokioIo};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rustls::pki_types::ServerName;
use serde_json::{json, Value};
use tokio::net::TcpStream;
use tokio::sync::Notify;
use tokio_rustls::{client::TlsStream, TlsConnector};

use super::service::{HashResolverService, StreamResult, UnaryResult, XudService};
use crate::cert::{CertificateProvider, FixedClock};

/// Deterministic provider whose clock is pinned to the current time, so the
/// generated certificate is valid for a real TLS handshake.
pub fn test_provider() -> CertificateProvider<StdRng, FixedClock> {
    CertificateProvider::with_sources(
        StdRng::seed_from_u64(42),
        FixedClock(time::OffsetDateTime::now_utc()),
    )
    .with_common_name("test-node")
}

/// A port that was free a moment ago.
pub fn free_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

/// Pauses a handler until the test lets it continue.
#[derive(Default)]
pub struct Gate {
    pub entered: Notify,
    pub release: Notify,
}

/// Handler for both contracts that records every call and echoes it back as
/// `{"method": .., "request": ..}`.
#[derive(Default)]
pub struct RecordingService {
    calls: Mutex<Vec<(String, Value)>>,
    gate: Option<Arc<Gate>>,
}

impl RecordingService {
    pub fn gated() -> Self {
        Self {
            calls: Mutex::default(),
            gate: Some(Arc::new(Gate::default())),
        }
    }

    pub fn gate(&self) -> Option<Arc<Gate>> {
        self.gate.clone()
    }

    pub fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().unwrap().clone()
    }

    async fn record(&self, method: &str, request: Value) -> UnaryResult {
        self.calls
            .lock()
            .unwrap()
            .push((method.to_owned(), request.clone()));
        if let Some(gate) = &self.gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }
        Ok(json!({"method": method, "request": request}))
    }

    async fn record_stream(&self, method: &str, request: Value) -> StreamResult {
        let reply = self.record(method, request).await?;
        Ok(futures::stream::iter(vec![Ok(reply)]).boxed())
    }
}

#[async_trait]
impl XudService for RecordingService {
    async fn add_currency(&self, request: Value) -> UnaryResult {
        self.record("addCurrency", request).await
    }
    async fn add_pair(&self, request: Value) -> UnaryResult {
        self.record("addPair", request).await
    }
    async fn remove_order(&self, request: Value) -> UnaryResult {
        self.record("removeOrder", request).await
    }
    async fn channel_balance(&self, request: Value) -> UnaryResult {
        self.record("channelBalance", request).await
    }
    async fn connect(&self, request: Value) -> UnaryResult {
        self.record("connect", request).await
    }
    async fn ban(&self, request: Value) -> UnaryResult {
        self.record("ban", request).await
    }
    async fn unban(&self, request: Value) -> UnaryResult {
        self.record("unban", request).await
    }
    async fn get_info(&self, request: Value) -> UnaryResult {
        self.record("getInfo", request).await
    }
    async fn get_orders(&self, request: Value) -> UnaryResult {
        self.record("getOrders", request).await
    }
    async fn list_currencies(&self, request: Value) -> UnaryResult {
        self.record("listCurrencies", request).await
    }
    async fn list_pairs(&self, request: Value) -> UnaryResult {
        self.record("listPairs", request).await
    }
    async fn list_peers(&self, request: Value) -> UnaryResult {
        self.record("listPeers", request).await
    }
    async fn place_order(&self, request: Value) -> StreamResult {
        self.record_stream("placeOrder", request).await
    }
    async fn place_order_sync(&self, request: Value) -> UnaryResult {
        self.record("placeOrderSync", request).await
    }
    async fn remove_currency(&self, request: Value) -> UnaryResult {
        self.record("removeCurrency", request).await
    }
    async fn remove_pair(&self, request: Value) -> UnaryResult {
        self.record("removePair", request).await
    }
    async fn shutdown(&self, request: Value) -> UnaryResult {
        self.record("shutdown", request).await
    }
    async fn subscribe_added_orders(&self, request: Value) -> StreamResult {
        self.record_stream("subscribeAddedOrders", request).await
    }
    async fn subscribe_removed_orders(&self, request: Value) -> StreamResult {
        self.record_stream("subscribeRemovedOrders", request).await
    }
    async fn subscribe_swaps(&self, request: Value) -> StreamResult {
        self.record_stream("subscribeSwaps", request).await
    }
}

#[async_trait]
impl HashResolverService for RecordingService {
    async fn resolve_hash(&self, request: Value) -> UnaryResult {
        self.record("resolveHash", request).await
    }
}

/// TLS connection to `addr` that trusts only `cert_pem` and offers `alpn`.
async fn connect_tls(
    addr: SocketAddr,
    cert_pem: &[u8],
    alpn: &[&[u8]],
) -> TlsStream<TcpStream> {
    let mut roots = rustls::RootCertStore::empty();
    for cert in rustls_pemfile::certs(&mut std::io::BufReader::new(cert_pem)) {
        roots.add(cert.unwrap()).unwrap();
    }
    let mut config = rustls::ClientConfig::builder_with_provider(Arc::new(
        rustls::crypto::ring::default_provider(),
    ))
    .with_safe_default_protocol_versions()
    .unwrap()
    .with_root_certificates(roots)
    .with_no_client_auth();
    config.alpn_protocols = alpn.iter().map(|p| p.to_vec()).collect();

    let tcp = TcpStream::connect(addr).await.unwrap();
    TlsConnector::from(Arc::new(config))
        .connect(ServerName::try_from("localhost").unwrap(), tcp)
        .await
        .unwrap()
}

async fn collect(resp: Response<Incoming>) -> (StatusCode, HeaderMap, Bytes) {
    let (parts, body) = resp.into_parts();
    let bytes = axum::body::to_bytes(Body::new(body), usize::MAX)
        .await
        .unwrap();
    (parts.status, parts.headers, bytes)
}

/// POST `body` to `path` over TLS with HTTP/1.1, trusting only `cert_pem`,
/// and return the status and full response body.
pub async fn call(addr: SocketAddr, cert_pem: &[u8], path: &str, body: &Value) -> (StatusCode, Bytes) {
    let tls = connect_tls(addr, cert_pem, &[b"http/1.1"]).await;
    let (mut sender, conn) = hyper::client::conn::http1::handshake(TokioIo::new(tls))
        .await
        .unwrap();
    tokio::spawn(async move {
        let _ = conn.await;
    });

    let req = Request::builder()
        .method("POST")
        .uri(path)
        .header(header::HOST, "localhost")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let (status, _headers, bytes) = collect(sender.send_request(req).await.unwrap()).await;
    (status, bytes)
}

/// Like [`call`], over HTTP/2 negotiated through ALPN. Also returns the
/// response headers.
pub async fn call_h2(
    addr: SocketAddr,
    cert_pem: &[u8],
    path: &str,
    body: &Value,
) -> (StatusCode, HeaderMap, Bytes) {
    let tls = connect_tls(addr, cert_pem, &[b"h2"]).await;
    assert_eq!(tls.get_ref().1.alpn_protocol(), Some(&b"h2"[..]));
    let (mut sender, conn) =
        hyper::client::conn::http2::handshake(TokioExecutor::new(), TokioIo::new(tls))
            .await
            .unwrap();
    tokio::spawn(async move {
        let _ = conn.await;
    });

    let req = Request::builder()
        .method("POST")
        .uri(format!("https://localhost{path}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    collect(sender.send_request(req).await.unwrap()).await
}
