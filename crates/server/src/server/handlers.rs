//! Axum request handlers that decode a call, dispatch it through the
//! [`ServiceRegistry`], and encode the reply.

use std::convert::Infallible;

use axum::{
    body::Body,
    extract::{rejection::JsonRejection, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use common::protocol::{Contract, ErrorResponse, HashResolverMethod, XudMethod, STREAM_CONTENT_TYPE};
use common::ServiceError;
use futures::StreamExt;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::registry::{Reply, ServiceRegistry};
use super::service::EventStream;

/// `POST /xudrpc.Xud/{method}`.
pub async fn xud(
    State(registry): State<ServiceRegistry>,
    method: XudMethod,
    body: Result<Json<Value>, JsonRejection>,
) -> Response {
    let request = match decode::<XudMethod>(method, body) {
        Ok(request) => request,
        Err(resp) => return resp,
    };
    respond(method, registry.call_xud(method, request).await)
}

/// `POST /lndrpc.HashResolver/{method}`.
pub async fn hash_resolver(
    State(registry): State<ServiceRegistry>,
    method: HashResolverMethod,
    body: Result<Json<Value>, JsonRejection>,
) -> Response {
    let request = match decode::<HashResolverMethod>(method, body) {
        Ok(request) => request,
        Err(resp) => return resp,
    };
    respond(method, registry.call_hash_resolver(method, request).await)
}

/// Catch-all 404 handler.
pub async fn not_found() -> impl IntoResponse {
    let err = ErrorResponse::new("not_found", "the requested method does not exist");
    (StatusCode::NOT_FOUND, Json(err))
}

fn decode<M: Contract>(method: M, body: Result<Json<Value>, JsonRejection>) -> Result<Value, Response> {
    match body {
        Ok(Json(request)) => {
            debug!(service = M::SERVICE, method = method.name(), "dispatching call");
            Ok(request)
        }
        Err(rejection) => {
            debug!(
                service = M::SERVICE,
                method = method.name(),
                error = %rejection,
                "rejected malformed request body"
            );
            let err = ErrorResponse::new("invalid_argument", rejection.body_text());
            Err((StatusCode::BAD_REQUEST, Json(err)).into_response())
        }
    }
}

fn respond<M: Contract>(method: M, result: Result<Reply, ServiceError>) -> Response {
    match result {
        Ok(Reply::Unary(reply)) => (StatusCode::OK, Json(reply)).into_response(),
        Ok(Reply::Stream(events)) => stream_response(events),
        Err(e) => {
            warn!(service = M::SERVICE, method = method.name(), error = %e, "call failed");
            error_response(&e)
        }
    }
}

/// Map a handler error onto its HTTP status and [`ErrorResponse`] body.
pub fn error_response(err: &ServiceError) -> Response {
    let status = StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(ErrorResponse::from(err))).into_response()
}

/// Newline-delimited JSON body. An error item is written as an
/// [`ErrorResponse`] line and ends the stream.
fn stream_response(events: EventStream) -> Response {
    let lines = events
        .scan(false, |failed, event| {
            if *failed {
                return futures::future::ready(None);
            }
            let line = match event {
                Ok(value) => encode_line(&value),
                Err(e) => {
                    *failed = true;
                    encode_line(&ErrorResponse::from(&e))
                }
            };
            futures::future::ready(Some(Ok::<_, Infallible>(line)))
        });

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, STREAM_CONTENT_TYPE)
        .body(Body::from_stream(lines))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}

fn encode_line<T: Serialize>(value: &T) -> Bytes {
    let mut line = serde_json::to_vec(value).unwrap_or_else(|_| b"null".to_vec());
    line.push(b'\n');
    Bytes::from(line)
}
