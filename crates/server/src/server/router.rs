//! Axum router construction.

use axum::{extract::rejection::JsonRejection, extract::State, routing::post, Json, Router};
use common::protocol::{Contract, HashResolverMethod, XudMethod};
use serde_json::Value;
use tower_http::trace::TraceLayer;

use super::{handlers, registry::ServiceRegistry};

/// Build the application [`Router`]: one `POST` route per declared method of
/// each contract, all sharing the same [`ServiceRegistry`].
pub fn build(registry: ServiceRegistry) -> Router {
    let mut router: Router<ServiceRegistry> = Router::new();

    for &method in XudMethod::METHODS {
        router = router.route(
            &method.path(),
            post(
                move |state: State<ServiceRegistry>, body: Result<Json<Value>, JsonRejection>| {
                    handlers::xud(state, method, body)
                },
            ),
        );
    }

    for &method in HashResolverMethod::METHODS {
        router = router.route(
            &method.path(),
            post(
                move |state: State<ServiceRegistry>, body: Result<Json<Value>, JsonRejection>| {
                    handlers::hash_resolver(state, method, body)
                },
            ),
        );
    }

    router
        .fallback(handlers::not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::service::{MockHashResolverService, MockXudService};
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use common::protocol::{ErrorResponse, STREAM_CONTENT_TYPE};
    use common::ServiceError;
    use futures::StreamExt;
    use serde_json::json;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app(xud: MockXudService, resolver: MockHashResolverService) -> Router {
        build(ServiceRegistry::new(Arc::new(xud), Arc::new(resolver)))
    }

    fn post_json(path: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(path)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_owned()))
            .unwrap()
    }

    async fn body_bytes(resp: axum::response::Response) -> bytes::Bytes {
        axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap()
    }

    #[tokio::test]
    async fn unknown_route_returns_404() {
        let app = app(MockXudService::new(), MockHashResolverService::new());
        let resp = app.oneshot(post_json("/xudrpc.Xud/unknown", "{}")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let body: ErrorResponse = serde_json::from_slice(&body_bytes(resp).await).unwrap();
        assert_eq!(body.code, "not_found");
    }

    #[tokio::test]
    async fn resolve_hash_reaches_handler_unmodified() {
        let mut resolver = MockHashResolverService::new();
        resolver
            .expect_resolve_hash()
            .withf(|req| req == &json!({"hash": "deadbeef", "amount": 1000}))
            .times(1)
            .returning(|_| Ok(json!({"preimage": "cafe"})));

        let app = app(MockXudService::new(), resolver);
        let resp = app
            .oneshot(post_json(
                "/lndrpc.HashResolver/resolveHash",
                r#"{"hash":"deadbeef","amount":1000}"#,
            ))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = serde_json::from_slice(&body_bytes(resp).await).unwrap();
        assert_eq!(body, json!({"preimage": "cafe"}));
    }

    #[tokio::test]
    async fn contracts_do_not_share_method_namespace() {
        let app = app(MockXudService::new(), MockHashResolverService::new());
        let resp = app
            .oneshot(post_json("/xudrpc.Xud/resolveHash", "{}"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn malformed_body_is_invalid_argument() {
        let app = app(MockXudService::new(), MockHashResolverService::new());
        let resp = app
            .oneshot(post_json("/xudrpc.Xud/getInfo", "{not json"))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: ErrorResponse = serde_json::from_slice(&body_bytes(resp).await).unwrap();
        assert_eq!(body.code, "invalid_argument");
    }

    #[tokio::test]
    async fn handler_error_maps_to_status() {
        let mut xud = MockXudService::new();
        xud.expect_remove_order()
            .times(1)
            .returning(|_| Err(ServiceError::NotFound("order 7".into())));

        let app = app(xud, MockHashResolverService::new());
        let resp = app
            .oneshot(post_json("/xudrpc.Xud/removeOrder", r#"{"order_id":"7"}"#))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: ErrorResponse = serde_json::from_slice(&body_bytes(resp).await).unwrap();
        assert_eq!(body, ErrorResponse::new("not_found", "order 7"));
    }

    #[tokio::test]
    async fn subscription_streams_ndjson() {
        let mut xud = MockXudService::new();
        xud.expect_subscribe_added_orders().times(1).returning(|_| {
            Ok(futures::stream::iter(vec![Ok(json!({"id": "a"})), Ok(json!({"id": "b"}))]).boxed())
        });

        let app = app(xud, MockHashResolverService::new());
        let resp = app
            .oneshot(post_json("/xudrpc.Xud/subscribeAddedOrders", "{}"))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get(header::CONTENT_TYPE).unwrap(),
            STREAM_CONTENT_TYPE
        );
        let body = body_bytes(resp).await;
        let ids: Vec<Value> = std::str::from_utf8(&body)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str::<Value>(l).unwrap()["id"].clone())
            .collect();
        assert_eq!(ids, vec![json!("a"), json!("b")]);
    }

    #[tokio::test]
    async fn every_declared_method_is_routed() {
        for method in XudMethod::METHODS {
            let app = app(MockXudService::new(), MockHashResolverService::new());
            // GET is not allowed on an existing route, while an unknown path
            // falls through to 404.
            let req = Request::builder()
                .method("GET")
                .uri(method.path())
                .body(Body::empty())
                .unwrap();
            let resp = app.oneshot(req).await.unwrap();
            assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED, "{}", method.name());
        }
    }
}
