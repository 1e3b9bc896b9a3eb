// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! End-to-end interception tests against a local mock server

use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use mustekala::{
    rest_resource, AbortReason, HttpBackend, MockStore, NetworkBackend, NoNetworkBackend, Request,
    RequestOutcome, RequestOverrides, Response, ResponseBuilder, RouteContext, RoutePattern,
    Router,
};

fn init_tracing() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();
    });
}

fn offline_router() -> Router {
    init_tracing();
    Router::new(Arc::new(NoNetworkBackend::new()))
}

fn live_router() -> Router {
    init_tracing();
    Router::new(Arc::new(HttpBackend::new().unwrap()))
}

/// Scenario A: a matched GET returns exactly the literal JSON the handler
/// supplied, with status 200.
#[tokio::test]
async fn literal_fulfillment_round_trips_to_host() {
    let router = offline_router();
    router.route(
        RoutePattern::glob("**/api/items").unwrap(),
        Arc::new(|route: RouteContext| async move {
            let body = json!([{"id": 7, "name": "widget"}]);
            route
                .fulfill(Response::json_value(StatusCode::OK, &body)?)
                .await
        }),
    );

    let outcome = router
        .handle_request(Request::get("https://app.test/api/items").unwrap())
        .await
        .unwrap();

    let response = outcome.response().expect("fulfilled response");
    assert_eq!(response.status_code(), Some(200));
    assert_eq!(response.content_type(), Some("application/json"));
    let items: Value = response.json().unwrap();
    assert_eq!(items, json!([{"id": 7, "name": "widget"}]));
}

/// Scenario B: fulfilling with status 500 is a response-shaped result for
/// the owning test, not a framework crash.
#[tokio::test]
async fn mocked_server_error_is_a_response_not_a_crash() {
    let router = offline_router();
    router.route(
        RoutePattern::glob("**/api/items").unwrap(),
        Arc::new(|route: RouteContext| async move {
            route
                .fulfill(Response::json_value(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    &json!({"error": "simulated outage"}),
                )?)
                .await
        }),
    );

    let outcome = router
        .handle_request(Request::get("https://app.test/api/items").unwrap())
        .await
        .unwrap();

    let response = outcome.response().unwrap();
    assert_eq!(response.status_code(), Some(500));
    assert!(response.is_server_error());
    assert!(!router.has_failures());
}

/// Scenario C: POST issues an unseen id; subsequent GET includes the
/// created item with that same id.
#[tokio::test]
async fn stateful_store_create_then_read() {
    let router = offline_router();
    let store = MockStore::new();
    router.route(
        RoutePattern::regex(r"/api/items(/[0-9]+)?$").unwrap(),
        rest_resource(store.clone(), "items"),
    );

    let outcome = router
        .handle_request(
            Request::post("https://app.test/api/items")
                .unwrap()
                .json(&json!({"name": "X"}))
                .unwrap(),
        )
        .await
        .unwrap();

    let created = outcome.response().unwrap();
    assert_eq!(created.status_code(), Some(201));
    let record: Value = created.json().unwrap();
    let id = record["id"].as_u64().expect("created record has an id");

    let outcome = router
        .handle_request(Request::get("https://app.test/api/items").unwrap())
        .await
        .unwrap();
    let items: Vec<Value> = outcome.response().unwrap().json().unwrap();
    assert!(items
        .iter()
        .any(|item| item["id"].as_u64() == Some(id) && item["name"] == "X"));
}

/// Scenario D: a later, narrower registration shadows an earlier broad one
/// only where both match.
#[tokio::test]
async fn later_registration_shadows_only_where_it_matches() {
    let router = offline_router();
    router.route(
        RoutePattern::glob("**/api/**").unwrap(),
        Arc::new(|route: RouteContext| async move {
            route
                .fulfill(Response::json_value(StatusCode::OK, &json!({"handler": "A"}))?)
                .await
        }),
    );
    router.route(
        RoutePattern::glob("**/api/items").unwrap(),
        Arc::new(|route: RouteContext| async move {
            route
                .fulfill(Response::json_value(StatusCode::OK, &json!({"handler": "B"}))?)
                .await
        }),
    );

    let outcome = router
        .handle_request(Request::get("https://app.test/api/items").unwrap())
        .await
        .unwrap();
    let body: Value = outcome.response().unwrap().json().unwrap();
    assert_eq!(body["handler"], "B");

    let outcome = router
        .handle_request(Request::get("https://app.test/api/users").unwrap())
        .await
        .unwrap();
    let body: Value = outcome.response().unwrap().json().unwrap();
    assert_eq!(body["handler"], "A");
}

/// Scenario E: a handler that throws before any terminal call resolves the
/// request as aborted with handler-error, and the owning test sees it.
#[tokio::test]
async fn throwing_handler_aborts_and_marks_test_failed() {
    let router = offline_router();
    router.route(
        RoutePattern::glob("**/api/items").unwrap(),
        Arc::new(|_route: RouteContext| async move {
            if true {
                panic!("fixture not loaded");
            }
            Ok(())
        }),
    );

    let outcome = router
        .handle_request(Request::get("https://app.test/api/items").unwrap())
        .await
        .unwrap();

    assert!(matches!(
        outcome,
        RequestOutcome::Aborted(AbortReason::HandlerError)
    ));

    let failures = router.failures();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].url, "https://app.test/api/items");
    assert!(failures[0].message.contains("fixture not loaded"));

    let failed_events = router.events().failed();
    assert_eq!(failed_events.len(), 1);
    assert_eq!(failed_events[0].error.as_deref(), Some("handler-error"));
}

/// Property: N creates interleaved with deletes issue N strictly
/// increasing, pairwise distinct identifiers.
#[tokio::test]
async fn store_ids_strictly_increase_across_deletes() {
    let router = offline_router();
    let store = MockStore::new();
    router.route(
        RoutePattern::regex(r"/api/items(/[0-9]+)?$").unwrap(),
        rest_resource(store.clone(), "items"),
    );

    let mut issued = Vec::new();
    for i in 0..8u32 {
        let outcome = router
            .handle_request(
                Request::post("https://app.test/api/items")
                    .unwrap()
                    .json(&json!({"n": i}))
                    .unwrap(),
            )
            .await
            .unwrap();
        let record: Value = outcome.response().unwrap().json().unwrap();
        let id = record["id"].as_u64().unwrap();
        issued.push(id);

        if i % 2 == 0 {
            let outcome = router
                .handle_request(
                    Request::delete(format!("https://app.test/api/items/{}", id)).unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(outcome.response().unwrap().status_code(), Some(204));
        }
    }

    for pair in issued.windows(2) {
        assert!(pair[0] < pair[1], "ids must strictly increase: {:?}", issued);
    }
}

/// Boundary: delete/update on a non-existent id is a 404-shaped response.
#[tokio::test]
async fn missing_id_yields_client_error_response() {
    let router = offline_router();
    router.route(
        RoutePattern::regex(r"/api/items(/[0-9]+)?$").unwrap(),
        rest_resource(MockStore::new(), "items"),
    );

    let outcome = router
        .handle_request(Request::delete("https://app.test/api/items/999").unwrap())
        .await
        .unwrap();
    assert_eq!(outcome.response().unwrap().status_code(), Some(404));

    let outcome = router
        .handle_request(
            Request::put("https://app.test/api/items/999")
                .unwrap()
                .json(&json!({"name": "ghost"}))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(outcome.response().unwrap().status_code(), Some(404));
    assert!(!router.has_failures());
}

/// Round-trip: fetch() then fulfill with the unchanged descriptor matches
/// the un-intercepted real response.
#[tokio::test]
async fn fetch_then_fulfill_matches_real_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/items"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("x-upstream", "origin")
                .set_body_json(json!([{"id": 1, "name": "real"}])),
        )
        .mount(&server)
        .await;

    let backend = Arc::new(HttpBackend::new().unwrap());
    let direct = backend
        .dispatch(Request::get(format!("{}/api/items", server.uri())).unwrap())
        .await
        .unwrap();

    let router = Router::new(backend);
    router.route(
        RoutePattern::glob("**/api/items").unwrap(),
        Arc::new(|route: RouteContext| async move {
            let real = route.fetch().await?;
            assert!(real.from_real_fetch);
            route
                .fulfill(ResponseBuilder::from_response(real).build()?)
                .await
        }),
    );

    let outcome = router
        .handle_request(Request::get(format!("{}/api/items", server.uri())).unwrap())
        .await
        .unwrap();

    let intercepted = outcome.response().unwrap();
    assert_eq!(intercepted.status_code(), direct.status_code());
    assert_eq!(intercepted.bytes(), direct.bytes());
    assert_eq!(intercepted.header("x-upstream"), Some("origin"));
    assert_eq!(intercepted.content_type(), direct.content_type());
}

/// Fetch-real-then-mutate: inject a field and a header on top of the
/// upstream payload.
#[tokio::test]
async fn fetch_then_mutate_overrides_selected_fields() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/profile"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "real user"})))
        .mount(&server)
        .await;

    let router = live_router();
    router.route(
        RoutePattern::glob("**/api/profile").unwrap(),
        Arc::new(|route: RouteContext| async move {
            let real = route.fetch().await?;
            let mut body: Value = real.json()?;
            body["injected"] = json!(true);
            route
                .fulfill(
                    ResponseBuilder::from_response(real)
                        .header("x-mutated", "yes")
                        .json(&body)?
                        .build()?,
                )
                .await
        }),
    );

    let outcome = router
        .handle_request(Request::get(format!("{}/api/profile", server.uri())).unwrap())
        .await
        .unwrap();

    let response = outcome.response().unwrap();
    assert_eq!(response.header("x-mutated"), Some("yes"));
    let body: Value = response.json().unwrap();
    assert_eq!(body["name"], "real user");
    assert_eq!(body["injected"], true);
}

/// A failed real fetch reaches the handler as a statusless descriptor; the
/// handler can still fulfill with mock data.
#[tokio::test]
async fn handler_recovers_from_failed_real_fetch() {
    let router = offline_router();
    router.route(
        RoutePattern::glob("**/api/flaky").unwrap(),
        Arc::new(|route: RouteContext| async move {
            let real = route.fetch().await?;
            assert!(real.is_failed());
            route
                .fulfill(Response::json_value(
                    StatusCode::OK,
                    &json!({"fallback": true}),
                )?)
                .await
        }),
    );

    let outcome = router
        .handle_request(Request::get("https://app.test/api/flaky").unwrap())
        .await
        .unwrap();
    let body: Value = outcome.response().unwrap().json().unwrap();
    assert_eq!(body["fallback"], true);
    assert!(!router.has_failures());
}

/// Continue-with-overrides rewrites the request the network sees.
#[tokio::test]
async fn resume_with_overrides_rewrites_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rewritten"))
        .respond_with(ResponseTemplate::new(200).set_body_string("rewritten target"))
        .mount(&server)
        .await;

    let uri = server.uri();
    let router = live_router();
    let rewritten = format!("{}/rewritten", uri);
    router.route(
        RoutePattern::glob("**/original").unwrap(),
        Arc::new(move |route: RouteContext| {
            let rewritten = rewritten.clone();
            async move {
                let overrides = RequestOverrides::new()
                    .url(&rewritten)?
                    .header("x-forwarded-by", "mustekala");
                route.resume(Some(overrides)).await
            }
        }),
    );

    let outcome = router
        .handle_request(Request::get(format!("{}/original", uri)).unwrap())
        .await
        .unwrap();

    match outcome {
        RequestOutcome::Continued(response) => {
            assert_eq!(response.status_code(), Some(200));
            assert_eq!(response.text().unwrap(), "rewritten target");
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
}

/// wait_for_next resolves with the first matching exchange and times out
/// otherwise.
#[tokio::test]
async fn waiter_sees_matching_exchange() {
    let router = Arc::new(offline_router());
    router.route(
        RoutePattern::glob("**/api/slow").unwrap(),
        Arc::new(|route: RouteContext| async move {
            tokio::time::sleep(Duration::from_millis(30)).await;
            route
                .fulfill(Response::json_value(StatusCode::OK, &json!({"done": true}))?)
                .await
        }),
    );

    let events = router.events().clone();
    let waiter = tokio::spawn(async move {
        events
            .wait_for_next(
                |request, response| request.url.ends_with("/api/slow") && response.is_success(),
                Duration::from_secs(2),
            )
            .await
    });

    tokio::time::sleep(Duration::from_millis(10)).await;
    router
        .handle_request(Request::get("https://app.test/api/slow").unwrap())
        .await
        .unwrap();

    let exchange = waiter.await.unwrap().unwrap();
    assert!(exchange.request.url.ends_with("/api/slow"));
    assert_eq!(exchange.response.status_code(), Some(200));

    let err = router
        .events()
        .wait_for_next(|request, _| request.url.contains("/never"), Duration::from_millis(40))
        .await
        .unwrap_err();
    assert!(err.is_timeout());
}

/// Pages are independent: a slow handler on one router does not block
/// another router's dispatch.
#[tokio::test]
async fn pages_dispatch_independently() {
    let slow = offline_router();
    slow.route(
        RoutePattern::glob("**/*").unwrap(),
        Arc::new(|route: RouteContext| async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            route.fulfill(Response::ok()).await
        }),
    );

    let fast = offline_router();
    fast.route(
        RoutePattern::glob("**/*").unwrap(),
        Arc::new(|route: RouteContext| async move { route.fulfill(Response::ok()).await }),
    );

    let slow_rx = slow
        .capture(Request::get("https://one.test/a").unwrap())
        .unwrap();

    let started = std::time::Instant::now();
    fast.handle_request(Request::get("https://two.test/a").unwrap())
        .await
        .unwrap();
    assert!(started.elapsed() < Duration::from_millis(150));

    slow_rx.await.unwrap();
}

/// Registering a route never affects requests captured before it.
#[tokio::test]
async fn late_registration_does_not_affect_in_flight_requests() {
    let router = Arc::new(offline_router());
    router.route(
        RoutePattern::glob("**/api/items").unwrap(),
        Arc::new(|route: RouteContext| async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            route
                .fulfill(Response::json_value(StatusCode::OK, &json!({"from": "original"}))?)
                .await
        }),
    );

    let in_flight = router
        .capture(Request::get("https://app.test/api/items").unwrap())
        .unwrap();

    // Registered after capture; must only affect future requests
    router.route(
        RoutePattern::glob("**/api/items").unwrap(),
        Arc::new(|route: RouteContext| async move {
            route
                .fulfill(Response::json_value(StatusCode::OK, &json!({"from": "late"}))?)
                .await
        }),
    );

    let outcome = in_flight.await.unwrap();
    let body: Value = outcome.response().unwrap().json().unwrap();
    assert_eq!(body["from"], "original");

    let outcome = router
        .handle_request(Request::get("https://app.test/api/items").unwrap())
        .await
        .unwrap();
    let body: Value = outcome.response().unwrap().json().unwrap();
    assert_eq!(body["from"], "late");
}

/// Closing the router force-aborts queued requests as context-closed.
#[tokio::test]
async fn close_aborts_pending_requests() {
    let router = offline_router();
    router.route(
        RoutePattern::glob("**/*").unwrap(),
        Arc::new(|route: RouteContext| async move {
            tokio::time::sleep(Duration::from_secs(10)).await;
            route.fulfill(Response::ok()).await
        }),
    );

    let stuck = router
        .capture(Request::get("https://app.test/hang").unwrap())
        .unwrap();
    let queued = router
        .capture(Request::get("https://app.test/queued").unwrap())
        .unwrap();

    tokio::time::sleep(Duration::from_millis(20)).await;
    router.close();

    assert!(matches!(
        stuck.await.unwrap(),
        RequestOutcome::Aborted(AbortReason::ContextClosed)
    ));
    assert!(matches!(
        queued.await.unwrap(),
        RequestOutcome::Aborted(AbortReason::ContextClosed)
    ));
}
