//! Request rate limiting through the full middleware stack

#[macro_use]
mod common;

use actix_web::http::StatusCode;
use actix_web::test;
use serde_json::Value;

use common::test_state;

#[actix_web::test]
async fn test_requests_over_budget_are_rejected() {
    let (state, _dir) = test_state(&[
        ("rate_limit.enabled", "true"),
        ("rate_limit.max_requests", "2"),
        ("rate_limit.window_seconds", "120"),
    ])
    .await;
    let app = test_app!(state);

    for expected_remaining in ["1", "0"] {
        let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers().get("x-ratelimit-limit").unwrap(), "2");
        assert_eq!(
            resp.headers().get("x-ratelimit-remaining").unwrap(),
            expected_remaining
        );
    }

    let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(resp.headers().get("retry-after").unwrap(), "120");
    assert_eq!(resp.headers().get("x-ratelimit-remaining").unwrap(), "0");
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], 429);
    assert_eq!(body["message"], "Too many requests. Please try again later.");
    assert_eq!(state.rate_limiter.tracked_clients(), 1);
}

#[actix_web::test]
async fn test_disabled_limiter_lets_everything_through() {
    let (state, _dir) = test_state(&[("rate_limit.max_requests", "1")]).await;
    let app = test_app!(state);

    for _ in 0..5 {
        let resp =
            test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }
    assert_eq!(state.rate_limiter.tracked_clients(), 0);
}

#[actix_web::test]
async fn test_forwarded_header_from_untrusted_peer_is_ignored() {
    let (state, _dir) = test_state(&[
        ("rate_limit.enabled", "true"),
        ("rate_limit.max_requests", "2"),
    ])
    .await;
    let app = test_app!(state);

    let mut statuses = Vec::new();
    for i in 0..3 {
        let req = test::TestRequest::get()
            .uri("/")
            .peer_addr("203.0.113.9:4000".parse().unwrap())
            .insert_header(("X-Forwarded-For", format!("10.0.0.{i}")))
            .to_request();
        statuses.push(test::call_service(&app, req).await.status());
    }
    assert_eq!(
        statuses,
        [StatusCode::OK, StatusCode::OK, StatusCode::TOO_MANY_REQUESTS]
    );
    assert_eq!(state.rate_limiter.tracked_clients(), 1);
}

#[actix_web::test]
async fn test_trusted_proxy_forwards_client_address() {
    let (state, _dir) = test_state(&[
        ("rate_limit.enabled", "true"),
        ("rate_limit.max_requests", "1"),
        ("rate_limit.trusted_proxies", "127.0.0.1"),
    ])
    .await;
    let app = test_app!(state);

    for client in ["198.51.100.1", "198.51.100.2"] {
        let req = test::TestRequest::get()
            .uri("/")
            .peer_addr("127.0.0.1:8000".parse().unwrap())
            .insert_header(("X-Forwarded-For", client))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
    }
    let req = test::TestRequest::get()
        .uri("/")
        .peer_addr("127.0.0.1:8000".parse().unwrap())
        .insert_header(("X-Forwarded-For", "198.51.100.1"))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::TOO_MANY_REQUESTS
    );
    assert_eq!(state.rate_limiter.tracked_clients(), 2);
}
