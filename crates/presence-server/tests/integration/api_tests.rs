use std::net::SocketAddr;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::json;

use presence_server::rate_limit::RateLimit;

use crate::common::{get_json, post_json, send_from, setup_test_app, spawn_mock_site};

#[tokio::test]
async fn health_returns_ok() {
    let (status, json) = get_json(setup_test_app(), "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert!(json["timestamp"].is_string());
    assert!(json["uptime_secs"].is_u64());
}

#[tokio::test]
async fn unknown_route_returns_json_404() {
    let (status, json) = get_json(setup_test_app(), "/v1/nope").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["success"], false);
    assert_eq!(json["error"], "not_found");
}

#[tokio::test]
async fn openapi_document_is_served() {
    let (status, json) = get_json(setup_test_app(), "/api-docs/openapi.json").await;

    assert_eq!(status, StatusCode::OK);
    assert!(json["paths"]["/v1/resolve"].is_object());
}

#[tokio::test]
async fn resolves_a_site_end_to_end() {
    let addr = spawn_mock_site().await;
    let url = format!("http://{addr}/");

    let (status, json) = post_json(
        setup_test_app(),
        "/v1/resolve",
        json!({ "locators": [url] }).to_string(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert_eq!(json["count"], 1);
    assert!(json["timestamp"].is_string());

    let record = &json["results"][0];
    assert_eq!(record["url"], url);
    assert_eq!(record["company"], "Mock Co");
    assert_eq!(record["app_present"], false);
    assert_eq!(record["status"], "ok");
    assert!(record["google_play_data"].is_null());
    assert!(record["app_store_data"].is_null());
    assert_eq!(record["fallback_data"]["source"], "website");
    assert_eq!(record["fallback_data"]["employee_size"], "12");
    assert!(record.get("error").is_none());
}

#[tokio::test]
async fn urls_alias_is_accepted() {
    let addr = spawn_mock_site().await;

    let (status, json) = post_json(
        setup_test_app(),
        "/v1/resolve",
        json!({ "urls": [format!("http://{addr}/")] }).to_string(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["count"], 1);
}

#[tokio::test]
async fn results_follow_request_order_across_batches() {
    let addr = spawn_mock_site().await;
    // Four inputs with a batch size of three: two batches.
    let urls = vec![
        format!("http://{addr}/"),
        format!("http://{addr}/about"),
        format!("http://{addr}/missing"),
        format!("http://{addr}/"),
    ];

    let (status, json) = post_json(
        setup_test_app(),
        "/v1/resolve",
        json!({ "locators": urls }).to_string(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["count"], 4);

    let results = json["results"].as_array().unwrap();
    let returned: Vec<&str> = results.iter().map(|r| r["url"].as_str().unwrap()).collect();
    assert_eq!(returned, urls.iter().map(String::as_str).collect::<Vec<_>>());

    assert_eq!(results[0]["company"], "Mock Co");
    assert_eq!(results[1]["company"], "About Mock");
    assert_eq!(results[3]["company"], "Mock Co");
}

#[tokio::test]
async fn unreachable_page_is_a_failed_record_not_a_failed_request() {
    let addr = spawn_mock_site().await;

    let (status, json) = post_json(
        setup_test_app(),
        "/v1/resolve",
        json!({ "locators": [format!("http://{addr}/missing")] }).to_string(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let record = &json["results"][0];
    assert_eq!(record["status"], "failed");
    assert_eq!(record["app_present"], false);
    assert!(record["company"].is_null());
    assert!(record["fallback_data"].is_null());
    assert!(record["error"].as_str().unwrap().contains("404"));
}

#[tokio::test]
async fn empty_list_is_rejected() {
    let (status, json) = post_json(
        setup_test_app(),
        "/v1/resolve",
        json!({ "locators": [] }).to_string(),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["success"], false);
    assert_eq!(json["error"], "invalid_request");
}

#[tokio::test]
async fn more_than_ten_locators_are_rejected() {
    let urls: Vec<String> = (0..11).map(|i| format!("site{i}.example")).collect();

    let (status, json) = post_json(
        setup_test_app(),
        "/v1/resolve",
        json!({ "locators": urls }).to_string(),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["message"].as_str().unwrap().contains("Maximum 10"));
}

#[tokio::test]
async fn invalid_entries_are_listed() {
    let (status, json) = post_json(
        setup_test_app(),
        "/v1/resolve",
        json!({ "locators": ["example.com", "not a url", "ftp://example.com"] }).to_string(),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["details"], json!(["not a url", "ftp://example.com"]));
}

#[tokio::test]
async fn malformed_bodies_are_rejected() {
    for body in [
        "{not json".to_string(),
        json!({}).to_string(),
        json!({ "locators": "example.com" }).to_string(),
        json!({ "locators": [1, 2] }).to_string(),
    ] {
        let (status, json) = post_json(setup_test_app(), "/v1/resolve", body.clone()).await;

        assert_eq!(status, StatusCode::BAD_REQUEST, "body: {body}");
        assert_eq!(json["success"], false);
        assert!(json["timestamp"].is_string());
    }
}

#[tokio::test]
async fn oversized_body_is_rejected() {
    let padding = "a".repeat(2 * 1024 * 1024);
    let body = json!({ "locators": ["example.com"], "padding": padding }).to_string();

    let (status, json) = post_json(setup_test_app(), "/v1/resolve", body).await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(json["success"], false);
}

#[tokio::test]
async fn requests_over_the_quota_get_a_json_429() {
    let app = RateLimit {
        max_requests: 2,
        window: Duration::from_secs(60),
    }
    .apply(setup_test_app())
    .unwrap();
    let client: SocketAddr = "203.0.113.7:40000".parse().unwrap();
    let health = || Request::get("/health").body(Body::empty()).unwrap();

    for _ in 0..2 {
        let (status, _) = send_from(app.clone(), client, health()).await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, json) = send_from(app.clone(), client, health()).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(json["success"], false);
    assert_eq!(json["error"], "rate_limit_exceeded");
    assert!(json["message"].is_string());
    assert!(json["timestamp"].is_string());

    // The quota covers the resolve endpoint too.
    let resolve = Request::post("/v1/resolve")
        .header("content-type", "application/json")
        .body(Body::from(json!({ "locators": ["example.com"] }).to_string()))
        .unwrap();
    let (status, _) = send_from(app.clone(), client, resolve).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);

    // Quotas are per client address.
    let other: SocketAddr = "198.51.100.20:40000".parse().unwrap();
    let (status, _) = send_from(app, other, health()).await;
    assert_eq!(status, StatusCode::OK);
}
