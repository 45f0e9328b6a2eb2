use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{Request, StatusCode};
use axum::response::Html;
use axum::routing::get;
use http_body_util::BodyExt;
use tokio::net::TcpListener;
use tower::ServiceExt;

use presence_client::{ReqwestFetcher, web_aggregator};
use presence_core::PipelineConfig;
use presence_server::routes;
use presence_server::state::AppState;

pub const LANDING_PAGE: &str = r#"<html><head>
    <meta property="og:site_name" content="Mock Co">
    <title>Mock Co | Home</title>
    </head><body>
    <p>A team of 12 building mock things.</p>
    <a href="/about">About</a>
    </body></html>"#;

/// Serve a small company site on an ephemeral loopback port.
///
/// `/` and `/about` return pages; every other path is a 404.
pub async fn spawn_mock_site() -> SocketAddr {
    let site = Router::new()
        .route("/", get(|| async { Html(LANDING_PAGE) }))
        .route(
            "/about",
            get(|| async { Html("<html><head><title>About Mock</title></head></html>") }),
        );

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind mock site");
    let addr = listener.local_addr().expect("Failed to read mock site address");
    tokio::spawn(async move {
        axum::serve(listener, site).await.expect("Mock site crashed");
    });
    addr
}

/// The real router, wired to a transport that may reach the loopback mock site.
pub fn setup_test_app() -> Router {
    let fetcher = ReqwestFetcher::new(Duration::from_secs(5))
        .expect("Failed to build HTTP client")
        .allow_private_urls();
    let config = PipelineConfig::default().with_inter_batch_delay(Duration::from_millis(10));
    let state = AppState::new(web_aggregator(fetcher), config).expect("Invalid test config");

    routes::router(Arc::new(state))
}

pub async fn post_json(app: Router, path: &str, body: String) -> (StatusCode, serde_json::Value) {
    let response = app
        .oneshot(
            Request::post(path)
                .header("content-type", "application/json")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    read(response).await
}

pub async fn get_json(app: Router, path: &str) -> (StatusCode, serde_json::Value) {
    let response = app
        .oneshot(Request::get(path).body(Body::empty()).unwrap())
        .await
        .unwrap();
    read(response).await
}

/// Send `request` as if it arrived from `peer`, the key the rate limiter uses.
pub async fn send_from(
    app: Router,
    peer: SocketAddr,
    mut request: Request<Body>,
) -> (StatusCode, serde_json::Value) {
    request.extensions_mut().insert(ConnectInfo(peer));
    let response = app.oneshot(request).await.unwrap();
    read(response).await
}

async fn read(response: axum::response::Response) -> (StatusCode, serde_json::Value) {
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&body).unwrap();
    (status, json)
}
