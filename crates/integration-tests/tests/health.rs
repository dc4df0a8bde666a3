//! Integration tests for the health endpoint and the shared middleware stack.


use axum::http::StatusCode;
use redseam_integration_tests::TestApp;

#[tokio::test]
async fn test_health_returns_ok() {
    let app = TestApp::spawn().await;

    let response = app.get("/health", &[]).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, "ok");
}

#[tokio::test]
async fn test_security_headers_are_set() {
    let app = TestApp::spawn().await;

    let response = app.get("/health", &[]).await;

    assert_eq!(response.headers["x-frame-options"], "DENY");
    assert_eq!(response.headers["x-content-type-options"], "nosniff");
    let csp = response.headers["content-security-policy"]
        .to_str()
        .expect("CSP is ASCII");
    assert!(csp.contains("script-src 'none'"));
}

#[tokio::test]
async fn test_request_id_is_generated_and_echoed() {
    let app = TestApp::spawn().await;

    let generated = app.get("/health", &[]).await;
    assert!(generated.headers.contains_key("x-request-id"));

    let request = axum::http::Request::get("/health")
        .header("x-request-id", "abc-123")
        .body(axum::body::Body::empty())
        .expect("Failed to build request");
    let echoed = app.send(request).await;
    assert_eq!(echoed.headers["x-request-id"], "abc-123");
}

#[tokio::test]
async fn test_root_redirects_to_products() {
    let app = TestApp::spawn().await;

    let response = app.get("/", &[]).await;

    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location(), Some("/products"));
}

#[tokio::test]
async fn test_static_files_are_served() {
    let app = TestApp::spawn().await;

    let response = app.get("/static/images/logo.svg", &[]).await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("<svg"));
}
