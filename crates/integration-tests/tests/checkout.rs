//! Integration tests for the checkout form and order placement.

use axum::http::StatusCode;
use redseam_integration_tests::{TestApp, auth_cookie, cart_line};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, ResponseTemplate};

const VALID_FORM: &str =
    "name=Nino&surname=Beridze&email=nino%40example.com&address=Rustaveli+1&zipcode=0108";

async fn mount_cart(app: &TestApp, lines: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/api/cart"))
        .respond_with(ResponseTemplate::new(200).set_body_json(lines))
        .mount(&app.api)
        .await;
}

#[tokio::test]
async fn test_checkout_page_shows_summary() {
    let app = TestApp::spawn().await;
    mount_cart(&app, json!([cart_line(1, 10, 2, "Red", "S")])).await;

    let cookie = auth_cookie("secret-token");
    let response = app.get("/checkout", &[&cookie]).await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("id=\"checkout-form\""));
    assert!(response.body.contains("$20.00"));
    assert!(response.body.contains("$25.00"));
}

#[tokio::test]
async fn test_checkout_requires_every_field() {
    let app = TestApp::spawn().await;
    mount_cart(&app, json!([cart_line(1, 10, 1, "Red", "S")])).await;
    Mock::given(method("POST"))
        .and(path("/api/cart/checkout"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.api)
        .await;

    let cookie = auth_cookie("secret-token");
    let response = app
        .post_form(
            "/checkout",
            "name=Nino&surname=+&email=nino%40example.com&address=x&zipcode=1",
            &[&cookie],
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("All fields are required."));
    // Submitted values are kept.
    assert!(response.body.contains("value=\"Nino\""));
}

#[tokio::test]
async fn test_checkout_rejects_invalid_email() {
    let app = TestApp::spawn().await;
    mount_cart(&app, json!([cart_line(1, 10, 1, "Red", "S")])).await;

    let cookie = auth_cookie("secret-token");
    let response = app
        .post_form(
            "/checkout",
            "name=Nino&surname=B&email=not-an-email&address=x&zipcode=1",
            &[&cookie],
        )
        .await;

    assert!(response.body.contains("Please enter a valid email address."));
}

#[tokio::test]
async fn test_checkout_rejects_empty_cart() {
    let app = TestApp::spawn().await;
    mount_cart(&app, json!([])).await;

    let cookie = auth_cookie("secret-token");
    let response = app.post_form("/checkout", VALID_FORM, &[&cookie]).await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(
        response
            .body
            .contains("Your cart is empty. Add items before checking out.")
    );
}

#[tokio::test]
async fn test_checkout_without_login() {
    let app = TestApp::spawn().await;

    let response = app.post_form("/checkout", VALID_FORM, &[]).await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("Please log in to complete checkout."));
}

#[tokio::test]
async fn test_checkout_success_shows_confirmation() {
    let app = TestApp::spawn().await;
    Mock::given(method("GET"))
        .and(path("/api/cart"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([cart_line(1, 10, 1, "Red", "S")])),
        )
        .up_to_n_times(1)
        .mount(&app.api)
        .await;
    mount_cart(&app, json!([])).await;
    Mock::given(method("POST"))
        .and(path("/api/cart/checkout"))
        .and(header("authorization", "Bearer secret-token"))
        .and(body_json(json!({
            "name": "Nino",
            "surname": "Beridze",
            "email": "nino@example.com",
            "zip_code": "0108",
            "address": "Rustaveli 1"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "ok" })))
        .expect(1)
        .mount(&app.api)
        .await;

    let cookie = auth_cookie("secret-token");
    let response = app.post_form("/checkout", VALID_FORM, &[&cookie]).await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("Congrats!"));
    assert!(response.body.contains("Your order is placed successfully!"));
}

#[tokio::test]
async fn test_checkout_retries_without_body() {
    let app = TestApp::spawn().await;
    mount_cart(&app, json!([cart_line(1, 10, 1, "Red", "S")])).await;
    Mock::given(method("POST"))
        .and(path("/api/cart/checkout"))
        .and(header("content-type", "application/json"))
        .respond_with(
            ResponseTemplate::new(422).set_body_json(json!({ "message": "Unexpected fields" })),
        )
        .expect(1)
        .mount(&app.api)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/cart/checkout"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "ok" })))
        .expect(1)
        .mount(&app.api)
        .await;

    let cookie = auth_cookie("secret-token");
    let response = app.post_form("/checkout", VALID_FORM, &[&cookie]).await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("Congrats!"));
}

#[tokio::test]
async fn test_checkout_failure_shows_api_message() {
    let app = TestApp::spawn().await;
    mount_cart(&app, json!([cart_line(1, 10, 1, "Red", "S")])).await;
    Mock::given(method("POST"))
        .and(path("/api/cart/checkout"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({ "message": "Payment gateway down" })),
        )
        .mount(&app.api)
        .await;

    let cookie = auth_cookie("secret-token");
    let response = app.post_form("/checkout", VALID_FORM, &[&cookie]).await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(
        response
            .body
            .contains("Checkout failed: Payment gateway down")
    );
}
