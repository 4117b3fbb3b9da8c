//! Integration tests for the edge guard over the page routes.
//!
//! The edge guard sees only the signed session cookie: public pages pass,
//! protected pages without an authenticated session redirect to login with
//! the original path preserved as `from`.

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use tower::ServiceExt;

use reseller_integration_tests::test_app;

async fn get(path: &str) -> axum::response::Response {
    test_app()
        .oneshot(
            Request::builder()
                .uri(path)
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response")
}

fn location(response: &axum::response::Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .expect("location header")
        .to_str()
        .expect("utf8 location")
}

#[tokio::test]
async fn test_public_pages_render_without_session() {
    for path in ["/", "/login", "/signup"] {
        let response = get(path).await;
        assert_eq!(response.status(), StatusCode::OK, "path {path}");
    }
}

#[tokio::test]
async fn test_landing_page_lists_plans() {
    let response = get("/").await;
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let body: serde_json::Value = serde_json::from_slice(&bytes).expect("json");

    let plans = body["plans"].as_array().expect("plans array");
    assert_eq!(plans.len(), 2);
    assert_eq!(plans[0]["plan"], "free");
    assert_eq!(plans[1]["plan"], "premium");
    assert_eq!(plans[1]["price"], "49.99");
}

#[tokio::test]
async fn test_protected_page_redirects_to_login_with_from() {
    let response = get("/dashboard").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login?from=%2Fdashboard");
}

#[tokio::test]
async fn test_premium_dashboard_redirects_without_session() {
    let response = get("/premium-dashboard").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login?from=%2Fpremium-dashboard");
}

#[tokio::test]
async fn test_payment_pages_redirect_without_session() {
    let response = get("/payment").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login?from=%2Fpayment");

    let response = get("/payment/complete").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login?from=%2Fpayment%2Fcomplete");
}

#[tokio::test]
async fn test_session_cookie_without_identity_still_redirects() {
    // A cart mutation creates a session (and a signed cookie) without any
    // authenticated identity. The guard keys on identity, not on cookie
    // presence alone.
    let app = test_app();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/cart/clear")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("session cookie")
        .to_str()
        .expect("utf8 cookie")
        .split(';')
        .next()
        .expect("cookie pair")
        .to_string();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/dashboard")
                .header(header::COOKIE, cookie)
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login?from=%2Fdashboard");
}
