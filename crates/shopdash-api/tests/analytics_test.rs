//! Integration tests for the analytics endpoints.

mod helpers;

use axum::http::StatusCode;
use serde_json::json;

#[tokio::test]
async fn test_menu_lists_only_visible_analytics() {
    let app = helpers::TestApp::new().await;
    let cookie = app.login("sales_manager").await;

    let response = app.request("GET", "/api/analytics", None, Some(&cookie)).await;
    assert_eq!(response.status, StatusCode::OK);
    let ids: Vec<&str> = response.body["data"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|a| a["id"].as_str())
        .collect();
    assert_eq!(ids, vec!["order_distribution"]);

    let response = app
        .request("GET", "/api/analytics/payment_status", None, Some(&cookie))
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_chart_and_no_data_states() {
    let app = helpers::TestApp::new().await;
    let cookie = app.login("administrator").await;

    let empty = app
        .request("GET", "/api/analytics/order_distribution", None, Some(&cookie))
        .await;
    assert_eq!(empty.body["data"]["status"], "no_data");
    assert_eq!(empty.body["data"]["message"], "No order data available");

    app.execute("INSERT INTO orders VALUES (1, '2024-01-01', 10.0, 1.0), (2, '2024-01-02', 30.0, 2.0)")
        .await;
    let ready = app
        .request("GET", "/api/analytics/order_distribution", None, Some(&cookie))
        .await;
    let data = &ready.body["data"];
    assert_eq!(data["status"], "ready");
    assert_eq!(data["chart"]["kind"], "scatter");
    assert_eq!(data["metrics"][0], json!({"label": "Total Orders", "value": "2"}));
}

#[tokio::test]
async fn test_query_failure_is_a_notice() {
    let app = helpers::TestApp::new().await;
    let cookie = app.login("administrator").await;

    let response = app
        .request("GET", "/api/analytics/delivery_status", None, Some(&cookie))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["status"], "failed");
}

#[tokio::test]
async fn test_unknown_analytic_is_not_found() {
    let app = helpers::TestApp::new().await;
    let cookie = app.login("administrator").await;

    let response = app
        .request("GET", "/api/analytics/revenue_forecast", None, Some(&cookie))
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}
