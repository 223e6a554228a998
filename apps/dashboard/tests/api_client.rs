use mockito::{Matcher, Server};
use secure_store::{FileStorage, LocalStore, UserDataStore};
use serde_json::json;
use solsniperx_dashboard::{ApiClient, ApiError};
use std::time::Duration;
use tempfile::TempDir;

fn client_for(server: &Server) -> ApiClient {
    ApiClient::new(server.url(), Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn test_buy_sends_default_slippage_and_bearer_token() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/api/trading/buy")
        .match_header("authorization", "Bearer jwt-123")
        .match_header("content-type", "application/json")
        .match_body(Matcher::Json(json!({
            "token_address": "So111",
            "amount_sol": 0.5,
            "slippage": 1.0
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"success": true, "transaction_id": "5xyz"}"#)
        .create_async()
        .await;

    let api = client_for(&server).with_token(Some("jwt-123".to_string()));
    let response = api.buy_token("So111", 0.5, None).await.unwrap();

    assert_eq!(response["transaction_id"], "5xyz");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_no_authorization_header_without_token() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/api/wallet/balance")
        .match_header("authorization", Matcher::Missing)
        .with_status(200)
        .with_body(r#"{"sol_balance": 2.5}"#)
        .create_async()
        .await;

    let response = client_for(&server).wallet_balance().await.unwrap();
    assert_eq!(response["sol_balance"], 2.5);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_backend_error_field_becomes_message() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/api/trading/sell")
        .with_status(400)
        .with_body(r#"{"error": "Insufficient token balance"}"#)
        .create_async()
        .await;

    let err = client_for(&server)
        .sell_token("So111", 10.0, Some(2.5))
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(400));
    assert_eq!(err.to_string(), "Insufficient token balance");
}

#[tokio::test]
async fn test_status_fallback_message_for_non_json_error() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/api/ai/analyze/So111")
        .with_status(502)
        .with_body("Bad Gateway")
        .create_async()
        .await;

    let err = client_for(&server).analyze_token("So111").await.unwrap_err();
    assert!(matches!(err, ApiError::Status { status: 502, .. }));
    assert_eq!(err.to_string(), "HTTP error! status: 502");
}

#[tokio::test]
async fn test_token_history_query() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/api/tokens/So111/history")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("interval".into(), "1h".into()),
            Matcher::UrlEncoded("limit".into(), "24".into()),
        ]))
        .with_status(200)
        .with_body(r#"{"history": []}"#)
        .create_async()
        .await;

    let response = client_for(&server)
        .token_history("So111", "1h", 24)
        .await
        .unwrap();
    assert_eq!(response, json!({"history": []}));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_success_with_non_json_body_is_decode_error() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/health")
        .with_status(200)
        .with_body("ok")
        .create_async()
        .await;

    let err = client_for(&server).health().await.unwrap_err();
    assert!(matches!(err, ApiError::Decode(_)));
}

#[tokio::test]
async fn test_auto_trader_toggle() {
    let mut server = Server::new_async().await;
    let start = server
        .mock("POST", "/api/auto-trader/start")
        .with_status(200)
        .with_body(r#"{"enabled": true}"#)
        .create_async()
        .await;
    let stop = server
        .mock("POST", "/api/auto-trader/stop")
        .with_status(200)
        .with_body(r#"{"enabled": false}"#)
        .create_async()
        .await;

    let api = client_for(&server);
    assert_eq!(api.start_auto_trader().await.unwrap()["enabled"], true);
    assert_eq!(api.stop_auto_trader().await.unwrap()["enabled"], false);
    start.assert_async().await;
    stop.assert_async().await;
}

#[tokio::test]
async fn test_stored_auth_token_is_sent() {
    let dir = TempDir::new().unwrap();
    let data = UserDataStore::new(LocalStore::new(
        FileStorage::open(dir.path().join("storage.json")).unwrap(),
    ));
    assert!(data.save_auth_token("stored-jwt"));

    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/api/mempool/monitor")
        .match_header("authorization", "Bearer stored-jwt")
        .with_status(200)
        .with_body(r#"{"pending": 3}"#)
        .create_async()
        .await;

    let api = client_for(&server).with_token(data.get_auth_token());
    assert_eq!(api.monitor_mempool().await.unwrap()["pending"], 3);
    mock.assert_async().await;
}
