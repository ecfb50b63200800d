use aqara::{AqaraClient, Credentials, Error, Signer};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, header_exists, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

const API_PATH: &str = "/v3.0/open/api";
const ACCOUNT: &str = "test@example.com";

fn test_credentials() -> Credentials {
    Credentials::new(
        "4e693d54d75db580a56d1263",
        "k.78784564654feda454557",
        "gU7Qtxi4dWnYAdmudyxni52bWZ58b8uN",
    )
}

fn test_client(mock_server: &MockServer) -> AqaraClient {
    AqaraClient::new_with_base_url(mock_server.uri(), test_credentials(), ACCOUNT, true)
}

fn header_str<'a>(request: &'a Request, name: &str) -> Option<&'a str> {
    request
        .headers
        .get(name)
        .map(|value| value.to_str().unwrap())
}

/// Recompute the signature the server would expect for a captured request.
fn expected_signature(request: &Request, access_token: &str) -> String {
    Signer::new(test_credentials()).sign(
        access_token,
        header_str(request, "nonce").unwrap(),
        header_str(request, "time").unwrap(),
    )
}

async fn mount_intent(mock_server: &MockServer, intent: &str, body: &str) {
    Mock::given(method("POST"))
        .and(path(API_PATH))
        .and(body_partial_json(json!({ "intent": intent })))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(mock_server)
        .await;
}

async fn login(mock_server: &MockServer, client: &mut AqaraClient) {
    mount_intent(
        mock_server,
        "config.auth.getToken",
        include_str!("fixtures/token_success.json"),
    )
    .await;
    client.exchange_token("123456").await.unwrap();
}

#[tokio::test]
async fn test_request_auth_code_with_mock_server() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(API_PATH))
        .and(header("content-type", "application/json"))
        .and(header("appid", "4e693d54d75db580a56d1263"))
        .and(header("keyid", "k.78784564654feda454557"))
        .and(header("lang", "en"))
        .and(header_exists("nonce"))
        .and(header_exists("time"))
        .and(header_exists("sign"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(include_str!("fixtures/auth_code_success.json")),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    client.request_auth_code().await.unwrap();
    assert!(!client.is_authenticated());

    let requests = mock_server.received_requests().await.unwrap();
    let request = &requests[0];

    assert!(request.headers.get("accesstoken").is_none());
    assert_eq!(header_str(request, "nonce").unwrap().len(), 16);
    assert_eq!(
        header_str(request, "sign").unwrap(),
        expected_signature(request, "")
    );

    let body: serde_json::Value = request.body_json().unwrap();
    assert_eq!(
        body,
        json!({
            "intent": "config.auth.getAuthCode",
            "data": {
                "account": ACCOUNT,
                "accountType": 0,
                "accessTokenValidity": "1h"
            }
        })
    );
}

#[tokio::test]
async fn test_exchange_token_with_mock_server() {
    let mock_server = MockServer::start().await;
    mount_intent(
        &mock_server,
        "config.auth.getToken",
        include_str!("fixtures/token_success.json"),
    )
    .await;

    let mut client = test_client(&mock_server);
    let tokens = client.exchange_token("123456").await.unwrap();

    assert_eq!(tokens.open_id, "453452345234523454");
    assert_eq!(tokens.expires_in, "7199");
    assert!(client.is_authenticated());
    assert_eq!(
        client.session().access_token(),
        "532cad73c5493193d63d367016b98b27"
    );
    assert_eq!(
        client.session().refresh_token(),
        "8a2d0e21e5a3c0f9d7b9e55b1b7d4c3a"
    );

    let requests = mock_server.received_requests().await.unwrap();
    let request = &requests[0];
    assert!(request.headers.get("accesstoken").is_none());
    assert_eq!(
        header_str(request, "sign").unwrap(),
        expected_signature(request, "")
    );

    let body: serde_json::Value = request.body_json().unwrap();
    assert_eq!(
        body,
        json!({
            "intent": "config.auth.getToken",
            "data": { "authCode": "123456", "account": ACCOUNT, "accountType": 0 }
        })
    );
}

#[tokio::test]
async fn test_failed_exchange_keeps_previous_session() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(API_PATH))
        .and(body_partial_json(json!({ "data": { "authCode": "000000" } })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(include_str!("fixtures/token_invalid_code.json")),
        )
        .mount(&mock_server)
        .await;

    let mut client = test_client(&mock_server);

    // Without a prior login the session stays empty
    let err = client.exchange_token("000000").await.unwrap_err();
    assert_eq!(err.api_code(), Some(2002));
    assert!(!client.is_authenticated());

    login(&mock_server, &mut client).await;
    let before = client.session().clone();

    match client.exchange_token("000000").await {
        Err(Error::Api { code, message }) => {
            assert_eq!(code, 2002);
            assert_eq!(message, "Authorization code is invalid or expired");
        }
        other => panic!("expected API error, got {:?}", other),
    }
    assert_eq!(client.session(), &before);
}

#[tokio::test]
async fn test_list_devices_with_mock_server() {
    let mock_server = MockServer::start().await;
    let mut client = test_client(&mock_server);
    login(&mock_server, &mut client).await;

    Mock::given(method("POST"))
        .and(path(API_PATH))
        .and(header("accesstoken", "532cad73c5493193d63d367016b98b27"))
        .and(body_partial_json(json!({ "intent": "query.device.info" })))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(include_str!("fixtures/devices.json")),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let devices = client.list_devices().await.unwrap();
    assert_eq!(devices.total_count, 2);
    assert_eq!(devices.data.len(), 2);
    assert_eq!(devices.data[0].device_name, "Hub E1");
    assert_eq!(devices.data[0].model, "lumi.gateway.agl004");
    assert!(devices.data[0].is_online());
    assert_eq!(devices.data[0].parent_did, "");
    assert_eq!(devices.data[0].time_zone, "");
    assert_eq!(devices.data[1].parent_did, "lumi1.54ef44100042a6c1");
    assert_eq!(devices.data[1].create_time, "1612345999000");
    assert!(!devices.data[1].is_online());

    let requests = mock_server.received_requests().await.unwrap();
    let request = requests.last().unwrap();
    assert_eq!(
        header_str(request, "sign").unwrap(),
        expected_signature(request, "532cad73c5493193d63d367016b98b27")
    );

    let body: serde_json::Value = request.body_json().unwrap();
    assert_eq!(
        body,
        json!({
            "intent": "query.device.info",
            "data": { "dids": [], "positionId": "", "pageNum": 1, "pageSize": 100 }
        })
    );
}

#[tokio::test]
async fn test_list_devices_without_login_is_sent_and_rejected() {
    let mock_server = MockServer::start().await;
    mount_intent(
        &mock_server,
        "query.device.info",
        include_str!("fixtures/token_expired.json"),
    )
    .await;

    let client = test_client(&mock_server);
    let err = client.list_devices().await.unwrap_err();

    // The envelope carries a non-object result; the code check must come first
    assert!(matches!(err, Error::Api { code: 108, .. }));

    let requests = mock_server.received_requests().await.unwrap();
    let request = &requests[0];
    assert_eq!(header_str(request, "accesstoken"), Some(""));
    assert_eq!(
        header_str(request, "sign").unwrap(),
        expected_signature(request, "")
    );
}

#[tokio::test]
async fn test_refresh_token_with_mock_server() {
    let mock_server = MockServer::start().await;
    let mut client = test_client(&mock_server);
    login(&mock_server, &mut client).await;

    Mock::given(method("POST"))
        .and(path(API_PATH))
        .and(body_partial_json(json!({
            "intent": "config.auth.refreshToken",
            "data": { "refreshToken": "8a2d0e21e5a3c0f9d7b9e55b1b7d4c3a" }
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(include_str!("fixtures/token_refreshed.json")),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let tokens = client.refresh_token().await.unwrap();
    assert_eq!(tokens.access_token, "0f1e2d3c4b5a69788796a5b4c3d2e1f0");
    assert_eq!(
        client.session().access_token(),
        "0f1e2d3c4b5a69788796a5b4c3d2e1f0"
    );
    assert_eq!(
        client.session().refresh_token(),
        "11223344556677889900aabbccddeeff"
    );
}

#[tokio::test]
async fn test_http_error_status() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(API_PATH))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
        .mount(&mock_server)
        .await;

    let client = test_client(&mock_server);
    let result = client.request_auth_code().await;
    assert!(matches!(result, Err(Error::Status(502))));
}

#[tokio::test]
async fn test_malformed_response() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(API_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&mock_server)
        .await;

    let mut client = test_client(&mock_server);
    let result = client.exchange_token("123456").await;
    assert!(matches!(result, Err(Error::Decode(_))));
    assert!(!client.is_authenticated());
}

#[tokio::test]
async fn test_success_with_unexpected_result_shape() {
    let mock_server = MockServer::start().await;
    mount_intent(
        &mock_server,
        "query.device.info",
        r#"{"code":0,"requestId":"x","message":"Success","result":{"data":"nope","totalCount":1}}"#,
    )
    .await;

    let client = test_client(&mock_server);
    assert!(matches!(client.list_devices().await, Err(Error::Decode(_))));
}

#[tokio::test]
async fn test_each_call_uses_a_fresh_nonce() {
    let mock_server = MockServer::start().await;
    mount_intent(
        &mock_server,
        "config.auth.getAuthCode",
        include_str!("fixtures/auth_code_success.json"),
    )
    .await;

    let client = test_client(&mock_server);
    client.request_auth_code().await.unwrap();
    client.request_auth_code().await.unwrap();

    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
    assert_ne!(
        header_str(&requests[0], "nonce"),
        header_str(&requests[1], "nonce")
    );
    for request in &requests {
        assert_eq!(
            header_str(request, "sign").unwrap(),
            expected_signature(request, "")
        );
    }
}

#[tokio::test]
async fn test_transport_failure() {
    // Nothing listens on the discard port
    let client = AqaraClient::new_with_base_url(
        "http://127.0.0.1:9".to_string(),
        test_credentials(),
        ACCOUNT,
        false,
    );
    assert!(matches!(
        client.request_auth_code().await,
        Err(Error::Http(_))
    ));
}
