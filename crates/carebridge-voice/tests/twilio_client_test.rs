//! Telephony client tests against a mocked REST API

use carebridge_core::config::TwilioConfig;
use carebridge_core::traits::{OriginateCall, StatusEvent, VoiceProvider};
use carebridge_core::AppError;
use carebridge_voice::TwilioClient;
use serde_json::json;
use wiremock::matchers::{body_string_contains, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server: &MockServer) -> TwilioConfig {
    TwilioConfig {
        account_sid: Some("AC123".to_string()),
        auth_token: Some("secret".to_string()),
        phone_number: Some("+15559999".to_string()),
        api_base: server.uri(),
        timeout_secs: 5,
    }
}

fn request() -> OriginateCall {
    OriginateCall {
        to: "+15550001".to_string(),
        from: "+15559999".to_string(),
        instruction_url: "https://example.org/api/twiml/connect-sip?room=call-p1-1".to_string(),
        status_callback_url: "https://example.org/api/call-status".to_string(),
        status_events: vec![
            StatusEvent::Initiated,
            StatusEvent::Ringing,
            StatusEvent::Answered,
            StatusEvent::Completed,
        ],
    }
}

#[tokio::test]
async fn test_originate_call_posts_form() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/2010-04-01/Accounts/AC123/Calls.json"))
        .and(header_exists("authorization"))
        .and(body_string_contains("To=%2B15550001"))
        .and(body_string_contains("StatusCallbackEvent=initiated"))
        .and(body_string_contains("StatusCallbackEvent=completed"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "sid": "CA777",
            "status": "queued"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = TwilioClient::new(&config_for(&server)).unwrap();
    let call = client.originate_call(&request()).await.unwrap();

    assert_eq!(call.call_id, "CA777");
    assert_eq!(call.status, "queued");
}

#[tokio::test]
async fn test_rejected_origination_is_upstream_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/2010-04-01/Accounts/AC123/Calls.json"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "code": 21211,
            "message": "The 'To' number is not a valid phone number.",
            "status": 400
        })))
        .mount(&server)
        .await;

    let client = TwilioClient::new(&config_for(&server)).unwrap();
    let err = client.originate_call(&request()).await.unwrap_err();

    match err {
        AppError::Upstream(msg) => {
            assert!(msg.contains("21211"));
            assert!(msg.contains("not a valid phone number"));
        }
        other => panic!("expected upstream error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_unconfigured_client_makes_no_request() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let config = TwilioConfig {
        auth_token: None,
        ..config_for(&server)
    };
    let client = TwilioClient::new(&config).unwrap();
    let err = client.originate_call(&request()).await.unwrap_err();

    assert!(matches!(err, AppError::Config(_)));
}
