//! Call lifecycle tests over fake upstream services

mod common;

use carebridge_auth::TokenIssuer;
use carebridge_core::models::{CallDirection, CallStatus, ConnectionInstruction, StatusUpdate};
use carebridge_core::traits::StatusEvent;
use carebridge_core::AppError;
use carebridge_services::inbound_gate::{NO_PROVIDER_MESSAGE, SESSION_EXPIRED_MESSAGE};
use carebridge_services::PlaceCall;
use common::{build, issuer_for, test_config, FakeRooms, FakeVoice};
use std::sync::Arc;

fn place_request() -> PlaceCall {
    PlaceCall {
        patient_id: "p42".to_string(),
        patient_phone: "+15550001".to_string(),
        provider_id: "P1".to_string(),
    }
}

#[tokio::test]
async fn test_place_call_records_initiated_call() {
    let rooms = Arc::new(FakeRooms::default());
    let voice = Arc::new(FakeVoice::default());
    let services = build(&test_config(), rooms.clone(), voice.clone());

    let record = services.placer.place_call(&place_request()).await.unwrap();

    assert_eq!(record.call_id, "CA900");
    assert_eq!(record.status, CallStatus::Initiated);
    assert_eq!(record.direction, CallDirection::Outbound);
    assert!(record.room_name.starts_with("call-p42-"));

    let active = services.registry.list_all().await.unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].call_id, "CA900");

    let requests = voice.requests.lock();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].to, "+15550001");
    assert_eq!(requests[0].from, "+15559999");
    assert_eq!(
        requests[0].instruction_url,
        format!(
            "https://bridge.example.org/api/twiml/connect-sip?room={}",
            record.room_name
        )
    );
    assert_eq!(
        requests[0].status_callback_url,
        "https://bridge.example.org/api/call-status"
    );
    assert!(requests[0].status_events.contains(&StatusEvent::Completed));
    assert_eq!(rooms.created.lock().as_slice(), &[record.room_name.clone()]);
}

#[tokio::test]
async fn test_place_call_without_source_number_touches_nothing() {
    let mut config = test_config();
    config.twilio.phone_number = None;
    let rooms = Arc::new(FakeRooms::default());
    let voice = Arc::new(FakeVoice::default());
    let services = build(&config, rooms.clone(), voice.clone());

    let err = services.placer.place_call(&place_request()).await.unwrap_err();

    assert!(matches!(err, AppError::Config(_)));
    assert!(rooms.created.lock().is_empty());
    assert!(voice.requests.lock().is_empty());
}

#[tokio::test]
async fn test_place_call_without_credentials_is_config_error() {
    let rooms = Arc::new(FakeRooms::default());
    let voice = Arc::new(FakeVoice {
        configured: false,
        ..FakeVoice::default()
    });
    let services = build(&test_config(), rooms.clone(), voice);

    let err = services.placer.place_call(&place_request()).await.unwrap_err();

    assert!(matches!(err, AppError::Config(_)));
    assert!(rooms.created.lock().is_empty());
}

#[tokio::test]
async fn test_failed_origination_releases_room() {
    let rooms = Arc::new(FakeRooms::default());
    let voice = Arc::new(FakeVoice {
        fail: true,
        ..FakeVoice::default()
    });
    let services = build(&test_config(), rooms.clone(), voice);

    let err = services.placer.place_call(&place_request()).await.unwrap_err();

    assert!(matches!(err, AppError::Upstream(_)));
    let created = rooms.created.lock().clone();
    assert_eq!(created.len(), 1);
    assert_eq!(rooms.deleted.lock().as_slice(), created.as_slice());
    assert!(services.registry.list_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_room_failure_does_not_originate() {
    let rooms = Arc::new(FakeRooms {
        fail_create: true,
        ..FakeRooms::default()
    });
    let voice = Arc::new(FakeVoice::default());
    let services = build(&test_config(), rooms, voice.clone());

    let err = services.placer.place_call(&place_request()).await.unwrap_err();

    assert!(matches!(err, AppError::Upstream(_)));
    assert!(voice.requests.lock().is_empty());
}

#[tokio::test]
async fn test_incoming_call_holds_caller() {
    let rooms = Arc::new(FakeRooms::default());
    let services = build(&test_config(), rooms.clone(), Arc::new(FakeVoice::default()));

    let instruction = services
        .gate
        .on_incoming_call(Some("CA123"), "+15551234", "+15559999")
        .await
        .unwrap();

    match instruction {
        ConnectionInstruction::Hold {
            greeting,
            hold_audio,
            pause_secs,
            redirect_url,
        } => {
            assert!(greeting.is_some());
            assert!(hold_audio.is_some());
            assert_eq!(pause_secs, 3);
            assert_eq!(
                redirect_url,
                "https://bridge.example.org/api/twiml/wait-for-provider?callSid=CA123&attempt=1"
            );
        }
        other => panic!("expected hold, got {:?}", other),
    }

    let record = services.registry.get("CA123").await.unwrap().unwrap();
    assert_eq!(record.status, CallStatus::Ringing);
    assert_eq!(record.room_name, "incoming-CA123");
    assert_eq!(rooms.created.lock().as_slice(), &["incoming-CA123".to_string()]);

    // Provider webhook retry does not provision a second room
    services
        .gate
        .on_incoming_call(Some("CA123"), "+15551234", "+15559999")
        .await
        .unwrap();
    assert_eq!(rooms.created.lock().len(), 1);
}

#[tokio::test]
async fn test_incoming_call_without_sid_gets_generated_id() {
    let services = build(
        &test_config(),
        Arc::new(FakeRooms::default()),
        Arc::new(FakeVoice::default()),
    );

    services
        .gate
        .on_incoming_call(None, "+15551234", "+15559999")
        .await
        .unwrap();

    let pending = services.registry.list_pending_inbound().await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].call_id.len(), 36);
    assert_eq!(pending[0].room_name, format!("incoming-{}", pending[0].call_id));
}

#[tokio::test]
async fn test_repeated_incoming_webhook_after_answer_bridges() {
    let rooms = Arc::new(FakeRooms::default());
    let services = build(&test_config(), rooms.clone(), Arc::new(FakeVoice::default()));

    services
        .gate
        .on_incoming_call(Some("CA123"), "+15551234", "+15559999")
        .await
        .unwrap();
    services.bridge.answer_call("CA123", "P9").await.unwrap();

    let again = services
        .gate
        .on_incoming_call(Some("CA123"), "+15551234", "+15559999")
        .await
        .unwrap();
    assert!(again.is_bridge());

    let record = services.registry.get("CA123").await.unwrap().unwrap();
    assert_eq!(record.status, CallStatus::Answered);
    assert_eq!(record.provider_id.as_deref(), Some("P9"));
    assert!(record.answered_at.is_some());
    assert_eq!(rooms.created.lock().as_slice(), &["incoming-CA123".to_string()]);
}

#[tokio::test]
async fn test_repeated_incoming_webhook_after_completion_expires() {
    let rooms = Arc::new(FakeRooms::default());
    let services = build(&test_config(), rooms.clone(), Arc::new(FakeVoice::default()));

    services
        .gate
        .on_incoming_call(Some("CA123"), "+15551234", "+15559999")
        .await
        .unwrap();
    services.bridge.answer_call("CA123", "P9").await.unwrap();
    services
        .registry
        .update_status("CA123", StatusUpdate::new(CallStatus::Completed))
        .await
        .unwrap();

    let again = services
        .gate
        .on_incoming_call(Some("CA123"), "+15551234", "+15559999")
        .await
        .unwrap();
    assert_eq!(again, ConnectionInstruction::hangup(SESSION_EXPIRED_MESSAGE));

    assert!(services.registry.get("CA123").await.unwrap().is_none());
    let log = services.registry.call_log(50).await.unwrap();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].status, CallStatus::Completed);
    assert_eq!(log[0].provider_id.as_deref(), Some("P9"));
    assert_eq!(rooms.created.lock().len(), 1);
}

#[tokio::test]
async fn test_in_progress_status_before_answer_keeps_caller_waiting() {
    let services = build(
        &test_config(),
        Arc::new(FakeRooms::default()),
        Arc::new(FakeVoice::default()),
    );

    services
        .gate
        .on_incoming_call(Some("CA124"), "+15551234", "+15559999")
        .await
        .unwrap();
    services
        .registry
        .update_status("CA124", StatusUpdate::new(CallStatus::Active))
        .await
        .unwrap();

    let record = services.registry.get("CA124").await.unwrap().unwrap();
    assert_eq!(record.status, CallStatus::Ringing);
    assert!(record.provider_id.is_none());
    assert_eq!(services.registry.list_pending_inbound().await.unwrap().len(), 1);

    let next = services.gate.wait_for_provider("CA124", 1).await.unwrap();
    assert!(next.is_hold());
}

#[tokio::test]
async fn test_answer_then_poll_bridges() {
    let config = test_config();
    let services = build(
        &config,
        Arc::new(FakeRooms::default()),
        Arc::new(FakeVoice::default()),
    );

    services
        .gate
        .on_incoming_call(Some("CA123"), "+15551234", "+15559999")
        .await
        .unwrap();

    let waiting = services.gate.wait_for_provider("CA123", 1).await.unwrap();
    match &waiting {
        ConnectionInstruction::Hold {
            greeting,
            redirect_url,
            ..
        } => {
            assert!(greeting.is_none());
            assert!(redirect_url.ends_with("attempt=2"));
        }
        other => panic!("expected hold, got {:?}", other),
    }

    let grant = services.bridge.answer_call("CA123", "P9").await.unwrap();
    assert_eq!(grant.room_name, "incoming-CA123");
    assert_eq!(grant.ws_url, "wss://media.example.org");
    assert_eq!(grant.patient_phone.as_deref(), Some("+15551234"));

    let claims = issuer_for(&config).validate_token(&grant.token).unwrap();
    assert_eq!(claims.sub, "provider-P9");
    assert_eq!(claims.room(), Some("incoming-CA123"));
    assert!(claims.video.has_full_participant_rights());

    assert!(services.registry.list_pending_inbound().await.unwrap().is_empty());
    let record = services.registry.get("CA123").await.unwrap().unwrap();
    assert_eq!(record.status, CallStatus::Answered);
    assert_eq!(record.provider_id.as_deref(), Some("P9"));
    assert!(record.answered_at.is_some());

    let bridged = services.gate.wait_for_provider("CA123", 2).await.unwrap();
    assert_eq!(
        bridged,
        ConnectionInstruction::Bridge {
            announcement: "Connecting you to your healthcare provider now.".to_string(),
            sip_uri: "sip:incoming-CA123@sip.example.org".to_string(),
            timeout_secs: 30,
        }
    );
}

#[tokio::test]
async fn test_answer_unknown_call_is_not_found() {
    let services = build(
        &test_config(),
        Arc::new(FakeRooms::default()),
        Arc::new(FakeVoice::default()),
    );

    let err = services.bridge.answer_call("CA404", "P9").await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    assert!(services.registry.list_all().await.unwrap().is_empty());
    assert!(services.registry.call_log(50).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_answer_without_credentials_leaves_call_waiting() {
    let mut config = test_config();
    config.livekit.api_secret = None;
    let services = build(
        &config,
        Arc::new(FakeRooms::default()),
        Arc::new(FakeVoice::default()),
    );
    services
        .gate
        .on_incoming_call(Some("CA5"), "+1777", "+15559999")
        .await
        .unwrap();

    let err = services.bridge.answer_call("CA5", "P9").await.unwrap_err();

    assert!(matches!(err, AppError::Config(_)));
    assert_eq!(services.registry.list_pending_inbound().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_wait_loop_is_bounded() {
    let services = build(
        &test_config(),
        Arc::new(FakeRooms::default()),
        Arc::new(FakeVoice::default()),
    );
    services
        .gate
        .on_incoming_call(Some("CA7"), "+1777", "+15559999")
        .await
        .unwrap();

    assert!(services.gate.wait_for_provider("CA7", 4).await.unwrap().is_hold());

    let released = services.gate.wait_for_provider("CA7", 5).await.unwrap();
    assert_eq!(released, ConnectionInstruction::hangup(NO_PROVIDER_MESSAGE));

    assert!(services.registry.get("CA7").await.unwrap().is_none());
    let log = services.registry.call_log(50).await.unwrap();
    assert_eq!(log[0].status, CallStatus::Failed);

    let after = services.gate.wait_for_provider("CA7", 6).await.unwrap();
    assert_eq!(after, ConnectionInstruction::hangup(SESSION_EXPIRED_MESSAGE));
}

#[tokio::test]
async fn test_wait_for_unknown_call_expires_session() {
    let services = build(
        &test_config(),
        Arc::new(FakeRooms::default()),
        Arc::new(FakeVoice::default()),
    );

    let instruction = services.gate.wait_for_provider("CA-gone", 1).await.unwrap();
    assert_eq!(
        instruction,
        ConnectionInstruction::hangup(SESSION_EXPIRED_MESSAGE)
    );
}

#[tokio::test]
async fn test_bridge_without_sip_domain_is_config_error() {
    let mut config = test_config();
    config.livekit.sip_domain = None;
    let services = build(
        &config,
        Arc::new(FakeRooms::default()),
        Arc::new(FakeVoice::default()),
    );

    let err = services
        .bridge
        .connect_instruction("incoming-CA1")
        .unwrap_err();
    assert!(matches!(err, AppError::Config(_)));
}

#[tokio::test]
async fn test_join_room_answers_waiting_call_and_records_session() {
    let services = build(
        &test_config(),
        Arc::new(FakeRooms::default()),
        Arc::new(FakeVoice::default()),
    );
    services
        .gate
        .on_incoming_call(Some("CA8"), "+15551234", "+15559999")
        .await
        .unwrap();

    let grant = services
        .bridge
        .join_room("incoming-CA8", "P3")
        .await
        .unwrap();
    assert_eq!(grant.patient_phone.as_deref(), Some("+15551234"));

    let record = services.registry.get("CA8").await.unwrap().unwrap();
    assert_eq!(record.status, CallStatus::Answered);
    assert_eq!(record.provider_id.as_deref(), Some("P3"));

    let sessions = services.registry.room_sessions().await.unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].provider_id, "P3");
}

#[tokio::test]
async fn test_join_dispatch_room_derives_phone() {
    let services = build(
        &test_config(),
        Arc::new(FakeRooms::default()),
        Arc::new(FakeVoice::default()),
    );

    let grant = services
        .bridge
        .join_room("twilio-tgl-15551234", "P3")
        .await
        .unwrap();

    assert_eq!(grant.room_name, "twilio-tgl-15551234");
    assert_eq!(grant.patient_phone.as_deref(), Some("+15551234"));
    let sessions = services.registry.room_sessions().await.unwrap();
    assert_eq!(sessions[0].phone_number.as_deref(), Some("+15551234"));
}

#[tokio::test]
async fn test_participant_token_uses_given_identity() {
    let config = test_config();
    let services = build(
        &config,
        Arc::new(FakeRooms::default()),
        Arc::new(FakeVoice::default()),
    );

    let grant = services
        .bridge
        .participant_token("dr-who", "call-p1-1", "provider")
        .unwrap();
    let claims = issuer_for(&config).validate_token(&grant.token).unwrap();

    assert_eq!(claims.identity(), "dr-who");
    assert_eq!(claims.room(), Some("call-p1-1"));
    assert!(grant.patient_phone.is_none());
}

#[tokio::test]
async fn test_participant_token_without_credentials() {
    let mut config = test_config();
    config.livekit.api_key = None;
    let services = build(
        &config,
        Arc::new(FakeRooms::default()),
        Arc::new(FakeVoice::default()),
    );

    let err = services
        .bridge
        .participant_token("dr-who", "call-p1-1", "provider")
        .unwrap_err();
    assert!(matches!(err, AppError::Config(_)));
    assert!(!TokenIssuer::new(None, Some("secret".to_string())).is_configured());
}

#[tokio::test]
async fn test_active_rooms_link_calls() {
    let rooms = Arc::new(FakeRooms {
        participants: 2,
        ..FakeRooms::default()
    });
    let services = build(&test_config(), rooms, Arc::new(FakeVoice::default()));
    services
        .gate
        .on_incoming_call(Some("CA9"), "+15551234", "+15559999")
        .await
        .unwrap();

    let active = services.rooms.active_rooms().await.unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].room_name, "incoming-CA9");
    assert_eq!(active[0].call_id.as_deref(), Some("CA9"));
    assert_eq!(active[0].phone_number.as_deref(), Some("+15551234"));
    assert_eq!(active[0].participant_count, 2);
}

#[tokio::test]
async fn test_status_callbacks_walk_lifecycle() {
    let services = build(
        &test_config(),
        Arc::new(FakeRooms::default()),
        Arc::new(FakeVoice::default()),
    );
    let record = services.placer.place_call(&place_request()).await.unwrap();

    for status in [CallStatus::Ringing, CallStatus::Answered, CallStatus::Active] {
        services
            .registry
            .update_status(&record.call_id, StatusUpdate::new(status))
            .await
            .unwrap();
    }
    let done = services
        .registry
        .update_status(
            &record.call_id,
            StatusUpdate::new(CallStatus::Completed).with_duration(Some(61)),
        )
        .await
        .unwrap();

    assert_eq!(done.duration_secs, Some(61));
    assert!(services.registry.list_all().await.unwrap().is_empty());
    let history = services.registry.call_log_for_patient("p42").await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].status, CallStatus::Completed);
}
