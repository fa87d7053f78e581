//! Every per-cycle failure ends in the confusion cue and a re-arm.

use std::io::Cursor;
use std::sync::Arc;

use crate::helpers::{
    change_led_body, closed_port_url, detect_intent_path, mount_token, spawn_controller, spawn_controller_on,
    test_config, wait_listening, wav_16k,
};
use serde_json::json;
use voicecmd::dispatch::UnrecognizedReason;
use voicecmd::platform::RecordingPlatform;
use voicecmd::{ControllerState, DispatchOutcome, InteractionEvent};
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

const CONFUSION_SOUND: &str = "s_DisorientedConfused3.wav";

fn confusion_count(running: &crate::helpers::Running) -> usize {
    running
        .platform
        .played_audio()
        .iter()
        .filter(|name| *name == CONFUSION_SOUND)
        .count()
}

fn failure_code(events: &[InteractionEvent]) -> Option<&'static str> {
    events.iter().find_map(|e| match e {
        InteractionEvent::CycleFailed { code, .. } => Some(*code),
        _ => None,
    })
}

async fn mount_nlu(server: &MockServer, response: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(detect_intent_path())
        .respond_with(response)
        .mount(server)
        .await;
}

#[tokio::test]
async fn missing_display_name_plays_confusion_and_rearms() {
    let server = MockServer::start().await;
    mount_token(&server, "t").await;
    mount_nlu(
        &server,
        ResponseTemplate::new(200)
            .set_body_json(json!({"queryResult": {"intent": {}, "queryText": "mumble"}})),
    )
    .await;

    let mut running = spawn_controller(test_config(&server));
    wait_listening(&mut running.events).await;
    running.platform.stage_audio(wav_16k());
    running.platform.complete_capture();

    let events = wait_listening(&mut running.events).await;
    assert!(events.contains(&InteractionEvent::Dispatched(DispatchOutcome::Unrecognized(
        UnrecognizedReason::NoIntent
    ))));
    assert!(events.contains(&InteractionEvent::StateChanged {
        from: ControllerState::Fallback,
        to: ControllerState::Listening,
    }));
    assert_eq!(failure_code(&events), None);
    assert_eq!(confusion_count(&running), 1);
    assert!(running.platform.led_colors().is_empty());
    running.stop().await.unwrap();
}

#[tokio::test]
async fn unsupported_colour_takes_fallback() {
    let server = MockServer::start().await;
    mount_token(&server, "t").await;
    mount_nlu(
        &server,
        ResponseTemplate::new(200).set_body_json(change_led_body("purple")),
    )
    .await;

    let mut running = spawn_controller(test_config(&server));
    wait_listening(&mut running.events).await;
    running.platform.stage_audio(wav_16k());
    running.platform.complete_capture();

    let events = wait_listening(&mut running.events).await;
    assert!(events.iter().any(|e| matches!(
        e,
        InteractionEvent::Dispatched(DispatchOutcome::Unrecognized(
            UnrecognizedReason::UnsupportedParameter { .. }
        ))
    )));
    assert_eq!(confusion_count(&running), 1);
    assert!(running.platform.led_colors().is_empty());
    running.stop().await.unwrap();
}

#[tokio::test]
async fn network_failure_takes_fallback_without_retry() {
    let server = MockServer::start().await;
    mount_token(&server, "t").await;
    let mut config = test_config(&server);
    config.nlu.base_url = closed_port_url();

    let mut running = spawn_controller(config);
    wait_listening(&mut running.events).await;
    running.platform.stage_audio(wav_16k());
    running.platform.complete_capture();

    let events = wait_listening(&mut running.events).await;
    assert_eq!(failure_code(&events), Some("TRANSPORT_FAILED"));
    assert!(events.contains(&InteractionEvent::StateChanged {
        from: ControllerState::Recognizing,
        to: ControllerState::Fallback,
    }));
    assert_eq!(confusion_count(&running), 1);
    assert_eq!(running.platform.arm_count(), 2);
    running.stop().await.unwrap();
}

#[tokio::test]
async fn server_error_is_not_retried() {
    let server = MockServer::start().await;
    mount_token(&server, "t").await;
    Mock::given(method("POST"))
        .and(detect_intent_path())
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({
            "error": {"code": 503, "message": "backend unavailable"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut running = spawn_controller(test_config(&server));
    wait_listening(&mut running.events).await;
    running.platform.stage_audio(wav_16k());
    running.platform.complete_capture();

    let events = wait_listening(&mut running.events).await;
    let message = events.iter().find_map(|e| match e {
        InteractionEvent::CycleFailed { message, .. } => Some(message.clone()),
        _ => None,
    });
    assert!(message.unwrap().contains("backend unavailable"));
    running.stop().await.unwrap();
}

#[tokio::test]
async fn malformed_body_is_a_parse_failure() {
    let server = MockServer::start().await;
    mount_token(&server, "t").await;
    mount_nlu(
        &server,
        ResponseTemplate::new(200).set_body_string("<html>gateway</html>"),
    )
    .await;

    let mut running = spawn_controller(test_config(&server));
    wait_listening(&mut running.events).await;
    running.platform.stage_audio(wav_16k());
    running.platform.complete_capture();

    let events = wait_listening(&mut running.events).await;
    assert_eq!(failure_code(&events), Some("PARSE_FAILED"));
    assert_eq!(confusion_count(&running), 1);
    running.stop().await.unwrap();
}

#[tokio::test]
async fn retrieval_failure_rearms_defensively() {
    let server = MockServer::start().await;
    mount_token(&server, "t").await;
    Mock::given(method("POST"))
        .and(detect_intent_path())
        .respond_with(ResponseTemplate::new(200).set_body_json(change_led_body("red")))
        .expect(0)
        .mount(&server)
        .await;

    let mut running = spawn_controller(test_config(&server));
    wait_listening(&mut running.events).await;
    running.platform.fail_next_fetch("recording not found");
    running.platform.complete_capture();

    let events = wait_listening(&mut running.events).await;
    assert_eq!(failure_code(&events), Some("PLATFORM_ERROR"));
    assert!(events.contains(&InteractionEvent::StateChanged {
        from: ControllerState::Capturing,
        to: ControllerState::Fallback,
    }));
    assert_eq!(confusion_count(&running), 1);
    running.stop().await.unwrap();
}

#[tokio::test]
async fn wrong_sample_rate_recording_fails_fast() {
    let server = MockServer::start().await;
    mount_token(&server, "t").await;
    Mock::given(method("POST"))
        .and(detect_intent_path())
        .respond_with(ResponseTemplate::new(200).set_body_json(change_led_body("red")))
        .expect(0)
        .mount(&server)
        .await;

    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 44_100,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        for _ in 0..441 {
            writer.write_sample(0i16).unwrap();
        }
        writer.finalize().unwrap();
    }

    let mut running = spawn_controller(test_config(&server));
    wait_listening(&mut running.events).await;
    running.platform.stage_audio(cursor.into_inner());
    running.platform.complete_capture();

    let events = wait_listening(&mut running.events).await;
    assert_eq!(failure_code(&events), Some("AUDIO_INVALID"));
    running.stop().await.unwrap();
}

#[tokio::test]
async fn arm_failure_is_retried_after_fallback_pause() {
    let server = MockServer::start().await;
    mount_token(&server, "t").await;

    let platform = Arc::new(RecordingPlatform::new());
    platform.fail_next_arms(2);
    let mut running = spawn_controller_on(test_config(&server), platform);

    let events = wait_listening(&mut running.events).await;
    let failures = events
        .iter()
        .filter(|e| matches!(e, InteractionEvent::CycleFailed { code: "PLATFORM_ERROR", .. }))
        .count();
    assert_eq!(failures, 2);
    assert_eq!(running.platform.arm_count(), 3);
    assert_eq!(running.platform.active_listeners(), 1);
    running.stop().await.unwrap();
}

#[tokio::test]
async fn failing_actuation_never_halts_the_loop() {
    let server = MockServer::start().await;
    mount_token(&server, "t").await;
    mount_nlu(
        &server,
        ResponseTemplate::new(200).set_body_json(change_led_body("red")),
    )
    .await;

    let mut running = spawn_controller(test_config(&server));
    wait_listening(&mut running.events).await;
    running.platform.set_fail_actuation(true);
    running.platform.stage_audio(wav_16k());
    running.platform.complete_capture();

    let events = wait_listening(&mut running.events).await;
    assert!(events.contains(&InteractionEvent::StateChanged {
        from: ControllerState::Dispatching,
        to: ControllerState::Fallback,
    }));
    assert!(!running.handle.is_finished());
    running.stop().await.unwrap();
}
