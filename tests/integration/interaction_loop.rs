//! Full listen, capture, recognize, dispatch cycles against a mock backend.

use std::collections::HashSet;

use crate::helpers::{
    change_led_body, collect_until, detect_intent_path, mount_token, spawn_controller,
    test_config, wait_listening, wav_16k,
};
use serde_json::json;
use voicecmd::dispatch::Action;
use voicecmd::platform::{PlatformCall, Rgb};
use voicecmd::{ControllerState, DispatchOutcome, InteractionEvent};
use wiremock::matchers::{body_partial_json, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn change_led_red_succeeds_and_rearms_after_pause() {
    let server = MockServer::start().await;
    mount_token(&server, "abc123").await;
    Mock::given(method("POST"))
        .and(detect_intent_path())
        .and(body_partial_json(json!({
            "queryInput": {
                "audioConfig": {
                    "audioEncoding": "AUDIO_ENCODING_LINEAR_16",
                    "languageCode": "en-US",
                    "sampleRateHertz": 16000
                }
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "queryResult": {
                "intent": {"displayName": "ChangeLED"},
                "parameters": {"color": "red"},
                "queryText": "turn red"
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut running = spawn_controller(test_config(&server));
    wait_listening(&mut running.events).await;
    running.platform.stage_audio(wav_16k());
    running.platform.complete_capture();

    let events = wait_listening(&mut running.events).await;
    assert!(events.contains(&InteractionEvent::Dispatched(DispatchOutcome::Success(
        Action::ChangeLed(Rgb::new(255, 0, 0))
    ))));
    assert!(events.contains(&InteractionEvent::StateChanged {
        from: ControllerState::Dispatching,
        to: ControllerState::Listening,
    }));
    assert!(events.iter().any(|e| matches!(
        e,
        InteractionEvent::IntentRecognized { intent: Some(name), query_text: Some(text), color: Some(color), .. }
            if name == "ChangeLED" && text == "turn red" && color == "red"
    )));
    assert!(!events.iter().any(|e| matches!(e, InteractionEvent::CycleFailed { .. })));

    assert_eq!(running.platform.led_colors(), vec![Rgb::new(255, 0, 0)]);
    assert_eq!(
        running.platform.played_audio(),
        vec!["s_Joy3.wav", "s_Acceptance.wav", "s_Joy3.wav"]
    );
    assert_eq!(running.platform.arm_count(), 2);
    assert_eq!(running.platform.active_listeners(), 1);
    running.stop().await.unwrap();
}

#[tokio::test]
async fn startup_sets_volume_before_arming() {
    let server = MockServer::start().await;
    mount_token(&server, "t").await;

    let mut running = spawn_controller(test_config(&server));
    wait_listening(&mut running.events).await;

    let calls = running.platform.calls();
    assert_eq!(calls[0], PlatformCall::SetVolume(20));
    assert_eq!(calls[1], PlatformCall::StartKeyPhrase { capture_speech: true });
    assert_eq!(calls[2], PlatformCall::RegisterCaptureListener);
    running.stop().await.unwrap();
}

#[tokio::test]
async fn success_returns_to_default_pose_after_compliance() {
    let server = MockServer::start().await;
    mount_token(&server, "t").await;
    Mock::given(method("POST"))
        .and(detect_intent_path())
        .respond_with(ResponseTemplate::new(200).set_body_json(change_led_body("green")))
        .mount(&server)
        .await;

    let mut running = spawn_controller(test_config(&server));
    wait_listening(&mut running.events).await;
    running.platform.stage_audio(wav_16k());
    running.platform.complete_capture();
    wait_listening(&mut running.events).await;

    let calls = running.platform.calls();
    let led = calls
        .iter()
        .position(|c| *c == PlatformCall::ChangeLed(Rgb::new(0, 255, 0)))
        .unwrap();
    let after: Vec<_> = calls[led + 1..]
        .iter()
        .filter_map(|c| match c {
            PlatformCall::MoveArms(pose) => Some(pose.left_degrees),
            _ => None,
        })
        .collect();
    // compliance, default pose after the pause, default pose of the listening cue
    assert_eq!(after, vec![0.0, 90.0, 90.0]);
    running.stop().await.unwrap();
}

#[tokio::test]
async fn exactly_one_listener_after_every_rearm() {
    let server = MockServer::start().await;
    mount_token(&server, "t").await;
    Mock::given(method("POST"))
        .and(detect_intent_path())
        .respond_with(ResponseTemplate::new(200).set_body_json(change_led_body("red")))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(detect_intent_path())
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"queryResult": {}})))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(detect_intent_path())
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let mut running = spawn_controller(test_config(&server));
    wait_listening(&mut running.events).await;
    assert_eq!(running.platform.active_listeners(), 1);

    for _ in 0..3 {
        running.platform.stage_audio(wav_16k());
        running.platform.complete_capture();
        wait_listening(&mut running.events).await;
        assert_eq!(running.platform.active_listeners(), 1);
    }

    running.platform.fail_next_fetch("recording missing");
    running.platform.complete_capture();
    wait_listening(&mut running.events).await;
    assert_eq!(running.platform.active_listeners(), 1);

    assert_eq!(running.platform.arm_count(), 5);
    running.stop().await.unwrap();
}

#[tokio::test]
async fn every_cycle_uses_a_fresh_session() {
    let server = MockServer::start().await;
    mount_token(&server, "t").await;
    Mock::given(method("POST"))
        .and(detect_intent_path())
        .respond_with(ResponseTemplate::new(200).set_body_json(change_led_body("blue")))
        .expect(3)
        .mount(&server)
        .await;

    let mut running = spawn_controller(test_config(&server));
    wait_listening(&mut running.events).await;

    let mut sessions = HashSet::new();
    for _ in 0..3 {
        running.platform.stage_audio(wav_16k());
        running.platform.complete_capture();
        let events = wait_listening(&mut running.events).await;
        for event in events {
            if let InteractionEvent::IntentRecognized { session_id, .. } = event {
                sessions.insert(session_id);
            }
        }
    }
    assert_eq!(sessions.len(), 3);

    let requests = server.received_requests().await.unwrap();
    let paths: HashSet<_> = requests
        .iter()
        .filter(|r| r.url.path().contains(":detectIntent"))
        .map(|r| r.url.path().to_owned())
        .collect();
    assert_eq!(paths.len(), 3);
    running.stop().await.unwrap();
}

#[tokio::test]
async fn shutdown_while_listening_releases_the_listener() {
    let server = MockServer::start().await;
    mount_token(&server, "t").await;

    let mut running = spawn_controller(test_config(&server));
    wait_listening(&mut running.events).await;
    assert_eq!(running.platform.active_listeners(), 1);

    let platform = running.platform.clone();
    running.stop().await.unwrap();
    assert_eq!(platform.active_listeners(), 0);
}

#[tokio::test]
async fn headerless_capture_is_sent_as_is() {
    let server = MockServer::start().await;
    mount_token(&server, "t").await;
    Mock::given(method("POST"))
        .and(detect_intent_path())
        .and(body_partial_json(json!({"inputAudio": "AAECAw=="})))
        .respond_with(ResponseTemplate::new(200).set_body_json(change_led_body("red")))
        .expect(1)
        .mount(&server)
        .await;

    let mut running = spawn_controller(test_config(&server));
    wait_listening(&mut running.events).await;
    running.platform.stage_audio(vec![0u8, 1, 2, 3]);
    running.platform.complete_capture();
    collect_until(&mut running.events, |e| {
        matches!(e, InteractionEvent::Dispatched(_))
    })
    .await;
    running.stop().await.unwrap();
}
