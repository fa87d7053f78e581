//! Shared helpers for integration tests.

use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use voicecmd::platform::RecordingPlatform;
use voicecmd::{CommandConfig, InteractionController, InteractionEvent};
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub(crate) const PROJECT_ID: &str = "led-agent";

/// Config pointing both HTTP collaborators at `server`, with short pauses.
pub(crate) fn test_config(server: &MockServer) -> CommandConfig {
    let mut config = CommandConfig::default();
    config.credentials.token_url = format!("{}/token", server.uri());
    config.nlu.base_url = server.uri();
    config.nlu.project_id = PROJECT_ID.into();
    config.interaction.success_pause_ms = 20;
    config.interaction.fallback_pause_ms = 20;
    config
}

/// Base URL of a local port with nothing listening on it.
pub(crate) fn closed_port_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    format!("http://{addr}")
}

/// Matcher for the detect-intent path of any session.
pub(crate) fn detect_intent_path() -> impl wiremock::Match {
    path_regex(r"^/v2/projects/led-agent/agent/sessions/[0-9a-f]{32}:detectIntent$")
}

/// Mount a token endpoint that issues `token`.
pub(crate) async fn mount_token(server: &MockServer, token: &str) {
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "accessToken": token })))
        .mount(server)
        .await;
}

/// A detect-intent body for `ChangeLED` with the given colour.
pub(crate) fn change_led_body(color: &str) -> serde_json::Value {
    json!({
        "queryResult": {
            "intent": { "displayName": "ChangeLED" },
            "parameters": { "color": color },
            "queryText": format!("turn {color}")
        }
    })
}

/// 100ms of 16kHz mono 16-bit PCM in a WAV container.
pub(crate) fn wav_16k() -> Vec<u8> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 16_000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).expect("wav writer");
        for i in 0..1_600i32 {
            writer
                .write_sample(((i % 64) * 256 - 8_192) as i16)
                .expect("write sample");
        }
        writer.finalize().expect("finalize wav");
    }
    cursor.into_inner()
}

/// A controller running on a background task.
pub(crate) struct Running {
    pub platform: Arc<RecordingPlatform>,
    pub events: broadcast::Receiver<InteractionEvent>,
    pub cancel: CancellationToken,
    pub handle: JoinHandle<voicecmd::Result<()>>,
}

impl Running {
    /// Stop the controller and return its result.
    pub(crate) async fn stop(self) -> voicecmd::Result<()> {
        self.cancel.cancel();
        tokio::time::timeout(Duration::from_secs(5), self.handle)
            .await
            .expect("controller did not stop")
            .expect("controller task panicked")
    }
}

/// Spawn a controller over a fresh recording platform.
pub(crate) fn spawn_controller(config: CommandConfig) -> Running {
    spawn_controller_on(config, Arc::new(RecordingPlatform::new()))
}

/// Spawn a controller over a prepared platform.
pub(crate) fn spawn_controller_on(config: CommandConfig, platform: Arc<RecordingPlatform>) -> Running {
    let (tx, events) = broadcast::channel(256);
    let controller =
        InteractionController::new(config, platform.clone()).with_runtime_events(tx);
    let cancel = controller.cancel_token();
    let handle = tokio::spawn(controller.run());
    Running {
        platform,
        events,
        cancel,
        handle,
    }
}

/// Receive events until one matches `pred`. Returns every event seen,
/// the matching one last.
pub(crate) async fn collect_until(
    rx: &mut broadcast::Receiver<InteractionEvent>,
    mut pred: impl FnMut(&InteractionEvent) -> bool,
) -> Vec<InteractionEvent> {
    let mut seen = Vec::new();
    tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    let done = pred(&event);
                    seen.push(event);
                    if done {
                        return;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(e) => panic!("event channel closed: {e}"),
            }
        }
    })
    .await
    .expect("timed out waiting for interaction event");
    seen
}

/// Wait for the next `ListeningArmed`.
pub(crate) async fn wait_listening(rx: &mut broadcast::Receiver<InteractionEvent>) -> Vec<InteractionEvent> {
    collect_until(rx, |e| matches!(e, InteractionEvent::ListeningArmed)).await
}
