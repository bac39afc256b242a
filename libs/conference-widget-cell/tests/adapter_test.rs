// libs/conference-widget-cell/tests/adapter_test.rs
//
// Adapter tests with a scripted host bridge and a mocked script endpoint.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use assert_matches::assert_matches;
use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use tokio::sync::mpsc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use conference_widget_cell::{
    BridgeCommand, BridgeSession, ConferencingBridge, ProviderEvent, ScriptLoader, WidgetAdapter,
    WidgetCommand, WidgetError, WidgetEvent, WidgetLaunch,
};
use room_provisioning_cell::{
    derive_room_name, ConfigOverwrite, InterfaceConfigOverwrite, Room, RoomConfig, UserInfo,
};
use shared_models::ConsultationId;

struct FakeBridge {
    attaches: AtomicUsize,
    raw_tx: Mutex<Option<mpsc::Sender<ProviderEvent>>>,
    commands: Arc<Mutex<Vec<BridgeCommand>>>,
    detached: Arc<AtomicBool>,
}

impl FakeBridge {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            attaches: AtomicUsize::new(0),
            raw_tx: Mutex::new(None),
            commands: Arc::new(Mutex::new(Vec::new())),
            detached: Arc::new(AtomicBool::new(false)),
        })
    }

    fn attach_count(&self) -> usize {
        self.attaches.load(Ordering::SeqCst)
    }

    fn raw_sender(&self) -> mpsc::Sender<ProviderEvent> {
        self.raw_tx
            .lock()
            .unwrap()
            .clone()
            .expect("widget not attached")
    }

    fn recorded_commands(&self) -> Vec<BridgeCommand> {
        self.commands.lock().unwrap().clone()
    }

    fn is_detached(&self) -> bool {
        self.detached.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConferencingBridge for FakeBridge {
    async fn attach(&self, launch: WidgetLaunch) -> anyhow::Result<BridgeSession> {
        assert!(launch.script_url.ends_with("/external_api.js"));
        self.attaches.fetch_add(1, Ordering::SeqCst);

        let (raw_tx, raw_rx) = mpsc::channel(16);
        let (cmd_tx, mut cmd_rx) = mpsc::channel(16);
        *self.raw_tx.lock().unwrap() = Some(raw_tx);

        let commands = self.commands.clone();
        let detached = self.detached.clone();
        tokio::spawn(async move {
            while let Some(cmd) = cmd_rx.recv().await {
                let is_detach = cmd == BridgeCommand::Detach;
                commands.lock().unwrap().push(cmd);
                if is_detach {
                    break;
                }
            }
            // Detach command or a closed channel both end the provider.
            detached.store(true, Ordering::SeqCst);
        });

        Ok(BridgeSession {
            events: raw_rx,
            commands: cmd_tx,
        })
    }
}

fn test_room() -> Room {
    let consultation = ConsultationId::new("abc-1").unwrap();
    let name = derive_room_name(&consultation);
    Room {
        consultation_id: consultation,
        name: name.clone(),
        url: format!("https://meet.jit.si/{}", name),
        config: RoomConfig {
            room_name: name,
            subject: "Consulta abc-1".to_string(),
            user_info: UserInfo {
                display_name: "Carlos Mendes".to_string(),
            },
            config_overwrite: ConfigOverwrite::default(),
            interface_config_overwrite: InterfaceConfigOverwrite::default(),
        },
        created_at: Utc::now(),
    }
}

async fn script_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/external_api.js"))
        .respond_with(ResponseTemplate::new(200).set_body_string("// external api"))
        .mount(&server)
        .await;
    server
}

async fn wait_until(mut cond: impl FnMut() -> bool) {
    for _ in 0..200 {
        if cond() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not reached in time");
}

#[tokio::test]
async fn repeated_mounts_share_one_script_fetch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/external_api.js"))
        .respond_with(ResponseTemplate::new(200).set_body_string("// external api"))
        .expect(1)
        .mount(&server)
        .await;

    let loader = Arc::new(ScriptLoader::new(&server.uri()));
    let bridge = FakeBridge::new();
    let adapter = WidgetAdapter::with_loader(loader.clone(), bridge.clone());

    let (tx, _rx) = mpsc::channel(16);
    let mut first = adapter.mount(&test_room(), tx).await.unwrap();
    first.dispose().await;

    let (tx, _rx) = mpsc::channel(16);
    let mut second = adapter.mount(&test_room(), tx).await.unwrap();
    second.dispose().await;

    assert!(loader.is_loaded());
    assert_eq!(bridge.attach_count(), 2);
}

#[tokio::test]
async fn failed_script_fetch_is_retried_on_the_next_mount() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/external_api.js"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/external_api.js"))
        .respond_with(ResponseTemplate::new(200).set_body_string("// external api"))
        .expect(1)
        .mount(&server)
        .await;

    let loader = Arc::new(ScriptLoader::new(&server.uri()));
    let bridge = FakeBridge::new();
    let adapter = WidgetAdapter::with_loader(loader.clone(), bridge.clone());

    let (tx, _rx) = mpsc::channel(16);
    let result = adapter.mount(&test_room(), tx).await;
    assert_matches!(result, Err(WidgetError::ScriptLoad(_)));
    assert_eq!(bridge.attach_count(), 0);

    let (tx, _rx) = mpsc::channel(16);
    let mut handle = adapter.mount(&test_room(), tx).await.unwrap();
    assert_eq!(bridge.attach_count(), 1);
    handle.dispose().await;
}

#[tokio::test]
async fn empty_script_body_is_a_load_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/external_api.js"))
        .respond_with(ResponseTemplate::new(200).set_body_string("   "))
        .mount(&server)
        .await;

    let loader = Arc::new(ScriptLoader::new(&server.uri()));
    let adapter = WidgetAdapter::with_loader(loader, FakeBridge::new());

    let (tx, _rx) = mpsc::channel(16);
    let result = adapter.mount(&test_room(), tx).await;
    assert_matches!(result, Err(WidgetError::ScriptLoad(ref reason)) if reason.contains("empty"));
}

#[tokio::test]
async fn raw_events_are_normalized_end_to_end() {
    let server = script_server().await;
    let loader = Arc::new(ScriptLoader::new(&server.uri()));
    let bridge = FakeBridge::new();
    let adapter = WidgetAdapter::with_loader(loader, bridge.clone());

    let (tx, mut rx) = mpsc::channel(16);
    let mut handle = adapter.mount(&test_room(), tx).await.unwrap();

    let push = bridge.raw_sender();
    push.send(ProviderEvent::bare("videoConferenceJoined"))
        .await
        .unwrap();
    assert_eq!(rx.recv().await, Some(WidgetEvent::Joined));
    assert_eq!(rx.recv().await, Some(WidgetEvent::ParticipantCountChanged(1)));

    push.send(ProviderEvent::bare("participantJoined"))
        .await
        .unwrap();
    assert_eq!(rx.recv().await, Some(WidgetEvent::ParticipantCountChanged(2)));

    push.send(ProviderEvent::new("audioMuteStatusChanged", json!({"muted": true})))
        .await
        .unwrap();
    push.send(ProviderEvent::bare("someUnmappedCallback"))
        .await
        .unwrap();
    push.send(ProviderEvent::bare("videoConferenceLeft"))
        .await
        .unwrap();

    assert_eq!(rx.recv().await, Some(WidgetEvent::AudioMuteChanged(true)));
    // The unmapped callback was dropped at the boundary.
    assert_eq!(rx.recv().await, Some(WidgetEvent::Left));

    handle.dispose().await;
}

#[tokio::test]
async fn execute_uses_provider_wire_names() {
    let server = script_server().await;
    let loader = Arc::new(ScriptLoader::new(&server.uri()));
    let bridge = FakeBridge::new();
    let adapter = WidgetAdapter::with_loader(loader, bridge.clone());

    let (tx, _rx) = mpsc::channel(16);
    let mut handle = adapter.mount(&test_room(), tx).await.unwrap();

    handle.execute(WidgetCommand::ToggleAudio).await.unwrap();
    handle.execute(WidgetCommand::ToggleScreenShare).await.unwrap();
    handle.execute(WidgetCommand::Hangup).await.unwrap();

    let bridge_for_wait = bridge.clone();
    wait_until(move || bridge_for_wait.recorded_commands().len() == 3).await;
    assert_eq!(
        bridge.recorded_commands(),
        vec![
            BridgeCommand::Execute("toggleAudio".to_string()),
            BridgeCommand::Execute("toggleShareScreen".to_string()),
            BridgeCommand::Execute("hangup".to_string()),
        ]
    );

    handle.dispose().await;
}

#[tokio::test]
async fn dispose_detaches_and_stops_forwarding() {
    let server = script_server().await;
    let loader = Arc::new(ScriptLoader::new(&server.uri()));
    let bridge = FakeBridge::new();
    let adapter = WidgetAdapter::with_loader(loader, bridge.clone());

    let (tx, _rx) = mpsc::channel(16);
    let mut handle = adapter.mount(&test_room(), tx).await.unwrap();

    handle.dispose().await;

    let bridge_for_wait = bridge.clone();
    wait_until(move || bridge_for_wait.is_detached()).await;

    let result = handle.execute(WidgetCommand::ToggleAudio).await;
    assert_matches!(result, Err(WidgetError::Disposed));

    // The normalization task is gone, so the raw channel has no receiver.
    let push = bridge.raw_sender();
    wait_until(move || push.is_closed()).await;

    // Dispose twice is harmless.
    handle.dispose().await;
}

#[tokio::test]
async fn dropping_an_undisposed_handle_detaches_best_effort() {
    let server = script_server().await;
    let loader = Arc::new(ScriptLoader::new(&server.uri()));
    let bridge = FakeBridge::new();
    let adapter = WidgetAdapter::with_loader(loader, bridge.clone());

    let (tx, _rx) = mpsc::channel(16);
    let handle = adapter.mount(&test_room(), tx).await.unwrap();
    drop(handle);

    let bridge_for_wait = bridge.clone();
    wait_until(move || bridge_for_wait.is_detached()).await;
}
