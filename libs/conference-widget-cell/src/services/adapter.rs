// libs/conference-widget-cell/src/services/adapter.rs
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use room_provisioning_cell::Room;
use shared_config::AppConfig;

use crate::bridge::{BridgeCommand, BridgeSession, ConferencingBridge};
use crate::models::{WidgetCommand, WidgetError, WidgetEvent, WidgetLaunch};
use crate::services::normalize::EventNormalizer;
use crate::services::script::ScriptLoader;

/// Mounts and drives the embedded conferencing widget for acquired rooms.
pub struct WidgetAdapter {
    loader: Arc<ScriptLoader>,
    bridge: Arc<dyn ConferencingBridge>,
}

impl WidgetAdapter {
    pub fn new(config: &AppConfig, bridge: Arc<dyn ConferencingBridge>) -> Self {
        Self {
            loader: Arc::new(ScriptLoader::new(&config.jitsi_base_url)),
            bridge,
        }
    }

    pub fn with_loader(loader: Arc<ScriptLoader>, bridge: Arc<dyn ConferencingBridge>) -> Self {
        Self { loader, bridge }
    }

    /// Mounts the widget for an acquired room. Normalized events flow into
    /// `events` until the handle is disposed or the provider goes away.
    #[instrument(skip(self, room, events), fields(room = %room.name))]
    pub async fn mount(
        &self,
        room: &Room,
        events: mpsc::Sender<WidgetEvent>,
    ) -> Result<WidgetHandle, WidgetError> {
        self.loader.ensure_loaded().await?;

        let launch = WidgetLaunch::for_room(self.loader.script_url(), room);
        let session = self.bridge.attach(launch).await.map_err(WidgetError::Bridge)?;

        let BridgeSession {
            events: mut raw_events,
            commands,
        } = session;

        let mount_id = Uuid::new_v4();
        let normalizer_task = tokio::spawn(async move {
            let mut normalizer = EventNormalizer::new();
            while let Some(raw) = raw_events.recv().await {
                for event in normalizer.normalize(&raw) {
                    if events.send(event).await.is_err() {
                        debug!("Event consumer dropped, stopping normalization");
                        return;
                    }
                }
            }
            debug!("Provider event channel closed");
        });

        info!(%mount_id, "Conferencing widget mounted");

        Ok(WidgetHandle {
            mount_id,
            commands,
            normalizer_task,
            disposed: false,
        })
    }
}

/// A live widget mount.
///
/// [`dispose`] is required on every exit path: the provider keeps media and
/// network resources alive until it is detached. Dropping an undisposed
/// handle detaches best-effort and logs a warning.
///
/// [`dispose`]: WidgetHandle::dispose
#[derive(Debug)]
pub struct WidgetHandle {
    mount_id: Uuid,
    commands: mpsc::Sender<BridgeCommand>,
    normalizer_task: JoinHandle<()>,
    disposed: bool,
}

impl WidgetHandle {
    pub fn mount_id(&self) -> Uuid {
        self.mount_id
    }

    /// Invokes a provider command on the live widget.
    pub async fn execute(&self, command: WidgetCommand) -> Result<(), WidgetError> {
        if self.disposed {
            return Err(WidgetError::Disposed);
        }
        self.commands
            .send(BridgeCommand::Execute(command.provider_name().to_string()))
            .await
            .map_err(|_| WidgetError::ProviderGone)
    }

    /// Detaches the provider and stops event normalization. Idempotent.
    pub async fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;

        if self.commands.send(BridgeCommand::Detach).await.is_err() {
            debug!("Bridge already gone during dispose");
        }
        self.normalizer_task.abort();

        info!(mount_id = %self.mount_id, "Conferencing widget disposed");
    }
}

impl Drop for WidgetHandle {
    fn drop(&mut self) {
        if !self.disposed {
            warn!(mount_id = %self.mount_id, "Widget handle dropped without dispose, detaching");
            let _ = self.commands.try_send(BridgeCommand::Detach);
            self.normalizer_task.abort();
        }
    }
}
