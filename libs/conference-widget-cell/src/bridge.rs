// libs/conference-widget-cell/src/bridge.rs
use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::models::{ProviderEvent, WidgetLaunch};

/// Commands the adapter sends down to the host bridge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeCommand {
    /// Invoke a provider command by its wire name (`toggleAudio`, ...).
    Execute(String),
    /// Remove the widget from the host and end provider-side resources.
    Detach,
}

/// Live provider attachment: raw events out, commands in.
pub struct BridgeSession {
    pub events: mpsc::Receiver<ProviderEvent>,
    pub commands: mpsc::Sender<BridgeCommand>,
}

/// Host-side attachment of the embedded conferencing widget.
///
/// The embedding shell implements this trait: it injects the provider
/// script, constructs the widget with the launch configuration, relays
/// provider callbacks as [`ProviderEvent`]s, and applies [`BridgeCommand`]s.
/// Dropping either channel end must detach the provider, so an aborted
/// session can never keep a call alive.
#[async_trait]
pub trait ConferencingBridge: Send + Sync {
    async fn attach(&self, launch: WidgetLaunch) -> anyhow::Result<BridgeSession>;
}
