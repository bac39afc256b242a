// libs/consultation-session-cell/src/services/coordinator.rs

use std::sync::Arc;
use std::time::Duration;

use conference_widget_cell::{
    ConferencingBridge, WidgetAdapter, WidgetCommand, WidgetEvent, WidgetHandle,
};
use device_check_cell::{DeviceCheckReport, DeviceCheckService, MediaBackend};
use room_provisioning_cell::{Room, RoomProvisioner};
use shared_config::AppConfig;
use shared_models::{ConsultationId, Identity};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tracing::{debug, error, info, instrument, warn};

use crate::models::{
    EndReason, OutcomeDraft, SessionError, SessionOutcome, SessionSnapshot, SessionWarning, Stage,
};
use crate::services::outcome::OutcomeGateway;

const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Everything the host must supply to start a session.
#[derive(Debug, Clone)]
pub struct SessionParams {
    pub consultation_id: ConsultationId,
    pub identity: Identity,
    pub access_token: Option<String>,
}

enum SessionCommand {
    Join,
    Leave,
    ConfirmOutcome(OutcomeDraft),
    RetryFromFailed,
    RerunDeviceCheck,
    ToggleAudio,
    ToggleVideo,
    ToggleScreenShare,
    Unmount,
}

enum Flow {
    Continue,
    Stop,
}

/// Handle to a running session. The spawned task owns all state; the handle
/// observes it through watch channels and steers it with commands. Commands
/// sent after the session ended are dropped silently.
///
/// Dropping the handle aborts the task; the device stream and the widget are
/// released through their own drop guards, so nothing keeps running in the
/// background.
pub struct SessionCoordinator {
    commands: mpsc::Sender<SessionCommand>,
    snapshot_rx: watch::Receiver<SessionSnapshot>,
    device_rx: watch::Receiver<DeviceCheckReport>,
    task: Option<JoinHandle<()>>,
}

impl SessionCoordinator {
    /// Spawns the session task and immediately starts room provisioning and
    /// the device check.
    pub fn mount(
        config: &AppConfig,
        params: SessionParams,
        media: Arc<dyn MediaBackend>,
        bridge: Arc<dyn ConferencingBridge>,
    ) -> Self {
        let provisioner = RoomProvisioner::new(config);
        let gateway = OutcomeGateway::new(config);
        let adapter = WidgetAdapter::new(config, bridge);
        let devices = DeviceCheckService::new(media);
        Self::with_services(params, provisioner, gateway, adapter, devices)
    }

    pub fn with_services(
        params: SessionParams,
        provisioner: RoomProvisioner,
        gateway: OutcomeGateway,
        adapter: WidgetAdapter,
        devices: DeviceCheckService,
    ) -> Self {
        let (command_tx, command_rx) = mpsc::channel(32);
        let initial = SessionSnapshot::new(params.consultation_id.clone());
        let (snapshot_tx, snapshot_rx) = watch::channel(initial.clone());
        let device_rx = devices.subscribe();

        let task = SessionTask {
            params,
            provisioner,
            gateway,
            adapter,
            devices,
            snapshot_tx,
            state: initial,
            room: None,
            widget: None,
            widget_events: None,
            ticker: None,
            peak_participants: 0,
        };

        Self {
            commands: command_tx,
            snapshot_rx,
            device_rx,
            task: Some(tokio::spawn(task.run(command_rx))),
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot_rx.borrow().clone()
    }

    /// Live session state. The last snapshot stays readable after the task
    /// stopped.
    pub fn watch(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot_rx.clone()
    }

    /// Live per-capability statuses while a device check runs.
    pub fn device_watch(&self) -> watch::Receiver<DeviceCheckReport> {
        self.device_rx.clone()
    }

    pub async fn join(&self) {
        self.send(SessionCommand::Join).await;
    }

    pub async fn leave(&self) {
        self.send(SessionCommand::Leave).await;
    }

    pub async fn confirm_outcome(&self, draft: OutcomeDraft) {
        self.send(SessionCommand::ConfirmOutcome(draft)).await;
    }

    pub async fn retry_from_failed(&self) {
        self.send(SessionCommand::RetryFromFailed).await;
    }

    pub async fn rerun_device_check(&self) {
        self.send(SessionCommand::RerunDeviceCheck).await;
    }

    pub async fn toggle_audio(&self) {
        self.send(SessionCommand::ToggleAudio).await;
    }

    pub async fn toggle_video(&self) {
        self.send(SessionCommand::ToggleVideo).await;
    }

    pub async fn toggle_screen_share(&self) {
        self.send(SessionCommand::ToggleScreenShare).await;
    }

    /// Graceful teardown: the task disposes the widget and releases the
    /// device stream before stopping.
    pub async fn unmount(mut self) {
        let _ = self.commands.send(SessionCommand::Unmount).await;
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }

    async fn send(&self, command: SessionCommand) {
        if self.commands.send(command).await.is_err() {
            debug!("Session task is no longer running; command dropped");
        }
    }
}

impl Drop for SessionCoordinator {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// The spawned event loop. The only place a `Stage` transition happens.
struct SessionTask {
    params: SessionParams,
    provisioner: RoomProvisioner,
    gateway: OutcomeGateway,
    adapter: WidgetAdapter,
    devices: DeviceCheckService,
    snapshot_tx: watch::Sender<SessionSnapshot>,
    state: SessionSnapshot,
    room: Option<Room>,
    widget: Option<WidgetHandle>,
    widget_events: Option<mpsc::Receiver<WidgetEvent>>,
    ticker: Option<Interval>,
    peak_participants: u32,
}

impl SessionTask {
    #[instrument(skip_all, fields(consulta = %self.params.consultation_id))]
    async fn run(mut self, mut commands: mpsc::Receiver<SessionCommand>) {
        self.provision_and_prepare().await;

        loop {
            tokio::select! {
                biased;

                command = commands.recv() => match command {
                    Some(command) => {
                        if let Flow::Stop = self.handle_command(command).await {
                            break;
                        }
                    }
                    None => break,
                },

                event = next_widget_event(&mut self.widget_events) => match event {
                    Some(event) => self.on_widget_event(event).await,
                    None => self.widget_events = None,
                },

                _ = next_tick(&mut self.ticker) => self.on_tick(),
            }
        }

        self.teardown().await;
    }

    async fn handle_command(&mut self, command: SessionCommand) -> Flow {
        match command {
            SessionCommand::Unmount => return Flow::Stop,
            SessionCommand::Join => self.on_join().await,
            SessionCommand::Leave => self.begin_ending(EndReason::UserLeft).await,
            SessionCommand::ConfirmOutcome(draft) => self.on_confirm(draft).await,
            SessionCommand::RetryFromFailed => self.on_retry().await,
            SessionCommand::RerunDeviceCheck => self.on_rerun_devices().await,
            SessionCommand::ToggleAudio => self.on_toggle(WidgetCommand::ToggleAudio).await,
            SessionCommand::ToggleVideo => self.on_toggle(WidgetCommand::ToggleVideo).await,
            SessionCommand::ToggleScreenShare => {
                self.on_toggle(WidgetCommand::ToggleScreenShare).await
            }
        }

        if self.state.stage.is_terminal() {
            Flow::Stop
        } else {
            Flow::Continue
        }
    }

    /// Room acquisition (skipped when one is already held) followed by the
    /// device check. Entered at mount and again on every retry from
    /// `Failed`.
    async fn provision_and_prepare(&mut self) {
        self.state.warning = None;

        if self.room.is_none() {
            self.set_stage(Stage::AwaitingRoom);
            let acquired = self
                .provisioner
                .acquire_room(
                    &self.params.consultation_id,
                    &self.params.identity,
                    self.params.access_token.as_deref(),
                )
                .await;
            match acquired {
                Ok(room) => self.room = Some(room),
                Err(err) => {
                    self.fail(err.into());
                    return;
                }
            }
        }

        self.set_stage(Stage::DeviceCheck);
        self.state.device_report = self.devices.run_check().await;
        self.set_stage(Stage::ReadyToJoin);
    }

    async fn on_join(&mut self) {
        if !matches!(self.state.stage, Stage::ReadyToJoin) {
            debug!(stage = self.state.stage.name(), "Join ignored outside ReadyToJoin");
            return;
        }
        if !self.state.device_report.all_ok() {
            warn!("Join refused: device checks did not all pass");
            self.state.warning = Some(SessionWarning::DevicesNotReady);
            self.publish();
            return;
        }
        let Some(room) = self.room.clone() else {
            warn!("Join refused: no room held");
            self.state.warning = Some(SessionWarning::RoomMissing);
            self.publish();
            return;
        };

        // The widget must be the stream's only owner; hand the preview back
        // before mounting.
        self.devices.reset();

        let (event_tx, event_rx) = mpsc::channel(32);
        match self.adapter.mount(&room, event_tx).await {
            Ok(widget) => {
                info!(room = %room.name, "Joined consultation call");
                self.widget = Some(widget);
                self.widget_events = Some(event_rx);
                self.peak_participants = 0;
                self.state.participant_count = 0;
                self.state.audio_muted = room.config.config_overwrite.start_with_audio_muted;
                self.state.video_muted = room.config.config_overwrite.start_with_video_muted;
                self.state.warning = None;
                self.set_stage(Stage::Connected { elapsed_seconds: 0 });
                self.arm_ticker();
            }
            Err(err) => {
                self.fail(SessionError::WidgetLoad(err.to_string()));
            }
        }
    }

    /// Freezes the call duration and moves into `Ending`. The widget stays
    /// mounted until the outcome dialog is resolved, but the conference is
    /// left right away.
    async fn begin_ending(&mut self, reason: EndReason) {
        let frozen_seconds = match self.state.stage {
            Stage::Connected { elapsed_seconds } => elapsed_seconds,
            _ => {
                debug!(stage = self.state.stage.name(), "End request ignored outside Connected");
                return;
            }
        };

        self.ticker = None;
        if let Some(widget) = &self.widget {
            if let Err(err) = widget.execute(WidgetCommand::Hangup).await {
                debug!(%err, "Hangup command not delivered");
            }
        }

        info!(frozen_seconds, ?reason, "Call ended; awaiting outcome confirmation");
        self.set_stage(Stage::Ending {
            frozen_seconds,
            reason,
        });
    }

    /// One outcome build, one submission. A rejected or failed submission
    /// still terminates the session locally.
    async fn on_confirm(&mut self, draft: OutcomeDraft) {
        let frozen_seconds = match self.state.stage {
            Stage::Ending { frozen_seconds, .. } => frozen_seconds,
            _ => {
                debug!(
                    stage = self.state.stage.name(),
                    "Outcome confirmation ignored outside Ending"
                );
                return;
            }
        };

        let outcome = SessionOutcome::from_draft(
            &self.params.consultation_id,
            self.params.identity.role,
            frozen_seconds,
            &draft,
        );

        let outcome_recorded = match self
            .gateway
            .submit(&outcome, self.params.access_token.as_deref())
            .await
        {
            Ok(_) => true,
            Err(err) => {
                warn!(%err, "Outcome not recorded; terminating locally anyway");
                self.state.warning = Some(SessionWarning::OutcomeNotRecorded(err.to_string()));
                false
            }
        };

        self.dispose_widget().await;
        self.set_stage(Stage::Terminated {
            duration_seconds: frozen_seconds,
            outcome_recorded,
        });
    }

    async fn on_retry(&mut self) {
        if !matches!(self.state.stage, Stage::Failed { .. }) {
            debug!(stage = self.state.stage.name(), "Retry ignored outside Failed");
            return;
        }
        info!("Retrying session preparation");
        self.provision_and_prepare().await;
    }

    async fn on_rerun_devices(&mut self) {
        if !matches!(self.state.stage, Stage::ReadyToJoin) {
            debug!(
                stage = self.state.stage.name(),
                "Device re-check ignored outside ReadyToJoin"
            );
            return;
        }
        self.state.warning = None;
        self.set_stage(Stage::DeviceCheck);
        self.state.device_report = self.devices.run_check().await;
        self.set_stage(Stage::ReadyToJoin);
    }

    async fn on_toggle(&mut self, command: WidgetCommand) {
        if !matches!(self.state.stage, Stage::Connected { .. }) {
            debug!(?command, stage = self.state.stage.name(), "Toggle ignored outside Connected");
            return;
        }
        if let Some(widget) = &self.widget {
            if let Err(err) = widget.execute(command).await {
                warn!(%err, "Widget command failed");
            }
        }
    }

    async fn on_widget_event(&mut self, event: WidgetEvent) {
        match event {
            WidgetEvent::Joined => {
                debug!("Provider confirmed the local join");
            }
            WidgetEvent::ParticipantCountChanged(count) => {
                self.state.participant_count = count;
                self.peak_participants = self.peak_participants.max(count);
                let remote_gone = self.peak_participants >= 2 && count < 2;
                if remote_gone && matches!(self.state.stage, Stage::Connected { .. }) {
                    info!("Remote participant left");
                    self.begin_ending(EndReason::RemoteLeft).await;
                } else {
                    self.publish();
                }
            }
            WidgetEvent::AudioMuteChanged(muted) => {
                self.state.audio_muted = muted;
                self.publish();
            }
            WidgetEvent::VideoMuteChanged(muted) => {
                self.state.video_muted = muted;
                self.publish();
            }
            WidgetEvent::Left => {
                self.begin_ending(EndReason::UserLeft).await;
            }
            WidgetEvent::LoadError(reason) => {
                self.ticker = None;
                self.dispose_widget().await;
                self.fail(SessionError::WidgetJoin(reason));
            }
        }
    }

    fn on_tick(&mut self) {
        if let Stage::Connected { elapsed_seconds } = self.state.stage {
            self.state.stage = Stage::Connected {
                elapsed_seconds: elapsed_seconds + 1,
            };
            self.publish();
        }
    }

    fn arm_ticker(&mut self) {
        let mut ticker = interval_at(Instant::now() + TICK_PERIOD, TICK_PERIOD);
        // A stalled host must not inflate the duration with burst ticks.
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        self.ticker = Some(ticker);
    }

    async fn dispose_widget(&mut self) {
        if let Some(mut widget) = self.widget.take() {
            widget.dispose().await;
        }
        self.widget_events = None;
    }

    async fn teardown(&mut self) {
        self.ticker = None;
        self.dispose_widget().await;
        self.devices.reset();
        debug!("Session task stopped");
    }

    fn fail(&mut self, error: SessionError) {
        error!(%error, "Session entered the failure stage");
        self.set_stage(Stage::Failed { error });
    }

    fn set_stage(&mut self, stage: Stage) {
        debug!(from = self.state.stage.name(), to = stage.name(), "Stage transition");
        self.state.stage = stage;
        self.publish();
    }

    fn publish(&self) {
        self.snapshot_tx.send_replace(self.state.clone());
    }
}

async fn next_widget_event(events: &mut Option<mpsc::Receiver<WidgetEvent>>) -> Option<WidgetEvent> {
    match events {
        Some(receiver) => receiver.recv().await,
        None => std::future::pending().await,
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}
