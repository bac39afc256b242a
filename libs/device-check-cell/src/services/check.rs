// libs/device-check-cell/src/services/check.rs
use std::sync::Arc;

use futures::StreamExt;
use tokio::sync::watch;
use tokio::time::timeout;
use tracing::{debug, info, instrument, warn};

use crate::backend::{MediaBackend, MediaStreamHandle};
use crate::models::{CapabilityStatus, DeviceCheckReport, DeviceCheckSettings, MediaConstraints};

/// Runs the pre-call readiness check and owns the acquired stream between
/// runs. Intermediate per-capability statuses are published on a watch
/// channel; the finished report is the return value of [`run_check`].
///
/// [`run_check`]: DeviceCheckService::run_check
pub struct DeviceCheckService {
    backend: Arc<dyn MediaBackend>,
    settings: DeviceCheckSettings,
    report_tx: watch::Sender<DeviceCheckReport>,
    stream: Option<Box<dyn MediaStreamHandle>>,
}

impl DeviceCheckService {
    pub fn new(backend: Arc<dyn MediaBackend>) -> Self {
        Self::with_settings(backend, DeviceCheckSettings::default())
    }

    pub fn with_settings(backend: Arc<dyn MediaBackend>, settings: DeviceCheckSettings) -> Self {
        let (report_tx, _) = watch::channel(DeviceCheckReport::untested());
        Self {
            backend,
            settings,
            report_tx,
            stream: None,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<DeviceCheckReport> {
        self.report_tx.subscribe()
    }

    pub fn report(&self) -> DeviceCheckReport {
        *self.report_tx.borrow()
    }

    pub fn holds_stream(&self) -> bool {
        self.stream.is_some()
    }

    /// Runs the check once: a single combined audio+video acquisition, then
    /// per-capability verdicts. Completion is reported exactly once per run
    /// via the returned report; this method never retries on its own.
    #[instrument(skip(self))]
    pub async fn run_check(&mut self) -> DeviceCheckReport {
        // A previous run's stream is handed back before reacquiring.
        self.reset();
        self.update(|r| {
            r.camera = CapabilityStatus::Testing;
            r.microphone = CapabilityStatus::Testing;
            r.audio_level = CapabilityStatus::Testing;
        });

        info!("Starting device readiness check");

        let mut stream = match self.backend.acquire(MediaConstraints::audio_video()).await {
            Ok(stream) => stream,
            Err(e) => {
                warn!("Media access failed: {}", e);
                // One combined request, so every capability fails with it.
                self.update(|r| {
                    r.camera = CapabilityStatus::Error;
                    r.microphone = CapabilityStatus::Error;
                    r.audio_level = CapabilityStatus::Error;
                });
                return self.report();
            }
        };

        let camera_ok = stream.has_video_track();
        if !camera_ok {
            debug!("Acquired stream has no video track");
        }
        self.update(|r| {
            r.camera = if camera_ok {
                CapabilityStatus::Success
            } else {
                CapabilityStatus::Error
            }
        });

        let microphone_ok = stream.has_audio_track();
        self.update(|r| {
            r.microphone = if microphone_ok {
                CapabilityStatus::Success
            } else {
                CapabilityStatus::Error
            }
        });

        let heard_signal = if microphone_ok {
            self.wait_for_signal(&mut *stream).await
        } else {
            false
        };
        self.update(|r| {
            r.audio_level = if heard_signal {
                CapabilityStatus::Success
            } else {
                CapabilityStatus::Error
            }
        });

        // Kept for the host's self-view preview until reset() or drop.
        self.stream = Some(stream);

        let report = self.report();
        info!(all_ok = report.all_ok(), "Device readiness check finished");
        report
    }

    /// Releases the held stream and returns every capability to `NotTested`.
    pub fn reset(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            debug!("Releasing media stream");
            stream.release();
        }
        self.report_tx.send_replace(DeviceCheckReport::untested());
    }

    async fn wait_for_signal(&self, stream: &mut dyn MediaStreamHandle) -> bool {
        let window = self.settings.signal_window;
        let min_level = self.settings.min_level;
        let started = tokio::time::Instant::now();

        let mut levels = stream.audio_levels();
        let outcome = timeout(window, async {
            while let Some(level) = levels.next().await {
                if level >= min_level {
                    return true;
                }
            }
            false
        })
        .await;

        match outcome {
            Ok(true) => {
                debug!(
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Microphone signal detected"
                );
                true
            }
            Ok(false) => {
                debug!("Audio level stream ended without a signal");
                false
            }
            Err(_) => {
                debug!("No microphone signal within {:?}", window);
                false
            }
        }
    }

    fn update(&self, apply: impl FnOnce(&mut DeviceCheckReport)) {
        let mut report = *self.report_tx.borrow();
        apply(&mut report);
        self.report_tx.send_replace(report);
    }
}

impl Drop for DeviceCheckService {
    fn drop(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.release();
        }
    }
}
