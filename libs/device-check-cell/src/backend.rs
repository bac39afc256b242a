// libs/device-check-cell/src/backend.rs
use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::models::{DeviceError, MediaConstraints};

/// Handle to an acquired camera/microphone stream.
///
/// `release` stops capture and gives the devices back. Implementations must
/// also stop capture when the handle is dropped, so a cancelled check can
/// never leak a live device claim.
pub trait MediaStreamHandle: Send + Sync {
    fn has_video_track(&self) -> bool;

    fn has_audio_track(&self) -> bool;

    /// Microphone level samples, normalized to `[0.0, 1.0]`.
    fn audio_levels(&mut self) -> BoxStream<'_, f32>;

    fn release(&mut self);
}

/// Media acquisition boundary, implemented by the embedding host.
#[async_trait]
pub trait MediaBackend: Send + Sync {
    async fn acquire(
        &self,
        constraints: MediaConstraints,
    ) -> Result<Box<dyn MediaStreamHandle>, DeviceError>;
}
