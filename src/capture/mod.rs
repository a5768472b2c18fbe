//! Frame acquisition, classification and preview seams around the tracker.

pub mod loop_worker;
#[cfg(feature = "camera")]
pub mod opencv;
pub mod replay;

use anyhow::Result;
use chrono::{DateTime, Utc};

use crate::models::{Emotion, FaceDetection};

pub use loop_worker::{run_session, SessionOutcome, StopReason};
pub use replay::{HeadlessPreview, RecordedDetector, RecordedFrame, ReplaySource};

/// A frame plus the wall-clock time it was grabbed at.
#[derive(Debug, Clone)]
pub struct CapturedFrame<F> {
    pub captured_at: DateTime<Utc>,
    pub frame: F,
}

pub trait FrameSource {
    type Frame;

    /// Next frame, or `Ok(None)` once the stream is over (device stopped
    /// delivering, end of a recording).
    fn read_frame(&mut self) -> Result<Option<CapturedFrame<Self::Frame>>>;

    /// Current time on this source's clock.
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    /// Releases the underlying device. Called once when the loop exits.
    fn release(&mut self) -> Result<()> {
        Ok(())
    }
}

pub trait EmotionDetector<F> {
    fn detect_emotions(&mut self, frame: &F) -> Result<Vec<FaceDetection>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewControl {
    Continue,
    Quit,
}

/// Shows annotated frames and reports whether the user asked to stop.
pub trait Preview<F> {
    fn present(
        &mut self,
        frame: &mut F,
        detections: &[FaceDetection],
        label: Emotion,
    ) -> Result<PreviewControl>;

    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}
