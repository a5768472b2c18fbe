//! Offline sessions driven by a recording of detector output.
//!
//! A recording is JSON lines, one frame per line:
//! `{"offset_ms": 1500, "faces": [{"box": [x, y, w, h], "emotions": {...}}]}`.

use std::collections::VecDeque;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Emotion, FaceDetection};

use super::{CapturedFrame, EmotionDetector, FrameSource, Preview, PreviewControl};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecordedFrame {
    /// Milliseconds since the start of the recording.
    pub offset_ms: u64,
    #[serde(default)]
    pub faces: Vec<FaceDetection>,
}

pub struct ReplaySource {
    base: DateTime<Utc>,
    frames: VecDeque<RecordedFrame>,
    cursor: DateTime<Utc>,
}

impl ReplaySource {
    /// Loads a whole recording up front so a bad line fails before the session starts.
    pub fn open(path: &Path, base: DateTime<Utc>) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read recording {}", path.display()))?;
        let frames = parse_recording(&contents, base)
            .with_context(|| format!("Invalid recording {}", path.display()))?;
        Ok(Self::from_frames(base, frames))
    }

    pub fn from_frames(base: DateTime<Utc>, frames: Vec<RecordedFrame>) -> Self {
        Self {
            base,
            frames: frames.into(),
            cursor: base,
        }
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

fn parse_recording(contents: &str, base: DateTime<Utc>) -> Result<Vec<RecordedFrame>> {
    contents
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            let frame: RecordedFrame =
                serde_json::from_str(line).with_context(|| format!("line {}", index + 1))?;
            frame_time(base, frame.offset_ms).with_context(|| format!("line {}", index + 1))?;
            Ok(frame)
        })
        .collect()
}

fn frame_time(base: DateTime<Utc>, offset_ms: u64) -> Result<DateTime<Utc>> {
    i64::try_from(offset_ms)
        .ok()
        .and_then(Duration::try_milliseconds)
        .and_then(|offset| base.checked_add_signed(offset))
        .with_context(|| format!("offset_ms {offset_ms} is out of range"))
}

impl FrameSource for ReplaySource {
    type Frame = RecordedFrame;

    fn read_frame(&mut self) -> Result<Option<CapturedFrame<RecordedFrame>>> {
        let Some(frame) = self.frames.pop_front() else {
            return Ok(None);
        };
        self.cursor = frame_time(self.base, frame.offset_ms)?;
        Ok(Some(CapturedFrame {
            captured_at: self.cursor,
            frame,
        }))
    }

    /// Time of the most recently replayed frame.
    fn now(&self) -> DateTime<Utc> {
        self.cursor
    }
}

/// Hands back the detections stored in the recording.
#[derive(Debug, Default)]
pub struct RecordedDetector;

impl EmotionDetector<RecordedFrame> for RecordedDetector {
    fn detect_emotions(&mut self, frame: &RecordedFrame) -> Result<Vec<FaceDetection>> {
        Ok(frame.faces.clone())
    }
}

/// Preview for runs without a window. Never asks to quit.
#[derive(Debug, Default)]
pub struct HeadlessPreview {
    last: Option<Emotion>,
}

impl<F> Preview<F> for HeadlessPreview {
    fn present(
        &mut self,
        _frame: &mut F,
        detections: &[FaceDetection],
        label: Emotion,
    ) -> Result<PreviewControl> {
        if self.last != Some(label) {
            log::debug!(
                "showing {} ({}) for {} face(s)",
                label,
                label.bucket().title(),
                detections.len()
            );
            self.last = Some(label);
        }
        Ok(PreviewControl::Continue)
    }
}
