use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::models::dominant_emotion;
use crate::tracker::{format_duration, EmotionSession, SessionReport};

use super::{EmotionDetector, FrameSource, Preview, PreviewControl};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_error, log_info};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum StopReason {
    QuitKey,
    EndOfStream,
    TimeLimit,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FrameStats {
    pub frames: u64,
    pub frames_without_face: u64,
}

#[derive(Debug, Clone)]
pub struct SessionOutcome {
    pub report: SessionReport,
    pub stop_reason: StopReason,
    pub stats: FrameStats,
}

/// Runs one monitoring session until the quit key, the end of the stream or
/// the optional time limit, then finalizes the tracker.
///
/// The source is released and the preview closed exactly once, whichever way
/// the loop exits.
pub fn run_session<S, D, P>(
    source: &mut S,
    detector: &mut D,
    preview: &mut P,
    session_id: String,
    max_session: Option<Duration>,
) -> Result<SessionOutcome>
where
    S: FrameSource,
    D: EmotionDetector<S::Frame>,
    P: Preview<S::Frame>,
{
    let mut session = EmotionSession::begin(session_id, source.now());
    log_info!(
        "session {} started at {}",
        session.id(),
        session.started_at().to_rfc3339()
    );

    let driven = drive(source, detector, preview, &mut session, max_session);

    let released = source.release();
    let closed = preview.close();

    let (stop_reason, stats, ended_at) = driven?;
    released.context("failed to release frame source")?;
    closed.context("failed to close preview")?;

    let report = session.finalize(ended_at)?;
    log_info!(
        "session {} ended ({:?}) after {} with {} frames ({} without a face), {} transitions",
        report.session_id(),
        stop_reason,
        format_duration(report.session_total()),
        stats.frames,
        stats.frames_without_face,
        report.transitions().len()
    );

    Ok(SessionOutcome {
        report,
        stop_reason,
        stats,
    })
}

fn drive<S, D, P>(
    source: &mut S,
    detector: &mut D,
    preview: &mut P,
    session: &mut EmotionSession,
    max_session: Option<Duration>,
) -> Result<(StopReason, FrameStats, DateTime<Utc>)>
where
    S: FrameSource,
    D: EmotionDetector<S::Frame>,
    P: Preview<S::Frame>,
{
    let mut stats = FrameStats::default();

    loop {
        let captured = match source.read_frame() {
            Ok(Some(captured)) => captured,
            Ok(None) => {
                log_info!("no more frames (end of stream)");
                return Ok((StopReason::EndOfStream, stats, source.now()));
            }
            Err(err) => {
                log_error!("frame read failed, ending session: {err:#}");
                return Ok((StopReason::EndOfStream, stats, source.now()));
            }
        };

        let mut frame = captured.frame;
        let now = captured.captured_at;

        let detections = detector
            .detect_emotions(&frame)
            .context("emotion detection failed")?;
        stats.frames += 1;
        if detections.is_empty() {
            stats.frames_without_face += 1;
        }

        let label = dominant_emotion(&detections);
        if session.on_label(label, now)? {
            log_debug!(
                "{} -> {} at +{}",
                session.transitions().last().map(|t| t.ended.as_str()).unwrap_or("?"),
                label,
                format_duration(session.elapsed(now))
            );
        }

        if preview.present(&mut frame, &detections, label)? == PreviewControl::Quit {
            log_info!("quit key pressed");
            return Ok((StopReason::QuitKey, stats, source.now()));
        }

        if let Some(limit) = max_session {
            if session.elapsed(now) >= limit {
                log_info!("session time limit of {} reached", format_duration(limit));
                return Ok((StopReason::TimeLimit, stats, now));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use anyhow::anyhow;
    use chrono::TimeZone;

    use super::*;
    use crate::capture::CapturedFrame;
    use crate::models::{DetectorEmotion, Emotion, FaceBox, FaceDetection};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap()
    }

    enum Step {
        Frame(Option<DetectorEmotion>),
        Broken,
    }

    struct ScriptedSource {
        steps: VecDeque<Step>,
        clock: DateTime<Utc>,
        released: u32,
    }

    impl ScriptedSource {
        fn new(steps: Vec<Step>) -> Self {
            Self {
                steps: steps.into(),
                clock: t0(),
                released: 0,
            }
        }
    }

    impl FrameSource for ScriptedSource {
        type Frame = Option<DetectorEmotion>;

        fn read_frame(&mut self) -> Result<Option<CapturedFrame<Self::Frame>>> {
            match self.steps.pop_front() {
                Some(Step::Frame(emotion)) => {
                    let captured_at = self.clock;
                    self.clock = self.clock + Duration::seconds(1);
                    Ok(Some(CapturedFrame {
                        captured_at,
                        frame: emotion,
                    }))
                }
                Some(Step::Broken) => Err(anyhow!("camera unplugged")),
                None => Ok(None),
            }
        }

        fn now(&self) -> DateTime<Utc> {
            self.clock
        }

        fn release(&mut self) -> Result<()> {
            self.released += 1;
            Ok(())
        }
    }

    struct FakeDetector {
        fail: bool,
    }

    impl EmotionDetector<Option<DetectorEmotion>> for FakeDetector {
        fn detect_emotions(&mut self, frame: &Option<DetectorEmotion>) -> Result<Vec<FaceDetection>> {
            if self.fail {
                return Err(anyhow!("model crashed"));
            }
            Ok(frame
                .iter()
                .map(|emotion| FaceDetection {
                    face_box: FaceBox::from([0, 0, 10, 10]),
                    emotions: [(*emotion, 0.9)].into_iter().collect(),
                })
                .collect())
        }
    }

    #[derive(Default)]
    struct CountingPreview {
        shown: Vec<Emotion>,
        quit_after: Option<usize>,
        closed: u32,
    }

    impl Preview<Option<DetectorEmotion>> for CountingPreview {
        fn present(
            &mut self,
            _frame: &mut Option<DetectorEmotion>,
            _detections: &[FaceDetection],
            label: Emotion,
        ) -> Result<PreviewControl> {
            self.shown.push(label);
            if Some(self.shown.len()) == self.quit_after {
                Ok(PreviewControl::Quit)
            } else {
                Ok(PreviewControl::Continue)
            }
        }

        fn close(&mut self) -> Result<()> {
            self.closed += 1;
            Ok(())
        }
    }

    fn frames(script: &[Option<DetectorEmotion>]) -> Vec<Step> {
        script.iter().map(|e| Step::Frame(*e)).collect()
    }

    #[test]
    fn end_of_stream_finalizes_and_releases() {
        let mut source = ScriptedSource::new(frames(&[
            None,
            Some(DetectorEmotion::Happy),
            Some(DetectorEmotion::Happy),
            Some(DetectorEmotion::Angry),
        ]));
        let mut preview = CountingPreview::default();

        let outcome = run_session(
            &mut source,
            &mut FakeDetector { fail: false },
            &mut preview,
            "s1".into(),
            None,
        )
        .unwrap();

        assert_eq!(outcome.stop_reason, StopReason::EndOfStream);
        assert_eq!(outcome.stats.frames, 4);
        assert_eq!(outcome.stats.frames_without_face, 1);
        assert_eq!(outcome.report.total(Emotion::Neutral), Duration::seconds(1));
        assert_eq!(outcome.report.total(Emotion::Happy), Duration::seconds(2));
        assert_eq!(outcome.report.total(Emotion::Angry), Duration::seconds(1));
        assert_eq!(outcome.report.session_total(), Duration::seconds(4));
        assert_eq!(source.released, 1);
        assert_eq!(preview.closed, 1);
    }

    #[test]
    fn quit_key_stops_the_loop() {
        let mut source = ScriptedSource::new(frames(&[Some(DetectorEmotion::Happy); 10]));
        let mut preview = CountingPreview {
            quit_after: Some(3),
            ..Default::default()
        };

        let outcome = run_session(
            &mut source,
            &mut FakeDetector { fail: false },
            &mut preview,
            "s2".into(),
            None,
        )
        .unwrap();

        assert_eq!(outcome.stop_reason, StopReason::QuitKey);
        assert_eq!(preview.shown, vec![Emotion::Happy; 3]);
        assert_eq!(outcome.report.session_total(), Duration::seconds(3));
        assert_eq!(source.released, 1);
    }

    #[test]
    fn broken_frame_is_end_of_stream() {
        let mut steps = frames(&[Some(DetectorEmotion::Disgust), Some(DetectorEmotion::Disgust)]);
        steps.push(Step::Broken);
        steps.extend(frames(&[Some(DetectorEmotion::Happy)]));
        let mut source = ScriptedSource::new(steps);

        let outcome = run_session(
            &mut source,
            &mut FakeDetector { fail: false },
            &mut CountingPreview::default(),
            "s3".into(),
            None,
        )
        .unwrap();

        assert_eq!(outcome.stop_reason, StopReason::EndOfStream);
        assert_eq!(outcome.stats.frames, 2);
        assert_eq!(outcome.report.rejection_total(), Duration::seconds(2));
    }

    #[test]
    fn time_limit_ends_at_the_limiting_frame() {
        let mut source = ScriptedSource::new(frames(&[Some(DetectorEmotion::Happy); 20]));
        let mut preview = CountingPreview::default();

        let outcome = run_session(
            &mut source,
            &mut FakeDetector { fail: false },
            &mut preview,
            "s4".into(),
            Some(Duration::seconds(5)),
        )
        .unwrap();

        assert_eq!(outcome.stop_reason, StopReason::TimeLimit);
        // Frames at 0s..=5s, the limiting one included, all reach the preview.
        assert_eq!(outcome.stats.frames, 6);
        assert_eq!(preview.shown.len(), 6);
        assert_eq!(outcome.report.session_total(), Duration::seconds(5));
        assert_eq!(outcome.report.total(Emotion::Happy), Duration::seconds(5));
    }

    #[test]
    fn detector_failure_propagates_after_release() {
        let mut source = ScriptedSource::new(frames(&[Some(DetectorEmotion::Happy)]));
        let mut preview = CountingPreview::default();

        let result = run_session(
            &mut source,
            &mut FakeDetector { fail: true },
            &mut preview,
            "s5".into(),
            None,
        );

        assert!(result.is_err());
        assert_eq!(source.released, 1);
        assert_eq!(preview.closed, 1);
    }
}
