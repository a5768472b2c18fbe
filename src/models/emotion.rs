use serde::{Deserialize, Serialize};

/// The four categories a session is tracked in.
///
/// Anything the detector reports outside of these falls back to `Neutral`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Neutral,
    Happy,
    Angry,
    Disgust,
}

impl Default for Emotion {
    fn default() -> Self {
        Emotion::Neutral
    }
}

impl Emotion {
    pub const ALL: [Emotion; 4] = [
        Emotion::Neutral,
        Emotion::Happy,
        Emotion::Angry,
        Emotion::Disgust,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Emotion::Neutral => "neutral",
            Emotion::Happy => "happy",
            Emotion::Angry => "angry",
            Emotion::Disgust => "disgust",
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            Emotion::Neutral => 0,
            Emotion::Happy => 1,
            Emotion::Angry => 2,
            Emotion::Disgust => 3,
        }
    }

    /// Maps a raw detector emotion onto a tracked category.
    pub fn from_detector(raw: DetectorEmotion) -> Self {
        match raw {
            DetectorEmotion::Happy => Emotion::Happy,
            DetectorEmotion::Angry => Emotion::Angry,
            DetectorEmotion::Disgust => Emotion::Disgust,
            DetectorEmotion::Fear
            | DetectorEmotion::Sad
            | DetectorEmotion::Surprise
            | DetectorEmotion::Neutral
            | DetectorEmotion::Contempt => Emotion::Neutral,
        }
    }

    pub fn bucket(self) -> ReportBucket {
        match self {
            Emotion::Neutral => ReportBucket::Neutral,
            Emotion::Happy => ReportBucket::Smile,
            Emotion::Angry | Emotion::Disgust => ReportBucket::Rejection,
        }
    }

    /// Overlay colour for face boxes, as RGB.
    pub fn overlay_rgb(self) -> [u8; 3] {
        match self {
            Emotion::Happy => [0, 255, 0],
            Emotion::Angry => [255, 0, 0],
            Emotion::Disgust => [255, 165, 0],
            Emotion::Neutral => [0, 0, 255],
        }
    }
}

impl std::fmt::Display for Emotion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reporting groups. Angry and disgust are tracked apart but reported together.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ReportBucket {
    Neutral,
    Smile,
    Rejection,
}

impl ReportBucket {
    pub const ALL: [ReportBucket; 3] = [
        ReportBucket::Neutral,
        ReportBucket::Smile,
        ReportBucket::Rejection,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReportBucket::Neutral => "neutral",
            ReportBucket::Smile => "smile",
            ReportBucket::Rejection => "rejection",
        }
    }

    /// Human-facing name used on overlays, the chart and the spreadsheet.
    pub fn title(&self) -> &'static str {
        match self {
            ReportBucket::Neutral => "Neutral",
            ReportBucket::Smile => "Smile",
            ReportBucket::Rejection => "Rejection",
        }
    }

    pub fn emotions(&self) -> &'static [Emotion] {
        match self {
            ReportBucket::Neutral => &[Emotion::Neutral],
            ReportBucket::Smile => &[Emotion::Happy],
            ReportBucket::Rejection => &[Emotion::Angry, Emotion::Disgust],
        }
    }
}

/// Raw emotion classes a detector may score.
///
/// Declaration order is the detector's reporting order and breaks ties when two
/// classes share the top score.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum DetectorEmotion {
    Angry,
    Disgust,
    Fear,
    Happy,
    Sad,
    Surprise,
    Neutral,
    Contempt,
}
