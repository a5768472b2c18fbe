//! Detector output for a single frame.
//!
//! The JSON shape mirrors what common emotion detectors emit per face:
//! `{"box": [x, y, w, h], "emotions": {"happy": 0.91, "neutral": 0.04, ...}}`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::emotion::{DetectorEmotion, Emotion};

/// Face bounding box in pixel coordinates.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(from = "[i32; 4]", into = "[i32; 4]")]
pub struct FaceBox {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl From<[i32; 4]> for FaceBox {
    fn from([x, y, width, height]: [i32; 4]) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

impl From<FaceBox> for [i32; 4] {
    fn from(face: FaceBox) -> Self {
        [face.x, face.y, face.width, face.height]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FaceDetection {
    #[serde(rename = "box")]
    pub face_box: FaceBox,
    pub emotions: BTreeMap<DetectorEmotion, f32>,
}

impl FaceDetection {
    /// Highest-scoring raw emotion; ties go to the earliest class in detector order.
    pub fn top_emotion(&self) -> Option<DetectorEmotion> {
        let mut best: Option<(DetectorEmotion, f32)> = None;
        for (&emotion, &score) in &self.emotions {
            if score.is_nan() {
                continue;
            }
            match best {
                Some((_, best_score)) if score <= best_score => {}
                _ => best = Some((emotion, score)),
            }
        }
        best.map(|(emotion, _)| emotion)
    }
}

/// Dominant category for a frame.
///
/// Only the first detected face counts. A frame without faces (or without
/// usable scores) is `Neutral`.
pub fn dominant_emotion(detections: &[FaceDetection]) -> Emotion {
    detections
        .first()
        .and_then(FaceDetection::top_emotion)
        .map(Emotion::from_detector)
        .unwrap_or(Emotion::Neutral)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn face(scores: &[(DetectorEmotion, f32)]) -> FaceDetection {
        FaceDetection {
            face_box: FaceBox::from([10, 20, 30, 40]),
            emotions: scores.iter().copied().collect(),
        }
    }

    #[test]
    fn no_faces_is_neutral() {
        assert_eq!(dominant_emotion(&[]), Emotion::Neutral);
    }

    #[test]
    fn first_face_wins() {
        let detections = vec![
            face(&[(DetectorEmotion::Happy, 0.8), (DetectorEmotion::Angry, 0.1)]),
            face(&[(DetectorEmotion::Angry, 0.9), (DetectorEmotion::Happy, 0.05)]),
        ];
        assert_eq!(dominant_emotion(&detections), Emotion::Happy);
    }

    #[test]
    fn untracked_top_score_maps_to_neutral() {
        let detections = vec![face(&[
            (DetectorEmotion::Surprise, 0.7),
            (DetectorEmotion::Happy, 0.2),
        ])];
        assert_eq!(dominant_emotion(&detections), Emotion::Neutral);
    }

    #[test]
    fn ties_resolve_in_detector_order() {
        let detection = face(&[
            (DetectorEmotion::Neutral, 0.5),
            (DetectorEmotion::Disgust, 0.5),
        ]);
        assert_eq!(detection.top_emotion(), Some(DetectorEmotion::Disgust));
    }

    #[test]
    fn empty_scores_are_neutral() {
        assert_eq!(dominant_emotion(&[face(&[])]), Emotion::Neutral);
    }

    #[test]
    fn parses_detector_json() {
        let json = r#"{"box": [5, 6, 70, 80], "emotions": {"angry": 0.02, "happy": 0.93, "neutral": 0.05}}"#;
        let detection: FaceDetection = serde_json::from_str(json).unwrap();
        assert_eq!(
            detection.face_box,
            FaceBox {
                x: 5,
                y: 6,
                width: 70,
                height: 80
            }
        );
        assert_eq!(detection.top_emotion(), Some(DetectorEmotion::Happy));

        let back = serde_json::to_value(&detection).unwrap();
        assert_eq!(back["box"], serde_json::json!([5, 6, 70, 80]));
    }
}
