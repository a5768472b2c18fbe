pub mod detection;
pub mod emotion;

pub use detection::{dominant_emotion, FaceBox, FaceDetection};
pub use emotion::{DetectorEmotion, Emotion, ReportBucket};
