//! Live webcam capture, face/emotion detection and the preview window.

use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use chrono::Utc;
use opencv::{
    core::{self, Mat, Point, Rect, Scalar, Size, Vector},
    dnn, highgui, imgproc, objdetect,
    prelude::*,
    videoio,
};

use crate::models::{DetectorEmotion, Emotion, FaceBox, FaceDetection};

use super::{CapturedFrame, EmotionDetector, FrameSource, Preview, PreviewControl};

/// Output order of the FER+ emotion model.
const MODEL_CLASSES: [DetectorEmotion; 8] = [
    DetectorEmotion::Neutral,
    DetectorEmotion::Happy,
    DetectorEmotion::Surprise,
    DetectorEmotion::Sad,
    DetectorEmotion::Angry,
    DetectorEmotion::Disgust,
    DetectorEmotion::Fear,
    DetectorEmotion::Contempt,
];
const MODEL_INPUT: i32 = 64;
const MIN_FACE: i32 = 48;

pub struct Webcam {
    capture: videoio::VideoCapture,
    index: i32,
    released: bool,
}

impl Webcam {
    pub fn open(index: i32) -> Result<Self> {
        let capture = videoio::VideoCapture::new(index, videoio::CAP_ANY)
            .with_context(|| format!("could not open camera {index}"))?;
        if !capture.is_opened()? {
            bail!("could not open camera {index}");
        }
        log::info!("camera {index} opened");
        Ok(Self {
            capture,
            index,
            released: false,
        })
    }
}

impl FrameSource for Webcam {
    type Frame = Mat;

    fn read_frame(&mut self) -> Result<Option<CapturedFrame<Mat>>> {
        let mut frame = Mat::default();
        if !self.capture.read(&mut frame)? || frame.rows() == 0 || frame.cols() == 0 {
            return Ok(None);
        }
        Ok(Some(CapturedFrame {
            captured_at: Utc::now(),
            frame,
        }))
    }

    fn release(&mut self) -> Result<()> {
        if self.released {
            return Ok(());
        }
        self.released = true;
        self.capture
            .release()
            .with_context(|| format!("failed to release camera {}", self.index))
    }
}

/// Haar-cascade face finder followed by an ONNX emotion classifier per face.
pub struct CascadeEmotionDetector {
    faces: objdetect::CascadeClassifier,
    net: dnn::Net,
}

impl CascadeEmotionDetector {
    pub fn load(cascade: &Path, model: &Path) -> Result<Self> {
        let cascade_path = cascade
            .to_str()
            .ok_or_else(|| anyhow!("cascade path is not valid UTF-8"))?;
        let model_path = model
            .to_str()
            .ok_or_else(|| anyhow!("model path is not valid UTF-8"))?;

        let faces = objdetect::CascadeClassifier::new(cascade_path)
            .with_context(|| format!("failed to load face cascade {}", cascade.display()))?;
        if faces.empty()? {
            bail!("face cascade {} is empty", cascade.display());
        }
        let net = dnn::read_net_from_onnx(model_path)
            .with_context(|| format!("failed to load emotion model {}", model.display()))?;

        Ok(Self { faces, net })
    }

    fn classify(&mut self, gray: &Mat, face: Rect) -> Result<Vec<(DetectorEmotion, f32)>> {
        let roi = Mat::roi(gray, face)?;
        let mut resized = Mat::default();
        imgproc::resize_def(&roi, &mut resized, Size::new(MODEL_INPUT, MODEL_INPUT))?;

        let blob = dnn::blob_from_image(
            &resized,
            1.0,
            Size::new(MODEL_INPUT, MODEL_INPUT),
            Scalar::default(),
            false,
            false,
            core::CV_32F,
        )?;
        self.net.set_input_def(&blob)?;
        let output = self.net.forward_single_def()?;

        let mut logits = Vec::with_capacity(MODEL_CLASSES.len());
        for i in 0..MODEL_CLASSES.len() {
            logits.push(*output.at_2d::<f32>(0, i as i32)?);
        }
        Ok(MODEL_CLASSES.iter().copied().zip(softmax(&logits)).collect())
    }
}

fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|v| (v - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|v| v / sum).collect()
}

impl EmotionDetector<Mat> for CascadeEmotionDetector {
    fn detect_emotions(&mut self, frame: &Mat) -> Result<Vec<FaceDetection>> {
        let mut gray = Mat::default();
        imgproc::cvt_color_def(frame, &mut gray, imgproc::COLOR_BGR2GRAY)?;

        let mut rects = Vector::<Rect>::new();
        self.faces.detect_multi_scale(
            &gray,
            &mut rects,
            1.1,
            5,
            0,
            Size::new(MIN_FACE, MIN_FACE),
            Size::new(0, 0),
        )?;

        let mut detections = Vec::with_capacity(rects.len());
        for rect in rects.iter() {
            let emotions = self.classify(&gray, rect)?.into_iter().collect();
            detections.push(FaceDetection {
                face_box: FaceBox::from([rect.x, rect.y, rect.width, rect.height]),
                emotions,
            });
        }
        Ok(detections)
    }
}

pub struct WindowPreview {
    window: String,
    quit_key: char,
    open: bool,
}

impl WindowPreview {
    pub fn open(window: &str, quit_key: char) -> Result<Self> {
        highgui::named_window_def(window)?;
        Ok(Self {
            window: window.to_string(),
            quit_key,
            open: true,
        })
    }
}

fn bgr(emotion: Emotion) -> Scalar {
    let [r, g, b] = emotion.overlay_rgb();
    Scalar::new(b as f64, g as f64, r as f64, 0.0)
}

impl Preview<Mat> for WindowPreview {
    fn present(
        &mut self,
        frame: &mut Mat,
        detections: &[FaceDetection],
        label: Emotion,
    ) -> Result<PreviewControl> {
        let color = bgr(label);
        let text = label.bucket().title();

        for detection in detections {
            let FaceBox {
                x,
                y,
                width,
                height,
            } = detection.face_box;
            imgproc::rectangle(
                frame,
                Rect::new(x, y, width, height),
                color,
                2,
                imgproc::LINE_8,
                0,
            )?;
            imgproc::put_text(
                frame,
                text,
                Point::new(x, y - 10),
                imgproc::FONT_HERSHEY_SIMPLEX,
                0.9,
                color,
                2,
                imgproc::LINE_8,
                false,
            )?;
        }

        highgui::imshow(&self.window, &*frame)?;
        let key = highgui::wait_key(1)?;
        if key >= 0 && char::from_u32((key & 0xff) as u32) == Some(self.quit_key) {
            return Ok(PreviewControl::Quit);
        }
        Ok(PreviewControl::Continue)
    }

    fn close(&mut self) -> Result<()> {
        if self.open {
            self.open = false;
            highgui::destroy_all_windows()?;
        }
        Ok(())
    }
}
