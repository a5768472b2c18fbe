use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DetectorSettings {
    pub face_cascade: PathBuf,
    pub model: PathBuf,
}

impl Default for DetectorSettings {
    fn default() -> Self {
        Self {
            face_cascade: "/usr/share/opencv4/haarcascades/haarcascade_frontalface_default.xml"
                .into(),
            model: "models/emotion-ferplus-8.onnx".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ChartSettings {
    pub width: u32,
    pub height: u32,
    /// TrueType font for the title and slice labels. Defaults to the bundled
    /// DejaVu Sans.
    pub font_path: Option<PathBuf>,
}

impl Default for ChartSettings {
    fn default() -> Self {
        Self {
            width: 400,
            height: 400,
            font_path: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub output_dir: PathBuf,
    pub chart_file: String,
    pub workbook_file: String,
    pub summary_file: String,
    pub camera_index: i32,
    pub quit_key: char,
    pub max_session_secs: Option<u64>,
    pub headless: bool,
    pub detector: DetectorSettings,
    pub chart: ChartSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            output_dir: "./documentos".into(),
            chart_file: "emotion_pie_chart.png".into(),
            workbook_file: "emotion_times.xlsx".into(),
            summary_file: "emotion_summary.json".into(),
            camera_index: 0,
            quit_key: 'q',
            max_session_secs: None,
            headless: false,
            detector: DetectorSettings::default(),
            chart: ChartSettings::default(),
        }
    }
}

impl Settings {
    pub fn chart_path(&self) -> PathBuf {
        self.output_dir.join(&self.chart_file)
    }

    pub fn workbook_path(&self) -> PathBuf {
        self.output_dir.join(&self.workbook_file)
    }

    pub fn summary_path(&self) -> PathBuf {
        self.output_dir.join(&self.summary_file)
    }

    /// Session time limit, if any. Values chrono cannot represent are rejected.
    pub fn max_session(&self) -> Result<Option<chrono::Duration>> {
        let Some(secs) = self.max_session_secs else {
            return Ok(None);
        };
        i64::try_from(secs)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .map(Some)
            .with_context(|| format!("max_session_secs {secs} is out of range"))
    }
}

pub struct SettingsStore {
    path: Option<PathBuf>,
    data: Settings,
}

impl SettingsStore {
    /// Reads settings from `path` if given and present. A file that does not
    /// parse falls back to defaults with a warning.
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let data = match path.as_deref() {
            Some(path) if path.exists() => {
                let contents = fs::read_to_string(path)
                    .with_context(|| format!("Failed to read settings from {}", path.display()))?;
                serde_json::from_str(&contents).unwrap_or_else(|err| {
                    log::warn!(
                        "Ignoring unreadable settings in {}: {err}",
                        path.display()
                    );
                    Settings::default()
                })
            }
            Some(path) => {
                log::info!("No settings at {}, using defaults", path.display());
                Settings::default()
            }
            None => Settings::default(),
        };

        Ok(Self { path, data })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn settings(&self) -> &Settings {
        &self.data
    }

    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.data
    }

    pub fn into_settings(self) -> Settings {
        self.data
    }

    /// Writes the effective settings back to the store's file.
    pub fn persist(&self) -> Result<()> {
        let Some(path) = self.path.as_deref() else {
            anyhow::bail!("no settings path configured");
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let serialized = serde_json::to_string_pretty(&self.data)?;
        fs::write(path, serialized)
            .with_context(|| format!("Failed to write settings to {}", path.display()))
    }
}
