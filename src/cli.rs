use std::path::PathBuf;

use clap::Parser;

use crate::settings::Settings;

#[derive(Parser, Debug, Clone, Default)]
#[command(name = "emotion-monitor")]
#[command(about = "Tracks time spent per facial emotion over a webcam session")]
pub struct Args {
    /// Settings file (JSON). Missing files fall back to defaults.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Replay a JSON-lines recording of detector output instead of the camera.
    #[arg(short, long)]
    pub replay: Option<PathBuf>,

    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    #[arg(long)]
    pub camera: Option<i32>,

    /// Stop the session after this many seconds.
    #[arg(long)]
    pub max_secs: Option<u64>,

    /// Run without a preview window.
    #[arg(long)]
    pub headless: bool,

    /// Print the summary but skip the chart, workbook and JSON files.
    #[arg(long)]
    pub no_export: bool,

    /// Write the effective settings back to the --config file.
    #[arg(long, requires = "config")]
    pub save_config: bool,
}

impl Args {
    /// Applies command-line overrides on top of loaded settings.
    pub fn apply(&self, settings: &mut Settings) {
        if let Some(dir) = &self.output_dir {
            settings.output_dir = dir.clone();
        }
        if let Some(index) = self.camera {
            settings.camera_index = index;
        }
        if self.max_secs.is_some() {
            settings.max_session_secs = self.max_secs;
        }
        if self.headless {
            settings.headless = true;
        }
    }
}
