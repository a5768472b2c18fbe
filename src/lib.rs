pub mod capture;
pub mod cli;
pub mod export;
pub mod models;
pub mod settings;
pub mod tracker;
mod utils;

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use clap::Parser;
use uuid::Uuid;

use capture::{run_session, HeadlessPreview, RecordedDetector, ReplaySource, SessionOutcome};
use cli::Args;
use export::{print_summary, render_pie_chart, write_summary, write_workbook, SessionSummary};
use settings::{Settings, SettingsStore};

#[cfg(feature = "camera")]
const WINDOW_TITLE: &str = "Emotion Detection";

pub fn run() -> Result<()> {
    // Initialize logging (reads RUST_LOG env var)
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args = Args::parse();
    run_with_args(&args)?;
    Ok(())
}

/// Loads settings, runs one session from the replay file or the camera, prints
/// the summary and writes the exports.
pub fn run_with_args(args: &Args) -> Result<SessionOutcome> {
    let mut store = SettingsStore::load(args.config.clone())?;
    args.apply(store.settings_mut());
    if args.save_config {
        store.persist()?;
        if let Some(path) = store.path() {
            log::info!("settings saved to {}", path.display());
        }
    }
    let settings = store.into_settings();
    let max_session = settings.max_session()?;

    let session_id = Uuid::new_v4().to_string();
    let outcome = match args.replay.as_deref() {
        Some(path) => {
            log::info!("replaying {}", path.display());
            let mut source = ReplaySource::open(path, Utc::now())?;
            run_session(
                &mut source,
                &mut RecordedDetector,
                &mut HeadlessPreview::default(),
                session_id,
                max_session,
            )?
        }
        None => run_camera(&settings, session_id, max_session)?,
    };

    print_summary(&outcome.report);

    if args.no_export {
        log::info!("export skipped");
    } else {
        export_outcome(&outcome, &settings)?;
    }
    Ok(outcome)
}

/// Writes the chart, the workbook (with the chart embedded) and the JSON
/// summary into `settings.output_dir`.
pub fn export_outcome(outcome: &SessionOutcome, settings: &Settings) -> Result<()> {
    std::fs::create_dir_all(&settings.output_dir).with_context(|| {
        format!(
            "failed to create output directory {}",
            settings.output_dir.display()
        )
    })?;

    let chart_path = settings.chart_path();
    render_pie_chart(&outcome.report, &settings.chart, &chart_path)?;
    write_workbook(&outcome.report, Some(&chart_path), &settings.workbook_path())?;

    let summary = SessionSummary::from_report(
        &outcome.report,
        Some(outcome.stop_reason),
        outcome.stats,
    );
    write_summary(&summary, &settings.summary_path())
}

#[cfg(feature = "camera")]
fn run_camera(
    settings: &Settings,
    session_id: String,
    max_session: Option<Duration>,
) -> Result<SessionOutcome> {
    use capture::opencv::{CascadeEmotionDetector, Webcam, WindowPreview};

    let mut detector =
        CascadeEmotionDetector::load(&settings.detector.face_cascade, &settings.detector.model)?;

    if settings.headless {
        if max_session.is_none() {
            log::warn!("headless camera session has no time limit; it ends only when the camera stops");
        }
        let mut source = Webcam::open(settings.camera_index)?;
        return run_session(
            &mut source,
            &mut detector,
            &mut HeadlessPreview::default(),
            session_id,
            max_session,
        );
    }

    let mut preview = WindowPreview::open(WINDOW_TITLE, settings.quit_key)?;
    let mut source = Webcam::open(settings.camera_index)?;
    log::info!("press '{}' in the preview window to stop", settings.quit_key);
    run_session(
        &mut source,
        &mut detector,
        &mut preview,
        session_id,
        max_session,
    )
}

#[cfg(not(feature = "camera"))]
fn run_camera(
    _settings: &Settings,
    _session_id: String,
    _max_session: Option<Duration>,
) -> Result<SessionOutcome> {
    anyhow::bail!("built without camera support; rebuild with `--features camera` or pass --replay <recording>")
}
