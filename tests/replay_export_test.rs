use std::fs;
use std::path::Path;

use chrono::Duration;
use emotion_monitor::capture::StopReason;
use emotion_monitor::cli::Args;
use emotion_monitor::models::Emotion;
use emotion_monitor::run_with_args;

const RECORDING: &str = r#"{"offset_ms": 0, "faces": []}
{"offset_ms": 10000, "faces": [{"box": [40, 40, 120, 120], "emotions": {"happy": 0.91, "neutral": 0.05}}]}
{"offset_ms": 15000, "faces": [{"box": [40, 40, 120, 120], "emotions": {"neutral": 0.7, "sad": 0.2}}]}
{"offset_ms": 18000, "faces": []}
"#;

fn write_recording(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("session.jsonl");
    fs::write(&path, RECORDING).unwrap();
    path
}

fn replay_args(dir: &Path) -> Args {
    Args {
        replay: Some(write_recording(dir)),
        output_dir: Some(dir.join("out")),
        ..Args::default()
    }
}

#[test]
fn replay_session_writes_all_exports() {
    let dir = tempfile::tempdir().unwrap();
    let outcome = run_with_args(&replay_args(dir.path())).unwrap();

    assert_eq!(outcome.stop_reason, StopReason::EndOfStream);
    assert_eq!(outcome.report.total(Emotion::Neutral), Duration::seconds(13));
    assert_eq!(outcome.report.total(Emotion::Happy), Duration::seconds(5));
    assert_eq!(outcome.report.session_total(), Duration::seconds(18));

    let out = dir.path().join("out");
    let chart = image::open(out.join("emotion_pie_chart.png")).unwrap();
    assert_eq!((chart.width(), chart.height()), (400, 400));

    let workbook = fs::read(out.join("emotion_times.xlsx")).unwrap();
    assert!(workbook.starts_with(b"PK"));

    let summary: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(out.join("emotion_summary.json")).unwrap())
            .unwrap();
    assert_eq!(summary["sessionTime"], "00:00:18");
    assert_eq!(summary["bucketTimes"]["neutral"], "00:00:13");
    assert_eq!(summary["transitions"]["neutral"][0], "00:00:10");
    assert_eq!(summary["transitions"]["smile"][0], "00:00:15");
    assert_eq!(summary["stopReason"], "endOfStream");
    assert_eq!(summary["framesWithoutFace"], 2);
}

#[test]
fn time_limit_cuts_the_replay_short() {
    let dir = tempfile::tempdir().unwrap();
    let args = Args {
        max_secs: Some(12),
        no_export: true,
        ..replay_args(dir.path())
    };
    let outcome = run_with_args(&args).unwrap();

    assert_eq!(outcome.stop_reason, StopReason::TimeLimit);
    assert_eq!(outcome.report.session_total(), Duration::seconds(15));
    assert!(!dir.path().join("out").exists());
}

#[test]
fn save_config_persists_cli_overrides() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("settings.json");
    let args = Args {
        config: Some(config.clone()),
        save_config: true,
        no_export: true,
        ..replay_args(dir.path())
    };
    run_with_args(&args).unwrap();

    let saved: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(config).unwrap()).unwrap();
    assert_eq!(
        saved["output_dir"],
        dir.path().join("out").display().to_string()
    );
}

#[test]
fn malformed_recording_fails_before_the_session() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.jsonl");
    fs::write(&path, "{\"offset_ms\": 0}\n{oops\n").unwrap();

    let args = Args {
        replay: Some(path),
        output_dir: Some(dir.path().join("out")),
        ..Args::default()
    };
    let err = run_with_args(&args).unwrap_err();
    assert!(format!("{err:#}").contains("line 2"));
    assert!(!dir.path().join("out").exists());
}

#[test]
fn unrepresentable_time_limit_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let args = Args {
        max_secs: Some(20_000_000_000_000_000),
        ..replay_args(dir.path())
    };
    let err = run_with_args(&args).unwrap_err();
    assert!(format!("{err:#}").contains("out of range"));
    assert!(!dir.path().join("out").exists());
}

#[test]
fn unreachable_recording_offset_names_the_line() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("far.jsonl");
    fs::write(
        &path,
        "{\"offset_ms\": 0}\n{\"offset_ms\": 9000000000000000000}\n",
    )
    .unwrap();

    let args = Args {
        replay: Some(path),
        no_export: true,
        ..Args::default()
    };
    let err = run_with_args(&args).unwrap_err();
    let message = format!("{err:#}");
    assert!(message.contains("line 2"));
    assert!(message.contains("out of range"));
}
