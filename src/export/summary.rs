use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::capture::{loop_worker::FrameStats, StopReason};
use crate::models::{Emotion, ReportBucket};
use crate::tracker::{duration_secs, format_duration, SessionReport};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EpisodeSummary {
    pub emotion: Emotion,
    pub start_secs: f64,
    pub end_secs: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub session_id: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub stop_reason: Option<StopReason>,
    #[serde(flatten)]
    pub stats: FrameStats,
    pub session_secs: f64,
    pub session_time: String,
    pub emotion_secs: BTreeMap<Emotion, f64>,
    pub rejection_secs: f64,
    pub bucket_times: BTreeMap<String, String>,
    pub transitions: BTreeMap<String, Vec<String>>,
    pub timeline: Vec<EpisodeSummary>,
}

impl SessionSummary {
    pub fn from_report(
        report: &SessionReport,
        stop_reason: Option<StopReason>,
        stats: FrameStats,
    ) -> Self {
        let emotion_secs = report
            .totals()
            .iter()
            .map(|(emotion, total)| (emotion, duration_secs(total)))
            .collect();

        let bucket_times = ReportBucket::ALL
            .iter()
            .map(|b| (b.as_str().to_string(), format_duration(report.bucket_total(*b))))
            .collect();

        let transitions = ReportBucket::ALL
            .iter()
            .map(|b| {
                let times = report
                    .bucket_transitions(*b)
                    .into_iter()
                    .map(format_duration)
                    .collect();
                (b.as_str().to_string(), times)
            })
            .collect();

        let timeline = report
            .episodes()
            .into_iter()
            .map(|episode| EpisodeSummary {
                emotion: episode.emotion,
                start_secs: duration_secs(episode.start),
                end_secs: duration_secs(episode.end),
            })
            .collect();

        Self {
            session_id: report.session_id().to_string(),
            started_at: report.started_at(),
            ended_at: report.ended_at(),
            stop_reason,
            stats,
            session_secs: duration_secs(report.session_total()),
            session_time: format_duration(report.session_total()),
            emotion_secs,
            rejection_secs: duration_secs(report.rejection_total()),
            bucket_times,
            transitions,
            timeline,
        }
    }
}

pub fn write_summary(summary: &SessionSummary, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let serialized = serde_json::to_string_pretty(summary)?;
    fs::write(path, serialized)
        .with_context(|| format!("failed to write summary {}", path.display()))?;
    log::info!("summary written to {}", path.display());
    Ok(())
}
