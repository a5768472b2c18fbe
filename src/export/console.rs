use crate::models::ReportBucket;
use crate::tracker::{format_duration, SessionReport};

/// The four duration lines: smile, neutral, rejection, whole session.
pub fn total_lines(report: &SessionReport) -> Vec<String> {
    vec![
        format!(
            "Total time smiling: {}",
            format_duration(report.bucket_total(ReportBucket::Smile))
        ),
        format!(
            "Total time neutral: {}",
            format_duration(report.bucket_total(ReportBucket::Neutral))
        ),
        format!(
            "Total time in rejection (angry/disgust): {}",
            format_duration(report.rejection_total())
        ),
        format!(
            "Total session time: {}",
            format_duration(report.session_total())
        ),
    ]
}

/// One line per bucket listing when that bucket's episodes ended.
pub fn transition_lines(report: &SessionReport) -> Vec<String> {
    ReportBucket::ALL
        .iter()
        .map(|bucket| {
            let times: Vec<String> = report
                .bucket_transitions(*bucket)
                .into_iter()
                .map(format_duration)
                .collect();
            format!(
                "Transitions out of '{}': [{}]",
                bucket_caption(*bucket),
                times.join(", ")
            )
        })
        .collect()
}

fn bucket_caption(bucket: ReportBucket) -> &'static str {
    match bucket {
        ReportBucket::Neutral => "neutral",
        ReportBucket::Smile => "smile",
        ReportBucket::Rejection => "rejection (angry/disgust)",
    }
}

pub fn print_summary(report: &SessionReport) {
    for line in total_lines(report) {
        println!("{line}");
    }
    println!();
    for line in transition_lines(report) {
        println!("{line}");
    }
    println!();
}
