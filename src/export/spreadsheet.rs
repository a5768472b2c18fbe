use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Color, Format, Image, Workbook, Worksheet};

use crate::models::ReportBucket;
use crate::tracker::{format_duration, SessionReport};

const ENABLE_LOGS: bool = true;

use crate::log_info;

// Transition lists start on row 5 (zero-based 4); the chart sits at E5.
const LIST_FIRST_ROW: u32 = 4;
const CHART_ROW: u32 = 4;
const CHART_COL: u16 = 4;

const HEADER_FILL: u32 = 0xFFC0CB;

fn header_fill(bucket: ReportBucket) -> u32 {
    match bucket {
        ReportBucket::Neutral => 0xADD8E6,
        ReportBucket::Smile => 0x90EE90,
        ReportBucket::Rejection => 0xFFA07A,
    }
}

fn value_fill(bucket: ReportBucket) -> u32 {
    match bucket {
        ReportBucket::Neutral => 0xCCECFF,
        ReportBucket::Smile => 0xD1FFD1,
        ReportBucket::Rejection => 0xFFCC99,
    }
}

fn fill(rgb: u32) -> Format {
    Format::new().set_background_color(Color::RGB(rgb))
}

fn total_header(bucket: ReportBucket) -> &'static str {
    match bucket {
        ReportBucket::Neutral => "Total Neutral",
        ReportBucket::Smile => "Total Smile",
        ReportBucket::Rejection => "Total Disgust/Anger",
    }
}

fn list_header(bucket: ReportBucket) -> &'static str {
    match bucket {
        ReportBucket::Neutral => "Neutral Times",
        ReportBucket::Smile => "Smile Times",
        ReportBucket::Rejection => "Disgust Times",
    }
}

/// Fills the summary sheet:
/// row 1 headers, row 2 totals (A session, B neutral, C smile, D rejection),
/// row 4 list headers, rows 5.. transition times per bucket in A/B/C.
pub fn fill_summary_sheet(sheet: &mut Worksheet, report: &SessionReport) -> Result<()> {
    sheet.write_string_with_format(0, 0, "Session Time", &fill(HEADER_FILL))?;
    sheet.write_string(1, 0, &format_duration(report.session_total()))?;

    for (i, bucket) in ReportBucket::ALL.iter().enumerate() {
        let col = i as u16;

        sheet.write_string_with_format(0, col + 1, total_header(*bucket), &fill(header_fill(*bucket)))?;
        sheet.write_string_with_format(
            1,
            col + 1,
            &format_duration(report.bucket_total(*bucket)),
            &fill(value_fill(*bucket)),
        )?;

        sheet.write_string_with_format(3, col, list_header(*bucket), &fill(header_fill(*bucket)))?;
        for (row, at) in report.bucket_transitions(*bucket).into_iter().enumerate() {
            sheet.write_string(LIST_FIRST_ROW + row as u32, col, &format_duration(at))?;
        }
    }
    Ok(())
}

/// Writes the workbook to `path`, embedding the chart image when one exists.
pub fn write_workbook(report: &SessionReport, chart: Option<&Path>, path: &Path) -> Result<()> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    fill_summary_sheet(sheet, report).context("failed to fill summary sheet")?;

    if let Some(chart) = chart {
        let image = Image::new(chart)
            .with_context(|| format!("failed to load chart image {}", chart.display()))?;
        sheet.insert_image(CHART_ROW, CHART_COL, &image)?;
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    workbook
        .save(path)
        .with_context(|| format!("failed to save workbook {}", path.display()))?;

    log_info!("workbook written to {}", path.display());
    Ok(())
}
