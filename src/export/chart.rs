use std::f64::consts::PI;
use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use image::{ImageFormat, RgbImage};
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters::style::{register_font, FontStyle};

use crate::models::ReportBucket;
use crate::settings::ChartSettings;
use crate::tracker::SessionReport;

const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

const TITLE: &str = "Time distribution by emotion";
// Families registered with plotters' ab_glyph font table.
const BUNDLED_FAMILY: &str = "emotion-monitor-sans";
const CUSTOM_FAMILY: &str = "emotion-monitor-custom";
static BUNDLED_FONT: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans.ttf");
// Arc resolution, in points per full turn.
const ARC_STEPS: f64 = 360.0;

pub fn slice_color(bucket: ReportBucket) -> RGBColor {
    match bucket {
        ReportBucket::Neutral => RGBColor(0, 0, 255),
        ReportBucket::Smile => RGBColor(0, 128, 0),
        ReportBucket::Rejection => RGBColor(255, 165, 0),
    }
}

/// Renders the per-bucket pie chart as a PNG at `path`.
///
/// Only buckets with time in them get a slice. Slices start at twelve o'clock
/// and run counter-clockwise.
pub fn render_pie_chart(report: &SessionReport, settings: &ChartSettings, path: &Path) -> Result<()> {
    let (width, height) = (settings.width.max(64), settings.height.max(64));
    let family = chart_font(settings.font_path.as_deref());
    let labelled = family.is_some();

    let mut buffer = vec![0u8; width as usize * height as usize * 3];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
        root.fill(&WHITE).map_err(draw_error)?;

        let title_height = if labelled { (height / 10) as i32 } else { 0 };
        let cx = width as i32 / 2;
        let cy = title_height + (height as i32 - title_height) / 2;
        let radius = f64::from(width.min(height)) * 0.35;

        if let Some(family) = family {
            let style = (family, (height / 22).max(10))
                .into_font()
                .color(&BLACK)
                .pos(Pos::new(HPos::Center, VPos::Center));
            root.draw_text(TITLE, &style, (cx, title_height / 2))
                .map_err(draw_error)?;
        }

        let mut start = PI / 2.0;
        for (bucket, share) in report.bucket_shares() {
            let sweep = share * 2.0 * PI;
            let color = slice_color(bucket);
            root.draw(&Polygon::new(
                wedge((cx, cy), radius, start, sweep),
                color.filled(),
            ))
            .map_err(draw_error)?;

            if let Some(family) = family {
                let mid = start + sweep / 2.0;
                let size = (height / 28).max(9);
                let name_style = (family, size)
                    .into_font()
                    .color(&BLACK)
                    .pos(Pos::new(HPos::Center, VPos::Center));
                let pct_style = (family, size)
                    .into_font()
                    .color(&WHITE)
                    .pos(Pos::new(HPos::Center, VPos::Center));
                root.draw_text(bucket.title(), &name_style, polar((cx, cy), radius * 1.18, mid))
                    .map_err(draw_error)?;
                root.draw_text(
                    &format!("{:.1}%", share * 100.0),
                    &pct_style,
                    polar((cx, cy), radius * 0.6, mid),
                )
                .map_err(draw_error)?;
            }

            start += sweep;
        }

        root.present().map_err(draw_error)?;
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    RgbImage::from_raw(width, height, buffer)
        .ok_or_else(|| anyhow!("chart buffer does not match {width}x{height}"))?
        .save_with_format(path, ImageFormat::Png)
        .with_context(|| format!("failed to write chart {}", path.display()))?;

    log_info!("pie chart written to {}", path.display());
    Ok(())
}

fn polar(center: (i32, i32), radius: f64, angle: f64) -> (i32, i32) {
    (
        center.0 + (radius * angle.cos()).round() as i32,
        center.1 - (radius * angle.sin()).round() as i32,
    )
}

fn wedge(center: (i32, i32), radius: f64, start: f64, sweep: f64) -> Vec<(i32, i32)> {
    let steps = ((sweep / (2.0 * PI)) * ARC_STEPS).ceil().max(1.0) as usize;
    let mut points = Vec::with_capacity(steps + 2);
    points.push(center);
    for i in 0..=steps {
        let angle = start + sweep * i as f64 / steps as f64;
        points.push(polar(center, radius, angle));
    }
    points
}

/// Registers the font for labels and returns its family name. A configured
/// font wins; otherwise, or when it cannot be loaded, the bundled DejaVu Sans
/// is used. `None` only if no font could be registered at all.
fn chart_font(custom: Option<&Path>) -> Option<&'static str> {
    if let Some(path) = custom {
        match load_font(path) {
            Ok(()) => return Some(CUSTOM_FAMILY),
            Err(err) => log_warn!("falling back to the bundled chart font: {err:#}"),
        }
    }
    match register_font(BUNDLED_FAMILY, FontStyle::Normal, BUNDLED_FONT) {
        Ok(()) => Some(BUNDLED_FAMILY),
        Err(_) => {
            log_warn!("bundled chart font is unusable, drawing without labels");
            None
        }
    }
}

fn load_font(path: &Path) -> Result<()> {
    let bytes = fs::read(path).with_context(|| format!("failed to read font {}", path.display()))?;
    // plotters keeps registered fonts for the life of the process.
    let bytes: &'static [u8] = Box::leak(bytes.into_boxed_slice());
    register_font(CUSTOM_FAMILY, FontStyle::Normal, bytes)
        .map_err(|_| anyhow!("{} is not a usable font", path.display()))
}

fn draw_error<E: std::fmt::Display>(err: E) -> anyhow::Error {
    anyhow!("chart drawing failed: {err}")
}
