#![cfg(feature = "web")]
use plotters::coord::ranged1d::SegmentValue;
use plotters::prelude::*;

use crate::aggregate::{DiseaseTotal, TrendSeries};
use crate::error::AppError;

/// Bar colour of the top-10 chart (#1E88E5).
const BAR_COLOR: RGBColor = RGBColor(0x1E, 0x88, 0xE5);

/// Size and labels of a rendered chart.
#[derive(Clone, Debug)]
pub struct ChartOptions {
    /// Title displayed at the top of the chart
    pub title: String,

    /// Label for the Y-axis
    pub y_label: String,

    /// Width of the chart in pixels
    pub width: u32,

    /// Height of the chart in pixels
    pub height: u32,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            title: String::new(),
            y_label: "Jumlah Kasus".to_string(),
            width: 1000,
            height: 500,
        }
    }
}

impl ChartOptions {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }
}

fn chart_err<E: std::fmt::Display>(e: E) -> AppError {
    AppError::Chart(e.to_string())
}

/// Highest value on a y-axis that starts at zero, with some headroom.
fn y_ceiling(max: i64) -> i64 {
    max.saturating_add(max / 10).max(max.saturating_add(1)).max(1)
}

/// Bar chart with one bar per disease, in the order given.
///
/// # Returns
/// * PNG image data
pub fn render_top_chart(rows: &[DiseaseTotal], options: &ChartOptions) -> Result<Vec<u8>, AppError> {
    let (width, height) = (options.width, options.height);
    let mut buffer = vec![0u8; (width * height * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
        root.fill(&WHITE).map_err(chart_err)?;

        let labels: Vec<String> = rows.iter().map(|r| r.disease.clone()).collect();
        let max_y = rows.iter().map(|r| r.total).max().unwrap_or(0);
        let bars = rows.len().max(1) as u32;

        let mut chart = ChartBuilder::on(&root)
            .caption(&options.title, ("sans-serif", 26).into_font())
            .margin(15)
            .x_label_area_size(60)
            .y_label_area_size(60)
            .build_cartesian_2d((0..bars).into_segmented(), 0i64..y_ceiling(max_y))
            .map_err(chart_err)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(labels.len().max(1))
            .x_label_formatter(&|v| match v {
                SegmentValue::CenterOf(i) | SegmentValue::Exact(i) => {
                    labels.get(*i as usize).cloned().unwrap_or_default()
                }
                SegmentValue::Last => String::new(),
            })
            .x_label_style(("sans-serif", 13))
            .y_desc(&options.y_label)
            .draw()
            .map_err(chart_err)?;

        chart
            .draw_series(
                Histogram::vertical(&chart)
                    .style(BAR_COLOR.filled())
                    .margin(10)
                    .data(rows.iter().enumerate().map(|(i, r)| (i as u32, r.total))),
            )
            .map_err(chart_err)?;

        root.present().map_err(chart_err)?;
    }
    encode_png(buffer, width, height)
}

/// Line chart with one series per disease across `months`.
///
/// Points are placed by the position of their month in `months`; a series
/// only has points for the months in which the disease was reported.
pub fn render_trend_chart(
    series: &[TrendSeries],
    months: &[String],
    options: &ChartOptions,
) -> Result<Vec<u8>, AppError> {
    let (width, height) = (options.width, options.height);
    let mut buffer = vec![0u8; (width * height * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
        root.fill(&WHITE).map_err(chart_err)?;

        let max_y = series
            .iter()
            .flat_map(|s| s.points.iter().map(|(_, v)| *v))
            .max()
            .unwrap_or(0);
        let last = months.len().saturating_sub(1) as f64;

        let mut chart = ChartBuilder::on(&root)
            .caption(&options.title, ("sans-serif", 26).into_font())
            .margin(15)
            .x_label_area_size(50)
            .y_label_area_size(60)
            .build_cartesian_2d(-0.5f64..last + 0.5, 0i64..y_ceiling(max_y))
            .map_err(chart_err)?;

        chart
            .configure_mesh()
            .x_labels(months.len().max(1))
            .x_label_formatter(&|x| month_label(months, *x))
            .y_desc(&options.y_label)
            .draw()
            .map_err(chart_err)?;

        for (idx, s) in series.iter().enumerate() {
            let color = Palette99::pick(idx).to_rgba();
            let points: Vec<(f64, i64)> = s
                .points
                .iter()
                .filter_map(|(m, v)| {
                    months
                        .iter()
                        .position(|month| month == m)
                        .map(|pos| (pos as f64, *v))
                })
                .collect();

            chart
                .draw_series(LineSeries::new(points.clone(), color.stroke_width(2)))
                .map_err(chart_err)?
                .label(s.disease.clone())
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));

            chart
                .draw_series(
                    points
                        .iter()
                        .map(|&(x, y)| Circle::new((x, y), 4, color.filled())),
                )
                .map_err(chart_err)?;
        }

        if !series.is_empty() {
            chart
                .configure_series_labels()
                .background_style(WHITE.mix(0.8))
                .border_style(BLACK)
                .position(SeriesLabelPosition::UpperRight)
                .draw()
                .map_err(chart_err)?;
        }

        root.present().map_err(chart_err)?;
    }
    encode_png(buffer, width, height)
}

// Only whole positions carry a label.
fn month_label(months: &[String], x: f64) -> String {
    if (x - x.round()).abs() > 1e-6 || x < 0.0 {
        return String::new();
    }
    months.get(x.round() as usize).cloned().unwrap_or_default()
}

fn encode_png(buffer: Vec<u8>, width: u32, height: u32) -> Result<Vec<u8>, AppError> {
    use image::{DynamicImage, ImageOutputFormat, RgbImage};
    use std::io::Cursor;

    let img = RgbImage::from_raw(width, height, buffer)
        .ok_or_else(|| AppError::Chart("bitmap buffer size mismatch".to_string()))?;
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img).write_to(&mut out, ImageOutputFormat::Png)?;
    Ok(out.into_inner())
}
