//! Renders the dashboard charts for one period of a CSV file into PNG files.
//!
//! `render_charts <data.csv> [year] [month] [out_dir]`

use std::env;
use std::fs;
use std::path::PathBuf;

use sitoptenkit::aggregate::{EMPTY_PERIOD_WARNING, resolve_period, summarize};
use sitoptenkit::graph::{self, ChartOptions};
use sitoptenkit::parse_dataset;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();
    let Some(csv_path) = args.get(1) else {
        eprintln!("usage: {} <data.csv> [year] [month] [out_dir]", args[0]);
        std::process::exit(2);
    };
    let year = args.get(2).and_then(|y| y.parse().ok());
    let month = args.get(3).map(String::as_str);
    let out_dir = PathBuf::from(args.get(4).map(String::as_str).unwrap_or("."));

    let dataset = parse_dataset(&fs::read(csv_path)?)?;
    for warning in &dataset.warnings {
        eprintln!("line {}: {}", warning.line, warning.message);
    }

    let Some(period) = resolve_period(&dataset, year, month) else {
        eprintln!("{}", EMPTY_PERIOD_WARNING);
        std::process::exit(1);
    };
    let summary = summarize(&dataset, &period);
    if summary.top.is_empty() {
        eprintln!("{}", EMPTY_PERIOD_WARNING);
        std::process::exit(1);
    }

    fs::create_dir_all(&out_dir)?;

    let top = graph::render_top_chart(
        &summary.top,
        &ChartOptions::titled(format!("Top 10 Penyakit - {}", period)),
    )?;
    let top_path = out_dir.join("top.png");
    fs::write(&top_path, top)?;
    println!("Created top chart at {}", top_path.display());

    let trend = graph::render_trend_chart(
        &summary.trend,
        &summary.trend_months,
        &ChartOptions::titled(format!("Tren Kasus Penyakit Sepanjang Tahun {}", period.year)),
    )?;
    let trend_path = out_dir.join("trend.png");
    fs::write(&trend_path, trend)?;
    println!("Created trend chart at {}", trend_path.display());

    Ok(())
}
