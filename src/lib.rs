/*!
# Sitoptenkit

A small web dashboard for the ten largest disease case counts in the
villages around a mining site, built in Rust.

## Overview

Health workers upload a CSV of monthly case counts. Visitors pick a month
and see the ten diseases with the most cases, a line chart of how those
diseases moved over the year, and a yearly total per disease. A third page
shows an announcement and a banner picture managed from the admin page.

## Architecture

### Data Layer
- **record**: one CSV row (`CaseRecord`) and the calendar ordering of month names
- **loader**: CSV parsing, required column validation, row level warnings
- **aggregate**: period filtering, top-N ranking, annual trend and summary
- **store**: the data directory (`data_penyakit.csv`, `pengumuman.txt`, `banner.jpg`)

### Web Layer (feature `web`)
- **app**: axum routing and request handlers
- **auth**: optional admin password with cookie sessions
- **pages**: handlebars templates for the three pages
- **graph**: PNG bar and line charts drawn with plotters
- **downloader**: XLSX and CSV export of the current dataset

## Pages and Endpoints

- `/` - public dashboard with year and month selectors
- `/admin` - banner, announcement and dataset management
- `/info` - announcement, banner and reading resources
- `/charts/top.png`, `/charts/trend.png` - charts for a period
- `/api/periods`, `/api/summary` - the same data as JSON
*/

pub mod aggregate;
pub mod config;
pub mod error;
pub mod loader;
pub mod record;
pub mod store;

#[cfg(feature = "web")]
pub mod app;
#[cfg(feature = "web")]
pub mod auth;
#[cfg(feature = "web")]
pub mod downloader;
#[cfg(feature = "web")]
pub mod graph;
#[cfg(feature = "web")]
pub mod pages;

pub use aggregate::{DiseaseTotal, PeriodSummary, TrendSeries};
pub use config::AppConfig;
pub use error::AppError;
pub use loader::{Dataset, parse_dataset};
pub use record::{CaseRecord, Period};
pub use store::FileStore;
