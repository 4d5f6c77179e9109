use std::path::Path;
use std::sync::Arc;

use axum::{
    Form, Json, Router,
    extract::{DefaultBodyLimit, Multipart, Query, State},
    http::{StatusCode, header},
    middleware,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use chrono::Local;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::aggregate::{
    EMPTY_PERIOD_WARNING, PeriodSummary, available_months, available_years, resolve_period,
    summarize,
};
use crate::auth::{self, AdminAuth};
use crate::config::AppConfig;
use crate::downloader::{self, XLSX_FILENAME, XLSX_MIME};
use crate::error::AppError;
use crate::graph::{self, ChartOptions};
use crate::loader::{Dataset, ParseWarning, REQUIRED_COLUMNS};
use crate::pages::{Pages, RESOURCES, format_long_date, format_timestamp};
use crate::record::CaseRecord;
use crate::store::{DATASET_FILE, FileStore};

/// Rows of a fresh upload echoed back on the admin page.
const PREVIEW_ROWS: usize = 100;

const BANNER_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];
const DATASET_EXTENSIONS: &[&str] = &["csv"];

pub struct AppState {
    pub store: FileStore,
    pub pages: Pages,
    pub auth: AdminAuth,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(config: &AppConfig) -> Result<Self, AppError> {
        Ok(Self {
            store: FileStore::new(&config.data_dir),
            pages: Pages::new()?,
            auth: AdminAuth::new(config.admin_password.as_deref())?,
        })
    }
}

/// `?year=2024&month=Januari`; blanks and unparsable years count as absent.
#[derive(Debug, Default, Deserialize)]
pub struct PeriodQuery {
    year: Option<String>,
    month: Option<String>,
}

impl PeriodQuery {
    fn selection(&self) -> (Option<i32>, Option<&str>) {
        let year = self.year.as_deref().and_then(|y| y.trim().parse().ok());
        let month = self.month.as_deref().filter(|m| !m.trim().is_empty());
        (year, month)
    }
}

#[derive(Debug, Deserialize)]
pub struct AnnouncementForm {
    #[serde(default)]
    announcement: String,
}

pub fn router(state: SharedState, max_upload_bytes: usize) -> Router {
    let admin = Router::new()
        .route("/admin", get(admin_page))
        .route("/admin/banner", post(upload_banner))
        .route("/admin/announcement", post(save_announcement))
        .route("/admin/dataset", post(upload_dataset))
        .route("/admin/dataset.xlsx", get(download_xlsx))
        .route("/admin/dataset.csv", get(download_csv))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_admin,
        ));

    Router::new()
        .route("/", get(dashboard))
        .route("/info", get(info_page))
        .route("/banner.jpg", get(serve_banner))
        .route("/charts/top.png", get(top_chart))
        .route("/charts/trend.png", get(trend_chart))
        .route("/api/periods", get(api_periods))
        .route("/api/summary", get(api_summary))
        .route("/login", get(auth::serve_login_page).post(auth::handle_login))
        .route("/logout", post(auth::handle_logout))
        .merge(admin)
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let state = Arc::new(AppState::new(&config)?);
    if !state.auth.enabled() {
        tracing::warn!("no admin password configured; admin pages are open");
    }
    let app = router(state, config.max_upload_bytes);

    let listener = TcpListener::bind(config.addr).await?;
    tracing::info!(
        addr = %config.addr,
        data_dir = %config.data_dir.display(),
        "listening"
    );
    axum::serve(listener, app).await?;

    Ok(())
}

// ─── Dashboard Umum ──────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct SelectOption {
    value: String,
    selected: bool,
}

#[derive(Debug, Default, Serialize)]
struct DashboardView {
    today: String,
    missing_data: bool,
    error: Option<String>,
    empty_warning: Option<&'static str>,
    last_updated: Option<String>,
    skipped_rows: usize,
    years: Vec<SelectOption>,
    months: Vec<SelectOption>,
    summary: Option<PeriodSummary>,
    top_chart_url: String,
    trend_chart_url: String,
}

async fn dashboard(
    State(state): State<SharedState>,
    Query(query): Query<PeriodQuery>,
) -> Result<Html<String>, AppError> {
    let mut view = DashboardView {
        today: format_long_date(&Local::now()),
        ..DashboardView::default()
    };

    match state.store.load_dataset() {
        Ok(Some(dataset)) => fill_dashboard(&state, &dataset, &query, &mut view)?,
        Ok(None) => view.missing_data = true,
        Err(e @ (AppError::MissingColumns(_) | AppError::EmptyFile)) => {
            view.error = Some(e.to_string())
        }
        Err(e) => return Err(e),
    }

    state.pages.render("dashboard", &view)
}

fn fill_dashboard(
    state: &AppState,
    dataset: &Dataset,
    query: &PeriodQuery,
    view: &mut DashboardView,
) -> Result<(), AppError> {
    let (year, month) = query.selection();
    let Some(period) = resolve_period(dataset, year, month) else {
        view.empty_warning = Some(EMPTY_PERIOD_WARNING);
        return Ok(());
    };

    view.last_updated = state
        .store
        .dataset_modified()?
        .map(|t| format_timestamp(&t));
    view.skipped_rows = dataset.warnings.len();
    view.years = available_years(&dataset.records)
        .into_iter()
        .map(|y| SelectOption {
            selected: y == period.year,
            value: y.to_string(),
        })
        .collect();
    view.months = available_months(&dataset.records)
        .into_iter()
        .map(|m| SelectOption {
            selected: m == period.month,
            value: m,
        })
        .collect();

    let params = format!(
        "year={}&month={}",
        period.year,
        urlencoding::encode(&period.month)
    );
    view.top_chart_url = format!("/charts/top.png?{}", params);
    view.trend_chart_url = format!("/charts/trend.png?{}", params);
    view.summary = Some(summarize(dataset, &period));
    Ok(())
}

fn period_summary(state: &AppState, query: &PeriodQuery) -> Result<PeriodSummary, AppError> {
    let dataset = require_dataset(state)?;
    let (year, month) = query.selection();
    let period = resolve_period(&dataset, year, month)
        .ok_or_else(|| AppError::NotFound(EMPTY_PERIOD_WARNING.to_string()))?;
    Ok(summarize(&dataset, &period))
}

fn require_dataset(state: &AppState) -> Result<Dataset, AppError> {
    state
        .store
        .load_dataset()?
        .ok_or_else(|| AppError::NotFound(DATASET_FILE.to_string()))
}

// ─── Charts ──────────────────────────────────────────────────────────────────

fn png_response(png: Vec<u8>) -> Response {
    (
        [
            (header::CONTENT_TYPE, "image/png"),
            (header::CACHE_CONTROL, "no-store"),
        ],
        png,
    )
        .into_response()
}

async fn top_chart(
    State(state): State<SharedState>,
    Query(query): Query<PeriodQuery>,
) -> Result<Response, AppError> {
    let summary = period_summary(&state, &query)?;
    if summary.top.is_empty() {
        return Err(AppError::NotFound(EMPTY_PERIOD_WARNING.to_string()));
    }
    let title = format!(
        "Top 10 Penyakit - {} {}",
        summary.period.month, summary.period.year
    );
    let png = graph::render_top_chart(&summary.top, &ChartOptions::titled(title))?;
    Ok(png_response(png))
}

async fn trend_chart(
    State(state): State<SharedState>,
    Query(query): Query<PeriodQuery>,
) -> Result<Response, AppError> {
    let summary = period_summary(&state, &query)?;
    if summary.top.is_empty() {
        return Err(AppError::NotFound(EMPTY_PERIOD_WARNING.to_string()));
    }
    let title = format!(
        "Tren Kasus Penyakit Sepanjang Tahun {}",
        summary.period.year
    );
    let png = graph::render_trend_chart(
        &summary.trend,
        &summary.trend_months,
        &ChartOptions::titled(title),
    )?;
    Ok(png_response(png))
}

// ─── Dashboard Admin ─────────────────────────────────────────────────────────

#[derive(Debug, Default, Serialize)]
struct AdminView {
    auth_enabled: bool,
    success: Option<String>,
    error: Option<String>,
    show_banner: bool,
    announcement: String,
    has_data: bool,
    preview: Vec<CaseRecord>,
    preview_count: usize,
    preview_total: usize,
    preview_headers: Vec<&'static str>,
    warnings: Vec<ParseWarning>,
}

fn admin_view(state: &AppState) -> Result<AdminView, AppError> {
    Ok(AdminView {
        auth_enabled: state.auth.enabled(),
        announcement: state.store.load_announcement()?,
        has_data: state.store.dataset_path().is_file(),
        show_banner: state.store.banner_path().is_file(),
        preview_headers: REQUIRED_COLUMNS.to_vec(),
        ..AdminView::default()
    })
}

/// Client-side mistakes are shown on the admin page; anything else propagates.
fn admin_failure(state: &AppState, mut view: AdminView, err: AppError) -> Result<Response, AppError> {
    if !err.is_client_error() {
        return Err(err);
    }
    tracing::warn!(error = %err, "admin upload rejected");
    view.error = Some(err.to_string());
    Ok((StatusCode::BAD_REQUEST, state.pages.render("admin", &view)?).into_response())
}

async fn admin_page(State(state): State<SharedState>) -> Result<Html<String>, AppError> {
    state.pages.render("admin", &admin_view(&state)?)
}

struct Upload {
    file_name: Option<String>,
    bytes: Vec<u8>,
}

async fn read_upload(
    multipart: &mut Multipart,
    field_name: &str,
    allowed: &[&str],
) -> Result<Upload, AppError> {
    let bad = |e: axum::extract::multipart::MultipartError| AppError::BadRequest(e.to_string());

    while let Some(field) = multipart.next_field().await.map_err(bad)? {
        if field.name() != Some(field_name) {
            continue;
        }
        let file_name = field.file_name().map(str::to_string);
        let bytes = field.bytes().await.map_err(bad)?.to_vec();
        if bytes.is_empty() {
            break;
        }
        let upload = Upload { file_name, bytes };
        check_extension(&upload, allowed)?;
        return Ok(upload);
    }

    Err(AppError::BadRequest(
        "Tidak ada file yang diunggah.".to_string(),
    ))
}

fn check_extension(upload: &Upload, allowed: &[&str]) -> Result<(), AppError> {
    let Some(name) = upload.file_name.as_deref().filter(|n| !n.is_empty()) else {
        return Ok(());
    };
    let ext = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();
    if allowed.contains(&ext.as_str()) {
        Ok(())
    } else {
        Err(AppError::BadRequest(format!(
            "Jenis file tidak didukung: {} (hanya {})",
            name,
            allowed.join(", ")
        )))
    }
}

async fn upload_banner(
    State(state): State<SharedState>,
    mut multipart: Multipart,
) -> Result<Response, AppError> {
    let mut view = admin_view(&state)?;

    let saved = match read_upload(&mut multipart, "banner", BANNER_EXTENSIONS).await {
        Ok(upload) => state.store.save_banner(&upload.bytes),
        Err(e) => Err(e),
    };
    if let Err(e) = saved {
        return admin_failure(&state, view, e);
    }

    view.show_banner = true;
    view.success = Some(
        "Banner berhasil diperbarui! Coba buka Pusat Informasi untuk melihat hasilnya.".to_string(),
    );
    Ok(state.pages.render("admin", &view)?.into_response())
}

async fn save_announcement(
    State(state): State<SharedState>,
    Form(form): Form<AnnouncementForm>,
) -> Result<Html<String>, AppError> {
    state.store.save_announcement(&form.announcement)?;

    let mut view = admin_view(&state)?;
    view.success = Some(if view.announcement.is_empty() {
        "Pengumuman dikosongkan.".to_string()
    } else {
        "Pengumuman berhasil disimpan! Akan tampil di Pusat Informasi.".to_string()
    });
    state.pages.render("admin", &view)
}

async fn upload_dataset(
    State(state): State<SharedState>,
    mut multipart: Multipart,
) -> Result<Response, AppError> {
    let mut view = admin_view(&state)?;

    let saved = match read_upload(&mut multipart, "dataset", DATASET_EXTENSIONS).await {
        Ok(upload) => state.store.save_dataset(&upload.bytes),
        Err(e) => Err(e),
    };
    let dataset = match saved {
        Ok(dataset) => dataset,
        Err(e) => return admin_failure(&state, view, e),
    };

    view.has_data = true;
    view.success = Some(
        "Data berhasil dimuat dan disimpan! Dashboard Umum akan menampilkan data terbaru secara otomatis."
            .to_string(),
    );
    view.preview_total = dataset.records.len();
    view.preview = dataset.records.into_iter().take(PREVIEW_ROWS).collect();
    view.preview_count = view.preview.len();
    view.warnings = dataset.warnings;
    Ok(state.pages.render("admin", &view)?.into_response())
}

fn attachment(bytes: Vec<u8>, mime: &'static str, filename: &str) -> Response {
    (
        [
            (header::CONTENT_TYPE, mime.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        bytes,
    )
        .into_response()
}

async fn download_xlsx(State(state): State<SharedState>) -> Result<Response, AppError> {
    let dataset = require_dataset(&state)?;
    let bytes = downloader::to_xlsx(&dataset)?;
    Ok(attachment(bytes, XLSX_MIME, XLSX_FILENAME))
}

async fn download_csv(State(state): State<SharedState>) -> Result<Response, AppError> {
    let dataset = require_dataset(&state)?;
    let bytes = downloader::to_csv(&dataset)?;
    Ok(attachment(bytes, "text/csv; charset=utf-8", DATASET_FILE))
}

// ─── Pusat Informasi ─────────────────────────────────────────────────────────

async fn info_page(State(state): State<SharedState>) -> Result<Html<String>, AppError> {
    let announcement = state.store.load_announcement()?;
    state.pages.render(
        "info",
        &json!({
            "has_banner": state.store.banner_path().is_file(),
            "announcement": announcement,
            "resources": RESOURCES,
        }),
    )
}

async fn serve_banner(State(state): State<SharedState>) -> Result<Response, AppError> {
    let jpeg = state
        .store
        .load_banner()?
        .ok_or_else(|| AppError::NotFound("banner".to_string()))?;
    Ok((
        [
            (header::CONTENT_TYPE, "image/jpeg"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        jpeg,
    )
        .into_response())
}

// ─── JSON API ────────────────────────────────────────────────────────────────

async fn api_periods(State(state): State<SharedState>) -> Result<Json<serde_json::Value>, AppError> {
    let dataset = state.store.load_dataset()?;
    let records: &[CaseRecord] = dataset
        .as_ref()
        .map(|d| d.records.as_slice())
        .unwrap_or_default();
    Ok(Json(json!({
        "has_data": dataset.is_some(),
        "years": available_years(records),
        "months": available_months(records),
        "last_updated": state.store.dataset_modified()?.map(|t| t.to_rfc3339()),
    })))
}

async fn api_summary(
    State(state): State<SharedState>,
    Query(query): Query<PeriodQuery>,
) -> Result<Json<PeriodSummary>, AppError> {
    Ok(Json(period_summary(&state, &query)?))
}
