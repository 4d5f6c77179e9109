#![cfg(feature = "web")]
//! Server-side HTML rendering.
//!
//! Templates live in `src/static` and are compiled into the binary. Every
//! page fills the `layout` partial block, which carries the header, the
//! navigation menu and the footer.

use axum::response::Html;
use chrono::{DateTime, Datelike, TimeZone, Timelike};
use handlebars::Handlebars;
use serde::Serialize;

use crate::error::AppError;

pub const APP_TITLE: &str =
    "Sistem Informasi 10 Kasus Penyakit Terbesar di Desa Lingkar Tambang";

const HARI: [&str; 7] = ["Senin", "Selasa", "Rabu", "Kamis", "Jumat", "Sabtu", "Minggu"];
const BULAN: [&str; 12] = [
    "Januari", "Februari", "Maret", "April", "Mei", "Juni", "Juli", "Agustus", "September",
    "Oktober", "November", "Desember",
];

/// A reading resource listed on the information page.
#[derive(Debug, Clone, Serialize)]
pub struct Resource {
    pub title: &'static str,
    pub description: &'static str,
    pub link: &'static str,
}

pub const RESOURCES: [Resource; 3] = [
    Resource {
        title: "Buku Saku: Masyarakat Sehat Lingkar Tambang",
        description: "Panduan ringkas untuk masyarakat sekitar tambang agar hidup sehat dan menjaga lingkungan.",
        link: "https://www.canva.com/design/DAGs00R5cRU/hQGZLlyvVXjpyCOw18do1Q/edit?utm_content=DAGs00R5cRU&utm_campaign=designshare&utm_medium=link2&utm_source=sharebutton",
    },
    Resource {
        title: "Pedoman Pencegahan dan Pengendalian ISPA",
        description: "Panduan dari Kementerian Kesehatan mengenai tata laksana ISPA.",
        link: "https://pusdatin.kemkes.go.id/resources/download/pusdatin/profil-kesehatan-indonesia/Profil-Kesehatan-Indonesia-2022.pdf",
    },
    Resource {
        title: "Pedoman Pengendalian Hipertensi",
        description: "Edukasi dan panduan pengendalian tekanan darah tinggi.",
        link: "https://perki.or.id/wp-content/uploads/2021/12/Pedoman-Hipertensi-PERKI-2021.pdf",
    },
];

pub struct Pages {
    registry: Handlebars<'static>,
}

impl Pages {
    pub fn new() -> Result<Self, AppError> {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(false);
        registry.register_partial("layout", include_str!("./static/layout.hbs"))?;
        registry.register_template_string("dashboard", include_str!("./static/dashboard.hbs"))?;
        registry.register_template_string("admin", include_str!("./static/admin.hbs"))?;
        registry.register_template_string("info", include_str!("./static/info.hbs"))?;
        registry.register_template_string("login", include_str!("./static/login.hbs"))?;
        Ok(Self { registry })
    }

    pub fn render<T: Serialize>(&self, name: &str, data: &T) -> Result<Html<String>, AppError> {
        Ok(Html(self.registry.render(name, data)?))
    }
}

/// `Senin, 14 Oktober 2026`
pub fn format_long_date<Tz: TimeZone>(dt: &DateTime<Tz>) -> String {
    format!(
        "{}, {:02} {} {}",
        HARI[dt.weekday().num_days_from_monday() as usize],
        dt.day(),
        BULAN[dt.month0() as usize],
        dt.year()
    )
}

/// `14 Oktober 2026, 09:05:03`
pub fn format_timestamp<Tz: TimeZone>(dt: &DateTime<Tz>) -> String {
    format!(
        "{:02} {} {}, {:02}:{:02}:{:02}",
        dt.day(),
        BULAN[dt.month0() as usize],
        dt.year(),
        dt.hour(),
        dt.minute(),
        dt.second()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    #[test]
    fn test_format_long_date() {
        let dt = Utc.with_ymd_and_hms(2026, 10, 14, 9, 5, 3).unwrap();
        assert_eq!(format_long_date(&dt), "Rabu, 14 Oktober 2026");
    }

    #[test]
    fn test_format_timestamp() {
        let dt = Utc.with_ymd_and_hms(2024, 1, 2, 9, 5, 3).unwrap();
        assert_eq!(format_timestamp(&dt), "02 Januari 2024, 09:05:03");
    }

    #[test]
    fn test_templates_compile_and_render() {
        let pages = Pages::new().unwrap();
        let html = pages
            .render("login", &json!({ "error": "Kata sandi salah." }))
            .unwrap()
            .0;
        assert!(html.contains("Kata sandi salah."));
        assert!(html.contains(APP_TITLE));
    }

    #[test]
    fn test_info_escapes_announcement() {
        let pages = Pages::new().unwrap();
        let html = pages
            .render(
                "info",
                &json!({ "announcement": "<script>x</script>", "resources": RESOURCES }),
            )
            .unwrap()
            .0;
        assert!(!html.contains("<script>x</script>"));
        assert!(html.contains("&lt;script&gt;"));
    }
}
