use thiserror::Error;

use crate::loader::REQUIRED_COLUMNS;

/// Every failure the dashboard can report to a visitor or an admin.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Carries the columns that were absent; the message always lists the full
    /// required set so the admin knows what the file must contain.
    #[error("File CSV harus memiliki kolom: {}", REQUIRED_COLUMNS.join(", "))]
    MissingColumns(Vec<String>),

    #[error("File kosong atau tanpa header")]
    EmptyFile,

    #[cfg(feature = "web")]
    #[error("Gambar tidak valid: {0}")]
    Image(#[from] image::ImageError),

    #[error("Gagal membuat grafik: {0}")]
    Chart(String),

    #[cfg(feature = "web")]
    #[error("Gagal membuat file Excel: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[cfg(feature = "web")]
    #[error("Template error: {0}")]
    Template(#[from] handlebars::RenderError),

    #[cfg(feature = "web")]
    #[error("Template syntax error: {0}")]
    TemplateSyntax(#[from] handlebars::TemplateError),

    #[error("Autentikasi gagal: {0}")]
    Auth(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("Tidak ditemukan: {0}")]
    NotFound(String),
}

impl AppError {
    /// Errors caused by what the visitor sent rather than by the server.
    pub fn is_client_error(&self) -> bool {
        match self {
            AppError::MissingColumns(_)
            | AppError::EmptyFile
            | AppError::Csv(_)
            | AppError::BadRequest(_) => true,
            #[cfg(feature = "web")]
            AppError::Image(_) => true,
            _ => false,
        }
    }
}

#[cfg(feature = "web")]
impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        use axum::http::StatusCode;

        let status = match &self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            e if e.is_client_error() => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::warn!(error = %self, "request rejected");
        }
        (status, self.to_string()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_columns_message_lists_all_required() {
        let err = AppError::MissingColumns(vec!["Bulan".to_string()]);
        assert_eq!(
            err.to_string(),
            "File CSV harus memiliki kolom: Tahun, Bulan, Penyakit, Jumlah Kasus"
        );
    }

    #[test]
    fn test_config_error_is_not_client_error() {
        assert!(!AppError::Config("bad".to_string()).is_client_error());
        assert!(AppError::BadRequest("bad".to_string()).is_client_error());
    }
}
