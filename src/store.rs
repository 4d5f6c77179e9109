use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tempfile::NamedTempFile;

use crate::error::AppError;
use crate::loader::{Dataset, parse_dataset};

pub const DATASET_FILE: &str = "data_penyakit.csv";
pub const ANNOUNCEMENT_FILE: &str = "pengumuman.txt";
pub const BANNER_FILE: &str = "banner.jpg";

/// The three files the dashboard keeps under its data directory.
///
/// Every save overwrites the whole file; there is no history and no locking,
/// so concurrent uploads resolve as last-write-wins.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn dataset_path(&self) -> PathBuf {
        self.dir.join(DATASET_FILE)
    }

    pub fn announcement_path(&self) -> PathBuf {
        self.dir.join(ANNOUNCEMENT_FILE)
    }

    pub fn banner_path(&self) -> PathBuf {
        self.dir.join(BANNER_FILE)
    }

    /// `None` when nothing has been uploaded yet.
    pub fn load_dataset(&self) -> Result<Option<Dataset>, AppError> {
        match read_optional(&self.dataset_path())? {
            Some(bytes) => parse_dataset(&bytes).map(Some),
            None => Ok(None),
        }
    }

    /// Validate an uploaded CSV and, if it has the required columns, replace
    /// the stored file with it. Nothing is written when validation fails.
    pub fn save_dataset(&self, bytes: &[u8]) -> Result<Dataset, AppError> {
        let dataset = parse_dataset(bytes)?;
        self.replace(&self.dataset_path(), bytes)?;
        tracing::info!(
            records = dataset.records.len(),
            skipped = dataset.warnings.len(),
            "dataset replaced"
        );
        Ok(dataset)
    }

    pub fn dataset_modified(&self) -> Result<Option<DateTime<Local>>, AppError> {
        match fs::metadata(self.dataset_path()) {
            Ok(meta) => Ok(Some(DateTime::<Local>::from(meta.modified()?))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Empty string when no announcement was ever saved.
    pub fn load_announcement(&self) -> Result<String, AppError> {
        Ok(read_optional(&self.announcement_path())?
            .map(|bytes| String::from_utf8_lossy(&bytes).trim().to_string())
            .unwrap_or_default())
    }

    /// Stores the trimmed text; an empty text clears the announcement.
    pub fn save_announcement(&self, text: &str) -> Result<(), AppError> {
        let text = text.trim();
        self.replace(&self.announcement_path(), text.as_bytes())?;
        tracing::info!(chars = text.chars().count(), "announcement saved");
        Ok(())
    }

    pub fn load_banner(&self) -> Result<Option<Vec<u8>>, AppError> {
        read_optional(&self.banner_path())
    }

    /// Decode an uploaded JPG/PNG and store it re-encoded as JPEG.
    #[cfg(feature = "web")]
    pub fn save_banner(&self, bytes: &[u8]) -> Result<(), AppError> {
        let jpeg = encode_banner_jpeg(bytes)?;
        self.replace(&self.banner_path(), &jpeg)?;
        tracing::info!(bytes = jpeg.len(), "banner replaced");
        Ok(())
    }

    // Write to a sibling temp file, then rename over the target.
    fn replace(&self, path: &Path, contents: &[u8]) -> Result<(), AppError> {
        fs::create_dir_all(&self.dir)?;
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(contents)?;
        tmp.flush()?;
        tmp.persist(path).map_err(|e| AppError::Io(e.error))?;
        Ok(())
    }
}

fn read_optional(path: &Path) -> Result<Option<Vec<u8>>, AppError> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

#[cfg(feature = "web")]
const BANNER_JPEG_QUALITY: u8 = 90;

#[cfg(feature = "web")]
pub fn encode_banner_jpeg(bytes: &[u8]) -> Result<Vec<u8>, AppError> {
    use image::{DynamicImage, ImageOutputFormat};
    use std::io::Cursor;

    let decoded = image::load_from_memory(bytes)?;
    // JPEG has no alpha channel
    let rgb = DynamicImage::ImageRgb8(decoded.to_rgb8());
    let mut out = Cursor::new(Vec::new());
    rgb.write_to(&mut out, ImageOutputFormat::Jpeg(BANNER_JPEG_QUALITY))?;
    Ok(out.into_inner())
}
