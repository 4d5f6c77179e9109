use std::collections::HashMap;
use std::io::Read;

use serde::Serialize;

use crate::error::AppError;
use crate::record::CaseRecord;

/// Columns every uploaded CSV must carry, in canonical order.
pub const REQUIRED_COLUMNS: [&str; 4] = ["Tahun", "Bulan", "Penyakit", "Jumlah Kasus"];

const COL_YEAR: &str = "Tahun";
const COL_MONTH: &str = "Bulan";
const COL_DISEASE: &str = "Penyakit";
const COL_COUNT: &str = "Jumlah Kasus";

/// Maps column names to their index in a CSV record.
pub struct ColumnMap {
    indices: HashMap<String, usize>,
    headers: Vec<String>,
}

impl ColumnMap {
    /// Header fields are trimmed, and a leading UTF-8 BOM is dropped.
    pub fn from_headers(headers: &csv::StringRecord) -> Self {
        let mut indices = HashMap::new();
        let mut header_list = Vec::new();
        for (i, field) in headers.iter().enumerate() {
            let name = field.trim_start_matches('\u{feff}').trim().to_string();
            indices.entry(name.clone()).or_insert(i);
            header_list.push(name);
        }
        ColumnMap {
            indices,
            headers: header_list,
        }
    }

    pub fn get<'a>(&self, record: &'a csv::StringRecord, col: &str) -> Option<&'a str> {
        self.indices.get(col).and_then(|&i| record.get(i))
    }

    pub fn has(&self, col: &str) -> bool {
        self.indices.contains_key(col)
    }

    pub fn all_headers(&self) -> &[String] {
        &self.headers
    }
}

/// Fails with `AppError::MissingColumns` naming every absent required column.
pub fn validate_columns(col_map: &ColumnMap) -> Result<(), AppError> {
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|&&c| !col_map.has(c))
        .map(|c| c.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(AppError::MissingColumns(missing))
    }
}

/// A row that could not be turned into a `CaseRecord`.
#[derive(Debug, Clone, Serialize)]
pub struct ParseWarning {
    /// 1-based line in the file, header included.
    pub line: usize,
    pub message: String,
}

/// All records of a CSV file, in file order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Dataset {
    pub headers: Vec<String>,
    pub records: Vec<CaseRecord>,
    pub warnings: Vec<ParseWarning>,
}

impl Dataset {
    pub fn from_records(records: Vec<CaseRecord>) -> Self {
        Self {
            headers: REQUIRED_COLUMNS.iter().map(|c| c.to_string()).collect(),
            records,
            warnings: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Parse a dataset from raw CSV bytes (an upload or the stored file).
pub fn parse_dataset(bytes: &[u8]) -> Result<Dataset, AppError> {
    parse_dataset_reader(bytes)
}

/// Core parsing logic; accepts any `Read` source.
pub fn parse_dataset_reader<R: Read>(reader: R) -> Result<Dataset, AppError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    if headers.is_empty() || headers.iter().all(|h| h.trim().is_empty()) {
        return Err(AppError::EmptyFile);
    }
    let col_map = ColumnMap::from_headers(&headers);
    validate_columns(&col_map)?;

    let mut records = Vec::new();
    let mut warnings = Vec::new();

    for (idx, result) in rdr.records().enumerate() {
        // csv skips blank lines, so prefer its own position; +2 covers the
        // header row and 1-based numbering
        let position = match &result {
            Ok(record) => record.position(),
            Err(err) => err.position(),
        };
        let line = position.map_or(idx + 2, |p| p.line() as usize);
        match result {
            Ok(record) => {
                if record.iter().all(|f| f.is_empty()) {
                    continue;
                }
                match parse_record(&col_map, &record) {
                    Ok(r) => records.push(r),
                    Err(message) => warnings.push(ParseWarning { line, message }),
                }
            }
            Err(err) => warnings.push(ParseWarning {
                line,
                message: err.to_string(),
            }),
        }
    }

    if !warnings.is_empty() {
        tracing::warn!(skipped = warnings.len(), "rows skipped while reading dataset");
    }

    Ok(Dataset {
        headers: col_map.all_headers().to_vec(),
        records,
        warnings,
    })
}

fn parse_record(col_map: &ColumnMap, record: &csv::StringRecord) -> Result<CaseRecord, String> {
    let field = |col: &str| col_map.get(record, col).unwrap_or("").trim();

    let year = parse_whole_number(field(COL_YEAR))
        .and_then(|y| i32::try_from(y).ok())
        .ok_or_else(|| format!("{} tidak valid: '{}'", COL_YEAR, field(COL_YEAR)))?;
    let month = field(COL_MONTH);
    if month.is_empty() {
        return Err(format!("{} kosong", COL_MONTH));
    }
    let disease = field(COL_DISEASE);
    if disease.is_empty() {
        return Err(format!("{} kosong", COL_DISEASE));
    }
    let case_count = parse_whole_number(field(COL_COUNT))
        .ok_or_else(|| format!("{} tidak valid: '{}'", COL_COUNT, field(COL_COUNT)))?;

    Ok(CaseRecord {
        year,
        month: month.to_string(),
        disease: disease.to_string(),
        case_count,
    })
}

/// Integers, or floats without a fractional part ("2024.0" as spreadsheets
/// tend to export them).
fn parse_whole_number(s: &str) -> Option<i64> {
    if let Ok(n) = s.parse::<i64>() {
        return Some(n);
    }
    let f = s.parse::<f64>().ok()?;
    (f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64).then_some(f as i64)
}

/// Canonical CSV with the four required columns.
pub fn write_dataset_csv(dataset: &Dataset) -> Result<Vec<u8>, AppError> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(REQUIRED_COLUMNS)?;
    for r in &dataset.records {
        wtr.write_record([
            r.year.to_string(),
            r.month.clone(),
            r.disease.clone(),
            r.case_count.to_string(),
        ])?;
    }
    wtr.into_inner()
        .map_err(|e| AppError::Io(e.into_error()))
}
