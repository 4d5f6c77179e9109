#![cfg(feature = "web")]

use rust_xlsxwriter::{Format, FormatBorder, Workbook};

use crate::error::AppError;
use crate::loader::{Dataset, REQUIRED_COLUMNS, write_dataset_csv};

/// Sheet name of the exported workbook.
pub const SHEET_NAME: &str = "Data_Penyakit";

/// File name offered to the browser for the Excel download.
pub const XLSX_FILENAME: &str = "Data_Penyakit_Terbaru.xlsx";

pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Convert the dataset to CSV format
///
/// Always the four canonical columns, whatever extra columns the uploaded
/// file carried.
pub fn to_csv(dataset: &Dataset) -> Result<Vec<u8>, AppError> {
    write_dataset_csv(dataset)
}

/// Convert the dataset to XLSX format
///
/// One worksheet named `Data_Penyakit` with a header row followed by one
/// row per record, in file order.
///
/// # Returns
/// * `Result<Vec<u8>, AppError>` - XLSX file content as bytes or an error
pub fn to_xlsx(dataset: &Dataset) -> Result<Vec<u8>, AppError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    let header = Format::new()
        .set_bold()
        .set_background_color("1E88E5")
        .set_font_color("FFFFFF")
        .set_border(FormatBorder::Thin);

    for (c, name) in REQUIRED_COLUMNS.iter().enumerate() {
        worksheet.write_string_with_format(0, c as u16, *name, &header)?;
    }

    for (i, r) in dataset.records.iter().enumerate() {
        let row = (i + 1) as u32;
        worksheet.write_number(row, 0, r.year as f64)?;
        worksheet.write_string(row, 1, &r.month)?;
        worksheet.write_string(row, 2, &r.disease)?;
        if fits_f64(r.case_count) {
            worksheet.write_number(row, 3, r.case_count as f64)?;
        } else {
            worksheet.write_string(row, 3, &r.case_count.to_string())?;
        }
    }

    worksheet.set_column_width(2, 28)?;
    worksheet.set_column_width(3, 14)?;

    Ok(workbook.save_to_buffer()?)
}

/// Excel stores numbers as f64; beyond 2^53 integers lose digits.
fn fits_f64(n: i64) -> bool {
    n.unsigned_abs() <= 1 << 53
}
