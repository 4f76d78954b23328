use calamine::{open_workbook_auto_from_rs, Data, Reader};
use std::io::Cursor;
use std::path::Path;

use crate::app_config::UploadConfig;
use crate::app_error::AppError;
use crate::sheet_rows::{CellValue, RawSheet, SheetFormat};
use crate::sheet_schema::trim_cell;

pub fn file_extension(file_name: &str) -> String {
    Path::new(file_name.trim())
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase()
}

/// Size and type gate applied before any parsing.
pub fn check_upload(
    file_name: &str,
    size: u64,
    limits: &UploadConfig,
) -> Result<SheetFormat, AppError> {
    if size > limits.max_file_bytes {
        return Err(AppError::FileTooLarge {
            size,
            limit_mib: limits.limit_mib(),
        });
    }
    let ext = file_extension(file_name);
    let format =
        SheetFormat::from_extension(&ext).ok_or_else(|| AppError::UnsupportedFileType(ext))?;
    if size == 0 {
        return Err(AppError::EmptyFile);
    }
    Ok(format)
}

pub fn read_upload_bytes(path: &Path, limits: &UploadConfig) -> Result<Vec<u8>, AppError> {
    let meta = std::fs::metadata(path).map_err(|e| AppError::ReadFailure(e.to_string()))?;
    if !meta.is_file() {
        return Err(AppError::ReadFailure(format!(
            "not a file: {}",
            path.to_string_lossy()
        )));
    }
    if meta.len() > limits.max_file_bytes {
        return Err(AppError::FileTooLarge {
            size: meta.len(),
            limit_mib: limits.limit_mib(),
        });
    }
    std::fs::read(path).map_err(|e| AppError::ReadFailure(e.to_string()))
}

pub fn read_csv_sheet(bytes: &[u8]) -> Result<RawSheet, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);

    let headers = reader
        .headers()
        .map_err(|e| AppError::MalformedFile(format!("CSV parsing error: {e}")))?
        .iter()
        .map(trim_cell)
        .collect::<Vec<_>>();

    let mut rows = Vec::new();
    for rec in reader.records() {
        let rec = rec.map_err(|e| AppError::MalformedFile(format!("CSV parsing error: {e}")))?;
        rows.push(rec.iter().map(CellValue::text).collect());
    }

    if rows.is_empty() {
        return Err(AppError::NoDataFound);
    }
    Ok(RawSheet {
        format: SheetFormat::DelimitedText,
        headers,
        rows,
    })
}

fn cell_value(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::default(),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::String(s) => CellValue::Text(s.clone()),
        other => CellValue::Text(other.to_string()),
    }
}

pub fn read_workbook_sheet(bytes: &[u8]) -> Result<RawSheet, AppError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| AppError::MalformedFile(format!("could not open workbook: {e}")))?;
    let sheet_names = workbook.sheet_names().to_owned();
    let first_sheet = sheet_names.first().cloned().ok_or(AppError::NoWorksheets)?;

    let range = workbook
        .worksheet_range(&first_sheet)
        .map_err(|e| AppError::MalformedFile(format!("could not read worksheet: {e}")))?;

    if range.start().is_some_and(|(row, _)| row > 0) {
        return Err(AppError::NoHeaderRow);
    }

    let mut grid = range
        .rows()
        .map(|row| row.iter().map(cell_value).collect::<Vec<_>>());
    let header_cells = grid.next().ok_or(AppError::EmptyWorksheet)?;
    if header_cells.iter().all(|c| c.to_string().trim().is_empty()) {
        return Err(AppError::NoHeaderRow);
    }

    let headers = header_cells
        .iter()
        .map(|c| trim_cell(&c.to_string()))
        .collect::<Vec<_>>();
    Ok(RawSheet {
        format: SheetFormat::SpreadsheetBinary,
        headers,
        rows: grid.collect(),
    })
}

/// Parses an upload into a positional grid, dispatching on the file extension.
pub fn parse_upload(
    file_name: &str,
    bytes: &[u8],
    limits: &UploadConfig,
) -> Result<RawSheet, AppError> {
    let format = check_upload(file_name, bytes.len() as u64, limits)?;
    match format {
        SheetFormat::DelimitedText => read_csv_sheet(bytes),
        SheetFormat::SpreadsheetBinary => read_workbook_sheet(bytes),
    }
}
