use serde_json::{json, Value};
use std::path::Path;

use crate::app_error::AppError;
use crate::sales_analytics::{derive_rows, DerivedRow};
use crate::sheet_rows::{CellValue, RowBatch};

const EXPORT_HEADER: [&str; 4] = ["name", "Sales", "Profit", "Expenses"];

fn number_text(value: f64) -> String {
    CellValue::Number(value).to_string()
}

pub fn derived_rows_to_csv(rows: &[DerivedRow]) -> Result<String, AppError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(EXPORT_HEADER)
        .map_err(|e| AppError::ExportFailure(e.to_string()))?;
    for row in rows {
        writer
            .write_record([
                row.name.clone(),
                number_text(row.sales),
                number_text(row.profit),
                number_text(row.expenses),
            ])
            .map_err(|e| AppError::ExportFailure(e.to_string()))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| AppError::ExportFailure(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| AppError::ExportFailure(e.to_string()))
}

pub fn export_file_name(batch: &RowBatch) -> String {
    let stem = Path::new(&batch.source_file)
        .file_stem()
        .and_then(|s| s.to_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or("sheet");
    format!("{stem}-derived.csv")
}

pub fn export_derived_csv_payload(batch: &RowBatch) -> Result<Value, String> {
    let rows = derive_rows(&batch.rows);
    let csv = derived_rows_to_csv(&rows)?;
    Ok(json!({
        "file_name": export_file_name(batch),
        "mime_type": "text/csv",
        "row_count": rows.len(),
        "content": csv,
    }))
}
