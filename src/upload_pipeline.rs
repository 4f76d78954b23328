use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;
use sha1::{Digest, Sha1};
use std::path::Path;
use uuid::Uuid;

use crate::app_config::UploadConfig;
use crate::app_error::AppError;
use crate::row_sanitizer::{sanitize_rows, CompletenessPolicy};
use crate::row_store::RowStore;
use crate::sheet_ingest::{parse_upload, read_upload_bytes};
use crate::sheet_rows::{CellValue, RowBatch, SheetFormat, SheetRow};
use crate::sheet_schema::validate_headers;

const PREVIEW_ROW_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UploadReceipt {
    pub batch_id: String,
    pub source_file: String,
    pub format: SheetFormat,
    pub digest: String,
    pub row_count: usize,
    pub dropped_blank_rows: usize,
    pub incomplete_rows: usize,
    pub replaced_batch_id: Option<String>,
    pub headers: Vec<String>,
    pub preview_rows: Vec<Vec<CellValue>>,
}

fn content_digest(bytes: &[u8]) -> String {
    let mut hasher = Sha1::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

fn source_file_name(file_name: &str) -> String {
    Path::new(file_name.trim())
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| file_name.trim().to_string())
}

/// Runs parse, schema check and sanitizing. Nothing is committed here.
pub fn ingest_upload(
    file_name: &str,
    bytes: &[u8],
    limits: &UploadConfig,
) -> Result<(RowBatch, usize), AppError> {
    let raw = parse_upload(file_name, bytes, limits)?;
    let columns = validate_headers(&raw.headers)?;
    let policy = CompletenessPolicy::for_format(raw.format, limits.max_invalid_row_ratio);
    let sanitized = sanitize_rows(raw.rows, raw.headers.len(), policy)?;

    let rows = sanitized
        .rows
        .iter()
        .map(|cells| SheetRow::from_cells(cells, &raw.headers, &columns))
        .collect::<Vec<_>>();

    let batch = RowBatch {
        batch_id: Uuid::new_v4().to_string(),
        source_file: source_file_name(file_name),
        format: Some(raw.format),
        digest: content_digest(bytes),
        headers: raw.headers,
        columns,
        rows,
        dropped_blank_rows: sanitized.dropped_blank_rows,
        accepted_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
    };
    Ok((batch, sanitized.incomplete_rows))
}

pub fn upload_sheet(
    store: &RowStore,
    limits: &UploadConfig,
    file_name: &str,
    bytes: &[u8],
) -> Result<UploadReceipt, AppError> {
    let (batch, incomplete_rows) = match ingest_upload(file_name, bytes, limits) {
        Ok(v) => v,
        Err(err) => {
            tracing::warn!(file = file_name, category = err.category(), "upload rejected: {err}");
            return Err(err);
        }
    };

    let format = batch.format.unwrap_or(SheetFormat::DelimitedText);
    let preview_rows = (0..batch.len().min(PREVIEW_ROW_LIMIT))
        .filter_map(|idx| batch.table_cells(idx))
        .collect::<Vec<_>>();
    let mut receipt = UploadReceipt {
        batch_id: batch.batch_id.clone(),
        source_file: batch.source_file.clone(),
        format,
        digest: batch.digest.clone(),
        row_count: batch.len(),
        dropped_blank_rows: batch.dropped_blank_rows,
        incomplete_rows,
        replaced_batch_id: None,
        headers: batch.headers.clone(),
        preview_rows,
    };

    let previous = store.replace(batch);
    if !previous.batch_id.is_empty() {
        receipt.replaced_batch_id = Some(previous.batch_id.clone());
    }
    tracing::info!(
        file = %receipt.source_file,
        rows = receipt.row_count,
        dropped = receipt.dropped_blank_rows,
        "upload accepted"
    );
    Ok(receipt)
}

pub fn upload_sheet_bytes(
    store: &RowStore,
    limits: &UploadConfig,
    file_name: &str,
    bytes: &[u8],
) -> Result<Value, String> {
    let receipt = upload_sheet(store, limits, file_name, bytes)?;
    serde_json::to_value(receipt).map_err(|e| format!("serialize upload receipt failed: {e}"))
}

pub fn upload_sheet_at_path(
    store: &RowStore,
    limits: &UploadConfig,
    file_path: &Path,
) -> Result<Value, String> {
    let bytes = read_upload_bytes(file_path, limits)?;
    let file_name = file_path.to_string_lossy().to_string();
    upload_sheet_bytes(store, limits, &file_name, &bytes)
}

pub fn resolve_source_path_text(source_path: Option<String>) -> Result<String, String> {
    let path = source_path.unwrap_or_default();
    let path = path.trim().to_string();
    if path.is_empty() {
        return Err("source_path is required".to_string());
    }
    Ok(path)
}
