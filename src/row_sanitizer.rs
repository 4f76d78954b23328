use crate::app_error::AppError;
use crate::sheet_rows::{CellValue, SheetFormat};

/// How incomplete rows are treated before a batch is accepted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CompletenessPolicy {
    /// Any row with a missing or empty cell counts as invalid; the whole batch is
    /// rejected once invalid rows exceed `max_invalid_ratio` of the total.
    RejectBatchOverThreshold { max_invalid_ratio: f64 },
    /// Rows whose cells are all empty are dropped one by one; partially filled rows stay.
    DropBlankRows,
}

impl CompletenessPolicy {
    pub fn for_format(format: SheetFormat, max_invalid_ratio: f64) -> Self {
        match format {
            SheetFormat::DelimitedText => {
                CompletenessPolicy::RejectBatchOverThreshold { max_invalid_ratio }
            }
            SheetFormat::SpreadsheetBinary => CompletenessPolicy::DropBlankRows,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SanitizedRows {
    pub rows: Vec<Vec<CellValue>>,
    pub dropped_blank_rows: usize,
    pub incomplete_rows: usize,
}

pub fn is_incomplete_row(cells: &[CellValue], header_width: usize) -> bool {
    if cells.len() < header_width {
        return true;
    }
    cells[..header_width].iter().any(CellValue::is_blank)
}

pub fn is_blank_row(cells: &[CellValue]) -> bool {
    cells.iter().all(CellValue::is_blank)
}

pub fn sanitize_rows(
    rows: Vec<Vec<CellValue>>,
    header_width: usize,
    policy: CompletenessPolicy,
) -> Result<SanitizedRows, AppError> {
    match policy {
        CompletenessPolicy::RejectBatchOverThreshold { max_invalid_ratio } => {
            let total = rows.len();
            let invalid = rows
                .iter()
                .filter(|r| is_incomplete_row(r, header_width))
                .count();
            if invalid as f64 > total as f64 * max_invalid_ratio {
                tracing::warn!(invalid, total, "rejecting batch with too many incomplete rows");
                return Err(AppError::TooManyInvalidRows { invalid, total });
            }
            Ok(SanitizedRows {
                rows,
                dropped_blank_rows: 0,
                incomplete_rows: invalid,
            })
        }
        CompletenessPolicy::DropBlankRows => {
            let total = rows.len();
            let kept = rows
                .into_iter()
                .filter(|r| !is_blank_row(r))
                .collect::<Vec<_>>();
            if kept.is_empty() {
                return Err(AppError::NoValidRows);
            }
            let incomplete_rows = kept
                .iter()
                .filter(|r| is_incomplete_row(r, header_width))
                .count();
            Ok(SanitizedRows {
                dropped_blank_rows: total - kept.len(),
                rows: kept,
                incomplete_rows,
            })
        }
    }
}
