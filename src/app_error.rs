use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AppError {
    #[error("Unsupported file type: .{0}. Please upload CSV or Excel (.xlsx/.xls) files only.")]
    UnsupportedFileType(String),
    #[error("File is empty. Please upload a valid file with data.")]
    EmptyFile,
    #[error("File size exceeds the {limit_mib}MB limit ({size} bytes). Please upload a smaller file.")]
    FileTooLarge { size: u64, limit_mib: u64 },
    #[error("No data found in the CSV file. Please check the file contents.")]
    NoDataFound,
    #[error("Excel file contains no worksheets. Please upload a valid Excel file.")]
    NoWorksheets,
    #[error("Excel worksheet is empty. Please check the file contents.")]
    EmptyWorksheet,
    #[error("No headers found in the Excel file. Please check the file structure.")]
    NoHeaderRow,
    #[error("Missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),
    #[error("Too many empty or invalid rows detected ({invalid} of {total}). Please check your data.")]
    TooManyInvalidRows { invalid: usize, total: usize },
    #[error("No valid data rows found in the Excel file. Please check the file contents.")]
    NoValidRows,
    #[error("Could not read file: {0}")]
    ReadFailure(String),
    #[error("Failed to process file: {0}")]
    MalformedFile(String),
    #[error("Sign-in failed: {0}")]
    AuthFailure(String),
    #[error("Invalid integration form: {0}")]
    InvalidIntegrationForm(String),
    #[error("No product at row {0}")]
    ProductNotFound(usize),
    #[error("Export failed: {0}")]
    ExportFailure(String),
}

impl AppError {
    /// Stable code surfaced to the adapter and the webview.
    pub fn category(&self) -> &'static str {
        match self {
            AppError::UnsupportedFileType(_) => "UNSUPPORTED_FILE_TYPE",
            AppError::EmptyFile => "EMPTY_FILE",
            AppError::FileTooLarge { .. } => "FILE_TOO_LARGE",
            AppError::NoDataFound => "NO_DATA_FOUND",
            AppError::NoWorksheets => "NO_WORKSHEETS",
            AppError::EmptyWorksheet => "EMPTY_WORKSHEET",
            AppError::NoHeaderRow => "NO_HEADER_ROW",
            AppError::MissingColumns(_) => "MISSING_COLUMNS",
            AppError::TooManyInvalidRows { .. } => "TOO_MANY_INVALID_ROWS",
            AppError::NoValidRows => "NO_VALID_ROWS",
            AppError::ReadFailure(_) => "READ_FAILURE",
            AppError::MalformedFile(_) => "MALFORMED_FILE",
            AppError::AuthFailure(_) => "AUTH_FAILURE",
            AppError::InvalidIntegrationForm(_) => "VALIDATION_ERROR",
            AppError::ProductNotFound(_) => "NOT_FOUND",
            AppError::ExportFailure(_) => "EXPORT_FAILURE",
        }
    }
}

impl From<AppError> for String {
    fn from(err: AppError) -> Self {
        err.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_columns_message_lists_every_name() {
        let err = AppError::MissingColumns(vec!["TE".to_string(), "Amazon Fee".to_string()]);
        assert_eq!(err.to_string(), "Missing required columns: TE, Amazon Fee");
        assert_eq!(err.category(), "MISSING_COLUMNS");
    }

    #[test]
    fn auth_failure_converts_to_a_message() {
        let err = AppError::AuthFailure("popup closed".to_string());
        assert_eq!(err.category(), "AUTH_FAILURE");
        let message: String = err.into();
        assert_eq!(message, "Sign-in failed: popup closed");
    }
}
