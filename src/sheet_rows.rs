use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;

use crate::sheet_schema::{ColumnMap, RequiredColumn};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Number(f64),
    Text(String),
}

impl Default for CellValue {
    fn default() -> Self {
        CellValue::Text(String::new())
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Number(n) => write!(f, "{n}"),
            CellValue::Text(s) => f.write_str(s),
        }
    }
}

impl CellValue {
    pub fn text(raw: impl Into<String>) -> Self {
        CellValue::Text(raw.into())
    }

    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Number(_) => false,
            CellValue::Text(s) => s.is_empty(),
        }
    }

    // blank, unparsable or non-finite values count as 0
    pub fn as_number(&self) -> f64 {
        let value = match self {
            CellValue::Number(n) => *n,
            CellValue::Text(s) => {
                let s = s.trim();
                if s.is_empty() {
                    return 0.0;
                }
                s.parse::<f64>().unwrap_or(0.0)
            }
        };
        if value.is_finite() {
            value
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SheetFormat {
    DelimitedText,
    SpreadsheetBinary,
}

impl SheetFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "csv" => Some(SheetFormat::DelimitedText),
            "xlsx" | "xls" => Some(SheetFormat::SpreadsheetBinary),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawSheet {
    pub format: SheetFormat,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SheetRow {
    pub product_name: CellValue,
    pub sales: CellValue,
    pub profit: CellValue,
    pub te: CellValue,
    pub credit: CellValue,
    pub amazon_fee: CellValue,
    pub profit_percentage: CellValue,
    pub extra: BTreeMap<String, CellValue>,
}

impl SheetRow {
    pub fn from_cells(cells: &[CellValue], headers: &[String], columns: &ColumnMap) -> Self {
        let take = |column: RequiredColumn| {
            cells
                .get(columns.position(column))
                .cloned()
                .unwrap_or_default()
        };

        let mut extra = BTreeMap::new();
        for (idx, header) in headers.iter().enumerate() {
            if columns.column_at(idx).is_some() || header.trim().is_empty() {
                continue;
            }
            extra
                .entry(header.clone())
                .or_insert_with(|| cells.get(idx).cloned().unwrap_or_default());
        }

        SheetRow {
            product_name: take(RequiredColumn::ProductName),
            sales: take(RequiredColumn::Sales),
            profit: take(RequiredColumn::Profit),
            te: take(RequiredColumn::TotalExpense),
            credit: take(RequiredColumn::Credit),
            amazon_fee: take(RequiredColumn::AmazonFee),
            profit_percentage: take(RequiredColumn::ProfitPercentage),
            extra,
        }
    }

    pub fn field(&self, column: RequiredColumn) -> &CellValue {
        match column {
            RequiredColumn::ProductName => &self.product_name,
            RequiredColumn::Sales => &self.sales,
            RequiredColumn::Profit => &self.profit,
            RequiredColumn::TotalExpense => &self.te,
            RequiredColumn::Credit => &self.credit,
            RequiredColumn::AmazonFee => &self.amazon_fee,
            RequiredColumn::ProfitPercentage => &self.profit_percentage,
        }
    }

    pub fn name(&self) -> String {
        self.product_name.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowBatch {
    pub batch_id: String,
    pub source_file: String,
    pub format: Option<SheetFormat>,
    pub digest: String,
    pub headers: Vec<String>,
    pub columns: ColumnMap,
    pub rows: Vec<SheetRow>,
    pub dropped_blank_rows: usize,
    pub accepted_at: String,
}

impl Default for RowBatch {
    fn default() -> Self {
        Self::empty()
    }
}

impl RowBatch {
    pub fn empty() -> Self {
        RowBatch {
            batch_id: String::new(),
            source_file: String::new(),
            format: None,
            digest: String::new(),
            headers: Vec::new(),
            columns: ColumnMap::default(),
            rows: Vec::new(),
            dropped_blank_rows: 0,
            accepted_at: String::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn cell_at(&self, row: &SheetRow, idx: usize) -> Option<CellValue> {
        if let Some(column) = self.columns.column_at(idx) {
            return Some(row.field(column).clone());
        }
        let header = self.headers.get(idx)?;
        row.extra.get(header).cloned()
    }

    pub fn table_cells(&self, index: usize) -> Option<Vec<CellValue>> {
        let row = self.rows.get(index)?;
        Some(
            (0..self.headers.len())
                .map(|idx| self.cell_at(row, idx).unwrap_or_default())
                .collect(),
        )
    }

    // blank and repeated headers are skipped
    pub fn row_fields(&self, index: usize) -> Option<Vec<(String, CellValue)>> {
        let row = self.rows.get(index)?;
        let mut seen = HashSet::new();
        let mut fields = Vec::new();
        for (idx, header) in self.headers.iter().enumerate() {
            if header.trim().is_empty() || !seen.insert(header.as_str()) {
                continue;
            }
            fields.push((header.clone(), self.cell_at(row, idx).unwrap_or_default()));
        }
        Some(fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheet_schema::validate_headers;

    fn sample_headers() -> Vec<String> {
        [
            "Product Name",
            "Sales",
            "Notes",
            "Profit",
            "TE",
            "Credit",
            "Amazon Fee",
            "Profit Percentage",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }

    #[test]
    fn numeric_coercion_falls_back_to_zero() {
        assert_eq!(CellValue::text("").as_number(), 0.0);
        assert_eq!(CellValue::text("  ").as_number(), 0.0);
        assert_eq!(CellValue::text(" 12.5 ").as_number(), 12.5);
        assert_eq!(CellValue::text("1e3").as_number(), 1000.0);
        assert_eq!(CellValue::text("1,200").as_number(), 0.0);
        assert_eq!(CellValue::text("NaN").as_number(), 0.0);
        assert_eq!(CellValue::text("inf").as_number(), 0.0);
        assert_eq!(CellValue::Number(-4.0).as_number(), -4.0);
    }

    #[test]
    fn only_empty_text_is_blank() {
        assert!(CellValue::text("").is_blank());
        assert!(!CellValue::text(" ").is_blank());
        assert!(!CellValue::Number(0.0).is_blank());
    }

    #[test]
    fn display_keeps_integers_short() {
        assert_eq!(CellValue::Number(42.0).to_string(), "42");
        assert_eq!(CellValue::Number(1.25).to_string(), "1.25");
        assert_eq!(CellValue::text("Widget").to_string(), "Widget");
    }

    #[test]
    fn row_keeps_required_fields_and_passthrough_columns() {
        let headers = sample_headers();
        let columns = validate_headers(&headers).expect("valid headers");
        let cells = vec![
            CellValue::text("Widget"),
            CellValue::text("100"),
            CellValue::text("fragile"),
            CellValue::text("20"),
        ];
        let row = SheetRow::from_cells(&cells, &headers, &columns);
        assert_eq!(row.name(), "Widget");
        assert_eq!(row.profit, CellValue::text("20"));
        assert_eq!(row.amazon_fee, CellValue::default());
        assert_eq!(row.extra.get("Notes"), Some(&CellValue::text("fragile")));
        assert_eq!(row.extra.len(), 1);
    }

    #[test]
    fn batch_reconstructs_fields_in_header_order() {
        let headers = sample_headers();
        let columns = validate_headers(&headers).expect("valid headers");
        let cells = headers
            .iter()
            .map(|h| CellValue::text(format!("v-{h}")))
            .collect::<Vec<_>>();
        let batch = RowBatch {
            headers: headers.clone(),
            columns: columns.clone(),
            rows: vec![SheetRow::from_cells(&cells, &headers, &columns)],
            ..RowBatch::empty()
        };

        let fields = batch.row_fields(0).expect("row 0");
        let names = fields.iter().map(|(k, _)| k.as_str()).collect::<Vec<_>>();
        assert_eq!(names, headers.iter().map(String::as_str).collect::<Vec<_>>());
        assert_eq!(batch.table_cells(0).expect("row 0"), cells);
        assert!(batch.row_fields(1).is_none());
    }
}
