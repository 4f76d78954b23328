use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::app_error::AppError;
use crate::sheet_rows::{CellValue, RowBatch, SheetRow};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    pub total_sales: f64,
    pub total_profit: f64,
    pub total_expenses: f64,
}

/// Per-row chart record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedRow {
    pub name: String,
    #[serde(rename = "Sales")]
    pub sales: f64,
    #[serde(rename = "Profit")]
    pub profit: f64,
    #[serde(rename = "Expenses")]
    pub expenses: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PieSlice {
    pub name: &'static str,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankMetric {
    Profit,
    ProfitPercentage,
    Sales,
}

impl RankMetric {
    pub fn value_of(self, row: &SheetRow) -> f64 {
        match self {
            RankMetric::Profit => row.profit.as_number(),
            RankMetric::ProfitPercentage => row.profit_percentage.as_number(),
            RankMetric::Sales => row.sales.as_number(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedRow {
    pub index: usize,
    pub name: String,
    pub value: f64,
}

pub fn row_expenses(row: &SheetRow) -> f64 {
    row.te.as_number() + row.credit.as_number() + row.amazon_fee.as_number()
}

pub fn compute_totals(rows: &[SheetRow]) -> Totals {
    rows.iter().fold(Totals::default(), |mut acc, row| {
        acc.total_sales += row.sales.as_number();
        acc.total_profit += row.profit.as_number();
        acc.total_expenses += row_expenses(row);
        acc
    })
}

pub fn derive_row(row: &SheetRow) -> DerivedRow {
    DerivedRow {
        name: row.name(),
        sales: row.sales.as_number(),
        profit: row.profit.as_number(),
        expenses: row_expenses(row),
    }
}

pub fn derive_rows(rows: &[SheetRow]) -> Vec<DerivedRow> {
    rows.iter().map(derive_row).collect()
}

pub fn profit_split(totals: &Totals) -> Vec<PieSlice> {
    vec![
        PieSlice {
            name: "Profit",
            value: totals.total_profit,
        },
        PieSlice {
            name: "Expenses",
            value: totals.total_expenses,
        },
    ]
}

/// Highest `limit` rows by `metric`; ties keep upload order.
pub fn rank_rows(rows: &[SheetRow], metric: RankMetric, limit: usize) -> Vec<RankedRow> {
    let mut ranked = rows
        .iter()
        .enumerate()
        .map(|(index, row)| RankedRow {
            index,
            name: row.name(),
            value: metric.value_of(row),
        })
        .collect::<Vec<_>>();
    ranked.sort_by(|a, b| b.value.total_cmp(&a.value));
    ranked.truncate(limit);
    ranked
}

pub fn dashboard_summary(batch: &RowBatch) -> Value {
    let totals = compute_totals(&batch.rows);
    let table_rows = (0..batch.len())
        .filter_map(|idx| batch.table_cells(idx))
        .collect::<Vec<Vec<CellValue>>>();

    json!({
        "batch_id": batch.batch_id,
        "source_file": batch.source_file,
        "format": batch.format,
        "accepted_at": batch.accepted_at,
        "row_count": batch.len(),
        "has_data": !batch.is_empty(),
        "totals": totals,
        "pie_data": profit_split(&totals),
        "bar_data": derive_rows(&batch.rows),
        "headers": batch.headers,
        "table_rows": table_rows,
    })
}

pub fn product_details(batch: &RowBatch, index: usize) -> Result<Value, AppError> {
    let row = batch.rows.get(index).ok_or(AppError::ProductNotFound(index))?;
    let fields = batch
        .row_fields(index)
        .ok_or(AppError::ProductNotFound(index))?
        .into_iter()
        .map(|(field, value)| json!({ "field": field, "value": value }))
        .collect::<Vec<_>>();

    Ok(json!({
        "index": index,
        "name": row.name(),
        "fields": fields,
        "stats": {
            "sales": row.sales.as_number(),
            "profit": row.profit.as_number(),
            "expenses": row_expenses(row),
        },
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheet_schema::{validate_headers, ColumnMap};

    const HEADERS: [&str; 7] = [
        "Product Name",
        "Sales",
        "Profit",
        "TE",
        "Credit",
        "Amazon Fee",
        "Profit Percentage",
    ];

    fn columns() -> (Vec<String>, ColumnMap) {
        let headers = HEADERS.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        let map = validate_headers(&headers).expect("valid headers");
        (headers, map)
    }

    fn row(cells: [&str; 7]) -> SheetRow {
        let (headers, map) = columns();
        let cells = cells.iter().map(|c| CellValue::text(*c)).collect::<Vec<_>>();
        SheetRow::from_cells(&cells, &headers, &map)
    }

    fn batch(rows: Vec<SheetRow>) -> RowBatch {
        let (headers, map) = columns();
        RowBatch {
            headers,
            columns: map,
            rows,
            ..RowBatch::empty()
        }
    }

    #[test]
    fn expenses_sum_three_fee_columns() {
        let rows = vec![
            row(["A", "100", "20", "10", "5", "3", "20"]),
            row(["B", "50", "7", "0", "0", "0", "14"]),
        ];
        let totals = compute_totals(&rows);
        assert_eq!(totals.total_expenses, 18.0);
        assert_eq!(totals.total_sales, 150.0);
        assert_eq!(totals.total_profit, 27.0);
    }

    #[test]
    fn empty_and_unparsable_values_count_as_zero() {
        let rows = vec![
            row(["A", "", "abc", "", "1", "", ""]),
            row(["B", "12.5", "", "2", "", "", ""]),
        ];
        let totals = compute_totals(&rows);
        assert_eq!(totals.total_sales, 12.5);
        assert_eq!(totals.total_profit, 0.0);
        assert_eq!(totals.total_expenses, 3.0);
        assert_eq!(compute_totals(&[]), Totals::default());
    }

    #[test]
    fn derived_rows_are_one_to_one_and_repeatable() {
        let rows = vec![
            row(["Same", "1", "1", "1", "1", "1", "1"]),
            row(["Same", "2", "2", "2", "2", "2", "2"]),
        ];
        let first = derive_rows(&rows);
        let second = derive_rows(&rows);
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
        assert_eq!(first[1].expenses, 6.0);
        assert_eq!(
            serde_json::to_string(&first).expect("serialize"),
            serde_json::to_string(&second).expect("serialize")
        );
        assert_eq!(
            serde_json::to_value(&first[0]).expect("serialize"),
            json!({"name": "Same", "Sales": 1.0, "Profit": 1.0, "Expenses": 3.0})
        );
    }

    #[test]
    fn top_profit_is_descending() {
        let rows = vec![
            row(["five", "0", "5", "0", "0", "0", "0"]),
            row(["thirty", "0", "30", "0", "0", "0", "0"]),
            row(["fifteen", "0", "15", "0", "0", "0", "0"]),
        ];
        let ranked = rank_rows(&rows, RankMetric::Profit, 3);
        let names = ranked.iter().map(|r| r.name.as_str()).collect::<Vec<_>>();
        assert_eq!(names, vec!["thirty", "fifteen", "five"]);
        assert_eq!(ranked[0].index, 1);
        assert_eq!(rank_rows(&rows, RankMetric::Profit, 1).len(), 1);
    }

    #[test]
    fn ties_keep_upload_order() {
        let rows = vec![
            row(["first", "9", "0", "0", "0", "0", "0"]),
            row(["second", "9", "0", "0", "0", "0", "0"]),
            row(["third", "10", "0", "0", "0", "0", "0"]),
        ];
        let ranked = rank_rows(&rows, RankMetric::Sales, 10);
        let names = ranked.iter().map(|r| r.name.as_str()).collect::<Vec<_>>();
        assert_eq!(names, vec!["third", "first", "second"]);
    }

    #[test]
    fn product_details_reports_quick_stats() {
        let b = batch(vec![row(["Widget", "100", "20", "10", "5", "3", "20"])]);
        let details = product_details(&b, 0).expect("row 0");
        assert_eq!(details["name"], "Widget");
        assert_eq!(details["stats"]["expenses"], 18.0);
        assert_eq!(details["fields"][5]["field"], "Amazon Fee");
        assert_eq!(product_details(&b, 1).unwrap_err(), AppError::ProductNotFound(1));
    }

    #[test]
    fn summary_carries_chart_and_table_payloads() {
        let b = batch(vec![
            row(["A", "100", "20", "10", "5", "3", "20"]),
            row(["B", "50", "7", "0", "0", "0", "14"]),
        ]);
        let summary = dashboard_summary(&b);
        assert_eq!(summary["row_count"], 2);
        assert_eq!(summary["totals"]["totalExpenses"], 18.0);
        assert_eq!(summary["pie_data"][1]["name"], "Expenses");
        assert_eq!(summary["bar_data"][1]["name"], "B");
        assert_eq!(summary["table_rows"][0][0], "A");
        assert_eq!(dashboard_summary(&RowBatch::empty())["has_data"], false);
    }
}
