use serde::Serialize;
use std::collections::HashMap;

use crate::app_error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RequiredColumn {
    ProductName,
    Sales,
    Profit,
    TotalExpense,
    Credit,
    AmazonFee,
    ProfitPercentage,
}

impl RequiredColumn {
    pub const ALL: [RequiredColumn; 7] = [
        RequiredColumn::ProductName,
        RequiredColumn::Sales,
        RequiredColumn::Profit,
        RequiredColumn::TotalExpense,
        RequiredColumn::Credit,
        RequiredColumn::AmazonFee,
        RequiredColumn::ProfitPercentage,
    ];

    pub fn label(self) -> &'static str {
        match self {
            RequiredColumn::ProductName => "Product Name",
            RequiredColumn::Sales => "Sales",
            RequiredColumn::Profit => "Profit",
            RequiredColumn::TotalExpense => "TE",
            RequiredColumn::Credit => "Credit",
            RequiredColumn::AmazonFee => "Amazon Fee",
            RequiredColumn::ProfitPercentage => "Profit Percentage",
        }
    }

    fn slot(self) -> usize {
        match self {
            RequiredColumn::ProductName => 0,
            RequiredColumn::Sales => 1,
            RequiredColumn::Profit => 2,
            RequiredColumn::TotalExpense => 3,
            RequiredColumn::Credit => 4,
            RequiredColumn::AmazonFee => 5,
            RequiredColumn::ProfitPercentage => 6,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnMap {
    positions: [usize; 7],
}

impl Default for ColumnMap {
    fn default() -> Self {
        Self {
            positions: [0, 1, 2, 3, 4, 5, 6],
        }
    }
}

impl ColumnMap {
    pub fn position(&self, column: RequiredColumn) -> usize {
        self.positions[column.slot()]
    }

    pub fn column_at(&self, position: usize) -> Option<RequiredColumn> {
        RequiredColumn::ALL
            .iter()
            .copied()
            .find(|c| self.position(*c) == position)
    }
}

pub fn trim_cell(text: &str) -> String {
    text.trim()
        .trim_start_matches('\u{feff}')
        .trim()
        .to_string()
}

pub fn normalize_header(header: &str) -> String {
    trim_cell(header).to_lowercase()
}

/// Checks the header row and maps each required column to its first matching position.
pub fn validate_headers(headers: &[String]) -> Result<ColumnMap, AppError> {
    let mut normalized: HashMap<String, usize> = HashMap::new();
    for (idx, header) in headers.iter().enumerate() {
        let key = normalize_header(header);
        if !key.is_empty() {
            normalized.entry(key).or_insert(idx);
        }
    }

    let mut positions = [0_usize; 7];
    let mut missing = Vec::new();
    for column in RequiredColumn::ALL {
        match normalized.get(&normalize_header(column.label())) {
            Some(idx) => positions[column.slot()] = *idx,
            None => missing.push(column.label().to_string()),
        }
    }

    if !missing.is_empty() {
        return Err(AppError::MissingColumns(missing));
    }
    Ok(ColumnMap { positions })
}
