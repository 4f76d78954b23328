use regex::Regex;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::OnceLock;

use crate::sales_analytics::{compute_totals, rank_rows, RankMetric, Totals};
use crate::sheet_rows::RowBatch;

pub const QUICK_QUESTIONS: [&str; 4] = [
    "top 3 profit",
    "total sales",
    "best product by profit %",
    "best by sales",
];

const MAX_TOP_N: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionIntent {
    TopProfit,
    Totals,
    BestProfitPercentage,
    BestSales,
    Help,
}

fn top_n_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\btop\s+(\d{1,3})\b").expect("top n regex"))
}

pub fn classify_question(question: &str) -> QuestionIntent {
    let q = question.to_lowercase();
    if q.contains("top") && q.contains("profit") {
        QuestionIntent::TopProfit
    } else if q.contains("total") {
        QuestionIntent::Totals
    } else if q.contains("profit %") || q.contains("profit percentage") {
        QuestionIntent::BestProfitPercentage
    } else if q.contains("best") && q.contains("sales") {
        QuestionIntent::BestSales
    } else {
        QuestionIntent::Help
    }
}

fn requested_top_n(question: &str, default_n: usize) -> usize {
    top_n_re()
        .captures(&question.to_lowercase())
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<usize>().ok())
        .filter(|n| *n > 0)
        .unwrap_or(default_n)
        .clamp(1, MAX_TOP_N)
}

/// Renders an amount with thousands separators and at most three decimals.
pub fn format_amount(value: f64) -> String {
    let rounded = (value * 1000.0).round() / 1000.0;
    let negative = rounded < 0.0;
    let text = format!("{:.3}", rounded.abs());
    let (int_part, frac_part) = text.split_once('.').unwrap_or((text.as_str(), ""));
    let frac_part = frac_part.trim_end_matches('0');

    let mut grouped = String::new();
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.push_str(&grouped);
    if !frac_part.is_empty() {
        out.push('.');
        out.push_str(frac_part);
    }
    out
}

fn help_text() -> String {
    format!(
        "I can answer things like: \"{}\", \"{}\", \"{}\", or \"{}\".",
        QUICK_QUESTIONS[0], QUICK_QUESTIONS[1], QUICK_QUESTIONS[2], QUICK_QUESTIONS[3]
    )
}

fn totals_text(t: &Totals) -> String {
    format!(
        "Totals:\n• Sales: ₹{}\n• Profit: ₹{}\n• Expenses: ₹{}",
        format_amount(t.total_sales),
        format_amount(t.total_profit),
        format_amount(t.total_expenses)
    )
}

/// Answers one chat question from the loaded rows.
pub fn answer_question(batch: &RowBatch, question: &str, default_top_n: usize) -> String {
    let intent = classify_question(question);
    if batch.is_empty() && intent != QuestionIntent::Help {
        return "No data loaded yet. Upload a spreadsheet first.".to_string();
    }

    match intent {
        QuestionIntent::TopProfit => {
            let n = requested_top_n(question, default_top_n);
            let top = rank_rows(&batch.rows, RankMetric::Profit, n);
            let lines = top
                .iter()
                .enumerate()
                .map(|(i, r)| format!("{}. {} - ₹{}", i + 1, r.name, format_amount(r.value)))
                .collect::<Vec<_>>();
            format!("Top {} products by Profit:\n{}", top.len(), lines.join("\n"))
        }
        QuestionIntent::Totals => totals_text(&compute_totals(&batch.rows)),
        QuestionIntent::BestProfitPercentage => {
            match rank_rows(&batch.rows, RankMetric::ProfitPercentage, 1).first() {
                Some(best) => format!("Best profit %: {} - {}%", best.name, format_amount(best.value)),
                None => help_text(),
            }
        }
        QuestionIntent::BestSales => match rank_rows(&batch.rows, RankMetric::Sales, 1).first() {
            Some(best) => format!("Best by sales: {} - ₹{}", best.name, format_amount(best.value)),
            None => help_text(),
        },
        QuestionIntent::Help => help_text(),
    }
}

pub fn assistant_reply_payload(batch: &RowBatch, question: &str, default_top_n: usize) -> Result<Value, String> {
    let question = question.trim();
    if question.is_empty() {
        return Err("question is required".to_string());
    }
    Ok(json!({
        "question": question,
        "intent": classify_question(question),
        "answer": answer_question(batch, question, default_top_n),
    }))
}
