//! Tabular renderings of the FMEA worksheet

use serde::Serialize;

use crate::domain::{FmeaRecord, FmeaTable};

/// Columns of the FMEA worksheet, in export order.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Column {
    /// Component under analysis.
    Component,
    /// Function of the component.
    Function,
    /// Failure mode.
    FailureMode,
    /// Effect of the failure.
    Effect,
    /// Severity rating.
    Severity,
    /// Frequency (occurrence) rating.
    Frequency,
    /// Detectability rating.
    Detectability,
    /// Risk priority number.
    Rpn,
    /// Recommended action.
    RecommendedAction,
}

impl Column {
    /// Every column, in export order.
    pub const ALL: [Self; 9] = [
        Self::Component,
        Self::Function,
        Self::FailureMode,
        Self::Effect,
        Self::Severity,
        Self::Frequency,
        Self::Detectability,
        Self::Rpn,
        Self::RecommendedAction,
    ];

    /// Machine-readable header used in CSV exports.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Component => "component",
            Self::Function => "function",
            Self::FailureMode => "failure_mode",
            Self::Effect => "effect",
            Self::Severity => "severity",
            Self::Frequency => "frequency",
            Self::Detectability => "detectability",
            Self::Rpn => "rpn",
            Self::RecommendedAction => "recommended_action",
        }
    }

    /// Human-readable header used in text tables.
    #[must_use]
    pub const fn header(self) -> &'static str {
        match self {
            Self::Component => "Component",
            Self::Function => "Function",
            Self::FailureMode => "Failure mode",
            Self::Effect => "Effect",
            Self::Severity => "S",
            Self::Frequency => "O",
            Self::Detectability => "D",
            Self::Rpn => "RPN",
            Self::RecommendedAction => "Recommended action",
        }
    }

    const fn is_numeric(self) -> bool {
        matches!(
            self,
            Self::Severity | Self::Frequency | Self::Detectability | Self::Rpn
        )
    }

    fn value(self, record: &FmeaRecord) -> String {
        match self {
            Self::Component => record.component().to_string(),
            Self::Function => record.function().to_string(),
            Self::FailureMode => record.failure_mode().to_string(),
            Self::Effect => record.effect().to_string(),
            Self::Severity => record.severity().to_string(),
            Self::Frequency => record.frequency().to_string(),
            Self::Detectability => record.detectability().to_string(),
            Self::Rpn => record.rpn().to_string(),
            Self::RecommendedAction => record.recommended_action().to_string(),
        }
    }
}

/// Renders the ranked worksheet as an aligned text table.
///
/// Text columns are left-aligned and numeric columns right-aligned. Lines
/// carry no trailing whitespace.
#[must_use]
pub fn text_table(table: &FmeaTable) -> String {
    let rows: Vec<Vec<String>> = table
        .ranked()
        .into_iter()
        .map(|record| Column::ALL.iter().map(|c| c.value(record)).collect())
        .collect();

    // Determine column widths for alignment.
    let widths: Vec<usize> = Column::ALL
        .iter()
        .enumerate()
        .map(|(idx, column)| {
            rows.iter()
                .map(|row| row[idx].chars().count())
                .max()
                .unwrap_or(0)
                .max(column.header().chars().count())
        })
        .collect();

    let mut out = String::new();
    let headers: Vec<String> = Column::ALL.iter().map(|c| c.header().to_string()).collect();
    push_row(&mut out, &headers, &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    push_row(&mut out, &rule, &widths);
    for row in &rows {
        push_row(&mut out, row, &widths);
    }
    out
}

fn push_row(out: &mut String, cells: &[String], widths: &[usize]) {
    let mut line = String::new();
    for ((cell, width), column) in cells.iter().zip(widths).zip(Column::ALL) {
        let pad = width.saturating_sub(cell.chars().count());
        if column.is_numeric() {
            line.push_str(&" ".repeat(pad));
            line.push_str(cell);
        } else {
            line.push_str(cell);
            line.push_str(&" ".repeat(pad));
        }
        line.push_str("  ");
    }
    out.push_str(line.trim_end());
    out.push('\n');
}

/// Renders the ranked worksheet as CSV with a single header row.
#[must_use]
pub fn csv(table: &FmeaTable) -> String {
    let mut out = Column::ALL
        .iter()
        .map(|column| csv_escape(column.key()))
        .collect::<Vec<_>>()
        .join(",");
    out.push('\n');

    for record in table.ranked() {
        let values = Column::ALL
            .iter()
            .map(|column| csv_escape(&column.value(record)))
            .collect::<Vec<_>>();
        out.push_str(&values.join(","));
        out.push('\n');
    }
    out
}

fn csv_escape(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') || value.contains('\r') {
        let escaped = value.replace('"', "\"\"");
        format!("\"{escaped}\"")
    } else {
        value.to_string()
    }
}

/// A ranked worksheet row with its derived RPN, for structured output.
#[derive(Debug, Serialize)]
pub struct RankedRow<'a> {
    /// 1-based rank by descending RPN.
    pub rank: usize,
    /// The record's fields.
    #[serde(flatten)]
    pub record: &'a FmeaRecord,
    /// Risk priority number.
    pub rpn: u16,
}

/// The ranked worksheet as serialisable rows.
#[must_use]
pub fn ranked_rows(table: &FmeaTable) -> Vec<RankedRow<'_>> {
    table
        .ranked()
        .into_iter()
        .enumerate()
        .map(|(idx, record)| RankedRow {
            rank: idx + 1,
            record,
            rpn: record.rpn(),
        })
        .collect()
}
