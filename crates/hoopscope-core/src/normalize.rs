// Cleaning and type coercion: RawTable -> PlayerStatsTable.
//
// Order matters. Header repeats are found by comparing the raw `Age` text to
// the literal "Age", so they must go before any coercion touches that column.

use tracing::debug;

use crate::season::SeasonKey;
use crate::table::{self, Cell, Column, ColumnKind, PlayerStatsTable, RawTable};

/// What normalization did to a table, for logging and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormalizeReport {
    /// Rows dropped because they repeat the header.
    pub header_rows_removed: usize,
    /// Whether the rank column was present (and dropped).
    pub rank_dropped: bool,
    /// Empty cells filled with `0` or `""`.
    pub blank_cells: usize,
    /// Non-empty numeric cells that failed to parse and became `0`.
    pub coercion_failures: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub table: PlayerStatsTable,
    pub report: NormalizeReport,
}

/// Turn a scraped table into a typed one.
///
/// Every column other than Player/Pos/Team/Awards ends up numeric, with
/// unparseable or blank cells set to zero. Text columns keep their source
/// text, blanks becoming the empty string. Row order is preserved.
pub fn normalize(season: SeasonKey, raw: RawTable) -> Normalized {
    let mut report = NormalizeReport::default();
    let (names, rows) = raw.into_parts();

    let age_idx = names.iter().position(|c| c == table::AGE);
    let rows: Vec<Vec<String>> = match age_idx {
        Some(i) => rows
            .into_iter()
            .filter(|row| {
                let repeat = row[i].trim() == table::AGE;
                if repeat {
                    report.header_rows_removed += 1;
                }
                !repeat
            })
            .collect(),
        None => rows,
    };

    let keep: Vec<usize> = names
        .iter()
        .enumerate()
        .filter(|(_, name)| name.as_str() != table::RANK)
        .map(|(i, _)| i)
        .collect();
    report.rank_dropped = keep.len() < names.len();

    let columns: Vec<Column> = keep
        .iter()
        .map(|&i| {
            let name = names[i].clone();
            let kind = if table::is_text_column(&name) {
                ColumnKind::Text
            } else {
                ColumnKind::Numeric
            };
            Column { name, kind }
        })
        .collect();

    let rows: Vec<Vec<Cell>> = rows
        .into_iter()
        .map(|row| {
            keep.iter()
                .zip(&columns)
                .map(|(&i, column)| coerce_cell(&row[i], column.kind, &mut report))
                .collect()
        })
        .collect();

    debug!(
        season = season.year(),
        rows = rows.len(),
        header_rows_removed = report.header_rows_removed,
        blank_cells = report.blank_cells,
        coercion_failures = report.coercion_failures,
        "normalized season table"
    );

    Normalized {
        table: PlayerStatsTable::from_parts(season, columns, rows),
        report,
    }
}

fn coerce_cell(raw: &str, kind: ColumnKind, report: &mut NormalizeReport) -> Cell {
    let raw = raw.trim();
    if raw.is_empty() {
        report.blank_cells += 1;
    }
    match kind {
        ColumnKind::Text => Cell::Text(raw.to_string()),
        ColumnKind::Numeric => match parse_number(raw) {
            Some(n) => Cell::Number(n),
            None => {
                if !raw.is_empty() {
                    report.coercion_failures += 1;
                }
                Cell::Number(0.0)
            }
        },
    }
}

/// Parse a numeric cell. Accepts thousands separators and leading-dot
/// decimals (".456"); rejects anything non-finite.
pub fn parse_number(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    let cleaned: String;
    let text = if raw.contains(',') {
        if !is_grouped_integer_part(raw) {
            return None;
        }
        cleaned = raw.replace(',', "");
        cleaned.as_str()
    } else {
        raw
    };
    // f64::from_str also takes "inf" and "NaN"; neither is a statistic.
    text.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// "1,234" or "-12,345.6": commas only between groups of three digits.
fn is_grouped_integer_part(raw: &str) -> bool {
    let unsigned = raw.strip_prefix(['-', '+']).unwrap_or(raw);
    let int_part = unsigned.split('.').next().unwrap_or_default();
    let mut groups = int_part.split(',');
    let first_ok = groups
        .next()
        .is_some_and(|g| (1..=3).contains(&g.len()) && g.bytes().all(|b| b.is_ascii_digit()));
    first_ok && groups.all(|g| g.len() == 3 && g.bytes().all(|b| b.is_ascii_digit()))
}
