// Tabular data model: the raw scraped table and the normalized player table.

use std::fmt;

use serde::Serialize;

use crate::season::SeasonKey;

// ---------------------------------------------------------------------------
// Well-known column names
// ---------------------------------------------------------------------------

pub const PLAYER: &str = "Player";
pub const TEAM: &str = "Team";
pub const POS: &str = "Pos";
pub const AGE: &str = "Age";
pub const AWARDS: &str = "Awards";
pub const RANK: &str = "Rk";
pub const GAMES: &str = "G";
pub const POINTS: &str = "PTS";

/// Columns kept as text. Everything else is coerced to a number.
pub const TEXT_COLUMNS: [&str; 4] = [PLAYER, POS, TEAM, AWARDS];

pub fn is_text_column(name: &str) -> bool {
    TEXT_COLUMNS.contains(&name)
}

// ---------------------------------------------------------------------------
// RawTable
// ---------------------------------------------------------------------------

/// The unprocessed first table of a document: header names plus string cells.
/// An empty string is an empty cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTable {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Build a raw table. Rows are padded with empty cells or truncated so
    /// that every row has exactly one cell per column.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, String::new());
                row
            })
            .collect();
        Self { columns, rows }
    }

    /// Convenience constructor from string slices, mostly for fixtures.
    pub fn from_strs(columns: &[&str], rows: &[&[&str]]) -> Self {
        Self::new(
            columns.iter().map(|c| c.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub(crate) fn into_parts(self) -> (Vec<String>, Vec<Vec<String>>) {
        (self.columns, self.rows)
    }
}

// ---------------------------------------------------------------------------
// Cells and columns
// ---------------------------------------------------------------------------

/// A normalized cell value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Text(String),
    Number(f64),
}

impl Cell {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Number(n) => Some(*n),
            Cell::Text(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            Cell::Number(_) => None,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Text(s) => f.write_str(s),
            // Whole numbers print without a trailing ".0" (ages, games).
            Cell::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            Cell::Number(n) => write!(f, "{n}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ColumnKind {
    Text,
    Numeric,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
}

// ---------------------------------------------------------------------------
// PlayerStatsTable
// ---------------------------------------------------------------------------

/// Normalized per-game statistics for one season. Immutable once built; only
/// `normalize` constructs it, which is what upholds the typing invariants.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerStatsTable {
    season: SeasonKey,
    columns: Vec<Column>,
    rows: Vec<Vec<Cell>>,
}

impl PlayerStatsTable {
    pub(crate) fn from_parts(season: SeasonKey, columns: Vec<Column>, rows: Vec<Vec<Cell>>) -> Self {
        debug_assert!(rows.iter().all(|r| r.len() == columns.len()));
        Self {
            season,
            columns,
            rows,
        }
    }

    pub fn season(&self) -> SeasonKey {
        self.season
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn column_kind(&self, name: &str) -> Option<ColumnKind> {
        self.columns.iter().find(|c| c.name == name).map(|c| c.kind)
    }

    /// Names of all numeric columns, in table order.
    pub fn numeric_columns(&self) -> impl Iterator<Item = &str> {
        self.columns
            .iter()
            .filter(|c| c.kind == ColumnKind::Numeric)
            .map(|c| c.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, index: usize) -> Option<Row<'_>> {
        self.rows.get(index).map(|cells| Row { table: self, cells })
    }

    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        self.rows.iter().map(move |cells| Row { table: self, cells })
    }
}

/// A borrowed row with name-based access.
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    table: &'a PlayerStatsTable,
    cells: &'a [Cell],
}

impl<'a> Row<'a> {
    pub fn cells(&self) -> &'a [Cell] {
        self.cells
    }

    pub fn get(&self, column: &str) -> Option<&'a Cell> {
        self.table.column_index(column).map(|i| &self.cells[i])
    }

    /// Numeric value of `column`, or `None` if the column is absent or text.
    pub fn number(&self, column: &str) -> Option<f64> {
        self.get(column).and_then(Cell::as_f64)
    }

    /// Text value of `column`, or `None` if the column is absent or numeric.
    pub fn text(&self, column: &str) -> Option<&'a str> {
        self.get(column).and_then(Cell::as_str)
    }

    pub fn player(&self) -> &'a str {
        self.text(PLAYER).unwrap_or_default()
    }

    pub fn team(&self) -> &'a str {
        self.text(TEAM).unwrap_or_default()
    }

    pub fn pos(&self) -> &'a str {
        self.text(POS).unwrap_or_default()
    }
}
