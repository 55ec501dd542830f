// First-table extraction from an HTML document.
//
// The first `<table>` in the document is taken as the statistics table and its
// first row as the header. Every following row (thead, tbody and tfoot alike,
// in document order) becomes a data row, including the header repeats the
// source sprinkles through long tables; removing those is the normalizer's job.

use std::collections::{HashMap, HashSet};

use scraper::{ElementRef, Html, Selector};
use thiserror::Error;
use tracing::debug;

use crate::table::RawTable;

/// Upper bound on a single cell's `colspan`; larger values are treated as 1.
const MAX_COLSPAN: usize = 64;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExtractError {
    #[error("document is empty")]
    EmptyDocument,

    #[error("document contains no table")]
    NoTable,

    #[error("first table has no header row")]
    NoHeader,

    #[error("invalid selector `{selector}`: {message}")]
    Selector { selector: String, message: String },
}

/// Parse `document` and return its first table.
pub fn extract_first_table(document: &str) -> Result<RawTable, ExtractError> {
    if document.trim().is_empty() {
        return Err(ExtractError::EmptyDocument);
    }

    let table_sel = selector("table")?;
    let row_sel = selector("tr")?;

    let html = Html::parse_document(document);
    let table = html.select(&table_sel).next().ok_or(ExtractError::NoTable)?;
    debug!(
        id = table.value().attr("id").unwrap_or(""),
        "selected first table in document"
    );

    let mut rows = table
        .select(&row_sel)
        .filter(|tr| belongs_to(tr, &table))
        .map(row_cells)
        .filter(|cells| !cells.is_empty());

    let header = rows.next().ok_or(ExtractError::NoHeader)?;
    let columns = header_names(header);
    let width = columns.len();

    let rows: Vec<Vec<String>> = rows
        .inspect(|cells| {
            if cells.len() > width {
                debug!(cells = cells.len(), width, "truncating over-wide table row");
            }
        })
        .collect();

    Ok(RawTable::new(columns, rows))
}

fn selector(css: &str) -> Result<Selector, ExtractError> {
    Selector::parse(css).map_err(|e| ExtractError::Selector {
        selector: css.to_string(),
        message: format!("{e:?}"),
    })
}

/// True when `tr`'s nearest enclosing table is `table` (skips nested tables).
fn belongs_to(tr: &ElementRef<'_>, table: &ElementRef<'_>) -> bool {
    tr.ancestors()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "table")
        .is_some_and(|owner| owner == *table)
}

/// Text of each `th`/`td` child, with `colspan` cells repeated.
fn row_cells(tr: ElementRef<'_>) -> Vec<String> {
    let mut cells = Vec::new();
    for cell in tr.children().filter_map(ElementRef::wrap) {
        let name = cell.value().name();
        if name != "th" && name != "td" {
            continue;
        }
        let text = normalize_ws(&cell.text().collect::<String>());
        let span = cell
            .value()
            .attr("colspan")
            .and_then(|s| s.trim().parse::<usize>().ok())
            .filter(|n| (1..=MAX_COLSPAN).contains(n))
            .unwrap_or(1);
        for _ in 0..span {
            cells.push(text.clone());
        }
    }
    cells
}

/// Header names with blanks filled in and duplicates made unique, the way
/// data-frame readers label them (`Unnamed: 3`, `FG.1`).
fn header_names(raw: Vec<String>) -> Vec<String> {
    let mut used: HashSet<String> = HashSet::new();
    let mut next_suffix: HashMap<String, usize> = HashMap::new();
    let mut names = Vec::with_capacity(raw.len());
    for (i, name) in raw.into_iter().enumerate() {
        let name = if name.is_empty() {
            format!("Unnamed: {i}")
        } else {
            name
        };
        let unique = if used.contains(&name) {
            let suffix = next_suffix.entry(name.clone()).or_insert(1);
            loop {
                let candidate = format!("{name}.{suffix}");
                *suffix += 1;
                if !used.contains(&candidate) {
                    break candidate;
                }
            }
        } else {
            name
        };
        used.insert(unique.clone());
        names.push(unique);
    }
    names
}

fn normalize_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
