// Plain-text rendering of views and analytics results for the terminal.
//
// Every function returns a String; the binary decides where it goes.

use std::fmt::Write as _;

use crate::analytics::{
    Bin, ColumnSummary, Comparison, CorrelationMatrix, FiveNumber, Scatter, Summary, TeamAggregate,
};
use crate::filter::TableView;

/// Column-aligned grid. Text left-aligned, everything else right-aligned.
struct Grid {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    right_align: Vec<bool>,
}

impl Grid {
    fn new(headers: Vec<String>, right_align: Vec<bool>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
            right_align,
        }
    }

    fn push(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    fn render(&self) -> String {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (w, cell) in widths.iter_mut().zip(row) {
                *w = (*w).max(cell.chars().count());
            }
        }

        let mut out = String::new();
        self.write_line(&mut out, &self.headers, &widths);
        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        self.write_line(&mut out, &rule, &widths);
        for row in &self.rows {
            self.write_line(&mut out, row, &widths);
        }
        out
    }

    fn write_line(&self, out: &mut String, cells: &[String], widths: &[usize]) {
        let line: Vec<String> = cells
            .iter()
            .zip(widths)
            .enumerate()
            .map(|(i, (cell, &w))| {
                let pad = w.saturating_sub(cell.chars().count());
                if self.right_align.get(i).copied().unwrap_or(false) {
                    format!("{}{cell}", " ".repeat(pad))
                } else {
                    format!("{cell}{}", " ".repeat(pad))
                }
            })
            .collect();
        out.push_str(line.join("  ").trim_end());
        out.push('\n');
    }
}

fn fmt_stat(v: f64) -> String {
    if v.is_nan() {
        "NaN".to_string()
    } else {
        format!("{v:.3}")
    }
}

fn fmt_opt(v: Option<f64>, precision: usize) -> String {
    v.map(|v| format!("{v:.precision$}")).unwrap_or_else(|| "-".to_string())
}

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

/// Render the rows in view. `columns` restricts and orders the output; names
/// missing from the table are skipped.
pub fn render_view(view: &TableView<'_>, columns: Option<&[&str]>) -> String {
    let table = view.table();
    let selected: Vec<(usize, &str)> = match columns {
        Some(names) => names
            .iter()
            .filter_map(|n| table.column_index(n).map(|i| (i, *n)))
            .collect(),
        None => table.column_names().enumerate().collect(),
    };

    let right = selected
        .iter()
        .map(|(_, name)| table.column_kind(name) == Some(hoopscope_core::table::ColumnKind::Numeric))
        .collect();
    let mut grid = Grid::new(selected.iter().map(|(_, n)| n.to_string()).collect(), right);
    for row in view.rows() {
        let cells = row.cells();
        grid.push(selected.iter().map(|(i, _)| cells[*i].to_string()).collect());
    }

    let mut out = grid.render();
    let _ = writeln!(out, "({} players, season {})", view.len(), table.season());
    out
}

pub fn render_summary(summary: &Summary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Total players:  {}", summary.players);
    let _ = writeln!(out, "Teams selected: {}", summary.teams_selected);
    let _ = writeln!(out, "Avg points:     {}", fmt_opt(summary.avg_points, 1));
    let _ = writeln!(out, "Avg age:        {}", fmt_opt(summary.avg_age, 1));
    out
}

pub fn render_describe(rows: &[ColumnSummary]) -> String {
    let headers = ["stat", "count", "mean", "std", "min", "25%", "50%", "75%", "max"];
    let mut grid = Grid::new(
        headers.iter().map(|h| h.to_string()).collect(),
        headers.iter().map(|h| *h != "stat").collect(),
    );
    for r in rows {
        grid.push(vec![
            r.column.clone(),
            r.count.to_string(),
            fmt_stat(r.mean),
            r.std.map(fmt_stat).unwrap_or_else(|| "NaN".to_string()),
            fmt_stat(r.min),
            fmt_stat(r.q25),
            fmt_stat(r.median),
            fmt_stat(r.q75),
            fmt_stat(r.max),
        ]);
    }
    grid.render()
}

pub fn render_correlation(matrix: &CorrelationMatrix) -> String {
    let mut headers = vec![String::new()];
    headers.extend(matrix.labels.iter().cloned());
    let right = (0..headers.len()).map(|i| i > 0).collect();
    let mut grid = Grid::new(headers, right);
    for (label, values) in matrix.labels.iter().zip(&matrix.values) {
        let mut row = vec![label.clone()];
        row.extend(values.iter().map(|v| if v.is_nan() { "NaN".to_string() } else { format!("{v:.2}") }));
        grid.push(row);
    }
    grid.render()
}

pub fn render_teams(teams: &[TeamAggregate]) -> String {
    let stat_names: Vec<String> = teams
        .first()
        .map(|t| t.averages.iter().map(|(s, _)| s.clone()).collect())
        .unwrap_or_default();
    let mut headers = vec!["Team".to_string()];
    headers.extend(stat_names.iter().map(|s| format!("avg {s}")));
    headers.push("Players".to_string());
    let right = (0..headers.len()).map(|i| i > 0).collect();

    let mut grid = Grid::new(headers, right);
    for t in teams {
        let mut row = vec![t.team.clone()];
        row.extend(t.averages.iter().map(|(_, v)| format!("{v:.1}")));
        row.push(t.players.to_string());
        grid.push(row);
    }
    grid.render()
}

pub fn render_comparison(cmp: &Comparison) -> String {
    let mut grid = Grid::new(
        vec!["Stat".into(), cmp.first.player.clone(), cmp.second.player.clone()],
        vec![false, true, true],
    );
    grid.push(vec!["Team".into(), cmp.first.team.clone(), cmp.second.team.clone()]);
    grid.push(vec!["Pos".into(), cmp.first.pos.clone(), cmp.second.pos.clone()]);
    for (stat, a, b) in &cmp.stats {
        let precision = if stat.ends_with('%') { 3 } else { 1 };
        grid.push(vec![
            stat.clone(),
            format!("{a:.precision$}"),
            format!("{b:.precision$}"),
        ]);
    }
    grid.render()
}

/// The scatter points as a two-column table under an `r` headline.
pub fn render_scatter(scatter: &Scatter) -> String {
    let r = if scatter.r.is_nan() { "NaN".to_string() } else { format!("{:.3}", scatter.r) };
    let mut grid = Grid::new(
        vec!["Player".into(), "Team".into(), scatter.x.clone(), scatter.y.clone()],
        vec![false, false, true, true],
    );
    for p in &scatter.points {
        grid.push(vec![p.player.clone(), p.team.clone(), format!("{}", p.x), format!("{}", p.y)]);
    }
    format!("{} vs {} (r = {r})\n{}", scatter.y, scatter.x, grid.render())
}

/// Text histogram; bar lengths are scaled to `width` characters.
pub fn render_histogram(stat: &str, bins: &[Bin], width: usize) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Distribution of {stat}");
    let max = bins.iter().map(|b| b.count).max().unwrap_or(0);
    for bin in bins {
        let len = if max == 0 { 0 } else { bin.count * width / max };
        let _ = writeln!(
            out,
            "{:>8.2} - {:<8.2} | {:<width$} {}",
            bin.start,
            bin.end,
            "#".repeat(len),
            bin.count
        );
    }
    out
}

pub fn render_five_number(group_label: &str, stat: &str, groups: &[(String, FiveNumber)]) -> String {
    let headers = [group_label, "n", "min", "q1", "median", "q3", "max"];
    let mut grid = Grid::new(
        headers.iter().map(|h| h.to_string()).collect(),
        (0..headers.len()).map(|i| i > 0).collect(),
    );
    for (key, f) in groups {
        grid.push(vec![
            key.clone(),
            f.count.to_string(),
            format!("{:.1}", f.min),
            format!("{:.1}", f.q1),
            format!("{:.1}", f.median),
            format!("{:.1}", f.q3),
            format!("{:.1}", f.max),
        ]);
    }
    format!("{stat} by {group_label}\n{}", grid.render())
}
