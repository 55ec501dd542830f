// Descriptive analytics over a filtered view: headline metrics, column
// summaries, correlations, team aggregates, comparisons, distributions.

use std::collections::HashMap;

use serde::Serialize;

use hoopscope_core::table::{AGE, POINTS};

use crate::filter::{PlayerFilter, TableView};

/// Statistics used for the correlation matrix, when present.
pub const KEY_STATS: [&str; 10] = ["PTS", "TRB", "AST", "STL", "BLK", "FG%", "3P%", "FT%", "MP", "TOV"];

/// Statistics compared head to head.
pub const COMPARE_STATS: [&str; 8] = ["PTS", "TRB", "AST", "STL", "BLK", "FG%", "3P%", "FT%"];

/// Statistics averaged per team.
pub const TEAM_STATS: [&str; 5] = ["PTS", "TRB", "AST", "STL", "BLK"];

pub const DEFAULT_HISTOGRAM_BINS: usize = 30;

/// Upper bound on histogram bins; larger requests are clamped.
pub const MAX_HISTOGRAM_BINS: usize = 1000;

/// Default axes of the scatter view.
pub const SCATTER_X: &str = "MP";
pub const SCATTER_Y: &str = "PTS";

/// Team views show at most this many teams by default.
pub const DEFAULT_TEAM_LIMIT: usize = 10;

// ---------------------------------------------------------------------------
// Basic numeric helpers
// ---------------------------------------------------------------------------

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Sample standard deviation (n - 1 denominator).
pub fn std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(var.sqrt())
}

/// Quantile with linear interpolation between closest ranks.
/// `sorted` must be ascending.
pub fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

fn sorted(mut values: Vec<f64>) -> Vec<f64> {
    values.sort_by(f64::total_cmp);
    values
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

// ---------------------------------------------------------------------------
// Summary metrics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub players: usize,
    /// Teams named by the filter; every team in the season when it names none.
    pub teams_selected: usize,
    pub avg_points: Option<f64>,
    pub avg_age: Option<f64>,
}

pub fn summary(view: &TableView<'_>, filter: &PlayerFilter) -> Summary {
    let teams_selected = match &filter.teams {
        Some(teams) => teams.len(),
        None => TableView::all(view.table()).teams().len(),
    };
    Summary {
        players: view.len(),
        teams_selected,
        avg_points: mean(&view.values(POINTS)),
        avg_age: mean(&view.values(AGE)),
    }
}

// ---------------------------------------------------------------------------
// Describe
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnSummary {
    pub column: String,
    pub count: usize,
    pub mean: f64,
    pub std: Option<f64>,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

/// Count, mean, spread and quartiles for every numeric column in the view.
/// Empty views produce no summaries.
pub fn describe(view: &TableView<'_>) -> Vec<ColumnSummary> {
    view.table()
        .numeric_columns()
        .filter_map(|column| {
            let values = view.values(column);
            let m = mean(&values)?;
            let std = std_dev(&values);
            let s = sorted(values);
            Some(ColumnSummary {
                column: column.to_string(),
                count: s.len(),
                mean: m,
                std,
                min: s[0],
                q25: quantile(&s, 0.25)?,
                median: quantile(&s, 0.5)?,
                q75: quantile(&s, 0.75)?,
                max: s[s.len() - 1],
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Correlation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    pub labels: Vec<String>,
    /// Row-major; `values[i][j]` is the correlation of labels i and j. NaN
    /// where undefined (a constant column or fewer than two rows).
    pub values: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.labels.iter().position(|l| l == a)?;
        let j = self.labels.iter().position(|l| l == b)?;
        Some(self.values[i][j])
    }
}

pub fn pearson(xs: &[f64], ys: &[f64]) -> f64 {
    let n = xs.len().min(ys.len());
    if n < 2 {
        return f64::NAN;
    }
    let (xs, ys) = (&xs[..n], &ys[..n]);
    let mx = xs.iter().sum::<f64>() / n as f64;
    let my = ys.iter().sum::<f64>() / n as f64;
    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (x, y) in xs.iter().zip(ys) {
        let (dx, dy) = (x - mx, y - my);
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    if sxx == 0.0 || syy == 0.0 {
        return f64::NAN;
    }
    (sxy / (sxx.sqrt() * syy.sqrt())).clamp(-1.0, 1.0)
}

/// Pairwise correlations of the requested stats that exist as numeric
/// columns. `None` when fewer than two are available.
pub fn correlation(view: &TableView<'_>, stats: &[&str]) -> Option<CorrelationMatrix> {
    let table = view.table();
    let labels: Vec<&str> = stats
        .iter()
        .copied()
        .filter(|s| table.numeric_columns().any(|c| c == *s))
        .collect();
    if labels.len() < 2 {
        return None;
    }
    let columns: Vec<Vec<f64>> = labels.iter().map(|l| view.values(l)).collect();
    let values = columns
        .iter()
        .map(|a| columns.iter().map(|b| pearson(a, b)).collect())
        .collect();
    Some(CorrelationMatrix {
        labels: labels.into_iter().map(String::from).collect(),
        values,
    })
}

// ---------------------------------------------------------------------------
// Team aggregates
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamAggregate {
    pub team: String,
    /// (stat, mean rounded to one decimal), in `TEAM_STATS` order.
    pub averages: Vec<(String, f64)>,
    pub players: usize,
}

impl TeamAggregate {
    pub fn average(&self, stat: &str) -> Option<f64> {
        self.averages.iter().find(|(s, _)| s == stat).map(|(_, v)| *v)
    }
}

/// Per-team means of `TEAM_STATS` plus player counts, best scoring first.
pub fn team_aggregates(view: &TableView<'_>) -> Vec<TeamAggregate> {
    let stats: Vec<&str> = TEAM_STATS
        .iter()
        .copied()
        .filter(|s| view.table().has_column(s))
        .collect();

    let mut groups: HashMap<&str, Vec<usize>> = HashMap::new();
    let rows: Vec<_> = view.rows().collect();
    for (i, row) in rows.iter().enumerate() {
        groups.entry(row.team()).or_default().push(i);
    }

    let mut aggregates: Vec<TeamAggregate> = groups
        .into_iter()
        .map(|(team, members)| {
            let averages = stats
                .iter()
                .map(|stat| {
                    let values: Vec<f64> =
                        members.iter().filter_map(|&i| rows[i].number(stat)).collect();
                    (stat.to_string(), round1(mean(&values).unwrap_or(0.0)))
                })
                .collect();
            TeamAggregate {
                team: team.to_string(),
                averages,
                players: members.len(),
            }
        })
        .collect();

    // Best scoring first; team name breaks ties so output is deterministic.
    aggregates.sort_by(|a, b| {
        let pa = a.average(POINTS).unwrap_or(0.0);
        let pb = b.average(POINTS).unwrap_or(0.0);
        pb.total_cmp(&pa).then_with(|| a.team.cmp(&b.team))
    });
    aggregates
}

// ---------------------------------------------------------------------------
// Head-to-head comparison
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerLine {
    pub player: String,
    pub team: String,
    pub pos: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comparison {
    pub first: PlayerLine,
    pub second: PlayerLine,
    /// (stat, first player's value, second player's value)
    pub stats: Vec<(String, f64, f64)>,
}

/// Compare two players on `COMPARE_STATS`, using each player's first row.
pub fn compare(view: &TableView<'_>, first: &str, second: &str) -> Option<Comparison> {
    let a = view.find_player(first)?;
    let b = view.find_player(second)?;
    let line = |r: &hoopscope_core::table::Row<'_>| PlayerLine {
        player: r.player().to_string(),
        team: r.team().to_string(),
        pos: r.pos().to_string(),
    };
    let stats = COMPARE_STATS
        .iter()
        .filter(|s| view.table().has_column(s))
        .map(|s| {
            (
                s.to_string(),
                a.number(s).unwrap_or(0.0),
                b.number(s).unwrap_or(0.0),
            )
        })
        .collect();
    Some(Comparison {
        first: line(&a),
        second: line(&b),
        stats,
    })
}

// ---------------------------------------------------------------------------
// Scatter
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterPoint {
    pub player: String,
    pub team: String,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scatter {
    pub x: String,
    pub y: String,
    pub points: Vec<ScatterPoint>,
    /// Pearson correlation of the two axes; NaN when undefined.
    pub r: f64,
}

/// Paired values of two numeric columns, one point per row in view order.
/// `None` unless both columns are numeric.
pub fn scatter(view: &TableView<'_>, x: &str, y: &str) -> Option<Scatter> {
    let numeric = |c: &str| view.table().numeric_columns().any(|n| n == c);
    if !numeric(x) || !numeric(y) {
        return None;
    }
    let points: Vec<ScatterPoint> = view
        .rows()
        .filter_map(|row| {
            Some(ScatterPoint {
                player: row.player().to_string(),
                team: row.team().to_string(),
                x: row.number(x)?,
                y: row.number(y)?,
            })
        })
        .collect();
    let xs: Vec<f64> = points.iter().map(|p| p.x).collect();
    let ys: Vec<f64> = points.iter().map(|p| p.y).collect();
    Some(Scatter {
        x: x.to_string(),
        y: y.to_string(),
        r: pearson(&xs, &ys),
        points,
    })
}

// ---------------------------------------------------------------------------
// Distributions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

/// Equal-width histogram over the data range. Bins are half-open except the
/// last, which also takes the maximum. At most `MAX_HISTOGRAM_BINS` bins.
pub fn histogram(values: &[f64], bins: usize) -> Vec<Bin> {
    if values.is_empty() || bins == 0 {
        return Vec::new();
    }
    let bins = bins.min(MAX_HISTOGRAM_BINS);
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    // A constant column gets a unit-wide range centred on the value.
    let (lo, hi) = if min == max {
        (min - 0.5, max + 0.5)
    } else {
        (min, max)
    };
    let width = (hi - lo) / bins as f64;

    let mut out: Vec<Bin> = (0..bins)
        .map(|i| Bin {
            start: lo + width * i as f64,
            end: if i + 1 == bins { hi } else { lo + width * (i + 1) as f64 },
            count: 0,
        })
        .collect();
    for v in values {
        let idx = (((v - lo) / width).floor() as usize).min(bins - 1);
        out[idx].count += 1;
    }
    out
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FiveNumber {
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
    pub count: usize,
}

pub fn five_number(values: &[f64]) -> Option<FiveNumber> {
    let s = sorted(values.to_vec());
    Some(FiveNumber {
        min: *s.first()?,
        q1: quantile(&s, 0.25)?,
        median: quantile(&s, 0.5)?,
        q3: quantile(&s, 0.75)?,
        max: *s.last()?,
        count: s.len(),
    })
}

/// Five-number summaries of `stat` per value of the text column `group_by`,
/// in order of first appearance.
pub fn grouped_five_number(
    view: &TableView<'_>,
    group_by: &str,
    stat: &str,
) -> Vec<(String, FiveNumber)> {
    let mut order: Vec<&str> = Vec::new();
    let mut groups: HashMap<&str, Vec<f64>> = HashMap::new();
    for row in view.rows() {
        let (Some(key), Some(value)) = (row.text(group_by), row.number(stat)) else {
            continue;
        };
        groups
            .entry(key)
            .or_insert_with(|| {
                order.push(key);
                Vec::new()
            })
            .push(value);
    }
    order
        .into_iter()
        .filter_map(|key| {
            let summary = five_number(groups.get(key)?)?;
            Some((key.to_string(), summary))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::tests::sample_table;
    use crate::filter::PlayerFilter;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn mean_and_std() {
        assert_eq!(mean(&[]), None);
        assert_eq!(mean(&[2.0, 4.0]), Some(3.0));
        assert_eq!(std_dev(&[1.0]), None);
        assert!(close(std_dev(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap(), 2.138089935299395));
    }

    #[test]
    fn quantiles_interpolate() {
        let s = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(quantile(&s, 0.0), Some(1.0));
        assert_eq!(quantile(&s, 0.5), Some(2.5));
        assert_eq!(quantile(&s, 0.25), Some(1.75));
        assert_eq!(quantile(&s, 1.0), Some(4.0));
        assert_eq!(quantile(&[], 0.5), None);
    }

    #[test]
    fn summary_metrics() {
        let table = sample_table();
        let filter = PlayerFilter::default().with_teams(["BOS"]);
        let view = TableView::filtered(&table, &filter);
        let s = summary(&view, &filter);
        assert_eq!(s.players, 2);
        assert_eq!(s.teams_selected, 1);
        assert_eq!(s.avg_points, Some(14.5));
        assert_eq!(s.avg_age, Some(23.5));
    }

    #[test]
    fn summary_of_empty_view_has_no_averages() {
        let table = sample_table();
        let filter = PlayerFilter::default().min_points(99.0);
        let view = TableView::filtered(&table, &filter);
        let s = summary(&view, &filter);
        assert_eq!(s.players, 0);
        assert_eq!(s.avg_points, None);
        // No team restriction: every team in the season counts as selected.
        assert_eq!(s.teams_selected, 3);
    }

    #[test]
    fn selected_teams_count_even_when_filtered_out() {
        let table = sample_table();
        // No BOS or LAL player scores 20 or more except Ava.
        let filter = PlayerFilter::default()
            .with_teams(["BOS", "LAL"])
            .min_points(20.0);
        let view = TableView::filtered(&table, &filter);
        let s = summary(&view, &filter);
        assert_eq!(s.players, 1);
        assert_eq!(s.teams_selected, 2);
    }

    #[test]
    fn describe_covers_numeric_columns_only() {
        let table = sample_table();
        let rows = describe(&TableView::all(&table));
        let names: Vec<&str> = rows.iter().map(|r| r.column.as_str()).collect();
        assert!(!names.contains(&"Player"));
        assert!(!names.contains(&"Team"));
        assert!(!names.contains(&"Rk"));
        assert_eq!(names[0], "Age");

        let pts = rows.iter().find(|r| r.column == "PTS").unwrap();
        assert_eq!(pts.count, 6);
        assert!(close(pts.mean, 14.0));
        assert_eq!(pts.min, 2.0);
        assert_eq!(pts.max, 24.0);
        assert_eq!(pts.median, 14.5);
    }

    #[test]
    fn pearson_extremes() {
        assert!(close(pearson(&[1.0, 2.0, 3.0], &[2.0, 4.0, 6.0]), 1.0));
        assert!(close(pearson(&[1.0, 2.0, 3.0], &[3.0, 2.0, 1.0]), -1.0));
        assert!(pearson(&[1.0, 1.0, 1.0], &[1.0, 2.0, 3.0]).is_nan());
        assert!(pearson(&[1.0], &[1.0]).is_nan());
    }

    #[test]
    fn correlation_uses_available_key_stats() {
        let table = sample_table();
        let matrix = correlation(&TableView::all(&table), &KEY_STATS).unwrap();
        assert_eq!(matrix.labels.len(), KEY_STATS.len());
        for (i, row) in matrix.values.iter().enumerate() {
            assert!(close(row[i], 1.0));
            for (j, v) in row.iter().enumerate() {
                assert!(close(*v, matrix.values[j][i]));
            }
        }
        assert!(matrix.get("PTS", "MP").unwrap() > 0.8);
        assert!(matrix.get("PTS", "Nope").is_none());
    }

    #[test]
    fn correlation_needs_two_columns() {
        let table = sample_table();
        assert!(correlation(&TableView::all(&table), &["PTS", "Missing"]).is_none());
    }

    #[test]
    fn team_aggregates_sorted_by_points() {
        let table = sample_table();
        let teams = team_aggregates(&TableView::all(&table));
        let order: Vec<&str> = teams.iter().map(|t| t.team.as_str()).collect();
        // NYK (24 + 11) / 2 = 17.5, BOS (24 + 5) / 2 = 14.5, LAL (18 + 2) / 2 = 10.
        assert_eq!(order, vec!["NYK", "BOS", "LAL"]);
        assert_eq!(teams[0].players, 2);
        assert_eq!(teams[0].average("PTS"), Some(17.5));
        assert_eq!(teams[1].average("AST"), Some(4.5));
        assert_eq!(teams[2].average("TRB"), Some(6.3));
    }

    #[test]
    fn compare_two_players() {
        let table = sample_table();
        let cmp = compare(&TableView::all(&table), "Ava", "Ben").unwrap();
        assert_eq!(cmp.first.team, "BOS");
        assert_eq!(cmp.second.pos, "C");
        assert_eq!(cmp.stats.len(), COMPARE_STATS.len());
        assert_eq!(cmp.stats[0], ("PTS".to_string(), 24.0, 18.0));
        // Ben's blank 3P% was coerced to zero.
        let three = cmp.stats.iter().find(|(s, _, _)| s == "3P%").unwrap();
        assert_eq!(three.2, 0.0);

        assert!(compare(&TableView::all(&table), "Ava", "Nobody").is_none());
    }

    #[test]
    fn histogram_counts_every_value() {
        let values = [0.0, 1.0, 2.0, 3.0, 4.0, 10.0];
        let bins = histogram(&values, 5);
        assert_eq!(bins.len(), 5);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), values.len());
        assert_eq!(bins[0].start, 0.0);
        assert_eq!(bins[4].end, 10.0);
        assert_eq!(bins[0].count, 2);
        assert_eq!(bins[4].count, 1);
    }

    #[test]
    fn histogram_bin_count_is_capped() {
        let bins = histogram(&[0.0, 1.0], usize::MAX);
        assert_eq!(bins.len(), MAX_HISTOGRAM_BINS);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 2);
    }

    #[test]
    fn scatter_pairs_minutes_and_points() {
        let table = sample_table();
        let s = scatter(&TableView::all(&table), SCATTER_X, SCATTER_Y).unwrap();
        assert_eq!(s.points.len(), 6);
        assert_eq!(s.points[0].player, "Ava");
        assert_eq!((s.points[0].x, s.points[0].y), (34.0, 24.0));
        assert!(s.r > 0.8);
        assert!(scatter(&TableView::all(&table), "Team", "PTS").is_none());
        assert!(scatter(&TableView::all(&table), "MP", "Nope").is_none());
    }

    #[test]
    fn histogram_of_constant_values() {
        let bins = histogram(&[3.0, 3.0, 3.0], 4);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 3);
        assert!(histogram(&[], 10).is_empty());
        assert!(histogram(&[1.0], 0).is_empty());
    }

    #[test]
    fn five_number_by_position_in_first_appearance_order() {
        let table = sample_table();
        let groups = grouped_five_number(&TableView::all(&table), "Pos", "PTS");
        let keys: Vec<&str> = groups.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["PG", "C", "SF", "SG", "PF", "PG-SG"]);
        assert_eq!(groups[0].1.count, 1);
        assert_eq!(groups[0].1.median, 24.0);
    }

    #[test]
    fn five_number_by_team() {
        let table = sample_table();
        let groups = grouped_five_number(&TableView::all(&table), "Team", "PTS");
        let (team, lal) = &groups[1];
        assert_eq!(team, "LAL");
        assert_eq!(lal.min, 2.0);
        assert_eq!(lal.max, 18.0);
        assert_eq!(lal.median, 10.0);
        assert_eq!(five_number(&[]), None);
    }
}
