// Row selection and ordering over a shared season table.
//
// A `TableView` is a list of row indices into one `PlayerStatsTable`, so
// filtering and sorting never copy the underlying data.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use hoopscope_core::table::{self, PlayerStatsTable, Row};

/// The five standard positions, in the order the position picker lists them.
pub const STANDARD_POSITIONS: [&str; 5] = ["C", "PF", "SF", "PG", "SG"];

/// Statistics offered as sort keys.
pub const SORT_STATS: [&str; 8] = ["PTS", "TRB", "AST", "STL", "BLK", "FG%", "3P%", "FT%"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Ascending,
    #[default]
    Descending,
}

/// Sidebar-style filter. `None` for teams or positions means "all".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayerFilter {
    pub teams: Option<BTreeSet<String>>,
    pub positions: Option<BTreeSet<String>>,
    pub min_games: f64,
    pub min_points: f64,
}

impl PlayerFilter {
    pub fn with_teams<I, S>(mut self, teams: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.teams = Some(teams.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_positions<I, S>(mut self, positions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.positions = Some(positions.into_iter().map(Into::into).collect());
        self
    }

    pub fn min_games(mut self, games: f64) -> Self {
        self.min_games = games;
        self
    }

    pub fn min_points(mut self, points: f64) -> Self {
        self.min_points = points;
        self
    }

    pub fn matches(&self, row: &Row<'_>) -> bool {
        if let Some(teams) = &self.teams {
            if !teams.contains(row.team()) {
                return false;
            }
        }
        if let Some(positions) = &self.positions {
            if !positions.contains(row.pos()) {
                return false;
            }
        }
        // Tables without G or PTS columns are not filtered on them.
        let games = row.number(table::GAMES).unwrap_or(f64::INFINITY);
        let points = row.number(table::POINTS).unwrap_or(f64::INFINITY);
        games >= self.min_games && points >= self.min_points
    }
}

// ---------------------------------------------------------------------------
// TableView
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct TableView<'a> {
    table: &'a PlayerStatsTable,
    rows: Vec<usize>,
}

impl<'a> TableView<'a> {
    /// Every row, in source order.
    pub fn all(table: &'a PlayerStatsTable) -> Self {
        Self {
            table,
            rows: (0..table.len()).collect(),
        }
    }

    pub fn filtered(table: &'a PlayerStatsTable, filter: &PlayerFilter) -> Self {
        let rows = table
            .rows()
            .enumerate()
            .filter(|(_, row)| filter.matches(row))
            .map(|(i, _)| i)
            .collect();
        Self { table, rows }
    }

    pub fn table(&self) -> &'a PlayerStatsTable {
        self.table
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> impl Iterator<Item = Row<'a>> + '_ {
        let table = self.table;
        self.rows.iter().filter_map(move |&i| table.row(i))
    }

    /// Values of a numeric column for the rows in view.
    pub fn values(&self, column: &str) -> Vec<f64> {
        self.rows().filter_map(|r| r.number(column)).collect()
    }

    /// Stable sort by a numeric column. Rows lacking the column sort last.
    pub fn sort_by(mut self, column: &str, order: SortOrder) -> Self {
        let table = self.table;
        let key = |i: usize| table.row(i).and_then(|r| r.number(column));
        self.rows.sort_by(|&a, &b| match (key(a), key(b)) {
            (Some(x), Some(y)) => match order {
                SortOrder::Ascending => x.total_cmp(&y),
                SortOrder::Descending => y.total_cmp(&x),
            },
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });
        self
    }

    pub fn limit(mut self, n: usize) -> Self {
        self.rows.truncate(n);
        self
    }

    /// The `n` rows with the highest `column`; ties keep source order.
    pub fn top(&self, column: &str, n: usize) -> TableView<'a> {
        self.clone().sort_by(column, SortOrder::Descending).limit(n)
    }

    /// Distinct teams in view, sorted.
    pub fn teams(&self) -> Vec<&'a str> {
        self.distinct(|r| r.team())
    }

    /// Distinct player names in view, sorted.
    pub fn players(&self) -> Vec<&'a str> {
        self.distinct(|r| r.player())
    }

    /// First row for `player` (a player traded mid-season appears more than once).
    pub fn find_player(&self, player: &str) -> Option<Row<'a>> {
        self.rows().find(|r| r.player() == player)
    }

    fn distinct(&self, field: impl Fn(&Row<'a>) -> &'a str) -> Vec<&'a str> {
        self.rows()
            .map(|r| field(&r))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}
