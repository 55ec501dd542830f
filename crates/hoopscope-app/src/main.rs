// hoopscope command-line entry point.
//
// Startup sequence:
// 1. Parse arguments
// 2. Initialize tracing (stderr, so stdout carries only command output)
// 3. Load config
// 4. Build the season range and the loader
// 5. Run the command; a load failure prints the connectivity message and
//    exits non-zero without printing a table

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::builder::RangedU64ValueParser;
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::{debug, info, warn};

use hoopscope_app::analytics;
use hoopscope_app::export;
use hoopscope_app::filter::{PlayerFilter, SortOrder, TableView, STANDARD_POSITIONS};
use hoopscope_app::render;
use hoopscope_core::clock::SystemClock;
use hoopscope_core::config;
use hoopscope_core::{DataUnavailable, PlayerStatsTable, SeasonKey, SeasonRange, StatsLoader};

const UNAVAILABLE_MESSAGE: &str =
    "Unable to load data. Please check your internet connection and try again.";

/// Columns shown by `show` unless `--all-columns` is given.
const DEFAULT_COLUMNS: [&str; 12] = [
    "Player", "Team", "Pos", "Age", "G", "MP", "PTS", "TRB", "AST", "STL", "BLK", "FG%",
];

#[derive(Debug, Parser)]
#[command(name = "hoopscope", version, about = "NBA per-game player statistics explorer")]
struct Cli {
    /// Path to a hoopscope.toml config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List the seasons that can be loaded, newest first
    Seasons,
    /// Summary metrics and the filtered player table
    Show {
        #[command(flatten)]
        table: TableArgs,
        /// Sort by this numeric column
        #[arg(long, default_value = "PTS")]
        sort: String,
        /// Sort ascending instead of descending
        #[arg(long)]
        asc: bool,
        /// Maximum number of rows to print
        #[arg(long)]
        limit: Option<usize>,
        /// Print every column instead of the default selection
        #[arg(long)]
        all_columns: bool,
    },
    /// Top players for one or more stats
    Top {
        #[command(flatten)]
        table: TableArgs,
        /// Stats to rank by (repeatable)
        #[arg(long = "stat", default_values = ["PTS", "TRB", "AST"])]
        stats: Vec<String>,
        #[arg(short = 'n', long, default_value_t = 10)]
        count: usize,
    },
    /// Count, mean, spread and quartiles of every numeric column
    Describe {
        #[command(flatten)]
        table: TableArgs,
    },
    /// Correlation matrix of the key stats
    Corr {
        #[command(flatten)]
        table: TableArgs,
    },
    /// Per-team averages, best scoring teams first
    Teams {
        #[command(flatten)]
        table: TableArgs,
        /// Number of teams to show
        #[arg(long, default_value_t = analytics::DEFAULT_TEAM_LIMIT)]
        limit: usize,
    },
    /// Head-to-head comparison of two players
    Compare {
        first: String,
        second: String,
        #[command(flatten)]
        table: TableArgs,
    },
    /// Distribution of a stat, overall or grouped
    Dist {
        #[command(flatten)]
        table: TableArgs,
        #[arg(long, default_value = "PTS")]
        stat: String,
        #[arg(
            long,
            default_value_t = analytics::DEFAULT_HISTOGRAM_BINS,
            value_parser = RangedU64ValueParser::<usize>::new().range(1..=analytics::MAX_HISTOGRAM_BINS as u64)
        )]
        bins: usize,
        /// Five-number summaries per group instead of a histogram
        #[arg(long, value_enum)]
        by: Option<GroupBy>,
        /// Number of teams shown with `--by team` (alphabetical)
        #[arg(long, default_value_t = analytics::DEFAULT_TEAM_LIMIT)]
        limit: usize,
    },
    /// Paired values of two stats with their correlation
    Scatter {
        #[command(flatten)]
        table: TableArgs,
        #[arg(long, default_value = analytics::SCATTER_X)]
        x: String,
        #[arg(long, default_value = analytics::SCATTER_Y)]
        y: String,
        /// Maximum number of points to print, highest y first
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Write the filtered table as CSV
    Export {
        #[command(flatten)]
        table: TableArgs,
        /// Output file (defaults to nba_stats_<season>.csv)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum GroupBy {
    Pos,
    Team,
}

impl GroupBy {
    fn column(self) -> &'static str {
        match self {
            GroupBy::Pos => hoopscope_core::table::POS,
            GroupBy::Team => hoopscope_core::table::TEAM,
        }
    }
}

/// Season and filter options shared by the table commands.
#[derive(Debug, Args)]
struct TableArgs {
    /// Season year (defaults to the most recent completed season)
    #[arg(long)]
    season: Option<i32>,
    /// Keep only these teams (repeatable)
    #[arg(long = "team")]
    teams: Vec<String>,
    /// Keep only these positions (repeatable; defaults to C, PF, SF, PG, SG)
    #[arg(long = "pos", conflicts_with = "all_positions")]
    positions: Vec<String>,
    /// Keep every position, including combinations such as PG-SG
    #[arg(long)]
    all_positions: bool,
    #[arg(long, default_value_t = 0.0)]
    min_games: f64,
    #[arg(long = "min-ppg", default_value_t = 0.0)]
    min_points: f64,
}

impl TableArgs {
    fn filter(&self) -> PlayerFilter {
        let mut filter = PlayerFilter::default()
            .min_games(self.min_games)
            .min_points(self.min_points);
        if !self.teams.is_empty() {
            filter = filter.with_teams(self.teams.iter().cloned());
        }
        if !self.positions.is_empty() {
            filter = filter.with_positions(self.positions.iter().cloned());
        } else if !self.all_positions {
            filter = filter.with_positions(STANDARD_POSITIONS);
        }
        filter
    }

    fn season(&self, range: &SeasonRange) -> anyhow::Result<SeasonKey> {
        match self.season {
            Some(year) => range.key(year).context("invalid --season"),
            None => range
                .latest()
                .context("no completed season is available for the configured range"),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_tracing() {
        eprintln!("warning: {e:#}");
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if let Some(unavailable) = e.downcast_ref::<DataUnavailable>() {
                warn!(season = %unavailable.season, error = %unavailable, "load failed");
                eprintln!("{UNAVAILABLE_MESSAGE}");
            } else {
                eprintln!("error: {e:#}");
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = config::load_config(cli.config.as_deref()).context("failed to load configuration")?;
    debug!(
        base_url = %config.source.base_url,
        ttl_secs = config.cache.ttl_secs,
        "config loaded"
    );

    let range = SeasonRange::from_clock(config.seasons.earliest, &SystemClock);
    let loader = StatsLoader::from_config(&config).context("failed to build HTTP client")?;

    match cli.command {
        Command::Seasons => {
            for season in range.seasons() {
                println!("{season}");
            }
        }
        Command::Show {
            table,
            sort,
            asc,
            limit,
            all_columns,
        } => {
            let data = load(&loader, &range, &table).await?;
            let order = if asc { SortOrder::Ascending } else { SortOrder::Descending };
            let filter = table.filter();
            let mut view = TableView::filtered(&data, &filter).sort_by(&sort, order);
            print!("{}", render::render_summary(&analytics::summary(&view, &filter)));
            println!();
            if let Some(n) = limit {
                view = view.limit(n);
            }
            let columns: Option<&[&str]> = if all_columns { None } else { Some(&DEFAULT_COLUMNS[..]) };
            print!("{}", render::render_view(&view, columns));
        }
        Command::Top { table, stats, count } => {
            let data = load(&loader, &range, &table).await?;
            let view = TableView::filtered(&data, &table.filter());
            for stat in &stats {
                if !data.has_column(stat) {
                    warn!(stat = %stat, "unknown stat, skipping");
                    continue;
                }
                println!("Top {count} by {stat}");
                let top = view.top(stat, count);
                print!("{}", render::render_view(&top, Some(&["Player", "Team", stat.as_str()][..])));
                println!();
            }
        }
        Command::Describe { table } => {
            let data = load(&loader, &range, &table).await?;
            let view = TableView::filtered(&data, &table.filter());
            print!("{}", render::render_describe(&analytics::describe(&view)));
        }
        Command::Corr { table } => {
            let data = load(&loader, &range, &table).await?;
            let view = TableView::filtered(&data, &table.filter());
            match analytics::correlation(&view, &analytics::KEY_STATS) {
                Some(matrix) => print!("{}", render::render_correlation(&matrix)),
                None => println!("Not enough numeric stats for a correlation matrix"),
            }
        }
        Command::Teams { table, limit } => {
            let data = load(&loader, &range, &table).await?;
            let view = TableView::filtered(&data, &table.filter());
            let mut teams = analytics::team_aggregates(&view);
            teams.truncate(limit);
            print!("{}", render::render_teams(&teams));
        }
        Command::Compare { first, second, table } => {
            let data = load(&loader, &range, &table).await?;
            let view = TableView::filtered(&data, &table.filter());
            let cmp = analytics::compare(&view, &first, &second).with_context(|| {
                format!("no rows for {first:?} and {second:?} in season {}", data.season())
            })?;
            print!("{}", render::render_comparison(&cmp));
        }
        Command::Dist {
            table,
            stat,
            bins,
            by,
            limit,
        } => {
            let data = load(&loader, &range, &table).await?;
            anyhow::ensure!(data.has_column(&stat), "unknown stat {stat:?}");
            let view = TableView::filtered(&data, &table.filter());
            match by {
                Some(group) => {
                    let mut groups = analytics::grouped_five_number(&view, group.column(), &stat);
                    if let GroupBy::Team = group {
                        groups.sort_by(|a, b| a.0.cmp(&b.0));
                        groups.truncate(limit);
                    }
                    print!("{}", render::render_five_number(group.column(), &stat, &groups));
                }
                None => {
                    let hist = analytics::histogram(&view.values(&stat), bins);
                    print!("{}", render::render_histogram(&stat, &hist, 40));
                }
            }
        }
        Command::Scatter { table, x, y, limit } => {
            let data = load(&loader, &range, &table).await?;
            let mut view =
                TableView::filtered(&data, &table.filter()).sort_by(&y, SortOrder::Descending);
            if let Some(n) = limit {
                view = view.limit(n);
            }
            let scatter = analytics::scatter(&view, &x, &y)
                .with_context(|| format!("{x:?} and {y:?} must both be numeric stats"))?;
            print!("{}", render::render_scatter(&scatter));
        }
        Command::Export { table, output } => {
            let data = load(&loader, &range, &table).await?;
            let view = TableView::filtered(&data, &table.filter());
            let path =
                output.unwrap_or_else(|| PathBuf::from(export::default_file_name(data.season())));
            let written = export::export_to_file(&view, &path)
                .with_context(|| format!("failed to export {}", path.display()))?;
            println!("Wrote {written} rows to {}", path.display());
        }
    }

    Ok(())
}

async fn load(
    loader: &StatsLoader,
    range: &SeasonRange,
    args: &TableArgs,
) -> anyhow::Result<std::sync::Arc<PlayerStatsTable>> {
    let season = args.season(range)?;
    info!(%season, "loading season");
    Ok(loader.load(season).await?)
}

/// Initialize tracing to stderr.
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("hoopscope=info,hoopscope_core=info,warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn filters_parse_repeated_flags() {
        let cli = Cli::try_parse_from([
            "hoopscope", "show", "--season", "2023", "--team", "BOS", "--team", "LAL", "--pos",
            "C", "--min-games", "20", "--min-ppg", "10.5",
        ])
        .unwrap();
        let Command::Show { table, sort, asc, .. } = cli.command else {
            panic!("expected show");
        };
        assert_eq!(table.season, Some(2023));
        assert_eq!(sort, "PTS");
        assert!(!asc);
        let filter = table.filter();
        assert_eq!(filter.teams.unwrap().len(), 2);
        assert_eq!(filter.positions.unwrap().len(), 1);
        assert_eq!(filter.min_games, 20.0);
        assert_eq!(filter.min_points, 10.5);
    }

    #[test]
    fn no_team_flag_means_all_teams() {
        let cli = Cli::try_parse_from(["hoopscope", "teams"]).unwrap();
        let Command::Teams { table, limit } = cli.command else {
            panic!("expected teams");
        };
        assert!(table.filter().teams.is_none());
        assert_eq!(limit, 10);
    }

    #[test]
    fn positions_default_to_the_standard_five() {
        let cli = Cli::try_parse_from(["hoopscope", "show"]).unwrap();
        let Command::Show { table, .. } = cli.command else {
            panic!("expected show");
        };
        let positions = table.filter().positions.unwrap();
        assert_eq!(positions.len(), 5);
        assert!(!positions.contains("PG-SG"));

        let cli = Cli::try_parse_from(["hoopscope", "show", "--all-positions"]).unwrap();
        let Command::Show { table, .. } = cli.command else {
            panic!("expected show");
        };
        assert!(table.filter().positions.is_none());

        assert!(Cli::try_parse_from(["hoopscope", "show", "--pos", "C", "--all-positions"]).is_err());
    }

    #[test]
    fn bins_must_be_in_range() {
        assert!(Cli::try_parse_from(["hoopscope", "dist", "--bins", "0"]).is_err());
        assert!(Cli::try_parse_from(["hoopscope", "dist", "--bins", "1001"]).is_err());
        assert!(Cli::try_parse_from(["hoopscope", "dist", "--bins", "18446744073709551615"]).is_err());
        let cli = Cli::try_parse_from(["hoopscope", "dist", "--bins", "1000"]).unwrap();
        let Command::Dist { bins, .. } = cli.command else {
            panic!("expected dist");
        };
        assert_eq!(bins, 1000);
    }

    #[test]
    fn scatter_defaults_to_minutes_against_points() {
        let cli = Cli::try_parse_from(["hoopscope", "scatter"]).unwrap();
        let Command::Scatter { x, y, limit, .. } = cli.command else {
            panic!("expected scatter");
        };
        assert_eq!((x.as_str(), y.as_str()), ("MP", "PTS"));
        assert_eq!(limit, None);
    }

    #[test]
    fn default_season_is_latest_completed() {
        let range = SeasonRange::new(2000, 2025);
        let cli = Cli::try_parse_from(["hoopscope", "describe"]).unwrap();
        let Command::Describe { table } = cli.command else {
            panic!("expected describe");
        };
        assert_eq!(table.season(&range).unwrap().year(), 2024);
    }

    #[test]
    fn out_of_range_season_is_rejected() {
        let range = SeasonRange::new(2000, 2025);
        let cli = Cli::try_parse_from(["hoopscope", "corr", "--season", "2025"]).unwrap();
        let Command::Corr { table } = cli.command else {
            panic!("expected corr");
        };
        assert!(table.season(&range).is_err());
    }

    #[test]
    fn top_defaults_to_three_stats() {
        let cli = Cli::try_parse_from(["hoopscope", "top"]).unwrap();
        let Command::Top { stats, count, .. } = cli.command else {
            panic!("expected top");
        };
        assert_eq!(stats, vec!["PTS", "TRB", "AST"]);
        assert_eq!(count, 10);
    }

    #[test]
    fn dist_group_by_position() {
        let cli = Cli::try_parse_from(["hoopscope", "dist", "--stat", "AST", "--by", "pos"]).unwrap();
        let Command::Dist { stat, bins, by, .. } = cli.command else {
            panic!("expected dist");
        };
        assert_eq!(stat, "AST");
        assert_eq!(bins, 30);
        assert_eq!(by.map(GroupBy::column), Some("Pos"));
    }
}
